#[tokio::main]
async fn main() {
    if let Err(e) = medico_lib::run().await {
        eprintln!("medico: {e}");
        std::process::exit(1);
    }
}
