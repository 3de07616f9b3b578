pub mod backend;
pub mod cancel;
pub mod chat;
pub mod diagnosis;
