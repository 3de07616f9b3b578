//! Specialist suggestions for diagnosed conditions.
//!
//! Conditions are bucketed into a body-system category by keyword, each
//! category maps to one or more specialties, and the directory lists the
//! doctors available for a specialty. Specialties without directory
//! entries are skipped.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Respiratory,
    Cardiovascular,
    Digestive,
    Neurological,
    Skin,
    JointMuscle,
    MentalHealth,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctor {
    pub name: &'static str,
    pub specialty: &'static str,
    pub experience_years: u8,
    pub rating: f32,
}

const fn doctor(
    name: &'static str,
    specialty: &'static str,
    experience_years: u8,
    rating: f32,
) -> Doctor {
    Doctor {
        name,
        specialty,
        experience_years,
        rating,
    }
}

const DIRECTORY: &[Doctor] = &[
    doctor("Dr. Sarah Chen", "Pulmonologist", 15, 4.8),
    doctor("Dr. Michael Roberts", "Pulmonologist", 12, 4.9),
    doctor("Dr. James Wilson", "Cardiologist", 20, 4.9),
    doctor("Dr. Emily Rodriguez", "Cardiologist", 18, 4.7),
    doctor("Dr. David Kim", "Gastroenterologist", 14, 4.8),
    doctor("Dr. Lisa Patel", "Gastroenterologist", 16, 4.9),
    doctor("Dr. Robert Brown", "Neurologist", 22, 4.9),
    doctor("Dr. Maria Garcia", "Neurologist", 17, 4.8),
    doctor("Dr. Jennifer Lee", "Dermatologist", 13, 4.7),
    doctor("Dr. Thomas Anderson", "Dermatologist", 19, 4.8),
    doctor("Dr. William Taylor", "General Physician", 10, 4.6),
    doctor("Dr. Susan Martinez", "General Physician", 15, 4.7),
];

pub fn specialties_for(category: Category) -> &'static [&'static str] {
    match category {
        Category::Respiratory => &["Pulmonologist", "ENT Specialist"],
        Category::Cardiovascular => &["Cardiologist"],
        Category::Digestive => &["Gastroenterologist"],
        Category::Neurological => &["Neurologist"],
        Category::Skin => &["Dermatologist"],
        Category::JointMuscle => &["Orthopedist", "Rheumatologist"],
        Category::MentalHealth => &["Psychiatrist", "Psychologist"],
        Category::General => &["General Physician", "Internal Medicine Specialist"],
    }
}

/// Bucket a condition name by keyword.
pub fn categorize(condition_name: &str) -> Category {
    let name = condition_name.to_lowercase();
    if name.contains("respiratory") || name.contains("breathing") {
        Category::Respiratory
    } else if name.contains("heart") {
        Category::Cardiovascular
    } else {
        Category::General
    }
}

pub fn doctors_for(specialty: &str) -> impl Iterator<Item = &'static Doctor> + '_ {
    DIRECTORY.iter().filter(move |d| d.specialty == specialty)
}

/// Doctors to suggest for a set of diagnosed conditions, de-duplicated and
/// in first-seen order.
pub fn recommend<'a, I>(condition_names: I) -> Vec<Doctor>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut doctors: Vec<Doctor> = Vec::new();
    for name in condition_names {
        for specialty in specialties_for(categorize(name)) {
            for doctor in doctors_for(specialty) {
                if !doctors.iter().any(|d| d.name == doctor.name) {
                    doctors.push(doctor.clone());
                }
            }
        }
    }
    doctors
}
