use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::photo::{photo_url, Photo};
use super::Tutor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "raca", default)]
    pub breed: Option<String>,
    #[serde(rename = "idade", default)]
    pub age: Option<u32>,
    #[serde(rename = "foto", default)]
    pub photo: Option<Photo>,
    #[serde(rename = "tutores", default)]
    pub tutors: Vec<Tutor>,
}

impl Pet {
    pub fn photo_url(&self) -> &str {
        photo_url(self.photo.as_ref())
    }

    pub fn display_age(&self) -> String {
        match self.age {
            Some(1) => "1 ano".to_string(),
            Some(age) => format!("{} anos", age),
            None => "-".to_string(),
        }
    }

    pub fn display_breed(&self) -> &str {
        self.breed.as_deref().filter(|b| !b.is_empty()).unwrap_or("SRD")
    }
}

/// Body for creating or updating a pet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PetInput {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "raca", skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(rename = "idade", skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Shortest accepted pet name, in characters
pub const PET_NAME_MIN_CHARS: usize = 2;

/// Oldest accepted pet age, in years
pub const PET_MAX_AGE: u32 = 50;

impl PetInput {
    /// Check the fields the API requires before sending them.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().chars().count() < PET_NAME_MIN_CHARS {
            return Err(ApiError::invalid_input(
                "nome",
                format!("O nome deve ter pelo menos {} caracteres", PET_NAME_MIN_CHARS),
            ));
        }
        match self.age {
            None => Err(ApiError::invalid_input("idade", "Informe a idade")),
            Some(age) if age > PET_MAX_AGE => Err(ApiError::invalid_input(
                "idade",
                format!("A idade deve estar entre 0 e {}", PET_MAX_AGE),
            )),
            Some(_) => Ok(()),
        }
    }
}

impl From<&Pet> for PetInput {
    fn from(pet: &Pet) -> Self {
        Self {
            name: pet.name.clone(),
            breed: pet.breed.clone(),
            age: pet.age,
        }
    }
}
