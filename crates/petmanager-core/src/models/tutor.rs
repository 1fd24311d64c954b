use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::photo::{photo_url, Photo};
use super::{string_or_number, Pet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tutor {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "endereco", default)]
    pub address: Option<String>,
    /// Sent by the API as either a number or a string
    #[serde(default, deserialize_with = "string_or_number")]
    pub cpf: Option<String>,
    #[serde(rename = "foto", default)]
    pub photo: Option<Photo>,
    #[serde(default)]
    pub pets: Vec<Pet>,
}

impl Tutor {
    pub fn photo_url(&self) -> &str {
        photo_url(self.photo.as_ref())
    }
}

/// Body for creating or updating a tutor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TutorInput {
    #[serde(rename = "nome")]
    pub name: String,
    pub cpf: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "endereco", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Shortest accepted tutor name, in characters
pub const TUTOR_NAME_MIN_CHARS: usize = 3;

/// Digits of `value` when it only holds digits and the given separators.
fn digits_with_separators(value: &str, separators: &[char]) -> Option<String> {
    if value
        .chars()
        .all(|c| c.is_ascii_digit() || separators.contains(&c))
    {
        Some(value.chars().filter(char::is_ascii_digit).collect())
    } else {
        None
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .all(|label| !label.is_empty())
        && domain.contains('.')
}

impl TutorInput {
    /// Check the fields the API requires before sending them. CPF and phone
    /// may be given bare or with the usual punctuation.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().chars().count() < TUTOR_NAME_MIN_CHARS {
            return Err(ApiError::invalid_input(
                "nome",
                format!("O nome deve ter pelo menos {} caracteres", TUTOR_NAME_MIN_CHARS),
            ));
        }

        let cpf = digits_with_separators(self.cpf.trim(), &['.', '-']);
        if cpf.map_or(true, |digits| digits.len() != 11) {
            return Err(ApiError::invalid_input("cpf", "CPF deve ter 11 dígitos"));
        }

        match self.email.as_deref().map(str::trim) {
            None | Some("") => return Err(ApiError::invalid_input("email", "Informe o e-mail")),
            Some(email) if !is_valid_email(email) => {
                return Err(ApiError::invalid_input("email", "E-mail inválido"))
            }
            Some(_) => {}
        }

        let phone = self
            .phone
            .as_deref()
            .and_then(|p| digits_with_separators(p.trim(), &['(', ')', ' ', '-']));
        match phone {
            Some(digits) if digits.len() == 10 || digits.len() == 11 => Ok(()),
            _ => Err(ApiError::invalid_input(
                "telefone",
                "Telefone deve ter 10 ou 11 dígitos",
            )),
        }
    }
}

impl From<&Tutor> for TutorInput {
    fn from(tutor: &Tutor) -> Self {
        Self {
            name: tutor.name.clone(),
            cpf: tutor.cpf.clone().unwrap_or_default(),
            email: tutor.email.clone(),
            phone: tutor.phone.clone(),
            address: tutor.address.clone(),
        }
    }
}
