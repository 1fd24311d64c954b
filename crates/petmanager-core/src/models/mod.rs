//! Data models for the pet manager API.
//!
//! Field names on the wire are Portuguese (`nome`, `raca`, `tutores`, ...);
//! the Rust structs use English names with serde renames.
//!
//! - `Pet`, `PetInput`: pets and the body used to create/update them
//! - `Tutor`, `TutorInput`: pet owners
//! - `Photo`: uploaded picture metadata
//! - `Page`: paginated list wrapper

pub mod page;
pub mod pet;
pub mod photo;
pub mod tutor;

use serde::{Deserialize, Deserializer};

pub use page::Page;
pub use pet::{Pet, PetInput};
pub use photo::{Photo, PLACEHOLDER_PHOTO_URL};
pub use tutor::{Tutor, TutorInput};

/// Parse a record id typed by the user. Only positive integers are valid.
pub fn parse_id(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// Accept a field the API sends either as a string or as a number.
/// Numbers are rendered as 11-digit CPF strings so leading zeros survive.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => format!("{:011}", number),
    }))
}
