use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id_newtype!(LessonId);

/// A bookable lesson as served by `GET /lessons` and `GET /search`.
///
/// `space` is the remaining capacity. Fields the client does not interpret
/// (images, icons, descriptions) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "_id")]
    pub id: LessonId,
    pub topic: String,
    #[serde(default)]
    pub location: String,
    pub price: f64,
    pub space: u32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Lesson {
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        location: impl Into<String>,
        price: f64,
        space: u32,
    ) -> Self {
        Self {
            id: LessonId::new(id),
            topic: topic.into(),
            location: location.into(),
            price,
            space,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.space > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

/// Mock card details. Validated locally, never sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentDetails {
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
