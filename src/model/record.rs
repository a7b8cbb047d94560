//! Record models.

use serde::{Deserialize, Serialize};

/// Identified is implemented by elements that carry a stable identity.
///
/// The snapshot never looks inside a record except to answer lookups by id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Record is the document served by the records API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub data: String,
}

impl Record {
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }
}

impl Identified for Record {
    fn id(&self) -> &str {
        &self.id
    }
}
