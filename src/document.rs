//! Document Module
//!
//! A record fetched from a collection: system attributes plus a JSON body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Maximum allowed document key length in bytes
pub const MAX_KEY_LENGTH: usize = 254;

// == Document ==
/// A document as returned by the backing store.
///
/// System attributes are serialized with their database names (`_key`,
/// `_rev`, `_id`); every other attribute lives in `body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique key within the collection
    #[serde(rename = "_key")]
    pub key: String,
    /// Revision assigned by the store
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// `collection/key` handle
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// User attributes
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl Document {
    // == Constructor ==
    /// Creates an empty document after validating its key.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self {
            key,
            rev: None,
            id: None,
            body: Map::new(),
        })
    }

    /// Parses a document from its JSON representation.
    pub fn from_json(value: Value) -> Result<Self> {
        let doc: Document =
            serde_json::from_value(value).map_err(|e| CacheError::Store(e.to_string()))?;
        validate_key(&doc.key)?;
        Ok(doc)
    }

    // == Builders ==
    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    // == Accessors ==
    /// Returns a user attribute.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// Sets the `_id` handle for the owning collection.
    pub fn bind(&mut self, collection: &str) {
        self.id = Some(format!("{}/{}", collection, self.key));
    }
}

// == Key Validation ==
/// Rejects empty keys and keys longer than [`MAX_KEY_LENGTH`].
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key is empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}
