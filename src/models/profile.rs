//! Profile roster
//!
//! The pool is loaded once at startup and never mutated. Slots refer to
//! records by their index in load order, never by id.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;

/// A single profile card
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    /// Stable id from the source document (not necessarily dense)
    pub id: i64,
    pub nickname: String,
    pub message: String,
    /// Image reference, a path or URL
    pub profile_image: String,
}

impl ProfileRecord {
    pub fn new(id: i64, nickname: &str, message: &str, profile_image: &str) -> Self {
        Self {
            id,
            nickname: nickname.to_string(),
            message: message.to_string(),
            profile_image: profile_image.to_string(),
        }
    }

    /// Message length in characters, used by width estimation
    pub fn message_chars(&self) -> usize {
        self.message.chars().count()
    }
}

/// Immutable, order-preserving list of profiles
#[derive(Debug, Clone, Default)]
pub struct ProfilePool {
    records: Arc<[ProfileRecord]>,
}

impl ProfilePool {
    pub fn new(records: Vec<ProfileRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Parse a JSON array of profile records
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<ProfileRecord> = serde_json::from_str(json)?;
        Ok(Self::new(records))
    }

    /// Load the roster from a JSON document on disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let pool = Self::from_json(&json)?;
        info!(path = %path.display(), profiles = pool.len(), "Loaded profile pool");
        Ok(pool)
    }

    /// Record at a pool index
    pub fn get(&self, index: usize) -> Option<&ProfileRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfileRecord> {
        self.records.iter()
    }
}
