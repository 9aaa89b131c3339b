//! Publication payload
//!
//! The blob handed to an external publication target. The target is
//! expected to apply it only if its current content still matches
//! `precondition` and report a conflict otherwise.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sv_01_bloom_filter::BloomFilterSnapshot;

use crate::error::TallyError;

pub const INITIAL_MESSAGE: &str = "Initial commit: Add Bloom filter";
pub const UPDATE_MESSAGE: &str = "Update Bloom filter with latest reports";

/// Where and how snapshots are published.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationConfig {
    /// Target path; `{date}` expands to the snapshot's `YYYY-MM-DD`
    pub path: String,
    pub branch: Option<String>,
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            path: "bloomfilter.json".to_string(),
            branch: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationPayload {
    pub path: String,
    pub content_base64: String,
    pub message: String,
    pub branch: Option<String>,
    /// Token of the content being replaced; `None` creates the file
    pub precondition: Option<String>,
}

impl PublicationPayload {
    pub fn build(
        snapshot: &BloomFilterSnapshot,
        config: &PublicationConfig,
        precondition: Option<String>,
    ) -> Result<Self, TallyError> {
        let json = snapshot.to_json_pretty()?;
        let message = message_for(&precondition);

        Ok(Self {
            path: config
                .path
                .replace("{date}", &snapshot.version.date_label()),
            content_base64: STANDARD.encode(json),
            message: message.to_string(),
            branch: config.branch.clone(),
            precondition,
        })
    }

    /// Same content against a different precondition.
    pub fn with_precondition(mut self, precondition: Option<String>) -> Self {
        self.message = message_for(&precondition).to_string();
        self.precondition = precondition;
        self
    }

    pub fn content(&self) -> Result<Vec<u8>, TallyError> {
        STANDARD
            .decode(&self.content_base64)
            .map_err(|e| TallyError::Serialization(e.to_string()))
    }
}

fn message_for(precondition: &Option<String>) -> &'static str {
    match precondition {
        None => INITIAL_MESSAGE,
        Some(_) => UPDATE_MESSAGE,
    }
}
