//! The serialized session document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{EventLog, FormResponses};
use crate::ids::SessionId;
use crate::rules::{word_count, Rule};

/// Full snapshot of a session, as stored and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub events: EventLog,
    /// Rules with their states at snapshot time, in catalog order.
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub final_story: String,
    #[serde(default)]
    pub form_responses: FormResponses,
}

impl SessionRecord {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn final_word_count(&self) -> usize {
        word_count(&self.final_story)
    }

    /// `writinglab-{sessionId}.json`
    pub fn export_file_name(&self) -> String {
        format!("writinglab-{}.json", self.session_id)
    }
}

/// A session serialized for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub contents: String,
}

impl ExportDocument {
    pub fn from_record(record: &SessionRecord) -> Result<Self, serde_json::Error> {
        Ok(Self {
            file_name: record.export_file_name(),
            contents: record.to_json_pretty()?,
        })
    }

    /// Parse the document back into a record.
    pub fn reload(&self) -> Result<SessionRecord, serde_json::Error> {
        SessionRecord::from_json(&self.contents)
    }
}
