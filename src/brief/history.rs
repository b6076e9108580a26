use crate::brief::prefs::PrefKey;
use crate::brief::site::derive_site;
use crate::brief::store::KeyValueStore;
use crate::brief::warn::{self, WarnEvent};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const HISTORY_CAP: usize = 100;

const HISTORY_KEY: PrefKey = PrefKey::SentHistory;

/// One successfully sent link. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub site: String,
    pub sent_at: DateTime<Utc>,
}

impl ArticleRecord {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.to_string(),
            title: title.to_string(),
            site: derive_site(url),
            sent_at: Utc::now(),
        }
    }
}

pub fn encode(records: &[ArticleRecord]) -> Result<String, StoreError> {
    serde_json::to_string(records).map_err(|source| StoreError::Encode {
        key: HISTORY_KEY.as_str().to_string(),
        source,
    })
}

pub fn decode(raw: &str) -> serde_json::Result<Vec<ArticleRecord>> {
    serde_json::from_str(raw)
}

/// Insert at the head, then drop from the tail down to the cap.
pub fn push_capped(records: &mut Vec<ArticleRecord>, record: ArticleRecord) {
    records.insert(0, record);
    records.truncate(HISTORY_CAP);
}

fn decode_or_empty(raw: &str) -> Vec<ArticleRecord> {
    match decode(raw) {
        Ok(mut records) => {
            records.truncate(HISTORY_CAP);
            records
        }
        Err(err) => {
            warn::emit(WarnEvent {
                code: "W_HISTORY_DECODE",
                stage: "history",
                action: "use-empty",
                key: HISTORY_KEY.as_str(),
                reason: "undecodable history",
                err: &err.to_string(),
            });
            Vec::new()
        }
    }
}

/// Cached view of the persisted send history. The cache only changes when
/// this handle appends, resets, or is explicitly refreshed.
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
    entries: Vec<ArticleRecord>,
}

impl HistoryLog {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mut log = Self {
            store,
            entries: Vec::new(),
        };
        log.refresh();
        log
    }

    pub fn entries(&self) -> &[ArticleRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the cache and reload the whole sequence from the store.
    pub fn refresh(&mut self) {
        self.entries = match self.store.read(HISTORY_KEY.as_str()) {
            Ok(Some(raw)) => decode_or_empty(&raw),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "W_HISTORY_READ",
                    stage: "history",
                    action: "use-empty",
                    key: HISTORY_KEY.as_str(),
                    reason: "store unavailable",
                    err: &err.to_string(),
                });
                Vec::new()
            }
        };
    }

    /// Record a sent link. The persisted sequence is re-read under the key
    /// lock before prepending, so appends from another process survive even
    /// when this cache is stale.
    pub fn append(&mut self, url: &str, title: &str) -> ArticleRecord {
        let record = ArticleRecord::new(url, title);
        let mut merged: Option<Vec<ArticleRecord>> = None;

        let result = self.store.update(HISTORY_KEY.as_str(), &mut |current| {
            let mut records = current.map(decode_or_empty).unwrap_or_default();
            push_capped(&mut records, record.clone());
            let encoded = encode(&records)?;
            merged = Some(records);
            Ok(encoded)
        });

        match (result, merged) {
            (Ok(_), Some(records)) => self.entries = records,
            (result, _) => {
                if let Err(err) = result {
                    warn::emit(WarnEvent {
                        code: "W_HISTORY_WRITE",
                        stage: "history",
                        action: "cache-only",
                        key: HISTORY_KEY.as_str(),
                        reason: "store write failed",
                        err: &err.to_string(),
                    });
                }
                push_capped(&mut self.entries, record.clone());
            }
        }

        record
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        let result = encode(&self.entries)
            .and_then(|raw| self.store.write(HISTORY_KEY.as_str(), &raw));
        if let Err(err) = result {
            warn::emit(WarnEvent {
                code: "W_HISTORY_WRITE",
                stage: "history",
                action: "cache-only",
                key: HISTORY_KEY.as_str(),
                reason: "reset write failed",
                err: &err.to_string(),
            });
        }
    }
}
