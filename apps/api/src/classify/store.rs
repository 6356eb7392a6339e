//! Instruction Store — the persisted, operator-editable criteria.
//!
//! One JSON record on disk (`{"criteria": .., "last_updated": ..}`) is the
//! source of truth across restarts. The full instruction is always derived
//! as header + criteria + footer and never persisted.
//!
//! Persistence is best-effort. Read failures at startup fall back to the
//! built-in default; write failures are logged and the in-memory value is
//! updated anyway. Neither ever reaches the HTTP boundary.
//!
//! A record written by older deployments holds a single `"prompt"` field with
//! the complete instruction. That text is kept as the instruction body with
//! the current output-format footer appended, until the first update rewrites
//! the file in the current shape. It has no editable criteria of its own, so
//! `current_criteria` reports the built-in default while it is active.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::classify::prompts::{build_instruction, build_legacy_instruction, DEFAULT_CRITERIA};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not move record into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Serialize)]
struct CriteriaRecord<'a> {
    criteria: &'a str,
    last_updated: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredRecord {
    Current {
        criteria: String,
        #[serde(default)]
        last_updated: Option<String>,
    },
    Legacy {
        prompt: String,
        #[serde(default)]
        last_updated: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LiveText {
    Criteria(String),
    /// Full historical instruction; only the output footer is added.
    Legacy(String),
}

#[derive(Debug, Clone)]
struct LiveState {
    text: LiveText,
    last_updated: Option<DateTime<Utc>>,
}

impl LiveState {
    fn default_criteria() -> Self {
        Self {
            text: LiveText::Criteria(DEFAULT_CRITERIA.to_string()),
            last_updated: None,
        }
    }

    fn criteria(&self) -> &str {
        match &self.text {
            LiveText::Criteria(c) => c,
            LiveText::Legacy(_) => DEFAULT_CRITERIA,
        }
    }

    fn instruction(&self) -> String {
        match &self.text {
            LiveText::Criteria(c) => build_instruction(c),
            LiveText::Legacy(prompt) => build_legacy_instruction(prompt),
        }
    }
}

/// Process-wide holder of the live criteria. Readers get copies.
#[derive(Debug)]
pub struct InstructionStore {
    path: PathBuf,
    state: RwLock<LiveState>,
}

impl InstructionStore {
    /// Loads the persisted record at `path`, falling back to the built-in default.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match read_record(&path).await {
            Ok(Some(StoredRecord::Current {
                criteria,
                last_updated,
            })) => {
                info!("Loaded classification criteria from {}", path.display());
                LiveState {
                    text: LiveText::Criteria(criteria),
                    last_updated: parse_timestamp(last_updated.as_deref()),
                }
            }
            Ok(Some(StoredRecord::Legacy {
                prompt,
                last_updated,
            })) => {
                info!(
                    "Loaded legacy full prompt from {}; it will be rewritten on next update",
                    path.display()
                );
                LiveState {
                    text: LiveText::Legacy(prompt),
                    last_updated: parse_timestamp(last_updated.as_deref()),
                }
            }
            Ok(None) => {
                info!(
                    "No criteria record at {}; using built-in default",
                    path.display()
                );
                LiveState::default_criteria()
            }
            Err(e) => {
                warn!(
                    "Could not read criteria record at {}: {e}; using built-in default",
                    path.display()
                );
                LiveState::default_criteria()
            }
        };

        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub async fn current_criteria(&self) -> String {
        self.state.read().await.criteria().to_string()
    }

    pub async fn current_instruction(&self) -> String {
        self.state.read().await.instruction()
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_updated
    }

    /// The instruction a single classification call should use.
    /// A non-blank `criteria_override` wins for that call only; the live value is untouched.
    pub async fn instruction_for(&self, criteria_override: Option<&str>) -> String {
        match criteria_override.filter(|c| !c.trim().is_empty()) {
            Some(criteria) => build_instruction(criteria),
            None => self.current_instruction().await,
        }
    }

    /// Replaces the live criteria, persists it, and returns the new full instruction.
    ///
    /// The write lock is held across the disk write so readers never see a
    /// value that disagrees with the record being written.
    pub async fn update_criteria(&self, criteria: &str) -> String {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let record = CriteriaRecord {
            criteria,
            last_updated: now.to_rfc3339(),
        };
        match write_record(&self.path, &record).await {
            Ok(()) => info!(
                "Persisted classification criteria ({} chars) to {}",
                criteria.len(),
                self.path.display()
            ),
            Err(e) => warn!(
                "Failed to persist criteria to {}: {e}; keeping in-memory value only",
                self.path.display()
            ),
        }

        *state = LiveState {
            text: LiveText::Criteria(criteria.to_string()),
            last_updated: Some(now),
        };
        state.instruction()
    }

    /// Restores the built-in default criteria through the normal update path.
    pub async fn reset_criteria(&self) -> String {
        self.update_criteria(DEFAULT_CRITERIA).await
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

async fn read_record(path: &Path) -> Result<Option<StoredRecord>, StoreError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Writes to a temp file beside `path` and renames it into place.
async fn write_record(path: &Path, record: &CriteriaRecord<'_>) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(record)?;
    let path = path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
}
