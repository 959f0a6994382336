//! Rapid entry
//!
//! Form drafts for new sessions, their validation, and the queue that batches
//! them before submission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog;
use crate::dates::at_midday;
use crate::error::EntryError;
use crate::types::{
    Counters, OperationalDetail, SampleResult, SessionDetail, SessionRecord, TrainingDetail,
    DEFAULT_REINFORCER, DEFAULT_SCHEDULE,
};

/// Separator used when several reinforcers are selected
pub const REINFORCER_SEPARATOR: &str = ", ";

/// Mode-specific part of a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all_fields = "camelCase")]
pub enum EntryDetail {
    Training {
        record_type: String,
        module: String,
        target_odor: String,
        /// `None` until the field is filled in
        ua_c: Option<u32>,
        ua_i: Option<u32>,
    },
    Operational {
        sample_id: String,
        #[serde(default)]
        position: String,
        result: Option<SampleResult>,
    },
}

impl EntryDetail {
    /// Training detail preset to the first catalog module and odor
    pub fn training() -> Self {
        let module = catalog::MODULES[0];
        EntryDetail::Training {
            record_type: "10UA".to_string(),
            module: module.to_string(),
            target_odor: catalog::objectives_for(module)
                .first()
                .map_or_else(String::new, |o| o.to_string()),
            ua_c: Some(0),
            ua_i: Some(0),
        }
    }

    pub fn operational() -> Self {
        EntryDetail::Operational {
            sample_id: String::new(),
            position: String::new(),
            result: None,
        }
    }
}

/// A session as typed into the rapid-entry form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub dog_id: String,
    pub trainer_id: String,
    pub date: NaiveDate,
    pub reinforcers: Vec<String>,
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default)]
    pub notes: String,
    pub detail: EntryDetail,
}

fn default_schedule() -> String {
    DEFAULT_SCHEDULE.to_string()
}

impl EntryDraft {
    /// Blank draft with the form defaults
    pub fn new(dog_id: &str, trainer_id: &str, date: NaiveDate, detail: EntryDetail) -> Self {
        Self {
            dog_id: dog_id.to_string(),
            trainer_id: trainer_id.to_string(),
            date,
            reinforcers: vec![DEFAULT_REINFORCER.to_string()],
            schedule: default_schedule(),
            notes: String::new(),
            detail,
        }
    }

    pub fn validate(&self) -> Result<(), EntryError> {
        if self.reinforcers.is_empty() {
            return Err(EntryError::NoReinforcer);
        }

        match &self.detail {
            EntryDetail::Training { ua_c, ua_i, .. } => {
                if ua_c.is_none() || ua_i.is_none() {
                    return Err(EntryError::MissingLearningUnits);
                }
            }
            EntryDetail::Operational {
                sample_id, result, ..
            } => {
                if sample_id.trim().is_empty() {
                    return Err(EntryError::MissingSampleId);
                }
                if result.is_none() {
                    return Err(EntryError::MissingResult);
                }
            }
        }

        Ok(())
    }

    /// Validate and convert into a session record
    pub fn into_session(self, id: String) -> Result<SessionRecord, EntryError> {
        self.validate()?;

        let detail = match self.detail {
            EntryDetail::Training {
                record_type,
                module,
                target_odor,
                ua_c,
                ua_i,
            } => SessionDetail::Training(TrainingDetail {
                record_type,
                module,
                target_odor,
                ua_c: ua_c.unwrap_or_default(),
                ua_i: ua_i.unwrap_or_default(),
            }),
            EntryDetail::Operational {
                sample_id,
                position,
                result,
            } => SessionDetail::Operational(OperationalDetail {
                sample_id,
                position,
                result,
            }),
        };
        let counters = Counters::derive(&detail);

        Ok(SessionRecord {
            id,
            date: at_midday(self.date).unwrap_or_default(),
            dog_id: self.dog_id,
            trainer_id: self.trainer_id,
            detail,
            counters,
            reinforcer: self.reinforcers.join(REINFORCER_SEPARATOR),
            schedule: self.schedule,
            notes: self.notes,
        })
    }
}

/// Draft waiting in the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedEntry {
    pub temp_id: String,
    pub draft: EntryDraft,
}

/// Batch of validated drafts awaiting submission
#[derive(Debug, Default)]
pub struct EntryQueue {
    items: Vec<QueuedEntry>,
    next: u64,
}

impl EntryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and enqueue; returns the temporary id
    pub fn push(&mut self, draft: EntryDraft) -> Result<String, EntryError> {
        draft.validate()?;
        let temp_id = format!("q-{}", self.next);
        self.next += 1;
        debug!(%temp_id, dog = %draft.dog_id, "queued entry");
        self.items.push(QueuedEntry {
            temp_id: temp_id.clone(),
            draft,
        });
        Ok(temp_id)
    }

    pub fn remove(&mut self, temp_id: &str) -> Result<EntryDraft, EntryError> {
        let index = self
            .items
            .iter()
            .position(|item| item.temp_id == temp_id)
            .ok_or_else(|| EntryError::UnknownQueueItem(temp_id.to_string()))?;
        Ok(self.items.remove(index).draft)
    }

    pub fn items(&self) -> &[QueuedEntry] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Empty the queue into session records, in queue order.
    ///
    /// `make_id` receives the position in the batch.
    pub fn drain(
        &mut self,
        mut make_id: impl FnMut(usize) -> String,
    ) -> Result<Vec<SessionRecord>, EntryError> {
        let items = std::mem::take(&mut self.items);
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| item.draft.into_session(make_id(i)))
            .collect()
    }
}
