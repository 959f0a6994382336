//! Core types for the K9 Flux pipeline
//!
//! This module defines the reconciled relational model: dogs, trainers and
//! session records, plus the closed vocabularies (mode, result, level) that
//! the spreadsheet only carries as loose strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier bound to sessions whose trainer name is not in the registry
pub const UNKNOWN_TRAINER_ID: &str = "unknown";

/// Trainer name assumed when a session row carries none
pub const UNKNOWN_TRAINER_NAME: &str = "Unknown";

/// Breed tag for dogs created from an unmatched session reference
pub const AUTO_DETECTED_BREED: &str = "Detectado";

pub const DEFAULT_RECORD_TYPE: &str = "Libre";
pub const DEFAULT_REINFORCER: &str = "Comestible";
pub const DEFAULT_SCHEDULE: &str = "Fijo";

/// Certification level of a dog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificationLevel {
    #[default]
    Novice,
    Certified,
    Master,
    Retired,
}

impl CertificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationLevel::Novice => "Novice",
            CertificationLevel::Certified => "Certified",
            CertificationLevel::Master => "Master",
            CertificationLevel::Retired => "Retired",
        }
    }

    /// Parse a sheet label (English or Spanish, any case).
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "novice" | "novato" => Some(CertificationLevel::Novice),
            "certified" | "certificado" => Some(CertificationLevel::Certified),
            "master" | "maestro" => Some(CertificationLevel::Master),
            "retired" | "retirado" => Some(CertificationLevel::Retired),
            _ => None,
        }
    }
}

/// Session mode: skill-building trials vs live detection trials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionMode {
    Training,
    Operational,
}

impl SessionMode {
    /// Label written to the sheet's mode column
    pub fn sheet_label(&self) -> &'static str {
        match self {
            SessionMode::Training => "Entrenamiento",
            SessionMode::Operational => "Muestras",
        }
    }

    /// Classify a raw mode cell. Anything that does not name sample work is training.
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("muestras") || lowered.contains("operational") {
            SessionMode::Operational
        } else {
            SessionMode::Training
        }
    }
}

/// Outcome of an operational (sample) trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleResult {
    /// True positive
    #[serde(rename = "VP")]
    TruePositive,
    /// False positive
    #[serde(rename = "FP")]
    FalsePositive,
    /// True negative
    #[serde(rename = "VN")]
    TrueNegative,
    /// False negative
    #[serde(rename = "FN")]
    FalseNegative,
}

impl SampleResult {
    pub fn code(&self) -> &'static str {
        match self {
            SampleResult::TruePositive => "VP",
            SampleResult::FalsePositive => "FP",
            SampleResult::TrueNegative => "VN",
            SampleResult::FalseNegative => "FN",
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "VP" => Some(SampleResult::TruePositive),
            "FP" => Some(SampleResult::FalsePositive),
            "VN" => Some(SampleResult::TrueNegative),
            "FN" => Some(SampleResult::FalseNegative),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        match self {
            SampleResult::TruePositive | SampleResult::TrueNegative => true,
            SampleResult::FalsePositive | SampleResult::FalseNegative => false,
        }
    }
}

/// A detection dog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    pub id: String,
    pub name: String,
    pub breed: String,
    /// Age in years
    pub age: f64,
    pub level: CertificationLevel,
    /// Reserved, always empty
    pub handler_id: String,
    pub avatar_url: String,
}

/// A trainer (handler)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trainer {
    pub id: String,
    pub name: String,
    pub role: String,
    pub avatar_url: String,
}

/// Fields only meaningful for training sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDetail {
    pub record_type: String,
    pub module: String,
    pub target_odor: String,
    /// Correct learning units
    pub ua_c: u32,
    /// Incorrect learning units
    pub ua_i: u32,
}

/// Fields only meaningful for operational sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalDetail {
    pub sample_id: String,
    pub position: String,
    pub result: Option<SampleResult>,
}

/// Mode-specific part of a session; exactly one group exists per record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum SessionDetail {
    Training(TrainingDetail),
    Operational(OperationalDetail),
}

impl SessionDetail {
    pub fn mode(&self) -> SessionMode {
        match self {
            SessionDetail::Training(_) => SessionMode::Training,
            SessionDetail::Operational(_) => SessionMode::Operational,
        }
    }
}

/// Counters derived from the mode-specific fields.
///
/// `hits + misses` is the number of opportunities the record contributes to
/// accuracy, whatever the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub hits: u32,
    pub misses: u32,
    pub false_positives: u32,
}

impl Counters {
    /// Derive counters from a session's mode-specific detail
    pub fn derive(detail: &SessionDetail) -> Self {
        match detail {
            SessionDetail::Training(t) => Counters {
                hits: t.ua_c,
                misses: t.ua_i,
                false_positives: 0,
            },
            SessionDetail::Operational(o) => match o.result {
                Some(SampleResult::TruePositive) | Some(SampleResult::TrueNegative) => Counters {
                    hits: 1,
                    misses: 0,
                    false_positives: 0,
                },
                Some(SampleResult::FalseNegative) => Counters {
                    hits: 0,
                    misses: 1,
                    false_positives: 0,
                },
                Some(SampleResult::FalsePositive) => Counters {
                    hits: 0,
                    misses: 1,
                    false_positives: 1,
                },
                None => Counters::default(),
            },
        }
    }

    /// Saturates at `u32::MAX`
    pub fn opportunities(&self) -> u32 {
        self.hits.saturating_add(self.misses)
    }
}

/// A reconciled training or detection session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Stable only within one load
    pub id: String,
    pub date: DateTime<Utc>,
    /// Weak reference into the dog registry
    pub dog_id: String,
    /// Weak reference into the trainer registry, or [`UNKNOWN_TRAINER_ID`]
    pub trainer_id: String,
    #[serde(flatten)]
    pub detail: SessionDetail,
    #[serde(flatten)]
    pub counters: Counters,
    pub reinforcer: String,
    pub schedule: String,
    pub notes: String,
}

impl SessionRecord {
    pub fn mode(&self) -> SessionMode {
        self.detail.mode()
    }

    pub fn training(&self) -> Option<&TrainingDetail> {
        match &self.detail {
            SessionDetail::Training(t) => Some(t),
            SessionDetail::Operational(_) => None,
        }
    }

    pub fn operational(&self) -> Option<&OperationalDetail> {
        match &self.detail {
            SessionDetail::Operational(o) => Some(o),
            SessionDetail::Training(_) => None,
        }
    }
}
