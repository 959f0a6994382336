//! Submission encoding
//!
//! Turns session records back into the positional 16-column rows the sessions
//! sheet stores. Column order is fixed by the sheet; see [`columns`].

use chrono::{Local, NaiveDate};
use serde_json::Value;

use crate::dates::{canonical_day, localize_date};
use crate::types::{
    Dog, SessionDetail, SessionRecord, Trainer, DEFAULT_RECORD_TYPE, DEFAULT_REINFORCER,
    DEFAULT_SCHEDULE, UNKNOWN_TRAINER_NAME,
};

/// Number of columns in a sessions sheet row
pub const ROW_WIDTH: usize = 16;

/// Dog name written when the session's dog id is not in the registry
pub const UNKNOWN_DOG_NAME: &str = "Desconocido";

/// One positional sheet row
pub type SheetRow = Vec<Value>;

/// Column indices of a sessions sheet row (A through P)
pub mod columns {
    pub const REGISTERED_ON: usize = 0;
    pub const DATE: usize = 1;
    pub const DOG: usize = 2;
    pub const TRAINER: usize = 3;
    pub const MODE: usize = 4;
    pub const RECORD_TYPE: usize = 5;
    pub const MODULE: usize = 6;
    pub const TARGET_ODOR: usize = 7;
    pub const UA_C: usize = 8;
    pub const UA_I: usize = 9;
    pub const REINFORCER: usize = 10;
    pub const SCHEDULE: usize = 11;
    pub const SAMPLE_ID: usize = 12;
    pub const POSITION: usize = 13;
    pub const RESULT: usize = 14;
    pub const NOTES: usize = 15;
}

/// Encoder for the sessions sheet row format
pub struct SubmissionEncoder {
    registered_on: NaiveDate,
}

impl Default for SubmissionEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionEncoder {
    /// Create an encoder stamping rows with today's local date
    pub fn new() -> Self {
        Self {
            registered_on: Local::now().date_naive(),
        }
    }

    /// Create an encoder with a fixed registration date
    pub fn with_registration_date(registered_on: NaiveDate) -> Self {
        Self { registered_on }
    }

    /// Encode sessions, resolving dog and trainer names against the registries
    pub fn encode(
        &self,
        sessions: &[SessionRecord],
        dogs: &[Dog],
        trainers: &[Trainer],
    ) -> Vec<SheetRow> {
        sessions
            .iter()
            .map(|session| self.encode_one(session, dogs, trainers))
            .collect()
    }

    fn encode_one(&self, session: &SessionRecord, dogs: &[Dog], trainers: &[Trainer]) -> SheetRow {
        let dog_name = dogs
            .iter()
            .find(|d| d.id == session.dog_id)
            .map_or(UNKNOWN_DOG_NAME, |d| d.name.as_str());
        let trainer_name = trainers
            .iter()
            .find(|t| t.id == session.trainer_id)
            .map_or(UNKNOWN_TRAINER_NAME, |t| t.name.as_str());

        let mut row: SheetRow = vec![Value::from(""); ROW_WIDTH];
        row[columns::REGISTERED_ON] = self.registered_on.format("%d/%m/%Y").to_string().into();
        row[columns::DATE] = localize_date(&canonical_day(&session.date)).into();
        row[columns::DOG] = dog_name.into();
        row[columns::TRAINER] = trainer_name.into();
        row[columns::MODE] = session.mode().sheet_label().into();
        row[columns::REINFORCER] = or_default(&session.reinforcer, DEFAULT_REINFORCER).into();
        row[columns::SCHEDULE] = or_default(&session.schedule, DEFAULT_SCHEDULE).into();
        row[columns::NOTES] = session.notes.as_str().into();

        match &session.detail {
            SessionDetail::Training(t) => {
                row[columns::RECORD_TYPE] = or_default(&t.record_type, DEFAULT_RECORD_TYPE).into();
                row[columns::MODULE] = t.module.as_str().into();
                row[columns::TARGET_ODOR] = t.target_odor.as_str().into();
                row[columns::UA_C] = t.ua_c.into();
                row[columns::UA_I] = t.ua_i.into();
            }
            SessionDetail::Operational(o) => {
                row[columns::SAMPLE_ID] = o.sample_id.as_str().into();
                row[columns::POSITION] = o.position.as_str().into();
                row[columns::RESULT] = o.result.map_or("", |r| r.code()).into();
            }
        }

        row
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CertificationLevel, Counters, OperationalDetail, SampleResult, TrainingDetail,
    };
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn registries() -> (Vec<Dog>, Vec<Trainer>) {
        let dogs = vec![Dog {
            id: "d1".to_string(),
            name: "Atlas".to_string(),
            breed: String::new(),
            age: 3.0,
            level: CertificationLevel::Certified,
            handler_id: String::new(),
            avatar_url: String::new(),
        }];
        let trainers = vec![Trainer {
            id: "t1".to_string(),
            name: "Ana".to_string(),
            role: "Guía".to_string(),
            avatar_url: String::new(),
        }];
        (dogs, trainers)
    }

    fn record(detail: SessionDetail) -> SessionRecord {
        SessionRecord {
            id: "s-0".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            dog_id: "d1".to_string(),
            trainer_id: "t1".to_string(),
            counters: Counters::derive(&detail),
            detail,
            reinforcer: "Juguete".to_string(),
            schedule: "Variable".to_string(),
            notes: "ok".to_string(),
        }
    }

    fn encoder() -> SubmissionEncoder {
        SubmissionEncoder::with_registration_date(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap())
    }

    #[test]
    fn test_encode_training_row() {
        let (dogs, trainers) = registries();
        let session = record(SessionDetail::Training(TrainingDetail {
            record_type: String::new(),
            module: "M1".to_string(),
            target_odor: "OCP1".to_string(),
            ua_c: 5,
            ua_i: 1,
        }));

        let rows = encoder().encode(&[session], &dogs, &trainers);
        assert_eq!(
            Value::from(rows[0].clone()),
            json!([
                "06/03/2024", "05/03/2024", "Atlas", "Ana", "Entrenamiento",
                "Libre", "M1", "OCP1", 5, 1,
                "Juguete", "Variable",
                "", "", "",
                "ok"
            ])
        );
    }

    #[test]
    fn test_blanking_patterns_are_inverse() {
        let (dogs, trainers) = registries();
        let training = record(SessionDetail::Training(TrainingDetail {
            record_type: "10UA".to_string(),
            module: "M1".to_string(),
            target_odor: "OCP2".to_string(),
            ua_c: 5,
            ua_i: 1,
        }));
        let operational = record(SessionDetail::Operational(OperationalDetail {
            sample_id: "M-3".to_string(),
            position: "2".to_string(),
            result: Some(SampleResult::FalseNegative),
        }));

        let rows = encoder().encode(&[training, operational], &dogs, &trainers);
        let blank = Value::from("");

        for row in &rows {
            assert_eq!(row.len(), ROW_WIDTH);
        }
        assert!((5..=9).all(|i| rows[0][i] != blank));
        assert!((12..=14).all(|i| rows[0][i] == blank));
        assert!((5..=9).all(|i| rows[1][i] == blank));
        assert!((12..=14).all(|i| rows[1][i] != blank));

        assert_eq!(rows[1][columns::MODE], json!("Muestras"));
        assert_eq!(rows[1][columns::RESULT], json!("FN"));
    }

    #[test]
    fn test_unknown_registry_ids_fall_back() {
        let mut session = record(SessionDetail::Operational(OperationalDetail {
            sample_id: "M-1".to_string(),
            position: String::new(),
            result: None,
        }));
        session.dog_id = "gone".to_string();
        session.trainer_id = "unknown".to_string();
        session.reinforcer.clear();
        session.schedule.clear();

        let rows = encoder().encode(&[session], &[], &[]);
        assert_eq!(rows[0][columns::DOG], json!(UNKNOWN_DOG_NAME));
        assert_eq!(rows[0][columns::TRAINER], json!("Unknown"));
        assert_eq!(rows[0][columns::REINFORCER], json!("Comestible"));
        assert_eq!(rows[0][columns::SCHEDULE], json!("Fijo"));
        assert_eq!(rows[0][columns::RESULT], json!(""));
    }
}
