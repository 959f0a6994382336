//! Session records
//!
//! Parses the sessions table into canonical records. Dog references that
//! miss the registry create a placeholder dog; trainer references that miss
//! bind to the "unknown" sentinel and leave the trainer registry untouched.
//! The asymmetry is a business rule: dogs are routinely logged before anyone
//! fills in the dogs sheet, trainers are not.

use tracing::debug;

use super::AvatarSource;
use crate::dates::parse_date;
use crate::normalizer::{NormalizedRow, Normalizer};
use crate::schema::{Field, RawRow};
use crate::types::{
    CertificationLevel, Counters, Dog, OperationalDetail, SampleResult, SessionDetail,
    SessionMode, SessionRecord, Trainer, TrainingDetail, AUTO_DETECTED_BREED,
    DEFAULT_RECORD_TYPE, DEFAULT_REINFORCER, DEFAULT_SCHEDULE, UNKNOWN_TRAINER_ID,
    UNKNOWN_TRAINER_NAME,
};

/// Id of the session built from row `index`
pub fn session_id(index: usize) -> String {
    format!("s-{index}")
}

/// Id of the placeholder dog created while reading row `index`
pub fn auto_dog_id(index: usize) -> String {
    format!("d-auto-{index}")
}

/// Parse the sessions table.
///
/// `dogs` receives one appended placeholder per unmatched dog name; later
/// rows naming the same dog bind to that placeholder. Output keeps input
/// order; rows without a dog name or a date are dropped.
pub fn build_sessions(
    rows: &[RawRow],
    dogs: &mut Vec<Dog>,
    trainers: &[Trainer],
    avatars: &dyn AvatarSource,
) -> Vec<SessionRecord> {
    let mut sessions = Vec::with_capacity(rows.len());

    for (index, raw) in rows.iter().enumerate() {
        let row = Normalizer::normalize(raw);

        let (Some(dog_name), Some(raw_date)) =
            (row.text(Field::SessionDog), row.text(Field::SessionDate))
        else {
            debug!(index, "skipping session row without dog or date");
            continue;
        };

        let dog_id = resolve_dog(&dog_name, index, dogs, avatars);
        let trainer_id = resolve_trainer(&row, trainers);

        let mode = row
            .text(Field::Mode)
            .map(|raw| SessionMode::classify(&raw))
            .unwrap_or(SessionMode::Training);
        let detail = build_detail(&row, mode);
        let counters = Counters::derive(&detail);

        sessions.push(SessionRecord {
            id: session_id(index),
            date: parse_date(&raw_date),
            dog_id,
            trainer_id,
            detail,
            counters,
            reinforcer: row.text_or(Field::Reinforcer, DEFAULT_REINFORCER),
            schedule: row.text_or(Field::Schedule, DEFAULT_SCHEDULE),
            notes: row.text_or(Field::Notes, ""),
        });
    }

    sessions
}

fn resolve_dog(
    name: &str,
    index: usize,
    dogs: &mut Vec<Dog>,
    avatars: &dyn AvatarSource,
) -> String {
    if let Some(dog) = find_by_name(dogs, name, |d| &d.name) {
        return dog.id.clone();
    }

    let dog = Dog {
        id: auto_dog_id(index),
        name: name.to_string(),
        breed: AUTO_DETECTED_BREED.to_string(),
        age: 0.0,
        level: CertificationLevel::Novice,
        handler_id: String::new(),
        avatar_url: avatars.dog_avatar(name),
    };
    debug!(dog = %dog.name, id = %dog.id, "auto-created dog from session row");
    let id = dog.id.clone();
    dogs.push(dog);
    id
}

fn resolve_trainer(row: &NormalizedRow, trainers: &[Trainer]) -> String {
    let name = row.text_or(Field::SessionTrainer, UNKNOWN_TRAINER_NAME);
    match find_by_name(trainers, &name, |t| &t.name) {
        Some(trainer) => trainer.id.clone(),
        None => {
            debug!(trainer = %name, "trainer not in registry, binding to sentinel");
            UNKNOWN_TRAINER_ID.to_string()
        }
    }
}

/// First entity whose name matches case-insensitively
fn find_by_name<'a, T>(
    entities: &'a [T],
    name: &str,
    name_of: impl Fn(&T) -> &String,
) -> Option<&'a T> {
    let wanted = name.to_lowercase();
    entities
        .iter()
        .find(|entity| name_of(entity).to_lowercase() == wanted)
}

fn build_detail(row: &NormalizedRow, mode: SessionMode) -> SessionDetail {
    match mode {
        SessionMode::Training => SessionDetail::Training(TrainingDetail {
            record_type: row.text_or(Field::RecordType, DEFAULT_RECORD_TYPE),
            module: row.text_or(Field::Module, ""),
            target_odor: row.text_or(Field::TargetOdor, ""),
            ua_c: row.counter(Field::UaCorrect),
            ua_i: row.counter(Field::UaIncorrect),
        }),
        SessionMode::Operational => {
            let result = row.text(Field::Result).and_then(|code| {
                let parsed = SampleResult::from_code(&code);
                if parsed.is_none() {
                    debug!(%code, "unrecognized sample result");
                }
                parsed
            });
            SessionDetail::Operational(OperationalDetail {
                sample_id: row.text_or(Field::SampleId, ""),
                position: row.text_or(Field::Position, ""),
                result,
            })
        }
    }
}
