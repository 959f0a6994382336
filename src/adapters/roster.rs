//! Dog and trainer registries
//!
//! Rows with no resolvable name are blank spreadsheet lines and are dropped.
//! Duplicate names are kept as distinct entities; sessions bind to the first
//! case-insensitive match.

use tracing::debug;
use uuid::Uuid;

use super::AvatarSource;
use crate::normalizer::Normalizer;
use crate::schema::{Field, RawRow};
use crate::types::{CertificationLevel, Dog, Trainer};

/// Build the dog registry from the dogs table
pub fn reconcile_dogs(rows: &[RawRow], avatars: &dyn AvatarSource) -> Vec<Dog> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let row = Normalizer::normalize(raw);
            let Some(name) = row.text(Field::DogName) else {
                debug!(index, "skipping dog row without a name");
                return None;
            };

            let level = match row.text(Field::Level) {
                Some(label) => CertificationLevel::from_label(&label).unwrap_or_else(|| {
                    debug!(dog = %name, %label, "unknown certification level, using Novice");
                    CertificationLevel::Novice
                }),
                None => CertificationLevel::Novice,
            };

            let avatar_url = row
                .text(Field::DogAvatar)
                .unwrap_or_else(|| avatars.dog_avatar(&name));

            Some(Dog {
                id: row
                    .text(Field::DogId)
                    .unwrap_or_else(|| format!("d-{}", Uuid::new_v4())),
                breed: row.text_or(Field::Breed, ""),
                age: row.number(Field::Age),
                level,
                handler_id: String::new(),
                avatar_url,
                name,
            })
        })
        .collect()
}

/// Build the trainer registry from the trainers table
pub fn reconcile_trainers(rows: &[RawRow], avatars: &dyn AvatarSource) -> Vec<Trainer> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let row = Normalizer::normalize(raw);
            let Some(name) = row.text(Field::TrainerName) else {
                debug!(index, "skipping trainer row without a name");
                return None;
            };

            let avatar_url = row
                .text(Field::TrainerAvatar)
                .unwrap_or_else(|| avatars.trainer_avatar(&name));

            Some(Trainer {
                id: row
                    .text(Field::TrainerId)
                    .unwrap_or_else(|| format!("t-{}", Uuid::new_v4())),
                role: row.text_or(Field::Role, ""),
                avatar_url,
                name,
            })
        })
        .collect()
}
