//! Logical fields and their header aliases
//!
//! Each logical field maps to an ordered list of candidate header keys, in
//! their normalized (trimmed, lower-cased) spelling. Lookups try the aliases
//! in order and the first present value wins. Adding a new header spelling
//! means adding one string to [`FIELD_ALIASES`].

use serde_json::{Map, Value};

/// One spreadsheet row as delivered by the store: arbitrary string keys
pub type RawRow = Map<String, Value>;

/// Logical fields read from the dogs, trainers and sessions tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Dogs table
    DogId,
    DogName,
    Breed,
    Age,
    Level,
    DogAvatar,

    // Trainers table
    TrainerId,
    TrainerName,
    Role,
    TrainerAvatar,

    // Sessions table
    SessionDog,
    SessionDate,
    SessionTrainer,
    Mode,
    UaCorrect,
    UaIncorrect,
    Result,
    Module,
    TargetOdor,
    RecordType,
    Reinforcer,
    Schedule,
    SampleId,
    Position,
    Notes,
}

/// Ordered header aliases per logical field
pub const FIELD_ALIASES: &[(Field, &[&str])] = &[
    (Field::DogId, &["id"]),
    (Field::DogName, &["name", "nombre", "dogname"]),
    (Field::Breed, &["breed", "raza"]),
    (Field::Age, &["age", "edad"]),
    (Field::Level, &["level", "nivel"]),
    (Field::DogAvatar, &["avatar", "avatarurl"]),
    (Field::TrainerId, &["id"]),
    (Field::TrainerName, &["name", "nombre", "trainername"]),
    (Field::Role, &["role", "rol"]),
    (Field::TrainerAvatar, &["avatar", "avatarurl"]),
    (Field::SessionDog, &["dogname", "perro", "name"]),
    (Field::SessionDate, &["date", "sessiondate", "fecha sesión", "fecha"]),
    (Field::SessionTrainer, &["trainername", "entrenador"]),
    (Field::Mode, &["mode", "modo"]),
    (Field::UaCorrect, &["uac", "ua c"]),
    (Field::UaIncorrect, &["ual", "uai", "ua incorrectas"]),
    (Field::Result, &["result", "resultado"]),
    (Field::Module, &["module", "modulo", "módulo"]),
    (Field::TargetOdor, &["targetodor", "objetivo"]),
    (Field::RecordType, &["recordtype", "tipo registro"]),
    (Field::Reinforcer, &["reinforcer", "reforzador"]),
    (Field::Schedule, &["schedule", "programa"]),
    (Field::SampleId, &["sampleid", "muestra"]),
    (Field::Position, &["position", "posición", "posicion"]),
    (Field::Notes, &["notes", "notas"]),
];

impl Field {
    /// Candidate header keys for this field, in lookup order
    pub fn aliases(self) -> &'static [&'static str] {
        FIELD_ALIASES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_aliases() {
        let all = [
            Field::DogId,
            Field::DogName,
            Field::Breed,
            Field::Age,
            Field::Level,
            Field::DogAvatar,
            Field::TrainerId,
            Field::TrainerName,
            Field::Role,
            Field::TrainerAvatar,
            Field::SessionDog,
            Field::SessionDate,
            Field::SessionTrainer,
            Field::Mode,
            Field::UaCorrect,
            Field::UaIncorrect,
            Field::Result,
            Field::Module,
            Field::TargetOdor,
            Field::RecordType,
            Field::Reinforcer,
            Field::Schedule,
            Field::SampleId,
            Field::Position,
            Field::Notes,
        ];
        for field in all {
            assert!(!field.aliases().is_empty(), "{field:?} has no aliases");
        }
    }

    #[test]
    fn test_aliases_are_normalized() {
        for (field, aliases) in FIELD_ALIASES {
            for alias in *aliases {
                assert_eq!(
                    *alias,
                    alias.trim().to_lowercase(),
                    "alias {alias:?} of {field:?} is not normalized"
                );
            }
        }
    }
}
