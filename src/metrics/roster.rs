//! Roster and team summaries
//!
//! All-time figures per dog (within one mode) and per trainer (across modes),
//! plus the module/objective history shown on a dog's detail page.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{saturating_sum, Tally};
use crate::types::{Dog, SessionMode, SessionRecord, Trainer};

/// Module label used for groups built from operational sessions
pub const SAMPLES_MODULE: &str = "Muestras";

/// Objective label when a session names neither an odor nor a sample
pub const GENERAL_OBJECTIVE: &str = "General";

/// Mode-specific figure on a roster card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RosterFigure {
    /// Distinct training modules worked
    ModulesTrained(usize),
    /// False-positive outcomes
    FalsePositives(u32),
}

/// One dog's all-time summary for a mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub dog_id: String,
    pub name: String,
    pub sessions: usize,
    pub successes: u32,
    pub accuracy: f64,
    pub figure: RosterFigure,
}

/// Per-dog summaries for `mode`, ordered by name (case-insensitive)
pub fn roster(dogs: &[Dog], sessions: &[SessionRecord], mode: SessionMode) -> Vec<RosterEntry> {
    let mut entries: Vec<RosterEntry> = dogs
        .iter()
        .map(|dog| {
            let own: Vec<&SessionRecord> = sessions
                .iter()
                .filter(|s| s.dog_id == dog.id && s.mode() == mode)
                .collect();
            let tally = Tally::over(own.iter().copied());

            let figure = match mode {
                SessionMode::Training => RosterFigure::ModulesTrained(
                    own.iter()
                        .filter_map(|s| s.training())
                        .map(|t| t.module.as_str())
                        .filter(|m| !m.is_empty())
                        .collect::<HashSet<_>>()
                        .len(),
                ),
                SessionMode::Operational => RosterFigure::FalsePositives(
                    saturating_sum(own.iter().map(|s| s.counters.false_positives)),
                ),
            };

            RosterEntry {
                dog_id: dog.id.clone(),
                name: dog.name.clone(),
                sessions: own.len(),
                successes: tally.successes,
                accuracy: tally.accuracy(),
                figure,
            }
        })
        .collect();

    entries.sort_by_key(|e| e.name.to_lowercase());
    entries
}

/// One trainer's all-time summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    pub trainer_id: String,
    pub name: String,
    pub role: String,
    pub sessions: usize,
    pub success_rate: f64,
}

/// Per-trainer summaries across both modes, best success rate first
pub fn team(trainers: &[Trainer], sessions: &[SessionRecord]) -> Vec<TeamEntry> {
    let mut entries: Vec<TeamEntry> = trainers
        .iter()
        .map(|trainer| {
            let own: Vec<&SessionRecord> =
                sessions.iter().filter(|s| s.trainer_id == trainer.id).collect();
            TeamEntry {
                trainer_id: trainer.id.clone(),
                name: trainer.name.clone(),
                role: trainer.role.clone(),
                sessions: own.len(),
                success_rate: Tally::over(own.iter().copied()).accuracy(),
            }
        })
        .collect();

    entries.sort_by(|a, b| b.success_rate.total_cmp(&a.success_rate));
    entries
}

/// Successes and opportunities of one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayVolume {
    pub date: NaiveDate,
    pub successes: u32,
    pub opportunities: u32,
}

/// Detail page of one trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerDetail {
    pub trainer_id: String,
    pub total_successes: u32,
    pub success_rate: f64,
    pub distinct_dogs: usize,
    pub average_per_session: f64,
    pub average_per_day: f64,
    /// Oldest day first
    pub daily: Vec<DayVolume>,
}

impl TrainerDetail {
    pub fn compute(trainer_id: &str, sessions: &[SessionRecord]) -> Self {
        let own: Vec<&SessionRecord> = sessions
            .iter()
            .filter(|s| s.trainer_id == trainer_id)
            .collect();

        let mut by_day: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
        for session in &own {
            by_day.entry(session.date.date_naive()).or_default().add(session);
        }

        let tally = Tally::over(own.iter().copied());
        let per = |n: usize| {
            if n == 0 {
                0.0
            } else {
                tally.successes as f64 / n as f64
            }
        };

        Self {
            trainer_id: trainer_id.to_string(),
            total_successes: tally.successes,
            success_rate: tally.accuracy(),
            distinct_dogs: own.iter().map(|s| s.dog_id.as_str()).collect::<HashSet<_>>().len(),
            average_per_session: per(own.len()),
            average_per_day: per(by_day.len()),
            daily: by_day
                .into_iter()
                .map(|(date, t)| DayVolume {
                    date,
                    successes: t.successes,
                    opportunities: t.opportunities(),
                })
                .collect(),
        }
    }
}

/// Sessions sharing a module and objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryGroup {
    pub module: String,
    pub objective: String,
    pub first_date: DateTime<Utc>,
    pub session_ids: Vec<String>,
    pub successes: u32,
    pub opportunities: u32,
    pub accuracy: f64,
}

/// A dog's progression through modules and objectives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleHistory {
    /// The group whose first session is the most recent
    pub current: Option<HistoryGroup>,
    /// Earlier groups, oldest first
    pub previous: Vec<HistoryGroup>,
}

impl ModuleHistory {
    pub fn compute(dog_id: &str, sessions: &[SessionRecord], mode: SessionMode) -> Self {
        let mut own: Vec<&SessionRecord> = sessions
            .iter()
            .filter(|s| s.dog_id == dog_id && s.mode() == mode)
            .collect();
        own.sort_by_key(|s| s.date);

        let mut groups: Vec<(HistoryGroup, Tally)> = Vec::new();
        for session in own {
            let (module, objective) = history_key(session);
            let index = match groups
                .iter()
                .position(|(g, _)| g.module == module && g.objective == objective)
            {
                Some(index) => index,
                None => {
                    groups.push((
                        HistoryGroup {
                            module,
                            objective,
                            first_date: session.date,
                            session_ids: Vec::new(),
                            successes: 0,
                            opportunities: 0,
                            accuracy: 0.0,
                        },
                        Tally::default(),
                    ));
                    groups.len() - 1
                }
            };
            let (group, tally) = &mut groups[index];
            group.session_ids.push(session.id.clone());
            tally.add(session);
        }

        // Sessions are date-sorted, so groups already are in first-date order
        let mut previous: Vec<HistoryGroup> = groups
            .into_iter()
            .map(|(mut group, tally)| {
                group.successes = tally.successes;
                group.opportunities = tally.opportunities();
                group.accuracy = tally.accuracy();
                group
            })
            .collect();
        let current = previous.pop();

        Self { current, previous }
    }
}

fn history_key(session: &SessionRecord) -> (String, String) {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    match (session.training(), session.operational()) {
        (Some(t), _) => (
            non_empty(&t.module).unwrap_or_else(|| SAMPLES_MODULE.to_string()),
            non_empty(&t.target_odor).unwrap_or_else(|| GENERAL_OBJECTIVE.to_string()),
        ),
        (None, Some(o)) => (
            SAMPLES_MODULE.to_string(),
            non_empty(&o.sample_id).unwrap_or_else(|| GENERAL_OBJECTIVE.to_string()),
        ),
        (None, None) => (SAMPLES_MODULE.to_string(), GENERAL_OBJECTIVE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CertificationLevel, Counters, OperationalDetail, SampleResult, SessionDetail,
        TrainingDetail,
    };
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn dog(id: &str, name: &str) -> Dog {
        Dog {
            id: id.to_string(),
            name: name.to_string(),
            breed: String::new(),
            age: 2.0,
            level: CertificationLevel::Novice,
            handler_id: String::new(),
            avatar_url: String::new(),
        }
    }

    fn trainer(id: &str, name: &str) -> Trainer {
        Trainer {
            id: id.to_string(),
            name: name.to_string(),
            role: "Guía".to_string(),
            avatar_url: String::new(),
        }
    }

    fn session(id: &str, dog_id: &str, trainer_id: &str, day: u32, detail: SessionDetail) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            date: Utc.with_ymd_and_hms(2024, 2, day, 12, 0, 0).unwrap(),
            dog_id: dog_id.to_string(),
            trainer_id: trainer_id.to_string(),
            counters: Counters::derive(&detail),
            detail,
            reinforcer: "Comestible".to_string(),
            schedule: "Fijo".to_string(),
            notes: String::new(),
        }
    }

    fn training(module: &str, odor: &str, ua_c: u32, ua_i: u32) -> SessionDetail {
        SessionDetail::Training(TrainingDetail {
            record_type: "10UA".to_string(),
            module: module.to_string(),
            target_odor: odor.to_string(),
            ua_c,
            ua_i,
        })
    }

    fn sample(result: SampleResult) -> SessionDetail {
        SessionDetail::Operational(OperationalDetail {
            sample_id: "M-7".to_string(),
            position: "2".to_string(),
            result: Some(result),
        })
    }

    #[test]
    fn test_roster_training() {
        let dogs = vec![dog("d2", "kira"), dog("d1", "Atlas"), dog("d3", "Bruno")];
        let sessions = vec![
            session("s-0", "d1", "t1", 1, training("Módulo Asociación", "OCP1", 9, 1)),
            session("s-1", "d1", "t1", 2, training("Módulo Transición", "OCP2", 7, 3)),
            session("s-2", "d1", "t1", 3, training("Módulo Asociación", "OCP2", 10, 0)),
            session("s-3", "d2", "t1", 3, sample(SampleResult::FalsePositive)),
        ];

        let entries = roster(&dogs, &sessions, SessionMode::Training);
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Atlas", "Bruno", "kira"]);

        assert_eq!(entries[0].sessions, 3);
        assert_eq!(entries[0].successes, 26);
        assert_eq!(entries[0].figure, RosterFigure::ModulesTrained(2));
        assert_eq!(entries[2].sessions, 0);
        assert_eq!(entries[2].accuracy, 0.0);
    }

    #[test]
    fn test_roster_operational() {
        let dogs = vec![dog("d1", "Atlas")];
        let sessions = vec![
            session("s-0", "d1", "t1", 1, sample(SampleResult::FalsePositive)),
            session("s-1", "d1", "t1", 2, sample(SampleResult::TruePositive)),
            session("s-2", "d1", "t1", 2, training("Módulo Vacíos", "OCP1", 5, 5)),
        ];

        let entries = roster(&dogs, &sessions, SessionMode::Operational);
        assert_eq!(entries[0].sessions, 2);
        assert_eq!(entries[0].accuracy, 50.0);
        assert_eq!(entries[0].figure, RosterFigure::FalsePositives(1));
    }

    #[test]
    fn test_team_sorted_by_success_rate() {
        let trainers = vec![trainer("t1", "Ana"), trainer("t2", "Luis"), trainer("t3", "Marta")];
        let sessions = vec![
            session("s-0", "d1", "t1", 1, training("M", "OCP1", 5, 5)),
            session("s-1", "d1", "t2", 1, training("M", "OCP1", 9, 1)),
            session("s-2", "d1", "t2", 1, sample(SampleResult::TrueNegative)),
        ];

        let entries = team(&trainers, &sessions);
        let ids: Vec<&str> = entries.iter().map(|e| e.trainer_id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t1", "t3"]);
        assert_eq!(entries[0].sessions, 2);
        assert_eq!(entries[0].success_rate, 10.0 / 11.0 * 100.0);
    }

    #[test]
    fn test_trainer_detail() {
        let sessions = vec![
            session("s-0", "d1", "t1", 1, training("M", "OCP1", 8, 2)),
            session("s-1", "d2", "t1", 1, training("M", "OCP1", 6, 4)),
            session("s-2", "d1", "t1", 3, training("M", "OCP1", 10, 0)),
            session("s-3", "d1", "t2", 3, training("M", "OCP1", 1, 9)),
        ];

        let detail = TrainerDetail::compute("t1", &sessions);
        assert_eq!(detail.total_successes, 24);
        assert_eq!(detail.success_rate, 80.0);
        assert_eq!(detail.distinct_dogs, 2);
        assert_eq!(detail.average_per_session, 8.0);
        assert_eq!(detail.average_per_day, 12.0);
        assert_eq!(detail.daily.len(), 2);
        assert_eq!(detail.daily[0].opportunities, 20);
    }

    #[test]
    fn test_module_history_groups() {
        let sessions = vec![
            session("s-2", "d1", "t1", 5, training("Módulo Discriminación", "OCP3", 9, 1)),
            session("s-0", "d1", "t1", 1, training("Módulo Asociación", "OCP1", 5, 5)),
            session("s-1", "d1", "t1", 3, training("Módulo Asociación", "OCP1", 8, 2)),
            session("s-3", "d1", "t1", 6, training("", "", 1, 1)),
            session("s-4", "d2", "t1", 7, training("Módulo Vacíos", "OCP1", 1, 1)),
        ];

        let history = ModuleHistory::compute("d1", &sessions, SessionMode::Training);

        let current = history.current.unwrap();
        assert_eq!(current.module, SAMPLES_MODULE);
        assert_eq!(current.objective, GENERAL_OBJECTIVE);

        assert_eq!(history.previous.len(), 2);
        assert_eq!(history.previous[0].module, "Módulo Asociación");
        assert_eq!(history.previous[0].session_ids, vec!["s-0", "s-1"]);
        assert_eq!(history.previous[0].accuracy, 65.0);
        assert_eq!(history.previous[1].objective, "OCP3");
    }

    #[test]
    fn test_module_history_empty() {
        let history = ModuleHistory::compute("d1", &[], SessionMode::Operational);
        assert_eq!(history, ModuleHistory::default());
    }
}
