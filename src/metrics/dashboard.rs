//! Dashboard aggregation
//!
//! All figures are computed over the sessions of one mode. The rolling window
//! is anchored on the most recent session of that mode rather than on today,
//! so a unit that paused training still sees its last active week.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{round1, saturating_sum, Tally};
use crate::types::{Dog, SessionMode, SessionRecord, Trainer};

/// Default rolling window length in calendar days
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Default number of ranked entities
pub const DEFAULT_TOP_N: usize = 5;

/// Mode-specific second headline figure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SecondaryMetric {
    /// Training: mean correct learning units per session, one decimal
    AverageHitsPerSession(f64),
    /// Operational: number of false-positive outcomes
    FalsePositives(u32),
}

/// Calendar-day span of the rolling window, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RollingWindow {
    /// Window of `days` calendar days ending on the anchor's UTC day
    pub fn ending_at(anchor: DateTime<Utc>, days: u32) -> Self {
        let end = anchor.date_naive();
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: end - Duration::days(span),
            end,
        }
    }

    /// Anchor on the latest session date, or `now` when there is none
    pub fn anchored<'a>(
        sessions: impl IntoIterator<Item = &'a SessionRecord>,
        days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let anchor = sessions.into_iter().map(|s| s.date).max().unwrap_or(now);
        Self::ending_at(anchor, days)
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        let day = instant.date_naive();
        self.start <= day && day <= self.end
    }

    /// Every calendar day in the window, oldest first
    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .collect()
    }
}

/// Accuracy of one calendar day inside the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAccuracy {
    pub date: NaiveDate,
    pub successes: u32,
    pub total: u32,
    /// Rounded percentage, 0 for days without opportunities
    pub accuracy: u32,
}

/// Window performance of one dog or trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPerformance {
    pub id: String,
    pub name: String,
    pub accuracy: f64,
    pub sessions: usize,
}

/// Headline statistics for one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub mode: SessionMode,
    pub total_sessions: usize,
    pub global_accuracy: f64,
    pub secondary: SecondaryMetric,
    /// Distinct dogs with at least one session of this mode, all time
    pub active_dogs: usize,
    pub window: RollingWindow,
    /// Sessions of this mode inside the window
    pub window_volume: usize,
    pub daily: Vec<DailyAccuracy>,
    pub top_dogs: Vec<EntityPerformance>,
    pub top_trainers: Vec<EntityPerformance>,
}

/// Aggregator for the dashboard view
#[derive(Debug, Clone, Copy)]
pub struct MetricsAggregator {
    window_days: u32,
    top_n: usize,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS, DEFAULT_TOP_N)
    }
}

impl MetricsAggregator {
    pub fn new(window_days: u32, top_n: usize) -> Self {
        Self { window_days, top_n }
    }

    /// Compute the dashboard for `mode`
    pub fn compute(
        &self,
        mode: SessionMode,
        sessions: &[SessionRecord],
        dogs: &[Dog],
        trainers: &[Trainer],
    ) -> DashboardStats {
        self.compute_at(mode, sessions, dogs, trainers, Utc::now())
    }

    /// [`compute`](Self::compute) with an explicit anchor fallback for empty sets
    pub fn compute_at(
        &self,
        mode: SessionMode,
        sessions: &[SessionRecord],
        dogs: &[Dog],
        trainers: &[Trainer],
        now: DateTime<Utc>,
    ) -> DashboardStats {
        let filtered = filter_mode(sessions, mode);
        let window = RollingWindow::anchored(filtered.iter().copied(), self.window_days, now);
        let in_window: Vec<&SessionRecord> = filtered
            .iter()
            .copied()
            .filter(|s| window.contains(&s.date))
            .collect();

        let dog_performance = entity_performance(
            dogs.iter().map(|d| (d.id.as_str(), d.name.as_str())),
            &in_window,
            |s| s.dog_id.as_str(),
        );
        let trainer_performance = entity_performance(
            trainers.iter().map(|t| (t.id.as_str(), t.name.as_str())),
            &in_window,
            |s| s.trainer_id.as_str(),
        );

        DashboardStats {
            mode,
            total_sessions: filtered.len(),
            global_accuracy: Tally::over(filtered.iter().copied()).accuracy(),
            secondary: secondary_metric(mode, &filtered),
            active_dogs: active_dogs(&filtered),
            window,
            window_volume: in_window.len(),
            daily: daily_accuracy(&window, &in_window),
            top_dogs: top_performers(dog_performance, self.top_n),
            top_trainers: top_performers(trainer_performance, self.top_n),
        }
    }
}

/// Sessions of one mode, input order preserved
pub fn filter_mode(sessions: &[SessionRecord], mode: SessionMode) -> Vec<&SessionRecord> {
    sessions.iter().filter(|s| s.mode() == mode).collect()
}

/// Second headline figure for a mode-filtered set
pub fn secondary_metric(mode: SessionMode, sessions: &[&SessionRecord]) -> SecondaryMetric {
    match mode {
        SessionMode::Training => {
            let hits = saturating_sum(sessions.iter().map(|s| s.counters.hits));
            let average = if sessions.is_empty() {
                0.0
            } else {
                hits as f64 / sessions.len() as f64
            };
            SecondaryMetric::AverageHitsPerSession(round1(average))
        }
        SessionMode::Operational => {
            SecondaryMetric::FalsePositives(saturating_sum(
                sessions.iter().map(|s| s.counters.false_positives),
            ))
        }
    }
}

/// Distinct dog ids in the set
pub fn active_dogs(sessions: &[&SessionRecord]) -> usize {
    sessions
        .iter()
        .map(|s| s.dog_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// One bucket per calendar day of the window, empty days included
pub fn daily_accuracy(window: &RollingWindow, sessions: &[&SessionRecord]) -> Vec<DailyAccuracy> {
    window
        .days()
        .into_iter()
        .map(|day| {
            let tally = Tally::over(
                sessions
                    .iter()
                    .copied()
                    .filter(|s| s.date.date_naive() == day),
            );
            DailyAccuracy {
                date: day,
                successes: tally.successes,
                total: tally.opportunities(),
                accuracy: tally.accuracy().round() as u32,
            }
        })
        .collect()
}

/// Window performance for each entity, in registry order
pub fn entity_performance<'a>(
    entities: impl IntoIterator<Item = (&'a str, &'a str)>,
    window_sessions: &[&SessionRecord],
    key: impl Fn(&SessionRecord) -> &str,
) -> Vec<EntityPerformance> {
    entities
        .into_iter()
        .map(|(id, name)| {
            let own: Vec<&SessionRecord> = window_sessions
                .iter()
                .copied()
                .filter(|s| key(*s) == id)
                .collect();
            EntityPerformance {
                id: id.to_string(),
                name: name.to_string(),
                accuracy: Tally::over(own.iter().copied()).accuracy(),
                sessions: own.len(),
            }
        })
        .collect()
}

/// Entities with window activity, best accuracy first, ties kept in input order
pub fn top_performers(performance: Vec<EntityPerformance>, n: usize) -> Vec<EntityPerformance> {
    let mut ranked: Vec<EntityPerformance> =
        performance.into_iter().filter(|p| p.sessions > 0).collect();
    ranked.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
    ranked.truncate(n);
    ranked
}
