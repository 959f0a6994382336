//! Pipeline orchestration
//!
//! This module provides the public API for K9 Flux. It runs a fetch-all body
//! through the ingestion stages and owns the application state between
//! fetches.
//!
//! Pipeline stages:
//! 1. `SheetPayload` - tolerant table decoding
//! 2. `reconcile_dogs` / `reconcile_trainers` - entity registries
//! 3. `build_sessions` - session records, growing the dog registry
//! 4. `MetricsAggregator` and the roster summaries - read models

use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::{
    build_sessions, reconcile_dogs, reconcile_trainers, AvatarSource, InitialsAvatars,
};
use crate::config::DashboardConfig;
use crate::encoder::SubmissionEncoder;
use crate::error::{FluxError, StoreError};
use crate::metrics::{
    roster, team, DashboardStats, MetricsAggregator, ModuleHistory, RosterEntry, TeamEntry,
    TrainerDetail,
};
use crate::schema::SheetPayload;
use crate::store::{SheetStore, StoreCommand};
use crate::types::{Dog, SessionMode, SessionRecord, Trainer};

/// One consistent view of the three tables
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub dogs: Vec<Dog>,
    pub trainers: Vec<Trainer>,
    pub sessions: Vec<SessionRecord>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.dogs.is_empty() && self.trainers.is_empty() && self.sessions.is_empty()
    }

    pub fn dashboard(&self, mode: SessionMode, aggregator: &MetricsAggregator) -> DashboardStats {
        aggregator.compute(mode, &self.sessions, &self.dogs, &self.trainers)
    }

    pub fn roster(&self, mode: SessionMode) -> Vec<RosterEntry> {
        roster(&self.dogs, &self.sessions, mode)
    }

    pub fn team(&self) -> Vec<TeamEntry> {
        team(&self.trainers, &self.sessions)
    }

    pub fn history(&self, dog_id: &str, mode: SessionMode) -> ModuleHistory {
        ModuleHistory::compute(dog_id, &self.sessions, mode)
    }

    pub fn trainer_detail(&self, trainer_id: &str) -> TrainerDetail {
        TrainerDetail::compute(trainer_id, &self.sessions)
    }

    /// First dog whose id or name (case-insensitive) matches `key`
    pub fn find_dog(&self, key: &str) -> Option<&Dog> {
        let wanted = key.to_lowercase();
        self.dogs
            .iter()
            .find(|d| d.id == key)
            .or_else(|| self.dogs.iter().find(|d| d.name.to_lowercase() == wanted))
    }
}

/// Run a decoded payload through reconciliation and session building.
///
/// Deterministic for a given payload and avatar source, except where rows
/// lack data: registry rows without an id get a fresh random id, and blank or
/// unparseable session dates fall back to the current instant. Auto-created
/// dogs are appended to `dogs`.
pub fn build_snapshot(payload: &SheetPayload, avatars: &dyn AvatarSource) -> Snapshot {
    let mut dogs = reconcile_dogs(&payload.dogs, avatars);
    let trainers = reconcile_trainers(&payload.trainers, avatars);
    let sessions = build_sessions(&payload.sessions, &mut dogs, &trainers, avatars);

    Snapshot {
        dogs,
        trainers,
        sessions,
    }
}

/// Convert a raw fetch-all body into a snapshot.
///
/// # Example
/// ```ignore
/// let snapshot = payload_to_snapshot(r#"{"dogs": [{"Name": "Atlas"}]}"#)?;
/// assert_eq!(snapshot.dogs.len(), 1);
/// ```
pub fn payload_to_snapshot(raw_json: &str) -> Result<Snapshot, FluxError> {
    let payload = SheetPayload::from_json(raw_json)?;
    Ok(build_snapshot(&payload, &InitialsAvatars::default()))
}

/// A local state transition paired with the append that mirrors it remotely
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveSessions(Vec<SessionRecord>),
    AddDog(Dog),
    AddTrainer(Trainer),
}

impl Command {
    /// Apply the optimistic transition. New sessions go first, new entities
    /// last.
    pub fn apply(&self, snapshot: &mut Snapshot) {
        match self {
            Command::SaveSessions(sessions) => {
                snapshot.sessions.splice(0..0, sessions.iter().cloned());
            }
            Command::AddDog(dog) => snapshot.dogs.push(dog.clone()),
            Command::AddTrainer(trainer) => snapshot.trainers.push(trainer.clone()),
        }
    }

    /// Outbound body, names resolved against `snapshot`
    pub fn to_store_command(&self, snapshot: &Snapshot, encoder: &SubmissionEncoder) -> StoreCommand {
        match self {
            Command::SaveSessions(sessions) => StoreCommand::SaveRawSessions {
                rows: encoder.encode(sessions, &snapshot.dogs, &snapshot.trainers),
            },
            Command::AddDog(dog) => StoreCommand::AddDog {
                payload: dog.clone(),
            },
            Command::AddTrainer(trainer) => StoreCommand::AddTrainer {
                payload: trainer.clone(),
            },
        }
    }

    /// Whether a reconciling re-fetch should follow a successful send
    pub fn needs_reconcile(&self) -> bool {
        matches!(self, Command::SaveSessions(_))
    }
}

/// Application controller.
///
/// Owns the single snapshot slot. Every mutation goes through `&mut self`, so
/// the last completed refresh is the published one.
pub struct Dashboard<S> {
    config: DashboardConfig,
    store: S,
    avatars: Box<dyn AvatarSource + Send + Sync>,
    aggregator: MetricsAggregator,
    encoder: Option<SubmissionEncoder>,
    snapshot: Snapshot,
}

impl<S: SheetStore> Dashboard<S> {
    pub fn new(config: DashboardConfig, store: S) -> Self {
        let aggregator = MetricsAggregator::new(config.window_days, config.top_n);
        Self {
            config,
            store,
            avatars: Box::new(InitialsAvatars::default()),
            aggregator,
            encoder: None,
            snapshot: Snapshot::default(),
        }
    }

    pub fn with_avatars(mut self, avatars: impl AvatarSource + Send + Sync + 'static) -> Self {
        self.avatars = Box::new(avatars);
        self
    }

    /// Use a fixed encoder instead of one stamped with today's date
    pub fn with_encoder(mut self, encoder: SubmissionEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn stats(&self, mode: SessionMode) -> DashboardStats {
        self.snapshot.dashboard(mode, &self.aggregator)
    }

    /// Fetch all tables and replace the snapshot.
    ///
    /// On failure the previous snapshot stays published. The controller is
    /// borrowed for the whole fetch, which stands in for a loading flag: it
    /// is usable again as soon as the fetch settles, success or not.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        match self.store.fetch_all().await {
            Ok(payload) => {
                self.snapshot = build_snapshot(&payload, self.avatars.as_ref());
                info!(
                    dogs = self.snapshot.dogs.len(),
                    trainers = self.snapshot.trainers.len(),
                    sessions = self.snapshot.sessions.len(),
                    "snapshot refreshed"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "refresh failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Apply `command` locally, then send it.
    ///
    /// A failed send leaves the optimistic change in place.
    pub async fn execute(&mut self, command: Command) -> Result<(), StoreError> {
        command.apply(&mut self.snapshot);

        let outbound = match &self.encoder {
            Some(encoder) => command.to_store_command(&self.snapshot, encoder),
            None => command.to_store_command(&self.snapshot, &SubmissionEncoder::new()),
        };

        match self.store.send(&outbound).await {
            Ok(()) => {
                info!(action = outbound.action(), "submitted");
                Ok(())
            }
            Err(e) => {
                warn!(action = outbound.action(), error = %e, "submission failed, local state kept");
                Err(e)
            }
        }
    }

    /// Wait for the configured delay, then refresh
    pub async fn reconcile(&mut self) -> Result<(), StoreError> {
        tokio::time::sleep(self.config.refresh_delay).await;
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Counters, SessionDetail, TrainingDetail, UNKNOWN_TRAINER_ID};
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;
    use url::Url;

    #[derive(Default)]
    struct MemoryStore {
        payload: Mutex<Option<SheetPayload>>,
        sent: Mutex<Vec<StoreCommand>>,
        fail_sends: bool,
    }

    impl MemoryStore {
        fn with_payload(value: serde_json::Value) -> Self {
            Self {
                payload: Mutex::new(Some(SheetPayload::from_value(&value))),
                ..Self::default()
            }
        }

        fn go_offline(&self) {
            *self.payload.lock().unwrap() = None;
        }

        fn sent(&self) -> Vec<StoreCommand> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl SheetStore for MemoryStore {
        fn fetch_all(&self) -> impl Future<Output = Result<SheetPayload, StoreError>> + Send {
            let result = self
                .payload
                .lock()
                .unwrap()
                .clone()
                .ok_or(StoreError::Status(503));
            async move { result }
        }

        fn send(&self, command: &StoreCommand) -> impl Future<Output = Result<(), StoreError>> + Send {
            self.sent.lock().unwrap().push(command.clone());
            let fail = self.fail_sends;
            async move {
                if fail {
                    Err(StoreError::Status(500))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn sample_payload() -> serde_json::Value {
        json!({
            "dogs": [{ "ID": "d1", "Nombre": "Atlas", "Nivel": "Certified" }],
            "trainers": [{ "id": "t1", "Nombre": "Ana", "Rol": "Guía" }],
            "sessions": [
                { "Perro": "Atlas", "Fecha": "10/03/2024", "Entrenador": "Ana", "UAC": "8", "UAL": "2" },
                { "Perro": "Rex", "Fecha": "11/03/2024", "Entrenador": "Marta", "Modo": "Muestras", "Resultado": "VP" },
                { "Perro": "", "Fecha": "11/03/2024" }
            ]
        })
    }

    fn config() -> DashboardConfig {
        DashboardConfig::new(Url::parse("https://sheets.example/exec").unwrap())
            .with_refresh_delay(Duration::from_millis(1500))
    }

    fn new_session(id: &str) -> SessionRecord {
        let detail = SessionDetail::Training(TrainingDetail {
            record_type: "10UA".to_string(),
            module: "Módulo Asociación".to_string(),
            target_odor: "OCP1".to_string(),
            ua_c: 9,
            ua_i: 1,
        });
        SessionRecord {
            id: id.to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 12, 12, 0, 0).unwrap(),
            dog_id: "d1".to_string(),
            trainer_id: "t1".to_string(),
            counters: Counters::derive(&detail),
            detail,
            reinforcer: "Comestible".to_string(),
            schedule: "Fijo".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_build_snapshot() {
        let payload = SheetPayload::from_value(&sample_payload());
        let snapshot = build_snapshot(&payload, &InitialsAvatars::default());

        assert_eq!(snapshot.dogs.len(), 2);
        assert_eq!(snapshot.dogs[1].name, "Rex");
        assert_eq!(snapshot.trainers.len(), 1);
        assert_eq!(snapshot.sessions.len(), 2);
        assert_eq!(snapshot.sessions[1].dog_id, snapshot.dogs[1].id);
        assert_eq!(snapshot.sessions[1].trainer_id, UNKNOWN_TRAINER_ID);
    }

    #[test]
    fn test_payload_to_snapshot() {
        let snapshot = payload_to_snapshot(r#"{"dogs": [{"Name": "Atlas"}], "sessions": 3}"#).unwrap();
        assert_eq!(snapshot.dogs.len(), 1);
        assert!(snapshot.sessions.is_empty());

        assert!(payload_to_snapshot("not valid json").is_err());
        assert!(payload_to_snapshot("{}").unwrap().is_empty());
    }

    #[test]
    fn test_find_dog_by_id_or_name() {
        let snapshot = payload_to_snapshot(&sample_payload().to_string()).unwrap();
        assert_eq!(snapshot.find_dog("d1").unwrap().name, "Atlas");
        assert_eq!(snapshot.find_dog("rex").unwrap().name, "Rex");
        assert!(snapshot.find_dog("Kira").is_none());
    }

    #[test]
    fn test_command_apply() {
        let mut snapshot = payload_to_snapshot(&sample_payload().to_string()).unwrap();
        let first = snapshot.sessions[0].id.clone();

        Command::SaveSessions(vec![new_session("s-a"), new_session("s-b")]).apply(&mut snapshot);
        let ids: Vec<&str> = snapshot.sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids[..3], ["s-a", "s-b", first.as_str()]);

        let trainer = Trainer {
            id: "t9".to_string(),
            name: "Luis".to_string(),
            role: String::new(),
            avatar_url: String::new(),
        };
        Command::AddTrainer(trainer.clone()).apply(&mut snapshot);
        assert_eq!(snapshot.trainers.last(), Some(&trainer));
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let mut dashboard = Dashboard::new(config(), MemoryStore::with_payload(sample_payload()));
        assert!(dashboard.snapshot().is_empty());

        dashboard.refresh().await.unwrap();
        assert_eq!(dashboard.snapshot().sessions.len(), 2);

        let stats = dashboard.stats(SessionMode::Training);
        assert_eq!(stats.global_accuracy, 80.0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let mut dashboard = Dashboard::new(config(), MemoryStore::with_payload(sample_payload()));
        dashboard.refresh().await.unwrap();
        let before = dashboard.snapshot().clone();

        dashboard.store().go_offline();
        assert!(dashboard.refresh().await.is_err());
        assert_eq!(dashboard.snapshot(), &before);
    }

    #[tokio::test]
    async fn test_execute_is_optimistic() {
        let mut dashboard = Dashboard::new(config(), MemoryStore::with_payload(sample_payload()))
            .with_encoder(SubmissionEncoder::with_registration_date(
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            ));
        dashboard.refresh().await.unwrap();

        let command = Command::SaveSessions(vec![new_session("s-new")]);
        assert!(command.needs_reconcile());
        dashboard.execute(command).await.unwrap();

        assert_eq!(dashboard.snapshot().sessions[0].id, "s-new");
        let sent = dashboard.store().sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            StoreCommand::SaveRawSessions { rows } => {
                assert_eq!(rows[0][0], json!("12/03/2024"));
                assert_eq!(rows[0][2], json!("Atlas"));
                assert_eq!(rows[0][3], json!("Ana"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_send_does_not_roll_back() {
        let store = MemoryStore {
            fail_sends: true,
            ..MemoryStore::default()
        };
        let mut dashboard = Dashboard::new(config(), store);

        let dog = Dog {
            id: "d-new".to_string(),
            name: "Kira".to_string(),
            breed: "Labrador".to_string(),
            age: 1.0,
            level: Default::default(),
            handler_id: String::new(),
            avatar_url: String::new(),
        };
        let result = dashboard.execute(Command::AddDog(dog)).await;

        assert!(matches!(result, Err(StoreError::Status(500))));
        assert_eq!(dashboard.snapshot().dogs.len(), 1);
        assert_eq!(dashboard.store().sent()[0].action(), "addDog");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconcile_waits_then_refreshes() {
        let mut dashboard = Dashboard::new(config(), MemoryStore::with_payload(sample_payload()));

        let started = tokio::time::Instant::now();
        dashboard.reconcile().await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(dashboard.snapshot().dogs.len(), 2);
    }
}
