//! Remote store
//!
//! The sessions spreadsheet sits behind a single web-app endpoint that knows
//! two operations: read every table, and append. There is no transaction and
//! no useful write acknowledgement.

use std::future::Future;

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::encoder::SheetRow;
use crate::error::StoreError;
use crate::schema::SheetPayload;
use crate::types::{Dog, Trainer};

/// Query parameter carrying the cache-busting timestamp on fetches
pub const CACHE_BUSTER_PARAM: &str = "t";

/// Body of an append request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action")]
pub enum StoreCommand {
    /// Append positional rows to the sessions sheet
    #[serde(rename = "save_raw_sessions")]
    SaveRawSessions { rows: Vec<SheetRow> },
    #[serde(rename = "addDog")]
    AddDog { payload: Dog },
    #[serde(rename = "addTrainer")]
    AddTrainer { payload: Trainer },
}

impl StoreCommand {
    pub fn action(&self) -> &'static str {
        match self {
            StoreCommand::SaveRawSessions { .. } => "save_raw_sessions",
            StoreCommand::AddDog { .. } => "addDog",
            StoreCommand::AddTrainer { .. } => "addTrainer",
        }
    }
}

/// Bulk-read / append collaborator
pub trait SheetStore {
    fn fetch_all(&self) -> impl Future<Output = Result<SheetPayload, StoreError>> + Send;

    /// Fire an append. Success means the request went out, not that the sheet
    /// accepted it.
    fn send(&self, command: &StoreCommand) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// [`SheetStore`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpSheetStore {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSheetStore {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn fetch_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair(
            CACHE_BUSTER_PARAM,
            &Utc::now().timestamp_millis().to_string(),
        );
        url
    }
}

impl SheetStore for HttpSheetStore {
    fn fetch_all(&self) -> impl Future<Output = Result<SheetPayload, StoreError>> + Send {
        let request = self.client.get(self.fetch_url());
        async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(StoreError::Status(status.as_u16()));
            }
            let body = response.text().await?;
            Ok(SheetPayload::from_json(&body)?)
        }
    }

    fn send(&self, command: &StoreCommand) -> impl Future<Output = Result<(), StoreError>> + Send {
        let action = command.action();
        let body = serde_json::to_string(command);
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        async move {
            let response = client
                .post(endpoint)
                .header(CONTENT_TYPE, "text/plain;charset=utf-8")
                .body(body?)
                .send()
                .await?;
            debug!(action, status = %response.status(), "append sent");
            Ok(())
        }
    }
}
