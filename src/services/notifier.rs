use crate::config::{NotifierConfig, global};
use crate::core::outcome::{DispatchError, DispatchOutcome};
use crate::core::payload::IncidentPayload;
use crate::core::record::{IncidentField, RecordEvent, RecordSnapshot};
use crate::observability::prom;
use crate::services::directory::{NullDirectory, UserDirectory};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Relays one record-change event as one webhook POST. Fire-and-forget:
/// every failure is logged and folded into the returned outcome, so a
/// broken webhook can never take the triggering transaction down with it.
/// One invocation makes at most one POST; there are no retries.
pub struct Notifier {
    cfg: NotifierConfig,
    client: Client,
    directory: Arc<dyn UserDirectory>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_config(NotifierConfig::default())
    }

    pub fn with_config(cfg: NotifierConfig) -> Self {
        Self::with_directory(cfg, Arc::new(NullDirectory))
    }

    pub fn with_directory(cfg: NotifierConfig, directory: Arc<dyn UserDirectory>) -> Self {
        prom::init_prometheus();
        let client = match Client::builder().timeout(Duration::from_secs(cfg.timeout_secs)).build() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    target: "increlay::notifier",
                    "http client build failed ({e}); falling back to default client"
                );
                Client::new()
            }
        };
        Self { cfg, client, directory }
    }

    /// Trigger entry point. Only the current row is dispatched; the previous
    /// row, when present, is trace material.
    pub async fn handle(&self, event: &RecordEvent) -> DispatchOutcome {
        tracing::debug!(
            target: "increlay::notifier",
            has_previous = event.previous.is_some(),
            "record change event received"
        );
        self.dispatch(&event.current).await
    }

    pub async fn dispatch(&self, record: &RecordSnapshot) -> DispatchOutcome {
        let started = Instant::now();
        let outcome = match self.send(record).await {
            Ok((status, body)) => {
                if global().log_response_body {
                    tracing::info!(target: "increlay::notifier", status, "webhook response: {body}");
                } else {
                    tracing::info!(target: "increlay::notifier", status, "webhook response received");
                }
                DispatchOutcome::Delivered { status, body }
            }
            Err(error) => {
                tracing::error!(target: "increlay::notifier", "webhook dispatch failed: {error}");
                DispatchOutcome::Failed { error }
            }
        };
        prom::observe_dispatch(outcome.label(), started.elapsed().as_secs_f64());
        outcome
    }

    async fn send(&self, record: &RecordSnapshot) -> Result<(u16, String), DispatchError> {
        let reported_by_email = self.resolve_reporter(record).await;
        let payload = IncidentPayload::from_record(record, reported_by_email);

        let number = record
            .value(IncidentField::Number)
            .ok_or(DispatchError::MissingNumber)?;
        let url = self.endpoint_for(number)?;

        let body = serde_json::to_string(&payload)?;
        if global().log_payload_body {
            tracing::info!(target: "increlay::notifier", number, "webhook body: {body}");
        }

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Best-effort enrichment: an absent caller, a failed lookup and a
    /// lookup timeout all come back as None.
    async fn resolve_reporter(&self, record: &RecordSnapshot) -> Option<String> {
        let caller_id = record.value(IncidentField::CallerId)?;
        let lookup = self.directory.email_for(caller_id);
        match tokio::time::timeout(Duration::from_secs(self.cfg.lookup_timeout_secs), lookup).await {
            Ok(Ok(email)) => email,
            Ok(Err(e)) => {
                tracing::warn!(target: "increlay::notifier", caller_id, "reporter lookup failed: {e}");
                None
            }
            Err(_) => {
                tracing::warn!(target: "increlay::notifier", caller_id, "reporter lookup timed out");
                None
            }
        }
    }

    /// Endpoint = base URL plus the record number as one encoded path
    /// segment, so a strange number can rename the target record but never
    /// rewrite the path around it.
    fn endpoint_for(&self, number: &str) -> Result<Url, DispatchError> {
        let mut url = Url::parse(&self.cfg.base_url).map_err(|e| {
            DispatchError::Endpoint(format!("invalid base URL {:?}: {e}", self.cfg.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                DispatchError::Endpoint(format!(
                    "base URL {:?} cannot take a path segment",
                    self.cfg.base_url
                ))
            })?
            .pop_if_empty()
            .push(number);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::directory::{DirectoryError, StaticDirectory};
    use async_trait::async_trait;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn full_record() -> RecordSnapshot {
        RecordSnapshot::from_named([
            ("number", "INC0010001"),
            ("caller_id", "u1"),
            ("opened_at", "2024-01-01 00:00:00"),
            ("impact", "1"),
            ("urgency", "1"),
            ("short_description", "down"),
            ("description", "prod down"),
            ("category", "network"),
            ("priority", "1"),
            ("sys_id", "abc123"),
            ("subcategory", "outage"),
            ("state", "1"),
            ("u_source_ip", "10.0.0.1"),
            ("u_destination_ip", "10.0.0.2"),
        ])
    }

    fn body_with_nulls(number: &str, email: Option<&str>) -> serde_json::Value {
        json!({
            "number": number,
            "reported_by_email": email,
            "opened_at": null,
            "impact": null,
            "urgency": null,
            "short_description": null,
            "description": null,
            "category": null,
            "priority": null,
            "sys_id": null,
            "subcategory": null,
            "state": null,
            "source_ip": null,
            "destination_ip": null,
        })
    }

    fn notifier_for(server: &Server, directory: Arc<dyn UserDirectory>) -> Notifier {
        let cfg = NotifierConfig::default().with_base_url(format!("{}/servicenow", server.url()));
        Notifier::with_directory(cfg, directory)
    }

    #[tokio::test]
    async fn dispatches_the_exact_documented_body() {
        let mut server = Server::new_async().await;
        let expected = r#"{"number":"INC0010001","reported_by_email":"a@b.com","opened_at":"2024-01-01 00:00:00","impact":"1","urgency":"1","short_description":"down","description":"prod down","category":"network","priority":"1","sys_id":"abc123","subcategory":"outage","state":"1","source_ip":"10.0.0.1","destination_ip":"10.0.0.2"}"#;
        let mock = server
            .mock("POST", "/servicenow/INC0010001")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Exact(expected.to_string()))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let directory = Arc::new(StaticDirectory::new().with_user("u1", "a@b.com"));
        let notifier = notifier_for(&server, directory);

        match notifier.dispatch(&full_record()).await {
            DispatchOutcome::Delivered { status, body } => {
                assert_eq!(status, 200);
                assert_eq!(body, "ok");
            }
            DispatchOutcome::Failed { error } => panic!("dispatch failed: {error}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sparse_records_send_null_keys() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/servicenow/INC0000042")
            .match_body(Matcher::Json(body_with_nulls("INC0000042", None)))
            .with_status(201)
            .create_async()
            .await;

        let record = RecordSnapshot::new().with(IncidentField::Number, "INC0000042");
        let outcome = notifier_for(&server, Arc::new(NullDirectory)).dispatch(&record).await;

        assert!(outcome.is_delivered());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_2xx_responses_count_as_delivered() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/servicenow/INC0000042")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let record = RecordSnapshot::new().with(IncidentField::Number, "INC0000042");
        match notifier_for(&server, Arc::new(NullDirectory)).dispatch(&record).await {
            DispatchOutcome::Delivered { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            DispatchOutcome::Failed { error } => panic!("dispatch failed: {error}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_reporter_lookup_still_dispatches() {
        struct ExplodingDirectory;

        #[async_trait]
        impl UserDirectory for ExplodingDirectory {
            async fn email_for(&self, _user_id: &str) -> Result<Option<String>, DirectoryError> {
                Err(DirectoryError("user store offline".to_string()))
            }
        }

        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/servicenow/INC0000042")
            .match_body(Matcher::Json(body_with_nulls("INC0000042", None)))
            .with_status(200)
            .create_async()
            .await;

        let record = RecordSnapshot::new()
            .with(IncidentField::Number, "INC0000042")
            .with(IncidentField::CallerId, "u1");
        let outcome = notifier_for(&server, Arc::new(ExplodingDirectory)).dispatch(&record).await;

        assert!(outcome.is_delivered());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn slow_reporter_lookup_is_cut_off() {
        struct SlowDirectory;

        #[async_trait]
        impl UserDirectory for SlowDirectory {
            async fn email_for(&self, _user_id: &str) -> Result<Option<String>, DirectoryError> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Some("late@b.com".to_string()))
            }
        }

        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/servicenow/INC0000042")
            .match_body(Matcher::Json(body_with_nulls("INC0000042", None)))
            .with_status(200)
            .create_async()
            .await;

        let cfg = NotifierConfig {
            lookup_timeout_secs: 1,
            ..NotifierConfig::default()
        }
        .with_base_url(format!("{}/servicenow", server.url()));
        let record = RecordSnapshot::new()
            .with(IncidentField::Number, "INC0000042")
            .with(IncidentField::CallerId, "u1");

        let outcome = Notifier::with_directory(cfg, Arc::new(SlowDirectory)).dispatch(&record).await;

        assert!(outcome.is_delivered());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn transport_failure_is_folded_into_the_outcome() {
        // grab a port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let cfg = NotifierConfig::default()
            .with_base_url(format!("http://127.0.0.1:{port}/servicenow"));
        let record = RecordSnapshot::new().with(IncidentField::Number, "INC0000042");

        match Notifier::with_config(cfg).dispatch(&record).await {
            DispatchOutcome::Failed { error: DispatchError::Transport(_) } => {}
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn record_without_number_never_touches_the_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let record = RecordSnapshot::new().with(IncidentField::ShortDescription, "down");
        match notifier_for(&server, Arc::new(NullDirectory)).dispatch(&record).await {
            DispatchOutcome::Failed { error: DispatchError::MissingNumber } => {}
            other => panic!("expected missing-number failure, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn same_record_dispatches_identically_every_time() {
        let mut server = Server::new_async().await;
        let expected = r#"{"number":"INC0010001","reported_by_email":"a@b.com","opened_at":"2024-01-01 00:00:00","impact":"1","urgency":"1","short_description":"down","description":"prod down","category":"network","priority":"1","sys_id":"abc123","subcategory":"outage","state":"1","source_ip":"10.0.0.1","destination_ip":"10.0.0.2"}"#;
        let mock = server
            .mock("POST", "/servicenow/INC0010001")
            .match_body(Matcher::Exact(expected.to_string()))
            .expect(2)
            .with_status(200)
            .create_async()
            .await;

        let directory = Arc::new(StaticDirectory::new().with_user("u1", "a@b.com"));
        let notifier = notifier_for(&server, directory);

        assert!(notifier.dispatch(&full_record()).await.is_delivered());
        assert!(notifier.dispatch(&full_record()).await.is_delivered());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn handle_dispatches_the_current_row() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/servicenow/INC0000042")
            .with_status(200)
            .create_async()
            .await;

        let current = RecordSnapshot::new().with(IncidentField::Number, "INC0000042");
        let previous = RecordSnapshot::new().with(IncidentField::Number, "INC0000042");
        let event = RecordEvent::with_previous(current, previous);

        let outcome = notifier_for(&server, Arc::new(NullDirectory)).handle(&event).await;
        assert!(outcome.is_delivered());
        mock.assert_async().await;
    }

    #[test]
    fn endpoint_encodes_path_altering_numbers() {
        let notifier = Notifier::with_config(
            NotifierConfig::default().with_base_url("https://hooks.example.com/servicenow"),
        );
        let url = notifier.endpoint_for("INC/../0001 x").unwrap();
        assert_eq!(
            url.as_str(),
            "https://hooks.example.com/servicenow/INC%2F..%2F0001%20x"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_in_base() {
        let notifier = Notifier::with_config(
            NotifierConfig::default().with_base_url("https://hooks.example.com/servicenow/"),
        );
        let url = notifier.endpoint_for("INC0010001").unwrap();
        assert_eq!(
            url.as_str(),
            "https://hooks.example.com/servicenow/INC0010001"
        );
    }

    #[test]
    fn unusable_base_url_is_an_endpoint_error() {
        let notifier =
            Notifier::with_config(NotifierConfig::default().with_base_url("not a url"));
        match notifier.endpoint_for("INC0010001") {
            Err(DispatchError::Endpoint(_)) => {}
            other => panic!("expected endpoint error, got {other:?}"),
        }
    }
}
