use crate::config::ReceiverConfig;
use crate::core::payload::IncidentPayload;
use crate::observability::prom;
use crate::services::http::RelayMetrics;
use crate::services::runner::{AutomationJob, AutomationRunner, CommandRunner, LogRunner};
use crate::timefmt;

use actix_web::{App, HttpResponse, HttpServer, web};
use dashmap::DashSet;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Shared receiver state: the automation runner plus the set of record keys
/// already handed to automation. First webhook per key wins; the set lives
/// as long as the process.
pub struct ReceiverState {
    runner: Arc<dyn AutomationRunner>,
    worked: DashSet<String>,
}

impl ReceiverState {
    pub fn new(runner: Arc<dyn AutomationRunner>) -> Self {
        Self { runner, worked: DashSet::new() }
    }

    pub fn from_config(cfg: &ReceiverConfig) -> Self {
        let runner: Arc<dyn AutomationRunner> = match cfg
            .automation_cmd
            .as_deref()
            .and_then(CommandRunner::from_command_line)
        {
            Some(cmd) => Arc::new(cmd),
            None => Arc::new(LogRunner),
        };
        Self::new(runner)
    }
}

// -------------------------------------------------------
// Jira webhook body (only what the automation needs)
// -------------------------------------------------------
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JiraIssueHook {
    pub user: JiraUser,
    pub issue: JiraIssue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JiraUser {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JiraIssue {
    pub fields: JiraFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JiraFields {
    /// Source IP custom field.
    #[serde(rename = "customfield_10060")]
    pub source_ip: Option<String>,

    /// Destination IP custom field.
    #[serde(rename = "customfield_10061")]
    pub destination_ip: Option<String>,
}

// -------------------------------------------------------
// Handlers
// -------------------------------------------------------
async fn servicenow_hook(
    state: web::Data<ReceiverState>,
    path: web::Path<String>,
    body: web::Json<IncidentPayload>,
) -> HttpResponse {
    let record = path.into_inner();
    let payload = body.into_inner();

    let (Some(source_ip), Some(destination_ip)) = (payload.source_ip, payload.destination_ip)
    else {
        tracing::warn!(target: "increlay::receiver", record = %record, "webhook without connectivity fields");
        return HttpResponse::UnprocessableEntity()
            .json(json!({ "error": "source_ip and destination_ip are required" }));
    };

    let reporter = payload.reported_by_email.as_deref().unwrap_or("<unknown>").to_string();
    let extra = vec![("SERVICENOW_RECORD".to_string(), record.clone())];
    accept(&state, record, &reporter, source_ip, destination_ip, extra)
}

async fn jira_hook(
    state: web::Data<ReceiverState>,
    path: web::Path<String>,
    body: web::Json<JiraIssueHook>,
) -> HttpResponse {
    let issue = path.into_inner();
    let hook = body.into_inner();

    let (Some(source_ip), Some(destination_ip)) =
        (hook.issue.fields.source_ip, hook.issue.fields.destination_ip)
    else {
        tracing::warn!(target: "increlay::receiver", issue = %issue, "webhook without connectivity fields");
        return HttpResponse::UnprocessableEntity()
            .json(json!({ "error": "customfield_10060 and customfield_10061 are required" }));
    };

    let reporter = hook.user.display_name.as_deref().unwrap_or("<unknown>").to_string();
    let extra = vec![("JIRA_ISSUE_KEY".to_string(), issue.clone())];
    accept(&state, issue, &reporter, source_ip, destination_ip, extra)
}

/// Claim the record, log the acceptance and launch automation in the
/// background. A record already claimed is acknowledged and dropped, so a
/// re-fired webhook cannot start a second run.
fn accept(
    state: &ReceiverState,
    record: String,
    reporter: &str,
    source_ip: String,
    destination_ip: String,
    extra_vars: Vec<(String, String)>,
) -> HttpResponse {
    if !state.worked.insert(record.clone()) {
        tracing::info!(target: "increlay::receiver", record = %record, "record already worked; ignoring webhook");
        return HttpResponse::Ok().finish();
    }

    tracing::info!(
        target: "increlay::receiver",
        record = %record,
        reporter = %reporter,
        "accepted webhook; troubleshooting connectivity between {source_ip} and {destination_ip}"
    );

    let job = AutomationJob {
        record,
        source_ip,
        destination_ip,
        received_at: timefmt::now_itsm(),
        extra_vars,
    };
    let runner = Arc::clone(&state.runner);
    tokio::spawn(async move {
        let record = job.record.clone();
        match runner.launch(job).await {
            Ok(()) => prom::inc_automation("ok"),
            Err(e) => {
                prom::inc_automation("failed");
                tracing::error!(target: "increlay::receiver", record = %record, "automation failed: {e}");
            }
        }
    });

    HttpResponse::Ok().finish()
}

/// Webhook routes plus the Prometheus text endpoint.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/servicenow/{record}", web::post().to(servicenow_hook))
        .route("/jira/{issue}", web::post().to(jira_hook))
        .route("/metrics", web::get().to(prom::metrics_handler));
}

/// Run the receiver until the process stops.
pub async fn serve(cfg: ReceiverConfig) -> std::io::Result<()> {
    let state = web::Data::new(ReceiverState::from_config(&cfg));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(RelayMetrics::new())
            .configure(routes)
    })
    .bind(cfg.bind_addr.as_str())?;

    tracing::info!(target: "increlay::receiver", bind = %cfg.bind_addr, "receiver listening");
    server.run().await
}
