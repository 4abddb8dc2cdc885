use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use crm_activity::config::AppConfig;
use crm_activity::error::AppError;
use crm_activity::reports::export::{
    export_file_name, export_interactions, export_summary, export_worklist, CsvTabularWriter,
    ExportOutcome,
};
use crm_activity::reports::{
    compute_interactions, compute_summary, compute_worklist, DateField, FollowupStatus, Period,
    ReportQuery, Snapshot, SummaryFocus,
};
use crm_activity::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "CRM Activity Reporter",
    about = "Compute time-window sales activity reports from CRM lead data",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute a report from a JSON snapshot file
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportView {
    Summary,
    Worklist,
    Interactions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DateFieldArg {
    Scheduled,
    Created,
    Transferred,
}

impl From<DateFieldArg> for DateField {
    fn from(value: DateFieldArg) -> Self {
        match value {
            DateFieldArg::Scheduled => DateField::Scheduled,
            DateFieldArg::Created => DateField::Created,
            DateFieldArg::Transferred => DateField::Transferred,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatusArg {
    Open,
    Done,
    Cancelled,
}

impl From<StatusArg> for FollowupStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Open => FollowupStatus::Open,
            StatusArg::Done => FollowupStatus::Done,
            StatusArg::Cancelled => FollowupStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FocusArg {
    All,
    NoInteraction,
    NoAppointment,
    Missed,
}

impl From<FocusArg> for SummaryFocus {
    fn from(value: FocusArg) -> Self {
        match value {
            FocusArg::All => SummaryFocus::All,
            FocusArg::NoInteraction => SummaryFocus::NoInteraction,
            FocusArg::NoAppointment => SummaryFocus::NoAppointment,
            FocusArg::Missed => SummaryFocus::Missed,
        }
    }
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// JSON file holding the four raw collections
    /// ({leads, interactions, followups, employees})
    #[arg(long)]
    snapshot: PathBuf,
    /// Which report to compute
    #[arg(long, value_enum, default_value_t = ReportView::Summary)]
    view: ReportView,
    /// Period selector: all, today, tomorrow, this-week, this-month,
    /// last-month, fy, YYYY-MM, or fy-YYYY
    #[arg(long, default_value = "all", value_parser = parse_period)]
    period: Period,
    /// Which record date the window tests
    #[arg(long, value_enum, default_value_t = DateFieldArg::Created)]
    date_field: DateFieldArg,
    /// Case-insensitive search term
    #[arg(long, default_value = "")]
    search: String,
    /// Restrict to one executive's resolved display name
    #[arg(long)]
    executive: Option<String>,
    /// Restrict worklist rows to one followup status
    #[arg(long, value_enum)]
    status: Option<StatusArg>,
    /// Restrict summary rows to executives with a non-zero count
    #[arg(long, value_enum, default_value_t = FocusArg::All)]
    focus: FocusArg,
    /// Evaluation instant (defaults to the local wall clock)
    #[arg(long, value_parser = parse_instant)]
    now: Option<NaiveDateTime>,
    /// Write the filtered rows (all pages) to this CSV file; a
    /// directory gets a generated `<report>_<period>_<date>.csv` name
    #[arg(long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Report(args) => run_report(args),
    }
}

fn parse_period(raw: &str) -> Result<Period, String> {
    let raw = raw.trim();
    match raw {
        "all" => return Ok(Period::All),
        "today" => return Ok(Period::Today),
        "tomorrow" => return Ok(Period::Tomorrow),
        "this-week" => return Ok(Period::ThisWeek),
        "this-month" => return Ok(Period::ThisMonth),
        "last-month" => return Ok(Period::LastMonth),
        "fy" => return Ok(Period::FinancialYear),
        _ => {}
    }

    if let Some(year) = raw.strip_prefix("fy-") {
        let start_year = year
            .parse::<i32>()
            .map_err(|err| format!("failed to parse '{raw}' as fy-YYYY ({err})"))?;
        return Ok(Period::CustomFinancialYear {
            start_year: Some(start_year),
        });
    }

    if let Some((year, month)) = raw.split_once('-') {
        let year = year
            .parse::<i32>()
            .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM ({err})"))?;
        let month = month
            .parse::<u32>()
            .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM ({err})"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month in '{raw}' must be 1-12"));
        }
        return Ok(Period::CustomMonth {
            year,
            month: Some(month),
        });
    }

    Err(format!("unrecognised period '{raw}'"))
}

fn parse_instant(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DDTHH:MM:SS ({err})"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route(
            "/api/v1/reports/executive-summary",
            post(summary_endpoint),
        )
        .route("/api/v1/reports/followups", post(worklist_endpoint))
        .route("/api/v1/reports/interactions", post(interactions_endpoint))
        .layer(prometheus_layer)
        .with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sales activity reporter ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        snapshot,
        view,
        period,
        date_field,
        search,
        executive,
        status,
        focus,
        now,
        export,
    } = args;

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(snapshot)?)?;
    let snapshot = snapshot_from_payload(&raw);
    let now = now.unwrap_or_else(|| Local::now().naive_local());

    let query = ReportQuery::new()
        .with_period(period)
        .with_date_field(date_field.into())
        .with_search(search)
        .with_executive(executive)
        .with_status(status.map(FollowupStatus::from))
        .with_focus(focus.into());

    let export = export.map(|path| export_target(path, view, period, now));

    match view {
        ReportView::Summary => {
            let report = compute_summary(&query, &snapshot, now);
            render_summary(&report, &query, now);
            if let Some(path) = export {
                let mut writer = CsvTabularWriter::new(std::fs::File::create(&path)?);
                report_export_outcome(export_summary(&report.filtered, &mut writer)?, &path);
            }
        }
        ReportView::Worklist => {
            let report = compute_worklist(&query, &snapshot, now);
            render_worklist(&report, &query);
            if let Some(path) = export {
                let mut writer = CsvTabularWriter::new(std::fs::File::create(&path)?);
                report_export_outcome(export_worklist(&report.filtered, &mut writer)?, &path);
            }
        }
        ReportView::Interactions => {
            let report = compute_interactions(&query, &snapshot, now);
            render_interactions(&report, &query);
            if let Some(path) = export {
                let mut writer = CsvTabularWriter::new(std::fs::File::create(&path)?);
                report_export_outcome(export_interactions(&report.filtered, &mut writer)?, &path);
            }
        }
    }

    Ok(())
}

/// A directory target gets the generated report file name; anything
/// else is used verbatim.
fn export_target(path: PathBuf, view: ReportView, period: Period, now: NaiveDateTime) -> PathBuf {
    if !path.is_dir() {
        return path;
    }
    let report_name = match view {
        ReportView::Summary => "executive-summary",
        ReportView::Worklist => "followups",
        ReportView::Interactions => "interactions",
    };
    path.join(export_file_name(report_name, period, now.date()))
}

fn snapshot_from_payload(raw: &Value) -> Snapshot {
    let field = |name: &str| raw.get(name).cloned().unwrap_or(Value::Null);
    Snapshot::from_raw(
        &field("leads"),
        &field("interactions"),
        &field("followups"),
        &field("employees"),
    )
}

fn report_export_outcome(outcome: ExportOutcome, path: &std::path::Path) {
    match outcome {
        ExportOutcome::Written { rows } => {
            println!("\nExported {rows} rows to {}", path.display());
        }
        ExportOutcome::NothingToExport => {
            println!("\nNothing to export for the current filters");
        }
    }
}

fn render_summary(
    report: &crm_activity::reports::SummaryReport,
    query: &ReportQuery,
    now: NaiveDateTime,
) {
    println!("Executive activity summary");
    println!(
        "Period: {} (evaluated {})",
        query.period.slug(),
        now.format("%Y-%m-%d %H:%M")
    );

    if report.filtered.is_empty() {
        match query.period {
            Period::CustomMonth { month: None, .. }
            | Period::CustomFinancialYear { start_year: None } => {
                println!("No rows: complete the custom period selection first.");
            }
            _ => println!("No rows for the current filters."),
        }
        return;
    }

    for row in &report.filtered {
        println!(
            "- {}: {} leads | no interaction {} ({}) | no appointment {} ({}) | missed {} ({})",
            row.executive_name,
            row.total,
            row.no_interaction_count,
            row.no_interaction_ratio,
            row.no_appointment_count,
            row.no_appointment_ratio,
            row.missed_count,
            row.missed_ratio,
        );
    }
}

fn render_worklist(report: &crm_activity::reports::WorklistReport, query: &ReportQuery) {
    println!("Followup worklist ({})", query.date_field.label());
    println!(
        "Page {}/{} of {} rows",
        report.page.page, report.page.total_pages, report.page.total_rows
    );

    for row in &report.rows {
        let scheduled = row
            .scheduled_at
            .map(|dt| dt.format("%d-%m-%Y %H:%M").to_string())
            .unwrap_or_else(|| "unscheduled".to_string());
        println!(
            "- {} | {} | {} | {} | {}",
            row.business_name,
            row.contact_name,
            row.executive_name,
            scheduled,
            row.followup_status
                .map(|s| s.label())
                .unwrap_or("no followup"),
        );
    }
}

fn render_interactions(report: &crm_activity::reports::InteractionReport, query: &ReportQuery) {
    println!("Interaction log");
    println!(
        "Page {}/{} of {} rows",
        report.page.page, report.page.total_pages, report.page.total_rows
    );
    if !query.search.trim().is_empty() {
        println!("Search: {}", query.search);
    }

    for row in &report.rows {
        let occurred = row
            .occurred_at
            .map(|dt| dt.format("%d-%m-%Y").to_string())
            .unwrap_or_default();
        println!(
            "- {} | {} | {} | {} | {}",
            occurred, row.business_name, row.executive_name, row.kind, row.summary
        );
    }
}

/// Body shared by the three report endpoints: the four raw collections
/// (envelope or bare array, any field casing) plus the query state.
#[derive(Debug, Deserialize)]
struct ReportRequest {
    #[serde(default)]
    leads: Value,
    #[serde(default)]
    interactions: Value,
    #[serde(default)]
    followups: Value,
    #[serde(default)]
    employees: Value,
    #[serde(default)]
    query: ReportQuery,
    /// Evaluation instant override, mainly for reproducible requests.
    #[serde(default)]
    now: Option<NaiveDateTime>,
}

impl ReportRequest {
    fn parts(self) -> (Snapshot, ReportQuery, NaiveDateTime) {
        let snapshot = Snapshot::from_raw(
            &self.leads,
            &self.interactions,
            &self.followups,
            &self.employees,
        );
        let now = self.now.unwrap_or_else(|| Local::now().naive_local());
        (snapshot, self.query, now)
    }
}

async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

async fn summary_endpoint(
    Json(payload): Json<ReportRequest>,
) -> Json<crm_activity::reports::SummaryReport> {
    let (snapshot, query, now) = payload.parts();
    Json(compute_summary(&query, &snapshot, now))
}

async fn worklist_endpoint(
    Json(payload): Json<ReportRequest>,
) -> Json<crm_activity::reports::WorklistReport> {
    let (snapshot, query, now) = payload.parts();
    Json(compute_worklist(&query, &snapshot, now))
}

async fn interactions_endpoint(
    Json(payload): Json<ReportRequest>,
) -> Json<crm_activity::reports::InteractionReport> {
    let (snapshot, query, now) = payload.parts();
    Json(compute_interactions(&query, &snapshot, now))
}
