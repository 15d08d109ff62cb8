use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::attendance::{AttendanceKind, AttendanceLog, AttendanceRecord};
use crate::badge::{self, DEFAULT_BADGE_SIZE, ScanError};
use crate::config::AppConfig;
use crate::directory::EmployeeDirectory;
use crate::downloader::{self, EXPORT_FILE_STEM};
use crate::geofence::{self, GeoPoint, GeofenceConfig, ValidationError};
use crate::login::{self, LocationFix, SessionStore, current_session};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared state of the attendance server
pub struct AppState {
    pub geofence: GeofenceConfig,
    pub directory: EmployeeDirectory,
    pub log: Mutex<AttendanceLog>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(geofence: GeofenceConfig, directory: EmployeeDirectory) -> Self {
        AppState {
            geofence,
            directory,
            log: Mutex::new(AttendanceLog::new()),
            sessions: SessionStore::new(),
        }
    }
}

/// Errors surfaced by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub(crate) fn lock() -> Self {
        AppError::Internal("State lock poisoned".to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Scan(ScanError::InvalidCode) => StatusCode::BAD_REQUEST,
            AppError::Scan(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        let body = StatusResponse {
            status: "error".to_string(),
            message: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct MeResponse {
    employee_id: String,
    name: String,
    geofence: GeofenceConfig,
    pending_kind: Option<AttendanceKind>,
    last_fix: Option<LocationFix>,
}

#[derive(Serialize)]
struct LocationResponse {
    distance_meters: f64,
    radius_meters: f64,
    inside: bool,
}

#[derive(Deserialize)]
struct StartRequest {
    kind: AttendanceKind,
}

#[derive(Deserialize)]
struct ScanRequest {
    decoded_text: String,
}

#[derive(Deserialize)]
struct BadgeQuery {
    size: Option<u32>,
}

/// Build the router over an existing state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/login", post(login::handle_login))
        .route("/logout", post(login::handle_logout))
        .route("/api/me", get(get_me))
        .route("/api/badge.svg", get(get_badge))
        .route("/api/location", post(report_location))
        .route("/api/attendance/start", post(start_attendance))
        .route("/api/scan", post(handle_scan))
        .route("/api/attendance", get(list_attendance))
        .route("/api/export.xlsx", get(export_xlsx))
        .route("/api/export.csv", get(export_csv))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

/// Start the attendance server
///
/// Loads the employee directory, binds the listener and serves until the
/// process is stopped.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let directory = match &config.users_file {
        Some(path) => EmployeeDirectory::from_json_file(path)?,
        None => EmployeeDirectory::default(),
    };
    log::info!(
        "{} employees, office fence at ({}, {}) radius {} m",
        directory.len(),
        config.geofence.center.latitude,
        config.geofence.center.longitude,
        config.geofence.radius_meters
    );

    let state = Arc::new(AppState::new(config.geofence, directory));
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    log::info!("Listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<MeResponse>, AppError> {
    let (_, session) = current_session(&jar, &state.sessions)?;
    let employee = state
        .directory
        .find(&session.employee_id)
        .ok_or_else(|| AppError::Unauthorized("User not found!".to_string()))?;

    Ok(Json(MeResponse {
        employee_id: employee.employee_id.clone(),
        name: employee.name.clone(),
        geofence: state.geofence,
        pending_kind: session.pending_kind,
        last_fix: session.last_fix,
    }))
}

async fn get_badge(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<BadgeQuery>,
) -> Result<Response, AppError> {
    let (_, session) = current_session(&jar, &state.sessions)?;
    let size = params.size.unwrap_or(DEFAULT_BADGE_SIZE).clamp(64, 1024);
    let svg = badge::badge_svg(&session.employee_id, size)?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(observed): Json<GeoPoint>,
) -> Result<Json<LocationResponse>, AppError> {
    let (session_id, _) = current_session(&jar, &state.sessions)?;

    let inside = geofence::is_within_geofence(observed, state.geofence)?;
    let distance_meters = geofence::haversine_distance(observed, state.geofence.center);

    let fix = LocationFix {
        observed,
        distance_meters,
        inside,
    };
    state
        .sessions
        .update(&session_id, |s| s.last_fix = Some(fix))?
        .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?;

    log::debug!("location fix {:.1} m from office, inside={}", distance_meters, inside);

    Ok(Json(LocationResponse {
        distance_meters,
        radius_meters: state.geofence.radius_meters,
        inside,
    }))
}

async fn start_attendance(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<StartRequest>,
) -> Result<Json<MeResponse>, AppError> {
    let (session_id, session) = current_session(&jar, &state.sessions)?;

    match session.last_fix {
        None => {
            return Err(AppError::PreconditionFailed(
                "Location not available yet".to_string(),
            ));
        }
        Some(fix) if !fix.inside => {
            log::info!(
                "{} tried to start {} {:.0} m from the office",
                session.employee_id,
                request.kind,
                fix.distance_meters
            );
            return Err(AppError::Forbidden(
                "You are outside the office area".to_string(),
            ));
        }
        Some(_) => {}
    }

    state
        .sessions
        .update(&session_id, |s| s.pending_kind = Some(request.kind))?
        .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?;

    get_me(State(state), jar).await
}

async fn handle_scan(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<ScanRequest>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let (session_id, session) = current_session(&jar, &state.sessions)?;
    if session.pending_kind.is_none() {
        return Err(AppError::BadRequest(
            "Choose arrival or departure before scanning".to_string(),
        ));
    }

    // An unreadable code leaves the pending type in place so the scanner can retry.
    let employee = badge::resolve_scan(&state.directory, &request.decoded_text)?;

    let kind = state
        .sessions
        .update(&session_id, |s| s.pending_kind.take())?
        .ok_or_else(|| AppError::Unauthorized("Invalid session".to_string()))?
        .ok_or_else(|| {
            AppError::BadRequest("Choose arrival or departure before scanning".to_string())
        })?;

    let mut attendance_log = state.log.lock().map_err(|_| AppError::lock())?;
    let record = attendance_log.record(employee, kind, chrono::Local::now()).clone();
    log::info!(
        "recorded {} for {} ({}) at {}",
        record.kind,
        record.name,
        record.employee_id,
        record.time
    );

    Ok(Json(record))
}

async fn list_attendance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let attendance_log = state.log.lock().map_err(|_| AppError::lock())?;
    Ok(Json(attendance_log.records().to_vec()))
}

fn attachment(content_type: &'static str, extension: &str, body: Vec<u8>) -> Response {
    let disposition = format!(
        "attachment; filename=\"{}.{}\"",
        EXPORT_FILE_STEM, extension
    );
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

async fn export_xlsx(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let attendance_log = state.log.lock().map_err(|_| AppError::lock())?;
    let buffer =
        downloader::to_xlsx(&attendance_log).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(attachment(XLSX_CONTENT_TYPE, "xlsx", buffer))
}

async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let attendance_log = state.log.lock().map_err(|_| AppError::lock())?;
    let csv =
        downloader::to_csv(&attendance_log).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(attachment("text/csv; charset=utf-8", "csv", csv.into_bytes()))
}
