use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::app::{AppError, AppState};
use crate::attendance::AttendanceKind;
use crate::geofence::GeoPoint;

pub const SESSION_COOKIE: &str = "session";
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Login form data
///
/// Only the employee id is asked for; there is no password.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginForm {
    pub employee_id: String,
}

/// Last location a session reported, with the geofence verdict for it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationFix {
    pub observed: GeoPoint,
    pub distance_meters: f64,
    pub inside: bool,
}

/// User session data
///
/// Represents a logged-in employee and the attendance flow they are in.
#[derive(Debug, Clone)]
pub struct Session {
    /// Employee id of the logged-in user
    pub employee_id: String,

    /// Time when the session expires
    pub expires_at: SystemTime,

    /// Attendance type chosen before opening the scanner
    pub pending_kind: Option<AttendanceKind>,

    /// Most recent geofence evaluation for this session
    pub last_fix: Option<LocationFix>,
}

impl Session {
    fn is_live(&self, now: SystemTime) -> bool {
        self.expires_at > now
    }
}

/// In-memory session table keyed by random session ids
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session for `employee_id`
    ///
    /// Expired sessions are dropped at the same time.
    ///
    /// # Returns
    /// * `Result<String, AppError>` - The new session id
    pub fn create(&self, employee_id: &str) -> Result<String, AppError> {
        let session_id = Uuid::new_v4().to_string();
        let now = SystemTime::now();
        let session = Session {
            employee_id: employee_id.to_string(),
            expires_at: now + Duration::from_secs(SESSION_DURATION),
            pending_kind: None,
            last_fix: None,
        };

        let mut sessions = self.sessions.write().map_err(|_| AppError::lock())?;
        sessions.retain(|_, s| s.is_live(now));
        sessions.insert(session_id.clone(), session);

        Ok(session_id)
    }

    /// Return a copy of a live session
    pub fn get(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        let sessions = self.sessions.read().map_err(|_| AppError::lock())?;
        Ok(sessions
            .get(session_id)
            .filter(|s| s.is_live(SystemTime::now()))
            .cloned())
    }

    /// Apply `f` to a live session
    ///
    /// # Returns
    /// * `Result<Option<T>, AppError>` - `None` when the session is unknown or expired
    pub fn update<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<Option<T>, AppError> {
        let mut sessions = self.sessions.write().map_err(|_| AppError::lock())?;
        Ok(sessions
            .get_mut(session_id)
            .filter(|s| s.is_live(SystemTime::now()))
            .map(f))
    }

    pub fn remove(&self, session_id: &str) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().map_err(|_| AppError::lock())?;
        sessions.remove(session_id);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, AppError> {
        let sessions = self.sessions.read().map_err(|_| AppError::lock())?;
        Ok(sessions.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.len()? == 0)
    }
}

/// Resolve the session cookie to a session id and its session
pub fn current_session(
    jar: &CookieJar,
    sessions: &SessionStore,
) -> Result<(String, Session), AppError> {
    let cookie = jar
        .get(SESSION_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("No session found".to_string()))?;
    let session_id = cookie.value().to_string();
    match sessions.get(&session_id)? {
        Some(session) => Ok((session_id, session)),
        None => Err(AppError::Unauthorized("Invalid session".to_string())),
    }
}

/// Handle login requests
///
/// Looks the id up in the directory and creates a session if it is known.
///
/// # Returns
/// * `Response` - Redirect to the attendance page with a session cookie, or 401
#[axum::debug_handler]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let employee_id = form.employee_id.trim();
    let Some(employee) = state.directory.find(employee_id) else {
        log::info!("login rejected for unknown id {:?}", employee_id);
        return (StatusCode::UNAUTHORIZED, "User not found!").into_response();
    };

    match state.sessions.create(&employee.employee_id) {
        Ok(session_id) => {
            log::info!("{} ({}) logged in", employee.name, employee.employee_id);
            let mut cookie = Cookie::new(SESSION_COOKIE, session_id);
            cookie.set_path("/");
            cookie.set_http_only(true);
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Handle logout
///
/// Drops the session and clears the cookie.
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value())?;
    }

    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    Ok((jar.remove(cookie), Redirect::to("/")))
}
