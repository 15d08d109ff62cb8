/*!
# Attendance

A browser-based employee attendance service with a geofence check, built in Rust.

## Overview

An employee logs in with their employee id, is shown a QR badge for that id,
and records an arrival ("datang") or departure ("pulang") by scanning a QR
code with the browser camera. Recording is only allowed while the browser's
last reported location lies inside a circular fence around the office. The
accumulated log can be downloaded as an XLSX or CSV file.

All state lives in memory and is lost when the server stops.

## Architecture

### Frontend Layer
- **Technologies**: HTML, JavaScript (html5-qrcode for camera scanning)
- Login form, QR badge, arrival/departure buttons, scanner view, log table
- Watches the browser's geolocation and reports every fix to the backend

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Geofence Evaluator - Haversine distance against the office fence
  - Employee Directory - Static id to name lookup
  - Attendance Log - Append-only list of records
  - Session Store - Cookie sessions holding the pending attendance type
    and the last location fix
  - Exporter - XLSX and CSV rendering of the log

## Modules

- **geofence**: GeoPoint, GeofenceConfig and the membership check
- **directory**: Employee lookup table
- **attendance**: Attendance records and the in-memory log
- **badge**: QR badge rendering and scan resolution
- **downloader**: Export functionality (CSV, XLSX)
- **config**: Server configuration from arguments and environment
- **login**: Session management and login/logout handlers (web)
- **app**: Routing and handlers (web)

## REST API Endpoints

- `POST /login`, `POST /logout` - Session management
- `GET /api/me` - Current employee, fence and flow state
- `GET /api/badge.svg` - QR badge for the current employee
- `POST /api/location` - Report a location fix and get the geofence verdict
- `POST /api/attendance/start` - Choose arrival or departure before scanning
- `POST /api/scan` - Submit decoded QR text and record attendance
- `GET /api/attendance` - The log
- `GET /api/export.xlsx`, `GET /api/export.csv` - Downloads
*/

pub mod attendance;
pub mod badge;
pub mod config;
pub mod directory;
pub mod downloader;
pub mod geofence;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod login;

pub use attendance::{AttendanceKind, AttendanceLog, AttendanceRecord};
pub use config::AppConfig;
pub use directory::{Employee, EmployeeDirectory};
pub use geofence::{GeoPoint, GeofenceConfig, ValidationError, is_within_geofence};
