use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::geofence::{GeoPoint, GeofenceConfig, ValidationError};

// Defaults: the office the service was first deployed for
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const OFFICE_LATITUDE: f64 = -5.1683939;
pub const OFFICE_LONGITUDE: f64 = 119.4014700;
pub const OFFICE_RADIUS_METERS: f64 = 500.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Parse { name: &'static str, value: String },

    #[error(transparent)]
    Geofence(#[from] ValidationError),
}

/// Runtime settings of the attendance server
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// The office fence every attendance must be recorded inside
    pub geofence: GeofenceConfig,

    /// Optional JSON file to load the employee directory from
    pub users_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            geofence: GeofenceConfig {
                center: GeoPoint::new(OFFICE_LATITUDE, OFFICE_LONGITUDE),
                radius_meters: OFFICE_RADIUS_METERS,
            },
            users_file: None,
        }
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        name,
        value: value.to_string(),
    })
}

impl AppConfig {
    /// Build the configuration from positional arguments and environment.
    ///
    /// Positional arguments are `[bind_addr] [latitude] [longitude] [radius] [users.json]`
    /// (program name excluded). A missing argument falls back to the matching
    /// `ATTENDANCE_*` environment variable, then to the built-in default.
    ///
    /// # Arguments
    /// * `args` - Command line arguments without the program name
    /// * `lookup` - Environment lookup, `std::env::var` in production
    ///
    /// # Returns
    /// * `Result<AppConfig, ConfigError>` - A config with a validated fence, or an error
    pub fn from_sources<F>(args: &[String], lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();
        let pick = |index: usize, var: &str| -> Option<String> {
            args.get(index)
                .cloned()
                .or_else(|| lookup(var))
                .filter(|v| !v.trim().is_empty())
        };

        if let Some(addr) = pick(0, "ATTENDANCE_BIND") {
            config.bind_addr = parse_value("bind address", &addr)?;
        }
        if let Some(lat) = pick(1, "ATTENDANCE_LAT") {
            config.geofence.center.latitude = parse_value("latitude", &lat)?;
        }
        if let Some(lng) = pick(2, "ATTENDANCE_LNG") {
            config.geofence.center.longitude = parse_value("longitude", &lng)?;
        }
        if let Some(radius) = pick(3, "ATTENDANCE_RADIUS") {
            config.geofence.radius_meters = parse_value("radius", &radius)?;
        }
        if let Some(users) = pick(4, "ATTENDANCE_USERS") {
            config.users_file = Some(PathBuf::from(users));
        }

        config.geofence.validate()?;
        Ok(config)
    }

    /// [`AppConfig::from_sources`] over the process arguments and environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::from_sources(&args, |name| env::var(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_point_at_the_office() {
        let config = AppConfig::from_sources(&[], no_env).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.geofence.center.latitude, OFFICE_LATITUDE);
        assert_eq!(config.geofence.radius_meters, 500.0);
        assert!(config.users_file.is_none());
    }

    #[test]
    fn args_override_env() {
        let args = vec!["0.0.0.0:8080".to_string(), "10.5".to_string()];
        let env = |name: &str| match name {
            "ATTENDANCE_LAT" => Some("-3.0".to_string()),
            "ATTENDANCE_RADIUS" => Some("250".to_string()),
            _ => None,
        };
        let config = AppConfig::from_sources(&args, env).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.geofence.center.latitude, 10.5);
        assert_eq!(config.geofence.center.longitude, OFFICE_LONGITUDE);
        assert_eq!(config.geofence.radius_meters, 250.0);
    }

    #[test]
    fn invalid_fence_is_rejected() {
        let args: Vec<String> = ["127.0.0.1:3000", "95", "0"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(matches!(
            AppConfig::from_sources(&args, no_env),
            Err(ConfigError::Geofence(ValidationError::Latitude(_)))
        ));

        let env = |name: &str| (name == "ATTENDANCE_RADIUS").then(|| "0".to_string());
        assert!(matches!(
            AppConfig::from_sources(&[], env),
            Err(ConfigError::Geofence(ValidationError::Radius(_)))
        ));
    }

    #[test]
    fn unparsable_values_are_reported() {
        let args = vec!["not-an-addr".to_string()];
        assert!(matches!(
            AppConfig::from_sources(&args, no_env),
            Err(ConfigError::Parse { name: "bind address", .. })
        ));
    }
}
