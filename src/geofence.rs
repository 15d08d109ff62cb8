use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by the spherical model, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Values are plain data; range checks happen in [`GeoPoint::validate`] and
/// inside [`is_within_geofence`], so a point deserialized from a request can
/// be passed straight to the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, valid in [-90, 90]
    pub latitude: f64,

    /// Longitude in degrees, valid in [-180, 180]
    pub longitude: f64,
}

/// A circular fence around a center point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    /// Center of the fence
    pub center: GeoPoint,

    /// Radius in meters, must be finite and strictly positive
    pub radius_meters: f64,
}

/// Rejected geofence input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Latitude must be between -90 and 90 degrees, got {0}")]
    Latitude(f64),

    #[error("Longitude must be between -180 and 180 degrees, got {0}")]
    Longitude(f64),

    #[error("Radius must be a positive finite number of meters, got {0}")]
    Radius(f64),
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    /// Check that both coordinates are finite and inside their ranges.
    ///
    /// NaN fails the range check, so it is reported as out of range rather
    /// than leaking into the distance computation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::Latitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::Longitude(self.longitude));
        }
        Ok(())
    }
}

impl GeofenceConfig {
    /// Build a validated fence.
    ///
    /// # Arguments
    /// * `center` - Center of the fence
    /// * `radius_meters` - Radius in meters
    ///
    /// # Returns
    /// * `Result<GeofenceConfig, ValidationError>` - The fence, or the first invalid input
    pub fn new(center: GeoPoint, radius_meters: f64) -> Result<Self, ValidationError> {
        let config = GeofenceConfig {
            center,
            radius_meters,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.center.validate()?;
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err(ValidationError::Radius(self.radius_meters));
        }
        Ok(())
    }
}

/// Great-circle distance between two points in meters (Haversine formula).
///
/// Inputs are not validated here; callers that accept untrusted points go
/// through [`distance_checked`] or [`is_within_geofence`].
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h just past 1 for near-antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Validated variant of [`haversine_distance`].
pub fn distance_checked(a: GeoPoint, b: GeoPoint) -> Result<f64, ValidationError> {
    a.validate()?;
    b.validate()?;
    Ok(haversine_distance(a, b))
}

/// Decide whether `observed` lies inside the fence.
///
/// A point exactly `radius_meters` away from the center counts as inside.
///
/// # Arguments
/// * `observed` - Location reported by the client
/// * `config` - The fence to test against
///
/// # Returns
/// * `Result<bool, ValidationError>` - Membership, or the first invalid input
///
/// # Examples
/// ```
/// use attendance::geofence::{GeoPoint, GeofenceConfig, is_within_geofence};
///
/// let office = GeoPoint::new(-5.1683939, 119.4014700);
/// let fence = GeofenceConfig::new(office, 500.0).unwrap();
/// assert!(is_within_geofence(office, fence).unwrap());
/// ```
pub fn is_within_geofence(
    observed: GeoPoint,
    config: GeofenceConfig,
) -> Result<bool, ValidationError> {
    config.validate()?;
    let distance = distance_checked(observed, config.center)?;
    Ok(distance <= config.radius_meters)
}
