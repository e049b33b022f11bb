//! Geofenced push content model.
//!
//! The push backend attaches content to geofenced regions; each geofence
//! carries one or more circular locations. This module models those
//! definitions and provides [`GeofenceLocationMap`], the index the host
//! application uses to look up and proximity-sort the locations it monitors.
//!
//! Monitoring itself (region-crossing detection) and persistence of the
//! definitions are host concerns; the SDK only models and indexes the data.

mod location_map;

pub use location_map::GeofenceLocationMap;

use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct GeofenceCoordinate {
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
}

/// One circular location belonging to a geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct GeofenceLocation {
    /// Backend-assigned location id, unique within its geofence.
    pub id: i64,
    /// Human-readable location name.
    pub name: String,
    /// Center of the circular region.
    pub center: GeofenceCoordinate,
    /// Radius of the circular region in meters.
    pub radius: f64,
}

/// The region crossing a geofence's content is triggered by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum,
)]
pub enum GeofenceTriggerType {
    /// Trigger when the device enters the region.
    Enter,
    /// Trigger when the device exits the region.
    Exit,
}

/// A geofence definition as delivered by the push backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, uniffi::Record)]
pub struct GeofenceData {
    /// Backend-assigned geofence id.
    pub id: i64,
    /// Expiry as milliseconds since the Unix epoch; expired geofences are
    /// dropped from monitoring.
    pub expiry_time: i64,
    /// Which region crossing triggers the content.
    pub trigger_type: GeofenceTriggerType,
    /// Content tags this geofence is associated with.
    pub tags: Vec<String>,
    /// The circular locations making up this geofence.
    pub locations: Vec<GeofenceLocation>,
}

impl GeofenceData {
    /// Whether this geofence's expiry time has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp_millis() >= self.expiry_time
    }
}

/// Errors produced by geofence indexing
#[crate::beacon_error]
pub enum GeofenceError {
    /// The request id does not follow the `beacon_{geofence}_{location}` scheme.
    #[error("malformed geofence request id: {request_id}")]
    MalformedRequestId {
        /// The offending request id
        request_id: String,
    },
}

/// Prefix of every request id the SDK hands to the platform location service.
const REQUEST_ID_PREFIX: &str = "beacon";

/// Builds the platform request id for one geofence location.
///
/// Request ids are what the host registers with the platform location
/// service; the scheme `beacon_{geofence_id}_{location_id}` lets a region
/// event be traced back to its geofence and location.
#[uniffi::export]
#[must_use]
pub fn geofence_request_id(geofence_id: i64, location_id: i64) -> String {
    format!("{REQUEST_ID_PREFIX}_{geofence_id}_{location_id}")
}

/// Extracts the geofence id from a request id.
///
/// # Errors
/// - `GeofenceError::MalformedRequestId` if the id does not follow the scheme.
#[uniffi::export]
pub fn geofence_id_from_request_id(request_id: &str) -> Result<i64, GeofenceError> {
    parse_request_id(request_id).map(|(geofence_id, _)| geofence_id)
}

/// Extracts the location id from a request id.
///
/// # Errors
/// - `GeofenceError::MalformedRequestId` if the id does not follow the scheme.
#[uniffi::export]
pub fn location_id_from_request_id(request_id: &str) -> Result<i64, GeofenceError> {
    parse_request_id(request_id).map(|(_, location_id)| location_id)
}

fn parse_request_id(request_id: &str) -> Result<(i64, i64), GeofenceError> {
    let malformed = || GeofenceError::MalformedRequestId {
        request_id: request_id.to_string(),
    };

    let mut parts = request_id.split('_');
    if parts.next() != Some(REQUEST_ID_PREFIX) {
        return Err(malformed());
    }
    let geofence_id = parts
        .next()
        .and_then(|part| part.parse::<i64>().ok())
        .ok_or_else(malformed)?;
    let location_id = parts
        .next()
        .and_then(|part| part.parse::<i64>().ok())
        .ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok((geofence_id, location_id))
}
