use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::geofence::{
    geofence_request_id, GeofenceCoordinate, GeofenceData, GeofenceLocation,
};

/// Mean earth radius, meters.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Index of geofence locations keyed by platform request id.
///
/// The host keeps one of these for the geofences it currently monitors: a
/// region event's request id looks up the location it fired for, and
/// [`request_ids_by_distance`](Self::request_ids_by_distance) orders the
/// monitored set by proximity to the device, e.g. to respect a platform cap
/// on simultaneously monitored regions.
#[derive(Debug, Default, uniffi::Object)]
pub struct GeofenceLocationMap {
    entries: Mutex<HashMap<String, GeofenceLocation>>,
}

#[uniffi::export]
impl GeofenceLocationMap {
    /// Creates an empty map.
    #[uniffi::constructor]
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a map holding every non-expired location of `geofences`.
    #[uniffi::constructor]
    #[must_use]
    pub fn from_geofences(geofences: Vec<GeofenceData>) -> Arc<Self> {
        let map = Self::new();
        for geofence in geofences {
            if geofence.is_expired() {
                continue;
            }
            for location in &geofence.locations {
                map.put(geofence.clone(), location.clone());
            }
        }
        map
    }

    /// Number of indexed locations.
    #[must_use]
    pub fn count(&self) -> u64 {
        u64::try_from(self.lock_entries().len()).unwrap_or(u64::MAX)
    }

    /// Looks up the location registered under `request_id`.
    #[must_use]
    pub fn get(&self, request_id: String) -> Option<GeofenceLocation> {
        self.lock_entries().get(&request_id).cloned()
    }

    /// All request ids currently in the map, in arbitrary order.
    #[must_use]
    pub fn request_ids(&self) -> Vec<String> {
        self.lock_entries().keys().cloned().collect()
    }

    /// Indexes one location of `geofence`, replacing any previous entry for
    /// the same request id.
    pub fn put(&self, geofence: GeofenceData, location: GeofenceLocation) {
        let request_id = geofence_request_id(geofence.id, location.id);
        self.lock_entries().insert(request_id, location);
    }

    /// Indexes the location at `location_index` of `geofence`. Returns false
    /// when the index is out of range.
    pub fn put_location_index(&self, geofence: GeofenceData, location_index: u64) -> bool {
        let Ok(index) = usize::try_from(location_index) else {
            return false;
        };
        match geofence.locations.get(index).cloned() {
            Some(location) => {
                self.put(geofence, location);
                true
            }
            None => false,
        }
    }

    /// Whether both maps index exactly the same locations under the same
    /// request ids.
    #[must_use]
    pub fn is_equal(&self, other: Arc<Self>) -> bool {
        // Snapshot one side first; holding both locks at once would deadlock
        // on a self-comparison.
        let mine = self.lock_entries().clone();
        let theirs = other.lock_entries().clone();
        mine == theirs
    }

    /// Request ids ordered by ascending great-circle distance between the
    /// device coordinate and each location's center. Ties break by request id
    /// so the order is deterministic.
    #[must_use]
    pub fn request_ids_by_distance(&self, from: GeofenceCoordinate) -> Vec<String> {
        let mut measured: Vec<(f64, String)> = self
            .lock_entries()
            .iter()
            .map(|(request_id, location)| {
                (
                    haversine_distance_meters(from, location.center),
                    request_id.clone(),
                )
            })
            .collect();
        measured.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        measured.into_iter().map(|(_, request_id)| request_id).collect()
    }
}

impl GeofenceLocationMap {
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, GeofenceLocation>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Great-circle distance between two coordinates, meters.
fn haversine_distance_meters(a: GeofenceCoordinate, b: GeofenceCoordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}
