//! Trip, hazard, and location persistence.
//!
//! Only the in-memory backend ships; its contents are lost on restart. A
//! writer that panicked mid-update poisons it, after which every call fails
//! with [`StoreError::Unavailable`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: String,
    pub user_id: String,
    pub status: TripStatus,
    pub start_location: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
}

/// Completion details for a trip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripEnd {
    pub trip_id: Option<String>,
    pub end_location: Option<String>,
    /// Kilometres.
    pub distance: Option<f64>,
    /// Seconds.
    pub duration: Option<f64>,
}

/// A driver-submitted hazard, already validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardReport {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub location: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHazard {
    pub id: String,
    #[serde(flatten)]
    pub report: HazardReport,
    pub created_at: DateTime<Utc>,
}

/// A GPS fix from a driver's device, already validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// km/h.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
}

/// Persistence for trips, hazards, and location history.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &str;

    async fn start_trip(&self, user_id: &str, start_location: &str) -> Result<Trip, StoreError>;

    /// Mark a trip completed. Unknown or missing ids are ignored and yield `None`.
    async fn end_trip(&self, end: TripEnd) -> Result<Option<Trip>, StoreError>;

    async fn report_hazard(&self, report: HazardReport) -> Result<StoredHazard, StoreError>;

    /// Most recent hazards, newest first.
    async fn recent_hazards(&self, limit: usize) -> Result<Vec<StoredHazard>, StoreError>;

    async fn record_location(&self, update: LocationUpdate) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    trips: Vec<Trip>,
    hazards: Vec<StoredHazard>,
    locations: Vec<LocationUpdate>,
}

/// Process-local store backed by vectors behind a lock.
#[derive(Debug, Default)]
pub struct InMemoryTripStore {
    state: RwLock<MemoryState>,
    max_locations: Option<usize>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max` location fixes, dropping the oldest.
    pub fn with_location_capacity(max: usize) -> Self {
        Self {
            state: RwLock::default(),
            max_locations: Some(max),
        }
    }

    pub fn trips(&self) -> Result<Vec<Trip>, StoreError> {
        Ok(self.read()?.trips.clone())
    }

    pub fn locations(&self) -> Result<Vec<LocationUpdate>, StoreError> {
        Ok(self.read()?.locations.clone())
    }

    // Guards are never held across an await.
    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.state.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.state.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable {
        message: "lock poisoned".into(),
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn start_trip(&self, user_id: &str, start_location: &str) -> Result<Trip, StoreError> {
        let trip = Trip {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: TripStatus::Active,
            start_location: start_location.to_string(),
            start_time: Utc::now(),
            end_location: None,
            end_time: None,
            distance_km: None,
            duration_sec: None,
        };
        self.write()?.trips.push(trip.clone());
        debug!(trip_id = %trip.id, "Trip started");
        Ok(trip)
    }

    async fn end_trip(&self, end: TripEnd) -> Result<Option<Trip>, StoreError> {
        let Some(trip_id) = end.trip_id.as_deref() else {
            return Ok(None);
        };
        let mut state = self.write()?;
        let Some(trip) = state.trips.iter_mut().find(|t| t.id == trip_id) else {
            debug!(trip_id, "End requested for unknown trip");
            return Ok(None);
        };
        trip.status = TripStatus::Completed;
        trip.end_time = Some(Utc::now());
        trip.end_location = end.end_location;
        trip.distance_km = end.distance;
        trip.duration_sec = end.duration;
        Ok(Some(trip.clone()))
    }

    async fn report_hazard(&self, report: HazardReport) -> Result<StoredHazard, StoreError> {
        let hazard = StoredHazard {
            id: Uuid::new_v4().to_string(),
            report,
            created_at: Utc::now(),
        };
        self.write()?.hazards.push(hazard.clone());
        Ok(hazard)
    }

    async fn recent_hazards(&self, limit: usize) -> Result<Vec<StoredHazard>, StoreError> {
        let state = self.read()?;
        Ok(state.hazards.iter().rev().take(limit).cloned().collect())
    }

    async fn record_location(&self, update: LocationUpdate) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.locations.push(update);
        if let Some(max) = self.max_locations {
            let excess = state.locations.len().saturating_sub(max);
            state.locations.drain(..excess);
        }
        Ok(())
    }
}
