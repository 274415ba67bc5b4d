use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// A completed trip. Never modified after it is logged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    pub index: usize,
    pub fare: f64,
    pub extra: f64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl TripRecord {
    pub fn total(&self) -> f64 {
        self.fare + self.extra
    }

    /// Wall-clock span of the trip, pauses included
    pub fn duration(&self) -> Duration {
        self.ended_at.signed_duration_since(self.started_at)
    }
}

/// Completed trips for this session, newest first
#[derive(Debug, Default, Clone)]
pub struct TripLog {
    trips: VecDeque<TripRecord>,
}

impl TripLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a finished trip under the next index and return it
    pub fn record(
        &mut self,
        fare: f64,
        extra: f64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> &TripRecord {
        let trip = TripRecord {
            index: self.trips.len() + 1,
            fare,
            extra,
            started_at,
            ended_at,
        };
        self.trips.push_front(trip);
        &self.trips[0]
    }

    pub fn latest(&self) -> Option<&TripRecord> {
        self.trips.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TripRecord> {
        self.trips.iter()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn total_earnings(&self) -> f64 {
        self.trips.iter().map(TripRecord::total).sum()
    }
}
