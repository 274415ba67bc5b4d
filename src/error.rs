use thiserror::Error;

use crate::meter::Phase;

/// Everything that can go wrong in a session. None of these are fatal: the
/// UI reports them and carries on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid time '{0}', expected HH:MM:SS")]
    InvalidTimeFormat(String),
    #[error("invalid {field}: {value}")]
    InvalidAmount { field: &'static str, value: String },
    #[error("invalid position '{0}', expected lat,lon")]
    InvalidPosition(String),
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("geolocation is not supported on this device")]
    GeolocationUnavailable,
    #[error("error getting location: {0}")]
    GeolocationFailed(String),
    #[error("cannot {action} while {phase}")]
    InvalidStateTransition { action: &'static str, phase: Phase },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
