use std::{collections::VecDeque, fmt, str::FromStr};

use crate::error::{Error, Result};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Accepts "lat,lon"
impl FromStr for GeoPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidPosition(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let lon = lon.trim().parse::<f64>().map_err(|_| invalid())?;
        GeoPoint::new(lat, lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat {:.5}, Lon {:.5}", self.latitude, self.longitude)
    }
}

/// Great-circle distance in kilometres on a spherical Earth
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for near-antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Samples taken so far, oldest first
#[derive(Debug, Default, Clone)]
pub struct LocationLog {
    points: Vec<GeoPoint>,
    last_distance: Option<f64>,
}

impl LocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Once there are two or more, returns the distance
    /// between the previous sample and this one.
    pub fn record(&mut self, point: GeoPoint) -> Option<f64> {
        self.points.push(point);
        if let [.., prev, last] = self.points.as_slice() {
            self.last_distance = Some(haversine_km(*prev, *last));
        }
        self.last_distance
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn last_distance(&self) -> Option<f64> {
        self.last_distance
    }
}

/// Where position fixes come from
pub trait Geolocator {
    fn current_position(&mut self) -> Result<GeoPoint>;

    /// Fixes still available, when the source knows
    fn remaining(&self) -> Option<usize> {
        None
    }
}

/// Platform without a position source
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

impl Geolocator for Unsupported {
    fn current_position(&mut self) -> Result<GeoPoint> {
        Err(Error::GeolocationUnavailable)
    }
}

/// Replays a fixed list of fixes, one per request
#[derive(Debug, Default, Clone)]
pub struct ScriptedGeolocator {
    fixes: VecDeque<GeoPoint>,
}

impl ScriptedGeolocator {
    pub fn new(fixes: impl IntoIterator<Item = GeoPoint>) -> Self {
        Self {
            fixes: fixes.into_iter().collect(),
        }
    }
}

impl Geolocator for ScriptedGeolocator {
    fn current_position(&mut self) -> Result<GeoPoint> {
        self.fixes
            .pop_front()
            .ok_or_else(|| Error::GeolocationFailed("no more positions".to_string()))
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.fixes.len())
    }
}
