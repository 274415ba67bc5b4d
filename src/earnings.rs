use chrono::{NaiveTime, Timelike};
use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

pub const DEFAULT_PER_KM_RATE: f64 = 0.35;

/// A wall-clock time of day, always written as HH:MM:SS
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    pub fn new(time: NaiveTime) -> Self {
        // Sub-second precision is not representable in the form
        Self(time.with_nanosecond(0).unwrap_or(time))
    }

    pub fn seconds_from_midnight(&self) -> u32 {
        self.0.num_seconds_from_midnight()
    }
}

impl FromStr for TimeOfDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTimeFormat(s.to_string());

        let fields: Vec<&str> = s.trim().split(':').collect();
        if fields.len() != 3
            || fields
                .iter()
                .any(|f| f.len() != 2 || !f.bytes().all(|b| b.is_ascii_digit()))
        {
            return Err(invalid());
        }

        let num = |f: &str| f.parse::<u32>().map_err(|_| invalid());
        NaiveTime::from_hms_opt(num(fields[0])?, num(fields[1])?, num(fields[2])?)
            .map(TimeOfDay)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

/// Hours from `start` to `end` on the same day. An end before the start is
/// taken to be on the following day.
pub fn hours_between(start: TimeOfDay, end: TimeOfDay) -> f64 {
    let diff = end.seconds_from_midnight() as f64 - start.seconds_from_midnight() as f64;
    let hours = diff / 3600.0;
    if hours < 0.0 {
        hours + 24.0
    } else {
        hours
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub hourly_rate: f64,
    pub per_km_rate: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            hourly_rate: crate::meter::DEFAULT_HOURLY_RATE,
            per_km_rate: DEFAULT_PER_KM_RATE,
        }
    }
}

impl Rates {
    pub fn validate(&self) -> Result<()> {
        if !self.hourly_rate.is_finite() || self.hourly_rate <= 0.0 {
            return Err(Error::InvalidAmount {
                field: "hourly rate",
                value: self.hourly_rate.to_string(),
            });
        }
        non_negative("per-km rate", self.per_km_rate)?;
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidAmount {
            field,
            value: value.to_string(),
        })
    }
}

/// Parse a user-entered amount. Blank counts as zero, like an untouched form field.
pub fn parse_amount(field: &'static str, raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    let value = raw.parse::<f64>().map_err(|_| Error::InvalidAmount {
        field,
        value: raw.to_string(),
    })?;
    Ok(value)
}

/// One manually entered shift or trip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualTrip {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub distance_km: f64,
    pub tips: f64,
    pub rates: Rates,
}

impl ManualTrip {
    /// Build from raw form text, rejecting anything that would not give a real number
    pub fn parse(
        start: &str,
        end: &str,
        distance_km: &str,
        tips: &str,
        hourly_rate: &str,
        per_km_rate: &str,
    ) -> Result<Self> {
        let trip = Self {
            start: start.parse()?,
            end: end.parse()?,
            distance_km: parse_amount("distance", distance_km)?,
            tips: parse_amount("tips", tips)?,
            rates: Rates {
                hourly_rate: parse_amount("hourly rate", hourly_rate)?,
                per_km_rate: parse_amount("per-km rate", per_km_rate)?,
            },
        };
        trip.validate()?;
        Ok(trip)
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("distance", self.distance_km)?;
        non_negative("tips", self.tips)?;
        self.rates.validate()
    }

    pub fn hours_worked(&self) -> f64 {
        hours_between(self.start, self.end)
    }

    pub fn earning(&self) -> f64 {
        self.hours_worked() * self.rates.hourly_rate
            + self.distance_km * self.rates.per_km_rate
            + self.tips
    }
}
