//! Editable state behind the manual earnings calculator.

use tracing::debug;

use crate::clock::Clock;
use crate::earnings::{ManualTrip, Rates, TimeOfDay};
use crate::error::Error;
use crate::tick::{Scheduler, TickHandle, TICK_INTERVAL};
use crate::util::format_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Field {
    #[strum(serialize = "Start Time")]
    Start,
    #[strum(serialize = "End Time")]
    End,
    #[strum(serialize = "Hourly Rate")]
    HourlyRate,
    #[strum(serialize = "Per KM Rate")]
    PerKmRate,
    Tips,
    Distance,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Start,
        Field::End,
        Field::HourlyRate,
        Field::PerKmRate,
        Field::Tips,
        Field::Distance,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            Field::Start | Field::End => "",
            Field::HourlyRate => "$/h",
            Field::PerKmRate => "$/km",
            Field::Tips => "$",
            Field::Distance => "km",
        }
    }

    fn position(&self) -> usize {
        Field::ALL.iter().position(|f| f == self).unwrap_or(0)
    }
}

/// Result of the last "Calculate"
#[derive(Debug)]
pub enum Outcome {
    Earning(f64),
    Invalid(Error),
}

#[derive(Debug)]
pub struct TripForm {
    pub start: String,
    pub end: String,
    pub hourly_rate: String,
    pub per_km_rate: String,
    pub tips: String,
    pub distance: String,
    pub focus: Field,
    pub outcome: Option<Outcome>,
    end_tracking: Option<TickHandle>,
}

impl TripForm {
    /// Fresh form: both times set to now, rates from configuration
    pub fn new(clock: &impl Clock, rates: Rates) -> Self {
        let now = TimeOfDay::new(clock.local_time_of_day()).to_string();
        Self {
            start: now.clone(),
            end: now,
            hourly_rate: rates.hourly_rate.to_string(),
            per_km_rate: rates.per_km_rate.to_string(),
            tips: "0".to_string(),
            distance: "0".to_string(),
            focus: Field::Start,
            outcome: None,
            end_tracking: None,
        }
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Start => &self.start,
            Field::End => &self.end,
            Field::HourlyRate => &self.hourly_rate,
            Field::PerKmRate => &self.per_km_rate,
            Field::Tips => &self.tips,
            Field::Distance => &self.distance,
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Start => &mut self.start,
            Field::End => &mut self.end,
            Field::HourlyRate => &mut self.hourly_rate,
            Field::PerKmRate => &mut self.per_km_rate,
            Field::Tips => &mut self.tips,
            Field::Distance => &mut self.distance,
        }
    }

    pub fn focus_next(&mut self) {
        let idx = (self.focus.position() + 1) % Field::ALL.len();
        self.focus = Field::ALL[idx];
    }

    pub fn focus_prev(&mut self) {
        let len = Field::ALL.len();
        let idx = (self.focus.position() + len - 1) % len;
        self.focus = Field::ALL[idx];
    }

    pub fn push_char(&mut self, c: char) {
        // The end time belongs to the clock while it is being tracked
        if self.focus == Field::End && self.is_tracking_end() {
            return;
        }
        if c.is_ascii_digit() || c == ':' || c == '.' || c == '-' {
            let focus = self.focus;
            self.value_mut(focus).push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.focus == Field::End && self.is_tracking_end() {
            return;
        }
        let focus = self.focus;
        self.value_mut(focus).pop();
    }

    /// "Now" button: stamp the current time into the focused time field
    pub fn set_now(&mut self, clock: &impl Clock) {
        let now = TimeOfDay::new(clock.local_time_of_day()).to_string();
        match self.focus {
            Field::Start => self.start = now,
            Field::End if !self.is_tracking_end() => self.end = now,
            _ => {}
        }
    }

    pub fn is_tracking_end(&self) -> bool {
        self.end_tracking.is_some()
    }

    /// TRACK/STOP: while tracking, each tick moves the end time to now
    pub fn toggle_end_tracking(&mut self, scheduler: &dyn Scheduler, clock: &impl Clock) {
        if self.end_tracking.take().is_some() {
            debug!("stopped tracking end time");
        } else {
            self.end = TimeOfDay::new(clock.local_time_of_day()).to_string();
            self.end_tracking = Some(scheduler.schedule(TICK_INTERVAL));
            debug!("tracking end time");
        }
    }

    pub fn on_tick(&mut self, clock: &impl Clock) {
        if self.is_tracking_end() {
            self.end = TimeOfDay::new(clock.local_time_of_day()).to_string();
        }
    }

    /// Run the earnings formula over the current field values
    pub fn calculate(&mut self) -> &Outcome {
        let outcome = match ManualTrip::parse(
            &self.start,
            &self.end,
            &self.distance,
            &self.tips,
            &self.hourly_rate,
            &self.per_km_rate,
        ) {
            Ok(trip) => Outcome::Earning(trip.earning()),
            Err(err) => Outcome::Invalid(err),
        };
        self.outcome.insert(outcome)
    }

    /// Footer text for the calculator
    pub fn summary(&self) -> String {
        match &self.outcome {
            None => "Earning".to_string(),
            Some(Outcome::Earning(amount)) => format!("Earning: ${}", format_money(*amount)),
            Some(Outcome::Invalid(err)) => err.to_string(),
        }
    }
}
