use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::tick::{NoopScheduler, Scheduler, TickHandle, TICK_INTERVAL};
use crate::trip_log::{TripLog, TripRecord};
use crate::util::format_hms;

pub const DEFAULT_HOURLY_RATE: f64 = 20.88;
/// Extra accrues per elapsed active minute, uncapped
pub const EXTRA_RATE_PER_MINUTE: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Idle,
    Active,
    Paused,
}

/// Lifecycle of the in-progress trip. The pause timestamp only exists while paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripState {
    Idle,
    Active {
        started_at: DateTime<Utc>,
    },
    Paused {
        started_at: DateTime<Utc>,
        paused_at: DateTime<Utc>,
    },
}

impl TripState {
    pub fn phase(&self) -> Phase {
        match self {
            TripState::Idle => Phase::Idle,
            TripState::Active { .. } => Phase::Active,
            TripState::Paused { .. } => Phase::Paused,
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match *self {
            TripState::Idle => None,
            TripState::Active { started_at } | TripState::Paused { started_at, .. } => {
                Some(started_at)
            }
        }
    }
}

/// What the meter shows: elapsed active time and the money derived from it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterReading {
    pub elapsed_secs: u64,
    pub fare: f64,
    pub extra: f64,
}

impl MeterReading {
    /// Reading for a trip started at `started_at`, observed at `now`
    pub fn at(
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
        paused_secs: u64,
        hourly_rate: f64,
    ) -> Self {
        let wall_secs = now.signed_duration_since(started_at).num_seconds().max(0) as u64;
        Self::from_elapsed(wall_secs.saturating_sub(paused_secs), hourly_rate)
    }

    pub fn from_elapsed(elapsed_secs: u64, hourly_rate: f64) -> Self {
        let secs = elapsed_secs as f64;
        Self {
            elapsed_secs,
            fare: secs / 3600.0 * hourly_rate,
            extra: secs / 60.0 * EXTRA_RATE_PER_MINUTE,
        }
    }

    pub fn duration_display(&self) -> String {
        format_hms(self.elapsed_secs)
    }

    pub fn total(&self) -> f64 {
        self.fare + self.extra
    }
}

/// The trip timer: owns the current trip, its tick task and the trip log
pub struct TripMeter<C: Clock = SystemClock> {
    clock: C,
    scheduler: Box<dyn Scheduler>,
    hourly_rate: f64,
    state: TripState,
    paused_secs: u64,
    reading: MeterReading,
    log: TripLog,
    tick: Option<TickHandle>,
}

impl TripMeter<SystemClock> {
    pub fn new(hourly_rate: f64, scheduler: Box<dyn Scheduler>) -> Self {
        Self::with_clock(SystemClock, hourly_rate, scheduler)
    }
}

impl<C: Clock> TripMeter<C> {
    pub fn with_clock(clock: C, hourly_rate: f64, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            clock,
            scheduler,
            hourly_rate,
            state: TripState::Idle,
            paused_secs: 0,
            reading: MeterReading::default(),
            log: TripLog::new(),
            tick: None,
        }
    }

    /// Meter driven entirely by hand: no background ticks
    pub fn manual(clock: C, hourly_rate: f64) -> Self {
        Self::with_clock(clock, hourly_rate, Box::new(NoopScheduler))
    }

    pub fn state(&self) -> TripState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn reading(&self) -> MeterReading {
        self.reading
    }

    pub fn paused_secs(&self) -> u64 {
        self.paused_secs
    }

    pub fn hourly_rate(&self) -> f64 {
        self.hourly_rate
    }

    pub fn log(&self) -> &TripLog {
        &self.log
    }

    /// True while a tick task is held, which is exactly while the trip is active
    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    fn reject(&self, action: &'static str) -> Error {
        Error::InvalidStateTransition {
            action,
            phase: self.phase(),
        }
    }

    /// Start a new trip
    pub fn track(&mut self) -> Result<()> {
        if self.state != TripState::Idle {
            return Err(self.reject("track"));
        }

        let now = self.clock.now();
        self.state = TripState::Active { started_at: now };
        self.paused_secs = 0;
        self.reading = MeterReading::default();
        self.tick = Some(self.scheduler.schedule(TICK_INTERVAL));
        debug!(started_at = %now, "trip started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        let TripState::Active { started_at } = self.state else {
            return Err(self.reject("pause"));
        };

        let now = self.clock.now();
        self.state = TripState::Paused {
            started_at,
            paused_at: now,
        };
        self.tick = None;
        debug!(elapsed = self.reading.elapsed_secs, "trip paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        let TripState::Paused {
            started_at,
            paused_at,
        } = self.state
        else {
            return Err(self.reject("resume"));
        };

        let pause_secs = self
            .clock
            .now()
            .signed_duration_since(paused_at)
            .num_seconds()
            .max(0) as u64;
        self.paused_secs += pause_secs;
        self.state = TripState::Active { started_at };
        self.tick = Some(self.scheduler.schedule(TICK_INTERVAL));
        debug!(pause_secs, total_paused = self.paused_secs, "trip resumed");
        Ok(())
    }

    /// Pause an active trip or resume a paused one
    pub fn toggle_pause(&mut self) -> Result<()> {
        match self.state {
            TripState::Active { .. } => self.pause(),
            TripState::Paused { .. } => self.resume(),
            TripState::Idle => Err(self.reject("pause")),
        }
    }

    /// Finish the current trip, log it, and go back to idle. The logged fare
    /// and extra are the values last shown on the meter.
    pub fn end_trip(&mut self) -> Result<&TripRecord> {
        let Some(started_at) = self.state.started_at() else {
            return Err(self.reject("end trip"));
        };

        let ended_at = self.clock.now();
        self.tick = None;
        self.state = TripState::Idle;
        self.paused_secs = 0;

        let trip = self
            .log
            .record(self.reading.fare, self.reading.extra, started_at, ended_at);
        debug!(
            index = trip.index,
            fare = trip.fare,
            extra = trip.extra,
            "trip ended"
        );
        Ok(trip)
    }

    /// Periodic refresh. Only an active trip moves; otherwise values stay frozen.
    pub fn on_tick(&mut self) {
        if let TripState::Active { started_at } = self.state {
            self.reading = MeterReading::at(
                started_at,
                self.clock.now(),
                self.paused_secs,
                self.hourly_rate,
            );
        }
    }
}

impl<C: Clock> std::fmt::Debug for TripMeter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripMeter")
            .field("hourly_rate", &self.hourly_rate)
            .field("state", &self.state)
            .field("paused_secs", &self.paused_secs)
            .field("reading", &self.reading)
            .field("trips", &self.log.len())
            .field("ticking", &self.is_ticking())
            .finish()
    }
}
