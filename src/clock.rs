use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use std::{cell::Cell, rc::Rc};

/// Source of "now" for every timer transition and tick
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Current local wall time, as shown in the calculator form
    fn local_time_of_day(&self) -> NaiveTime {
        self.now().with_timezone(&Local).time()
    }
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.set(self.now.get() + Duration::seconds(secs));
    }

    pub fn advance_millis(&self, millis: i64) {
        self.now.set(self.now.get() + Duration::milliseconds(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    // Tests want deterministic form values regardless of the host timezone
    fn local_time_of_day(&self) -> NaiveTime {
        self.now.get().time()
    }
}
