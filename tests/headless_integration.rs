use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use daytripper::clock::{ManualClock, SystemClock};
use daytripper::earnings::Rates;
use daytripper::form::TripForm;
use daytripper::meter::{Phase, TripMeter};
use daytripper::runtime::{AppEvent, Runner, TestEventSource};
use daytripper::tick::ChannelScheduler;

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless integration using the internal runtime + TripMeter without a TTY.
// Each Tick advances the manual clock by one second before the meter reads it.
#[test]
fn headless_trip_flow_with_pause() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap());
    let mut meter = TripMeter::manual(clock.clone(), 36.0);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));

    tx.send(key('t')).unwrap();
    for _ in 0..100 {
        tx.send(AppEvent::Tick).unwrap();
    }
    tx.send(key('p')).unwrap();
    for _ in 0..30 {
        tx.send(AppEvent::Tick).unwrap();
    }
    tx.send(key('p')).unwrap();
    for _ in 0..20 {
        tx.send(AppEvent::Tick).unwrap();
    }
    tx.send(key('e')).unwrap();

    for _ in 0..1000u32 {
        match runner.step() {
            Some(AppEvent::Tick) => {
                clock.advance(1);
                meter.on_tick();
            }
            Some(AppEvent::Key(k)) => match k.code {
                KeyCode::Char('t') => meter.track().unwrap(),
                KeyCode::Char('p') => meter.toggle_pause().unwrap(),
                KeyCode::Char('e') => {
                    meter.end_trip().unwrap();
                    break;
                }
                _ => {}
            },
            Some(AppEvent::Resize) => {}
            None => break,
        }
    }

    assert_eq!(meter.phase(), Phase::Idle);
    let trip = meter.log().latest().expect("trip should be logged");
    assert_eq!(trip.index, 1);
    // 150s on the clock, 30s of it paused
    assert!((trip.fare - 120.0 / 3600.0 * 36.0).abs() < 1e-9);
    assert!((trip.extra - 2.0 * 0.15).abs() < 1e-9);
    assert_eq!(trip.duration().num_seconds(), 150);
}

#[test]
fn real_ticks_only_flow_while_active() {
    let (tx, rx) = mpsc::channel();
    let mut meter = TripMeter::new(20.88, Box::new(ChannelScheduler::new(tx)));

    assert!(
        rx.recv_timeout(Duration::from_millis(1500)).is_err(),
        "idle meter must not tick"
    );

    meter.track().unwrap();
    assert!(
        matches!(
            rx.recv_timeout(Duration::from_millis(2500)),
            Ok(AppEvent::Tick)
        ),
        "active meter should tick about once a second"
    );

    meter.pause().unwrap();
    assert!(!meter.is_ticking());
    // The worker is joined on pause, so anything it queued is already here
    let _ = rx.try_iter().count();
    assert!(
        rx.recv_timeout(Duration::from_millis(1500)).is_err(),
        "paused meter must stop ticking"
    );

    meter.end_trip().unwrap();
    assert_eq!(meter.log().len(), 1);
}

#[test]
fn dropping_an_active_meter_stops_its_ticks() {
    let (tx, rx) = mpsc::channel();
    let mut meter = TripMeter::new(20.88, Box::new(ChannelScheduler::new(tx)));

    meter.track().unwrap();
    assert!(matches!(
        rx.recv_timeout(Duration::from_millis(2500)),
        Ok(AppEvent::Tick)
    ));

    drop(meter);

    // The meter held the last senders: its scheduler and the tick worker
    let _ = rx.try_iter().count();
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(1500)).unwrap_err(),
        RecvTimeoutError::Disconnected
    );
}

#[test]
fn ending_a_trip_stops_its_ticks() {
    let (tx, rx) = mpsc::channel();
    let mut meter = TripMeter::new(20.88, Box::new(ChannelScheduler::new(tx)));

    meter.track().unwrap();
    assert!(matches!(
        rx.recv_timeout(Duration::from_millis(2500)),
        Ok(AppEvent::Tick)
    ));

    meter.end_trip().unwrap();
    assert!(!meter.is_ticking());
    let _ = rx.try_iter().count();
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(1500)).unwrap_err(),
        RecvTimeoutError::Timeout
    );
}

#[test]
fn dropping_a_form_tracking_end_time_stops_its_ticks() {
    let (tx, rx) = mpsc::channel();
    let scheduler = ChannelScheduler::new(tx);
    let clock = SystemClock;
    let mut form = TripForm::new(&clock, Rates::default());

    form.toggle_end_tracking(&scheduler, &clock);
    assert!(form.is_tracking_end());
    assert!(matches!(
        rx.recv_timeout(Duration::from_millis(2500)),
        Ok(AppEvent::Tick)
    ));

    drop(form);
    let _ = rx.try_iter().count();
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(1500)).unwrap_err(),
        RecvTimeoutError::Timeout,
        "dropped form must not keep ticking"
    );

    // Only the scheduler's own sender is left, so no worker survived the form
    drop(scheduler);
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(50)).unwrap_err(),
        RecvTimeoutError::Disconnected
    );
}
