mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use daytripper::{
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    earnings::Rates,
    form::TripForm,
    geo::{GeoPoint, Geolocator, LocationLog, ScriptedGeolocator, Unsupported},
    meter::TripMeter,
    runtime::{AppEvent, CrosstermEventSource, EventSource, Runner},
    tick::{ChannelScheduler, Scheduler},
    util::format_money,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};

const POLL_INTERVAL_MS: u64 = 250;

/// terminal trip meter: time trips, track fare and extras, calculate earnings and GPS distances
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal trip meter. Track a trip to accrue fare by the hour and extras by the minute, log completed trips, work out earnings for a shift by hand, and measure the distance between GPS fixes."
)]
pub struct Cli {
    /// hourly rate for the meter and the calculator (defaults to the saved config, then 20.88)
    #[clap(long)]
    hourly_rate: Option<f64>,

    /// per-kilometre rate for the calculator (defaults to the saved config, then 0.35)
    #[clap(long = "km-rate")]
    km_rate: Option<f64>,

    /// position fix handed out when a location is requested, as "lat,lon"; repeat for more fixes
    #[clap(short = 'p', long = "position", value_parser = parse_position, allow_hyphen_values = true)]
    positions: Vec<GeoPoint>,

    /// screen to open on start
    #[clap(short = 's', long, value_enum, default_value_t = Screen::Meter)]
    screen: Screen,

    /// save the effective rates as the new defaults
    #[clap(long)]
    save_config: bool,
}

fn parse_position(s: &str) -> Result<GeoPoint, String> {
    s.parse::<GeoPoint>().map_err(|e| e.to_string())
}

impl Cli {
    /// Command line rates win over the stored ones
    fn rates(&self, stored: Config) -> Rates {
        Rates {
            hourly_rate: self.hourly_rate.unwrap_or(stored.hourly_rate),
            per_km_rate: self.km_rate.unwrap_or(stored.per_km_rate),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum Screen {
    Meter,
    Calculator,
    Locations,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Meter, Screen::Calculator, Screen::Locations];

    fn index(&self) -> usize {
        Screen::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    fn next(&self) -> Screen {
        Screen::ALL[(self.index() + 1) % Screen::ALL.len()]
    }

    fn prev(&self) -> Screen {
        Screen::ALL[(self.index() + Screen::ALL.len() - 1) % Screen::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub meter: TripMeter,
    pub form: TripForm,
    pub locations: LocationLog,
    pub geolocator: Box<dyn Geolocator>,
    pub scheduler: Box<dyn Scheduler>,
    pub clock: SystemClock,
    pub screen: Screen,
    pub status: Option<String>,
}

impl App {
    pub fn new<S: Scheduler + Clone + 'static>(
        rates: Rates,
        positions: Vec<GeoPoint>,
        screen: Screen,
        scheduler: S,
    ) -> Self {
        let clock = SystemClock;
        let geolocator: Box<dyn Geolocator> = if positions.is_empty() {
            Box::new(Unsupported)
        } else {
            Box::new(ScriptedGeolocator::new(positions))
        };

        Self {
            meter: TripMeter::new(rates.hourly_rate, Box::new(scheduler.clone())),
            form: TripForm::new(&clock, rates),
            locations: LocationLog::new(),
            geolocator,
            scheduler: Box::new(scheduler),
            clock,
            screen,
            status: None,
        }
    }

    fn report(&mut self, result: daytripper::Result<()>) {
        if let Err(err) = result {
            warn!(%err, screen = %self.screen, "action rejected");
            self.status = Some(err.to_string());
        }
    }

    pub fn on_tick(&mut self) {
        self.meter.on_tick();
        self.form.on_tick(&self.clock);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }

        match key.code {
            KeyCode::Tab => {
                self.screen = self.screen.next();
                self.status = None;
                return Flow::Continue;
            }
            KeyCode::BackTab => {
                self.screen = self.screen.prev();
                self.status = None;
                return Flow::Continue;
            }
            _ => {}
        }

        match self.screen {
            Screen::Meter => self.handle_meter_key(key.code),
            Screen::Calculator => self.handle_calculator_key(key.code),
            Screen::Locations => self.handle_locations_key(key.code),
        }

        Flow::Continue
    }

    fn handle_meter_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('t') => {
                self.status = None;
                let result = self.meter.track();
                self.report(result);
            }
            KeyCode::Char('p') | KeyCode::Char(' ') => {
                self.status = None;
                let result = self.meter.toggle_pause();
                self.report(result);
            }
            KeyCode::Char('e') => {
                let logged = self.meter.end_trip().map(|trip| {
                    format!("Trip {} logged: ${}", trip.index, format_money(trip.total()))
                });
                match logged {
                    Ok(msg) => self.status = Some(msg),
                    Err(err) => self.report(Err(err)),
                }
            }
            _ => {}
        }
    }

    fn handle_calculator_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.form.focus_prev(),
            KeyCode::Down => self.form.focus_next(),
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Enter => {
                self.form.calculate();
            }
            KeyCode::Char('n') => self.form.set_now(&self.clock),
            KeyCode::Char('t') => self
                .form
                .toggle_end_tracking(self.scheduler.as_ref(), &self.clock),
            KeyCode::Char(c) => self.form.push_char(c),
            _ => {}
        }
    }

    fn handle_locations_key(&mut self, code: KeyCode) {
        if code != KeyCode::Char('g') {
            return;
        }
        match self.geolocator.current_position() {
            Ok(point) => {
                self.status = None;
                if let Some(km) = self.locations.record(point) {
                    info!(%point, km, "distance between last two locations");
                }
            }
            Err(err) => self.report(Err(err)),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    init_logging();

    let store = FileConfigStore::new();
    let rates = cli.rates(store.load());
    if let Err(err) = rates.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, err).exit();
    }
    if cli.save_config {
        store.save(&Config::from(rates))?;
        info!(path = %store.path().display(), "saved config");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new();
    let scheduler = ChannelScheduler::new(events.sender());
    let mut app = App::new(rates, cli.positions.clone(), cli.screen, scheduler);
    let runner = Runner::new(events, Duration::from_millis(POLL_INTERVAL_MS));

    info!(hourly_rate = rates.hourly_rate, per_km_rate = rates.per_km_rate, "starting");
    let result = start_tui(&mut terminal, &mut app, &runner);

    // Stops any running tick tasks before the terminal is handed back
    drop(app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    // The terminal belongs to the UI, so logs only ever go to a file
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let filter_layer =
        EnvFilter::try_from_env("DAYTRIPPER_LOG").unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn start_tui<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui(app, f))?;

    loop {
        let Some(event) = runner.step() else {
            continue;
        };

        match event {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key) == Flow::Quit {
                    break;
                }
            }
        }

        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use daytripper::meter::Phase;
    use daytripper::tick::NoopScheduler;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    fn test_app(screen: Screen) -> App {
        App::new(Rates::default(), Vec::new(), screen, NoopScheduler)
    }

    fn press(app: &mut App, code: KeyCode) -> Flow {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["daytripper"]);

        assert_eq!(cli.hourly_rate, None);
        assert_eq!(cli.km_rate, None);
        assert!(cli.positions.is_empty());
        assert_eq!(cli.screen, Screen::Meter);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_rates_override_config() {
        let cli = Cli::parse_from(["daytripper", "--hourly-rate", "30"]);
        let stored = Config {
            hourly_rate: 25.0,
            per_km_rate: 0.5,
        };

        let rates = cli.rates(stored);
        assert_eq!(rates.hourly_rate, 30.0);
        assert_eq!(rates.per_km_rate, 0.5);

        let cli = Cli::parse_from(["daytripper", "--km-rate", "0.4"]);
        let rates = cli.rates(Config::default());
        assert_eq!(rates.hourly_rate, 20.88);
        assert_eq!(rates.per_km_rate, 0.4);
    }

    #[test]
    fn test_cli_positions() {
        let cli = Cli::parse_from([
            "daytripper",
            "-p",
            "45.5,-73.5",
            "--position",
            "-33.86,151.2",
        ]);
        assert_eq!(
            cli.positions,
            vec![
                GeoPoint::new(45.5, -73.5).unwrap(),
                GeoPoint::new(-33.86, 151.2).unwrap()
            ]
        );

        let err = Cli::try_parse_from(["daytripper", "-p", "100,0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_screen() {
        let cli = Cli::parse_from(["daytripper", "-s", "calculator"]);
        assert_eq!(cli.screen, Screen::Calculator);

        let cli = Cli::parse_from(["daytripper", "--screen", "locations"]);
        assert_eq!(cli.screen, Screen::Locations);
    }

    #[test]
    fn test_screen_cycle() {
        assert_eq!(Screen::Meter.next(), Screen::Calculator);
        assert_eq!(Screen::Locations.next(), Screen::Meter);
        assert_eq!(Screen::Meter.prev(), Screen::Locations);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = test_app(Screen::Meter);
        assert_eq!(press(&mut app, KeyCode::Esc), Flow::Quit);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Flow::Quit
        );
        assert_eq!(press(&mut app, KeyCode::Char('c')), Flow::Continue);
    }

    #[test]
    fn test_tab_switches_screen() {
        let mut app = test_app(Screen::Meter);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.screen, Screen::Calculator);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.screen, Screen::Meter);
    }

    #[test]
    fn test_meter_keys() {
        let mut app = test_app(Screen::Meter);

        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.meter.phase(), Phase::Active);
        assert!(app.meter.is_ticking());

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.meter.phase(), Phase::Paused);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.meter.phase(), Phase::Active);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.meter.phase(), Phase::Idle);
        assert_eq!(app.meter.log().len(), 1);
        assert_eq!(app.status.as_deref(), Some("Trip 1 logged: $0.00"));
    }

    #[test]
    fn test_meter_rejections_become_status() {
        let mut app = test_app(Screen::Meter);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.status.as_deref(), Some("cannot end trip while idle"));
        assert!(app.meter.log().is_empty());

        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.status, None);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.status.as_deref(), Some("cannot track while active"));
    }

    #[test]
    fn test_calculator_keys() {
        let mut app = test_app(Screen::Calculator);

        // start
        for _ in 0..8 {
            press(&mut app, KeyCode::Backspace);
        }
        type_str(&mut app, "09:00:00");
        press(&mut app, KeyCode::Down);
        for _ in 0..8 {
            press(&mut app, KeyCode::Backspace);
        }
        type_str(&mut app, "17:00:00");
        press(&mut app, KeyCode::Down);
        for _ in 0..5 {
            press(&mut app, KeyCode::Backspace);
        }
        type_str(&mut app, "20");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.form.summary(), "Earning: $160.00");
    }

    #[test]
    fn test_calculator_end_tracking_toggle() {
        let mut app = test_app(Screen::Calculator);
        press(&mut app, KeyCode::Char('t'));
        assert!(app.form.is_tracking_end());
        press(&mut app, KeyCode::Char('t'));
        assert!(!app.form.is_tracking_end());
    }

    #[test]
    fn test_locations_without_geolocation() {
        let mut app = test_app(Screen::Locations);
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(
            app.status.as_deref(),
            Some("geolocation is not supported on this device")
        );
        assert!(app.locations.points().is_empty());
    }

    #[test]
    fn test_locations_with_scripted_positions() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        let mut app = App::new(Rates::default(), vec![a, b], Screen::Locations, NoopScheduler);

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.locations.last_distance(), None);
        press(&mut app, KeyCode::Char('g'));
        assert!(app.locations.last_distance().is_some());

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(
            app.status.as_deref(),
            Some("error getting location: no more positions")
        );
        assert_eq!(app.locations.points().len(), 2);
    }

    #[test]
    fn test_start_tui_quits_on_escape() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Key(KeyEvent::new(
            KeyCode::Char('t'),
            KeyModifiers::NONE,
        )))
        .unwrap();
        tx.send(AppEvent::Tick).unwrap();
        tx.send(AppEvent::Resize).unwrap();
        tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
            .unwrap();

        let runner = Runner::new(
            daytripper::runtime::TestEventSource::new(rx),
            Duration::from_millis(5),
        );
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut app = test_app(Screen::Meter);

        start_tui(&mut terminal, &mut app, &runner).unwrap();
        assert_eq!(app.meter.phase(), Phase::Active);
    }

    #[test]
    fn test_poll_interval_constant() {
        assert_eq!(POLL_INTERVAL_MS, 250);
    }
}
