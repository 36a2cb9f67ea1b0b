//! Drives the blink controller against a simulated board.
//!
//! The line, the delay and the watchdog share one bench that records every
//! hardware interaction against a virtual millisecond clock.

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::watchdog::Watchdog;

use stm32f0xx_blinky::blink::{BlinkController, IntoOutput, Phase, Timing};
use stm32f0xx_blinky::time::{MilliSeconds, U32Ext};
use stm32f0xx_blinky::config::ConfigError;
use stm32f0xx_blinky::ConfigBits;

const POWER_OFF: &str = "power off";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Event {
    Output,
    Level(bool),
    Feed,
}

#[derive(Default)]
struct Bench {
    now: u64,
    output: bool,
    events: Vec<(u64, Event)>,
    // delays left before the bench cuts power
    budget: Option<usize>,
    // writes left before the line starts failing
    healthy_writes: Option<usize>,
}

type Shared = Rc<RefCell<Bench>>;

impl Bench {
    fn shared() -> Shared {
        Rc::new(RefCell::new(Bench::default()))
    }

    fn levels(&self) -> Vec<(u64, bool)> {
        self.events
            .iter()
            .filter_map(|&(t, e)| match e {
                Event::Level(high) => Some((t, high)),
                _ => None,
            })
            .collect()
    }

    fn feeds(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter(|&&(_, e)| e == Event::Feed)
            .map(|&(t, _)| t)
            .collect()
    }
}

struct Line(Shared);

struct Led(Shared);

#[derive(Debug, PartialEq)]
enum LineError {
    NotOutput,
    Shorted,
}

impl IntoOutput for Line {
    type Output = Led;

    fn into_output(self) -> Led {
        {
            let mut bench = self.0.borrow_mut();
            bench.output = true;
            let now = bench.now;
            bench.events.push((now, Event::Output));
        }
        Led(self.0)
    }
}

impl Led {
    fn write(&mut self, high: bool) -> Result<(), LineError> {
        let mut bench = self.0.borrow_mut();
        if !bench.output {
            return Err(LineError::NotOutput);
        }
        if let Some(left) = bench.healthy_writes.as_mut() {
            if *left == 0 {
                return Err(LineError::Shorted);
            }
            *left -= 1;
        }
        let now = bench.now;
        bench.events.push((now, Event::Level(high)));
        Ok(())
    }
}

impl OutputPin for Led {
    type Error = LineError;

    fn set_high(&mut self) -> Result<(), LineError> {
        self.write(true)
    }

    fn set_low(&mut self) -> Result<(), LineError> {
        self.write(false)
    }
}

struct Clock(Shared);

impl DelayMs<u32> for Clock {
    fn delay_ms(&mut self, ms: u32) {
        let mut bench = self.0.borrow_mut();
        match bench.budget {
            Some(0) => panic!("{}", POWER_OFF),
            Some(ref mut left) => *left -= 1,
            None => (),
        }
        bench.now += u64::from(ms);
    }
}

struct Dog(Shared);

impl Watchdog for Dog {
    fn feed(&mut self) {
        let mut bench = self.0.borrow_mut();
        let now = bench.now;
        bench.events.push((now, Event::Feed));
    }
}

fn blinky(bench: &Shared, timing: Timing) -> BlinkController<Led, Clock> {
    BlinkController::initialize(Line(bench.clone()), Clock(bench.clone()), timing)
}

fn reference_timing() -> Timing {
    Timing::symmetric(500.ms())
}

#[test]
fn levels_strictly_alternate() {
    let bench = Bench::shared();
    let mut blinky = blinky(&bench, reference_timing());

    for _ in 0..10 {
        blinky.cycle().unwrap();
    }

    let levels = bench.borrow().levels();
    assert_eq!(levels.len(), 20);
    assert!(levels[0].1);
    for pair in levels.windows(2) {
        assert_ne!(pair[0].1, pair[1].1, "repeated level at {} ms", pair[1].0);
    }
}

#[test]
fn every_phase_lasts_the_configured_duration() {
    let bench = Bench::shared();
    let mut blinky = blinky(&bench, reference_timing());

    for _ in 0..5 {
        blinky.cycle().unwrap();
    }

    let levels = bench.borrow().levels();
    for pair in levels.windows(2) {
        assert_eq!(pair[1].0 - pair[0].0, 500);
    }
    assert_eq!(bench.borrow().now, 5 * 1_000);
}

#[test]
fn on_and_off_phases_are_symmetric() {
    let timing = reference_timing();
    assert_eq!(timing.on(), timing.off());
    assert_eq!(timing.of(Phase::On), MilliSeconds(500));

    let bench = Bench::shared();
    let mut blinky = blinky(&bench, timing);
    blinky.cycle().unwrap();

    let levels = bench.borrow().levels();
    let on = levels[1].0 - levels[0].0;
    let off = bench.borrow().now - levels[1].0;
    assert_eq!(on, off);
}

#[test]
fn distinct_phase_durations() {
    let bench = Bench::shared();
    let mut blinky = blinky(&bench, Timing::new(100.ms(), 900.ms()));

    blinky.cycle().unwrap();
    blinky.cycle().unwrap();

    assert_eq!(
        bench.borrow().levels(),
        [(0, true), (100, false), (1_000, true), (1_100, false)]
    );
}

#[test]
fn run_never_returns() {
    let bench = Bench::shared();
    bench.borrow_mut().budget = Some(8);
    let blinky = blinky(&bench, reference_timing());

    let outcome = panic::catch_unwind(AssertUnwindSafe(move || blinky.run()));

    let payload = outcome.err().expect("run() is divergent");
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied());
    assert_eq!(message, Some(POWER_OFF));

    // the ninth delay was cut short, after four full periods and one more ON
    let levels = bench.borrow().levels();
    assert_eq!(levels.len(), 9);
    assert!(levels.len() / 2 > 2);
}

#[test]
fn output_mode_precedes_first_write() {
    let bench = Bench::shared();
    let mut blinky = blinky(&bench, reference_timing());

    assert_eq!(bench.borrow().events, [(0, Event::Output)]);
    assert_eq!(blinky.phase(), Phase::Off);

    blinky.step().unwrap();
    let events = bench.borrow().events.clone();
    assert_eq!(events[0], (0, Event::Output));
    assert_eq!(events[1], (0, Event::Level(true)));
}

#[test]
fn reference_scenario() {
    let bench = Bench::shared();
    let mut blinky = blinky(&bench, reference_timing());

    blinky.cycle().unwrap();
    blinky.cycle().unwrap();

    assert_eq!(
        bench.borrow().levels(),
        [(0, true), (500, false), (1_000, true), (1_500, false)]
    );
}

#[test]
fn watchdog_is_fed_after_every_transition() {
    let bench = Bench::shared();
    let mut blinky = blinky(&bench, reference_timing()).with_watchdog(Dog(bench.clone()));

    blinky.cycle().unwrap();

    let events: Vec<Event> = bench.borrow().events.iter().map(|&(_, e)| e).collect();
    assert_eq!(
        events,
        [
            Event::Output,
            Event::Level(true),
            Event::Feed,
            Event::Level(false),
            Event::Feed,
        ]
    );
}

#[test]
fn unwatched_controller_never_feeds() {
    let bench = Bench::shared();
    let mut blinky = blinky(&bench, reference_timing());

    blinky.cycle().unwrap();

    assert!(bench
        .borrow()
        .events
        .iter()
        .all(|&(_, e)| e != Event::Feed));
}

#[test]
fn failed_write_keeps_phase_and_skips_delay() {
    let bench = Bench::shared();
    bench.borrow_mut().healthy_writes = Some(1);
    let mut blinky = blinky(&bench, reference_timing());

    assert_eq!(blinky.step(), Ok(Phase::On));
    assert_eq!(blinky.step(), Err(LineError::Shorted));
    assert_eq!(blinky.phase(), Phase::On);
    assert_eq!(bench.borrow().now, 500);
}

#[test]
fn run_keeps_cadence_when_the_line_fails() {
    let bench = Bench::shared();
    {
        let mut b = bench.borrow_mut();
        b.healthy_writes = Some(3);
        b.budget = Some(4);
    }
    let blinky = blinky(&bench, reference_timing()).with_watchdog(Dog(bench.clone()));

    let outcome = panic::catch_unwind(AssertUnwindSafe(move || blinky.run()));
    assert!(outcome.is_err());

    // the refused LOW still waited out its phase before power was cut
    let bench = bench.borrow();
    assert_eq!(bench.levels(), [(0, true), (500, false), (1_000, true)]);
    assert_eq!(bench.now, 2_000);
    // refused phases are fed like the others
    assert_eq!(bench.feeds(), [0, 500, 1_000, 1_500, 2_000]);
}

#[test]
fn release_returns_the_parts() {
    let bench = Bench::shared();
    let mut blinky = blinky(&bench, reference_timing());
    blinky.step().unwrap();

    let (mut led, mut clock, _) = blinky.release();
    led.set_low().unwrap();
    clock.delay_ms(10);
    assert_eq!(bench.borrow().levels(), [(0, true), (500, false)]);
    assert_eq!(bench.borrow().now, 510);
}

#[test]
fn reference_configuration_delay_unit() {
    let bits = ConfigBits::BLINKY;
    assert_eq!(bits.validate(), Ok(()));
    assert_eq!(bits.delay_unit(), 8_000);
    assert_eq!(bits.clock().cycles(500.ms()), 4_000_000);
}

#[test]
fn watchdog_rejects_unsupervisable_timing() {
    let bits = ConfigBits::BLINKY.watchdog(true);
    assert_eq!(bits.validate_timing(&reference_timing()), Ok(()));
    assert_eq!(
        bits.validate_timing(&Timing::symmetric(30_000.ms())),
        Err(ConfigError::WatchdogTooShort {
            period: 26_208.ms(),
            phase: 30_000.ms(),
        })
    );
}
