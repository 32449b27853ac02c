#![deny(clippy::unwrap_used)]
pub mod fleet;
pub mod math;
pub mod sensors;
pub mod tracker;
pub mod viewer;
pub mod world;

use std::{
    fmt,
    sync::{Arc, LockResult, Mutex},
    time::Duration,
};

use fleet::{Event, Fleet};
use tokio::{
    select,
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        oneshot::{self, Sender},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// default period between two autonomous ticks
pub const AUTONOMOUS_PERIOD: Duration = Duration::from_millis(500);

/// Fleet shared between the control loop and its readers.
/// The control loop is the only writer and holds the lock for a whole tick.
pub type SharedFleet = Arc<Mutex<Fleet>>;

pub fn share(fleet: Fleet) -> SharedFleet {
    Arc::new(Mutex::new(fleet))
}

pub trait IgnoreMutexErr<T> {
    fn unwrap_ignore_poison(self) -> T;
}

impl<T> IgnoreMutexErr<T> for LockResult<T> {
    fn unwrap_ignore_poison(self) -> T {
        match self {
            Ok(r) => r,
            Err(poisoned) => {
                let guard = poisoned.into_inner();
                warn!("mutex was poisoned, recovering from mutex poisoning");
                guard
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLoopError {
    /// `tokio::time::interval` can't tick every 0s
    ZeroPeriod,
}

impl fmt::Display for ControlLoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlLoopError::ZeroPeriod => f.write_str("the autonomous period must be non-zero"),
        }
    }
}

impl std::error::Error for ControlLoopError {}

/// Handles on a running autonomous loop, see [`launch_autonomous_loop`].
pub struct AutonomousLoop {
    /// stops the loop when fired or dropped
    pub stop: Sender<()>,
    /// one report per tick, in order: `Event::Step`, the robots' outcomes, then the frame
    pub reports: UnboundedReceiver<Vec<Event>>,
    /// number of the last tick run
    pub ticks: watch::Receiver<usize>,
    pub handle: JoinHandle<()>,
}

fn log_event(event: &Event) {
    match event {
        Event::Refused { .. } => debug!("{}", event),
        Event::Frame(_) => {}
        _ => info!("{}", event),
    }
}

async fn autonomous_loop(
    fleet: SharedFleet,
    period: Duration,
    max_ticks: Option<usize>,
    reports: UnboundedSender<Vec<Event>>,
    ticks: watch::Sender<usize>,
) {
    let mut interval = tokio::time::interval(period);
    let mut ran = 0;
    while max_ticks.map_or(true, |max| ran < max) {
        interval.tick().await; // first tick ticks immediately that's why it's at the beginning

        let (number, events) = {
            let mut fleet = fleet.lock().unwrap_ignore_poison();
            let mut events = vec![Event::Step {
                number: fleet.ticks() + 1,
            }];
            events.extend(fleet.tick());
            (fleet.ticks(), events)
        };
        events.iter().for_each(log_event);
        ran += 1;
        if reports.send(events).is_err() {
            debug!("nobody is reading tick reports anymore");
        }
        ticks.send_replace(number);
    }
    info!("autonomous loop done after {} ticks", ran);
}

/// Spawns the autonomous loop: every `period`, each robot of the fleet runs its own policy once.
///
/// The loop ends after `max_ticks` ticks (never if `None`), or as soon as the stop sender
/// fires or is dropped. Every tick is reported on `reports`, and `ticks` changes after each
/// of them, see [`viewer::serve`].
///
/// # Examples
///
/// ```
/// use gridbots::{fleet::Fleet, launch_autonomous_loop, share, IgnoreMutexErr};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let fleet = share(Fleet::standard());
///     let autonomous = launch_autonomous_loop(fleet.clone(), Duration::from_millis(1), Some(2))
///         .expect("period is non-zero");
///     autonomous.handle.await.expect("autonomous loop panicked");
///     assert_eq!(fleet.lock().unwrap_ignore_poison().ticks(), 2);
/// }
/// ```
pub fn launch_autonomous_loop(
    fleet: SharedFleet,
    period: Duration,
    max_ticks: Option<usize>,
) -> Result<AutonomousLoop, ControlLoopError> {
    if period.is_zero() {
        return Err(ControlLoopError::ZeroPeriod);
    }
    let (stop_sender, stop_receiver) = oneshot::channel();
    let (report_sender, report_receiver) = mpsc::unbounded_channel();
    let start = fleet.lock().unwrap_ignore_poison().ticks();
    let (ticks_sender, ticks_receiver) = watch::channel(start);
    let handle = tokio::spawn(async move {
        info!("autonomous loop started, period {:?}", period);
        select! {
            _ = autonomous_loop(fleet, period, max_ticks, report_sender, ticks_sender) => {}
            _ = stop_receiver => {
                info!("autonomous loop received stop signal")
            }
        };
    });
    Ok(AutonomousLoop {
        stop: stop_sender,
        reports: report_receiver,
        ticks: ticks_receiver,
        handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Cell;

    fn launch(fleet: &SharedFleet, period: Duration, max_ticks: Option<usize>) -> AutonomousLoop {
        launch_autonomous_loop(fleet.clone(), period, max_ticks).expect("period is non-zero")
    }

    #[tokio::test]
    async fn loop_stops_after_max_ticks() {
        let fleet = share(Fleet::standard());
        let autonomous = launch(&fleet, Duration::from_millis(1), Some(3));
        autonomous.handle.await.expect("autonomous loop panicked");

        let fleet = fleet.lock().unwrap_ignore_poison();
        assert_eq!(fleet.ticks(), 3);
        assert_eq!(fleet.robots()[0].pos(), Cell::new(3, 0));
        assert_eq!(fleet.robots()[0].battery(), 85);
    }

    #[tokio::test]
    async fn every_tick_is_reported_once() {
        let fleet = share(Fleet::standard());
        let mut autonomous = launch(&fleet, Duration::from_millis(1), Some(9));

        let mut reports = Vec::new();
        while let Some(report) = autonomous.reports.recv().await {
            reports.push(report);
        }
        autonomous.handle.await.expect("autonomous loop panicked");

        assert_eq!(reports.len(), 9);
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.first(), Some(&Event::Step { number: i + 1 }));
            let frames = report
                .iter()
                .filter(|e| matches!(e, Event::Frame(_)))
                .count();
            assert_eq!(frames, 1);
            // step, one outcome per robot, frame
            assert_eq!(report.len(), 5);
        }
        assert_eq!(*autonomous.ticks.borrow(), 9);
    }

    #[tokio::test]
    async fn zero_period_is_rejected() {
        let fleet = share(Fleet::standard());
        let result = launch_autonomous_loop(fleet.clone(), Duration::ZERO, Some(1));
        assert!(matches!(result, Err(ControlLoopError::ZeroPeriod)));
        assert_eq!(fleet.lock().unwrap_ignore_poison().ticks(), 0);
    }

    #[tokio::test]
    async fn loop_stops_on_signal() {
        let fleet = share(Fleet::standard());
        let mut autonomous = launch(&fleet, Duration::from_secs(3600), None);
        // wait for the immediate first tick
        autonomous
            .ticks
            .changed()
            .await
            .expect("loop should still be running");
        autonomous
            .stop
            .send(())
            .expect("loop should still be listening");
        autonomous.handle.await.expect("autonomous loop panicked");

        assert_eq!(fleet.lock().unwrap_ignore_poison().ticks(), 1);
    }

    #[tokio::test]
    async fn dropping_the_sender_stops_the_loop() {
        let fleet = share(Fleet::standard());
        let autonomous = launch(&fleet, Duration::from_secs(3600), None);
        drop(autonomous.stop);
        autonomous.handle.await.expect("autonomous loop panicked");
    }

    #[tokio::test]
    async fn readers_see_whole_ticks() {
        let fleet = share(Fleet::standard());
        let autonomous = launch(&fleet, Duration::from_millis(1), Some(9));
        loop {
            let snapshot = fleet.lock().unwrap_ignore_poison().snapshot();
            for robot in &snapshot.robots {
                assert_eq!(Some(&robot.pos), robot.path.last());
                // at most one new cell per tick
                assert!(robot.path.len() <= snapshot.ticks + 1);
            }
            if autonomous.handle.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }
}
