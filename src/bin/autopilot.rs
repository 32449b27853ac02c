use gridbots::{
    fleet::{Event, Fleet},
    launch_autonomous_loop, share, viewer, AutonomousLoop, IgnoreMutexErr, AUTONOMOUS_PERIOD,
};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_TICKS: usize = 9;

/// Usage: `autopilot [ticks] [period_ms] [--viewer]`
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1).filter(|a| a != "--viewer");
    let max_ticks = args
        .next()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_TICKS);
    let period = args
        .next()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(AUTONOMOUS_PERIOD, Duration::from_millis);
    let with_viewer = std::env::args().any(|a| a == "--viewer");

    let fleet = share(Fleet::standard());
    println!("{}\n", fleet.lock().unwrap_ignore_poison().render());

    let AutonomousLoop {
        stop,
        mut reports,
        ticks,
        handle,
    } = match launch_autonomous_loop(fleet.clone(), period, Some(max_ticks)) {
        Ok(autonomous) => autonomous,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };
    if with_viewer {
        if let Err(e) = viewer::serve(fleet.clone(), None, ticks).await {
            warn!("running without viewer: {}", e);
        }
    }

    // every tick's report, in order, until the loop drops its sender
    let printer = async {
        while let Some(events) = reports.recv().await {
            for event in &events {
                println!("{event}");
                if let Event::Frame(_) = event {
                    println!();
                }
            }
        }
    };
    tokio::select! {
        _ = printer => {}
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, stopping");
            if stop.send(()).is_err() {
                info!("autonomous loop was already done");
            }
        }
    }
    if let Err(e) = handle.await {
        error!("autonomous loop panicked: {}", e);
    }

    let fleet = fleet.lock().unwrap_ignore_poison();
    println!("=== Final state after {} ticks ===", fleet.ticks());
    for line in fleet.status_report() {
        println!("{line}");
    }
}
