//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Entry point of the `dometrack` executable.
//!
//! Runs the following worker against simulated telescope and dome.
//!

mod args;

use dometrack::config::Configuration;
use dometrack::publisher::LogPublisher;
use dometrack::simulator::{DomeSimulator, TelescopeSimulator};
use dometrack::telemetry::TelemetrySample;
use dometrack::workers::following::spawn_following_worker;
use dometrack::VERSION_STRING;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

const TELEMETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Degrees per second.
const TELESCOPE_SWEEP_RATE: f64 = 0.5;

#[tokio::main]
async fn main() {
    let args = match args::parse_command_line(std::env::args()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}.", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = set_up_logging(args.logging) {
        eprintln!("Failed to set up logging: {}.", e);
    }

    log::info!("Dometrack ver. {} on {} started", VERSION_STRING, os_info::get());

    let config = match &args.config_file {
        Some(path) => match Configuration::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Configuration::load_default()
    };

    if let Err(e) = run(&config, args.duration).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(config: &Configuration, duration: Duration) -> Result<(), Box<dyn Error>> {
    let controller_config = config.controller_config()?;
    let heartbeat = config.heartbeat_interval()?;

    let dome = Arc::new(DomeSimulator::new(0.0, 0.0));
    let mut telescope = TelescopeSimulator::new(45.0, 30.0, TELESCOPE_SWEEP_RATE);

    let (handle, join_handle) = spawn_following_worker(Arc::clone(&dome), LogPublisher::default(), heartbeat);

    handle.configure(controller_config).await?;
    handle.enable().await?;

    let t_start = tokio::time::Instant::now();
    let mut slewed = false;
    let mut telemetry_timer = tokio::time::interval(TELEMETRY_INTERVAL);
    while t_start.elapsed() < duration {
        telemetry_timer.tick().await;

        if !slewed && t_start.elapsed() >= duration / 2 {
            log::info!("slewing telescope");
            telescope.point_at(250.0, 60.0);
            slewed = true;
        }

        handle.telemetry(TelemetrySample::Telescope(telescope.pointing())).await?;
        handle.telemetry(TelemetrySample::Dome(dome.telemetry())).await?;
    }

    handle.disable().await?;
    let status = handle.status().await?;
    log::info!(
        "finished; dome commands sent: {}, vignetting: {}",
        dome.num_commands(),
        status.vignetting.map_or("unknown".to_string(), |r| r.overall.to_string())
    );

    handle.finish().await;
    join_handle.await?;

    Ok(())
}

fn set_up_logging(to_file: bool) -> Result<(), Box<dyn Error>> {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("{}\n\n{}", info, backtrace);
    }));

    let tz_offset = *chrono::Local::now().offset();
    let log_config = simplelog::ConfigBuilder::new()
        .set_target_level(simplelog::LevelFilter::Error)
        .set_time_offset(
            time::UtcOffset::from_whole_seconds(tz_offset.local_minus_utc()).unwrap_or(time::UtcOffset::UTC)
        )
        .set_time_format_custom(simplelog::format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
        ))
        .build();

    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        log_config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto
    )];

    if to_file {
        let logfile = dirs::data_dir().unwrap_or_default()
            .join(format!("dometrack_{}.log", chrono::Local::now().format("%Y-%m-%d_%H%M%S")));
        println!("Logging to: {}", logfile.to_string_lossy());
        loggers.push(simplelog::WriteLogger::new(
            simplelog::LevelFilter::Debug,
            log_config,
            std::fs::File::create(logfile)?
        ));
    }

    simplelog::CombinedLogger::init(loggers)?;

    Ok(())
}
