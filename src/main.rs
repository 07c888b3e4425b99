use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use tomorrow_core::Config;
use tomorrow_ui::{render, AppServices, DisplayState, FeaturedModel, WeatherModel};
use tomorrow_weather::Coordinates;

mod cli;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() -> Result<ExitCode> {
    tomorrow_core::init()?;

    let args = Cli::parse();
    let config = load_config(&args)?;

    let services = AppServices::from_config(&config).context("Failed to start services")?;

    tracing::info!("Tomorrow Weather started");

    let code = match args.cmd {
        Command::Search { city } => {
            let mut model = WeatherModel::new(services.clone());
            model.set_search_text(city.join(" "));
            if !model.search() {
                eprintln!("Nothing to search for.");
                ExitCode::FAILURE
            } else {
                show_result(&mut model)
            }
        }
        Command::Coords {
            latitude,
            longitude,
        } => {
            let mut model = WeatherModel::new(services.clone());
            model.lookup_coordinates(Coordinates::new(latitude, longitude));
            show_result(&mut model)
        }
        Command::Here => {
            let mut model = WeatherModel::new(services.clone());
            model.locate();
            show_result(&mut model)
        }
        Command::Featured { watch, select } => featured(&services, watch, select),
    };

    services.shutdown();
    Ok(code)
}

fn load_config(args: &Cli) -> Result<Config> {
    let (config, _) = match &args.config {
        Some(path) => Config::load_validated_from(path)?,
        None => Config::load_validated()?,
    };
    Ok(config)
}

fn wait_for_result(model: &mut WeatherModel) {
    while model.is_loading() {
        model.poll_channel();
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn show_result(model: &mut WeatherModel) -> ExitCode {
    wait_for_result(model);
    let text = render::render_display(model.state());

    match model.state() {
        DisplayState::Error(_) => {
            eprint!("{}", text);
            ExitCode::FAILURE
        }
        _ => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
    }
}

fn featured(services: &Arc<AppServices>, watch: bool, select: Option<usize>) -> ExitCode {
    let mut panel = FeaturedModel::new(services.clone());
    if !panel.start() {
        eprintln!("Could not start the featured panel.");
        return ExitCode::FAILURE;
    }

    println!("{}", render::render_featured(&panel));
    let started = Instant::now();
    while !panel.is_loaded() {
        panel.poll_channel();
        std::thread::sleep(POLL_INTERVAL);
    }
    tracing::debug!("Featured panel loaded in {:?}", started.elapsed());
    print!("{}", render::render_featured(&panel));

    if let Some(index) = select {
        let Some(tile) = index.checked_sub(1).and_then(|i| panel.tile(i)) else {
            eprintln!("No featured city #{}", index);
            return ExitCode::FAILURE;
        };
        println!();
        let mut model = WeatherModel::new(services.clone());
        model.select_featured(&tile.city);
        return show_result(&mut model);
    }

    if watch {
        loop {
            if panel.poll_channel() {
                println!();
                print!("{}", render::render_featured(&panel));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    panel.stop();
    ExitCode::SUCCESS
}
