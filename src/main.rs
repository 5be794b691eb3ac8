use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};

use weather_lstm::scrape::{HttpHistoryFetcher, TagScanExtractor};
use weather_lstm::synthetic::{is_quit_command, summarize, SyntheticPredictor};
use weather_lstm::wind_load::{Terrain, TowerParameters, WindLoadCalculator, WindLoadReport};
use weather_lstm::{Pipeline, PipelineConfig, PipelineReport};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape a city's history, train the LSTM and evaluate it
    Forecast {
        /// City name as listed in the city code file; prompted for when omitted
        #[arg(long)]
        city: Option<String>,

        /// Train on the existing training set instead of scraping a new one
        #[arg(long)]
        offline: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,

        #[arg(long)]
        epochs: Option<usize>,

        #[arg(long)]
        hidden_size: Option<usize>,

        #[arg(long)]
        learning_rate: Option<f64>,

        /// Seed for both weight initialisation and the train/test split
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Interactive forecast on synthetic data, no network needed
    Demo {
        #[arg(long)]
        seed: Option<u64>,

        /// Number of days to forecast
        #[arg(long, default_value_t = 7)]
        days: usize,
    },

    /// Wind load on a lattice tower; unset parameters keep their defaults
    WindLoad {
        /// Total tower height in metres
        #[arg(long)]
        tower_height: Option<f64>,

        #[arg(long)]
        segments: Option<usize>,

        /// Outline width at the foot in metres
        #[arg(long)]
        base_width: Option<f64>,

        /// Outline width at the top in metres
        #[arg(long)]
        top_width: Option<f64>,

        #[arg(long)]
        drag_coefficient: Option<f64>,

        /// Wind speed at 10 m in m/s
        #[arg(long)]
        base_wind_speed: Option<f64>,

        /// Terrain class A (open) to D (dense city)
        #[arg(long)]
        terrain: Option<Terrain>,

        /// Site altitude in metres
        #[arg(long)]
        altitude: Option<f64>,

        #[arg(long)]
        turbulence: Option<f64>,

        #[arg(long)]
        seed: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also write the text report to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", error_chain(&err));
            ExitCode::FAILURE
        }
    }
}

/// Error and its causes joined by `: `, skipping causes whose text the
/// message already contains
fn error_chain(err: &anyhow::Error) -> String {
    let mut message = err.to_string();
    for cause in err.chain().skip(1) {
        let cause = cause.to_string();
        if !message.contains(&cause) {
            message.push_str(": ");
            message.push_str(&cause);
        }
    }
    message
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Forecast {
            city,
            offline,
            json,
            epochs,
            hidden_size,
            learning_rate,
            seed,
        } => {
            if let Some(epochs) = epochs {
                config.model.epochs = epochs;
            }
            if let Some(hidden_size) = hidden_size {
                config.model.hidden_size = hidden_size;
            }
            if let Some(learning_rate) = learning_rate {
                config.model.learning_rate = learning_rate;
            }
            if let Some(seed) = seed {
                config.model.init_seed = seed;
                config.split.seed = seed;
            }
            config.validate()?;

            let city = match city {
                Some(city) => city,
                None => prompt_city()?,
            };

            let fetcher = HttpHistoryFetcher::new(config.fetch.clone())?;
            let pipeline = Pipeline::new(config, fetcher, TagScanExtractor);
            let report = if offline {
                pipeline.forecast(&city)?
            } else {
                pipeline.run(&city)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Command::Demo { seed, days } => run_demo(seed, days),
        Command::WindLoad {
            tower_height,
            segments,
            base_width,
            top_width,
            drag_coefficient,
            base_wind_speed,
            terrain,
            altitude,
            turbulence,
            seed,
            json,
            output,
        } => {
            let defaults = TowerParameters::default();
            let params = TowerParameters {
                tower_height: tower_height.unwrap_or(defaults.tower_height),
                segments: segments.unwrap_or(defaults.segments),
                base_width: base_width.unwrap_or(defaults.base_width),
                top_width: top_width.unwrap_or(defaults.top_width),
                drag_coefficient: drag_coefficient.unwrap_or(defaults.drag_coefficient),
                base_wind_speed: base_wind_speed.unwrap_or(defaults.base_wind_speed),
                terrain: terrain.unwrap_or(defaults.terrain),
                altitude: altitude.unwrap_or(defaults.altitude),
                turbulence: turbulence.unwrap_or(defaults.turbulence),
            };
            run_wind_load(params, seed, json, output)
        }
    }
}

fn run_wind_load(params: TowerParameters, seed: Option<u64>, json: bool, output: Option<PathBuf>) -> anyhow::Result<()> {
    let result = WindLoadCalculator::new(seed).calculate(&params)?;
    let report = WindLoadReport::new(params, result, Local::now().naive_local());

    if let Some(path) = output {
        fs::write(&path, report.to_string()).with_context(|| format!("failed to write report to {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn prompt_city() -> anyhow::Result<String> {
    print!("Please Enter the City Which Temperature You Want to Predict:");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("failed to read city name")?;
    let city = line.trim().to_string();
    if city.is_empty() {
        bail!("no city name given");
    }
    Ok(city)
}

fn print_report(report: &PipelineReport) {
    println!("Predictions for {} (index: high / low):", report.city);
    let evaluation = &report.evaluation;
    for (index, pair) in evaluation.indices.iter().zip(&evaluation.predictions) {
        println!("  {:>4}: {:.2} / {:.2}", index, pair.high, pair.low);
    }
    println!(
        "Trained on {} samples, tested on {}: train loss {:.4}, test loss {:.4}",
        report.train_samples, report.test_samples, report.train_loss, report.test_loss
    );
    println!("Total time: {:.2} seconds", report.elapsed_secs);
}

fn run_demo(seed: Option<u64>, days: usize) -> anyhow::Result<()> {
    let mut predictor = SyntheticPredictor::new(seed);
    let today = Local::now().date_naive();

    println!("Synthetic history, last 7 days:");
    for (date, temp) in predictor.recent_history(7, today) {
        println!("  {}: {:.1}°C", date.format("%Y-%m-%d"), temp);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nCity name ('quit' to exit): ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let city = line.context("failed to read city name")?;
        let city = city.trim();

        if is_quit_command(city) {
            println!("Bye!");
            break;
        }
        if city.is_empty() {
            println!("Please enter a city name");
            continue;
        }

        let forecast = predictor.predict(days, today);
        println!("Forecast for {}, next {} days:", city, days);
        for day in &forecast {
            println!(
                "  Day {} ({}): {:.1}°C, wind {:.1} km/h",
                day.day,
                day.date.format("%Y-%m-%d"),
                day.temperature,
                day.wind_speed
            );
        }

        if let Some(summary) = summarize(&forecast) {
            println!("Average: {:.1}°C", summary.average);
            println!("Max: {:.1}°C", summary.max);
            println!("Min: {:.1}°C", summary.min);
        }
    }
    Ok(())
}
