//! Dependency-free demo predictor on a synthetic year of temperatures.
//!
//! The history is a seasonal sine plus uniform noise. Forecasts extrapolate
//! the 7-day moving average of the last 30 days along a weekly trend.

use std::f64::consts::PI;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use serde::Serialize;

use crate::utils::{round_tenths, seeded_rng};

const HISTORY_DAYS: usize = 365;
const BASE_TEMPERATURE: f64 = 20.0;
const SEASONAL_AMPLITUDE: f64 = 10.0;
const HISTORY_NOISE: f64 = 5.0;

const RECENT_WINDOW: usize = 30;
const AVERAGE_WINDOW: usize = 7;
const FORECAST_NOISE: f64 = 2.0;

const WIND_BASE: f64 = 15.0;
const WIND_SPREAD: f64 = 10.0;
const WIND_MIN: f64 = 5.0;
const WIND_MAX: f64 = 35.0;

/// Words that end the interactive demo loop
pub const QUIT_COMMANDS: [&str; 3] = ["quit", "exit", "退出"];

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    /// Days ahead of today, starting at 1
    pub day: usize,
    pub date: NaiveDate,
    pub temperature: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

pub struct SyntheticPredictor {
    history: Vec<f64>,
    rng: StdRng,
}

impl SyntheticPredictor {
    /// Generates a year of history; a seed makes the whole session reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => seeded_rng(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng)
    }

    pub fn with_rng(mut rng: StdRng) -> Self {
        let noise = Uniform::new(-HISTORY_NOISE, HISTORY_NOISE);
        let history = (0..HISTORY_DAYS)
            .map(|i| {
                let seasonal = SEASONAL_AMPLITUDE * (2.0 * PI * i as f64 / HISTORY_DAYS as f64).sin();
                round_tenths(BASE_TEMPERATURE + seasonal + noise.sample(&mut rng))
            })
            .collect();
        Self { history, rng }
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// The last `days` values of the history, dated so the final one is `today`
    pub fn recent_history(&self, days: usize, today: NaiveDate) -> Vec<(NaiveDate, f64)> {
        let days = days.min(self.history.len());
        let recent = &self.history[self.history.len() - days..];
        recent
            .iter()
            .enumerate()
            .map(|(i, &temp)| (today - Days::new((days - 1 - i) as u64), temp))
            .collect()
    }

    /// Forecasts `days` days after `today`.
    ///
    /// Every call draws fresh noise, so repeated calls differ unless the
    /// predictor was built from the same seed and called in the same order.
    pub fn predict(&mut self, days: usize, today: NaiveDate) -> Vec<DailyForecast> {
        let start = self.history.len().saturating_sub(RECENT_WINDOW);
        let recent = &self.history[start..];
        let base = moving_average(recent, AVERAGE_WINDOW);
        let trend = weekly_trend(recent);

        let variation = Uniform::new(-FORECAST_NOISE, FORECAST_NOISE);
        let gust = Uniform::new(-WIND_SPREAD, WIND_SPREAD);

        (1..=days)
            .map(|day| {
                let d = day as f64;
                let seasonal = (2.0 * PI * d / HISTORY_DAYS as f64).sin() * 2.0;
                let temperature = base + trend * d + seasonal + variation.sample(&mut self.rng);
                let wind_speed = (WIND_BASE + gust.sample(&mut self.rng)).clamp(WIND_MIN, WIND_MAX);

                DailyForecast {
                    day,
                    date: today + Days::new(day as u64),
                    temperature: round_tenths(temperature),
                    wind_speed: round_tenths(wind_speed),
                }
            })
            .collect()
    }
}

/// Mean of the last `window` values, or of all of them when there are fewer
pub fn moving_average(data: &[f64], window: usize) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let tail = &data[data.len().saturating_sub(window)..];
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Average daily change between the 7th-from-last and the last value
fn weekly_trend(data: &[f64]) -> f64 {
    if data.len() < AVERAGE_WINDOW {
        return 0.0;
    }
    (data[data.len() - 1] - data[data.len() - AVERAGE_WINDOW]) / AVERAGE_WINDOW as f64
}

pub fn summarize(forecast: &[DailyForecast]) -> Option<ForecastSummary> {
    if forecast.is_empty() {
        return None;
    }
    let temps = forecast.iter().map(|f| f.temperature);
    Some(ForecastSummary {
        average: temps.clone().sum::<f64>() / forecast.len() as f64,
        max: temps.clone().fold(f64::NEG_INFINITY, f64::max),
        min: temps.fold(f64::INFINITY, f64::min),
    })
}

/// Case-insensitive match against [`QUIT_COMMANDS`]
pub fn is_quit_command(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    QUIT_COMMANDS.contains(&input.as_str())
}
