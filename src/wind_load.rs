//! Wind load on a lattice tower, segment by segment.
//!
//! The tower is cut into equal-height segments. Each segment sees the wind
//! speed of a power-law profile at its mid height, scaled up by a random
//! turbulence factor. The load is the dynamic pressure (with an
//! altitude-corrected air density) times the segment's solid cross section
//! and the drag coefficient.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::WindLoadError;
use crate::utils::{round_to, seeded_rng};

const SEA_LEVEL_AIR_DENSITY: f64 = 1.225;
/// Height the base wind speed is measured at, in metres
const REFERENCE_HEIGHT: f64 = 10.0;
/// Share of the tower outline that is solid steel
const SOLIDITY_RATIO: f64 = 0.3;
/// Altitude at which the barometric density approximation reaches zero
const ATMOSPHERE_LIMIT: f64 = 44300.0;

const HEAVY_LOAD: f64 = 5000.0;
const HIGH_WIND: f64 = 25.0;
const TOP_LOAD_SHARE: f64 = 0.8;

/// Ground roughness class of the tower site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terrain {
    /// Open flat ground, sea shore
    A,
    /// Farmland, villages
    B,
    /// City districts with dense buildings
    C,
    /// City districts with dense, tall buildings
    D,
}

impl Terrain {
    /// Power-law exponent of the wind profile
    pub fn alpha(self) -> f64 {
        match self {
            Terrain::A => 0.12,
            Terrain::B => 0.16,
            Terrain::C => 0.22,
            Terrain::D => 0.30,
        }
    }

    /// Roughness length in metres
    pub fn roughness_length(self) -> f64 {
        match self {
            Terrain::A => 0.01,
            Terrain::B => 0.05,
            Terrain::C => 0.20,
            Terrain::D => 1.00,
        }
    }
}

impl FromStr for Terrain {
    type Err = WindLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Terrain::A),
            "B" => Ok(Terrain::B),
            "C" => Ok(Terrain::C),
            "D" => Ok(Terrain::D),
            _ => Err(WindLoadError::UnknownTerrain(s.to_string())),
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerParameters {
    /// Total height in metres
    pub tower_height: f64,
    pub segments: usize,
    /// Outline width at the foot, metres
    pub base_width: f64,
    /// Outline width at the top, metres
    pub top_width: f64,
    pub drag_coefficient: f64,
    /// Wind speed at 10 m, m/s
    pub base_wind_speed: f64,
    pub terrain: Terrain,
    /// Site altitude in metres
    pub altitude: f64,
    /// Turbulence intensity; each segment's speed is scaled by `1 + turbulence * U(0, 1)`
    pub turbulence: f64,
}

impl Default for TowerParameters {
    fn default() -> Self {
        Self {
            tower_height: 50.0,
            segments: 10,
            base_width: 8.0,
            top_width: 2.0,
            drag_coefficient: 2.0,
            base_wind_speed: 25.0,
            terrain: Terrain::B,
            altitude: 0.0,
            turbulence: 0.1,
        }
    }
}

impl TowerParameters {
    pub fn validate(&self) -> Result<(), WindLoadError> {
        let invalid = |field: &'static str, message: &str| WindLoadError::InvalidParameter {
            field,
            message: message.to_string(),
        };

        if !(self.tower_height.is_finite() && self.tower_height > 0.0) {
            return Err(invalid("tower_height", "must be a positive number"));
        }
        if self.segments == 0 {
            return Err(invalid("segments", "must be positive"));
        }
        if !(self.base_width >= 0.0 && self.top_width >= 0.0) {
            return Err(invalid("width", "must not be negative"));
        }
        if !(self.drag_coefficient > 0.0) {
            return Err(invalid("drag_coefficient", "must be positive"));
        }
        if !(self.base_wind_speed >= 0.0) {
            return Err(invalid("base_wind_speed", "must not be negative"));
        }
        if !(self.altitude < ATMOSPHERE_LIMIT) {
            return Err(invalid("altitude", "must be below 44300 m"));
        }
        if !(self.turbulence >= 0.0) {
            return Err(invalid("turbulence", "must not be negative"));
        }
        Ok(())
    }
}

/// Results for one tower segment, rounded for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentLoad {
    /// Mid height of the segment, m
    pub height: f64,
    /// m/s
    pub wind_speed: f64,
    /// Pa
    pub wind_pressure: f64,
    /// m²
    pub cross_section: f64,
    /// N
    pub wind_load: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindLoadSummary {
    pub total_load: f64,
    pub max_load: f64,
    pub avg_wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindLoadResult {
    pub segments: Vec<SegmentLoad>,
    pub summary: WindLoadSummary,
}

/// Power-law wind speed at `height`, never negative
pub fn wind_profile(base_wind_speed: f64, height: f64, terrain: Terrain, reference_height: f64) -> f64 {
    let speed = base_wind_speed * (height / reference_height).powf(terrain.alpha());
    speed.max(0.0)
}

/// Dynamic pressure `0.5 * rho * v²` in Pa
pub fn wind_pressure(wind_speed: f64, air_density: f64) -> f64 {
    0.5 * air_density * wind_speed.powi(2)
}

/// Barometric air density at `altitude` metres
pub fn air_density(altitude: f64) -> f64 {
    SEA_LEVEL_AIR_DENSITY * (1.0 - altitude / ATMOSPHERE_LIMIT).powf(5.256)
}

/// Solid area of a square section whose width tapers linearly with height
pub fn cross_section(height: f64, total_height: f64, base_width: f64, top_width: f64) -> f64 {
    let ratio = height / total_height;
    let width = base_width - (base_width - top_width) * ratio;
    width * width * SOLIDITY_RATIO
}

pub struct WindLoadCalculator {
    rng: StdRng,
}

impl WindLoadCalculator {
    /// A seed makes the turbulence draws reproducible
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => seeded_rng(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn calculate(&mut self, params: &TowerParameters) -> Result<WindLoadResult, WindLoadError> {
        params.validate()?;

        let segment_height = params.tower_height / params.segments as f64;
        let density = air_density(params.altitude);
        let gust = Uniform::new(0.0, 1.0);

        let mut segments = Vec::with_capacity(params.segments);
        let mut total_load = 0.0;
        let mut max_load = 0.0_f64;
        let mut total_speed = 0.0;

        for i in 0..params.segments {
            let height = (i as f64 + 0.5) * segment_height;
            let speed = wind_profile(params.base_wind_speed, height, params.terrain, REFERENCE_HEIGHT)
                * (1.0 + params.turbulence * gust.sample(&mut self.rng));
            let pressure = wind_pressure(speed, density);
            let area = cross_section(height, params.tower_height, params.base_width, params.top_width);
            let load = pressure * area * params.drag_coefficient;

            segments.push(SegmentLoad {
                height: round_to(height, 2),
                wind_speed: round_to(speed, 2),
                wind_pressure: round_to(pressure, 2),
                cross_section: round_to(area, 3),
                wind_load: round_to(load, 2),
            });
            total_load += load;
            max_load = max_load.max(load);
            total_speed += speed;
        }

        tracing::debug!("Computed wind load over {} segments", params.segments);
        Ok(WindLoadResult {
            segments,
            summary: WindLoadSummary {
                total_load: round_to(total_load, 2),
                max_load: round_to(max_load, 2),
                avg_wind_speed: round_to(total_speed / params.segments as f64, 2),
            },
        })
    }
}

/// Design hints for a computed load
pub fn recommendations(result: &WindLoadResult) -> Vec<String> {
    let summary = &result.summary;
    let mut hints = Vec::new();

    if summary.max_load > HEAVY_LOAD {
        hints.push("Maximum segment load is high; consider strengthening the tower structure".to_string());
    }
    if summary.avg_wind_speed > HIGH_WIND {
        hints.push("Average wind speed is high; consider wind-resistance measures".to_string());
    }
    if let Some(top) = result.segments.last() {
        if top.wind_load > summary.max_load * TOP_LOAD_SHARE {
            hints.push("Load near the top is large; pay particular attention to the top structure".to_string());
        }
    }
    hints
}

/// Engineering report: inputs, results and recommendations
///
/// `Display` renders the plain-text export, with a tab-separated segment table.
#[derive(Debug, Clone, Serialize)]
pub struct WindLoadReport {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub parameters: TowerParameters,
    pub result: WindLoadResult,
    pub recommendations: Vec<String>,
}

impl WindLoadReport {
    pub fn new(parameters: TowerParameters, result: WindLoadResult, generated_at: NaiveDateTime) -> Self {
        let recommendations = recommendations(&result);
        Self {
            title: "Tower Wind Load Report".to_string(),
            generated_at,
            parameters,
            result,
            recommendations,
        }
    }

    /// Default export file name, dated by the report
    pub fn file_name(&self) -> String {
        format!("tower_wind_load_report_{}.txt", self.generated_at.format("%Y-%m-%d"))
    }
}

impl fmt::Display for WindLoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.parameters;
        let s = &self.result.summary;

        writeln!(f, "{}", self.title)?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f)?;
        writeln!(f, "Parameters:")?;
        writeln!(f, "Tower height: {} m", p.tower_height)?;
        writeln!(f, "Segments: {}", p.segments)?;
        writeln!(f, "Base width: {} m", p.base_width)?;
        writeln!(f, "Top width: {} m", p.top_width)?;
        writeln!(f, "Drag coefficient: {}", p.drag_coefficient)?;
        writeln!(f, "Base wind speed: {} m/s", p.base_wind_speed)?;
        writeln!(f, "Terrain: {}", p.terrain)?;
        writeln!(f, "Altitude: {} m", p.altitude)?;
        writeln!(f, "Turbulence: {}", p.turbulence)?;
        writeln!(f)?;
        writeln!(f, "Results:")?;
        writeln!(f, "Total load: {} N", s.total_load)?;
        writeln!(f, "Max segment load: {} N", s.max_load)?;
        writeln!(f, "Average wind speed: {} m/s", s.avg_wind_speed)?;
        writeln!(f)?;
        writeln!(f, "Segments:")?;
        writeln!(f, "Height(m)\tWind speed(m/s)\tPressure(Pa)\tCross section(m²)\tLoad(N)")?;
        for seg in &self.result.segments {
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}",
                seg.height, seg.wind_speed, seg.wind_pressure, seg.cross_section, seg.wind_load
            )?;
        }
        if !self.recommendations.is_empty() {
            writeln!(f)?;
            writeln!(f, "Recommendations:")?;
            for hint in &self.recommendations {
                writeln!(f, "- {}", hint)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn calm_tower() -> TowerParameters {
        TowerParameters {
            tower_height: 10.0,
            segments: 1,
            base_width: 2.0,
            top_width: 2.0,
            drag_coefficient: 1.0,
            base_wind_speed: 10.0,
            terrain: Terrain::A,
            altitude: 0.0,
            turbulence: 0.0,
        }
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(9, 30, 0).unwrap()
    }

    #[test]
    fn test_profile_pressure_and_density() {
        assert_eq!(wind_profile(20.0, 10.0, Terrain::C, 10.0), 20.0);
        assert!(wind_profile(20.0, 40.0, Terrain::D, 10.0) > wind_profile(20.0, 40.0, Terrain::A, 10.0));
        assert!((wind_pressure(10.0, 1.225) - 61.25).abs() < 1e-12);
        assert_eq!(air_density(0.0), 1.225);
        assert!((air_density(1000.0) - 1.08647).abs() < 1e-4);
        // tapers from 4 m to 2 m; halfway the width is 3 m
        assert!((cross_section(5.0, 10.0, 4.0, 2.0) - 2.7).abs() < 1e-12);
    }

    #[test]
    fn test_single_segment_without_turbulence() {
        let result = WindLoadCalculator::new(Some(0)).calculate(&calm_tower()).unwrap();

        assert_eq!(result.segments.len(), 1);
        let seg = &result.segments[0];
        assert_eq!(seg.height, 5.0);
        assert_eq!(seg.wind_speed, 9.2);
        assert_eq!(seg.wind_pressure, 51.86);
        assert_eq!(seg.cross_section, 1.2);
        assert_eq!(seg.wind_load, 62.24);
        assert_eq!(result.summary.total_load, 62.24);
        assert_eq!(result.summary.max_load, 62.24);
    }

    #[test]
    fn test_segments_and_summary() {
        let params = TowerParameters {
            turbulence: 0.0,
            ..TowerParameters::default()
        };
        let result = WindLoadCalculator::new(None).calculate(&params).unwrap();

        assert_eq!(result.segments.len(), 10);
        assert_eq!(result.segments[0].height, 2.5);
        assert_eq!(result.segments[9].height, 47.5);
        // speed grows with height while the section shrinks
        assert!(result.segments.windows(2).all(|w| w[1].wind_speed > w[0].wind_speed));
        assert!(result.segments.windows(2).all(|w| w[1].cross_section < w[0].cross_section));

        let total: f64 = result.segments.iter().map(|s| s.wind_load).sum();
        assert!((total - result.summary.total_load).abs() < 0.1);
        let max = result.segments.iter().map(|s| s.wind_load).fold(0.0, f64::max);
        assert!((max - result.summary.max_load).abs() < 0.01);
    }

    #[test]
    fn test_turbulence_only_raises_speed_and_is_seeded() {
        let calm = WindLoadCalculator::new(Some(1)).calculate(&calm_tower()).unwrap();
        let gusty = TowerParameters {
            turbulence: 0.5,
            ..calm_tower()
        };
        let a = WindLoadCalculator::new(Some(1)).calculate(&gusty).unwrap();
        let b = WindLoadCalculator::new(Some(1)).calculate(&gusty).unwrap();

        assert_eq!(a, b);
        let speed = a.segments[0].wind_speed;
        assert!(speed >= calm.segments[0].wind_speed && speed <= calm.segments[0].wind_speed * 1.5 + 0.01);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut calc = WindLoadCalculator::new(Some(0));
        let zero_segments = TowerParameters {
            segments: 0,
            ..calm_tower()
        };
        assert!(matches!(
            calc.calculate(&zero_segments),
            Err(WindLoadError::InvalidParameter { field: "segments", .. })
        ));

        let too_high = TowerParameters {
            altitude: 50_000.0,
            ..calm_tower()
        };
        assert!(calc.calculate(&too_high).is_err());
    }

    #[test]
    fn test_terrain_parsing() {
        assert_eq!("c".parse::<Terrain>(), Ok(Terrain::C));
        assert_eq!(" D ".parse::<Terrain>(), Ok(Terrain::D));
        assert_eq!("E".parse::<Terrain>(), Err(WindLoadError::UnknownTerrain("E".into())));
        assert_eq!(Terrain::B.to_string(), "B");
        assert_eq!(Terrain::D.roughness_length(), 1.0);
    }

    #[test]
    fn test_recommendations() {
        let segment = |wind_load: f64| SegmentLoad {
            height: 1.0,
            wind_speed: 30.0,
            wind_pressure: 1.0,
            cross_section: 1.0,
            wind_load,
        };
        let heavy = WindLoadResult {
            segments: vec![segment(6000.0), segment(5900.0)],
            summary: WindLoadSummary {
                total_load: 11900.0,
                max_load: 6000.0,
                avg_wind_speed: 30.0,
            },
        };
        assert_eq!(recommendations(&heavy).len(), 3);

        let light = WindLoadResult {
            segments: vec![segment(100.0), segment(10.0)],
            summary: WindLoadSummary {
                total_load: 110.0,
                max_load: 100.0,
                avg_wind_speed: 12.0,
            },
        };
        assert!(recommendations(&light).is_empty());
    }

    #[test]
    fn test_text_report() {
        let params = calm_tower();
        let result = WindLoadCalculator::new(Some(0)).calculate(&params).unwrap();
        let report = WindLoadReport::new(params, result, timestamp());

        let text = report.to_string();
        assert!(text.starts_with("Tower Wind Load Report\nGenerated: 2024-05-01 09:30:00\n"));
        assert!(text.contains("Terrain: A\n"));
        assert!(text.contains("Total load: 62.24 N\n"));
        assert!(text.contains("5\t9.2\t51.86\t1.2\t62.24\n"));
        // the only segment is also the top one
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.file_name(), "tower_wind_load_report_2024-05-01.txt");
    }
}
