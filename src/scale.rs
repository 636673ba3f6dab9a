use crate::{
    core::Rgba8,
    error::{TripvizError, TripvizResult},
};

/// Piecewise-constant color scale: `n` ascending thresholds split the domain
/// into `n + 1` buckets, each mapped to one color of the range.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThresholdScale {
    domain: Vec<f64>,
    range: Vec<Rgba8>,
}

impl ThresholdScale {
    pub fn new(domain: Vec<f64>, range: Vec<Rgba8>) -> TripvizResult<Self> {
        if range.len() != domain.len() + 1 {
            return Err(TripvizError::validation(
                "threshold range must have exactly one more entry than the domain",
            ));
        }
        if domain.iter().any(|v| !v.is_finite()) {
            return Err(TripvizError::validation(
                "threshold domain must be finite",
            ));
        }
        if domain.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TripvizError::validation(
                "threshold domain must be strictly ascending",
            ));
        }
        Ok(Self { domain, range })
    }

    pub fn sample(&self, value: f64) -> Rgba8 {
        let bucket = self.domain.iter().take_while(|&&t| value >= t).count();
        self.range[bucket]
    }
}

/// Clamped linear scale mapping `[d0, d1]` onto `[r0, r1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> TripvizResult<Self> {
        if domain.iter().chain(range.iter()).any(|v| !v.is_finite()) {
            return Err(TripvizError::validation("linear scale must be finite"));
        }
        if domain[0] >= domain[1] {
            return Err(TripvizError::validation(
                "linear scale domain must be ascending",
            ));
        }
        Ok(Self { domain, range })
    }

    pub fn sample(&self, value: f64) -> f64 {
        let t = ((value - self.domain[0]) / (self.domain[1] - self.domain[0])).clamp(0.0, 1.0);
        self.range[0] + (self.range[1] - self.range[0]) * t
    }
}

/// Trace width for an occupancy level: one pixel base plus three per person
/// on board.
pub fn occupancy_width(occupancy: u32) -> f64 {
    3.0 * f64::from(occupancy + 1) - 1.0
}
