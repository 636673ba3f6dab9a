use crate::error::{TripvizError, TripvizResult};

pub use kurbo::{Point, Vec2};

/// Simulation-time end value marking an unresolved end event.
///
/// A primitive carrying this end time is permanently excluded from the
/// visible set, regardless of the clock value.
pub const SENTINEL_END: f64 = -1.0;

/// Inclusive simulation-time interval `[start, end]` during which a primitive
/// is eligible for display. Times are simulation-time seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    pub fn new(start: f64, end: f64) -> TripvizResult<Self> {
        let w = Self { start, end };
        if !w.is_open_ended() && start > end {
            return Err(TripvizError::validation("TimeWindow start must be <= end"));
        }
        Ok(w)
    }

    /// An end event that has not been resolved into a real timestamp yet.
    pub fn open_ended(start: f64) -> Self {
        Self {
            start,
            end: SENTINEL_END,
        }
    }

    pub fn is_open_ended(self) -> bool {
        self.end == SENTINEL_END
    }

    /// Inclusive on both edges; always false for an open-ended window.
    pub fn contains(self, t: f64) -> bool {
        !self.is_open_ended() && self.start <= t && t <= self.end
    }

    /// Distance from `t` to the nearer window edge. Only meaningful when
    /// `contains(t)` holds.
    pub fn edge_distance(self, t: f64) -> f64 {
        (t - self.start).min(self.end - t)
    }
}

/// RGBA color, straight (non-premultiplied) alpha.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_f32_array(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

/// Shared animation configuration.
///
/// `loop_length` corresponds to the timestamp unit of the source data; the
/// default of 86400 covers one simulated day in seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Time distance from a window edge within which opacity ramps linearly.
    pub fade_window: f64,
    /// Clock wrap point, in simulation-time units.
    pub loop_length: f64,
    /// Clock advance per frame, in simulation-time units.
    pub animation_speed: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fade_window: 10.0,
            loop_length: 86400.0,
            animation_speed: 2.0,
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> TripvizResult<()> {
        if !(self.fade_window.is_finite() && self.fade_window > 0.0) {
            return Err(TripvizError::validation("fade_window must be finite and > 0"));
        }
        if !(self.loop_length.is_finite() && self.loop_length > 0.0) {
            return Err(TripvizError::validation("loop_length must be finite and > 0"));
        }
        if !(self.animation_speed.is_finite() && self.animation_speed >= 0.0) {
            return Err(TripvizError::validation(
                "animation_speed must be finite and >= 0",
            ));
        }
        Ok(())
    }
}
