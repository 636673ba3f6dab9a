use crate::{core::AnimationConfig, error::TripvizResult};

/// Source of the per-frame simulation time.
///
/// The composing application injects one tick source into the frame loop; no
/// component mutates another's clock, and tests can substitute a
/// deterministic implementation such as [`ManualClock`].
pub trait TickSource {
    /// Advance one frame and return the new current time.
    fn tick(&mut self) -> f64;

    /// Current time without advancing.
    fn current_time(&self) -> f64;
}

/// The looping animation clock: advances by `animation_speed` per tick and
/// wraps modulo `loop_length`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationClock {
    time: f64,
    speed: f64,
    loop_length: f64,
}

impl AnimationClock {
    pub fn new(config: &AnimationConfig) -> TripvizResult<Self> {
        Self::with_start_time(config, 0.0)
    }

    /// Start mid-loop, e.g. at a morning-peak timestamp of the simulated day.
    pub fn with_start_time(config: &AnimationConfig, start: f64) -> TripvizResult<Self> {
        config.validate()?;
        Ok(Self {
            time: start.rem_euclid(config.loop_length),
            speed: config.animation_speed,
            loop_length: config.loop_length,
        })
    }
}

impl TickSource for AnimationClock {
    fn tick(&mut self) -> f64 {
        self.time = (self.time + self.speed) % self.loop_length;
        self.time
    }

    fn current_time(&self) -> f64 {
        self.time
    }
}

/// Deterministic tick source for tests: stays at the last value set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManualClock {
    time: f64,
}

impl ManualClock {
    pub fn at(time: f64) -> Self {
        Self { time }
    }

    pub fn set(&mut self, time: f64) {
        self.time = time;
    }
}

impl TickSource for ManualClock {
    fn tick(&mut self) -> f64 {
        self.time
    }

    fn current_time(&self) -> f64 {
        self.time
    }
}
