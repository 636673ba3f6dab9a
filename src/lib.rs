//! Tripviz is the time-windowed primitive rendering core behind animated trip
//! visualizations: large batches of time-stamped segments and arcs on a map,
//! of which only those active at the looping simulation clock's current value
//! are shown, fading in and out near their window edges.
//!
//! # Pipeline overview
//!
//! 1. **Attributes**: `dataset + accessors -> TimeAttributes` (parallel
//!    per-instance time buffers, rebuilt only on dataset change)
//! 2. **Injection**: `TimeWindowPolicy -> ShaderInjection` (one parameterized
//!    policy spliced into the base renderer's shader stages)
//! 3. **Layer**: `TimeWindowedLayer` wraps a [`BaseRenderer`] and merges the
//!    clock uniform into each draw
//! 4. **Composition**: `LayerComposer` submits the active layers per frame,
//!    driven by an injected [`TickSource`]
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Cheap frames**: only one scalar uniform changes per frame; buffers are
//!   uploaded exclusively on data-change events.
//! - **No device ownership**: the GPU device/context belongs to the base
//!   renderer's host; this crate only drives its extension points.
//! - **No I/O in the core**: data loading and the map shell are external
//!   collaborators behind accessor functions.

#![forbid(unsafe_code)]

pub mod attributes;
pub mod clock;
pub mod compose;
pub mod core;
pub mod error;
pub mod layer;
pub mod model;
pub mod render;
pub mod scale;
pub mod shader;

pub use attributes::{HIDDEN_END, HIDDEN_START, TimeAttributes};
pub use clock::{AnimationClock, ManualClock, TickSource};
pub use compose::{FrameRenderer, LayerComposer};
pub use core::{AnimationConfig, Point, Rgba8, SENTINEL_END, TimeWindow, Vec2};
pub use error::{TripvizError, TripvizResult};
pub use layer::TimeWindowedLayer;
pub use model::{
    Accessor, DatasetReport, MalformedRecord, Primitive, PrimitiveAccessors,
    PrimitiveAccessorsBuilder, validate_dataset,
};
pub use render::{BaseRenderer, DrawParams, PrimitiveKind, UniformValue, Uniforms};
pub use scale::{LinearScale, ThresholdScale, occupancy_width};
pub use shader::{
    ATTR_COLOR, ATTR_SOURCE_POSITION, ATTR_TARGET_POSITION, ATTR_TIME_END, ATTR_TIME_START,
    ATTR_WIDTH, ShaderInjection, TimeWindowPolicy, UNIFORM_CURRENT_TIME, UNIFORM_FADE_WINDOW,
    VTIME_HIDDEN,
};
