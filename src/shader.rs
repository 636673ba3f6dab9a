use crate::error::{TripvizError, TripvizResult};

/// Per-vertex visibility sentinel: the fragment stage discards anything
/// carrying this value.
pub const VTIME_HIDDEN: f32 = -1.0;

/// Instance attribute names registered against the base renderer.
pub const ATTR_TIME_START: &str = "timeStart";
pub const ATTR_TIME_END: &str = "timeEnd";
pub const ATTR_SOURCE_POSITION: &str = "sourcePosition";
pub const ATTR_TARGET_POSITION: &str = "targetPosition";
pub const ATTR_COLOR: &str = "color";
pub const ATTR_WIDTH: &str = "width";

/// Uniform names merged into the base renderer's uniform set on every draw.
pub const UNIFORM_CURRENT_TIME: &str = "currentTime";
pub const UNIFORM_FADE_WINDOW: &str = "fadeWindow";

/// The single parameterized policy for splicing time-window logic into a base
/// renderer's shader stages.
///
/// Both the straight-segment and the arc variant consume this identically; the
/// only knob is `open_ended`, which adds the unresolved-end exclusion clause
/// used by arc-kind request primitives.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeWindowPolicy {
    /// Time distance from a window edge within which alpha ramps 0 -> 1.
    pub fade_window: f64,
    /// Whether `timeEnd == -1` marks an unresolved end event that forces the
    /// primitive invisible for every clock value.
    pub open_ended: bool,
}

impl TimeWindowPolicy {
    pub fn new(fade_window: f64, open_ended: bool) -> TripvizResult<Self> {
        if !(fade_window.is_finite() && fade_window > 0.0) {
            return Err(TripvizError::shader("fade_window must be finite and > 0"));
        }
        Ok(Self {
            fade_window,
            open_ended,
        })
    }

    /// Segment variant with the default 10-unit fade window.
    pub fn segment() -> Self {
        Self {
            fade_window: 10.0,
            open_ended: false,
        }
    }

    /// Arc variant (open-ended capable) with the default 10-unit fade window.
    pub fn arc() -> Self {
        Self {
            fade_window: 10.0,
            open_ended: true,
        }
    }

    /// Reference semantics of the per-vertex stage.
    ///
    /// Returns [`VTIME_HIDDEN`] when the vertex's interval excludes the clock
    /// (early exit, no further vertex work), otherwise the distance to the
    /// nearer window edge.
    pub fn vertex_visibility(&self, time_start: f32, time_end: f32, current_time: f32) -> f32 {
        if self.open_ended && time_end == VTIME_HIDDEN {
            return VTIME_HIDDEN;
        }
        if time_start > current_time || time_end < current_time {
            return VTIME_HIDDEN;
        }
        let near_beginning = current_time - time_start;
        let near_end = time_end - current_time;
        near_beginning.min(near_end)
    }

    /// Reference semantics of the fragment stage.
    ///
    /// `None` means the fragment is discarded outright (not blended);
    /// `Some(m)` is the multiplier applied to the alpha channel, ramping
    /// linearly from 0 at a window edge to 1 at `fade_window` distance.
    pub fn fragment_alpha(&self, v_time: f32) -> Option<f32> {
        if v_time == VTIME_HIDDEN {
            return None;
        }
        let fade = self.fade_window as f32;
        if v_time <= fade {
            Some(v_time / fade)
        } else {
            Some(1.0)
        }
    }

    /// GLSL chunks for the base renderer's splice points.
    pub fn injection(&self) -> ShaderInjection {
        let exclusion = if self.open_ended {
            format!("{ATTR_TIME_END} == -1.0 || ")
        } else {
            String::new()
        };

        ShaderInjection {
            vertex_declarations: format!(
                "attribute float {ATTR_TIME_START};\n\
                 attribute float {ATTR_TIME_END};\n\
                 uniform float {UNIFORM_CURRENT_TIME};\n\
                 varying float vTime;\n"
            ),
            vertex_main_start: format!(
                "if ({exclusion}{ATTR_TIME_START} > {UNIFORM_CURRENT_TIME} || {ATTR_TIME_END} < {UNIFORM_CURRENT_TIME}) {{\n\
                 \x20 vTime = -1.0;\n\
                 \x20 return;\n\
                 }} else {{\n\
                 \x20 float nearBeginning = {UNIFORM_CURRENT_TIME} - {ATTR_TIME_START};\n\
                 \x20 float nearEnd = {ATTR_TIME_END} - {UNIFORM_CURRENT_TIME};\n\
                 \x20 vTime = min(nearBeginning, nearEnd);\n\
                 }}\n"
            ),
            fragment_declarations: format!(
                "uniform float {UNIFORM_CURRENT_TIME};\n\
                 uniform float {UNIFORM_FADE_WINDOW};\n\
                 varying float vTime;\n"
            ),
            fragment_main_start: "if (vTime == -1.0) discard;\n".to_string(),
            fragment_color_filter: format!(
                "if (vTime <= {UNIFORM_FADE_WINDOW}) color.a *= (vTime / {UNIFORM_FADE_WINDOW});\n"
            ),
        }
    }
}

/// Extra shader text spliced into a base renderer's program, keyed by the
/// splice points every conforming base renderer exposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderInjection {
    pub vertex_declarations: String,
    pub vertex_main_start: String,
    pub fragment_declarations: String,
    pub fragment_main_start: String,
    pub fragment_color_filter: String,
}
