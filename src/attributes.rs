use crate::{core::SENTINEL_END, model::PrimitiveAccessors};

/// Encoding of an invalidated primitive: outside every reachable clock value
/// for both the segment and arc variants.
pub const HIDDEN_START: f32 = f32::MAX;
pub const HIDDEN_END: f32 = SENTINEL_END as f32;

/// Per-instance time-window buffers, index-aligned with the position/color
/// instance arrays the base renderer maintains.
///
/// Built once per dataset change and owned by the layer that built them;
/// clock changes never trigger a rebuild.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeAttributes {
    pub time_start: Vec<f32>,
    pub time_end: Vec<f32>,
}

impl TimeAttributes {
    /// Derive the two parallel scalar arrays from a dataset.
    ///
    /// A datum whose accessor returns a non-finite value, or whose resolved
    /// window is inverted, is mapped to the always-invisible encoding instead
    /// of failing the build.
    #[tracing::instrument(skip(data, accessors), fields(len = data.len()))]
    pub fn build<D>(data: &[D], accessors: &PrimitiveAccessors<D>) -> Self {
        let mut time_start = Vec::with_capacity(data.len());
        let mut time_end = Vec::with_capacity(data.len());

        for datum in data {
            let start = (accessors.time_start)(datum);
            let end = (accessors.time_end)(datum);

            let invalid =
                !start.is_finite() || !end.is_finite() || (end != SENTINEL_END && start > end);
            if invalid {
                time_start.push(HIDDEN_START);
                time_end.push(HIDDEN_END);
            } else {
                time_start.push(start as f32);
                time_end.push(end as f32);
            }
        }

        Self {
            time_start,
            time_end,
        }
    }

    pub fn len(&self) -> usize {
        self.time_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_start.is_empty()
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.time_start[index] == HIDDEN_START && self.time_end[index] == HIDDEN_END
    }
}
