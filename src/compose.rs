use std::sync::Arc;

use crate::{
    clock::TickSource,
    error::{TripvizError, TripvizResult},
    layer::TimeWindowedLayer,
    render::DrawParams,
};

/// Anything the composer can submit into a frame: time-windowed layers and
/// static layers alike. Static layers simply ignore the clock value.
pub trait FrameRenderer {
    fn draw_frame(&mut self, current_time: f64) -> TripvizResult<()>;

    fn is_destroyed(&self) -> bool {
        false
    }
}

impl<D> FrameRenderer for TimeWindowedLayer<D> {
    fn draw_frame(&mut self, current_time: f64) -> TripvizResult<()> {
        self.draw(current_time, DrawParams::default())
    }

    fn is_destroyed(&self) -> bool {
        TimeWindowedLayer::is_destroyed(self)
    }
}

struct Entry {
    name: String,
    z_order: i32,
    enabled: bool,
    renderer: Box<dyn FrameRenderer>,
}

/// Assembles the active set of renderers per frame from named
/// {renderer, enabled, z-order} specifications.
///
/// A disabled layer contributes nothing to the frame and incurs no draw or
/// upload cost. The composed order is recomputed only when the enabled set or
/// the layer set changes; otherwise the same list reference is reused.
#[derive(Default)]
pub struct LayerComposer {
    entries: Vec<Entry>,
    order: Option<Arc<Vec<usize>>>,
}

impl LayerComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_layer(
        &mut self,
        name: impl Into<String>,
        z_order: i32,
        enabled: bool,
        renderer: Box<dyn FrameRenderer>,
    ) -> TripvizResult<()> {
        let name = name.into();
        if self.entries.iter().any(|e| e.name == name) {
            return Err(TripvizError::validation(format!(
                "duplicate layer name '{name}'"
            )));
        }
        self.entries.push(Entry {
            name,
            z_order,
            enabled,
            renderer,
        });
        self.order = None;
        Ok(())
    }

    pub fn remove_layer(&mut self, name: &str) -> TripvizResult<Box<dyn FrameRenderer>> {
        let idx = self.index_of(name)?;
        let entry = self.entries.remove(idx);
        self.order = None;
        Ok(entry.renderer)
    }

    /// Toggling to the current state leaves the composed list untouched.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> TripvizResult<()> {
        let idx = self.index_of(name)?;
        if self.entries[idx].enabled != enabled {
            self.entries[idx].enabled = enabled;
            self.order = None;
        }
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> TripvizResult<bool> {
        Ok(self.entries[self.index_of(name)?].enabled)
    }

    /// Names of the layers submitted to the frame, in draw order.
    pub fn active(&mut self) -> Vec<&str> {
        let order = self.composed_order();
        order
            .iter()
            .map(|&i| self.entries[i].name.as_str())
            .collect()
    }

    /// Tick the injected clock once and draw every active layer with the
    /// resulting time, passed by value. Returns the time that was used.
    #[tracing::instrument(skip(self, clock))]
    pub fn render_frame(&mut self, clock: &mut dyn TickSource) -> TripvizResult<f64> {
        let current_time = clock.tick();
        let order = self.composed_order();

        for &idx in order.iter() {
            let entry = &mut self.entries[idx];
            if entry.renderer.is_destroyed() {
                // A frame may already have been scheduled when the layer was
                // cancelled; it must not be drawn.
                tracing::warn!(layer = %entry.name, "skipping destroyed layer");
                continue;
            }
            entry.renderer.draw_frame(current_time)?;
        }

        Ok(current_time)
    }

    fn composed_order(&mut self) -> Arc<Vec<usize>> {
        if let Some(order) = &self.order {
            return Arc::clone(order);
        }

        let mut order: Vec<usize> = (0..self.entries.len())
            .filter(|&i| self.entries[i].enabled)
            .collect();
        // Stable: insertion order breaks z ties.
        order.sort_by_key(|&i| self.entries[i].z_order);

        let order = Arc::new(order);
        self.order = Some(Arc::clone(&order));
        order
    }

    fn index_of(&self, name: &str) -> TripvizResult<usize> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| TripvizError::validation(format!("unknown layer '{name}'")))
    }
}

impl std::fmt::Debug for LayerComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.z_order, e.enabled))
            .collect();
        f.debug_struct("LayerComposer").field("layers", &names).finish()
    }
}
