use std::sync::Arc;

use crate::{
    attributes::TimeAttributes,
    error::{TripvizError, TripvizResult},
    model::PrimitiveAccessors,
    render::{BaseRenderer, DrawParams, UniformValue},
    shader::{
        ATTR_COLOR, ATTR_SOURCE_POSITION, ATTR_TARGET_POSITION, ATTR_TIME_END, ATTR_TIME_START,
        ATTR_WIDTH, TimeWindowPolicy, UNIFORM_CURRENT_TIME, UNIFORM_FADE_WINDOW,
    },
};

/// A base line/arc renderer augmented with per-instance time windows.
///
/// Composition over the [`BaseRenderer`] capability: construction splices the
/// time-window shader policy into the base program and uploads the instance
/// attributes; each draw only merges the clock uniforms and delegates. No
/// buffer is allocated on the draw path.
pub struct TimeWindowedLayer<D> {
    base: Box<dyn BaseRenderer>,
    accessors: PrimitiveAccessors<D>,
    policy: TimeWindowPolicy,
    data: Arc<[D]>,
    attributes: TimeAttributes,
    destroyed: bool,
}

impl<D> TimeWindowedLayer<D> {
    /// Wire a base renderer, a dataset and its accessors together.
    ///
    /// Fails fast: an invalid policy, a rejected shader injection or a failed
    /// attribute upload (e.g. GPU memory exhaustion) surface here, never on
    /// the first draw.
    pub fn new(
        mut base: Box<dyn BaseRenderer>,
        data: Arc<[D]>,
        accessors: PrimitiveAccessors<D>,
        policy: TimeWindowPolicy,
    ) -> TripvizResult<Self> {
        // Re-validate in case the policy was built from raw fields.
        let policy = TimeWindowPolicy::new(policy.fade_window, policy.open_ended)?;

        base.inject_shaders(&policy.injection())?;

        let mut layer = Self {
            base,
            accessors,
            policy,
            data: Arc::from(Vec::new()),
            attributes: TimeAttributes::default(),
            destroyed: false,
        };
        layer.upload(data)?;
        Ok(layer)
    }

    /// Replace the dataset wholesale and re-upload all instance attributes.
    ///
    /// This is the only path that touches buffers after construction; it runs
    /// on data-change events, serialized with the draw path. A failure
    /// partway through the re-upload destroys the layer: the base renderer
    /// then holds a mix of new and stale buffers, which must never be drawn.
    pub fn replace_data(&mut self, data: Arc<[D]>) -> TripvizResult<()> {
        if self.destroyed {
            return Err(TripvizError::render(
                "cannot replace data on a destroyed layer",
            ));
        }
        self.upload(data).inspect_err(|_| self.destroy())
    }

    #[tracing::instrument(skip(self, data), fields(len = data.len()))]
    fn upload(&mut self, data: Arc<[D]>) -> TripvizResult<()> {
        let attributes = TimeAttributes::build(&data, &self.accessors);

        let n = data.len();
        let mut source = Vec::with_capacity(n * 2);
        let mut target = Vec::with_capacity(n * 2);
        let mut color = Vec::with_capacity(n * 4);
        let mut width = Vec::with_capacity(n);
        for datum in data.iter() {
            let s = (self.accessors.source_position)(datum);
            let t = (self.accessors.target_position)(datum);
            source.extend([s.x as f32, s.y as f32]);
            target.extend([t.x as f32, t.y as f32]);
            color.extend((self.accessors.color)(datum).to_f32_array());
            width.push((self.accessors.width)(datum) as f32);
        }

        self.register(ATTR_SOURCE_POSITION, 2, source)?;
        self.register(ATTR_TARGET_POSITION, 2, target)?;
        self.register(ATTR_COLOR, 4, color)?;
        self.register(ATTR_WIDTH, 1, width)?;
        self.register(ATTR_TIME_START, 1, attributes.time_start.clone())?;
        self.register(ATTR_TIME_END, 1, attributes.time_end.clone())?;

        tracing::debug!(instances = n, "instance attributes uploaded");
        self.data = data;
        self.attributes = attributes;
        Ok(())
    }

    fn register(&mut self, name: &str, component_size: usize, values: Vec<f32>) -> TripvizResult<()> {
        self.base
            .register_attribute(name, component_size, values)
            .map_err(|e| TripvizError::attribute(format!("failed to register '{name}': {e}")))
    }

    /// Draw one frame at `current_time`, merging the clock and fade-window
    /// uniforms into whatever the caller already computed.
    pub fn draw(&mut self, current_time: f64, params: DrawParams) -> TripvizResult<()> {
        if self.destroyed {
            return Err(TripvizError::render("layer has been destroyed"));
        }
        let params = params
            .with_uniform(UNIFORM_CURRENT_TIME, UniformValue::Float(current_time as f32))
            .with_uniform(
                UNIFORM_FADE_WINDOW,
                UniformValue::Float(self.policy.fade_window as f32),
            );
        self.base.draw(&params)
    }

    /// Release the base renderer's buffer handles. Idempotent; a destroyed
    /// layer refuses further draws and data replacement.
    pub fn destroy(&mut self) {
        if !self.destroyed {
            self.base.release();
            self.destroyed = true;
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn policy(&self) -> TimeWindowPolicy {
        self.policy
    }

    pub fn instance_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attributes(&self) -> &TimeAttributes {
        &self.attributes
    }

    /// Number of instances the reference semantics would render at `t`.
    /// Intended for tests and debug overlays; the GPU path never calls this.
    pub fn visible_count(&self, t: f64) -> usize {
        (0..self.attributes.len())
            .filter(|&i| {
                self.policy.vertex_visibility(
                    self.attributes.time_start[i],
                    self.attributes.time_end[i],
                    t as f32,
                ) != crate::shader::VTIME_HIDDEN
            })
            .count()
    }
}

impl<D> Drop for TimeWindowedLayer<D> {
    fn drop(&mut self) {
        // Release on every exit path, including early unmount.
        self.destroy();
    }
}

impl<D> std::fmt::Debug for TimeWindowedLayer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeWindowedLayer")
            .field("kind", &self.base.kind())
            .field("policy", &self.policy)
            .field("instances", &self.attributes.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Point, Rgba8, SENTINEL_END, TimeWindow},
        model::Primitive,
        render::PrimitiveKind,
        shader::ShaderInjection,
    };
    use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

    #[derive(Clone, Debug, Default)]
    struct Recording {
        injections: Vec<ShaderInjection>,
        attributes: BTreeMap<String, (usize, Vec<f32>)>,
        draws: Vec<DrawParams>,
        released: usize,
        uploads: usize,
        // Fail the registration with this zero-based ordinal, once reached.
        fail_upload_at: Option<usize>,
    }

    struct FakeRenderer {
        kind: PrimitiveKind,
        state: Rc<RefCell<Recording>>,
    }

    impl BaseRenderer for FakeRenderer {
        fn kind(&self) -> PrimitiveKind {
            self.kind
        }

        fn inject_shaders(&mut self, injection: &ShaderInjection) -> TripvizResult<()> {
            self.state.borrow_mut().injections.push(injection.clone());
            Ok(())
        }

        fn register_attribute(
            &mut self,
            name: &str,
            component_size: usize,
            values: Vec<f32>,
        ) -> TripvizResult<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_upload_at.is_some_and(|n| state.uploads >= n) {
                return Err(TripvizError::render("out of buffer memory"));
            }
            state.uploads += 1;
            state
                .attributes
                .insert(name.to_string(), (component_size, values));
            Ok(())
        }

        fn draw(&mut self, params: &DrawParams) -> TripvizResult<()> {
            self.state.borrow_mut().draws.push(params.clone());
            Ok(())
        }

        fn release(&mut self) {
            self.state.borrow_mut().released += 1;
        }
    }

    fn seg(start: f64, end: f64) -> Primitive {
        Primitive {
            source: Point::new(6.98, 51.57),
            target: Point::new(7.0, 51.55),
            window: TimeWindow { start, end },
            color: Rgba8::rgba(255, 0, 255, 255),
            width: 2.0,
            category: None,
        }
    }

    fn fake(kind: PrimitiveKind) -> (Box<dyn BaseRenderer>, Rc<RefCell<Recording>>) {
        let state = Rc::new(RefCell::new(Recording::default()));
        (
            Box::new(FakeRenderer {
                kind,
                state: Rc::clone(&state),
            }),
            state,
        )
    }

    fn layer_with(
        data: Vec<Primitive>,
        policy: TimeWindowPolicy,
    ) -> (TimeWindowedLayer<Primitive>, Rc<RefCell<Recording>>) {
        let (base, state) = fake(PrimitiveKind::Segment);
        let layer =
            TimeWindowedLayer::new(base, Arc::from(data), Primitive::accessors(), policy).unwrap();
        (layer, state)
    }

    #[test]
    fn construction_injects_shaders_and_uploads_attributes() {
        let (layer, state) = layer_with(
            vec![seg(100.0, 140.0), seg(0.0, 50.0)],
            TimeWindowPolicy::segment(),
        );
        let state = state.borrow();

        assert_eq!(state.injections.len(), 1);
        assert_eq!(state.attributes[ATTR_TIME_START].1, vec![100.0, 0.0]);
        assert_eq!(state.attributes[ATTR_TIME_END].1, vec![140.0, 50.0]);
        assert_eq!(state.attributes[ATTR_SOURCE_POSITION].0, 2);
        assert_eq!(state.attributes[ATTR_COLOR].0, 4);
        assert_eq!(layer.instance_count(), 2);
    }

    #[test]
    fn draw_merges_clock_uniforms_and_delegates() {
        let (mut layer, state) = layer_with(vec![seg(0.0, 10.0)], TimeWindowPolicy::segment());

        layer.draw(123.0, DrawParams::default()).unwrap();
        layer
            .draw(
                123.0,
                DrawParams::default().with_uniform("opacity", UniformValue::Float(0.9)),
            )
            .unwrap();

        let state = state.borrow();
        assert_eq!(state.draws.len(), 2);
        assert_eq!(
            state.draws[0].uniforms.get(UNIFORM_CURRENT_TIME),
            Some(&UniformValue::Float(123.0))
        );
        assert_eq!(
            state.draws[0].uniforms.get(UNIFORM_FADE_WINDOW),
            Some(&UniformValue::Float(10.0))
        );
        // Caller uniforms survive the merge.
        assert_eq!(
            state.draws[1].uniforms.get("opacity"),
            Some(&UniformValue::Float(0.9))
        );
    }

    #[test]
    fn repeated_draws_do_not_touch_buffers() {
        let (mut layer, state) = layer_with(vec![seg(0.0, 10.0)], TimeWindowPolicy::segment());
        let uploads_after_new = state.borrow().attributes.len();

        for _ in 0..4 {
            layer.draw(50.0, DrawParams::default()).unwrap();
        }

        let state = state.borrow();
        assert_eq!(state.attributes.len(), uploads_after_new);
        // Identical clock values produce identical draw parameters (no drift).
        assert_eq!(state.draws[0], state.draws[3]);
    }

    #[test]
    fn replace_data_rebuilds_attributes_once() {
        let (mut layer, state) = layer_with(vec![seg(0.0, 10.0)], TimeWindowPolicy::segment());
        layer
            .replace_data(Arc::from(vec![seg(5.0, 15.0), seg(7.0, 9.0)]))
            .unwrap();

        assert_eq!(layer.instance_count(), 2);
        assert_eq!(
            state.borrow().attributes[ATTR_TIME_START].1,
            vec![5.0, 7.0]
        );
    }

    #[test]
    fn attribute_upload_failure_is_fatal_at_construction() {
        let (base, state) = fake(PrimitiveKind::Segment);
        state.borrow_mut().fail_upload_at = Some(0);

        let res = TimeWindowedLayer::new(
            base,
            Arc::from(vec![seg(0.0, 10.0)]),
            Primitive::accessors(),
            TimeWindowPolicy::segment(),
        );
        assert!(matches!(res, Err(TripvizError::Attribute(_))));
    }

    #[test]
    fn failed_replacement_poisons_the_layer() {
        let (mut layer, state) = layer_with(vec![seg(0.0, 10.0)], TimeWindowPolicy::segment());

        // Fail on the fifth registration: geometry buffers already carry the
        // two new instances while the time buffers still hold the old one.
        state.borrow_mut().fail_upload_at = Some(10);
        let err = layer
            .replace_data(Arc::from(vec![seg(5.0, 15.0), seg(7.0, 9.0)]))
            .unwrap_err();
        assert!(matches!(err, TripvizError::Attribute(_)));
        {
            let state = state.borrow();
            assert_eq!(state.attributes[ATTR_SOURCE_POSITION].1.len(), 4);
            assert_eq!(state.attributes[ATTR_TIME_START].1, vec![0.0]);
        }

        // The mixed buffer set must never be drawn.
        assert!(layer.is_destroyed());
        assert!(layer.draw(5.0, DrawParams::default()).is_err());
        assert_eq!(state.borrow().released, 1);
    }

    #[test]
    fn destroy_releases_once_and_refuses_draws() {
        let (mut layer, state) = layer_with(vec![seg(0.0, 10.0)], TimeWindowPolicy::segment());

        layer.destroy();
        layer.destroy();
        assert_eq!(state.borrow().released, 1);
        assert!(layer.draw(0.0, DrawParams::default()).is_err());
        assert!(layer.replace_data(Arc::from(Vec::new())).is_err());

        drop(layer);
        // Drop after explicit destroy must not release twice.
        assert_eq!(state.borrow().released, 1);
    }

    #[test]
    fn drop_releases_on_early_unmount() {
        let (layer, state) = layer_with(vec![seg(0.0, 10.0)], TimeWindowPolicy::segment());
        drop(layer);
        assert_eq!(state.borrow().released, 1);
    }

    #[test]
    fn visible_count_honors_windows_and_sentinel() {
        let (layer, _) = layer_with(
            vec![seg(100.0, 140.0), seg(10.0, SENTINEL_END)],
            TimeWindowPolicy::arc(),
        );
        assert_eq!(layer.visible_count(95.0), 0);
        assert_eq!(layer.visible_count(120.0), 1);
        // The open-ended request stays invisible even inside its start time.
        assert_eq!(layer.visible_count(10.0), 0);
    }
}
