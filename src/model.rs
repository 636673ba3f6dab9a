use std::sync::Arc;

use crate::{
    core::{Point, Rgba8, TimeWindow},
    error::{TripvizError, TripvizResult},
};

/// Shared accessor closure extracting one attribute from a datum.
pub type Accessor<D, T> = Arc<dyn Fn(&D) -> T + Send + Sync>;

/// One renderable segment or arc with an associated time-of-existence window.
///
/// Ready-made datum type for callers that do not bring their own records;
/// the layer API itself is generic over the datum type via [`PrimitiveAccessors`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Primitive {
    pub source: Point,
    pub target: Point,
    pub window: TimeWindow,
    pub color: Rgba8,
    pub width: f64,
    /// Category tag (e.g. occupancy level) used for color/width lookup.
    pub category: Option<u32>,
}

/// The five accessor functions supplied once at layer construction — the seam
/// to the external data-loading collaborator.
///
/// All accessors are mandatory; a layer construction with any of them missing
/// fails immediately (see [`PrimitiveAccessorsBuilder::build`]).
pub struct PrimitiveAccessors<D> {
    pub source_position: Accessor<D, Point>,
    pub target_position: Accessor<D, Point>,
    pub time_start: Accessor<D, f64>,
    pub time_end: Accessor<D, f64>,
    pub color: Accessor<D, Rgba8>,
    pub width: Accessor<D, f64>,
}

impl<D> Clone for PrimitiveAccessors<D> {
    fn clone(&self) -> Self {
        Self {
            source_position: Arc::clone(&self.source_position),
            target_position: Arc::clone(&self.target_position),
            time_start: Arc::clone(&self.time_start),
            time_end: Arc::clone(&self.time_end),
            color: Arc::clone(&self.color),
            width: Arc::clone(&self.width),
        }
    }
}

impl<D> std::fmt::Debug for PrimitiveAccessors<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimitiveAccessors").finish_non_exhaustive()
    }
}

/// Builder enforcing the fail-fast accessor contract: every accessor must be
/// supplied before [`build`](Self::build), never deferred to the first draw.
pub struct PrimitiveAccessorsBuilder<D> {
    source_position: Option<Accessor<D, Point>>,
    target_position: Option<Accessor<D, Point>>,
    time_start: Option<Accessor<D, f64>>,
    time_end: Option<Accessor<D, f64>>,
    color: Option<Accessor<D, Rgba8>>,
    width: Option<Accessor<D, f64>>,
}

impl<D> Default for PrimitiveAccessorsBuilder<D> {
    fn default() -> Self {
        Self {
            source_position: None,
            target_position: None,
            time_start: None,
            time_end: None,
            color: None,
            width: None,
        }
    }
}

impl<D> PrimitiveAccessorsBuilder<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_position(mut self, f: impl Fn(&D) -> Point + Send + Sync + 'static) -> Self {
        self.source_position = Some(Arc::new(f));
        self
    }

    pub fn target_position(mut self, f: impl Fn(&D) -> Point + Send + Sync + 'static) -> Self {
        self.target_position = Some(Arc::new(f));
        self
    }

    pub fn time_start(mut self, f: impl Fn(&D) -> f64 + Send + Sync + 'static) -> Self {
        self.time_start = Some(Arc::new(f));
        self
    }

    pub fn time_end(mut self, f: impl Fn(&D) -> f64 + Send + Sync + 'static) -> Self {
        self.time_end = Some(Arc::new(f));
        self
    }

    pub fn color(mut self, f: impl Fn(&D) -> Rgba8 + Send + Sync + 'static) -> Self {
        self.color = Some(Arc::new(f));
        self
    }

    pub fn width(mut self, f: impl Fn(&D) -> f64 + Send + Sync + 'static) -> Self {
        self.width = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> TripvizResult<PrimitiveAccessors<D>> {
        fn take<T>(slot: Option<T>, name: &str) -> TripvizResult<T> {
            slot.ok_or_else(|| {
                TripvizError::validation(format!("missing required accessor '{name}'"))
            })
        }

        Ok(PrimitiveAccessors {
            source_position: take(self.source_position, "source_position")?,
            target_position: take(self.target_position, "target_position")?,
            time_start: take(self.time_start, "time_start")?,
            time_end: take(self.time_end, "time_end")?,
            color: take(self.color, "color")?,
            width: take(self.width, "width")?,
        })
    }
}

impl Primitive {
    /// Accessors mapping [`Primitive`] fields 1:1, for the common case.
    pub fn accessors() -> PrimitiveAccessors<Primitive> {
        PrimitiveAccessorsBuilder::new()
            .source_position(|p: &Primitive| p.source)
            .target_position(|p: &Primitive| p.target)
            .time_start(|p: &Primitive| p.window.start)
            .time_end(|p: &Primitive| p.window.end)
            .color(|p: &Primitive| p.color)
            .width(|p: &Primitive| p.width)
            .build()
            .expect("all Primitive accessors are supplied")
    }
}

/// One malformed record found by [`validate_dataset`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MalformedRecord {
    pub index: usize,
    pub reason: String,
}

/// Findings of a dataset validation pass. Malformed records are excluded from
/// the visible set by the attribute build; this report only surfaces them.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct DatasetReport {
    pub total: usize,
    pub malformed: Vec<MalformedRecord>,
}

impl DatasetReport {
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

/// Optional validation pass over a dataset, run at data-change time.
///
/// Reports inverted windows (start > resolved end) and non-finite coordinates
/// or timestamps. Open-ended windows (end == sentinel) are legal and not
/// reported.
#[tracing::instrument(skip(data, accessors), fields(len = data.len()))]
pub fn validate_dataset<D>(data: &[D], accessors: &PrimitiveAccessors<D>) -> DatasetReport {
    let mut report = DatasetReport {
        total: data.len(),
        malformed: Vec::new(),
    };

    for (index, datum) in data.iter().enumerate() {
        let source = (accessors.source_position)(datum);
        let target = (accessors.target_position)(datum);
        let start = (accessors.time_start)(datum);
        let end = (accessors.time_end)(datum);

        let reason = if !(source.x.is_finite()
            && source.y.is_finite()
            && target.x.is_finite()
            && target.y.is_finite())
        {
            Some("non-finite coordinate".to_string())
        } else if !start.is_finite() || !end.is_finite() {
            Some("non-finite timestamp".to_string())
        } else if end != crate::core::SENTINEL_END && start > end {
            Some(format!("inverted time window ({start} > {end})"))
        } else {
            None
        };

        if let Some(reason) = reason {
            report.malformed.push(MalformedRecord { index, reason });
        }
    }

    if !report.is_clean() {
        tracing::warn!(
            malformed = report.malformed.len(),
            total = report.total,
            "dataset contains malformed records; they will not be rendered"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SENTINEL_END;

    fn seg(start: f64, end: f64) -> Primitive {
        Primitive {
            source: Point::new(6.98, 51.57),
            target: Point::new(7.0, 51.55),
            window: TimeWindow { start, end },
            color: Rgba8::rgb(23, 184, 190),
            width: 2.0,
            category: None,
        }
    }

    #[test]
    fn builder_rejects_missing_accessor() {
        let err = PrimitiveAccessorsBuilder::<Primitive>::new()
            .source_position(|p| p.source)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("missing required accessor"));
    }

    #[test]
    fn primitive_accessors_extract_fields() {
        let acc = Primitive::accessors();
        let p = seg(100.0, 140.0);
        assert_eq!((acc.time_start)(&p), 100.0);
        assert_eq!((acc.time_end)(&p), 140.0);
        assert_eq!((acc.width)(&p), 2.0);
        assert_eq!((acc.source_position)(&p), Point::new(6.98, 51.57));
    }

    #[test]
    fn validation_flags_inverted_and_non_finite() {
        let data = vec![
            seg(0.0, 10.0),
            seg(20.0, 10.0),
            seg(f64::NAN, 10.0),
            seg(10.0, SENTINEL_END),
        ];
        let report = validate_dataset(&data, &Primitive::accessors());
        assert_eq!(report.total, 4);
        assert_eq!(report.malformed.len(), 2);
        assert_eq!(report.malformed[0].index, 1);
        assert_eq!(report.malformed[1].index, 2);
    }

    #[test]
    fn primitive_json_roundtrip() {
        let p = seg(100.0, 140.0);
        let s = serde_json::to_string(&p).unwrap();
        let de: Primitive = serde_json::from_str(&s).unwrap();
        assert_eq!(de, p);
    }
}
