//! Iso-contour layer: filled and stroked threshold polygons.

use std::time::Instant;

use overlay_canvas::{FillStyle, PointerEvent, StrokeStyle, ViewEvent, Viewport};
use overlay_common::{Color, ColorSpec, LatLng, OverlayResult, ScalarField, ScreenPoint};

use crate::clip::ClipMode;
use crate::contour::{extract_isolines, generate_levels};
use crate::layer::{LayerCore, MoveTrigger, SubscriptionId, Subscribers, ValueHit};
use crate::scheduler::{RedrawDecision, RedrawScheduler};

/// Iso layer options, replaced wholesale by [`IsoLayer::set_option`].
#[derive(Debug, Clone)]
pub struct IsoOptions {
    pub opacity: f64,
    pub fill: bool,
    pub fill_opacity: f64,
    pub stroke: bool,
    pub stroke_opacity: f64,
    pub line_width: f64,
    pub dash: Option<Vec<f32>>,
    /// Chaikin smoothing passes applied at extraction time.
    pub smoothing_passes: u32,
    pub clip_mode: ClipMode,
    pub move_trigger: MoveTrigger,
}

impl Default for IsoOptions {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            fill: true,
            fill_opacity: 0.6,
            stroke: true,
            stroke_opacity: 1.0,
            line_width: 1.5,
            dash: None,
            smoothing_passes: 1,
            clip_mode: ClipMode::default(),
            move_trigger: MoveTrigger::default(),
        }
    }
}

/// One extracted isoline held in geographic coordinates, ready to project.
struct StoredIsoline {
    level: f64,
    points: Vec<LatLng>,
    closed: bool,
}

/// Contour renderer over a scalar field.
///
/// Extraction happens once in `set_data` (and again when the option set
/// changes the smoothing); draws only reproject the stored rings.
pub struct IsoLayer {
    core: LayerCore,
    field: Option<ScalarField>,
    isolines: Vec<StoredIsoline>,
    options: IsoOptions,
    value_subs: Subscribers<ValueHit>,
}

impl IsoLayer {
    pub fn new(width: u32, height: u32) -> OverlayResult<Self> {
        Ok(Self {
            core: LayerCore::new(width, height, RedrawScheduler::immediate())?,
            field: None,
            isolines: Vec::new(),
            options: IsoOptions::default(),
            value_subs: Subscribers::new(),
        })
    }

    pub fn core(&self) -> &LayerCore {
        &self.core
    }

    pub fn isoline_count(&self) -> usize {
        self.isolines.len()
    }

    pub fn set_data(&mut self, field: ScalarField) {
        if self.core.is_destroyed() {
            return;
        }
        self.field = Some(field);
        self.rebuild_isolines();
    }

    pub fn set_option(&mut self, options: IsoOptions) {
        if self.core.is_destroyed() {
            return;
        }
        let resmooth = options.smoothing_passes != self.options.smoothing_passes;
        self.core.set_clip_mode(options.clip_mode);
        self.core.set_move_trigger(options.move_trigger);
        self.options = options;
        if resmooth {
            self.rebuild_isolines();
        }
    }

    pub fn set_clip(&mut self, boundary: Option<overlay_common::Boundary>) {
        if self.core.is_destroyed() {
            return;
        }
        self.core.set_boundary(boundary);
    }

    pub fn subscribe_value(
        &mut self,
        handler: impl FnMut(&ValueHit) + 'static,
    ) -> SubscriptionId {
        self.value_subs.subscribe(handler)
    }

    pub fn unsubscribe_value(&mut self, id: SubscriptionId) -> bool {
        self.value_subs.unsubscribe(id)
    }

    fn rebuild_isolines(&mut self) {
        self.isolines.clear();
        let Some(field) = &self.field else {
            return;
        };
        if field.validate().is_err() {
            tracing::debug!("isoline extraction skipped, malformed field");
            return;
        }

        let levels = match &field.thresholds {
            Some(t) if !t.is_empty() => t.clone(),
            _ => match field.value_range() {
                Some((min, max)) if max > min => generate_levels(min, max, (max - min) / 10.0),
                _ => Vec::new(),
            },
        };

        for isoline in extract_isolines(field, &levels, self.options.smoothing_passes) {
            self.isolines.push(StoredIsoline {
                level: isoline.level,
                points: isoline.latlng_points(field),
                closed: isoline.closed,
            });
        }
        tracing::debug!(
            isolines = self.isolines.len(),
            levels = levels.len(),
            "isolines extracted"
        );
    }

    pub fn draw(&mut self, view: &dyn Viewport) {
        if !self.core.begin_draw(view) {
            return;
        }
        if self.isolines.is_empty() {
            return;
        }

        let scale = self.field.as_ref().and_then(field_scale);
        let opts = self.options.clone();
        let visible = view.bounds();

        for isoline in &self.isolines {
            if isoline.points.len() < 2 {
                continue;
            }
            // Cull rings entirely outside the frame.
            match overlay_common::GeoBounds::covering(isoline.points.iter().copied()) {
                Some(bbox) if bbox.intersects(&visible) => {}
                _ => continue,
            }

            let color = scale
                .as_ref()
                .map(|s| s.resolve(Some(isoline.level), Color::BLACK))
                .unwrap_or(Color::BLACK);
            let projected: Vec<ScreenPoint> = isoline
                .points
                .iter()
                .map(|&p| view.latlng_to_screen(p))
                .collect();

            if opts.fill && isoline.closed {
                self.core.canvas_mut().fill_polygon(
                    &projected,
                    &FillStyle::with_opacity(color, opts.fill_opacity * opts.opacity),
                    overlay_canvas::Composite::SourceOver,
                );
            }
            if opts.stroke {
                let mut style = StrokeStyle::new(color, opts.line_width);
                style.opacity = opts.stroke_opacity * opts.opacity;
                style.dash = opts.dash.clone();
                self.core
                    .canvas_mut()
                    .stroke_polyline(&projected, isoline.closed, &style);
            }
        }

        self.core.finish_draw(view);
    }

    pub fn clear(&mut self) {
        self.core.clear();
    }

    pub fn destroy(&mut self) {
        self.core.destroy();
        self.field = None;
        self.isolines.clear();
    }

    pub fn on_view_event(
        &mut self,
        event: ViewEvent,
        view: &dyn Viewport,
        now: Instant,
    ) -> RedrawDecision {
        let decision = self.core.on_view_event(event, now);
        if decision == RedrawDecision::Immediate {
            self.draw(view);
        }
        decision
    }

    /// Value lookup at full field resolution, same contract as the grid
    /// layer's click path: out-of-boundary and out-of-field clicks emit a
    /// null-value hit.
    pub fn on_pointer_click(&mut self, pointer: &PointerEvent) {
        if self.core.is_destroyed() {
            return;
        }
        let in_clip = self
            .core
            .boundary()
            .map_or(true, |b| b.contains(pointer.latlng));
        let value = if in_clip {
            self.field
                .as_ref()
                .and_then(|f| f.value_at(pointer.latlng))
                .filter(|v| !v.is_nan())
        } else {
            None
        };
        self.value_subs.emit(&ValueHit {
            value,
            latlng: pointer.latlng,
        });
    }
}

fn field_scale(field: &ScalarField) -> Option<ColorSpec> {
    match (&field.thresholds, &field.colors) {
        (Some(thresholds), Some(colors)) if !thresholds.is_empty() && !colors.is_empty() => {
            Some(ColorSpec::Scale {
                thresholds: thresholds.clone(),
                colors: colors.clone(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_canvas::FlatViewport;
    use overlay_common::GeoBounds;

    fn view() -> FlatViewport {
        FlatViewport::new(GeoBounds::new(10.0, 0.0, 10.0, 0.0), 200, 200, 5.0)
    }

    fn peak_field() -> ScalarField {
        // 5x5 with a central peak; one threshold at 5.
        let mut values = vec![0.0; 25];
        values[12] = 10.0;
        let mut field = ScalarField::new(
            values,
            5,
            5,
            2.0,
            2.0,
            GeoBounds::new(10.0, 2.0, 8.0, 0.0),
        )
        .unwrap();
        field.thresholds = Some(vec![5.0]);
        field.colors = Some(vec![Color::rgb(255, 0, 0)]);
        field
    }

    #[test]
    fn test_set_data_extracts_isolines() {
        let mut layer = IsoLayer::new(200, 200).unwrap();
        layer.set_data(peak_field());
        assert_eq!(layer.isoline_count(), 1);
    }

    #[test]
    fn test_draw_paints_contour() {
        let view = view();
        let mut layer = IsoLayer::new(200, 200).unwrap();
        layer.set_data(peak_field());
        layer.draw(&view);
        assert!(layer.core().canvas().has_content());
    }

    #[test]
    fn test_flat_field_draws_nothing() {
        let view = view();
        let mut layer = IsoLayer::new(200, 200).unwrap();
        let mut field = peak_field();
        field.values = vec![3.0; 25];
        layer.set_data(field);
        layer.draw(&view);
        assert!(!layer.core().canvas().has_content());
    }

    #[test]
    fn test_click_outside_boundary_reports_null_value() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut layer = IsoLayer::new(200, 200).unwrap();
        layer.set_data(peak_field());
        layer.set_clip(Some(overlay_common::Boundary::from_ring(vec![
            LatLng::new(10.0, 0.0),
            LatLng::new(10.0, 5.0),
            LatLng::new(2.0, 5.0),
            LatLng::new(2.0, 0.0),
        ])));

        let sink = Rc::clone(&seen);
        layer.subscribe_value(move |hit| sink.borrow_mut().push(hit.value));

        layer.on_pointer_click(&PointerEvent::new(
            LatLng::new(6.0, 7.0),
            ScreenPoint::new(0.0, 0.0),
        ));
        layer.on_pointer_click(&PointerEvent::new(
            LatLng::new(6.0, 4.0),
            ScreenPoint::new(0.0, 0.0),
        ));
        assert_eq!(*seen.borrow(), vec![None, Some(10.0)]);
    }

    #[test]
    fn test_smoothing_option_rebuilds() {
        let mut layer = IsoLayer::new(200, 200).unwrap();
        layer.set_data(peak_field());
        let coarse: Vec<usize> = layer.isolines.iter().map(|i| i.points.len()).collect();

        let mut options = IsoOptions::default();
        options.smoothing_passes = 3;
        layer.set_option(options);
        let fine: Vec<usize> = layer.isolines.iter().map(|i| i.points.len()).collect();
        assert!(fine.iter().sum::<usize>() > coarse.iter().sum::<usize>());
    }
}
