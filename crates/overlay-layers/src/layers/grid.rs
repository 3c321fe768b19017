//! Grid-value layer: formatted field values drawn on a coarse lattice.

use std::time::Instant;

use overlay_canvas::{FillStyle, PointerEvent, ViewEvent, Viewport};
use overlay_common::{Color, ColorSpec, OverlayResult, ScalarField};

use crate::clip::ClipMode;
use crate::layer::{LayerCore, MoveTrigger, SubscriptionId, Subscribers, ValueHit};
use crate::scheduler::{RedrawDecision, RedrawScheduler};

/// How grid values are colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridColor {
    /// Resolve through the field's own thresholds and colors; black when the
    /// field carries none.
    #[default]
    Auto,
    Fixed(Color),
}

/// Grid layer options, replaced wholesale by [`GridLayer::set_option`].
#[derive(Debug, Clone)]
pub struct GridOptions {
    pub opacity: f64,
    pub color: GridColor,
    pub font_size: f64,
    /// Minimum pixel spacing between drawn samples, per axis.
    pub intervals: [f64; 2],
    /// Draw a translucent cell rectangle behind each value.
    pub show_rect: bool,
    pub rect_opacity: f64,
    /// Custom value formatter; the default shows integral values without
    /// decimals and one decimal otherwise.
    pub format: Option<fn(f64) -> String>,
    pub clip_mode: ClipMode,
    pub move_trigger: MoveTrigger,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            color: GridColor::Auto,
            font_size: 12.0,
            intervals: [60.0, 40.0],
            show_rect: false,
            rect_opacity: 0.2,
            format: None,
            clip_mode: ClipMode::default(),
            move_trigger: MoveTrigger::default(),
        }
    }
}

fn default_format(value: f64) -> String {
    if value.fract().abs() < 0.01 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Value-text overlay over a scalar field.
///
/// Drawing walks the field at the smallest field-step multiple that keeps
/// samples at least the configured pixel interval apart, aligned to the
/// field origin so labels stay put while panning. Clicks look up the value
/// at full field resolution.
pub struct GridLayer {
    core: LayerCore,
    field: Option<ScalarField>,
    options: GridOptions,
    value_subs: Subscribers<ValueHit>,
}

impl GridLayer {
    pub fn new(width: u32, height: u32) -> OverlayResult<Self> {
        Ok(Self {
            core: LayerCore::new(width, height, RedrawScheduler::immediate())?,
            field: None,
            options: GridOptions::default(),
            value_subs: Subscribers::new(),
        })
    }

    pub fn core(&self) -> &LayerCore {
        &self.core
    }

    pub fn set_data(&mut self, field: ScalarField) {
        if self.core.is_destroyed() {
            return;
        }
        self.field = Some(field);
    }

    /// Replace the option set. Effective values are resolved at draw start.
    pub fn set_option(&mut self, options: GridOptions) {
        if self.core.is_destroyed() {
            return;
        }
        self.core.set_clip_mode(options.clip_mode);
        self.core.set_move_trigger(options.move_trigger);
        self.options = options;
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

    pub fn draw(&mut self, view: &dyn Viewport) {
        if !self.core.begin_draw(view) {
            return;
        }
        let Some(field) = &self.field else {
            tracing::debug!("grid draw skipped, no field set");
            return;
        };
        if field.validate().is_err() {
            tracing::debug!("grid draw skipped, malformed field");
            return;
        }

        let opts = &self.options;
        let [deg_x, deg_y] = view.degrees_per_pixels(opts.intervals);
        let stride_x = ((deg_x / field.lon_step).ceil().max(1.0)) as usize;
        let stride_y = ((deg_y / field.lat_step).ceil().max(1.0)) as usize;

        let visible = view.bounds().expanded(
            field.lon_step * stride_x as f64,
            field.lat_step * stride_y as f64,
        );
        let format = opts.format.unwrap_or(default_format);
        let scale = match opts.color {
            GridColor::Auto => field_scale(field),
            GridColor::Fixed(_) => None,
        };

        for i in (0..field.rows).step_by(stride_y) {
            let lat = field.bounds.north - i as f64 * field.lat_step;
            for j in (0..field.cols).step_by(stride_x) {
                let lng = field.bounds.west + j as f64 * field.lon_step;
                let p = overlay_common::LatLng::new(lat, lng);
                if !visible.contains(p) {
                    continue;
                }
                let value = field.values[i * field.cols + j];
                if value.is_nan() {
                    continue;
                }

                let color = match (opts.color, &scale) {
                    (GridColor::Fixed(c), _) => c,
                    (GridColor::Auto, Some(spec)) => spec.resolve(Some(value), Color::BLACK),
                    (GridColor::Auto, None) => Color::BLACK,
                };
                let screen = view.latlng_to_screen(p);

                if opts.show_rect {
                    let corner = view.latlng_to_screen(overlay_common::LatLng::new(
                        lat - field.lat_step * stride_y as f64,
                        lng + field.lon_step * stride_x as f64,
                    ));
                    let w = corner.x - screen.x;
                    let h = corner.y - screen.y;
                    self.core.canvas_mut().fill_rect(
                        screen.x - w / 2.0,
                        screen.y - h / 2.0,
                        w,
                        h,
                        &FillStyle::with_opacity(color, opts.rect_opacity * opts.opacity),
                    );
                }

                let faded = Color::rgba(
                    color.r,
                    color.g,
                    color.b,
                    (f64::from(color.a) * opts.opacity.clamp(0.0, 1.0)).round() as u8,
                );
                self.core
                    .canvas_mut()
                    .draw_label(&format(value), screen, opts.font_size, faded);
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
    }

    /// Route a viewport event; draws synchronously on an immediate decision.
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

    /// Full-resolution value lookup under the pointer, delivered as a
    /// [`ValueHit`]. Clicks outside the clip boundary or outside the field
    /// emit a null-value hit through the same path.
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

/// The field's own color scale, when it carries one.
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
