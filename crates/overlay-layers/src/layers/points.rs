//! Point layer: scattered markers with optional decimation and labels.

use std::time::Instant;

use overlay_canvas::{FillStyle, PointerEvent, ViewEvent, Viewport};
use overlay_common::{Color, ColorSpec, GeoPoint, Located, MarkerShape, OverlayResult, ScreenPoint};

use crate::clip::ClipMode;
use crate::decimate::DecimationMethod;
use crate::layer::{LayerCore, MoveTrigger, PointerHit, SubscriptionId, Subscribers, Thinout};
use crate::scheduler::{RedrawDecision, RedrawScheduler};
use crate::spatial_index::{HitOptions, SpatialIndex};

/// Point layer options, replaced wholesale by [`PointLayer::set_option`].
#[derive(Debug, Clone)]
pub struct PointOptions {
    pub opacity: f64,
    /// Marker color; per-point overrides win, value-keyed scales resolve
    /// against each point's value.
    pub color: ColorSpec,
    pub size: [f64; 2],
    pub shape: MarkerShape,
    /// Draw the formatted value (or label) above each marker.
    pub show_labels: bool,
    pub font_size: f64,
    /// Minimum pixel spacing fed to decimation and index expansion.
    pub interval: [f64; 2],
    pub method: DecimationMethod,
    pub thinout: Thinout,
    pub clip_mode: ClipMode,
    pub move_trigger: MoveTrigger,
}

impl Default for PointOptions {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            color: ColorSpec::default(),
            size: [30.0, 30.0],
            shape: MarkerShape::Circle,
            show_labels: false,
            font_size: 12.0,
            interval: [30.0, 30.0],
            method: DecimationMethod::default(),
            thinout: Thinout::default(),
            clip_mode: ClipMode::default(),
            move_trigger: MoveTrigger::default(),
        }
    }
}

/// Scattered marker renderer.
///
/// Each draw filters the dataset to the expanded viewport, decimates it when
/// the thinout policy says so, rebuilds the hit-test index from exactly the
/// points drawn, then paints markers and labels.
pub struct PointLayer {
    core: LayerCore,
    data: Vec<GeoPoint>,
    options: PointOptions,
    index: SpatialIndex<GeoPoint>,
    click_subs: Subscribers<PointerHit<GeoPoint>>,
    move_subs: Subscribers<PointerHit<GeoPoint>>,
}

impl PointLayer {
    pub fn new(width: u32, height: u32) -> OverlayResult<Self> {
        Ok(Self {
            core: LayerCore::new(width, height, RedrawScheduler::immediate())?,
            data: Vec::new(),
            options: PointOptions::default(),
            index: SpatialIndex::empty(),
            click_subs: Subscribers::new(),
            move_subs: Subscribers::new(),
        })
    }

    pub fn core(&self) -> &LayerCore {
        &self.core
    }

    pub fn drawn_count(&self) -> usize {
        self.index.len()
    }

    pub fn set_data(&mut self, points: Vec<GeoPoint>) {
        if self.core.is_destroyed() {
            return;
        }
        self.data = points;
    }

    pub fn set_option(&mut self, options: PointOptions) {
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

    pub fn subscribe_click(
        &mut self,
        handler: impl FnMut(&PointerHit<GeoPoint>) + 'static,
    ) -> SubscriptionId {
        self.click_subs.subscribe(handler)
    }

    pub fn unsubscribe_click(&mut self, id: SubscriptionId) -> bool {
        self.click_subs.unsubscribe(id)
    }

    pub fn subscribe_move(
        &mut self,
        handler: impl FnMut(&PointerHit<GeoPoint>) + 'static,
    ) -> SubscriptionId {
        self.move_subs.subscribe(handler)
    }

    pub fn unsubscribe_move(&mut self, id: SubscriptionId) -> bool {
        self.move_subs.unsubscribe(id)
    }

    pub fn draw(&mut self, view: &dyn Viewport) {
        if !self.core.begin_draw(view) {
            return;
        }
        let opts = self.options.clone();

        let [deg_x, deg_y] = view.degrees_per_pixels(opts.interval);
        let visible = view.bounds().expanded(deg_x, deg_y);
        let mut drawn: Vec<GeoPoint> = self
            .data
            .iter()
            .filter(|p| visible.contains(p.latlng()))
            .cloned()
            .collect();

        if opts.thinout.active(view.zoom()) {
            drawn = opts.method.apply(&drawn, [deg_x, deg_y]);
        }
        self.index = SpatialIndex::build(&drawn, view, opts.interval);

        for point in &drawn {
            let screen = view.latlng_to_screen(point.latlng());
            let color = point
                .color
                .unwrap_or_else(|| opts.color.resolve(point.value, Color::BLACK));
            let size = point.size.unwrap_or(opts.size);
            let shape = point.shape.unwrap_or(opts.shape);
            let style = FillStyle::with_opacity(color, opts.opacity);

            match shape {
                MarkerShape::Circle => {
                    self.core
                        .canvas_mut()
                        .fill_circle(screen.x, screen.y, size[0] / 2.0, &style);
                }
                MarkerShape::Rect => {
                    self.core.canvas_mut().fill_rect(
                        screen.x - size[0] / 2.0,
                        screen.y - size[1] / 2.0,
                        size[0],
                        size[1],
                        &style,
                    );
                }
            }

            if opts.show_labels {
                let text = match (&point.label, point.value) {
                    (Some(label), _) => Some(label.clone()),
                    (None, Some(value)) => Some(format_value(value)),
                    (None, None) => None,
                };
                if let Some(text) = text {
                    let at = ScreenPoint::new(
                        screen.x,
                        screen.y - size[1] / 2.0 - opts.font_size / 2.0 - 2.0,
                    );
                    self.core
                        .canvas_mut()
                        .draw_label(&text, at, opts.font_size, color);
                }
            }
        }

        self.core.finish_draw(view);
    }

    pub fn clear(&mut self) {
        self.core.clear();
        self.index = SpatialIndex::empty();
    }

    pub fn destroy(&mut self) {
        self.core.destroy();
        self.data.clear();
        self.index = SpatialIndex::empty();
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

    /// Poll for a due deferred redraw and run it.
    pub fn poll(&mut self, view: &dyn Viewport, now: Instant) -> bool {
        if self.core.poll(now) {
            self.draw(view);
            return true;
        }
        false
    }

    fn pointer_hit(&self, pointer: &PointerEvent, view: &dyn Viewport) -> PointerHit<GeoPoint> {
        let hit_opts = HitOptions {
            size: self.options.size,
            margin: 10.0,
            label_pad: self.options.show_labels.then_some(self.options.font_size),
        };
        PointerHit {
            target: self.index.hit_test(pointer, view, &hit_opts).cloned(),
            latlng: pointer.latlng,
            screen: pointer.screen,
        }
    }

    /// Click-select against the drawn markers. Misses emit a hit with no
    /// target so hosts can clear selection state.
    pub fn on_pointer_click(&mut self, pointer: &PointerEvent, view: &dyn Viewport) {
        if self.core.is_destroyed() {
            return;
        }
        let hit = self.pointer_hit(pointer, view);
        self.click_subs.emit(&hit);
    }

    /// Hover tracking: the same hit-test as clicks, on its own channel.
    pub fn on_pointer_move(&mut self, pointer: &PointerEvent, view: &dyn Viewport) {
        if self.core.is_destroyed() {
            return;
        }
        let hit = self.pointer_hit(pointer, view);
        self.move_subs.emit(&hit);
    }
}

fn format_value(value: f64) -> String {
    if value.fract().abs() < 0.01 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_canvas::FlatViewport;
    use overlay_common::{GeoBounds, LatLng};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn view() -> FlatViewport {
        FlatViewport::new(GeoBounds::new(10.0, 0.0, 10.0, 0.0), 500, 500, 5.0)
    }

    fn scattered(n: usize) -> Vec<GeoPoint> {
        (0..n)
            .map(|i| {
                GeoPoint::with_value(
                    (i as f64 * 0.73) % 10.0,
                    (i as f64 * 1.31) % 10.0,
                    i as f64,
                )
            })
            .collect()
    }

    #[test]
    fn test_draw_paints_and_indexes() {
        let view = view();
        let mut layer = PointLayer::new(500, 500).unwrap();
        layer.set_data(scattered(50));
        layer.draw(&view);
        assert!(layer.core().canvas().has_content());
        assert!(layer.drawn_count() > 0);
        assert!(layer.drawn_count() <= 50);
    }

    #[test]
    fn test_thinout_never_keeps_everything() {
        let view = view();
        let mut layer = PointLayer::new(500, 500).unwrap();
        layer.set_data(scattered(50));

        let mut options = PointOptions::default();
        options.thinout = Thinout::Never;
        layer.set_option(options);
        layer.draw(&view);
        assert_eq!(layer.drawn_count(), 50);
    }

    #[test]
    fn test_out_of_view_points_are_filtered() {
        let view = view();
        let mut layer = PointLayer::new(500, 500).unwrap();
        layer.set_data(vec![
            GeoPoint::new(5.0, 5.0),
            GeoPoint::new(80.0, 80.0),
            GeoPoint::new(-40.0, 5.0),
        ]);
        let mut options = PointOptions::default();
        options.thinout = Thinout::Never;
        layer.set_option(options);
        layer.draw(&view);
        assert_eq!(layer.drawn_count(), 1);
    }

    #[test]
    fn test_pointer_hit_and_miss() {
        let view = view();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut layer = PointLayer::new(500, 500).unwrap();
        layer.set_data(vec![GeoPoint::with_value(5.0, 5.0, 42.0)]);
        layer.draw(&view);

        let sink = Rc::clone(&seen);
        layer.subscribe_click(move |hit| sink.borrow_mut().push(hit.target.is_some()));

        let on = LatLng::new(5.0, 5.0);
        layer.on_pointer_click(&PointerEvent::new(on, view.latlng_to_screen(on)), &view);
        let off = LatLng::new(9.5, 0.5);
        layer.on_pointer_click(&PointerEvent::new(off, view.latlng_to_screen(off)), &view);

        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn test_click_and_move_deliver_on_separate_channels() {
        let view = view();
        let clicks = Rc::new(RefCell::new(0usize));
        let moves = Rc::new(RefCell::new(0usize));
        let mut layer = PointLayer::new(500, 500).unwrap();
        layer.set_data(vec![GeoPoint::new(5.0, 5.0)]);
        layer.draw(&view);

        let p = LatLng::new(5.0, 5.0);
        let at = view.latlng_to_screen(p);
        let c = Rc::clone(&clicks);
        layer.subscribe_click(move |hit| {
            assert_eq!(hit.screen, at);
            *c.borrow_mut() += 1;
        });
        let m = Rc::clone(&moves);
        layer.subscribe_move(move |_| *m.borrow_mut() += 1);

        layer.on_pointer_move(&PointerEvent::new(p, at), &view);
        assert_eq!((*clicks.borrow(), *moves.borrow()), (0, 1));

        layer.on_pointer_click(&PointerEvent::new(p, at), &view);
        assert_eq!((*clicks.borrow(), *moves.borrow()), (1, 1));
    }

    #[test]
    fn test_clear_discards_index() {
        let view = view();
        let mut layer = PointLayer::new(500, 500).unwrap();
        layer.set_data(scattered(20));
        layer.draw(&view);
        assert!(layer.drawn_count() > 0);

        layer.clear();
        assert_eq!(layer.drawn_count(), 0);
        assert!(!layer.core().canvas().has_content());
    }
}
