//! Wind layer: rotated barb glyphs over decimated samples.

use std::time::Instant;

use overlay_canvas::{PointerEvent, ViewEvent, Viewport};
use overlay_common::{Boundary, Color, ColorSpec, Located, OverlayResult, WindSample};

use crate::decimate::DecimationMethod;
use crate::glyph::BarbGlyphs;
use crate::layer::{LayerCore, MoveTrigger, PointerHit, SubscriptionId, Subscribers, Thinout};
use crate::scheduler::{RedrawDecision, RedrawScheduler};
use crate::spatial_index::{HitOptions, SpatialIndex};

/// Wind layer options, replaced wholesale by [`WindLayer::set_option`].
#[derive(Debug, Clone)]
pub struct WindOptions {
    /// Glyph color; value-keyed scales resolve against wind speed in m/s.
    pub color: ColorSpec,
    /// Glyph pixmap edge in pixels.
    pub size: u32,
    pub interval: [f64; 2],
    pub method: DecimationMethod,
    pub thinout: Thinout,
    pub move_trigger: MoveTrigger,
}

impl Default for WindOptions {
    fn default() -> Self {
        Self {
            color: ColorSpec::default(),
            size: 40,
            interval: [50.0, 50.0],
            method: DecimationMethod::default(),
            thinout: Thinout::default(),
            move_trigger: MoveTrigger::default(),
        }
    }
}

/// Directional glyph renderer.
///
/// Redraw requests go through the coalescing scheduler path, so a burst of
/// viewport events costs one draw. The clip boundary filters samples by
/// point-in-polygon instead of mask compositing; a barb either shows whole
/// or not at all.
pub struct WindLayer {
    core: LayerCore,
    data: Vec<WindSample>,
    options: WindOptions,
    boundary: Option<Boundary>,
    glyphs: BarbGlyphs,
    index: SpatialIndex<WindSample>,
    click_subs: Subscribers<PointerHit<WindSample>>,
    move_subs: Subscribers<PointerHit<WindSample>>,
}

impl WindLayer {
    pub fn new(width: u32, height: u32) -> OverlayResult<Self> {
        Ok(Self {
            core: LayerCore::new(
                width,
                height,
                RedrawScheduler::coalescing(RedrawScheduler::DEFAULT_DELAY),
            )?,
            data: Vec::new(),
            options: WindOptions::default(),
            boundary: None,
            glyphs: BarbGlyphs::new(),
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

    pub fn set_data(&mut self, samples: Vec<WindSample>) {
        if self.core.is_destroyed() {
            return;
        }
        self.data = samples;
    }

    pub fn set_option(&mut self, options: WindOptions) {
        if self.core.is_destroyed() {
            return;
        }
        self.core.set_move_trigger(options.move_trigger);
        self.options = options;
    }

    /// Set or remove the clip boundary. Samples outside it are skipped.
    pub fn set_clip(&mut self, boundary: Option<Boundary>) {
        if self.core.is_destroyed() {
            return;
        }
        self.boundary = boundary;
    }

    pub fn subscribe_click(
        &mut self,
        handler: impl FnMut(&PointerHit<WindSample>) + 'static,
    ) -> SubscriptionId {
        self.click_subs.subscribe(handler)
    }

    pub fn unsubscribe_click(&mut self, id: SubscriptionId) -> bool {
        self.click_subs.unsubscribe(id)
    }

    pub fn subscribe_move(
        &mut self,
        handler: impl FnMut(&PointerHit<WindSample>) + 'static,
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
        let mut drawn: Vec<WindSample> = self
            .data
            .iter()
            .filter(|s| visible.contains(s.latlng()))
            .filter(|s| {
                self.boundary
                    .as_ref()
                    .map_or(true, |b| b.contains(s.latlng()))
            })
            .copied()
            .collect();

        if opts.thinout.active(view.zoom()) {
            drawn = opts.method.apply(&drawn, [deg_x, deg_y]);
        }
        self.index = SpatialIndex::build(&drawn, view, opts.interval);

        for sample in &drawn {
            let resolved = sample.vector.resolve();
            if !resolved.speed.is_finite() {
                continue;
            }
            let color = sample
                .color
                .unwrap_or_else(|| opts.color.resolve(Some(resolved.speed), Color::BLACK));
            let size = sample
                .size
                .map(|s| s[0].max(1.0) as u32)
                .unwrap_or(opts.size);

            let glyph = match self.glyphs.glyph(resolved.speed, color, size) {
                Ok(glyph) => glyph,
                Err(err) => {
                    tracing::warn!(%err, "barb glyph allocation failed, sample skipped");
                    continue;
                }
            };
            let screen = view.latlng_to_screen(sample.latlng());
            self.core
                .canvas_mut()
                .blit_rotated(glyph.pixmap(), screen, resolved.dir_rad);
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
        self.glyphs.clear();
    }

    /// Route a viewport event; immediate decisions are rare here because
    /// the scheduler coalesces, so the usual follow-up is [`Self::poll`].
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

    fn pointer_hit(&self, pointer: &PointerEvent, view: &dyn Viewport) -> PointerHit<WindSample> {
        let size = f64::from(self.options.size);
        let hit_opts = HitOptions {
            size: [size, size],
            margin: 10.0,
            label_pad: None,
        };
        PointerHit {
            target: self.index.hit_test(pointer, view, &hit_opts).copied(),
            latlng: pointer.latlng,
            screen: pointer.screen,
        }
    }

    /// Click-select against the drawn barbs; misses carry no target.
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
