//! Shared layer plumbing: subscriber registry, event payloads and the
//! canvas/scheduler/clip core every renderer builds on.

use std::time::Instant;

use overlay_canvas::{RasterCanvas, ViewEvent, Viewport};
use overlay_common::{Boundary, LatLng, OverlayResult, ScreenPoint};

use crate::clip::{ClipMode, ClipStrategy};
use crate::scheduler::{RedrawDecision, RedrawScheduler};

/// Stable handle for one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registry of callbacks for one event kind.
///
/// Dispatch is synchronous and in registration order.
pub struct Subscribers<P> {
    handlers: Vec<(SubscriptionId, Box<dyn FnMut(&P)>)>,
    next_id: u64,
}

impl<P> Subscribers<P> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&P) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a subscriber. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _)| *h != id);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, payload: &P) {
        for (_, handler) in &mut self.handlers {
            handler(payload);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<P> Default for Subscribers<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Pointer interaction outcome for marker layers.
///
/// Misses are delivered too, with `target` unset, so hosts can dismiss
/// tooltips.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerHit<T> {
    pub target: Option<T>,
    pub latlng: LatLng,
    /// Container-pixel position the pointer event originated at.
    pub screen: ScreenPoint,
}

/// Value-lookup outcome for field layers. Out-of-field clicks carry
/// `value: None` through the same path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueHit {
    pub value: Option<f64>,
    pub latlng: LatLng,
}

/// Which viewport event re-triggers a layer redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveTrigger {
    /// Redraw continuously while the map moves.
    #[default]
    Move,
    /// Redraw only once motion settles.
    MoveEnd,
}

/// When decimation runs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Thinout {
    #[default]
    Always,
    Never,
    /// Decimate only below the given zoom; at high zoom the full set fits.
    BelowZoom(f64),
}

impl Thinout {
    pub fn active(self, zoom: f64) -> bool {
        match self {
            Thinout::Always => true,
            Thinout::Never => false,
            Thinout::BelowZoom(z) => zoom < z,
        }
    }
}

/// Translate + scale approximation a host applies to the stale bitmap
/// during an animated zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualTransform {
    pub scale: f64,
    pub offset: ScreenPoint,
}

/// The state every layer renderer shares: the raster surface, the redraw
/// scheduler, the clip strategy and the destroy flag.
pub struct LayerCore {
    canvas: RasterCanvas,
    scheduler: RedrawScheduler,
    clip_mode: ClipMode,
    clip: Box<dyn ClipStrategy>,
    boundary: Option<Boundary>,
    move_trigger: MoveTrigger,
    visual: Option<VisualTransform>,
    destroyed: bool,
}

impl LayerCore {
    pub fn new(width: u32, height: u32, scheduler: RedrawScheduler) -> OverlayResult<Self> {
        Ok(Self {
            canvas: RasterCanvas::new(width, height)?,
            scheduler,
            clip_mode: ClipMode::default(),
            clip: ClipMode::default().strategy(),
            boundary: None,
            move_trigger: MoveTrigger::default(),
            visual: None,
            destroyed: false,
        })
    }

    pub fn canvas(&self) -> &RasterCanvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut RasterCanvas {
        &mut self.canvas
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.boundary.as_ref()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn move_trigger(&self) -> MoveTrigger {
        self.move_trigger
    }

    pub fn set_move_trigger(&mut self, trigger: MoveTrigger) {
        self.move_trigger = trigger;
    }

    pub fn clip_mode(&self) -> ClipMode {
        self.clip_mode
    }

    pub fn set_clip_mode(&mut self, mode: ClipMode) {
        if mode != self.clip_mode {
            self.clip_mode = mode;
            self.clip = mode.strategy();
        }
    }

    /// Install or remove the clip boundary. `None` disables compositing.
    pub fn set_boundary(&mut self, boundary: Option<Boundary>) {
        self.boundary = boundary;
        // A fresh strategy drops any cached mask built for the old boundary;
        // the next draw rebuilds it.
        self.clip = self.clip_mode.strategy();
    }

    /// Prepare the surface for a redraw. False means the draw must be
    /// skipped (destroyed layer or unallocatable surface).
    pub fn begin_draw(&mut self, view: &dyn Viewport) -> bool {
        if self.destroyed {
            return false;
        }
        let (w, h) = view.size();
        if let Err(err) = self.canvas.resize(w, h) {
            tracing::warn!(%err, "layer surface resize failed, draw skipped");
            return false;
        }
        // The clip keeps its cached state across draws; a rebuild happens
        // only after `set_boundary` or a clip-mode change installed a fresh
        // strategy.
        if let Some(boundary) = &self.boundary {
            if self.clip.needs_rebuild() {
                self.clip.rebuild(boundary, view);
            }
        }
        self.visual = None;
        true
    }

    /// Composite the clip and record the draw.
    pub fn finish_draw(&mut self, view: &dyn Viewport) {
        if self.destroyed {
            return;
        }
        if let Some(boundary) = self.boundary.take() {
            self.clip.apply(&mut self.canvas, &boundary, view);
            self.boundary = Some(boundary);
        }
        self.scheduler.mark_drawn();
    }

    /// Drop on-screen content and suppress viewport-triggered redraws until
    /// the next explicit draw.
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.scheduler.mark_cleared();
        self.visual = None;
    }

    /// Permanently shut the layer down. Idempotent; every later call into
    /// the layer no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.clear();
        self.destroyed = true;
    }

    /// Route one viewport event into the scheduler.
    ///
    /// Zoom ticks never redraw; they update the clip scale and the published
    /// visual transform so the host can keep the stale bitmap aligned.
    pub fn on_view_event(&mut self, event: ViewEvent, now: Instant) -> RedrawDecision {
        if self.destroyed {
            return RedrawDecision::Suppressed;
        }
        match event {
            ViewEvent::Move => {
                if self.move_trigger == MoveTrigger::Move {
                    self.scheduler.request(now)
                } else {
                    RedrawDecision::Suppressed
                }
            }
            ViewEvent::MoveEnd => self.scheduler.request(now),
            ViewEvent::ZoomAnim { scale, offset } => {
                self.clip.zoom_tick(scale);
                self.visual = Some(VisualTransform { scale, offset });
                RedrawDecision::Suppressed
            }
        }
    }

    /// Poll for a due deferred redraw.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.destroyed {
            return false;
        }
        self.scheduler.poll(now)
    }

    /// The translate+scale the host should apply to the current bitmap
    /// while a zoom animation is in flight.
    pub fn visual_transform(&self) -> Option<VisualTransform> {
        self.visual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_canvas::{FillStyle, FlatViewport};
    use overlay_common::{Color, GeoBounds, ScreenPoint};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn view() -> FlatViewport {
        FlatViewport::new(GeoBounds::new(10.0, 0.0, 10.0, 0.0), 100, 100, 5.0)
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subs: Subscribers<ValueHit> = Subscribers::new();

        let sink = Rc::clone(&seen);
        let id = subs.subscribe(move |hit| sink.borrow_mut().push(hit.value));

        let hit = ValueHit {
            value: Some(7.0),
            latlng: LatLng::new(1.0, 1.0),
        };
        subs.emit(&hit);
        assert_eq!(*seen.borrow(), vec![Some(7.0)]);

        assert!(subs.unsubscribe(id));
        subs.emit(&hit);
        assert_eq!(seen.borrow().len(), 1);
        assert!(!subs.unsubscribe(id));
    }

    #[test]
    fn test_destroy_is_idempotent_and_final() {
        let view = view();
        let mut core = LayerCore::new(100, 100, RedrawScheduler::immediate()).unwrap();
        assert!(core.begin_draw(&view));
        core.finish_draw(&view);

        core.destroy();
        assert!(core.is_destroyed());
        core.destroy();

        assert!(!core.begin_draw(&view));
        assert_eq!(
            core.on_view_event(ViewEvent::Move, Instant::now()),
            RedrawDecision::Suppressed
        );
        assert!(!core.poll(Instant::now()));
    }

    #[test]
    fn test_move_trigger_filters_events() {
        let mut core = LayerCore::new(100, 100, RedrawScheduler::immediate()).unwrap();
        let view = view();
        core.set_move_trigger(MoveTrigger::MoveEnd);
        assert!(core.begin_draw(&view));
        core.finish_draw(&view);

        let now = Instant::now();
        assert_eq!(core.on_view_event(ViewEvent::Move, now), RedrawDecision::Suppressed);
        assert_eq!(core.on_view_event(ViewEvent::MoveEnd, now), RedrawDecision::Immediate);
    }

    #[test]
    fn test_zoom_tick_publishes_visual_transform() {
        let mut core = LayerCore::new(100, 100, RedrawScheduler::immediate()).unwrap();
        let view = view();
        assert!(core.begin_draw(&view));
        core.finish_draw(&view);

        let event = ViewEvent::ZoomAnim {
            scale: 2.0,
            offset: ScreenPoint::new(-50.0, -50.0),
        };
        assert_eq!(core.on_view_event(event, Instant::now()), RedrawDecision::Suppressed);
        let visual = core.visual_transform().unwrap();
        assert_eq!(visual.scale, 2.0);

        // The next real draw drops the approximation.
        assert!(core.begin_draw(&view));
        assert!(core.visual_transform().is_none());
    }

    #[test]
    fn test_cached_mask_persists_across_draws_and_scales() {
        let view = view();
        let mut core = LayerCore::new(100, 100, RedrawScheduler::immediate()).unwrap();
        // Western half of the viewport.
        core.set_boundary(Some(Boundary::from_ring(vec![
            LatLng::new(10.0, 0.0),
            LatLng::new(10.0, 5.0),
            LatLng::new(0.0, 5.0),
            LatLng::new(0.0, 0.0),
        ])));

        assert!(core.begin_draw(&view));
        core.canvas_mut()
            .fill_rect(0.0, 0.0, 100.0, 100.0, &FillStyle::new(Color::BLACK));
        core.finish_draw(&view);
        assert_ne!(core.canvas().pixel(20, 50).unwrap().a, 0);
        assert_eq!(core.canvas().pixel(80, 50).unwrap().a, 0);

        // A zoom tick doubles the mask scale. The next draw composites the
        // cached mask at that scale instead of rebuilding it, so the doubled
        // mask now spans the full canvas width.
        let event = ViewEvent::ZoomAnim {
            scale: 2.0,
            offset: ScreenPoint::new(0.0, 0.0),
        };
        core.on_view_event(event, Instant::now());
        assert!(core.begin_draw(&view));
        core.canvas_mut()
            .fill_rect(0.0, 0.0, 100.0, 100.0, &FillStyle::new(Color::BLACK));
        core.finish_draw(&view);
        assert_ne!(core.canvas().pixel(80, 50).unwrap().a, 0);
    }

    #[test]
    fn test_thinout_modes() {
        assert!(Thinout::Always.active(18.0));
        assert!(!Thinout::Never.active(1.0));
        assert!(Thinout::BelowZoom(8.0).active(5.0));
        assert!(!Thinout::BelowZoom(8.0).active(8.0));
    }
}
