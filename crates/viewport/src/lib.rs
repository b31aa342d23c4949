//! Zoom, pan and sizing of a drawing surface.
//!
//! [`ViewportController`] owns the canvas-to-screen transform of one surface.
//! Zoom always stays within [`MIN_ZOOM`]..=[`MAX_ZOOM`]. The surface keeps
//! the aspect ratio it was created with, and resizing scales the zoom so
//! content keeps its apparent size. Event subscriptions live in a
//! [`ListenerRegistry`] shared with the other tools on the surface.
//!
//! ```
//! use drawboard_geometry::Point;
//! use drawboard_viewport::{ListenerRegistry, ViewportController, MAX_ZOOM};
//!
//! let mut registry = ListenerRegistry::new();
//! let surface = registry.create_surface();
//! let mut viewport = ViewportController::new(surface, 800.0, 4.0 / 3.0);
//! assert!(viewport.bind_listeners(&mut registry));
//! assert!(!viewport.bind_listeners(&mut registry));
//!
//! let outcome = viewport.on_wheel_zoom(1e6, Point::new(100.0, 100.0));
//! assert_eq!(outcome.zoom, MAX_ZOOM);
//! assert!(outcome.prevent_default);
//! // The cursor still points at the same canvas position.
//! let under_cursor = viewport.screen_to_canvas(Point::new(100.0, 100.0));
//! assert!((under_cursor.x - 100.0).abs() < 1e-9);
//! ```

mod listeners;

pub use listeners::{EventKind, ListenerId, ListenerRegistry, SurfaceId};

use drawboard_geometry::Point;
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
/// Zoom change applied by one zoom-in/zoom-out command.
pub const ZOOM_STEP: f64 = 0.2;
/// Wheel delta that changes the zoom by 1.0.
pub const DEFAULT_WHEEL_DIVISOR: f64 = 1000.0;

const VIEWPORT_EVENTS: [EventKind; 2] = [EventKind::Resize, EventKind::Wheel];

/// Clamps into `[MIN_ZOOM, MAX_ZOOM]`; NaN maps to `MIN_ZOOM`.
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Zoom and pan of a drawing surface. `pan` is in screen pixels; a canvas
/// point `c` appears on screen at `c * zoom + pan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub zoom: f64,
    pub pan: Point,
    pub width: f64,
    pub height: f64,
    pub aspect_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDimensions {
    pub width: f64,
    pub height: f64,
}

/// Result of a wheel event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelOutcome {
    pub zoom: f64,
    /// The host must suppress native scrolling for the originating event.
    pub prevent_default: bool,
}

/// Canvas-to-screen transform and listener bookkeeping for one surface.
#[derive(Debug)]
pub struct ViewportController {
    state: ViewportState,
    logical_origin: Point,
    wheel_divisor: f64,
    surface: SurfaceId,
    bound: bool,
}

impl ViewportController {
    /// Sizes the surface to `container_width` at `aspect_ratio` (width over
    /// height) with zoom 1 and no pan. The logical origin is the centre.
    pub fn new(surface: SurfaceId, container_width: f64, aspect_ratio: f64) -> Self {
        let aspect_ratio = if aspect_ratio > 0.0 { aspect_ratio } else { 1.0 };
        let width = container_width.max(1.0);
        let height = width / aspect_ratio;

        Self {
            state: ViewportState { zoom: 1.0, pan: Point::ORIGIN, width, height, aspect_ratio },
            logical_origin: Point::new(width / 2.0, height / 2.0),
            wheel_divisor: DEFAULT_WHEEL_DIVISOR,
            surface,
            bound: false,
        }
    }

    /// Ignored unless `divisor` is finite and positive.
    pub fn with_wheel_divisor(mut self, divisor: f64) -> Self {
        if divisor.is_finite() && divisor > 0.0 {
            self.wheel_divisor = divisor;
        }
        self
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn zoom(&self) -> f64 {
        self.state.zoom
    }

    pub fn pan(&self) -> Point {
        self.state.pan
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn dimensions(&self) -> SurfaceDimensions {
        SurfaceDimensions { width: self.state.width, height: self.state.height }
    }

    /// Centre of the visible surface, in screen pixels.
    pub fn center(&self) -> Point {
        Point::new(self.state.width / 2.0, self.state.height / 2.0)
    }

    /// Canvas point used as the Cartesian origin: the surface centre at creation.
    pub fn logical_origin(&self) -> Point {
        self.logical_origin
    }

    /// Affine transform `[a, b, c, d, e, f]` mapping canvas to screen.
    pub fn transform(&self) -> [f64; 6] {
        let ViewportState { zoom, pan, .. } = self.state;
        [zoom, 0.0, 0.0, zoom, pan.x, pan.y]
    }

    /// Inverse of [`transform`](Self::transform).
    pub fn screen_to_canvas(&self, point: Point) -> Point {
        let ViewportState { zoom, pan, .. } = self.state;
        Point::new((point.x - pan.x) / zoom, (point.y - pan.y) / zoom)
    }

    pub fn canvas_to_screen(&self, point: Point) -> Point {
        let ViewportState { zoom, pan, .. } = self.state;
        Point::new(point.x * zoom + pan.x, point.y * zoom + pan.y)
    }

    /// Registers the resize and wheel subscriptions, once per surface.
    pub fn bind_listeners(&mut self, registry: &mut ListenerRegistry) -> bool {
        if self.bound {
            return false;
        }
        registry.attach_all(self.surface, &VIEWPORT_EVENTS);
        self.bound = true;
        log::debug!("viewport listeners bound to surface {}", self.surface.raw());
        true
    }

    /// Removes the subscriptions made by [`bind_listeners`](Self::bind_listeners).
    pub fn unbind_listeners(&mut self, registry: &mut ListenerRegistry) {
        if !self.bound {
            return;
        }
        for kind in VIEWPORT_EVENTS {
            registry.detach_kind(self.surface, kind);
        }
        self.bound = false;
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Moves the controller onto a fresh surface; the old surface's listeners are torn down.
    pub fn replace_surface(&mut self, registry: &mut ListenerRegistry) -> SurfaceId {
        registry.detach_surface(self.surface);
        self.surface = registry.create_surface();
        self.bound = false;
        self.surface
    }

    /// Keeps the surface's aspect ratio and scales zoom with the width change
    /// so content keeps its apparent size.
    pub fn on_resize(&mut self, container_width: f64) -> SurfaceDimensions {
        let old_width = self.state.width;
        if container_width.is_nan() || container_width <= 0.0 || container_width == old_width {
            return self.dimensions();
        }

        let factor = container_width / old_width;
        let new_zoom = clamp_zoom(self.state.zoom * factor);
        // Scale pan with the zoom actually applied so the same content stays in view.
        let applied = new_zoom / self.state.zoom;

        self.state.width = container_width;
        self.state.height = container_width / self.state.aspect_ratio;
        self.state.zoom = new_zoom;
        self.state.pan = Point::new(self.state.pan.x * applied, self.state.pan.y * applied);

        log::debug!(
            "resize {old_width:.1} -> {container_width:.1}px, zoom {:.3}",
            self.state.zoom
        );
        self.dimensions()
    }

    /// Changes the zoom by `delta_y / wheel_divisor`, keeping the content
    /// under `cursor` in place. A non-finite delta leaves the zoom alone.
    /// Native scrolling must always be suppressed.
    pub fn on_wheel_zoom(&mut self, delta_y: f64, cursor: Point) -> WheelOutcome {
        let zoom = if delta_y.is_finite() {
            clamp_zoom(self.state.zoom + delta_y / self.wheel_divisor)
        } else {
            self.state.zoom
        };
        self.zoom_to_point(zoom, cursor);
        WheelOutcome { zoom: self.state.zoom, prevent_default: true }
    }

    /// One [`ZOOM_STEP`] in, centre-anchored. Returns the new zoom.
    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.state.zoom + ZOOM_STEP)
    }

    /// One [`ZOOM_STEP`] out, centre-anchored. Returns the new zoom.
    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.state.zoom - ZOOM_STEP)
    }

    /// Sets the zoom anchored at the surface centre.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom_to_point(clamp_zoom(zoom), self.center());
        self.state.zoom
    }

    /// Back to zoom 1 with no pan.
    pub fn reset(&mut self) {
        self.state.zoom = 1.0;
        self.state.pan = Point::ORIGIN;
    }

    /// Applies `zoom` while keeping the canvas point under `anchor` (screen
    /// pixels) fixed on screen.
    fn zoom_to_point(&mut self, zoom: f64, anchor: Point) {
        let zoom = clamp_zoom(zoom);
        let under_anchor = self.screen_to_canvas(anchor);

        self.state.zoom = zoom;
        self.state.pan =
            Point::new(anchor.x - under_anchor.x * zoom, anchor.y - under_anchor.y * zoom);
    }
}
