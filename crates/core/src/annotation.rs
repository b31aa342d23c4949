//! Line-drawing annotation model
//!
//! Owns the ordered list of committed line segments, the single in-progress
//! segment and the two measurement markers. All coordinates are canvas pixel
//! space (origin top-left, Y down); conversion to logical space happens on
//! read through [`drawboard_geometry::canvas_to_logical`].

use drawboard_geometry::{canvas_to_logical, pixel_distance_between, Point, Quadrant};
use drawboard_viewport::{EventKind, ListenerRegistry, SurfaceId};
use serde::{Deserialize, Serialize};

/// Unique identifier for a line segment
///
/// Generated using UUID v4; also the key into the shape-handler registry.
pub type SegmentId = uuid::Uuid;

/// Stroke used to draw a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    /// Stroke width in canvas pixels
    pub stroke_width: f64,
    /// CSS colour name or hex string, passed through to the surface
    pub color: String,
}

impl LineStyle {
    /// Create a new style
    pub fn new(stroke_width: f64, color: impl Into<String>) -> Self {
        Self { stroke_width, color: color.into() }
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::new(2.0, "red")
    }
}

/// A straight line drawn on the surface
///
/// `start` is fixed at pointer-down; `end` follows the pointer until
/// pointer-up, after which the segment is frozen in the committed list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub id: SegmentId,
    pub start: Point,
    pub end: Point,
    /// Monotonic creation order within one model
    pub created_at: u64,
    pub style: LineStyle,
}

impl LineSegment {
    /// Length in canvas pixels
    pub fn length(&self) -> f64 {
        pixel_distance_between(self.start, self.end)
    }

    /// Midpoint in canvas pixels, used to place distance labels
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(&self.end)
    }
}

/// Format a canvas position the way endpoint labels show it: "(x, y)"
pub fn point_label(point: Point) -> String {
    format!("({}, {})", point.x, point.y)
}

/// Drawing state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing,
}

/// Interaction tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    Line,
}

/// The two draggable measurement markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerId {
    A,
    B,
}

impl MarkerId {
    pub fn label(&self) -> &'static str {
        match self {
            MarkerId::A => "A",
            MarkerId::B => "B",
        }
    }

    fn index(self) -> usize {
        match self {
            MarkerId::A => 0,
            MarkerId::B => 1,
        }
    }
}

/// A draggable reference point, in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementMarker {
    pub id: MarkerId,
    pub position: Point,
}

/// Per-surface annotation state
///
/// Holds the mode and drawing flags as instance state so several
/// independent surfaces can coexist.
#[derive(Debug)]
pub struct AnnotationModel {
    surface: SurfaceId,
    style: LineStyle,
    active_tool: Option<Tool>,
    state: DrawState,
    in_progress: Option<LineSegment>,
    committed: Vec<LineSegment>,
    markers: Option<[MeasurementMarker; 2]>,
    next_order: u64,
}

impl AnnotationModel {
    /// Create an empty model bound to `surface`
    pub fn new(surface: SurfaceId, style: LineStyle) -> Self {
        Self {
            surface,
            style,
            active_tool: None,
            state: DrawState::Idle,
            in_progress: None,
            committed: Vec::new(),
            markers: None,
            next_order: 0,
        }
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn style(&self) -> &LineStyle {
        &self.style
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state == DrawState::Drawing
    }

    pub fn active_tool(&self) -> Option<Tool> {
        self.active_tool
    }

    /// Activate a drawing tool
    ///
    /// Re-activating the tool that is already active is a no-op and returns
    /// `false`. Otherwise any pointer listeners left on the surface are
    /// cleared before one fresh set is registered.
    pub fn activate_tool(&mut self, tool: Tool, registry: &mut ListenerRegistry) -> bool {
        if self.active_tool == Some(tool) {
            return false;
        }

        self.cancel_drawing();
        self.clear_pointer_listeners(registry);
        registry.attach_all(self.surface, &EventKind::POINTER);
        self.active_tool = Some(tool);

        log::debug!("tool {tool:?} activated on surface {}", self.surface.raw());
        true
    }

    /// Deactivate the current tool, discarding any in-progress segment
    pub fn deactivate_tool(&mut self, registry: &mut ListenerRegistry) {
        if self.active_tool.take().is_none() {
            return;
        }
        self.cancel_drawing();
        self.clear_pointer_listeners(registry);
        log::debug!("tool deactivated on surface {}", self.surface.raw());
    }

    /// Follow the session onto a replacement surface
    ///
    /// The old surface's listeners are assumed torn down already. If a tool
    /// was active its pointer listeners are registered once on the new
    /// surface.
    pub fn move_to_surface(&mut self, surface: SurfaceId, registry: &mut ListenerRegistry) {
        self.cancel_drawing();
        self.surface = surface;
        if self.active_tool.is_some() {
            self.clear_pointer_listeners(registry);
            registry.attach_all(surface, &EventKind::POINTER);
        }
    }

    fn clear_pointer_listeners(&self, registry: &mut ListenerRegistry) {
        for kind in EventKind::POINTER {
            registry.detach_kind(self.surface, kind);
        }
    }

    /// Start a segment at `position`
    ///
    /// Ignored (returns `false`) when no tool is active or a segment is
    /// already in progress.
    pub fn pointer_down(&mut self, position: Point) -> bool {
        if self.active_tool != Some(Tool::Line) || self.is_drawing() {
            return false;
        }

        self.next_order += 1;
        self.in_progress = Some(LineSegment {
            id: uuid::Uuid::new_v4(),
            start: position,
            end: position,
            created_at: self.next_order,
            style: self.style.clone(),
        });
        self.state = DrawState::Drawing;
        log::trace!("segment started at ({}, {})", position.x, position.y);
        true
    }

    /// Move the end of the in-progress segment
    pub fn pointer_move(&mut self, position: Point) -> bool {
        match self.in_progress.as_mut() {
            Some(segment) => {
                segment.end = position;
                true
            }
            None => false,
        }
    }

    /// Freeze the in-progress segment at `position` and commit it
    ///
    /// Always leaves the model `Idle`. Returns the committed segment's id.
    pub fn pointer_up(&mut self, position: Point) -> Option<SegmentId> {
        self.state = DrawState::Idle;
        let mut segment = self.in_progress.take()?;
        segment.end = position;

        let id = segment.id;
        log::debug!(
            "segment {id} committed, {:.2}px",
            pixel_distance_between(segment.start, segment.end)
        );
        self.committed.push(segment);
        Some(id)
    }

    /// Escape: drop the in-progress segment without committing it
    pub fn cancel_drawing(&mut self) -> bool {
        self.state = DrawState::Idle;
        match self.in_progress.take() {
            Some(segment) => {
                log::debug!("segment {} discarded", segment.id);
                true
            }
            None => false,
        }
    }

    /// Committed segments in creation order
    pub fn segments(&self) -> &[LineSegment] {
        &self.committed
    }

    pub fn segment(&self, id: SegmentId) -> Option<&LineSegment> {
        self.committed.iter().find(|segment| segment.id == id)
    }

    pub fn in_progress(&self) -> Option<&LineSegment> {
        self.in_progress.as_ref()
    }

    /// Remove a committed segment, preserving the order of the rest
    pub fn remove_segment(&mut self, id: SegmentId) -> Option<LineSegment> {
        let index = self.committed.iter().position(|segment| segment.id == id)?;
        Some(self.committed.remove(index))
    }

    /// One line per committed segment:
    /// "Line N: Start Point (x, y), End Point (x, y)"
    pub fn segment_labels(&self) -> Vec<String> {
        self.committed
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                format!(
                    "Line {}: Start Point {}, End Point {}",
                    index + 1,
                    point_label(segment.start),
                    point_label(segment.end)
                )
            })
            .collect()
    }

    /// Place markers A and B on the X axis, `offset` pixels either side of `origin`
    pub fn init_markers(&mut self, origin: Point, offset: f64) {
        self.markers = Some([
            MeasurementMarker { id: MarkerId::A, position: Point::new(origin.x - offset, origin.y) },
            MeasurementMarker { id: MarkerId::B, position: Point::new(origin.x + offset, origin.y) },
        ]);
    }

    pub fn markers(&self) -> Option<&[MeasurementMarker; 2]> {
        self.markers.as_ref()
    }

    pub fn marker(&self, id: MarkerId) -> Option<&MeasurementMarker> {
        self.markers.as_ref().map(|markers| &markers[id.index()])
    }

    /// Move a marker; returns `false` before markers are initialized
    pub fn drag_marker(&mut self, id: MarkerId, position: Point) -> bool {
        match self.markers.as_mut() {
            Some(markers) => {
                markers[id.index()].position = position;
                true
            }
            None => false,
        }
    }

    /// Marker position in logical coordinates
    pub fn marker_logical(&self, id: MarkerId, origin: Point, scale: f64) -> Option<Point> {
        self.marker(id).map(|marker| canvas_to_logical(marker.position, origin, scale))
    }

    pub fn marker_quadrant(&self, id: MarkerId, origin: Point) -> Option<Quadrant> {
        self.marker_logical(id, origin, 1.0).and_then(Quadrant::of)
    }

    /// Pixel distance between A and B
    pub fn marker_distance(&self) -> Option<f64> {
        self.markers
            .as_ref()
            .map(|[a, b]| pixel_distance_between(a.position, b.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> (ListenerRegistry, AnnotationModel) {
        let mut registry = ListenerRegistry::new();
        let surface = registry.create_surface();
        (registry, AnnotationModel::new(surface, LineStyle::default()))
    }

    fn pointer_listeners(registry: &ListenerRegistry, surface: SurfaceId) -> Vec<usize> {
        EventKind::POINTER.iter().map(|kind| registry.listener_count(surface, *kind)).collect()
    }

    #[test]
    fn test_activation_is_idempotent() {
        let (mut registry, mut model) = model();

        assert!(model.activate_tool(Tool::Line, &mut registry));
        assert!(!model.activate_tool(Tool::Line, &mut registry));

        assert_eq!(pointer_listeners(&registry, model.surface()), vec![1, 1, 1]);
    }

    #[test]
    fn test_activation_clears_stale_listeners() {
        let (mut registry, mut model) = model();
        registry.attach(model.surface(), EventKind::PointerDown);
        registry.attach(model.surface(), EventKind::PointerDown);
        registry.attach(model.surface(), EventKind::Wheel);

        model.activate_tool(Tool::Line, &mut registry);

        assert_eq!(pointer_listeners(&registry, model.surface()), vec![1, 1, 1]);
        assert_eq!(registry.listener_count(model.surface(), EventKind::Wheel), 1);
    }

    #[test]
    fn test_deactivate_removes_listeners() {
        let (mut registry, mut model) = model();
        model.activate_tool(Tool::Line, &mut registry);
        model.pointer_down(Point::new(1.0, 1.0));

        model.deactivate_tool(&mut registry);

        assert_eq!(model.active_tool(), None);
        assert_eq!(model.state(), DrawState::Idle);
        assert!(model.in_progress().is_none());
        assert_eq!(registry.total_listeners(model.surface()), 0);
    }

    #[test]
    fn test_draw_line_lifecycle() {
        let (mut registry, mut model) = model();
        model.activate_tool(Tool::Line, &mut registry);

        assert!(model.pointer_down(Point::new(10.0, 10.0)));
        assert_eq!(model.state(), DrawState::Drawing);
        let segment = model.in_progress().unwrap();
        assert_eq!(segment.start, segment.end);

        assert!(model.pointer_move(Point::new(30.0, 40.0)));
        assert_eq!(model.in_progress().unwrap().start, Point::new(10.0, 10.0));
        assert_eq!(model.in_progress().unwrap().end, Point::new(30.0, 40.0));

        let id = model.pointer_up(Point::new(50.0, 80.0)).unwrap();
        assert_eq!(model.state(), DrawState::Idle);
        assert!(model.in_progress().is_none());

        let committed = model.segment(id).unwrap();
        assert!((committed.length() - 80.62).abs() < 0.01);
        assert_eq!(committed.style, LineStyle::default());
    }

    #[test]
    fn test_events_without_tool_are_ignored() {
        let (_, mut model) = model();

        assert!(!model.pointer_down(Point::new(1.0, 1.0)));
        assert!(!model.pointer_move(Point::new(2.0, 2.0)));
        assert_eq!(model.pointer_up(Point::new(3.0, 3.0)), None);
        assert!(model.segments().is_empty());
    }

    #[test]
    fn test_second_pointer_down_is_ignored() {
        let (mut registry, mut model) = model();
        model.activate_tool(Tool::Line, &mut registry);

        model.pointer_down(Point::new(1.0, 1.0));
        let first = model.in_progress().unwrap().id;
        assert!(!model.pointer_down(Point::new(5.0, 5.0)));
        assert_eq!(model.in_progress().unwrap().id, first);
        assert_eq!(model.in_progress().unwrap().start, Point::new(1.0, 1.0));
    }

    #[test]
    fn test_escape_discards_segment() {
        let (mut registry, mut model) = model();
        model.activate_tool(Tool::Line, &mut registry);

        model.pointer_down(Point::new(1.0, 1.0));
        model.pointer_move(Point::new(9.0, 9.0));
        assert!(model.cancel_drawing());

        assert_eq!(model.state(), DrawState::Idle);
        assert!(model.segments().is_empty());
        assert!(!model.cancel_drawing());

        // The tool stays active.
        assert!(model.pointer_down(Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_segments_keep_creation_order() {
        let (mut registry, mut model) = model();
        model.activate_tool(Tool::Line, &mut registry);

        let mut ids = Vec::new();
        for i in 0..4 {
            let offset = i as f64 * 10.0;
            model.pointer_down(Point::new(offset, 0.0));
            ids.push(model.pointer_up(Point::new(offset, 5.0)).unwrap());
        }

        let removed = model.remove_segment(ids[1]).unwrap();
        assert_eq!(removed.id, ids[1]);
        assert!(model.remove_segment(ids[1]).is_none());

        let remaining: Vec<_> = model.segments().iter().map(|s| s.id).collect();
        assert_eq!(remaining, vec![ids[0], ids[2], ids[3]]);
        assert!(model.segments().windows(2).all(|w| w[0].created_at < w[1].created_at));
    }

    #[test]
    fn test_segment_labels() {
        let (mut registry, mut model) = model();
        model.activate_tool(Tool::Line, &mut registry);

        model.pointer_down(Point::new(10.0, 10.0));
        model.pointer_up(Point::new(50.0, 80.5));
        model.pointer_down(Point::new(0.0, 0.0));
        model.pointer_up(Point::new(1.0, 2.0));

        assert_eq!(
            model.segment_labels(),
            vec![
                "Line 1: Start Point (10, 10), End Point (50, 80.5)".to_string(),
                "Line 2: Start Point (0, 0), End Point (1, 2)".to_string(),
            ]
        );
    }

    #[test]
    fn test_markers() {
        let (_, mut model) = model();
        let origin = Point::new(400.0, 300.0);
        assert!(!model.drag_marker(MarkerId::A, origin));
        assert_eq!(model.marker_distance(), None);

        model.init_markers(origin, 100.0);
        assert_eq!(model.marker(MarkerId::A).unwrap().position, Point::new(300.0, 300.0));
        assert_eq!(model.marker(MarkerId::B).unwrap().position, Point::new(500.0, 300.0));
        assert_eq!(model.marker_distance(), Some(200.0));
        // On the X axis: no quadrant yet.
        assert_eq!(model.marker_quadrant(MarkerId::A, origin), None);

        assert!(model.drag_marker(MarkerId::A, Point::new(350.0, 350.0)));
        assert_eq!(model.marker_logical(MarkerId::A, origin, 1.0), Some(Point::new(-50.0, -50.0)));
        assert_eq!(model.marker_quadrant(MarkerId::A, origin), Some(Quadrant::III));
        assert_eq!(model.marker_logical(MarkerId::B, origin, 2.0), Some(Point::new(50.0, 0.0)));
    }

    #[test]
    fn test_move_to_surface_rebinds_active_tool() {
        let (mut registry, mut model) = model();
        model.activate_tool(Tool::Line, &mut registry);
        model.pointer_down(Point::new(1.0, 1.0));

        let old = model.surface();
        registry.detach_surface(old);
        let new = registry.create_surface();
        model.move_to_surface(new, &mut registry);

        assert!(!model.is_drawing());
        assert_eq!(pointer_listeners(&registry, new), vec![1, 1, 1]);
        assert!(!model.activate_tool(Tool::Line, &mut registry));
    }
}
