//! One drawing surface: viewport, annotations, background page and the
//! paper/ratio selections that turn pixels into real-world distances.

use crate::annotation::{
    point_label, AnnotationModel, LineSegment, LineStyle, MarkerId, SegmentId, Tool,
};
use crate::config::DrawboardConfig;
use crate::handlers::{ShapeAction, ShapeEvent, ShapeHandlerRegistry};
use drawboard_geometry::{
    canvas_to_logical, find_paper_size, ImageDimensions, MeasurementScale, PaperSize, Point,
    Quadrant, ScaleError, ScaleRatio,
};
use drawboard_pdf_engine::{
    DocumentSource, OpenSource, PdfEngine, PdfEngineError, RenderedPage, RgbaImage,
};
use drawboard_viewport::{
    EventKind, ListenerRegistry, SurfaceDimensions, SurfaceId, ViewportController, ViewportState,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Scale(#[from] ScaleError),
    #[error("unknown paper size {0:?}")]
    UnknownPaperSize(String),
    #[error("select a drawing ratio before computing the scale")]
    NoRatioSelected,
    #[error("no document loaded")]
    NoDocument,
    #[error(transparent)]
    Document(#[from] PdfEngineError),
    #[error("failed to serialize render list: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A message the host should show to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Identifies one outstanding page render. Only the ticket from the most
/// recent request can complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
    pub page_number: u32,
}

impl PageTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCompletion {
    Applied,
    /// A newer request, a surface replacement or an unmount superseded the ticket.
    Stale,
    Failed,
}

/// Host input. Positions are screen pixels relative to the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    Wheel { delta_y: f64, cursor: Point },
    Resize { container_width: f64 },
    KeyEscape,
    MarkerDrag { marker: MarkerId, position: Point },
    Shape { id: SegmentId, event: ShapeEvent },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    pub handled: bool,
    /// Suppress the host's native handling (scrolling) for this event.
    pub prevent_default: bool,
}

impl EventResponse {
    fn handled(handled: bool) -> Self {
        Self { handled, prevent_default: false }
    }
}

/// Where the page raster sits in canvas space: scaled to the canvas height
/// and centred horizontally on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackgroundPlacement {
    pub page_number: u32,
    pub total_pages: u32,
    pub image_width: u32,
    pub image_height: u32,
    /// Canvas pixels per image pixel
    pub display_scale: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct BackgroundImage {
    page: RenderedPage,
    placement: BackgroundPlacement,
}

impl BackgroundImage {
    fn place(page: RenderedPage, origin: Point) -> Self {
        let (image_width, image_height) = page.dimensions();
        let canvas_height = origin.y * 2.0;
        let display_scale = canvas_height / image_height.max(1) as f64;
        let width = image_width as f64 * display_scale;

        let placement = BackgroundPlacement {
            page_number: page.page_number,
            total_pages: page.total_pages,
            image_width,
            image_height,
            display_scale,
            x: origin.x - width / 2.0,
            y: 0.0,
            width,
            height: canvas_height,
        };
        Self { page, placement }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.page.image
    }

    pub fn dimensions(&self) -> ImageDimensions {
        ImageDimensions::new(self.placement.image_width, self.placement.image_height)
    }

    pub fn placement(&self) -> &BackgroundPlacement {
        &self.placement
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentView {
    pub id: SegmentId,
    pub start: Point,
    pub end: Point,
    pub style: LineStyle,
    pub start_label: String,
    pub end_label: String,
    pub length_px: f64,
    /// Where the distance label is drawn
    pub label_anchor: Point,
    /// Real-world length, once a measurement scale is active
    pub distance: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub id: MarkerId,
    pub label: &'static str,
    pub position: Point,
    pub logical: Point,
    pub quadrant: Option<Quadrant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    GridLine { from: Point, to: Point },
    Axis { from: Point, to: Point },
}

/// Everything a host surface needs to draw one frame. Coordinates are canvas
/// space; `transform` maps them to the screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderList {
    pub transform: [f64; 6],
    pub surface: SurfaceDimensions,
    pub background: Option<BackgroundPlacement>,
    pub segments: Vec<SegmentView>,
    pub in_progress: Option<SegmentView>,
    pub markers: Vec<MarkerView>,
    pub overlays: Vec<Overlay>,
}

pub struct DrawingSession {
    config: DrawboardConfig,
    registry: ListenerRegistry,
    viewport: ViewportController,
    annotations: AnnotationModel,
    handlers: ShapeHandlerRegistry,
    document: Option<OpenSource>,
    current_page: u32,
    total_pages: Option<u32>,
    background: Option<BackgroundImage>,
    paper: Option<&'static PaperSize>,
    ratio: Option<ScaleRatio>,
    measurement: Option<MeasurementScale>,
    generation: u64,
    selected: Option<SegmentId>,
    notices: Vec<Notice>,
    mounted: bool,
}

impl DrawingSession {
    pub fn new(config: DrawboardConfig, container_width: f64) -> Self {
        let mut registry = ListenerRegistry::new();
        let surface = registry.create_surface();

        let mut viewport = ViewportController::new(surface, container_width, config.aspect_ratio)
            .with_wheel_divisor(config.wheel_divisor);
        viewport.bind_listeners(&mut registry);
        registry.attach(surface, EventKind::KeyDown);

        let style = LineStyle::new(config.line_width, config.line_color.clone());
        let mut annotations = AnnotationModel::new(surface, style);
        annotations.init_markers(viewport.logical_origin(), config.marker_offset);

        log::debug!(
            "session mounted on surface {} ({:.0}x{:.0})",
            surface.raw(),
            viewport.dimensions().width,
            viewport.dimensions().height
        );

        Self {
            config,
            registry,
            viewport,
            annotations,
            handlers: ShapeHandlerRegistry::new(),
            document: None,
            current_page: 1,
            total_pages: None,
            background: None,
            paper: None,
            ratio: None,
            measurement: None,
            generation: 0,
            selected: None,
            notices: Vec::new(),
            mounted: true,
        }
    }

    pub fn config(&self) -> &DrawboardConfig {
        &self.config
    }

    pub fn surface(&self) -> SurfaceId {
        self.viewport.surface()
    }

    pub fn viewport(&self) -> &ViewportState {
        self.viewport.state()
    }

    pub fn viewport_controller(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn annotations(&self) -> &AnnotationModel {
        &self.annotations
    }

    pub fn segments(&self) -> &[LineSegment] {
        self.annotations.segments()
    }

    pub fn segment_labels(&self) -> Vec<String> {
        self.annotations.segment_labels()
    }

    pub fn shape_handlers(&self) -> &ShapeHandlerRegistry {
        &self.handlers
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry.listener_count(self.surface(), kind)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    // Notices

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn warn(&mut self, err: &SessionError) {
        log::warn!("{err}");
        self.notices.push(Notice { level: NoticeLevel::Warning, message: err.to_string() });
    }

    // Selections

    pub fn paper_size(&self) -> Option<&'static PaperSize> {
        self.paper
    }

    pub fn ratio(&self) -> Option<ScaleRatio> {
        self.ratio
    }

    pub fn measurement(&self) -> Option<&MeasurementScale> {
        self.measurement.as_ref()
    }

    pub fn select_paper_size(&mut self, name: &str) -> Result<&'static PaperSize, SessionError> {
        let Some(paper) = find_paper_size(name) else {
            let err = SessionError::UnknownPaperSize(name.to_string());
            self.warn(&err);
            return Err(err);
        };
        self.paper = Some(paper);
        self.refresh_measurement();
        Ok(paper)
    }

    /// Selects an "A:B" drawing ratio. A malformed ratio leaves the previous
    /// selection and scale in place.
    pub fn select_ratio(&mut self, ratio: &str) -> Result<ScaleRatio, SessionError> {
        match ratio.parse::<ScaleRatio>() {
            Ok(parsed) => {
                self.ratio = Some(parsed);
                self.refresh_measurement();
                Ok(parsed)
            }
            Err(err) => {
                let err = SessionError::from(err);
                self.warn(&err);
                Err(err)
            }
        }
    }

    /// Resolves the zoom-to-fit scale for the current selections.
    ///
    /// Missing inputs produce a notice and leave the previous scale active.
    pub fn apply_zoom_to_fit(&mut self) -> Option<f64> {
        match self.resolve_measurement() {
            Ok(scale) => {
                log::debug!("zoom-to-fit scale {:.4}", scale.zoom_to_fit());
                self.notices.push(Notice {
                    level: NoticeLevel::Info,
                    message: format!(
                        "{} at {}: 1px = {}",
                        scale.paper().name,
                        scale.ratio(),
                        scale.format_distance(scale.units_per_pixel())
                    ),
                });
                self.measurement = Some(scale);
                Some(scale.zoom_to_fit())
            }
            Err(err) => {
                self.warn(&err);
                None
            }
        }
    }

    fn resolve_measurement(&self) -> Result<MeasurementScale, SessionError> {
        let paper = self.paper.ok_or(ScaleError::NoPaperSizeSelected)?;
        let image = self
            .background
            .as_ref()
            .map(BackgroundImage::dimensions)
            .filter(|dims| !dims.is_empty())
            .ok_or(ScaleError::NoBackgroundImage)?;
        let ratio = self.ratio.ok_or(SessionError::NoRatioSelected)?;

        Ok(MeasurementScale::new(paper, ratio, image)?)
    }

    fn refresh_measurement(&mut self) {
        self.measurement = self.resolve_measurement().ok();
    }

    /// Real-world length of a committed segment
    pub fn segment_distance(&self, id: SegmentId) -> Option<f64> {
        let segment = self.annotations.segment(id)?;
        self.real_world(segment.length())
    }

    /// Real-world distance between markers A and B
    pub fn marker_distance(&self) -> Option<f64> {
        self.real_world(self.annotations.marker_distance()?)
    }

    fn real_world(&self, canvas_px: f64) -> Option<f64> {
        let scale = self.measurement.as_ref()?;
        let background = self.background.as_ref()?;
        Some(scale.to_real_world(canvas_px / background.placement.display_scale))
    }

    // Document and background

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    pub fn document(&self) -> Option<&OpenSource> {
        self.document.as_ref()
    }

    /// Switches to a new file and requests its first page. Any render still
    /// in flight for the previous file is invalidated.
    pub fn load_document(&mut self, source: impl Into<OpenSource>) -> PageTicket {
        self.document = Some(source.into());
        self.total_pages = None;
        self.request_page(1)
    }

    pub fn request_page(&mut self, page_number: u32) -> PageTicket {
        self.generation += 1;
        log::debug!("page {page_number} requested (generation {})", self.generation);
        PageTicket { generation: self.generation, page_number }
    }

    pub fn next_page(&mut self) -> Option<PageTicket> {
        let total = self.total_pages?;
        (self.current_page < total).then(|| self.request_page(self.current_page + 1))
    }

    pub fn previous_page(&mut self) -> Option<PageTicket> {
        self.total_pages?;
        (self.current_page > 1).then(|| self.request_page(self.current_page - 1))
    }

    /// Applies a finished render if `ticket` is still current. Existing line
    /// segments are kept as they are.
    pub fn complete_page(
        &mut self,
        ticket: PageTicket,
        result: Result<RenderedPage, PdfEngineError>,
    ) -> PageCompletion {
        if !self.mounted || ticket.generation != self.generation {
            log::debug!(
                "discarding stale render of page {} (generation {} != {})",
                ticket.page_number,
                ticket.generation,
                self.generation
            );
            return PageCompletion::Stale;
        }

        match result {
            Ok(page) => {
                self.current_page = page.page_number;
                self.total_pages = Some(page.total_pages);
                self.background = Some(BackgroundImage::place(page, self.viewport.logical_origin()));
                self.refresh_measurement();
                PageCompletion::Applied
            }
            Err(err) => {
                self.warn(&SessionError::Document(err));
                PageCompletion::Failed
            }
        }
    }

    /// Renders the ticket's page from the current document synchronously.
    pub fn fulfill<E: PdfEngine>(
        &mut self,
        ticket: PageTicket,
        source: &mut DocumentSource<E>,
    ) -> Result<PageCompletion, SessionError> {
        let document = self.document.clone().ok_or(SessionError::NoDocument)?;
        let result = source.load_page(document, ticket.page_number);
        Ok(self.complete_page(ticket, result))
    }

    // Surface lifecycle

    /// Moves the session onto a fresh surface. Listeners on the old one are
    /// torn down and pending renders are invalidated.
    pub fn replace_surface(&mut self) -> SurfaceId {
        let surface = self.viewport.replace_surface(&mut self.registry);
        self.viewport.bind_listeners(&mut self.registry);
        self.registry.attach(surface, EventKind::KeyDown);
        self.annotations.move_to_surface(surface, &mut self.registry);
        self.generation += 1;
        self.mounted = true;
        surface
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.annotations.deactivate_tool(&mut self.registry);
        self.viewport.unbind_listeners(&mut self.registry);
        self.registry.detach_surface(self.surface());
        self.generation += 1;
        self.mounted = false;
        log::debug!("session unmounted");
    }

    // Tools and zoom

    pub fn activate_tool(&mut self, tool: Tool) -> bool {
        self.mounted && self.annotations.activate_tool(tool, &mut self.registry)
    }

    pub fn deactivate_tool(&mut self) {
        self.annotations.deactivate_tool(&mut self.registry);
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.viewport.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.viewport.zoom_out()
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.viewport.set_zoom(zoom)
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset();
    }

    pub fn selected(&self) -> Option<SegmentId> {
        self.selected
    }

    pub fn remove_segment(&mut self, id: SegmentId) -> Option<LineSegment> {
        let removed = self.annotations.remove_segment(id)?;
        self.handlers.remove_shape(id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(removed)
    }

    // Events

    fn listening(&self, kind: EventKind) -> bool {
        self.mounted && self.listener_count(kind) > 0
    }

    pub fn handle(&mut self, event: SurfaceEvent) -> EventResponse {
        match event {
            SurfaceEvent::PointerDown(screen) if self.listening(EventKind::PointerDown) => {
                let canvas = self.viewport.screen_to_canvas(screen);
                EventResponse::handled(self.annotations.pointer_down(canvas))
            }
            SurfaceEvent::PointerMove(screen) if self.listening(EventKind::PointerMove) => {
                let canvas = self.viewport.screen_to_canvas(screen);
                EventResponse::handled(self.annotations.pointer_move(canvas))
            }
            SurfaceEvent::PointerUp(screen) if self.listening(EventKind::PointerUp) => {
                let canvas = self.viewport.screen_to_canvas(screen);
                match self.annotations.pointer_up(canvas) {
                    Some(id) => {
                        self.handlers.register_shape(id);
                        EventResponse::handled(true)
                    }
                    None => EventResponse::handled(false),
                }
            }
            SurfaceEvent::Wheel { delta_y, cursor } if self.listening(EventKind::Wheel) => {
                let outcome = self.viewport.on_wheel_zoom(delta_y, cursor);
                EventResponse { handled: true, prevent_default: outcome.prevent_default }
            }
            SurfaceEvent::Resize { container_width } if self.listening(EventKind::Resize) => {
                let before = self.viewport.dimensions();
                EventResponse::handled(self.viewport.on_resize(container_width) != before)
            }
            SurfaceEvent::KeyEscape if self.listening(EventKind::KeyDown) => {
                EventResponse::handled(self.annotations.cancel_drawing())
            }
            SurfaceEvent::MarkerDrag { marker, position } if self.mounted => {
                let canvas = self.viewport.screen_to_canvas(position);
                EventResponse::handled(self.annotations.drag_marker(marker, canvas))
            }
            SurfaceEvent::Shape { id, event } if self.mounted => {
                EventResponse::handled(!self.handle_shape(id, event).is_empty())
            }
            _ => EventResponse::default(),
        }
    }

    /// Dispatches a shape event through the handler registry and applies
    /// the resulting actions.
    pub fn handle_shape(&mut self, id: SegmentId, event: ShapeEvent) -> Vec<ShapeAction> {
        let actions = self.handlers.dispatch(id, event);
        for action in &actions {
            match *action {
                ShapeAction::Select(id) => self.selected = Some(id),
                ShapeAction::Remove(id) => {
                    self.remove_segment(id);
                }
                ShapeAction::Inspect(id) => {
                    if let Some(distance) = self.segment_distance(id) {
                        log::debug!("segment {id}: {distance:.2}in");
                    }
                }
            }
        }
        actions
    }

    // Output

    pub fn render_list(&self) -> RenderList {
        let origin = self.viewport.logical_origin();

        let markers = self
            .annotations
            .markers()
            .map(|markers| {
                markers
                    .iter()
                    .map(|marker| {
                        let logical = canvas_to_logical(marker.position, origin, 1.0);
                        MarkerView {
                            id: marker.id,
                            label: marker.id.label(),
                            position: marker.position,
                            logical,
                            quadrant: Quadrant::of(logical),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        RenderList {
            transform: self.viewport.transform(),
            surface: self.viewport.dimensions(),
            background: self.background.as_ref().map(|bg| bg.placement),
            segments: self.segments().iter().map(|s| self.segment_view(s)).collect(),
            in_progress: self.annotations.in_progress().map(|s| self.segment_view(s)),
            markers,
            overlays: self.overlays(),
        }
    }

    pub fn render_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(&self.render_list())?)
    }

    fn segment_view(&self, segment: &LineSegment) -> SegmentView {
        let length_px = segment.length();
        let distance = self
            .measurement
            .as_ref()
            .zip(self.real_world(length_px))
            .map(|(scale, distance)| scale.format_distance(distance));

        SegmentView {
            id: segment.id,
            start: segment.start,
            end: segment.end,
            style: segment.style.clone(),
            start_label: point_label(segment.start),
            end_label: point_label(segment.end),
            length_px,
            label_anchor: segment.midpoint(),
            distance,
            selected: self.selected == Some(segment.id),
        }
    }

    /// Grid lines aligned to the origin over the visible area, plus the two
    /// axes through the origin.
    fn overlays(&self) -> Vec<Overlay> {
        let origin = self.viewport.logical_origin();
        let dims = self.viewport.dimensions();
        let top_left = self.viewport.screen_to_canvas(Point::ORIGIN);
        let bottom_right = self.viewport.screen_to_canvas(Point::new(dims.width, dims.height));
        let span = (bottom_right.x - top_left.x).max(bottom_right.y - top_left.y);
        let spacing = visible_grid_spacing(self.config.grid_spacing, span);

        let mut overlays = Vec::new();
        if spacing.is_finite() && spacing > 0.0 {
            for x in grid_positions(origin.x, top_left.x, bottom_right.x, spacing) {
                overlays.push(Overlay::GridLine {
                    from: Point::new(x, top_left.y),
                    to: Point::new(x, bottom_right.y),
                });
            }
            for y in grid_positions(origin.y, top_left.y, bottom_right.y, spacing) {
                overlays.push(Overlay::GridLine {
                    from: Point::new(top_left.x, y),
                    to: Point::new(bottom_right.x, y),
                });
            }
        }

        overlays.push(Overlay::Axis {
            from: Point::new(top_left.x, origin.y),
            to: Point::new(bottom_right.x, origin.y),
        });
        overlays.push(Overlay::Axis {
            from: Point::new(origin.x, top_left.y),
            to: Point::new(origin.x, bottom_right.y),
        });
        overlays
    }
}

/// Most grid lines drawn along one axis.
const MAX_GRID_LINES: f64 = 256.0;

/// Doubles `spacing` until at most [`MAX_GRID_LINES`] fit into `span`.
fn visible_grid_spacing(spacing: f64, span: f64) -> f64 {
    if !(spacing.is_finite() && spacing > 0.0 && span.is_finite()) {
        return spacing;
    }
    let mut spacing = spacing;
    while span / spacing > MAX_GRID_LINES {
        spacing *= 2.0;
    }
    spacing
}

/// Positions `origin + k * spacing` inside `[min, max]`, excluding the origin
/// itself (drawn as an axis).
fn grid_positions(origin: f64, min: f64, max: f64, spacing: f64) -> Vec<f64> {
    let first = ((min - origin) / spacing).ceil() as i64;
    let last = ((max - origin) / spacing).floor() as i64;
    (first..=last).filter(|k| *k != 0).map(|k| origin + k as f64 * spacing).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn session() -> DrawingSession {
        DrawingSession::new(DrawboardConfig::default(), 800.0)
    }

    fn page(width: u32, height: u32, page_number: u32, total_pages: u32) -> RenderedPage {
        RenderedPage {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
            page_number,
            total_pages,
        }
    }

    #[test]
    fn new_session_binds_listeners_once() {
        let session = session();
        assert_eq!(session.listener_count(EventKind::Resize), 1);
        assert_eq!(session.listener_count(EventKind::Wheel), 1);
        assert_eq!(session.listener_count(EventKind::KeyDown), 1);
        assert_eq!(session.listener_count(EventKind::PointerDown), 0);

        let markers = session.annotations().markers().unwrap();
        assert_eq!(markers[0].position, Point::new(300.0, 300.0));
        assert_eq!(markers[1].position, Point::new(500.0, 300.0));
    }

    #[test]
    fn zoom_to_fit_reports_missing_inputs() {
        let mut session = session();

        assert_eq!(session.apply_zoom_to_fit(), None);
        session.select_paper_size("ARCH A").unwrap();
        assert_eq!(session.apply_zoom_to_fit(), None);

        let ticket = session.request_page(1);
        session.complete_page(ticket, Ok(page(1000, 1000, 1, 1)));
        assert_eq!(session.apply_zoom_to_fit(), None);

        let notices = session.take_notices();
        assert_eq!(notices.len(), 3);
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Warning));
        assert_eq!(notices[0].message, ScaleError::NoPaperSizeSelected.to_string());
        assert_eq!(notices[1].message, ScaleError::NoBackgroundImage.to_string());
        assert_eq!(notices[2].message, SessionError::NoRatioSelected.to_string());
        assert!(session.notices().is_empty());

        session.select_ratio("1:10").unwrap();
        let zoom = session.apply_zoom_to_fit().unwrap();
        assert!((zoom - 6.48).abs() < 1e-9);
    }

    #[test]
    fn invalid_ratio_keeps_previous_scale() {
        let mut session = session();
        session.select_paper_size("ARCH A").unwrap();
        session.select_ratio("1:10").unwrap();
        let ticket = session.request_page(1);
        session.complete_page(ticket, Ok(page(648, 864, 1, 1)));
        let before = session.measurement().copied();
        assert!(before.is_some());

        assert!(matches!(
            session.select_ratio("abc"),
            Err(SessionError::Scale(ScaleError::InvalidRatioFormat(_)))
        ));
        assert_eq!(session.measurement().copied(), before);
        assert_eq!(session.ratio().map(|r| r.to_string()), Some("1:10".to_string()));
        assert_eq!(session.notices().len(), 1);
    }

    #[test]
    fn unknown_paper_size_is_rejected() {
        let mut session = session();
        assert!(matches!(
            session.select_paper_size("Letter"),
            Err(SessionError::UnknownPaperSize(name)) if name == "Letter"
        ));
        assert!(session.paper_size().is_none());
    }

    #[test]
    fn background_is_scaled_to_canvas_height_and_centred() {
        let mut session = session();
        let ticket = session.request_page(1);
        assert_eq!(session.complete_page(ticket, Ok(page(300, 1200, 1, 2))), PageCompletion::Applied);

        let placement = *session.background().unwrap().placement();
        assert_eq!(placement.height, 600.0);
        assert_eq!(placement.display_scale, 0.5);
        assert_eq!(placement.width, 150.0);
        assert_eq!(placement.x, 325.0);
        assert_eq!(session.total_pages(), Some(2));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut session = session();
        let first = session.request_page(1);
        let second = session.request_page(2);

        assert_eq!(session.complete_page(first, Ok(page(10, 10, 1, 2))), PageCompletion::Stale);
        assert!(session.background().is_none());
        assert!(session.notices().is_empty());

        assert_eq!(session.complete_page(second, Ok(page(10, 10, 2, 2))), PageCompletion::Applied);
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn failed_render_pushes_notice() {
        let mut session = session();
        let ticket = session.request_page(5);
        let result = Err(PdfEngineError::PageOutOfRange { page: 5, page_count: 2 });

        assert_eq!(session.complete_page(ticket, result), PageCompletion::Failed);
        assert_eq!(session.notices().len(), 1);
        assert!(session.background().is_none());
    }

    #[test]
    fn page_navigation_stays_in_range() {
        let mut session = session();
        assert!(session.next_page().is_none());

        let ticket = session.request_page(1);
        session.complete_page(ticket, Ok(page(10, 10, 1, 2)));
        assert!(session.previous_page().is_none());

        let next = session.next_page().unwrap();
        assert_eq!(next.page_number, 2);
        session.complete_page(next, Ok(page(10, 10, 2, 2)));
        assert!(session.next_page().is_none());
        assert_eq!(session.previous_page().unwrap().page_number, 1);
    }

    #[test]
    fn pointer_events_need_an_active_tool() {
        let mut session = session();
        assert!(!session.handle(SurfaceEvent::PointerDown(Point::new(1.0, 1.0))).handled);

        session.activate_tool(Tool::Line);
        assert!(session.handle(SurfaceEvent::PointerDown(Point::new(1.0, 1.0))).handled);
    }

    #[test]
    fn wheel_prevents_default_and_resize_scales_zoom() {
        let mut session = session();
        let response =
            session.handle(SurfaceEvent::Wheel { delta_y: 500.0, cursor: Point::new(0.0, 0.0) });
        assert_eq!(response, EventResponse { handled: true, prevent_default: true });
        assert!((session.viewport().zoom - 1.5).abs() < 1e-12);

        assert!(session.handle(SurfaceEvent::Resize { container_width: 400.0 }).handled);
        assert!((session.viewport().zoom - 0.75).abs() < 1e-12);
        assert_eq!(session.viewport().height, 300.0);
        assert!(!session.handle(SurfaceEvent::Resize { container_width: 400.0 }).handled);
    }

    #[test]
    fn overlays_have_two_axes_through_origin() {
        let mut session = session();
        session.set_zoom(2.0);
        let overlays = session.render_list().overlays;

        let axes: Vec<_> =
            overlays.iter().filter(|o| matches!(o, Overlay::Axis { .. })).collect();
        assert_eq!(axes.len(), 2);
        assert_eq!(
            axes[0],
            &Overlay::Axis { from: Point::new(200.0, 300.0), to: Point::new(600.0, 300.0) }
        );

        // Visible area at 2x is 400x300 canvas px: 8 vertical and 6 horizontal grid lines.
        assert_eq!(overlays.len() - 2, 8 + 6);
    }

    #[test]
    fn dense_grid_is_coarsened() {
        let config = DrawboardConfig { grid_spacing: 1e-6, ..DrawboardConfig::default() };
        let mut session = DrawingSession::new(config, 800.0);
        session.set_zoom(0.1);

        let overlays = session.render_list().overlays;
        let grid = overlays.iter().filter(|o| matches!(o, Overlay::GridLine { .. })).count();
        assert!(grid > 0);
        assert!(grid <= 2 * (MAX_GRID_LINES as usize + 1), "{grid} grid lines");

        assert_eq!(visible_grid_spacing(50.0, 800.0), 50.0);
        assert_eq!(visible_grid_spacing(1.0, 1024.0), 4.0);
    }

    #[test]
    fn grid_positions_skip_origin() {
        assert_eq!(grid_positions(100.0, 0.0, 200.0, 50.0), vec![0.0, 50.0, 150.0, 200.0]);
        assert_eq!(grid_positions(100.0, 101.0, 149.0, 50.0), Vec::<f64>::new());
    }

    #[test]
    fn unmount_detaches_everything() {
        let mut session = session();
        session.activate_tool(Tool::Line);
        let ticket = session.request_page(1);

        session.unmount();
        assert!(!session.is_mounted());
        for kind in [EventKind::PointerDown, EventKind::Wheel, EventKind::Resize, EventKind::KeyDown]
        {
            assert_eq!(session.listener_count(kind), 0);
        }
        assert_eq!(session.complete_page(ticket, Ok(page(10, 10, 1, 1))), PageCompletion::Stale);
        assert!(!session.handle(SurfaceEvent::Wheel { delta_y: 1.0, cursor: Point::ORIGIN }).handled);
        assert!(!session.activate_tool(Tool::Line));
    }
}
