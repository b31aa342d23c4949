//! Drawing overlay core
//!
//! State model for a PDF drawing surface: the line annotation model, the
//! shape-handler registry, configuration and the session that ties them to
//! a viewport and a rasterized page.

pub mod annotation;
pub mod config;
pub mod handlers;
pub mod session;

pub use annotation::{
    point_label, AnnotationModel, DrawState, LineSegment, LineStyle, MarkerId, MeasurementMarker,
    SegmentId, Tool,
};
pub use config::{ConfigError, DrawboardConfig};
pub use handlers::{ShapeAction, ShapeEvent, ShapeHandler, ShapeHandlerRegistry};
pub use session::{
    BackgroundImage, BackgroundPlacement, DrawingSession, EventResponse, MarkerView, Notice,
    NoticeLevel, Overlay, PageCompletion, PageTicket, RenderList, SegmentView, SessionError,
    SurfaceEvent,
};

pub use drawboard_geometry as geometry;
pub use drawboard_pdf_engine as pdf_engine;
pub use drawboard_viewport as viewport;
