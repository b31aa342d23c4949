use image::{ImageBuffer, Rgba};
use lopdf::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// US Letter, used when a page carries no usable MediaBox.
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

/// Longest raster side the engines will allocate.
pub const MAX_RASTER_SIDE: u32 = 16_384;

/// Pixel budget for a single page raster (256 MiB of RGBA).
pub const MAX_RASTER_PIXELS: u64 = 64 * 1024 * 1024;

const PAGE_BORDER: Rgba<u8> = Rgba([220, 220, 220, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// Rebuilds a handle from a value previously returned by [`raw`](Self::raw).
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Rasterize `page_index` (0-based) at `scale` pixels per point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page_index: u32,
    pub scale: f32,
}

impl RenderRequest {
    pub fn page(page_index: u32) -> Self {
        Self { page_index, scale: 1.0 }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    fn effective_scale(&self) -> f32 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OpenSource {
    fn from(value: PathBuf) -> Self {
        Self::Path(value)
    }
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

impl From<Vec<u8>> for OpenSource {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("document has no pages")]
    NoPages,
    #[error("page raster {width_px}x{height_px} exceeds the {max_side}px / {max_pixels} pixel limit")]
    PageTooLarge { width_px: f64, height_px: f64, max_side: u32, max_pixels: u64 },
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn page_size(&self, handle: DocumentHandle, page_index: u32)
        -> Result<PageSize, PdfEngineError>;
    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError>;
    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError>;
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    bytes: Vec<u8>,
    page_sizes: Vec<PageSize>,
}

/// Pure-Rust engine: reads page geometry with lopdf and produces a blank
/// page-sized raster. Enough for measuring; use `pdfium` for real content.
#[derive(Debug, Default)]
pub struct LopdfEngine {
    next_handle: u64,
    docs: HashMap<DocumentHandle, DocumentRecord>,
}

impl LopdfEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, PdfEngineError> {
        if bytes.windows(b"/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(bytes)?;
        let sizes = doc
            .get_pages()
            .into_values()
            .map(|object_id| {
                doc.get_dictionary(object_id)
                    .ok()
                    .and_then(|dict| dict.get(b"MediaBox").ok())
                    .and_then(|obj| obj.as_array().ok())
                    .and_then(|array| media_box_size(array))
                    .unwrap_or(DEFAULT_PAGE_SIZE)
            })
            .collect::<Vec<_>>();

        if sizes.is_empty() {
            return Err(PdfEngineError::NoPages);
        }
        Ok(sizes)
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, PdfEngineError> {
        self.docs.get(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }

    /// Raw bytes of an open document, for engines layered on top of this one.
    pub fn document_bytes(&self, handle: DocumentHandle) -> Result<&[u8], PdfEngineError> {
        Ok(&self.record(handle)?.bytes)
    }
}

fn media_box_size(array: &[lopdf::Object]) -> Option<PageSize> {
    let [x0, y0, x1, y1] = array else {
        return None;
    };
    let width_pt = (x1.as_float().ok()? - x0.as_float().ok()?).abs();
    let height_pt = (y1.as_float().ok()? - y0.as_float().ok()?).abs();
    (width_pt > 0.0 && height_pt > 0.0).then_some(PageSize { width_pt, height_pt })
}

/// Pixel size of a page rendered at `scale`, never smaller than 1x1.
///
/// Fails with [`PdfEngineError::PageTooLarge`] before anything is allocated
/// when either side exceeds [`MAX_RASTER_SIDE`] or the area exceeds
/// [`MAX_RASTER_PIXELS`].
pub fn raster_size(page: PageSize, scale: f32) -> Result<(u32, u32), PdfEngineError> {
    let width = (f64::from(page.width_pt) * f64::from(scale)).round().max(1.0);
    let height = (f64::from(page.height_pt) * f64::from(scale)).round().max(1.0);

    let side = f64::from(MAX_RASTER_SIDE);
    let fits = width.is_finite()
        && height.is_finite()
        && width <= side
        && height <= side
        && width * height <= MAX_RASTER_PIXELS as f64;
    if !fits {
        return Err(PdfEngineError::PageTooLarge {
            width_px: width,
            height_px: height,
            max_side: MAX_RASTER_SIDE,
            max_pixels: MAX_RASTER_PIXELS,
        });
    }

    Ok((width as u32, height as u32))
}

impl PdfEngine for LopdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        let bytes = match source {
            OpenSource::Path(path) => fs::read(path)?,
            OpenSource::Bytes(bytes) => bytes,
        };

        let page_sizes = Self::parse_sizes(&bytes)?;

        self.next_handle += 1;
        let handle = DocumentHandle(self.next_handle);
        log::debug!("opened document {} with {} pages", handle.raw(), page_sizes.len());
        self.docs.insert(handle, DocumentRecord { bytes, page_sizes });

        Ok(handle)
    }

    fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.record(handle)?.page_sizes.len() as u32)
    }

    fn page_size(
        &self,
        handle: DocumentHandle,
        page_index: u32,
    ) -> Result<PageSize, PdfEngineError> {
        let record = self.record(handle)?;
        record.page_sizes.get(page_index as usize).copied().ok_or(PdfEngineError::PageOutOfRange {
            page: page_index,
            page_count: record.page_sizes.len() as u32,
        })
    }

    fn render_page(
        &self,
        handle: DocumentHandle,
        request: RenderRequest,
    ) -> Result<RgbaImage, PdfEngineError> {
        let page_size = self.page_size(handle, request.page_index)?;
        let (width, height) = raster_size(page_size, request.effective_scale())?;

        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, PAGE_BORDER);
                image.put_pixel(x, height - 1, PAGE_BORDER);
            }
            for y in 0..height {
                image.put_pixel(0, y, PAGE_BORDER);
                image.put_pixel(width - 1, y, PAGE_BORDER);
            }
        }

        Ok(image)
    }

    fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
        self.docs.remove(&handle).map(|_| ()).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
}

#[cfg(feature = "pdfium")]
pub mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude::*;

    /// Rasterizes through PDFium; page geometry still comes from lopdf.
    pub struct PdfiumEngine {
        pdfium: Pdfium,
        inner: LopdfEngine,
    }

    impl PdfiumEngine {
        pub fn from_system_library() -> Result<Self, PdfEngineError> {
            let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "./",
            ))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                PdfEngineError::Backend(format!("failed to bind pdfium library: {err}"))
            })?;

            Ok(Self { pdfium: Pdfium::new(bindings), inner: LopdfEngine::new() })
        }
    }

    impl PdfEngine for PdfiumEngine {
        fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
            self.inner.open(source)
        }

        fn page_count(&self, handle: DocumentHandle) -> Result<u32, PdfEngineError> {
            self.inner.page_count(handle)
        }

        fn page_size(
            &self,
            handle: DocumentHandle,
            page_index: u32,
        ) -> Result<PageSize, PdfEngineError> {
            self.inner.page_size(handle, page_index)
        }

        fn render_page(
            &self,
            handle: DocumentHandle,
            request: RenderRequest,
        ) -> Result<RgbaImage, PdfEngineError> {
            let page_size = self.inner.page_size(handle, request.page_index)?;
            let (width, height) = raster_size(page_size, request.effective_scale())?;
            let backend = |err: PdfiumError| PdfEngineError::Backend(err.to_string());

            let bytes = self.inner.document_bytes(handle)?;
            let document = self.pdfium.load_pdf_from_byte_slice(bytes, None).map_err(backend)?;
            let page_index = u16::try_from(request.page_index).map_err(|_| {
                PdfEngineError::PageOutOfRange {
                    page: request.page_index,
                    page_count: u16::MAX as u32,
                }
            })?;
            let page = document.pages().get(page_index).map_err(backend)?;

            let config = PdfRenderConfig::new()
                .set_target_width(width as i32)
                .set_target_height(height as i32);
            let bitmap = page.render_with_config(&config).map_err(backend)?;

            let (out_width, out_height) = (bitmap.width() as u32, bitmap.height() as u32);
            RgbaImage::from_raw(out_width, out_height, bitmap.as_rgba_bytes().to_vec()).ok_or_else(
                || PdfEngineError::Backend("pdfium returned a short bitmap".to_owned()),
            )
        }

        fn close(&mut self, handle: DocumentHandle) -> Result<(), PdfEngineError> {
            self.inner.close(handle)
        }
    }
}

pub fn default_engine() -> LopdfEngine {
    LopdfEngine::new()
}

/// A rasterized page ready to be used as a drawing background.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: RgbaImage,
    /// 1-based.
    pub page_number: u32,
    pub total_pages: u32,
}

impl RenderedPage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Turns (file, page number) into a background raster plus the page count.
pub struct DocumentSource<E: PdfEngine = LopdfEngine> {
    engine: E,
    render_scale: f32,
}

impl Default for DocumentSource<LopdfEngine> {
    fn default() -> Self {
        Self::new(default_engine())
    }
}

impl<E: PdfEngine> DocumentSource<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, render_scale: 1.0 }
    }

    pub fn with_render_scale(mut self, scale: f32) -> Self {
        if scale.is_finite() && scale > 0.0 {
            self.render_scale = scale;
        }
        self
    }

    pub fn render_scale(&self) -> f32 {
        self.render_scale
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Loads and rasterizes one page. `page_number` is 1-based.
    pub fn load_page(
        &mut self,
        source: impl Into<OpenSource>,
        page_number: u32,
    ) -> Result<RenderedPage, PdfEngineError> {
        let handle = self.engine.open(source.into())?;
        let rendered = self.render_open(handle, page_number);
        self.engine.close(handle)?;
        rendered
    }

    fn render_open(
        &self,
        handle: DocumentHandle,
        page_number: u32,
    ) -> Result<RenderedPage, PdfEngineError> {
        let total_pages = self.engine.page_count(handle)?;
        if page_number == 0 || page_number > total_pages {
            return Err(PdfEngineError::PageOutOfRange { page: page_number, page_count: total_pages });
        }

        let request = RenderRequest::page(page_number - 1).with_scale(self.render_scale);
        let image = self.engine.render_page(handle, request)?;
        log::debug!(
            "rendered page {page_number}/{total_pages} at {}x{}",
            image.width(),
            image.height()
        );

        Ok(RenderedPage { image, page_number, total_pages })
    }
}
