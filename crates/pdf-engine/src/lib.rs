use image::{ImageBuffer, Rgba};
use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

mod surface;

pub use surface::Surface;

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// US Letter, used when a page carries no usable box.
const DEFAULT_PAGE_SIZE: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

/// Guards the `/Parent` walk against cyclic page trees.
const MAX_INHERITANCE_DEPTH: usize = 32;

const PAGE_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const PAGE_BORDER: Rgba<u8> = Rgba([220, 220, 220, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A page of an open document, addressed by its 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHandle {
    document: DocumentHandle,
    number: u32,
}

impl PageHandle {
    pub fn new(document: DocumentHandle, number: u32) -> Self {
        Self { document, number }
    }

    pub fn document(self) -> DocumentHandle {
        self.document
    }

    pub fn number(self) -> u32 {
        self.number
    }
}

/// Natural (unscaled) page size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self { width_pt, height_pt }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width_pt > 0.0 && self.height_pt > 0.0)
    }

    fn rotated(self) -> Self {
        Self { width_pt: self.height_pt, height_pt: self.width_pt }
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
    #[error("backend error: {0}")]
    Backend(String),
}

/// The document engine the viewer drives.
///
/// Page numbers are 1-based throughout. `render` draws into a caller-owned
/// surface so the caller controls the backing resolution.
pub trait PdfEngine {
    fn open(&mut self, source: OpenSource) -> Result<DocumentHandle, PdfEngineError>;
    fn page_count(&self, document: DocumentHandle) -> Result<u32, PdfEngineError>;
    fn page(&self, document: DocumentHandle, page_number: u32)
        -> Result<PageHandle, PdfEngineError>;
    fn natural_size(&self, page: PageHandle) -> Result<PageSize, PdfEngineError>;
    fn render(
        &self,
        page: PageHandle,
        scale: f32,
        target: &mut Surface,
    ) -> Result<(), PdfEngineError>;
    fn close(&mut self, document: DocumentHandle) -> Result<(), PdfEngineError>;
}

#[derive(Debug, Clone)]
struct DocumentRecord {
    page_sizes: Vec<PageSize>,
}

/// Engine backed by `lopdf` for structure and a flat placeholder rasterizer.
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
        let doc = Document::load_mem(bytes)?;
        if doc.is_encrypted() {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            sizes.push(page_size_of(&doc, object_id)?);
        }

        if sizes.is_empty() {
            return Err(PdfEngineError::Backend("document has no pages".to_owned()));
        }

        Ok(sizes)
    }

    fn record(&self, handle: DocumentHandle) -> Result<&DocumentRecord, PdfEngineError> {
        self.docs.get(&handle).ok_or(PdfEngineError::InvalidHandle(handle.raw()))
    }
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
        debug!("opened document {} with {} pages", handle.raw(), page_sizes.len());
        self.docs.insert(handle, DocumentRecord { page_sizes });

        Ok(handle)
    }

    fn page_count(&self, document: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.record(document)?.page_sizes.len() as u32)
    }

    fn page(
        &self,
        document: DocumentHandle,
        page_number: u32,
    ) -> Result<PageHandle, PdfEngineError> {
        let page_count = self.page_count(document)?;

        if page_number == 0 || page_number > page_count {
            return Err(PdfEngineError::PageOutOfRange { page: page_number, page_count });
        }

        Ok(PageHandle::new(document, page_number))
    }

    fn natural_size(&self, page: PageHandle) -> Result<PageSize, PdfEngineError> {
        let record = self.record(page.document())?;
        page.number()
            .checked_sub(1)
            .and_then(|index| record.page_sizes.get(index as usize))
            .copied()
            .ok_or(PdfEngineError::PageOutOfRange {
                page: page.number(),
                page_count: record.page_sizes.len() as u32,
            })
    }

    fn render(
        &self,
        page: PageHandle,
        scale: f32,
        target: &mut Surface,
    ) -> Result<(), PdfEngineError> {
        let size = self.natural_size(page)?;

        if scale <= 0.0 || !scale.is_finite() {
            return Err(PdfEngineError::Backend(format!("invalid render scale {scale}")));
        }

        let width = ((size.width_pt * scale).round().max(1.0) as u32).min(target.width());
        let height = ((size.height_pt * scale).round().max(1.0) as u32).min(target.height());

        target.fill(Rgba([0, 0, 0, 0]));
        let image = target.pixels_mut();

        for y in 0..height {
            for x in 0..width {
                image.put_pixel(x, y, PAGE_FILL);
            }
        }

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

        Ok(())
    }

    fn close(&mut self, document: DocumentHandle) -> Result<(), PdfEngineError> {
        self.docs
            .remove(&document)
            .map(|_| ())
            .ok_or(PdfEngineError::InvalidHandle(document.raw()))
    }
}

/// Resolves a page's displayed size: MediaBox (or CropBox), inherited through
/// the page tree, with /Rotate 90 and 270 swapping the axes.
fn page_size_of(doc: &Document, page_id: ObjectId) -> Result<PageSize, PdfEngineError> {
    let page = doc.get_dictionary(page_id)?;

    let size = inherited(doc, page, b"MediaBox")
        .or_else(|| inherited(doc, page, b"CropBox"))
        .and_then(|object| box_size(doc, object))
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let rotation = inherited(doc, page, b"Rotate")
        .and_then(|object| resolve(doc, object).as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360);

    Ok(if rotation == 90 || rotation == 270 { size.rotated() } else { size })
}

fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }

        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }

    None
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn box_size(doc: &Document, object: &Object) -> Option<PageSize> {
    let array = resolve(doc, object).as_array().ok()?;
    if array.len() != 4 {
        return None;
    }

    let coord = |index: usize| resolve(doc, &array[index]).as_float().ok();
    let (x0, y0, x1, y1) = (coord(0)?, coord(1)?, coord(2)?, coord(3)?);
    let size = PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() };

    (!size.is_empty()).then_some(size)
}
