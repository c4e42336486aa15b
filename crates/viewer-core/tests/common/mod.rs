#![allow(dead_code)]

use lopdf::{dictionary, Document, Object};
use pdf_engine::{
    DocumentHandle, OpenSource, PageHandle, PageSize, PdfEngine, PdfEngineError, Surface,
};
use std::cell::RefCell;
use std::collections::HashSet;

/// A render the fake engine performed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCall {
    pub page: u32,
    pub scale: f32,
    pub surface_width: u32,
    pub surface_height: u32,
}

/// In-memory engine with scripted page sizes and failures.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pages: Vec<PageSize>,
    fail_open: bool,
    failing_pages: RefCell<HashSet<u32>>,
    renders: RefCell<Vec<RenderCall>>,
    opened: u64,
}

impl ScriptedEngine {
    pub fn with_pages(pages: Vec<PageSize>) -> Self {
        Self { pages, ..Self::default() }
    }

    pub fn uniform(count: usize, size: PageSize) -> Self {
        Self::with_pages(vec![size; count])
    }

    pub fn failing_open() -> Self {
        Self { fail_open: true, ..Self::default() }
    }

    pub fn fail_page(&self, page: u32) {
        self.failing_pages.borrow_mut().insert(page);
    }

    pub fn heal_page(&self, page: u32) {
        self.failing_pages.borrow_mut().remove(&page);
    }

    pub fn renders(&self) -> Vec<RenderCall> {
        self.renders.borrow().clone()
    }

    pub fn rendered_pages(&self) -> Vec<u32> {
        self.renders.borrow().iter().map(|call| call.page).collect()
    }
}

impl PdfEngine for ScriptedEngine {
    fn open(&mut self, _source: OpenSource) -> Result<DocumentHandle, PdfEngineError> {
        if self.fail_open {
            return Err(PdfEngineError::Backend("scripted open failure".to_owned()));
        }

        self.opened += 1;
        Ok(DocumentHandle::from_raw(self.opened))
    }

    fn page_count(&self, _document: DocumentHandle) -> Result<u32, PdfEngineError> {
        Ok(self.pages.len() as u32)
    }

    fn page(
        &self,
        document: DocumentHandle,
        page_number: u32,
    ) -> Result<PageHandle, PdfEngineError> {
        if page_number == 0 || page_number as usize > self.pages.len() {
            return Err(PdfEngineError::PageOutOfRange {
                page: page_number,
                page_count: self.pages.len() as u32,
            });
        }

        Ok(PageHandle::new(document, page_number))
    }

    fn natural_size(&self, page: PageHandle) -> Result<PageSize, PdfEngineError> {
        Ok(self.pages[page.number() as usize - 1])
    }

    fn render(
        &self,
        page: PageHandle,
        scale: f32,
        target: &mut Surface,
    ) -> Result<(), PdfEngineError> {
        if self.failing_pages.borrow().contains(&page.number()) {
            return Err(PdfEngineError::Backend(format!("page {} is corrupt", page.number())));
        }

        self.renders.borrow_mut().push(RenderCall {
            page: page.number(),
            scale,
            surface_width: target.width(),
            surface_height: target.height(),
        });

        Ok(())
    }

    fn close(&mut self, _document: DocumentHandle) -> Result<(), PdfEngineError> {
        Ok(())
    }
}

pub const PORTRAIT: PageSize = PageSize { width_pt: 600.0, height_pt: 800.0 };
pub const WIDE: PageSize = PageSize { width_pt: 1200.0, height_pt: 400.0 };

/// Serializes a PDF whose pages carry the given MediaBox sizes.
pub fn pdf_bytes(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = sizes
        .iter()
        .map(|&(width, height)| {
            let media_box = vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ];
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box,
            }))
        })
        .collect();

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }),
    );

    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf should serialize");
    bytes
}
