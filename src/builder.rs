//! Document construction helpers for the report page.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use genpdf::elements::{Break, Paragraph};
use genpdf::error::Error;
use genpdf::style::{Style, StyledString};
use genpdf::{Margins, Mm, PageDecorator, Size};
use log::debug;
use thiserror::Error;

use crate::fonts;
use crate::model::{Block, ReportLayout};

/// A4 portrait in millimetres.
pub const A4: (f64, f64) = (210.0, 297.0);

pub const DEFAULT_MARGIN_MM: f64 = 10.0;

const LINE_SPACING: f64 = 1.4;

/// Errors raised while turning a [`ReportLayout`] into PDF bytes.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no usable font family found; searched {searched}")]
    FontsUnavailable { searched: String },
    #[error("failed to load font {}", path.display())]
    Font {
        path: PathBuf,
        #[source]
        source: Error,
    },
    #[error("report does not fit on a single page ({pages} pages needed)")]
    PageOverflow { pages: usize },
    #[error("PDF rendering failed")]
    Pdf(#[source] Error),
}

fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Builder for single-page PDF documents rendered from a [`ReportLayout`].
#[derive(Default)]
pub struct DocumentBuilder {
    paper_size: Option<(f64, f64)>,
    margin_mm: Option<f64>,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the paper size (width, height) in millimetres.
    pub fn with_paper_size(mut self, paper_size: (f64, f64)) -> Self {
        self.paper_size = Some(paper_size);
        self
    }

    /// Sets the same margin on all four sides, in millimetres.
    pub fn with_margins(mut self, margin_mm: f64) -> Self {
        self.margin_mm = Some(margin_mm);
        self
    }

    /// Builds a `genpdf::Document` holding the layout's paragraphs.
    ///
    /// The returned counter is advanced once per rendered page.
    fn build(
        self,
        layout: &ReportLayout,
    ) -> Result<(genpdf::Document, Rc<Cell<usize>>), DocumentError> {
        let font_family = fonts::default_font_family()?;
        let mut document = genpdf::Document::new(font_family);
        document.set_title(layout.title());
        document.set_line_spacing(LINE_SPACING);

        let (width, height) = self.paper_size.unwrap_or(A4);
        document.set_paper_size(Size::new(mm(width), mm(height)));

        let pages = Rc::new(Cell::new(0));
        document.set_page_decorator(CountingPageDecorator {
            pages: Rc::clone(&pages),
            margins: Margins::all(mm(self.margin_mm.unwrap_or(DEFAULT_MARGIN_MM))),
        });

        for block in layout.blocks() {
            match block {
                Block::Text(text) => {
                    let style = Style::from(text.style());
                    let styled = StyledString::new(text.text().to_owned(), style);
                    document.push(Paragraph::new(styled).aligned(text.alignment().into()));
                }
                Block::Break(lines) => document.push(Break::new(*lines)),
            }
        }

        Ok((document, pages))
    }

    /// Renders the layout and returns the PDF bytes.
    ///
    /// Fails with [`DocumentError::PageOverflow`] when `genpdf` needed more
    /// than one page for the content.
    pub fn render(self, layout: &ReportLayout) -> Result<Vec<u8>, DocumentError> {
        let (document, pages) = self.build(layout)?;

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(DocumentError::Pdf)?;

        let pages = pages.get();
        debug!("rendered {} blocks on {pages} page(s)", layout.blocks().len());
        if pages > 1 {
            return Err(DocumentError::PageOverflow { pages });
        }
        Ok(bytes)
    }
}

/// Applies the page margins and counts the pages `genpdf` starts.
struct CountingPageDecorator {
    pages: Rc<Cell<usize>>,
    margins: Margins,
}

impl PageDecorator for CountingPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        _style: Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.pages.set(self.pages.get() + 1);
        area.add_margins(self.margins);
        Ok(area)
    }
}
