//! Data structures describing the logical content of the report page.
//!
//! The layout is kept separate from the PDF renderer so the visible text of a
//! report can be built, compared and inspected without producing any bytes.
//! [`crate::builder::DocumentBuilder`] turns a [`ReportLayout`] into `genpdf`
//! elements.

/// Horizontal placement of a paragraph.
///
/// The variants map directly to [`genpdf::Alignment`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    /// Left aligned content.
    #[default]
    Left,
    /// Center aligned content.
    Center,
    /// Right aligned content.
    Right,
}

impl From<HorizontalAlignment> for genpdf::Alignment {
    fn from(alignment: HorizontalAlignment) -> Self {
        match alignment {
            HorizontalAlignment::Left => genpdf::Alignment::Left,
            HorizontalAlignment::Center => genpdf::Alignment::Center,
            HorizontalAlignment::Right => genpdf::Alignment::Right,
        }
    }
}

/// Face of the report font family used for a paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
}

/// Font face and size for a run of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    font: FontStyle,
    size_pt: u8,
}

impl TextStyle {
    /// Creates a style with the given face and size in points.
    pub fn new(font: FontStyle, size_pt: u8) -> Self {
        Self { font, size_pt }
    }

    pub fn regular(size_pt: u8) -> Self {
        Self::new(FontStyle::Regular, size_pt)
    }

    pub fn bold(size_pt: u8) -> Self {
        Self::new(FontStyle::Bold, size_pt)
    }

    pub fn italic(size_pt: u8) -> Self {
        Self::new(FontStyle::Italic, size_pt)
    }

    /// Returns the font face.
    pub fn font(&self) -> FontStyle {
        self.font
    }

    /// Returns the font size in points.
    pub fn size_pt(&self) -> u8 {
        self.size_pt
    }
}

impl From<TextStyle> for genpdf::style::Style {
    fn from(style: TextStyle) -> Self {
        let base = genpdf::style::Style::new().with_font_size(style.size_pt());
        match style.font() {
            FontStyle::Regular => base,
            FontStyle::Bold => base.bold(),
            FontStyle::Italic => base.italic(),
        }
    }
}

/// Styled paragraph text; wrapped by the renderer when it exceeds the page
/// width.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    text: String,
    style: TextStyle,
    alignment: HorizontalAlignment,
}

impl TextBlock {
    /// Creates a left aligned paragraph.
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            alignment: HorizontalAlignment::Left,
        }
    }

    /// Returns the paragraph text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the style of the paragraph.
    pub fn style(&self) -> TextStyle {
        self.style
    }

    /// Returns the configured alignment.
    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Sets the alignment and returns the updated paragraph.
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Individual content blocks stacked from the top of the page.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Styled paragraph content.
    Text(TextBlock),
    /// Vertical gap measured in lines of the default font size.
    Break(f64),
}

impl Block {
    /// Convenience helper for a left aligned paragraph.
    pub fn paragraph(text: impl Into<String>, style: TextStyle) -> Self {
        Self::Text(TextBlock::new(text, style))
    }

    /// Convenience helper for a centered paragraph.
    pub fn centered(text: impl Into<String>, style: TextStyle) -> Self {
        Self::Text(TextBlock::new(text, style).with_alignment(HorizontalAlignment::Center))
    }

    /// Convenience helper for vertical spacing.
    pub fn spacing(lines: f64) -> Self {
        Self::Break(lines)
    }

    fn text(&self) -> Option<&str> {
        match self {
            Block::Text(block) => Some(block.text()),
            Block::Break(_) => None,
        }
    }
}

/// Ordered list of blocks making up the single report page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReportLayout {
    title: String,
    blocks: Vec<Block>,
}

impl ReportLayout {
    /// Creates an empty layout; `title` becomes the PDF document title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Returns the document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the blocks in top to bottom order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a block and returns the updated layout.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Extends the layout with multiple blocks and returns the updated instance.
    pub fn with_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }

    /// The text of every paragraph, in page order, without spacing.
    pub fn visible_text(&self) -> Vec<&str> {
        self.blocks.iter().filter_map(Block::text).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, FontStyle, HorizontalAlignment, ReportLayout, TextStyle};

    #[test]
    fn visible_text_skips_spacing() {
        let layout = ReportLayout::new("Doc")
            .with_block(Block::centered("Title", TextStyle::bold(24)))
            .with_block(Block::spacing(2.0))
            .with_block(Block::paragraph("Body", TextStyle::regular(14)));

        assert_eq!(layout.visible_text(), vec!["Title", "Body"]);
        assert_eq!(layout.blocks().len(), 3);
    }

    #[test]
    fn centered_sets_alignment() {
        match Block::centered("x", TextStyle::regular(12)) {
            Block::Text(block) => assert_eq!(block.alignment(), HorizontalAlignment::Center),
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn styles_map_onto_genpdf() {
        let bold: genpdf::style::Style = TextStyle::bold(18).into();
        assert!(bold.is_bold());
        assert!(!bold.is_italic());
        assert_eq!(bold.font_size(), 18);

        let italic: genpdf::style::Style = TextStyle::new(FontStyle::Italic, 12).into();
        assert!(italic.is_italic());
        assert!(!italic.is_bold());
    }
}
