//! Shape-tree walking.
//!
//! A page (slide or notes page) is addressed through three small traits so
//! the walker never inspects raw markup. Adapters over a concrete parser
//! implement them.

use crate::types::TextUnit;

/// A parsed slide or notes page.
pub trait MarkupPage {
    type Shape: MarkupShape;

    /// Shapes in document order, or `None` when the page has no shape tree.
    fn shapes(&self) -> Option<&[Self::Shape]>;
}

/// A shape on a page.
pub trait MarkupShape {
    type Paragraph: MarkupParagraph;

    /// Paragraphs of the shape's text body in document order.
    ///
    /// `None` when the shape has no text body or the body has no paragraph list.
    fn paragraphs(&self) -> Option<&[Self::Paragraph]>;
}

/// A paragraph inside a text body.
pub trait MarkupParagraph {
    /// Text of each run in document order.
    fn runs(&self) -> &[String];

    /// Declared indent level, if any.
    fn indent_level(&self) -> Option<u32>;

    /// Declared bullet character, if any.
    fn bullet_char(&self) -> Option<char>;
}

/// Which kind of page is being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Slide text: plain paragraphs.
    Slide,
    /// Notes text: paragraphs keep their indent level and bullet.
    Notes,
}

/// Walk a page into ordered text units.
///
/// Runs within a paragraph are joined with no separator and paragraphs whose
/// joined text is blank are dropped. A page without a shape tree yields an
/// empty sequence.
pub fn walk_page<P: MarkupPage>(page: &P, mode: WalkMode, page_id: &str) -> Vec<TextUnit> {
    let Some(shapes) = page.shapes() else {
        log::warn!("No text shapes found in {}", page_id);
        return Vec::new();
    };

    let mut units = Vec::new();

    for (idx, shape) in shapes.iter().enumerate() {
        let Some(paragraphs) = shape.paragraphs() else {
            log::debug!("{}: shape {} has no text body", page_id, idx);
            continue;
        };

        for paragraph in paragraphs {
            let text: String = paragraph.runs().concat();
            if text.trim().is_empty() {
                continue;
            }

            let unit = match mode {
                WalkMode::Slide => TextUnit::new(text),
                WalkMode::Notes => TextUnit::with_bullet(
                    text.trim(),
                    paragraph.indent_level().unwrap_or(0),
                    paragraph.bullet_char(),
                ),
            };
            units.push(unit);
        }
    }

    units
}
