//! Slide and notes-page markup parsing.
//!
//! Builds a small typed tree (shapes → paragraphs → runs) from a
//! `p:sld`/`p:notes` part. Only the nodes needed for text extraction are
//! kept, and a node that is missing in the markup stays `None` in the tree so
//! the walker can tell "absent" from "empty".

use deck_core::{Error, MarkupPage, MarkupParagraph, MarkupShape, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A parsed slide or notes page.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageNode {
    /// Direct shapes of the page's shape tree, `None` without a shape tree.
    pub shapes: Option<Vec<ShapeNode>>,
}

/// A `p:sp` shape.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShapeNode {
    /// Paragraphs of `p:txBody`, `None` when there is no text body.
    pub paragraphs: Option<Vec<ParagraphNode>>,
}

/// An `a:p` paragraph.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParagraphNode {
    /// Text of each `a:r` run.
    pub runs: Vec<String>,
    /// `lvl` attribute of `a:pPr`.
    pub level: Option<u32>,
    /// `char` attribute of `a:pPr/a:buChar`.
    pub bullet: Option<char>,
}

impl MarkupPage for PageNode {
    type Shape = ShapeNode;

    fn shapes(&self) -> Option<&[ShapeNode]> {
        self.shapes.as_deref()
    }
}

impl MarkupShape for ShapeNode {
    type Paragraph = ParagraphNode;

    fn paragraphs(&self) -> Option<&[ParagraphNode]> {
        self.paragraphs.as_deref()
    }
}

impl MarkupParagraph for ParagraphNode {
    fn runs(&self) -> &[String] {
        &self.runs
    }

    fn indent_level(&self) -> Option<u32> {
        self.level
    }

    fn bullet_char(&self) -> Option<char> {
        self.bullet
    }
}

/// Parse the XML of one slide or notes page.
pub fn parse_page(xml: &str) -> Result<PageNode> {
    let mut reader = Reader::from_str(xml);
    let mut page = PageNode::default();
    let mut builder = TreeBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e.name().as_ref()).to_vec();
                builder.open(&mut page, &name, e, false)?;
                builder.path.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e.name().as_ref()).to_vec();
                builder.open(&mut page, &name, e, true)?;
            }
            Ok(Event::Text(ref e)) => {
                if builder.in_run_text() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad run text: {}", e)))?;
                    if let Some(run) = last_run(&mut page) {
                        run.push_str(&text);
                    }
                }
            }
            Ok(Event::End(_)) => {
                builder.path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(page)
}

/// Tracks the open element path while the tree is built.
#[derive(Default)]
struct TreeBuilder {
    path: Vec<Vec<u8>>,
}

impl TreeBuilder {
    /// Whether the open element path ends with `suffix`.
    fn within(&self, suffix: &[&[u8]]) -> bool {
        self.path.len() >= suffix.len()
            && self.path[self.path.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(open, expected)| open.as_slice() == *expected)
    }

    /// Whether the path is `cSld/spTree/sp` followed by `rest`.
    fn within_direct_shape(&self, rest: &[&[u8]]) -> bool {
        let mut suffix: Vec<&[u8]> = vec![b"cSld", b"spTree", b"sp"];
        suffix.extend_from_slice(rest);
        self.within(&suffix)
    }

    fn in_run_text(&self) -> bool {
        self.within_direct_shape(&[b"txBody", b"p", b"r", b"t"])
    }

    /// Record an opened element in the tree. `empty` marks self-closing tags.
    ///
    /// Every arm is anchored to a direct `p:sp` child of the shape tree, so
    /// text in group shapes and table frames never lands in another shape's body.
    fn open(&self, page: &mut PageNode, name: &[u8], e: &BytesStart, empty: bool) -> Result<()> {
        match name {
            b"spTree" if self.within(&[b"cSld"]) => {
                page.shapes.get_or_insert_with(Vec::new);
            }
            b"sp" if self.within(&[b"cSld", b"spTree"]) => {
                if let Some(shapes) = page.shapes.as_mut() {
                    shapes.push(ShapeNode::default());
                }
            }
            // An empty text body has no paragraph list.
            b"txBody" if !empty && self.within_direct_shape(&[]) => {
                if let Some(shape) = last_shape(page) {
                    shape.paragraphs.get_or_insert_with(Vec::new);
                }
            }
            b"p" if self.within_direct_shape(&[b"txBody"]) => {
                if let Some(paragraphs) = last_shape(page).and_then(|s| s.paragraphs.as_mut()) {
                    paragraphs.push(ParagraphNode::default());
                }
            }
            b"pPr" if self.within_direct_shape(&[b"txBody", b"p"]) => {
                let level = attribute(e, b"lvl")?.and_then(|v| v.parse::<u32>().ok());
                if let Some(paragraph) = last_paragraph(page) {
                    paragraph.level = level;
                }
            }
            b"buChar" if self.within_direct_shape(&[b"txBody", b"p", b"pPr"]) => {
                let bullet = attribute(e, b"char")?.and_then(|v| v.chars().next());
                if let Some(paragraph) = last_paragraph(page) {
                    paragraph.bullet = bullet;
                }
            }
            b"r" if self.within_direct_shape(&[b"txBody", b"p"]) => {
                if let Some(paragraph) = last_paragraph(page) {
                    paragraph.runs.push(String::new());
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn last_shape(page: &mut PageNode) -> Option<&mut ShapeNode> {
    page.shapes.as_mut().and_then(|shapes| shapes.last_mut())
}

fn last_paragraph(page: &mut PageNode) -> Option<&mut ParagraphNode> {
    last_shape(page)
        .and_then(|shape| shape.paragraphs.as_mut())
        .and_then(|paragraphs| paragraphs.last_mut())
}

fn last_run(page: &mut PageNode) -> Option<&mut String> {
    last_paragraph(page).and_then(|paragraph| paragraph.runs.last_mut())
}

/// Read and unescape an attribute by local name.
fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if local_name(attr.key.as_ref()) == key {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlError(format!("Bad attribute value: {}", e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{walk_page, TextUnit, WalkMode};

    const NOTES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld>
    <p:spTree>
      <p:nvGrpSpPr><p:cNvPr id="1" name=""/></p:nvGrpSpPr>
      <p:sp>
        <p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/></p:nvSpPr>
      </p:sp>
      <p:sp>
        <p:txBody>
          <a:bodyPr/>
          <a:p>
            <a:pPr><a:buChar char="&#8729;"/></a:pPr>
            <a:r><a:rPr lang="en-US"/><a:t>Eye </a:t></a:r>
            <a:r><a:t>anatomy</a:t></a:r>
          </a:p>
          <a:p>
            <a:pPr lvl="1"><a:buFont typeface="Courier New"/><a:buChar char="o"/></a:pPr>
            <a:r><a:t>Lens - focuses light</a:t></a:r>
          </a:p>
          <a:p><a:endParaRPr lang="en-US"/></a:p>
        </p:txBody>
      </p:sp>
    </p:spTree>
  </p:cSld>
</p:notes>"#;

    #[test]
    fn test_parse_notes_tree() {
        let page = parse_page(NOTES_XML).unwrap();
        let shapes = page.shapes.as_ref().unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(shapes[0].paragraphs.is_none());

        let paragraphs = shapes[1].paragraphs.as_ref().unwrap();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0].runs, vec!["Eye ", "anatomy"]);
        assert_eq!(paragraphs[0].bullet, Some('∙'));
        assert_eq!(paragraphs[0].level, None);
        assert_eq!(paragraphs[1].level, Some(1));
        assert_eq!(paragraphs[1].bullet, Some('o'));
        assert!(paragraphs[2].runs.is_empty());
    }

    #[test]
    fn test_walk_parsed_notes() {
        let page = parse_page(NOTES_XML).unwrap();
        let lines: Vec<String> = walk_page(&page, WalkMode::Notes, "notes_1")
            .iter()
            .map(TextUnit::render)
            .collect();
        assert_eq!(lines, vec!["∙ Eye anatomy", "  o Lens - focuses light"]);
    }

    #[test]
    fn test_page_without_shape_tree() {
        let page = parse_page(r#"<p:sld xmlns:p="p"><p:cSld/></p:sld>"#).unwrap();
        assert!(page.shapes.is_none());
    }

    #[test]
    fn test_table_text_not_merged_into_shapes() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
            <p:sp><p:txBody><a:p><a:r><a:t>Title</a:t></a:r></a:p></p:txBody></p:sp>
            <p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tr><a:tc>
              <a:txBody><a:p><a:r><a:t>cell</a:t></a:r></a:p></a:txBody>
            </a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>
            </p:spTree></p:cSld></p:sld>"#;
        let page = parse_page(xml).unwrap();
        let units = walk_page(&page, WalkMode::Slide, "slide_1");
        assert_eq!(units, vec![TextUnit::new("Title")]);
    }

    #[test]
    fn test_group_shape_text_not_merged_into_shapes() {
        let xml = r#"<p:notes xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
            <p:sp><p:txBody><a:p><a:pPr><a:buChar char="&#8729;"/></a:pPr><a:r><a:t>Title</a:t></a:r></a:p></p:txBody></p:sp>
            <p:grpSp><p:sp><p:txBody>
              <a:p><a:pPr lvl="3"><a:buChar char="o"/></a:pPr><a:r><a:t>Grouped</a:t></a:r></a:p>
            </p:txBody></p:sp></p:grpSp>
            </p:spTree></p:cSld></p:notes>"#;
        let page = parse_page(xml).unwrap();
        assert_eq!(page.shapes.as_ref().unwrap().len(), 1);

        let lines: Vec<String> = walk_page(&page, WalkMode::Notes, "notes_1")
            .iter()
            .map(TextUnit::render)
            .collect();
        assert_eq!(lines, vec!["∙ Title"]);
    }

    #[test]
    fn test_entities_in_run_text() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody>
            <a:p><a:r><a:t>Salt &amp; pepper</a:t></a:r></a:p>
            </p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;
        let page = parse_page(xml).unwrap();
        let units = walk_page(&page, WalkMode::Slide, "slide_1");
        assert_eq!(units, vec![TextUnit::new("Salt & pepper")]);
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = parse_page("<p:sld><p:cSld></p:sld>");
        assert!(matches!(result, Err(Error::XmlError(_))));
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }
}
