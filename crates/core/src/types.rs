//! Domain types for representing extracted presentation content and the
//! flashcards derived from it.

use serde::{Deserialize, Serialize};

/// One paragraph of text extracted from a slide or notes page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Concatenated run text of the paragraph.
    pub text: String,

    /// Paragraph indent level (0 when absent).
    pub indent_level: u32,

    /// Bullet character declared on the paragraph, if any.
    pub bullet_char: Option<char>,
}

impl TextUnit {
    /// Create a unit with no indentation or bullet.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            indent_level: 0,
            bullet_char: None,
        }
    }

    /// Create a unit carrying notes-page paragraph properties.
    pub fn with_bullet(text: impl Into<String>, indent_level: u32, bullet_char: Option<char>) -> Self {
        Self {
            text: text.into(),
            indent_level,
            bullet_char,
        }
    }

    /// Indentation/bullet prefix for this unit.
    ///
    /// Two spaces per indent level, followed by the bullet and a space when a
    /// bullet is present.
    pub fn prefix(&self) -> String {
        let indent = " ".repeat(self.indent_level as usize * 2);
        match self.bullet_char {
            Some(bullet) => format!("{}{} ", indent, bullet),
            None => indent,
        }
    }

    /// The text with its prefix applied, as one line.
    pub fn render(&self) -> String {
        format!("{}{}", self.prefix(), self.text)
    }
}

/// Ordered text fragments extracted from one slide or notes page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier derived from the page kind and number.
    pub id: String,

    /// Fragments in document order.
    pub texts: Vec<String>,
}

impl Record {
    /// Create a record from an id and its fragments.
    pub fn new(id: impl Into<String>, texts: Vec<String>) -> Self {
        Self {
            id: id.into(),
            texts,
        }
    }
}

/// A term with either a plain definition or nested sub-cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashCard {
    pub term: String,
    pub definition: Definition,
}

impl FlashCard {
    /// Create a card with a plain text definition.
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: Definition::Text(definition.into()),
        }
    }

    /// Create a card whose definition is a list of sub-cards.
    pub fn nested(term: impl Into<String>, cards: Vec<FlashCard>) -> Self {
        Self {
            term: term.into(),
            definition: Definition::Nested(cards),
        }
    }
}

/// Definition of a flashcard.
///
/// Serialized untagged: a JSON string or an array of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    Text(String),
    Nested(Vec<FlashCard>),
}

/// The restructuring service's output for one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestructuredSection {
    /// Section title assigned by the service.
    pub keys: String,

    /// Flashcards in service order.
    pub items: Vec<FlashCard>,
}

/// Heuristically parsed flashcards for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDeck {
    pub id: String,

    /// Cards in encounter order.
    #[serde(rename = "texts")]
    pub cards: Vec<FlashCard>,
}

/// The kind of input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    /// Modern PPTX (Office Open XML presentation).
    Pptx,
    /// Word document (Office Open XML).
    Docx,
    /// Portable Document Format.
    Pdf,
}

impl FileKind {
    /// Detect kind from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect kind from file magic bytes, using the extension to tell OOXML
    /// containers apart.
    pub fn from_magic(bytes: &[u8], ext: Option<&str>) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        // OOXML containers are ZIP files (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return match ext.and_then(Self::from_extension) {
                Some(Self::Docx) => Some(Self::Docx),
                _ => Some(Self::Pptx),
            };
        }

        None
    }

    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pptx => "pptx",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_with_bullet_and_indent() {
        let unit = TextUnit::with_bullet("Sub - Def", 1, Some('o'));
        assert_eq!(unit.prefix(), "  o ");
        assert_eq!(unit.render(), "  o Sub - Def");
    }

    #[test]
    fn test_prefix_indent_without_bullet() {
        let unit = TextUnit::with_bullet("continued", 2, None);
        assert_eq!(unit.render(), "    continued");
    }

    #[test]
    fn test_no_prefix_at_level_zero() {
        assert_eq!(TextUnit::new("Plain").render(), "Plain");
        assert_eq!(TextUnit::with_bullet("Top", 0, Some('∙')).render(), "∙ Top");
    }

    #[test]
    fn test_definition_serializes_untagged() {
        let card = FlashCard::nested("Eye", vec![FlashCard::new("Lens", "focuses light")]);
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(
            json,
            r#"{"term":"Eye","definition":[{"term":"Lens","definition":"focuses light"}]}"#
        );

        let back: FlashCard = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
    }

    #[test]
    fn test_section_from_service_json() {
        let section: RestructuredSection = serde_json::from_str(
            r#"{"keys":"Anatomy","items":[{"term":"Cornea","definition":"clear front layer"}]}"#,
        )
        .unwrap();
        assert_eq!(section.keys, "Anatomy");
        assert_eq!(
            section.items[0].definition,
            Definition::Text("clear front layer".to_string())
        );
    }

    #[test]
    fn test_card_deck_uses_texts_field() {
        let deck = CardDeck {
            id: "slide_1".to_string(),
            cards: vec![FlashCard::new("A", "B")],
        };
        let json = serde_json::to_string(&deck).unwrap();
        assert!(json.contains(r#""texts":[{"term":"A","definition":"B"}]"#));
    }

    #[test]
    fn test_kind_from_magic() {
        assert_eq!(FileKind::from_magic(b"%PDF-1.7", None), Some(FileKind::Pdf));
        assert_eq!(
            FileKind::from_magic(&[0x50, 0x4B, 0x03, 0x04, 0, 0], Some("pptx")),
            Some(FileKind::Pptx)
        );
        assert_eq!(
            FileKind::from_magic(&[0x50, 0x4B, 0x03, 0x04, 0, 0], Some("DOCX")),
            Some(FileKind::Docx)
        );
        assert_eq!(FileKind::from_magic(b"\0\0\0\0", Some("pptx")), None);
        assert_eq!(FileKind::from_magic(b"PK", None), None);
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_extension("PPTX"), Some(FileKind::Pptx));
        assert_eq!(FileKind::from_extension("txt"), None);
    }
}
