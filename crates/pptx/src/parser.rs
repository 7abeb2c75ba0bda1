//! Page discovery and text extraction over an unpacked .pptx directory.

use crate::markup::parse_page;
use deck_core::{walk_page, Record, Result, TextUnit, WalkMode};
use std::fs;
use std::path::{Path, PathBuf};

/// The kind of page stored in a presentation package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Slide,
    Notes,
}

impl PageKind {
    /// Directory of this page kind, relative to the package root.
    fn directory(&self) -> &'static str {
        match self {
            PageKind::Slide => "ppt/slides",
            PageKind::Notes => "ppt/notesSlides",
        }
    }

    /// File name prefix of the page parts.
    fn file_prefix(&self) -> &'static str {
        match self {
            PageKind::Slide => "slide",
            PageKind::Notes => "notesSlide",
        }
    }

    /// Prefix of the record ids, distinct per kind so ids never collide.
    fn id_prefix(&self) -> &'static str {
        match self {
            PageKind::Slide => "slide",
            PageKind::Notes => "notes",
        }
    }

    fn walk_mode(&self) -> WalkMode {
        match self {
            PageKind::Slide => WalkMode::Slide,
            PageKind::Notes => WalkMode::Notes,
        }
    }
}

/// Text of one page in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// Record id, e.g. `slide_3` or `notes_3`.
    pub id: String,
    /// 1-based page number from the part name.
    pub number: usize,
    pub units: Vec<TextUnit>,
}

impl PageText {
    /// Plain paragraph texts as a record.
    pub fn to_record(&self) -> Record {
        Record::new(
            self.id.clone(),
            self.units.iter().map(|u| u.text.clone()).collect(),
        )
    }

    /// Paragraphs rendered with their indentation and bullet prefixes.
    pub fn lines(&self) -> Vec<String> {
        self.units.iter().map(TextUnit::render).collect()
    }
}

/// Reads slides and notes pages from an unpacked presentation.
pub struct PresentationReader {
    root: PathBuf,
}

impl PresentationReader {
    /// Create a reader over an extracted package directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Page parts of the given kind, ordered by page number.
    pub fn list_pages(&self, kind: PageKind) -> Result<Vec<(usize, PathBuf)>> {
        let dir = self.root.join(kind.directory());
        if !dir.is_dir() {
            log::warn!("No {} directory in {}", kind.directory(), self.root.display());
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(number) = page_number(name, kind.file_prefix()) {
                pages.push((number, entry.path()));
            }
        }

        pages.sort_by_key(|(number, _)| *number);
        Ok(pages)
    }

    /// Walk every page of the given kind.
    ///
    /// A page whose markup cannot be read or parsed is logged and skipped;
    /// pages without any text are omitted.
    pub fn pages(&self, kind: PageKind) -> Result<Vec<PageText>> {
        log::info!(
            "Starting to parse {} from {}",
            kind.directory(),
            self.root.display()
        );

        let mut pages = Vec::new();
        for (number, path) in self.list_pages(kind)? {
            let id = format!("{}_{}", kind.id_prefix(), number);
            match read_page(&path, kind.walk_mode(), &id) {
                Ok(units) if units.is_empty() => {
                    log::debug!("{} has no text", id);
                }
                Ok(units) => pages.push(PageText { id, number, units }),
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                }
            }
        }

        log::info!("[Success] Parsed {} pages with text", pages.len());
        Ok(pages)
    }

    /// Records of every page of the given kind with text.
    pub fn records(&self, kind: PageKind) -> Result<Vec<Record>> {
        Ok(self
            .pages(kind)?
            .iter()
            .map(PageText::to_record)
            .collect())
    }
}

/// Parse and walk a single page part.
fn read_page(path: &Path, mode: WalkMode, id: &str) -> Result<Vec<TextUnit>> {
    let xml = fs::read_to_string(path)?;
    let page = parse_page(&xml)?;
    Ok(walk_page(&page, mode, id))
}

/// Page number of a part named `<prefix><N>.xml`.
fn page_number(file_name: &str, prefix: &str) -> Option<usize> {
    let rest = file_name.strip_prefix(prefix)?;
    let digits = rest.strip_suffix(".xml")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
