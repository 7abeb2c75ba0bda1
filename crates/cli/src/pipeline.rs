//! End-to-end conversion of a presentation into flashcard workbooks.
//!
//! Two entry paths share extraction:
//!
//! - [`convert`] restructures slide and notes text through a [`Restructurer`]
//!   and writes one sectioned workbook.
//! - [`convert_heuristic`] parses slides and notes locally and writes flat
//!   workbooks plus a merged one.

use crate::config::PipelineConfig;
use anyhow::{bail, Context, Result};
use deck_core::{
    parse_flat, parse_nested, CardDeck, ChunkOrchestrator, FileKind, FlashCard, Restructurer,
};
use deck_pptx::{extract_archive, PageKind, PresentationReader};
use deck_xlsx::{merge_workbooks, write_xlsx, Workbook};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Files written by the heuristic path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeuristicOutput {
    pub slides: PathBuf,
    pub notes: PathBuf,
    pub merged: PathBuf,
}

/// Detect the input type from magic bytes, falling back to the extension.
pub fn detect_kind(path: &Path) -> Result<FileKind> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut magic = [0u8; 8];
    let read = file
        .read(&mut magic)
        .with_context(|| "Failed to read file header")?;

    let ext = path.extension().and_then(|e| e.to_str());
    FileKind::from_magic(&magic[..read], ext)
        .or_else(|| ext.and_then(FileKind::from_extension))
        .ok_or_else(|| {
            log::error!("ParseFile: Could not determine file type for {}", path.display());
            anyhow::anyhow!("Could not determine file type of {}", path.display())
        })
}

/// Fail unless the input is a presentation.
fn require_pptx(path: &Path) -> Result<()> {
    match detect_kind(path)? {
        FileKind::Pptx => Ok(()),
        other => {
            log::error!("Unsupported file type {} for {}", other.name(), path.display());
            bail!(deck_core::Error::UnsupportedFormat(other.name().to_string()))
        }
    }
}

/// Restructure a presentation's notes and slides and write `output.xlsx`.
///
/// Returns the path of the written workbook.
pub fn convert<R: Restructurer>(
    input: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
    restructurer: R,
) -> Result<PathBuf> {
    require_pptx(input)?;

    let extracted = extract_archive(input, &config.work_dir)
        .with_context(|| format!("Failed to extract {}", input.display()))?;
    let reader = PresentationReader::new(extracted);

    let notes = reader.records(PageKind::Notes)?;
    let slides = reader.records(PageKind::Slide)?;
    write_json(&output_dir.join("ppt_notes.json"), &notes)?;
    write_json(&output_dir.join("ppt_content.json"), &slides)?;

    let orchestrator = ChunkOrchestrator::new(restructurer)
        .with_chunk_size(config.chunk_size)
        .with_retry_policy(config.retry_policy());

    let mut sections = orchestrator.run(&notes);
    sections.extend(orchestrator.run(&slides));

    let sections_path = output_dir.join("final_slides.json");
    write_json(&sections_path, &sections)?;
    log::info!(
        "[Success] Final structured JSON saved as {}",
        sections_path.display()
    );

    let output = output_dir.join("output.xlsx");
    write_xlsx(&Workbook::sectioned(&sections), &output)?;

    Ok(output)
}

/// Parse slides and notes locally and write `slides.xlsx`,
/// `slides-notes.xlsx` and their merge `slides-output.xlsx`.
pub fn convert_heuristic(input: &Path, output_dir: &Path, work_dir: &Path) -> Result<HeuristicOutput> {
    require_pptx(input)?;

    let extracted = extract_archive(input, work_dir)
        .with_context(|| format!("Failed to extract {}", input.display()))?;
    let reader = PresentationReader::new(extracted);

    let slide_decks = decks(&reader, PageKind::Slide, |lines| parse_flat(lines))?;
    let note_decks = decks(&reader, PageKind::Notes, |lines| parse_nested(lines))?;

    write_json(&output_dir.join("slides.json"), &slide_decks)?;
    write_json(&output_dir.join("notes.json"), &note_decks)?;

    let slides = output_dir.join("slides.xlsx");
    write_xlsx(&Workbook::flat(&all_cards(&slide_decks)), &slides)?;

    let notes = output_dir.join("slides-notes.xlsx");
    write_xlsx(&Workbook::flat(&all_cards(&note_decks)), &notes)?;

    let merged = output_dir.join("slides-output.xlsx");
    merge_workbooks(&notes, &slides, &merged)?;

    Ok(HeuristicOutput {
        slides,
        notes,
        merged,
    })
}

/// Parse each page of a kind into a deck, keeping pages that produced cards.
fn decks<F>(reader: &PresentationReader, kind: PageKind, parse: F) -> Result<Vec<CardDeck>>
where
    F: Fn(&[String]) -> Vec<FlashCard>,
{
    Ok(reader
        .pages(kind)?
        .into_iter()
        .filter_map(|page| {
            let cards = parse(&page.lines());
            (!cards.is_empty()).then(|| CardDeck { id: page.id, cards })
        })
        .collect())
}

fn all_cards(decks: &[CardDeck]) -> Vec<FlashCard> {
    decks.iter().flat_map(|d| d.cards.iter().cloned()).collect()
}

/// Write a pretty-printed JSON artifact, creating its directory if needed.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{Record, RestructureError, RestructuredSection};
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    /// Turns each chunk into a section titled by its first fragment.
    struct EchoService;

    impl Restructurer for EchoService {
        fn restructure(
            &self,
            fragments: &[String],
        ) -> std::result::Result<RestructuredSection, RestructureError> {
            Ok(RestructuredSection {
                keys: fragments[0].clone(),
                items: fragments[1..]
                    .iter()
                    .map(|f| FlashCard::new(f.clone(), "restructured"))
                    .collect(),
            })
        }
    }

    fn page(root: &str, paragraphs: &[(&str, Option<u32>, Option<char>)]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|(text, lvl, bullet)| {
                let lvl = lvl.map(|l| format!(r#" lvl="{}""#, l)).unwrap_or_default();
                let bullet = bullet
                    .map(|b| format!(r#"<a:buChar char="{}"/>"#, b))
                    .unwrap_or_default();
                format!(
                    "<a:p><a:pPr{}>{}</a:pPr><a:r><a:t>{}</a:t></a:r></a:p>",
                    lvl, bullet, text
                )
            })
            .collect();
        format!(
            r#"<{0} xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody>{1}</p:txBody></p:sp></p:spTree></p:cSld></{0}>"#,
            root, body
        )
    }

    fn write_deck(path: &Path) {
        let slide1 = page(
            "p:sld",
            &[("Eye", None, None), ("Lens - focuses light", None, None), ("onto the retina", None, None)],
        );
        let slide2 = page("p:sld", &[("Cornea - clear layer", None, None)]);
        let notes1 = page(
            "p:notes",
            &[
                ("Optics", None, Some('∙')),
                ("Refraction - bending of light", Some(1), Some('o')),
            ],
        );

        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in [
            ("ppt/slides/slide1.xml", &slide1),
            ("ppt/slides/slide2.xml", &slide2),
            ("ppt/notesSlides/notesSlide1.xml", &notes1),
        ] {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_convert_writes_sections_notes_first() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lecture.pptx");
        write_deck(&input);
        let out = dir.path().join("out");
        let config = PipelineConfig {
            work_dir: dir.path().join("work"),
            ..PipelineConfig::default()
        };

        let output = convert(&input, &out, &config, EchoService).unwrap();
        assert_eq!(output, out.join("output.xlsx"));

        let records: Vec<Record> =
            serde_json::from_str(&std::fs::read_to_string(out.join("ppt_content.json")).unwrap())
                .unwrap();
        assert_eq!(records[0].id, "slide_1");
        assert_eq!(records[1].texts, vec!["Cornea - clear layer"]);

        let sections: Vec<RestructuredSection> =
            serde_json::from_str(&std::fs::read_to_string(out.join("final_slides.json")).unwrap())
                .unwrap();
        let keys: Vec<&str> = sections.iter().map(|s| s.keys.as_str()).collect();
        assert_eq!(keys, vec!["Optics", "Eye"]);

        let rows = deck_xlsx::read_rows(&output).unwrap();
        assert_eq!(rows[0], ["Term".to_string(), "Definition".to_string()]);
        assert_eq!(rows[1][0], "Optics");
        assert_eq!(rows[2][0], "Refraction - bending of light");
    }

    #[test]
    fn test_convert_heuristic_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("lecture.pptx");
        write_deck(&input);
        let out = dir.path().join("out");

        let output = convert_heuristic(&input, &out, &dir.path().join("work")).unwrap();

        let slides = deck_xlsx::read_rows(&output.slides).unwrap();
        let slide_terms: Vec<&str> = slides.iter().map(|[t, _]| t.as_str()).collect();
        assert_eq!(slide_terms, vec!["Title", "Lens", "Cornea"]);
        assert_eq!(slides[1][1], "focuses light\nonto the retina");

        let merged = deck_xlsx::read_rows(&output.merged).unwrap();
        let merged_terms: Vec<&str> = merged.iter().map(|[t, _]| t.as_str()).collect();
        assert_eq!(merged_terms, vec!["Title", "Refraction", "Lens", "Cornea"]);

        let notes: Vec<CardDeck> =
            serde_json::from_str(&std::fs::read_to_string(out.join("notes.json")).unwrap())
                .unwrap();
        assert_eq!(
            notes[0].cards,
            vec![FlashCard::nested(
                "Optics",
                vec![FlashCard::new("Refraction", "bending of light")]
            )]
        );
    }

    #[test]
    fn test_pdf_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("paper.pdf");
        std::fs::write(&input, b"%PDF-1.7\n...").unwrap();
        let out = dir.path().join("out");

        let err = convert_heuristic(&input, &out, &dir.path().join("work")).unwrap_err();
        assert!(err.to_string().contains("pdf"));
        assert!(!out.exists());
    }

    #[test]
    fn test_unknown_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.bin");
        std::fs::write(&input, b"\x00\x01\x02\x03\x04").unwrap();

        assert!(detect_kind(&input).is_err());
    }
}
