//! XLSX package writing.
//!
//! Emits the smallest SpreadsheetML package that spreadsheet applications
//! open cleanly: one worksheet with inline strings, fixed column widths,
//! merged section headers and a handful of cell styles.

use crate::workbook::{RowKind, Workbook};
use deck_core::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Cell formats, indexed by [`CellStyle`].
///
/// Fills: light gray `E0E0E0` for column headers, a darker `D3D3D3` for
/// section headers. Borders: thin `D3D3D3` on all four sides.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><sz val="12"/><name val="Arial"/></font></fonts><fills count="4"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor rgb="FFE0E0E0"/><bgColor indexed="64"/></patternFill></fill><fill><patternFill patternType="solid"><fgColor rgb="FFD3D3D3"/><bgColor indexed="64"/></patternFill></fill></fills><borders count="2"><border><left/><right/><top/><bottom/><diagonal/></border><border><left style="thin"><color rgb="FFD3D3D3"/></left><right style="thin"><color rgb="FFD3D3D3"/></right><top style="thin"><color rgb="FFD3D3D3"/></top><bottom style="thin"><color rgb="FFD3D3D3"/></bottom><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="4"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center" vertical="center" wrapText="1"/></xf><xf numFmtId="0" fontId="0" fillId="3" borderId="1" xfId="0" applyFill="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center" vertical="center" wrapText="1"/></xf><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment vertical="top" wrapText="1"/></xf></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Index into the `cellXfs` table of [`STYLES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellStyle {
    Default = 0,
    ColumnHeader = 1,
    SectionHeader = 2,
    Wrapped = 3,
}

impl From<RowKind> for CellStyle {
    fn from(kind: RowKind) -> Self {
        match kind {
            RowKind::ColumnHeader => CellStyle::ColumnHeader,
            RowKind::SectionHeader => CellStyle::SectionHeader,
            RowKind::Data => CellStyle::Wrapped,
            RowKind::Spacer => CellStyle::Default,
        }
    }
}

/// Write a workbook as an .xlsx file, creating the parent directory if needed.
pub fn write_xlsx(workbook: &Workbook, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let sheet = sheet_xml(workbook)?;
    let workbook_xml = workbook_xml(workbook.sheet_name());

    let file = BufWriter::new(File::create(path)?);
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", workbook_xml.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/styles.xml", STYLES.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)
            .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
        zip.write_all(content)?;
    }

    let mut file = zip
        .finish()
        .map_err(|e| Error::ZipError(format!("Failed to finish {}: {}", path.display(), e)))?;
    file.flush()?;

    log::info!(
        "[Excel File Generated] {} rows written to {}",
        workbook.rows().len(),
        path.display()
    );
    Ok(())
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{}" xmlns:r="{}"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SPREADSHEET_NS,
        RELATIONSHIPS_NS,
        escape(sheet_name)
    )
}

/// Render the worksheet part.
fn sheet_xml(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut xml = SheetWriter::new();
    xml.decl()?;
    xml.start("worksheet", &[("xmlns", SPREADSHEET_NS)])?;

    xml.start("cols", &[])?;
    for (idx, width) in workbook.column_widths().iter().enumerate() {
        let column = (idx + 1).to_string();
        let width = width.to_string();
        xml.empty(
            "col",
            &[
                ("min", column.as_str()),
                ("max", column.as_str()),
                ("width", width.as_str()),
                ("customWidth", "1"),
            ],
        )?;
    }
    xml.end("cols")?;

    let mut merged = Vec::new();
    xml.start("sheetData", &[])?;
    for (idx, row) in workbook.rows().iter().enumerate() {
        if row.kind == RowKind::Spacer {
            continue;
        }

        let number = (idx + 1).to_string();
        let style = CellStyle::from(row.kind);
        xml.start("row", &[("r", number.as_str())])?;
        for (column, value) in ["A", "B"].iter().zip(row.cells.iter()) {
            xml.cell(&format!("{}{}", column, number), value, style)?;
        }
        xml.end("row")?;

        if row.kind == RowKind::SectionHeader {
            merged.push(format!("A{0}:B{0}", number));
        }
    }
    xml.end("sheetData")?;

    if !merged.is_empty() {
        let count = merged.len().to_string();
        xml.start("mergeCells", &[("count", count.as_str())])?;
        for range in &merged {
            xml.empty("mergeCell", &[("ref", range.as_str())])?;
        }
        xml.end("mergeCells")?;
    }

    xml.end("worksheet")?;
    Ok(xml.into_inner())
}

/// Thin wrapper over the quick-xml writer with crate errors.
struct SheetWriter {
    writer: Writer<Vec<u8>>,
}

impl SheetWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::XmlError(format!("Failed to write worksheet: {}", e)))
    }

    fn decl(&mut self) -> Result<()> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.write(Event::Start(
            BytesStart::new(name).with_attributes(attrs.iter().copied()),
        ))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.write(Event::Empty(
            BytesStart::new(name).with_attributes(attrs.iter().copied()),
        ))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// An inline-string cell. Empty values only keep their style.
    fn cell(&mut self, reference: &str, value: &str, style: CellStyle) -> Result<()> {
        let style_id = (style as u8).to_string();
        let mut attrs = vec![("r", reference)];
        if style != CellStyle::Default {
            attrs.push(("s", style_id.as_str()));
        }

        if value.is_empty() {
            return if style == CellStyle::Default {
                Ok(())
            } else {
                self.empty("c", &attrs)
            };
        }

        attrs.push(("t", "inlineStr"));
        self.start("c", &attrs)?;
        self.start("is", &[])?;
        self.start("t", &[("xml:space", "preserve")])?;
        let text = xml_safe(value);
        self.write(Event::Text(BytesText::new(&text)))?;
        self.end("t")?;
        self.end("is")?;
        self.end("c")
    }

    fn into_inner(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// Drop characters that XML 1.0 does not allow in text.
fn xml_safe(value: &str) -> String {
    value
        .chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || c >= ' ')
        .collect()
}
