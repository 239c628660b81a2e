//! Plain-text reader for `.docx` files.
//!
//! A docx file is a zip archive; the body lives in `word/document.xml`. The
//! text is rebuilt as every non-blank body paragraph in document order,
//! followed by every non-blank table cell, one per line. Text boxes anchored
//! inside a paragraph are not part of its text and are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::errors::{PipelineError, PipelineResult};

const DOCUMENT_PART: &str = "word/document.xml";

/// Read the text of a docx file
pub fn read_docx_text(path: &Path) -> PipelineResult<String> {
    if !path.exists() {
        return Err(PipelineError::MissingInputFile(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)?
        .read_to_string(&mut xml)
        .map_err(|e| PipelineError::Docx(format!("{DOCUMENT_PART} is not UTF-8 XML: {e}")))?;

    let text = docx_text_from_xml(&xml)?;
    debug!(
        "Read {} lines of text from {}",
        text.lines().count(),
        path.display()
    );
    Ok(text)
}

/// Rebuild the text of a `word/document.xml` part
pub fn docx_text_from_xml(xml: &str) -> PipelineResult<String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut cell = String::new();
    let mut table_depth = 0usize;
    let mut textbox_depth = 0usize;
    let mut in_text = false;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:txbxContent" => textbox_depth += 1,
            Ok(Event::End(e)) if e.name().as_ref() == b"w:txbxContent" => {
                textbox_depth = textbox_depth.saturating_sub(1)
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PipelineError::Docx(format!(
                    "XML error at position {}: {e}",
                    reader.error_position()
                )))
            }
            Ok(_) if textbox_depth > 0 => {}
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:tc" if table_depth == 1 => cell.clear(),
                b"w:p" if table_depth == 0 => paragraph.clear(),
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                let target = if table_depth == 0 { &mut paragraph } else { &mut cell };
                match e.name().as_ref() {
                    b"w:tab" => target.push('\t'),
                    b"w:br" | b"w:cr" => target.push('\n'),
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| PipelineError::Docx(e.to_string()))?;
                if table_depth == 0 {
                    paragraph.push_str(&text);
                } else {
                    cell.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:tc" if table_depth == 1 => {
                    let text = cell.trim_end_matches('\n');
                    if !text.trim().is_empty() {
                        cells.push(text.to_string());
                    }
                }
                b"w:p" if table_depth == 0 => {
                    if !paragraph.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut paragraph));
                    }
                }
                // paragraphs inside a cell are separate lines of that cell
                b"w:p" => cell.push('\n'),
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    paragraphs.extend(cells);
    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{inner}</w:body></w:document>"#
        )
    }

    fn para(text: &str) -> String {
        format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
    }

    #[test]
    fn test_paragraphs_then_cells() {
        let xml = body(&format!(
            "{}{}<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>{}",
            para("Almoço"),
            para("Arroz 100g"),
            para("Jantar"),
            para("   "),
            para("Feijão 80g"),
        ));

        let text = docx_text_from_xml(&xml).unwrap();
        assert_eq!(text, "Almoço\nArroz 100g\nFeijão 80g\nJantar");
    }

    #[test]
    fn test_runs_are_concatenated_and_entities_unescaped() {
        let xml = body(
            "<w:p><w:r><w:t>Frango </w:t></w:r><w:r><w:t>grelhado &amp; ervas</w:t></w:r>\
             <w:r><w:tab/><w:t>150g</w:t></w:r></w:p><w:p/>",
        );

        let text = docx_text_from_xml(&xml).unwrap();
        assert_eq!(text, "Frango grelhado & ervas\t150g");
    }

    #[test]
    fn test_text_box_inside_paragraph_is_skipped() {
        let xml = body(&format!(
            "<w:p><w:r><w:t>Arroz 100g</w:t></w:r>\
             <w:r><w:pict><v:shape><v:textbox><w:txbxContent>{}</w:txbxContent></v:textbox></v:shape></w:pict></w:r>\
             <w:r><w:t xml:space=\"preserve\"> integral</w:t></w:r></w:p>{}",
            para("Nota"),
            para("Feijão 80g"),
        ));

        let text = docx_text_from_xml(&xml).unwrap();
        assert_eq!(text, "Arroz 100g integral\nFeijão 80g");
    }

    #[test]
    fn test_multi_paragraph_cell() {
        let xml = body(&format!(
            "<w:tbl><w:tr><w:tc>{}{}</w:tc></w:tr></w:tbl>",
            para("Ceia"),
            para("Chá 200 ml")
        ));

        assert_eq!(docx_text_from_xml(&xml).unwrap(), "Ceia\nChá 200 ml");
    }

    #[test]
    fn test_read_docx_from_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Colite.docx");

        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file(DOCUMENT_PART, options).unwrap();
        zip.write_all(body(&(para("Almoço") + &para("Arroz 100g"))).as_bytes())
            .unwrap();
        zip.finish().unwrap();

        assert_eq!(read_docx_text(&path).unwrap(), "Almoço\nArroz 100g");
    }

    #[test]
    fn test_not_a_zip_is_docx_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        assert!(matches!(
            read_docx_text(&path),
            Err(PipelineError::Docx(_))
        ));
    }

    #[test]
    fn test_missing_docx() {
        assert!(matches!(
            read_docx_text(Path::new("/nonexistent/SII.docx")),
            Err(PipelineError::MissingInputFile(_))
        ));
    }
}
