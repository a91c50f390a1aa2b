use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use rust_xlsxwriter::Workbook;

use super::{AppealExporter, ExportFormat};
use crate::error::{GlosaError, Result};
use crate::record::WorkflowRecord;

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const TITLE_SIZE: i64 = 16;
const BODY_SIZE: i64 = 11;
const LEADING: i64 = 14;
// Courier glyphs are 0.6em wide: 495pt of usable width at 11pt.
const CHARS_PER_LINE: usize = 75;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;
const TITLE: &str = "Recurso de Glosa";
const SHEET_NAME: &str = "Detalhes Recurso";
const ITEM_HEADER: [&str; 4] = ["Paciente", "Cód. Procedimento", "Valor Glosado", "Justificativa"];

fn export_error(e: impl std::fmt::Display) -> GlosaError {
    GlosaError::Export(e.to_string())
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let current_len = current.chars().count();
            if current_len > 0 && current_len + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(word);
        }
        lines.push(current);
    }

    lines
}

/// Latin-1 bytes for the standard WinAnsi fonts; anything outside it
/// becomes `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// A4 document with a title and the appeal text wrapped across as many
/// pages as needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExporter;

impl PdfExporter {
    fn page_operations(lines: &[String], with_title: bool) -> Vec<Operation> {
        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("TL", vec![Object::Integer(LEADING)]),
            Operation::new(
                "Td",
                vec![
                    Object::Integer(MARGIN),
                    Object::Integer(PAGE_HEIGHT - MARGIN),
                ],
            ),
        ];

        if with_title {
            ops.push(Operation::new(
                "Tf",
                vec!["F1".into(), Object::Integer(TITLE_SIZE)],
            ));
            ops.push(Operation::new("Tj", vec![Object::string_literal(TITLE)]));
            ops.push(Operation::new("T*", vec![]));
            ops.push(Operation::new("T*", vec![]));
        }

        ops.push(Operation::new(
            "Tf",
            vec!["F1".into(), Object::Integer(BODY_SIZE)],
        ));
        for line in lines {
            ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(latin1(line))],
            ));
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new("ET", vec![]));

        ops
    }
}

impl AppealExporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, _record: &WorkflowRecord, appeal_text: &str) -> Result<Vec<u8>> {
        let lines = wrap_text(appeal_text, CHARS_PER_LINE);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        // The title takes two lines off the first page.
        let first_page = LINES_PER_PAGE - 2;
        let mut chunks: Vec<&[String]> = vec![&lines[..first_page.min(lines.len())]];
        if lines.len() > first_page {
            chunks.extend(lines[first_page..].chunks(LINES_PER_PAGE));
        }

        let mut kids = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let content = Content {
                operations: Self::page_operations(chunk, index == 0),
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(export_error)?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(page_count),
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(PAGE_WIDTH),
                    Object::Integer(PAGE_HEIGHT),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(export_error)?;
        Ok(bytes)
    }
}

/// Word document with one paragraph per line of the appeal text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExporter;

impl AppealExporter for DocxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn render(&self, _record: &WorkflowRecord, appeal_text: &str) -> Result<Vec<u8>> {
        let docx = appeal_text.split('\n').fold(Docx::new(), |docx, line| {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)))
        });

        let mut buffer = Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).map_err(export_error)?;
        Ok(buffer.into_inner())
    }
}

/// XLSX workbook with one "Detalhes Recurso" sheet: claim number, total and
/// item count (numeric cells), a blank row, then a header and one row per
/// denied item.
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetExporter;

impl AppealExporter for SheetExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Sheet
    }

    fn render(&self, record: &WorkflowRecord, _appeal_text: &str) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).map_err(export_error)?;

        sheet.write_string(0, 0, "Número da Guia").map_err(export_error)?;
        sheet
            .write_string(0, 1, record.claim_number.as_str())
            .map_err(export_error)?;
        sheet.write_string(1, 0, "Total Glosado").map_err(export_error)?;
        sheet
            .write_number(1, 1, record.total_value)
            .map_err(export_error)?;
        sheet.write_string(2, 0, "Total de Itens").map_err(export_error)?;
        sheet
            .write_number(2, 1, record.item_count as f64)
            .map_err(export_error)?;

        for (col, title) in ITEM_HEADER.iter().enumerate() {
            sheet
                .write_string(4, col as u16, *title)
                .map_err(export_error)?;
        }

        for (index, item) in record.items.iter().enumerate() {
            let row = 5 + index as u32;
            let cells = [
                item.patient_name.as_str(),
                item.procedure_code.as_str(),
                item.denial_value.as_str(),
                item.justification.as_str(),
            ];
            for (col, value) in cells.iter().enumerate() {
                sheet
                    .write_string(row, col as u16, *value)
                    .map_err(export_error)?;
            }
        }

        workbook.save_to_buffer().map_err(export_error)
    }
}
