//! Rendering of a finished appeal into downloadable files.

#[cfg(feature = "office")]
mod office;

#[cfg(feature = "office")]
pub use office::{DocxExporter, PdfExporter, SheetExporter};

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::{GlosaError, Result};
use crate::record::WorkflowRecord;
use crate::source::XLSX_MIME_TYPE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Xml,
    Csv,
    Sheet,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Xml => "xml",
            ExportFormat::Csv => "csv",
            ExportFormat::Sheet => "xlsx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain;charset=utf-8",
            ExportFormat::Xml => "application/xml;charset=utf-8",
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Sheet => XLSX_MIME_TYPE,
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// A file ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub trait AppealExporter {
    fn format(&self) -> ExportFormat;

    fn render(&self, record: &WorkflowRecord, appeal_text: &str) -> Result<Vec<u8>>;
}

/// `Recurso_Glosa_<claim>_<epoch millis>.<ext>`
pub fn export_file_name(claim_number: &str, at: DateTime<Utc>, format: ExportFormat) -> String {
    format!(
        "Recurso_Glosa_{}_{}.{}",
        claim_number,
        at.timestamp_millis(),
        format.extension()
    )
}

pub fn export_appeal(
    exporter: &dyn AppealExporter,
    record: &WorkflowRecord,
    appeal_text: &str,
    at: DateTime<Utc>,
) -> Result<ExportedFile> {
    let format = exporter.format();
    let bytes = exporter.render(record, appeal_text)?;
    let file_name = export_file_name(&record.claim_number, at, format);
    debug!("Exported {} ({} bytes)", file_name, bytes.len());

    Ok(ExportedFile {
        file_name,
        mime_type: format.mime_type().to_string(),
        bytes,
    })
}

/// The appeal text, verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExporter;

impl AppealExporter for TextExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Text
    }

    fn render(&self, _record: &WorkflowRecord, appeal_text: &str) -> Result<Vec<u8>> {
        Ok(appeal_text.as_bytes().to_vec())
    }
}

/// Hand-built `<recursoGlosa>` document.
///
/// Field values are interpolated as-is, without XML escaping, so a patient
/// name containing `&` or `<` yields a malformed document. Only the appeal
/// text is protected, by a CDATA section.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlExporter;

impl AppealExporter for XmlExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xml
    }

    fn render(&self, record: &WorkflowRecord, appeal_text: &str) -> Result<Vec<u8>> {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<recursoGlosa>\n");
        xml.push_str(&format!("  <guiaNumber>{}</guiaNumber>\n", record.claim_number));
        xml.push_str(&format!(
            "  <totalGlosaValue>{}</totalGlosaValue>\n",
            record.total_value
        ));
        xml.push_str(&format!("  <totalGlosas>{}</totalGlosas>\n", record.item_count));
        xml.push_str("  <items>\n");
        for item in &record.items {
            xml.push_str("    <item>\n");
            xml.push_str(&format!("      <patientName>{}</patientName>\n", item.patient_name));
            xml.push_str(&format!("      <insuranceId>{}</insuranceId>\n", item.insurance_id));
            xml.push_str(&format!(
                "      <procedureCode>{}</procedureCode>\n",
                item.procedure_code
            ));
            xml.push_str(&format!("      <glosaValue>{}</glosaValue>\n", item.denial_value));
            xml.push_str(&format!(
                "      <glosaJustification>{}</glosaJustification>\n",
                item.justification
            ));
            xml.push_str("    </item>\n");
        }
        xml.push_str("  </items>\n");
        xml.push_str(&format!(
            "  <textoRecurso><![CDATA[{}]]></textoRecurso>\n",
            appeal_text
        ));
        xml.push_str("</recursoGlosa>");

        Ok(xml.into_bytes())
    }
}

/// Summary rows followed by one row per denied item, as CSV. Same layout
/// as the XLSX sheet, for tools that cannot open workbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl AppealExporter for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn render(&self, record: &WorkflowRecord, _appeal_text: &str) -> Result<Vec<u8>> {
        let to_export_error = |e: csv::Error| GlosaError::Export(e.to_string());

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        let total = record.total_value.to_string();
        let count = record.item_count.to_string();
        writer
            .write_record(["Número da Guia", record.claim_number.as_str()])
            .map_err(to_export_error)?;
        writer
            .write_record(["Total Glosado", total.as_str()])
            .map_err(to_export_error)?;
        writer
            .write_record(["Total de Itens", count.as_str()])
            .map_err(to_export_error)?;
        writer.write_record([""]).map_err(to_export_error)?;
        writer
            .write_record(["Paciente", "Cód. Procedimento", "Valor Glosado", "Justificativa"])
            .map_err(to_export_error)?;

        for item in &record.items {
            writer
                .write_record([
                    item.patient_name.as_str(),
                    item.procedure_code.as_str(),
                    item.denial_value.as_str(),
                    item.justification.as_str(),
                ])
                .map_err(to_export_error)?;
        }

        writer
            .into_inner()
            .map_err(|e| GlosaError::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DenialItem;
    use chrono::TimeZone;

    fn record() -> WorkflowRecord {
        WorkflowRecord {
            claim_number: "G1".to_string(),
            items: vec![
                DenialItem {
                    patient_name: "Ana & Filhos <Ltda>".to_string(),
                    insurance_id: "G1".to_string(),
                    procedure_code: "40301630".to_string(),
                    denial_value: "1.000,00".to_string(),
                    justification: "J1".to_string(),
                },
                DenialItem {
                    patient_name: "José, o Segundo".to_string(),
                    insurance_id: "G1".to_string(),
                    procedure_code: "40302040".to_string(),
                    denial_value: "500,50".to_string(),
                    justification: "J1".to_string(),
                },
            ],
            item_count: 2,
            total_value: 1500.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_file_name_uses_claim_and_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            export_file_name("G1", at, ExportFormat::Xml),
            "Recurso_Glosa_G1_1700000000123.xml"
        );

        let file = export_appeal(&TextExporter, &record(), "Prezados,", at).unwrap();
        assert_eq!(file.file_name, "Recurso_Glosa_G1_1700000000123.txt");
        assert_eq!(file.mime_type, "text/plain;charset=utf-8");
        assert_eq!(file.bytes, b"Prezados,");
    }

    #[test]
    fn test_format_extensions_and_mime_types() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Sheet.extension(), "xlsx");
        assert_eq!(
            ExportFormat::Sheet.mime_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }

    #[test]
    fn test_xml_layout() {
        let bytes = XmlExporter.render(&record(), "Texto com <tags> & mais").unwrap();
        let xml = String::from_utf8(bytes).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<recursoGlosa>\n"));
        assert!(xml.contains("  <guiaNumber>G1</guiaNumber>\n"));
        assert!(xml.contains("  <totalGlosaValue>1500.5</totalGlosaValue>\n"));
        assert!(xml.contains("  <totalGlosas>2</totalGlosas>\n"));
        assert_eq!(xml.matches("<item>").count(), 2);
        assert!(xml.contains("<textoRecurso><![CDATA[Texto com <tags> & mais]]></textoRecurso>"));
        assert!(xml.ends_with("</recursoGlosa>"));
    }

    // Known defect: interpolated fields are not escaped.
    #[test]
    fn test_xml_fields_are_not_escaped() {
        let xml = String::from_utf8(XmlExporter.render(&record(), "").unwrap()).unwrap();
        assert!(xml.contains("<patientName>Ana & Filhos <Ltda></patientName>"));
        assert!(!xml.contains("&amp;"));
    }

    #[test]
    fn test_csv_rows() {
        let csv = String::from_utf8(CsvExporter.render(&record(), "").unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Número da Guia,G1");
        assert_eq!(lines[1], "Total Glosado,1500.5");
        assert_eq!(lines[2], "Total de Itens,2");
        assert_eq!(
            lines[4],
            "Paciente,Cód. Procedimento,Valor Glosado,Justificativa"
        );
        assert_eq!(lines[5], "Ana & Filhos <Ltda>,40301630,\"1.000,00\",J1");
        assert_eq!(lines[6], "\"José, o Segundo\",40302040,\"500,50\",J1");
        assert_eq!(lines.len(), 7);
    }
}
