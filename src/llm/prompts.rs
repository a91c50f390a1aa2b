// Prompts for the two model calls: report extraction and appeal drafting.
// The reports and the letters are Brazilian, so the prompts are in pt-BR.

use crate::money::format_currency;
use crate::record::{AttachmentList, WorkflowRecord, YesNo};
use crate::schema::ExtractionResult;
use crate::session::DRAFT_ERROR_MARKER;

pub const EXTRACTION_INSTRUCTIONS: &str = r#"
Analise o relatório de glosas e extraia o número da guia principal e a lista completa de itens glosados.
Para cada item, extraia: nome do paciente, número da carteira, código do procedimento, valor glosado e a justificativa da glosa.

REGRAS:
- Copie o valor glosado exatamente como aparece no documento, no formato brasileiro (ex.: "1.234,56"). Não converta nem arredonde.
- Copie a justificativa literalmente; itens com o mesmo motivo devem ter exatamente o mesmo texto.
- Se uma informação não for encontrada, use uma string vazia no campo correspondente.
- Se nenhum item glosado for encontrado, retorne "items" como um array vazio.
- Retorne SOMENTE o JSON, sem texto adicional e sem blocos de código.
"#;

pub const DRAFTING_SYSTEM_PROMPT: &str = r#"
Você é um especialista em faturamento médico e em recursos de glosa junto a operadoras de saúde no Brasil.
Redija cartas de recurso formais, técnicas e respeitosas, com cabeçalho, saudação, argumentação e fecho.
Escreva sempre em português do Brasil. Não invente dados que não foram informados.
"#;

pub const DRAFT_FAILED: &str = "Ocorreu um erro ao gerar o texto do recurso. Por favor, tente novamente.";

pub fn draft_blocked(reason: &str) -> String {
    format!(
        "{}: a geração do recurso foi bloqueada por filtros de segurança (Motivo: {}). Revise os dados de entrada.",
        DRAFT_ERROR_MARKER, reason
    )
}

pub fn draft_empty() -> String {
    format!(
        "{}: a IA gerou uma resposta vazia. Revise os dados fornecidos e tente novamente.",
        DRAFT_ERROR_MARKER
    )
}

/// Extraction instructions followed by the JSON Schema the answer must match.
pub fn extraction_prompt() -> String {
    let schema = schemars::schema_for!(ExtractionResult);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_default();
    format!(
        "{}\nO JSON deve seguir este JSON Schema:\n{}\n",
        EXTRACTION_INSTRUCTIONS.trim(),
        schema_json
    )
}

pub fn text_source_prompt(file_name: &str, content: &str) -> String {
    format!(
        "Conteúdo do arquivo ({}):\n\n{}\n\n---\n\nInstrução: {}",
        file_name,
        content,
        extraction_prompt()
    )
}

pub fn spreadsheet_source_prompt(file_name: &str, csv: &str) -> String {
    format!(
        "O conteúdo a seguir foi extraído da planilha XLSX ({}) e convertido para CSV. Analise-o:\n\n{}\n\n---\n\nInstrução: {}",
        file_name,
        csv,
        extraction_prompt()
    )
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn yes_no_answer(answer: YesNo, yes: String, no: String) -> String {
    match answer {
        YesNo::Yes => yes,
        YesNo::No => no,
        YesNo::Unanswered => "Não informado.".to_string(),
    }
}

fn attachment_lines(label: &str, files: &AttachmentList) -> Option<String> {
    if files.is_empty() {
        return None;
    }
    let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
    Some(format!("- {} ({} arquivo(s): {})", label, files.len(), names.join(", ")))
}

/// The user prompt for drafting one group's appeal letter.
pub fn appeal_prompt(record: &WorkflowRecord) -> String {
    let answers = &record.answers;

    let items = record
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "- Item {}: Paciente: {} | Carteira: {} | Procedimento: {} | Valor: {}",
                i + 1,
                or_placeholder(&item.patient_name, "Não informado"),
                or_placeholder(&item.insurance_id, "Não informada"),
                or_placeholder(&item.procedure_code, "Não informado"),
                or_placeholder(&item.denial_value, "Não informado"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let arguments = [
        format!(
            "- O procedimento foi realizado conforme a solicitação médica? {}",
            yes_no_answer(
                answers.medical_request,
                "Sim, prescrição em anexo.".to_string(),
                "Não.".to_string()
            )
        ),
        format!(
            "- O procedimento está de acordo com o contrato/cobertura? {}",
            yes_no_answer(
                answers.contract_compliance,
                format!(
                    "Sim, conforme cláusula/item: {}",
                    or_placeholder(&answers.contract_clause, "especificado no contrato")
                ),
                "Não.".to_string()
            )
        ),
        format!(
            "- Houve autorização prévia para o procedimento? {}",
            yes_no_answer(
                answers.prior_authorization,
                "Sim, guia de autorização em anexo.".to_string(),
                "Não.".to_string()
            )
        ),
        format!(
            "- O código do procedimento faturado está correto? {}",
            yes_no_answer(
                answers.is_correct_procedure_code,
                "Sim.".to_string(),
                format!(
                    "Não, o código correto é: {}",
                    or_placeholder(&answers.correct_procedure_code, "a ser verificado")
                )
            )
        ),
        format!(
            "- O valor cobrado está de acordo com a tabela acordada? {}",
            yes_no_answer(
                answers.is_correct_value,
                "Sim.".to_string(),
                format!(
                    "Não, o valor correto é: {}",
                    or_placeholder(&answers.correct_value, "a ser verificado")
                )
            )
        ),
        format!(
            "- Comentários técnicos adicionais: {}",
            or_placeholder(&answers.technical_comments, "Nenhum.")
        ),
        format!(
            "- Prazo para envio do recurso: {}",
            answers
                .deadline
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "Não especificado".to_string())
        ),
    ]
    .join("\n");

    let attachments: Vec<String> = [
        attachment_lines("Cópia da prescrição médica", &answers.medical_request_files),
        attachment_lines("Cópia da guia de autorização", &answers.prior_authorization_files),
        attachment_lines("Outros documentos comprobatórios", &answers.additional_files),
    ]
    .into_iter()
    .flatten()
    .collect();
    let attachments = if attachments.is_empty() {
        "- Nenhum documento anexado.".to_string()
    } else {
        attachments.join("\n")
    };

    format!(
        "Redija uma carta de recurso de glosa para a operadora de saúde, cobrindo um grupo de itens \
glosados pelo mesmo motivo sob a mesma guia.\n\n\
**Dados da guia:**\n- Número da guia: {}\n\n\
**Grupo em recurso:**\n- Justificativa da operadora (comum a todos os itens): \"{}\"\n\
- Quantidade de itens: {}\n- Valor total do grupo: {}\n\n\
**Itens afetados:**\n{}\n\n\
**Argumentos para o recurso:**\n{}\n\n\
**Documentação de suporte anexada:**\n{}\n\n\
Gere o texto completo do recurso, coeso e focado na justificativa comum a todos os itens listados.",
        or_placeholder(&record.claim_number, "Não informado"),
        record.justification().unwrap_or("Não informada"),
        record.item_count,
        format_currency(record.total_value),
        items,
        arguments,
        attachments
    )
}
