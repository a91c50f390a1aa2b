use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// One denied line of a glosa report, as extracted by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DenialItem {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[schemars(with = "String", description = "Patient full name")]
    pub patient_name: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[schemars(with = "String", description = "Insurance card / member number")]
    pub insurance_id: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[schemars(with = "String", description = "Billed procedure code (TUSS)")]
    pub procedure_code: String,

    #[serde(rename = "glosaValue", default, deserialize_with = "null_as_empty")]
    #[schemars(
        with = "String",
        description = "Denied amount exactly as written, pt-BR format (e.g. 1.234,56)"
    )]
    pub denial_value: String,

    #[serde(rename = "glosaJustification", default, deserialize_with = "null_as_empty")]
    #[schemars(with = "String", description = "Payer's justification for the denial")]
    pub justification: String,
}

impl DenialItem {
    /// The claim number this item is filed under. Reports key each denied
    /// line by the member id column, so that is what groups items together.
    pub fn claim_number(&self) -> &str {
        &self.insurance_id
    }
}

/// The structured payload returned by an extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    #[serde(rename = "guiaNumber", default, deserialize_with = "null_as_empty")]
    #[schemars(with = "String", description = "Main claim (guia) number of the report")]
    pub claim_number: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[schemars(with = "Vec<DenialItem>", description = "Every denied item; empty if none")]
    pub items: Vec<DenialItem>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D>(deserializer: D) -> Result<Vec<DenialItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<DenialItem>>::deserialize(deserializer)?.unwrap_or_default())
}
