//! Billing records and the tool I/O envelope

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Requisites =================
//

/// Bank requisites of a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    /// Bank name
    pub name: String,
    /// Bank identifier code (БИК)
    #[serde(rename = "BIC")]
    pub bic: String,
    /// Settlement account (расчётный счёт)
    pub current_account: String,
    /// Correspondent account (корреспондентский счёт)
    pub corporate_account: String,
}

/// Customer legal entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Full legal name, e.g. ООО «Рога и копыта»
    pub name: String,
    /// Taxpayer id (ИНН)
    #[serde(rename = "INN")]
    pub inn: String,
    /// State registration id (ОГРН or ОГРНИП)
    #[serde(rename = "OGRN")]
    pub ogrn: String,
    /// Registered address
    pub address: String,
    /// Signatory, surname with initials
    pub signatory: String,
    /// Bank requisites, owned by the customer
    pub bank: Bank,
}

/// A single line item of an act or invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub task: String,
    pub price: i64,
}

//
// ================= Documents =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Act,
    Invoice,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Act => "act",
            DocumentKind::Invoice => "invoice",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact shape of the JSON file read by the typst templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub customer: Customer,
    pub jobs: Vec<Job>,
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

impl ToolOutput {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}
