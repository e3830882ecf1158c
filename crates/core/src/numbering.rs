//! Human-readable document numeros (`FACT-2026-0004`).
//!
//! Numeros are unique per tenant, document type and year. The database
//! sequence (`document_sequences`) is the source of truth; the helpers here
//! format values, parse existing numeros strictly and compute the degraded
//! fallback used when the sequence cannot be reached.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Facture,
    Devis,
    Projet,
    BonLivraison,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Facture,
        DocumentType::Devis,
        DocumentType::Projet,
        DocumentType::BonLivraison,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Facture => "facture",
            DocumentType::Devis => "devis",
            DocumentType::Projet => "projet",
            DocumentType::BonLivraison => "bon_livraison",
        }
    }

    /// Numero prefix shown to users.
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentType::Facture => "FACT",
            DocumentType::Devis => "DEV",
            DocumentType::Projet => "PROJ",
            DocumentType::BonLivraison => "BL",
        }
    }

    /// Table holding documents of this type.
    pub fn table(self) -> &'static str {
        match self {
            DocumentType::Facture => "invoices",
            DocumentType::Devis => "quotes",
            DocumentType::Projet => "projects",
            DocumentType::BonLivraison => "delivery_notes",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid document type '{s}'. Must be one of: {}",
                    DocumentType::ALL.map(DocumentType::as_str).join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Formatting and parsing
// ---------------------------------------------------------------------------

/// Minimum width of the sequence part.
pub const SEQUENCE_WIDTH: usize = 4;

static NUMERO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(FACT|DEV|PROJ|BL)-(\d{4})-(\d{4,})$").expect("numero pattern is valid")
});

/// Format a numero. Sequences beyond 9999 widen instead of truncating.
pub fn format_numero(doc_type: DocumentType, year: i32, sequence: i64) -> String {
    format!(
        "{}-{year}-{sequence:0width$}",
        doc_type.prefix(),
        width = SEQUENCE_WIDTH
    )
}

/// A numero split into its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedNumero {
    pub doc_type: DocumentType,
    pub year: i32,
    pub sequence: i64,
}

/// Strictly parse a canonical numero.
///
/// Returns `None` for anything that is not exactly `{PREFIX}-{YYYY}-{digits}`,
/// including legacy values such as `FACT-2025-NaN`.
pub fn parse_numero(numero: &str) -> Option<ParsedNumero> {
    let caps = NUMERO_RE.captures(numero)?;
    let doc_type = match &caps[1] {
        "FACT" => DocumentType::Facture,
        "DEV" => DocumentType::Devis,
        "PROJ" => DocumentType::Projet,
        "BL" => DocumentType::BonLivraison,
        _ => return None,
    };
    let year = caps[2].parse().ok()?;
    let sequence = caps[3].parse().ok()?;
    Some(ParsedNumero {
        doc_type,
        year,
        sequence,
    })
}

/// Whether `numero` is canonical for the given document type.
pub fn is_well_formed(numero: &str, doc_type: DocumentType) -> bool {
    parse_numero(numero).is_some_and(|p| p.doc_type == doc_type && p.sequence > 0)
}

/// Highest sequence among `existing` numeros of `doc_type` for `year`.
///
/// Malformed numeros are skipped. Returns 0 when nothing usable exists.
pub fn max_sequence<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    doc_type: DocumentType,
    year: i32,
) -> i64 {
    existing
        .into_iter()
        .filter_map(parse_numero)
        .filter(|p| p.doc_type == doc_type && p.year == year)
        .map(|p| p.sequence)
        .max()
        .unwrap_or(0)
}

/// Next numero computed from already-issued ones (fallback path).
pub fn next_from_existing<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    doc_type: DocumentType,
    year: i32,
) -> String {
    let next = max_sequence(existing, doc_type, year) + 1;
    format_numero(doc_type, year, next)
}

/// Last-resort identifier when neither the sequence nor the fallback query works.
pub fn timestamp_numero(doc_type: DocumentType, year: i32, unix_millis: i64) -> String {
    format!("{}-{year}-T{unix_millis}", doc_type.prefix())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
