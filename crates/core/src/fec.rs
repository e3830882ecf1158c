//! Fichier des Écritures Comptables (FEC) export.
//!
//! Produces the pipe-separated, 18-column file French tax authorities
//! require, with one sales-journal entry per invoice.

use chrono::NaiveDate;

use crate::invoice::Totals;
use crate::types::{Cents, DbId};

pub const JOURNAL_CODE: &str = "VE";
pub const JOURNAL_LIB: &str = "Ventes";
pub const ACCOUNT_CLIENTS: &str = "411000";
pub const ACCOUNT_REVENUE: &str = "706000";
pub const ACCOUNT_VAT: &str = "445710";

pub const HEADER: [&str; 18] = [
    "JournalCode",
    "JournalLib",
    "EcritureNum",
    "EcritureDate",
    "CompteNum",
    "CompteLib",
    "CompAuxNum",
    "CompAuxLib",
    "PieceRef",
    "PieceDate",
    "EcritureLib",
    "Debit",
    "Credit",
    "EcritureLet",
    "DateLet",
    "ValidDate",
    "Montantdevise",
    "Idevise",
];

/// An invoice as seen by the accounting export.
#[derive(Debug, Clone)]
pub struct FecInvoice {
    pub numero: String,
    pub issued_on: NaiveDate,
    /// Auxiliary account reference for the client.
    pub client_ref: String,
    pub client_name: String,
    pub totals: Totals,
}

/// Format cents with a comma decimal separator (`1200,00`).
pub fn format_amount(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{},{:02}", abs / 100, abs % 100)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Field values may not contain the separator or line breaks.
fn sanitize(field: &str) -> String {
    field
        .chars()
        .map(|c| if matches!(c, '|' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

struct Line<'a> {
    account: &'a str,
    account_lib: &'a str,
    aux: Option<(&'a str, &'a str)>,
    debit: Cents,
    credit: Cents,
}

fn push_line(out: &mut String, invoice: &FecInvoice, line: Line<'_>) {
    let date = format_date(invoice.issued_on);
    let (aux_num, aux_lib) = line.aux.unwrap_or(("", ""));
    let label = format!("Facture {} {}", invoice.numero, invoice.client_name);
    let fields = [
        JOURNAL_CODE.to_string(),
        JOURNAL_LIB.to_string(),
        sanitize(&invoice.numero),
        date.clone(),
        line.account.to_string(),
        line.account_lib.to_string(),
        sanitize(aux_num),
        sanitize(aux_lib),
        sanitize(&invoice.numero),
        date.clone(),
        sanitize(&label),
        format_amount(line.debit),
        format_amount(line.credit),
        String::new(),
        String::new(),
        date,
        String::new(),
        String::new(),
    ];
    out.push_str(&fields.join("|"));
    out.push('\n');
}

/// Render the FEC file for the given invoices (already filtered by year).
pub fn render(invoices: &[FecInvoice]) -> String {
    let mut out = HEADER.join("|");
    out.push('\n');

    for invoice in invoices {
        push_line(
            &mut out,
            invoice,
            Line {
                account: ACCOUNT_CLIENTS,
                account_lib: "Clients",
                aux: Some((&invoice.client_ref, &invoice.client_name)),
                debit: invoice.totals.ttc,
                credit: 0,
            },
        );
        push_line(
            &mut out,
            invoice,
            Line {
                account: ACCOUNT_REVENUE,
                account_lib: "Prestations de services",
                aux: None,
                debit: 0,
                credit: invoice.totals.ht,
            },
        );
        if invoice.totals.tva != 0 {
            push_line(
                &mut out,
                invoice,
                Line {
                    account: ACCOUNT_VAT,
                    account_lib: "TVA collectée",
                    aux: None,
                    debit: 0,
                    credit: invoice.totals.tva,
                },
            );
        }
    }
    out
}

/// Auxiliary account reference derived from a client id (`C` + 8 hex digits).
pub fn client_account_ref(client_id: DbId) -> String {
    let hex = client_id.simple().to_string().to_uppercase();
    format!("C{}", &hex[..8])
}

/// Conventional file name: `{SIREN}FEC{YYYYMMDD}.txt` for the closing date.
pub fn file_name(siren: &str, closing_date: NaiveDate) -> String {
    format!("{siren}FEC{}.txt", format_date(closing_date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ref_is_short_and_stable() {
        let id = DbId::parse_str("0f1e2d3c-4b5a-4978-8695-a4b3c2d1e0f9").unwrap();
        assert_eq!(client_account_ref(id), "C0F1E2D3C");
    }

    fn invoice() -> FecInvoice {
        FecInvoice {
            numero: "FACT-2026-0001".into(),
            issued_on: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            client_ref: "C0001".into(),
            client_name: "Garage | Martin".into(),
            totals: Totals::new(100_000, 20_000),
        }
    }

    #[test]
    fn amount_uses_comma() {
        assert_eq!(format_amount(120_000), "1200,00");
        assert_eq!(format_amount(5), "0,05");
        assert_eq!(format_amount(-150), "-1,50");
    }

    #[test]
    fn header_has_eighteen_columns() {
        let out = render(&[]);
        assert_eq!(out.lines().count(), 1);
        assert_eq!(out.lines().next().unwrap().split('|').count(), 18);
    }

    #[test]
    fn invoice_produces_balanced_entry() {
        let out = render(&[invoice()]);
        let lines: Vec<_> = out.lines().skip(1).collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.split('|').count(), 18, "{line}");
        }
        let client: Vec<_> = lines[0].split('|').collect();
        assert_eq!(client[4], ACCOUNT_CLIENTS);
        assert_eq!(client[3], "20260309");
        assert_eq!(client[7], "Garage   Martin");
        assert_eq!(client[11], "1200,00");
        let revenue: Vec<_> = lines[1].split('|').collect();
        assert_eq!(revenue[12], "1000,00");
        let vat: Vec<_> = lines[2].split('|').collect();
        assert_eq!(vat[12], "200,00");
    }

    #[test]
    fn zero_vat_skips_vat_line() {
        let mut inv = invoice();
        inv.totals = Totals::new(10_000, 0);
        assert_eq!(render(&[inv]).lines().count(), 3);
    }

    #[test]
    fn file_name_format() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(file_name("123456789", date), "123456789FEC20261231.txt");
    }
}
