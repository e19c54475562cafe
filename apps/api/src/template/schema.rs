//! Declared term-sheet fields and the Fallback Table.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::template::fields::{FieldMapping, LOGO_BLOCK_FIELD, LOGO_FIELD};

pub const PROGRAM_COLOR_FIELD: &str = "program_color";
pub const GENERATION_DATE_FIELD: &str = "generation_date";

/// Every field the DSCR term sheet knows about. A placeholder whose name is not
/// listed here (and was not supplied by the caller) is left in the output.
pub const TERM_SHEET_FIELDS: &[&str] = &[
    LOGO_FIELD,
    LOGO_BLOCK_FIELD,
    PROGRAM_COLOR_FIELD,
    GENERATION_DATE_FIELD,
    "program",
    // Borrower & guarantors
    "borrower_name",
    "guarantor_name",
    "fico_score",
    "experience",
    "citizenship",
    // Property
    "property_address",
    "street",
    "street_address",
    "city_state_zip",
    "property_type",
    "sq_footage",
    "date_purchased",
    "appraised_value",
    // Loan structure
    "transaction_type",
    "loan_purpose",
    "loan_structure",
    "loan_term",
    "io_period",
    "ppp",
    "prepayment_penalty",
    "interest_rate",
    "leverage",
    "ltv",
    "loan_amount",
    "dscr",
    // Fees
    "origination",
    "rate_buydown",
    "underwriting_fee",
    "legal_fee",
    "lender_fee",
    "lender_fee_origination",
    "broker_fee_origination",
    "lender_fee_legal",
    "lawyer_fee",
    "title_fee",
    "recording_fee",
    // Cash & escrows
    "liquidity_required",
    "cash_to_close",
    "cash_due_at_closing",
    "downpayment_payoff_payment",
    "purchaseprice_payoff",
    "escrows",
    "reserves",
    "mortgage_debt",
    "cash_out",
    "cash_out_to_borrower",
    "hoi_escrow",
    "flood_escrow",
    "tax_escrow",
    "pitia_escrow",
    "hoi_premium",
    "flood_premium",
    "per_diem",
    // Sources & uses
    "loan_proceeds",
    "total_sources",
    "total_uses",
];

/// The set of field names the engine substitutes even when the caller omits them.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    names: HashSet<String>,
}

impl FieldSchema {
    pub fn term_sheet() -> Self {
        Self::new(TERM_SHEET_FIELDS.iter().copied())
    }

    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            names: names.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Default display values for fields wholly absent from the mapping.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    defaults: BTreeMap<String, String>,
}

impl FallbackTable {
    /// Term-sheet defaults: the configured accent colour and the render date.
    pub fn term_sheet(accent_color: &str, generation_date: NaiveDate) -> Self {
        let mut table = Self::default();
        table.insert(PROGRAM_COLOR_FIELD, accent_color);
        table.insert(GENERATION_DATE_FIELD, &format_generation_date(generation_date));
        table
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.defaults.insert(name.to_string(), value.to_string());
    }

    /// The default for `name`, unless the mapping carries the key at all
    /// (an explicit empty string or null still wins over the fallback).
    pub fn lookup(&self, name: &str, mapping: &FieldMapping) -> Option<&str> {
        if mapping.contains(name) {
            return None;
        }
        self.defaults.get(name).map(String::as_str)
    }
}

/// `October 18, 2026`
pub fn format_generation_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}
