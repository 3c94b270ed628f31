//! Card field records and terminal scan results

use serde::{Deserialize, Serialize};

use super::accumulator::ExpiryDigits;

/// Fields extracted from a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardField {
    BankName,
    CardNumber,
    Expiry,
    HolderName,
}

impl CardField {
    /// Fields locked by consecutive identical observations
    pub const STANDARD: [CardField; 3] = [
        CardField::BankName,
        CardField::CardNumber,
        CardField::HolderName,
    ];

    /// Every field, in display order
    pub const ALL: [CardField; 4] = [
        CardField::BankName,
        CardField::CardNumber,
        CardField::Expiry,
        CardField::HolderName,
    ];

    /// Display name used in result summaries
    pub fn label(&self) -> &'static str {
        match self {
            CardField::BankName => "Bank Name",
            CardField::CardNumber => "Card Number",
            CardField::Expiry => "Expiry Date",
            CardField::HolderName => "Cardholder Name",
        }
    }

    /// Read this field from a record
    pub fn get<'a>(&self, fields: &'a ParsedCardFields) -> Option<&'a str> {
        match self {
            CardField::BankName => fields.bank_name.as_deref(),
            CardField::CardNumber => fields.card_number.as_deref(),
            CardField::Expiry => fields.expiry.as_deref(),
            CardField::HolderName => fields.holder_name.as_deref(),
        }
    }

    /// Write this field into a record
    pub fn set(&self, fields: &mut ParsedCardFields, value: String) {
        let slot = match self {
            CardField::BankName => &mut fields.bank_name,
            CardField::CardNumber => &mut fields.card_number,
            CardField::Expiry => &mut fields.expiry,
            CardField::HolderName => &mut fields.holder_name,
        };
        *slot = Some(value);
    }
}

/// Card fields extracted from one frame, or the set of locked fields.
///
/// A `None` field means "not seen", never "confirmed absent".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCardFields {
    pub bank_name: Option<String>,
    pub card_number: Option<String>,
    /// Expiry formatted as `MM/YY`
    pub expiry: Option<String>,
    pub holder_name: Option<String>,
}

impl ParsedCardFields {
    /// True when every field holds a value
    pub fn is_complete(&self) -> bool {
        self.bank_name.is_some()
            && self.card_number.is_some()
            && self.expiry.is_some()
            && self.holder_name.is_some()
    }

    /// True when the fields needed to fill a payment form hold a value
    pub fn has_essentials(&self) -> bool {
        self.card_number.is_some() && self.expiry.is_some() && self.holder_name.is_some()
    }
}

/// Final output of a scan session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedCard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
    /// Human-readable summary, including which fields need manual entry
    pub raw: String,
}

/// Build the terminal result from the locked fields
pub fn build_scanned_card(locked: &ParsedCardFields, timed_out: bool) -> ScannedCard {
    let Some(card_number) = locked.card_number.clone() else {
        return ScannedCard {
            raw: "Could not parse Card Data. Please fill manually.".to_string(),
            ..Default::default()
        };
    };

    let missing: Vec<&str> = [CardField::Expiry, CardField::HolderName]
        .iter()
        .filter(|field| field.get(locked).is_none())
        .map(|field| field.label())
        .collect();
    let missing_msg = if timed_out && !missing.is_empty() {
        format!("\nCould not parse: {}. Please fill manually.", missing.join(", "))
    } else {
        String::new()
    };

    let (expiry_month, expiry_year) = locked
        .expiry
        .as_deref()
        .and_then(|e| e.split_once('/'))
        .map_or((None, None), |(month, year)| {
            (Some(month.to_string()), Some(year.to_string()))
        });

    ScannedCard {
        card_number: Some(card_number),
        expiry_month,
        expiry_year,
        holder_name: locked.holder_name.clone(),
        raw: format!(
            "Bank: {}{}",
            locked.bank_name.as_deref().unwrap_or("N/A"),
            missing_msg
        ),
    }
}

/// Render partially accumulated expiry digits, `_` marking empty slots
pub fn expiry_progress(digits: &ExpiryDigits) -> Option<String> {
    if digits.iter().all(Option::is_none) {
        return None;
    }
    let slot = |i: usize| digits[i].unwrap_or('_');
    Some(format!("{}{}/{}{}", slot(0), slot(1), slot(2), slot(3)))
}

/// Fields to show the user this tick: locked values win over this frame's
pub fn display_fields(
    locked: &ParsedCardFields,
    parsed: &ParsedCardFields,
    expiry_digits: &ExpiryDigits,
) -> ParsedCardFields {
    ParsedCardFields {
        bank_name: locked.bank_name.clone().or_else(|| parsed.bank_name.clone()),
        card_number: locked.card_number.clone().or_else(|| parsed.card_number.clone()),
        expiry: locked.expiry.clone().or_else(|| expiry_progress(expiry_digits)),
        holder_name: locked.holder_name.clone().or_else(|| parsed.holder_name.clone()),
    }
}

/// Group a card number into blocks of four for display
pub fn format_card_number(number: &str) -> String {
    number
        .chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Multi-line live summary handed to scan observers
pub fn ocr_text_summary(display: &ParsedCardFields) -> String {
    format!(
        "Bank: {}\nCard: {}\nDate: {}\nName: {}",
        display.bank_name.as_deref().unwrap_or("..."),
        display
            .card_number
            .as_deref()
            .map(format_card_number)
            .unwrap_or_else(|| "...".to_string()),
        display.expiry.as_deref().unwrap_or("..."),
        display.holder_name.as_deref().unwrap_or("..."),
    )
}
