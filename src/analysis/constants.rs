//! Shared constants for card field extraction

/// Seconds before a scan session gives up
pub const DEFAULT_TIMEOUT_SECS: u32 = 120;

/// Milliseconds between capture attempts
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 1000;

/// Consecutive identical observations needed to lock a field
pub const DEFAULT_REQUIRED_TICKS: u32 = 2;

/// Shortest digit run accepted as a card number
pub const CARD_NUMBER_MIN_DIGITS: usize = 13;

/// Longest digit run accepted as a card number
pub const CARD_NUMBER_MAX_DIGITS: usize = 19;

/// Vertical distance under which two detections share a line
pub const SAME_LINE_TOLERANCE: f32 = 30.0;

/// Horizontal stride used to order detections that carry no bounding box
pub const MISSING_BBOX_X_STRIDE: f32 = 1000.0;

/// Characters OCR commonly confuses with digits, and the digit they stand for
#[rustfmt::skip]
pub const CHAR_TO_DIGIT: &[(char, char)] = &[
    ('O', '0'), ('o', '0'), ('D', '0'),
    ('I', '1'), ('l', '1'), ('i', '1'), ('|', '1'),
    ('Z', '2'), ('z', '2'),
    ('E', '3'), ('B', '8'),
    ('A', '4'), ('a', '4'), ('U', '4'), ('u', '4'),
    ('S', '5'), ('s', '5'),
    ('G', '6'), ('b', '6'), ('L', '6'),
    ('T', '1'), ('t', '1'),
    ('g', '9'), ('q', '9'),
];

/// Words printed on cards that are never part of a holder name.
///
/// Matched as lowercase substrings of each candidate word.
#[rustfmt::skip]
pub const BANNED_WORDS: &[&str] = &[
    // English
    "card", "holder", "cardholder", "expires", "expiry", "expiration",
    "valid", "thru", "through", "from", "member", "since", "date", "last",
    "visa", "mastercard", "amex", "american", "express", "discover",
    "maestro", "debit", "credit", "platinum", "gold", "classic", "signature",
    "bank", "international", "electronic", "use", "only", "month", "year",
    "number", "name", "first", "middle", "security", "code", "cvv", "cvc", "exp", "pin",
    "issued", "customer", "account", "prepaid", "business", "corporate",
    "world", "elite", "premium", "rewards", "contactless", "chip",
    // Spanish
    "tarjeta", "titular", "vencimiento", "vence", "valida", "valido",
    "desde", "miembro", "nombre", "fecha", "debito", "credito",
    "habiente", "tarjetahabiente", "segundo", "apellido", "primer",
    "numero", "cliente", "cuenta", "emision", "banco", "sucursal",
];

/// Returns true if the word contains any banned term (case-insensitive)
pub fn contains_banned_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    BANNED_WORDS.iter().any(|banned| lower.contains(banned))
}
