//! Single-frame card field parser
//!
//! Turns one frame's OCR detections into a best-effort [`ParsedCardFields`].
//! The card number acts as the anchor line: text above it is treated as the
//! bank name, text below it is searched for the expiry date and holder name.
//! Card numbers split across several detections are reassembled from their
//! bounding boxes.

use super::card::ParsedCardFields;
use super::constants::{
    contains_banned_word, CARD_NUMBER_MAX_DIGITS, CARD_NUMBER_MIN_DIGITS, MISSING_BBOX_X_STRIDE,
    SAME_LINE_TOLERANCE,
};
use super::correction::fix_digits;
use crate::vision::{BboxPoint, OcrDetection};

/// A trimmed, non-empty detection
struct Line<'a> {
    text: &'a str,
    top_left: Option<BboxPoint>,
}

/// Card number and the index of the line it was found on
struct CardAnchor {
    digits: String,
    line_index: usize,
}

/// Detection carrying enough digits to be part of a split card number
struct DigitRun {
    line_index: usize,
    digits: String,
    x: f32,
    y: f32,
}

/// Possible expiry date seen below the card number
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExpiryCandidate {
    before: String,
    after: String,
    year: u32,
}

/// Parse card fields from one frame of OCR detections.
///
/// Never fails; fields that cannot be found stay `None`.
pub fn parse_card_from_detections(detections: &[OcrDetection]) -> ParsedCardFields {
    let mut result = ParsedCardFields::default();

    let lines: Vec<Line> = detections
        .iter()
        .filter_map(|d| {
            let text = d.text.trim();
            (!text.is_empty()).then(|| Line {
                text,
                top_left: d.top_left(),
            })
        })
        .collect();

    let Some(anchor) = find_single_card_number(&lines).or_else(|| find_split_card_number(&lines))
    else {
        return result;
    };
    let anchor_index = anchor.line_index;
    result.card_number = Some(anchor.digits);
    result.bank_name = bank_name(&lines[..anchor_index]);

    let mut candidates = Vec::new();
    for line in &lines[anchor_index + 1..] {
        if let Some(candidate) = expiry_candidate(line.text) {
            candidates.push(candidate);
            continue;
        }
        if result.holder_name.is_none() {
            result.holder_name = holder_name(line.text);
        }
    }

    result.expiry = select_expiry(candidates);
    result
}

fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

fn is_card_length(len: usize) -> bool {
    (CARD_NUMBER_MIN_DIGITS..=CARD_NUMBER_MAX_DIGITS).contains(&len)
}

/// First detection that on its own holds a card-length digit run
fn find_single_card_number(lines: &[Line]) -> Option<CardAnchor> {
    lines.iter().enumerate().find_map(|(line_index, line)| {
        let digits = digits_only(line.text);
        is_card_length(digits.len()).then_some(CardAnchor { digits, line_index })
    })
}

/// Reassemble a card number from digit groups sharing a line, left to right.
///
/// Every digit group is tried as the anchor of a line. The longest
/// card-length concatenation wins; equal lengths go to the line whose
/// leftmost group sits highest, then furthest left.
fn find_split_card_number(lines: &[Line]) -> Option<CardAnchor> {
    let runs: Vec<DigitRun> = lines
        .iter()
        .enumerate()
        .filter_map(|(line_index, line)| {
            let digits = digits_only(line.text);
            if digits.len() < 3 {
                return None;
            }
            let (x, y) = match line.top_left {
                Some(p) => (p.x, p.y),
                None => (line_index as f32 * MISSING_BBOX_X_STRIDE, 0.0),
            };
            Some(DigitRun { line_index, digits, x, y })
        })
        .collect();

    if runs.len() < 2 {
        return None;
    }

    let mut best: Option<(String, &DigitRun)> = None;
    for anchor in &runs {
        let mut same_line: Vec<&DigitRun> = runs
            .iter()
            .filter(|run| (run.y - anchor.y).abs() < SAME_LINE_TOLERANCE)
            .collect();
        same_line.sort_by(|a, b| a.x.total_cmp(&b.x));

        let combined: String = same_line.iter().map(|run| run.digits.as_str()).collect();
        if !is_card_length(combined.len()) {
            continue;
        }
        let leftmost = same_line[0];

        let better = match &best {
            None => true,
            Some((current, lead)) => {
                combined.len() > current.len()
                    || (combined.len() == current.len()
                        && leftmost
                            .y
                            .total_cmp(&lead.y)
                            .then(leftmost.x.total_cmp(&lead.x))
                            .is_lt())
            }
        };
        if better {
            best = Some((combined, leftmost));
        }
    }

    best.map(|(digits, leftmost)| CardAnchor {
        digits,
        line_index: leftmost.line_index,
    })
}

/// Join the lines above the card number that contain real words
fn bank_name(lines: &[Line]) -> Option<String> {
    let texts: Vec<&str> = lines
        .iter()
        .map(|line| line.text)
        .filter(|text| text.chars().filter(char::is_ascii_alphabetic).count() >= 2)
        .collect();
    (!texts.is_empty()).then(|| texts.join(" "))
}

/// Two-digit year prefix of the digits after the separator, 0 if absent
fn year_value(after: &str) -> u32 {
    let prefix: String = after.chars().take(2).collect();
    prefix.parse().unwrap_or(0)
}

/// Look for an expiry date in a detection.
///
/// A slash is read with confusable characters corrected on either side; text
/// without a usable slash falls back to a `M[M] sep YY[YY]` pattern.
fn expiry_candidate(text: &str) -> Option<ExpiryCandidate> {
    let chars: Vec<char> = text.chars().collect();

    if let Some(slash) = chars.iter().position(|&c| c == '/') {
        let before: String = chars[slash.saturating_sub(4)..slash].iter().collect();
        let after: String = chars[slash + 1..(slash + 5).min(chars.len())].iter().collect();
        let before = digits_only(&fix_digits(&before));
        let after = digits_only(&fix_digits(&after));
        if !before.is_empty() || !after.is_empty() {
            let year = year_value(&after);
            return Some(ExpiryCandidate { before, after, year });
        }
    }

    let (month, year) = match_date_pattern(&chars)?;
    let before = format!("{:0>2}", month);
    let after = year[year.len() - 2..].to_string();
    let year = after.parse().unwrap_or(0);
    Some(ExpiryCandidate { before, after, year })
}

/// Leftmost match of `(\d{1,2})\s?[/-]\s?(\d{2,4})`, returning both digit groups
fn match_date_pattern(chars: &[char]) -> Option<(String, String)> {
    let is_digit = |i: usize| chars.get(i).is_some_and(char::is_ascii_digit);
    let skip_space = |i: usize| {
        if chars.get(i).is_some_and(|c| c.is_whitespace()) {
            i + 1
        } else {
            i
        }
    };

    for start in 0..chars.len() {
        for month_len in [2, 1] {
            if !(start..start + month_len).all(is_digit) {
                continue;
            }
            let mut pos = skip_space(start + month_len);
            if !matches!(chars.get(pos), Some('/') | Some('-')) {
                continue;
            }
            pos = skip_space(pos + 1);

            let year_len = (pos..pos + 4).take_while(|&i| is_digit(i)).count();
            if year_len < 2 {
                continue;
            }
            let month: String = chars[start..start + month_len].iter().collect();
            let year: String = chars[pos..pos + year_len].iter().collect();
            return Some((month, year));
        }
    }
    None
}

/// Two or three plain words that are not card boilerplate
fn holder_name(text: &str) -> Option<String> {
    let alpha: String = text
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect();
    let alpha = alpha.trim();
    if alpha.chars().count() < 3 {
        return None;
    }

    let words: Vec<&str> = alpha
        .split_whitespace()
        .filter(|word| word.len() >= 2)
        .filter(|word| !contains_banned_word(word))
        .collect();
    (2..=3).contains(&words.len()).then(|| words.join(" "))
}

/// Prefer the candidate with the latest year; the first one seen wins ties
fn select_expiry(mut candidates: Vec<ExpiryCandidate>) -> Option<String> {
    candidates.sort_by(|a, b| b.year.cmp(&a.year));
    candidates
        .into_iter()
        .next()
        .map(|c| format!("{}/{}", c.before, c.after))
}
