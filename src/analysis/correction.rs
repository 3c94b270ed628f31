//! OCR character confusion correction

use super::constants::CHAR_TO_DIGIT;

/// Map a single character to the digit it is usually misread as
fn correct_char(c: char) -> char {
    CHAR_TO_DIGIT
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

/// Replace visually confusable characters with their digit.
///
/// Characters outside the confusion table pass through unchanged.
pub fn fix_digits(text: &str) -> String {
    text.chars().map(correct_char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_digits_basic() {
        assert_eq!(fix_digits("O1I"), "011");
        assert_eq!(fix_digits("S|Z"), "512");
        assert_eq!(fix_digits("gq"), "99");
    }

    #[test]
    fn test_fix_digits_lowercase_z() {
        assert_eq!(fix_digits("xyz-#"), "xy2-#");
        assert_eq!(fix_digits("zZ"), "22");
    }

    #[test]
    fn test_fix_digits_empty() {
        assert_eq!(fix_digits(""), "");
    }

    #[test]
    fn test_fix_digits_passthrough() {
        assert_eq!(fix_digits("12/25"), "12/25");
        assert_eq!(fix_digits("wxy-#"), "wxy-#");
        assert_eq!(fix_digits("ñ"), "ñ");
    }
}
