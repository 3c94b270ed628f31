//! Cross-frame field accumulation and locking
//!
//! Bank name, card number and holder name lock after the same value is seen
//! on `required_ticks` consecutive observations. The expiry date is built
//! digit by digit: once a slot holds a digit it keeps it.

use super::card::{CardField, ParsedCardFields};

/// Expiry digit slots: month tens, month ones, year tens, year ones
pub type ExpiryDigits = [Option<char>; 4];

/// Last observed value of a field and how many times in a row it was seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccumulator {
    pub value: String,
    pub count: u32,
}

/// Per-session accumulation state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatorState {
    pub bank_name: Option<FieldAccumulator>,
    pub card_number: Option<FieldAccumulator>,
    pub holder_name: Option<FieldAccumulator>,
    pub expiry_digits: ExpiryDigits,
}

impl AccumulatorState {
    fn tracker_mut(&mut self, field: CardField) -> Option<&mut Option<FieldAccumulator>> {
        match field {
            CardField::BankName => Some(&mut self.bank_name),
            CardField::CardNumber => Some(&mut self.card_number),
            CardField::HolderName => Some(&mut self.holder_name),
            CardField::Expiry => None,
        }
    }
}

/// Outcome of merging a partial expiry into the digit slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryAccumulation {
    pub digits: ExpiryDigits,
    /// `MM/YY` once all four slots hold a valid month and year
    pub complete: Option<String>,
}

/// Outcome of one accumulation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatorUpdate {
    pub state: AccumulatorState,
    pub locked: ParsedCardFields,
    /// True when all four fields are locked
    pub all_locked: bool,
}

/// Merge a partial `before/after` expiry into the digit slots.
///
/// Filled slots are never overwritten. A single month digit only fills the
/// month ones slot. A filled but out-of-range month never completes.
pub fn accumulate_expiry(current: &ExpiryDigits, partial: Option<&str>) -> ExpiryAccumulation {
    let mut digits = *current;

    if let Some(partial) = partial.filter(|p| !p.is_empty()) {
        let mut parts = partial.split('/');
        let before: Vec<char> = parts.next().unwrap_or("").chars().collect();
        let after: Vec<char> = parts.next().unwrap_or("").chars().collect();

        match before.len() {
            0 => {}
            1 => {
                digits[1].get_or_insert(before[0]);
            }
            n => {
                digits[0].get_or_insert(before[n - 2]);
                digits[1].get_or_insert(before[n - 1]);
            }
        }
        if let Some(&c) = after.first() {
            digits[2].get_or_insert(c);
        }
        if let Some(&c) = after.get(1) {
            digits[3].get_or_insert(c);
        }
    }

    let complete = match digits {
        [Some(m1), Some(m2), Some(y1), Some(y2)] => {
            let month: u32 = format!("{}{}", m1, m2).parse().unwrap_or(0);
            (1..=12)
                .contains(&month)
                .then(|| format!("{}{}/{}{}", m1, m2, y1, y2))
        }
        _ => None,
    };

    ExpiryAccumulation { digits, complete }
}

/// Fold one frame's parsed fields into the accumulation state.
///
/// Locked fields are never touched again. A field missing from this frame
/// leaves its counter alone; a different value restarts it at 1.
pub fn update_accumulator(
    state: &AccumulatorState,
    locked: &ParsedCardFields,
    parsed: &ParsedCardFields,
    required_ticks: u32,
) -> AccumulatorUpdate {
    let mut state = state.clone();
    let mut locked = locked.clone();

    for field in CardField::STANDARD {
        if field.get(&locked).is_some() {
            continue;
        }
        let Some(observed) = field.get(parsed).filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(tracker) = state.tracker_mut(field) else {
            continue;
        };

        let count = match tracker {
            Some(acc) if acc.value == observed => acc.count + 1,
            _ => 1,
        };
        *tracker = Some(FieldAccumulator {
            value: observed.to_string(),
            count,
        });

        if count >= required_ticks {
            field.set(&mut locked, observed.to_string());
        }
    }

    if locked.expiry.is_none() {
        let expiry = accumulate_expiry(&state.expiry_digits, parsed.expiry.as_deref());
        state.expiry_digits = expiry.digits;
        locked.expiry = expiry.complete;
    }

    let all_locked = locked.is_complete();
    AccumulatorUpdate {
        state,
        locked,
        all_locked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::parser::parse_card_from_detections;
    use crate::vision::OcrDetection;

    fn fields(
        bank: Option<&str>,
        card: Option<&str>,
        expiry: Option<&str>,
        holder: Option<&str>,
    ) -> ParsedCardFields {
        ParsedCardFields {
            bank_name: bank.map(String::from),
            card_number: card.map(String::from),
            expiry: expiry.map(String::from),
            holder_name: holder.map(String::from),
        }
    }

    /// First tick of a fresh session
    fn first_tick(parsed: &ParsedCardFields, required_ticks: u32) -> AccumulatorUpdate {
        update_accumulator(
            &AccumulatorState::default(),
            &ParsedCardFields::default(),
            parsed,
            required_ticks,
        )
    }

    #[test]
    fn test_expiry_single_month_digit() {
        let acc = accumulate_expiry(&[None, None, None, None], Some("1/25"));
        assert_eq!(acc.digits, [None, Some('1'), Some('2'), Some('5')]);
        assert_eq!(acc.complete, None);
    }

    #[test]
    fn test_expiry_already_complete() {
        let current = [Some('0'), Some('1'), Some('2'), Some('5')];
        let acc = accumulate_expiry(&current, None);
        assert_eq!(acc.digits, current);
        assert_eq!(acc.complete.as_deref(), Some("01/25"));
    }

    #[test]
    fn test_expiry_invalid_month_never_completes() {
        let mut digits = [None, None, None, None];
        for _ in 0..5 {
            let acc = accumulate_expiry(&digits, Some("13/25"));
            assert_eq!(acc.complete, None);
            digits = acc.digits;
        }
        assert_eq!(digits, [Some('1'), Some('3'), Some('2'), Some('5')]);

        // A correct later reading cannot repair locked-in slots
        let acc = accumulate_expiry(&digits, Some("12/25"));
        assert_eq!(acc.complete, None);
    }

    #[test]
    fn test_expiry_slots_never_overwritten() {
        let acc = accumulate_expiry(&[None, None, None, None], Some("08/"));
        assert_eq!(acc.digits, [Some('0'), Some('8'), None, None]);

        let acc = accumulate_expiry(&acc.digits, Some("11/27"));
        assert_eq!(acc.digits, [Some('0'), Some('8'), Some('2'), Some('7')]);
        assert_eq!(acc.complete.as_deref(), Some("08/27"));
    }

    #[test]
    fn test_expiry_uses_rightmost_month_digits() {
        let acc = accumulate_expiry(&[None, None, None, None], Some("412/2025"));
        assert_eq!(acc.digits, [Some('1'), Some('2'), Some('2'), Some('0')]);
        assert_eq!(acc.complete.as_deref(), Some("12/20"));
    }

    #[test]
    fn test_expiry_empty_partial() {
        let acc = accumulate_expiry(&[None, None, None, None], Some(""));
        assert_eq!(acc.digits, [None, None, None, None]);
        let acc = accumulate_expiry(&acc.digits, Some("/"));
        assert_eq!(acc.digits, [None, None, None, None]);
    }

    #[test]
    fn test_lock_after_required_ticks() {
        let parsed = fields(Some("ABC"), None, None, None);
        let first = first_tick(&parsed, 2);
        assert_eq!(first.locked.bank_name, None);
        assert_eq!(first.state.bank_name.as_ref().unwrap().count, 1);

        let second = update_accumulator(&first.state, &first.locked, &parsed, 2);
        assert_eq!(second.locked.bank_name.as_deref(), Some("ABC"));
        assert!(!second.all_locked);
    }

    #[test]
    fn test_mismatch_resets_count() {
        let first = update_accumulator(
            &AccumulatorState::default(),
            &ParsedCardFields::default(),
            &fields(Some("ABC"), None, None, None),
            2,
        );
        let abd = fields(Some("ABD"), None, None, None);
        let second = update_accumulator(&first.state, &first.locked, &abd, 2);
        assert_eq!(second.locked.bank_name, None);
        assert_eq!(
            second.state.bank_name,
            Some(FieldAccumulator {
                value: "ABD".to_string(),
                count: 1
            })
        );
    }

    #[test]
    fn test_absence_is_not_disagreement() {
        let parsed = fields(None, Some("4111111111111111"), None, None);
        let first = first_tick(&parsed, 2);
        let gap = update_accumulator(&first.state, &first.locked, &ParsedCardFields::default(), 2);
        assert_eq!(gap.state.card_number.as_ref().unwrap().count, 1);

        let third = update_accumulator(&gap.state, &gap.locked, &parsed, 2);
        assert_eq!(third.locked.card_number.as_deref(), Some("4111111111111111"));
    }

    #[test]
    fn test_required_ticks_one_locks_immediately() {
        let parsed = fields(None, None, None, Some("JOHN SMITH"));
        let update = first_tick(&parsed, 1);
        assert_eq!(update.locked.holder_name.as_deref(), Some("JOHN SMITH"));
    }

    #[test]
    fn test_locked_field_is_immutable_and_idempotent() {
        let parsed = fields(Some("ABC"), None, None, None);
        let first = first_tick(&parsed, 1);
        assert_eq!(first.locked.bank_name.as_deref(), Some("ABC"));

        let again = update_accumulator(&first.state, &first.locked, &parsed, 1);
        assert_eq!(again, first);

        let xyz = fields(Some("XYZ"), None, None, None);
        let other = update_accumulator(&first.state, &first.locked, &xyz, 1);
        assert_eq!(other.locked.bank_name.as_deref(), Some("ABC"));
        assert_eq!(other.state.bank_name, first.state.bank_name);
    }

    #[test]
    fn test_locked_expiry_stops_accumulating() {
        let first = update_accumulator(
            &AccumulatorState::default(),
            &ParsedCardFields::default(),
            &fields(None, None, Some("01/25"), None),
            2,
        );
        assert_eq!(first.locked.expiry.as_deref(), Some("01/25"));

        let later = fields(None, None, Some("12/30"), None);
        let second = update_accumulator(&first.state, &first.locked, &later, 2);
        assert_eq!(second.locked.expiry.as_deref(), Some("01/25"));
        assert_eq!(second.state.expiry_digits, first.state.expiry_digits);
    }

    #[test]
    fn test_frames_lock_all_fields() {
        let frames = vec![
            vec![
                OcrDetection::new("ACME BANK"),
                OcrDetection::new("4111 1111 1111 1111"),
                OcrDetection::new("1/2"),
            ],
            vec![
                OcrDetection::new("ACME BANK"),
                OcrDetection::new("4111 1111 1111 1111"),
                OcrDetection::new("JOHN SMITH"),
            ],
            vec![
                OcrDetection::new("ACME BANK"),
                OcrDetection::new("4111 1111 1111 1111"),
                OcrDetection::new("VALID THRU 01/25"),
                OcrDetection::new("JOHN SMITH"),
            ],
        ];

        let mut state = AccumulatorState::default();
        let mut locked = ParsedCardFields::default();
        let mut all_locked = Vec::new();
        for frame in &frames {
            let parsed = parse_card_from_detections(frame);
            let update = update_accumulator(&state, &locked, &parsed, 2);
            state = update.state;
            locked = update.locked;
            all_locked.push(update.all_locked);
        }

        assert_eq!(all_locked, vec![false, false, true]);
        assert_eq!(
            locked,
            fields(Some("ACME BANK"), Some("4111111111111111"), Some("01/25"), Some("JOHN SMITH"))
        );
    }
}
