//! Shape-preserving value masking for demo exports.
//!
//! Masked values keep their type, length and character classes while every
//! digit, letter and temporal component is randomized. Masking is not seeded
//! and therefore not reproducible across calls.

use crate::value::Value;
use chrono::Duration;
use rand::Rng;

/// Maximum day shift applied to date-bearing values, in either direction.
pub const DATE_SHIFT_DAYS: i64 = 5;
/// Maximum minute shift applied to time-of-day values, in either direction.
pub const TIME_SHIFT_MINUTES: i64 = 30;

/// Masks a value.
///
/// `time_only` selects time-of-day masking for columns that carry no date;
/// it is decided by the caller from the column type.
pub fn mask_value(value: &Value, time_only: bool) -> Value {
    let mut rng = rand::rng();
    mask_with(&mut rng, value, time_only)
}

fn mask_with<R: Rng + ?Sized>(rng: &mut R, value: &Value, time_only: bool) -> Value {
    match value {
        Value::Int(i) => Value::Int(mask_integer(rng, *i)),
        Value::Float(f) => Value::Float(mask_float(rng, *f)),
        Value::Decimal(s) => Value::Decimal(mask_digits(rng, s)),
        Value::Text(s) => Value::Text(mask_text(rng, s)),
        Value::Date(d) => Value::Date(*d + Duration::days(day_shift(rng))),
        Value::DateTime(dt) if time_only => Value::DateTime(*dt + Duration::minutes(minute_shift(rng))),
        Value::DateTime(dt) => Value::DateTime(*dt + Duration::days(day_shift(rng))),
        Value::Time(t) => Value::Time(*t + Duration::minutes(minute_shift(rng))),
        Value::List(items) => Value::List(items.iter().map(|v| mask_with(rng, v, time_only)).collect()),
        Value::Record(fields) => Value::Record(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), mask_with(rng, v, time_only)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Binary(_) => value.clone(),
    }
}

fn day_shift<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.random_range(-DATE_SHIFT_DAYS..=DATE_SHIFT_DAYS)
}

fn minute_shift<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.random_range(-TIME_SHIFT_MINUTES..=TIME_SHIFT_MINUTES)
}

fn random_digit<R: Rng + ?Sized>(rng: &mut R, nonzero: bool) -> char {
    let low = u32::from(nonzero);
    char::from_digit(rng.random_range(low..10), 10).unwrap_or('1')
}

/// Replaces every ASCII digit of a decimal string with a random digit.
///
/// The integer part keeps a nonzero leading digit when it has more than one
/// digit or carries a sign, and the fractional part keeps a nonzero final
/// digit, so re-parsing the result reproduces the same digit layout.
pub(crate) fn mask_digits<R: Rng + ?Sized>(rng: &mut R, text: &str) -> String {
    let int_len = text
        .chars()
        .take_while(|c| *c != '.')
        .filter(char::is_ascii_digit)
        .count();
    let frac_len = text
        .chars()
        .skip_while(|c| *c != '.')
        .filter(char::is_ascii_digit)
        .count();

    let signed = text.starts_with('-');
    let mut int_seen = 0usize;
    let mut frac_seen = 0usize;
    let mut in_fraction = false;
    text.chars()
        .map(|c| {
            if c == '.' {
                in_fraction = true;
                return c;
            }
            if !c.is_ascii_digit() {
                return c;
            }
            if in_fraction {
                frac_seen += 1;
                random_digit(rng, frac_seen == frac_len)
            } else {
                int_seen += 1;
                random_digit(rng, int_seen == 1 && (int_len > 1 || signed))
            }
        })
        .collect()
}

fn mask_integer<R: Rng + ?Sized>(rng: &mut R, value: i64) -> i64 {
    let masked = mask_digits(rng, &value.to_string());
    masked.parse().unwrap_or_else(|_| {
        // Out of i64 range after randomizing; pin the leading digit low.
        let mut chars: Vec<char> = masked.chars().collect();
        if let Some(first) = chars.iter_mut().find(|c| c.is_ascii_digit()) {
            *first = '1';
        }
        chars.into_iter().collect::<String>().parse().unwrap_or(value)
    })
}

fn mask_float<R: Rng + ?Sized>(rng: &mut R, value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    mask_digits(rng, &value.to_string()).parse().unwrap_or(value)
}

fn mask_text<R: Rng + ?Sized>(rng: &mut R, text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_digit() {
                random_digit(rng, false)
            } else if c.is_alphabetic() {
                let letter = char::from(rng.random_range(b'a'..=b'z'));
                if c.is_lowercase() {
                    letter
                } else {
                    letter.to_ascii_uppercase()
                }
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;

    fn layout(text: &str) -> Vec<char> {
        text.chars()
            .map(|c| if c.is_ascii_digit() { '9' } else { c })
            .collect()
    }

    fn class(c: char) -> u8 {
        if c.is_ascii_digit() {
            0
        } else if c.is_alphabetic() {
            1
        } else {
            2
        }
    }

    #[test]
    fn test_null_bool_binary_unchanged() {
        assert_eq!(mask_value(&Value::Null, false), Value::Null);
        assert_eq!(mask_value(&Value::Bool(true), false), Value::Bool(true));
        assert_eq!(
            mask_value(&Value::Binary(vec![1, 2]), false),
            Value::Binary(vec![1, 2])
        );
    }

    #[test]
    fn test_date_shift_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date");
        for _ in 0..200 {
            let Value::Date(masked) = mask_value(&Value::Date(date), false) else {
                panic!("date stays a date");
            };
            assert!((masked - date).num_days().abs() <= DATE_SHIFT_DAYS);
        }
    }

    #[test]
    fn test_time_only_datetime_shifts_minutes() {
        let dt = NaiveDate::from_ymd_opt(1900, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid datetime");
        for _ in 0..200 {
            let Value::DateTime(masked) = mask_value(&Value::DateTime(dt), true) else {
                panic!("datetime stays a datetime");
            };
            assert!((masked - dt).num_minutes().abs() <= TIME_SHIFT_MINUTES);
        }
    }

    #[test]
    fn test_time_wraps_within_day() {
        let t = NaiveTime::from_hms_opt(23, 50, 0).expect("valid time");
        assert!(matches!(mask_value(&Value::Time(t), true), Value::Time(_)));
    }

    #[test]
    fn test_composites_recurse() {
        let value = Value::Record(vec![
            ("code".into(), Value::Text("AB-12".into())),
            ("tags".into(), Value::List(vec![Value::Int(42), Value::Null])),
        ]);
        let Value::Record(fields) = mask_value(&value, false) else {
            panic!("record stays a record");
        };
        assert_eq!(fields[0].0, "code");
        let Value::Text(code) = &fields[0].1 else {
            panic!("text stays text");
        };
        assert_eq!(layout(code).len(), 5);
        assert_eq!(code.chars().nth(2), Some('-'));
        let Value::List(tags) = &fields[1].1 else {
            panic!("list stays a list");
        };
        assert_eq!(tags[1], Value::Null);
    }

    proptest! {
        #[test]
        fn prop_text_keeps_length_class_and_case(text in "[a-zA-Z0-9 ,.@_\\-ÄöЖж]{0,32}") {
            let Value::Text(masked) = mask_value(&Value::Text(text.clone()), false) else {
                panic!("text stays text");
            };
            prop_assert_eq!(masked.chars().count(), text.chars().count());
            for (a, b) in text.chars().zip(masked.chars()) {
                prop_assert_eq!(class(a), class(b));
                if a.is_alphabetic() {
                    prop_assert_eq!(a.is_lowercase(), b.is_lowercase());
                }
                if class(a) == 2 {
                    prop_assert_eq!(a, b);
                }
            }
        }

        #[test]
        fn prop_integer_keeps_digit_count_and_sign(value in any::<i64>()) {
            let Value::Int(masked) = mask_value(&Value::Int(value), false) else {
                panic!("integer stays integer");
            };
            prop_assert_eq!(layout(&masked.to_string()), layout(&value.to_string()));
        }

        #[test]
        fn prop_float_keeps_digit_layout(int_part in 0u32..100_000, frac in 1u32..1000) {
            let value: f64 = format!("{int_part}.{frac}").parse().expect("valid float");
            let Value::Float(masked) = mask_value(&Value::Float(value), false) else {
                panic!("float stays float");
            };
            prop_assert_eq!(layout(&masked.to_string()), layout(&value.to_string()));
        }

        #[test]
        fn prop_decimal_text_keeps_layout(text in "-?[1-9][0-9]{0,20}\\.[0-9]{1,6}") {
            let Value::Decimal(masked) = mask_value(&Value::Decimal(text.clone()), false) else {
                panic!("decimal stays decimal");
            };
            prop_assert_eq!(layout(&masked), layout(&text));
        }
    }
}
