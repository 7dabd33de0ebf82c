/// Cut a decimal string down to `digits` fractional digits.
///
/// This truncates, it never rounds: `"3.14159"` → `"3.14"`,
/// `"0.005"` → `"0.00"`, `"-2.999"` → `"-2.99"`. Integers and values with
/// fewer digits come back unchanged, and `digits == 0` drops the point.
pub fn truncate_decimal(value: &str, digits: usize) -> String {
    let value = value.trim();
    match value.find('.') {
        None => value.to_string(),
        Some(dot) if digits == 0 => value[..dot].to_string(),
        Some(dot) => {
            let end = (dot + 1 + digits).min(value.len());
            value[..end].to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn truncates_instead_of_rounding() {
        assert_eq!(truncate_decimal("3.14159", 2), "3.14");
        assert_eq!(truncate_decimal("0.005", 2), "0.00");
        assert_eq!(truncate_decimal("2.999", 2), "2.99");
        assert_eq!(truncate_decimal("-2.999", 1), "-2.9");
    }

    #[test]
    fn short_values_are_untouched() {
        assert_eq!(truncate_decimal("42", 2), "42");
        assert_eq!(truncate_decimal("1.5", 2), "1.5");
        assert_eq!(truncate_decimal("", 2), "");
    }

    #[test]
    fn zero_digits_keeps_integer_part() {
        assert_eq!(truncate_decimal("17.9", 0), "17");
    }

    proptest! {
        #[test]
        fn truncation_is_idempotent(int in -100000i64..100000, frac in "[0-9]{0,8}", n in 0usize..6) {
            let value = if frac.is_empty() { int.to_string() } else { format!("{}.{}", int, frac) };
            let once = truncate_decimal(&value, n);
            prop_assert_eq!(truncate_decimal(&once, n), once);
        }

        #[test]
        fn truncation_never_rounds_up(int in 0i64..100000, frac in "[0-9]{1,8}", n in 0usize..6) {
            let value = format!("{}.{}", int, frac);
            let cut: f64 = truncate_decimal(&value, n).parse().unwrap();
            let full: f64 = value.parse().unwrap();
            prop_assert!(cut <= full);
        }
    }
}
