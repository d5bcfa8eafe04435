//! Display formatting for the KPI output surface.
//! Currency as `$#,##0.00`, counts with thousands separators, rates as `0.00%`.

/// Format a revenue value as currency: `1234567.5` -> `"$1,234,567.50"`.
pub fn currency(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    format!("${}.{}", group_thousands(int_part), frac_part)
}

/// Format an order count with thousands separators: `1234` -> `"1,234"`.
pub fn count(value: usize) -> String {
    group_thousands(&value.to_string())
}

/// Format a rate as a percentage with two decimals: `12.3456` -> `"12.35%"`.
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Insert `,` separators into a run of integer digits, which may carry a
/// leading sign.
fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(currency(1234567.5), "$1,234,567.50");
        assert_eq!(currency(0.0), "$0.00");
        assert_eq!(currency(999.999), "$1,000.00");
    }

    #[test]
    fn currency_keeps_the_sign_of_refund_totals() {
        assert_eq!(currency(-1234.5), "$-1,234.50");
    }

    #[test]
    fn count_groups_thousands() {
        assert_eq!(count(0), "0");
        assert_eq!(count(999), "999");
        assert_eq!(count(1234), "1,234");
        assert_eq!(count(1234567), "1,234,567");
    }

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(percent(12.3456), "12.35%");
        assert_eq!(percent(0.0), "0.00%");
        assert_eq!(percent(100.0), "100.00%");
    }
}
