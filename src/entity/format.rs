/// Display formatting for dashboard figures

/// Abbreviate large counts: `1500 -> "1.5K"`, `2_500_000 -> "2.5M"`
pub fn format_number(value: u64) -> String {
    // Thousands rounded half up to one decimal
    let tenths = value.saturating_add(50) / 100;
    if value >= 1_000_000 || tenths >= 10_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1_000 {
        format!("{}.{}K", tenths / 10, tenths % 10)
    } else {
        value.to_string()
    }
}

/// Render an amount with its currency symbol, grouping and two decimals
pub fn format_currency(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let fraction = cents % 100;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{whole}.{fraction:02}"),
        None => format!("{sign}{} {whole}.{fraction:02}", currency.to_uppercase()),
    }
}

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency.to_uppercase().as_str() {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1.0K");
        assert_eq!(format_number(1500), "1.5K");
        assert_eq!(format_number(2_500_000), "2.5M");
    }

    #[test]
    fn test_format_number_rolls_over_to_millions() {
        assert_eq!(format_number(999_949), "999.9K");
        assert_eq!(format_number(999_950), "1.0M");
        assert_eq!(format_number(999_999), "1.0M");
        assert_eq!(format_number(1_000_000), "1.0M");
        assert_eq!(format_number(1_049), "1.0K");
        assert_eq!(format_number(1_050), "1.1K");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0, "USD"), "$0.00");
        assert_eq!(format_currency(1234.5, "USD"), "$1,234.50");
        assert_eq!(format_currency(1_000_000.0, "eur"), "€1,000,000.00");
        assert_eq!(format_currency(-42.129, "GBP"), "-£42.13");
        assert_eq!(format_currency(99.999, "CHF"), "CHF 100.00");
    }
}
