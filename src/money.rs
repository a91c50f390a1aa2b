/// Parses a pt-BR formatted amount ("1.234,56") into a number.
///
/// Thousands separators (`.`) are dropped and the decimal comma becomes a
/// point. Anything that still does not parse, including the empty string and
/// non-finite results, yields `0.0`: a malformed value extracted by the model
/// must never abort an aggregation.
pub fn parse_amount(value: &str) -> f64 {
    let normalized = value.trim().replace('.', "").replacen(',', ".", 1);

    match normalized.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => parsed,
        _ => 0.0,
    }
}

/// Renders an amount in pt-BR notation with exactly two decimals.
pub fn format_amount(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{},{:02}", sign, grouped, fraction)
}

pub fn format_currency(value: f64) -> String {
    format!("R$ {}", format_amount(value))
}
