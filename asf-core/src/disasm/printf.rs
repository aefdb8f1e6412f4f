//! printf-style number formatting, so dumps read the same as the engine's own.

/// `%g` with the default precision of 6 significant digits.
pub fn format_g(value: f64) -> String {
    if let Some(special) = non_finite(value) {
        return special.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // the exponent decides the style and must be taken after rounding
    let sci = format!("{:.5e}", value);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return sci;
    };

    if (-4..6).contains(&exponent) {
        let fixed = format!("{:.*}", (5 - exponent) as usize, value);
        trim_fraction(&fixed).to_string()
    } else {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.unsigned_abs()
        )
    }
}

/// `%f`: six digits after the point.
pub fn format_f(value: f64) -> String {
    match non_finite(value) {
        Some(special) => special.to_string(),
        None => format!("{:.6}", value),
    }
}

/// Escape a string constant for a single-line dump.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some(if value.is_sign_negative() { "-nan" } else { "nan" })
    } else if value.is_infinite() {
        Some(if value < 0.0 { "-inf" } else { "inf" })
    } else {
        None
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn g_fixed() {
        assert_eq!(format_g(1.0), "1");
        assert_eq!(format_g(1.5), "1.5");
        assert_eq!(format_g(-0.25), "-0.25");
        assert_eq!(format_g(100000.0), "100000");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(3.14159265), "3.14159");
        assert_eq!(format_g(0.0), "0");
    }

    #[test]
    fn g_exponent() {
        assert_eq!(format_g(1000000.0), "1e+06");
        assert_eq!(format_g(123456789.0), "1.23457e+08");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(f32::from_bits(1) as f64), "1.4013e-45");
        // rounding carries into the exponent
        assert_eq!(format_g(9999999.0), "1e+07");
    }

    #[test]
    fn g_special() {
        assert_eq!(format_g(f64::NAN), "nan");
        assert_eq!(format_g(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_f(f64::INFINITY), "inf");
    }

    #[test]
    fn f_six_digits() {
        assert_eq!(format_f(1.5), "1.500000");
        assert_eq!(format_f(-0.1f32 as f64), "-0.100000");
    }

    #[test]
    fn escapes() {
        assert_eq!(escape("a\nb"), "a\\nb");
        assert_eq!(escape("C:\\dir"), "C:\\\\dir");
        assert_eq!(escape("plain \"quoted\""), "plain \"quoted\"");
    }
}
