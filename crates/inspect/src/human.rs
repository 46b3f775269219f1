//! Human-readable byte counts.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const STEP: f64 = 1024.0;

/// Format a byte count using the largest unit in which the value is at
/// least one.
///
/// Bytes are printed without decimals, every other unit with exactly one.
/// The integer part always carries thousands separators, which matters for
/// the byte unit (`1,023 B`) and for anything past the last unit
/// (`2,048.0 TB`).
///
/// ```
/// use trainz_inspect::human_readable;
///
/// assert_eq!(human_readable(512), "512 B");
/// assert_eq!(human_readable(1536), "1.5 KB");
/// ```
pub fn human_readable(bytes: u64) -> String {
    for (exponent, unit) in UNITS.iter().enumerate().skip(1).rev() {
        let magnitude = bytes as f64 / STEP.powi(exponent as i32);
        if magnitude >= 1.0 {
            return format!("{} {unit}", group_thousands(&format!("{magnitude:.1}")));
        }
    }
    format!("{} {}", group_thousands(&bytes.to_string()), UNITS[0])
}

/// Insert `,` every three digits of the integer part of a formatted number.
fn group_thousands(number: &str) -> String {
    let (integer, fraction) = match number.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (number, None),
    };
    let mut grouped = String::with_capacity(number.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0 B")]
    #[case(1, "1 B")]
    #[case(512, "512 B")]
    #[case(1023, "1,023 B")]
    #[case(1024, "1.0 KB")]
    #[case(1536, "1.5 KB")]
    #[case(1_048_575, "1,024.0 KB")]
    #[case(1_048_576, "1.0 MB")]
    #[case(5_347_737, "5.1 MB")]
    #[case(1_073_741_824, "1.0 GB")]
    #[case(1_099_511_627_776, "1.0 TB")]
    #[case(2_251_799_813_685_248, "2,048.0 TB")]
    #[case(u64::MAX, "16,777,216.0 TB")]
    fn test_human_readable(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(human_readable(bytes), expected);
    }

    #[rstest]
    #[case("0", "0")]
    #[case("999", "999")]
    #[case("1000", "1,000")]
    #[case("123456", "123,456")]
    #[case("1234567.8", "1,234,567.8")]
    fn test_group_thousands(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(group_thousands(input), expected);
    }
}
