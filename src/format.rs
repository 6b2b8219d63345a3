/// Renders a count the way the widget displays it: `999`, `1.5K`, `2.5M`.
///
/// The fraction is rounded half away from zero to one decimal place.
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        return with_suffix(tenths(n, 100_000), 'M');
    }
    if n >= 1_000 {
        return with_suffix(tenths(n, 100), 'K');
    }
    n.to_string()
}

fn tenths(n: u64, unit: u64) -> u64 {
    n / unit + u64::from(n % unit >= unit / 2)
}

fn with_suffix(tenths: u64, suffix: char) -> String {
    format!("{}.{}{suffix}", tenths / 10, tenths % 10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_are_exact() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(7), "7");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn thousands_use_k_suffix() {
        assert_eq!(format_count(1_000), "1.0K");
        assert_eq!(format_count(1_500), "1.5K");
        assert_eq!(format_count(1_049), "1.0K");
        assert_eq!(format_count(1_050), "1.1K");
        assert_eq!(format_count(999_949), "999.9K");
        assert_eq!(format_count(999_999), "1000.0K");
    }

    #[test]
    fn millions_use_m_suffix() {
        assert_eq!(format_count(1_000_000), "1.0M");
        assert_eq!(format_count(1_250_000), "1.3M");
        assert_eq!(format_count(2_500_000), "2.5M");
        assert_eq!(format_count(123_456_789), "123.5M");
    }

    #[test]
    fn largest_value_does_not_overflow() {
        assert_eq!(format_count(u64::MAX), "18446744073709.6M");
    }
}
