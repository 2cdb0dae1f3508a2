//! Human-readable transfer rates.

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Render a rate in bytes/second; `None` renders as `N/A`.
pub fn format_speed(bytes_per_sec: Option<u64>) -> String {
    match bytes_per_sec {
        None => "N/A".to_string(),
        Some(b) if b < KIB => format!("{} B/s", b),
        Some(b) if b < MIB => format!("{:.2} KB/s", b as f64 / KIB as f64),
        Some(b) => format!("{:.2} MB/s", b as f64 / MIB as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(None), "N/A");
        assert_eq!(format_speed(Some(0)), "0 B/s");
        assert_eq!(format_speed(Some(500)), "500 B/s");
        assert_eq!(format_speed(Some(1023)), "1023 B/s");
        assert_eq!(format_speed(Some(1024)), "1.00 KB/s");
        assert_eq!(format_speed(Some(2048)), "2.00 KB/s");
        assert_eq!(format_speed(Some(1536)), "1.50 KB/s");
        assert_eq!(format_speed(Some(5 * 1024 * 1024)), "5.00 MB/s");
        assert_eq!(format_speed(Some(MIB - 1)), "1024.00 KB/s");
    }
}
