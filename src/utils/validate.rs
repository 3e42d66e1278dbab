use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

// Indian registration plates, e.g. DL01AB1234.
static NUMBER_PLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z]{1,2}[0-9]{4}$").unwrap());

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_number_plate(plate: &str) -> bool {
    NUMBER_PLATE_RE.is_match(plate)
}

pub fn is_in_future(dt: DateTime<Utc>) -> bool {
    dt > Utc::now()
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_phone_numbers() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("98765"));
        assert!(!is_valid_phone("98765432101"));
        assert!(!is_valid_phone("98765-4321"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_number_plates() {
        assert!(is_valid_number_plate("DL01AB1234"));
        assert!(is_valid_number_plate("MH12A4567"));
        assert!(!is_valid_number_plate("dl01ab1234"));
        assert!(!is_valid_number_plate("DL1AB1234"));
        assert!(!is_valid_number_plate("DL01ABC1234"));
        assert!(!is_valid_number_plate(""));
    }

    #[test]
    fn test_future_dates() {
        assert!(is_in_future(Utc::now() + Duration::hours(1)));
        assert!(!is_in_future(Utc::now() - Duration::hours(1)));
    }
}
