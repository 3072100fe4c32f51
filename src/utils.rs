use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

const REFERRAL_CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const REFERRAL_CODE_LENGTH: usize = 9;

const COUPON_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const COUPON_CODE_LENGTH: usize = 10;

/// Referral codes are short lowercase tokens so they survive being typed
/// from a phone screen.
pub fn generate_referral_code() -> String {
    random_code(REFERRAL_CODE_CHARSET, REFERRAL_CODE_LENGTH)
}

pub fn generate_coupon_code() -> String {
    random_code(COUPON_CODE_CHARSET, COUPON_CODE_LENGTH)
}

fn random_code(charset: &[u8], length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_EXPR: Regex = Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").unwrap();
    }

    EMAIL_EXPR.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_EXPR: Regex = Regex::new(r"^\d{10}$").unwrap();
    }

    PHONE_EXPR.is_match(phone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_codes_are_nine_lowercase_alphanumerics() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 9);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn coupon_codes_are_ten_uppercase_alphanumerics() {
        let code = generate_coupon_code();
        assert_eq!(code.len(), 10);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("jane.doe@example.com"));
        assert!(is_valid_email("a@b.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("two words@example.com"));
    }

    #[test]
    fn phone_must_be_exactly_ten_digits() {
        assert!(is_valid_phone("0123456789"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("123456789012"));
        assert!(!is_valid_phone("12345abcde"));
        assert!(!is_valid_phone("123 456 78"));
    }
}
