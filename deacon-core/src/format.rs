//! Display formatting helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{3})(\d{3})(\d{4})").expect("Invalid phone regex"));

/// Format the first run of ten digits as `XXX-XXX-XXXX`. Anything else is left
/// untouched.
pub fn format_phone_number(phone: &str) -> String {
    PHONE_DIGITS.replace(phone, "$1-$2-$3").into_owned()
}
