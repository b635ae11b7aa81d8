//! Numeral normalization for form input typed on Dari/Pashto keyboards.

/// Minimum number of digits for a contact number.
pub const MIN_PHONE_DIGITS: usize = 9;

/// Afghanistan country calling code.
const COUNTRY_CODE: &str = "93";

/// Digits of a national number after the trunk `0`.
const NATIONAL_DIGITS: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumberError {
    #[error("value is empty")]
    Empty,
    #[error("'{0}' is not a whole number")]
    NotANumber(String),
    #[error("'{0}' is too large")]
    Overflow(String),
    #[error("phone number needs at least {MIN_PHONE_DIGITS} digits (found {0})")]
    PhoneTooShort(usize),
}

fn ascii_digit(ch: char) -> Option<char> {
    let offset = match ch {
        '۰'..='۹' => ch as u32 - '۰' as u32,
        '٠'..='٩' => ch as u32 - '٠' as u32,
        _ => return None,
    };
    char::from_digit(offset, 10)
}

/// Map Extended Arabic-Indic and Arabic-Indic digits to ASCII, leaving
/// everything else untouched.
pub fn normalize_digits(raw: &str) -> String {
    raw.chars()
        .map(|ch| ascii_digit(ch).unwrap_or(ch))
        .collect()
}

/// Parse a whole amount such as a price or salary. Whitespace and thousands
/// separators are ignored; a leading zero is formatting.
pub fn parse_amount(raw: &str) -> Result<u64, NumberError> {
    let cleaned: String = normalize_digits(raw)
        .chars()
        .filter(|ch| !ch.is_whitespace() && !matches!(ch, ',' | '٬' | '_'))
        .collect();

    if cleaned.is_empty() {
        return Err(NumberError::Empty);
    }
    if !cleaned.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(NumberError::NotANumber(raw.trim().to_string()));
    }

    cleaned
        .parse::<u64>()
        .map_err(|_| NumberError::Overflow(raw.trim().to_string()))
}

/// Like [`parse_amount`], but blank input means zero.
pub fn parse_optional_amount(raw: &str) -> Result<u64, NumberError> {
    match parse_amount(raw) {
        Err(NumberError::Empty) => Ok(0),
        other => other,
    }
}

/// Rewrite `93…` and `0093…` international forms of a national number to
/// the `0…` form so one person has one identity.
fn national_form(digits: String) -> String {
    let national = digits
        .strip_prefix("00")
        .unwrap_or(digits.as_str())
        .strip_prefix(COUNTRY_CODE)
        .filter(|rest| rest.len() == NATIONAL_DIGITS)
        .map(|rest| format!("0{rest}"));
    national.unwrap_or(digits)
}

/// Keep only the digits of a contact number, after normalization, in
/// national form.
pub fn normalize_phone(raw: &str) -> Result<String, NumberError> {
    let normalized = normalize_digits(raw);
    if normalized
        .chars()
        .any(|ch| !ch.is_ascii_digit() && !matches!(ch, ' ' | '-' | '+' | '(' | ')' | '.'))
    {
        return Err(NumberError::NotANumber(raw.trim().to_string()));
    }

    let digits: String = normalized.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(NumberError::Empty);
    }
    if digits.len() < MIN_PHONE_DIGITS {
        return Err(NumberError::PhoneTooShort(digits.len()));
    }
    Ok(national_form(digits))
}
