//! Input validation and display formatting
//!
//! Every function here is total and pure: malformed input yields `false` or
//! a best-effort formatted string, never an error. Formatters work on the
//! digits of their input only, so they can be applied on every keystroke.

use regex::Regex;
use std::sync::OnceLock;

const PHONE_DIGITS: usize = 11;
const CEP_DIGITS: usize = 8;
const CPF_DIGITS: usize = 11;
const CNPJ_DIGITS: usize = 14;
const USER_ID_WIDTH: usize = 4;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Failed to compile validation regex"))
}

/// Keep only ASCII digits
pub fn digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn digits_truncated(value: &str, max: usize) -> String {
    value.chars().filter(char::is_ascii_digit).take(max).collect()
}

fn replace_first(re: &Regex, value: &str, replacement: &str) -> String {
    re.replacen(value, 1, replacement).into_owned()
}

/// Validate email
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    regex(&EMAIL_REGEX, r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_match(email)
}

/// Validate password: at least 8 characters with a letter and a digit
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Validate a phone number (area code plus 9 digits)
pub fn validate_phone(phone: &str) -> bool {
    digits(phone).len() == PHONE_DIGITS
}

/// Validate a CEP (Brazilian postal code)
pub fn validate_cep(cep: &str) -> bool {
    digits(cep).len() == CEP_DIGITS
}

/// Format as `(DD) DDDDD-DDDD`, progressively for partial input
pub fn format_phone(value: &str) -> String {
    static AREA: OnceLock<Regex> = OnceLock::new();
    static LINE: OnceLock<Regex> = OnceLock::new();

    let digits = digits_truncated(value, PHONE_DIGITS);
    let with_area = replace_first(regex(&AREA, r"(\d{2})(\d)"), &digits, "($1) $2");
    replace_first(regex(&LINE, r"(\d{5})(\d)"), &with_area, "$1-$2")
}

/// Format as `DDDDD-DDD`
pub fn format_cep(value: &str) -> String {
    static CEP: OnceLock<Regex> = OnceLock::new();

    let digits = digits_truncated(value, CEP_DIGITS);
    replace_first(regex(&CEP, r"(\d{5})(\d)"), &digits, "$1-$2")
}

fn to_numbers(digits: &str) -> Vec<u32> {
    digits.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(numbers: &[u32]) -> bool {
    numbers.windows(2).all(|pair| pair[0] == pair[1])
}

/// Mod-11 check digit: remainder below 2 maps to 0
fn check_digit(sum: u32) -> u32 {
    match sum % 11 {
        remainder if remainder < 2 => 0,
        remainder => 11 - remainder,
    }
}

fn cpf_check_digit(base: &[u32]) -> u32 {
    let top = base.len() as u32 + 1;
    let sum: u32 = base
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    check_digit(sum)
}

/// Validate a CPF (individual tax id)
pub fn validate_cpf(cpf: &str) -> bool {
    let numbers = to_numbers(&digits(cpf));
    if numbers.len() != CPF_DIGITS || all_same(&numbers) {
        return false;
    }

    cpf_check_digit(&numbers[..9]) == numbers[9] && cpf_check_digit(&numbers[..10]) == numbers[10]
}

fn cnpj_check_digit(base: &[u32]) -> u32 {
    // Weights run 2..=9 cyclically from the rightmost digit
    let sum: u32 = base
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| d * (2 + (i as u32 % 8)))
        .sum();
    check_digit(sum)
}

/// Validate a CNPJ (business tax id)
pub fn validate_cnpj(cnpj: &str) -> bool {
    let numbers = to_numbers(&digits(cnpj));
    if numbers.len() != CNPJ_DIGITS || all_same(&numbers) {
        return false;
    }

    cnpj_check_digit(&numbers[..12]) == numbers[12]
        && cnpj_check_digit(&numbers[..13]) == numbers[13]
}

/// Format as `DDD.DDD.DDD-DD`, progressively for partial input
pub fn format_cpf(value: &str) -> String {
    static GROUP: OnceLock<Regex> = OnceLock::new();
    static CHECK: OnceLock<Regex> = OnceLock::new();

    let group = regex(&GROUP, r"(\d{3})(\d)");
    let digits = digits_truncated(value, CPF_DIGITS);
    let formatted = replace_first(group, &digits, "$1.$2");
    let formatted = replace_first(group, &formatted, "$1.$2");
    replace_first(regex(&CHECK, r"(\d{3})(\d{1,2})$"), &formatted, "$1-$2")
}

/// Format as `DD.DDD.DDD/DDDD-DD`, progressively for partial input
pub fn format_cnpj(value: &str) -> String {
    static ROOT: OnceLock<Regex> = OnceLock::new();
    static GROUP: OnceLock<Regex> = OnceLock::new();
    static CHECK: OnceLock<Regex> = OnceLock::new();

    let group = regex(&GROUP, r"(\d{3})(\d)");
    let digits = digits_truncated(value, CNPJ_DIGITS);
    let formatted = replace_first(regex(&ROOT, r"(\d{2})(\d)"), &digits, "$1.$2");
    let formatted = replace_first(group, &formatted, "$1.$2");
    let formatted = replace_first(group, &formatted, "$1/$2");
    replace_first(regex(&CHECK, r"(\d{4})(\d{1,2})$"), &formatted, "$1-$2")
}

/// Zero-pad the digits of an issued code to at least four characters
pub fn format_user_id(id: &str) -> String {
    format!("{:0>width$}", digits(id), width = USER_ID_WIDTH)
}
