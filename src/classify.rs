//! Token classifiers for the condition mini-language.
//!
//! Every classifier matches a whole token, ignoring ASCII case. The matching
//! `get_*` extractor returns the embedded number and fails with a
//! [`MalformedTokenError`] when called on a token its classifier rejects.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use winnow::ascii::{alpha1, digit1};
use winnow::combinator::alt;
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

/// The kinds of leaf token the condition parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Course,
    Uoc,
    Wam,
    Grade,
    Program,
    Specialisation,
    ProgramType,
    CoursePrefix,
    Level,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Course => "course code",
            Self::Uoc => "UOC quantity",
            Self::Wam => "WAM quantity",
            Self::Grade => "GRADE quantity",
            Self::Program => "program code",
            Self::Specialisation => "specialisation code",
            Self::ProgramType => "program type",
            Self::CoursePrefix => "course prefix",
            Self::Level => "level",
        };
        f.write_str(name)
    }
}

/// A value was requested from a token that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("malformed token '{token}': expected {expected}")]
pub struct MalformedTokenError {
    pub token: String,
    pub expected: TokenKind,
}

impl MalformedTokenError {
    fn new(token: &str, expected: TokenKind) -> Self {
        Self {
            token: token.to_owned(),
            expected,
        }
    }
}

/// Classify a leaf token, trying course, UOC, WAM, grade, program,
/// specialisation and program type in that order.
///
/// Category-only shapes (`COMP`, `L2`) are not leaves and yield `None`.
#[must_use]
pub fn classify(token: &str) -> Option<TokenKind> {
    if is_course(token) {
        Some(TokenKind::Course)
    } else if is_uoc(token) {
        Some(TokenKind::Uoc)
    } else if is_wam(token) {
        Some(TokenKind::Wam)
    } else if is_grade(token) {
        Some(TokenKind::Grade)
    } else if is_program(token) {
        Some(TokenKind::Program)
    } else if is_specialisation(token) {
        Some(TokenKind::Specialisation)
    } else if is_program_type(token) {
        Some(TokenKind::ProgramType)
    } else {
        None
    }
}

// -- Grammar pieces ---------------------------------------------------------

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn course_code<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (take_while(4, is_letter), take_while(4, is_digit))
        .take()
        .parse_next(input)
}

fn course_prefix<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(4, is_letter).parse_next(input)
}

/// Amounts too large for `u32` saturate to `u32::MAX` so the token still
/// classifies.
fn quantity(input: &mut &str, suffix: &str) -> ModalResult<u32> {
    let amount = digit1
        .map(|s: &str| s.parse::<u32>().unwrap_or(u32::MAX))
        .parse_next(input)?;
    alpha1
        .verify(|s: &str| s.eq_ignore_ascii_case(suffix))
        .parse_next(input)?;
    Ok(amount)
}

fn uoc_quantity(input: &mut &str) -> ModalResult<u32> {
    quantity(input, "UOC")
}

fn wam_quantity(input: &mut &str) -> ModalResult<u32> {
    quantity(input, "WAM")
}

fn grade_quantity(input: &mut &str) -> ModalResult<u32> {
    quantity(input, "GRADE")
}

fn program_code<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((
        take_while(4, is_digit),
        (take_while(5, is_letter), take_while(5, is_digit)).take(),
        (take_while(6, is_letter), take_while(4, is_digit)).take(),
    ))
    .parse_next(input)
}

fn specialisation_code<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (take_while(5, is_letter), take_while(1, is_digit))
        .take()
        .parse_next(input)
}

fn program_type_tag<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (take_while(4, is_letter), '#').take().parse_next(input)
}

fn level(input: &mut &str) -> ModalResult<u8> {
    one_of(['L', 'l']).parse_next(input)?;
    take_while(1, is_digit)
        .try_map(|s: &str| s.parse::<u8>())
        .parse_next(input)
}

// -- Public classifiers -----------------------------------------------------

/// `COMP1511`
#[must_use]
pub fn is_course(token: &str) -> bool {
    course_code.parse(token).is_ok()
}

/// `COMP`, a bare four-letter course prefix.
#[must_use]
pub fn is_course_prefix(token: &str) -> bool {
    course_prefix.parse(token).is_ok()
}

/// `18UOC`
#[must_use]
pub fn is_uoc(token: &str) -> bool {
    uoc_quantity.parse(token).is_ok()
}

/// Units of credit in a `<n>UOC` token.
///
/// # Errors
///
/// Returns [`MalformedTokenError`] if the token is not a UOC quantity.
pub fn get_uoc(token: &str) -> Result<u32, MalformedTokenError> {
    uoc_quantity
        .parse(token)
        .map_err(|_| MalformedTokenError::new(token, TokenKind::Uoc))
}

/// `70WAM`
#[must_use]
pub fn is_wam(token: &str) -> bool {
    wam_quantity.parse(token).is_ok()
}

/// WAM threshold in a `<n>WAM` token.
///
/// # Errors
///
/// Returns [`MalformedTokenError`] if the token is not a WAM quantity.
pub fn get_wam(token: &str) -> Result<u32, MalformedTokenError> {
    wam_quantity
        .parse(token)
        .map_err(|_| MalformedTokenError::new(token, TokenKind::Wam))
}

/// `65GRADE`
#[must_use]
pub fn is_grade(token: &str) -> bool {
    grade_quantity.parse(token).is_ok()
}

/// Mark threshold in a `<n>GRADE` token.
///
/// # Errors
///
/// Returns [`MalformedTokenError`] if the token is not a GRADE quantity.
pub fn get_grade(token: &str) -> Result<u32, MalformedTokenError> {
    grade_quantity
        .parse(token)
        .map_err(|_| MalformedTokenError::new(token, TokenKind::Grade))
}

/// `3778`, `ABCDE12345` or `ABCDEF1234`.
#[must_use]
pub fn is_program(token: &str) -> bool {
    program_code.parse(token).is_ok()
}

/// `COMPA1`
#[must_use]
pub fn is_specialisation(token: &str) -> bool {
    specialisation_code.parse(token).is_ok()
}

/// `ACTL#`
#[must_use]
pub fn is_program_type(token: &str) -> bool {
    program_type_tag.parse(token).is_ok()
}

/// `L2`
#[must_use]
pub fn is_level(token: &str) -> bool {
    level.parse(token).is_ok()
}

/// Level digit in an `L<n>` token.
///
/// # Errors
///
/// Returns [`MalformedTokenError`] if the token is not a level.
pub fn get_level(token: &str) -> Result<u8, MalformedTokenError> {
    level
        .parse(token)
        .map_err(|_| MalformedTokenError::new(token, TokenKind::Level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_codes() {
        assert!(is_course("COMP1511"));
        assert!(is_course("comp1511"));
        assert!(!is_course("COMP151"));
        assert!(!is_course("COMP15111"));
        assert!(!is_course("COM1511"));
        assert!(!is_course("COMP1511 "));
    }

    #[test]
    fn quantities() {
        assert!(is_uoc("18UOC"));
        assert!(is_uoc("18uoc"));
        assert!(!is_uoc("UOC"));
        assert!(!is_uoc("18UOCS"));
        assert_eq!(get_uoc("144UOC"), Ok(144));

        assert!(is_wam("70WAM"));
        assert_eq!(get_wam("70wam"), Ok(70));
        assert!(!is_wam("70UOC"));

        assert!(is_grade("65GRADE"));
        assert_eq!(get_grade("65Grade"), Ok(65));
        assert!(!is_grade("65GRADES"));
    }

    #[test]
    fn extracting_from_wrong_kind_fails() {
        let err = get_uoc("70WAM").unwrap_err();
        assert_eq!(err.token, "70WAM");
        assert_eq!(err.expected, TokenKind::Uoc);
        assert_eq!(
            err.to_string(),
            "malformed token '70WAM': expected UOC quantity"
        );
        assert!(get_grade("COMP1511").is_err());
        assert!(get_level("L").is_err());
    }

    #[test]
    fn quantity_overflow_saturates() {
        assert!(is_uoc("99999999999UOC"));
        assert_eq!(get_uoc("99999999999UOC"), Ok(u32::MAX));
        assert_eq!(get_grade("4294967296GRADE"), Ok(u32::MAX));
    }

    #[test]
    fn program_codes() {
        assert!(is_program("3778"));
        assert!(is_program("ABCDE12345"));
        assert!(is_program("ABCDEF1234"));
        assert!(!is_program("377"));
        assert!(!is_program("37781"));
        assert!(!is_program("COMP1511"));
    }

    #[test]
    fn specialisations_and_program_types() {
        assert!(is_specialisation("COMPA1"));
        assert!(is_specialisation("compa1"));
        assert!(!is_specialisation("COMPA12"));
        assert!(is_program_type("ACTL#"));
        assert!(!is_program_type("ACTL"));
        assert!(!is_program_type("ACT#"));
    }

    #[test]
    fn category_shapes() {
        assert!(is_course_prefix("COMP"));
        assert!(is_course_prefix("math"));
        assert!(!is_course_prefix("COMP1"));
        assert!(is_level("L2"));
        assert!(is_level("l3"));
        assert_eq!(get_level("L4"), Ok(4));
        assert!(!is_level("L23"));
    }

    #[test]
    fn classification_order() {
        assert_eq!(classify("COMP1511"), Some(TokenKind::Course));
        assert_eq!(classify("6UOC"), Some(TokenKind::Uoc));
        assert_eq!(classify("80WAM"), Some(TokenKind::Wam));
        assert_eq!(classify("50GRADE"), Some(TokenKind::Grade));
        assert_eq!(classify("3707"), Some(TokenKind::Program));
        assert_eq!(classify("SENGAH"), None);
        assert_eq!(classify("SENGA1"), Some(TokenKind::Specialisation));
        assert_eq!(classify("ACTL#"), Some(TokenKind::ProgramType));
        assert_eq!(classify("COMP"), None);
        assert_eq!(classify("&&&"), None);
    }
}
