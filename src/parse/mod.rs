//! Parser from pre-tokenized rule text to [`Condition`] trees.
//!
//! A rule is a flat token list such as
//! `["(", "COMP1511", "&&", "(", "18UOC", "in", "COMP", ")", ")"]`. Round
//! brackets group, square brackets hold co-requisites, and each bracket level
//! combines its children with the last `&&`/`||` seen at that level.

mod category;
mod condition;
mod error;

pub use category::create_category;
pub use condition::{ConditionParser, MAX_NESTING, Parsed};
pub use error::{ParseError, ParseErrorKind};

use crate::Condition;

/// Parse a token list with no exclusion or program-type data.
///
/// # Errors
///
/// Returns [`ParseError`] if the tokens are not a valid rule.
pub fn create_condition<S: AsRef<str>>(tokens: &[S]) -> Result<Condition, ParseError> {
    ConditionParser::default().create_condition(tokens, None)
}
