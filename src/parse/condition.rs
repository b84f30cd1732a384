use std::collections::BTreeSet;

use crate::classify::{
    TokenKind, classify, get_grade, get_uoc, get_wam, is_course, is_program,
};
use crate::config::{ExclusionMap, ProgramMappings};
use crate::{Category, Condition, Logic, RuleData};

use super::category::create_category;
use super::error::{ParseError, ParseErrorKind};

/// Deepest bracket nesting a rule may use.
pub const MAX_NESTING: usize = 64;

/// A condition together with the index of the last token it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub condition: Condition,
    pub end: usize,
}

/// Recursive-descent parser from a rule's token list to a [`Condition`].
///
/// The exclusion and program-type tables are borrowed from the caller's
/// [`RuleData`]; a parser without them injects no exclusions and resolves
/// every program-type tag to an empty set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionParser<'a> {
    exclusions: Option<&'a ExclusionMap>,
    program_mappings: Option<&'a ProgramMappings>,
}

impl<'a> ConditionParser<'a> {
    #[must_use]
    pub fn new(data: &'a RuleData) -> Self {
        Self::with_caches(&data.exclusions, &data.program_mappings)
    }

    #[must_use]
    pub fn with_caches(
        exclusions: &'a ExclusionMap,
        program_mappings: &'a ProgramMappings,
    ) -> Self {
        Self {
            exclusions: Some(exclusions),
            program_mappings: Some(program_mappings),
        }
    }

    /// Parse a complete rule. When `course` is given, its cached exclusions
    /// are added to the root composite as negated conditions.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for the first malformed token; no partial tree
    /// is produced.
    pub fn create_condition<S: AsRef<str>>(
        &self,
        tokens: &[S],
        course: Option<&str>,
    ) -> Result<Condition, ParseError> {
        self.make_condition(tokens, 0, true, course)
            .map(|parsed| parsed.condition)
    }

    /// Parse one bracket level starting at `start`.
    ///
    /// A level ends at its closing `)`, whose index is returned as
    /// [`Parsed::end`]; tokens after it are left to the caller. The root
    /// level may also run to the end of the token list.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if any token in this level or a nested one is
    /// malformed, if a nested level is never closed, or if brackets nest
    /// deeper than [`MAX_NESTING`].
    pub fn make_condition<S: AsRef<str>>(
        &self,
        tokens: &[S],
        start: usize,
        is_root: bool,
        course: Option<&str>,
    ) -> Result<Parsed, ParseError> {
        let depth = usize::from(!is_root);
        self.parse_level(tokens, start, depth, course)
    }

    fn parse_level<S: AsRef<str>>(
        &self,
        tokens: &[S],
        start: usize,
        depth: usize,
        course: Option<&str>,
    ) -> Result<Parsed, ParseError> {
        let is_root = depth == 0;
        let mut conditions = Vec::new();
        let mut logic = Logic::And;

        if is_root && let Some(course) = course {
            conditions.extend(self.exclusions_for(course));
        }

        let mut i = start;
        while let Some(token) = tokens.get(i) {
            let token = token.as_ref();
            i = match token {
                "(" => {
                    if depth >= MAX_NESTING {
                        return Err(ParseError::new(i, ParseErrorKind::TooDeep));
                    }
                    let inner = self.parse_level(tokens, i + 1, depth + 1, course)?;
                    conditions.push(inner.condition);
                    inner.end + 1
                }
                ")" => {
                    return Ok(Parsed {
                        condition: Condition::Composite { conditions, logic },
                        end: i,
                    });
                }
                "&&" => {
                    logic = Logic::And;
                    i + 1
                }
                "||" => {
                    logic = Logic::Or;
                    i + 1
                }
                "[" => {
                    let (coreq, close) = parse_coreq(tokens, i)?;
                    conditions.push(coreq);
                    close + 1
                }
                _ => {
                    let (leaf, next) = self.parse_leaf(tokens, i)?;
                    conditions.push(leaf);
                    next
                }
            };
        }

        if !is_root {
            return Err(ParseError::new(
                start.saturating_sub(1),
                ParseErrorKind::UnclosedBracket,
            ));
        }
        Ok(Parsed {
            condition: Condition::Composite { conditions, logic },
            end: tokens.len().saturating_sub(1),
        })
    }

    fn exclusions_for(&self, course: &str) -> Vec<Condition> {
        let Some(map) = self.exclusions else {
            return Vec::new();
        };
        let Some(excluded) = map
            .get(course)
            .or_else(|| map.get(&course.to_ascii_uppercase()))
        else {
            return Vec::new();
        };
        excluded
            .iter()
            .filter_map(|code| {
                if is_course(code) {
                    Some(Condition::CourseExclusion(code.clone()))
                } else if is_program(code) {
                    Some(Condition::ProgramExclusion(code.clone()))
                } else {
                    tracing::warn!(
                        course,
                        exclusion = %code,
                        "ignoring exclusion that is neither a course nor a program"
                    );
                    None
                }
            })
            .collect()
    }

    fn program_type(&self, tag: &str) -> BTreeSet<String> {
        let key = tag.to_ascii_uppercase();
        match self.program_mappings.and_then(|map| map.get(&key)) {
            Some(programs) => programs.clone(),
            None => {
                tracing::warn!(tag, "unknown program type; it matches no program");
                BTreeSet::new()
            }
        }
    }

    /// Parse the leaf starting at `i`, returning it with the index of the
    /// first token after it.
    fn parse_leaf<S: AsRef<str>>(
        &self,
        tokens: &[S],
        i: usize,
    ) -> Result<(Condition, usize), ParseError> {
        let token = tokens[i].as_ref();
        let malformed = |err| ParseError::new(i, ParseErrorKind::MalformedToken(err));

        match classify(token) {
            Some(TokenKind::Course) => Ok((Condition::Course(token.to_owned()), i + 1)),
            Some(TokenKind::Uoc) => {
                let amount = get_uoc(token).map_err(malformed)?;
                let (category, next) = category_after(tokens, i)?;
                Ok((Condition::Uoc { amount, category }, next))
            }
            Some(TokenKind::Wam) => {
                let amount = get_wam(token).map_err(malformed)?;
                let (category, next) = category_after(tokens, i)?;
                Ok((Condition::Wam { amount, category }, next))
            }
            Some(TokenKind::Grade) => {
                let amount = get_grade(token).map_err(malformed)?;
                if !tokens.get(i + 1).is_some_and(|t| is_in(t.as_ref())) {
                    return Err(ParseError::new(i, ParseErrorKind::MissingIn));
                }
                let course = tokens
                    .get(i + 2)
                    .ok_or_else(|| ParseError::new(i, ParseErrorKind::MissingGradeCourse))?;
                Ok((Condition::grade(amount, course.as_ref()), i + 3))
            }
            Some(TokenKind::Program) => Ok((Condition::Program(token.to_owned()), i + 1)),
            Some(TokenKind::Specialisation) => {
                Ok((Condition::Specialisation(token.to_owned()), i + 1))
            }
            Some(TokenKind::ProgramType) => {
                let condition = Condition::ProgramType {
                    tag: token.to_owned(),
                    programs: self.program_type(token),
                };
                Ok((condition, i + 1))
            }
            Some(TokenKind::CoursePrefix | TokenKind::Level) | None => Err(ParseError::new(
                i,
                ParseErrorKind::UnexpectedToken(token.to_owned()),
            )),
        }
    }
}

fn is_in(token: &str) -> bool {
    token == "in"
}

/// The optional `in <category>` after a UOC or WAM token at `i`.
fn category_after<S: AsRef<str>>(
    tokens: &[S],
    i: usize,
) -> Result<(Category, usize), ParseError> {
    if !tokens.get(i + 1).is_some_and(|t| is_in(t.as_ref())) {
        return Ok((Category::Any, i + 1));
    }
    let rest = tokens.get(i + 2..).unwrap_or_default();
    match create_category(rest) {
        Some((category, consumed)) => Ok((category, i + 2 + consumed)),
        None => Err(ParseError::new(i, ParseErrorKind::InvalidCategory)),
    }
}

/// Scan a `[ ... ]` co-requisite opened at `open`. Returns the condition and
/// the index of the closing `]`.
fn parse_coreq<S: AsRef<str>>(
    tokens: &[S],
    open: usize,
) -> Result<(Condition, usize), ParseError> {
    let mut courses = Vec::new();
    let mut logic = Logic::And;

    for (i, token) in tokens.iter().enumerate().skip(open + 1) {
        match token.as_ref() {
            "]" => return Ok((Condition::CoReq { courses, logic }, i)),
            "&&" => logic = Logic::And,
            "||" => logic = Logic::Or,
            code if is_course(code) => courses.push(code.to_owned()),
            other => {
                return Err(ParseError::new(
                    i,
                    ParseErrorKind::UnexpectedCoreqToken(other.to_owned()),
                ));
            }
        }
    }
    Err(ParseError::new(open, ParseErrorKind::UnterminatedCoreq))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: &[&str]) -> Result<Condition, ParseError> {
        ConditionParser::default().create_condition(tokens, None)
    }

    /// The root composite wraps the outermost bracket level.
    fn root(inner: Condition) -> Condition {
        Condition::all(vec![inner])
    }

    #[test]
    fn simple_and() {
        let tree = parse(&["(", "COMP1511", "&&", "COMP1521", ")"]).unwrap();
        assert_eq!(
            tree,
            root(Condition::all(vec![
                Condition::course("COMP1511"),
                Condition::course("COMP1521"),
            ]))
        );
    }

    #[test]
    fn last_operator_wins() {
        let tree = parse(&["(", "COMP1511", "&&", "COMP1521", "||", "COMP1531", ")"]).unwrap();
        assert_eq!(
            tree,
            root(Condition::any(vec![
                Condition::course("COMP1511"),
                Condition::course("COMP1521"),
                Condition::course("COMP1531"),
            ]))
        );
    }

    #[test]
    fn nested_brackets() {
        let tokens = [
            "(", "COMP1511", "&&", "(", "MATH1131", "||", "MATH1141", ")", ")",
        ];
        let tree = parse(&tokens).unwrap();
        assert_eq!(
            tree,
            root(Condition::all(vec![
                Condition::course("COMP1511"),
                Condition::any(vec![
                    Condition::course("MATH1131"),
                    Condition::course("MATH1141"),
                ]),
            ]))
        );
    }

    #[test]
    fn nested_level_reports_closing_index() {
        let tokens = ["(", "COMP1511", ")", "extra"];
        let parsed = ConditionParser::default()
            .make_condition(&tokens, 1, false, None)
            .unwrap();
        assert_eq!(parsed.end, 2);
        assert_eq!(parsed.condition, Condition::all(vec![Condition::course("COMP1511")]));
    }

    #[test]
    fn uoc_and_wam_categories() {
        let tokens = [
            "(", "18UOC", "in", "COMP", "&&", "12UOC", "in", "L2", "MATH", "&&", "70WAM", "in",
            "S", "CSE", "&&", "36UOC", ")",
        ];
        let tree = parse(&tokens).unwrap();
        assert_eq!(
            tree,
            root(Condition::all(vec![
                Condition::uoc_in(18, Category::CoursePrefix("COMP".into())),
                Condition::uoc_in(
                    12,
                    Category::LevelCoursePrefix {
                        level: 2,
                        prefix: "MATH".into()
                    }
                ),
                Condition::wam_in(70, Category::School("S CSE".into())),
                Condition::uoc(36),
            ]))
        );
    }

    #[test]
    fn invalid_category_is_an_error() {
        let err = parse(&["(", "18UOC", "in", "COMP1511", ")"]).unwrap_err();
        assert_eq!(err, ParseError::new(1, ParseErrorKind::InvalidCategory));
    }

    #[test]
    fn grade_takes_next_token_literally() {
        let tree = parse(&["(", "65GRADE", "in", "COMP1511", ")"]).unwrap();
        assert_eq!(tree, root(Condition::all(vec![Condition::grade(65, "COMP1511")])));
    }

    #[test]
    fn grade_requires_in() {
        let err = parse(&["(", "65GRADE", "COMP1511", ")"]).unwrap_err();
        assert_eq!(err, ParseError::new(1, ParseErrorKind::MissingIn));
        let err = parse(&["65GRADE", "in"]).unwrap_err();
        assert_eq!(err, ParseError::new(0, ParseErrorKind::MissingGradeCourse));
    }

    #[test]
    fn coreq() {
        let tree = parse(&["(", "[", "COMP1511", "||", "COMP1521", "]", ")"]).unwrap();
        assert_eq!(
            tree,
            root(Condition::all(vec![Condition::coreq(
                Logic::Or,
                ["COMP1511", "COMP1521"]
            )]))
        );
    }

    #[test]
    fn coreq_errors() {
        let err = parse(&["(", "[", "COMP1511", "(", "]", ")"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::new(3, ParseErrorKind::UnexpectedCoreqToken("(".into()))
        );
        let err = parse(&["(", "[", "COMP1511", "||", "COMP1521"]).unwrap_err();
        assert_eq!(err, ParseError::new(1, ParseErrorKind::UnterminatedCoreq));
    }

    #[test]
    fn unknown_token() {
        let err = parse(&["(", "&&&", ")"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::new(1, ParseErrorKind::UnexpectedToken("&&&".into()))
        );
        let err = parse(&["(", "COMP", ")"]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken("COMP".into()));
    }

    #[test]
    fn unclosed_bracket() {
        let err = parse(&["(", "COMP1511", "&&", "(", "COMP1521", ")"]).unwrap_err();
        assert_eq!(err, ParseError::new(0, ParseErrorKind::UnclosedBracket));
    }

    #[test]
    fn closing_bracket_ends_root_level() {
        let tree = parse(&["(", "COMP1511", ")", ")"]).unwrap();
        assert_eq!(tree, root(Condition::all(vec![Condition::course("COMP1511")])));

        let parsed = ConditionParser::default()
            .make_condition(&["COMP1511", ")", "COMP1521"], 0, true, None)
            .unwrap();
        assert_eq!(parsed.end, 1);
        assert_eq!(parsed.condition, Condition::all(vec![Condition::course("COMP1511")]));
    }

    #[test]
    fn nesting_limit() {
        let mut tokens = vec!["("; MAX_NESTING];
        tokens.push("COMP1511");
        tokens.extend(vec![")"; MAX_NESTING]);
        assert!(parse(&tokens).is_ok());

        let mut tokens = vec!["("; MAX_NESTING + 1];
        tokens.push("COMP1511");
        tokens.extend(vec![")"; MAX_NESTING + 1]);
        let err = parse(&tokens).unwrap_err();
        assert_eq!(err, ParseError::new(MAX_NESTING, ParseErrorKind::TooDeep));
    }

    #[test]
    fn in_keyword_is_lower_case() {
        let err = parse(&["(", "12UOC", "IN", "COMP", ")"]).unwrap_err();
        assert_eq!(
            err,
            ParseError::new(2, ParseErrorKind::UnexpectedToken("IN".into()))
        );
        let err = parse(&["(", "65GRADE", "In", "COMP1511", ")"]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingIn);
    }

    #[test]
    fn program_specialisation_and_type_leaves() {
        let data = RuleData::new().with_program_type("COMP#", ["3778", "3784"]);
        let parser = ConditionParser::new(&data);
        let tree = parser
            .create_condition(&["(", "3778", "||", "COMPA1", "||", "COMP#", ")"], None)
            .unwrap();
        assert_eq!(
            tree,
            root(Condition::any(vec![
                Condition::Program("3778".into()),
                Condition::Specialisation("COMPA1".into()),
                Condition::ProgramType {
                    tag: "COMP#".into(),
                    programs: BTreeSet::from(["3778".to_owned(), "3784".to_owned()]),
                },
            ]))
        );
    }

    #[test]
    fn unknown_program_type_matches_nothing() {
        let tree = parse(&["(", "ACTL#", ")"]).unwrap();
        assert_eq!(
            tree,
            root(Condition::all(vec![Condition::ProgramType {
                tag: "ACTL#".into(),
                programs: BTreeSet::new(),
            }]))
        );
    }

    #[test]
    fn root_injects_exclusions() {
        let data = RuleData::new()
            .with_exclusion("COMP2521", "COMP1927")
            .with_exclusion("COMP2521", "3707")
            .with_exclusion("COMP2521", "not a code");
        let parser = ConditionParser::new(&data);
        let tree = parser
            .create_condition(&["(", "COMP1511", ")"], Some("COMP2521"))
            .unwrap();
        assert_eq!(
            tree,
            Condition::all(vec![
                Condition::ProgramExclusion("3707".into()),
                Condition::CourseExclusion("COMP1927".into()),
                Condition::all(vec![Condition::course("COMP1511")]),
            ])
        );

        // nested levels never re-inject
        let tree = parser
            .create_condition(&["(", "(", "COMP1511", ")", ")"], Some("COMP2521"))
            .unwrap();
        assert_eq!(tree.node_count(), 6);
    }

    #[test]
    fn empty_token_list() {
        assert_eq!(parse(&[]).unwrap(), Condition::all(vec![]));
        assert_eq!(parse(&["(", ")"]).unwrap(), root(Condition::all(vec![])));
    }
}
