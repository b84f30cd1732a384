//! Rule data loaded once at startup and handed to the parser.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::ConfigError;

/// Course code -> codes (courses or programs) that exclude it.
pub type ExclusionMap = BTreeMap<String, BTreeSet<String>>;

/// Program-type tag (e.g. `ACTL#`) -> program codes it denotes.
pub type ProgramMappings = BTreeMap<String, BTreeSet<String>>;

/// Pre-tokenized rules plus the side tables the parser consults.
#[derive(Debug, Clone, Default)]
pub struct RuleData {
    pub tokens: BTreeMap<String, Vec<String>>,
    pub exclusions: ExclusionMap,
    pub program_mappings: ProgramMappings,
}

/// Locations of the three rule data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulePaths {
    pub tokens: PathBuf,
    pub exclusions: PathBuf,
    pub program_mappings: PathBuf,
}

impl RulePaths {
    /// The conventional file names inside `dir`: `conditionsTokens.json`,
    /// `exclusions.json` and `programMappings.json`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            tokens: dir.join("conditionsTokens.json"),
            exclusions: dir.join("exclusions.json"),
            program_mappings: dir.join("programMappings.json"),
        }
    }
}

/// Exclusions are cached either as a list of codes or as an object keyed by
/// code.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExclusionEntry {
    List(Vec<String>),
    Keyed(BTreeMap<String, serde_json::Value>),
}

impl ExclusionEntry {
    fn into_codes(self) -> BTreeSet<String> {
        match self {
            Self::List(codes) => codes.into_iter().collect(),
            Self::Keyed(map) => map.into_keys().collect(),
        }
    }
}

impl RuleData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tokens<I, S>(mut self, course: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.insert(
            course.to_owned(),
            tokens.into_iter().map(Into::into).collect(),
        );
        self
    }

    #[must_use]
    pub fn with_exclusion(mut self, course: &str, excluded: &str) -> Self {
        self.exclusions
            .entry(course.to_owned())
            .or_default()
            .insert(excluded.to_owned());
        self
    }

    #[must_use]
    pub fn with_program_type<I, S>(mut self, tag: &str, programs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program_mappings.insert(
            tag.to_owned(),
            programs.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Build rule data from the three JSON documents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] naming the document that failed to parse.
    pub fn from_json(
        tokens: &str,
        exclusions: &str,
        program_mappings: &str,
    ) -> Result<Self, ConfigError> {
        let tokens = parse_json(tokens, "condition tokens")?;
        let raw: BTreeMap<String, ExclusionEntry> = parse_json(exclusions, "exclusions")?;
        let program_mappings = parse_json(program_mappings, "program mappings")?;

        let data = Self {
            tokens,
            exclusions: raw
                .into_iter()
                .map(|(course, entry)| (course, entry.into_codes()))
                .collect(),
            program_mappings,
        };
        tracing::info!(
            rules = data.tokens.len(),
            exclusions = data.exclusions.len(),
            program_types = data.program_mappings.len(),
            "loaded rule data"
        );
        Ok(data)
    }

    /// Read and parse the three rule data files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on I/O or JSON failure.
    pub fn from_files(paths: &RulePaths) -> Result<Self, ConfigError> {
        let tokens = read(&paths.tokens)?;
        let exclusions = read(&paths.exclusions)?;
        let program_mappings = read(&paths.program_mappings)?;
        Self::from_json(&tokens, &exclusions, &program_mappings)
    }
}

fn parse_json<T: DeserializeOwned>(input: &str, what: &'static str) -> Result<T, ConfigError> {
    serde_json::from_str(input).map_err(|source| ConfigError::Json { what, source })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
