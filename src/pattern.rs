use std::fmt;

/// Thin wrapper over `fancy_regex` so callers see one error type.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    backend: fancy_regex::Regex,
}

impl Pattern {
    pub(crate) fn new(pattern: &str) -> Result<Self, PatternError> {
        let backend = fancy_regex::Regex::new(pattern).map_err(PatternError::from)?;
        Ok(Self { backend })
    }

    pub(crate) fn find<'t>(&self, input: &'t str) -> Result<Option<&'t str>, PatternError> {
        let matched = self.backend.find(input).map_err(PatternError::from)?;
        Ok(matched.map(|m| m.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    message: String,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PatternError {}

impl From<fancy_regex::Error> for PatternError {
    fn from(value: fancy_regex::Error) -> Self {
        Self {
            message: value.to_string(),
        }
    }
}
