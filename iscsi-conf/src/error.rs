use std::fmt;

use thiserror::Error;

use crate::types::Section;

/// A single structural defect found while building one section of the model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    #[error("{0} section is missing")]
    MissingSection(Section),

    #[error("{section} entry {index}: {reason}")]
    MalformedEntry {
        section: Section,
        index: usize,
        reason: String,
    },

    #[error("{section} entry {index}: unsupported {field} '{value}'")]
    UnsupportedEnumValue {
        section: Section,
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("{section} entry {index}: '{field}' must be {expected}")]
    TypeMismatch {
        section: Section,
        index: usize,
        field: String,
        expected: &'static str,
    },

    #[error("{section} entry {index}: '{name}' references unknown {kind} '{reference}'")]
    UnresolvedReference {
        section: Section,
        index: usize,
        name: String,
        kind: &'static str,
        reference: String,
    },
}

impl SectionError {
    /// The section this defect was found in.
    pub fn section(&self) -> Section {
        match self {
            SectionError::MissingSection(section) => *section,
            SectionError::MalformedEntry { section, .. }
            | SectionError::UnsupportedEnumValue { section, .. }
            | SectionError::TypeMismatch { section, .. }
            | SectionError::UnresolvedReference { section, .. } => *section,
        }
    }

    pub(crate) fn malformed(section: Section, index: usize, reason: impl Into<String>) -> Self {
        SectionError::MalformedEntry {
            section,
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn type_mismatch(
        section: Section,
        index: usize,
        field: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        SectionError::TypeMismatch {
            section,
            index,
            field: field.into(),
            expected,
        }
    }
}

/// Every section failure collected by one `parse` or `synthesize` call.
///
/// A `ValidationError` always means no model was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    failures: Vec<SectionError>,
    fatal: bool,
}

impl ValidationError {
    /// Collected failures; only built when at least one section failed.
    pub(crate) fn new(failures: Vec<SectionError>) -> Self {
        debug_assert!(!failures.is_empty(), "validation error without failures");
        Self {
            failures,
            fatal: false,
        }
    }

    /// A failure that stopped the build before any dependent section ran.
    pub(crate) fn fatal(failure: SectionError) -> Self {
        Self {
            failures: vec![failure],
            fatal: true,
        }
    }

    pub fn failures(&self) -> &[SectionError] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<SectionError> {
        self.failures
    }

    /// True when the build stopped at its first section and nothing else was attempted.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    /// Whether any failure belongs to `section`.
    pub fn has_section(&self, section: Section) -> bool {
        self.failures.iter().any(|f| f.section() == section)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} configuration defect(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Error type for reading a JSON document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_lists_failures() {
        let err = ValidationError::new(vec![
            SectionError::MissingSection(Section::Auth),
            SectionError::malformed(Section::Pools, 2, "duplicate pool 'rbd'"),
        ]);
        assert!(!err.is_fatal());
        assert!(err.has_section(Section::Pools));
        assert_eq!(
            err.to_string(),
            "2 configuration defect(s); auth section is missing; pools entry 2: duplicate pool 'rbd'"
        );
    }

    #[test]
    fn test_fatal_error_holds_one_failure() {
        let err = ValidationError::fatal(SectionError::MissingSection(Section::Targets));
        assert!(err.is_fatal());
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.into_failures()[0].section(), Section::Targets);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "validation error without failures")]
    fn test_empty_failure_list_rejected() {
        let _ = ValidationError::new(Vec::new());
    }
}
