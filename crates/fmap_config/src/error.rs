//! Errors raised while reading a project file.

use std::path::PathBuf;

/// A project file that could not be read, parsed, or validated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The path that was opened.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// The content is not valid TOML or does not match the schema.
    #[error("malformed project file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required field is missing or empty.
    #[error("missing required field `{0}`")]
    MissingField(String),

    /// A field holds a value outside its allowed range.
    #[error("invalid `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = ConfigError::Io {
            path: PathBuf::from("/proj/fmap.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "cannot read /proj/fmap.toml: no such file");
    }

    #[test]
    fn invalid_names_the_field() {
        let err = ConfigError::invalid("mapping.io_weight", "must be within [0, 1], got 1.5");
        assert_eq!(
            err.to_string(),
            "invalid `mapping.io_weight`: must be within [0, 1], got 1.5"
        );
    }
}
