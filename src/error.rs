use thiserror::Error;

/// Why a sentence was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SentenceFault {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },

    #[error("first field is empty, no sigil or serial number")]
    MissingSigil,

    #[error("field '{field}' is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum HeatflowError {
    #[error("Malformed sentence ({fault}): {line:?}")]
    MalformedSentence { line: String, fault: SentenceFault },

    #[error("Invalid coefficient spec '{name}': {reason}")]
    InvalidCoeffSpec { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HeatflowError {
    pub(crate) fn malformed(line: &str, fault: SentenceFault) -> Self {
        Self::MalformedSentence {
            line: line.to_string(),
            fault,
        }
    }

    pub(crate) fn invalid_coeff(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCoeffSpec {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HeatflowError>;
