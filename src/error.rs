use thiserror::Error;

/// Failure conditions reported by the codec. Every operation is a pure
/// function of its inputs, so none of these are worth retrying unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    #[error("shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("unknown configuration: {0}")]
    UnknownConfiguration(String),

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("normalization '{scheme}' requires side parameter '{parameter}'")]
    MissingSideParameter {
        scheme: &'static str,
        parameter: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;

pub(crate) fn ensure_same_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(CodecError::ShapeMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}
