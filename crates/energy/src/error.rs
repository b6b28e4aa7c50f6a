use std::fmt;

use structure::StructureError;

/// Failure to load/parse an embedded parameter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamError(pub String);

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parameter file error: {}", self.0)
    }
}

impl std::error::Error for ParamError {}

/// The single error type returned by the public entry point, composing every
/// failure mode from structure parsing, pair classification, and
/// evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    Structure(StructureError),
    IllegalPair { i: usize, j: usize },
    Param(ParamError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Structure(e) => write!(f, "{e}"),
            CoreError::IllegalPair { i, j } => {
                write!(f, "illegal (non-canonical) pair at positions {i} and {j}")
            }
            CoreError::Param(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<StructureError> for CoreError {
    fn from(e: StructureError) -> Self {
        CoreError::Structure(e)
    }
}

impl From<structure::IllegalPairError> for CoreError {
    fn from(e: structure::IllegalPairError) -> Self {
        CoreError::IllegalPair { i: e.i, j: e.j }
    }
}

impl From<ParamError> for CoreError {
    fn from(e: ParamError) -> Self {
        CoreError::Param(e)
    }
}
