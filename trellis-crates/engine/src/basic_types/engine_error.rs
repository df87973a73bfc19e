use thiserror::Error;

#[cfg(doc)]
use crate::Solver;

/// Errors related to creating variables and posting constraints to the [`Solver`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A variable was created without any value in its domain.
    #[error("the domain of variable '{0}' is empty")]
    EmptyDomain(String),
    /// The number of coefficients of a linear constraint does not match its number of terms.
    #[error("expected {expected} coefficients for the linear constraint, got {actual}")]
    MismatchedCoefficients { expected: usize, actual: usize },
}

/// Marker for a domain that became empty, or a propagator that found the current domains to be
/// infeasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Inconsistency;

pub(crate) type PropagationStatus = Result<(), Inconsistency>;
