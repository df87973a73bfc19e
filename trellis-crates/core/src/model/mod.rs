//! The canonical constraint representation consumed by the backends.
//!
//! Constraints reaching a backend are expected to be normalised: implications have a literal as
//! antecedent and comparisons relate atoms or a single structured expression over atoms. The
//! representation itself is more permissive, so that un-normalised input can be rendered or
//! decomposed.
mod constraints;
mod decompose;
mod display;
mod expressions;
mod variables;

pub use constraints::*;
pub use expressions::*;
pub use variables::*;

pub(crate) use decompose::auxiliary_for;

use crate::containers::HashMap;

/// A (partial) assignment of values to decision variables.
pub trait Assignment {
    fn value(&self, variable: &DecisionVariable) -> Option<i64>;
}

impl Assignment for HashMap<VariableId, i64> {
    fn value(&self, variable: &DecisionVariable) -> Option<i64> {
        self.get(&variable.id()).copied()
    }
}

impl<F> Assignment for F
where
    F: Fn(&DecisionVariable) -> Option<i64>,
{
    fn value(&self, variable: &DecisionVariable) -> Option<i64> {
        self(variable)
    }
}
