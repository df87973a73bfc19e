//! The propagators which enforce the constraints that can be posted to the [`Solver`].
//!
//! A propagator removes values from the domains of its variables which cannot be part of any
//! solution of its constraint. Propagators are allowed to be weak, but each of them must report
//! an [`Inconsistency`] once all of its variables are fixed to values which violate the
//! constraint; the search relies on this to never accept an invalid solution.

mod all_different;
mod arithmetic;
mod boolean;
mod comparison;
mod linear;
mod reified;

use std::fmt::Debug;

pub(crate) use all_different::AllDifferentPropagator;
pub use arithmetic::ArithmeticOperator;
pub(crate) use arithmetic::AbsoluteValuePropagator;
pub(crate) use arithmetic::ArithmeticPropagator;
pub(crate) use boolean::ConjunctionPropagator;
pub(crate) use boolean::DisjunctionPropagator;
pub(crate) use boolean::XorPropagator;
pub(crate) use comparison::EqualsPropagator;
pub(crate) use comparison::LessThanPropagator;
pub(crate) use comparison::NotEqualsPropagator;
pub(crate) use linear::LinearEqualityPropagator;
pub(crate) use reified::ReifiedPropagator;

#[cfg(doc)]
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::containers::StorageKey;
use crate::engine::Assignments;
#[cfg(doc)]
use crate::Solver;
use crate::variables::IntView;

pub(crate) trait Propagator: Debug {
    /// Name of the constraint, used in log messages.
    fn name(&self) -> &str;

    /// The views the propagator depends on. The propagator is scheduled whenever the domain of
    /// one of them changes.
    fn variables(&self) -> Vec<IntView>;

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus;

    /// Returns true if propagating in the current state would lead to an inconsistency. The
    /// domains are left untouched.
    fn detect_inconsistency(&self, assignments: &mut Assignments) -> bool {
        assignments
            .try_and_undo(|assignments| self.propagate(assignments))
            .is_err()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct PropagatorId(u32);

impl StorageKey for PropagatorId {
    fn index(&self) -> usize {
        self.0 as usize
    }

    fn create_from_index(index: usize) -> Self {
        PropagatorId(index as u32)
    }
}
