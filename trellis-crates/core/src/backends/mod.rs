//! The backends a model can be lowered onto.
//!
//! * [`ApiBackend`] posts the constraints directly into the in-process engine.
//! * [`MiniZincBackend`] renders the constraints as a MiniZinc program and runs the `minizinc`
//!   executable on it.
mod api;
mod minizinc;

use std::fmt::Debug;
use std::time::Duration;

pub use api::ApiBackend;
pub use api::ApiStatus;
pub use minizinc::MiniZincBackend;
pub use minizinc::MiniZincStatus;

use crate::model::Constraint;
use crate::model::DecisionVariable;
use crate::model::NumExpr;
use crate::LoweringError;
use crate::OptimisationDirection;
use crate::SolveOptions;
use crate::SolverStatus;

/// A solver which canonical constraints can be lowered onto.
///
/// A backend creates at most one handle per decision variable, the first time the variable is
/// referenced, and keeps all constraints posted to it for its whole lifetime.
pub trait Backend {
    /// The status vocabulary of the backend itself.
    type NativeStatus: Debug;

    fn name(&self) -> &'static str;

    /// Whether an objective has to be a single variable. If so, the driver materializes
    /// structured objectives before they reach [`Backend::set_objective`].
    fn materializes_objective(&self) -> bool;

    /// Lowers a constraint in canonical form.
    fn post(&mut self, constraint: &Constraint) -> Result<(), LoweringError>;

    /// Replaces the objective.
    fn set_objective(
        &mut self,
        objective: &NumExpr,
        direction: OptimisationDirection,
    ) -> Result<(), LoweringError>;

    fn solve(&mut self, options: &SolveOptions) -> Result<Self::NativeStatus, LoweringError>;

    /// Maps a native status onto the unified status. Native error statuses become an `Err`.
    fn unify_status(&self, status: &Self::NativeStatus) -> Result<SolverStatus, LoweringError>;

    /// How long the solve which returned `status` took, as measured by the backend.
    fn runtime(&self, status: &Self::NativeStatus) -> Option<Duration>;

    /// The value of `variable` in the last solution, if there is one and the variable was
    /// referenced by the model.
    fn value(&self, variable: &DecisionVariable) -> Option<i64>;
}
