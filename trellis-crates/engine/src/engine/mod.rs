mod assignments;
mod solver;

pub(crate) use assignments::Assignments;
pub use solver::OptimisationDirection;
pub use solver::Solver;
