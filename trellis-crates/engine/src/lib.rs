//! # Trellis engine
//! A small finite-domain constraint solver with an imperative, handle-based API. Variables are
//! integers with an interval or a sparse domain; Booleans are integers with the domain `{0, 1}`.
//! Constraints refer to variables through an [`IntView`], which is either a constant or a
//! variable seen through a negation and an offset. The view `1 - b` is the negation of the
//! Boolean `b`, and can be created with [`Solver::negate`] and [`Solver::add_constant`] without
//! creating a new variable.
//!
//! The solver supports:
//! * Boolean connectives: [`Solver::post_and`], [`Solver::post_or`], [`Solver::post_xor`] and
//!   [`Solver::post_implies`].
//! * Comparisons: [`Solver::post_equals`], [`Solver::post_not_equals`] and
//!   [`Solver::post_compare_less`].
//! * Arithmetic: [`Solver::post_abs`], [`Solver::post_arithmetic`] and
//!   [`Solver::post_linear_equality`].
//! * [`Solver::post_alldifferent`].
//!
//! All Boolean connectives and comparisons have a half-reified variant with the suffix `_if`,
//! which only enforces the constraint when a given Boolean is true.
//!
//! ```rust
//! # use trellis_engine::Solver;
//! let mut solver = Solver::default();
//!
//! let x = solver.create_boolean_variable("x");
//! let y = solver.create_interval_variable(0, 9, "y").unwrap();
//!
//! // x -> (y == 3), with x true
//! let three = solver.create_integer_constant(3);
//! solver.post_equals_if(y, three, x);
//! solver.post_or(&[x]);
//!
//! let statistics = solver.solve();
//! assert_eq!(1, statistics.solutions);
//! assert_eq!(Some(3), solver.solution_value(y));
//! ```
//!
//! The search is an exhaustive depth-first search. With an objective, set through
//! [`Solver::minimise`] or [`Solver::maximise`], it performs branch and bound and
//! [`SolveStatistics::complete`] indicates that the last solution is optimal.

mod basic_types;
pub(crate) mod containers;
mod engine;
mod propagators;
mod variables;

pub use basic_types::EngineError;
pub use basic_types::SolveStatistics;
pub use engine::OptimisationDirection;
pub use engine::Solver;
pub use propagators::ArithmeticOperator;
pub use variables::DomainId;
pub use variables::IntView;
