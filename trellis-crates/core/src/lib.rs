//! # Trellis
//! Lowers models in a canonical constraint representation onto concrete solvers.
//!
//! A model is built from [`model::BoolVar`]s and [`model::IntVar`]s, numeric expressions over
//! them and constraints relating those expressions. A [`Solver`] session posts the constraints
//! to a [`backends::Backend`]:
//! * [`backends::ApiBackend`] calls the imperative API of the in-process engine, using its
//!   reified (`_if`) primitives for implications and decomposing what it has no primitive for;
//! * [`backends::MiniZincBackend`] writes a MiniZinc program and runs the `minizinc` executable
//!   on it.
//!
//! Both accept the same constraints and report their result in the same [`SolverStatus`].
//!
//! ```rust
//! # use trellis_core::backends::ApiBackend;
//! # use trellis_core::model::*;
//! # use trellis_core::SolveOptions;
//! # use trellis_core::Solver;
//! let mut solver = Solver::new(ApiBackend::new());
//!
//! let x = BoolVar::named("x");
//! let y = IntVar::named(0, 9, "y");
//! solver.add(implies(&x, eq(&y, 3))).unwrap();
//! solver.add(&x).unwrap();
//!
//! assert!(solver.solve(&SolveOptions::default()).unwrap());
//! assert_eq!(solver.value(&y), Some(3));
//! ```
//!
//! Constraints handed to a backend are expected in canonical form, as produced by a
//! [`normalize::Normalizer`]. The default [`normalize::CanonicalNormalizer`] takes constraints as
//! they are.
pub mod backends;
mod binding;
mod containers;
mod error;
pub mod model;
pub mod normalize;
mod options;
mod solver;
mod status;

pub use error::LoweringError;
pub use options::MiniZincOptions;
pub use options::OptimisationDirection;
pub use options::SolveOptions;
pub use solver::IteratedSolution;
pub use solver::SolutionIterator;
pub use solver::SolutionReference;
pub use solver::Solver;
pub use status::SolverStatus;
