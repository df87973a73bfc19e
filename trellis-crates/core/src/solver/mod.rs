//! The session which drives a backend: it posts constraints, sets the objective, solves and
//! keeps the values of the last solution.
mod solution_iterator;

use std::time::Duration;

use log::debug;
use log::info;
use log::warn;
pub use solution_iterator::IteratedSolution;
pub use solution_iterator::SolutionIterator;
pub use solution_iterator::SolutionReference;

use crate::backends::Backend;
use crate::containers::HashMap;
use crate::containers::HashSet;
use crate::model::Constraint;
use crate::model::DecisionVariable;
use crate::model::NumExpr;
use crate::model::VariableId;
use crate::normalize::CanonicalNormalizer;
use crate::normalize::Normalizer;
use crate::LoweringError;
use crate::OptimisationDirection;
use crate::SolveOptions;
use crate::SolverStatus;

/// A modelling session on top of a [`Backend`].
///
/// Constraints only accumulate: nothing posted to a session is ever retracted, and this includes
/// the constraints defining a previous objective.
///
/// # Example
/// ```rust
/// # use trellis_core::backends::ApiBackend;
/// # use trellis_core::model::*;
/// # use trellis_core::SolveOptions;
/// # use trellis_core::Solver;
/// # use trellis_core::SolverStatus;
/// let mut solver = Solver::new(ApiBackend::new());
///
/// let a = IntVar::named(0, 5, "a");
/// let b = IntVar::named(0, 5, "b");
/// solver.add(ge(sum([&a, &b]), 4)).unwrap();
/// solver.minimise(sub(&a, &b)).unwrap();
///
/// assert!(solver.solve(&SolveOptions::default()).unwrap());
/// assert_eq!(solver.status(), SolverStatus::Optimal);
/// assert_eq!(solver.objective_value(), Some(-5));
/// ```
#[derive(Debug)]
pub struct Solver<B: Backend, N: Normalizer = CanonicalNormalizer> {
    backend: B,
    normalizer: N,
    /// The variables whose values are read after a solve, in order of first use.
    tracked: Vec<DecisionVariable>,
    is_tracked: HashSet<VariableId>,
    objective: Option<(NumExpr, OptimisationDirection)>,
    status: SolverStatus,
    values: HashMap<VariableId, i64>,
    objective_value: Option<i64>,
    runtime: Option<Duration>,
}

impl<B: Backend> Solver<B> {
    /// Creates a session for constraints which are already in canonical form.
    pub fn new(backend: B) -> Self {
        Solver::with_normalizer(backend, CanonicalNormalizer)
    }
}

impl<B: Backend, N: Normalizer> Solver<B, N> {
    pub fn with_normalizer(backend: B, normalizer: N) -> Self {
        Solver {
            backend,
            normalizer,
            tracked: vec![],
            is_tracked: HashSet::default(),
            objective: None,
            status: SolverStatus::NotRun,
            values: HashMap::default(),
            objective_value: None,
            runtime: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Normalises `constraint` and posts the result.
    pub fn add(&mut self, constraint: impl Into<Constraint>) -> Result<(), LoweringError> {
        let constraint = constraint.into();
        let flattened = self.normalizer.flatten(&constraint);
        let canonical = self.normalizer.rewrite_reification(flattened);
        canonical
            .iter()
            .try_for_each(|constraint| self.post(constraint))
    }

    /// Posts a constraint in canonical form to the backend.
    pub fn post(&mut self, constraint: &Constraint) -> Result<(), LoweringError> {
        let mut variables = vec![];
        constraint.collect_variables(&mut variables);
        self.track(variables);

        debug!("posting {constraint} to the {} backend", self.backend.name());
        self.backend.post(constraint)
    }

    /// Posts a constraint without tracking its variables.
    fn post_untracked(&mut self, constraint: &Constraint) -> Result<(), LoweringError> {
        debug!("posting {constraint} to the {} backend", self.backend.name());
        self.backend.post(constraint)
    }

    fn track(&mut self, variables: Vec<DecisionVariable>) {
        for variable in variables {
            if self.is_tracked.insert(variable.id()) {
                self.tracked.push(variable);
            }
        }
    }

    /// The variables whose values are available after a solve.
    pub fn tracked_variables(&self) -> &[DecisionVariable] {
        &self.tracked
    }

    pub fn minimise(&mut self, objective: impl Into<NumExpr>) -> Result<(), LoweringError> {
        self.set_objective(objective, OptimisationDirection::Minimise)
    }

    pub fn maximise(&mut self, objective: impl Into<NumExpr>) -> Result<(), LoweringError> {
        self.set_objective(objective, OptimisationDirection::Maximise)
    }

    /// Replaces the objective. If the backend only accepts a variable as objective, a variable
    /// equal to the expression is introduced and its defining constraints are posted; these stay
    /// when the objective is replaced later.
    pub fn set_objective(
        &mut self,
        objective: impl Into<NumExpr>,
        direction: OptimisationDirection,
    ) -> Result<(), LoweringError> {
        let objective = objective.into();
        let mut variables = vec![];
        objective.collect_variables(&mut variables);
        self.track(variables);

        if self.backend.materializes_objective() && !objective.is_atom() {
            let (auxiliary, definitions) = self.normalizer.materialize(&objective);
            for definition in &definitions {
                self.post(definition)?;
            }
            self.track(vec![auxiliary.variable().clone()]);
            self.backend.set_objective(&auxiliary.into(), direction)?;
        } else {
            self.backend.set_objective(&objective, direction)?;
        }

        debug!("objective is now {direction:?} {objective}");
        self.objective = Some((objective, direction));
        Ok(())
    }

    pub fn objective(&self) -> Option<(&NumExpr, OptimisationDirection)> {
        self.objective
            .as_ref()
            .map(|(objective, direction)| (objective, *direction))
    }

    /// Solves the model. Returns whether a solution was found, in which case the value of every
    /// tracked variable can be read with [`Solver::value`].
    pub fn solve(&mut self, options: &SolveOptions) -> Result<bool, LoweringError> {
        self.values.clear();
        self.objective_value = None;
        self.runtime = None;

        let status = self
            .backend
            .solve(options)
            .and_then(|native| {
                debug!("native status {native:?}");
                self.runtime = self.backend.runtime(&native);
                self.backend.unify_status(&native)
            })
            .inspect_err(|_| self.status = SolverStatus::Error)?;
        self.status = status;
        info!("{} backend finished with status {status}", self.backend.name());

        if !status.has_solution() {
            return Ok(false);
        }

        for variable in &self.tracked {
            match self.backend.value(variable) {
                Some(value) => {
                    let _ = self.values.insert(variable.id(), value);
                }
                None => warn!("the solution has no value for {variable}"),
            }
        }
        self.objective_value = self
            .objective
            .as_ref()
            .and_then(|(objective, _)| objective.evaluate(&self.values));

        Ok(true)
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    /// The value of `variable` in the last solution.
    pub fn value(&self, variable: impl AsRef<DecisionVariable>) -> Option<i64> {
        self.values.get(&variable.as_ref().id()).copied()
    }

    /// The value of the objective in the last solution.
    pub fn objective_value(&self) -> Option<i64> {
        self.objective_value
    }

    /// How long the backend took for the last solve, if it reported it.
    pub fn runtime(&self) -> Option<Duration> {
        self.runtime
    }

    /// Iterates over the solutions of a satisfaction problem. Every solution differs from the
    /// earlier ones in at least one tracked variable.
    pub fn solution_iterator(
        &mut self,
        options: SolveOptions,
    ) -> Result<SolutionIterator<'_, B, N>, LoweringError> {
        if self.objective.is_some() {
            return Err(LoweringError::UnsupportedConstruct(
                "enumerating the solutions of an optimisation problem".to_owned(),
            ));
        }
        Ok(SolutionIterator::new(self, options))
    }

    /// Calls `on_solution` for every solution, until there are no more or `limit` solutions were
    /// reported. Returns the number of solutions reported.
    pub fn enumerate(
        &mut self,
        limit: Option<usize>,
        options: SolveOptions,
        mut on_solution: impl FnMut(SolutionReference<'_>),
    ) -> Result<usize, LoweringError> {
        let mut iterator = self.solution_iterator(options)?;
        let mut count = 0;

        while limit.map_or(true, |limit| count < limit) {
            match iterator.next_solution()? {
                IteratedSolution::Solution(solution) => {
                    count += 1;
                    on_solution(solution);
                }
                IteratedSolution::Finished
                | IteratedSolution::Unsatisfiable
                | IteratedSolution::Unknown => break,
            }
        }

        info!("enumerated {count} solutions");
        Ok(count)
    }
}
