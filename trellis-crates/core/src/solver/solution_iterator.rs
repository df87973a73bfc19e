//! Enumeration of the solutions of a satisfaction problem.
use super::Solver;
use crate::backends::Backend;
use crate::containers::HashMap;
use crate::model::implies;
use crate::model::ne;
use crate::model::or;
use crate::model::BoolVar;
use crate::model::Constraint;
use crate::model::DecisionVariable;
use crate::model::Literal;
use crate::model::VariableId;
use crate::normalize::Normalizer;
use crate::LoweringError;
use crate::SolveOptions;
use crate::SolverStatus;

/// Finds the solutions of a satisfaction problem one at a time. After each solution, a
/// constraint excluding it is posted before the next solve.
#[derive(Debug)]
pub struct SolutionIterator<'session, B: Backend, N: Normalizer> {
    solver: &'session mut Solver<B, N>,
    options: SolveOptions,
    /// The constraints excluding the last solution, posted on the next call.
    next_nogood: Option<Vec<Constraint>>,
    has_solution: bool,
}

impl<'session, B: Backend, N: Normalizer> SolutionIterator<'session, B, N> {
    pub(super) fn new(solver: &'session mut Solver<B, N>, options: SolveOptions) -> Self {
        SolutionIterator {
            solver,
            options,
            next_nogood: None,
            has_solution: false,
        }
    }

    /// Finds a solution which differs from all earlier ones in at least one tracked variable.
    pub fn next_solution(&mut self) -> Result<IteratedSolution<'_>, LoweringError> {
        if let Some(nogood) = self.next_nogood.take() {
            for constraint in &nogood {
                self.solver.post_untracked(constraint)?;
            }
        }

        if !self.solver.solve(&self.options)? {
            return Ok(match self.solver.status() {
                SolverStatus::Unsatisfiable if self.has_solution => IteratedSolution::Finished,
                SolverStatus::Unsatisfiable => IteratedSolution::Unsatisfiable,
                _ => IteratedSolution::Unknown,
            });
        }

        self.has_solution = true;
        self.next_nogood = Some(self.nogood());
        Ok(IteratedSolution::Solution(SolutionReference {
            values: &self.solver.values,
        }))
    }

    /// At least one tracked variable takes a different value than in the last solution. A
    /// Boolean contributes its opposite literal; an integer contributes a fresh Boolean which
    /// implies the variable differs from its value.
    fn nogood(&self) -> Vec<Constraint> {
        let mut constraints = vec![];
        let mut literals: Vec<Constraint> = vec![];

        for variable in &self.solver.tracked {
            let Some(value) = self.solver.value(variable) else {
                continue;
            };

            if let Some(boolean) = variable.as_bool() {
                let literal = Literal::from(boolean);
                let literal = if value == 0 { literal } else { !literal };
                literals.push(literal.into());
            } else if let Some(integer) = variable.as_int() {
                let differs = BoolVar::new();
                constraints.push(implies(&differs, ne(&integer, value)));
                literals.push(differs.into());
            }
        }

        constraints.push(or(literals));
        constraints
    }
}

/// The outcome of [`SolutionIterator::next_solution`].
#[derive(Debug)]
pub enum IteratedSolution<'a> {
    /// A new solution was found.
    Solution(SolutionReference<'a>),
    /// There are no more solutions.
    Finished,
    /// The backend stopped without a verdict.
    Unknown,
    /// The problem has no solution at all.
    Unsatisfiable,
}

/// The values of the tracked variables in a solution.
#[derive(Clone, Copy, Debug)]
pub struct SolutionReference<'a> {
    values: &'a HashMap<VariableId, i64>,
}

impl SolutionReference<'_> {
    pub fn value(&self, variable: impl AsRef<DecisionVariable>) -> Option<i64> {
        self.values.get(&variable.as_ref().id()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ApiBackend;
    use crate::model::*;

    #[test]
    fn unsatisfiable_before_any_solution() {
        let mut solver = Solver::new(ApiBackend::new());
        let x = IntVar::new(0, 3);
        solver.add(gt(&x, 3)).expect("posts");

        let mut iterator = solver
            .solution_iterator(SolveOptions::default())
            .expect("satisfaction problem");

        assert!(matches!(
            iterator.next_solution(),
            Ok(IteratedSolution::Unsatisfiable)
        ));
    }

    #[test]
    fn solutions_are_distinct_and_then_finished() {
        let mut solver = Solver::new(ApiBackend::new());
        let x = IntVar::new(0, 2);
        let b = BoolVar::new();
        solver.add(implies(&b, eq(&x, 1))).expect("posts");
        solver.add(le(&x, 1)).expect("posts");

        let mut iterator = solver
            .solution_iterator(SolveOptions::default())
            .expect("satisfaction problem");
        let mut seen = vec![];
        loop {
            match iterator.next_solution().expect("solves") {
                IteratedSolution::Solution(solution) => {
                    let constraint = implies(&b, eq(&x, 1));
                    let assignment = |variable: &DecisionVariable| solution.value(variable);
                    assert_eq!(constraint.evaluate(&assignment), Some(true));
                    seen.push((solution.value(&x), solution.value(&b)));
                }
                IteratedSolution::Finished => break,
                other => panic!("unexpected {other:?}"),
            }
        }

        // x in {0, 1} with b false, and x = 1 with b true.
        seen.sort();
        assert_eq!(
            seen,
            vec![
                (Some(0), Some(0)),
                (Some(1), Some(0)),
                (Some(1), Some(1))
            ]
        );
    }
}
