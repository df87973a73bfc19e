//! Lowering onto the imperative API of the in-process engine.
mod dispatch;
mod reification;

use std::time::Duration;

use log::debug;
use log::info;
use trellis_engine::EngineError;
use trellis_engine::IntView;
use trellis_engine::SolveStatistics;

use super::Backend;
use crate::binding::BindingCache;
use crate::model::Atom;
use crate::model::Constraint;
use crate::model::DecisionVariable;
use crate::model::Domain;
use crate::model::NumExpr;
use crate::LoweringError;
use crate::OptimisationDirection;
use crate::SolveOptions;
use crate::SolverStatus;

const NAME: &str = "api";

/// The native status of the engine.
#[derive(Clone, Copy, Debug)]
pub struct ApiStatus {
    pub statistics: SolveStatistics,
    /// Whether the search optimised an objective.
    pub optimising: bool,
}

#[derive(Debug, Default)]
pub struct ApiBackend {
    solver: trellis_engine::Solver,
    bindings: BindingCache<IntView>,
}

impl ApiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine view of `variable`, creating it on first use.
    pub fn bind(&mut self, variable: &DecisionVariable) -> Result<IntView, LoweringError> {
        let solver = &mut self.solver;
        self.bindings.bind(variable, |variable| {
            let name = variable.name();
            let view = if variable.is_boolean() {
                Ok(solver.create_boolean_variable(name))
            } else {
                match variable.domain() {
                    Domain::Interval {
                        lower_bound,
                        upper_bound,
                    } => solver.create_interval_variable(*lower_bound, *upper_bound, name),
                    Domain::Set(values) => {
                        solver.create_integer_variable(values.iter().copied(), name)
                    }
                }
            }
            .map_err(engine_error)?;

            debug!("created {view:?} for {name}");
            Ok(view)
        })
    }

    /// The number of variables which have an engine view.
    pub fn num_bound(&self) -> usize {
        self.bindings.len()
    }

    fn atom(&mut self, atom: &Atom) -> Result<IntView, LoweringError> {
        match atom {
            Atom::Int(var) => self.bind(var.variable()),
            Atom::Literal(literal) => {
                let view = self.bind(literal.variable().variable())?;
                if literal.is_negated() {
                    Ok(self.solver.add_constant(self.solver.negate(view), 1))
                } else {
                    Ok(view)
                }
            }
            Atom::Constant(value) => Ok(self.solver.create_integer_constant(*value)),
            Atom::Bool(value) => Ok(self.solver.create_integer_constant(*value as i64)),
        }
    }

    /// The view of an expression which has to be an atom.
    fn expression(&mut self, expr: &NumExpr) -> Result<IntView, LoweringError> {
        match expr.as_atom() {
            Some(atom) => self.atom(atom),
            None => Err(LoweringError::BackendContractViolation(format!(
                "expected a variable or constant, got {expr}"
            ))),
        }
    }

    /// The views of constraints which are all literals or Boolean constants.
    fn literals(&mut self, constraints: &[Constraint]) -> Result<Vec<IntView>, LoweringError> {
        constraints
            .iter()
            .map(|constraint| match constraint.as_atom() {
                Some(atom) => self.atom(&atom),
                None => Err(LoweringError::BackendContractViolation(format!(
                    "expected a literal, got {constraint}"
                ))),
            })
            .collect()
    }
}

fn engine_error(error: EngineError) -> LoweringError {
    LoweringError::BackendExecution {
        backend: NAME,
        message: error.to_string(),
    }
}

impl Backend for ApiBackend {
    type NativeStatus = ApiStatus;

    fn name(&self) -> &'static str {
        NAME
    }

    fn materializes_objective(&self) -> bool {
        true
    }

    fn post(&mut self, constraint: &Constraint) -> Result<(), LoweringError> {
        self.dispatch(constraint)
    }

    fn set_objective(
        &mut self,
        objective: &NumExpr,
        direction: OptimisationDirection,
    ) -> Result<(), LoweringError> {
        let view = self.expression(objective)?;
        match direction {
            OptimisationDirection::Minimise => self.solver.minimise(view),
            OptimisationDirection::Maximise => self.solver.maximise(view),
        }
        Ok(())
    }

    fn solve(&mut self, options: &SolveOptions) -> Result<ApiStatus, LoweringError> {
        if options.time_limit.is_some() {
            return Err(LoweringError::UnsupportedOption {
                backend: NAME,
                option: "time_limit",
            });
        }

        let statistics = self.solver.solve();
        info!(
            "engine finished on {} variables: {statistics}",
            self.solver.num_variables()
        );
        Ok(ApiStatus {
            statistics,
            optimising: self.solver.objective().is_some(),
        })
    }

    fn unify_status(&self, status: &ApiStatus) -> Result<SolverStatus, LoweringError> {
        let statistics = &status.statistics;
        Ok(if statistics.solutions == 0 {
            if statistics.complete {
                SolverStatus::Unsatisfiable
            } else {
                SolverStatus::Unknown
            }
        } else if status.optimising && statistics.complete {
            SolverStatus::Optimal
        } else {
            SolverStatus::Feasible
        })
    }

    fn runtime(&self, status: &ApiStatus) -> Option<Duration> {
        Some(status.statistics.runtime)
    }

    fn value(&self, variable: &DecisionVariable) -> Option<i64> {
        self.solver.solution_value(self.bindings.get(variable)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::eq;
    use crate::model::BoolVar;
    use crate::model::IntVar;

    #[test]
    fn binding_creates_one_view_per_variable() {
        let x = IntVar::new(1, 9);
        let b = BoolVar::new();
        let mut backend = ApiBackend::new();

        let first = backend.bind(x.variable()).expect("x can be bound");
        let second = backend.bind(x.variable()).expect("x can be bound");
        let _ = backend.bind(b.variable()).expect("b can be bound");

        assert_eq!(first, second);
        assert_eq!(backend.num_bound(), 2);
    }

    #[test]
    fn negated_literal_is_not_bound_separately() {
        let b = BoolVar::new();
        let mut backend = ApiBackend::new();

        backend.post(&(!&b).into()).expect("literal can be posted");

        assert_eq!(backend.num_bound(), 1);
        let status = backend.solve(&SolveOptions::default()).expect("solve succeeds");
        assert_eq!(backend.unify_status(&status).ok(), Some(SolverStatus::Feasible));
        assert_eq!(backend.value(b.variable()), Some(0));
    }

    #[test]
    fn sparse_domains_are_respected() {
        let x = IntVar::with_values([1, 4, 7], None);
        let mut backend = ApiBackend::new();

        backend
            .post(&crate::model::ge(&x, 2))
            .expect("comparison can be posted");
        let status = backend.solve(&SolveOptions::default()).expect("solve succeeds");

        assert_eq!(backend.unify_status(&status).ok(), Some(SolverStatus::Feasible));
        assert_eq!(backend.value(x.variable()), Some(4));
    }

    #[test]
    fn time_limits_are_rejected() {
        let mut backend = ApiBackend::new();
        let result = backend.solve(&SolveOptions::with_time_limit(
            std::time::Duration::from_secs(1),
        ));

        assert!(matches!(
            result,
            Err(LoweringError::UnsupportedOption {
                option: "time_limit",
                ..
            })
        ));
    }

    #[test]
    fn infeasible_model_is_unsatisfiable() {
        let x = IntVar::new(0, 3);
        let mut backend = ApiBackend::new();
        backend.post(&eq(&x, 5)).expect("equality can be posted");

        let status = backend.solve(&SolveOptions::default()).expect("solve succeeds");

        assert_eq!(
            backend.unify_status(&status).ok(),
            Some(SolverStatus::Unsatisfiable)
        );
        assert_eq!(backend.value(x.variable()), None);
    }

    #[test]
    fn unbound_variables_have_no_value() {
        let x = IntVar::new(0, 3);
        let mut backend = ApiBackend::new();
        let _ = backend.solve(&SolveOptions::default()).expect("solve succeeds");

        assert_eq!(backend.value(x.variable()), None);
    }
}
