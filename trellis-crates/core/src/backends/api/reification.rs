use log::debug;

use super::ApiBackend;
use crate::model::Connective;
use crate::model::Constraint;
use crate::LoweringError;

impl ApiBackend {
    /// Posts `antecedent -> consequent` through the `_if` primitives of the engine.
    pub(super) fn post_implication(
        &mut self,
        antecedent: &Constraint,
        consequent: &Constraint,
    ) -> Result<(), LoweringError> {
        let Some(antecedent_atom) = antecedent.as_atom() else {
            return Err(LoweringError::BackendContractViolation(format!(
                "the antecedent of ({antecedent}) -> ({consequent}) is not a literal"
            )));
        };
        let reification = self.atom(&antecedent_atom)?;

        match consequent {
            Constraint::Literal(_) | Constraint::Constant(_) => {
                let literals = self.literals(std::slice::from_ref(consequent))?;
                debug!("post_implies({reification:?}, {:?})", literals[0]);
                self.solver.post_implies(reification, literals[0]);
            }

            Constraint::Connective { connective, args }
                if args.iter().all(|arg| arg.as_atom().is_some()) =>
            {
                let literals = self.literals(args)?;
                debug!("post_{connective:?}_if({literals:?}, {reification:?})");
                match connective {
                    Connective::And => self.solver.post_and_if(&literals, reification),
                    Connective::Or => self.solver.post_or_if(&literals, reification),
                    Connective::Xor => self.solver.post_xor_if(&literals, reification),
                }
            }

            Constraint::Implication {
                antecedent: inner_antecedent,
                consequent: inner_consequent,
            } if inner_antecedent.as_atom().is_some() && inner_consequent.as_atom().is_some() => {
                let literals = self.literals(&[
                    (**inner_antecedent).clone(),
                    (**inner_consequent).clone(),
                ])?;
                debug!("post_implies_if({literals:?}, {reification:?})");
                self.solver
                    .post_implies_if(literals[0], literals[1], reification);
            }

            Constraint::Comparison {
                comparator,
                lhs,
                rhs,
            } if lhs.is_atom() && rhs.is_atom() => {
                let lhs = self.expression(lhs)?;
                let rhs = self.expression(rhs)?;
                self.post_comparison(*comparator, lhs, rhs, Some(reification));
            }

            _ => {
                return Err(LoweringError::BackendContractViolation(format!(
                    "{consequent} cannot be reified"
                )))
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::Backend;
    use crate::model::*;
    use crate::SolveOptions;
    use crate::SolverStatus;

    fn solve(backend: &mut ApiBackend) -> SolverStatus {
        let status = backend.solve(&SolveOptions::default()).expect("solve succeeds");
        backend.unify_status(&status).expect("status is not an error")
    }

    #[test]
    fn implied_equality_holds_when_antecedent_is_true() {
        let x = BoolVar::new();
        let y = IntVar::new(0, 9);
        let mut backend = ApiBackend::new();

        backend.post(&implies(&x, eq(&y, 3))).expect("posts");
        backend.post(&Constraint::from(&x)).expect("posts");

        assert_eq!(solve(&mut backend), SolverStatus::Feasible);
        assert_eq!(backend.value(y.variable()), Some(3));
    }

    #[test]
    fn reified_not_equals() {
        let x = BoolVar::new();
        let y = IntVar::new(0, 1);
        let mut backend = ApiBackend::new();

        backend.post(&implies(&x, ne(&y, 0))).expect("posts");
        backend.post(&Constraint::from(&x)).expect("posts");

        assert_eq!(solve(&mut backend), SolverStatus::Feasible);
        assert_eq!(backend.value(y.variable()), Some(1));
    }

    #[test]
    fn greater_than_swaps_operands() {
        let x = BoolVar::new();
        let y = IntVar::new(0, 9);
        let mut backend = ApiBackend::new();

        backend.post(&implies(&x, gt(&y, 6))).expect("posts");
        backend.post(&Constraint::from(&x)).expect("posts");

        assert_eq!(solve(&mut backend), SolverStatus::Feasible);
        assert_eq!(backend.value(y.variable()), Some(7));
    }

    #[test]
    fn negated_antecedent() {
        let x = BoolVar::new();
        let a = BoolVar::new();
        let b = BoolVar::new();
        let mut backend = ApiBackend::new();

        backend.post(&implies(!&x, and([&a, &b]))).expect("posts");
        backend.post(&Constraint::from(!&x)).expect("posts");

        assert_eq!(solve(&mut backend), SolverStatus::Feasible);
        assert_eq!(backend.value(a.variable()), Some(1));
        assert_eq!(backend.value(b.variable()), Some(1));
    }

    #[test]
    fn nested_implication_of_literals() {
        let x = BoolVar::new();
        let a = BoolVar::new();
        let b = BoolVar::new();
        let mut backend = ApiBackend::new();

        backend.post(&implies(&x, implies(&a, &b))).expect("posts");
        backend.post(&and([&x, &a])).expect("posts");

        assert_eq!(solve(&mut backend), SolverStatus::Feasible);
        assert_eq!(backend.value(b.variable()), Some(1));
    }

    #[test]
    fn non_literal_antecedent_violates_the_contract() {
        let y = IntVar::new(0, 9);
        let a = BoolVar::new();
        let mut backend = ApiBackend::new();

        let result = backend.post(&implies(le(&y, 3), &a));

        assert!(matches!(
            result,
            Err(LoweringError::BackendContractViolation(_))
        ));
    }

    #[test]
    fn global_consequent_violates_the_contract() {
        let x = BoolVar::new();
        let vars = [IntVar::new(0, 2), IntVar::new(0, 2)];
        let mut backend = ApiBackend::new();

        let result = backend.post(&implies(&x, alldifferent(&vars)));

        assert!(matches!(
            result,
            Err(LoweringError::BackendContractViolation(_))
        ));
    }

    #[test]
    fn structured_consequent_violates_the_contract() {
        let x = BoolVar::new();
        let y = IntVar::new(0, 5);
        let z = IntVar::new(0, 5);
        let mut backend = ApiBackend::new();

        let result = backend.post(&implies(&x, ge(sum([&y, &z]), 9)));

        assert!(matches!(
            result,
            Err(LoweringError::BackendContractViolation(_))
        ));
        assert_eq!(backend.num_bound(), 1);
    }

    #[test]
    fn partial_consequent_does_not_constrain_the_model() {
        let b = BoolVar::new();
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);
        let mut backend = ApiBackend::new();

        let result = backend.post(&implies(&b, le(div(&x, &y), 1)));
        backend.post(&Constraint::from(!&b)).expect("posts");
        backend.post(&eq(&y, 0)).expect("posts");

        assert!(matches!(
            result,
            Err(LoweringError::BackendContractViolation(_))
        ));
        assert_eq!(solve(&mut backend), SolverStatus::Feasible);
        assert_eq!(backend.value(y.variable()), Some(0));
    }
}
