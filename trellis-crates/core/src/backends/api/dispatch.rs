//! Lowers canonical constraints onto the engine primitives. The first matching rule wins:
//! 1. a literal or Boolean constant is posted as a unit clause;
//! 2. conjunctions, disjunctions and parities of literals map onto `post_and`, `post_or` and
//!    `post_xor`;
//! 3. implications are reified (see `reification.rs`);
//! 4. comparisons of two atoms map onto the comparison primitives;
//! 5. an equality between a structured expression over atoms and an atom maps onto the
//!    arithmetic and linear primitives;
//! 6. `alldifferent` over atoms maps onto `post_alldifferent`;
//! 7. anything else is decomposed, and the pieces posted recursively.
use log::debug;
use trellis_engine::ArithmeticOperator;
use trellis_engine::IntView;

use super::ApiBackend;
use crate::model::Comparator;
use crate::model::Connective;
use crate::model::Constraint;
use crate::model::GlobalConstraint;
use crate::model::NumExpr;
use crate::LoweringError;

impl ApiBackend {
    pub(super) fn dispatch(&mut self, constraint: &Constraint) -> Result<(), LoweringError> {
        if let Some(atom) = constraint.as_atom() {
            let literal = self.atom(&atom)?;
            debug!("post_or([{literal:?}]) for {constraint}");
            self.solver.post_or(&[literal]);
            return Ok(());
        }

        match constraint {
            Constraint::Connective {
                connective,
                args,
            } if args.iter().all(|arg| arg.as_atom().is_some()) => {
                let literals = self.literals(args)?;
                debug!("post_{connective:?}({literals:?})");
                match connective {
                    Connective::And => self.solver.post_and(&literals),
                    Connective::Or => self.solver.post_or(&literals),
                    Connective::Xor => self.solver.post_xor(&literals),
                }
                Ok(())
            }

            Constraint::Implication {
                antecedent,
                consequent,
            } => self.post_implication(antecedent, consequent),

            Constraint::Comparison {
                comparator,
                lhs,
                rhs,
            } if lhs.is_atom() && rhs.is_atom() => {
                let lhs = self.expression(lhs)?;
                let rhs = self.expression(rhs)?;
                self.post_comparison(*comparator, lhs, rhs, None);
                Ok(())
            }

            Constraint::Comparison {
                comparator: Comparator::Equal,
                lhs,
                rhs,
            } => {
                // The structured side goes to the left.
                let (expr, result) = if lhs.is_atom() { (rhs, lhs) } else { (lhs, rhs) };
                if result.is_atom()
                    && expr.operands().into_iter().all(NumExpr::is_atom)
                    && self.post_functional(expr, result)?
                {
                    return Ok(());
                }
                self.dispatch_decomposition(constraint)
            }

            Constraint::Global(GlobalConstraint::AllDifferent(args))
                if args.iter().all(NumExpr::is_atom) =>
            {
                let views = args
                    .iter()
                    .map(|arg| self.expression(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                debug!("post_alldifferent({views:?})");
                self.solver.post_alldifferent(&views);
                Ok(())
            }

            _ => self.dispatch_decomposition(constraint),
        }
    }

    fn dispatch_decomposition(&mut self, constraint: &Constraint) -> Result<(), LoweringError> {
        match constraint.decompose() {
            Some(pieces) => self.dispatch_all(constraint, &pieces),
            None => Err(LoweringError::UnsupportedConstruct(constraint.to_string())),
        }
    }

    fn dispatch_all(
        &mut self,
        constraint: &Constraint,
        pieces: &[Constraint],
    ) -> Result<(), LoweringError> {
        debug!("decomposed {constraint} into {} constraints", pieces.len());
        pieces.iter().try_for_each(|piece| self.dispatch(piece))
    }

    /// Posts `a <comparator> b`, or `reification -> (a <comparator> b)` when a reification is
    /// given.
    pub(super) fn post_comparison(
        &mut self,
        comparator: Comparator,
        a: IntView,
        b: IntView,
        reification: Option<IntView>,
    ) {
        debug!(
            "post {a:?} {} {b:?} if {reification:?}",
            comparator.symbol()
        );
        let solver = &mut self.solver;
        match (comparator, reification) {
            (Comparator::Equal, None) => solver.post_equals(a, b),
            (Comparator::Equal, Some(r)) => solver.post_equals_if(a, b, r),
            (Comparator::NotEqual, None) => solver.post_not_equals(a, b),
            (Comparator::NotEqual, Some(r)) => solver.post_not_equals_if(a, b, r),
            (Comparator::LessThanOrEqual, None) => solver.post_compare_less(a, b, true),
            (Comparator::LessThanOrEqual, Some(r)) => solver.post_compare_less_if(a, b, r, true),
            (Comparator::LessThan, None) => solver.post_compare_less(a, b, false),
            (Comparator::LessThan, Some(r)) => solver.post_compare_less_if(a, b, r, false),
            (Comparator::GreaterThanOrEqual, None) => solver.post_compare_less(b, a, true),
            (Comparator::GreaterThanOrEqual, Some(r)) => {
                solver.post_compare_less_if(b, a, r, true)
            }
            (Comparator::GreaterThan, None) => solver.post_compare_less(b, a, false),
            (Comparator::GreaterThan, Some(r)) => solver.post_compare_less_if(b, a, r, false),
        }
    }

    /// Posts `expr == result` for a structured `expr` over atoms. Returns false if the engine has
    /// no primitive for `expr`.
    fn post_functional(&mut self, expr: &NumExpr, result: &NumExpr) -> Result<bool, LoweringError> {
        let operator = match expr {
            NumExpr::Mul(_, _) => ArithmeticOperator::Times,
            NumExpr::Div(_, _) => ArithmeticOperator::Div,
            NumExpr::Mod(_, _) => ArithmeticOperator::Mod,
            NumExpr::Pow(_, _) => ArithmeticOperator::Pow,
            NumExpr::Sub(_, _) => ArithmeticOperator::Sum,
            NumExpr::Sum(terms) if terms.len() == 2 => ArithmeticOperator::Sum,

            NumExpr::Abs(signed) => {
                let signed = self.expression(signed)?;
                let result = self.expression(result)?;
                debug!("post_abs({signed:?}, {result:?})");
                self.solver.post_abs(signed, result);
                return Ok(true);
            }
            NumExpr::Neg(operand) => {
                let operand = self.expression(operand)?;
                let result = self.expression(result)?;
                let negated = self.solver.negate(operand);
                debug!("post_equals({negated:?}, {result:?})");
                self.solver.post_equals(negated, result);
                return Ok(true);
            }
            NumExpr::Sum(terms) => {
                let coefficients = vec![1; terms.len() + 1];
                self.post_linear(terms, &coefficients, result)?;
                return Ok(true);
            }
            NumExpr::WeightedSum { weights, terms } => {
                let coefficients = weights.iter().copied().chain([1]).collect::<Vec<_>>();
                self.post_linear(terms, &coefficients, result)?;
                return Ok(true);
            }

            NumExpr::Atom(_) | NumExpr::Element { .. } => return Ok(false),
        };

        let operands = expr.operands();
        let a = self.expression(operands[0])?;
        let mut b = self.expression(operands[1])?;
        if matches!(expr, NumExpr::Sub(_, _)) {
            b = self.solver.negate(b);
        }
        let result = self.expression(result)?;

        debug!("post_arithmetic({a:?}, {b:?}, {result:?}, {operator:?})");
        self.solver.post_arithmetic(a, b, result, operator);
        Ok(true)
    }

    /// `sum(coefficients[i] * terms[i]) - result == 0`, with the coefficient of `result` last.
    fn post_linear(
        &mut self,
        terms: &[NumExpr],
        coefficients: &[i64],
        result: &NumExpr,
    ) -> Result<(), LoweringError> {
        let mut views = terms
            .iter()
            .map(|term| self.expression(term))
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.expression(result)?;
        views.push(self.solver.negate(result));

        debug!("post_linear_equality({views:?}, {coefficients:?}, 0)");
        self.solver
            .post_linear_equality(&views, coefficients, 0)
            .map_err(super::engine_error)
    }
}
