use super::Propagator;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::engine::Assignments;
use crate::variables::IntView;

/// The binary operations supported by [`crate::Solver::post_arithmetic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Sum,
    Times,
    /// Integer division, rounding towards zero.
    Div,
    /// The remainder of [`ArithmeticOperator::Div`]; it takes the sign of the dividend.
    Mod,
    Pow,
}

impl ArithmeticOperator {
    /// Computes `a <op> b`, or `None` if the operation is undefined for these operands.
    pub fn apply(self, a: i64, b: i64) -> Option<i64> {
        match self {
            ArithmeticOperator::Sum => a.checked_add(b),
            ArithmeticOperator::Times => a.checked_mul(b),
            ArithmeticOperator::Div => a.checked_div(b),
            ArithmeticOperator::Mod => a.checked_rem(b),
            ArithmeticOperator::Pow => u32::try_from(b)
                .ok()
                .and_then(|exponent| a.checked_pow(exponent)),
        }
    }
}

/// Propagator for `result = a <op> b`.
///
/// Bounds are propagated for sums and products. For the other operators the result is only
/// computed once both operands are fixed. An operation which is undefined for the fixed operands
/// (such as a division by zero) is an inconsistency.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ArithmeticPropagator {
    a: IntView,
    b: IntView,
    result: IntView,
    operator: ArithmeticOperator,
}

impl ArithmeticPropagator {
    pub(crate) fn new(
        a: IntView,
        b: IntView,
        result: IntView,
        operator: ArithmeticOperator,
    ) -> Self {
        ArithmeticPropagator {
            a,
            b,
            result,
            operator,
        }
    }
}

impl Propagator for ArithmeticPropagator {
    fn name(&self) -> &str {
        match self.operator {
            ArithmeticOperator::Sum => "IntPlus",
            ArithmeticOperator::Times => "IntTimes",
            ArithmeticOperator::Div => "IntDiv",
            ArithmeticOperator::Mod => "IntMod",
            ArithmeticOperator::Pow => "IntPow",
        }
    }

    fn variables(&self) -> Vec<IntView> {
        vec![self.a, self.b, self.result]
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        let a_lb = assignments.view_lower_bound(self.a);
        let a_ub = assignments.view_upper_bound(self.a);
        let b_lb = assignments.view_lower_bound(self.b);
        let b_ub = assignments.view_upper_bound(self.b);

        match self.operator {
            ArithmeticOperator::Sum => {
                // Saturation only ever weakens a bound.
                assignments.view_tighten_lower_bound(self.result, a_lb.saturating_add(b_lb))?;
                assignments.view_tighten_upper_bound(self.result, a_ub.saturating_add(b_ub))?;

                let result_lb = assignments.view_lower_bound(self.result);
                let result_ub = assignments.view_upper_bound(self.result);
                assignments.view_tighten_lower_bound(self.a, result_lb.saturating_sub(b_ub))?;
                assignments.view_tighten_upper_bound(self.a, result_ub.saturating_sub(b_lb))?;
                assignments.view_tighten_lower_bound(self.b, result_lb.saturating_sub(a_ub))?;
                assignments.view_tighten_upper_bound(self.b, result_ub.saturating_sub(a_lb))?;
            }
            ArithmeticOperator::Times => {
                let corners = [
                    a_lb.saturating_mul(b_lb),
                    a_lb.saturating_mul(b_ub),
                    a_ub.saturating_mul(b_lb),
                    a_ub.saturating_mul(b_ub),
                ];
                let min = corners.into_iter().fold(i64::MAX, i64::min);
                let max = corners.into_iter().fold(i64::MIN, i64::max);

                assignments.view_tighten_lower_bound(self.result, min)?;
                assignments.view_tighten_upper_bound(self.result, max)?;
            }
            ArithmeticOperator::Div | ArithmeticOperator::Mod | ArithmeticOperator::Pow => {}
        }

        if let (Some(a), Some(b)) = (
            assignments.view_value(self.a),
            assignments.view_value(self.b),
        ) {
            let result = self.operator.apply(a, b).ok_or(Inconsistency)?;
            assignments.view_fix(self.result, result)?;
        }

        Ok(())
    }
}

/// Propagator for `absolute = |signed|`.
///
/// The propagator is bounds consistent with respect to `signed`: if `signed` is in
/// `{-2, -1, 1, 2}` then `absolute >= 1` is not propagated.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AbsoluteValuePropagator {
    signed: IntView,
    absolute: IntView,
}

impl AbsoluteValuePropagator {
    pub(crate) fn new(signed: IntView, absolute: IntView) -> Self {
        AbsoluteValuePropagator { signed, absolute }
    }
}

impl Propagator for AbsoluteValuePropagator {
    fn name(&self) -> &str {
        "IntAbs"
    }

    fn variables(&self) -> Vec<IntView> {
        vec![self.signed, self.absolute]
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        // When `signed` is sign-fixed its bounds carry over to `absolute`, swapping them if it is
        // negative. Otherwise only the upper bound of `absolute` can be tightened.
        let signed_lb = assignments.view_lower_bound(self.signed);
        let signed_ub = assignments.view_upper_bound(self.signed);

        assignments.view_tighten_lower_bound(self.absolute, 0)?;
        assignments.view_tighten_upper_bound(
            self.absolute,
            signed_lb.saturating_abs().max(signed_ub.saturating_abs()),
        )?;

        if signed_lb > 0 {
            assignments.view_tighten_lower_bound(self.absolute, signed_lb)?;
        } else if signed_ub < 0 {
            assignments.view_tighten_lower_bound(self.absolute, signed_ub.saturating_neg())?;
        }

        let absolute_lb = assignments.view_lower_bound(self.absolute);
        let absolute_ub = assignments.view_upper_bound(self.absolute);
        assignments.view_tighten_lower_bound(self.signed, absolute_ub.saturating_neg())?;
        assignments.view_tighten_upper_bound(self.signed, absolute_ub)?;

        if signed_ub <= 0 {
            assignments.view_tighten_upper_bound(self.signed, absolute_lb.saturating_neg())?;
        } else if signed_lb >= 0 {
            assignments.view_tighten_lower_bound(self.signed, absolute_lb)?;
        }

        if let Some(value) = assignments.view_value(self.signed) {
            assignments.view_fix(self.absolute, value.saturating_abs())?;
        }

        Ok(())
    }
}
