use super::Propagator;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::engine::Assignments;
use crate::variables::IntView;

/// Bounds consistent propagator for `sum(coefficient_i * x_i) == rhs`.
#[derive(Clone, Debug)]
pub(crate) struct LinearEqualityPropagator {
    terms: Box<[(i64, IntView)]>,
    rhs: i64,
}

impl LinearEqualityPropagator {
    pub(crate) fn new(terms: impl IntoIterator<Item = (i64, IntView)>, rhs: i64) -> Self {
        LinearEqualityPropagator {
            terms: terms
                .into_iter()
                .filter(|&(coefficient, _)| coefficient != 0)
                .collect(),
            rhs,
        }
    }

    /// Term bounds are widened to `i128` so products of extreme coefficients and bounds cannot
    /// overflow.
    fn term_bounds(assignments: &Assignments, coefficient: i64, view: IntView) -> (i128, i128) {
        let coefficient = i128::from(coefficient);
        let lower = coefficient * i128::from(assignments.view_lower_bound(view));
        let upper = coefficient * i128::from(assignments.view_upper_bound(view));
        (lower.min(upper), lower.max(upper))
    }

    fn sum_bounds(bounds: impl IntoIterator<Item = (i128, i128)>) -> (i128, i128) {
        bounds
            .into_iter()
            .fold((0, 0), |(min_sum, max_sum): (i128, i128), (lower, upper)| {
                (min_sum.saturating_add(lower), max_sum.saturating_add(upper))
            })
    }
}

impl Propagator for LinearEqualityPropagator {
    fn name(&self) -> &str {
        "LinearEquality"
    }

    fn variables(&self) -> Vec<IntView> {
        self.terms.iter().map(|&(_, view)| view).collect()
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        let bounds = self
            .terms
            .iter()
            .map(|&(coefficient, view)| Self::term_bounds(assignments, coefficient, view))
            .collect::<Vec<_>>();

        let (min_sum, max_sum) = Self::sum_bounds(bounds.iter().copied());
        let rhs = i128::from(self.rhs);

        if rhs < min_sum || rhs > max_sum {
            return Err(Inconsistency);
        }

        for (&(coefficient, view), &(term_lower, term_upper)) in self.terms.iter().zip(&bounds) {
            // The bounds the term can take given the bounds of all the other terms.
            let lower = rhs - (max_sum - term_upper);
            let upper = rhs - (min_sum - term_lower);
            let divisor = i128::from(coefficient);

            if coefficient > 0 {
                assignments.view_tighten_lower_bound(view, clamp(div_ceil(lower, divisor)))?;
                assignments.view_tighten_upper_bound(view, clamp(div_floor(upper, divisor)))?;
            } else {
                assignments.view_tighten_lower_bound(view, clamp(div_ceil(upper, divisor)))?;
                assignments.view_tighten_upper_bound(view, clamp(div_floor(lower, divisor)))?;
            }
        }

        Ok(())
    }

    fn detect_inconsistency(&self, assignments: &mut Assignments) -> bool {
        let (min_sum, max_sum) = Self::sum_bounds(
            self.terms
                .iter()
                .map(|&(coefficient, view)| Self::term_bounds(assignments, coefficient, view)),
        );
        let rhs = i128::from(self.rhs);

        rhs < min_sum || rhs > max_sum
    }
}

/// Bounds beyond `i64` lie outside every domain, so clamping keeps the tightening outcome.
fn clamp(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

fn div_floor(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    if numerator % denominator != 0 && (numerator < 0) != (denominator < 0) {
        quotient - 1
    } else {
        quotient
    }
}

fn div_ceil(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    if numerator % denominator != 0 && (numerator < 0) == (denominator < 0) {
        quotient + 1
    } else {
        quotient
    }
}
