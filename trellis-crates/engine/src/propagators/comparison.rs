use super::Propagator;
use crate::basic_types::PropagationStatus;
use crate::engine::Assignments;
use crate::variables::IntView;

/// Propagator for `a == b`.
///
/// Only the bounds are propagated, unless one side is fixed in which case the other side is
/// fixed as well.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EqualsPropagator {
    a: IntView,
    b: IntView,
}

impl EqualsPropagator {
    pub(crate) fn new(a: IntView, b: IntView) -> Self {
        EqualsPropagator { a, b }
    }
}

impl Propagator for EqualsPropagator {
    fn name(&self) -> &str {
        "Equals"
    }

    fn variables(&self) -> Vec<IntView> {
        vec![self.a, self.b]
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        let (a, b) = (self.a, self.b);

        assignments.view_tighten_lower_bound(a, assignments.view_lower_bound(b))?;
        assignments.view_tighten_upper_bound(a, assignments.view_upper_bound(b))?;
        assignments.view_tighten_lower_bound(b, assignments.view_lower_bound(a))?;
        assignments.view_tighten_upper_bound(b, assignments.view_upper_bound(a))?;

        if let Some(value) = assignments.view_value(a) {
            assignments.view_fix(b, value)?;
        }
        if let Some(value) = assignments.view_value(b) {
            assignments.view_fix(a, value)?;
        }

        Ok(())
    }
}

/// Propagator for `a != b`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct NotEqualsPropagator {
    a: IntView,
    b: IntView,
}

impl NotEqualsPropagator {
    pub(crate) fn new(a: IntView, b: IntView) -> Self {
        NotEqualsPropagator { a, b }
    }
}

impl Propagator for NotEqualsPropagator {
    fn name(&self) -> &str {
        "NotEquals"
    }

    fn variables(&self) -> Vec<IntView> {
        vec![self.a, self.b]
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        if let Some(value) = assignments.view_value(self.a) {
            assignments.view_remove(self.b, value)?;
        }
        if let Some(value) = assignments.view_value(self.b) {
            assignments.view_remove(self.a, value)?;
        }

        Ok(())
    }

    fn detect_inconsistency(&self, assignments: &mut Assignments) -> bool {
        matches!(
            (assignments.view_value(self.a), assignments.view_value(self.b)),
            (Some(a), Some(b)) if a == b
        )
    }
}

/// Propagator for `a < b`, or `a <= b` when `or_equal` is set.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LessThanPropagator {
    a: IntView,
    b: IntView,
    or_equal: bool,
}

impl LessThanPropagator {
    pub(crate) fn new(a: IntView, b: IntView, or_equal: bool) -> Self {
        LessThanPropagator { a, b, or_equal }
    }

    fn gap(&self) -> i64 {
        if self.or_equal {
            0
        } else {
            1
        }
    }
}

impl Propagator for LessThanPropagator {
    fn name(&self) -> &str {
        if self.or_equal {
            "LessThanOrEqual"
        } else {
            "LessThan"
        }
    }

    fn variables(&self) -> Vec<IntView> {
        vec![self.a, self.b]
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        let b_upper_bound = assignments.view_upper_bound(self.b);
        assignments.view_tighten_upper_bound(self.a, b_upper_bound.saturating_sub(self.gap()))?;

        let a_lower_bound = assignments.view_lower_bound(self.a);
        assignments.view_tighten_lower_bound(self.b, a_lower_bound.saturating_add(self.gap()))
    }

    fn detect_inconsistency(&self, assignments: &mut Assignments) -> bool {
        assignments.view_lower_bound(self.a).saturating_add(self.gap())
            > assignments.view_upper_bound(self.b)
    }
}
