use super::Propagator;
use crate::basic_types::PropagationStatus;
use crate::engine::Assignments;
use crate::variables::IntView;

/// Propagator for `reification -> constraint`, where `constraint` is enforced by `propagator`.
///
/// When `reification` is true the wrapped propagator runs as usual. While it is unassigned, the
/// wrapped propagator is only asked whether the constraint has become impossible, in which case
/// `reification` is set to false.
#[derive(Debug)]
pub(crate) struct ReifiedPropagator {
    propagator: Box<dyn Propagator>,
    reification: IntView,
    name: String,
}

impl ReifiedPropagator {
    pub(crate) fn new(propagator: impl Propagator + 'static, reification: IntView) -> Self {
        let name = format!("Reified({})", propagator.name());
        ReifiedPropagator {
            propagator: Box::new(propagator),
            reification,
            name,
        }
    }
}

impl Propagator for ReifiedPropagator {
    fn name(&self) -> &str {
        &self.name
    }

    fn variables(&self) -> Vec<IntView> {
        let mut variables = self.propagator.variables();
        variables.push(self.reification);
        variables
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        if assignments.is_false(self.reification) {
            return Ok(());
        }

        if assignments.is_true(self.reification) {
            return self.propagator.propagate(assignments);
        }

        if self.propagator.detect_inconsistency(assignments) {
            assignments.make_false(self.reification)?;
        }

        Ok(())
    }
}
