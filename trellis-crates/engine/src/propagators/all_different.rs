use super::Propagator;
use crate::basic_types::PropagationStatus;
use crate::containers::HashSet;
use crate::engine::Assignments;
use crate::variables::IntView;

/// Forward checking propagator for the all-different constraint: the value of a fixed view is
/// removed from all other views.
#[derive(Clone, Debug)]
pub(crate) struct AllDifferentPropagator {
    views: Box<[IntView]>,
}

impl AllDifferentPropagator {
    pub(crate) fn new(views: impl Into<Box<[IntView]>>) -> Self {
        AllDifferentPropagator {
            views: views.into(),
        }
    }
}

impl Propagator for AllDifferentPropagator {
    fn name(&self) -> &str {
        "AllDifferent"
    }

    fn variables(&self) -> Vec<IntView> {
        self.views.to_vec()
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        for (index, &view) in self.views.iter().enumerate() {
            let Some(value) = assignments.view_value(view) else {
                continue;
            };

            for (other_index, &other) in self.views.iter().enumerate() {
                if other_index != index {
                    assignments.view_remove(other, value)?;
                }
            }
        }

        Ok(())
    }

    fn detect_inconsistency(&self, assignments: &mut Assignments) -> bool {
        let mut seen: HashSet<i64> = HashSet::default();
        self.views
            .iter()
            .filter_map(|&view| assignments.view_value(view))
            .any(|value| !seen.insert(value))
    }
}
