use std::collections::BTreeSet;

use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::basic_types::Trail;
use crate::containers::HashSet;
use crate::containers::KeyedVec;
use crate::variables::DomainId;
use crate::variables::IntView;

#[derive(Clone, Debug)]
struct IntegerDomain {
    lower_bound: i32,
    upper_bound: i32,
    /// The initial values of a domain which did not start out as an interval.
    initial_values: Option<BTreeSet<i32>>,
    /// Values strictly between the bounds which have been removed.
    removed: HashSet<i32>,
}

impl IntegerDomain {
    fn contains(&self, value: i32) -> bool {
        self.lower_bound <= value
            && value <= self.upper_bound
            && self
                .initial_values
                .as_ref()
                .map_or(true, |values| values.contains(&value))
            && !self.removed.contains(&value)
    }

    /// The smallest value in the domain which is at least `value`.
    fn first_value_from(&self, value: i32) -> Option<i32> {
        let start = value.max(self.lower_bound);
        if start > self.upper_bound {
            return None;
        }

        match &self.initial_values {
            Some(values) => values
                .range(start..=self.upper_bound)
                .copied()
                .find(|value| !self.removed.contains(value)),
            None => (start..=self.upper_bound).find(|value| !self.removed.contains(value)),
        }
    }

    /// The largest value in the domain which is at most `value`.
    fn last_value_until(&self, value: i32) -> Option<i32> {
        let end = value.min(self.upper_bound);
        if end < self.lower_bound {
            return None;
        }

        match &self.initial_values {
            Some(values) => values
                .range(self.lower_bound..=end)
                .rev()
                .copied()
                .find(|value| !self.removed.contains(value)),
            None => (self.lower_bound..=end)
                .rev()
                .find(|value| !self.removed.contains(value)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum DomainChange {
    LowerBound { domain: DomainId, old: i32 },
    UpperBound { domain: DomainId, old: i32 },
    Removal { domain: DomainId, value: i32 },
}

/// The current domains of all variables, with the ability to backtrack to earlier checkpoints.
#[derive(Debug, Default)]
pub(crate) struct Assignments {
    domains: KeyedVec<DomainId, IntegerDomain>,
    trail: Trail<DomainChange>,
    /// Domains changed since the last call to [`Assignments::take_modified`].
    modified: Vec<DomainId>,
}

impl Assignments {
    pub(crate) fn grow_interval(&mut self, lower_bound: i32, upper_bound: i32) -> DomainId {
        assert!(lower_bound <= upper_bound);
        self.domains.push(IntegerDomain {
            lower_bound,
            upper_bound,
            initial_values: None,
            removed: HashSet::default(),
        })
    }

    pub(crate) fn grow_sparse(&mut self, values: BTreeSet<i32>) -> DomainId {
        let (Some(&lower_bound), Some(&upper_bound)) = (values.first(), values.last()) else {
            panic!("a sparse domain needs at least one value");
        };

        self.domains.push(IntegerDomain {
            lower_bound,
            upper_bound,
            initial_values: Some(values),
            removed: HashSet::default(),
        })
    }

    pub(crate) fn num_domains(&self) -> usize {
        self.domains.len()
    }

    pub(crate) fn domains(&self) -> impl Iterator<Item = DomainId> {
        self.domains.keys()
    }

    pub(crate) fn lower_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].lower_bound
    }

    pub(crate) fn upper_bound(&self, domain: DomainId) -> i32 {
        self.domains[domain].upper_bound
    }

    pub(crate) fn is_fixed(&self, domain: DomainId) -> bool {
        self.lower_bound(domain) == self.upper_bound(domain)
    }

    pub(crate) fn new_checkpoint(&mut self) {
        self.trail.new_checkpoint();
    }

    pub(crate) fn get_checkpoint(&self) -> usize {
        self.trail.get_checkpoint()
    }

    /// Undo every domain change made after `checkpoint` was created.
    pub(crate) fn synchronise(&mut self, checkpoint: usize) {
        for change in self.trail.synchronise(checkpoint) {
            match change {
                DomainChange::LowerBound { domain, old } => {
                    self.domains[domain].lower_bound = old;
                }
                DomainChange::UpperBound { domain, old } => {
                    self.domains[domain].upper_bound = old;
                }
                DomainChange::Removal { domain, value } => {
                    let _ = self.domains[domain].removed.remove(&value);
                }
            }
        }
        self.modified.clear();
    }

    /// Runs `action` on the current domains and undoes all of its changes afterwards.
    pub(crate) fn try_and_undo(
        &mut self,
        action: impl FnOnce(&mut Assignments) -> PropagationStatus,
    ) -> PropagationStatus {
        let modified = std::mem::take(&mut self.modified);
        let checkpoint = self.get_checkpoint();

        self.new_checkpoint();
        let status = action(self);
        self.synchronise(checkpoint);

        self.modified = modified;
        status
    }

    pub(crate) fn take_modified(&mut self) -> Vec<DomainId> {
        std::mem::take(&mut self.modified)
    }

    fn tighten_lower_bound(&mut self, domain_id: DomainId, value: i64) -> PropagationStatus {
        let domain = &mut self.domains[domain_id];
        if value <= domain.lower_bound as i64 {
            return Ok(());
        }
        if value > domain.upper_bound as i64 {
            return Err(Inconsistency);
        }

        let new_bound = domain.first_value_from(value as i32).ok_or(Inconsistency)?;
        let old = domain.lower_bound;
        domain.lower_bound = new_bound;

        self.trail.push(DomainChange::LowerBound {
            domain: domain_id,
            old,
        });
        self.modified.push(domain_id);
        Ok(())
    }

    fn tighten_upper_bound(&mut self, domain_id: DomainId, value: i64) -> PropagationStatus {
        let domain = &mut self.domains[domain_id];
        if value >= domain.upper_bound as i64 {
            return Ok(());
        }
        if value < domain.lower_bound as i64 {
            return Err(Inconsistency);
        }

        let new_bound = domain.last_value_until(value as i32).ok_or(Inconsistency)?;
        let old = domain.upper_bound;
        domain.upper_bound = new_bound;

        self.trail.push(DomainChange::UpperBound {
            domain: domain_id,
            old,
        });
        self.modified.push(domain_id);
        Ok(())
    }

    fn remove_value(&mut self, domain_id: DomainId, value: i64) -> PropagationStatus {
        let Ok(value) = i32::try_from(value) else {
            return Ok(());
        };

        let domain = &mut self.domains[domain_id];
        if !domain.contains(value) {
            return Ok(());
        }

        if value == domain.lower_bound {
            self.tighten_lower_bound(domain_id, value as i64 + 1)
        } else if value == domain.upper_bound {
            self.tighten_upper_bound(domain_id, value as i64 - 1)
        } else {
            let _ = domain.removed.insert(value);
            self.trail.push(DomainChange::Removal {
                domain: domain_id,
                value,
            });
            self.modified.push(domain_id);
            Ok(())
        }
    }
}

/// Operations on views.
impl Assignments {
    pub(crate) fn view_lower_bound(&self, view: IntView) -> i64 {
        match view.domain() {
            None => view.map(0),
            Some(domain) if view.is_negated() => view.map(self.upper_bound(domain)),
            Some(domain) => view.map(self.lower_bound(domain)),
        }
    }

    pub(crate) fn view_upper_bound(&self, view: IntView) -> i64 {
        match view.domain() {
            None => view.map(0),
            Some(domain) if view.is_negated() => view.map(self.lower_bound(domain)),
            Some(domain) => view.map(self.upper_bound(domain)),
        }
    }

    pub(crate) fn view_contains(&self, view: IntView, value: i64) -> bool {
        match view.domain() {
            None => view.map(0) == value,
            Some(domain) => i32::try_from(view.unmap(value))
                .is_ok_and(|inner| self.domains[domain].contains(inner)),
        }
    }

    pub(crate) fn view_is_fixed(&self, view: IntView) -> bool {
        view.domain().map_or(true, |domain| self.is_fixed(domain))
    }

    pub(crate) fn view_value(&self, view: IntView) -> Option<i64> {
        if self.view_is_fixed(view) {
            Some(self.view_lower_bound(view))
        } else {
            None
        }
    }

    pub(crate) fn view_tighten_lower_bound(&mut self, view: IntView, value: i64) -> PropagationStatus {
        match view.domain() {
            None if view.map(0) >= value => Ok(()),
            None => Err(Inconsistency),
            Some(domain) if view.is_negated() => self.tighten_upper_bound(domain, view.unmap(value)),
            Some(domain) => self.tighten_lower_bound(domain, view.unmap(value)),
        }
    }

    pub(crate) fn view_tighten_upper_bound(&mut self, view: IntView, value: i64) -> PropagationStatus {
        match view.domain() {
            None if view.map(0) <= value => Ok(()),
            None => Err(Inconsistency),
            Some(domain) if view.is_negated() => self.tighten_lower_bound(domain, view.unmap(value)),
            Some(domain) => self.tighten_upper_bound(domain, view.unmap(value)),
        }
    }

    pub(crate) fn view_remove(&mut self, view: IntView, value: i64) -> PropagationStatus {
        match view.domain() {
            None if view.map(0) == value => Err(Inconsistency),
            None => Ok(()),
            Some(domain) => self.remove_value(domain, view.unmap(value)),
        }
    }

    pub(crate) fn view_fix(&mut self, view: IntView, value: i64) -> PropagationStatus {
        self.view_tighten_lower_bound(view, value)?;
        self.view_tighten_upper_bound(view, value)
    }
}

/// A view used as a Boolean is true when it is non-zero.
impl Assignments {
    pub(crate) fn is_true(&self, literal: IntView) -> bool {
        !self.view_contains(literal, 0)
    }

    pub(crate) fn is_false(&self, literal: IntView) -> bool {
        self.view_value(literal) == Some(0)
    }

    pub(crate) fn make_true(&mut self, literal: IntView) -> PropagationStatus {
        self.view_remove(literal, 0)
    }

    pub(crate) fn make_false(&mut self, literal: IntView) -> PropagationStatus {
        self.view_fix(literal, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_the_lower_bound_skips_removed_values() {
        let mut assignments = Assignments::default();
        let domain = assignments.grow_interval(0, 5);
        let view = IntView::of_domain(domain);

        assignments.view_remove(view, 1).expect("non-empty domain");
        assignments.view_remove(view, 0).expect("non-empty domain");

        assert_eq!(2, assignments.lower_bound(domain));
    }

    #[test]
    fn sparse_domains_tighten_to_the_next_initial_value() {
        let mut assignments = Assignments::default();
        let domain = assignments.grow_sparse([1, 4, 9].into_iter().collect());
        let view = IntView::of_domain(domain);

        assignments
            .view_tighten_lower_bound(view, 2)
            .expect("non-empty domain");

        assert_eq!(4, assignments.lower_bound(domain));
        assert!(!assignments.view_contains(view, 5));
        assert_eq!(
            Err(Inconsistency),
            assignments.view_tighten_lower_bound(view, 10)
        );
    }

    #[test]
    fn synchronise_restores_the_domain_at_the_checkpoint() {
        let mut assignments = Assignments::default();
        let domain = assignments.grow_interval(0, 5);
        let view = IntView::of_domain(domain);

        assignments.new_checkpoint();
        assignments.view_fix(view, 3).expect("value in domain");
        assert!(assignments.is_fixed(domain));

        assignments.synchronise(0);

        assert_eq!(0, assignments.lower_bound(domain));
        assert_eq!(5, assignments.upper_bound(domain));
    }

    #[test]
    fn negated_view_bounds_are_mirrored() {
        let mut assignments = Assignments::default();
        let domain = assignments.grow_interval(0, 1);
        let not_view = IntView::of_domain(domain).negation().shifted(1);

        assignments
            .make_true(not_view)
            .expect("literal can be made true");

        assert_eq!(Some(0), assignments.view_value(IntView::of_domain(domain)));
        assert!(assignments.is_true(not_view));
    }

    #[test]
    fn constant_views_fail_when_tightened_past_their_value() {
        let mut assignments = Assignments::default();
        let constant = IntView::constant(3);

        assert_eq!(Ok(()), assignments.view_tighten_upper_bound(constant, 3));
        assert_eq!(
            Err(Inconsistency),
            assignments.view_tighten_lower_bound(constant, 4)
        );
        assert_eq!(Some(3), assignments.view_value(constant));
    }
}
