use super::Propagator;
use crate::basic_types::Inconsistency;
use crate::basic_types::PropagationStatus;
use crate::engine::Assignments;
use crate::variables::IntView;

/// Propagator for `\/ literals`.
#[derive(Clone, Debug)]
pub(crate) struct DisjunctionPropagator {
    literals: Box<[IntView]>,
}

impl DisjunctionPropagator {
    pub(crate) fn new(literals: impl Into<Box<[IntView]>>) -> Self {
        DisjunctionPropagator {
            literals: literals.into(),
        }
    }
}

impl Propagator for DisjunctionPropagator {
    fn name(&self) -> &str {
        "Disjunction"
    }

    fn variables(&self) -> Vec<IntView> {
        self.literals.to_vec()
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        if self
            .literals
            .iter()
            .any(|&literal| assignments.is_true(literal))
        {
            return Ok(());
        }

        let mut unassigned = self
            .literals
            .iter()
            .filter(|&&literal| !assignments.is_false(literal));

        match (unassigned.next(), unassigned.next()) {
            (None, _) => Err(Inconsistency),
            (Some(&last), None) => assignments.make_true(last),
            _ => Ok(()),
        }
    }

    fn detect_inconsistency(&self, assignments: &mut Assignments) -> bool {
        self.literals
            .iter()
            .all(|&literal| assignments.is_false(literal))
    }
}

/// Propagator for `/\ literals`.
#[derive(Clone, Debug)]
pub(crate) struct ConjunctionPropagator {
    literals: Box<[IntView]>,
}

impl ConjunctionPropagator {
    pub(crate) fn new(literals: impl Into<Box<[IntView]>>) -> Self {
        ConjunctionPropagator {
            literals: literals.into(),
        }
    }
}

impl Propagator for ConjunctionPropagator {
    fn name(&self) -> &str {
        "Conjunction"
    }

    fn variables(&self) -> Vec<IntView> {
        self.literals.to_vec()
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        self.literals
            .iter()
            .try_for_each(|&literal| assignments.make_true(literal))
    }

    fn detect_inconsistency(&self, assignments: &mut Assignments) -> bool {
        self.literals
            .iter()
            .any(|&literal| assignments.is_false(literal))
    }
}

/// Propagator which requires an odd number of `literals` to be true.
#[derive(Clone, Debug)]
pub(crate) struct XorPropagator {
    literals: Box<[IntView]>,
}

impl XorPropagator {
    pub(crate) fn new(literals: impl Into<Box<[IntView]>>) -> Self {
        XorPropagator {
            literals: literals.into(),
        }
    }
}

impl Propagator for XorPropagator {
    fn name(&self) -> &str {
        "Xor"
    }

    fn variables(&self) -> Vec<IntView> {
        self.literals.to_vec()
    }

    fn propagate(&self, assignments: &mut Assignments) -> PropagationStatus {
        let mut parity = false;
        let mut unassigned = None;

        for &literal in self.literals.iter() {
            if assignments.is_true(literal) {
                parity = !parity;
            } else if !assignments.is_false(literal) {
                if unassigned.is_some() {
                    return Ok(());
                }
                unassigned = Some(literal);
            }
        }

        match unassigned {
            Some(literal) if parity => assignments.make_false(literal),
            Some(literal) => assignments.make_true(literal),
            None if parity => Ok(()),
            None => Err(Inconsistency),
        }
    }
}
