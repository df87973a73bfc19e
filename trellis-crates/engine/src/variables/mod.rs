//! The handles through which integers in the [`Solver`] are referenced.
//!
//! Every variable created by the solver is identified by a [`DomainId`]. Constraints do not
//! refer to domains directly but to an [`IntView`]: either a constant, or a domain seen through
//! an optional negation and a constant offset. This is what allows [`Solver::negate`] and
//! [`Solver::add_constant`] to create new handles without creating new variables.

#[cfg(doc)]
use crate::Solver;
use crate::containers::StorageKey;

/// The identifier of a variable domain in the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId {
    id: u32,
}

impl DomainId {
    pub(crate) fn new(id: u32) -> Self {
        DomainId { id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl StorageKey for DomainId {
    fn index(&self) -> usize {
        self.id as usize
    }

    fn create_from_index(index: usize) -> Self {
        DomainId::new(index as u32)
    }
}

/// A handle to an integer in the solver.
///
/// The value of a view over the domain `x` is `x + offset`, or `-x + offset` when the view is
/// negated. A view without a domain is the constant `offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntView {
    domain: Option<DomainId>,
    negated: bool,
    offset: i64,
}

impl IntView {
    pub(crate) fn of_domain(domain: DomainId) -> Self {
        IntView {
            domain: Some(domain),
            negated: false,
            offset: 0,
        }
    }

    pub(crate) fn constant(value: i64) -> Self {
        IntView {
            domain: None,
            negated: false,
            offset: value,
        }
    }

    /// The domain this view is defined over, or `None` for a constant.
    pub fn domain(&self) -> Option<DomainId> {
        self.domain
    }

    /// If this view is a constant, its value.
    pub fn as_constant(&self) -> Option<i64> {
        match self.domain {
            Some(_) => None,
            None => Some(self.offset),
        }
    }

    /// The view `-self`.
    pub(crate) fn negation(self) -> Self {
        IntView {
            domain: self.domain,
            negated: self.domain.is_some() && !self.negated,
            offset: self.offset.saturating_neg(),
        }
    }

    /// The view `self + value`.
    pub(crate) fn shifted(self, value: i64) -> Self {
        IntView {
            offset: self.offset.saturating_add(value),
            ..self
        }
    }

    /// Translates a value of the underlying domain into a value of this view.
    pub(crate) fn map(&self, inner: i32) -> i64 {
        let inner = inner as i64;
        if self.negated {
            self.offset.saturating_sub(inner)
        } else {
            self.offset.saturating_add(inner)
        }
    }

    /// Translates a value of this view into a value of the underlying domain.
    pub(crate) fn unmap(&self, outer: i64) -> i64 {
        let shifted = outer.saturating_sub(self.offset);
        if self.negated {
            shifted.saturating_neg()
        } else {
            shifted
        }
    }

    pub(crate) fn is_negated(&self) -> bool {
        self.negated
    }
}
