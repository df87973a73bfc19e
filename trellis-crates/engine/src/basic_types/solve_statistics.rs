use std::fmt::Display;
use std::time::Duration;

#[cfg(doc)]
use crate::Solver;

/// The outcome of a call to [`Solver::solve`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveStatistics {
    /// The number of solutions which were found. For optimisation problems every improving
    /// solution is counted.
    pub solutions: u64,
    /// The number of search decisions.
    pub nodes: u64,
    /// The number of dead ends encountered during search.
    pub failures: u64,
    /// Whether the search space was exhausted. For an optimisation problem with at least one
    /// solution this means the last solution is optimal.
    pub complete: bool,
    pub runtime: Duration,
}

impl Display for SolveStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "solutions={} nodes={} failures={} complete={} runtime={}ms",
            self.solutions,
            self.nodes,
            self.failures,
            self.complete,
            self.runtime.as_millis()
        )
    }
}
