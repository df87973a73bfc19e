use std::fmt::Display;

/// The solver status, unified over all backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// No solve has been attempted yet.
    #[default]
    NotRun,
    Feasible,
    /// A solution was found and proven optimal.
    Optimal,
    Unsatisfiable,
    Error,
    /// The backend stopped without a solution or a proof that none exists.
    Unknown,
}

impl SolverStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolverStatus::Feasible | SolverStatus::Optimal)
    }
}

impl Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SolverStatus::NotRun => "NOT_RUN",
            SolverStatus::Feasible => "FEASIBLE",
            SolverStatus::Optimal => "OPTIMAL",
            SolverStatus::Unsatisfiable => "UNSATISFIABLE",
            SolverStatus::Error => "ERROR",
            SolverStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}
