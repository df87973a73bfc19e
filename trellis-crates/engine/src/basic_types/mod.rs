mod engine_error;
mod solve_statistics;
mod trail;

pub use engine_error::EngineError;
pub(crate) use engine_error::Inconsistency;
pub(crate) use engine_error::PropagationStatus;
pub use solve_statistics::SolveStatistics;
pub(crate) use trail::Trail;
