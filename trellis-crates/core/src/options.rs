use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OptimisationDirection {
    Minimise,
    Maximise,
}

/// Options which apply to a single solve call.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolveOptions {
    /// Backends which cannot honour a time limit reject it.
    pub time_limit: Option<Duration>,
}

impl SolveOptions {
    pub fn with_time_limit(time_limit: Duration) -> Self {
        SolveOptions {
            time_limit: Some(time_limit),
        }
    }
}

/// How to invoke the MiniZinc executable.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct MiniZincOptions {
    /// The MiniZinc executable.
    #[cfg_attr(feature = "clap", arg(long = "minizinc", default_value = "minizinc"))]
    pub executable: PathBuf,

    /// The solver MiniZinc should use.
    #[cfg_attr(feature = "clap", arg(long = "minizinc-solver", default_value = "gecode"))]
    pub solver: String,

    /// Allow the solver to ignore search annotations.
    #[cfg_attr(feature = "clap", arg(short = 'f', long = "free-search"))]
    pub free_search: bool,

    /// The optimisation level of the MiniZinc compiler (`-O<level>`).
    #[cfg_attr(feature = "clap", arg(short = 'O', long = "optimisation-level"))]
    pub optimisation_level: Option<u8>,

    /// Additional arguments passed to the executable before the model file.
    #[cfg_attr(feature = "clap", arg(long = "minizinc-arg"))]
    pub extra_args: Vec<String>,

    /// How long to wait beyond the time limit before the process is killed.
    #[cfg_attr(
        feature = "clap",
        arg(long = "grace-period", value_parser = parse_duration, default_value = "1000")
    )]
    pub grace_period: Duration,
}

impl Default for MiniZincOptions {
    fn default() -> Self {
        MiniZincOptions {
            executable: PathBuf::from("minizinc"),
            solver: "gecode".to_owned(),
            free_search: false,
            optimisation_level: None,
            extra_args: vec![],
            grace_period: Duration::from_secs(1),
        }
    }
}

#[cfg(feature = "clap")]
fn parse_duration(milliseconds: &str) -> Result<Duration, std::num::ParseIntError> {
    milliseconds.parse().map(Duration::from_millis)
}
