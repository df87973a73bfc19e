//! Interprets what MiniZinc prints in `dzn` output mode.
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::containers::HashMap;
use crate::LoweringError;

const SOLUTION_SEPARATOR: &str = "----------";
const SEARCH_COMPLETE: &str = "==========";
const UNSATISFIABLE: &str = "=====UNSATISFIABLE=====";
const UNSATISFIABLE_OR_UNBOUNDED: &str = "=====UNSATorUNBOUNDED=====";
const UNBOUNDED: &str = "=====UNBOUNDED=====";
const UNKNOWN: &str = "=====UNKNOWN=====";
const ERROR: &str = "=====ERROR=====";

static ASSIGNMENT: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(-?[0-9]+|true|false)\s*;$")
});

/// The line `--output-time` adds after every solution and at the end of the search.
static TIME_ELAPSED: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^%\s*time elapsed:\s*([0-9]+(?:\.[0-9]+)?)\s*s$"));

fn compiled(
    regex: &'static LazyLock<Result<Regex, regex::Error>>,
) -> Result<&'static Regex, LoweringError> {
    LazyLock::force(regex)
        .as_ref()
        .map_err(|error| LoweringError::MalformedOutput(error.to_string()))
}

/// The status vocabulary of MiniZinc.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MiniZincStatus {
    /// At least one solution was found.
    Satisfied,
    /// Every solution of a satisfaction problem was found.
    AllSolutions,
    OptimalSolution,
    Unsatisfiable,
    Unbounded,
    UnsatisfiableOrUnbounded,
    /// The search stopped without a solution or a proof that none exists.
    Unknown,
    /// MiniZinc or the solver failed; carries the message it printed.
    Error(String),
}

/// The parsed output of one run.
#[derive(Clone, Debug)]
pub(super) struct MiniZincOutput {
    pub(super) status: MiniZincStatus,
    /// The values in the last solution, by variable name.
    pub(super) values: HashMap<String, i64>,
    pub(super) objective: Option<i64>,
    /// The last elapsed time MiniZinc reported.
    pub(super) runtime: Option<Duration>,
}

/// Parses the output of a run. `optimising` tells whether the model had an objective, which
/// decides what the search-complete marker means.
pub(super) fn parse_output(
    stdout: &str,
    stderr: &str,
    exited_successfully: bool,
    optimising: bool,
) -> Result<MiniZincOutput, LoweringError> {
    let has_line = |marker: &str| stdout.lines().any(|line| line.trim() == marker);

    let status = if has_line(ERROR) {
        MiniZincStatus::Error(error_message(stdout, stderr))
    } else if has_line(SOLUTION_SEPARATOR) {
        if !has_line(SEARCH_COMPLETE) {
            MiniZincStatus::Satisfied
        } else if optimising {
            MiniZincStatus::OptimalSolution
        } else {
            MiniZincStatus::AllSolutions
        }
    } else if has_line(UNSATISFIABLE) {
        MiniZincStatus::Unsatisfiable
    } else if has_line(UNSATISFIABLE_OR_UNBOUNDED) {
        MiniZincStatus::UnsatisfiableOrUnbounded
    } else if has_line(UNBOUNDED) {
        MiniZincStatus::Unbounded
    } else if has_line(UNKNOWN) || exited_successfully {
        MiniZincStatus::Unknown
    } else {
        MiniZincStatus::Error(error_message(stdout, stderr))
    };

    let values = match status {
        MiniZincStatus::Satisfied
        | MiniZincStatus::AllSolutions
        | MiniZincStatus::OptimalSolution => parse_solution(last_solution(stdout))?,
        _ => HashMap::default(),
    };
    let objective = values.get("_objective").copied();
    let runtime = parse_runtime(stdout)?;

    Ok(MiniZincOutput {
        status,
        values,
        objective,
        runtime,
    })
}

/// The text of the last solution, i.e. everything between the last two separators.
fn last_solution(stdout: &str) -> &str {
    let end = stdout.rfind(SOLUTION_SEPARATOR).unwrap_or(stdout.len());
    let start = stdout[..end]
        .rfind(SOLUTION_SEPARATOR)
        .map_or(0, |position| position + SOLUTION_SEPARATOR.len());
    &stdout[start..end]
}

fn parse_solution(solution: &str) -> Result<HashMap<String, i64>, LoweringError> {
    let assignment = compiled(&ASSIGNMENT)?;

    solution
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('%'))
        .map(|line| {
            let captures = assignment.captures(line).ok_or_else(|| {
                LoweringError::MalformedOutput(format!("invalid solution line '{line}'"))
            })?;
            let value = match &captures[2] {
                "true" => 1,
                "false" => 0,
                integer => integer.parse::<i64>().map_err(|_| {
                    LoweringError::MalformedOutput(format!("value out of range in '{line}'"))
                })?,
            };
            Ok((captures[1].to_owned(), value))
        })
        .collect()
}

fn parse_runtime(stdout: &str) -> Result<Option<Duration>, LoweringError> {
    let time_elapsed = compiled(&TIME_ELAPSED)?;

    Ok(stdout
        .lines()
        .filter_map(|line| time_elapsed.captures(line.trim()))
        .filter_map(|captures| captures[1].parse::<f64>().ok())
        .filter_map(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .last())
}

fn error_message(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        stdout.trim().to_owned()
    } else {
        stderr.to_owned()
    }
}
