//! Runs the MiniZinc executable on a generated program.
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::process::Command;
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use log::warn;
use wait_timeout::ChildExt;

use crate::LoweringError;
use crate::MiniZincOptions;

/// What the process printed.
#[derive(Clone, Debug)]
pub(super) struct ProcessOutput {
    pub(super) stdout: String,
    pub(super) stderr: String,
    pub(super) success: bool,
}

/// Runs MiniZinc on `program`. Returns `None` if the process had to be killed because it ran
/// longer than the time limit plus the grace period.
pub(super) fn run(
    options: &MiniZincOptions,
    program: &str,
    time_limit: Option<Duration>,
) -> Result<Option<ProcessOutput>, LoweringError> {
    let mut model = tempfile::Builder::new()
        .prefix("trellis-")
        .suffix(".mzn")
        .tempfile()?;
    model.write_all(program.as_bytes())?;
    model.flush()?;

    let mut stdout = tempfile::tempfile()?;
    let mut stderr = tempfile::tempfile()?;

    let mut command = Command::new(&options.executable);
    let _ = command
        .arg("--solver")
        .arg(&options.solver)
        .arg("--output-mode")
        .arg("dzn")
        .arg("--output-objective")
        .arg("--output-time");
    if let Some(time_limit) = time_limit {
        let _ = command
            .arg("--time-limit")
            .arg(time_limit.as_millis().to_string());
    }
    if options.free_search {
        let _ = command.arg("-f");
    }
    if let Some(level) = options.optimisation_level {
        let _ = command.arg(format!("-O{level}"));
    }
    let _ = command
        .args(&options.extra_args)
        .arg(model.path())
        .stdin(Stdio::null())
        .stdout(stdout.try_clone()?)
        .stderr(stderr.try_clone()?);

    debug!("running {command:?}");
    let mut child = command.spawn()?;

    let status = match time_limit {
        Some(time_limit) => {
            let deadline = time_limit + options.grace_period;
            match child.wait_timeout(deadline)? {
                Some(status) => status,
                None => {
                    warn!(
                        "minizinc did not finish within {}ms, killing it",
                        deadline.as_millis()
                    );
                    if let Err(error) = child.kill() {
                        warn!("failed to kill minizinc: {error}");
                    }
                    let _ = child.wait()?;
                    return Ok(None);
                }
            }
        }
        None => child.wait()?,
    };
    debug!("minizinc exited with {status}");

    Ok(Some(ProcessOutput {
        stdout: read_all(&mut stdout)?,
        stderr: read_all(&mut stderr)?,
        success: status.success(),
    }))
}

fn read_all(file: &mut std::fs::File) -> Result<String, LoweringError> {
    let _ = file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    let _ = file.read_to_string(&mut contents)?;
    Ok(contents)
}
