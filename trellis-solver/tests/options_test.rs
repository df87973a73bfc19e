#![cfg(test)] // workaround for https://github.com/rust-lang/rust-clippy/issues/11024

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use trellis_solver::MiniZincOptions;
use trellis_solver::OptimisationDirection;

#[derive(Debug, Parser)]
struct Arguments {
    #[command(flatten)]
    minizinc: MiniZincOptions,

    #[arg(long, value_enum)]
    direction: Option<OptimisationDirection>,
}

#[test]
fn defaults_match_the_default_options() {
    let arguments = Arguments::try_parse_from(["trellis"]).expect("valid arguments");
    let defaults = MiniZincOptions::default();

    assert_eq!(arguments.minizinc.executable, defaults.executable);
    assert_eq!(arguments.minizinc.solver, defaults.solver);
    assert_eq!(arguments.minizinc.free_search, defaults.free_search);
    assert_eq!(
        arguments.minizinc.optimisation_level,
        defaults.optimisation_level
    );
    assert!(arguments.minizinc.extra_args.is_empty());
    assert_eq!(arguments.minizinc.grace_period, defaults.grace_period);
    assert_eq!(arguments.direction, None);
}

#[test]
fn every_option_can_be_set() {
    let arguments = Arguments::try_parse_from([
        "trellis",
        "--minizinc",
        "/opt/minizinc/bin/minizinc",
        "--minizinc-solver",
        "chuffed",
        "-f",
        "-O",
        "2",
        "--minizinc-arg",
        "data.dzn",
        "--minizinc-arg",
        "more.dzn",
        "--grace-period",
        "250",
        "--direction",
        "maximise",
    ])
    .expect("valid arguments");

    assert_eq!(
        arguments.minizinc.executable,
        PathBuf::from("/opt/minizinc/bin/minizinc")
    );
    assert_eq!(arguments.minizinc.solver, "chuffed");
    assert!(arguments.minizinc.free_search);
    assert_eq!(arguments.minizinc.optimisation_level, Some(2));
    assert_eq!(arguments.minizinc.extra_args, vec!["data.dzn", "more.dzn"]);
    assert_eq!(arguments.minizinc.grace_period, Duration::from_millis(250));
    assert_eq!(arguments.direction, Some(OptimisationDirection::Maximise));
}
