//! Shared scenarios and a stand-in MiniZinc executable for the integration tests.
#![allow(
    dead_code,
    reason = "is used in integration tests but unable to find a way to silence these warnings"
)]

use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::OnceLock;

use trellis_solver::backends::Backend;
use trellis_solver::model::*;
use trellis_solver::MiniZincOptions;
use trellis_solver::SolveOptions;
use trellis_solver::Solver;
use trellis_solver::SolverStatus;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `x \/ y` is feasible and one of the two is true.
pub(crate) fn disjunction_is_satisfied<B: Backend>(backend: B) {
    let mut solver = Solver::new(backend);
    let x = BoolVar::named("x");
    let y = BoolVar::named("y");

    solver.add(or([&x, &y])).expect("posts");

    assert!(solver.solve(&SolveOptions::default()).expect("solves"));
    assert_eq!(solver.status(), SolverStatus::Feasible);
    assert!(solver.value(&x) == Some(1) || solver.value(&y) == Some(1));
}

/// `v == 5` over `1..9` fixes `v`.
pub(crate) fn equality_fixes_the_value<B: Backend>(backend: B) {
    let mut solver = Solver::new(backend);
    let v = IntVar::named(1, 9, "v");

    solver.add(eq(&v, 5)).expect("posts");

    assert!(solver.solve(&SolveOptions::default()).expect("solves"));
    assert_eq!(solver.status(), SolverStatus::Feasible);
    assert_eq!(solver.value(&v), Some(5));
}

/// `x /\ not x` has no solution.
pub(crate) fn contradiction_is_unsatisfiable<B: Backend>(backend: B) {
    let mut solver = Solver::new(backend);
    let x = BoolVar::named("x");

    solver.add(&x).expect("posts");
    solver.add(!&x).expect("posts");

    assert!(!solver.solve(&SolveOptions::default()).expect("solves"));
    assert_eq!(solver.status(), SolverStatus::Unsatisfiable);
    assert_eq!(solver.value(&x), None);
}

/// `x -> (y == 3)` with `x` forced to true.
pub(crate) fn implication_is_enforced<B: Backend>(backend: B) {
    let mut solver = Solver::new(backend);
    let x = BoolVar::named("x");
    let y = IntVar::named(0, 9, "y");

    solver.add(implies(&x, eq(&y, 3))).expect("posts");
    solver.add(&x).expect("posts");

    assert!(solver.solve(&SolveOptions::default()).expect("solves"));
    assert_eq!(solver.value(&x), Some(1));
    assert_eq!(solver.value(&y), Some(3));
}

/// `minimise a + b` over `0..5` reaches zero.
pub(crate) fn sum_is_minimised<B: Backend>(backend: B) {
    let mut solver = Solver::new(backend);
    let a = IntVar::named(0, 5, "a");
    let b = IntVar::named(0, 5, "b");

    solver.minimise(sum([&a, &b])).expect("sets the objective");

    assert!(solver.solve(&SolveOptions::default()).expect("solves"));
    assert_eq!(solver.status(), SolverStatus::Optimal);
    assert_eq!(solver.objective_value(), Some(0));
    assert_eq!(solver.value(&a), Some(0));
    assert_eq!(solver.value(&b), Some(0));
}

/// `x <= 2` over `1..3` has exactly the solutions 1 and 2.
pub(crate) fn both_solutions_are_enumerated<B: Backend>(backend: B) {
    let mut solver = Solver::new(backend);
    let x = IntVar::named(1, 3, "x");

    solver.add(le(&x, 2)).expect("posts");

    let mut found = vec![];
    let count = solver
        .enumerate(None, SolveOptions::default(), |solution| {
            found.push(solution.value(&x).expect("x is tracked"));
        })
        .expect("enumerates");

    found.sort_unstable();
    assert_eq!(count, 2);
    assert_eq!(found, vec![1, 2]);
}

/// `alldifferent(p, q, r)` over `1..3` has the six permutations of `1, 2, 3` as solutions, and
/// each is reported once.
pub(crate) fn permutations_are_all_found<B: Backend>(backend: B) {
    let mut solver = Solver::new(backend);
    let variables = [
        IntVar::named(1, 3, "p"),
        IntVar::named(1, 3, "q"),
        IntVar::named(1, 3, "r"),
    ];

    solver.add(alldifferent(&variables)).expect("posts");

    let mut found = BTreeSet::new();
    let count = solver
        .enumerate(None, SolveOptions::default(), |solution| {
            let values = variables
                .iter()
                .map(|variable| solution.value(variable).expect("tracked"))
                .collect::<Vec<_>>();
            assert!(found.insert(values), "solutions are distinct");
        })
        .expect("enumerates");

    assert_eq!(count, 6);
    assert_eq!(found.len(), 6);
    assert!(found.iter().all(|values| {
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted == vec![1, 2, 3]
    }));
}

const FAKE_MINIZINC: &str = r#"#!/bin/sh
# Replays canned output. The directory holding it is passed as --responses=<dir>; the response
# is chosen by the number of constraint items in the program.
responses=""
for arg in "$@"; do
    case "$arg" in
        --responses=*) responses="${arg#--responses=}" ;;
    esac
    model="$arg"
done

printf '%s\n' "$@" > "$responses/args"
cp "$model" "$responses/program.mzn"

if [ -f "$responses/sleep" ]; then
    sleep "$(cat "$responses/sleep")"
fi
if [ -f "$responses/stderr" ]; then
    cat "$responses/stderr" >&2
fi

count=$(grep -c '^constraint' "$model")
if [ -f "$responses/$count" ]; then
    cat "$responses/$count"
elif [ -f "$responses/default" ]; then
    cat "$responses/default"
fi

if [ -f "$responses/exit" ]; then
    exit "$(cat "$responses/exit")"
fi
"#;

/// The path of an executable which behaves like MiniZinc as far as its output is concerned.
#[cfg(unix)]
pub(crate) fn fake_minizinc() -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    static SCRIPT: OnceLock<PathBuf> = OnceLock::new();

    SCRIPT
        .get_or_init(|| {
            let path = Path::new(env!("CARGO_TARGET_TMPDIR"))
                .join(format!("fake-minizinc-{}.sh", std::process::id()));
            std::fs::write(&path, FAKE_MINIZINC).expect("can write the fake minizinc");
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("can make the fake minizinc executable");
            path
        })
        .clone()
}

/// Canned responses for [`fake_minizinc`], keyed on the number of constraint items.
pub(crate) struct Responses {
    directory: tempfile::TempDir,
}

impl Responses {
    pub(crate) fn new() -> Self {
        Responses {
            directory: tempfile::tempdir().expect("can create a temporary directory"),
        }
    }

    /// The output for a program with `num_constraints` constraint items.
    pub(crate) fn on(self, num_constraints: usize, stdout: &str) -> Self {
        self.write(&num_constraints.to_string(), stdout)
    }

    /// The output when no response matches the number of constraint items.
    pub(crate) fn otherwise(self, stdout: &str) -> Self {
        self.write("default", stdout)
    }

    pub(crate) fn exit_code(self, code: i32) -> Self {
        self.write("exit", &code.to_string())
    }

    pub(crate) fn stderr(self, stderr: &str) -> Self {
        self.write("stderr", stderr)
    }

    pub(crate) fn sleep_seconds(self, seconds: u64) -> Self {
        self.write("sleep", &seconds.to_string())
    }

    fn write(self, file: &str, contents: &str) -> Self {
        std::fs::write(self.directory.path().join(file), contents)
            .expect("can write a response");
        self
    }

    /// Options running the fake executable on these responses.
    #[cfg(unix)]
    pub(crate) fn options(&self) -> MiniZincOptions {
        MiniZincOptions {
            executable: fake_minizinc(),
            extra_args: vec![format!("--responses={}", self.directory.path().display())],
            ..MiniZincOptions::default()
        }
    }

    /// The arguments of the last run, one per line.
    pub(crate) fn arguments(&self) -> Vec<String> {
        std::fs::read_to_string(self.directory.path().join("args"))
            .expect("minizinc was run")
            .lines()
            .map(ToOwned::to_owned)
            .collect()
    }

    /// The program of the last run.
    pub(crate) fn program(&self) -> String {
        std::fs::read_to_string(self.directory.path().join("program.mzn")).expect("minizinc was run")
    }
}
