//! Lowering into a MiniZinc program, which is solved by the `minizinc` executable.
//!
//! The program consists of a fixed preamble, one declaration per referenced variable, one
//! `constraint` item per posted constraint and the solve item. The solve item is only added when
//! the program is run, so the objective can be replaced until then.
mod output;
mod render;
mod runner;

use std::convert::Infallible;
use std::time::Duration;

use itertools::Itertools;
use log::debug;
use log::info;
use log::warn;
pub use output::MiniZincStatus;

use super::Backend;
use crate::binding::BindingCache;
use crate::containers::HashMap;
use crate::containers::HashSet;
use crate::model::Constraint;
use crate::model::DecisionVariable;
use crate::model::Domain;
use crate::model::NumExpr;
use crate::LoweringError;
use crate::MiniZincOptions;
use crate::OptimisationDirection;
use crate::SolveOptions;
use crate::SolverStatus;

const NAME: &str = "minizinc";
const PREAMBLE: &str = "% Generated by trellis\ninclude \"globals.mzn\";\n\n";

#[derive(Debug)]
pub struct MiniZincBackend {
    options: MiniZincOptions,
    bindings: BindingCache<String>,
    /// Every name handed out, so that no two variables share one.
    names: HashSet<String>,
    declarations: Vec<String>,
    constraints: Vec<String>,
    objective: Option<(String, OptimisationDirection)>,
    /// The last solution, by name.
    solution: HashMap<String, i64>,
    /// The elapsed time MiniZinc reported for the last run.
    runtime: Option<Duration>,
}

impl MiniZincBackend {
    pub fn new(options: MiniZincOptions) -> Self {
        MiniZincBackend {
            options,
            bindings: BindingCache::default(),
            names: HashSet::default(),
            declarations: vec![],
            constraints: vec![],
            objective: None,
            solution: HashMap::default(),
            runtime: None,
        }
    }

    /// The MiniZinc name of `variable`, declaring it on first use.
    pub fn bind(&mut self, variable: &DecisionVariable) -> String {
        let names = &mut self.names;
        let declarations = &mut self.declarations;
        let bound = self.bindings.bind(variable, |variable| {
            let mut name = sanitize(variable.name());
            while names.contains(&name) {
                name = format!("{name}_{}", variable.id().index());
            }
            let _ = names.insert(name.clone());

            let declaration = match variable.domain() {
                _ if variable.is_boolean() => format!("var bool: {name};\n"),
                Domain::Interval {
                    lower_bound,
                    upper_bound,
                } => format!("var {lower_bound}..{upper_bound}: {name};\n"),
                Domain::Set(values) => format!("var {{{}}}: {name};\n", values.iter().join(",")),
            };
            debug!("declared {}", declaration.trim_end());
            declarations.push(declaration);

            Ok::<_, Infallible>(name)
        });

        match bound {
            Ok(name) => name,
            Err(never) => match never {},
        }
    }

    /// The number of variables which have been declared.
    pub fn num_bound(&self) -> usize {
        self.bindings.len()
    }

    /// The program as it would be run now.
    pub fn program(&self) -> String {
        let mut program = PREAMBLE.to_owned();
        for declaration in &self.declarations {
            program.push_str(declaration);
        }
        for constraint in &self.constraints {
            program.push_str(&format!("constraint {constraint};\n"));
        }
        program.push_str(&self.solve_item());
        program
    }

    fn solve_item(&self) -> String {
        match &self.objective {
            None => "solve satisfy;\n".to_owned(),
            Some((objective, OptimisationDirection::Minimise)) => {
                format!("solve minimize {objective};\n")
            }
            Some((objective, OptimisationDirection::Maximise)) => {
                format!("solve maximize {objective};\n")
            }
        }
    }
}

/// Replaces the characters MiniZinc does not accept in identifiers.
fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|&c| c != ']')
        .map(|c| match c {
            ',' | '.' | ' ' | '[' => '_',
            c => c,
        })
        .collect()
}

impl Backend for MiniZincBackend {
    type NativeStatus = MiniZincStatus;

    fn name(&self) -> &'static str {
        NAME
    }

    fn materializes_objective(&self) -> bool {
        false
    }

    fn post(&mut self, constraint: &Constraint) -> Result<(), LoweringError> {
        let rendered = self.render_constraint(constraint);
        debug!("constraint {rendered};");
        self.constraints.push(rendered);
        Ok(())
    }

    fn set_objective(
        &mut self,
        objective: &NumExpr,
        direction: OptimisationDirection,
    ) -> Result<(), LoweringError> {
        let rendered = self.render_expression(objective);
        self.objective = Some((rendered, direction));
        debug!("{}", self.solve_item().trim_end());
        Ok(())
    }

    fn solve(&mut self, options: &SolveOptions) -> Result<MiniZincStatus, LoweringError> {
        self.solution.clear();
        self.runtime = None;

        let program = self.program();
        let Some(process) = runner::run(&self.options, &program, options.time_limit)? else {
            return Ok(MiniZincStatus::Unknown);
        };

        let output = output::parse_output(
            &process.stdout,
            &process.stderr,
            process.success,
            self.objective.is_some(),
        )?;
        info!(
            "minizinc finished with {:?}, objective {:?}",
            output.status, output.objective
        );
        self.solution = output.values;
        self.runtime = output.runtime;
        Ok(output.status)
    }

    fn unify_status(&self, status: &MiniZincStatus) -> Result<SolverStatus, LoweringError> {
        match status {
            MiniZincStatus::Satisfied | MiniZincStatus::AllSolutions => Ok(SolverStatus::Feasible),
            MiniZincStatus::OptimalSolution => Ok(SolverStatus::Optimal),
            MiniZincStatus::Unsatisfiable => Ok(SolverStatus::Unsatisfiable),
            MiniZincStatus::Unknown => Ok(SolverStatus::Unknown),
            MiniZincStatus::Unbounded | MiniZincStatus::UnsatisfiableOrUnbounded => {
                warn!("minizinc reported {status:?}, treating it as unknown");
                Ok(SolverStatus::Unknown)
            }
            MiniZincStatus::Error(message) => Err(LoweringError::BackendExecution {
                backend: NAME,
                message: message.clone(),
            }),
        }
    }

    fn runtime(&self, _: &MiniZincStatus) -> Option<Duration> {
        self.runtime
    }

    fn value(&self, variable: &DecisionVariable) -> Option<i64> {
        let name = self.bindings.get(variable)?;
        self.solution.get(&name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    #[test]
    fn names_are_sanitized() {
        let x = IntVar::named(0, 3, "x[1, 2].y");
        let mut backend = MiniZincBackend::new(MiniZincOptions::default());

        assert_eq!(backend.bind(x.variable()), "x_1__2_y");
    }

    #[test]
    fn colliding_names_get_the_identifier_as_suffix() {
        let first = IntVar::named(0, 3, "x[1]");
        let second = IntVar::named(0, 3, "x_1");
        let mut backend = MiniZincBackend::new(MiniZincOptions::default());

        assert_eq!(backend.bind(first.variable()), "x_1");
        assert_eq!(
            backend.bind(second.variable()),
            format!("x_1_{}", second.variable().id().index())
        );
        assert_eq!(backend.bind(first.variable()), "x_1");
        assert_eq!(backend.num_bound(), 2);
    }

    #[test]
    fn program_layout() {
        let b = BoolVar::named("b");
        let x = IntVar::named(1, 9, "x");
        let s = IntVar::with_values([1, 3, 5], Some("s".to_owned()));
        let mut backend = MiniZincBackend::new(MiniZincOptions::default());

        backend.post(&implies(&b, eq(&x, &s))).expect("posts");
        backend.post(&Constraint::from(&b)).expect("posts");

        assert_eq!(
            backend.program(),
            "% Generated by trellis\ninclude \"globals.mzn\";\n\n\
             var bool: b;\n\
             var 1..9: x;\n\
             var {1,3,5}: s;\n\
             constraint b -> (x == s);\n\
             constraint b;\n\
             solve satisfy;\n"
        );
    }

    #[test]
    fn only_the_last_objective_is_kept() {
        let x = IntVar::named(1, 9, "x");
        let y = IntVar::named(1, 9, "y");
        let mut backend = MiniZincBackend::new(MiniZincOptions::default());

        backend
            .set_objective(&sum([&x, &y]), OptimisationDirection::Minimise)
            .expect("objective can be set");
        backend
            .set_objective(&NumExpr::from(&y), OptimisationDirection::Maximise)
            .expect("objective can be set");

        assert!(backend.program().ends_with("var 1..9: y;\nsolve maximize y;\n"));
    }

    #[test]
    fn status_mapping() {
        let backend = MiniZincBackend::new(MiniZincOptions::default());
        let unify = |status: MiniZincStatus| backend.unify_status(&status);

        assert_eq!(unify(MiniZincStatus::Satisfied).ok(), Some(SolverStatus::Feasible));
        assert_eq!(unify(MiniZincStatus::AllSolutions).ok(), Some(SolverStatus::Feasible));
        assert_eq!(
            unify(MiniZincStatus::OptimalSolution).ok(),
            Some(SolverStatus::Optimal)
        );
        assert_eq!(
            unify(MiniZincStatus::Unsatisfiable).ok(),
            Some(SolverStatus::Unsatisfiable)
        );
        assert_eq!(unify(MiniZincStatus::Unknown).ok(), Some(SolverStatus::Unknown));
        assert_eq!(unify(MiniZincStatus::Unbounded).ok(), Some(SolverStatus::Unknown));
        assert_eq!(
            unify(MiniZincStatus::UnsatisfiableOrUnbounded).ok(),
            Some(SolverStatus::Unknown)
        );
        assert!(matches!(
            unify(MiniZincStatus::Error("boom".to_owned())),
            Err(LoweringError::BackendExecution { message, .. }) if message == "boom"
        ));
    }
}
