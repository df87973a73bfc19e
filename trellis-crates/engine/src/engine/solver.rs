use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::time::Instant;

use log::debug;
use log::info;
use log::trace;

use super::Assignments;
use crate::basic_types::EngineError;
use crate::basic_types::PropagationStatus;
use crate::basic_types::SolveStatistics;
use crate::containers::KeyedVec;
use crate::containers::StorageKey;
use crate::propagators::AbsoluteValuePropagator;
use crate::propagators::AllDifferentPropagator;
use crate::propagators::ArithmeticOperator;
use crate::propagators::ArithmeticPropagator;
use crate::propagators::ConjunctionPropagator;
use crate::propagators::DisjunctionPropagator;
use crate::propagators::EqualsPropagator;
use crate::propagators::LessThanPropagator;
use crate::propagators::LinearEqualityPropagator;
use crate::propagators::NotEqualsPropagator;
use crate::propagators::Propagator;
use crate::propagators::PropagatorId;
use crate::propagators::ReifiedPropagator;
use crate::propagators::XorPropagator;
use crate::variables::DomainId;
use crate::variables::IntView;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptimisationDirection {
    Minimise,
    Maximise,
}

/// The main interaction point of the engine: variables are created, constraints are posted and
/// [`Solver::solve`] searches for a solution.
///
/// Constraints are permanent. Posting a constraint which is infeasible given the constraints
/// posted before it does not fail; instead every subsequent solve reports that no solution
/// exists.
///
/// ```rust
/// # use trellis_engine::Solver;
/// let mut solver = Solver::default();
/// let x = solver.create_interval_variable(1, 9, "x").unwrap();
/// let five = solver.create_integer_constant(5);
/// solver.post_equals(x, five);
///
/// let statistics = solver.solve();
/// assert_eq!(1, statistics.solutions);
/// assert_eq!(Some(5), solver.solution_value(x));
/// ```
#[derive(Debug, Default)]
pub struct Solver {
    assignments: Assignments,
    names: KeyedVec<DomainId, String>,
    propagators: KeyedVec<PropagatorId, Box<dyn Propagator>>,
    watch_lists: KeyedVec<DomainId, Vec<PropagatorId>>,
    queue: VecDeque<PropagatorId>,
    in_queue: KeyedVec<PropagatorId, bool>,
    objective: Option<(OptimisationDirection, IntView)>,
    /// The value of every domain in the last solution found.
    solution: Option<Vec<i32>>,
    /// Set once the posted constraints are infeasible without any search.
    infeasible: bool,
}

/// Creating variables and views.
impl Solver {
    /// Creates a variable which can take any of the given values.
    pub fn create_integer_variable(
        &mut self,
        values: impl IntoIterator<Item = i32>,
        name: impl Into<String>,
    ) -> Result<IntView, EngineError> {
        let name = name.into();
        let values = values.into_iter().collect::<BTreeSet<_>>();

        let (Some(&lower_bound), Some(&upper_bound)) = (values.first(), values.last()) else {
            return Err(EngineError::EmptyDomain(name));
        };

        let domain = if (upper_bound as i64 - lower_bound as i64 + 1) as usize == values.len() {
            self.assignments.grow_interval(lower_bound, upper_bound)
        } else {
            self.assignments.grow_sparse(values)
        };

        Ok(self.register_domain(domain, name))
    }

    pub fn create_interval_variable(
        &mut self,
        lower_bound: i32,
        upper_bound: i32,
        name: impl Into<String>,
    ) -> Result<IntView, EngineError> {
        let name = name.into();
        if lower_bound > upper_bound {
            return Err(EngineError::EmptyDomain(name));
        }

        let domain = self.assignments.grow_interval(lower_bound, upper_bound);
        Ok(self.register_domain(domain, name))
    }

    /// Creates a variable with the domain `{0, 1}`.
    pub fn create_boolean_variable(&mut self, name: impl Into<String>) -> IntView {
        let domain = self.assignments.grow_interval(0, 1);
        self.register_domain(domain, name.into())
    }

    pub fn create_integer_constant(&self, value: i64) -> IntView {
        IntView::constant(value)
    }

    /// The view `-view`.
    pub fn negate(&self, view: IntView) -> IntView {
        view.negation()
    }

    /// The view `view + value`.
    pub fn add_constant(&self, view: IntView, value: i64) -> IntView {
        view.shifted(value)
    }

    /// The name given to the domain when it was created.
    pub fn name(&self, domain: DomainId) -> &str {
        &self.names[domain]
    }

    pub fn num_variables(&self) -> usize {
        self.assignments.num_domains()
    }

    /// The lower bound of `view` given the posted constraints.
    pub fn lower_bound(&self, view: IntView) -> i64 {
        self.assignments.view_lower_bound(view)
    }

    /// The upper bound of `view` given the posted constraints.
    pub fn upper_bound(&self, view: IntView) -> i64 {
        self.assignments.view_upper_bound(view)
    }

    fn register_domain(&mut self, domain: DomainId, name: String) -> IntView {
        debug!(
            "created variable {name} with domain [{}, {}]",
            self.assignments.lower_bound(domain),
            self.assignments.upper_bound(domain)
        );

        let _ = self.names.push(name);
        let _ = self.watch_lists.push(Vec::new());
        IntView::of_domain(domain)
    }

    /// The view `1 - literal`, which is true exactly when `literal` is false.
    fn not(literal: IntView) -> IntView {
        literal.negation().shifted(1)
    }
}

/// Posting constraints. Views used as Booleans are true when they are non-zero; the variants
/// with an `_if` suffix only enforce the constraint when `reification` is true.
impl Solver {
    pub fn post_and(&mut self, literals: &[IntView]) {
        self.add_propagator(ConjunctionPropagator::new(literals));
    }

    pub fn post_and_if(&mut self, literals: &[IntView], reification: IntView) {
        self.add_propagator(ReifiedPropagator::new(
            ConjunctionPropagator::new(literals),
            reification,
        ));
    }

    pub fn post_or(&mut self, literals: &[IntView]) {
        self.add_propagator(DisjunctionPropagator::new(literals));
    }

    pub fn post_or_if(&mut self, literals: &[IntView], reification: IntView) {
        self.add_propagator(ReifiedPropagator::new(
            DisjunctionPropagator::new(literals),
            reification,
        ));
    }

    /// An odd number of `literals` is true.
    pub fn post_xor(&mut self, literals: &[IntView]) {
        self.add_propagator(XorPropagator::new(literals));
    }

    pub fn post_xor_if(&mut self, literals: &[IntView], reification: IntView) {
        self.add_propagator(ReifiedPropagator::new(
            XorPropagator::new(literals),
            reification,
        ));
    }

    /// `antecedent -> consequent`
    pub fn post_implies(&mut self, antecedent: IntView, consequent: IntView) {
        self.add_propagator(DisjunctionPropagator::new(vec![
            Self::not(antecedent),
            consequent,
        ]));
    }

    /// `reification -> (antecedent -> consequent)`
    pub fn post_implies_if(
        &mut self,
        antecedent: IntView,
        consequent: IntView,
        reification: IntView,
    ) {
        self.add_propagator(ReifiedPropagator::new(
            DisjunctionPropagator::new(vec![Self::not(antecedent), consequent]),
            reification,
        ));
    }

    pub fn post_equals(&mut self, a: IntView, b: IntView) {
        self.add_propagator(EqualsPropagator::new(a, b));
    }

    pub fn post_equals_if(&mut self, a: IntView, b: IntView, reification: IntView) {
        self.add_propagator(ReifiedPropagator::new(
            EqualsPropagator::new(a, b),
            reification,
        ));
    }

    pub fn post_not_equals(&mut self, a: IntView, b: IntView) {
        self.add_propagator(NotEqualsPropagator::new(a, b));
    }

    pub fn post_not_equals_if(&mut self, a: IntView, b: IntView, reification: IntView) {
        self.add_propagator(ReifiedPropagator::new(
            NotEqualsPropagator::new(a, b),
            reification,
        ));
    }

    /// `a < b`, or `a <= b` if `or_equal` is set.
    pub fn post_compare_less(&mut self, a: IntView, b: IntView, or_equal: bool) {
        self.add_propagator(LessThanPropagator::new(a, b, or_equal));
    }

    pub fn post_compare_less_if(
        &mut self,
        a: IntView,
        b: IntView,
        reification: IntView,
        or_equal: bool,
    ) {
        self.add_propagator(ReifiedPropagator::new(
            LessThanPropagator::new(a, b, or_equal),
            reification,
        ));
    }

    /// `absolute == |signed|`
    pub fn post_abs(&mut self, signed: IntView, absolute: IntView) {
        self.add_propagator(AbsoluteValuePropagator::new(signed, absolute));
    }

    /// `result == a <operator> b`
    pub fn post_arithmetic(
        &mut self,
        a: IntView,
        b: IntView,
        result: IntView,
        operator: ArithmeticOperator,
    ) {
        self.add_propagator(ArithmeticPropagator::new(a, b, result, operator));
    }

    /// `sum(coefficients[i] * terms[i]) == constant`
    pub fn post_linear_equality(
        &mut self,
        terms: &[IntView],
        coefficients: &[i64],
        constant: i64,
    ) -> Result<(), EngineError> {
        if terms.len() != coefficients.len() {
            return Err(EngineError::MismatchedCoefficients {
                expected: terms.len(),
                actual: coefficients.len(),
            });
        }

        self.add_propagator(LinearEqualityPropagator::new(
            coefficients.iter().copied().zip(terms.iter().copied()),
            constant,
        ));
        Ok(())
    }

    pub fn post_alldifferent(&mut self, views: &[IntView]) {
        self.add_propagator(AllDifferentPropagator::new(views));
    }

    fn add_propagator(&mut self, propagator: impl Propagator + 'static) {
        if self.infeasible {
            debug!("ignoring {}, the model is already infeasible", propagator.name());
            return;
        }

        let id = self.propagators.push(Box::new(propagator));
        let _ = self.in_queue.push(false);

        for view in self.propagators[id].variables() {
            if let Some(domain) = view.domain() {
                let watchers = &mut self.watch_lists[domain];
                if !watchers.contains(&id) {
                    watchers.push(id);
                }
            }
        }

        debug!("posted {}", self.propagators[id].name());

        self.enqueue(id);
        if self.propagate().is_err() {
            info!(
                "{} is infeasible at the root, the model has no solutions",
                self.propagators[id].name()
            );
            self.infeasible = true;
        }
    }
}

/// Solving.
impl Solver {
    pub fn minimise(&mut self, objective: IntView) {
        self.objective = Some((OptimisationDirection::Minimise, objective));
    }

    pub fn maximise(&mut self, objective: IntView) {
        self.objective = Some((OptimisationDirection::Maximise, objective));
    }

    pub fn objective(&self) -> Option<(OptimisationDirection, IntView)> {
        self.objective
    }

    /// Searches for a solution. Without an objective the search stops at the first solution;
    /// with an objective every solution found is better than the previous one, and the search
    /// continues until no better solution exists.
    ///
    /// After the search the domains are as they were before the call, and the values of the
    /// last solution can be queried with [`Solver::solution_value`].
    pub fn solve(&mut self) -> SolveStatistics {
        let start = Instant::now();
        let mut statistics = SolveStatistics::default();
        self.solution = None;

        if self.infeasible {
            statistics.complete = true;
        } else {
            self.search(&mut statistics);
        }

        statistics.runtime = start.elapsed();
        info!("search finished: {statistics}");
        statistics
    }

    /// The value of `view` in the last solution, if one was found.
    pub fn solution_value(&self, view: IntView) -> Option<i64> {
        match view.domain() {
            None => view.as_constant(),
            Some(domain) => self
                .solution
                .as_ref()?
                .get(domain.index())
                .map(|&value| view.map(value)),
        }
    }

    fn search(&mut self, statistics: &mut SolveStatistics) {
        // Refuted decisions are applied at the level of their parent, so the root itself is
        // protected by an extra checkpoint.
        let root = self.assignments.get_checkpoint();
        self.assignments.new_checkpoint();

        let mut decisions: Vec<(DomainId, i32)> = Vec::new();
        let mut best_objective = None;

        let all_propagators = self.propagators.keys().collect::<Vec<_>>();
        all_propagators.into_iter().for_each(|id| self.enqueue(id));
        let mut status = self.propagate();

        loop {
            if status.is_ok() {
                if let Some(domain) = self.select_variable() {
                    let value = self.assignments.lower_bound(domain);
                    trace!("deciding {} = {value}", self.names[domain]);

                    statistics.nodes += 1;
                    self.assignments.new_checkpoint();
                    decisions.push((domain, value));
                    status = self.decide(domain, value);
                    continue;
                }

                self.record_solution();
                statistics.solutions += 1;

                let Some((direction, objective)) = self.objective else {
                    break;
                };

                let value = self.assignments.view_lower_bound(objective);
                debug!("found solution with objective value {value} ({direction:?})");
                best_objective = Some(value);
            } else {
                statistics.failures += 1;
            }

            let Some((domain, value)) = decisions.pop() else {
                statistics.complete = true;
                break;
            };

            let parent = self.assignments.get_checkpoint() - 1;
            self.assignments.synchronise(parent);
            status = self.refute(domain, value, best_objective);
        }

        self.assignments.synchronise(root);
    }

    fn decide(&mut self, domain: DomainId, value: i32) -> PropagationStatus {
        self.assignments
            .view_fix(IntView::of_domain(domain), value as i64)?;
        self.propagate()
    }

    fn refute(
        &mut self,
        domain: DomainId,
        value: i32,
        best_objective: Option<i64>,
    ) -> PropagationStatus {
        self.assignments
            .view_remove(IntView::of_domain(domain), value as i64)?;

        if let (Some((direction, objective)), Some(best)) = (self.objective, best_objective) {
            match direction {
                OptimisationDirection::Minimise => self
                    .assignments
                    .view_tighten_upper_bound(objective, best.saturating_sub(1))?,
                OptimisationDirection::Maximise => self
                    .assignments
                    .view_tighten_lower_bound(objective, best.saturating_add(1))?,
            }
        }

        self.propagate()
    }

    /// Selects the unfixed domain with the fewest values between its bounds.
    fn select_variable(&self) -> Option<DomainId> {
        self.assignments
            .domains()
            .filter(|&domain| !self.assignments.is_fixed(domain))
            .min_by_key(|&domain| {
                self.assignments.upper_bound(domain) as i64
                    - self.assignments.lower_bound(domain) as i64
            })
    }

    fn record_solution(&mut self) {
        let values = self
            .assignments
            .domains()
            .map(|domain| self.assignments.lower_bound(domain))
            .collect();
        self.solution = Some(values);
    }

    fn enqueue(&mut self, id: PropagatorId) {
        if !self.in_queue[id] {
            self.in_queue[id] = true;
            self.queue.push_back(id);
        }
    }

    /// Runs the propagators until none of them changes a domain.
    fn propagate(&mut self) -> PropagationStatus {
        loop {
            for domain in self.assignments.take_modified() {
                for &id in &self.watch_lists[domain] {
                    if !self.in_queue[id] {
                        self.in_queue[id] = true;
                        self.queue.push_back(id);
                    }
                }
            }

            let Some(id) = self.queue.pop_front() else {
                return Ok(());
            };
            self.in_queue[id] = false;

            let propagator = &self.propagators[id];
            if let Err(inconsistency) = propagator.propagate(&mut self.assignments) {
                trace!("{} detected an inconsistency", propagator.name());
                for id in self.queue.drain(..) {
                    self.in_queue[id] = false;
                }
                let _ = self.assignments.take_modified();
                return Err(inconsistency);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solver_with_booleans(n: usize) -> (Solver, Vec<IntView>) {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut solver = Solver::default();
        let literals = (0..n)
            .map(|i| solver.create_boolean_variable(format!("b{i}")))
            .collect();
        (solver, literals)
    }

    #[test]
    fn empty_domains_are_rejected() {
        let mut solver = Solver::default();

        assert_eq!(
            Err(EngineError::EmptyDomain("x".to_owned())),
            solver.create_interval_variable(3, 2, "x")
        );
        assert_eq!(
            Err(EngineError::EmptyDomain("y".to_owned())),
            solver.create_integer_variable([], "y")
        );
    }

    #[test]
    fn sparse_domains_only_take_their_values() {
        let mut solver = Solver::default();
        let x = solver.create_integer_variable([1, 5, 9], "x").unwrap();
        solver.post_compare_less(solver.create_integer_constant(1), x, false);
        solver.post_compare_less(x, solver.create_integer_constant(9), false);

        let statistics = solver.solve();

        assert_eq!(1, statistics.solutions);
        assert_eq!(Some(5), solver.solution_value(x));
    }

    #[test]
    fn negated_views_take_the_opposite_value() {
        let (mut solver, literals) = solver_with_booleans(1);
        let not_b = solver.add_constant(solver.negate(literals[0]), 1);
        solver.post_or(&[not_b]);

        let _ = solver.solve();

        assert_eq!(Some(0), solver.solution_value(literals[0]));
        assert_eq!(Some(1), solver.solution_value(not_b));
    }

    #[test]
    fn infeasible_constraints_are_reported_by_solve() {
        let mut solver = Solver::default();
        let x = solver.create_interval_variable(0, 3, "x").unwrap();
        solver.post_equals(x, solver.create_integer_constant(7));

        let statistics = solver.solve();

        assert_eq!(0, statistics.solutions);
        assert!(statistics.complete);
        assert_eq!(None, solver.solution_value(x));
    }

    #[test]
    fn search_finds_a_solution_which_needs_backtracking() {
        let mut solver = Solver::default();
        let views = (0..4)
            .map(|i| solver.create_interval_variable(0, 3, format!("q{i}")).unwrap())
            .collect::<Vec<_>>();
        solver.post_alldifferent(&views);
        solver.post_not_equals(views[0], solver.create_integer_constant(0));
        let predecessor = solver.add_constant(views[0], -1);
        solver.post_equals(views[3], predecessor);

        let statistics = solver.solve();

        assert_eq!(1, statistics.solutions);
        let values = views
            .iter()
            .map(|&view| solver.solution_value(view).unwrap())
            .collect::<Vec<_>>();
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(vec![0, 1, 2, 3], sorted);
        assert_eq!(values[0] - 1, values[3]);
    }

    #[test]
    fn minimisation_proves_optimality() {
        let mut solver = Solver::default();
        let a = solver.create_interval_variable(0, 5, "a").unwrap();
        let b = solver.create_interval_variable(0, 5, "b").unwrap();
        let total = solver.create_interval_variable(0, 10, "total").unwrap();
        solver.post_arithmetic(a, b, total, ArithmeticOperator::Sum);
        solver.post_compare_less(solver.create_integer_constant(3), a, true);
        solver.minimise(total);

        let statistics = solver.solve();

        assert!(statistics.complete);
        assert!(statistics.solutions >= 1);
        assert_eq!(Some(3), solver.solution_value(total));
    }

    #[test]
    fn maximisation_over_a_linear_equality() {
        let mut solver = Solver::default();
        let x = solver.create_interval_variable(0, 10, "x").unwrap();
        let y = solver.create_interval_variable(0, 10, "y").unwrap();
        solver
            .post_linear_equality(&[x, y], &[2, 3], 12)
            .expect("matching coefficients");
        solver.maximise(y);

        let statistics = solver.solve();

        assert!(statistics.complete);
        assert_eq!(Some(4), solver.solution_value(y));
        assert_eq!(Some(0), solver.solution_value(x));
    }

    #[test]
    fn mismatched_coefficients_are_rejected() {
        let mut solver = Solver::default();
        let x = solver.create_interval_variable(0, 10, "x").unwrap();

        assert_eq!(
            Err(EngineError::MismatchedCoefficients {
                expected: 1,
                actual: 2
            }),
            solver.post_linear_equality(&[x], &[1, 2], 0)
        );
    }

    #[test]
    fn reified_equality_is_only_enforced_when_true() {
        let (mut solver, literals) = solver_with_booleans(1);
        let y = solver.create_interval_variable(0, 9, "y").unwrap();
        solver.post_equals_if(y, solver.create_integer_constant(3), literals[0]);
        solver.post_or(&[literals[0]]);

        let _ = solver.solve();

        assert_eq!(Some(3), solver.solution_value(y));
    }

    #[test]
    fn constraints_can_be_added_between_solves() {
        let (mut solver, literals) = solver_with_booleans(2);
        solver.post_or(&literals);

        let mut solutions = Vec::new();
        loop {
            let statistics = solver.solve();
            if statistics.solutions == 0 {
                break;
            }

            let values = literals
                .iter()
                .map(|&literal| solver.solution_value(literal).unwrap())
                .collect::<Vec<_>>();

            // Exclude the solution that was just found.
            let blocking = literals
                .iter()
                .zip(&values)
                .map(|(&literal, &value)| {
                    if value == 1 {
                        solver.add_constant(solver.negate(literal), 1)
                    } else {
                        literal
                    }
                })
                .collect::<Vec<_>>();
            solver.post_or(&blocking);
            solutions.push(values);
        }

        solutions.sort();
        assert_eq!(vec![vec![0, 1], vec![1, 0], vec![1, 1]], solutions);
    }

    #[test]
    fn xor_and_implications_are_respected() {
        let (mut solver, literals) = solver_with_booleans(3);
        solver.post_xor(&literals);
        solver.post_implies(literals[0], literals[1]);
        solver.post_and(&[literals[0]]);

        let _ = solver.solve();

        assert_eq!(Some(1), solver.solution_value(literals[0]));
        assert_eq!(Some(1), solver.solution_value(literals[1]));
        assert_eq!(Some(1), solver.solution_value(literals[2]));
    }
}
