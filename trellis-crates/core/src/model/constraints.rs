use itertools::Itertools;

use super::expressions::Atom;
use super::expressions::NumExpr;
use super::variables::BoolVar;
use super::variables::DecisionVariable;
use super::variables::Literal;
use super::Assignment;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
    /// True when an odd number of the arguments is true.
    Xor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    Equal,
    NotEqual,
    LessThanOrEqual,
    LessThan,
    GreaterThanOrEqual,
    GreaterThan,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
            Comparator::LessThanOrEqual => "<=",
            Comparator::LessThan => "<",
            Comparator::GreaterThanOrEqual => ">=",
            Comparator::GreaterThan => ">",
        }
    }

    pub fn compare(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            Comparator::Equal => lhs == rhs,
            Comparator::NotEqual => lhs != rhs,
            Comparator::LessThanOrEqual => lhs <= rhs,
            Comparator::LessThan => lhs < rhs,
            Comparator::GreaterThanOrEqual => lhs >= rhs,
            Comparator::GreaterThan => lhs > rhs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GlobalConstraint {
    AllDifferent(Vec<NumExpr>),
    AllEqual(Vec<NumExpr>),
    /// The successors form a single cycle through all nodes. Successors are 0-based.
    Circuit(Vec<NumExpr>),
    /// The nodes which are not their own successor form a single cycle.
    SubCircuit(Vec<NumExpr>),
    /// The variables take the values of one of the rows.
    Table {
        variables: Vec<NumExpr>,
        rows: Vec<Vec<i64>>,
    },
    /// An odd number of the literals is true.
    Xor(Vec<Literal>),
}

impl GlobalConstraint {
    pub fn name(&self) -> &'static str {
        match self {
            GlobalConstraint::AllDifferent(_) => "alldifferent",
            GlobalConstraint::AllEqual(_) => "allequal",
            GlobalConstraint::Circuit(_) => "circuit",
            GlobalConstraint::SubCircuit(_) => "subcircuit",
            GlobalConstraint::Table { .. } => "table",
            GlobalConstraint::Xor(_) => "xor",
        }
    }
}

/// A constraint in canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constraint {
    Literal(Literal),
    Constant(bool),
    Connective {
        connective: Connective,
        args: Vec<Constraint>,
    },
    /// After normalisation the antecedent is a literal.
    Implication {
        antecedent: Box<Constraint>,
        consequent: Box<Constraint>,
    },
    Comparison {
        comparator: Comparator,
        lhs: NumExpr,
        rhs: NumExpr,
    },
    Global(GlobalConstraint),
}

impl From<Literal> for Constraint {
    fn from(value: Literal) -> Self {
        Constraint::Literal(value)
    }
}

impl From<BoolVar> for Constraint {
    fn from(value: BoolVar) -> Self {
        Constraint::Literal(value.into())
    }
}

impl From<&BoolVar> for Constraint {
    fn from(value: &BoolVar) -> Self {
        Constraint::Literal(value.clone().into())
    }
}

impl From<bool> for Constraint {
    fn from(value: bool) -> Self {
        Constraint::Constant(value)
    }
}

impl From<GlobalConstraint> for Constraint {
    fn from(value: GlobalConstraint) -> Self {
        Constraint::Global(value)
    }
}

fn connective<C: Into<Constraint>>(
    connective: Connective,
    args: impl IntoIterator<Item = C>,
) -> Constraint {
    Constraint::Connective {
        connective,
        args: args.into_iter().map(Into::into).collect(),
    }
}

pub fn and<C: Into<Constraint>>(args: impl IntoIterator<Item = C>) -> Constraint {
    connective(Connective::And, args)
}

pub fn or<C: Into<Constraint>>(args: impl IntoIterator<Item = C>) -> Constraint {
    connective(Connective::Or, args)
}

pub fn xor<C: Into<Constraint>>(args: impl IntoIterator<Item = C>) -> Constraint {
    connective(Connective::Xor, args)
}

pub fn implies(antecedent: impl Into<Constraint>, consequent: impl Into<Constraint>) -> Constraint {
    Constraint::Implication {
        antecedent: Box::new(antecedent.into()),
        consequent: Box::new(consequent.into()),
    }
}

pub fn compare(
    comparator: Comparator,
    lhs: impl Into<NumExpr>,
    rhs: impl Into<NumExpr>,
) -> Constraint {
    Constraint::Comparison {
        comparator,
        lhs: lhs.into(),
        rhs: rhs.into(),
    }
}

pub fn eq(lhs: impl Into<NumExpr>, rhs: impl Into<NumExpr>) -> Constraint {
    compare(Comparator::Equal, lhs, rhs)
}

pub fn ne(lhs: impl Into<NumExpr>, rhs: impl Into<NumExpr>) -> Constraint {
    compare(Comparator::NotEqual, lhs, rhs)
}

pub fn le(lhs: impl Into<NumExpr>, rhs: impl Into<NumExpr>) -> Constraint {
    compare(Comparator::LessThanOrEqual, lhs, rhs)
}

pub fn lt(lhs: impl Into<NumExpr>, rhs: impl Into<NumExpr>) -> Constraint {
    compare(Comparator::LessThan, lhs, rhs)
}

pub fn ge(lhs: impl Into<NumExpr>, rhs: impl Into<NumExpr>) -> Constraint {
    compare(Comparator::GreaterThanOrEqual, lhs, rhs)
}

pub fn gt(lhs: impl Into<NumExpr>, rhs: impl Into<NumExpr>) -> Constraint {
    compare(Comparator::GreaterThan, lhs, rhs)
}

fn expressions<E: Into<NumExpr>>(args: impl IntoIterator<Item = E>) -> Vec<NumExpr> {
    args.into_iter().map(Into::into).collect()
}

pub fn alldifferent<E: Into<NumExpr>>(args: impl IntoIterator<Item = E>) -> Constraint {
    GlobalConstraint::AllDifferent(expressions(args)).into()
}

pub fn allequal<E: Into<NumExpr>>(args: impl IntoIterator<Item = E>) -> Constraint {
    GlobalConstraint::AllEqual(expressions(args)).into()
}

pub fn circuit<E: Into<NumExpr>>(successors: impl IntoIterator<Item = E>) -> Constraint {
    GlobalConstraint::Circuit(expressions(successors)).into()
}

pub fn subcircuit<E: Into<NumExpr>>(successors: impl IntoIterator<Item = E>) -> Constraint {
    GlobalConstraint::SubCircuit(expressions(successors)).into()
}

pub fn table<E: Into<NumExpr>>(
    variables: impl IntoIterator<Item = E>,
    rows: impl IntoIterator<Item = Vec<i64>>,
) -> Constraint {
    GlobalConstraint::Table {
        variables: expressions(variables),
        rows: rows.into_iter().collect(),
    }
    .into()
}

pub fn xor_global<L: Into<Literal>>(literals: impl IntoIterator<Item = L>) -> Constraint {
    GlobalConstraint::Xor(literals.into_iter().map(Into::into).collect()).into()
}

impl Constraint {
    /// If the constraint is a literal or a Boolean constant, it as an atom.
    pub fn as_atom(&self) -> Option<Atom> {
        match self {
            Constraint::Literal(literal) => Some(Atom::Literal(literal.clone())),
            Constraint::Constant(value) => Some(Atom::Bool(*value)),
            _ => None,
        }
    }

    /// Whether the constraint can be the consequent of a reified backend primitive as is.
    pub fn is_reifiable(&self) -> bool {
        let is_atom = |constraint: &Constraint| constraint.as_atom().is_some();
        match self {
            Constraint::Literal(_) | Constraint::Constant(_) => true,
            Constraint::Connective { args, .. } => args.iter().all(is_atom),
            Constraint::Implication {
                antecedent,
                consequent,
            } => is_atom(antecedent) && is_atom(consequent),
            Constraint::Comparison { lhs, rhs, .. } => lhs.is_atom() && rhs.is_atom(),
            Constraint::Global(_) => false,
        }
    }

    /// Appends the variables in this constraint to `variables`, in order of first occurrence.
    pub fn collect_variables(&self, variables: &mut Vec<DecisionVariable>) {
        match self {
            Constraint::Literal(literal) => {
                NumExpr::from(literal.clone()).collect_variables(variables)
            }
            Constraint::Constant(_) => {}
            Constraint::Connective { args, .. } => args
                .iter()
                .for_each(|arg| arg.collect_variables(variables)),
            Constraint::Implication {
                antecedent,
                consequent,
            } => {
                antecedent.collect_variables(variables);
                consequent.collect_variables(variables);
            }
            Constraint::Comparison { lhs, rhs, .. } => {
                lhs.collect_variables(variables);
                rhs.collect_variables(variables);
            }
            Constraint::Global(global) => match global {
                GlobalConstraint::AllDifferent(args)
                | GlobalConstraint::AllEqual(args)
                | GlobalConstraint::Circuit(args)
                | GlobalConstraint::SubCircuit(args)
                | GlobalConstraint::Table {
                    variables: args, ..
                } => args
                    .iter()
                    .for_each(|arg| arg.collect_variables(variables)),
                GlobalConstraint::Xor(literals) => literals
                    .iter()
                    .for_each(|literal| NumExpr::from(literal.clone()).collect_variables(variables)),
            },
        }
    }

    pub fn variables(&self) -> Vec<DecisionVariable> {
        let mut variables = Vec::new();
        self.collect_variables(&mut variables);
        variables
    }

    /// Whether the constraint holds under `assignment`. Returns `None` if a variable is
    /// unassigned or a subexpression is undefined.
    pub fn evaluate(&self, assignment: &impl Assignment) -> Option<bool> {
        match self {
            Constraint::Literal(literal) => {
                Some(NumExpr::from(literal.clone()).evaluate(assignment)? != 0)
            }
            Constraint::Constant(value) => Some(*value),
            Constraint::Connective { connective, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(assignment))
                    .collect::<Option<Vec<_>>>()?;
                Some(match connective {
                    Connective::And => values.iter().all(|&value| value),
                    Connective::Or => values.iter().any(|&value| value),
                    Connective::Xor => values.iter().filter(|&&value| value).count() % 2 == 1,
                })
            }
            Constraint::Implication {
                antecedent,
                consequent,
            } => Some(!antecedent.evaluate(assignment)? || consequent.evaluate(assignment)?),
            Constraint::Comparison {
                comparator,
                lhs,
                rhs,
            } => Some(comparator.compare(lhs.evaluate(assignment)?, rhs.evaluate(assignment)?)),
            Constraint::Global(global) => global.evaluate(assignment),
        }
    }
}

impl GlobalConstraint {
    fn evaluate(&self, assignment: &impl Assignment) -> Option<bool> {
        let values_of = |args: &[NumExpr]| {
            args.iter()
                .map(|arg| arg.evaluate(assignment))
                .collect::<Option<Vec<_>>>()
        };

        match self {
            GlobalConstraint::AllDifferent(args) => Some(values_of(args)?.iter().all_unique()),
            GlobalConstraint::AllEqual(args) => Some(values_of(args)?.iter().all_equal()),
            GlobalConstraint::Circuit(successors) => {
                let successors = values_of(successors)?;
                Some(is_single_cycle(&successors, |_| true))
            }
            GlobalConstraint::SubCircuit(successors) => {
                let successors = values_of(successors)?;
                Some(is_single_cycle(&successors, |node| {
                    successors[node] != node as i64
                }))
            }
            GlobalConstraint::Table { variables, rows } => {
                let values = values_of(variables)?;
                Some(rows.iter().any(|row| *row == values))
            }
            GlobalConstraint::Xor(literals) => {
                let count = literals
                    .iter()
                    .map(|literal| NumExpr::from(literal.clone()).evaluate(assignment))
                    .collect::<Option<Vec<_>>>()?
                    .into_iter()
                    .filter(|&value| value != 0)
                    .count();
                Some(count % 2 == 1)
            }
        }
    }
}

/// Whether following the successors from any node for which `in_cycle` holds visits exactly the
/// nodes for which `in_cycle` holds, and then returns to the start.
fn is_single_cycle(successors: &[i64], in_cycle: impl Fn(usize) -> bool) -> bool {
    let n = successors.len();
    if successors
        .iter()
        .any(|&successor| successor < 0 || successor >= n as i64)
    {
        return false;
    }

    let members = (0..n).filter(|&node| in_cycle(node)).collect::<Vec<_>>();
    let Some(&start) = members.first() else {
        return true;
    };

    let mut node = start;
    for step in 1..=members.len() {
        node = successors[node] as usize;
        if !in_cycle(node) || (node == start) != (step == members.len()) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::HashMap;
    use crate::model::expressions::element;
    use crate::model::expressions::sum;
    use crate::model::IntVar;
    use crate::model::VariableId;

    fn assign(values: &[(&DecisionVariable, i64)]) -> HashMap<VariableId, i64> {
        values
            .iter()
            .map(|(variable, value)| (variable.id(), *value))
            .collect()
    }

    #[test]
    fn implication_with_false_antecedent_holds() {
        let a = BoolVar::new();
        let x = IntVar::new(0, 5);
        let constraint = implies(&a, eq(&x, 3));

        let assignment = assign(&[(a.variable(), 0), (x.variable(), 1)]);
        assert_eq!(constraint.evaluate(&assignment), Some(true));

        let assignment = assign(&[(a.variable(), 1), (x.variable(), 1)]);
        assert_eq!(constraint.evaluate(&assignment), Some(false));
    }

    #[test]
    fn unassigned_variables_give_no_verdict() {
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);
        let assignment = assign(&[(x.variable(), 1)]);

        assert_eq!(le(&x, &y).evaluate(&assignment), None);
    }

    #[test]
    fn negated_literal_flips_the_value() {
        let a = BoolVar::new();
        let assignment = assign(&[(a.variable(), 1)]);

        assert_eq!(Constraint::from(!&a).evaluate(&assignment), Some(false));
        assert_eq!(Constraint::from(a).evaluate(&assignment), Some(true));
    }

    #[test]
    fn xor_is_odd_parity() {
        let literals = [BoolVar::new(), BoolVar::new(), BoolVar::new()];
        let constraint = xor_global(&literals);

        let assignment = assign(&[
            (literals[0].variable(), 1),
            (literals[1].variable(), 1),
            (literals[2].variable(), 1),
        ]);
        assert_eq!(constraint.evaluate(&assignment), Some(true));

        let assignment = assign(&[
            (literals[0].variable(), 1),
            (literals[1].variable(), 0),
            (literals[2].variable(), 1),
        ]);
        assert_eq!(constraint.evaluate(&assignment), Some(false));
    }

    #[test]
    fn circuit_rejects_two_cycles() {
        let successors = (0..4).map(|_| IntVar::new(0, 3)).collect::<Vec<_>>();
        let constraint = circuit(&successors);
        let with_values = |values: [i64; 4]| {
            successors
                .iter()
                .zip(values)
                .map(|(var, value)| (var.variable().id(), value))
                .collect::<HashMap<_, _>>()
        };

        assert_eq!(constraint.evaluate(&with_values([1, 2, 3, 0])), Some(true));
        assert_eq!(constraint.evaluate(&with_values([1, 0, 3, 2])), Some(false));
        assert_eq!(constraint.evaluate(&with_values([0, 2, 3, 1])), Some(false));
    }

    #[test]
    fn subcircuit_allows_self_loops() {
        let successors = (0..4).map(|_| IntVar::new(0, 3)).collect::<Vec<_>>();
        let constraint = subcircuit(&successors);
        let with_values = |values: [i64; 4]| {
            successors
                .iter()
                .zip(values)
                .map(|(var, value)| (var.variable().id(), value))
                .collect::<HashMap<_, _>>()
        };

        assert_eq!(constraint.evaluate(&with_values([0, 2, 1, 3])), Some(true));
        assert_eq!(constraint.evaluate(&with_values([0, 1, 2, 3])), Some(true));
        assert_eq!(constraint.evaluate(&with_values([1, 0, 3, 2])), Some(false));
    }

    #[test]
    fn table_matches_a_row() {
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);
        let constraint = table([&x, &y], [vec![1, 2], vec![3, 4]]);

        let assignment = assign(&[(x.variable(), 3), (y.variable(), 4)]);
        assert_eq!(constraint.evaluate(&assignment), Some(true));

        let assignment = assign(&[(x.variable(), 1), (y.variable(), 4)]);
        assert_eq!(constraint.evaluate(&assignment), Some(false));
    }

    #[test]
    fn variables_are_collected_once_in_order() {
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);
        let b = BoolVar::new();
        let constraint = implies(&b, eq(sum([&y, &x]), element([&x, &y], 1)));

        assert_eq!(
            constraint.variables(),
            vec![b.variable().clone(), y.variable().clone(), x.variable().clone()]
        );
    }
}
