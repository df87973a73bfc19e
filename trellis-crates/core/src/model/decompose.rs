use std::iter::once;

use super::constraints::*;
use super::expressions::*;
use super::variables::BoolVar;
use super::variables::IntVar;

impl Constraint {
    /// Rewrites the constraint into simpler canonical constraints, introducing auxiliary
    /// variables where needed. The conjunction of the result has a solution exactly when the
    /// constraint does (projected onto its variables).
    ///
    /// Returns `None` if the constraint is already in a shape backends post directly, or if no
    /// decomposition is known.
    pub fn decompose(&self) -> Option<Vec<Constraint>> {
        match self {
            Constraint::Literal(_) | Constraint::Constant(_) => None,
            Constraint::Connective {
                connective: Connective::And,
                args,
            } => {
                if args.iter().all(|arg| arg.as_atom().is_some()) {
                    None
                } else {
                    Some(args.clone())
                }
            }
            Constraint::Connective {
                connective: Connective::Or,
                args,
            } => decompose_disjunction(args),
            Constraint::Connective {
                connective: Connective::Xor,
                args,
            } => {
                let terms = args
                    .iter()
                    .map(|arg| arg.as_atom().map(NumExpr::Atom))
                    .collect::<Option<Vec<_>>>()?;
                Some(xor_as_sum(terms))
            }
            Constraint::Implication {
                antecedent,
                consequent,
            } => decompose_implication(antecedent, consequent),
            Constraint::Comparison {
                comparator,
                lhs,
                rhs,
            } => decompose_comparison(*comparator, lhs, rhs),
            Constraint::Global(global) => global.decompose(),
        }
    }
}

impl GlobalConstraint {
    fn decompose(&self) -> Option<Vec<Constraint>> {
        match self {
            GlobalConstraint::AllDifferent(args) => {
                if args.iter().all(NumExpr::is_atom) {
                    return None;
                }
                let (args, mut constraints) = atomize_all(args);
                constraints.push(alldifferent(args));
                Some(constraints)
            }
            GlobalConstraint::AllEqual(args) => Some(
                args.windows(2)
                    .map(|pair| eq(pair[0].clone(), pair[1].clone()))
                    .collect(),
            ),
            GlobalConstraint::Circuit(successors) => Some(decompose_circuit(successors)),
            GlobalConstraint::SubCircuit(_) => None,
            GlobalConstraint::Table { variables, rows } => Some(decompose_table(variables, rows)),
            GlobalConstraint::Xor(literals) => Some(xor_as_sum(
                literals.iter().cloned().map(NumExpr::from).collect(),
            )),
        }
    }
}

/// A fresh integer variable over the bounds of `expr`, and the constraint defining it.
pub(crate) fn auxiliary_for(expr: &NumExpr) -> (IntVar, Constraint) {
    let clamp = |value: i64| value.clamp(i32::MIN.into(), i32::MAX.into()) as i32;

    let (lower_bound, upper_bound) = expr.bounds();
    let auxiliary = IntVar::new(clamp(lower_bound), clamp(upper_bound));
    let definition = eq(expr.clone(), &auxiliary);
    (auxiliary, definition)
}

fn atomize(expr: &NumExpr) -> (NumExpr, Vec<Constraint>) {
    if expr.is_atom() {
        (expr.clone(), vec![])
    } else {
        let (auxiliary, definition) = auxiliary_for(expr);
        (auxiliary.into(), vec![definition])
    }
}

fn atomize_all(exprs: &[NumExpr]) -> (Vec<NumExpr>, Vec<Constraint>) {
    let mut constraints = vec![];
    let atoms = exprs
        .iter()
        .map(|expr| {
            let (atom, definitions) = atomize(expr);
            constraints.extend(definitions);
            atom
        })
        .collect();
    (atoms, constraints)
}

/// The same expression with every operand replaced by an atom.
fn atomize_operands(expr: &NumExpr) -> (NumExpr, Vec<Constraint>) {
    let pair = |a: &NumExpr, b: &NumExpr| {
        let (a, mut constraints) = atomize(a);
        let (b, definitions) = atomize(b);
        constraints.extend(definitions);
        (Box::new(a), Box::new(b), constraints)
    };

    match expr {
        NumExpr::Atom(_) => (expr.clone(), vec![]),
        NumExpr::Sum(terms) => {
            let (terms, constraints) = atomize_all(terms);
            (NumExpr::Sum(terms), constraints)
        }
        NumExpr::WeightedSum { weights, terms } => {
            let (terms, constraints) = atomize_all(terms);
            (
                NumExpr::WeightedSum {
                    weights: weights.clone(),
                    terms,
                },
                constraints,
            )
        }
        NumExpr::Sub(a, b) => {
            let (a, b, constraints) = pair(a, b);
            (NumExpr::Sub(a, b), constraints)
        }
        NumExpr::Mul(a, b) => {
            let (a, b, constraints) = pair(a, b);
            (NumExpr::Mul(a, b), constraints)
        }
        NumExpr::Div(a, b) => {
            let (a, b, constraints) = pair(a, b);
            (NumExpr::Div(a, b), constraints)
        }
        NumExpr::Mod(a, b) => {
            let (a, b, constraints) = pair(a, b);
            (NumExpr::Mod(a, b), constraints)
        }
        NumExpr::Pow(a, b) => {
            let (a, b, constraints) = pair(a, b);
            (NumExpr::Pow(a, b), constraints)
        }
        NumExpr::Abs(a) => {
            let (a, constraints) = atomize(a);
            (NumExpr::Abs(Box::new(a)), constraints)
        }
        NumExpr::Neg(a) => {
            let (a, constraints) = atomize(a);
            (NumExpr::Neg(Box::new(a)), constraints)
        }
        NumExpr::Element { array, index } => {
            let (array, mut constraints) = atomize_all(array);
            let (index, definitions) = atomize(index);
            constraints.extend(definitions);
            (
                NumExpr::Element {
                    array,
                    index: Box::new(index),
                },
                constraints,
            )
        }
    }
}

fn decompose_comparison(
    comparator: Comparator,
    lhs: &NumExpr,
    rhs: &NumExpr,
) -> Option<Vec<Constraint>> {
    if lhs.is_atom() && rhs.is_atom() {
        return None;
    }

    if comparator != Comparator::Equal {
        let (lhs, mut constraints) = atomize(lhs);
        let (rhs, definitions) = atomize(rhs);
        constraints.extend(definitions);
        constraints.push(compare(comparator, lhs, rhs));
        return Some(constraints);
    }

    let (expr, other) = if lhs.is_atom() { (rhs, lhs) } else { (lhs, rhs) };
    if !other.is_atom() {
        let (auxiliary, definition) = auxiliary_for(other);
        return Some(vec![definition, eq(expr.clone(), auxiliary)]);
    }

    if let NumExpr::Element { array, index } = expr {
        return Some(decompose_element(array, index, other));
    }

    if expr.operands().into_iter().all(NumExpr::is_atom) {
        return None;
    }
    let (expr, mut constraints) = atomize_operands(expr);
    constraints.push(eq(expr, other.clone()));
    Some(constraints)
}

/// `array[index] == result`: one selector per position, which implies both the index and the
/// value at that position.
fn decompose_element(array: &[NumExpr], index: &NumExpr, result: &NumExpr) -> Vec<Constraint> {
    if array.is_empty() {
        return vec![Constraint::Constant(false)];
    }

    let (index, mut constraints) = atomize(index);
    let (items, definitions) = atomize_all(array);
    constraints.extend(definitions);

    let mut selectors = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let selector = BoolVar::new();
        constraints.push(implies(&selector, eq(index.clone(), position as i64)));
        constraints.push(implies(&selector, eq(item, result.clone())));
        selectors.push(selector);
    }
    constraints.push(or(selectors));
    constraints
}

fn decompose_table(variables: &[NumExpr], rows: &[Vec<i64>]) -> Vec<Constraint> {
    let (variables, mut constraints) = atomize_all(variables);

    let mut selectors = vec![];
    for row in rows.iter().filter(|row| row.len() == variables.len()) {
        let selector = BoolVar::new();
        constraints.extend(
            variables
                .iter()
                .zip(row)
                .map(|(variable, &value)| implies(&selector, eq(variable.clone(), value))),
        );
        selectors.push(selector);
    }

    if selectors.is_empty() {
        constraints.push(Constraint::Constant(false));
    } else {
        constraints.push(or(selectors));
    }
    constraints
}

/// The successors are all different and following them from node 0 returns to node 0 only after
/// the last step. `order[i]` is the node visited after `i + 1` steps.
fn decompose_circuit(successors: &[NumExpr]) -> Vec<Constraint> {
    let n = successors.len();
    if n == 0 {
        return vec![];
    }

    let mut constraints = vec![alldifferent(successors.to_vec())];
    for successor in successors {
        constraints.push(ge(successor.clone(), 0));
        constraints.push(lt(successor.clone(), n as i64));
    }

    let order = (0..n)
        .map(|_| IntVar::new(0, n as i32 - 1))
        .collect::<Vec<_>>();
    constraints.push(alldifferent(&order));
    constraints.push(eq(&order[0], successors[0].clone()));
    for steps in order.windows(2) {
        constraints.push(eq(&steps[1], element(successors.to_vec(), &steps[0])));
    }
    constraints.push(eq(&order[n - 1], 0));
    constraints
}

/// An odd number of the terms is one: `sum(terms) - 2 * k == 1` for some `k`.
fn xor_as_sum(terms: Vec<NumExpr>) -> Vec<Constraint> {
    if terms.is_empty() {
        return vec![Constraint::Constant(false)];
    }

    let n = terms.len();
    let half = IntVar::new(0, (n / 2) as i32);
    let weights = vec![1; n].into_iter().chain(once(-2));
    vec![eq(wsum(weights, terms.into_iter().chain(once(half.into()))), 1)]
}

fn decompose_disjunction(args: &[Constraint]) -> Option<Vec<Constraint>> {
    if args.iter().all(|arg| arg.as_atom().is_some()) {
        return None;
    }

    let mut constraints = vec![];
    let mut disjuncts = vec![];
    for arg in args {
        if arg.as_atom().is_some() {
            disjuncts.push(arg.clone());
            continue;
        }
        let selector = BoolVar::new();
        constraints.extend(reify(&Constraint::from(&selector), arg)?);
        disjuncts.push(selector.into());
    }
    constraints.push(or(disjuncts));
    Some(constraints)
}

/// `antecedent -> consequent` as implications whose consequents are reifiable.
fn reify(antecedent: &Constraint, consequent: &Constraint) -> Option<Vec<Constraint>> {
    if consequent.is_reifiable() {
        Some(vec![implies(antecedent.clone(), consequent.clone())])
    } else {
        decompose_implication(antecedent, consequent)
    }
}

fn decompose_implication(
    antecedent: &Constraint,
    consequent: &Constraint,
) -> Option<Vec<Constraint>> {
    if antecedent.as_atom().is_none() || consequent.is_reifiable() {
        return None;
    }

    match consequent {
        Constraint::Connective {
            connective: Connective::And,
            args,
        } => {
            let mut constraints = vec![];
            for arg in args {
                constraints.extend(reify(antecedent, arg)?);
            }
            Some(constraints)
        }
        Constraint::Connective {
            connective: Connective::Or,
            args,
        } => {
            let mut constraints = vec![];
            let mut disjuncts = vec![];
            for arg in args {
                if arg.as_atom().is_some() {
                    disjuncts.push(arg.clone());
                    continue;
                }
                let selector = BoolVar::new();
                constraints.extend(reify(&Constraint::from(&selector), arg)?);
                disjuncts.push(selector.into());
            }
            constraints.push(implies(antecedent.clone(), or(disjuncts)));
            Some(constraints)
        }
        Constraint::Implication {
            antecedent: inner_antecedent,
            consequent: inner_consequent,
        } => {
            // a -> (b -> c) is (a /\ b) -> c
            let both = BoolVar::new();
            let mut constraints = vec![or([
                negate(antecedent)?,
                negate(inner_antecedent)?,
                Constraint::from(&both),
            ])];
            constraints.extend(reify(&Constraint::from(&both), inner_consequent)?);
            Some(constraints)
        }
        Constraint::Comparison {
            comparator,
            lhs,
            rhs,
        } => {
            // The definitions of the auxiliaries hold unconditionally.
            if !is_definable_anywhere(lhs) || !is_definable_anywhere(rhs) {
                return None;
            }
            let (lhs, mut constraints) = atomize(lhs);
            let (rhs, definitions) = atomize(rhs);
            constraints.extend(definitions);
            constraints.push(implies(antecedent.clone(), compare(*comparator, lhs, rhs)));
            Some(constraints)
        }
        _ => None,
    }
}

/// Whether an auxiliary equal to `expr` can be introduced without constraining the model.
fn is_definable_anywhere(expr: &NumExpr) -> bool {
    let fits = |value: i64| i32::try_from(value).is_ok();
    let (lower_bound, upper_bound) = expr.bounds();
    expr.is_atom() || (expr.is_total() && fits(lower_bound) && fits(upper_bound))
}

fn negate(constraint: &Constraint) -> Option<Constraint> {
    match constraint {
        Constraint::Literal(literal) => Some(Constraint::Literal(!literal.clone())),
        Constraint::Constant(value) => Some(Constraint::Constant(!value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Literal;

    fn is_reified_directly(constraint: &Constraint) -> bool {
        matches!(
            constraint,
            Constraint::Implication { antecedent, consequent }
                if antecedent.as_atom().is_some() && consequent.is_reifiable()
        )
    }

    #[test]
    fn allequal_becomes_a_chain_of_equalities() {
        let vars = (0..3).map(|_| IntVar::new(0, 3)).collect::<Vec<_>>();
        let pieces = allequal(&vars).decompose().expect("allequal decomposes");

        assert_eq!(
            pieces,
            vec![eq(&vars[0], &vars[1]), eq(&vars[1], &vars[2])]
        );
    }

    #[test]
    fn xor_becomes_a_single_linear_equality() {
        let literals = (0..3).map(|_| BoolVar::new()).collect::<Vec<_>>();
        let pieces = xor_global(&literals).decompose().expect("xor decomposes");

        assert_eq!(pieces.len(), 1);
        let Constraint::Comparison {
            comparator: Comparator::Equal,
            lhs: NumExpr::WeightedSum { weights, terms },
            rhs,
        } = &pieces[0]
        else {
            panic!("expected a weighted sum, got {:?}", pieces[0]);
        };
        assert_eq!(weights, &vec![1, 1, 1, -2]);
        assert_eq!(terms.len(), 4);
        assert_eq!(rhs, &NumExpr::from(1));
    }

    #[test]
    fn xor_connective_over_literals_decomposes() {
        let a = BoolVar::new();
        let b = BoolVar::new();
        assert!(xor([&a, &b]).decompose().is_some());
    }

    #[test]
    fn table_uses_one_selector_per_row() {
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);
        let pieces = table([&x, &y], [vec![1, 2], vec![3, 4], vec![5, 0]])
            .decompose()
            .expect("table decomposes");

        // Two implications per row, then the disjunction of the selectors.
        assert_eq!(pieces.len(), 7);
        assert!(matches!(
            pieces.last(),
            Some(Constraint::Connective { connective: Connective::Or, args }) if args.len() == 3
        ));
        assert!(pieces[..6].iter().all(is_reified_directly));
    }

    #[test]
    fn empty_table_is_false() {
        let x = IntVar::new(0, 5);
        let pieces = table([&x], Vec::<Vec<i64>>::new())
            .decompose()
            .expect("table decomposes");

        assert_eq!(pieces, vec![Constraint::Constant(false)]);
    }

    #[test]
    fn element_equality_uses_reifiable_pieces() {
        let array = (0..3).map(|_| IntVar::new(0, 5)).collect::<Vec<_>>();
        let index = IntVar::new(0, 2);
        let result = IntVar::new(0, 5);
        let pieces = eq(element(&array, &index), &result)
            .decompose()
            .expect("element decomposes");

        assert_eq!(pieces.len(), 7);
        assert!(pieces[..6].iter().all(is_reified_directly));
        assert!(pieces[6].is_reifiable());
    }

    #[test]
    fn ordering_with_structured_side_introduces_an_auxiliary() {
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);
        let pieces = le(sum([&x, &y]), 4).decompose().expect("comparison decomposes");

        assert_eq!(pieces.len(), 2);
        let Constraint::Comparison {
            comparator: Comparator::Equal,
            rhs: NumExpr::Atom(Atom::Int(auxiliary)),
            ..
        } = &pieces[0]
        else {
            panic!("expected a definition, got {:?}", pieces[0]);
        };
        assert_eq!((auxiliary.lower_bound(), auxiliary.upper_bound()), (0, 10));
        assert_eq!(pieces[1], le(auxiliary, 4));
    }

    #[test]
    fn nested_operands_are_flattened() {
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);
        let z = IntVar::new(0, 50);
        let pieces = eq(mul(sum([&x, &y]), &x), &z)
            .decompose()
            .expect("comparison decomposes");

        assert_eq!(pieces.len(), 2);
        assert!(pieces[1].decompose().is_none());
    }

    #[test]
    fn atom_comparisons_do_not_decompose() {
        let x = IntVar::new(0, 5);
        assert!(le(&x, 3).decompose().is_none());
        assert!(or([BoolVar::new(), BoolVar::new()]).decompose().is_none());
    }

    #[test]
    fn disjunction_of_comparisons_gets_selectors() {
        let x = IntVar::new(0, 5);
        let a = BoolVar::new();
        let pieces = or([eq(&x, 1), Constraint::from(&a)])
            .decompose()
            .expect("disjunction decomposes");

        assert_eq!(pieces.len(), 2);
        assert!(is_reified_directly(&pieces[0]));
        let Constraint::Connective { args, .. } = &pieces[1] else {
            panic!("expected a disjunction");
        };
        assert_eq!(args[1], Constraint::from(&a));
    }

    #[test]
    fn implication_of_nested_implication() {
        let a = BoolVar::new();
        let b = BoolVar::new();
        let x = IntVar::new(0, 5);
        let pieces = implies(&a, implies(Literal::from(&b), le(sum([&x, &x]), 3)))
            .decompose()
            .expect("implication decomposes");

        assert!(pieces.iter().all(|piece| {
            is_reified_directly(piece) || piece.decompose().is_none()
        }));
    }

    #[test]
    fn subcircuit_has_no_decomposition() {
        let successors = (0..3).map(|_| IntVar::new(0, 2)).collect::<Vec<_>>();
        assert!(subcircuit(&successors).decompose().is_none());
    }

    #[test]
    fn conditional_partial_expressions_are_not_decomposed() {
        let b = BoolVar::new();
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);

        assert!(implies(&b, le(div(&x, &y), 1)).decompose().is_none());
        assert!(implies(&b, eq(element([&x, &y], &x), 1)).decompose().is_none());
        assert!(or([le(modulo(&x, &y), 1), Constraint::from(&b)])
            .decompose()
            .is_none());
    }

    #[test]
    fn conditional_total_expressions_are_decomposed() {
        let b = BoolVar::new();
        let x = IntVar::new(0, 5);
        let y = IntVar::new(0, 5);

        let pieces = implies(&b, ge(sum([&x, &y]), 9))
            .decompose()
            .expect("implication decomposes");

        assert_eq!(pieces.len(), 2);
        assert!(is_reified_directly(&pieces[1]));
    }
}
