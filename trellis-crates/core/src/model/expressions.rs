use super::variables::BoolVar;
use super::variables::DecisionVariable;
use super::variables::IntVar;
use super::variables::Literal;
use super::Assignment;

/// The leaves of a numeric expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Atom {
    Int(IntVar),
    /// A Boolean, or its negation, used as the integer `0` or `1`.
    Literal(Literal),
    Constant(i64),
    Bool(bool),
}

/// A numeric expression over decision variables.
///
/// Indexing is 0-based and division rounds towards zero.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumExpr {
    Atom(Atom),
    Sum(Vec<NumExpr>),
    WeightedSum {
        weights: Vec<i64>,
        terms: Vec<NumExpr>,
    },
    Sub(Box<NumExpr>, Box<NumExpr>),
    Mul(Box<NumExpr>, Box<NumExpr>),
    Div(Box<NumExpr>, Box<NumExpr>),
    Mod(Box<NumExpr>, Box<NumExpr>),
    Pow(Box<NumExpr>, Box<NumExpr>),
    Abs(Box<NumExpr>),
    Neg(Box<NumExpr>),
    Element {
        array: Vec<NumExpr>,
        index: Box<NumExpr>,
    },
}

impl From<Atom> for NumExpr {
    fn from(value: Atom) -> Self {
        NumExpr::Atom(value)
    }
}

impl From<IntVar> for NumExpr {
    fn from(value: IntVar) -> Self {
        NumExpr::Atom(Atom::Int(value))
    }
}

impl From<&IntVar> for NumExpr {
    fn from(value: &IntVar) -> Self {
        NumExpr::Atom(Atom::Int(value.clone()))
    }
}

impl From<BoolVar> for NumExpr {
    fn from(value: BoolVar) -> Self {
        NumExpr::Atom(Atom::Literal(value.into()))
    }
}

impl From<&BoolVar> for NumExpr {
    fn from(value: &BoolVar) -> Self {
        NumExpr::Atom(Atom::Literal(value.clone().into()))
    }
}

impl From<Literal> for NumExpr {
    fn from(value: Literal) -> Self {
        NumExpr::Atom(Atom::Literal(value))
    }
}

impl From<i64> for NumExpr {
    fn from(value: i64) -> Self {
        NumExpr::Atom(Atom::Constant(value))
    }
}

impl From<i32> for NumExpr {
    fn from(value: i32) -> Self {
        NumExpr::Atom(Atom::Constant(value as i64))
    }
}

impl From<bool> for NumExpr {
    fn from(value: bool) -> Self {
        NumExpr::Atom(Atom::Bool(value))
    }
}

pub fn sum<E: Into<NumExpr>>(terms: impl IntoIterator<Item = E>) -> NumExpr {
    NumExpr::Sum(terms.into_iter().map(Into::into).collect())
}

/// `sum(weights[i] * terms[i])`
///
/// # Panics
/// If the number of weights differs from the number of terms.
pub fn wsum<E: Into<NumExpr>>(
    weights: impl IntoIterator<Item = i64>,
    terms: impl IntoIterator<Item = E>,
) -> NumExpr {
    let weights = weights.into_iter().collect::<Vec<_>>();
    let terms = terms.into_iter().map(Into::into).collect::<Vec<_>>();
    assert_eq!(
        weights.len(),
        terms.len(),
        "a weighted sum needs one weight per term"
    );

    NumExpr::WeightedSum { weights, terms }
}

pub fn sub(a: impl Into<NumExpr>, b: impl Into<NumExpr>) -> NumExpr {
    NumExpr::Sub(Box::new(a.into()), Box::new(b.into()))
}

pub fn mul(a: impl Into<NumExpr>, b: impl Into<NumExpr>) -> NumExpr {
    NumExpr::Mul(Box::new(a.into()), Box::new(b.into()))
}

pub fn div(a: impl Into<NumExpr>, b: impl Into<NumExpr>) -> NumExpr {
    NumExpr::Div(Box::new(a.into()), Box::new(b.into()))
}

pub fn modulo(a: impl Into<NumExpr>, b: impl Into<NumExpr>) -> NumExpr {
    NumExpr::Mod(Box::new(a.into()), Box::new(b.into()))
}

pub fn pow(base: impl Into<NumExpr>, exponent: impl Into<NumExpr>) -> NumExpr {
    NumExpr::Pow(Box::new(base.into()), Box::new(exponent.into()))
}

pub fn abs(a: impl Into<NumExpr>) -> NumExpr {
    NumExpr::Abs(Box::new(a.into()))
}

pub fn neg(a: impl Into<NumExpr>) -> NumExpr {
    NumExpr::Neg(Box::new(a.into()))
}

/// `array[index]`, where `index` is 0-based.
pub fn element<E: Into<NumExpr>>(
    array: impl IntoIterator<Item = E>,
    index: impl Into<NumExpr>,
) -> NumExpr {
    NumExpr::Element {
        array: array.into_iter().map(Into::into).collect(),
        index: Box::new(index.into()),
    }
}

impl NumExpr {
    pub fn is_atom(&self) -> bool {
        matches!(self, NumExpr::Atom(_))
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            NumExpr::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// Whether the expression is Boolean valued, i.e. a literal or a Boolean constant.
    pub fn is_bool(&self) -> bool {
        matches!(self, NumExpr::Atom(Atom::Literal(_) | Atom::Bool(_)))
    }

    /// The direct subexpressions of this expression.
    pub fn operands(&self) -> Vec<&NumExpr> {
        match self {
            NumExpr::Atom(_) => vec![],
            NumExpr::Sum(terms) | NumExpr::WeightedSum { terms, .. } => terms.iter().collect(),
            NumExpr::Sub(a, b)
            | NumExpr::Mul(a, b)
            | NumExpr::Div(a, b)
            | NumExpr::Mod(a, b)
            | NumExpr::Pow(a, b) => vec![a, b],
            NumExpr::Abs(a) | NumExpr::Neg(a) => vec![a],
            NumExpr::Element { array, index } => {
                array.iter().chain(std::iter::once(index.as_ref())).collect()
            }
        }
    }

    /// Whether the expression is defined under every assignment. Division, modulo, power and
    /// element are undefined for some operands.
    pub fn is_total(&self) -> bool {
        match self {
            NumExpr::Div(_, _)
            | NumExpr::Mod(_, _)
            | NumExpr::Pow(_, _)
            | NumExpr::Element { .. } => false,
            _ => self.operands().into_iter().all(NumExpr::is_total),
        }
    }

    /// Appends the variables in this expression to `variables`, in order of first occurrence.
    pub fn collect_variables(&self, variables: &mut Vec<DecisionVariable>) {
        match self {
            NumExpr::Atom(Atom::Int(var)) => push_unique(variables, var.variable()),
            NumExpr::Atom(Atom::Literal(literal)) => {
                push_unique(variables, literal.variable().variable())
            }
            NumExpr::Atom(Atom::Constant(_) | Atom::Bool(_)) => {}
            _ => self
                .operands()
                .into_iter()
                .for_each(|operand| operand.collect_variables(variables)),
        }
    }

    /// The value of the expression under `assignment`. Returns `None` if a variable is unassigned
    /// or the expression is undefined, such as a division by zero or an index out of range.
    pub fn evaluate(&self, assignment: &impl Assignment) -> Option<i64> {
        match self {
            NumExpr::Atom(Atom::Int(var)) => assignment.value(var.variable()),
            NumExpr::Atom(Atom::Literal(literal)) => {
                let value = assignment.value(literal.variable().variable())?;
                Some(if literal.is_negated() { 1 - value } else { value })
            }
            NumExpr::Atom(Atom::Constant(value)) => Some(*value),
            NumExpr::Atom(Atom::Bool(value)) => Some(*value as i64),
            NumExpr::Sum(terms) => terms.iter().try_fold(0_i64, |total, term| {
                total.checked_add(term.evaluate(assignment)?)
            }),
            NumExpr::WeightedSum { weights, terms } => {
                weights
                    .iter()
                    .zip(terms)
                    .try_fold(0_i64, |total, (weight, term)| {
                        total.checked_add(weight.checked_mul(term.evaluate(assignment)?)?)
                    })
            }
            NumExpr::Sub(a, b) => a.evaluate(assignment)?.checked_sub(b.evaluate(assignment)?),
            NumExpr::Mul(a, b) => a.evaluate(assignment)?.checked_mul(b.evaluate(assignment)?),
            NumExpr::Div(a, b) => a.evaluate(assignment)?.checked_div(b.evaluate(assignment)?),
            NumExpr::Mod(a, b) => a.evaluate(assignment)?.checked_rem(b.evaluate(assignment)?),
            NumExpr::Pow(base, exponent) => {
                let exponent = u32::try_from(exponent.evaluate(assignment)?).ok()?;
                base.evaluate(assignment)?.checked_pow(exponent)
            }
            NumExpr::Abs(a) => a.evaluate(assignment)?.checked_abs(),
            NumExpr::Neg(a) => a.evaluate(assignment)?.checked_neg(),
            NumExpr::Element { array, index } => {
                let index = usize::try_from(index.evaluate(assignment)?).ok()?;
                array.get(index)?.evaluate(assignment)
            }
        }
    }

    /// Conservative bounds on the values the expression can take.
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            NumExpr::Atom(Atom::Int(var)) => (var.lower_bound() as i64, var.upper_bound() as i64),
            NumExpr::Atom(Atom::Literal(_)) => (0, 1),
            NumExpr::Atom(Atom::Constant(value)) => (*value, *value),
            NumExpr::Atom(Atom::Bool(value)) => (*value as i64, *value as i64),
            NumExpr::Sum(terms) => terms.iter().map(NumExpr::bounds).fold(
                (0, 0),
                |(lower, upper), (term_lower, term_upper)| {
                    (
                        lower.saturating_add(term_lower),
                        upper.saturating_add(term_upper),
                    )
                },
            ),
            NumExpr::WeightedSum { weights, terms } => weights.iter().zip(terms).fold(
                (0, 0),
                |(lower, upper), (&weight, term)| {
                    let (term_lower, term_upper) =
                        scale(term.bounds(), weight);
                    (
                        lower.saturating_add(term_lower),
                        upper.saturating_add(term_upper),
                    )
                },
            ),
            NumExpr::Sub(a, b) => {
                let (a_lower, a_upper) = a.bounds();
                let (b_lower, b_upper) = b.bounds();
                (
                    a_lower.saturating_sub(b_upper),
                    a_upper.saturating_sub(b_lower),
                )
            }
            NumExpr::Mul(a, b) => {
                let (a_lower, a_upper) = a.bounds();
                let (b_lower, b_upper) = b.bounds();
                min_max([
                    a_lower.saturating_mul(b_lower),
                    a_lower.saturating_mul(b_upper),
                    a_upper.saturating_mul(b_lower),
                    a_upper.saturating_mul(b_upper),
                ])
            }
            NumExpr::Div(a, _) => {
                // |a / b| <= |a| for any non-zero b.
                let magnitude = max_magnitude(a.bounds());
                (-magnitude, magnitude)
            }
            NumExpr::Mod(a, b) => {
                // The remainder has the sign of the dividend and is smaller than the divisor.
                let (a_lower, a_upper) = a.bounds();
                let divisor = max_magnitude(b.bounds()).saturating_sub(1).max(0);
                (
                    a_lower.min(0).max(-divisor),
                    a_upper.max(0).min(divisor),
                )
            }
            NumExpr::Pow(base, exponent) => pow_bounds(base.bounds(), exponent.bounds()),
            NumExpr::Abs(a) => match a.bounds() {
                (lower, upper) if lower >= 0 => (lower, upper),
                (lower, upper) if upper <= 0 => (upper.saturating_neg(), lower.saturating_neg()),
                bounds => (0, max_magnitude(bounds)),
            },
            NumExpr::Neg(a) => {
                let (lower, upper) = a.bounds();
                (upper.saturating_neg(), lower.saturating_neg())
            }
            NumExpr::Element { array, .. } => {
                if array.is_empty() {
                    return (0, 0);
                }
                array.iter().map(NumExpr::bounds).fold(
                    (i64::MAX, i64::MIN),
                    |(lower, upper), (item_lower, item_upper)| {
                        (lower.min(item_lower), upper.max(item_upper))
                    },
                )
            }
        }
    }
}

fn push_unique(variables: &mut Vec<DecisionVariable>, variable: &DecisionVariable) {
    if !variables.contains(variable) {
        variables.push(variable.clone());
    }
}

fn scale((lower, upper): (i64, i64), weight: i64) -> (i64, i64) {
    min_max([lower.saturating_mul(weight), upper.saturating_mul(weight)])
}

fn min_max<const N: usize>(values: [i64; N]) -> (i64, i64) {
    values
        .into_iter()
        .fold((i64::MAX, i64::MIN), |(lower, upper), value| {
            (lower.min(value), upper.max(value))
        })
}

fn max_magnitude((lower, upper): (i64, i64)) -> i64 {
    lower.saturating_abs().max(upper.saturating_abs())
}

fn pow_bounds(
    (base_lower, base_upper): (i64, i64),
    (exponent_lower, exponent_upper): (i64, i64),
) -> (i64, i64) {
    let exponent_lower = exponent_lower.max(0);
    let exponent_upper = exponent_upper.clamp(0, u32::MAX as i64);
    if exponent_lower > exponent_upper {
        // The power is undefined everywhere.
        return (0, 0);
    }

    // The extremes are attained at the extreme bases, or at a base of -1, 0 or 1, combined with
    // the extreme exponents of either parity.
    let bases = [base_lower, base_upper, -1, 0, 1]
        .into_iter()
        .filter(|base| (base_lower..=base_upper).contains(base));
    let exponents = [
        exponent_lower,
        exponent_lower + 1,
        exponent_upper - 1,
        exponent_upper,
    ]
    .into_iter()
    .filter(|exponent| (exponent_lower..=exponent_upper).contains(exponent))
    .collect::<Vec<_>>();

    bases
        .flat_map(|base| {
            exponents
                .iter()
                .map(move |&exponent| base.saturating_pow(exponent as u32))
        })
        .fold((i64::MAX, i64::MIN), |(lower, upper), value| {
            (lower.min(value), upper.max(value))
        })
}
