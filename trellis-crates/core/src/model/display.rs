//! A readable rendering of the model, used in log messages and errors.
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

use itertools::Itertools;

use super::constraints::*;
use super::expressions::*;
use super::variables::Literal;

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.is_negated() {
            write!(f, "not {}", self.variable().name())
        } else {
            write!(f, "{}", self.variable().name())
        }
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Atom::Int(var) => write!(f, "{}", var.name()),
            Atom::Literal(literal) => write!(f, "{literal}"),
            Atom::Constant(value) => write!(f, "{value}"),
            Atom::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl Display for NumExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let name = match self {
            NumExpr::Atom(atom) => return write!(f, "{atom}"),
            NumExpr::WeightedSum { weights, terms } => {
                return write!(
                    f,
                    "wsum([{}], [{}])",
                    weights.iter().join(", "),
                    terms.iter().join(", ")
                )
            }
            NumExpr::Element { array, index } => {
                return write!(f, "[{}][{index}]", array.iter().join(", "))
            }
            NumExpr::Sum(_) => "sum",
            NumExpr::Sub(_, _) => "sub",
            NumExpr::Mul(_, _) => "mul",
            NumExpr::Div(_, _) => "div",
            NumExpr::Mod(_, _) => "mod",
            NumExpr::Pow(_, _) => "pow",
            NumExpr::Abs(_) => "abs",
            NumExpr::Neg(_) => "neg",
        };
        write!(f, "{name}({})", self.operands().into_iter().join(", "))
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Constraint::Literal(literal) => write!(f, "{literal}"),
            Constraint::Constant(value) => write!(f, "{value}"),
            Constraint::Connective { connective, args } => {
                let name = match connective {
                    Connective::And => "and",
                    Connective::Or => "or",
                    Connective::Xor => "xor",
                };
                write!(f, "{name}({})", args.iter().join(", "))
            }
            Constraint::Implication {
                antecedent,
                consequent,
            } => write!(f, "({antecedent}) -> ({consequent})"),
            Constraint::Comparison {
                comparator,
                lhs,
                rhs,
            } => write!(f, "{lhs} {} {rhs}", comparator.symbol()),
            Constraint::Global(global) => write!(f, "{global}"),
        }
    }
}

impl Display for GlobalConstraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            GlobalConstraint::AllDifferent(args)
            | GlobalConstraint::AllEqual(args)
            | GlobalConstraint::Circuit(args)
            | GlobalConstraint::SubCircuit(args) => {
                write!(f, "{}([{}])", self.name(), args.iter().join(", "))
            }
            GlobalConstraint::Table { variables, rows } => write!(
                f,
                "table([{}], [{}])",
                variables.iter().join(", "),
                rows.iter()
                    .map(|row| format!("[{}]", row.iter().join(", ")))
                    .join(", ")
            ),
            GlobalConstraint::Xor(literals) => {
                write!(f, "xor([{}])", literals.iter().join(", "))
            }
        }
    }
}
