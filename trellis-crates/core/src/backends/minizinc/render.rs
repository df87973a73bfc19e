//! Renders canonical constraints as MiniZinc expressions.
//!
//! Binary operators are written infix, with compound operands in parentheses. Arrays are
//! 0-based, so element lookups use `array1d(0..n-1, ...)` and circuit successors are shifted by
//! one when they can be 0.
use itertools::Itertools;

use super::MiniZincBackend;
use crate::model::Atom;
use crate::model::Connective;
use crate::model::Constraint;
use crate::model::GlobalConstraint;
use crate::model::Literal;
use crate::model::NumExpr;

impl MiniZincBackend {
    pub(super) fn render_constraint(&mut self, constraint: &Constraint) -> String {
        match constraint {
            Constraint::Literal(literal) => self.render_literal(literal),
            Constraint::Constant(value) => value.to_string(),

            Constraint::Connective { connective, args } if args.len() == 2 => {
                let symbol = match connective {
                    Connective::And => "/\\",
                    Connective::Or => "\\/",
                    Connective::Xor => "xor",
                };
                let lhs = self.constraint_operand(&args[0]);
                let rhs = self.constraint_operand(&args[1]);
                format!("{lhs} {symbol} {rhs}")
            }
            Constraint::Connective { connective, args } => {
                let name = match connective {
                    Connective::And => "forall",
                    Connective::Or => "exists",
                    Connective::Xor => "xorall",
                };
                let args = args
                    .iter()
                    .map(|arg| self.render_constraint(arg))
                    .join(",");
                format!("{name}([{args}])")
            }

            Constraint::Implication {
                antecedent,
                consequent,
            } => {
                let antecedent = self.constraint_operand(antecedent);
                let consequent = self.constraint_operand(consequent);
                format!("{antecedent} -> {consequent}")
            }

            Constraint::Comparison {
                comparator,
                lhs,
                rhs,
            } => {
                let lhs = self.operand(lhs);
                let rhs = self.operand(rhs);
                format!("{lhs} {} {rhs}", comparator.symbol())
            }

            Constraint::Global(global) => self.render_global(global),
        }
    }

    pub(super) fn render_expression(&mut self, expr: &NumExpr) -> String {
        let (a, symbol, b) = match expr {
            NumExpr::Atom(atom) => return self.render_atom(atom),

            NumExpr::Sum(terms) if terms.len() == 2 => (&terms[0], "+", &terms[1]),
            NumExpr::Sum(terms) => return format!("sum({})", self.render_array(terms)),
            NumExpr::WeightedSum { weights, terms } => {
                let products = weights
                    .iter()
                    .zip(terms)
                    .map(|(weight, term)| format!("{weight}*{}", self.operand(term)))
                    .join(",");
                return format!("sum([{products}])");
            }

            NumExpr::Sub(a, b) => (a.as_ref(), "-", b.as_ref()),
            NumExpr::Mul(a, b) => (a.as_ref(), "*", b.as_ref()),
            NumExpr::Div(a, b) => (a.as_ref(), "div", b.as_ref()),
            NumExpr::Mod(a, b) => (a.as_ref(), "mod", b.as_ref()),
            NumExpr::Pow(a, b) => (a.as_ref(), "^", b.as_ref()),

            NumExpr::Abs(a) => return format!("abs({})", self.render_expression(a)),
            NumExpr::Neg(a) => return format!("-{}", self.operand(a)),

            NumExpr::Element { array, index } => {
                let subtype = if array.iter().all(NumExpr::is_bool) {
                    "bool"
                } else {
                    "int"
                };
                let last = array.len() as i64 - 1;
                let array = self.render_array(array);
                let index = self.render_expression(index);
                return format!(
                    "\n    let {{ array[int] of var {subtype}: arr=array1d(0..{last},{array}) }} in\n      arr[{index}]"
                );
            }
        };

        let a = self.operand(a);
        let b = self.operand(b);
        format!("{a} {symbol} {b}")
    }

    fn render_global(&mut self, global: &GlobalConstraint) -> String {
        match global {
            GlobalConstraint::AllDifferent(args) => {
                format!("alldifferent({})", self.render_array(args))
            }
            GlobalConstraint::AllEqual(args) => format!("all_equal({})", self.render_array(args)),
            GlobalConstraint::Circuit(successors) | GlobalConstraint::SubCircuit(successors) => {
                // MiniZinc numbers the nodes from 1.
                let shift = successors.iter().any(|successor| {
                    matches!(successor, NumExpr::Atom(Atom::Int(var)) if var.lower_bound() == 0)
                });
                let successors = if shift {
                    successors
                        .iter()
                        .map(|successor| format!("{}+1", self.operand(successor)))
                        .join(",")
                } else {
                    successors
                        .iter()
                        .map(|successor| self.render_expression(successor))
                        .join(",")
                };
                format!("{}([{successors}])", global.name())
            }
            GlobalConstraint::Table { rows, .. } if rows.is_empty() => "false".to_owned(),
            GlobalConstraint::Table { variables, rows } => {
                let variables = self.render_array(variables);
                let rows = rows
                    .iter()
                    .map(|row| format!("{} |", row.iter().join(",")))
                    .join("");
                format!("table({variables}, [|\n{rows}\n|])")
            }
            GlobalConstraint::Xor(literals) => {
                let literals = literals
                    .iter()
                    .map(|literal| self.render_literal(literal))
                    .join(",");
                format!("xorall([{literals}])")
            }
        }
    }

    fn render_atom(&mut self, atom: &Atom) -> String {
        match atom {
            Atom::Int(var) => self.bind(var.variable()),
            Atom::Literal(literal) => self.render_literal(literal),
            Atom::Constant(value) => value.to_string(),
            Atom::Bool(value) => value.to_string(),
        }
    }

    fn render_literal(&mut self, literal: &Literal) -> String {
        let name = self.bind(literal.variable().variable());
        if literal.is_negated() {
            format!("not {name}")
        } else {
            name
        }
    }

    fn render_array(&mut self, exprs: &[NumExpr]) -> String {
        let items = exprs
            .iter()
            .map(|expr| self.render_expression(expr))
            .join(",");
        format!("[{items}]")
    }

    /// An operand of an infix operator.
    fn operand(&mut self, expr: &NumExpr) -> String {
        let rendered = self.render_expression(expr);
        let compound = match expr {
            NumExpr::Atom(Atom::Literal(literal)) => literal.is_negated(),
            NumExpr::Atom(_) => false,
            _ => true,
        };
        if compound {
            format!("({rendered})")
        } else {
            rendered
        }
    }

    fn constraint_operand(&mut self, constraint: &Constraint) -> String {
        let rendered = self.render_constraint(constraint);
        let compound = match constraint {
            Constraint::Literal(literal) => literal.is_negated(),
            Constraint::Constant(_) => false,
            _ => true,
        };
        if compound {
            format!("({rendered})")
        } else {
            rendered
        }
    }
}
