//! The interface to the pass which brings constraints into canonical form.
use crate::model::auxiliary_for;
use crate::model::Constraint;
use crate::model::IntVar;
use crate::model::NumExpr;

/// Brings constraints into the canonical form the backends accept.
pub trait Normalizer {
    /// Flattens a constraint into canonical constraints.
    fn flatten(&mut self, constraint: &Constraint) -> Vec<Constraint>;

    /// Introduces a variable which equals `expr`, together with the constraints defining it.
    fn materialize(&mut self, expr: &NumExpr) -> (IntVar, Vec<Constraint>);

    /// Rewrites implications into the forms the backends can reify.
    fn rewrite_reification(&mut self, constraints: Vec<Constraint>) -> Vec<Constraint>;
}

/// Takes constraints which are already canonical as they are.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalNormalizer;

impl Normalizer for CanonicalNormalizer {
    fn flatten(&mut self, constraint: &Constraint) -> Vec<Constraint> {
        vec![constraint.clone()]
    }

    fn materialize(&mut self, expr: &NumExpr) -> (IntVar, Vec<Constraint>) {
        let (auxiliary, definition) = auxiliary_for(expr);
        (auxiliary, vec![definition])
    }

    fn rewrite_reification(&mut self, constraints: Vec<Constraint>) -> Vec<Constraint> {
        constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::eq;
    use crate::model::sum;

    #[test]
    fn materialized_variable_spans_the_expression() {
        let x = IntVar::new(-2, 3);
        let y = IntVar::new(0, 4);
        let expr = sum([&x, &y]);

        let (auxiliary, definitions) = CanonicalNormalizer.materialize(&expr);

        assert_eq!((auxiliary.lower_bound(), auxiliary.upper_bound()), (-2, 7));
        assert_eq!(definitions, vec![eq(expr, &auxiliary)]);
    }
}
