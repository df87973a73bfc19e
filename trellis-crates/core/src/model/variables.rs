use std::fmt::Display;
use std::hash::Hash;
use std::hash::Hasher;
use std::ops::Not;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;

static NEXT_VARIABLE_ID: AtomicU32 = AtomicU32::new(0);

/// The identity of a decision variable. Identities are unique within the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(u32);

impl VariableId {
    fn fresh() -> Self {
        VariableId(NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Boolean,
    Integer,
}

/// The values a decision variable can take.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Interval { lower_bound: i32, upper_bound: i32 },
    /// An explicit set of values, sorted and without duplicates.
    Set(Box<[i32]>),
}

impl Domain {
    pub fn lower_bound(&self) -> i32 {
        match self {
            Domain::Interval { lower_bound, .. } => *lower_bound,
            Domain::Set(values) => values[0],
        }
    }

    pub fn upper_bound(&self) -> i32 {
        match self {
            Domain::Interval { upper_bound, .. } => *upper_bound,
            Domain::Set(values) => values[values.len() - 1],
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        match self {
            Domain::Interval {
                lower_bound,
                upper_bound,
            } => *lower_bound as i64 <= value && value <= *upper_bound as i64,
            Domain::Set(values) => i32::try_from(value)
                .is_ok_and(|value| values.binary_search(&value).is_ok()),
        }
    }
}

#[derive(Debug)]
struct VariableData {
    id: VariableId,
    kind: VariableKind,
    domain: Domain,
    name: Box<str>,
}

/// A decision variable of a model, either a Boolean or a bounded integer.
///
/// Decision variables are cheap to clone; clones share the same identity. Equality, ordering and
/// hashing only consider the identity.
#[derive(Clone, Debug)]
pub struct DecisionVariable(Arc<VariableData>);

impl DecisionVariable {
    fn create(kind: VariableKind, domain: Domain, name: Option<String>) -> Self {
        let id = VariableId::fresh();
        let name = name.unwrap_or_else(|| match kind {
            VariableKind::Boolean => format!("BV{}", id.0),
            VariableKind::Integer => format!("IV{}", id.0),
        });

        DecisionVariable(Arc::new(VariableData {
            id,
            kind,
            domain,
            name: name.into(),
        }))
    }

    pub fn id(&self) -> VariableId {
        self.0.id
    }

    pub fn kind(&self) -> VariableKind {
        self.0.kind
    }

    pub fn is_boolean(&self) -> bool {
        self.0.kind == VariableKind::Boolean
    }

    pub fn domain(&self) -> &Domain {
        &self.0.domain
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn lower_bound(&self) -> i32 {
        self.0.domain.lower_bound()
    }

    pub fn upper_bound(&self) -> i32 {
        self.0.domain.upper_bound()
    }

    /// The variable as a [`BoolVar`], if it is Boolean.
    pub fn as_bool(&self) -> Option<BoolVar> {
        self.is_boolean().then(|| BoolVar(self.clone()))
    }

    /// The variable as an [`IntVar`], if it is an integer.
    pub fn as_int(&self) -> Option<IntVar> {
        (!self.is_boolean()).then(|| IntVar(self.clone()))
    }
}

impl PartialEq for DecisionVariable {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for DecisionVariable {}

impl PartialOrd for DecisionVariable {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DecisionVariable {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id().cmp(&other.id())
    }
}

impl Hash for DecisionVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl AsRef<DecisionVariable> for DecisionVariable {
    fn as_ref(&self) -> &DecisionVariable {
        self
    }
}

impl Display for DecisionVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A Boolean decision variable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoolVar(DecisionVariable);

impl BoolVar {
    /// Creates a Boolean with the default name `BV<id>`.
    #[allow(clippy::new_without_default, reason = "every call creates a distinct variable")]
    pub fn new() -> Self {
        BoolVar(DecisionVariable::create(
            VariableKind::Boolean,
            Domain::Interval {
                lower_bound: 0,
                upper_bound: 1,
            },
            None,
        ))
    }

    pub fn named(name: impl Into<String>) -> Self {
        BoolVar(DecisionVariable::create(
            VariableKind::Boolean,
            Domain::Interval {
                lower_bound: 0,
                upper_bound: 1,
            },
            Some(name.into()),
        ))
    }

    pub fn variable(&self) -> &DecisionVariable {
        &self.0
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }
}

impl AsRef<DecisionVariable> for BoolVar {
    fn as_ref(&self) -> &DecisionVariable {
        &self.0
    }
}

impl From<BoolVar> for DecisionVariable {
    fn from(value: BoolVar) -> Self {
        value.0
    }
}

impl Not for BoolVar {
    type Output = Literal;

    fn not(self) -> Self::Output {
        !Literal::from(self)
    }
}

impl Not for &BoolVar {
    type Output = Literal;

    fn not(self) -> Self::Output {
        !Literal::from(self.clone())
    }
}

/// An integer decision variable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntVar(DecisionVariable);

impl IntVar {
    /// Creates an integer in the interval `[lower_bound, upper_bound]` with the default name
    /// `IV<id>`.
    ///
    /// # Panics
    /// If `lower_bound > upper_bound`.
    pub fn new(lower_bound: i32, upper_bound: i32) -> Self {
        Self::create_interval(lower_bound, upper_bound, None)
    }

    /// # Panics
    /// If `lower_bound > upper_bound`.
    pub fn named(lower_bound: i32, upper_bound: i32, name: impl Into<String>) -> Self {
        Self::create_interval(lower_bound, upper_bound, Some(name.into()))
    }

    /// Creates an integer which can take any of the given values.
    ///
    /// # Panics
    /// If no values are given.
    pub fn with_values(values: impl IntoIterator<Item = i32>, name: Option<String>) -> Self {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_unstable();
        values.dedup();
        assert!(!values.is_empty(), "the domain of an integer cannot be empty");

        IntVar(DecisionVariable::create(
            VariableKind::Integer,
            Domain::Set(values.into()),
            name,
        ))
    }

    fn create_interval(lower_bound: i32, upper_bound: i32, name: Option<String>) -> Self {
        assert!(
            lower_bound <= upper_bound,
            "the domain [{lower_bound}, {upper_bound}] is empty"
        );

        IntVar(DecisionVariable::create(
            VariableKind::Integer,
            Domain::Interval {
                lower_bound,
                upper_bound,
            },
            name,
        ))
    }

    pub fn variable(&self) -> &DecisionVariable {
        &self.0
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn lower_bound(&self) -> i32 {
        self.0.lower_bound()
    }

    pub fn upper_bound(&self) -> i32 {
        self.0.upper_bound()
    }
}

impl AsRef<DecisionVariable> for IntVar {
    fn as_ref(&self) -> &DecisionVariable {
        &self.0
    }
}

impl From<IntVar> for DecisionVariable {
    fn from(value: IntVar) -> Self {
        value.0
    }
}

/// A Boolean variable, or its negation.
///
/// The negation owns no state of its own; backends resolve it from the variable every time it is
/// used.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    variable: BoolVar,
    negated: bool,
}

impl Literal {
    pub fn variable(&self) -> &BoolVar {
        &self.variable
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }
}

impl From<BoolVar> for Literal {
    fn from(variable: BoolVar) -> Self {
        Literal {
            variable,
            negated: false,
        }
    }
}

impl From<&BoolVar> for Literal {
    fn from(variable: &BoolVar) -> Self {
        variable.clone().into()
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            variable: self.variable,
            negated: !self.negated,
        }
    }
}
