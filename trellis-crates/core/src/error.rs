use thiserror::Error;

/// The ways lowering a model onto a backend can fail.
#[derive(Error, Debug)]
pub enum LoweringError {
    #[error("no lowering or decomposition exists for {0}")]
    UnsupportedConstruct(String),
    /// The input violates the shape the backend relies on, e.g. an implication whose antecedent
    /// is not a literal.
    #[error("constraint violates the backend contract: {0}")]
    BackendContractViolation(String),
    #[error("the {backend} backend reported an error: {message}")]
    BackendExecution {
        backend: &'static str,
        message: String,
    },
    #[error("the {backend} backend does not support the option '{option}'")]
    UnsupportedOption {
        backend: &'static str,
        option: &'static str,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not interpret the backend output: {0}")]
    MalformedOutput(String),
}
