use thiserror::Error;

/// Error types that can occur in the rule engine
#[derive(Error, Debug)]
pub enum RuleEngineError {
    /// Compile-time rejection of an ill-formed condition tree.
    #[error("invalid condition: {message}")]
    InvalidDsl {
        /// Human-readable description of the offending shape
        message: String,
    },

    /// A fact payload was submitted without a `type`.
    #[error("fact payload is missing a type")]
    MissingType,

    /// `update_fact` attempted to change a fact's type.
    #[error("fact {id} cannot change type from {current:?} to {attempted:?}")]
    TypeImmutable {
        /// Id of the fact that was targeted
        id: u64,
        /// Type the fact currently has
        current: String,
        /// Type the caller tried to set
        attempted: String,
    },

    /// No fact exists with the given id.
    #[error("no fact with id {0}")]
    NotFound(u64),

    /// `run()` reached `max_cycles` without stabilizing.
    #[error("exceeded max_cycles ({0}) without reaching a fixed point")]
    MaxCyclesExceeded(u32),

    /// A node attempted to evaluate without working memory available.
    ///
    /// Programmer-error assertion: the public API always supplies working
    /// memory to a node before it is evaluated, so this should be
    /// unreachable through normal use of [`crate::Engine`].
    #[error("node network evaluated before working memory was available")]
    NetworkUninitialized,
}

/// Convenient Result type alias for rule engine operations
pub type Result<T> = std::result::Result<T, RuleEngineError>;
