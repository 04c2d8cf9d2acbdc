//! Fixed-decimal parsing and arithmetic errors.

/// Errors raised by `Wad`/`Ray`/`Rad` operations that are not panics
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    #[error("Invalid decimal '{input}': {reason}")]
    InvalidDecimal { input: String, reason: String },

    #[error("Division by zero while computing {context}")]
    DivisionByZero { context: String },

    #[error("Negative amount while computing {context}")]
    NegativeAmount { context: String },
}
