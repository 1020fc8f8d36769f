pub mod error;
pub mod loan;
pub mod project;
pub mod sensitivity;
pub mod time_value;
pub mod types;

pub use error::MieterstromError;
pub use types::*;

/// Standard result type for all engine operations
pub type MieterstromResult<T> = Result<T, MieterstromError>;
