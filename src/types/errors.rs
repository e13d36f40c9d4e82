use std::num::ParseIntError;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Money error: {0}")]
    InvalidFormat(String),
    #[error("Money error: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("Money error: [{0}] has more than two decimal places")]
    Precision(String),
    #[error("Money error: Overflow")]
    Overflow
}
