mod error_code;
mod trellis_error;

pub use error_code::TrellisErrorCode;
pub use trellis_error::{TrellisError, TrellisResult};

pub mod codes {
    pub use super::error_code::*;
}
