pub mod error;
pub mod models;
pub mod pii;

pub use error::{StoreError, StoreResult};
pub use pii::Masked;
