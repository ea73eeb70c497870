pub mod error;
pub mod event;
pub mod types;

pub use error::HerlangError;
pub use event::*;
pub use types::*;
