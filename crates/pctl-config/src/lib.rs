pub mod error;
pub mod loader;
pub mod validate;

pub use error::{ConfigError, ValidationError, ValidationErrors, Warning};
pub use loader::{load, parse_and_validate};
pub use validate::validate;
