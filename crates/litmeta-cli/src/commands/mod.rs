//! Command implementations.

pub mod configure;
pub mod extract;
pub mod fields;
pub mod prompt;

pub use self::configure::execute_config;
pub use self::extract::execute_extract;
pub use self::fields::execute_fields;
pub use self::prompt::execute_prompt;
