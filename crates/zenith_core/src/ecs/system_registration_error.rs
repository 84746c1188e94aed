use thiserror::Error;

/// Errors that can occur while registering a system.
///
/// Registration happens once at startup; callers are expected to treat these
/// as fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemRegistrationError {
    #[error("system '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("system name '{name}' is not kebab-case")]
    InvalidName { name: String },
}
