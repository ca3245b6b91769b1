//! Hard-stop errors.
//!
//! `AppError` is reserved for conditions that make the whole run pointless
//! (bad configuration, unreadable work-partition file, output that cannot be
//! written). Per-genome problems are reported inline through
//! [`crate::domain::ItemError`] and never surface here.

/// Exit code for invalid configuration or unusable run-level inputs.
pub const EXIT_INPUT: u8 = 2;
/// Exit code for a run where no item produced any data.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for internal failures (thread pool, numeric setup).
pub const EXIT_INTERNAL: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Configuration or run-level input problem.
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(EXIT_INTERNAL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_carry_exit_codes() {
        assert_eq!(AppError::input("bad k").exit_code(), EXIT_INPUT);
        assert_eq!(AppError::internal("pool").exit_code(), EXIT_INTERNAL);
        assert_eq!(AppError::new(EXIT_NO_DATA, "empty").to_string(), "empty");
    }
}
