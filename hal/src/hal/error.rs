//! Status and error types shared by every peripheral class.
//!
//! Operations return [`HalResult`]. Callers that need the numeric status
//! convention (`0` success, negative error, positive informational) get it
//! from [`HalError::code`], [`InitStatus::code`] and [`status_of`].

use core::fmt;

/// Errors reported by the dispatch layer and by concrete drivers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HalError {
    /// No instance at the requested index.
    NotFound,
    /// The operation is not valid in the instance's current lifecycle state.
    InvalidState,
    /// The instance's serialisation primitive could not be acquired.
    ResourceError,
    /// An argument is out of the range the driver supports.
    InvalidArgument,
    /// Driver-specific hardware failure. The code is opaque to the HAL.
    Hardware(i32),
}

impl HalError {
    /// Negative status code for this error.
    pub const fn code(self) -> i32 {
        match self {
            HalError::NotFound => -1,
            HalError::InvalidState => -2,
            HalError::ResourceError => -3,
            HalError::InvalidArgument => -4,
            HalError::Hardware(code) => {
                if code < 0 {
                    code
                } else {
                    (-16i32).saturating_sub(code)
                }
            }
        }
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalError::NotFound => f.write_str("no such instance"),
            HalError::InvalidState => f.write_str("invalid state for operation"),
            HalError::ResourceError => f.write_str("instance lock unavailable"),
            HalError::InvalidArgument => f.write_str("argument out of range"),
            HalError::Hardware(code) => write!(f, "hardware error {}", code),
        }
    }
}

pub type HalResult<T> = Result<T, HalError>;

/// Outcome of a successful `init` call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InitStatus {
    /// The instance was brought up by this call.
    Initialized,
    /// The instance was already up; nothing was touched.
    AlreadyInitialized,
    /// Handle returned without bringing the hardware up (timer `prescaler == 0`).
    ///
    /// Operations on such a handle only succeed if some other caller has
    /// initialised the instance; otherwise they report
    /// [`HalError::InvalidState`].
    Inspect,
}

impl InitStatus {
    pub const fn code(self) -> i32 {
        match self {
            InitStatus::Initialized => 0,
            InitStatus::AlreadyInitialized => 1,
            InitStatus::Inspect => 2,
        }
    }
}

/// Instance handle plus the way it was obtained.
#[derive(Debug, Copy, Clone)]
pub struct Acquired<H> {
    pub instance: H,
    pub status: InitStatus,
}

/// Collapse a result into the numeric status convention.
pub fn status_of<T>(result: &HalResult<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_negative_and_distinct() {
        let codes = [
            HalError::NotFound.code(),
            HalError::InvalidState.code(),
            HalError::ResourceError.code(),
            HalError::InvalidArgument.code(),
            HalError::Hardware(3).code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert!(*a < 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn negative_hardware_codes_pass_through() {
        assert_eq!(HalError::Hardware(-42).code(), -42);
    }

    #[test]
    fn init_status_codes() {
        assert_eq!(InitStatus::Initialized.code(), 0);
        assert_eq!(InitStatus::AlreadyInitialized.code(), 1);
        assert!(InitStatus::Inspect.code() > 0);
        assert_eq!(status_of::<()>(&Err(HalError::NotFound)), -1);
        assert_eq!(status_of(&Ok(5u8)), 0);
    }
}
