//! Maps `Box<dyn Error>` from the collaborator traits to typed `VcpError`.
//!
//! The traits in `lathe_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `lathe_hardware::error::RuntimeError` downcasting.

use crate::error::VcpError;

/// Map a trait-boundary error to a typed `VcpError`.
///
/// Attempts to downcast the simulator's error type first, then falls back
/// to string-based heuristics.
pub fn map_runtime_error(e: &(dyn std::error::Error + 'static)) -> VcpError {
    #[cfg(feature = "hardware-errors")]
    {
        use lathe_hardware::error::RuntimeError;
        if let Some(rt) = e.downcast_ref::<RuntimeError>() {
            return match rt {
                RuntimeError::Rejected(reason) => VcpError::Rejected(reason.clone()),
                other => VcpError::Runtime(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("reject") {
        VcpError::Rejected(s)
    } else {
        VcpError::Runtime(s)
    }
}
