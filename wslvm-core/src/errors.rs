//! Error types for `wslvm_core`.
//!
//! All failures are funnelled through [`WslVmError`], which uses
//! `thiserror` for `Display` and `Error` derives.  Failing HRESULTs from the
//! LxssManager service are mapped by [`WslVmError::from_hresult`].

use thiserror::Error;

/// Custom HRESULT returned by `ILxssUserSession` when no distribution
/// matches the requested name.
pub const E_LXSS_DISTRO_NOT_FOUND: u32 = 0x8004_0302;

/// Top-level error type for the `wslvm_core` library.
#[derive(Debug, Error)]
pub enum WslVmError {
    /// COM initialisation or an `ILxssUserSession` call failed.
    #[error("ComError: {0}")]
    ComError(String),

    /// The service knows no distribution with the supplied name.
    #[error("DistributionNotFound: there is no distribution with the supplied name ({0})")]
    DistributionNotFound(String),

    /// Reading a distribution's configuration failed.
    #[error("ConfigurationError: {0}")]
    ConfigurationError(String),

    /// `CreateLxProcess` failed.
    #[error("LaunchError: {0}")]
    LaunchError(String),

    /// The attached console host handle could not be read.
    #[error("ConsoleError: {0}")]
    ConsoleError(String),

    /// Operation is unavailable on this platform or OS build.
    #[error("PlatformError: {0}")]
    PlatformError(String),
}

impl WslVmError {
    /// Map a failing HRESULT to an error, tagging it with `context`.
    ///
    /// [`E_LXSS_DISTRO_NOT_FOUND`] becomes [`WslVmError::DistributionNotFound`]
    /// carrying `context` (the distribution name); everything else is a
    /// [`WslVmError::ComError`].
    pub fn from_hresult(code: i32, context: &str) -> Self {
        let code = code as u32;
        if code == E_LXSS_DISTRO_NOT_FOUND {
            WslVmError::DistributionNotFound(context.to_owned())
        } else {
            WslVmError::ComError(format!("{context}: HRESULT 0x{code:08X}"))
        }
    }

    /// Re-tag a failed `CreateLxProcess` call.
    ///
    /// A generic [`WslVmError::ComError`] becomes a
    /// [`WslVmError::LaunchError`]; every other variant (notably
    /// [`WslVmError::DistributionNotFound`]) is kept.
    pub fn into_launch_error(self) -> Self {
        match self {
            WslVmError::ComError(msg) => WslVmError::LaunchError(format!("CreateLxProcess: {msg}")),
            other => other,
        }
    }

    /// True for [`WslVmError::DistributionNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, WslVmError::DistributionNotFound(_))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
