//! Windows build detection and `ILxssUserSession` layout selection.
//!
//! Two vtable slots changed signature across Insider builds:
//!
//! | Slot | Before | From |
//! |------|--------|------|
//! | `CreateLxProcess` | build 20211: no `Flags` | 20211: `Flags: ULONG` after the std handles |
//! | `GetDistributionConfiguration` | build 21313: returns `BasePath` + `KernelCommandLine` | 21313: both dropped |

use serde::Serialize;

use crate::errors::WslVmError;

/// First build whose `CreateLxProcess` takes a trailing `Flags` argument.
pub const BUILD_PROCESS_FLAGS: u32 = 20211;

/// First build whose `GetDistributionConfiguration` omits `BasePath` and
/// `KernelCommandLine`.
pub const BUILD_COMPACT_CONFIGURATION: u32 = 21313;

/// Signature of `GetDistributionConfiguration` for a given build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationLayout {
    /// Builds below 21313.
    WithBasePath,
    /// Build 21313 and later.
    Compact,
}

impl ConfigurationLayout {
    pub fn for_build(build: u32) -> Self {
        if build < BUILD_COMPACT_CONFIGURATION {
            ConfigurationLayout::WithBasePath
        } else {
            ConfigurationLayout::Compact
        }
    }
}

/// Signature of `CreateLxProcess` for a given build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessLayout {
    /// Builds below 20211.
    Legacy,
    /// Build 20211 and later.
    WithFlags,
}

impl ProcessLayout {
    pub fn for_build(build: u32) -> Self {
        if build < BUILD_PROCESS_FLAGS {
            ProcessLayout::Legacy
        } else {
            ProcessLayout::WithFlags
        }
    }
}

/// Return the build number of the running OS.
///
/// Uses `RtlGetVersion`, which is not subject to the manifest-based
/// version lie applied to `GetVersionEx`.
#[cfg(windows)]
pub fn current_build() -> Result<u32, WslVmError> {
    use windows::Wdk::System::SystemServices::RtlGetVersion;
    use windows::Win32::System::SystemInformation::OSVERSIONINFOW;

    let mut info = OSVERSIONINFOW {
        dwOSVersionInfoSize: std::mem::size_of::<OSVERSIONINFOW>() as u32,
        ..Default::default()
    };
    let status = unsafe { RtlGetVersion(&mut info) };
    if status.is_err() {
        return Err(WslVmError::PlatformError(format!(
            "RtlGetVersion failed: NTSTATUS 0x{:08X}",
            status.0 as u32
        )));
    }

    log::debug!(
        "Windows version {}.{} build {}",
        info.dwMajorVersion,
        info.dwMinorVersion,
        info.dwBuildNumber
    );
    Ok(info.dwBuildNumber)
}

#[cfg(not(windows))]
pub fn current_build() -> Result<u32, WslVmError> {
    Err(WslVmError::PlatformError(
        "Windows build detection requires Windows".to_owned(),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_layout_threshold() {
        assert_eq!(ConfigurationLayout::for_build(19041), ConfigurationLayout::WithBasePath);
        assert_eq!(ConfigurationLayout::for_build(21312), ConfigurationLayout::WithBasePath);
        assert_eq!(ConfigurationLayout::for_build(21313), ConfigurationLayout::Compact);
        assert_eq!(ConfigurationLayout::for_build(22631), ConfigurationLayout::Compact);
    }

    #[test]
    fn test_process_layout_threshold() {
        assert_eq!(ProcessLayout::for_build(19045), ProcessLayout::Legacy);
        assert_eq!(ProcessLayout::for_build(20210), ProcessLayout::Legacy);
        assert_eq!(ProcessLayout::for_build(20211), ProcessLayout::WithFlags);
        assert_eq!(ProcessLayout::for_build(26100), ProcessLayout::WithFlags);
    }

    #[test]
    fn test_builds_between_thresholds_mix_layouts() {
        // 20211..21313 already has the flagged CreateLxProcess but still the
        // long configuration signature.
        let build = 21000;
        assert_eq!(ProcessLayout::for_build(build), ProcessLayout::WithFlags);
        assert_eq!(ConfigurationLayout::for_build(build), ConfigurationLayout::WithBasePath);
    }

    #[test]
    fn test_layout_serialization() {
        let json = serde_json::to_string(&ConfigurationLayout::WithBasePath).unwrap();
        assert_eq!(json, "\"with_base_path\"");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_current_build_unsupported_off_windows() {
        assert!(matches!(current_build(), Err(WslVmError::PlatformError(_))));
    }
}
