//! High-level distribution / utility VM identity lookup.
//!
//! Each entry point opens its own [`LxssSession`](crate::session::LxssSession)
//! and releases it (and the COM apartment) before returning.  Off Windows
//! every function returns [`WslVmError::PlatformError`].
//!
//! # Examples
//!
//! ```no_run
//! // Default distribution: distro id, utility VM id and WSL version.
//! let report = wslvm_core::query_vm(None).expect("lookup failed");
//! if let Some(vm_id) = report.vm_id {
//!     println!("{} -> {}", report.distribution_id, vm_id);
//! }
//! ```

use serde::Serialize;

use crate::distribution::DistributionConfiguration;
use crate::errors::WslVmError;
use crate::guid::Guid;

/// Everything learned about one distribution in a single session.
#[derive(Debug, Clone, Serialize)]
pub struct VmReport {
    pub distribution_id: Guid,
    /// Only set for WSL2 distributions, where an interop process is launched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiated_distribution_id: Option<Guid>,
    /// LX instance id (the WSL2 utility VM id).  WSL1 has no utility VM.
    pub vm_id: Option<Guid>,
    pub wsl_version: u32,
    pub windows_build: u32,
    pub configuration: DistributionConfiguration,
}

#[cfg(windows)]
mod imp {
    use super::*;
    use crate::session::LxssSession;

    pub fn query_vm(distribution: Option<&str>) -> Result<VmReport, WslVmError> {
        let session = LxssSession::connect()?;
        let distribution_id = session.resolve_distribution(distribution)?;
        let configuration = session.configuration(&distribution_id)?;
        let launch = if configuration.is_wsl2() {
            Some(session.launch_interop(&distribution_id)?)
        } else {
            log::debug!("distribution {distribution_id} is WSL1; no utility VM to query");
            None
        };

        Ok(VmReport {
            distribution_id,
            initiated_distribution_id: launch.map(|l| l.initiated_distribution_id),
            vm_id: launch.map(|l| l.instance_id),
            wsl_version: configuration.wsl_version(),
            windows_build: session.build(),
            configuration,
        })
    }

    pub fn is_wsl_two(distribution: Option<&str>) -> Result<(Guid, bool), WslVmError> {
        LxssSession::connect()?.is_wsl_two(distribution)
    }

    pub fn get_vm_id(distribution_id: &Guid) -> Result<Guid, WslVmError> {
        let launch = LxssSession::connect()?.launch_interop(distribution_id)?;
        Ok(launch.instance_id)
    }
}

#[cfg(not(windows))]
mod imp {
    use super::*;

    fn unsupported() -> WslVmError {
        WslVmError::PlatformError("LxssUserSession is only available on Windows".to_owned())
    }

    pub fn query_vm(_distribution: Option<&str>) -> Result<VmReport, WslVmError> {
        Err(unsupported())
    }

    pub fn is_wsl_two(_distribution: Option<&str>) -> Result<(Guid, bool), WslVmError> {
        Err(unsupported())
    }

    pub fn get_vm_id(_distribution_id: &Guid) -> Result<Guid, WslVmError> {
        Err(unsupported())
    }
}

/// Resolve `distribution` (default when `None` or empty) and read its
/// configuration.  For WSL2 distributions an interop process is launched to
/// learn the utility VM id; WSL1 reports carry no VM id.
pub fn query_vm(distribution: Option<&str>) -> Result<VmReport, WslVmError> {
    imp::query_vm(distribution)
}

/// Resolve `distribution` and report whether it runs under WSL2.
pub fn is_wsl_two(distribution: Option<&str>) -> Result<(Guid, bool), WslVmError> {
    imp::is_wsl_two(distribution)
}

/// Launch an interop process in `distribution_id` and return the LX
/// instance (utility VM) id.
pub fn get_vm_id(distribution_id: &Guid) -> Result<Guid, WslVmError> {
    imp::get_vm_id(distribution_id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::DistributionFlags;

    #[test]
    fn test_vm_report_serialization() {
        let report = VmReport {
            distribution_id: Guid::from_u128(0x0b2a4d7e_1c3f_4a8b_9e6d_5f7a8b9c0d1e),
            initiated_distribution_id: Some(Guid::from_u128(0x0b2a4d7e_1c3f_4a8b_9e6d_5f7a8b9c0d1e)),
            vm_id: Some(Guid::from_u128(0xa1b2c3d4_e5f6_4789_8abc_def012345678)),
            wsl_version: 2,
            windows_build: 22631,
            configuration: DistributionConfiguration {
                name: "Ubuntu".into(),
                version: 2,
                default_uid: 1000,
                flags: DistributionFlags::from_bits(0xF),
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"vm_id\":\"A1B2C3D4-E5F6-4789-8ABC-DEF012345678\""));
        assert!(json.contains("\"wsl_version\":2"));
        assert!(json.contains("\"windows_build\":22631"));
        assert!(json.contains("\"name\":\"Ubuntu\""));
    }

    #[test]
    fn test_wsl1_report_has_no_vm_id() {
        let report = VmReport {
            distribution_id: Guid::from_u128(0x0b2a4d7e_1c3f_4a8b_9e6d_5f7a8b9c0d1e),
            initiated_distribution_id: None,
            vm_id: None,
            wsl_version: 1,
            windows_build: 19045,
            configuration: DistributionConfiguration {
                name: "Legacy".into(),
                flags: DistributionFlags::DEFAULT,
                ..Default::default()
            },
        };
        assert!(!report.configuration.is_wsl2());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"vm_id\":null"));
        assert!(!json.contains("initiated_distribution_id"));
        assert!(json.contains("\"wsl_version\":1"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_entry_points_unsupported_off_windows() {
        assert!(matches!(query_vm(None), Err(WslVmError::PlatformError(_))));
        assert!(matches!(is_wsl_two(Some("Ubuntu")), Err(WslVmError::PlatformError(_))));
        assert!(matches!(
            get_vm_id(&Guid::zeroed()),
            Err(WslVmError::PlatformError(_))
        ));
    }
}
