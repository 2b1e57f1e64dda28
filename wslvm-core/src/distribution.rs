//! Owned snapshot of a distribution's configuration.

use serde::Serialize;

use crate::flags::DistributionFlags;

/// Name to look up with `GetDistributionId`.
///
/// `None` and the empty string both select the default distribution and
/// map to `None`.
pub fn requested_name(name: Option<&str>) -> Option<&str> {
    name.filter(|n| !n.is_empty())
}

/// Configuration reported by `GetDistributionConfiguration`.
///
/// All strings are copied out of CoTaskMem allocations, so the snapshot is
/// fully owned and `Send`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionConfiguration {
    pub name: String,
    /// Registration version field as reported by the service.
    pub version: u32,
    pub default_uid: u32,
    pub flags: DistributionFlags,
    pub default_environment: Vec<String>,
    /// Install directory; only reported before build 21313.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// Only reported before build 21313.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_command_line: Option<String>,
}

impl DistributionConfiguration {
    pub fn is_wsl2(&self) -> bool {
        self.flags.is_wsl2()
    }

    /// WSL major version: 2 when [`DistributionFlags::is_wsl2`] holds, else 1.
    pub fn wsl_version(&self) -> u32 {
        if self.is_wsl2() {
            2
        } else {
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(flags: u32) -> DistributionConfiguration {
        DistributionConfiguration {
            name: "Ubuntu".into(),
            version: 2,
            default_uid: 1000,
            flags: DistributionFlags::from_bits(flags),
            default_environment: vec!["HOSTTYPE=x86_64".into(), "TERM=xterm-256color".into()],
            base_path: None,
            kernel_command_line: None,
        }
    }

    #[test]
    fn test_requested_name_default_selection() {
        assert_eq!(requested_name(None), None);
        assert_eq!(requested_name(Some("")), None);
        assert_eq!(requested_name(Some("Ubuntu")), Some("Ubuntu"));
    }

    #[test]
    fn test_wsl_version_follows_flags() {
        assert_eq!(sample(0x7).wsl_version(), 1);
        assert_eq!(sample(0xF).wsl_version(), 2);
    }

    #[test]
    fn test_configuration_serialization_skips_missing_paths() {
        let json = serde_json::to_string(&sample(0xF)).unwrap();
        assert!(json.contains("\"name\":\"Ubuntu\""));
        assert!(json.contains("\"flags\":15"));
        assert!(json.contains("TERM=xterm-256color"));
        assert!(!json.contains("base_path"));
        assert!(!json.contains("kernel_command_line"));
    }

    #[test]
    fn test_configuration_serialization_with_legacy_paths() {
        let mut cfg = sample(0x7);
        cfg.base_path = Some(r"C:\Users\me\AppData\Local\Packages\Ubuntu\LocalState".into());
        cfg.kernel_command_line = Some("BOOT_IMAGE=/kernel init=/init".into());
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("base_path"));
        assert!(json.contains("BOOT_IMAGE"));
    }
}
