//! `WSL_DISTRIBUTION_FLAGS` as returned by `GetDistributionConfiguration`.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

/// Distribution behaviour flags.
///
/// Only the three documented bits have names.  The service also reports
/// undocumented higher bits (e.g. `0x8` for WSL2 distributions), which are
/// preserved in [`DistributionFlags::bits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DistributionFlags(u32);

impl DistributionFlags {
    pub const NONE: Self = Self(0);
    pub const ENABLE_INTEROP: Self = Self(1);
    pub const APPEND_NT_PATH: Self = Self(2);
    pub const ENABLE_DRIVE_MOUNTING: Self = Self(4);
    pub const DEFAULT: Self = Self(
        Self::ENABLE_INTEROP.0 | Self::APPEND_NT_PATH.0 | Self::ENABLE_DRIVE_MOUNTING.0,
    );

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the distribution runs under WSL2.
    ///
    /// Any value above [`DistributionFlags::DEFAULT`] means an undocumented
    /// bit is set, which the service only does for WSL2 distributions.
    pub const fn is_wsl2(self) -> bool {
        self.0 > Self::DEFAULT.0
    }
}

impl BitOr for DistributionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DistributionFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for DistributionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all_documented_bits() {
        assert_eq!(DistributionFlags::DEFAULT.bits(), 7);
        assert!(DistributionFlags::DEFAULT.contains(DistributionFlags::ENABLE_INTEROP));
        assert!(DistributionFlags::DEFAULT.contains(DistributionFlags::APPEND_NT_PATH));
        assert!(DistributionFlags::DEFAULT.contains(DistributionFlags::ENABLE_DRIVE_MOUNTING));
    }

    #[test]
    fn test_wsl2_heuristic() {
        assert!(!DistributionFlags::NONE.is_wsl2());
        assert!(!DistributionFlags::DEFAULT.is_wsl2());
        assert!(!(DistributionFlags::ENABLE_INTEROP | DistributionFlags::APPEND_NT_PATH).is_wsl2());
        assert!(DistributionFlags::from_bits(0xF).is_wsl2());
        assert!(DistributionFlags::from_bits(0x8).is_wsl2());
    }

    #[test]
    fn test_bitor_assign() {
        let mut flags = DistributionFlags::NONE;
        flags |= DistributionFlags::ENABLE_INTEROP;
        flags |= DistributionFlags::ENABLE_DRIVE_MOUNTING;
        assert_eq!(flags.bits(), 5);
        assert!(!flags.contains(DistributionFlags::APPEND_NT_PATH));
    }

    #[test]
    fn test_flags_display_and_serialization() {
        let flags = DistributionFlags::from_bits(0xF);
        assert_eq!(flags.to_string(), "0xF");
        assert_eq!(serde_json::to_string(&flags).unwrap(), "15");
    }
}
