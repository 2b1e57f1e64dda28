//! ABI-compatible GUID used for distribution and VM identifiers.
//!
//! [`Guid`] has the same `#[repr(C)]` layout as the Win32 `GUID`, so it can
//! be handed across the C ABI in `wslvm-ffi` and converted for free to
//! `windows::core::GUID` on Windows.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::errors::WslVmError;

/// A 128-bit identifier in Win32 `GUID` layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    /// The all-zero GUID.
    pub const fn zeroed() -> Self {
        Self {
            data1: 0,
            data2: 0,
            data3: 0,
            data4: [0; 8],
        }
    }

    /// Build from the big-endian integer form, e.g.
    /// `0x4f476546_b412_4579_b64c_123df331e3d6`.
    pub const fn from_u128(value: u128) -> Self {
        Self {
            data1: (value >> 96) as u32,
            data2: (value >> 80 & 0xffff) as u16,
            data3: (value >> 64 & 0xffff) as u16,
            data4: (value as u64).to_be_bytes(),
        }
    }

    pub const fn to_u128(&self) -> u128 {
        ((self.data1 as u128) << 96)
            | ((self.data2 as u128) << 80)
            | ((self.data3 as u128) << 64)
            | u64::from_be_bytes(self.data4) as u128
    }

    pub fn is_zero(&self) -> bool {
        self.to_u128() == 0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.data4;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.data1, self.data2, self.data3, d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7]
        )
    }
}

impl FromStr for Guid {
    type Err = WslVmError;

    /// Parse `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`, optionally in braces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WslVmError::ConfigurationError(format!("invalid GUID: {s:?}"));

        let trimmed = s.trim();
        let inner = match trimmed.strip_prefix('{') {
            Some(rest) => rest.strip_suffix('}').ok_or_else(invalid)?,
            None => trimmed,
        };

        let groups: Vec<&str> = inner.split('-').collect();
        let lengths = [8, 4, 4, 4, 12];
        if groups.len() != lengths.len()
            || groups.iter().zip(lengths).any(|(g, len)| g.len() != len)
        {
            return Err(invalid());
        }

        let hex: String = groups.concat();
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u128::from_str_radix(&hex, 16).map_err(|_| invalid())?;
        Ok(Guid::from_u128(value))
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(windows)]
impl From<windows::core::GUID> for Guid {
    fn from(g: windows::core::GUID) -> Self {
        Self {
            data1: g.data1,
            data2: g.data2,
            data3: g.data3,
            data4: g.data4,
        }
    }
}

#[cfg(windows)]
impl From<Guid> for windows::core::GUID {
    fn from(g: Guid) -> Self {
        windows::core::GUID::from_values(g.data1, g.data2, g.data3, g.data4)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LXSS_CLSID: u128 = 0x4f476546_b412_4579_b64c_123df331e3d6;

    #[test]
    fn test_guid_fields_from_u128() {
        let g = Guid::from_u128(LXSS_CLSID);
        assert_eq!(g.data1, 0x4F47_6546);
        assert_eq!(g.data2, 0xB412);
        assert_eq!(g.data3, 0x4579);
        assert_eq!(g.data4, [0xB6, 0x4C, 0x12, 0x3D, 0xF3, 0x31, 0xE3, 0xD6]);
        assert_eq!(g.to_u128(), LXSS_CLSID);
    }

    #[test]
    fn test_guid_display() {
        let g = Guid::from_u128(LXSS_CLSID);
        assert_eq!(g.to_string(), "4F476546-B412-4579-B64C-123DF331E3D6");
    }

    #[test]
    fn test_guid_parse_braced_lowercase() {
        let g: Guid = "{4f476546-b412-4579-b64c-123df331e3d6}".parse().unwrap();
        assert_eq!(g, Guid::from_u128(LXSS_CLSID));
    }

    #[test]
    fn test_guid_parse_rejects_malformed() {
        assert!("4F476546-B412-4579-B64C".parse::<Guid>().is_err());
        assert!("{4F476546-B412-4579-B64C-123DF331E3D6".parse::<Guid>().is_err());
        assert!("4F47654G-B412-4579-B64C-123DF331E3D6".parse::<Guid>().is_err());
        assert!("+F476546-B412-4579-B64C-123DF331E3D6".parse::<Guid>().is_err());
        assert!("".parse::<Guid>().is_err());
    }

    #[test]
    fn test_guid_serializes_as_string() {
        let json = serde_json::to_string(&Guid::from_u128(LXSS_CLSID)).unwrap();
        assert_eq!(json, "\"4F476546-B412-4579-B64C-123DF331E3D6\"");
    }

    #[test]
    fn test_guid_layout_matches_win32() {
        assert_eq!(std::mem::size_of::<Guid>(), 16);
        assert!(Guid::zeroed().is_zero());
        assert_eq!(Guid::default(), Guid::zeroed());
    }
}
