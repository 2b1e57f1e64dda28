//! `wslvm_core` -- WSL distribution and utility VM identity lookup.
//!
//! Talks to the `LxssManager` service through its undocumented
//! `ILxssUserSession` COM interface, whose method layouts change between
//! Windows builds 20211 and 21313.  Consumed by:
//! - `wslvm-cli` (the `wslvm-id` tool)
//! - `wslvm-ffi` (C ABI DLL for terminal bridges)
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`errors`] | `WslVmError` enum via `thiserror` |
//! | [`guid`] | ABI-compatible `Guid` with display/parse/serde |
//! | [`build`] | OS build detection and per-build vtable layout selection |
//! | [`flags`] | `WSL_DISTRIBUTION_FLAGS` and the WSL2 heuristic |
//! | [`distribution`] | Owned distribution configuration snapshot |
//! | [`vmid`] | High-level `query_vm` / `is_wsl_two` / `get_vm_id` |
//! | `com` | `COMGuard` RAII wrapper and process security init (Windows) |
//! | `lxss` | `ILxssUserSession` interface definition (Windows) |
//! | `console` | Attached console host handle lookup (Windows) |
//! | `session` | `LxssSession` calls into the service (Windows) |

pub mod build;
pub mod distribution;
pub mod errors;
pub mod flags;
pub mod guid;
pub mod vmid;

#[cfg(windows)]
pub mod com;
#[cfg(windows)]
pub mod console;
#[cfg(windows)]
pub mod lxss;
#[cfg(windows)]
pub mod session;

pub use errors::WslVmError;
pub use guid::Guid;
pub use vmid::{get_vm_id, is_wsl_two, query_vm, VmReport};
