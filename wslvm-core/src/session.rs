//! Calls into the `LxssManager` service through [`ILxssUserSession`].
//!
//! # COM apartment model
//!
//! [`LxssSession::connect`] joins the MTA via [`COMGuard`], sets process
//! security, and creates the out-of-process session object.  The session
//! is `!Send`; use it on the thread that created it.
//!
//! # Build dispatch
//!
//! The OS build is read once at connect time.  Every versioned call picks
//! its union member from [`ConfigurationLayout`] / [`ProcessLayout`]; the
//! two layouts vary independently.

use std::ffi::c_void;

use windows::core::{Interface, GUID, HRESULT, PCSTR, PCWSTR, PSTR, PWSTR};
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Networking::WinSock::{closesocket, INVALID_SOCKET, SOCKET};
use windows::Win32::System::Com::{CoCreateInstance, CoTaskMemFree, CLSCTX_LOCAL_SERVER};

use crate::build::{current_build, ConfigurationLayout, ProcessLayout};
use crate::com::{initialize_security, COMGuard};
use crate::console::console_handle;
use crate::distribution::{requested_name, DistributionConfiguration};
use crate::errors::WslVmError;
use crate::flags::DistributionFlags;
use crate::guid::Guid;
use crate::lxss::{ILxssUserSession, LxssStdHandles, CLSID_LXSS_USER_SESSION};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Identifiers returned by a successful `CreateLxProcess`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteropLaunch {
    pub distribution_id: Guid,
    /// Distribution the service actually started.
    pub initiated_distribution_id: Guid,
    /// LX instance id; for WSL2 this is the utility VM id.
    pub instance_id: Guid,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check(hr: HRESULT, context: &str) -> Result<(), WslVmError> {
    if hr.is_ok() {
        Ok(())
    } else {
        Err(WslVmError::from_hresult(hr.0, context))
    }
}

/// Copy a CoTaskMem wide string and free it.
unsafe fn take_wide(p: PWSTR) -> String {
    if p.is_null() {
        return String::new();
    }
    let s = String::from_utf16_lossy(unsafe { p.as_wide() });
    unsafe { CoTaskMemFree(Some(p.0 as *const c_void)) };
    s
}

/// Copy a CoTaskMem narrow string and free it.
unsafe fn take_narrow(p: PSTR) -> String {
    if p.is_null() {
        return String::new();
    }
    let s = String::from_utf8_lossy(unsafe { p.as_bytes() }).into_owned();
    unsafe { CoTaskMemFree(Some(p.0 as *const c_void)) };
    s
}

/// Copy a CoTaskMem array of `count` narrow strings, freeing each entry and
/// the array itself.
unsafe fn take_narrow_array(array: *mut PSTR, count: u32) -> Vec<String> {
    if array.is_null() {
        return Vec::new();
    }
    let entries = unsafe { std::slice::from_raw_parts(array, count as usize) };
    let strings = entries
        .iter()
        .map(|&p| unsafe { take_narrow(p) })
        .collect();
    unsafe { CoTaskMemFree(Some(array as *const c_void)) };
    strings
}

fn to_wide_nul(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// A socket slot `CreateLxProcess` actually filled.
fn is_open_socket(socket: SOCKET) -> bool {
    socket.0 != 0 && socket != INVALID_SOCKET
}

/// A handle slot `CreateLxProcess` actually filled (neither null nor `-1`).
fn is_open_handle(handle: HANDLE) -> bool {
    !handle.is_invalid()
}

/// Handles and sockets handed back by `CreateLxProcess`.
///
/// Closing them ends the extra shell process the call spawns; only the ids
/// are wanted.  Null / invalid entries are skipped.
struct InteropChannels {
    process: HANDLE,
    server: HANDLE,
    std_in: SOCKET,
    std_out: SOCKET,
    std_err: SOCKET,
    server_socket: SOCKET,
}

impl Default for InteropChannels {
    fn default() -> Self {
        Self {
            process: HANDLE::default(),
            server: HANDLE::default(),
            std_in: SOCKET(0),
            std_out: SOCKET(0),
            std_err: SOCKET(0),
            server_socket: SOCKET(0),
        }
    }
}

impl Drop for InteropChannels {
    fn drop(&mut self) {
        for socket in [self.std_in, self.std_out, self.std_err, self.server_socket] {
            if is_open_socket(socket) {
                let _ = unsafe { closesocket(socket) };
            }
        }
        for handle in [self.process, self.server] {
            if is_open_handle(handle) {
                if let Err(e) = unsafe { CloseHandle(handle) } {
                    log::warn!("CloseHandle({:p}) failed: {e}", handle.0);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Connected `ILxssUserSession` plus the build it was opened on.
pub struct LxssSession {
    // Field order is drop order: release the interface before
    // `CoUninitialize` runs in the guard.
    session: ILxssUserSession,
    build: u32,
    _com: COMGuard,
}

impl LxssSession {
    /// Initialise COM and create the LxssManager user session.
    pub fn connect() -> Result<Self, WslVmError> {
        let com = COMGuard::init()?;
        initialize_security()?;

        let build = current_build()?;
        let session: ILxssUserSession =
            unsafe { CoCreateInstance(&CLSID_LXSS_USER_SESSION, None, CLSCTX_LOCAL_SERVER) }
                .map_err(|e| {
                    WslVmError::from_hresult(e.code().0, "CoCreateInstance(LxssUserSession)")
                })?;
        log::debug!("connected to LxssUserSession on build {build}");

        Ok(Self {
            session,
            build,
            _com: com,
        })
    }

    /// OS build captured at connect time.
    pub fn build(&self) -> u32 {
        self.build
    }

    /// Resolve a distribution name to its id.
    ///
    /// `None` or an empty name selects the default distribution.
    pub fn resolve_distribution(&self, name: Option<&str>) -> Result<Guid, WslVmError> {
        let vtable = self.session.vtable();
        let this = self.session.as_raw();
        let mut distro_id = GUID::zeroed();

        match requested_name(name) {
            None => {
                let hr = unsafe { (vtable.GetDefaultDistribution)(this, &mut distro_id) };
                check(hr, "default distribution")?;
            }
            Some(name) => {
                let wide = to_wide_nul(name);
                let hr = unsafe {
                    (vtable.GetDistributionId)(this, PCWSTR(wide.as_ptr()), 0, &mut distro_id)
                };
                check(hr, name)?;
            }
        }

        let distro_id = Guid::from(distro_id);
        log::debug!("distribution {:?} -> {distro_id}", name.unwrap_or(""));
        Ok(distro_id)
    }

    /// Read a distribution's configuration using the layout for this build.
    pub fn configuration(&self, distro_id: &Guid) -> Result<DistributionConfiguration, WslVmError> {
        let vtable = self.session.vtable();
        let this = self.session.as_raw();
        let id = GUID::from(*distro_id);

        let mut name = PWSTR::null();
        let mut version = 0u32;
        let mut base_path = PWSTR::null();
        let mut kernel_command_line = PSTR::null();
        let mut default_uid = 0u32;
        let mut environment_count = 0u32;
        let mut environment: *mut PSTR = std::ptr::null_mut();
        let mut flags = 0u32;

        let layout = ConfigurationLayout::for_build(self.build);
        let hr = unsafe {
            match layout {
                ConfigurationLayout::WithBasePath => (vtable
                    .GetDistributionConfiguration
                    .with_base_path)(
                    this,
                    &id,
                    &mut name,
                    &mut version,
                    &mut base_path,
                    &mut kernel_command_line,
                    &mut default_uid,
                    &mut environment_count,
                    &mut environment,
                    &mut flags,
                ),
                ConfigurationLayout::Compact => (vtable.GetDistributionConfiguration.compact)(
                    this,
                    &id,
                    &mut name,
                    &mut version,
                    &mut default_uid,
                    &mut environment_count,
                    &mut environment,
                    &mut flags,
                ),
            }
        };
        if hr.is_err() {
            return Err(WslVmError::ConfigurationError(format!(
                "GetDistributionConfiguration({distro_id}, {layout:?}): HRESULT 0x{:08X}",
                hr.0 as u32
            )));
        }

        // Take ownership of every out allocation before anything can fail.
        let config = unsafe {
            let name = take_wide(name);
            let base_path = take_wide(base_path);
            let kernel_command_line = take_narrow(kernel_command_line);
            let default_environment = take_narrow_array(environment, environment_count);
            let legacy = layout == ConfigurationLayout::WithBasePath;
            DistributionConfiguration {
                name,
                version,
                default_uid,
                flags: DistributionFlags::from_bits(flags),
                default_environment,
                base_path: legacy.then_some(base_path),
                kernel_command_line: legacy.then_some(kernel_command_line),
            }
        };

        log::debug!(
            "distribution {distro_id}: name={:?} version={} uid={} flags={}",
            config.name,
            config.version,
            config.default_uid,
            config.flags
        );
        Ok(config)
    }

    /// Resolve `name` and report whether it runs under WSL2.
    pub fn is_wsl_two(&self, name: Option<&str>) -> Result<(Guid, bool), WslVmError> {
        let distro_id = self.resolve_distribution(name)?;
        let config = self.configuration(&distro_id)?;
        Ok((distro_id, config.is_wsl2()))
    }

    /// Start an interop process in the distribution and collect its ids.
    ///
    /// The call attaches to this process's console, which also boots the
    /// utility VM if it is not running.  All returned handles and sockets
    /// are closed before returning.
    pub fn launch_interop(&self, distro_id: &Guid) -> Result<InteropLaunch, WslVmError> {
        let vtable = self.session.vtable();
        let this = self.session.as_raw();
        let id = GUID::from(*distro_id);

        let console = console_handle()?;
        let std_handles = LxssStdHandles::default();
        let mut initiated_distro_id = GUID::zeroed();
        let mut instance_id = GUID::zeroed();
        let mut channels = InteropChannels::default();

        let layout = ProcessLayout::for_build(self.build);
        log::debug!("CreateLxProcess({distro_id}, {layout:?}, console={console:#x})");

        let hr = unsafe {
            match layout {
                ProcessLayout::Legacy => (vtable.CreateLxProcess.legacy)(
                    this,
                    &id,
                    PCSTR::null(),
                    0,
                    std::ptr::null(),
                    PCWSTR::null(),
                    PCWSTR::null(),
                    PCWSTR::null(),
                    0,
                    PCWSTR::null(),
                    0,
                    0,
                    console,
                    &std_handles,
                    &mut initiated_distro_id,
                    &mut instance_id,
                    &mut channels.process,
                    &mut channels.server,
                    &mut channels.std_in,
                    &mut channels.std_out,
                    &mut channels.std_err,
                    &mut channels.server_socket,
                ),
                ProcessLayout::WithFlags => (vtable.CreateLxProcess.with_flags)(
                    this,
                    &id,
                    PCSTR::null(),
                    0,
                    std::ptr::null(),
                    PCWSTR::null(),
                    PCWSTR::null(),
                    PCWSTR::null(),
                    0,
                    PCWSTR::null(),
                    0,
                    0,
                    console,
                    &std_handles,
                    0,
                    &mut initiated_distro_id,
                    &mut instance_id,
                    &mut channels.process,
                    &mut channels.server,
                    &mut channels.std_in,
                    &mut channels.std_out,
                    &mut channels.std_err,
                    &mut channels.server_socket,
                ),
            }
        };
        drop(channels);

        if hr.is_err() {
            return Err(WslVmError::from_hresult(hr.0, &distro_id.to_string()).into_launch_error());
        }

        let launch = InteropLaunch {
            distribution_id: *distro_id,
            initiated_distribution_id: Guid::from(initiated_distro_id),
            instance_id: Guid::from(instance_id),
        };
        log::debug!(
            "CreateLxProcess: initiated={} instance={}",
            launch.initiated_distribution_id,
            launch.instance_id
        );
        Ok(launch)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfilled_slots_are_not_closed() {
        let channels = InteropChannels::default();
        assert!(!is_open_socket(channels.std_in));
        assert!(!is_open_socket(channels.server_socket));
        assert!(!is_open_handle(channels.process));
        assert!(!is_open_handle(channels.server));
        // Nothing to close, so dropping is a no-op.
        drop(channels);
    }

    #[test]
    fn test_invalid_slots_are_skipped() {
        assert!(!is_open_socket(INVALID_SOCKET));
        assert!(!is_open_handle(HANDLE(-1isize as *mut c_void)));

        let channels = InteropChannels {
            process: HANDLE(-1isize as *mut c_void),
            server: HANDLE::default(),
            std_in: INVALID_SOCKET,
            std_out: INVALID_SOCKET,
            std_err: SOCKET(0),
            server_socket: INVALID_SOCKET,
        };
        drop(channels);
    }

    #[test]
    fn test_filled_slots_are_open() {
        assert!(is_open_socket(SOCKET(0x1a4)));
        assert!(is_open_handle(HANDLE(0x2c0 as *mut c_void)));
    }

    #[test]
    fn test_wide_name_is_nul_terminated() {
        let wide = to_wide_nul("Ubuntu");
        assert_eq!(wide.len(), 7);
        assert_eq!(wide.last(), Some(&0));
    }
}
