//! Handle of the console host attached to this process.
//!
//! `CreateLxProcess` binds the new Linux process to a console by the
//! `\Device\ConDrv\Connect` handle of the attached conhost.  That handle is
//! not exposed by any public API; it lives in the first reserved pointer of
//! `RTL_USER_PROCESS_PARAMETERS`, reached through the PEB.

use std::ffi::c_void;

use windows::Wdk::System::Threading::{NtQueryInformationProcess, ProcessBasicInformation};
use windows::Win32::System::Threading::{GetCurrentProcess, PEB, PROCESS_BASIC_INFORMATION};

use crate::errors::WslVmError;

/// Return the attached console's connect handle, truncated to 32 bits.
///
/// Kernel handles always fit in 32 bits, so the truncation is lossless.
/// Returns `0` for a process with no console.
pub fn console_handle() -> Result<u32, WslVmError> {
    let mut info = PROCESS_BASIC_INFORMATION::default();
    let mut returned = 0u32;
    let status = unsafe {
        NtQueryInformationProcess(
            GetCurrentProcess(),
            ProcessBasicInformation,
            &mut info as *mut PROCESS_BASIC_INFORMATION as *mut c_void,
            std::mem::size_of::<PROCESS_BASIC_INFORMATION>() as u32,
            &mut returned,
        )
    };
    if status.is_err() {
        return Err(WslVmError::ConsoleError(format!(
            "NtQueryInformationProcess failed: NTSTATUS 0x{:08X}",
            status.0 as u32
        )));
    }

    let peb: *const PEB = info.PebBaseAddress;
    if peb.is_null() {
        return Err(WslVmError::ConsoleError("PEB address is null".to_owned()));
    }

    // The PEB of the current process stays mapped for the process lifetime.
    let params = unsafe { (*peb).ProcessParameters };
    if params.is_null() {
        return Err(WslVmError::ConsoleError(
            "process parameters are null".to_owned(),
        ));
    }
    let handle = unsafe { (*params).Reserved2[0] };

    log::debug!("console connect handle: {handle:p}");
    Ok(handle as usize as u32)
}
