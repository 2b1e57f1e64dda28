//! `ILxssUserSession` COM interface exposed by the `LxssManager` service.
//!
//! The interface is undocumented and not described by any type library,
//! so the vtable is declared by hand.  Two slots exist in two shapes
//! depending on the OS build (see [`crate::build`]); they are declared as
//! unions and the caller picks the member matching the running build.
//! Slots this crate never calls are pointer-sized placeholders that only
//! keep the later offsets correct.

#![allow(non_snake_case, non_camel_case_types)]

use std::ffi::c_void;

use windows::core::{IUnknown, IUnknown_Vtbl, Interface, GUID, HRESULT, PCSTR, PCWSTR, PSTR, PWSTR};
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Networking::WinSock::SOCKET;

/// `CLSID_LxssUserSession`
pub const CLSID_LXSS_USER_SESSION: GUID = GUID::from_u128(0x4f476546_b412_4579_b64c_123df331e3d6);

/// `IID_ILxssUserSession`
pub const IID_ILXSS_USER_SESSION: GUID = GUID::from_u128(0x536a6bcf_fe04_41d9_b978_dcaca9a9b5b9);

// ---------------------------------------------------------------------------
// Standard handle block
// ---------------------------------------------------------------------------

/// How the service should treat one of the child's standard handles.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LxssHandleType(pub i32);

impl LxssHandleType {
    /// Use the console passed as `ConsoleHandle`.
    pub const CONSOLE: Self = Self(0);
    pub const INPUT: Self = Self(1);
    pub const OUTPUT: Self = Self(2);
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct LxssStdHandle {
    pub handle: u32,
    pub handle_type: LxssHandleType,
}

/// Standard handle block passed to `CreateLxProcess`.
///
/// The zeroed default routes stdin, stdout and stderr to the console; the
/// service rejects undefined values, so it must always be initialised.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct LxssStdHandles {
    pub std_in: LxssStdHandle,
    pub std_out: LxssStdHandle,
    pub std_err: LxssStdHandle,
}

// ---------------------------------------------------------------------------
// Versioned method signatures
// ---------------------------------------------------------------------------

/// `GetDistributionConfiguration` before build 21313.
pub type GetDistributionConfigurationWithBasePath = unsafe extern "system" fn(
    this: *mut c_void,
    distro_id: *const GUID,
    distribution_name: *mut PWSTR,
    version: *mut u32,
    base_path: *mut PWSTR,
    kernel_command_line: *mut PSTR,
    default_uid: *mut u32,
    environment_count: *mut u32,
    default_environment: *mut *mut PSTR,
    flags: *mut u32,
) -> HRESULT;

/// `GetDistributionConfiguration` from build 21313.
pub type GetDistributionConfigurationCompact = unsafe extern "system" fn(
    this: *mut c_void,
    distro_id: *const GUID,
    distribution_name: *mut PWSTR,
    version: *mut u32,
    default_uid: *mut u32,
    environment_count: *mut u32,
    default_environment: *mut *mut PSTR,
    flags: *mut u32,
) -> HRESULT;

/// `CreateLxProcess` before build 20211.
pub type CreateLxProcessLegacy = unsafe extern "system" fn(
    this: *mut c_void,
    distro_id: *const GUID,
    command_line: PCSTR,
    argument_count: u32,
    arguments: *const PCSTR,
    current_working_directory: PCWSTR,
    shared_environment: PCWSTR,
    process_environment: PCWSTR,
    environment_length: usize,
    linux_user_name: PCWSTR,
    window_width: u16,
    window_height: u16,
    console_handle: u32,
    std_handles: *const LxssStdHandles,
    initiated_distro_id: *mut GUID,
    lx_instance_id: *mut GUID,
    process_handle: *mut HANDLE,
    server_handle: *mut HANDLE,
    socket_in: *mut SOCKET,
    socket_out: *mut SOCKET,
    socket_err: *mut SOCKET,
    server_socket: *mut SOCKET,
) -> HRESULT;

/// `CreateLxProcess` from build 20211.
pub type CreateLxProcessWithFlags = unsafe extern "system" fn(
    this: *mut c_void,
    distro_id: *const GUID,
    command_line: PCSTR,
    argument_count: u32,
    arguments: *const PCSTR,
    current_working_directory: PCWSTR,
    shared_environment: PCWSTR,
    process_environment: PCWSTR,
    environment_length: usize,
    linux_user_name: PCWSTR,
    window_width: u16,
    window_height: u16,
    console_handle: u32,
    std_handles: *const LxssStdHandles,
    flags: u32,
    initiated_distro_id: *mut GUID,
    lx_instance_id: *mut GUID,
    process_handle: *mut HANDLE,
    server_handle: *mut HANDLE,
    socket_in: *mut SOCKET,
    socket_out: *mut SOCKET,
    socket_err: *mut SOCKET,
    server_socket: *mut SOCKET,
) -> HRESULT;

#[repr(C)]
#[derive(Clone, Copy)]
pub union GetDistributionConfigurationSlot {
    pub with_base_path: GetDistributionConfigurationWithBasePath,
    pub compact: GetDistributionConfigurationCompact,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union CreateLxProcessSlot {
    pub legacy: CreateLxProcessLegacy,
    pub with_flags: CreateLxProcessWithFlags,
}

// ---------------------------------------------------------------------------
// Interface
// ---------------------------------------------------------------------------

/// Unused vtable slot.
pub type Reserved = usize;

#[repr(C)]
pub struct ILxssUserSession_Vtbl {
    pub base__: IUnknown_Vtbl,
    pub CreateInstance:
        unsafe extern "system" fn(this: *mut c_void, distro_id: *const GUID, flags: u32) -> HRESULT,
    pub RegisterDistribution: Reserved,
    pub RegisterDistributionPipe: Reserved,
    pub GetDistributionId: unsafe extern "system" fn(
        this: *mut c_void,
        distribution_name: PCWSTR,
        enable_enumerate: u32,
        distro_id: *mut GUID,
    ) -> HRESULT,
    pub TerminateDistribution: Reserved,
    pub UnregisterDistribution: Reserved,
    pub ConfigureDistribution: Reserved,
    pub GetDistributionConfiguration: GetDistributionConfigurationSlot,
    pub GetDefaultDistribution:
        unsafe extern "system" fn(this: *mut c_void, distro_id: *mut GUID) -> HRESULT,
    pub SetDefaultDistribution: Reserved,
    pub EnumerateDistributions: Reserved,
    pub CreateLxProcess: CreateLxProcessSlot,
}

/// Smart pointer to the service's user session object.
///
/// Reference counting is inherited from [`IUnknown`]: clones `AddRef`,
/// drops `Release`.
#[repr(transparent)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ILxssUserSession(IUnknown);

unsafe impl Interface for ILxssUserSession {
    type Vtable = ILxssUserSession_Vtbl;
    const IID: GUID = IID_ILXSS_USER_SESSION;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
