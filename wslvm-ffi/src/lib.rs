//! C ABI DLL for wslvm -- loadable by terminal bridges or any FFI consumer.
//!
//! All exported functions follow the convention:
//! - Return `i32` status code: `WSLVM_OK=0`, `WSLVM_ERROR=-1`,
//!   `WSLVM_DISTRIBUTION_NOT_FOUND=-2`
//! - Distribution names are nullable UTF-8; null or empty selects the
//!   default distribution
//! - GUID out-parameters use the Win32 `GUID` layout
//! - String outputs allocated by Rust, freed via `wslvm_free_string()`
//! - Last error retrievable via `wslvm_last_error()`

use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString};
use std::ptr;

use wslvm_core::{Guid, WslVmError};

pub const WSLVM_OK: i32 = 0;
pub const WSLVM_ERROR: i32 = -1;
pub const WSLVM_DISTRIBUTION_NOT_FOUND: i32 = -2;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn fail(err: WslVmError) -> i32 {
    set_last_error(&err.to_string());
    if err.is_not_found() {
        WSLVM_DISTRIBUTION_NOT_FOUND
    } else {
        WSLVM_ERROR
    }
}

/// Read an optional distribution name.
///
/// # Safety
///
/// `name` must be null or a valid null-terminated C string.
unsafe fn read_name<'a>(name: *const c_char) -> Result<Option<&'a str>, i32> {
    if name.is_null() {
        return Ok(None);
    }
    match unsafe { CStr::from_ptr(name) }.to_str() {
        Ok(s) => Ok(Some(s)),
        Err(e) => {
            set_last_error(&format!("Invalid UTF-8: {e}"));
            Err(WSLVM_ERROR)
        }
    }
}

/// Retrieve the last error message (thread-local).
///
/// Returns a pointer valid until the next wslvm_* call on this thread.
/// Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn wslvm_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Free a string previously allocated by a wslvm_* function.
///
/// # Safety
///
/// `ptr` must be a pointer returned by a wslvm_* function or null.
#[no_mangle]
pub unsafe extern "C" fn wslvm_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

/// Resolve a distribution and report whether it runs under WSL2.
///
/// # Safety
///
/// `name` must be null or a valid null-terminated C string.
/// `out_distro_id` and `out_is_wsl2` must be valid writable pointers.
#[no_mangle]
pub unsafe extern "C" fn wslvm_is_wsl_two(
    name: *const c_char,
    out_distro_id: *mut Guid,
    out_is_wsl2: *mut bool,
) -> i32 {
    if out_distro_id.is_null() || out_is_wsl2.is_null() {
        set_last_error("null pointer argument");
        return WSLVM_ERROR;
    }
    let name = match unsafe { read_name(name) } {
        Ok(n) => n,
        Err(code) => return code,
    };

    match wslvm_core::is_wsl_two(name) {
        Ok((distro_id, is_wsl2)) => {
            unsafe {
                *out_distro_id = distro_id;
                *out_is_wsl2 = is_wsl2;
            }
            WSLVM_OK
        }
        Err(e) => fail(e),
    }
}

/// Launch an interop process in a distribution and return its VM id.
///
/// # Safety
///
/// `distro_id` must point to a valid GUID (as filled by
/// `wslvm_is_wsl_two`); `out_vm_id` must be a valid writable pointer.
#[no_mangle]
pub unsafe extern "C" fn wslvm_get_vm_id(distro_id: *const Guid, out_vm_id: *mut Guid) -> i32 {
    if distro_id.is_null() || out_vm_id.is_null() {
        set_last_error("null pointer argument");
        return WSLVM_ERROR;
    }

    match wslvm_core::get_vm_id(unsafe { &*distro_id }) {
        Ok(vm_id) => {
            unsafe { *out_vm_id = vm_id };
            WSLVM_OK
        }
        Err(e) => fail(e),
    }
}

/// Collect the full distribution / VM report as a JSON string.
///
/// # Safety
///
/// `name` must be null or a valid null-terminated C string.
/// `out_json` must be a valid pointer to a `*mut c_char`.
/// On success, `*out_json` is set to a heap-allocated JSON C string.
/// Caller must free with `wslvm_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn wslvm_query_json(name: *const c_char, out_json: *mut *mut c_char) -> i32 {
    if out_json.is_null() {
        set_last_error("out_json is null");
        return WSLVM_ERROR;
    }
    let name = match unsafe { read_name(name) } {
        Ok(n) => n,
        Err(code) => return code,
    };

    let report = match wslvm_core::query_vm(name) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    match serde_json::to_string(&report) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => {
                unsafe { *out_json = cstr.into_raw() };
                WSLVM_OK
            }
            Err(e) => {
                set_last_error(&format!("CString conversion failed: {e}"));
                WSLVM_ERROR
            }
        },
        Err(e) => {
            set_last_error(&format!("JSON serialization failed: {e}"));
            WSLVM_ERROR
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
