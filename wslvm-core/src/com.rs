//! COM apartment RAII guard and process-wide security setup.
//!
//! [`COMGuard`] wraps `CoInitializeEx` / `CoUninitialize` so the MTA is
//! balanced even on early return.  [`initialize_security`] sets the
//! process security blanket LxssManager expects: delegation impersonation
//! with static cloaking, so the service sees the caller's token.
//!
//! The `PhantomData<*const ()>` field enforces `!Send` + `!Sync` at compile
//! time, preventing the guard from being moved across thread boundaries.

use windows::Win32::Foundation::RPC_E_TOO_LATE;
use windows::Win32::Security::PSECURITY_DESCRIPTOR;
use windows::Win32::System::Com::{
    CoInitializeEx, CoInitializeSecurity, CoUninitialize, COINIT_MULTITHREADED,
    EOAC_STATIC_CLOAKING, RPC_C_AUTHN_LEVEL_DEFAULT, RPC_C_IMP_LEVEL_DELEGATE,
};

use crate::errors::WslVmError;

/// RAII wrapper that calls `CoUninitialize` on `Drop` when appropriate.
///
/// Tracks whether `CoInitializeEx` actually succeeded (vs.
/// `RPC_E_CHANGED_MODE`) and only calls `CoUninitialize` when a balancing
/// call is required.
#[must_use = "COMGuard must be kept alive for the duration of COM usage"]
pub struct COMGuard {
    should_uninit: bool,
    _not_send: std::marker::PhantomData<*const ()>,
}

impl COMGuard {
    /// Initialise (or join) the thread's MTA COM apartment.
    pub fn init() -> Result<Self, WslVmError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };

        let hresult_value = hr.0 as u32;
        match hresult_value {
            // S_OK (newly initialised) or S_FALSE (already initialised).
            0x0 | 0x1 => Ok(Self {
                should_uninit: true,
                _not_send: std::marker::PhantomData,
            }),
            // RPC_E_CHANGED_MODE -- thread already has an STA.  The local
            // server is still reachable from it.
            0x8001_0106 => {
                log::warn!(
                    "CoInitializeEx: RPC_E_CHANGED_MODE -- thread already has STA apartment, \
                     using existing apartment instead of MTA"
                );
                Ok(Self {
                    should_uninit: false,
                    _not_send: std::marker::PhantomData,
                })
            }
            _ => Err(WslVmError::ComError(format!(
                "CoInitializeEx failed: HRESULT 0x{hresult_value:08X}"
            ))),
        }
    }
}

impl Drop for COMGuard {
    fn drop(&mut self) {
        if self.should_uninit {
            unsafe { CoUninitialize() };
        }
    }
}

/// Set the process-wide COM security blanket.
///
/// Security can be set only once per process; `RPC_E_TOO_LATE` means the
/// host already did so (or an earlier session did) and is accepted.
pub fn initialize_security() -> Result<(), WslVmError> {
    let result = unsafe {
        CoInitializeSecurity(
            PSECURITY_DESCRIPTOR::default(),
            -1,
            None,
            None,
            RPC_C_AUTHN_LEVEL_DEFAULT,
            RPC_C_IMP_LEVEL_DELEGATE,
            None,
            EOAC_STATIC_CLOAKING,
            None,
        )
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.code() == RPC_E_TOO_LATE => {
            log::warn!("CoInitializeSecurity: RPC_E_TOO_LATE -- keeping existing process security");
            Ok(())
        }
        Err(e) => Err(WslVmError::ComError(format!(
            "CoInitializeSecurity failed: HRESULT 0x{:08X}",
            e.code().0 as u32
        ))),
    }
}
