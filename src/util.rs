//! This file is for small helpers & utilities around the LSA C API that aren't exported by the
//! library.
use crate::error::{StoreOp, UserRightsError};
use std::ffi::c_void;
use std::io;
use std::slice::from_raw_parts;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::{LocalFree, HLOCAL, NTSTATUS, PSID};
use windows::Win32::Security::Authentication::Identity::{
    LsaFreeMemory, LsaNtStatusToWinError, LSA_UNICODE_STRING,
};

/* Not declared as NTSTATUS in the windows crate */
pub(crate) const STATUS_OBJECT_NAME_NOT_FOUND: NTSTATUS = NTSTATUS(0xC000_0034_u32 as i32);
pub(crate) const STATUS_NO_MORE_ENTRIES: NTSTATUS = NTSTATUS(0x8000_001A_u32 as i32);

/// Safe wrapper around LSA-allocated buffers to automatically free when going out of scope.
pub(crate) struct LsaBuffer<T>(pub(crate) *mut T);

impl<T> Drop for LsaBuffer<T> {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                LsaFreeMemory(Some(self.0 as *const c_void));
            }
        }
    }
}

/// A SID allocated by `ConvertStringSidToSidW`, released with `LocalFree`.
pub(crate) struct LocalSid(pub(crate) PSID);

impl Drop for LocalSid {
    fn drop(&mut self) {
        if !self.0 .0.is_null() {
            unsafe {
                let _ = LocalFree(HLOCAL(self.0 .0 as _));
            }
        }
    }
}

/// Map a failed NTSTATUS to the equivalent Windows error code.
pub(crate) fn check_status(status: NTSTATUS, op: StoreOp) -> Result<(), UserRightsError> {
    if status.0 >= 0 {
        return Ok(());
    }
    let code = unsafe { LsaNtStatusToWinError(status) };
    Err(UserRightsError::store(
        op,
        io::Error::from_raw_os_error(code as i32),
    ))
}

/// Win32 error code inside a `windows::core::Error` HRESULT.
pub(crate) fn win32_error(err: &windows::core::Error) -> io::Error {
    io::Error::from_raw_os_error(err.code().0 & 0xFFFF)
}

/// NUL-terminated UTF-16.
pub(crate) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(Some(0)).collect()
}

/// `PCWSTR` for an optional NUL-terminated buffer; NULL when absent.
pub(crate) fn pcwstr(s: Option<&Vec<u16>>) -> PCWSTR {
    s.map_or(PCWSTR::null(), |s| PCWSTR(s.as_ptr()))
}

/// Owned UTF-16 text that can be lent to LSA as an `LSA_UNICODE_STRING`.
pub(crate) struct UnicodeString(Vec<u16>);

impl UnicodeString {
    pub(crate) fn new(s: &str) -> UnicodeString {
        UnicodeString(s.encode_utf16().collect())
    }

    /// Borrows the buffer; must not outlive `self`.
    pub(crate) fn as_lsa(&self) -> LSA_UNICODE_STRING {
        let bytes = (self.0.len() * 2) as u16;
        LSA_UNICODE_STRING {
            Length: bytes,
            MaximumLength: bytes,
            Buffer: PWSTR(self.0.as_ptr() as *mut u16),
        }
    }
}

/// Copy out an `LSA_UNICODE_STRING`; `Length` is in bytes and there is no terminator.
pub(crate) fn from_lsa(s: &LSA_UNICODE_STRING) -> String {
    if s.Buffer.is_null() {
        return String::new();
    }
    let chars = unsafe { from_raw_parts(s.Buffer.0 as *const u16, (s.Length / 2) as usize) };
    String::from_utf16_lossy(chars)
}
