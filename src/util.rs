//! util
//!
//! Small conversion helpers shared by the binding modules.

use libc::c_int;
use std::ffi::CString;

use crate::error::Error;
use crate::raw;

/// Convert a bool to the C int convention.
pub(crate) fn cbool(b: bool) -> c_int {
    if b {
        1
    } else {
        0
    }
}

/// Copy a Rust string into a NUL-terminated C string.
///
/// An interior NUL is a malformed input, reported before any native call.
pub(crate) fn into_c_string(s: &str) -> Result<CString, Error> {
    CString::new(s).map_err(|_| Error::invalid(format!("string contains interior NUL: {s:?}")))
}

/// Owned `git_buf` disposed on every exit path.
pub(crate) struct Buf {
    raw: raw::git_buf,
}

impl Buf {
    pub(crate) fn new() -> Self {
        Self {
            raw: raw::git_buf {
                ptr: std::ptr::null_mut(),
                reserved: 0,
                size: 0,
            },
        }
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut raw::git_buf {
        &mut self.raw
    }

    /// Copy the buffer contents out of native memory.
    pub(crate) fn to_string_lossy(&self) -> String {
        if self.raw.ptr.is_null() {
            return String::new();
        }
        let bytes =
            unsafe { std::slice::from_raw_parts(self.raw.ptr as *const u8, self.raw.size) };
        String::from_utf8_lossy(bytes).into_owned()
    }
}

impl Drop for Buf {
    fn drop(&mut self) {
        unsafe { raw::git_buf_dispose(&mut self.raw) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbool_matches_c_convention() {
        assert_eq!(cbool(true), 1);
        assert_eq!(cbool(false), 0);
    }

    #[test]
    fn interior_nul_is_reported_not_truncated() {
        let err = into_c_string("refs/\0heads").unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::Invalid);
        assert!(into_c_string("refs/heads/main").is_ok());
    }

    #[test]
    fn empty_buf_reads_as_empty_string() {
        let buf = Buf::new();
        assert_eq!(buf.to_string_lossy(), "");
    }
}
