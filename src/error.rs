//! error
//!
//! Structured errors translated from libgit2 statuses.
//!
//! Every fallible native call returns a negative `c_int` and leaves detail in
//! a thread-local "last error" slot. [`Error::last_error`] folds both into a
//! single value carrying three things:
//!
//! - a human-readable message,
//! - an [`ErrorClass`] naming the subsystem that raised it,
//! - an [`ErrorCode`] naming the outcome kind.
//!
//! # Translation discipline
//!
//! The thread-local slot is overwritten by the next native call on the same
//! thread, so translation must happen immediately after the call that
//! produced the status. Everything in this crate follows that rule; nothing
//! else may run against the native library in between.
//!
//! # The iteration sentinel
//!
//! [`ErrorCode::IterOver`] is not a failure: it terminates iteration
//! protocols. Translating it never consults the thread-local slot, so an
//! unrelated pending error is left intact for its rightful consumer.

use libc::{c_char, c_int};
use std::ffi::CStr;
use thiserror::Error as ThisError;

use crate::raw;

/// The subsystem an error originated in.
///
/// Mirrors libgit2's `git_error_t` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    None,
    NoMemory,
    Os,
    Invalid,
    Reference,
    Zlib,
    Repository,
    Config,
    Regex,
    Odb,
    Index,
    Object,
    Net,
    Tag,
    Tree,
    Indexer,
    Ssl,
    Submodule,
    Thread,
    Stash,
    Checkout,
    FetchHead,
    Merge,
    Ssh,
    Filter,
    Revert,
    Callback,
    Rebase,
    Patch,
}

impl ErrorClass {
    pub(crate) fn from_raw(raw: c_int) -> Self {
        match raw {
            raw::GIT_ERROR_NONE => ErrorClass::None,
            raw::GIT_ERROR_NOMEMORY => ErrorClass::NoMemory,
            raw::GIT_ERROR_OS => ErrorClass::Os,
            raw::GIT_ERROR_INVALID => ErrorClass::Invalid,
            raw::GIT_ERROR_REFERENCE => ErrorClass::Reference,
            raw::GIT_ERROR_ZLIB => ErrorClass::Zlib,
            raw::GIT_ERROR_REPOSITORY => ErrorClass::Repository,
            raw::GIT_ERROR_CONFIG => ErrorClass::Config,
            raw::GIT_ERROR_REGEX => ErrorClass::Regex,
            raw::GIT_ERROR_ODB => ErrorClass::Odb,
            raw::GIT_ERROR_INDEX => ErrorClass::Index,
            raw::GIT_ERROR_OBJECT => ErrorClass::Object,
            raw::GIT_ERROR_NET => ErrorClass::Net,
            raw::GIT_ERROR_TAG => ErrorClass::Tag,
            raw::GIT_ERROR_TREE => ErrorClass::Tree,
            raw::GIT_ERROR_INDEXER => ErrorClass::Indexer,
            raw::GIT_ERROR_SSL => ErrorClass::Ssl,
            raw::GIT_ERROR_SUBMODULE => ErrorClass::Submodule,
            raw::GIT_ERROR_THREAD => ErrorClass::Thread,
            raw::GIT_ERROR_STASH => ErrorClass::Stash,
            raw::GIT_ERROR_CHECKOUT => ErrorClass::Checkout,
            raw::GIT_ERROR_FETCHHEAD => ErrorClass::FetchHead,
            raw::GIT_ERROR_MERGE => ErrorClass::Merge,
            raw::GIT_ERROR_SSH => ErrorClass::Ssh,
            raw::GIT_ERROR_FILTER => ErrorClass::Filter,
            raw::GIT_ERROR_REVERT => ErrorClass::Revert,
            raw::GIT_ERROR_CALLBACK => ErrorClass::Callback,
            raw::GIT_ERROR_REBASE => ErrorClass::Rebase,
            raw::GIT_ERROR_PATCH => ErrorClass::Patch,
            _ => ErrorClass::None,
        }
    }

    /// The raw class value.
    pub(crate) fn raw(&self) -> c_int {
        match self {
            ErrorClass::None => raw::GIT_ERROR_NONE,
            ErrorClass::NoMemory => raw::GIT_ERROR_NOMEMORY,
            ErrorClass::Os => raw::GIT_ERROR_OS,
            ErrorClass::Invalid => raw::GIT_ERROR_INVALID,
            ErrorClass::Reference => raw::GIT_ERROR_REFERENCE,
            ErrorClass::Zlib => raw::GIT_ERROR_ZLIB,
            ErrorClass::Repository => raw::GIT_ERROR_REPOSITORY,
            ErrorClass::Config => raw::GIT_ERROR_CONFIG,
            ErrorClass::Regex => raw::GIT_ERROR_REGEX,
            ErrorClass::Odb => raw::GIT_ERROR_ODB,
            ErrorClass::Index => raw::GIT_ERROR_INDEX,
            ErrorClass::Object => raw::GIT_ERROR_OBJECT,
            ErrorClass::Net => raw::GIT_ERROR_NET,
            ErrorClass::Tag => raw::GIT_ERROR_TAG,
            ErrorClass::Tree => raw::GIT_ERROR_TREE,
            ErrorClass::Indexer => raw::GIT_ERROR_INDEXER,
            ErrorClass::Ssl => raw::GIT_ERROR_SSL,
            ErrorClass::Submodule => raw::GIT_ERROR_SUBMODULE,
            ErrorClass::Thread => raw::GIT_ERROR_THREAD,
            ErrorClass::Stash => raw::GIT_ERROR_STASH,
            ErrorClass::Checkout => raw::GIT_ERROR_CHECKOUT,
            ErrorClass::FetchHead => raw::GIT_ERROR_FETCHHEAD,
            ErrorClass::Merge => raw::GIT_ERROR_MERGE,
            ErrorClass::Ssh => raw::GIT_ERROR_SSH,
            ErrorClass::Filter => raw::GIT_ERROR_FILTER,
            ErrorClass::Revert => raw::GIT_ERROR_REVERT,
            ErrorClass::Callback => raw::GIT_ERROR_CALLBACK,
            ErrorClass::Rebase => raw::GIT_ERROR_REBASE,
            ErrorClass::Patch => raw::GIT_ERROR_PATCH,
        }
    }

    /// Short name, matching the native enumeration with its prefix trimmed.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorClass::None => "None",
            ErrorClass::NoMemory => "NoMemory",
            ErrorClass::Os => "OS",
            ErrorClass::Invalid => "Invalid",
            ErrorClass::Reference => "Reference",
            ErrorClass::Zlib => "Zlib",
            ErrorClass::Repository => "Repository",
            ErrorClass::Config => "Config",
            ErrorClass::Regex => "Regex",
            ErrorClass::Odb => "Odb",
            ErrorClass::Index => "Index",
            ErrorClass::Object => "Object",
            ErrorClass::Net => "Net",
            ErrorClass::Tag => "Tag",
            ErrorClass::Tree => "Tree",
            ErrorClass::Indexer => "Indexer",
            ErrorClass::Ssl => "SSL",
            ErrorClass::Submodule => "Submodule",
            ErrorClass::Thread => "Thread",
            ErrorClass::Stash => "Stash",
            ErrorClass::Checkout => "Checkout",
            ErrorClass::FetchHead => "FetchHead",
            ErrorClass::Merge => "Merge",
            ErrorClass::Ssh => "SSH",
            ErrorClass::Filter => "Filter",
            ErrorClass::Revert => "Revert",
            ErrorClass::Callback => "Callback",
            ErrorClass::Rebase => "Rebase",
            ErrorClass::Patch => "Patch",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The outcome kind of a native operation.
///
/// Mirrors libgit2's `git_error_code` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The operation completed successfully. Never carried by a returned
    /// [`Error`]; present so callback results can round-trip a raw status.
    Ok,
    /// Generic failure.
    Generic,
    /// The requested object could not be found.
    NotFound,
    /// The object exists, preventing the operation.
    Exists,
    /// More than one object matches.
    Ambiguous,
    /// The output buffer is too short to hold the data.
    BufferTooShort,
    /// Never generated by libgit2; returned from a callback to mark the
    /// failure as originating on the managed side.
    User,
    /// The operation is not allowed on a bare repository.
    BareRepo,
    /// HEAD refers to a branch with no commits.
    UnbornBranch,
    /// A merge in progress prevented the operation.
    Unmerged,
    /// The reference was not fast-forwardable.
    NonFastForward,
    /// The name or refspec was not in a valid format.
    InvalidSpec,
    /// Checkout conflicts prevented the operation.
    Conflict,
    /// A lock file prevented the operation.
    Locked,
    /// The reference value does not match the expected one.
    Modified,
    /// Authentication failed.
    Auth,
    /// The server certificate is invalid.
    Certificate,
    /// The patch or merge has already been applied.
    Applied,
    /// The requested peel operation is not possible.
    Peel,
    /// Unexpected end of file.
    Eof,
    /// Invalid operation or input.
    Invalid,
    /// Uncommitted changes in the index prevented the operation.
    Uncommitted,
    /// The operation is not valid for a directory.
    Directory,
    /// A merge conflict exists and the operation cannot continue.
    MergeConflict,
    /// A user-configured callback refused to act.
    Passthrough,
    /// Iteration is complete. A sentinel, not a failure.
    IterOver,
    /// Internal retry marker.
    Retry,
    /// Hashsum mismatch in an object.
    HashMismatch,
    /// Unsaved changes in the index would be overwritten.
    IndexDirty,
    /// A patch application failed.
    ApplyFailed,
}

impl ErrorCode {
    pub(crate) fn from_raw(raw: c_int) -> Self {
        match raw {
            raw::GIT_OK => ErrorCode::Ok,
            raw::GIT_ERROR => ErrorCode::Generic,
            raw::GIT_ENOTFOUND => ErrorCode::NotFound,
            raw::GIT_EEXISTS => ErrorCode::Exists,
            raw::GIT_EAMBIGUOUS => ErrorCode::Ambiguous,
            raw::GIT_EBUFS => ErrorCode::BufferTooShort,
            raw::GIT_EUSER => ErrorCode::User,
            raw::GIT_EBAREREPO => ErrorCode::BareRepo,
            raw::GIT_EUNBORNBRANCH => ErrorCode::UnbornBranch,
            raw::GIT_EUNMERGED => ErrorCode::Unmerged,
            raw::GIT_ENONFASTFORWARD => ErrorCode::NonFastForward,
            raw::GIT_EINVALIDSPEC => ErrorCode::InvalidSpec,
            raw::GIT_ECONFLICT => ErrorCode::Conflict,
            raw::GIT_ELOCKED => ErrorCode::Locked,
            raw::GIT_EMODIFIED => ErrorCode::Modified,
            raw::GIT_EAUTH => ErrorCode::Auth,
            raw::GIT_ECERTIFICATE => ErrorCode::Certificate,
            raw::GIT_EAPPLIED => ErrorCode::Applied,
            raw::GIT_EPEEL => ErrorCode::Peel,
            raw::GIT_EEOF => ErrorCode::Eof,
            raw::GIT_EINVALID => ErrorCode::Invalid,
            raw::GIT_EUNCOMMITTED => ErrorCode::Uncommitted,
            raw::GIT_EDIRECTORY => ErrorCode::Directory,
            raw::GIT_EMERGECONFLICT => ErrorCode::MergeConflict,
            raw::GIT_PASSTHROUGH => ErrorCode::Passthrough,
            raw::GIT_ITEROVER => ErrorCode::IterOver,
            raw::GIT_RETRY => ErrorCode::Retry,
            raw::GIT_EMISMATCH => ErrorCode::HashMismatch,
            raw::GIT_EINDEXDIRTY => ErrorCode::IndexDirty,
            raw::GIT_EAPPLYFAIL => ErrorCode::ApplyFailed,
            _ => ErrorCode::Generic,
        }
    }

    /// The raw status value for this code.
    pub fn raw(&self) -> c_int {
        match self {
            ErrorCode::Ok => raw::GIT_OK,
            ErrorCode::Generic => raw::GIT_ERROR,
            ErrorCode::NotFound => raw::GIT_ENOTFOUND,
            ErrorCode::Exists => raw::GIT_EEXISTS,
            ErrorCode::Ambiguous => raw::GIT_EAMBIGUOUS,
            ErrorCode::BufferTooShort => raw::GIT_EBUFS,
            ErrorCode::User => raw::GIT_EUSER,
            ErrorCode::BareRepo => raw::GIT_EBAREREPO,
            ErrorCode::UnbornBranch => raw::GIT_EUNBORNBRANCH,
            ErrorCode::Unmerged => raw::GIT_EUNMERGED,
            ErrorCode::NonFastForward => raw::GIT_ENONFASTFORWARD,
            ErrorCode::InvalidSpec => raw::GIT_EINVALIDSPEC,
            ErrorCode::Conflict => raw::GIT_ECONFLICT,
            ErrorCode::Locked => raw::GIT_ELOCKED,
            ErrorCode::Modified => raw::GIT_EMODIFIED,
            ErrorCode::Auth => raw::GIT_EAUTH,
            ErrorCode::Certificate => raw::GIT_ECERTIFICATE,
            ErrorCode::Applied => raw::GIT_EAPPLIED,
            ErrorCode::Peel => raw::GIT_EPEEL,
            ErrorCode::Eof => raw::GIT_EEOF,
            ErrorCode::Invalid => raw::GIT_EINVALID,
            ErrorCode::Uncommitted => raw::GIT_EUNCOMMITTED,
            ErrorCode::Directory => raw::GIT_EDIRECTORY,
            ErrorCode::MergeConflict => raw::GIT_EMERGECONFLICT,
            ErrorCode::Passthrough => raw::GIT_PASSTHROUGH,
            ErrorCode::IterOver => raw::GIT_ITEROVER,
            ErrorCode::Retry => raw::GIT_RETRY,
            ErrorCode::HashMismatch => raw::GIT_EMISMATCH,
            ErrorCode::IndexDirty => raw::GIT_EINDEXDIRTY,
            ErrorCode::ApplyFailed => raw::GIT_EAPPLYFAIL,
        }
    }

    /// Short name, matching the native enumeration with its prefix trimmed.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "OK",
            ErrorCode::Generic => "Generic",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::Exists => "Exists",
            ErrorCode::Ambiguous => "Ambiguous",
            ErrorCode::BufferTooShort => "BufferTooShort",
            ErrorCode::User => "User",
            ErrorCode::BareRepo => "BareRepo",
            ErrorCode::UnbornBranch => "UnbornBranch",
            ErrorCode::Unmerged => "Unmerged",
            ErrorCode::NonFastForward => "NonFastForward",
            ErrorCode::InvalidSpec => "InvalidSpec",
            ErrorCode::Conflict => "Conflict",
            ErrorCode::Locked => "Locked",
            ErrorCode::Modified => "Modified",
            ErrorCode::Auth => "Auth",
            ErrorCode::Certificate => "Certificate",
            ErrorCode::Applied => "Applied",
            ErrorCode::Peel => "Peel",
            ErrorCode::Eof => "EOF",
            ErrorCode::Invalid => "Invalid",
            ErrorCode::Uncommitted => "Uncommitted",
            ErrorCode::Directory => "Directory",
            ErrorCode::MergeConflict => "MergeConflict",
            ErrorCode::Passthrough => "Passthrough",
            ErrorCode::IterOver => "IterOver",
            ErrorCode::Retry => "Retry",
            ErrorCode::HashMismatch => "HashMismatch",
            ErrorCode::IndexDirty => "IndexDirty",
            ErrorCode::ApplyFailed => "ApplyFailed",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A structured error from a native operation.
///
/// Immutable once created. `Display` is the message alone; class and code
/// are inspected through their accessors.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("{message}")]
pub struct Error {
    message: String,
    class: ErrorClass,
    code: ErrorCode,
}

impl Error {
    /// Create an error with an explicit class, code and message.
    pub fn new(class: ErrorClass, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class,
            code,
        }
    }

    /// A malformed-input error detected before any native call.
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Invalid, ErrorCode::Invalid, message)
    }

    /// Translate a failing native status into a structured error.
    ///
    /// Must be called immediately after the native call that produced
    /// `status`, before any other native call on this thread: the
    /// thread-local last-error slot this reads is overwritten by the next
    /// call. `GIT_ITEROVER` is translated without touching that slot, so
    /// an unrelated pending error survives.
    ///
    /// Callers guarantee `status < 0`; a success status never produces an
    /// error value.
    pub(crate) fn last_error(status: c_int) -> Self {
        let code = ErrorCode::from_raw(status);
        let mut class = ErrorClass::None;
        let mut message = String::new();

        if code != ErrorCode::IterOver {
            let last = unsafe { raw::git_error_last() };
            if !last.is_null() {
                let last = unsafe { &*last };
                if !last.message.is_null() {
                    message = unsafe { CStr::from_ptr(last.message) }
                        .to_string_lossy()
                        .into_owned();
                }
                class = ErrorClass::from_raw(last.klass);
            } else {
                class = ErrorClass::Invalid;
            }
        }

        if message.is_empty() {
            message = code.name().to_string();
        }

        Self {
            message,
            class,
            code,
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The subsystem the error originated in.
    pub fn class(&self) -> ErrorClass {
        self.class
    }

    /// The outcome kind.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// True if the error carries the given class.
    pub fn is_class(&self, class: ErrorClass) -> bool {
        self.class == class
    }

    /// True if the error carries the given code.
    pub fn is_code(&self, code: ErrorCode) -> bool {
        self.code == code
    }

    /// The raw status value for this error's code.
    pub fn raw_code(&self) -> c_int {
        self.code.raw()
    }
}

/// Check a native status: `Ok(status)` when non-negative, otherwise the
/// translated error. The translation rules of [`Error::last_error`] apply.
pub(crate) fn check(status: c_int) -> Result<c_int, Error> {
    if status >= 0 {
        Ok(status)
    } else {
        Err(Error::last_error(status))
    }
}

/// Report a callback result back to the native library.
///
/// On failure, writes a message allocated with the C allocator into
/// `*message_out` (the native side frees it) and returns the structured
/// error's raw code — or `GIT_EUSER` when the code cannot stand for a
/// failure — so the native library can round-trip the outcome. On success
/// leaves `*message_out` untouched and returns `GIT_OK`.
///
/// # Safety
///
/// `message_out` must be a valid pointer to a writable `char *` slot.
pub unsafe fn into_callback_status(
    message_out: *mut *mut c_char,
    result: Result<(), Error>,
) -> c_int {
    match result {
        Ok(()) => raw::GIT_OK,
        Err(err) => {
            *message_out = cstrdup(err.message());
            match err.code() {
                ErrorCode::Ok => raw::GIT_EUSER,
                code => code.raw(),
            }
        }
    }
}

/// Copy a Rust string into a `malloc`-allocated, NUL-terminated C string.
/// Interior NULs are dropped so the copy never truncates silently mid-way.
fn cstrdup(s: &str) -> *mut c_char {
    let bytes: Vec<u8> = s.bytes().filter(|&b| b != 0).collect();
    unsafe {
        let ptr = libc::malloc(bytes.len() + 1) as *mut u8;
        if ptr.is_null() {
            return std::ptr::null_mut();
        }
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
        *ptr.add(bytes.len()) = 0;
        ptr as *mut c_char
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn set_native_error(class: c_int, message: &str) {
        crate::test_support::init();
        let msg = CString::new(message).unwrap();
        unsafe {
            raw::git_error_set_str(class, msg.as_ptr());
        }
    }

    mod enums {
        use super::*;

        #[test]
        fn class_round_trips_through_raw() {
            assert_eq!(
                ErrorClass::from_raw(raw::GIT_ERROR_REFERENCE),
                ErrorClass::Reference
            );
            assert_eq!(ErrorClass::from_raw(raw::GIT_ERROR_SSL), ErrorClass::Ssl);
            assert_eq!(ErrorClass::from_raw(9999), ErrorClass::None);
        }

        #[test]
        fn code_round_trips_through_raw() {
            assert_eq!(ErrorCode::from_raw(raw::GIT_ENOTFOUND), ErrorCode::NotFound);
            assert_eq!(ErrorCode::NotFound.raw(), raw::GIT_ENOTFOUND);
            assert_eq!(ErrorCode::from_raw(raw::GIT_ITEROVER), ErrorCode::IterOver);
            assert_eq!(ErrorCode::from_raw(-9999), ErrorCode::Generic);
        }

        #[test]
        fn display_names() {
            assert_eq!(ErrorCode::IterOver.to_string(), "IterOver");
            assert_eq!(ErrorCode::NotFound.to_string(), "NotFound");
            assert_eq!(ErrorClass::Reference.to_string(), "Reference");
        }
    }

    mod translate {
        use super::*;

        #[test]
        fn reads_thread_local_message_and_class() {
            set_native_error(raw::GIT_ERROR_REFERENCE, "not found");

            let err = Error::last_error(raw::GIT_ENOTFOUND);
            assert_eq!(err.message(), "not found");
            assert_eq!(err.class(), ErrorClass::Reference);
            assert_eq!(err.code(), ErrorCode::NotFound);
            assert!(err.is_class(ErrorClass::Reference));
            assert!(err.is_code(ErrorCode::NotFound));
        }

        #[test]
        fn iter_over_skips_thread_local_state() {
            // Plant an unrelated error; translating the sentinel must not
            // consume or reflect it.
            set_native_error(raw::GIT_ERROR_CONFIG, "unrelated pending error");

            let err = Error::last_error(raw::GIT_ITEROVER);
            assert_eq!(err.code(), ErrorCode::IterOver);
            assert_eq!(err.class(), ErrorClass::None);
            assert_eq!(err.message(), "IterOver");

            // The pending error is still there for its rightful consumer.
            let pending = Error::last_error(raw::GIT_ERROR);
            assert_eq!(pending.message(), "unrelated pending error");
            assert_eq!(pending.class(), ErrorClass::Config);
        }

        #[test]
        fn check_passes_non_negative_statuses_through() {
            assert_eq!(check(0), Ok(0));
            assert_eq!(check(7), Ok(7));
            set_native_error(raw::GIT_ERROR_NET, "boom");
            assert!(check(raw::GIT_ERROR).is_err());
        }

        #[test]
        fn display_is_the_message() {
            let err = Error::new(ErrorClass::Net, ErrorCode::Auth, "denied");
            assert_eq!(err.to_string(), "denied");
        }
    }

    mod callback_convention {
        use super::*;
        use std::ffi::CStr;
        use std::ptr;

        #[test]
        fn success_returns_ok_and_leaves_message_alone() {
            let mut out: *mut c_char = ptr::null_mut();
            let status = unsafe { into_callback_status(&mut out, Ok(())) };
            assert_eq!(status, raw::GIT_OK);
            assert!(out.is_null());
        }

        #[test]
        fn structured_error_propagates_its_code() {
            let mut out: *mut c_char = ptr::null_mut();
            let err = Error::new(ErrorClass::Net, ErrorCode::Auth, "bad credentials");
            let status = unsafe { into_callback_status(&mut out, Err(err)) };
            assert_eq!(status, raw::GIT_EAUTH);
            assert!(!out.is_null());
            let msg = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
            assert_eq!(msg, "bad credentials");
            unsafe { libc::free(out as *mut libc::c_void) };
        }

        #[test]
        fn non_failure_code_maps_to_user_error() {
            let mut out: *mut c_char = ptr::null_mut();
            let err = Error::new(ErrorClass::None, ErrorCode::Ok, "callback failed");
            let status = unsafe { into_callback_status(&mut out, Err(err)) };
            assert_eq!(status, raw::GIT_EUSER);
            unsafe { libc::free(out as *mut libc::c_void) };
        }
    }
}
