//! runtime
//!
//! Process-wide native library lifecycle.
//!
//! The native library carries global state with three phases:
//! uninitialized → initialized → shut down, where shut down may re-enter
//! initialized via [`reinit`]. No identifier, refspec, or transport
//! operation that calls into the native library may run outside the
//! initialized phase.
//!
//! # Caller contract
//!
//! Transitions are caller-serialized: this layer adds no locking of its
//! own around [`init`], [`shutdown`] and [`reinit`], and the caller
//! guarantees no other component holds a live reference to any object
//! produced by this crate while a transition runs. Violating that is
//! undefined behavior in the native library, not a recoverable error.
//!
//! # Capability fallbacks
//!
//! [`init`] queries the native library's compiled-in capabilities. When
//! network-security (HTTPS) or secure-shell (SSH) support is missing, a
//! managed fallback transport is registered in its place; a failure to
//! register or later unregister a fallback is fatal, since a half-wired
//! transport layer risks memory corruption on the next network operation.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{check, Error};
use crate::handles::HandleList;
use crate::raw;
use crate::transport;
use crate::util::{cbool, into_c_string, Buf};

/// Registry bridging native callback parameters to Rust objects.
///
/// Cleared wholesale on [`shutdown`], invalidating every outstanding token.
static HANDLES: HandleList = HandleList::new();

pub(crate) fn handles() -> &'static HandleList {
    &HANDLES
}

/// Optional capabilities compiled into the native library.
#[derive(Debug, Clone, Copy)]
pub struct Features(libc::c_int);

impl Features {
    /// Query the native library's capability bitmask.
    pub fn current() -> Self {
        Self(unsafe { raw::git_libgit2_features() })
    }

    /// Threading support.
    pub fn threads(&self) -> bool {
        self.0 & raw::GIT_FEATURE_THREADS != 0
    }

    /// Built-in network-security (HTTPS) transport support.
    pub fn https(&self) -> bool {
        self.0 & raw::GIT_FEATURE_HTTPS != 0
    }

    /// Built-in secure-shell transport support.
    pub fn ssh(&self) -> bool {
        self.0 & raw::GIT_FEATURE_SSH != 0
    }

    /// Nanosecond timestamp resolution.
    pub fn nsec(&self) -> bool {
        self.0 & raw::GIT_FEATURE_NSEC != 0
    }
}

/// Initialize the native library's process-wide state.
///
/// Valid from the uninitialized and shut-down phases. Resets the handle
/// registry, starts the native library, and wires transport capability
/// fallbacks per the module docs.
///
/// # Panics
///
/// Panics if a required fallback transport cannot be registered; there is
/// no safe degraded mode without it.
pub fn init() {
    HANDLES.clear();

    unsafe { raw::git_libgit2_init() };
    let features = Features::current();
    debug!(
        https = features.https(),
        ssh = features.ssh(),
        threads = features.threads(),
        "native library initialized"
    );

    if features.https() {
        // The library has its own TLS stack; hand it the locking callback
        // so that stack is safe under concurrent use. This stomps on
        // process-global OpenSSL state, so exactly one component per
        // process may do it.
        unsafe { raw::git_openssl_set_locking() };
    } else if let Err(err) = transport::register_managed_https() {
        panic!("failed to register managed https transport: {err}");
    }

    if !features.ssh() {
        if let Err(err) = transport::register_managed_ssh() {
            panic!("failed to register managed ssh transport: {err}");
        }
    }
}

/// Release everything the native library holds.
///
/// The caller guarantees no references to any object from this crate are
/// live. After this returns, calling anything but [`init`] or [`reinit`]
/// is undefined behavior.
///
/// # Panics
///
/// Panics if a transport registration cannot be removed; the native
/// registry does not remove them itself, and a dangling registration
/// would crash a later lifecycle.
pub fn shutdown() {
    if let Err(err) = transport::unregister_all() {
        panic!("failed to unregister transports: {err}");
    }
    HANDLES.clear();

    unsafe { raw::git_libgit2_shutdown() };
    debug!("native library shut down");
}

/// Reinitialize the global state: [`shutdown`] followed by [`init`].
///
/// Useful when the effective process identity changed and cached
/// configuration search paths must be recomputed. Every previously issued
/// handle token and transport registration is invalidated.
pub fn reinit() {
    shutdown();
    init();
}

/// Walk up from `start` looking for a repository, stopping at filesystem
/// boundaries unless `across_fs` is set and never ascending past any of
/// the `ceiling_dirs`.
///
/// Returns the discovered gitdir path. Requires an initialized library.
pub fn discover(
    start: &Path,
    across_fs: bool,
    ceiling_dirs: &[&Path],
) -> Result<PathBuf, Error> {
    let ceiling = ceiling_dirs
        .iter()
        .map(|p| p.to_string_lossy())
        .collect::<Vec<_>>()
        .join(&raw::GIT_PATH_LIST_SEPARATOR.to_string());
    let c_ceiling = into_c_string(&ceiling)?;
    let c_start = into_c_string(&start.to_string_lossy())?;

    let mut buf = Buf::new();
    check(unsafe {
        raw::git_repository_discover(
            buf.as_mut_ptr(),
            c_start.as_ptr(),
            cbool(across_fs),
            c_ceiling.as_ptr(),
        )
    })?;
    Ok(PathBuf::from(buf.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // init/shutdown sequencing is exercised in tests/lifecycle.rs, which
    // owns its process; tests here must not tear the library down under
    // the rest of the suite.

    #[test]
    fn features_report_a_threaded_build() {
        crate::test_support::init();
        let features = Features::current();
        assert!(features.threads());
    }

    #[test]
    fn handle_registry_is_shared_and_usable() {
        crate::test_support::init();
        let token = handles().track(std::sync::Arc::new(42u32));
        assert!(handles().lookup(token).is_some());
        handles().untrack(token);
        assert!(handles().lookup(token).is_none());
    }

    mod discovery {
        use super::*;

        /// Lay down the minimal gitdir layout the discovery walk accepts.
        fn fake_repo(root: &Path) {
            let gitdir = root.join(".git");
            std::fs::create_dir_all(gitdir.join("objects")).unwrap();
            std::fs::create_dir_all(gitdir.join("refs")).unwrap();
            std::fs::write(gitdir.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        }

        #[test]
        fn finds_the_gitdir_from_a_subdirectory() {
            crate::test_support::init();
            let dir = tempfile::tempdir().unwrap();
            fake_repo(dir.path());
            let nested = dir.path().join("a/b");
            std::fs::create_dir_all(&nested).unwrap();

            let found = discover(&nested, false, &[]).unwrap();
            let canonical = std::fs::canonicalize(&found).unwrap();
            assert_eq!(
                canonical,
                std::fs::canonicalize(dir.path().join(".git")).unwrap()
            );
        }

        #[test]
        fn missing_repository_is_not_found() {
            crate::test_support::init();
            let dir = tempfile::tempdir().unwrap();
            let err = discover(dir.path(), false, &[dir.path()]).unwrap_err();
            assert_eq!(err.code(), crate::ErrorCode::NotFound);
        }
    }
}
