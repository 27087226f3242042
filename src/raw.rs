//! raw
//!
//! FFI declarations for the slice of libgit2 this crate calls.
//!
//! The C library itself is built and linked by `libgit2-sys` (vendored
//! build); this module carries our own declarations so the safe layer
//! depends only on the entry points it actually uses. Constants mirror
//! `git2/errors.h`, `git2/common.h`, `git2/net.h`, `git2/oid.h` and
//! `git2/sys/transport.h`.

#![allow(non_camel_case_types)]
#![allow(dead_code)]

// Link the vendored libgit2 static library.
use libgit2_sys as _;

use libc::{c_char, c_int, c_uint, c_void, size_t};

pub const GIT_OID_RAWSZ: usize = 20;
pub const GIT_OID_HEXSZ: usize = 40;

// Return codes (git2/errors.h).
pub const GIT_OK: c_int = 0;
pub const GIT_ERROR: c_int = -1;
pub const GIT_ENOTFOUND: c_int = -3;
pub const GIT_EEXISTS: c_int = -4;
pub const GIT_EAMBIGUOUS: c_int = -5;
pub const GIT_EBUFS: c_int = -6;
pub const GIT_EUSER: c_int = -7;
pub const GIT_EBAREREPO: c_int = -8;
pub const GIT_EUNBORNBRANCH: c_int = -9;
pub const GIT_EUNMERGED: c_int = -10;
pub const GIT_ENONFASTFORWARD: c_int = -11;
pub const GIT_EINVALIDSPEC: c_int = -12;
pub const GIT_ECONFLICT: c_int = -13;
pub const GIT_ELOCKED: c_int = -14;
pub const GIT_EMODIFIED: c_int = -15;
pub const GIT_EAUTH: c_int = -16;
pub const GIT_ECERTIFICATE: c_int = -17;
pub const GIT_EAPPLIED: c_int = -18;
pub const GIT_EPEEL: c_int = -19;
pub const GIT_EEOF: c_int = -20;
pub const GIT_EINVALID: c_int = -21;
pub const GIT_EUNCOMMITTED: c_int = -22;
pub const GIT_EDIRECTORY: c_int = -23;
pub const GIT_EMERGECONFLICT: c_int = -24;
pub const GIT_PASSTHROUGH: c_int = -30;
pub const GIT_ITEROVER: c_int = -31;
pub const GIT_RETRY: c_int = -32;
pub const GIT_EMISMATCH: c_int = -33;
pub const GIT_EINDEXDIRTY: c_int = -34;
pub const GIT_EAPPLYFAIL: c_int = -35;

// Error classes (git2/errors.h, git_error_t).
pub const GIT_ERROR_NONE: c_int = 0;
pub const GIT_ERROR_NOMEMORY: c_int = 1;
pub const GIT_ERROR_OS: c_int = 2;
pub const GIT_ERROR_INVALID: c_int = 3;
pub const GIT_ERROR_REFERENCE: c_int = 4;
pub const GIT_ERROR_ZLIB: c_int = 5;
pub const GIT_ERROR_REPOSITORY: c_int = 6;
pub const GIT_ERROR_CONFIG: c_int = 7;
pub const GIT_ERROR_REGEX: c_int = 8;
pub const GIT_ERROR_ODB: c_int = 9;
pub const GIT_ERROR_INDEX: c_int = 10;
pub const GIT_ERROR_OBJECT: c_int = 11;
pub const GIT_ERROR_NET: c_int = 12;
pub const GIT_ERROR_TAG: c_int = 13;
pub const GIT_ERROR_TREE: c_int = 14;
pub const GIT_ERROR_INDEXER: c_int = 15;
pub const GIT_ERROR_SSL: c_int = 16;
pub const GIT_ERROR_SUBMODULE: c_int = 17;
pub const GIT_ERROR_THREAD: c_int = 18;
pub const GIT_ERROR_STASH: c_int = 19;
pub const GIT_ERROR_CHECKOUT: c_int = 20;
pub const GIT_ERROR_FETCHHEAD: c_int = 21;
pub const GIT_ERROR_MERGE: c_int = 22;
pub const GIT_ERROR_SSH: c_int = 23;
pub const GIT_ERROR_FILTER: c_int = 24;
pub const GIT_ERROR_REVERT: c_int = 25;
pub const GIT_ERROR_CALLBACK: c_int = 26;
pub const GIT_ERROR_REBASE: c_int = 27;
pub const GIT_ERROR_PATCH: c_int = 28;

// Compile-time feature bits (git2/common.h, git_feature_t).
pub const GIT_FEATURE_THREADS: c_int = 1 << 0;
pub const GIT_FEATURE_HTTPS: c_int = 1 << 1;
pub const GIT_FEATURE_SSH: c_int = 1 << 2;
pub const GIT_FEATURE_NSEC: c_int = 1 << 3;

// git_direction (git2/net.h).
pub const GIT_DIRECTION_FETCH: c_int = 0;
pub const GIT_DIRECTION_PUSH: c_int = 1;

// git_smart_service_t (git2/sys/transport.h).
pub const GIT_SERVICE_UPLOADPACK_LS: c_int = 1;
pub const GIT_SERVICE_UPLOADPACK: c_int = 2;
pub const GIT_SERVICE_RECEIVEPACK_LS: c_int = 3;
pub const GIT_SERVICE_RECEIVEPACK: c_int = 4;

pub enum git_refspec {}
pub enum git_oid_shorten {}
pub enum git_transport {}
pub enum git_remote {}

#[repr(C)]
pub struct git_oid {
    pub id: [u8; GIT_OID_RAWSZ],
}

#[repr(C)]
pub struct git_error {
    pub message: *mut c_char,
    pub klass: c_int,
}

#[repr(C)]
pub struct git_buf {
    pub ptr: *mut c_char,
    pub reserved: size_t,
    pub size: size_t,
}

#[repr(C)]
pub struct git_smart_subtransport_stream {
    pub subtransport: *mut git_smart_subtransport,
    pub read: Option<
        unsafe extern "C" fn(
            stream: *mut git_smart_subtransport_stream,
            buffer: *mut c_char,
            buf_size: size_t,
            bytes_read: *mut size_t,
        ) -> c_int,
    >,
    pub write: Option<
        unsafe extern "C" fn(
            stream: *mut git_smart_subtransport_stream,
            buffer: *const c_char,
            len: size_t,
        ) -> c_int,
    >,
    pub free: Option<unsafe extern "C" fn(stream: *mut git_smart_subtransport_stream)>,
}

#[repr(C)]
pub struct git_smart_subtransport {
    pub action: Option<
        unsafe extern "C" fn(
            out: *mut *mut git_smart_subtransport_stream,
            transport: *mut git_smart_subtransport,
            url: *const c_char,
            action: c_int,
        ) -> c_int,
    >,
    pub close: Option<unsafe extern "C" fn(transport: *mut git_smart_subtransport) -> c_int>,
    pub free: Option<unsafe extern "C" fn(transport: *mut git_smart_subtransport)>,
}

pub type git_smart_subtransport_cb = Option<
    unsafe extern "C" fn(
        out: *mut *mut git_smart_subtransport,
        owner: *mut git_transport,
        param: *mut c_void,
    ) -> c_int,
>;

#[repr(C)]
pub struct git_smart_subtransport_definition {
    pub callback: git_smart_subtransport_cb,
    pub rpc: c_uint,
    pub param: *mut c_void,
}

pub type git_transport_cb = Option<
    unsafe extern "C" fn(
        out: *mut *mut git_transport,
        owner: *mut git_remote,
        param: *mut c_void,
    ) -> c_int,
>;

extern "C" {
    pub fn git_libgit2_init() -> c_int;
    pub fn git_libgit2_shutdown() -> c_int;
    pub fn git_libgit2_features() -> c_int;

    pub fn git_error_last() -> *const git_error;
    pub fn git_error_set_str(error_class: c_int, string: *const c_char) -> c_int;

    pub fn git_buf_dispose(buffer: *mut git_buf);

    pub fn git_oid_fmt(out: *mut c_char, id: *const git_oid) -> c_int;
    pub fn git_oid_shorten_new(min_length: size_t) -> *mut git_oid_shorten;
    pub fn git_oid_shorten_add(os: *mut git_oid_shorten, text_id: *const c_char) -> c_int;
    pub fn git_oid_shorten_free(os: *mut git_oid_shorten);

    pub fn git_refspec_parse(
        refspec: *mut *mut git_refspec,
        input: *const c_char,
        is_fetch: c_int,
    ) -> c_int;
    pub fn git_refspec_free(refspec: *mut git_refspec);
    pub fn git_refspec_direction(spec: *const git_refspec) -> c_int;
    pub fn git_refspec_src(refspec: *const git_refspec) -> *const c_char;
    pub fn git_refspec_dst(refspec: *const git_refspec) -> *const c_char;
    pub fn git_refspec_force(refspec: *const git_refspec) -> c_int;
    pub fn git_refspec_string(refspec: *const git_refspec) -> *const c_char;
    pub fn git_refspec_src_matches(refspec: *const git_refspec, refname: *const c_char) -> c_int;
    pub fn git_refspec_dst_matches(refspec: *const git_refspec, refname: *const c_char) -> c_int;
    pub fn git_refspec_transform(
        out: *mut git_buf,
        spec: *const git_refspec,
        name: *const c_char,
    ) -> c_int;
    pub fn git_refspec_rtransform(
        out: *mut git_buf,
        spec: *const git_refspec,
        name: *const c_char,
    ) -> c_int;

    pub fn git_transport_register(
        prefix: *const c_char,
        cb: git_transport_cb,
        param: *mut c_void,
    ) -> c_int;
    pub fn git_transport_unregister(prefix: *const c_char) -> c_int;
    pub fn git_transport_smart(
        out: *mut *mut git_transport,
        owner: *mut git_remote,
        payload: *mut c_void,
    ) -> c_int;

    pub fn git_repository_discover(
        out: *mut git_buf,
        start_path: *const c_char,
        across_fs: c_int,
        ceiling_dirs: *const c_char,
    ) -> c_int;

    // git2/sys/openssl.h; a stub exists when libgit2 is built without OpenSSL.
    pub fn git_openssl_set_locking() -> c_int;
}

#[cfg(unix)]
pub const GIT_PATH_LIST_SEPARATOR: char = ':';
#[cfg(windows)]
pub const GIT_PATH_LIST_SEPARATOR: char = ';';
