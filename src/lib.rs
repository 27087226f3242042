//! gitcore - Safe core bindings to libgit2
//!
//! This crate is the seam between Rust and the natively-linked libgit2
//! library. It owns the library's process-wide lifecycle, translates the
//! native error-reporting convention into structured error values, and
//! wraps individually allocated native objects so they can be used without
//! leaking native memory or touching freed native state.
//!
//! # Architecture
//!
//! The codebase is layered, leaves first:
//!
//! - [`error`] - Translation of native statuses + thread-local last-error
//!   state into structured [`Error`] values
//! - [`oid`] - The fixed 20-byte object identifier value type
//! - [`handles`] - Token registry bridging native callback contexts to
//!   Rust objects
//! - [`runtime`] - Process-wide init / shutdown / reinit, capability
//!   detection, transport-fallback wiring
//! - [`refspec`] - Exclusively-owned parsed reference-mapping rules
//! - [`transport`] - Smart-transport registration seam and the managed
//!   http/ssh fallbacks
//!
//! An internal `raw` module carries the FFI declarations; nothing outside
//! this crate should need to see a C type.
//!
//! # Correctness invariants
//!
//! 1. Every fallible native call is translated immediately, before any
//!    other native call on the same thread (the last-error slot is
//!    thread-local and overwritten by the next call)
//! 2. Each natively allocated object has exactly one Rust owner and is
//!    released exactly once, on every exit path
//! 3. Strings derived from native memory are copied out before they can
//!    outlive their owner
//! 4. No native call runs while the library is uninitialized or shut down
//!
//! # Example
//!
//! ```no_run
//! use gitcore::{Oid, Refspec};
//!
//! gitcore::init();
//!
//! let oid: Oid = "49d16e17a7c553c7d27d636a8661faefff2b23c1".parse()?;
//! assert!(!oid.is_zero());
//!
//! let spec = Refspec::parse("refs/heads/*:refs/remotes/origin/*", true)?;
//! let tracking = spec.transform("refs/heads/main")?;
//! assert_eq!(tracking, "refs/remotes/origin/main");
//! spec.free();
//! # Ok::<(), gitcore::Error>(())
//! ```

pub mod error;
pub mod handles;
pub mod oid;
pub mod refspec;
pub mod runtime;
pub mod transport;

mod raw;
mod util;

pub use error::{Error, ErrorClass, ErrorCode};
pub use oid::{shorten, Oid};
pub use refspec::{Direction, Refspec};
pub use runtime::{init, reinit, shutdown, Features};

#[cfg(test)]
pub(crate) mod test_support {
    //! One-shot library initialization for the unit-test binary.
    //!
    //! Unit tests share a process and must never shut the library down;
    //! lifecycle transitions are exercised in tests/lifecycle.rs, which
    //! owns its own process.

    use std::sync::Once;

    static INIT: Once = Once::new();

    pub fn init() {
        INIT.call_once(crate::runtime::init);
    }
}
