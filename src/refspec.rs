//! refspec
//!
//! Parsed reference-mapping specifications.
//!
//! A [`Refspec`] wraps exactly one natively-allocated parsed refspec. The
//! wrapper is the exclusive owner: it cannot be copied or cloned, `Drop`
//! frees the native allocation exactly once, and [`Refspec::free`] is the
//! explicit release — a consuming move, so any use after release is a
//! compile error rather than a latent use-after-free.
//!
//! Strings derived from the refspec (source, destination, canonical form,
//! transform results) point into native-owned memory on the C side; every
//! accessor copies them out before returning, so the returned `String`s
//! outlive the owner safely.
//!
//! # Example
//!
//! ```no_run
//! use gitcore::Refspec;
//!
//! gitcore::runtime::init();
//! let spec = Refspec::parse("refs/heads/*:refs/remotes/origin/*", true)?;
//! assert_eq!(spec.transform("refs/heads/main")?, "refs/remotes/origin/main");
//! spec.free();
//! # Ok::<(), gitcore::Error>(())
//! ```

use std::ffi::CStr;

use crate::error::{check, Error};
use crate::raw;
use crate::util::{cbool, into_c_string, Buf};

/// The direction a refspec applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Fetch,
    Push,
}

impl Direction {
    pub(crate) fn from_raw(raw: libc::c_int) -> Self {
        match raw {
            raw::GIT_DIRECTION_PUSH => Direction::Push,
            _ => Direction::Fetch,
        }
    }
}

/// A parsed reference-mapping rule.
///
/// Owns one native allocation; see the module docs for the ownership rules.
pub struct Refspec {
    ptr: *mut raw::git_refspec,
}

impl Refspec {
    /// Parse a refspec string under an explicit direction.
    ///
    /// `is_fetch` selects the fetch-side grammar; push refspecs reject
    /// patterns that fetch refspecs allow, and vice versa.
    ///
    /// Requires an initialized library (see [`crate::runtime::init`]).
    pub fn parse(input: &str, is_fetch: bool) -> Result<Self, Error> {
        let c_input = into_c_string(input)?;
        let mut ptr = std::ptr::null_mut();
        check(unsafe { raw::git_refspec_parse(&mut ptr, c_input.as_ptr(), cbool(is_fetch)) })?;
        Ok(Self { ptr })
    }

    /// Explicitly release the native allocation.
    ///
    /// Consumes the refspec; `Drop` remains the safety net for owners that
    /// go out of scope without calling this.
    pub fn free(self) {
        drop(self);
    }

    /// The refspec's direction.
    pub fn direction(&self) -> Direction {
        Direction::from_raw(unsafe { raw::git_refspec_direction(self.ptr) })
    }

    /// The source specifier, or `""` when the native accessor yields none.
    pub fn src(&self) -> String {
        unsafe { copy_optional_str(raw::git_refspec_src(self.ptr)) }
    }

    /// The destination specifier, or `""` when the native accessor yields
    /// none.
    pub fn dst(&self) -> String {
        unsafe { copy_optional_str(raw::git_refspec_dst(self.ptr)) }
    }

    /// Whether the refspec forces updates.
    pub fn force(&self) -> bool {
        unsafe { raw::git_refspec_force(self.ptr) != 0 }
    }

    /// The canonical string form.
    pub fn text(&self) -> String {
        unsafe { copy_optional_str(raw::git_refspec_string(self.ptr)) }
    }

    /// Whether `refname` matches the source side of the rule.
    ///
    /// A name that cannot cross the FFI boundary (interior NUL) matches
    /// nothing.
    pub fn src_matches(&self, refname: &str) -> bool {
        match into_c_string(refname) {
            Ok(name) => unsafe { raw::git_refspec_src_matches(self.ptr, name.as_ptr()) != 0 },
            Err(_) => false,
        }
    }

    /// Whether `refname` matches the destination side of the rule.
    pub fn dst_matches(&self, refname: &str) -> bool {
        match into_c_string(refname) {
            Ok(name) => unsafe { raw::git_refspec_dst_matches(self.ptr, name.as_ptr()) != 0 },
            Err(_) => false,
        }
    }

    /// Map a source-side reference name to its destination-side form.
    ///
    /// Fails when `refname` does not match the source pattern; never
    /// returns a best-guess string.
    pub fn transform(&self, refname: &str) -> Result<String, Error> {
        let name = into_c_string(refname)?;
        let mut buf = Buf::new();
        check(unsafe { raw::git_refspec_transform(buf.as_mut_ptr(), self.ptr, name.as_ptr()) })?;
        Ok(buf.to_string_lossy())
    }

    /// Map a destination-side reference name back to its source-side form.
    ///
    /// Fails when `refname` does not match the destination pattern.
    pub fn rtransform(&self, refname: &str) -> Result<String, Error> {
        let name = into_c_string(refname)?;
        let mut buf = Buf::new();
        check(unsafe { raw::git_refspec_rtransform(buf.as_mut_ptr(), self.ptr, name.as_ptr()) })?;
        Ok(buf.to_string_lossy())
    }
}

impl Drop for Refspec {
    fn drop(&mut self) {
        unsafe { raw::git_refspec_free(self.ptr) };
    }
}

impl std::fmt::Display for Refspec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

impl std::fmt::Debug for Refspec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Refspec").field(&self.text()).finish()
    }
}

/// Copy an optional native string out of native-owned memory.
unsafe fn copy_optional_str(ptr: *const libc::c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FETCH_SPEC: &str = "refs/heads/*:refs/remotes/origin/*";

    fn parse(input: &str, is_fetch: bool) -> Refspec {
        crate::test_support::init();
        Refspec::parse(input, is_fetch).expect("refspec should parse")
    }

    mod parsing {
        use super::*;

        #[test]
        fn rejects_malformed_input() {
            crate::test_support::init();
            // Glob on one side only: pattern counts must agree.
            let err = Refspec::parse("refs/heads/*:refs/remotes/origin/branch", true).unwrap_err();
            assert!(!err.message().is_empty());
        }

        #[test]
        fn canonical_form_round_trips() {
            let spec = parse(FETCH_SPEC, true);
            assert_eq!(spec.text(), FETCH_SPEC);
            assert_eq!(spec.to_string(), FETCH_SPEC);
        }
    }

    mod accessors {
        use super::*;

        #[test]
        fn fetch_spec_fields() {
            let spec = parse(FETCH_SPEC, true);
            assert_eq!(spec.direction(), Direction::Fetch);
            assert_eq!(spec.src(), "refs/heads/*");
            assert_eq!(spec.dst(), "refs/remotes/origin/*");
            assert!(!spec.force());
        }

        #[test]
        fn push_direction_and_force_flag() {
            let spec = parse("+refs/heads/main:refs/heads/main", false);
            assert_eq!(spec.direction(), Direction::Push);
            assert!(spec.force());
        }
    }

    mod matching {
        use super::*;

        #[test]
        fn src_matches_pattern() {
            let spec = parse(FETCH_SPEC, true);
            assert!(spec.src_matches("refs/heads/main"));
            assert!(!spec.src_matches("refs/tags/v1.0"));
        }

        #[test]
        fn dst_matches_pattern() {
            let spec = parse(FETCH_SPEC, true);
            assert!(spec.dst_matches("refs/remotes/origin/main"));
            assert!(!spec.dst_matches("refs/heads/main"));
        }

        #[test]
        fn interior_nul_matches_nothing() {
            let spec = parse(FETCH_SPEC, true);
            assert!(!spec.src_matches("refs/heads/\0main"));
        }
    }

    mod transforms {
        use super::*;

        #[test]
        fn transform_applies_destination_pattern() {
            let spec = parse(FETCH_SPEC, true);
            assert_eq!(
                spec.transform("refs/heads/main").unwrap(),
                "refs/remotes/origin/main"
            );
        }

        #[test]
        fn rtransform_inverts_transform() {
            let spec = parse(FETCH_SPEC, true);
            assert_eq!(
                spec.rtransform("refs/remotes/origin/main").unwrap(),
                "refs/heads/main"
            );
        }

        #[test]
        fn transform_of_non_matching_name_is_an_error() {
            let spec = parse(FETCH_SPEC, true);
            assert!(spec.transform("refs/tags/v1.0").is_err());
            assert!(spec.rtransform("refs/heads/main").is_err());
        }
    }

    mod release {
        use super::*;

        #[test]
        fn derived_strings_outlive_the_owner() {
            let spec = parse(FETCH_SPEC, true);
            let src = spec.src();
            let text = spec.text();
            spec.free();
            assert_eq!(src, "refs/heads/*");
            assert_eq!(text, FETCH_SPEC);
        }
    }
}
