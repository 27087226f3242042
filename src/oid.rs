//! oid
//!
//! Fixed-width object identifiers.
//!
//! An [`Oid`] is the 20-byte content address of a Git object. It is a plain
//! value type: always exactly 20 bytes, byte-wise equality, lexicographic
//! ordering, no native resource attached. The textual form is exactly 40
//! lowercase hex characters with no prefix or separators.
//!
//! Parsing and formatting are done on the managed side; only the batch
//! [`shorten`] algorithm calls into the native library, which owns the
//! incremental unique-prefix computation.
//!
//! # Example
//!
//! ```
//! use gitcore::Oid;
//!
//! let oid: Oid = "49d16e17a7c553c7d27d636a8661faefff2b23c1".parse().unwrap();
//! assert_eq!(oid.to_string(), "49d16e17a7c553c7d27d636a8661faefff2b23c1");
//! assert!(!oid.is_zero());
//! assert!(Oid::ZERO.is_zero());
//! ```

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{check, Error};
use crate::raw;

/// The id of a Git object: a fixed 20-byte content address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Oid([u8; raw::GIT_OID_RAWSZ]);

impl Oid {
    /// The distinguished all-zero identifier.
    pub const ZERO: Oid = Oid([0; raw::GIT_OID_RAWSZ]);

    /// Build an identifier from the first 20 bytes of `bytes`.
    ///
    /// Shorter inputs are a reported error rather than a silent
    /// out-of-bounds read.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < raw::GIT_OID_RAWSZ {
            return Err(Error::invalid(format!(
                "need at least {} bytes for an oid, got {}",
                raw::GIT_OID_RAWSZ,
                bytes.len()
            )));
        }
        let mut id = [0u8; raw::GIT_OID_RAWSZ];
        id.copy_from_slice(&bytes[..raw::GIT_OID_RAWSZ]);
        Ok(Self(id))
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; raw::GIT_OID_RAWSZ] {
        &self.0
    }

    /// True iff every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Compare only the first `n` bytes of two identifiers.
    ///
    /// Used for prefix matching; `n` larger than 20 compares all bytes.
    pub fn cmp_prefix(&self, other: &Oid, n: usize) -> Ordering {
        let n = n.min(raw::GIT_OID_RAWSZ);
        self.0[..n].cmp(&other.0[..n])
    }

    fn to_raw(self) -> raw::git_oid {
        raw::git_oid { id: self.0 }
    }
}

impl FromStr for Oid {
    type Err = Error;

    /// Parse a 40-character lowercase hex string.
    ///
    /// Fails on inputs longer than 40 characters, on non-hex input, and on
    /// anything that does not decode to exactly 20 bytes. All rejections
    /// happen before any native call.
    fn from_str(s: &str) -> Result<Self, Error> {
        if s.len() > raw::GIT_OID_HEXSZ {
            return Err(Error::invalid("string is too long for oid"));
        }
        let decoded =
            hex::decode(s).map_err(|e| Error::invalid(format!("invalid oid: {e}")))?;
        if decoded.len() != raw::GIT_OID_RAWSZ {
            return Err(Error::invalid("invalid oid"));
        }
        let mut id = [0u8; raw::GIT_OID_RAWSZ];
        id.copy_from_slice(&decoded);
        Ok(Self(id))
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Oid {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Compute the shortest unique hex-prefix length for a set of identifiers.
///
/// Feeds each identifier's full 40-character form into the native
/// incremental shortener; the result is the minimum length `>= min_length`
/// at which every supplied identifier remains distinguishable by its
/// leading hex characters.
///
/// The whole computation runs on the calling thread; the native shortener
/// is stateful and must not be interleaved across threads mid-sequence,
/// which the synchronous loop below guarantees. The shortener allocation is
/// released on every exit path.
///
/// Requires an initialized library (see [`crate::runtime::init`]).
pub fn shorten(ids: &[Oid], min_length: usize) -> Result<usize, Error> {
    struct Shortener(*mut raw::git_oid_shorten);

    impl Drop for Shortener {
        fn drop(&mut self) {
            unsafe { raw::git_oid_shorten_free(self.0) };
        }
    }

    // The native shortener retains pointers into each added text id for the
    // lifetime of the trie, so the formatted buffers must stay alive (and at
    // stable addresses) until the shortener is freed.
    let mut bufs: Vec<[u8; raw::GIT_OID_HEXSZ + 1]> = Vec::with_capacity(ids.len());
    for id in ids {
        let oid = id.to_raw();
        let mut buf = [0u8; raw::GIT_OID_HEXSZ + 1];
        unsafe { raw::git_oid_fmt(buf.as_mut_ptr() as *mut libc::c_char, &oid) };
        buf[raw::GIT_OID_HEXSZ] = 0;
        bufs.push(buf);
    }

    let ptr = unsafe { raw::git_oid_shorten_new(min_length) };
    if ptr.is_null() {
        return Err(Error::new(
            crate::ErrorClass::NoMemory,
            crate::ErrorCode::Generic,
            "failed to allocate oid shortener",
        ));
    }
    let shortener = Shortener(ptr);

    let mut unique_len = 0usize;
    for buf in &bufs {
        let ret = unsafe {
            raw::git_oid_shorten_add(shortener.0, buf.as_ptr() as *const libc::c_char)
        };
        unique_len = check(ret)? as usize;
    }
    Ok(unique_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;

    const HEX_A: &str = "49d16e17a7c553c7d27d636a8661faefff2b23c1";

    mod parsing {
        use super::*;

        #[test]
        fn round_trips_through_hex() {
            let oid: Oid = HEX_A.parse().unwrap();
            assert_eq!(oid.to_string(), HEX_A);
        }

        #[test]
        fn rejects_overlong_input() {
            let err = format!("{HEX_A}00").parse::<Oid>().unwrap_err();
            assert_eq!(err.code(), ErrorCode::Invalid);
        }

        #[test]
        fn rejects_non_hex_input() {
            assert!("zz".repeat(20).parse::<Oid>().is_err());
        }

        #[test]
        fn rejects_short_decoded_length() {
            assert!("49d16e".parse::<Oid>().is_err());
        }
    }

    mod bytes {
        use super::*;

        #[test]
        fn copies_the_first_twenty_bytes() {
            let data: Vec<u8> = (0..32).collect();
            let oid = Oid::from_bytes(&data).unwrap();
            assert_eq!(&oid.as_bytes()[..], &data[..20]);
        }

        #[test]
        fn short_input_is_an_error() {
            let err = Oid::from_bytes(&[1, 2, 3]).unwrap_err();
            assert_eq!(err.code(), ErrorCode::Invalid);
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn compare_is_bytewise_lexicographic() {
            let a: Oid = HEX_A.parse().unwrap();
            let b: Oid = "49d16e17a7c553c7d27d636a8661faefff2b23c2".parse().unwrap();
            assert_eq!(a.cmp(&a), Ordering::Equal);
            assert_eq!(a.cmp(&b), Ordering::Less);
            assert_eq!(b.cmp(&a), Ordering::Greater);
        }

        #[test]
        fn prefix_compare_stops_at_n_bytes() {
            let a: Oid = "aabbcc0000000000000000000000000000000000".parse().unwrap();
            let b: Oid = "aabbccffffffffffffffffffffffffffffffffff".parse().unwrap();
            assert_eq!(a.cmp_prefix(&b, 3), Ordering::Equal);
            assert_eq!(a.cmp_prefix(&b, 4), Ordering::Less);
        }
    }

    mod zero {
        use super::*;

        #[test]
        fn zero_sentinel() {
            assert!(Oid::ZERO.is_zero());
            assert_eq!(Oid::ZERO.to_string(), "0".repeat(40));
            let parsed: Oid = "0".repeat(40).parse().unwrap();
            assert!(parsed.is_zero());
        }

        #[test]
        fn parsed_non_zero_is_not_zero() {
            let oid: Oid = HEX_A.parse().unwrap();
            assert!(!oid.is_zero());
        }
    }

    mod shortening {
        use super::*;

        #[test]
        fn diverging_fourth_character_needs_four() {
            crate::test_support::init();
            // Shared 3-character prefix "abc", divergence at the 4th.
            let ids: Vec<Oid> = [
                "abc1000000000000000000000000000000000000",
                "abc2000000000000000000000000000000000000",
                "abc3000000000000000000000000000000000000",
            ]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();

            let len = shorten(&ids, 2).unwrap();
            assert_eq!(len, 4);

            // Every first-4 prefix is unique among the set.
            let prefixes: Vec<String> =
                ids.iter().map(|o| o.to_string()[..len].to_string()).collect();
            let mut dedup = prefixes.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(dedup.len(), prefixes.len());
        }

        #[test]
        fn respects_larger_min_length() {
            crate::test_support::init();
            let ids: Vec<Oid> = [
                "abc1000000000000000000000000000000000000",
                "abc2000000000000000000000000000000000000",
            ]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();

            let len = shorten(&ids, 10).unwrap();
            assert_eq!(len, 10);
        }
    }
}
