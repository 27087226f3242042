//! Property-based tests for the identifier value type.
//!
//! These use proptest to verify invariants hold across randomly generated
//! inputs. Everything here is pure value manipulation; no library
//! initialization is required.

use std::cmp::Ordering;

use proptest::prelude::*;

use gitcore::Oid;

/// Strategy for 20 raw identifier bytes.
fn oid_bytes() -> impl Strategy<Value = [u8; 20]> {
    prop::array::uniform20(any::<u8>())
}

proptest! {
    #[test]
    fn format_then_parse_round_trips(bytes in oid_bytes()) {
        let oid = Oid::from_bytes(&bytes).unwrap();
        let text = oid.to_string();
        prop_assert_eq!(text.len(), 40);
        prop_assert!(text.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        let reparsed: Oid = text.parse().unwrap();
        prop_assert_eq!(oid, reparsed);
    }

    #[test]
    fn parse_then_format_is_identity_on_hex(bytes in oid_bytes()) {
        let s = hex::encode(bytes);
        let oid: Oid = s.parse().unwrap();
        prop_assert_eq!(oid.to_string(), s);
    }

    #[test]
    fn from_bytes_copies_the_leading_prefix(data in prop::collection::vec(any::<u8>(), 20..64)) {
        let oid = Oid::from_bytes(&data).unwrap();
        for (i, byte) in oid.as_bytes().iter().enumerate() {
            prop_assert_eq!(*byte, data[i]);
        }
    }

    #[test]
    fn compare_is_consistent_with_bytewise_order(a in oid_bytes(), b in oid_bytes()) {
        let oa = Oid::from_bytes(&a).unwrap();
        let ob = Oid::from_bytes(&b).unwrap();
        prop_assert_eq!(oa.cmp(&ob), a.cmp(&b));
        prop_assert_eq!(oa.cmp(&ob), ob.cmp(&oa).reverse());
        prop_assert_eq!(oa.cmp(&oa), Ordering::Equal);
    }

    #[test]
    fn prefix_compare_agrees_with_truncated_slices(a in oid_bytes(), b in oid_bytes(), n in 0usize..24) {
        let oa = Oid::from_bytes(&a).unwrap();
        let ob = Oid::from_bytes(&b).unwrap();
        let k = n.min(20);
        prop_assert_eq!(oa.cmp_prefix(&ob, n), a[..k].cmp(&b[..k]));
    }

    #[test]
    fn is_zero_iff_all_bytes_zero(bytes in oid_bytes()) {
        let oid = Oid::from_bytes(&bytes).unwrap();
        prop_assert_eq!(oid.is_zero(), bytes.iter().all(|&b| b == 0));
    }
}
