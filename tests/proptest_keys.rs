//! Property-based tests for key derivation and the storage codec.
//!
//! These use proptest to verify properties over randomly generated argument
//! lists and entries, catching edge cases example-based tests miss.
//!
//! # Properties Tested
//!
//! 1. **Determinism**: equal inputs always produce equal keys and bytes
//! 2. **Injectivity**: distinct rendered argument lists never share a key
//! 3. **Delimiter safety**: a delimiter smuggled inside an argument cannot
//!    fake an argument boundary
//! 4. **Roundtrip**: decode(encode(entry)) == entry for any entry, and the
//!    wire message survives JSON both ways

use proptest::prelude::*;
use serde_json::Number;
use std::collections::BTreeSet;
use swr_kit::serialization::{decode_from_store, encode_for_store};
use swr_kit::{
    key, ArgValue, Args, CacheEntry, RevalidatePolicy, RevalidationRequest, ScalarValue,
};

// ============================================================================
// Strategies
// ============================================================================

fn scalar_strategy() -> impl Strategy<Value = ScalarValue> {
    prop_oneof![
        "[ -~]{0,12}".prop_map(ScalarValue::Str),
        any::<i64>().prop_map(|n| ScalarValue::Num(Number::from(n))),
        any::<bool>().prop_map(ScalarValue::Bool),
    ]
}

fn arg_strategy() -> impl Strategy<Value = ArgValue> {
    prop_oneof![
        "[ -~]{0,12}".prop_map(ArgValue::Str),
        any::<i64>().prop_map(|n| ArgValue::Num(Number::from(n))),
        any::<bool>().prop_map(ArgValue::Bool),
        prop::collection::vec(scalar_strategy(), 0..4).prop_map(ArgValue::List),
        prop::collection::btree_map("[a-z]{1,6}", scalar_strategy(), 0..4).prop_map(ArgValue::Map),
    ]
}

fn args_strategy() -> impl Strategy<Value = Args> {
    prop::collection::vec(arg_strategy(), 0..5)
}

fn policy_strategy() -> impl Strategy<Value = RevalidatePolicy> {
    prop_oneof![
        (1u32..=31_536_000).prop_map(RevalidatePolicy::After),
        Just(RevalidatePolicy::Never),
    ]
}

fn entry_strategy() -> impl Strategy<Value = CacheEntry> {
    (
        "[ -~]{0,64}",
        prop::collection::btree_set("[a-z:/]{1,10}", 0..5),
        any::<u64>(),
        policy_strategy(),
    )
        .prop_map(|(value, tags, stored_at, revalidate)| CacheEntry {
            kind: swr_kit::entry::FETCH_KIND.to_string(),
            value,
            tags,
            stored_at,
            revalidate,
        })
}

fn rendered(args: &Args) -> Vec<String> {
    args.iter()
        .map(|a| a.render().expect("render failed"))
        .collect()
}

// ============================================================================
// Key Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_build_key_deterministic(args in args_strategy()) {
        let k1 = key::build_key("fn", &args).expect("build failed");
        let k2 = key::build_key("fn", &args).expect("build failed");
        prop_assert_eq!(k1, k2);
    }

    #[test]
    fn prop_distinct_rendered_args_distinct_keys(
        a in args_strategy(),
        b in args_strategy(),
    ) {
        prop_assume!(rendered(&a) != rendered(&b));
        let ka = key::build_key("fn", &a).expect("build failed");
        let kb = key::build_key("fn", &b).expect("build failed");
        prop_assert_ne!(ka, kb);
    }

    #[test]
    fn prop_distinct_fn_ids_distinct_keys(
        id_a in "[a-z:/_]{1,16}",
        id_b in "[a-z:/_]{1,16}",
        args in args_strategy(),
    ) {
        prop_assume!(id_a != id_b);
        let ka = key::build_key(&id_a, &args).expect("build failed");
        let kb = key::build_key(&id_b, &args).expect("build failed");
        prop_assert_ne!(ka, kb);
    }

    #[test]
    fn prop_smuggled_delimiter_cannot_fake_boundary(
        a in "[ -~]{0,8}",
        b in "[ -~]{0,8}",
    ) {
        let smuggled: Args = vec![ArgValue::Str(format!("{}\u{1f}{}", a, b))];
        let genuine: Args = vec![ArgValue::Str(a), ArgValue::Str(b)];
        let ks = key::build_key("fn", &smuggled).expect("build failed");
        let kg = key::build_key("fn", &genuine).expect("build failed");
        prop_assert_ne!(ks, kg);
    }

    #[test]
    fn prop_fingerprint_is_fixed_width_hex(raw in "[ -~]{0,64}") {
        let fp = key::fingerprint(&raw);
        prop_assert_eq!(fp.len(), 64);
        prop_assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

// ============================================================================
// Codec Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_entry_roundtrip(entry in entry_strategy()) {
        let bytes = encode_for_store(&entry).expect("encode failed");
        let back: CacheEntry = decode_from_store(&bytes).expect("decode failed");
        prop_assert_eq!(entry, back);
    }

    #[test]
    fn prop_entry_encoding_deterministic(entry in entry_strategy()) {
        let b1 = encode_for_store(&entry).expect("encode failed");
        let b2 = encode_for_store(&entry).expect("encode failed");
        prop_assert_eq!(b1, b2);
    }

    #[test]
    fn prop_wire_request_roundtrip(
        fn_id in "[a-z:/_]{1,16}",
        args in args_strategy(),
        cache_key in "[0-9a-f]{16}",
        tags in prop::collection::vec("[a-z]{1,8}", 0..4),
        revalidate in policy_strategy(),
    ) {
        let request = RevalidationRequest {
            unique_fn_id: fn_id,
            args,
            cache_key,
            tags,
            revalidate,
        };
        let wire = serde_json::to_string(&request).expect("wire encode failed");
        let back: RevalidationRequest = serde_json::from_str(&wire).expect("wire decode failed");
        prop_assert_eq!(request, back);
    }
}

// ============================================================================
// Tag Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_tag_merge_idempotent(
        existing in prop::collection::btree_set("[a-z]{1,6}", 0..8),
        incoming in prop::collection::btree_set("[a-z]{1,6}", 0..8),
    ) {
        let (once, _) = swr_kit::tags::merge(&existing, &incoming);
        let (twice, changed) = swr_kit::tags::merge(&once, &incoming);
        prop_assert!(!changed);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_tag_merge_is_union(
        existing in prop::collection::btree_set("[a-z]{1,6}", 0..8),
        incoming in prop::collection::btree_set("[a-z]{1,6}", 0..8),
    ) {
        let (merged, changed) = swr_kit::tags::merge(&existing, &incoming);
        let union: BTreeSet<String> = existing.union(&incoming).cloned().collect();
        prop_assert_eq!(&merged, &union);
        prop_assert_eq!(changed, merged != existing);
    }
}
