//! Property-based tests for string building, tables, locations and
//! environment filtering.

use failloc_mem::env::{Identity, MapEnv, SafeEnvironment};
use failloc_mem::{LocationCache, MAX_FRAGMENTS, PROBE_SIZE, Table, concat, format_str};
use proptest::prelude::*;

fn arb_fragments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop_oneof![Just(String::new()), "\\PC{0,12}"], 0..MAX_FRAGMENTS)
}

fn env_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("LANG".to_owned()),
        "LC_[A-Z]{1,8}",
        "[A-Z][A-Z_]{0,10}",
    ]
}

proptest! {
    // ============================================================================
    // Concatenation
    // ============================================================================

    #[test]
    fn concat_preserves_order_and_size(first in "\\PC{0,16}", rest in arb_fragments()) {
        let refs: Vec<&str> = rest.iter().map(String::as_str).collect();
        let out = concat(&first, &refs);

        let expected: String = std::iter::once(first.as_str()).chain(refs).collect();
        prop_assert_eq!(&*out, expected.as_str());
        prop_assert_eq!(out.into_string().capacity(), expected.len());
    }

    // ============================================================================
    // Formatting
    // ============================================================================

    #[test]
    fn format_matches_std(text in "\\PC{0,200}", width in 0usize..(PROBE_SIZE * 2)) {
        let ours = format_str!("[{text:>width$}]");
        let std = format!("[{text:>width$}]");
        prop_assert_eq!(&*ours, std.as_str());
        prop_assert_eq!(ours.into_string().capacity(), std.len());
    }

    // ============================================================================
    // Tables
    // ============================================================================

    #[test]
    fn table_capacity_is_bumped_and_monotonic(
        steps in prop::collection::vec((0usize..500, 1usize..64), 1..20),
    ) {
        let mut table: Table<u16> = Table::new();
        for (needed, bump) in steps {
            let before = table.capacity();
            let mut inits = 0;
            let after = table.grow_with(needed, bump, |slot| {
                assert_eq!(*slot, 0);
                inits += 1;
            });

            prop_assert!(after >= before);
            if needed < before {
                prop_assert_eq!(after, before);
                prop_assert_eq!(inits, 0);
            } else {
                prop_assert!(after > needed);
                prop_assert_eq!(after % bump, 0);
                prop_assert!(after - bump <= needed);
                prop_assert_eq!(inits, after - before);
            }
        }
    }

    // ============================================================================
    // Location cache
    // ============================================================================

    #[test]
    fn location_cache_is_recency_ordered(lines in prop::collection::vec(1u32..20, 1..60)) {
        let mut cache = LocationCache::new();
        for &line in &lines {
            let token = cache.intern("src/driver.rs", line);
            prop_assert!(cache.head().is_some_and(|head| head.ptr_eq(token)));
        }

        let mut distinct = lines.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(cache.len(), distinct.len());

        // Most recent first.
        let mut expected = Vec::new();
        for &line in lines.iter().rev() {
            let name = format!("driver.rs@{line}");
            if !expected.contains(&name) {
                expected.push(name);
            }
        }
        let order: Vec<&str> = cache.iter().map(|t| t.as_str()).collect();
        prop_assert_eq!(order, expected);
    }

    // ============================================================================
    // Safe environment
    // ============================================================================

    #[test]
    fn unprivileged_env_drops_only_locale(
        vars in prop::collection::vec((env_name(), "[a-z0-9/]{0,8}"), 0..16),
    ) {
        let source = vars
            .iter()
            .fold(MapEnv::new(Identity::unprivileged(1000, 1000)), |env, (n, v)| {
                env.with(n.as_str(), v.as_str())
            });
        let env = SafeEnvironment::build(&source);

        for (name, _) in env.pairs() {
            let name = name.to_string_lossy();
            prop_assert!(name != "LANG" && !name.starts_with("LC_"));
        }
        let kept = vars
            .iter()
            .map(|(n, _)| n)
            .filter(|n| *n != "LANG" && !n.starts_with("LC_"))
            .collect::<std::collections::BTreeSet<_>>();
        prop_assert_eq!(env.len(), kept.len());
    }
}
