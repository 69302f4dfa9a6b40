//! Property-based tests for batch region resolution.
//!
//! # Invariants tested
//!
//! - **Single lookup:** every non-empty batch performs exactly one bulk fetch.
//! - **Bounded creates:** N features over K distinct codes create at most K
//!   regions, and exactly the codes missing from the store.
//! - **Shared identity:** features sharing a code reference one region.
//! - **Bounded writes:** under either policy every distinct code costs at
//!   most one region write; `UPDATE` updates exactly the codes that existed.

mod support;

use std::collections::{BTreeSet, HashMap};

use geomap_core::test_support::{EchoConverter, MemoryCatalogue};
use geomap_core::{ConflictPolicy, RegionDraft};
use geomap_ingest::MapIngestor;
use proptest::prelude::*;

use support::document_for_codes;

static CODE_POOL: [&str; 6] = ["US-CA", "US-NY", "US-TX", "US-WA", "US-OR", "US-NV"];

fn codes_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::collection::vec(proptest::sample::select(CODE_POOL.as_slice()), 1..40)
}

fn seeded_strategy() -> impl Strategy<Value = BTreeSet<&'static str>> {
    proptest::sample::subsequence(CODE_POOL.as_slice(), 0..=CODE_POOL.len())
        .prop_map(|codes| codes.into_iter().collect())
}

fn policy_strategy() -> impl Strategy<Value = ConflictPolicy> {
    prop_oneof![Just(ConflictPolicy::CreateOnly), Just(ConflictPolicy::Update)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn writes_are_bounded_by_distinct_codes(
        codes in codes_strategy(),
        seeded in seeded_strategy(),
        policy in policy_strategy(),
    ) {
        let catalogue = MemoryCatalogue::with_regions(
            seeded
                .iter()
                .map(|code| RegionDraft::new(*code, "Seeded", "POINT(0 0)")),
        );
        let mut ingestor = MapIngestor::new(catalogue, EchoConverter);
        let map = ingestor
            .create_map("Property", &document_for_codes(codes.iter().copied()), policy)
            .expect("ingest succeeds");

        let distinct: BTreeSet<&str> = codes.iter().copied().collect();
        let existing = distinct.intersection(&seeded).count();
        let calls = ingestor.catalogue().calls();

        prop_assert_eq!(calls.bulk_fetches, 1);
        prop_assert_eq!(calls.creates, distinct.len() - existing);
        prop_assert!(calls.creates + calls.updates <= distinct.len());
        prop_assert_eq!(calls.map_creates, 1);
        match policy {
            ConflictPolicy::CreateOnly => prop_assert_eq!(calls.updates, 0),
            ConflictPolicy::Update => prop_assert_eq!(calls.updates, existing),
        }

        prop_assert_eq!(map.features.len(), codes.len());
        let mut identities = HashMap::new();
        for feature in &map.features {
            let id = *identities
                .entry(feature.region.code.clone())
                .or_insert(feature.region.id);
            prop_assert_eq!(id, feature.region.id);
        }
        prop_assert_eq!(identities.len(), distinct.len());
    }
}
