//! # Filter Properties
//!
//! Membership and estimation guarantees across shapes, through the
//! snapshot wire format clients actually receive.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{random_hex_ids, small_filter_config};
    use sv_01_bloom_filter::{
        BloomFilter, BloomFilterSnapshot, FilterConfig, FilterError, IdentifierEncoding,
        SnapshotVersion,
    };

    #[test]
    fn test_no_false_negatives_after_snapshot_roundtrip() {
        for (bits, k) in [(32, 1), (4096, 3), (492_320, 5)] {
            let config = FilterConfig {
                capacity_bits: bits,
                hash_count: k,
                ..Default::default()
            };
            let mut filter = config.empty_filter().unwrap();
            let ids = random_hex_ids(200, bits as u64);
            for id in &ids {
                filter.add(id).unwrap();
            }

            let json = BloomFilterSnapshot::from_filter(&filter, SnapshotVersion::next_after(None))
                .to_json()
                .unwrap();
            let client = BloomFilterSnapshot::from_json(&json)
                .unwrap()
                .into_filter(&config)
                .unwrap();

            for id in &ids {
                assert!(client.check(id).unwrap(), "false negative for {}", id);
            }
        }
    }

    #[test]
    fn test_estimate_within_ten_percent_for_500_ids() {
        let mut filter = small_filter_config().empty_filter().unwrap();
        for id in random_hex_ids(500, 42) {
            filter.add(&id).unwrap();
        }

        let estimate = filter.estimate_count();

        assert!(
            (450.0..=550.0).contains(&estimate),
            "estimate {} outside 10% of 500",
            estimate
        );
    }

    #[test]
    fn test_merge_preserves_membership_of_both_operands() {
        let config = small_filter_config();
        let mut a = config.empty_filter().unwrap();
        let mut b = config.empty_filter().unwrap();
        let ids_a = random_hex_ids(100, 1);
        let ids_b = random_hex_ids(100, 2);
        for id in &ids_a {
            a.add(id).unwrap();
        }
        for id in &ids_b {
            b.add(id).unwrap();
        }
        let probes = random_hex_ids(1000, 3);
        let positive_before: Vec<_> = probes
            .iter()
            .filter(|id| a.check(id).unwrap() || b.check(id).unwrap())
            .cloned()
            .collect();

        a.merge(&b).unwrap();

        for id in ids_a.iter().chain(&ids_b).chain(&positive_before) {
            assert!(a.check(id).unwrap());
        }
    }

    #[test]
    fn test_merge_mismatch_signals_and_preserves() {
        let mut a = BloomFilter::new(1024, 4).unwrap();
        let b = BloomFilter::new(2048, 4).unwrap();
        a.add("abcd").unwrap();
        let before = a.clone();

        assert!(matches!(a.merge(&b), Err(FilterError::SizeMismatch { .. })));
        assert_eq!(a, before);
    }

    #[test]
    fn test_text_identifiers_use_general_hash() {
        let config = FilterConfig {
            capacity_bits: 4096,
            hash_count: 4,
            encoding: IdentifierEncoding::Text,
        };
        let mut filter = config.empty_filter().unwrap();

        filter.add("profile_42").unwrap();

        assert!(filter.check("profile_42").unwrap());
        assert!(!filter.check("profile_43").unwrap());
    }
}
