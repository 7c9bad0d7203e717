//! Statistical behaviour of the filter against random UUID keys.
use std::collections::HashSet;

use bloomgate::{BloomFilter, Error};
use uuid::Uuid;

fn unique_ids(n: usize) -> Vec<String> {
    let mut ids = HashSet::with_capacity(n);
    while ids.len() < n {
        ids.insert(Uuid::new_v4().to_string());
    }
    ids.into_iter().collect()
}

/// Check each key before inserting it: since every key is new, any positive
/// answer is a false positive.
#[test]
fn test_check_before_insert() {
    let capacity = 50_000;
    let error_rate = 0.01;
    let ids = unique_ids(capacity);
    let mut bf = BloomFilter::with_rate(capacity as u64, error_rate).unwrap();

    let mut false_positives = 0;
    for id in &ids {
        if bf.contains(id) {
            false_positives += 1;
        }
        bf.add(id);
    }
    let actual = false_positives as f64 / capacity as f64;

    // The filter fills up as the run goes on, so the average over the run
    // stays below the rate reached at capacity.
    assert!(
        actual <= error_rate,
        "observed {} false positives ({}) for a {} filter",
        false_positives,
        actual,
        error_rate
    );
    for id in &ids {
        assert!(bf.contains(id), "false negative for {}", id);
    }
    assert_eq!(bf.inserted(), capacity as u64);
}

#[test]
fn test_false_positive_rate_at_capacity() {
    let capacity = 20_000;
    let samples = 200_000;
    let error_rate = 0.01;
    let mut bf = BloomFilter::with_rate(capacity as u64, error_rate).unwrap();

    let ids = unique_ids(capacity + samples);
    let (inserted, held_out) = ids.split_at(capacity);

    for id in inserted {
        bf.add(id);
    }
    let false_positives = held_out.iter().filter(|id| bf.contains(*id)).count();
    let actual = false_positives as f64 / samples as f64;
    // `sigma` only covers sampling the held-out keys. How full the filter ends
    // up also varies per run, which 3 sigma alone would not absorb.
    let sigma = (error_rate * (1. - error_rate) / samples as f64).sqrt();

    assert!(
        (actual - error_rate).abs() <= 4. * sigma,
        "observed rate {} is not within {} of {}",
        actual,
        4. * sigma,
        error_rate
    );
}

#[test]
fn test_no_false_negatives_past_capacity() {
    let ids = unique_ids(3_000);
    let mut bf = BloomFilter::with_rate(1_000, 0.01).unwrap();

    for id in &ids {
        bf.add(id);
    }
    for id in &ids {
        assert!(bf.contains(id), "false negative for {}", id);
    }
    assert!(bf.expected_error_rate() > 0.01);
}

#[test]
fn test_round_trip_agrees_on_unseen_keys() {
    let ids = unique_ids(500 + 10_000);
    let (inserted, unseen) = ids.split_at(500);
    let mut bf = BloomFilter::with_rate(1000, 0.01).unwrap();

    for id in inserted {
        bf.add(id);
    }
    let restored = BloomFilter::decode(&bf.encode()).unwrap();

    assert_eq!(restored.as_bytes(), bf.as_bytes());
    assert_eq!(restored.params(), bf.params());
    for id in inserted.iter().chain(unseen) {
        assert_eq!(restored.contains(id), bf.contains(id), "disagreement on {}", id);
    }
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filter.bloom");
    let ids = unique_ids(1_000);
    let mut bf = BloomFilter::with_rate(1_000, 0.01).unwrap();

    for id in &ids {
        bf.add(id);
    }
    bf.save(&path).unwrap();

    let restored = BloomFilter::load(&path).unwrap();
    assert_eq!(restored, bf);
    for id in &ids {
        assert!(restored.contains(id));
    }

    // A truncated file is rejected rather than repaired.
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();
    assert!(matches!(BloomFilter::load(&path), Err(Error::CorruptData(_))));
}

#[test]
fn test_create_rejects_bad_config() {
    assert!(matches!(
        BloomFilter::with_rate(0, 0.01),
        Err(Error::InvalidConfiguration { .. })
    ));
    assert!(matches!(
        BloomFilter::with_rate(100, 1.0),
        Err(Error::InvalidConfiguration { .. })
    ));
}
