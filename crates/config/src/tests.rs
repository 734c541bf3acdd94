use super::*;

#[test]
fn defaults_match_reference_values() {
    let config = Config::default();
    assert_eq!(config.data_directory(), Path::new("lsm_data"));
    assert_eq!(config.memtable_max_size(), 1_048_576);
    assert_eq!(config.sstable_max_size(), 10_485_760);
    assert_eq!(config.bloom_filter_false_positive_rate(), 1);
    assert_eq!(config.compaction_threshold(), 4);
}

#[test]
fn builder_overrides_individual_fields() {
    let config = Config::builder()
        .data_directory("/tmp/store")
        .memtable_max_size(4096)
        .build();

    assert_eq!(config.data_directory(), Path::new("/tmp/store"));
    assert_eq!(config.memtable_max_size(), 4096);
    // Untouched fields keep their defaults.
    assert_eq!(config.compaction_threshold(), 4);
}

#[test]
fn builder_overrides_all_fields() {
    let config = Config::builder()
        .data_directory("/var/data")
        .memtable_max_size(1)
        .sstable_max_size(2)
        .bloom_filter_false_positive_rate(5)
        .compaction_threshold(8)
        .build();

    assert_eq!(config.data_directory(), Path::new("/var/data"));
    assert_eq!(config.memtable_max_size(), 1);
    assert_eq!(config.sstable_max_size(), 2);
    assert_eq!(config.bloom_filter_false_positive_rate(), 5);
    assert_eq!(config.compaction_threshold(), 8);
}

#[test]
fn bloom_fpr_fraction_divides_by_100() {
    let config = Config::builder().bloom_filter_false_positive_rate(1).build();
    assert!((config.bloom_filter_false_positive_rate_fraction() - 0.01).abs() < f64::EPSILON);

    let config = Config::builder().bloom_filter_false_positive_rate(25).build();
    assert!((config.bloom_filter_false_positive_rate_fraction() - 0.25).abs() < f64::EPSILON);
}

#[test]
fn wal_path_and_sstable_directory_are_derived_from_data_directory() {
    let config = Config::builder().data_directory("/tmp/kv_root").build();
    assert_eq!(config.wal_path(), Path::new("/tmp/kv_root/wal.log"));
    assert_eq!(config.sstable_directory(), Path::new("/tmp/kv_root/sstables"));
}
