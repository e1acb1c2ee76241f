//! Tests for datasets and groups
//!
//! These tests verify:
//! - Shape and size accounting (elements, logical bytes, file bytes)
//! - Exact and lossy typed round-trips, cross-type reads
//! - Chunked, shuffled, and deflated storage layouts
//! - Creation option preconditions
//! - Group namespaces and path resolution
//! - Persistence across close/reopen

use std::path::PathBuf;

use gridvault::{Container, DatasetOptions, Dimensions, File, VaultError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_vault() -> (TempDir, PathBuf, File) {
    let temp_dir = TempDir::new().unwrap();
    let path: PathBuf = temp_dir.path().join("data.gv");
    let mut file = File::new();
    file.create(&path, false).unwrap();
    (temp_dir, path, file)
}

// =============================================================================
// Shape and Size Tests
// =============================================================================

#[test]
fn test_shape_is_fixed_at_creation() {
    let (_temp, _path, file) = setup_vault();

    let dims = Dimensions::from([13, 3]);
    let dataset = file
        .create_dataset::<f32>("/doh", &dims, &DatasetOptions::new())
        .unwrap();

    assert_eq!(dataset.get_rank().unwrap(), 2);
    assert_eq!(dataset.get_dimensions().unwrap(), dims);
    assert_eq!(dataset.get_size_in_elements().unwrap(), 39);
    assert_eq!(dataset.get_size_in_bytes().unwrap(), 39 * 4);
}

#[test]
fn test_uncompressed_file_bytes_equal_logical_bytes() {
    let (_temp, _path, file) = setup_vault();

    let dataset = file
        .create_dataset::<u16>("d", &Dimensions::from([100]), &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&vec![7u16; 100]));

    assert_eq!(dataset.get_size_in_bytes().unwrap(), 200);
    assert_eq!(dataset.get_size_in_file_bytes().unwrap(), 200);
}

#[test]
fn test_unwritten_dataset_reads_zero() {
    let (_temp, _path, file) = setup_vault();

    let dataset = file
        .create_dataset::<i64>("d", &Dimensions::from([5]), &DatasetOptions::new())
        .unwrap();

    assert_eq!(dataset.get_size_in_file_bytes().unwrap(), 0);

    let mut values = [99i64; 5];
    assert!(dataset.read(&mut values));
    assert_eq!(values, [0; 5]);
}

#[test]
fn test_zero_extent_dataset_is_empty() {
    let (_temp, _path, file) = setup_vault();

    let dataset = file
        .create_dataset::<f32>("d", &Dimensions::from([4, 0]), &DatasetOptions::new())
        .unwrap();

    assert_eq!(dataset.get_size_in_elements().unwrap(), 0);
    assert!(dataset.write::<f32>(&[]));
    let mut values: [f32; 0] = [];
    assert!(dataset.read(&mut values));
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_exact_roundtrip_f32() {
    let (_temp, _path, file) = setup_vault();

    let values: Vec<f32> = (0..39).map(|i| i as f32).collect();
    let dataset = file
        .create_dataset::<f32>("/doh", &Dimensions::from([13, 3]), &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&values));

    let mut out = vec![0.0f32; 39];
    assert!(dataset.read(&mut out));
    assert_eq!(out, values);
}

#[test]
fn test_lossy_f64_to_f32_read() {
    let (_temp, _path, file) = setup_vault();

    let values = [std::f64::consts::PI, 1.0, 2.0, 0.1];
    let dataset = file
        .create_dataset::<f64>("d", &Dimensions::from([4]), &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&values));

    let mut narrow = [0.0f32; 4];
    assert!(dataset.read(&mut narrow));
    for (got, want) in narrow.iter().zip(values.iter()) {
        assert_eq!(*got, *want as f32);
    }
    // pi narrows to the nearest f32
    assert!((narrow[0] - 3.141_592_7).abs() < 1e-6);
}

#[test]
fn test_cross_type_integer_widening() {
    let (_temp, _path, file) = setup_vault();

    let dataset = file
        .create_dataset::<u8>("d", &Dimensions::from([3]), &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&[1u8, 128, 255]));

    let mut wide = [0u32; 3];
    assert!(dataset.read(&mut wide));
    assert_eq!(wide, [1, 128, 255]);

    let mut float = [0.0f64; 3];
    assert!(dataset.read(&mut float));
    assert_eq!(float, [1.0, 128.0, 255.0]);
}

#[test]
fn test_cross_type_write_conversion() {
    let (_temp, _path, file) = setup_vault();

    // The on-disk type stays i16 no matter what the caller writes with
    let dataset = file
        .create_dataset::<i16>("d", &Dimensions::from([3]), &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&[-5.9f64, 0.0, 5.9]));

    let mut out = [0i16; 3];
    assert!(dataset.read(&mut out));
    assert_eq!(out, [-5, 0, 5]);
    assert!(dataset.get_type().unwrap().matches::<i16>());
}

#[test]
fn test_rewrite_replaces_contents() {
    let (_temp, _path, file) = setup_vault();

    let dataset = file
        .create_dataset::<i32>("d", &Dimensions::from([3]), &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&[1, 2, 3]));
    assert!(dataset.write(&[4, 5, 6]));

    let mut values = [0i32; 3];
    assert!(dataset.read(&mut values));
    assert_eq!(values, [4, 5, 6]);
}

#[test]
fn test_undersized_buffers_are_rejected() {
    let (_temp, _path, file) = setup_vault();

    let dataset = file
        .create_dataset::<i32>("d", &Dimensions::from([4]), &DatasetOptions::new())
        .unwrap();

    assert!(!dataset.write(&[1i32, 2, 3]));
    let mut small = [0i32; 3];
    assert!(!dataset.read(&mut small));

    // Oversized buffers are fine; only the dataset's elements are touched
    let big = [9i32; 8];
    assert!(dataset.write(&big));
    let mut out = [0i32; 8];
    assert!(dataset.read(&mut out));
    assert_eq!(&out[..4], &[9, 9, 9, 9]);
}

// =============================================================================
// Creation Precondition Tests
// =============================================================================

#[test]
fn test_rank_zero_creation_fails() {
    let (_temp, _path, file) = setup_vault();

    assert!(matches!(
        file.create_dataset::<f32>("d", &Dimensions::new(), &DatasetOptions::new()),
        Err(VaultError::Create(_))
    ));
}

#[test]
fn test_duplicate_path_fails() {
    let (_temp, _path, file) = setup_vault();

    let dims = Dimensions::from([2]);
    file.create_dataset::<f32>("d", &dims, &DatasetOptions::new())
        .unwrap();

    assert!(matches!(
        file.create_dataset::<f32>("d", &dims, &DatasetOptions::new()),
        Err(VaultError::Create(_))
    ));
}

#[test]
fn test_open_missing_dataset_not_found() {
    let (_temp, _path, file) = setup_vault();

    assert!(matches!(
        file.open_dataset("absent"),
        Err(VaultError::NotFound(_))
    ));
}

#[test]
fn test_compression_requires_chunking() {
    let (_temp, _path, file) = setup_vault();

    let options = DatasetOptions::new().deflate(6);
    assert!(matches!(
        file.create_dataset::<f32>("d", &Dimensions::from([10]), &options),
        Err(VaultError::Create(_))
    ));
}

#[test]
fn test_chunk_rank_must_match_dataset_rank() {
    let (_temp, _path, file) = setup_vault();

    let options = DatasetOptions::new().chunk([5u64]);
    assert!(matches!(
        file.create_dataset::<f32>("d", &Dimensions::from([10, 10]), &options),
        Err(VaultError::Create(_))
    ));
}

#[test]
fn test_compression_level_out_of_range_fails() {
    let (_temp, _path, file) = setup_vault();

    let options = DatasetOptions::new().chunk([5u64]).deflate(10);
    assert!(matches!(
        file.create_dataset::<f32>("d", &Dimensions::from([10]), &options),
        Err(VaultError::Create(_))
    ));
}

// =============================================================================
// Storage Layout Tests
// =============================================================================

#[test]
fn test_chunked_roundtrip_with_partial_chunk() {
    let (_temp, _path, file) = setup_vault();

    let values: Vec<i32> = (0..10).collect();
    let options = DatasetOptions::new().chunk([3u64]);
    let dataset = file
        .create_dataset::<i32>("d", &Dimensions::from([10]), &options)
        .unwrap();
    assert!(dataset.write(&values));

    let mut out = vec![0i32; 10];
    assert!(dataset.read(&mut out));
    assert_eq!(out, values);
}

#[test]
fn test_compressed_shuffled_roundtrip_shrinks_file_bytes() {
    let (_temp, _path, file) = setup_vault();

    // Smooth data: highly compressible after the byte shuffle
    let values: Vec<f32> = (0..10_000).map(|i| (i / 8) as f32).collect();
    let options = DatasetOptions::new().chunk([1000u64]).shuffle().deflate(6);
    let dataset = file
        .create_dataset::<f32>("d", &Dimensions::from([10_000]), &options)
        .unwrap();
    assert!(dataset.write(&values));

    let mut out = vec![0.0f32; 10_000];
    assert!(dataset.read(&mut out));
    assert_eq!(out, values);

    let logical = dataset.get_size_in_bytes().unwrap();
    let stored = dataset.get_size_in_file_bytes().unwrap();
    assert_eq!(logical, 40_000);
    assert!(stored > 0);
    assert!(
        stored < logical,
        "expected compression to shrink storage: {stored} vs {logical}"
    );
}

#[test]
fn test_deflate_without_shuffle_roundtrip() {
    let (_temp, _path, file) = setup_vault();

    let values: Vec<u8> = (0..256).map(|i| (i % 7) as u8).collect();
    let options = DatasetOptions::new().chunk([64u64]).deflate(9);
    let dataset = file
        .create_dataset::<u8>("d", &Dimensions::from([256]), &options)
        .unwrap();
    assert!(dataset.write(&values));

    let mut out = vec![0u8; 256];
    assert!(dataset.read(&mut out));
    assert_eq!(out, values);
}

// =============================================================================
// Group Namespace Tests
// =============================================================================

#[test]
fn test_groups_nest_and_resolve() {
    let (_temp, _path, file) = setup_vault();

    let outer = file.create_group("outer").unwrap();
    let inner = outer.create_group("inner").unwrap();

    let dims = Dimensions::from([2]);
    let dataset = inner
        .create_dataset::<i32>("d", &dims, &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&[10, 20]));

    // Reachable through the full path from the file root
    let via_file = file.open_dataset("outer/inner/d").unwrap();
    let mut values = [0i32; 2];
    assert!(via_file.read(&mut values));
    assert_eq!(values, [10, 20]);

    // And through a reopened group, including an absolute path
    let via_group = file.open_group("outer").unwrap();
    via_group.open_dataset("inner/d").unwrap();
    via_group.open_dataset("/outer/inner/d").unwrap();
}

#[test]
fn test_duplicate_group_fails() {
    let (_temp, _path, file) = setup_vault();

    file.create_group("g").unwrap();
    assert!(matches!(
        file.create_group("g"),
        Err(VaultError::Create(_))
    ));
}

#[test]
fn test_missing_intermediate_group_fails_creation() {
    let (_temp, _path, file) = setup_vault();

    assert!(matches!(
        file.create_dataset::<f32>("absent/d", &Dimensions::from([1]), &DatasetOptions::new()),
        Err(VaultError::Create(_))
    ));
}

#[test]
fn test_open_group_on_dataset_path_fails() {
    let (_temp, _path, file) = setup_vault();

    file.create_dataset::<f32>("d", &Dimensions::from([1]), &DatasetOptions::new())
        .unwrap();

    assert!(matches!(
        file.open_group("d"),
        Err(VaultError::NotFound(_))
    ));
    // And the other way around
    file.create_group("g").unwrap();
    assert!(matches!(
        file.open_dataset("g"),
        Err(VaultError::NotFound(_))
    ));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_explicit_close_invalidates_handle() {
    let (_temp, _path, file) = setup_vault();

    let mut dataset = file
        .create_dataset::<i32>("d", &Dimensions::from([2]), &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&[1, 2]));

    dataset.close();
    dataset.close(); // idempotent

    assert!(matches!(
        dataset.get_dimensions(),
        Err(VaultError::InvalidHandle)
    ));
    assert!(!dataset.write(&[3, 4]));

    // The dataset itself is unaffected; a fresh handle still works
    let reopened = file.open_dataset("d").unwrap();
    let mut values = [0i32; 2];
    assert!(reopened.read(&mut values));
    assert_eq!(values, [1, 2]);

    let mut group = file.create_group("g").unwrap();
    group.close();
    assert!(matches!(
        group.open_dataset("d"),
        Err(VaultError::InvalidHandle)
    ));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_contents_survive_reopen() {
    let (_temp, path, mut file) = setup_vault();

    let group = file.create_group("g").unwrap();
    let values: Vec<f64> = (0..50).map(|i| i as f64 * 0.5).collect();
    let dataset = group
        .create_dataset::<f64>("d", &Dimensions::from([50]), &DatasetOptions::new())
        .unwrap();
    assert!(dataset.write(&values));
    drop(dataset);
    drop(group);
    file.close().unwrap();

    let mut reopened = File::new();
    reopened.open(&path, true).unwrap();
    let dataset = reopened.open_dataset("g/d").unwrap();

    assert_eq!(dataset.get_dimensions().unwrap(), Dimensions::from([50]));
    assert!(dataset.get_type().unwrap().matches::<f64>());
    assert!(dataset.get_size_in_file_bytes().unwrap() > 0);

    let mut out = vec![0.0f64; 50];
    assert!(dataset.read(&mut out));
    assert_eq!(out, values);

    reopened.close().unwrap();
}

#[test]
fn test_compressed_contents_survive_reopen() {
    let (_temp, path, mut file) = setup_vault();

    let values: Vec<i64> = (0..2048).map(|i| i % 3).collect();
    let options = DatasetOptions::new().chunk([512u64]).shuffle().deflate(4);
    let dataset = file
        .create_dataset::<i64>("d", &Dimensions::from([2048]), &options)
        .unwrap();
    assert!(dataset.write(&values));
    drop(dataset);
    file.close().unwrap();

    let mut reopened = File::new();
    reopened.open(&path, false).unwrap();
    let dataset = reopened.open_dataset("d").unwrap();
    let mut out = vec![0i64; 2048];
    assert!(dataset.read(&mut out));
    assert_eq!(out, values);
}
