use grip_occupancy::error::{FileCategory, GripError};
use grip_occupancy::landscape::{reconstruct, AccessibilityMask};
use ndarray::{arr2, Array2};
use std::fs;
use tempfile::TempDir;

const NEG_INF: f64 = f64::NEG_INFINITY;

#[test]
fn test_trailing_positions_are_masked() {
    let positions = 12;
    for size in 1..=positions + 2 {
        let raw = Array2::<f64>::zeros((1, positions));
        let masked = reconstruct(&raw, &[size], &AccessibilityMask::fully_open(positions), None).unwrap();

        let reachable = (positions + 1).saturating_sub(size);
        for p in 0..positions {
            if p < reachable {
                assert_eq!(masked[[0, p]], 0.0, "size {} position {}", size, p);
            } else {
                assert_eq!(masked[[0, p]], NEG_INF, "size {} position {}", size, p);
            }
        }
    }
}

#[test]
fn test_footprint_of_one_masks_nothing() {
    let raw = arr2(&[[-1.0, -2.0, -3.0]]);
    let masked = reconstruct(&raw, &[1], &AccessibilityMask::fully_open(3), None).unwrap();
    assert_eq!(masked, raw);
}

#[test]
fn test_rows_use_their_own_footprint() {
    let raw = Array2::<f64>::zeros((2, 10));
    let masked = reconstruct(&raw, &[3, 5], &AccessibilityMask::fully_open(10), None).unwrap();

    assert_eq!(masked.row(0).iter().filter(|v| v.is_finite()).count(), 8);
    assert_eq!(masked.row(1).iter().filter(|v| v.is_finite()).count(), 6);
    assert_eq!(masked[[0, 7]], 0.0);
    assert_eq!(masked[[1, 5]], 0.0);
    assert_eq!(masked[[1, 6]], NEG_INF);
}

#[test]
fn test_all_closed_masks_everything() {
    let raw = arr2(&[[0.0, 5.0, -1.0, 2.0], [1.0, 1.0, 1.0, 1.0]]);
    let thresholds = [10.0, f64::INFINITY];
    for sizes in [[1, 1], [2, 3]] {
        let masked = reconstruct(&raw, &sizes, &AccessibilityMask::fully_closed(4), Some(&thresholds[..])).unwrap();
        assert!(masked.iter().all(|&v| v == NEG_INF));
    }
}

#[test]
fn test_closed_window() {
    let raw = Array2::<f64>::zeros((1, 6));
    let mask = AccessibilityMask::new(vec![true, true, true, false, true, true]);
    let masked = reconstruct(&raw, &[2], &mask, None).unwrap();

    // windows starting at 2 and 3 cover the closed position, 5 runs off the end
    assert_eq!(masked.row(0).to_vec(), vec![0.0, 0.0, NEG_INF, NEG_INF, 0.0, NEG_INF]);
}

#[test]
fn test_threshold_floor() {
    let raw = arr2(&[[0.0, -1.0, -2.0, -0.5], [0.0, -1.0, -2.0, -0.5]]);
    let thresholds = [-1.0, NEG_INF];
    let masked = reconstruct(&raw, &[1, 1], &AccessibilityMask::fully_open(4), Some(&thresholds[..])).unwrap();

    assert_eq!(masked.row(0).to_vec(), vec![0.0, -1.0, -1.0, -0.5]);
    // a -inf threshold leaves the row as it is
    assert_eq!(masked.row(1), raw.row(1));
}

#[test]
fn test_reconstruct_does_not_touch_input() {
    let raw = arr2(&[[1.0, 2.0, 3.0]]);
    let copy = raw.clone();
    let _ = reconstruct(&raw, &[2], &AccessibilityMask::fully_open(3), Some(&[2.5][..])).unwrap();
    assert_eq!(raw, copy);
}

#[test]
fn test_reconstruct_shape_errors() {
    let raw = Array2::<f64>::zeros((2, 4));
    let open = AccessibilityMask::fully_open(4);

    assert!(matches!(
        reconstruct(&raw, &[1], &open, None),
        Err(GripError::InvalidInput(_))
    ));
    assert!(matches!(
        reconstruct(&raw, &[1, 1], &AccessibilityMask::fully_open(3), None),
        Err(GripError::InvalidInput(_))
    ));
    assert!(matches!(
        reconstruct(&raw, &[1, 1], &open, Some(&[0.0][..])),
        Err(GripError::InvalidInput(_))
    ));
    assert!(matches!(
        reconstruct(&raw, &[1, 0], &open, None),
        Err(GripError::InvalidInput(_))
    ));
}

#[test]
fn test_accessibility_mask() {
    let mask = AccessibilityMask::new(vec![true, false, true, true]);
    assert_eq!(mask.len(), 4);
    assert!(mask.is_open(0));
    assert!(!mask.is_open(1));
    assert!(!mask.is_open(10));
    assert!(mask.is_window_open(2, 2));
    assert!(!mask.is_window_open(0, 2));
    assert!(!mask.is_window_open(3, 2));
}

#[test]
fn test_read_accessibility_mask() {
    let mask = AccessibilityMask::read("tests/data/double/seq.btrack", 6).unwrap();
    assert_eq!(
        (0..6).map(|p| mask.is_open(p)).collect::<Vec<_>>(),
        vec![true, true, true, true, false, true]
    );

    // longer files are cut to the landscape
    let mask = AccessibilityMask::read("tests/data/double/seq.btrack", 3).unwrap();
    assert_eq!(mask.len(), 3);
}

#[test]
fn test_read_accessibility_mask_errors() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("seq.btrack");

    fs::write(&path, "1 1\n0 1\n").unwrap();
    assert!(matches!(
        AccessibilityMask::read(&path, 5),
        Err(GripError::MalformedFile { .. })
    ));

    fs::write(&path, "1 1\nopen 1\n").unwrap();
    match AccessibilityMask::read(&path, 4) {
        Err(GripError::MalformedFile { line, .. }) => assert_eq!(line, 2),
        other => panic!("unexpected result: {:?}", other),
    }

    match AccessibilityMask::read(temp.path().join("none.btrack"), 4) {
        Err(GripError::FileNotFound { category, .. }) => assert_eq!(category, FileCategory::Accessibility),
        other => panic!("unexpected result: {:?}", other),
    }
}
