use approx::{assert_abs_diff_eq, assert_relative_eq};
use grip_occupancy::error::{DistributionKind, GripError};
use grip_occupancy::landscape::{reconstruct, AccessibilityMask};
use grip_occupancy::occupancy::{
    empirical_probability, occupancy_per_run, theoretical_probability,
    total_bind_time, ProbabilityOptions,
};
use ndarray::{arr1, arr2, Array2, Axis};

const NEG_INF: f64 = f64::NEG_INFINITY;

#[test]
fn test_boltzmann_weights() {
    let dist = theoretical_probability(&arr2(&[[0.0, -1.0, NEG_INF]]), ProbabilityOptions::default()).unwrap();
    let total = 1.0 + (-1.0f64).exp();
    assert_relative_eq!(dist.values[[0, 0]], 1.0 / total);
    assert_relative_eq!(dist.values[[0, 1]], (-1.0f64).exp() / total);
    assert_eq!(dist.values[[0, 2]], 0.0);
    assert_relative_eq!(dist.log_totals[0], total.ln());
}

#[test]
fn test_theoretical_extreme_values() {
    let options = ProbabilityOptions::default();

    // exp(710) overflows a double
    let dist = theoretical_probability(&arr2(&[[710.0, 0.0]]), options).unwrap();
    assert!(dist.degenerate.is_empty());
    assert_relative_eq!(dist.values[[0, 0]], 1.0);
    assert_relative_eq!(dist.values[[0, 1]], (-710.0f64).exp(), max_relative = 1e-9);
    assert_relative_eq!(dist.log_totals[0], 710.0);

    // exp(-800) underflows to zero
    let dist = theoretical_probability(&arr2(&[[-800.0, -801.0, NEG_INF]]), options).unwrap();
    let expected = 1.0 / (1.0 + (-1.0f64).exp());
    assert_relative_eq!(dist.values[[0, 0]], expected, epsilon = 1e-12);
    assert_relative_eq!(dist.values[[0, 1]], 1.0 - expected, epsilon = 1e-12);
    assert_eq!(dist.values[[0, 2]], 0.0);
    assert_relative_eq!(dist.log_totals[0], -800.0 + (1.0 + (-1.0f64).exp()).ln(), epsilon = 1e-9);

    // only a row without any finite site is degenerate
    let dist = theoretical_probability(
        &arr2(&[[-1000.0, NEG_INF], [NEG_INF, NEG_INF]]),
        ProbabilityOptions {
            zero_degenerate_rows: true,
        },
    )
    .unwrap();
    assert_eq!(dist.degenerate, vec![1]);
    assert_eq!(dist.values.row(0).to_vec(), vec![1.0, 0.0]);
    assert_eq!(dist.log_totals[1], NEG_INF);
}

#[test]
fn test_theoretical_rows_sum_to_one() {
    let landscape = arr2(&[
        [0.0, -0.3, -2.5, NEG_INF, -7.0],
        [-1.0, NEG_INF, NEG_INF, NEG_INF, NEG_INF],
        [-30.0, -40.0, -35.0, -31.0, -50.0],
    ]);
    let dist = theoretical_probability(&landscape, ProbabilityOptions::default()).unwrap();

    assert!(dist.degenerate.is_empty());
    for row in dist.values.axis_iter(Axis(0)) {
        assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
    }
    assert_eq!(dist.values[[0, 3]], 0.0);
    assert_eq!(dist.values[[1, 0]], 1.0);
}

#[test]
fn test_uniform_landscape_after_masking() {
    let raw = Array2::<f64>::zeros((2, 10));
    let masked = reconstruct(&raw, &[3, 5], &AccessibilityMask::fully_open(10), None).unwrap();
    let dist = theoretical_probability(&masked, ProbabilityOptions::default()).unwrap();

    for p in 0..10 {
        let kr = if p < 8 { 1.0 / 8.0 } else { 0.0 };
        let hb = if p < 6 { 1.0 / 6.0 } else { 0.0 };
        assert_abs_diff_eq!(dist.values[[0, p]], kr, epsilon = 1e-12);
        assert_abs_diff_eq!(dist.values[[1, p]], hb, epsilon = 1e-12);
    }

    // without the edge mask the rows would be uniform over all positions
    let unmasked = theoretical_probability(&raw, ProbabilityOptions::default()).unwrap();
    assert!(unmasked.values.iter().all(|&v| (v - 0.1).abs() < 1e-12));
}

#[test]
fn test_degenerate_theoretical_row() {
    let landscape = arr2(&[[0.0, -1.0], [NEG_INF, NEG_INF]]);

    match theoretical_probability(&landscape, ProbabilityOptions::default()) {
        Err(GripError::DegenerateDistribution { row, kind }) => {
            assert_eq!(row, 1);
            assert_eq!(kind, DistributionKind::Theoretical);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let options = ProbabilityOptions {
        zero_degenerate_rows: true,
    };
    let dist = theoretical_probability(&landscape, options).unwrap();
    assert_eq!(dist.degenerate, vec![1]);
    assert_eq!(dist.values.row(1).to_vec(), vec![0.0, 0.0]);
    assert_relative_eq!(dist.values.row(0).sum(), 1.0);
}

#[test]
fn test_occupancy_per_run() {
    let counts = arr2(&[[8.0, 4.0, 4.0], [2.0, 4.0, 6.0]]);
    assert_eq!(
        occupancy_per_run(&counts, 2),
        arr2(&[[4.0, 2.0, 2.0], [1.0, 2.0, 3.0]])
    );
    assert_eq!(total_bind_time(&counts, 2), arr1(&[8.0, 6.0]));
    assert_eq!(total_bind_time(&counts, 4), arr1(&[4.0, 3.0]));
}

#[test]
fn test_empirical_probability() {
    let counts = arr2(&[[8.0, 4.0, 4.0, 0.0], [2.0, 4.0, 6.0, 8.0]]);
    let dist = empirical_probability(&counts, 2, ProbabilityOptions::default()).unwrap();

    assert_eq!(dist.values.row(0).to_vec(), vec![0.5, 0.25, 0.25, 0.0]);
    assert_eq!(dist.values.row(1).to_vec(), vec![0.1, 0.2, 0.3, 0.4]);

    // the ensemble size cancels out
    let other = empirical_probability(&counts, 7, ProbabilityOptions::default()).unwrap();
    for (a, b) in dist.values.iter().zip(other.values.iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn test_empirical_row_never_bound() {
    let counts = arr2(&[[0.0, 0.0], [1.0, 3.0]]);

    match empirical_probability(&counts, 1, ProbabilityOptions::default()) {
        Err(GripError::DegenerateDistribution { row, kind }) => {
            assert_eq!(row, 0);
            assert_eq!(kind, DistributionKind::Empirical);
        }
        other => panic!("unexpected result: {:?}", other),
    }

    let options = ProbabilityOptions {
        zero_degenerate_rows: true,
    };
    let dist = empirical_probability(&counts, 1, options).unwrap();
    assert_eq!(dist.degenerate, vec![0]);
    assert_eq!(dist.values.row(1).to_vec(), vec![0.25, 0.75]);
}
