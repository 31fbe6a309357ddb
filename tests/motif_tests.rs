use approx::assert_abs_diff_eq;
use grip_occupancy::error::GripError;
use grip_occupancy::motif::Pwm;
use ndarray::{arr2, Array2};

#[test]
fn test_parse_pwm() {
    let pwm = Pwm::parse("PWM: A=[0,1];C=[1,0];G=[0,0];T=[0,0]").unwrap();
    assert_eq!(pwm.len(), 2);
    assert_eq!(
        pwm.matrix(),
        &arr2(&[[0.0, 1.0], [1.0, 0.0], [0.0, 0.0], [0.0, 0.0]])
    );
    assert_eq!(pwm.max_score(), 2.0);
}

#[test]
fn test_parse_pwm_simulator_format() {
    // rows in any order, spaces everywhere
    let pwm = Pwm::parse("PWM: T=[0.5, 0.25]; G=[1.0, 2.0]; C=[-1.5, 0.0]; A=[0.0, -0.5]").unwrap();
    assert_eq!(pwm.matrix()[[0, 1]], -0.5);
    assert_eq!(pwm.matrix()[[1, 0]], -1.5);
    assert_eq!(pwm.matrix()[[3, 0]], 0.5);
    assert_eq!(pwm.max_score(), 3.0);
}

#[test]
fn test_empty_pwm() {
    let pwm = Pwm::parse("").unwrap();
    assert!(pwm.is_empty());
    assert_eq!(pwm.len(), 0);
    assert_eq!(pwm.matrix().shape(), &[4, 0]);
    assert_eq!(pwm.max_score(), 0.0);

    assert!(Pwm::parse("   ").unwrap().is_empty());
}

#[test]
fn test_parse_pwm_errors() {
    let cases = [
        "A=[0,1];C=[1,0];G=[0,0];T=[0,0]",
        "PFM: A=[0,1];C=[1,0];G=[0,0];T=[0,0]",
        "PWM: A=[0,1];C=[1,0];G=[0,0]",
        "PWM: A=[0,1];A=[1,0];G=[0,0];T=[0,0]",
        "PWM: A=[0,1];C=[1,0];G=[0,0];N=[0,0]",
        "PWM: A=[0,1];C=[1];G=[0,0];T=[0,0]",
        "PWM: A=[0,x];C=[1,0];G=[0,0];T=[0,0]",
        "PWM: A=0,1;C=[1,0];G=[0,0];T=[0,0]",
        "PWM: A[0,1];C=[1,0];G=[0,0];T=[0,0]",
    ];
    for case in cases {
        assert!(
            matches!(Pwm::parse(case), Err(GripError::InvalidPwm(_))),
            "{} should be rejected",
            case
        );
    }
}

#[test]
fn test_score_normalized() {
    let pwm = Pwm::parse("PWM: A=[0,1];C=[1,0];G=[0,0];T=[0,0]").unwrap();

    // observed entries minus the best entry of each column
    assert_eq!(pwm.score("ac").unwrap(), 0.0);
    assert_eq!(pwm.score_normalized("ac").unwrap(), -2.0);
    assert_eq!(pwm.score_normalized("aa").unwrap(), -1.0);
    // perfect match
    assert_eq!(pwm.score_normalized("ca").unwrap(), 0.0);
    assert_eq!(pwm.score_normalized("CA").unwrap(), 0.0);
}

#[test]
fn test_score_rejects_unscorable_bases() {
    let pwm = Pwm::parse("PWM: A=[0,1];C=[1,0];G=[0,0];T=[0,0]").unwrap();

    match pwm.score("an") {
        Err(GripError::InvalidSequence { position, .. }) => assert_eq!(position, 1),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(pwm.score("a"), Err(GripError::InvalidSequence { .. })));
    assert!(matches!(pwm.score("aca"), Err(GripError::InvalidSequence { .. })));
}

#[test]
fn test_score_reverse() {
    let matrix = arr2(&[[0.0, -1.0, -2.0], [-1.0, 0.0, -2.0], [-2.0, -2.0, 0.0], [-3.0, -2.0, -1.0]]);
    let pwm = Pwm::from_matrix(matrix).unwrap();
    assert_abs_diff_eq!(pwm.max_score(), 0.0);

    // "ccg" on the opposite strand reads "cgg"
    assert_abs_diff_eq!(pwm.score_reverse("ccg").unwrap(), pwm.score_normalized("cgg").unwrap());
    assert_abs_diff_eq!(pwm.score_reverse("cgt").unwrap(), pwm.score_normalized("acg").unwrap());
}

#[test]
fn test_from_matrix_shape() {
    assert!(matches!(
        Pwm::from_matrix(Array2::zeros((3, 2))),
        Err(GripError::InvalidPwm(_))
    ));
    assert_eq!(Pwm::from_matrix(Array2::zeros((4, 5))).unwrap().len(), 5);
}
