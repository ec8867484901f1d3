//! Property tests: algebraic identities of the element-wise operators and
//! finite-difference checks of every backward rule.
//!
//! Inputs stay away from zero so that division, ReLU kinks and relative
//! error measurements are well conditioned.

use approx::assert_abs_diff_eq;
use gradcore::*;
use proptest::collection::vec;
use proptest::prelude::*;

fn nonzero() -> impl Strategy<Value = f64> {
    (0.5f64..3.0, any::<bool>()).prop_map(|(magnitude, negative)| {
        if negative { -magnitude } else { magnitude }
    })
}

fn pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..8).prop_flat_map(|n| (vec(nonzero(), n), vec(nonzero(), n)))
}

fn leaf(data: &[f64]) -> Tensor {
    from_flat(data.to_vec(), &[data.len()], true).unwrap()
}

fn constant(data: &[f64]) -> Tensor {
    from_flat(data.to_vec(), &[data.len()], false).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_add_then_subtract_restores((a, b) in pair()) {
        let (ta, tb) = (constant(&a), constant(&b));
        let restored = subtract(&add(&ta, &tb).unwrap(), &tb).unwrap();
        for (got, want) in restored.values().iter().zip(&a) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn prop_divide_then_multiply_restores((a, b) in pair()) {
        let (ta, tb) = (constant(&a), constant(&b));
        let restored = multiply(&divide(&ta, &tb).unwrap(), &tb).unwrap();
        for (got, want) in restored.values().iter().zip(&a) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    fn prop_mean_spreads_gradient_evenly(a in vec(nonzero(), 1..16)) {
        let t = leaf(&a);
        run_backward(&mean(&t).unwrap()).unwrap();
        let n = a.len() as f64;
        for g in t.grad().unwrap() {
            prop_assert_eq!(g, 1.0 / n);
        }
    }

    #[test]
    fn prop_output_tracks_iff_an_input_does(
        (a, b) in pair(),
        track_a in any::<bool>(),
        track_b in any::<bool>(),
    ) {
        let ta = from_flat(a.clone(), &[a.len()], track_a).unwrap();
        let tb = from_flat(b.clone(), &[b.len()], track_b).unwrap();
        let out = multiply(&ta, &tb).unwrap();
        let out = out.borrow();
        prop_assert_eq!(out.requires_grad(), track_a || track_b);
        prop_assert_eq!(out.is_leaf(), !(track_a || track_b));
    }

    #[test]
    fn prop_add_gradient_matches_finite_difference((a, b) in pair()) {
        let other = constant(&b);
        let passed = check_gradients_simple(&leaf(&a), |t| mean(&add(t, &other)?)).unwrap();
        prop_assert!(passed);
    }

    #[test]
    fn prop_subtract_gradient_matches_finite_difference((a, b) in pair()) {
        let other = constant(&b);
        let lhs = check_gradients_simple(&leaf(&a), |t| mean(&subtract(t, &other)?)).unwrap();
        let rhs = check_gradients_simple(&leaf(&a), |t| mean(&subtract(&other, t)?)).unwrap();
        prop_assert!(lhs && rhs);
    }

    #[test]
    fn prop_multiply_gradient_matches_finite_difference((a, b) in pair()) {
        let other = constant(&b);
        let passed = check_gradients_simple(&leaf(&a), |t| mean(&multiply(t, &other)?)).unwrap();
        prop_assert!(passed);

        let squared = check_gradients_simple(&leaf(&a), |t| mean(&multiply(t, t)?)).unwrap();
        prop_assert!(squared);
    }

    #[test]
    fn prop_divide_gradient_matches_finite_difference((a, b) in pair()) {
        let other = constant(&b);
        let numerator = check_gradients_simple(&leaf(&a), |t| mean(&divide(t, &other)?)).unwrap();
        let denominator = check_gradients_simple(&leaf(&b), |t| mean(&divide(&other, t)?)).unwrap();
        prop_assert!(numerator && denominator);
    }

    #[test]
    fn prop_relu_gradient_matches_finite_difference(a in vec(nonzero(), 1..8)) {
        let passed = check_gradients_simple(&leaf(&a), |t| mean(&relu(t))).unwrap();
        prop_assert!(passed);
    }

    #[test]
    fn prop_mse_gradient_matches_finite_difference((a, offsets) in pair()) {
        let targets: Vec<f64> = a.iter().zip(&offsets).map(|(x, d)| x - d).collect();
        let targets = constant(&targets);
        let passed = check_gradients_simple(&leaf(&a), |t| mean_squared_error(t, &targets)).unwrap();
        prop_assert!(passed);
    }

    #[test]
    fn prop_cross_entropy_gradient_matches_finite_difference(
        (classes, probs, labels) in (2usize..5, 1usize..5).prop_flat_map(|(classes, batch)| (
            Just(classes),
            vec(0.1f64..1.0, classes * batch),
            vec(0..classes, batch),
        )),
    ) {
        let batch = labels.len();
        let targets: Vec<f64> = labels.iter().map(|&c| c as f64).collect();
        let targets = constant(&targets);
        let probs = from_flat(probs, &[batch, classes], true).unwrap();
        let passed = check_gradients_simple(&probs, |t| cross_entropy(t, &targets)).unwrap();
        prop_assert!(passed);
    }
}
