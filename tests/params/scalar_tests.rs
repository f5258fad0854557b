//! Integration tests for the scalar parameter variants

use approx::assert_relative_eq;
use ndarray::Array1;
use paramflat_rs::{
    bounded, bounded_with_margin, deferred, fixed, flatten, positive, positive_with_margin,
    resolve, value_flatten, Value,
};

#[test]
fn test_positive_resolves_near_input() {
    for &v in &[1e-6, 0.1, 1.0, 42.0, 1e8] {
        let param = positive(v).unwrap();
        let resolved = resolve(&param).unwrap().as_real().unwrap();
        assert_relative_eq!(resolved, v, max_relative = 1e-6);
        assert!(resolved > 0.0);
    }
}

#[test]
fn test_positive_margin_scenarios() {
    // Slightly above an explicit margin works...
    let param = positive_with_margin(1e-11, 1e-12).unwrap();
    let resolved = resolve(&param).unwrap().as_real().unwrap();
    assert_relative_eq!(resolved, 1e-11, max_relative = 1e-6);

    // ...below it is a construction error, never a clamp.
    assert!(positive_with_margin(1e-13, 1e-12).is_err());
    assert!(positive(0.0).is_err());
    assert!(positive(-3.0).is_err());
    assert!(positive_with_margin(1.0, 0.0).is_err());
}

#[test]
fn test_positive_stays_above_margin_for_any_internal() {
    let param = positive(1.0).unwrap();
    let (_, unflatten) = value_flatten(&param);

    for &u in &[-700.0, -50.0, 0.0, 50.0] {
        let resolved = unflatten.unflatten(&Array1::from_vec(vec![u])).unwrap();
        assert!(resolved.as_real().unwrap() > 0.0);
    }
}

#[test]
fn test_bounded_concrete_scenario() {
    // bounded(-0.05, -0.1, 2.0) succeeds, round-trips, resolves near -0.05.
    let param = bounded(-0.05, -0.1, 2.0).unwrap();

    let (vector, unflatten) = flatten(&param);
    assert_eq!(vector.len(), 1);
    assert_eq!(unflatten.unflatten(&vector).unwrap(), param);

    let resolved = resolve(&param).unwrap().as_real().unwrap();
    assert_relative_eq!(resolved, -0.05, max_relative = 1e-8);
    assert!(resolved > -0.1);
    assert!(resolved < 2.0);
}

#[test]
fn test_bounded_rejects_out_of_domain() {
    assert!(bounded(2.5, -0.1, 2.0).is_err());
    assert!(bounded(-0.15, -0.1, 2.0).is_err());
    assert!(bounded(0.0, 1.0, -1.0).is_err());
    assert!(bounded_with_margin(0.5, 0.0, 1.0, 0.7).is_err());
    assert!(bounded_with_margin(0.5, 0.0, 1.0, -1e-9).is_err());
}

#[test]
fn test_fixed_zero_length_and_verbatim_return() {
    let original = Value::tuple(vec![Value::Real(1.25), Value::Int(-3)]);
    let param = fixed(original.clone());

    let (vector, unflatten) = flatten(&param);
    assert_eq!(vector.len(), 0);

    let rebuilt = unflatten.unflatten(&vector).unwrap();
    assert_eq!(rebuilt, param);

    // Resolution recovers the wrapped tree itself.
    assert_eq!(resolve(&param).unwrap(), original);
}

#[test]
fn test_fixed_excludes_inner_params_from_tuning() {
    let param = fixed(positive(5.0).unwrap());

    let (vector, _) = flatten(&param);
    assert_eq!(vector.len(), 0);

    let resolved = resolve(&param).unwrap().as_real().unwrap();
    assert_relative_eq!(resolved, 5.0, max_relative = 1e-9);
}

#[test]
fn test_deferred_flattens_args_only() {
    let param = deferred(
        |args| {
            let a = args[0].as_real().ok_or("expected real")?;
            let b = args[1].as_real().ok_or("expected real")?;
            Ok(Value::Real(a - b))
        },
        vec![Value::Real(10.0), positive(4.0).unwrap()],
    );

    let (vector, unflatten) = flatten(&param);
    // One plain real plus one unconstrained positive.
    assert_eq!(vector.len(), 2);

    let rebuilt = unflatten.unflatten(&vector).unwrap();
    assert_eq!(rebuilt, param);

    let resolved = resolve(&rebuilt).unwrap().as_real().unwrap();
    assert_relative_eq!(resolved, 6.0, max_relative = 1e-9);
}

#[test]
fn test_deferred_retuned_through_vector() {
    let param = deferred(
        |args| {
            let a = args[0].as_real().ok_or("expected real")?;
            Ok(Value::Real(a * a))
        },
        vec![Value::Real(3.0)],
    );

    let (_, unflatten) = value_flatten(&param);
    let resolved = unflatten.unflatten(&Array1::from_vec(vec![5.0])).unwrap();
    assert_relative_eq!(resolved.as_real().unwrap(), 25.0, max_relative = 1e-12);
}
