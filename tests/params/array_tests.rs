//! Integration tests for the element-wise array parameter variants

use approx::assert_relative_eq;
use ndarray::{array, Array1, ArrayD};
use paramflat_rs::{
    bounded_array, bounded_array_with_margin, flatten, positive_array, positive_array_with_margin,
    resolve, value_flatten, Value,
};

fn resolved_array(value: &Value) -> ArrayD<f64> {
    resolve(value).unwrap().as_array().unwrap().clone()
}

#[test]
fn test_positive_array_round_trip() {
    let values = array![[0.5, 2.0], [1e-3, 10.0]].into_dyn();
    let param = positive_array(&values).unwrap();

    let (vector, unflatten) = flatten(&param);
    assert_eq!(vector.len(), 4);
    assert_eq!(unflatten.unflatten(&vector).unwrap(), param);

    let resolved = resolved_array(&param);
    assert_eq!(resolved.shape(), values.shape());
    for (r, v) in resolved.iter().zip(values.iter()) {
        assert_relative_eq!(*r, *v, max_relative = 1e-6);
    }
}

#[test]
fn test_positive_array_whole_array_is_one_parameter() {
    // A 3-d array flattens to exactly its element count, no per-element
    // wrapper overhead in the tree.
    let values = ArrayD::from_shape_vec(vec![2, 3, 4], vec![1.0; 24]).unwrap();
    let param = positive_array(&values).unwrap();

    let (vector, _) = flatten(&param);
    assert_eq!(vector.len(), 24);

    match &param {
        Value::Param(_) => {}
        other => panic!("Expected a single Param node, got {:?}", other),
    }
}

#[test]
fn test_positive_array_any_internal_resolves_positive() {
    let values = array![1.0, 2.0, 3.0].into_dyn();
    let param = positive_array_with_margin(&values, 1e-9).unwrap();

    let (_, unflatten) = value_flatten(&param);
    let hostile = Array1::from_vec(vec![-200.0, 0.0, 200.0]);
    let resolved = unflatten.unflatten(&hostile).unwrap();

    for v in resolved.as_array().unwrap().iter() {
        assert!(*v > 0.0);
    }
}

#[test]
fn test_positive_array_rejects_bad_elements() {
    assert!(positive_array(&array![1.0, 0.0].into_dyn()).is_err());
    assert!(positive_array(&array![1.0, -2.0].into_dyn()).is_err());
    assert!(positive_array_with_margin(&array![1.0].into_dyn(), -1e-3).is_err());
}

#[test]
fn test_bounded_array_round_trip() {
    let values = array![0.1, 0.5, 0.9].into_dyn();
    let param = bounded_array(&values, 0.0, 1.0).unwrap();

    let (vector, unflatten) = flatten(&param);
    assert_eq!(vector.len(), 3);
    assert_eq!(unflatten.unflatten(&vector).unwrap(), param);

    let resolved = resolved_array(&param);
    for (r, v) in resolved.iter().zip(values.iter()) {
        assert_relative_eq!(*r, *v, max_relative = 1e-8);
        assert!(*r > 0.0 && *r < 1.0);
    }
}

#[test]
fn test_bounded_array_any_internal_stays_inside() {
    let values = array![[-0.5, 0.5]].into_dyn();
    let param = bounded_array(&values, -1.0, 1.0).unwrap();

    let (_, unflatten) = value_flatten(&param);
    let hostile = Array1::from_vec(vec![-1e3, 1e3]);
    let resolved = unflatten.unflatten(&hostile).unwrap();

    for v in resolved.as_array().unwrap().iter() {
        assert!(*v > -1.0 && *v < 1.0);
    }
}

#[test]
fn test_bounded_array_rejects_bad_elements() {
    assert!(bounded_array(&array![0.5, 1.5].into_dyn(), 0.0, 1.0).is_err());
    assert!(bounded_array(&array![0.5].into_dyn(), 1.0, 0.0).is_err());
    assert!(bounded_array_with_margin(&array![0.5].into_dyn(), 0.0, 1.0, 0.6).is_err());
}
