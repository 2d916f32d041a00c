//! End-to-end ARFF round-trip: write a dataset out, read it back, and
//! check the schema and values survive.

use rule_induction::arff;
use rule_induction::attribute::Attribute;
use rule_induction::dataset::Dataset;

fn sample_dataset() -> Dataset {
    let mut dataset = Dataset::new(
        "iris-like",
        Attribute::nominal(
            "species",
            vec!["setosa".to_string(), "versicolor".to_string()],
        ),
    );
    dataset
        .add_attribute(vec![5.1, 4.9, 6.0, 6.5], Attribute::numerical("sepal_length"))
        .unwrap();
    dataset
        .add_attribute(
            vec![f64::NAN, 1.0, 0.0, 1.0],
            Attribute::nominal("has_spots", vec!["no".to_string(), "yes".to_string()]),
        )
        .unwrap();
    dataset.add_decision(vec![0.0, 0.0, 1.0, 1.0]).unwrap();
    dataset
}

#[test]
fn save_then_load_preserves_schema_and_values() {
    let dataset = sample_dataset();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.arff");

    arff::save_to_arff(&path, &dataset).unwrap();
    let loaded = arff::load_from_arff(&path).unwrap();

    assert_eq!(loaded.name(), "iris-like");
    assert_eq!(loaded.num_examples(), dataset.num_examples());
    assert_eq!(
        loaded.num_conditional_attributes(),
        dataset.num_conditional_attributes()
    );
    assert_eq!(
        loaded.decision_attribute().levels(),
        dataset.decision_attribute().levels()
    );

    for i in 0..dataset.num_examples() {
        assert_eq!(loaded.example(i).decision(), dataset.example(i).decision());
        assert_eq!(loaded.example(i).attribute(0), dataset.example(i).attribute(0));
        let original = dataset.example(i).attribute(1);
        let round_tripped = loaded.example(i).attribute(1);
        if original.is_nan() {
            assert!(round_tripped.is_nan());
        } else {
            assert_eq!(round_tripped, original);
        }
    }
}

#[test]
fn load_from_arff_rejects_shape_mismatched_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.arff");
    std::fs::write(
        &path,
        "@RELATION bad\n@ATTRIBUTE x1 NUMERIC\n@ATTRIBUTE class {a,b}\n@DATA\n1.0,a\n2.0\n",
    )
    .unwrap();

    let err = arff::load_from_arff(&path).unwrap_err();
    assert!(matches!(
        err,
        rule_induction::error::RuleInductionError::ShapeMismatch { .. }
    ));
}
