use isofem::error::KernelError;
use isofem::parameters::ParameterData;

#[test]
fn added_parameters_can_be_read_back() {
    let mut data = ParameterData::new();
    *data.add::<f64>("young_modulus").unwrap() = 210e9;
    *data.add::<i64>("integration_order").unwrap() = 2;

    assert_eq!(data.get::<f64>("young_modulus"), Ok(210e9));
    assert_eq!(data.get::<i64>("integration_order"), Ok(2));
    assert!(data.contains::<f64>("young_modulus"));
    assert!(!data.contains::<i64>("young_modulus"));
}

#[test]
fn added_parameters_start_from_default() {
    let mut data = ParameterData::new();
    data.add::<f64>("thickness").unwrap();
    assert_eq!(data.get::<f64>("thickness"), Ok(0.0));
}

#[test]
fn duplicate_parameters_are_rejected() {
    let mut data = ParameterData::new();
    data.set("poisson_ratio", 0.3).unwrap();
    assert_eq!(
        data.set("poisson_ratio", 0.25),
        Err(KernelError::DuplicateParameter {
            name: "poisson_ratio".to_string()
        })
    );
    // The original value is kept
    assert_eq!(data.get::<f64>("poisson_ratio"), Ok(0.3));
}

#[test]
fn integer_and_real_parameters_have_separate_namespaces() {
    let mut data = ParameterData::new();
    data.set::<i64>("order", 3).unwrap();
    data.set::<f64>("order", 1.5).unwrap();
    assert_eq!(data.get::<i64>("order"), Ok(3));
    assert_eq!(data.get::<f64>("order"), Ok(1.5));
}

#[test]
fn missing_parameters_are_reported() {
    let data = ParameterData::new();
    assert_eq!(
        data.get::<f64>("yield_stress"),
        Err(KernelError::MissingParameter {
            name: "yield_stress".to_string()
        })
    );
}

#[test]
fn parameter_data_serde_roundtrip() {
    let mut data = ParameterData::new();
    data.set("young_modulus", 1000.0).unwrap();
    data.set::<i64>("order", 2).unwrap();

    let json = serde_json::to_string(&data).unwrap();
    let deserialized: ParameterData = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, data);

    // Either namespace may be omitted
    let reals_only: ParameterData = serde_json::from_str(r#"{ "real_data": { "yield_stress": 250.0 } }"#).unwrap();
    assert_eq!(reals_only.get::<f64>("yield_stress"), Ok(250.0));
}
