//! Unit tests for the table-driven validator.

use rstest::{fixture, rstest};

use super::*;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("service_name", Rule::NonEmpty),
    FieldSpec::optional("slot", Rule::OneOf(&["production", "staging"])),
    FieldSpec::optional("role", Rule::NonEmptyList),
    FieldSpec::optional("certificate", Rule::NonEmptyBytes).in_group("certificate"),
    FieldSpec::optional("certificate_thumbprint", Rule::NonEmpty).in_group("certificate"),
    FieldSpec::optional("configuration", Rule::WellFormedXml),
];

#[fixture]
fn valid_bag() -> ParameterBag {
    ParameterBag::new()
        .with_text("service_name", Some("  svc  "))
        .with_text("certificate_thumbprint", Some("ABCDEF"))
}

#[rstest]
fn accepts_minimal_parameters_and_trims(valid_bag: ParameterBag) {
    let validated = validate(&valid_bag, FIELDS).expect("bag should validate");

    assert_eq!(validated.text("service_name"), Some("svc"));
    assert_eq!(validated.text("slot"), None);
    assert_eq!(validated.list("role"), None);
}

#[test]
fn reports_missing_required_field() {
    let bag = ParameterBag::new().with_text("certificate_thumbprint", Some("ABCDEF"));

    let err = validate(&bag, FIELDS).expect_err("service name is required");
    assert_eq!(
        err,
        ValidationError::Missing {
            field: "service_name"
        }
    );
}

#[rstest]
#[case::blank_text("service_name", ParamValue::Text(String::from("   ")))]
#[case::empty_bytes("certificate", ParamValue::Bytes(Vec::new()))]
fn rejects_empty_values(
    mut valid_bag: ParameterBag,
    #[case] field: &'static str,
    #[case] value: ParamValue,
) {
    valid_bag.insert(field, value);
    let err = validate(&valid_bag, FIELDS).expect_err("empty value should fail");
    assert_eq!(err, ValidationError::Empty { field });
}

#[rstest]
fn slot_must_be_in_allowed_set(valid_bag: ParameterBag) {
    let bag = valid_bag.with_text("slot", Some("preview"));

    let err = validate(&bag, FIELDS).expect_err("preview is not allowed");
    assert_eq!(err.field(), "slot");
    assert!(
        err.to_string().contains("production, staging"),
        "message should list allowed values: {err}"
    );
}

#[rstest]
fn slot_comparison_ignores_case(valid_bag: ParameterBag) {
    let bag = valid_bag.with_text("slot", Some("Staging"));
    let validated = validate(&bag, FIELDS).expect("mixed case slot is valid");
    assert_eq!(validated.text("slot"), Some("Staging"));
}

#[rstest]
fn explicit_empty_role_list_is_rejected(valid_bag: ParameterBag) {
    let bag = valid_bag.with_list("role", Some::<&[String]>(&[]));
    let err = validate(&bag, FIELDS).expect_err("empty list should fail");
    assert_eq!(err, ValidationError::EmptyList { field: "role" });
}

#[rstest]
fn blank_role_entry_is_rejected_with_position(valid_bag: ParameterBag) {
    let roles = [String::from("WebRole1"), String::from(" ")];
    let bag = valid_bag.with_list("role", Some(&roles[..]));
    let err = validate(&bag, FIELDS).expect_err("blank entry should fail");
    assert_eq!(
        err,
        ValidationError::BlankEntry {
            field: "role",
            index: 1
        }
    );
}

#[rstest]
fn role_entries_are_trimmed_in_order(valid_bag: ParameterBag) {
    let roles = [String::from(" WorkerRole1"), String::from("WebRole1 ")];
    let bag = valid_bag.with_list("role", Some(&roles[..]));
    let validated = validate(&bag, FIELDS).expect("roles are valid");
    assert_eq!(
        validated.list("role"),
        Some(&[String::from("WorkerRole1"), String::from("WebRole1")][..])
    );
}

#[test]
fn neither_group_member_fails() {
    let bag = ParameterBag::new().with_text("service_name", Some("svc"));
    let err = validate(&bag, FIELDS).expect_err("group requires one member");
    assert_eq!(
        err,
        ValidationError::MissingOneOf {
            group: "certificate",
            fields: vec!["certificate", "certificate_thumbprint"],
        }
    );
}

#[rstest]
fn both_group_members_conflict(valid_bag: ParameterBag) {
    let bag = valid_bag.with_bytes("certificate", Some(&b"cert"[..]));
    let err = validate(&bag, FIELDS).expect_err("group members are exclusive");
    assert_eq!(
        err,
        ValidationError::Conflict {
            group: "certificate",
            fields: vec!["certificate", "certificate_thumbprint"],
        }
    );
    assert_eq!(err.field(), "certificate");
}

#[rstest]
#[case::unclosed("<WadCfg>")]
#[case::attribute_without_value("<WadCfg attr></WadCfg>")]
#[case::duplicate_attribute("<WadCfg x=\"1\" x=\"2\"/>")]
#[case::undefined_entity("<WadCfg>&bogus;</WadCfg>")]
fn malformed_xml_is_rejected(valid_bag: ParameterBag, #[case] document: &str) {
    let bag = valid_bag.with_text("configuration", Some(document));
    let err = validate(&bag, FIELDS).expect_err("document is not well formed");
    assert!(
        matches!(err, ValidationError::Malformed { field: "configuration", .. }),
        "unexpected error: {err}"
    );
}

#[rstest]
fn wrong_value_kind_is_rejected(mut valid_bag: ParameterBag) {
    valid_bag.insert("role", ParamValue::Text(String::from("WebRole1")));
    let err = validate(&valid_bag, FIELDS).expect_err("role expects a list");
    assert_eq!(err, ValidationError::WrongKind { field: "role" });
}

#[rstest]
fn undeclared_parameter_is_rejected(valid_bag: ParameterBag) {
    let bag = valid_bag.with_text("colour", Some("blue"));
    let err = validate(&bag, FIELDS).expect_err("colour is not declared");
    assert_eq!(err, ValidationError::Unknown { field: "colour" });
}

#[rstest]
fn validation_is_repeatable(valid_bag: ParameterBag) {
    let first = validate(&valid_bag, FIELDS).expect("first pass");
    let second = validate(&valid_bag, FIELDS).expect("second pass");
    assert_eq!(first, second);
}
