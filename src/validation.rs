//! Request validation for soil sample payloads.
//!
//! Bodies arrive as untyped JSON. [`normalize`] checks them against one of two
//! shapes and either returns every field coerced to `f64` or the full list of
//! violations. Nothing is written unless the whole payload passes.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{NewSoilSample, SoilSamplePatch};

/// Field-presence contract for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Every field required
    Create,
    /// Every field optional, `null` allowed and ignored
    Update,
}

/// Validated values. Under [`Shape::Create`] every field is `Some`.
pub type FieldSet = SoilSamplePatch;

/// Declared inclusive range of one measurement
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Measurement fields in wire order
pub const FIELDS: [FieldSpec; 4] = [
    FieldSpec { name: "potassium", min: 0.0, max: 2000.0 },
    FieldSpec { name: "nitrogen", min: 0.0, max: 500.0 },
    FieldSpec { name: "phosphorus", min: 0.0, max: 200.0 },
    FieldSpec { name: "pH", min: 0.0, max: 14.0 },
];

/// Machine-readable failure code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    FloatType,
    FloatParsing,
    GreaterThanEqual,
    LessThanEqual,
    ModelType,
}

/// One offending field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub loc: Vec<String>,
    pub msg: String,
}

impl FieldError {
    fn new(kind: ErrorKind, field: Option<&str>, msg: impl Into<String>) -> Self {
        Self {
            kind,
            loc: field.map(|f| vec![f.to_string()]).unwrap_or_default(),
            msg: msg.into(),
        }
    }

    /// Name of the field this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        self.loc.first().map(String::as_str)
    }
}

/// Every violation found in a payload
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("validation failed for {} field(s)", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Offending field names in report order
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().filter_map(FieldError::field).collect()
    }
}

/// Parse a request body leniently.
///
/// Missing or malformed JSON, and JSON-falsy values (`null`, `false`, `0`,
/// `""`, `[]`, `{}`), all read as an empty object.
pub fn parse_body(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) if !is_falsy(&value) => value,
        _ => Value::Object(Map::new()),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Check `raw` against `shape`, collecting every violation.
pub fn normalize(shape: Shape, raw: &Value) -> Result<FieldSet, ValidationErrors> {
    let Some(object) = raw.as_object() else {
        return Err(ValidationErrors(vec![FieldError::new(
            ErrorKind::ModelType,
            None,
            "Input should be a valid dictionary or object to extract fields from",
        )]));
    };

    let mut values: [Option<f64>; 4] = [None; 4];
    let mut errors = Vec::new();

    for (slot, spec) in values.iter_mut().zip(FIELDS.iter()) {
        match (object.get(spec.name), shape) {
            (None, Shape::Create) => {
                errors.push(FieldError::new(
                    ErrorKind::Missing,
                    Some(spec.name),
                    "Field required",
                ));
            }
            (None, Shape::Update) | (Some(Value::Null), Shape::Update) => {}
            (Some(value), _) => match check_field(spec, value) {
                Ok(v) => *slot = Some(v),
                Err(e) => errors.push(e),
            },
        }
    }

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    let [potassium, nitrogen, phosphorus, ph] = values;
    Ok(FieldSet {
        potassium,
        nitrogen,
        phosphorus,
        ph,
    })
}

/// Validate a create payload into a complete record input
pub fn validate_create(raw: &Value) -> Result<NewSoilSample, ValidationErrors> {
    let fields = normalize(Shape::Create, raw)?;
    match (fields.potassium, fields.nitrogen, fields.phosphorus, fields.ph) {
        (Some(potassium), Some(nitrogen), Some(phosphorus), Some(ph)) => Ok(NewSoilSample {
            potassium,
            nitrogen,
            phosphorus,
            ph,
        }),
        _ => Err(ValidationErrors(
            FIELDS
                .iter()
                .zip([fields.potassium, fields.nitrogen, fields.phosphorus, fields.ph])
                .filter(|(_, value)| value.is_none())
                .map(|(spec, _)| {
                    FieldError::new(ErrorKind::Missing, Some(spec.name), "Field required")
                })
                .collect(),
        )),
    }
}

/// Validate an update payload into a sparse patch
pub fn validate_update(raw: &Value) -> Result<SoilSamplePatch, ValidationErrors> {
    normalize(Shape::Update, raw)
}

/// Coerce a JSON value to `f64` and range-check it.
fn check_field(spec: &FieldSpec, value: &Value) -> Result<f64, FieldError> {
    let name = Some(spec.name);
    let number = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            FieldError::new(ErrorKind::FloatType, name, "Input should be a valid number")
        })?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            FieldError::new(
                ErrorKind::FloatParsing,
                name,
                "Input should be a valid number, unable to parse string as a number",
            )
        })?,
        _ => {
            return Err(FieldError::new(
                ErrorKind::FloatType,
                name,
                "Input should be a valid number",
            ))
        }
    };

    // NaN is below every minimum, infinities are outside every range
    if number.is_nan() || number < spec.min {
        return Err(FieldError::new(
            ErrorKind::GreaterThanEqual,
            name,
            format!("Input should be greater than or equal to {}", spec.min),
        ));
    }
    if number > spec.max {
        return Err(FieldError::new(
            ErrorKind::LessThanEqual,
            name,
            format!("Input should be less than or equal to {}", spec.max),
        ));
    }

    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_create() {
        let sample =
            validate_create(&json!({"potassium": 40, "nitrogen": 20, "phosphorus": 15, "pH": 6.5}))
                .unwrap();

        assert_eq!(sample.potassium, 40.0);
        assert_eq!(sample.nitrogen, 20.0);
        assert_eq!(sample.phosphorus, 15.0);
        assert_eq!(sample.ph, 6.5);
    }

    #[test]
    fn test_create_reports_every_missing_field() {
        let err = validate_create(&json!({"nitrogen": 20})).unwrap_err();

        assert_eq!(err.fields(), vec!["potassium", "phosphorus", "pH"]);
        assert!(err.errors().iter().all(|e| e.kind == ErrorKind::Missing));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let payload = json!({"potassium": 2000, "nitrogen": 0, "phosphorus": 200, "pH": 14});
        assert!(validate_create(&payload).is_ok());

        let payload = json!({"potassium": 2000.5, "nitrogen": -1, "phosphorus": 200, "pH": 14.01});
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["potassium", "nitrogen", "pH"]);
        assert_eq!(err.errors()[0].kind, ErrorKind::LessThanEqual);
        assert_eq!(err.errors()[0].msg, "Input should be less than or equal to 2000");
        assert_eq!(err.errors()[1].kind, ErrorKind::GreaterThanEqual);
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let sample = validate_create(
            &json!({"potassium": "12.5", "nitrogen": " 3 ", "phosphorus": 1, "pH": 7}),
        )
        .unwrap();
        assert_eq!(sample.potassium, 12.5);
        assert_eq!(sample.nitrogen, 3.0);
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        let payload = json!({
            "potassium": "lots",
            "nitrogen": true,
            "phosphorus": [1],
            "pH": "nan"
        });
        let err = validate_create(&payload).unwrap_err();

        let kinds: Vec<ErrorKind> = err.errors().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::FloatParsing,
                ErrorKind::FloatType,
                ErrorKind::FloatType,
                ErrorKind::GreaterThanEqual,
            ]
        );
    }

    #[test]
    fn test_non_finite_values_fail_the_range_check() {
        let payload = json!({
            "potassium": "inf",
            "nitrogen": "-inf",
            "phosphorus": "NaN",
            "pH": 7
        });
        let err = validate_create(&payload).unwrap_err();

        let kinds: Vec<ErrorKind> = err.errors().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::LessThanEqual,
                ErrorKind::GreaterThanEqual,
                ErrorKind::GreaterThanEqual,
            ]
        );
        assert_eq!(err.fields(), vec!["potassium", "nitrogen", "phosphorus"]);
    }

    #[test]
    fn test_null_in_create_is_a_type_error() {
        let payload = json!({"potassium": null, "nitrogen": 1, "phosphorus": 1, "pH": 7});
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(err.fields(), vec!["potassium"]);
        assert_eq!(err.errors()[0].kind, ErrorKind::FloatType);
    }

    #[test]
    fn test_update_fields_are_optional() {
        let patch = validate_update(&json!({"potassium": 55, "pH": null})).unwrap();

        assert_eq!(patch.potassium, Some(55.0));
        assert_eq!(patch.nitrogen, None);
        assert_eq!(patch.ph, None);
        assert!(validate_update(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_update_still_range_checks() {
        let err = validate_update(&json!({"phosphorus": 500})).unwrap_err();
        assert_eq!(err.fields(), vec!["phosphorus"]);
    }

    #[test]
    fn test_non_object_body() {
        let err = normalize(Shape::Update, &json!([1, 2, 3])).unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].kind, ErrorKind::ModelType);
        assert!(err.errors()[0].loc.is_empty());
    }

    #[test]
    fn test_parse_body_is_lenient() {
        assert_eq!(parse_body(b""), json!({}));
        assert_eq!(parse_body(b"not json"), json!({}));
        assert_eq!(parse_body(b"null"), json!({}));
        assert_eq!(parse_body(b"[]"), json!({}));
        assert_eq!(parse_body(b"0"), json!({}));
        assert_eq!(parse_body(b"[1]"), json!([1]));
        assert_eq!(parse_body(br#"{"pH": 7}"#), json!({"pH": 7}));
    }

    #[test]
    fn test_error_wire_shape() {
        let err = validate_create(&json!({})).unwrap_err();
        let json = serde_json::to_value(&err.errors()[0]).unwrap();
        assert_eq!(json, json!({"type": "missing", "loc": ["potassium"], "msg": "Field required"}));
    }
}
