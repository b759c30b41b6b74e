//! Loan application data structures and request validation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Represents a loan applicant to be scored for default risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    /// Applicant age in years
    pub age: u32,

    /// Annual income
    pub income: u64,

    /// Years at current employment
    pub years_employed: u32,

    /// Aggregate credit limit across all cards
    pub credit_limit: u64,

    /// Share of the credit limit in use (0.3 = 30%)
    pub credit_utilization: f64,

    /// Delinquencies over the last two years
    pub delinquencies_2y: u32,

    /// Requested loan amount
    pub loan_amount: u64,
}

/// Numeric kind a field must parse as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
}

/// Declared type and inclusive bounds of one application field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub min: f64,
    pub max: f64,
    pub description: &'static str,
}

/// Request schema for `POST /predict`.
pub const FIELD_SPECS: [FieldSpec; 7] = [
    FieldSpec {
        name: "age",
        kind: FieldKind::Integer,
        min: 18.0,
        max: 100.0,
        description: "Applicant age",
    },
    FieldSpec {
        name: "income",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 10_000_000.0,
        description: "Annual income",
    },
    FieldSpec {
        name: "years_employed",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 80.0,
        description: "Years employed",
    },
    FieldSpec {
        name: "credit_limit",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 10_000_000.0,
        description: "Aggregate credit limit",
    },
    FieldSpec {
        name: "credit_utilization",
        kind: FieldKind::Float,
        min: 0.0,
        max: 5.0,
        description: "Credit utilization ratio (0.3 = 30%)",
    },
    FieldSpec {
        name: "delinquencies_2y",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 100.0,
        description: "Delinquencies over two years",
    },
    FieldSpec {
        name: "loan_amount",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 10_000_000.0,
        description: "Requested loan amount",
    },
];

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Location of the offending value, e.g. `["body", "age"]`
    pub loc: Vec<String>,
    /// Human-readable message
    pub msg: String,
    /// Machine-readable error kind
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    fn new(loc: &[&str], msg: impl Into<String>, kind: &str) -> Self {
        Self {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

impl LoanApplication {
    /// Parse and validate a raw request body.
    ///
    /// Every field is checked; all failures are returned together.
    /// Fields are looked up by name, so key order in the body is irrelevant.
    pub fn from_json_bytes(body: &[u8]) -> Result<Self, Vec<FieldError>> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            vec![FieldError::new(
                &["body"],
                format!("JSON decode error: {}", e),
                "json_invalid",
            )]
        })?;
        Self::from_json(&value)
    }

    /// Validate an already-decoded JSON value.
    pub fn from_json(value: &Value) -> Result<Self, Vec<FieldError>> {
        let object = value.as_object().ok_or_else(|| {
            vec![FieldError::new(
                &["body"],
                "Input should be a valid dictionary",
                "model_attributes_type",
            )]
        })?;

        let mut values = [0.0_f64; FIELD_SPECS.len()];
        let mut errors = Vec::new();

        for (slot, spec) in values.iter_mut().zip(FIELD_SPECS.iter()) {
            match validate_field(object, spec) {
                Ok(v) => *slot = v,
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        // Bounds are checked above, so the casts cannot truncate.
        Ok(Self {
            age: values[0] as u32,
            income: values[1] as u64,
            years_employed: values[2] as u32,
            credit_limit: values[3] as u64,
            credit_utilization: values[4],
            delinquencies_2y: values[5] as u32,
            loan_amount: values[6] as u64,
        })
    }
}

fn validate_field(object: &Map<String, Value>, spec: &FieldSpec) -> Result<f64, FieldError> {
    let loc = ["body", spec.name];
    let raw = object
        .get(spec.name)
        .ok_or_else(|| FieldError::new(&loc, "Field required", "missing"))?;

    let number = match (spec.kind, raw) {
        // Numeric strings are coerced, as a lax schema would.
        (FieldKind::Integer, Value::String(text)) => {
            text.trim().parse::<i64>().map(|v| v as f64).map_err(|_| {
                FieldError::new(
                    &loc,
                    "Input should be a valid integer, unable to parse string as an integer",
                    "int_parsing",
                )
            })?
        }
        (FieldKind::Float, Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                FieldError::new(
                    &loc,
                    "Input should be a valid number, unable to parse string as a number",
                    "float_parsing",
                )
            })?,
        (FieldKind::Integer, _) => raw
            .as_i64()
            .map(|v| v as f64)
            .or_else(|| raw.as_u64().map(|v| v as f64))
            .or_else(|| raw.as_f64().filter(|v| v.fract() == 0.0))
            .ok_or_else(|| {
                FieldError::new(&loc, "Input should be a valid integer", "int_type")
            })?,
        (FieldKind::Float, _) => raw
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| FieldError::new(&loc, "Input should be a valid number", "float_type"))?,
    };

    if number < spec.min {
        return Err(FieldError::new(
            &loc,
            format!("Input should be greater than or equal to {}", spec.min),
            "greater_than_equal",
        ));
    }
    if number > spec.max {
        return Err(FieldError::new(
            &loc,
            format!("Input should be less than or equal to {}", spec.max),
            "less_than_equal",
        ));
    }

    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn good_client() -> Value {
        json!({
            "age": 45,
            "income": 80000,
            "years_employed": 10,
            "credit_limit": 50000,
            "credit_utilization": 0.1,
            "delinquencies_2y": 0,
            "loan_amount": 10000
        })
    }

    #[test]
    fn test_valid_application() {
        let app = LoanApplication::from_json(&good_client()).unwrap();
        assert_eq!(app.age, 45);
        assert_eq!(app.income, 80000);
        assert_eq!(app.credit_utilization, 0.1);
        assert_eq!(app.loan_amount, 10000);
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let reordered = br#"{"loan_amount": 10000, "delinquencies_2y": 0,
            "credit_utilization": 0.1, "credit_limit": 50000,
            "years_employed": 10, "income": 80000, "age": 45}"#;
        let a = LoanApplication::from_json_bytes(reordered).unwrap();
        let b = LoanApplication::from_json(&good_client()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_range_and_missing_fields() {
        let errors = LoanApplication::from_json(&json!({"age": 150, "income": -500})).unwrap_err();

        // age, income and the five missing fields
        assert_eq!(errors.len(), 7);
        assert_eq!(errors[0].loc, vec!["body", "age"]);
        assert_eq!(errors[0].kind, "less_than_equal");
        assert_eq!(errors[1].loc, vec!["body", "income"]);
        assert_eq!(errors[1].kind, "greater_than_equal");
        assert!(errors[2..].iter().all(|e| e.kind == "missing"));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut body = good_client();
        body["age"] = json!(18);
        body["credit_utilization"] = json!(5.0);
        assert!(LoanApplication::from_json(&body).is_ok());

        body["age"] = json!(17);
        let errors = LoanApplication::from_json(&body).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].loc[1], "age");
    }

    #[test]
    fn test_type_errors() {
        let mut body = good_client();
        body["age"] = json!("forty");
        body["income"] = json!(1000.5);
        body["years_employed"] = json!(true);
        body["credit_utilization"] = json!(null);
        body["loan_amount"] = json!("12.5");

        let errors = LoanApplication::from_json(&body).unwrap_err();
        let kinds: Vec<&str> = errors.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["int_parsing", "int_type", "int_type", "float_type", "int_parsing"]
        );
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let mut body = good_client();
        body["age"] = json!("45");
        body["income"] = json!(" 80000 ");
        body["credit_utilization"] = json!("0.1");

        let app = LoanApplication::from_json(&body).unwrap();
        assert_eq!(app, LoanApplication::from_json(&good_client()).unwrap());

        // Coerced values still go through the bounds check.
        body["age"] = json!("150");
        body["credit_utilization"] = json!("NaN");
        let errors = LoanApplication::from_json(&body).unwrap_err();
        let kinds: Vec<&str> = errors.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["less_than_equal", "float_parsing"]);
    }

    #[test]
    fn test_integral_float_accepted_for_integer_field() {
        let mut body = good_client();
        body["age"] = json!(45.0);
        assert_eq!(LoanApplication::from_json(&body).unwrap().age, 45);
    }

    #[test]
    fn test_malformed_body() {
        let errors = LoanApplication::from_json_bytes(b"{not json").unwrap_err();
        assert_eq!(errors[0].loc, vec!["body"]);
        assert_eq!(errors[0].kind, "json_invalid");

        let errors = LoanApplication::from_json_bytes(b"[1, 2, 3]").unwrap_err();
        assert_eq!(errors[0].kind, "model_attributes_type");
    }

    #[test]
    fn test_field_error_serializes_type_key() {
        let err = FieldError::new(&["body", "age"], "Field required", "missing");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "missing");
        assert_eq!(json["loc"][1], "age");
    }
}
