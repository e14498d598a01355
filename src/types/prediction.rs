//! Model prediction output

use serde::Serialize;

/// Single-row model output.
///
/// Numeric outputs are always reported as `f64`; anything the model emits that
/// is not numerically convertible is passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    Scalar(f64),
    Label(String),
}

impl Prediction {
    /// Build a prediction from a string label, preferring a numeric reading
    pub fn from_label(label: &str) -> Self {
        match label.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Prediction::Scalar(value),
            _ => Prediction::Label(label.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_label_becomes_scalar() {
        assert_eq!(Prediction::from_label("3.25"), Prediction::Scalar(3.25));
        assert_eq!(Prediction::from_label(" 2 "), Prediction::Scalar(2.0));
    }

    #[test]
    fn test_text_label_passes_through() {
        let prediction = Prediction::from_label("rice");
        assert_eq!(prediction, Prediction::Label("rice".to_string()));
        assert_eq!(Prediction::from_label("inf"), Prediction::Label("inf".to_string()));
    }

    #[test]
    fn test_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Prediction::Scalar(1.5)).unwrap(), "1.5");
        assert_eq!(
            serde_json::to_string(&Prediction::Label("maize".into())).unwrap(),
            "\"maize\""
        );
    }
}
