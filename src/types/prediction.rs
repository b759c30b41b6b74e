//! Prediction response and decision policy

use serde::{Deserialize, Serialize};

/// Default decision threshold on the probability of default.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.35;

/// Credit decision communicated to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// Decision for a binary risk class (1 = high risk)
    pub fn from_risk_class(risk_class: u8) -> Self {
        if risk_class == 1 {
            Decision::Rejected
        } else {
            Decision::Approved
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
        }
    }
}

/// Body returned by `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Probability of default, rounded to 4 decimals
    pub default_probability: f64,
    /// 1 if the probability exceeds the threshold, else 0
    pub risk_class: u8,
    /// Decision derived from `risk_class`
    pub decision: Decision,
}

/// Maps a default probability to a risk class and decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strictly greater than the threshold is high risk.
    pub fn risk_class(&self, probability: f64) -> u8 {
        if probability > self.threshold {
            1
        } else {
            0
        }
    }

    /// Build the response; the class is taken from the unrounded probability.
    pub fn decide(&self, probability: f64) -> PredictionResponse {
        let risk_class = self.risk_class(probability);
        PredictionResponse {
            default_probability: (probability * 10_000.0).round() / 10_000.0,
            risk_class,
            decision: Decision::from_risk_class(risk_class),
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DECISION_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        let policy = DecisionPolicy::default();
        let eps = 1e-9;

        assert_eq!(policy.risk_class(0.35 - eps), 0);
        assert_eq!(policy.risk_class(0.35), 0);
        assert_eq!(policy.risk_class(0.35 + eps), 1);
        assert_eq!(policy.risk_class(0.0), 0);
        assert_eq!(policy.risk_class(1.0), 1);
    }

    #[test]
    fn test_decision_follows_risk_class() {
        let policy = DecisionPolicy::default();

        let low = policy.decide(0.12);
        assert_eq!(low.risk_class, 0);
        assert_eq!(low.decision, Decision::Approved);

        let high = policy.decide(0.81);
        assert_eq!(high.risk_class, 1);
        assert_eq!(high.decision, Decision::Rejected);
    }

    #[test]
    fn test_rounding_does_not_move_class() {
        let policy = DecisionPolicy::default();
        let response = policy.decide(0.350_000_1);

        assert_eq!(response.default_probability, 0.35);
        assert_eq!(response.risk_class, 1);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = DecisionPolicy::new(0.5);
        assert_eq!(policy.decide(0.4).decision, Decision::Approved);
        assert_eq!(policy.decide(0.6).decision, Decision::Rejected);
    }

    #[test]
    fn test_response_serialization() {
        let response = DecisionPolicy::default().decide(0.0123456);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["default_probability"], 0.0123);
        assert_eq!(json["risk_class"], 0);
        assert_eq!(json["decision"], "Approved");
    }
}
