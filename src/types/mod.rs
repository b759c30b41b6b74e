//! Type definitions for the credit scoring service

pub mod application;
pub mod prediction;
pub mod record;

pub use application::{FieldError, LoanApplication};
pub use prediction::{Decision, DecisionPolicy, PredictionResponse};
pub use record::CreditRecord;
