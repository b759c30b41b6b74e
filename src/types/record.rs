//! Labeled dataset rows used by the offline data generator and trainer

use crate::types::application::LoanApplication;
use serde::{Deserialize, Serialize};

/// One row of the training dataset: the seven features plus the label.
///
/// Column order here is the CSV column order and matches the feature order
/// the classifier is fit with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub age: u32,
    pub income: u64,
    pub years_employed: u32,
    pub credit_limit: u64,
    pub credit_utilization: f64,
    pub delinquencies_2y: u32,
    pub loan_amount: u64,
    /// 1 if the applicant defaulted
    pub default: u8,
}

impl CreditRecord {
    /// Feature part of the row, as the service would receive it
    pub fn application(&self) -> LoanApplication {
        LoanApplication {
            age: self.age,
            income: self.income,
            years_employed: self.years_employed,
            credit_limit: self.credit_limit,
            credit_utilization: self.credit_utilization,
            delinquencies_2y: self.delinquencies_2y,
            loan_amount: self.loan_amount,
        }
    }
}
