//! Synthetic credit dataset generator.
//!
//! Each feature column is drawn in full before the next one, from a single
//! seeded RNG, so a given seed always produces the same dataset.

use crate::types::record::CreditRecord;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution, Normal, Poisson};
use std::fs;
use std::path::Path;
use tracing::info;

/// Default dataset size
pub const DEFAULT_SAMPLES: usize = 5000;

/// Default generator seed
pub const DEFAULT_SEED: u64 = 42;

/// Generator for labeled synthetic applicants
pub struct CreditDataGenerator {
    rng: StdRng,
}

impl CreditDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `n_samples` labeled rows.
    pub fn generate(&mut self, n_samples: usize) -> Result<Vec<CreditRecord>> {
        let age: Vec<u32> = (0..n_samples).map(|_| self.rng.gen_range(18..70)).collect();

        let income_dist = Normal::<f64>::new(60000.0, 15000.0)?;
        let income: Vec<u64> = (0..n_samples)
            .map(|_| income_dist.sample(&mut self.rng).max(10000.0) as u64)
            .collect();

        // Cannot have worked longer than adulthood allows.
        let years_employed: Vec<u32> = age
            .iter()
            .map(|&a| self.rng.gen_range(0..20).min(a - 18))
            .collect();

        let limit_dist = Normal::<f64>::new(20000.0, 10000.0)?;
        let credit_limit: Vec<u64> = (0..n_samples)
            .map(|_| limit_dist.sample(&mut self.rng).max(1000.0) as u64)
            .collect();

        let utilization_dist = Beta::<f64>::new(2.0, 5.0)?;
        let credit_utilization: Vec<f64> = (0..n_samples)
            .map(|_| (utilization_dist.sample(&mut self.rng) * 100.0).round() / 100.0)
            .collect();

        let delinquency_dist = Poisson::<f64>::new(0.3)?;
        let delinquencies_2y: Vec<u32> = (0..n_samples)
            .map(|_| delinquency_dist.sample(&mut self.rng) as u32)
            .collect();

        let loan_dist = Normal::<f64>::new(15000.0, 5000.0)?;
        let loan_amount: Vec<u64> = (0..n_samples)
            .map(|_| loan_dist.sample(&mut self.rng).max(1000.0) as u64)
            .collect();

        let noise_dist = Normal::<f64>::new(0.0, 1.5)?;
        let noise: Vec<f64> = (0..n_samples).map(|_| noise_dist.sample(&mut self.rng)).collect();

        let mut records = Vec::with_capacity(n_samples);
        for i in 0..n_samples {
            let mut record = CreditRecord {
                age: age[i],
                income: income[i],
                years_employed: years_employed[i],
                credit_limit: credit_limit[i],
                credit_utilization: credit_utilization[i],
                delinquencies_2y: delinquencies_2y[i],
                loan_amount: loan_amount[i],
                default: 0,
            };
            let probability = default_probability(&record, noise[i]);
            record.default = u8::from(self.rng.gen_bool(probability));
            records.push(record);
        }

        Ok(records)
    }
}

/// Latent risk score of a row before noise. Higher is riskier.
pub fn risk_score(record: &CreditRecord) -> f64 {
    let income = record.income as f64;

    let utilization = record.credit_utilization * 5.0;
    let delinquency = record.delinquencies_2y as f64 * 2.5;
    let income_relief = -(income / 20000.0);
    let debt_to_income = (record.loan_amount as f64 / (income + 1.0)) * 10.0;
    let stability = -(record.age as f64 / 100.0) - (record.years_employed as f64 / 5.0);

    -2.0 + utilization + delinquency + income_relief + debt_to_income + stability
}

/// Logistic function
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn default_probability(record: &CreditRecord, noise: f64) -> f64 {
    sigmoid(risk_score(record) + noise)
}

/// Generate a dataset and log its class balance.
pub fn generate_credit_data(n_samples: usize, seed: u64) -> Result<Vec<CreditRecord>> {
    let records = CreditDataGenerator::new(seed).generate(n_samples)?;

    let defaults = records.iter().filter(|r| r.default == 1).count();
    let default_rate = if records.is_empty() {
        0.0
    } else {
        defaults as f64 / records.len() as f64
    };
    info!(
        samples = records.len(),
        defaults = defaults,
        default_rate = format!("{:.2}%", default_rate * 100.0),
        "Dataset generated"
    );

    Ok(records)
}

/// Write records as CSV with a header row, creating parent directories.
pub fn write_csv<P: AsRef<Path>>(records: &[CreditRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "Data saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b").join("b.csv");

        write_csv(&generate_credit_data(500, 42).unwrap(), &a).unwrap();
        write_csv(&generate_credit_data(500, 42).unwrap(), &b).unwrap();

        let bytes_a = fs::read(&a).unwrap();
        assert!(!bytes_a.is_empty());
        assert_eq!(bytes_a, fs::read(&b).unwrap());
    }

    #[test]
    fn test_different_seed_differs() {
        let a = generate_credit_data(200, 1).unwrap();
        let b = generate_credit_data(200, 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_feature_constraints() {
        let records = generate_credit_data(2000, 42).unwrap();
        assert_eq!(records.len(), 2000);

        for r in &records {
            assert!((18..70).contains(&r.age));
            assert!(r.income >= 10000);
            assert!(r.years_employed < 20 && r.years_employed <= r.age - 18);
            assert!(r.credit_limit >= 1000);
            assert!((0.0..=1.0).contains(&r.credit_utilization));
            assert_eq!((r.credit_utilization * 100.0).round() / 100.0, r.credit_utilization);
            assert!(r.loan_amount >= 1000);
            assert!(r.default <= 1);
        }

        // Both classes occur.
        let defaults = records.iter().filter(|r| r.default == 1).count();
        assert!(defaults > 0 && defaults < records.len());
    }

    #[test]
    fn test_csv_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        write_csv(&generate_credit_data(3, 42).unwrap(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "age,income,years_employed,credit_limit,credit_utilization,delinquencies_2y,loan_amount,default"
        );
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_risk_score_ordering() {
        let good = CreditRecord {
            age: 45,
            income: 80000,
            years_employed: 10,
            credit_limit: 50000,
            credit_utilization: 0.1,
            delinquencies_2y: 0,
            loan_amount: 10000,
            default: 0,
        };
        let bad = CreditRecord {
            age: 20,
            income: 15000,
            years_employed: 0,
            credit_limit: 1000,
            credit_utilization: 0.95,
            delinquencies_2y: 4,
            loan_amount: 20000,
            default: 0,
        };

        assert!(sigmoid(risk_score(&good)) < 0.01);
        assert!(sigmoid(risk_score(&bad)) > 0.99);
        assert_eq!(sigmoid(0.0), 0.5);
    }
}
