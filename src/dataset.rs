// src/dataset.rs

//! Synthetic company financials used by the teaching views.
//!
//! Every metric of a company is derived from one shared base value plus
//! independent noise, so the columns are strongly correlated and the first
//! principal component dominates.

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const COMPANY_NAMES: [&str; 25] = [
    "TechCorp",
    "FinanceBank",
    "RetailCo",
    "EnergyPlus",
    "HealthCare Inc",
    "AutoMotors",
    "FoodChain",
    "MediaGroup",
    "RealEstate Co",
    "Telecom Ltd",
    "Mining Corp",
    "Airlines Co",
    "Shipping Ltd",
    "Pharma Inc",
    "Software Co",
    "Banking Corp",
    "Insurance Ltd",
    "Investment Co",
    "Trading Corp",
    "Consulting Inc",
    "Manufacturing Co",
    "Logistics Ltd",
    "Construction Co",
    "Hospitality Inc",
    "Education Corp",
];

/// Display labels, in the canonical column order of `extract_features`.
pub const FEATURE_NAMES: [&str; 8] = [
    "PE Ratio",
    "PB Ratio",
    "EPS",
    "Volatility",
    "Debt Ratio",
    "ROE",
    "ROA",
    "1 Year Return",
];

/// One metric column of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FinanceMetric {
    Pe,
    Pb,
    Eps,
    Volatility,
    DebtRatio,
    Roe,
    Roa,
    OneYearReturn,
}

impl FinanceMetric {
    /// All metrics in canonical column order.
    pub const ALL: [FinanceMetric; 8] = [
        FinanceMetric::Pe,
        FinanceMetric::Pb,
        FinanceMetric::Eps,
        FinanceMetric::Volatility,
        FinanceMetric::DebtRatio,
        FinanceMetric::Roe,
        FinanceMetric::Roa,
        FinanceMetric::OneYearReturn,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    /// Short label used on metric toggles.
    pub fn short_label(self) -> &'static str {
        match self {
            FinanceMetric::Pe => "PE",
            FinanceMetric::Pb => "PB",
            FinanceMetric::Eps => "EPS",
            FinanceMetric::Volatility => "Vol",
            FinanceMetric::DebtRatio => "Debt",
            FinanceMetric::Roe => "ROE",
            FinanceMetric::Roa => "ROA",
            FinanceMetric::OneYearReturn => "Return",
        }
    }
}

/// One company's row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceRecord {
    pub company: String,
    pub pe: f64,
    pub pb: f64,
    pub eps: f64,
    pub volatility: f64,
    pub debt_ratio: f64,
    pub roe: f64,
    pub roa: f64,
    pub one_year_return: f64,
}

impl FinanceRecord {
    pub fn metric(&self, metric: FinanceMetric) -> f64 {
        match metric {
            FinanceMetric::Pe => self.pe,
            FinanceMetric::Pb => self.pb,
            FinanceMetric::Eps => self.eps,
            FinanceMetric::Volatility => self.volatility,
            FinanceMetric::DebtRatio => self.debt_ratio,
            FinanceMetric::Roe => self.roe,
            FinanceMetric::Roa => self.roa,
            FinanceMetric::OneYearReturn => self.one_year_return,
        }
    }
}

// base * weight + uniform noise in [-spread, spread)
fn correlated<R: Rng + ?Sized>(rng: &mut R, base: f64, weight: f64, spread: f64) -> f64 {
    base * weight + rng.gen_range(-spread..spread)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Generates one record per entry of `COMPANY_NAMES`.
pub fn generate_finance_data<R: Rng + ?Sized>(rng: &mut R) -> Vec<FinanceRecord> {
    COMPANY_NAMES
        .iter()
        .map(|&company| {
            let base = rng.gen_range(10.0..60.0);
            FinanceRecord {
                company: company.to_string(),
                pe: round_to(correlated(rng, base, 1.0, 5.0), 1),
                pb: round_to(correlated(rng, base, 0.3, 1.5), 1),
                eps: round_to(correlated(rng, base, 0.5, 1.0), 2),
                volatility: round_to(correlated(rng, base, 0.15, 2.5), 1),
                debt_ratio: round_to(correlated(rng, base, 0.4, 10.0), 1),
                roe: round_to(correlated(rng, base, 0.8, 5.0), 1),
                roa: round_to(correlated(rng, base, 0.4, 2.5), 1),
                one_year_return: round_to(correlated(rng, base, 0.6, 7.5), 1),
            }
        })
        .collect()
}

/// All 8 metrics per record, in canonical order. Shape: (n_records, 8)
pub fn extract_features(records: &[FinanceRecord]) -> Array2<f64> {
    build_matrix(records, &FinanceMetric::ALL)
}

/// Selected metrics per record.
///
/// Columns follow canonical order regardless of the order of `selected`, and
/// duplicates are ignored. An empty selection means every metric.
pub fn build_matrix(records: &[FinanceRecord], selected: &[FinanceMetric]) -> Array2<f64> {
    let columns: Vec<FinanceMetric> = if selected.is_empty() {
        FinanceMetric::ALL.to_vec()
    } else {
        FinanceMetric::ALL
            .iter()
            .copied()
            .filter(|metric| selected.contains(metric))
            .collect()
    };
    Array2::from_shape_fn((records.len(), columns.len()), |(i, j)| {
        records[i].metric(columns[j])
    })
}
