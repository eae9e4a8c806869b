use serde::{Deserialize, Serialize};

/// Inputs for a SIP projection, optionally with an annual step-up and a
/// one-time lumpsum. Rates are percentages (12.0 means 12% a year).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationRequest {
    #[serde(default)]
    pub monthly_amount: f64,
    #[serde(default)]
    pub lumpsum_amount: f64,
    pub annual_rate_percent: f64,
    pub years: u32,
    #[serde(default)]
    pub step_up_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationResult {
    pub maturity_amount: f64,
    pub total_invested: f64,
    pub returns: f64,
    pub monthly_investment: f64,
    pub lumpsum_investment: f64,
    /// Returns as a percentage of the amount invested; 0 when nothing was invested.
    pub absolute_return_percent: f64,
}

/// Inputs for a systematic withdrawal plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecumulationRequest {
    pub initial_amount: f64,
    pub monthly_withdrawal: f64,
    pub annual_rate_percent: f64,
    pub years: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecumulationResult {
    pub final_balance: f64,
    pub total_withdrawn: f64,
    pub months_supported: u32,
    pub years_supported: f64,
}

/// One month of a withdrawal plan: growth is credited before the withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownMonth {
    pub month: u32,
    pub opening_balance: f64,
    pub growth: f64,
    pub withdrawal: f64,
    pub closing_balance: f64,
}
