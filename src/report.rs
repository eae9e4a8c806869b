//! Plain-text summaries of projections, used for sharing and CLI output.

use crate::core::{AccumulationRequest, AccumulationResult, DecumulationRequest, DecumulationResult};
use crate::currency::Currency;
use crate::store::{Projection, SavedCalculation};

pub fn summary(calculation: &SavedCalculation) -> String {
    let currency = calculation.currency.parse::<Currency>().unwrap_or_default();
    match &calculation.projection {
        Projection::Sip { request, result } => accumulation_summary(request, result, currency),
        Projection::Swp { request, result } => decumulation_summary(request, result, currency),
    }
}

pub fn accumulation_summary(
    request: &AccumulationRequest,
    result: &AccumulationResult,
    currency: Currency,
) -> String {
    let money = |amount: f64| with_symbol(currency, amount);

    let mut lines = vec![
        "SIP Calculation Results".to_string(),
        String::new(),
        "Investment Details:".to_string(),
    ];
    if request.monthly_amount > 0.0 {
        lines.push(format!("Monthly SIP: {}", money(request.monthly_amount)));
    }
    if request.lumpsum_amount > 0.0 {
        lines.push(format!("Lumpsum: {}", money(request.lumpsum_amount)));
    }
    if request.step_up_percent > 0.0 {
        lines.push(format!("Annual Step-up: {}%", request.step_up_percent));
    }
    lines.push(format!("Expected Return: {}%", request.annual_rate_percent));
    lines.push(format!("Tenure: {}", years_label(request.years)));
    lines.push(String::new());
    lines.push("Results:".to_string());
    lines.push(format!("Maturity Amount: {}", money(result.maturity_amount)));
    lines.push(format!("Total Invested: {}", money(result.total_invested)));
    lines.push(format!("Returns: {}", money(result.returns)));
    lines.push(format!(
        "Absolute Return: {:.2}%",
        result.absolute_return_percent
    ));
    lines.join("\n")
}

pub fn decumulation_summary(
    request: &DecumulationRequest,
    result: &DecumulationResult,
    currency: Currency,
) -> String {
    let money = |amount: f64| with_symbol(currency, amount);

    [
        "SWP Calculation Results".to_string(),
        String::new(),
        "Withdrawal Details:".to_string(),
        format!("Initial Amount: {}", money(request.initial_amount)),
        format!("Monthly Withdrawal: {}", money(request.monthly_withdrawal)),
        format!("Expected Return: {}%", request.annual_rate_percent),
        format!("Tenure: {}", years_label(request.years)),
        String::new(),
        "Results:".to_string(),
        format!("Final Balance: {}", money(result.final_balance)),
        format!("Total Withdrawn: {}", money(result.total_withdrawn)),
        format!("Years Supported: {:.1}", result.years_supported),
    ]
    .join("\n")
}

fn with_symbol(currency: Currency, amount: f64) -> String {
    format!("{} {}", currency.symbol(), currency.format(amount))
}

fn years_label(years: u32) -> String {
    if years == 1 {
        "1 year".to_string()
    } else {
        format!("{years} years")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn sip_summary_lists_inputs_and_results() {
        let projection = Projection::accumulation(AccumulationRequest {
            monthly_amount: 5_000.0,
            lumpsum_amount: 0.0,
            annual_rate_percent: 12.0,
            years: 10,
            step_up_percent: 0.0,
        });
        let created_at = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");
        let calc = SavedCalculation::new(projection, Currency::Inr, created_at);

        let text = summary(&calc);
        assert!(text.starts_with("SIP Calculation Results"));
        assert!(text.contains("Monthly SIP: ₹ 5,000"));
        assert!(!text.contains("Lumpsum"));
        assert!(!text.contains("Step-up"));
        assert!(text.contains("Expected Return: 12%"));
        assert!(text.contains("Tenure: 10 years"));
        assert!(text.contains("Maturity Amount: ₹ 11,61,695"));
        assert!(text.contains("Total Invested: ₹ 6,00,000"));
        assert!(text.contains("Returns: ₹ 5,61,695"));
    }

    #[test]
    fn swp_summary_reports_years_supported_to_one_decimal() {
        let request = DecumulationRequest {
            initial_amount: 1_000_000.0,
            monthly_withdrawal: 10_000.0,
            annual_rate_percent: 8.0,
            years: 15,
        };
        let projection = Projection::decumulation(request);
        let Projection::Swp { result, .. } = projection else {
            panic!("expected a withdrawal projection");
        };

        let text = decumulation_summary(&request, &result, Currency::Usd);
        assert!(text.contains("Initial Amount: $ 1,000,000"));
        assert!(text.contains("Monthly Withdrawal: $ 10,000"));
        assert!(text.contains("Final Balance: $ 0"));
        assert!(text.contains("Years Supported: 13.8"));
    }

    #[test]
    fn unknown_saved_currency_renders_with_default_symbol() {
        let mut calc = SavedCalculation::new(
            Projection::accumulation(AccumulationRequest {
                monthly_amount: 0.0,
                lumpsum_amount: 100_000.0,
                annual_rate_percent: 12.0,
                years: 1,
                step_up_percent: 0.0,
            }),
            Currency::Inr,
            Utc::now(),
        );
        calc.currency = "ZZZ".to_string();

        let text = summary(&calc);
        assert!(text.contains("Lumpsum: ₹ 1,00,000"));
        assert!(text.contains("Tenure: 1 year"));
        assert!(text.contains("Maturity Amount: ₹ 1,12,000"));
    }
}
