use super::types::{
    AccumulationRequest, AccumulationResult, DecumulationRequest, DecumulationResult,
    DrawdownMonth,
};

const MONTHS_PER_YEAR: u32 = 12;

pub fn project_accumulation(request: &AccumulationRequest) -> AccumulationResult {
    let rate = monthly_rate(request.annual_rate_percent);
    let months = f64::from(request.years) * f64::from(MONTHS_PER_YEAR);

    let sip_maturity = if request.monthly_amount > 0.0 {
        if request.step_up_percent > 0.0 {
            step_up_sip_maturity(
                request.monthly_amount,
                rate,
                request.years,
                request.step_up_percent,
            )
        } else {
            request.monthly_amount * annuity_due_factor(rate, months)
        }
    } else {
        0.0
    };

    let lumpsum_maturity = if request.lumpsum_amount > 0.0 {
        let annual_rate = request.annual_rate_percent / 100.0;
        request.lumpsum_amount * compound_factor(annual_rate, f64::from(request.years))
    } else {
        0.0
    };

    let maturity_amount = sip_maturity + lumpsum_maturity;
    let total_invested = sip_principal(
        request.monthly_amount,
        request.years,
        request.step_up_percent,
    ) + request.lumpsum_amount;
    let returns = maturity_amount - total_invested;

    AccumulationResult {
        maturity_amount,
        total_invested,
        returns,
        monthly_investment: request.monthly_amount,
        lumpsum_investment: request.lumpsum_amount,
        absolute_return_percent: absolute_return_percent(returns, total_invested),
    }
}

pub fn project_decumulation(request: &DecumulationRequest) -> DecumulationResult {
    let mut drawdown = Drawdown::new(request);
    let mut total_withdrawn = 0.0;
    let mut months_supported = 0;
    for step in drawdown.by_ref() {
        total_withdrawn += step.withdrawal;
        months_supported += 1;
    }

    DecumulationResult {
        final_balance: drawdown.balance.max(0.0),
        total_withdrawn,
        months_supported,
        years_supported: f64::from(months_supported) / f64::from(MONTHS_PER_YEAR),
    }
}

/// Month-by-month trace of the same drawdown `project_decumulation` summarises.
pub fn decumulation_schedule(request: &DecumulationRequest) -> Vec<DrawdownMonth> {
    Drawdown::new(request).collect()
}

/// Each month's deposit is valued with the annuity-due closed form over its
/// own remaining horizon, and the per-month values are summed.
fn step_up_sip_maturity(
    initial_monthly: f64,
    rate: f64,
    years: u32,
    step_up_percent: f64,
) -> f64 {
    let step_up_rate = step_up_percent / 100.0;
    let mut total = 0.0;
    let mut current_monthly = initial_monthly;

    for year in 0..years {
        let horizon_left = f64::from(years - year) * f64::from(MONTHS_PER_YEAR);
        for month in 0..MONTHS_PER_YEAR {
            let months_remaining = horizon_left - f64::from(month);
            total += current_monthly * annuity_due_factor(rate, months_remaining);
        }
        // A non-finite total stays non-finite.
        if !total.is_finite() {
            break;
        }
        if year + 1 < years {
            current_monthly *= 1.0 + step_up_rate;
        }
    }

    total
}

fn sip_principal(monthly_amount: f64, years: u32, step_up_percent: f64) -> f64 {
    if step_up_percent == 0.0 {
        return monthly_amount * f64::from(years) * f64::from(MONTHS_PER_YEAR);
    }

    let step_up_rate = step_up_percent / 100.0;
    let mut invested = 0.0;
    let mut current_monthly = monthly_amount;
    for _ in 0..years {
        invested += current_monthly * f64::from(MONTHS_PER_YEAR);
        if !invested.is_finite() {
            break;
        }
        current_monthly *= 1.0 + step_up_rate;
    }
    invested
}

fn absolute_return_percent(returns: f64, total_invested: f64) -> f64 {
    if total_invested == 0.0 {
        return 0.0;
    }
    (returns / total_invested) * 100.0
}

fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 12.0 / 100.0
}

fn horizon_months(years: u32) -> u32 {
    years.saturating_mul(MONTHS_PER_YEAR)
}

fn compound_factor(rate: f64, periods: f64) -> f64 {
    (1.0 + rate).powf(periods)
}

/// Future value of one unit paid at the start of each of `periods` periods.
fn annuity_due_factor(rate: f64, periods: f64) -> f64 {
    if rate == 0.0 {
        return periods;
    }
    ((compound_factor(rate, periods) - 1.0) / rate) * (1.0 + rate)
}

struct Drawdown {
    rate: f64,
    withdrawal: f64,
    balance: f64,
    month: u32,
    months: u32,
    finished: bool,
}

impl Drawdown {
    fn new(request: &DecumulationRequest) -> Self {
        let months = if request.monthly_withdrawal > 0.0 {
            horizon_months(request.years)
        } else {
            0
        };
        Self {
            rate: monthly_rate(request.annual_rate_percent),
            withdrawal: request.monthly_withdrawal,
            balance: request.initial_amount,
            month: 0,
            months,
            finished: false,
        }
    }
}

impl Iterator for Drawdown {
    type Item = DrawdownMonth;

    fn next(&mut self) -> Option<DrawdownMonth> {
        let exhausted = self.balance.is_nan() || self.balance <= 0.0;
        if self.finished || self.month >= self.months || exhausted {
            return None;
        }

        let opening_balance = self.balance;
        let grown = opening_balance * (1.0 + self.rate);
        self.month += 1;

        let withdrawal = if grown >= self.withdrawal {
            self.balance = grown - self.withdrawal;
            self.withdrawal
        } else {
            self.finished = true;
            if grown > 0.0 {
                self.balance = 0.0;
                grown
            } else {
                self.balance = grown;
                return None;
            }
        };

        Some(DrawdownMonth {
            month: self.month,
            opening_balance,
            growth: grown - opening_balance,
            withdrawal,
            closing_balance: self.balance,
        })
    }
}
