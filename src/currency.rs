//! Display-only currency labels and amount formatting. Nothing here feeds
//! back into projected values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;
const MILLION: f64 = 1_000_000.0;
const THOUSAND: f64 = 1_000.0;

/// Lakh grouping stops after the crore comma: 123,45,67,890.
const MAX_LAKH_GROUPS: usize = 2;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Inr,
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Inr,
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Cad,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
            Currency::Cad => "C$",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Currency::Inr => "Indian Rupee",
            Currency::Usd => "US Dollar",
            Currency::Eur => "Euro",
            Currency::Gbp => "British Pound",
            Currency::Jpy => "Japanese Yen",
            Currency::Cad => "Canadian Dollar",
        }
    }

    /// Whole-unit amount with thousands separators. Rupees use lakh/crore
    /// grouping (12,34,567), everything else groups by three.
    pub fn format(self, amount: f64) -> String {
        if !amount.is_finite() {
            return amount.to_string();
        }
        let rounded = amount.round();
        let digits = format!("{:.0}", rounded.abs());
        let grouped = group_digits(&digits, self == Currency::Inr);
        if rounded < 0.0 {
            format!("-{grouped}")
        } else {
            grouped
        }
    }

    /// Short spoken form shown under input fields, e.g. "2 Crores 50 Lakhs".
    pub fn to_words(self, amount: f64) -> String {
        if amount == 0.0 {
            return String::new();
        }
        match self {
            Currency::Inr => indian_words(amount),
            _ => western_words(amount),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| Error::UnknownCurrency(code.to_string()))
    }
}

/// Symbol for a stored currency code, falling back to the default currency.
pub fn symbol_for(code: &str) -> &'static str {
    code.parse::<Currency>().unwrap_or_default().symbol()
}

fn group_digits(digits: &str, indian: bool) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let width = if indian { 2 } else { 3 };

    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = if indian && groups.len() == MAX_LAKH_GROUPS {
            0
        } else {
            end.saturating_sub(width)
        };
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

fn indian_words(amount: f64) -> String {
    if amount >= CRORE {
        let crores = plural((amount / CRORE).floor(), "Crore");
        let remainder = amount % CRORE;
        if remainder >= LAKH {
            return format!("{crores} {}", plural((remainder / LAKH).floor(), "Lakh"));
        }
        return crores;
    }

    if amount >= LAKH {
        let lakhs = plural((amount / LAKH).floor(), "Lakh");
        let remainder = amount % LAKH;
        if remainder >= THOUSAND {
            return format!("{lakhs} {} Thousand", (remainder / THOUSAND).floor());
        }
        return lakhs;
    }

    if amount >= THOUSAND {
        return format!("{} Thousand", (amount / THOUSAND).floor());
    }

    amount.to_string()
}

fn western_words(amount: f64) -> String {
    if amount >= MILLION {
        return format!("{} Million", one_decimal(amount / MILLION));
    }
    if amount >= THOUSAND {
        return format!("{} Thousand", one_decimal(amount / THOUSAND));
    }
    amount.to_string()
}

/// One decimal place, with exact halves rounded up rather than to even.
fn one_decimal(value: f64) -> String {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters.rem_euclid(2.0) == 1.0 {
        format!("{:.1}", (value * 10.0).ceil() / 10.0)
    } else {
        format!("{value:.1}")
    }
}

fn plural(count: f64, unit: &str) -> String {
    if count > 1.0 {
        format!("{count} {unit}s")
    } else {
        format!("{count} {unit}")
    }
}
