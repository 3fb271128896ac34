// 📊 Portfolio summary - the dashboard numbers
//
// Total active leases, sum of monthly payments, average lease term.

use crate::calculator::{round_money, sum_money};
use crate::error::LeaseResult;
use crate::lease::Lease;
use rust_decimal::Decimal;
use serde::Serialize;

/// Currency every amount is displayed in
pub const DEFAULT_CURRENCY: &str = "ETB";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_leases: usize,
    pub active_leases: usize,

    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_monthly_payments: Decimal,

    /// Rounded to the nearest month; 0 for an empty portfolio
    pub average_term_months: u32,

    /// Sum of `totalCost` over leases that have been calculated
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub total_calculated_cost: Decimal,
}

impl PortfolioSummary {
    /// Fails only when a total exceeds Decimal's range
    pub fn from_leases(leases: &[Lease]) -> LeaseResult<Self> {
        let total_monthly_payments = sum_money(leases.iter().map(|l| l.monthly_payment), "monthlyPayment")?;

        let average_term_months = if leases.is_empty() {
            0
        } else {
            let total_term: u64 = leases.iter().map(|l| u64::from(l.term)).sum();
            let count = leases.len() as u64;
            // round half up
            ((total_term * 2 + count) / (count * 2)) as u32
        };

        let total_calculated_cost = sum_money(leases.iter().filter_map(|l| l.total_cost), "totalCost")?;

        Ok(PortfolioSummary {
            total_leases: leases.len(),
            active_leases: leases.iter().filter(|l| l.is_active()).count(),
            total_monthly_payments,
            average_term_months,
            total_calculated_cost,
        })
    }
}

/// Render an amount like `ETB 85,000.00`
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let rounded = round_money(amount);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    format!("{}{} {}.{}", sign, currency, grouped, cents)
}
