// 🧮 Lease Cost Calculator
//
// Pure functions. All money leaves this module rounded to 2 decimal places
// (midpoint away from zero), never as a raw float product.
//
// Every product and sum is checked: a result past Decimal's range is a
// Validation error on the input that drove it, never a panic.

use crate::error::{LeaseError, LeaseResult};
use crate::lease::Lease;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for every currency amount
pub const MONEY_DP: u32 = 2;

/// Round an amount to the currency precision (trailing zeros dropped)
pub fn round_money(amount: Decimal) -> Decimal {
    amount
        .round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

fn too_large(field: &str) -> LeaseError {
    LeaseError::invalid(field, "Amount is too large to compute")
}

/// Total cost of a lease: monthly payment × term
pub fn lease_cost(monthly_payment: Decimal, term: u32) -> LeaseResult<Decimal> {
    monthly_payment
        .checked_mul(Decimal::from(term))
        .map(round_money)
        .ok_or_else(|| too_large("monthlyPayment"))
}

/// Total cost when the rent rises by `annual_increase_pct` percent at the start
/// of every new 12-month period
///
/// Each period's rent is rounded before it is billed, the way an invoice would be.
pub fn escalated_cost(
    monthly_payment: Decimal,
    term: u32,
    annual_increase_pct: Decimal,
) -> LeaseResult<Decimal> {
    if annual_increase_pct.is_zero() {
        return lease_cost(monthly_payment, term);
    }

    let factor = annual_increase_pct
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|rate| Decimal::ONE.checked_add(rate))
        .ok_or_else(|| too_large("annualRentIncrease"))?;

    let mut rent = round_money(monthly_payment);
    let mut remaining = term;
    let mut total = Decimal::ZERO;

    while remaining > 0 {
        let months = remaining.min(12);
        total = rent
            .checked_mul(Decimal::from(months))
            .and_then(|billed| total.checked_add(billed))
            .ok_or_else(|| too_large("monthlyPayment"))?;
        remaining -= months;

        if remaining > 0 {
            rent = rent
                .checked_mul(factor)
                .map(round_money)
                .ok_or_else(|| too_large("annualRentIncrease"))?;
        }
    }

    Ok(round_money(total))
}

/// Projected cost for a stored lease, honouring its annual increase if any
pub fn projected_cost(lease: &Lease) -> LeaseResult<Decimal> {
    match lease.annual_rent_increase {
        Some(pct) => escalated_cost(lease.monthly_payment, lease.term, pct),
        None => lease_cost(lease.monthly_payment, lease.term),
    }
}

/// What the tenant pays each month: rent + additional charges + maintenance fees
pub fn monthly_outlay(lease: &Lease) -> LeaseResult<Decimal> {
    let extras = [lease.additional_charges, lease.maintenance_fees];
    sum_money(
        std::iter::once(lease.monthly_payment).chain(extras.into_iter().flatten()),
        "monthlyPayment",
    )
}

/// Checked, rounded sum; `field` names the input blamed on overflow
pub fn sum_money(amounts: impl IntoIterator<Item = Decimal>, field: &str) -> LeaseResult<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .map(round_money)
        .ok_or_else(|| too_large(field))
}
