// 📄 Lease Entity - Stable identity + validated values
//
// "Lease id is IDENTITY (never changes), everything else is a VALUE"
//
// Field names serialize in camelCase; `monthlyRent` is accepted as an older
// name for `monthlyPayment`. Amounts are written as exact JSON numbers, so a
// saved collection reloads digit for digit.

use crate::calculator::round_money;
use crate::error::{LeaseError, LeaseResult, ValidationError};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Status tag given to every newly added lease
pub const STATUS_ACTIVE: &str = "Active";

/// Largest accepted amount (10^15); payment × any u32 term stays inside Decimal
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

// ============================================================================
// LEASE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeaseType {
    /// Homes and apartments
    #[default]
    Residential,

    /// Offices, shops, equipment
    Commercial,
}

impl LeaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseType::Residential => "Residential",
            LeaseType::Commercial => "Commercial",
        }
    }
}

impl FromStr for LeaseType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "residential" => Ok(LeaseType::Residential),
            "commercial" => Ok(LeaseType::Commercial),
            other => Err(ValidationError::new(
                "type",
                format!("Unknown lease type '{}' (expected Residential or Commercial)", other),
            )),
        }
    }
}

impl std::fmt::Display for LeaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// LEASE ENTITY
// ============================================================================

/// A rental agreement held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    pub id: String,

    // ========================================================================
    // CORE VALUES
    // ========================================================================
    pub name: String,

    #[serde(rename = "type", default)]
    pub lease_type: LeaseType,

    #[serde(alias = "monthlyRent", with = "rust_decimal::serde::arbitrary_precision")]
    pub monthly_payment: Decimal,

    /// Length of the lease in months
    pub term: u32,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Open tag; only "Active" is assigned by the store
    #[serde(default = "default_status")]
    pub status: String,

    /// monthly_payment × term, set by calculate and cleared when either input changes
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub total_cost: Option<Decimal>,

    // ========================================================================
    // CHARGES & TERMS (optional)
    // ========================================================================
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub security_deposit: Option<Decimal>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub additional_charges: Option<Decimal>,

    /// Percent added to the rent at the start of each lease year
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub annual_rent_increase: Option<Decimal>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub utilities_included: bool,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub maintenance_fees: Option<Decimal>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub late_payment_penalty: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn check_amount(errors: &mut Vec<ValidationError>, field: &str, value: Decimal) {
    if value < Decimal::ZERO {
        errors.push(ValidationError::new(
            field,
            format!("Must not be negative, got {}", value),
        ));
    } else if value > Decimal::from(MAX_AMOUNT) {
        errors.push(ValidationError::new(
            field,
            format!("Must not exceed {}, got {}", MAX_AMOUNT, value),
        ));
    }
}

fn default_status() -> String {
    STATUS_ACTIVE.to_string()
}

fn is_false(val: &bool) -> bool {
    !*val
}

impl Lease {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    /// Check every field rule; returns all broken rules at once
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "Required field is empty"));
        }

        check_amount(&mut errors, "monthlyPayment", self.monthly_payment);

        if self.term == 0 {
            errors.push(ValidationError::new("term", "Must be at least 1 month"));
        }

        if let Some(end) = self.end_date {
            if end < self.start_date {
                errors.push(ValidationError::new(
                    "endDate",
                    format!("{} is before start date {}", end, self.start_date),
                ));
            }
        }

        let optional_amounts = [
            ("securityDeposit", self.security_deposit),
            ("additionalCharges", self.additional_charges),
            ("annualRentIncrease", self.annual_rent_increase),
            ("maintenanceFees", self.maintenance_fees),
            ("latePaymentPenalty", self.late_payment_penalty),
        ];
        for (field, value) in optional_amounts {
            if let Some(v) = value {
                check_amount(&mut errors, field, v);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// LEASE DRAFT (input to add)
// ============================================================================

/// Fields submitted for a new lease; everything optional so gaps can be reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseDraft {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub lease_type: Option<LeaseType>,

    #[serde(
        default,
        alias = "monthlyRent",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub monthly_payment: Option<Decimal>,

    #[serde(default)]
    pub term: Option<u32>,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub security_deposit: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub additional_charges: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub annual_rent_increase: Option<Decimal>,

    #[serde(default)]
    pub utilities_included: Option<bool>,

    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub maintenance_fees: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub late_payment_penalty: Option<Decimal>,

    #[serde(default)]
    pub image: Option<String>,
}

impl LeaseDraft {
    /// Minimal draft with the three required fields
    pub fn new(name: &str, monthly_payment: Decimal, term: u32) -> Self {
        LeaseDraft {
            name: Some(name.to_string()),
            monthly_payment: Some(monthly_payment),
            term: Some(term),
            ..Default::default()
        }
    }

    pub fn starting(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn ending(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn of_type(mut self, lease_type: LeaseType) -> Self {
        self.lease_type = Some(lease_type);
        self
    }

    /// Build a validated Lease with the given identity
    ///
    /// Missing start date defaults to today. Missing term is derived from the
    /// start and end dates when both are known. Money amounts are rounded to
    /// cents.
    pub fn into_lease(self, id: String) -> LeaseResult<Lease> {
        let mut errors = Vec::new();

        let name = self.name.unwrap_or_default();

        let monthly_payment = match self.monthly_payment {
            Some(amount) => round_money(amount),
            None => {
                errors.push(ValidationError::new("monthlyPayment", "Required field is missing"));
                Decimal::ZERO
            }
        };

        let start_date = self.start_date.unwrap_or_else(|| Utc::now().date_naive());

        let term = match (self.term, self.end_date) {
            (Some(term), _) => term,
            (None, Some(end)) => match months_between(start_date, end) {
                Some(months) => months,
                None => {
                    errors.push(ValidationError::new(
                        "term",
                        "Required field is missing and cannot be derived from the dates",
                    ));
                    1
                }
            },
            (None, None) => {
                errors.push(ValidationError::new("term", "Required field is missing"));
                1
            }
        };

        let lease = Lease {
            id,
            name: name.trim().to_string(),
            lease_type: self.lease_type.unwrap_or_default(),
            monthly_payment,
            term,
            start_date,
            end_date: self.end_date,
            status: STATUS_ACTIVE.to_string(),
            total_cost: None,
            security_deposit: self.security_deposit.map(round_money),
            additional_charges: self.additional_charges.map(round_money),
            annual_rent_increase: self.annual_rent_increase,
            utilities_included: self.utilities_included.unwrap_or(false),
            maintenance_fees: self.maintenance_fees.map(round_money),
            late_payment_penalty: self.late_payment_penalty.map(round_money),
            image: self.image,
        };

        if let Err(field_errors) = lease.validate() {
            errors.extend(field_errors);
        }

        if errors.is_empty() {
            Ok(lease)
        } else {
            Err(LeaseError::Validation(errors))
        }
    }
}

// ============================================================================
// LEASE PATCH (input to update)
// ============================================================================

/// Partial update; `None` leaves the field untouched
///
/// Optional lease fields are doubly wrapped: `Some(None)` clears the field.
/// In JSON an absent key leaves it alone and `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeasePatch {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub lease_type: Option<LeaseType>,

    #[serde(
        default,
        alias = "monthlyRent",
        with = "rust_decimal::serde::arbitrary_precision_option"
    )]
    pub monthly_payment: Option<Decimal>,

    #[serde(default)]
    pub term: Option<u32>,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "clearable")]
    pub end_date: Option<Option<NaiveDate>>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, deserialize_with = "clearable_amount")]
    pub security_deposit: Option<Option<Decimal>>,

    #[serde(default, deserialize_with = "clearable_amount")]
    pub additional_charges: Option<Option<Decimal>>,

    #[serde(default, deserialize_with = "clearable_amount")]
    pub annual_rent_increase: Option<Option<Decimal>>,

    #[serde(default)]
    pub utilities_included: Option<bool>,

    #[serde(default, deserialize_with = "clearable_amount")]
    pub maintenance_fees: Option<Option<Decimal>>,

    #[serde(default, deserialize_with = "clearable_amount")]
    pub late_payment_penalty: Option<Option<Decimal>>,

    #[serde(default, deserialize_with = "clearable")]
    pub image: Option<Option<String>>,
}

fn clearable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn clearable_amount<'de, D>(deserializer: D) -> Result<Option<Option<Decimal>>, D::Error>
where
    D: Deserializer<'de>,
{
    rust_decimal::serde::arbitrary_precision_option::deserialize(deserializer).map(Some)
}

impl LeasePatch {
    pub fn rename(name: &str) -> Self {
        LeasePatch {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == LeasePatch::default()
    }

    /// Mark an optional field for removal; accepts `endDate`, `end-date` or `end_date`
    pub fn clear(&mut self, field: &str) -> Result<(), ValidationError> {
        let key: String = field
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "enddate" => self.end_date = Some(None),
            "securitydeposit" => self.security_deposit = Some(None),
            "additionalcharges" => self.additional_charges = Some(None),
            "annualrentincrease" => self.annual_rent_increase = Some(None),
            "maintenancefees" => self.maintenance_fees = Some(None),
            "latepaymentpenalty" => self.late_payment_penalty = Some(None),
            "image" => self.image = Some(None),
            _ => {
                return Err(ValidationError::new(
                    field,
                    "Not an optional field (cannot be cleared)",
                ))
            }
        }
        Ok(())
    }

    /// Apply onto a lease in place
    ///
    /// Clears `total_cost` when the payment or term actually changes, so a
    /// stored cost always matches its inputs.
    pub fn apply(&self, lease: &mut Lease) {
        let payment_before = lease.monthly_payment;
        let term_before = lease.term;

        if let Some(name) = &self.name {
            lease.name = name.trim().to_string();
        }
        if let Some(lease_type) = self.lease_type {
            lease.lease_type = lease_type;
        }
        if let Some(amount) = self.monthly_payment {
            lease.monthly_payment = round_money(amount);
        }
        if let Some(term) = self.term {
            lease.term = term;
        }
        if let Some(start) = self.start_date {
            lease.start_date = start;
        }
        if let Some(end) = self.end_date {
            lease.end_date = end;
        }
        if let Some(status) = &self.status {
            lease.status = status.clone();
        }
        if let Some(v) = self.security_deposit {
            lease.security_deposit = v.map(round_money);
        }
        if let Some(v) = self.additional_charges {
            lease.additional_charges = v.map(round_money);
        }
        if let Some(v) = self.annual_rent_increase {
            lease.annual_rent_increase = v;
        }
        if let Some(v) = self.utilities_included {
            lease.utilities_included = v;
        }
        if let Some(v) = self.maintenance_fees {
            lease.maintenance_fees = v.map(round_money);
        }
        if let Some(v) = self.late_payment_penalty {
            lease.late_payment_penalty = v.map(round_money);
        }
        if let Some(image) = &self.image {
            lease.image = image.clone();
        }

        if lease.monthly_payment != payment_before || lease.term != term_before {
            lease.total_cost = None;
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Whole months from `start` to `end`; None when the span is under one month
pub fn months_between(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    if end < start {
        return None;
    }

    let mut months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() {
        months -= 1;
    }

    if months >= 1 {
        Some(months as u32)
    } else {
        None
    }
}

/// Parse a user-supplied amount, reporting the field on failure
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, ValidationError> {
    let trimmed = raw.trim().replace(',', "");
    Decimal::from_str(&trimmed)
        .map_err(|_| ValidationError::new(field, format!("'{}' is not a number", raw.trim())))
}

/// Parse a user-supplied month count
pub fn parse_term(field: &str, raw: &str) -> Result<u32, ValidationError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::new(field, format!("'{}' is not a whole number of months", raw.trim())))
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, format!("'{}' is not a YYYY-MM-DD date", raw.trim())))
}

// ============================================================================
// TESTS
// ============================================================================
