use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Money, VehicleSize};

/// Charge for the first (possibly partial) hour plus each further completed hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub base: Money,
    pub hourly: Money,
}

impl Rate {
    pub const fn new(base_cents: u64, hourly_cents: u64) -> Self {
        Self {
            base: Money::from_cents(base_cents),
            hourly: Money::from_cents(hourly_cents),
        }
    }
}

/// Rates keyed by vehicle class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTable {
    rates: BTreeMap<VehicleSize, Rate>,
}

impl RateTable {
    pub fn empty() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    pub fn with_rate(mut self, size: VehicleSize, rate: Rate) -> Self {
        self.rates.insert(size, rate);
        self
    }

    pub fn set(&mut self, size: VehicleSize, rate: Rate) {
        self.rates.insert(size, rate);
    }

    pub fn rate(&self, size: VehicleSize) -> Option<Rate> {
        self.rates.get(&size).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VehicleSize, Rate)> + '_ {
        self.rates.iter().map(|(size, rate)| (*size, *rate))
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::empty()
            .with_rate(VehicleSize::Small, Rate::new(200, 100))
            .with_rate(VehicleSize::Medium, Rate::new(500, 250))
            .with_rate(VehicleSize::Large, Rate::new(1000, 500))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeeError {
    #[error("no rate registered for vehicle class '{}'", .0.label())]
    UnknownVehicleClass(VehicleSize),
    #[error("parking duration {0} is not a finite number of hours")]
    InvalidDuration(f64),
}

#[derive(Debug, Clone, Default)]
pub struct FeeCalculator {
    rates: RateTable,
}

impl FeeCalculator {
    pub fn new(rates: RateTable) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Fee for a stay of `hours`. A stay that rounds up to at most one hour costs the base rate.
    /// Longer stays add the hourly rate for every full hour completed after the first, so the
    /// final partial hour is not charged. Negative durations bill as zero hours.
    pub fn compute_fee(&self, size: VehicleSize, hours: f64) -> Result<Money, FeeError> {
        let rate = self
            .rates
            .rate(size)
            .ok_or(FeeError::UnknownVehicleClass(size))?;
        if !hours.is_finite() {
            return Err(FeeError::InvalidDuration(hours));
        }

        let billed_hours = hours.max(0.0).ceil() as u64;
        if billed_hours <= 1 {
            return Ok(rate.base);
        }

        let extra_hours = (hours.floor() as u64).saturating_sub(1);
        let extra = rate.hourly.cents().saturating_mul(extra_hours);
        Ok(Money::from_cents(rate.base.cents().saturating_add(extra)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_partial_hour_is_not_charged() {
        let fees = FeeCalculator::default();
        assert_eq!(
            fees.compute_fee(VehicleSize::Medium, 3.5),
            Ok(Money::from_cents(1000))
        );
        assert_eq!(
            fees.compute_fee(VehicleSize::Small, 0.5),
            Ok(Money::from_cents(200))
        );
    }

    #[test]
    fn each_completed_hour_after_the_first_adds_the_hourly_rate() {
        let fees = FeeCalculator::default();
        assert_eq!(
            fees.compute_fee(VehicleSize::Large, 1.0),
            Ok(Money::from_cents(1000))
        );
        assert_eq!(
            fees.compute_fee(VehicleSize::Large, 1.75),
            Ok(Money::from_cents(1000))
        );
        assert_eq!(
            fees.compute_fee(VehicleSize::Large, 2.0),
            Ok(Money::from_cents(1500))
        );
        assert_eq!(
            fees.compute_fee(VehicleSize::Large, 2.01),
            Ok(Money::from_cents(1500))
        );
        assert_eq!(
            fees.compute_fee(VehicleSize::Large, 5.0),
            Ok(Money::from_cents(3000))
        );
    }

    #[test]
    fn zero_and_negative_durations_charge_base_rate() {
        let fees = FeeCalculator::default();
        assert_eq!(
            fees.compute_fee(VehicleSize::Medium, 0.0),
            Ok(Money::from_cents(500))
        );
        assert_eq!(
            fees.compute_fee(VehicleSize::Medium, -0.25),
            Ok(Money::from_cents(500))
        );
    }

    #[test]
    fn missing_rate_is_surfaced() {
        let fees = FeeCalculator::new(
            RateTable::empty().with_rate(VehicleSize::Small, Rate::new(100, 50)),
        );
        assert_eq!(
            fees.compute_fee(VehicleSize::Large, 1.0),
            Err(FeeError::UnknownVehicleClass(VehicleSize::Large))
        );
    }

    #[test]
    fn non_finite_duration_is_rejected() {
        let fees = FeeCalculator::default();
        assert!(matches!(
            fees.compute_fee(VehicleSize::Small, f64::INFINITY),
            Err(FeeError::InvalidDuration(_))
        ));
        assert!(matches!(
            fees.compute_fee(VehicleSize::Small, f64::NAN),
            Err(FeeError::InvalidDuration(_))
        ));
    }

    #[test]
    fn custom_rates_override_defaults() {
        let mut rates = RateTable::default();
        rates.set(VehicleSize::Medium, Rate::new(300, 150));
        let fees = FeeCalculator::new(rates);
        assert_eq!(
            fees.compute_fee(VehicleSize::Medium, 2.5),
            Ok(Money::from_cents(450))
        );
        assert_eq!(
            fees.compute_fee(VehicleSize::Small, 2.5),
            Ok(Money::from_cents(300))
        );
    }
}
