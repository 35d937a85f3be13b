//! Fee estimate shown beside the capacity and chain-fee forms.
//!
//! Everything here is a pure function of the selected form values; nothing is
//! cached between recalculations.

use serde::{Deserialize, Serialize};

use crate::format::{self, DASH};

pub const DEFAULT_CAPACITY_FEE_RATE: f64 = 0.03;
pub const DEFAULT_EXPECTED_BYTES: u64 = 500;

/// Raw selector values. `capacity` and `transaction_fee_rate` are in sats and
/// sats per byte; `capacity_fee_rate` is a fraction of capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeInputs {
    pub capacity: u64,
    pub capacity_fee_rate: f64,
    pub transaction_fee_rate: u64,
}

/// Enabled state of the capacity fee-rate selector after the capacity rule ran.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSelector {
    pub enabled: bool,
    /// Whether the zero-rate option may be picked.
    pub zero_option_enabled: bool,
    pub value: f64,
}

impl Default for RateSelector {
    fn default() -> Self {
        Self {
            enabled: false,
            zero_option_enabled: true,
            value: 0.0,
        }
    }
}

impl FeeInputs {
    /// Parses selector values the way the page submits them. Unparseable or
    /// negative entries read as zero.
    pub fn parse(capacity: &str, capacity_fee_rate: &str, transaction_fee_rate: &str) -> Self {
        Self {
            capacity: parse_whole(capacity),
            capacity_fee_rate: capacity_fee_rate
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|rate| rate.is_finite() && *rate > 0.0)
                .unwrap_or(0.0),
            transaction_fee_rate: parse_whole(transaction_fee_rate),
        }
    }

    /// Couples the fee-rate selector to capacity: no capacity forces a zero
    /// rate and locks the selector, capacity with a zero rate picks `default_rate`.
    pub fn apply_capacity_rule(&mut self, default_rate: f64) -> RateSelector {
        if self.capacity > 0 {
            if (self.capacity_fee_rate * 100.0).round() == 0.0 {
                self.capacity_fee_rate = default_rate;
            }
            RateSelector {
                enabled: true,
                zero_option_enabled: false,
                value: self.capacity_fee_rate,
            }
        } else {
            self.capacity_fee_rate = 0.0;
            RateSelector::default()
        }
    }

    pub fn estimate(&self, expected_bytes: u64, price_per_sat: f64) -> FeeEstimate {
        let capacity_fee = (self.capacity as f64 * self.capacity_fee_rate).round().max(0.0) as u64;
        let transaction_fee = self.transaction_fee_rate.saturating_mul(expected_bytes);
        let total_fee = transaction_fee.saturating_add(capacity_fee);

        FeeEstimate {
            inputs: *self,
            expected_bytes,
            capacity_fee,
            transaction_fee,
            total_fee,
            capacity_fiat: to_fiat(self.capacity, price_per_sat),
            capacity_fee_fiat: to_fiat(capacity_fee, price_per_sat),
            transaction_fee_fiat: to_fiat(transaction_fee, price_per_sat),
            total_fee_fiat: to_fiat(total_fee, price_per_sat),
        }
    }
}

fn parse_whole(raw: &str) -> u64 {
    let raw = raw.trim();
    raw.parse::<u64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value > 0.0)
                .map(|value| value.trunc() as u64)
        })
        .unwrap_or(0)
}

/// Converts sats to the display currency, rounded to cents.
pub fn to_fiat(sats: u64, price_per_sat: f64) -> f64 {
    (sats as f64 * price_per_sat * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeEstimate {
    pub inputs: FeeInputs,
    pub expected_bytes: u64,
    pub capacity_fee: u64,
    pub transaction_fee: u64,
    pub total_fee: u64,
    pub capacity_fiat: f64,
    pub capacity_fee_fiat: f64,
    pub transaction_fee_fiat: f64,
    pub total_fee_fiat: f64,
}

/// Text for each cell of the fee table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeeDisplay {
    pub selected_capacity: String,
    pub selected_capacity_fiat: String,
    pub capacity_fee_rate: String,
    pub capacity_fee: String,
    pub capacity_fee_fiat: String,
    pub transaction_fee_rate: String,
    pub expected_bytes: String,
    pub transaction_fee: String,
    pub transaction_fee_fiat: String,
    pub total_fee: String,
    pub total_fee_fiat: String,
}

impl FeeEstimate {
    pub fn display(&self) -> FeeDisplay {
        let (selected_capacity, selected_capacity_fiat) = if self.inputs.capacity > 0 {
            (format::group_digits(self.inputs.capacity), format::fiat(self.capacity_fiat))
        } else {
            (DASH.to_owned(), DASH.to_owned())
        };

        let (capacity_fee, capacity_fee_fiat) = if self.capacity_fee > 0 && self.inputs.capacity > 0 {
            (format::group_digits(self.capacity_fee), format::fiat(self.capacity_fee_fiat))
        } else {
            (DASH.to_owned(), DASH.to_owned())
        };

        FeeDisplay {
            selected_capacity,
            selected_capacity_fiat,
            capacity_fee_rate: format::percent(self.inputs.capacity_fee_rate),
            capacity_fee,
            capacity_fee_fiat,
            transaction_fee_rate: format::group_digits(self.inputs.transaction_fee_rate),
            expected_bytes: format::group_digits(self.expected_bytes),
            transaction_fee: format::group_digits(self.transaction_fee),
            transaction_fee_fiat: format::fiat(self.transaction_fee_fiat),
            total_fee: format::group_digits(self.total_fee),
            total_fee_fiat: format::fiat(self.total_fee_fiat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(capacity: u64, rate: f64, tx_rate: u64) -> FeeInputs {
        FeeInputs {
            capacity,
            capacity_fee_rate: rate,
            transaction_fee_rate: tx_rate,
        }
    }

    #[test]
    fn reference_scenario_totals() {
        let estimate = inputs(500_000, 0.03, 10).estimate(250, 0.0);
        assert_eq!(estimate.capacity_fee, 15_000);
        assert_eq!(estimate.transaction_fee, 2_500);
        assert_eq!(estimate.total_fee, 17_500);

        let display = estimate.display();
        assert_eq!(display.capacity_fee, "15,000");
        assert_eq!(display.transaction_fee, "2,500");
        assert_eq!(display.total_fee, "17,500");
        assert_eq!(display.capacity_fee_rate, "3%");
    }

    #[test]
    fn capacity_fee_rounds_to_nearest_sat() {
        assert_eq!(inputs(16_777_215, 0.02, 1).estimate(500, 0.0).capacity_fee, 335_544);
        assert_eq!(inputs(1_000_001, 0.005, 1).estimate(500, 0.0).capacity_fee, 5_000);
        assert_eq!(inputs(100, 0.005, 1).estimate(500, 0.0).capacity_fee, 1);
    }

    #[test]
    fn zero_capacity_fee_shows_dash_but_transaction_fee_does_not() {
        let display = inputs(0, 0.0, 0).estimate(500, 0.0004).display();
        assert_eq!(display.selected_capacity, DASH);
        assert_eq!(display.selected_capacity_fiat, DASH);
        assert_eq!(display.capacity_fee, DASH);
        assert_eq!(display.capacity_fee_fiat, DASH);
        assert_eq!(display.transaction_fee, "0");
        assert_eq!(display.transaction_fee_fiat, "0.00");
        assert_eq!(display.total_fee, "0");
    }

    #[test]
    fn fiat_values_round_to_cents() {
        let estimate = inputs(500_000, 0.03, 10).estimate(250, 0.000_123_456);
        assert_eq!(estimate.capacity_fiat, 61.73);
        assert_eq!(estimate.capacity_fee_fiat, 1.85);
        assert_eq!(estimate.transaction_fee_fiat, 0.31);
        assert_eq!(estimate.total_fee_fiat, 2.16);
        assert_eq!(estimate.display().selected_capacity_fiat, "61.73");
    }

    #[test]
    fn zero_capacity_locks_rate_selector() {
        let mut fees = inputs(0, 0.1, 5);
        let selector = fees.apply_capacity_rule(DEFAULT_CAPACITY_FEE_RATE);
        assert!(!selector.enabled);
        assert!(selector.zero_option_enabled);
        assert_eq!(selector.value, 0.0);
        assert_eq!(fees.capacity_fee_rate, 0.0);
    }

    #[test]
    fn positive_capacity_defaults_a_zero_rate() {
        let mut fees = inputs(1_000_000, 0.0, 5);
        let selector = fees.apply_capacity_rule(DEFAULT_CAPACITY_FEE_RATE);
        assert!(selector.enabled);
        assert!(!selector.zero_option_enabled);
        assert_eq!(fees.capacity_fee_rate, 0.03);

        let mut chosen = inputs(1_000_000, 0.18, 5);
        chosen.apply_capacity_rule(DEFAULT_CAPACITY_FEE_RATE);
        assert_eq!(chosen.capacity_fee_rate, 0.18);
    }

    #[test]
    fn parse_tolerates_junk() {
        assert_eq!(FeeInputs::parse("500000", "0.03", "10"), inputs(500_000, 0.03, 10));
        assert_eq!(FeeInputs::parse("", "abc", "-4"), inputs(0, 0.0, 0));
        assert_eq!(FeeInputs::parse(" 16777215 ", "0.1", "2.9"), inputs(16_777_215, 0.1, 2));
    }
}
