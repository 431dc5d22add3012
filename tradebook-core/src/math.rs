//! Decimal rounding context shared by a series and everything computed over it.
//!
//! Every division inside one computation (indicator fill, stats pass) goes
//! through the same context so results are reproducible run to run. Division
//! by zero is not an error anywhere in this workspace — it yields `None`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Scale and rounding mode applied to every derived decimal figure.
///
/// Raw candle and trade fields are stored exactly as ingested; the context
/// only shapes computed values (means, ratios, smoothed series).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MathContext {
    pub scale: u32,
    pub rounding: RoundingStrategy,
}

impl Default for MathContext {
    fn default() -> Self {
        Self {
            scale: 8,
            rounding: RoundingStrategy::MidpointNearestEven,
        }
    }
}

impl MathContext {
    pub const fn new(scale: u32, rounding: RoundingStrategy) -> Self {
        Self { scale, rounding }
    }

    /// Round a value to this context's scale.
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.scale, self.rounding)
    }

    /// Checked division: `None` on a zero divisor, rounded otherwise.
    pub fn div(&self, numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
        if denominator == Decimal::ZERO {
            None
        } else {
            Some(self.round(numerator / denominator))
        }
    }

    /// Mean of a sum over `count` items; `None` when `count` is zero.
    pub fn mean(&self, sum: Decimal, count: usize) -> Option<Decimal> {
        self.div(sum, Decimal::from(count as u64))
    }

    /// Fraction `part / total` of two counts; `None` when `total` is zero.
    pub fn fraction(&self, part: usize, total: usize) -> Option<Decimal> {
        self.div(Decimal::from(part as u64), Decimal::from(total as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn div_by_zero_is_none() {
        let ctx = MathContext::default();
        assert_eq!(ctx.div(dec!(1), dec!(0)), None);
    }

    #[test]
    fn div_rounds_to_scale() {
        let ctx = MathContext::new(4, RoundingStrategy::MidpointNearestEven);
        assert_eq!(ctx.div(dec!(1), dec!(3)), Some(dec!(0.3333)));
        assert_eq!(ctx.div(dec!(2), dec!(3)), Some(dec!(0.6667)));
    }

    #[test]
    fn mean_of_zero_items_is_none() {
        let ctx = MathContext::default();
        assert_eq!(ctx.mean(dec!(10), 0), None);
        assert_eq!(ctx.mean(dec!(10), 4), Some(dec!(2.5)));
    }

    #[test]
    fn fraction_of_counts() {
        let ctx = MathContext::new(4, RoundingStrategy::MidpointNearestEven);
        assert_eq!(ctx.fraction(3, 5), Some(dec!(0.6)));
        assert_eq!(ctx.fraction(1, 0), None);
    }

    #[test]
    fn bankers_rounding_at_midpoint() {
        let ctx = MathContext::new(2, RoundingStrategy::MidpointNearestEven);
        assert_eq!(ctx.round(dec!(0.125)), dec!(0.12));
        assert_eq!(ctx.round(dec!(0.135)), dec!(0.14));
    }
}
