//! Threshold rule driving the buy/sell decisions.

use rust_decimal::Decimal;

/// Buy below `buy_level`, sell above `sell_level`. No ordering between the
/// two levels is enforced or assumed; a rule with sell_level < buy_level is
/// evaluated exactly as stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    pub buy_level: Decimal,
    pub sell_level: Decimal,
}
