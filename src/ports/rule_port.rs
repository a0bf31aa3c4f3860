//! Rule store access port trait.

use crate::domain::error::PetraderError;
use crate::domain::rule::ThresholdRule;

pub trait RulePort {
    /// Thresholds for a named rule, or `RuleNotFound`.
    fn get_rule(&self, rule_id: i64) -> Result<ThresholdRule, PetraderError>;
}
