//! Capital allocation across the company universe.

use rust_decimal::Decimal;

use super::error::PetraderError;

/// Even split of the starting capital: initial_total / company_count, at
/// full precision. The quotient is not rounded here; sub-unit starting
/// balances are acceptable and the simulator rounds on first cash mutation.
///
/// An empty universe is a configuration error, not a zero allocation.
pub fn allocate_per_company(
    initial_total: Decimal,
    company_count: usize,
) -> Result<Decimal, PetraderError> {
    if company_count == 0 {
        return Err(PetraderError::EmptyUniverse);
    }
    Ok(initial_total / Decimal::from(company_count as u64))
}
