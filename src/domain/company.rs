//! Company identity as supplied by the directory.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: i64,
    pub symbol: String,
}

/// Processing order for a run: ascending by symbol, id as tie-breaker.
/// Directory order is not trusted for reproducibility.
pub fn sort_for_processing(companies: &mut [Company]) {
    companies.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.id.cmp(&b.id)));
}
