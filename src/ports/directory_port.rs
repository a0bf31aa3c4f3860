//! Company directory access port trait.

use crate::domain::company::Company;
use crate::domain::error::PetraderError;

pub trait DirectoryPort {
    /// The universe of companies to simulate. Upstream order is not relied
    /// upon; the coordinator sorts before processing.
    fn list_companies(&self) -> Result<Vec<Company>, PetraderError>;
}
