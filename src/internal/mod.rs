//! Internal implementation details.

pub(crate) mod contract;
pub(crate) mod map;

pub use contract::ContractViolation;
pub(crate) use contract::violation;
pub(crate) use map::HashMap;
