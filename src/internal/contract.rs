//! Fatal construction-contract violations.

use std::panic;

use crate::key::Key;

/// Panic payload raised when a stored build chain or cached instance does not
/// have the type its key declares.
///
/// Keys carry the `TypeId` of the registered type, so this cannot happen
/// through the public API. It is kept separate from [`DiError`](crate::DiError)
/// because it signals a broken internal invariant, not a resolution failure.
#[derive(Debug, Clone)]
pub struct ContractViolation {
    /// The key whose stored value had the wrong type.
    pub key: String,
    /// The type the caller asked for.
    pub expected: &'static str,
}

impl std::fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stored value for {} is not a {}", self.key, self.expected)
    }
}

/// Logs and raises a [`ContractViolation`].
#[cold]
pub(crate) fn violation(key: &Key, expected: &'static str) -> ! {
    let payload = ContractViolation {
        key: key.to_string(),
        expected,
    };
    tracing::error!(key = %payload.key, expected, "construction contract violated");
    panic::panic_any(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::TypeKind;

    #[test]
    fn violation_panics_with_typed_payload() {
        let key = Key::named::<u32>(TypeKind::Concrete, "n");
        let payload = panic::catch_unwind(|| violation(&key, "alloc::string::String"))
            .expect_err("violation must panic");
        let violation = payload
            .downcast_ref::<ContractViolation>()
            .expect("payload is a ContractViolation");
        assert_eq!(violation.key, "u32[n]");
        assert_eq!(violation.expected, "alloc::string::String");
    }
}
