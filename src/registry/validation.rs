// Argument validation: supplied keys vs. declared required/optional keys

use crate::error::ValidationError;
use crate::registry::symbol::Symbol;
use std::collections::BTreeSet;

/// Both halves of an argument check, computed independently
///
/// Each list is sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentReport {
    /// `required \ supplied`
    pub missing: Vec<Symbol>,
    /// `supplied \ (required ∪ optional)`
    pub unrecognized: Vec<Symbol>,
}

impl ArgumentReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.unrecognized.is_empty()
    }

    /// First failure in check order: missing keys, then unrecognized ones
    pub fn into_result(self) -> Result<(), ValidationError> {
        if !self.missing.is_empty() {
            return Err(ValidationError::MissingRequired(self.missing));
        }
        if !self.unrecognized.is_empty() {
            return Err(ValidationError::UnrecognizedArguments(self.unrecognized));
        }
        Ok(())
    }
}

/// Compute missing and unrecognized keys without failing
pub fn check_arguments<'a, S, R, O>(supplied: S, required: R, optional: O) -> ArgumentReport
where
    S: IntoIterator<Item = &'a Symbol>,
    R: IntoIterator<Item = &'a Symbol>,
    O: IntoIterator<Item = &'a Symbol>,
{
    let supplied: BTreeSet<&Symbol> = supplied.into_iter().collect();
    let required: BTreeSet<&Symbol> = required.into_iter().collect();
    let allowed: BTreeSet<&Symbol> = required.iter().copied().chain(optional).collect();

    ArgumentReport {
        missing: required.difference(&supplied).map(|s| (*s).clone()).collect(),
        unrecognized: supplied.difference(&allowed).map(|s| (*s).clone()).collect(),
    }
}

/// Validate supplied keys against the declared sets
///
/// Fails with `MissingRequired` when a required key is absent (checked
/// first), otherwise with `UnrecognizedArguments` when a supplied key is
/// neither required nor optional.
///
/// Usage:
///     validate_arguments(config.keys(), &required, &optional)?;
pub fn validate_arguments<'a, S, R, O>(supplied: S, required: R, optional: O) -> Result<(), ValidationError>
where
    S: IntoIterator<Item = &'a Symbol>,
    R: IntoIterator<Item = &'a Symbol>,
    O: IntoIterator<Item = &'a Symbol>,
{
    check_arguments(supplied, required, optional).into_result()
}
