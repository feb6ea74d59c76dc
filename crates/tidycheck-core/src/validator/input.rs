//! Input selection for the observation-level operation.

use crate::error::TidyError;

/// Decide whether augmenting may proceed with the supplied inputs.
///
/// At most one of `data` and `newdata` may be given. With neither, the
/// model must be able to reconstruct its training data. Fails on the
/// first problem.
pub fn validate_input_selection(
    data_provided: bool,
    newdata_provided: bool,
    reconstructible: bool,
) -> Result<(), TidyError> {
    if data_provided && newdata_provided {
        return Err(TidyError::ConflictingInput);
    }
    if !data_provided && !newdata_provided && !reconstructible {
        return Err(TidyError::MissingInput);
    }
    Ok(())
}
