//! Input classification by content type.

use super::input::Input;
use crate::error::ClassificationError;
use crate::mime::MimeRegistry;

/// Content-type key of an input, derived from its name alone.
///
/// Paths and glob patterns are classified by their own text; a handle by
/// the name it was opened with.
///
/// # Errors
///
/// - `NoName` for a handle without a name
/// - `Undeterminable` when the registry does not know the name
pub fn classify(input: &Input, mime: &MimeRegistry) -> Result<String, ClassificationError> {
    let name = input.name().ok_or(ClassificationError::NoName)?;
    mime.guess_type(&name)
        .ok_or(ClassificationError::Undeterminable { input: name })
}
