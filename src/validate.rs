//! Code Validator
//! 入力コードの検証（空文字・長さ）

use serde::Serialize;
use std::fmt;

use crate::error::ValidationError;

/// Longest code the backend accepts (`constr(max_length=20)` on `/item`).
pub const MAX_CODE_LEN: usize = 20;

/// A trimmed, length-checked product code or barcode.
///
/// Codes are opaque: no case folding and no barcode checksum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ValidatedCode(String);

impl ValidatedCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ValidatedCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ValidatedCode {
    type Error = ValidationError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        validate(raw)
    }
}

/// Validate raw user input.
pub fn validate(raw: &str) -> Result<ValidatedCode, ValidationError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(ValidationError::Required);
    }

    let len = code.chars().count();
    if len > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            len,
            max: MAX_CODE_LEN,
        });
    }

    Ok(ValidatedCode(code.to_string()))
}
