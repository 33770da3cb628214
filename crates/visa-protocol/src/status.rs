//! Completion and error codes returned by framing operations

use std::fmt;

/// Status of a session read/write or attribute access
///
/// Values mirror the numeric VISA completion/error codes so a dispatcher can
/// hand them straight to callers expecting `ViStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusCode {
    /// Operation completed (for reads: the end indicator was received)
    Success,
    /// Read stopped on the termination character
    SuccessTerminationCharacterRead,
    /// Read stopped after the requested number of bytes
    SuccessMaxCountRead,
    /// Operation did not complete before the timeout
    ErrorTimeout,
    /// Attribute unknown or not applicable to the session
    ErrorNonsupportedAttribute,
    /// Attribute value rejected
    ErrorNonsupportedAttributeState,
    /// Attempt to write a read-only attribute
    ErrorAttributeReadOnly,
    /// Attempt to read a write-only attribute
    ErrorNonsupportedOperation,
}

impl StatusCode {
    /// Numeric VISA status (`ViStatus`)
    pub fn code(&self) -> i32 {
        let raw: u32 = match self {
            StatusCode::Success => 0,
            StatusCode::SuccessTerminationCharacterRead => 0x3FFF_0005,
            StatusCode::SuccessMaxCountRead => 0x3FFF_0006,
            StatusCode::ErrorTimeout => 0xBFFF_0015,
            StatusCode::ErrorNonsupportedAttribute => 0xBFFF_001D,
            StatusCode::ErrorNonsupportedAttributeState => 0xBFFF_001E,
            StatusCode::ErrorAttributeReadOnly => 0xBFFF_001F,
            StatusCode::ErrorNonsupportedOperation => 0xBFFF_0067,
        };
        raw as i32
    }

    /// True for completion codes
    pub fn is_success(&self) -> bool {
        self.code() >= 0
    }

    /// True for error codes
    pub fn is_error(&self) -> bool {
        self.code() < 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Success => "VI_SUCCESS",
            StatusCode::SuccessTerminationCharacterRead => "VI_SUCCESS_TERM_CHAR",
            StatusCode::SuccessMaxCountRead => "VI_SUCCESS_MAX_CNT",
            StatusCode::ErrorTimeout => "VI_ERROR_TMO",
            StatusCode::ErrorNonsupportedAttribute => "VI_ERROR_NSUP_ATTR",
            StatusCode::ErrorNonsupportedAttributeState => "VI_ERROR_NSUP_ATTR_STATE",
            StatusCode::ErrorAttributeReadOnly => "VI_ERROR_ATTR_READONLY",
            StatusCode::ErrorNonsupportedOperation => "VI_ERROR_NSUP_OPER",
        };
        f.write_str(name)
    }
}
