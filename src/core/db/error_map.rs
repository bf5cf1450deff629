/// Error Mapping Module
///
/// Converts the native client's error retrieval calls into a structured
/// code/message pair.
use crate::core::db::native::NativeSession;
use serde::Serialize;
use std::fmt;

/// Code reported when the last native call succeeded.
pub const NO_ERROR_CODE: &str = "00000";

/// Latest error of a session or statement.
///
/// `code` is `"<sqlstate>/<native code>"` when an error is present and the
/// `"00000"` sentinel otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    /// Builds an error entry from a status code and a native error number
    pub fn new(sqlstate: &str, native_code: i32, message: impl Into<String>) -> Self {
        ErrorInfo {
            code: format!("{sqlstate}/{native_code}"),
            message: message.into(),
        }
    }

    /// The "no error" sentinel
    pub fn none() -> Self {
        ErrorInfo {
            code: NO_ERROR_CODE.to_string(),
            message: String::new(),
        }
    }

    /// Reads the current error state of a native session
    pub fn from_session<S: NativeSession + ?Sized>(session: &S) -> Self {
        let native_code = session.errorcode();
        if native_code == 0 {
            return ErrorInfo::none();
        }
        ErrorInfo::new(&session.sqlstate(), native_code, session.error())
    }

    pub fn is_error(&self) -> bool {
        self.code != NO_ERROR_CODE
    }
}

impl Default for ErrorInfo {
    fn default() -> Self {
        ErrorInfo::none()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
