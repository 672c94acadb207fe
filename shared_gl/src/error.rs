use std::ffi::OsString;

#[derive(Debug)]
pub enum HookError {
    /// The entry is already intercepted by a different interceptor.
    AlreadyInstalled,
    /// The entry cannot be intercepted with the requested strategy.
    UnsupportedEntry(String),
    ProtectFailed,
    LoadLibFailed(String),
    GetProcAddressFailed(String),
    NulError(std::ffi::NulError),
    BadStateError(String),
    ConfReadFailed(String),
    FailedToConvertString(OsString),
    WinApiError(String),
    ModuleNameError(String),
    GlobalLockError,
    IOError(std::io::Error),
    CStrConvertFailed(std::str::Utf8Error),
    SerdeError(String),
    /// Layered planes, single buffering or a context below the capability floor.
    UnsupportedConfiguration(String),
    RuntimeInitFailed(String),
    /// The runtime was retired by another thread while a present was resizing it.
    ResizeRace,
    SharingRejected(String),
}

impl std::convert::From<std::ffi::NulError> for HookError {
    fn from(error: std::ffi::NulError) -> Self {
        HookError::NulError(error)
    }
}

impl std::convert::From<std::ffi::OsString> for HookError {
    fn from(error: std::ffi::OsString) -> Self {
        HookError::FailedToConvertString(error)
    }
}

impl std::convert::From<std::io::Error> for HookError {
    fn from(error: std::io::Error) -> Self {
        HookError::IOError(error)
    }
}

impl std::convert::From<std::str::Utf8Error> for HookError {
    fn from(error: std::str::Utf8Error) -> Self {
        HookError::CStrConvertFailed(error)
    }
}

pub type Result<T> = std::result::Result<T, HookError>;
