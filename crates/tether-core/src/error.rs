use crate::record::FieldError;

/// Error produced by a user hook. It travels back to the writer untouched.
pub type HookError = Box<dyn std::error::Error + 'static>;

pub type HookResult = std::result::Result<(), HookError>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("update_view() called before a render trigger was bound")]
    NotMounted,
    #[error("interception config names field `{field}` which the target does not have")]
    Configuration { field: String },
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Hook(#[from] HookError),
}

impl Error {
    pub fn is_not_mounted(&self) -> bool {
        matches!(self, Error::NotMounted)
    }

    /// The hook error exactly as the hook returned it.
    pub fn as_hook_error(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Hook(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    pub fn into_hook_error(self) -> Option<HookError> {
        match self {
            Error::Hook(err) => Some(err),
            _ => None,
        }
    }
}
