use crate::error::LarderError;
use crate::types::UserId;

/// The identity behind a request, if any.
///
/// Every [`Larder`](crate::Larder) entry point takes a `Caller` and rejects
/// anonymous ones before touching any store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(Option<UserId>);

impl Caller {
    pub fn authenticated(user: UserId) -> Self {
        Self(Some(user))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user(&self) -> Option<UserId> {
        self.0
    }

    pub fn require(&self) -> Result<UserId, LarderError> {
        self.0.ok_or(LarderError::Unauthenticated)
    }
}

impl From<Option<UserId>> for Caller {
    fn from(user: Option<UserId>) -> Self {
        Self(user)
    }
}
