//! Ordered guard pipeline for mutating a single owned resource.
//!
//! Each stage is its own type, so the order of checks is fixed at compile
//! time: existence, then authentication, then ownership, then payload
//! validation. Creation skips the first and third stage.
//!
//! ```text
//! Access::new(caller).locate(found)?.authenticate()?.authorize()?.validate(check).await?
//! Access::new(caller).authenticate()?.validate(check).await?
//! ```

use std::future::Future;

use crate::domain::{Caller, FieldErrors};
use crate::entities::recipes;
use crate::models::user::User;

/// Why the pipeline stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denied {
    NotFound,
    Unauthenticated,
    Forbidden,
    Invalid(FieldErrors),
}

impl From<FieldErrors> for Denied {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// Something with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> i32;
}

impl Owned for recipes::Model {
    fn owner_id(&self) -> i32 {
        self.author_id
    }
}

pub struct Access<'a> {
    caller: &'a Caller,
}

pub struct Located<'a, R> {
    caller: &'a Caller,
    resource: R,
}

pub struct Authenticated<'a, R> {
    user: &'a User,
    resource: R,
}

pub struct Authorized<'a, R> {
    user: &'a User,
    resource: R,
}

/// Every guard passed.
#[derive(Debug)]
pub struct Granted<'a, R, T> {
    pub user: &'a User,
    pub resource: R,
    pub payload: T,
}

impl<'a> Access<'a> {
    #[must_use]
    pub const fn new(caller: &'a Caller) -> Self {
        Self { caller }
    }

    pub fn locate<R>(self, resource: Option<R>) -> Result<Located<'a, R>, Denied> {
        resource
            .map(|resource| Located {
                caller: self.caller,
                resource,
            })
            .ok_or(Denied::NotFound)
    }

    /// Entry point for creation, where there is nothing to locate or own.
    pub fn authenticate(self) -> Result<Authenticated<'a, ()>, Denied> {
        Located {
            caller: self.caller,
            resource: (),
        }
        .authenticate()
    }
}

impl<'a, R> Located<'a, R> {
    pub fn authenticate(self) -> Result<Authenticated<'a, R>, Denied> {
        match self.caller.user() {
            Some(user) => Ok(Authenticated {
                user,
                resource: self.resource,
            }),
            None => Err(Denied::Unauthenticated),
        }
    }
}

impl<'a, R: Owned> Authenticated<'a, R> {
    pub fn authorize(self) -> Result<Authorized<'a, R>, Denied> {
        if self.resource.owner_id() == self.user.id {
            Ok(Authorized {
                user: self.user,
                resource: self.resource,
            })
        } else {
            Err(Denied::Forbidden)
        }
    }
}

impl<'a> Authenticated<'a, ()> {
    pub async fn validate<T, E, Fut>(
        self,
        check: impl FnOnce() -> Fut,
    ) -> Result<Granted<'a, (), T>, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let payload = check().await?;
        Ok(Granted {
            user: self.user,
            resource: (),
            payload,
        })
    }
}

impl<'a, R> Authorized<'a, R> {
    pub async fn validate<T, E, Fut>(
        self,
        check: impl FnOnce() -> Fut,
    ) -> Result<Granted<'a, R, T>, E>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        let payload = check().await?;
        Ok(Granted {
            user: self.user,
            resource: self.resource,
            payload,
        })
    }

    /// Ends the pipeline for actions without a payload, such as delete.
    pub fn grant(self) -> Granted<'a, R, ()> {
        Granted {
            user: self.user,
            resource: self.resource,
            payload: (),
        }
    }
}
