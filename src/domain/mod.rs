//! Domain primitives shared by the services and the HTTP layer.
//!
//! [`Caller`] is who is making a request, [`RelationKind`] picks one of the
//! two user/recipe membership relations, and [`FieldErrors`] collects
//! field-level validation messages.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::models::user::User;

/// The identity attached to a request by the token middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Caller {
    #[default]
    Anonymous,
    User(User),
}

impl Caller {
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Option<i32> {
        self.user().map(|u| u.id)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

/// A membership fact between a user and a recipe with no attributes beyond
/// its existence.
///
/// Favorites and shopping carts behave identically; everything that
/// differs between them is answered by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
}

impl RelationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::ShoppingCart => "shopping_cart",
        }
    }

    #[must_use]
    pub const fn already_present_message(&self) -> &'static str {
        match self {
            Self::Favorite => "Recipe is already in favorites.",
            Self::ShoppingCart => "Recipe is already in the shopping list.",
        }
    }

    #[must_use]
    pub const fn not_present_message(&self) -> &'static str {
        match self {
            Self::Favorite => "Recipe is not in favorites.",
            Self::ShoppingCart => "Recipe is not in the shopping list.",
        }
    }

    #[must_use]
    pub const fn not_found_message(&self) -> &'static str {
        match self {
            Self::Favorite => "Recipe not found.",
            Self::ShoppingCart => "Recipe not found or not in the shopping list.",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to messages, serialized as `{"field": ["msg", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(" "))?;
        }
        Ok(())
    }
}
