use serde::Deserialize;

use crate::db::RecipeQuery;
use crate::domain::Caller;

/// Raw query string of `GET /recipes/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilterParams {
    pub author: Option<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthorFilter {
    #[default]
    Any,
    Id(i32),
    /// The parameter was present but not an integer, e.g. an unsubstituted
    /// `{{userId}}` placeholder. Matches nothing.
    Unmatchable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: AuthorFilter,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeFilter {
    #[must_use]
    pub fn from_params(params: &RecipeFilterParams) -> Self {
        let author = match params.author.as_deref().map(str::trim) {
            None | Some("") => AuthorFilter::Any,
            Some(raw) => raw
                .parse()
                .map_or(AuthorFilter::Unmatchable, AuthorFilter::Id),
        };

        Self {
            author,
            is_favorited: parse_flag(params.is_favorited.as_deref()),
            is_in_shopping_cart: parse_flag(params.is_in_shopping_cart.as_deref()),
        }
    }

    /// Resolves the filter for `caller`. `None` means nothing can match.
    ///
    /// Membership flags only ever narrow the set for an authenticated caller;
    /// for anyone else they pass everything through.
    #[must_use]
    pub fn to_query(self, caller: &Caller) -> Option<RecipeQuery> {
        let author_id = match self.author {
            AuthorFilter::Any => None,
            AuthorFilter::Id(id) => Some(id),
            AuthorFilter::Unmatchable => return None,
        };

        let user_id = caller.user_id();

        Some(RecipeQuery {
            author_id,
            favorited_by: user_id.filter(|_| self.is_favorited),
            in_cart_of: user_id.filter(|_| self.is_in_shopping_cart),
        })
    }
}

/// `1`/`true` are set, anything else (including garbage) is unset.
fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| {
        let v = v.trim();
        v == "1" || v.eq_ignore_ascii_case("true")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;

    fn params(author: Option<&str>, fav: Option<&str>, cart: Option<&str>) -> RecipeFilterParams {
        RecipeFilterParams {
            author: author.map(str::to_string),
            is_favorited: fav.map(str::to_string),
            is_in_shopping_cart: cart.map(str::to_string),
        }
    }

    fn signed_in() -> Caller {
        Caller::User(User {
            id: 9,
            username: "u".to_string(),
            email: "u@example.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            avatar: None,
        })
    }

    #[test]
    fn malformed_author_matches_nothing() {
        let filter = RecipeFilter::from_params(&params(Some("{{userId}}"), None, None));
        assert_eq!(filter.author, AuthorFilter::Unmatchable);
        assert_eq!(filter.to_query(&Caller::Anonymous), None);
    }

    #[test]
    fn empty_author_is_ignored() {
        let filter = RecipeFilter::from_params(&params(Some(""), None, None));
        assert_eq!(
            filter.to_query(&Caller::Anonymous),
            Some(RecipeQuery::default())
        );
    }

    #[test]
    fn flags_only_narrow_for_signed_in_callers() {
        let filter = RecipeFilter::from_params(&params(Some("3"), Some("1"), Some("true")));

        assert_eq!(
            filter.to_query(&Caller::Anonymous),
            Some(RecipeQuery {
                author_id: Some(3),
                favorited_by: None,
                in_cart_of: None,
            })
        );
        assert_eq!(
            filter.to_query(&signed_in()),
            Some(RecipeQuery {
                author_id: Some(3),
                favorited_by: Some(9),
                in_cart_of: Some(9),
            })
        );
    }

    #[test]
    fn false_and_garbage_flags_pass_through() {
        for raw in ["0", "false", "FALSE", "yes", ""] {
            let filter = RecipeFilter::from_params(&params(None, Some(raw), Some(raw)));
            assert_eq!(
                filter.to_query(&signed_in()),
                Some(RecipeQuery::default()),
                "{raw}"
            );
        }
        assert!(RecipeFilter::from_params(&params(None, Some("TRUE"), None)).is_favorited);
    }
}
