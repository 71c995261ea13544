//! View permission checks for map entries.
//!
//! Authorization never removes entries from a map; it only sets
//! [`MapEntry::can_view`](crate::model::MapEntry::can_view).

use serde::{Deserialize, Serialize};

use crate::model::ElementRecord;

/// The user a map is rendered for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl Principal {
    pub fn user(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            username: Some(username.into()),
            is_admin: false,
        }
    }

    pub fn admin(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::user(user_id, username)
        }
    }

    /// No signed-in user.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Decides whether `principal` may open `element`.
pub trait Authorization {
    fn can_view(&self, element: &ElementRecord, principal: &Principal) -> bool;
}

impl<F> Authorization for F
where
    F: Fn(&ElementRecord, &Principal) -> bool,
{
    fn can_view(&self, element: &ElementRecord, principal: &Principal) -> bool {
        self(element, principal)
    }
}

/// Every element is viewable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorization for AllowAll {
    fn can_view(&self, _element: &ElementRecord, _principal: &Principal) -> bool {
        true
    }
}

/// Published elements are viewable by any signed-in user; drafts only by
/// their creator or an admin.
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftOwnership;

impl Authorization for DraftOwnership {
    fn can_view(&self, element: &ElementRecord, principal: &Principal) -> bool {
        if principal.is_admin {
            return true;
        }
        let Some(user_id) = principal.user_id else {
            return false;
        };
        if element.is_draft {
            return element.draft_creator_id == Some(user_id);
        }
        true
    }
}
