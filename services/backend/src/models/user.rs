use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub is_admin: bool,
}

/// The acting user of a request. Anonymous requests carry no user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Principal(Option<User>);

impl Principal {
    pub fn anonymous() -> Self {
        Principal(None)
    }

    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(|u| u.is_admin)
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Principal(Some(user))
    }
}
