use crate::auth::password::gravatar_url;
use crate::domain::User as DomainUser;
use async_graphql::{Object, ID};

/// GraphQL representation of a User. The password hash is never exposed.
#[derive(Clone)]
pub struct User {
    pub inner: DomainUser,
}

impl From<DomainUser> for User {
    fn from(user: DomainUser) -> Self {
        Self { inner: user }
    }
}

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID(self.inner.id.to_string())
    }

    async fn email(&self) -> &str {
        &self.inner.email
    }

    async fn username(&self) -> &str {
        &self.inner.username
    }

    /// Gravatar image URL derived from the email address
    async fn avatar(&self) -> String {
        gravatar_url(&self.inner.email)
    }

    async fn date_joined(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.created_at
    }
}
