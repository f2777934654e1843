//! The authenticated user as seen by the todo page.
//!
//! Sign-in happens outside this crate; the host hands over whatever display
//! name its identity provider produced.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
}

impl Session {
    pub fn signed_in(username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            username: (!username.is_empty()).then_some(username),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn greeting(&self) -> String {
        format!("Hello {}", self.username().unwrap_or("Stranger"))
    }
}
