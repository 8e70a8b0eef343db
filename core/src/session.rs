//! Session identity forwarded to collaborators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque (application, user, session) triple
///
/// Any conversation memory scoped by this triple belongs to the collaborator;
/// Agentflow only forwards it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionScope {
    /// Application name
    pub app_name: String,
    /// User identifier
    pub user_id: String,
    /// Session identifier
    pub session_id: String,
}

impl SessionScope {
    /// Create a session scope
    #[must_use]
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}
