use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resolved user session, provided by the session middleware. The core never
/// issues sessions; it only consumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
    pub timezone: Option<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == "admin")
    }

    pub fn owns(&self, owner: Uuid) -> bool {
        self.id == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_is_detected() {
        let session = Session {
            id: Uuid::now_v7(),
            username: "root".to_string(),
            roles: vec!["user".to_string(), "admin".to_string()],
            timezone: None,
        };
        assert!(session.is_admin());

        let session = Session {
            roles: vec!["user".to_string()],
            ..session
        };
        assert!(!session.is_admin());
    }
}
