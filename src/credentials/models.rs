use uuid::Uuid;

use crate::roles::Role;

/// One row of the `users` table.
#[derive(Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .finish()
    }
}

/// Allow-listed fields an update may touch; `None` leaves the column as is.
#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_masks_password_hash() {
        let user = UserRecord {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            role: Role::Student,
            email: "ann@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
        };
        let rendered = format!("{user:?}");
        assert!(rendered.contains("ann@example.com"));
        assert!(!rendered.contains("argon2id"));
    }
}
