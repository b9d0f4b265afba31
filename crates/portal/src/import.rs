//! Bulk user import from a JSON file

use anyhow::{Context, Result, bail};
use portal_auth::SecretHasher;
use portal_db::{Database, MAX_USERNAME_LENGTH, NewUser, UserRole};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// One user record in an import file
#[derive(Debug, Deserialize)]
pub struct ImportedUser {
    pub username: String,
    /// Plaintext; hashed before it is stored
    pub password: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::User
}

/// Read a JSON array of users from `path`
pub fn read_import_file(path: &Path) -> Result<Vec<ImportedUser>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let users: Vec<ImportedUser> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse import file: {}", path.display()))?;

    for (index, user) in users.iter().enumerate() {
        if user.username.trim().is_empty() {
            bail!("Record {} has an empty username", index + 1);
        }
        if user.username.trim().chars().count() > MAX_USERNAME_LENGTH {
            bail!(
                "Record {} has a username longer than {} characters",
                index + 1,
                MAX_USERNAME_LENGTH
            );
        }
        if user.password.is_empty() {
            bail!("Record {} ({}) has an empty password", index + 1, user.username);
        }
    }

    Ok(users)
}

/// Hash and upsert every user; existing accounts get the new hash and role
pub async fn import_users(
    db: &Database,
    hasher: &dyn SecretHasher,
    users: Vec<ImportedUser>,
) -> Result<usize> {
    let mut imported = 0;

    for user in users {
        let password_hash = hasher.hash(&user.password)?;
        let stored = db
            .upsert_user(NewUser {
                username: user.username.trim().to_string(),
                password_hash,
                role: user.role,
            })
            .await?;

        info!("Imported user {} ({})", stored.username, stored.role);
        imported += 1;
    }

    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_auth::AuthError;
    use std::io::Write;

    struct PlainHasher;

    impl SecretHasher for PlainHasher {
        fn hash(&self, plain: &str) -> Result<String, AuthError> {
            Ok(format!("plain:{}", plain))
        }

        fn verify(&self, plain: &str, hash: &str) -> Result<bool, AuthError> {
            Ok(hash == format!("plain:{}", plain))
        }
    }

    fn import_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_import_file() {
        let file = import_file(
            r#"[
                {"username": "carol", "password": "pw-carol", "role": "admin"},
                {"username": "dave", "password": "pw-dave"}
            ]"#,
        );

        let users = read_import_file(file.path()).unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].role, UserRole::Admin);
        assert_eq!(users[1].role, UserRole::User);
    }

    #[test]
    fn test_read_import_file_rejects_bad_records() {
        let empty_password = import_file(r#"[{"username": "carol", "password": ""}]"#);
        assert!(read_import_file(empty_password.path()).is_err());

        let bad_role = import_file(r#"[{"username": "carol", "password": "x", "role": "root"}]"#);
        assert!(read_import_file(bad_role.path()).is_err());

        let long_name = import_file(&format!(
            r#"[{{"username": "{}", "password": "x"}}]"#,
            "a".repeat(MAX_USERNAME_LENGTH + 1)
        ));
        assert!(read_import_file(long_name.path()).is_err());

        let not_an_array = import_file(r#"{"username": "carol"}"#);
        assert!(read_import_file(not_an_array.path()).is_err());
    }

    #[tokio::test]
    async fn test_import_users_upserts() {
        let db = Database::in_memory().await.unwrap();
        db.insert_user(NewUser {
            username: "carol".to_string(),
            password_hash: "plain:old".to_string(),
            role: UserRole::User,
        })
        .await
        .unwrap();

        let users = vec![
            ImportedUser {
                username: "carol".to_string(),
                password: "new".to_string(),
                role: UserRole::Admin,
            },
            ImportedUser {
                username: "dave".to_string(),
                password: "pw-dave".to_string(),
                role: UserRole::User,
            },
        ];

        let count = import_users(&db, &PlainHasher, users).await.unwrap();
        assert_eq!(count, 2);

        let carol = db.get_user_by_username("carol").await.unwrap().unwrap();
        assert_eq!(carol.password_hash, "plain:new");
        assert_eq!(carol.role, UserRole::Admin);
        assert!(db.get_user_by_username("dave").await.unwrap().is_some());
    }
}
