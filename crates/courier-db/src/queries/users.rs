use chrono::Utc;
use courier_types::models::User;
use rusqlite::{Connection, named_params};

use crate::error::{FoundExt, OptionalExt, Violation, constraint_violation};
use crate::models::{NewUser, UserRow, encode_timestamp, user_row};
use crate::{AuthScope, Database, StoreError};

const USER_COLUMNS: &str = "user_id, username, first_name, last_name, password, created_at";

impl Database {
    pub fn create_user(&self, new: &NewUser<'_>) -> Result<UserRow, StoreError> {
        let created_at = encode_timestamp(&Utc::now());
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "INSERT INTO users (username, first_name, last_name, password, created_at)
                     VALUES (:username, :first_name, :last_name, :password, :created_at)
                     RETURNING {USER_COLUMNS}"
                ),
                named_params! {
                    ":username": new.username,
                    ":first_name": new.first_name,
                    ":last_name": new.last_name,
                    ":password": new.password_hash,
                    ":created_at": created_at,
                },
                |row| user_row(row, 0),
            )
            .map_err(|e| match constraint_violation(&e) {
                Some(Violation::Unique) => StoreError::Conflict("username is already taken".into()),
                _ => e.into(),
            })
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// The caller's own profile. Users are only ever visible to themselves.
    pub fn get_user(&self, scope: &AuthScope) -> Result<User, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = :caller"),
                &[scope.param()],
                |row| user_row(row, 0),
            )
            .found()
            .map(User::from)
        })
    }

    /// Removes the caller's account; channels, conversations and messages
    /// go with it.
    pub fn delete_user(&self, scope: &AuthScope) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            match conn.execute("DELETE FROM users WHERE user_id = :caller", &[scope.param()])? {
                0 => Err(StoreError::NotFound),
                _ => Ok(()),
            }
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>, StoreError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))?;

    stmt.query_row([username], |row| user_row(row, 0)).optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures::store_with_users;

    #[test]
    fn duplicate_username_is_a_conflict() {
        let db = store_with_users(1);
        let err = db
            .create_user(&NewUser {
                username: "user1",
                first_name: "Again",
                last_name: "User",
                password_hash: "x",
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn lookup_by_username() {
        let db = store_with_users(2);
        let row = db.get_user_by_username("user2").unwrap().unwrap();
        assert_eq!(row.user_id, 2);
        assert_eq!(row.password, "not-a-real-hash");
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn profile_is_scoped_to_self() {
        let db = store_with_users(2);
        let me = db.get_user(&AuthScope::new(2)).unwrap();
        assert_eq!(me.username, "user2");
        assert!(matches!(db.get_user(&AuthScope::new(7)), Err(StoreError::NotFound)));
    }

    #[test]
    fn deleting_self_cascades() {
        let db = store_with_users(2);
        let owner = AuthScope::new(1);
        db.insert_channel(&owner, "general").unwrap();
        db.insert_conversation(&owner, 2).unwrap();

        db.delete_user(&owner).unwrap();

        assert!(matches!(db.get_user(&owner), Err(StoreError::NotFound)));
        assert!(matches!(db.delete_user(&owner), Err(StoreError::NotFound)));

        let friend = AuthScope::new(2);
        let filters = crate::queries::fixtures::filters(
            1,
            10,
            "conversation_id",
            crate::queries::conversations::CONVERSATION_SORT_SAFELIST,
        );
        let page = db.list_conversations(&friend, &filters).unwrap();
        assert!(page.items.is_empty());
    }
}
