use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::auth::Role;
use crate::errors::VulnscanError;
use super::Database;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub comment: Option<&'a str>,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub comment: Option<String>,
}

const USER_COLUMNS: &str = "id, username, email, role, comment";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: role.parse().map_err(|e: VulnscanError| {
            rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e))
        })?,
        comment: row.get(4)?,
    })
}

impl Database {
    pub fn create_user(&self, user: &NewUser) -> Result<i64, VulnscanError> {
        let email = user.email.trim().to_lowercase();
        let conn = self.lock()?;

        check_unique(&conn, user.username, &email, None)?;

        conn.execute(
            "INSERT INTO users (username, email, password_hash, role, comment, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user.username, email, user.password_hash, user.role.as_str(), user.comment, Utc::now().to_rfc3339()],
        ).map_err(|e| VulnscanError::Database(format!("Failed to create user: {}", e)))?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>, VulnscanError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            row_to_user,
        )
        .optional()
        .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))
    }

    /// Looks a user up by email (case-insensitive) and returns it with its password hash.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<(User, String)>, VulnscanError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {}, password_hash FROM users WHERE email = ?1", USER_COLUMNS),
            params![email.trim().to_lowercase()],
            |row| Ok((row_to_user(row)?, row.get::<_, String>(5)?)),
        )
        .optional()
        .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))
    }

    pub fn list_users(&self) -> Result<Vec<User>, VulnscanError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .map_err(|e| VulnscanError::Database(format!("Query failed: {}", e)))?;
        let rows = stmt
            .query_map([], row_to_user)
            .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row.map_err(|e| VulnscanError::Database(format!("Row error: {}", e)))?);
        }
        Ok(users)
    }

    pub fn count_admins(&self) -> Result<i64, VulnscanError> {
        let conn = self.lock()?;
        count_admins(&conn)
    }

    /// Applies `update` to the user. Returns the updated user, or `None` if it does not exist.
    /// Demoting the last admin is a conflict.
    pub fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<User>, VulnscanError> {
        let conn = self.lock()?;
        let existing = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![id],
                row_to_user,
            )
            .optional()
            .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let username = update.username.clone().unwrap_or(existing.username);
        let email = update
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .unwrap_or(existing.email);
        let role = update.role.unwrap_or(existing.role);
        if existing.role == Role::Admin && role != Role::Admin && count_admins(&conn)? <= 1 {
            return Err(VulnscanError::Conflict("Cannot demote the last admin".into()));
        }
        let comment = update.comment.clone().or(existing.comment);

        check_unique(&conn, &username, &email, Some(id))?;

        conn.execute(
            "UPDATE users SET username = ?2, email = ?3, role = ?4, comment = ?5 WHERE id = ?1",
            params![id, username, email, role.as_str(), comment],
        ).map_err(|e| VulnscanError::Database(format!("Update failed: {}", e)))?;

        if let Some(hash) = &update.password_hash {
            conn.execute(
                "UPDATE users SET password_hash = ?2 WHERE id = ?1",
                params![id, hash],
            ).map_err(|e| VulnscanError::Database(format!("Update failed: {}", e)))?;
        }

        Ok(Some(User { id, username, email, role, comment }))
    }

    /// Returns `false` if the user does not exist. Deleting the last admin is a conflict.
    pub fn delete_user(&self, id: i64) -> Result<bool, VulnscanError> {
        let conn = self.lock()?;
        let role: Option<String> = conn
            .query_row("SELECT role FROM users WHERE id = ?1", params![id], |row| row.get(0))
            .optional()
            .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))?;
        let Some(role) = role else {
            return Ok(false);
        };
        if role == Role::Admin.as_str() && count_admins(&conn)? <= 1 {
            return Err(VulnscanError::Conflict("Cannot delete the last admin".into()));
        }

        let affected = conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])
            .map_err(|e| VulnscanError::Database(format!("Delete failed: {}", e)))?;
        Ok(affected > 0)
    }
}

fn count_admins(conn: &Connection) -> Result<i64, VulnscanError> {
    conn.query_row("SELECT COUNT(*) FROM users WHERE role = ?1", params![Role::Admin.as_str()], |row| row.get(0))
        .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))
}

fn check_unique(
    conn: &Connection,
    username: &str,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<(), VulnscanError> {
    let exclude = exclude_id.unwrap_or(-1);

    let username_taken: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 AND id != ?2)",
            params![username, exclude],
            |row| row.get(0),
        )
        .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))?;
    if username_taken {
        return Err(VulnscanError::Conflict("Username already exists".into()));
    }

    let email_taken: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND id != ?2)",
            params![email, exclude],
            |row| row.get(0),
        )
        .map_err(|e| VulnscanError::Database(format!("Query error: {}", e)))?;
    if email_taken {
        return Err(VulnscanError::Conflict("Email already exists".into()));
    }

    Ok(())
}
