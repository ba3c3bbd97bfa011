//! User Storage
//! Mission: Store and manage user accounts in SQLite with unique usernames and emails

use crate::auth::models::{CreateUserRequest, UpdateUserRequest, User, UserRole};
use crate::auth::password::{hash_password, verify_password};
use crate::db::{is_unique_violation, Database};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, role, password_hash, created_at, updated_at";

/// User storage with SQLite backend
pub struct UserStore {
    db: Database,
    bcrypt_cost: u32,
}

impl UserStore {
    pub fn new(db: Database, bcrypt_cost: u32) -> Self {
        Self { db, bcrypt_cost }
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(5)?;
        let role = UserRole::from_str(&role_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("unknown role {:?}", role_str).into(),
            )
        })?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            role,
            password_hash: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let conn = self.db.conn();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                params![username],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by id
    pub fn get_user_by_id(&self, user_id: i64) -> AppResult<Option<User>> {
        let conn = self.db.conn();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![user_id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Return the user iff the username exists and the password matches
    pub fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        match self.get_user_by_username(username)? {
            Some(user) if verify_password(password, &user.password_hash) => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    /// True once any admin account exists
    pub fn admin_exists(&self) -> AppResult<bool> {
        let conn = self.db.conn();
        Self::has_admin(&conn)
    }

    fn has_admin(conn: &Connection) -> AppResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role = ?1)",
            params![UserRole::Admin.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Create a new user
    pub fn create_user(&self, new_user: &CreateUserRequest) -> AppResult<User> {
        new_user.validate()?;

        // Hash before taking the connection lock.
        let password_hash = hash_password(&new_user.password, self.bcrypt_cost)?;

        let conn = self.db.conn();
        let user = Self::insert_user(&conn, new_user, new_user.role, password_hash)?;

        info!("Created user: {} ({})", user.username, user.role);

        Ok(user)
    }

    /// Create the first admin account.
    ///
    /// The "no admin yet" check and the insert run under one connection lock,
    /// so concurrent bootstraps create at most one admin.
    pub fn create_initial_admin(&self, new_user: &CreateUserRequest) -> AppResult<User> {
        new_user.validate()?;

        let password_hash = hash_password(&new_user.password, self.bcrypt_cost)?;

        let conn = self.db.conn();
        if Self::has_admin(&conn)? {
            return Err(AppError::bad_request("System already initialized."));
        }
        let user = Self::insert_user(&conn, new_user, UserRole::Admin, password_hash)?;

        info!("Created initial admin: {}", user.username);

        Ok(user)
    }

    fn insert_user(
        conn: &Connection,
        new_user: &CreateUserRequest,
        role: UserRole,
        password_hash: String,
    ) -> AppResult<User> {
        let username_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![new_user.username],
            |row| row.get(0),
        )?;
        if username_taken {
            return Err(AppError::conflict("Username already exists"));
        }
        let email_taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![new_user.email],
            |row| row.get(0),
        )?;
        if email_taken {
            return Err(AppError::conflict("Email already registered"));
        }

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO users (username, email, first_name, last_name, role, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                new_user.username,
                new_user.email,
                new_user.first_name,
                new_user.last_name,
                role.as_str(),
                password_hash,
                now,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Username or email already exists")
            } else {
                e.into()
            }
        })?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            role,
            password_hash,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// List users ordered by id, paginated
    pub fn list_users(&self, skip: u32, limit: u32) -> AppResult<Vec<User>> {
        let conn = self.db.conn();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY id LIMIT ?1 OFFSET ?2",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map(params![limit, skip], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Apply a partial update; returns `None` when the user does not exist
    pub fn update_user(&self, user_id: i64, changes: &UpdateUserRequest) -> AppResult<Option<User>> {
        changes.validate()?;

        let Some(mut user) = self.get_user_by_id(user_id)? else {
            return Ok(None);
        };

        if let Some(first_name) = &changes.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(password) = &changes.password {
            user.password_hash = hash_password(password, self.bcrypt_cost)?;
        }
        user.updated_at = Utc::now().to_rfc3339();

        let conn = self.db.conn();
        if let Some(email) = &changes.email {
            if *email != user.email {
                let taken: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND id != ?2)",
                    params![email, user_id],
                    |row| row.get(0),
                )?;
                if taken {
                    return Err(AppError::conflict("Email already registered"));
                }
                user.email = email.clone();
            }
        }

        let rows_affected = conn.execute(
            "UPDATE users
             SET email = ?1, first_name = ?2, last_name = ?3, role = ?4, password_hash = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                user.email,
                user.first_name,
                user.last_name,
                user.role.as_str(),
                user.password_hash,
                user.updated_at,
                user_id,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Email already registered")
            } else {
                e.into()
            }
        })?;

        // Deleted between the read above and this write.
        if rows_affected == 0 {
            return Ok(None);
        }

        info!("Updated user: {} ({})", user.username, user.id);

        Ok(Some(user))
    }

    /// Delete a user by ID
    pub fn delete_user(&self, user_id: i64) -> AppResult<()> {
        let conn = self.db.conn();

        let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;

        if rows_affected == 0 {
            return Err(AppError::not_found("User not found."));
        }

        info!("Deleted user: {}", user_id);
        Ok(())
    }
}
