//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use email_address::EmailAddress;
use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// The fewest characters allowed in a username.
pub const USERNAME_MIN_LENGTH: usize = 3;
/// The most characters allowed in a username.
pub const USERNAME_MAX_LENGTH: usize = 50;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// A regular user.
    #[default]
    User,
    /// An administrator.
    Admin,
}

impl Role {
    /// The name of the role as stored in the database and sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(Error::Validation(format!("Unknown role \"{other}\""))),
        }
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's unique display name.
    pub username: String,
    /// The user's unique email address, used to log in.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// What the user is allowed to do.
    pub role: Role,
}

/// The data for a user that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// A username that has been checked with [validate_username].
    pub username: String,
    /// The user's email address.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// What the user is allowed to do.
    pub role: Role,
}

/// Trim `raw_username` and check that it has between [USERNAME_MIN_LENGTH]
/// and [USERNAME_MAX_LENGTH] characters.
///
/// # Errors
///
/// Returns [Error::Validation] if the username is too short or too long.
pub fn validate_username(raw_username: &str) -> Result<String, Error> {
    let username = raw_username.trim();
    let length = username.chars().count();

    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return Err(Error::Validation(format!(
            "Username must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters"
        )));
    }

    Ok(username.to_owned())
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('USER', 'ADMIN'))
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateEmail] if the email is already registered,
/// - [Error::DuplicateUsername] if the username is already taken,
/// - [Error::SqlError] if some other SQL error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, email, password, role) VALUES (?1, ?2, ?3, ?4)",
        (
            &new_user.username,
            new_user.email.as_str(),
            new_user.password_hash.as_ref(),
            new_user.role.as_str(),
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: new_user.username,
        email: new_user.email,
        password_hash: new_user.password_hash,
        role: new_user.role,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::UserNotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, username, email, password, role FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
            error => error.into(),
        })
}

/// Get the user registered with `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare("SELECT id, username, email, password, role FROM user WHERE email = :email")?
        .query_row(&[(":email", email)], map_user_row)
        .map_err(|error| error.into())
}

/// Check whether a user is registered with `email`.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn email_exists(email: &str, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM user WHERE email = ?1)",
            (email,),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Check whether a user is registered with `username`.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn username_exists(username: &str, connection: &Connection) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM user WHERE username = ?1)",
            (username,),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get::<_, u32>(0))
        .map(|count| count as usize)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;
    let raw_role: String = row.get(4)?;

    let email = EmailAddress::from_str(&raw_email).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error))
    })?;
    let role = Role::from_str(&raw_role).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(error))
    })?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        role,
    })
}
