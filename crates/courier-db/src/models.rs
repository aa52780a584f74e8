//! Row types and row mappers. Public records live in `courier_types::models`;
//! `UserRow` stays here because it carries the password hash.

use chrono::{DateTime, SecondsFormat, Utc};
use courier_types::models::{Channel, Conversation, Message, User};
use rusqlite::Row;
use rusqlite::types::Type;
use std::fmt;

pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for UserRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRow")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
        }
    }
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

pub struct NewMessage<'a> {
    pub conversation_id: i64,
    pub content: &'a str,
    pub timestamp: DateTime<Utc>,
}

/// Fixed-width RFC 3339 so text order matches chronological order.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// Mappers take the index of the first record column so list queries can
// put the window count in front.

pub(crate) fn user_row(row: &Row<'_>, at: usize) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        user_id: row.get(at)?,
        username: row.get(at + 1)?,
        first_name: row.get(at + 2)?,
        last_name: row.get(at + 3)?,
        password: row.get(at + 4)?,
        created_at: decode_timestamp(row, at + 5)?,
    })
}

pub(crate) fn channel_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Channel> {
    Ok(Channel {
        channel_id: row.get(at)?,
        owner_user_id: row.get(at + 1)?,
        name: row.get(at + 2)?,
    })
}

pub(crate) fn conversation_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        conversation_id: row.get(at)?,
        user_id: row.get(at + 1)?,
        friend_id: row.get(at + 2)?,
    })
}

pub(crate) fn message_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Message> {
    Ok(Message {
        message_id: row.get(at)?,
        conversation_id: row.get(at + 1)?,
        sender_id: row.get(at + 2)?,
        content: row.get(at + 3)?,
        timestamp: decode_timestamp(row, at + 4)?,
    })
}
