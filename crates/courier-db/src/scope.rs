//! Per-caller row visibility.
//!
//! Every statement that reads, updates or deletes a channel, conversation
//! or message conjoins the predicate rendered here. Rows outside the scope
//! are indistinguishable from rows that do not exist.

use rusqlite::ToSql;

/// Named parameter every scope predicate binds the caller to.
pub const CALLER_PARAM: &str = ":caller";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Owned by exactly one user.
    Channel,
    /// Shared by `user_id` and `friend_id`.
    Conversation,
    /// Visible to the participants of the parent conversation.
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthScope {
    caller_id: i64,
}

impl AuthScope {
    pub fn new(caller_id: i64) -> Self {
        Self { caller_id }
    }

    pub fn caller_id(&self) -> i64 {
        self.caller_id
    }

    /// Predicate restricting `table` (a table name or alias) to rows the
    /// caller may see.
    pub fn predicate(resource: Resource, table: &str) -> String {
        match resource {
            Resource::Channel => format!("{table}.owner_user_id = {CALLER_PARAM}"),
            Resource::Conversation => {
                format!("({table}.user_id = {CALLER_PARAM} OR {table}.friend_id = {CALLER_PARAM})")
            }
            // Sender is irrelevant here: a recipient who never replied must
            // still see the thread.
            Resource::Message => format!(
                "EXISTS (SELECT 1 FROM conversations scope_c \
                 WHERE scope_c.conversation_id = {table}.conversation_id \
                 AND (scope_c.user_id = {CALLER_PARAM} OR scope_c.friend_id = {CALLER_PARAM}))"
            ),
        }
    }

    pub fn param(&self) -> (&'static str, &dyn ToSql) {
        (CALLER_PARAM, &self.caller_id)
    }
}
