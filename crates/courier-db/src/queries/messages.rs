use courier_types::filters::Filters;
use courier_types::models::Message;
use courier_types::validator::Validator;
use std::sync::LazyLock;

use crate::models::{NewMessage, encode_timestamp, message_row};
use crate::scoped::{Page, Table, bind, contains_pattern, execute_one, fetch_one, fetch_page};
use crate::{AuthScope, Database, Resource, StoreError};

pub const MESSAGE_SORT_SAFELIST: &[&str] = &["timestamp", "-timestamp"];
pub const MESSAGE_DEFAULT_SORT: &str = "timestamp";

pub(crate) const MESSAGES: Table = Table {
    name: "messages",
    key: "message_id",
    columns: &["message_id", "conversation_id", "sender_id", "content", "timestamp"],
    resource: Resource::Message,
};

const IN_CONVERSATION: &str = "messages.conversation_id = :conversation_id";
const BY_ID: &str = "messages.message_id = :message_id";
const CONTENT_MATCHES: &str = "messages.content LIKE :pattern ESCAPE '\\'";

/// Only a participant of the target conversation produces a row to insert,
/// so the sender is checked by the same predicate that guards reads.
static INSERT_SQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "INSERT INTO messages (conversation_id, sender_id, content, timestamp)
         SELECT conversations.conversation_id, :caller, :content, :timestamp
         FROM conversations
         WHERE conversations.conversation_id = :conversation_id AND {}
         RETURNING message_id, conversation_id, sender_id, content, timestamp",
        AuthScope::predicate(Resource::Conversation, "conversations"),
    )
});

pub fn validate_message_content(content: &str) -> Result<(), StoreError> {
    let mut v = Validator::new();
    v.check(!content.trim().is_empty(), "content", "must be provided");
    v.finish().map_err(StoreError::Validation)
}

impl Database {
    /// Posts as the caller. A conversation the caller is not part of is
    /// reported as `NotFound`, same as one that does not exist.
    pub fn insert_message(&self, scope: &AuthScope, new: &NewMessage<'_>) -> Result<Message, StoreError> {
        validate_message_content(new.content)?;

        let timestamp = encode_timestamp(&new.timestamp);
        self.with_conn(|conn| {
            fetch_one(
                conn,
                &INSERT_SQL,
                vec![
                    scope.param(),
                    bind(":conversation_id", &new.conversation_id),
                    bind(":content", &new.content),
                    bind(":timestamp", &timestamp),
                ],
                message_row,
            )
        })
    }

    pub fn get_message(
        &self,
        scope: &AuthScope,
        conversation_id: i64,
        message_id: i64,
    ) -> Result<Message, StoreError> {
        self.with_conn(|conn| {
            fetch_one(
                conn,
                &MESSAGES.get_sql(&[IN_CONVERSATION, BY_ID]),
                vec![
                    scope.param(),
                    bind(":conversation_id", &conversation_id),
                    bind(":message_id", &message_id),
                ],
                message_row,
            )
        })
    }

    /// Lists one conversation's messages. `search` is matched as a literal,
    /// case-insensitive substring of the content.
    pub fn list_messages(
        &self,
        scope: &AuthScope,
        conversation_id: i64,
        search: Option<&str>,
        filters: &Filters,
    ) -> Result<Page<Message>, StoreError> {
        let pattern = search.filter(|term| !term.is_empty()).map(contains_pattern);

        let mut conditions = vec![IN_CONVERSATION];
        let mut params = vec![scope.param(), bind(":conversation_id", &conversation_id)];
        if let Some(pattern) = &pattern {
            conditions.push(CONTENT_MATCHES);
            params.push(bind(":pattern", pattern));
        }

        self.with_conn(|conn| {
            fetch_page(
                conn,
                &MESSAGES.list_sql(&conditions, &filters.sort),
                params,
                filters,
                message_row,
            )
        })
    }

    /// Any participant may edit. Concurrent edits are last-writer-wins.
    pub fn update_message(
        &self,
        scope: &AuthScope,
        conversation_id: i64,
        message_id: i64,
        content: &str,
    ) -> Result<Message, StoreError> {
        validate_message_content(content)?;

        self.with_conn(|conn| {
            fetch_one(
                conn,
                &MESSAGES.update_sql("content = :content", &[IN_CONVERSATION, BY_ID]),
                vec![
                    scope.param(),
                    bind(":conversation_id", &conversation_id),
                    bind(":message_id", &message_id),
                    bind(":content", &content),
                ],
                message_row,
            )
        })
    }

    pub fn delete_message(
        &self,
        scope: &AuthScope,
        conversation_id: i64,
        message_id: i64,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            execute_one(
                conn,
                &MESSAGES.delete_sql(&[IN_CONVERSATION, BY_ID]),
                vec![
                    scope.param(),
                    bind(":conversation_id", &conversation_id),
                    bind(":message_id", &message_id),
                ],
            )
        })
    }
}
