use courier_types::filters::Filters;
use courier_types::models::Conversation;
use courier_types::validator::Validator;
use rusqlite::named_params;

use crate::error::{Violation, constraint_violation};
use crate::models::conversation_row;
use crate::scoped::{Page, Table, bind, execute_one, fetch_one, fetch_page};
use crate::{AuthScope, Database, Resource, StoreError};

pub const CONVERSATION_SORT_SAFELIST: &[&str] = &["conversation_id", "-conversation_id"];
pub const CONVERSATION_DEFAULT_SORT: &str = "conversation_id";

pub(crate) const CONVERSATIONS: Table = Table {
    name: "conversations",
    key: "conversation_id",
    columns: &["conversation_id", "user_id", "friend_id"],
    resource: Resource::Conversation,
};

const BY_ID: &str = "conversations.conversation_id = :conversation_id";

pub fn validate_conversation(caller_id: i64, friend_id: i64) -> Result<(), StoreError> {
    let mut v = Validator::new();
    v.check(friend_id > 0, "friend_id", "must be a positive integer");
    v.check(friend_id != caller_id, "friend_id", "must be a different user");
    v.finish().map_err(StoreError::Validation)
}

impl Database {
    /// Opens a conversation between the caller and `friend_id`.
    pub fn insert_conversation(&self, scope: &AuthScope, friend_id: i64) -> Result<Conversation, StoreError> {
        validate_conversation(scope.caller_id(), friend_id)?;

        self.with_conn(|conn| {
            conn.query_row(
                "INSERT INTO conversations (user_id, friend_id) VALUES (:caller, :friend_id)
                 RETURNING conversation_id, user_id, friend_id",
                named_params! { ":caller": scope.caller_id(), ":friend_id": friend_id },
                |row| conversation_row(row, 0),
            )
            .map_err(|e| match constraint_violation(&e) {
                Some(Violation::ForeignKey) => {
                    StoreError::field("friend_id", "must reference an existing user")
                }
                _ => e.into(),
            })
        })
    }

    pub fn get_conversation(&self, scope: &AuthScope, conversation_id: i64) -> Result<Conversation, StoreError> {
        self.with_conn(|conn| {
            fetch_one(
                conn,
                &CONVERSATIONS.get_sql(&[BY_ID]),
                vec![scope.param(), bind(":conversation_id", &conversation_id)],
                conversation_row,
            )
        })
    }

    pub fn list_conversations(
        &self,
        scope: &AuthScope,
        filters: &Filters,
    ) -> Result<Page<Conversation>, StoreError> {
        self.with_conn(|conn| {
            fetch_page(
                conn,
                &CONVERSATIONS.list_sql(&[], &filters.sort),
                vec![scope.param()],
                filters,
                conversation_row,
            )
        })
    }

    /// Either participant may delete; messages cascade.
    pub fn delete_conversation(&self, scope: &AuthScope, conversation_id: i64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            execute_one(
                conn,
                &CONVERSATIONS.delete_sql(&[BY_ID]),
                vec![scope.param(), bind(":conversation_id", &conversation_id)],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures::{filters, store_with_users};

    #[test]
    fn friend_must_be_someone_else_who_exists() {
        let db = store_with_users(2);
        let me = AuthScope::new(1);

        for friend in [1, 0, -4] {
            assert!(matches!(
                db.insert_conversation(&me, friend),
                Err(StoreError::Validation(errors)) if errors.contains_key("friend_id")
            ));
        }
        match db.insert_conversation(&me, 77) {
            Err(StoreError::Validation(errors)) => {
                assert_eq!(errors["friend_id"], "must reference an existing user")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn both_participants_see_it_and_nobody_else() {
        let db = store_with_users(9);
        let conversation = db.insert_conversation(&AuthScope::new(1), 5).unwrap();
        let id = conversation.conversation_id;

        assert_eq!(db.get_conversation(&AuthScope::new(1), id).unwrap(), conversation);
        assert_eq!(db.get_conversation(&AuthScope::new(5), id).unwrap(), conversation);

        for outsider in [2, 3, 4, 6, 7, 8, 9] {
            assert!(matches!(
                db.get_conversation(&AuthScope::new(outsider), id),
                Err(StoreError::NotFound)
            ));
        }
    }

    #[test]
    fn outsider_cannot_delete() {
        let db = store_with_users(9);
        let conversation = db.insert_conversation(&AuthScope::new(1), 5).unwrap();
        let id = conversation.conversation_id;

        assert!(matches!(
            db.delete_conversation(&AuthScope::new(9), id),
            Err(StoreError::NotFound)
        ));
        assert!(db.get_conversation(&AuthScope::new(1), id).is_ok());

        // The friend, not only the opener, may remove it.
        db.delete_conversation(&AuthScope::new(5), id).unwrap();
        assert!(matches!(
            db.get_conversation(&AuthScope::new(1), id),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn list_counts_only_the_callers_conversations() {
        let db = store_with_users(4);
        db.insert_conversation(&AuthScope::new(1), 2).unwrap();
        db.insert_conversation(&AuthScope::new(3), 1).unwrap();
        db.insert_conversation(&AuthScope::new(1), 4).unwrap();
        db.insert_conversation(&AuthScope::new(2), 3).unwrap();

        let page = db
            .list_conversations(&AuthScope::new(1), &filters(1, 2, "-conversation_id", CONVERSATION_SORT_SAFELIST))
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|c| c.conversation_id).collect();
        assert_eq!(ids, [3, 2]);
        assert_eq!(page.metadata.total_records, 3);
        assert_eq!(page.metadata.last_page, 2);

        let page = db
            .list_conversations(&AuthScope::new(1), &filters(2, 2, "-conversation_id", CONVERSATION_SORT_SAFELIST))
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|c| c.conversation_id).collect();
        assert_eq!(ids, [1]);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let db = store_with_users(2);
        db.insert_conversation(&AuthScope::new(1), 2).unwrap();

        let page = db
            .list_conversations(&AuthScope::new(1), &filters(5, 10, "conversation_id", CONVERSATION_SORT_SAFELIST))
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.metadata.total_records, 0);
    }
}
