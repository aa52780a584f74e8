use courier_types::filters::Filters;
use courier_types::models::Channel;
use courier_types::validator::Validator;
use rusqlite::named_params;

use crate::error::{Violation, constraint_violation};
use crate::models::channel_row;
use crate::scoped::{Page, Table, bind, execute_one, fetch_one, fetch_page};
use crate::{AuthScope, Database, Resource, StoreError};

pub const CHANNEL_SORT_SAFELIST: &[&str] = &["channel_id", "-channel_id", "name", "-name"];
pub const CHANNEL_DEFAULT_SORT: &str = "channel_id";

pub(crate) const CHANNELS: Table = Table {
    name: "channels",
    key: "channel_id",
    columns: &["channel_id", "owner_user_id", "name"],
    resource: Resource::Channel,
};

const BY_ID: &str = "channels.channel_id = :channel_id";

pub fn validate_channel_name(name: &str) -> Result<(), StoreError> {
    let mut v = Validator::new();
    v.check(!name.trim().is_empty(), "name", "must be provided");
    v.finish().map_err(StoreError::Validation)
}

impl Database {
    pub fn insert_channel(&self, scope: &AuthScope, name: &str) -> Result<Channel, StoreError> {
        validate_channel_name(name)?;

        self.with_conn(|conn| {
            conn.query_row(
                "INSERT INTO channels (owner_user_id, name) VALUES (:caller, :name)
                 RETURNING channel_id, owner_user_id, name",
                named_params! { ":caller": scope.caller_id(), ":name": name },
                |row| channel_row(row, 0),
            )
            .map_err(|e| match constraint_violation(&e) {
                // Caller's account is gone but the token is still live.
                Some(Violation::ForeignKey) => StoreError::NotFound,
                _ => e.into(),
            })
        })
    }

    pub fn get_channel(&self, scope: &AuthScope, channel_id: i64) -> Result<Channel, StoreError> {
        self.with_conn(|conn| {
            fetch_one(
                conn,
                &CHANNELS.get_sql(&[BY_ID]),
                vec![scope.param(), bind(":channel_id", &channel_id)],
                channel_row,
            )
        })
    }

    pub fn list_channels(&self, scope: &AuthScope, filters: &Filters) -> Result<Page<Channel>, StoreError> {
        self.with_conn(|conn| {
            fetch_page(
                conn,
                &CHANNELS.list_sql(&[], &filters.sort),
                vec![scope.param()],
                filters,
                channel_row,
            )
        })
    }

    pub fn update_channel(
        &self,
        scope: &AuthScope,
        channel_id: i64,
        name: &str,
    ) -> Result<Channel, StoreError> {
        validate_channel_name(name)?;

        self.with_conn(|conn| {
            fetch_one(
                conn,
                &CHANNELS.update_sql("name = :name", &[BY_ID]),
                vec![scope.param(), bind(":channel_id", &channel_id), bind(":name", &name)],
                channel_row,
            )
        })
    }

    pub fn delete_channel(&self, scope: &AuthScope, channel_id: i64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            execute_one(
                conn,
                &CHANNELS.delete_sql(&[BY_ID]),
                vec![scope.param(), bind(":channel_id", &channel_id)],
            )
        })
    }
}
