//! Redis implementation of [`CoordinationStore`].
//!
//! Maps the four store primitives onto Redis commands over a shared async
//! connection manager:
//! - `try_set_if_absent` → `SET key value NX PX ttl`
//! - `exists` → `EXISTS key`
//! - `increment` → `INCR key`
//! - `conditional_delete` → a server-evaluated Lua script (`EXISTS` + `DEL`
//!   in one atomic step)

use redis::aio::ConnectionManager;
use redis::{Client, Script};
use tracing::debug;

use super::{
    ConditionalDeleteRequest, ConditionalDeleteResult, CoordinationStore, ExistsRequest,
    ExistsResult, IncrementRequest, IncrementResult, SetIfAbsentRequest, SetIfAbsentResult,
    StoreError,
};
use async_trait::async_trait;

/// Deletes the key only when it exists, in a single server-side evaluation.
const DELETE_IF_EXISTS: &str = r#"
if redis.call('exists', KEYS[1]) == 1 then
    return redis.call('del', KEYS[1])
else
    return 0
end"#;

/// Redis-backed coordination store.
///
/// All operations share one multiplexed connection.
pub struct RedisCoordinationStore {
    conn: ConnectionManager,
    delete_script: Script,
}

impl RedisCoordinationStore {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Unavailable {
            reason: e.to_string(),
        })?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::Unavailable {
                reason: e.to_string(),
            })?;

        debug!(url, "connected to coordination store");
        Ok(Self {
            conn,
            delete_script: Script::new(DELETE_IF_EXISTS),
        })
    }
}

fn store_error(err: redis::RedisError) -> StoreError {
    let unreachable = err.is_io_error()
        || err.is_timeout()
        || err.is_connection_refusal()
        || err.is_connection_dropped();
    if unreachable {
        StoreError::Unavailable {
            reason: err.to_string(),
        }
    } else {
        StoreError::Failed {
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl CoordinationStore for RedisCoordinationStore {
    async fn try_set_if_absent(
        &self,
        request: SetIfAbsentRequest,
    ) -> Result<SetIfAbsentResult, StoreError> {
        let mut conn = self.conn.clone();
        // NX returns nil instead of OK when the key already exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(&request.key)
            .arg(&request.value)
            .arg("NX")
            .arg("PX")
            .arg(request.ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(SetIfAbsentResult {
            key: request.key,
            created: reply.is_some(),
        })
    }

    async fn exists(&self, request: ExistsRequest) -> Result<ExistsResult, StoreError> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("EXISTS")
            .arg(&request.key)
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(ExistsResult {
            key: request.key,
            exists,
        })
    }

    async fn increment(&self, request: IncrementRequest) -> Result<IncrementResult, StoreError> {
        let mut conn = self.conn.clone();
        let value: u64 = redis::cmd("INCR")
            .arg(&request.key)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                if e.kind() == redis::ErrorKind::TypeError {
                    StoreError::NotAnInteger {
                        key: request.key.clone(),
                    }
                } else {
                    store_error(e)
                }
            })?;

        Ok(IncrementResult {
            key: request.key,
            value,
        })
    }

    async fn conditional_delete(
        &self,
        request: ConditionalDeleteRequest,
    ) -> Result<ConditionalDeleteResult, StoreError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .delete_script
            .key(&request.key)
            .invoke_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(ConditionalDeleteResult {
            key: request.key,
            deleted: deleted == 1,
        })
    }
}
