use crate::error::DbResult;
use std::future::Future;
use std::pin::Pin;

pub mod connection;
pub mod enums;
pub mod map;
pub mod query;
pub mod schema;

pub type ConnectionFuture<'a> =
    Pin<Box<dyn Future<Output = DbResult<connection::DbConnection<'a>>> + Send + 'a>>;

/// Hands out pooled connections. Reads may be served by a replica; writes
/// always go to the primary.
pub trait DbProvider: Send + Sync {
    fn get_connection(&self) -> ConnectionFuture<'_>;

    fn get_read_connection(&self) -> ConnectionFuture<'_>;
}
