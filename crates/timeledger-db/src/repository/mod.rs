//! Generic per-entity storage contract.
//!
//! Any record that can name its table and report its ids gets standard
//! access through [`Repository`]. [`MemoryRepository`] is the process-local
//! implementation backing [`crate::memory::MemoryScheduleStore`];
//! [`PgRepository`] serves offerings, rules and exceptions from PostgreSQL.

mod memory;
mod pg;

pub use memory::MemoryRepository;
pub use pg::PgRepository;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use timeledger_calendar::error::ValueError;
use timeledger_calendar::model::{
    Center, CenterHoliday, Offering, ScheduleException, ScheduleRule,
};
use timeledger_core::types::CenterId;

use crate::error::{DbError, DbResult};

/// A stored record. Ids are assigned by the store when `id()` is zero.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const TABLE_NAME: &'static str;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);

    fn center_id(&self) -> CenterId;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub center_id: Option<CenterId>,
}

impl ListFilter {
    #[must_use]
    pub const fn center(center_id: CenterId) -> Self {
        Self {
            center_id: Some(center_id),
        }
    }

    pub(crate) fn matches<E: Entity>(&self, entity: &E) -> bool {
        self.center_id.is_none_or(|id| entity.center_id() == id)
    }
}

/// Offset pagination over id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub const DEFAULT_LIMIT: usize = 100;

    #[must_use]
    pub const fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_LIMIT)
    }
}

/// Standard access for one entity kind.
pub trait Repository<E: Entity>: Send + Sync {
    fn table_name(&self) -> &'static str {
        E::TABLE_NAME
    }

    fn get_by_id(&self, id: u64) -> BoxFuture<'_, DbResult<Option<E>>>;

    fn list(&self, filter: ListFilter, page: Page) -> BoxFuture<'_, DbResult<Vec<E>>>;

    /// ## Summary
    /// Stores the entity and returns it with its assigned id.
    fn create(&self, entity: E) -> BoxFuture<'_, DbResult<E>>;

    /// ## Summary
    /// Merges `patch` into the stored entity's JSON form. `id` and
    /// `center_id` cannot be changed through a patch.
    ///
    /// ## Errors
    /// Returns `NotFound` for unknown ids and a value error when the patched
    /// document no longer describes a valid entity.
    fn update(&self, id: u64, patch: Map<String, Value>) -> BoxFuture<'_, DbResult<E>>;

    fn delete(&self, id: u64) -> BoxFuture<'_, DbResult<()>>;
}

/// ## Summary
/// Applies a JSON merge patch to an entity, keeping its identity.
///
/// ## Errors
/// Returns a value error if the entity does not serialize to an object or the
/// merged document does not deserialize back.
pub fn apply_patch<E: Entity>(entity: &E, patch: Map<String, Value>) -> DbResult<E> {
    let mut document = match serde_json::to_value(entity).map_err(ValueError::from)? {
        Value::Object(map) => map,
        other => {
            return Err(DbError::mapping(
                E::TABLE_NAME,
                format!("entity serialized to {other}"),
            ));
        }
    };

    for (key, value) in patch {
        if key == "id" || key == "center_id" {
            continue;
        }
        document.insert(key, value);
    }

    let mut patched: E =
        serde_json::from_value(Value::Object(document)).map_err(ValueError::from)?;
    patched.set_id(entity.id());
    Ok(patched)
}

impl Entity for Center {
    const TABLE_NAME: &'static str = "centers";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn center_id(&self) -> CenterId {
        self.id
    }
}

macro_rules! center_owned_entity {
    ($ty:ty, $table:literal) => {
        impl Entity for $ty {
            const TABLE_NAME: &'static str = $table;

            fn id(&self) -> u64 {
                self.id
            }

            fn set_id(&mut self, id: u64) {
                self.id = id;
            }

            fn center_id(&self) -> CenterId {
                self.center_id
            }
        }
    };
}

center_owned_entity!(Offering, "offerings");
center_owned_entity!(ScheduleRule, "schedule_rules");
center_owned_entity!(ScheduleException, "schedule_exceptions");
center_owned_entity!(CenterHoliday, "center_holidays");
