//! In-memory schedule store.
//!
//! Serves the schedule contracts from [`MemoryRepository`] tables. Used when
//! no database URL is configured and by the integration tests.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use timeledger_calendar::error::ValueError;
use timeledger_calendar::expand::ExpansionWindow;
use timeledger_calendar::model::{
    Center, CenterHoliday, ExceptionStatus, NewHoliday, Offering, ScheduleException,
    ScheduleRule,
};
use timeledger_calendar::store::{HolidayWriter, ScheduleSource, StoreResult};
use timeledger_calendar::value::DateRange;
use timeledger_core::types::{CenterId, ExceptionId, OfferingId, RuleId};

use crate::admin::{AuditEntry, ScheduleAdmin, holiday_import_entry};
use crate::error::{DbError, DbResult};
use crate::repository::{Entity, MemoryRepository, Repository};

#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    centers: MemoryRepository<Center>,
    offerings: MemoryRepository<Offering>,
    rules: MemoryRepository<ScheduleRule>,
    exceptions: MemoryRepository<ScheduleException>,
    holidays: MemoryRepository<CenterHoliday>,
    audit: RwLock<Vec<AuditEntry>>,
}

impl MemoryScheduleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn centers(&self) -> &MemoryRepository<Center> {
        &self.centers
    }

    #[must_use]
    pub const fn offerings(&self) -> &MemoryRepository<Offering> {
        &self.offerings
    }

    #[must_use]
    pub const fn rules(&self) -> &MemoryRepository<ScheduleRule> {
        &self.rules
    }

    #[must_use]
    pub const fn exceptions(&self) -> &MemoryRepository<ScheduleException> {
        &self.exceptions
    }

    #[must_use]
    pub const fn holidays(&self) -> &MemoryRepository<CenterHoliday> {
        &self.holidays
    }

    /// ## Summary
    /// Seeds records in one call. Records keep their ids when non-zero.
    ///
    /// ## Errors
    /// Returns the first repository error.
    pub async fn seed(
        &self,
        centers: Vec<Center>,
        offerings: Vec<Offering>,
        rules: Vec<ScheduleRule>,
        exceptions: Vec<ScheduleException>,
        holidays: Vec<CenterHoliday>,
    ) -> DbResult<()> {
        for center in centers {
            self.centers.create(center).await?;
        }
        for offering in offerings {
            self.offerings.create(offering).await?;
        }
        for rule in rules {
            self.rules.create(rule).await?;
        }
        for exception in exceptions {
            self.exceptions.create(exception).await?;
        }
        for holiday in holidays {
            self.holidays.create(holiday).await?;
        }
        Ok(())
    }

    /// ## Summary
    /// Returns a copy of the audit log in insertion order.
    pub async fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit.read().await.clone()
    }

    async fn live_offering_ids(&self, center_id: CenterId) -> BTreeSet<OfferingId> {
        self.offerings
            .select(|offering| offering.center_id == center_id)
            .await
            .into_iter()
            .map(|offering| offering.id)
            .collect()
    }

    async fn rules_matching(
        &self,
        center_id: CenterId,
        offering_id: Option<OfferingId>,
        window: ExpansionWindow,
    ) -> Vec<ScheduleRule> {
        let live = self.live_offering_ids(center_id).await;
        self.rules
            .select(|rule| {
                rule.center_id == center_id
                    && live.contains(&rule.offering_id)
                    && offering_id.is_none_or(|id| rule.offering_id == id)
                    && rule.effective_range.intersects(window.from, window.to)
            })
            .await
    }
}

impl ScheduleSource for MemoryScheduleStore {
    fn load_center(&self, center_id: CenterId) -> BoxFuture<'_, StoreResult<Option<Center>>> {
        Box::pin(async move { Ok(self.centers.get_by_id(center_id).await?) })
    }

    fn list_offerings_for_center(
        &self,
        center_id: CenterId,
    ) -> BoxFuture<'_, StoreResult<Vec<Offering>>> {
        Box::pin(async move {
            Ok(self
                .offerings
                .select(|offering| offering.center_id == center_id)
                .await)
        })
    }

    fn list_rules_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>> {
        Box::pin(async move { Ok(self.rules_matching(center_id, None, window).await) })
    }

    fn list_exceptions_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleException>>> {
        Box::pin(async move {
            Ok(self
                .exceptions
                .select(|exception| {
                    exception.center_id == center_id && window.contains(exception.date)
                })
                .await)
        })
    }

    fn list_holidays_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>> {
        Box::pin(async move {
            Ok(self
                .holidays
                .select(|holiday| holiday.center_id == center_id && window.contains(holiday.date))
                .await)
        })
    }

    fn list_rules_for_offering(
        &self,
        center_id: CenterId,
        offering_id: OfferingId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>> {
        Box::pin(async move {
            Ok(self
                .rules_matching(center_id, Some(offering_id), window)
                .await)
        })
    }
}

impl HolidayWriter for MemoryScheduleStore {
    fn insert_holidays_skip_existing(
        &self,
        center_id: CenterId,
        holidays: Vec<NewHoliday>,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>> {
        Box::pin(async move {
            // Held for the whole import so concurrent imports cannot both
            // insert the same date.
            let mut audit = self.audit.write().await;

            let mut taken: BTreeSet<_> = self
                .holidays
                .select(|holiday| holiday.center_id == center_id)
                .await
                .into_iter()
                .map(|holiday| holiday.date)
                .collect();

            let requested = holidays.len();
            let mut created = Vec::new();
            for holiday in holidays {
                if !taken.insert(holiday.date) {
                    continue;
                }
                created.push(
                    self.holidays
                        .create(CenterHoliday {
                            id: 0,
                            center_id,
                            date: holiday.date,
                            name: holiday.name,
                        })
                        .await?,
                );
            }

            audit.push(holiday_import_entry(center_id, requested, created.len())?);

            tracing::debug!(center_id, created = created.len(), "Holidays inserted");
            Ok(created)
        })
    }
}

fn single_field(key: &str, value: Value) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert(key.to_string(), value);
    patch
}

impl ScheduleAdmin for MemoryScheduleStore {
    fn offering_repo(&self) -> &dyn Repository<Offering> {
        &self.offerings
    }

    fn rule_repo(&self) -> &dyn Repository<ScheduleRule> {
        &self.rules
    }

    fn exception_repo(&self) -> &dyn Repository<ScheduleException> {
        &self.exceptions
    }

    fn record_audit(&self, entry: AuditEntry) -> BoxFuture<'_, DbResult<()>> {
        Box::pin(async move {
            self.audit.write().await.push(entry);
            Ok(())
        })
    }

    fn transition_exception(
        &self,
        id: ExceptionId,
        from: ExceptionStatus,
        to: ExceptionStatus,
        audit: AuditEntry,
    ) -> BoxFuture<'_, DbResult<Option<ScheduleException>>> {
        Box::pin(async move {
            // The audit lock serializes admin writes, so the status read
            // below cannot go stale before the update.
            let mut log = self.audit.write().await;

            match self.exceptions.get_by_id(id).await? {
                Some(current) if current.status == from => {}
                _ => return Ok(None),
            }
            let updated = self
                .exceptions
                .update(id, single_field("status", Value::from(to.as_str())))
                .await?;
            log.push(audit);
            Ok(Some(updated))
        })
    }

    fn split_rule(
        &self,
        rule_id: RuleId,
        last_date: NaiveDate,
        successor: ScheduleRule,
        audit: AuditEntry,
    ) -> BoxFuture<'_, DbResult<(ScheduleRule, ScheduleRule)>> {
        Box::pin(async move {
            let mut log = self.audit.write().await;

            let current = self
                .rules
                .get_by_id(rule_id)
                .await?
                .ok_or(DbError::NotFound {
                    table: ScheduleRule::TABLE_NAME,
                    id: rule_id,
                })?;
            let range = DateRange {
                end_date: Some(last_date),
                ..current.effective_range
            };
            let range = serde_json::to_value(range).map_err(ValueError::from)?;

            let truncated = self
                .rules
                .update(rule_id, single_field("effective_range", range))
                .await?;
            let created = self.rules.create(successor).await?;
            log.push(audit);
            Ok((truncated, created))
        })
    }
}
