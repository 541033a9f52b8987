//! PostgreSQL implementation of the schedule contracts.

use std::sync::Arc;

use chrono::NaiveDate;
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use futures::future::BoxFuture;

use timeledger_calendar::expand::ExpansionWindow;
use timeledger_calendar::model::{
    Center, CenterHoliday, ExceptionStatus, NewHoliday, Offering, ScheduleException,
    ScheduleRule,
};
use timeledger_calendar::store::{HolidayWriter, ScheduleSource, StoreResult};
use timeledger_calendar::value::DateRange;
use timeledger_core::types::{CenterId, ExceptionId, OfferingId, RuleId};

use crate::admin::{AuditEntry, ScheduleAdmin, holiday_import_entry};
use crate::db::DbProvider;
use crate::db::map::schedule::{
    audit_to_row, center_from_row, db_id, exception_from_row, holiday_from_row, map_rows,
    offering_from_row, rule_from_row, rule_to_row,
};
use crate::db::query::{audit, center, exception, holiday, offering, rule};
use crate::error::{DbError, DbResult};
use crate::model::holiday::NewCenterHolidayRow;
use crate::repository::{PgRepository, Repository};

/// Serves reads from the read endpoint and writes from the primary.
#[derive(Clone)]
pub struct PgScheduleStore {
    provider: Arc<dyn DbProvider>,
    offerings: PgRepository<Offering>,
    rules: PgRepository<ScheduleRule>,
    exceptions: PgRepository<ScheduleException>,
}

impl PgScheduleStore {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider>) -> Self {
        Self {
            offerings: PgRepository::new(Arc::clone(&provider)),
            rules: PgRepository::new(Arc::clone(&provider)),
            exceptions: PgRepository::new(Arc::clone(&provider)),
            provider,
        }
    }

    async fn rules_in_window(
        &self,
        center_id: CenterId,
        offering_id: Option<OfferingId>,
        window: ExpansionWindow,
    ) -> DbResult<Vec<ScheduleRule>> {
        let center_id = db_id("centers", center_id)?;
        let mut conn = self.provider.get_read_connection().await?;
        let rows = match offering_id {
            Some(offering_id) => {
                let offering_id = db_id("offerings", offering_id)?;
                rule::list_for_offering(&mut conn, center_id, offering_id).await?
            }
            None => rule::list_for_center(&mut conn, center_id).await?,
        };

        let mut rules = map_rows(rows, rule_from_row)?;
        rules.retain(|rule| rule.effective_range.intersects(window.from, window.to));
        Ok(rules)
    }

    #[tracing::instrument(skip(self, holidays), fields(count = holidays.len()))]
    async fn insert_holidays(
        &self,
        center_id: CenterId,
        holidays: Vec<NewHoliday>,
    ) -> DbResult<Vec<CenterHoliday>> {
        let db_center_id = db_id("centers", center_id)?;
        let requested = holidays.len();
        let mut conn = self.provider.get_connection().await?;

        let created = conn
            .transaction::<_, DbError, _>(move |tx| {
                async move {
                    let rows: Vec<NewCenterHolidayRow<'_>> = holidays
                        .iter()
                        .map(|holiday| NewCenterHolidayRow {
                            center_id: db_center_id,
                            holiday_date: holiday.date,
                            name: &holiday.name,
                        })
                        .collect();

                    let inserted = holiday::insert_skip_existing(tx, &rows).await?;
                    let created = map_rows(inserted, holiday_from_row)?;

                    let entry = holiday_import_entry(center_id, requested, created.len())?;
                    audit::insert(tx, &audit_to_row(&entry)?).await?;

                    Ok(created)
                }
                .scope_boxed()
            })
            .await?;

        tracing::debug!(created = created.len(), "Holidays inserted");
        Ok(created)
    }
}

impl ScheduleSource for PgScheduleStore {
    fn load_center(&self, center_id: CenterId) -> BoxFuture<'_, StoreResult<Option<Center>>> {
        Box::pin(async move {
            let id = db_id("centers", center_id)?;
            let mut conn = self.provider.get_read_connection().await?;
            let row = center::find(&mut conn, id).await.map_err(DbError::from)?;
            Ok(row.map(center_from_row).transpose()?)
        })
    }

    fn list_offerings_for_center(
        &self,
        center_id: CenterId,
    ) -> BoxFuture<'_, StoreResult<Vec<Offering>>> {
        Box::pin(async move {
            let id = db_id("centers", center_id)?;
            let mut conn = self.provider.get_read_connection().await?;
            let rows = offering::list_for_center(&mut conn, id)
                .await
                .map_err(DbError::from)?;
            Ok(map_rows(rows, offering_from_row)?)
        })
    }

    fn list_rules_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>> {
        Box::pin(async move { Ok(self.rules_in_window(center_id, None, window).await?) })
    }

    fn list_exceptions_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleException>>> {
        Box::pin(async move {
            let id = db_id("centers", center_id)?;
            let mut conn = self.provider.get_read_connection().await?;
            let rows = exception::list_in_window(&mut conn, id, window.from, window.to)
                .await
                .map_err(DbError::from)?;
            Ok(map_rows(rows, exception_from_row)?)
        })
    }

    fn list_holidays_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>> {
        Box::pin(async move {
            let id = db_id("centers", center_id)?;
            let mut conn = self.provider.get_read_connection().await?;
            let rows = holiday::list_in_window(&mut conn, id, window.from, window.to)
                .await
                .map_err(DbError::from)?;
            Ok(map_rows(rows, holiday_from_row)?)
        })
    }

    fn list_rules_for_offering(
        &self,
        center_id: CenterId,
        offering_id: OfferingId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>> {
        Box::pin(async move { Ok(self.rules_in_window(center_id, Some(offering_id), window).await?) })
    }
}

impl HolidayWriter for PgScheduleStore {
    fn insert_holidays_skip_existing(
        &self,
        center_id: CenterId,
        holidays: Vec<NewHoliday>,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>> {
        Box::pin(async move { Ok(self.insert_holidays(center_id, holidays).await?) })
    }
}

impl ScheduleAdmin for PgScheduleStore {
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
            let mut conn = self.provider.get_connection().await?;
            audit::insert(&mut conn, &audit_to_row(&entry)?).await?;
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
            let db_key = db_id("schedule_exceptions", id)?;
            let mut conn = self.provider.get_connection().await?;

            conn.transaction::<_, DbError, _>(move |tx| {
                async move {
                    let Some(row) =
                        exception::transition_status(tx, db_key, from.into(), to.into()).await?
                    else {
                        return Ok(None);
                    };
                    audit::insert(tx, &audit_to_row(&audit)?).await?;
                    exception_from_row(row).map(Some)
                }
                .scope_boxed()
            })
            .await
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
            const TABLE: &str = "schedule_rules";
            let db_key = db_id(TABLE, rule_id)?;
            let successor_row = rule_to_row(&successor)?;
            let mut conn = self.provider.get_connection().await?;

            conn.transaction::<_, DbError, _>(move |tx| {
                async move {
                    let not_found = || DbError::NotFound {
                        table: TABLE,
                        id: rule_id,
                    };
                    let current = rule::find(tx, db_key).await?.ok_or_else(not_found)?;
                    let mut current = rule_from_row(current)?;
                    current.effective_range = DateRange {
                        end_date: Some(last_date),
                        ..current.effective_range
                    };

                    let truncated = rule::update(tx, db_key, &rule_to_row(&current)?)
                        .await?
                        .ok_or_else(not_found)?;
                    let created = rule::insert(tx, &successor_row).await?;
                    audit::insert(tx, &audit_to_row(&audit)?).await?;

                    Ok((rule_from_row(truncated)?, rule_from_row(created)?))
                }
                .scope_boxed()
            })
            .await
            .inspect(|(_, created)| {
                tracing::debug!(rule_id, successor_id = created.id, %last_date, "Rule split");
            })
        })
    }
}
