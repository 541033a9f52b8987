//! Rule and exception administration through the service.

use chrono::{DateTime, Utc, Weekday};
use serde_json::json;

use timeledger_calendar::error::CalendarError;
use timeledger_calendar::model::{ExceptionKind, ExceptionStatus, ScheduleRule};
use timeledger_calendar::value::{DateRange, Frequency, RecurrenceRule};
use timeledger_db::repository::{Page, Repository};
use timeledger_service::admin::{
    ConflictKind, EditMode, RecurrenceEdit, ReviewAction, ReviewDecision,
};
use timeledger_service::error::ServiceError;

use crate::helpers::*;

const ACTOR: &str = "admin@center1";

fn now() -> DateTime<Utc> {
    d(2026, 1, 1).and_time(t(12, 0)).and_utc()
}

/// Monday 10:00-11:00 in room 5 from 5 January to 30 March 2026.
fn spring_mondays(id: u64) -> ScheduleRule {
    rule(
        id,
        Weekday::Mon,
        t(10, 0),
        t(11, 0),
        DateRange::bounded(d(2026, 1, 5), d(2026, 3, 30)),
    )
}

fn decision(action: ReviewAction, override_buffer: bool) -> ReviewDecision {
    ReviewDecision {
        action,
        override_buffer,
        note: "checked with the front desk".to_string(),
    }
}

fn edit(edit_date: chrono::NaiveDate, mode: EditMode) -> RecurrenceEdit {
    RecurrenceEdit {
        edit_date,
        mode,
        start_time: None,
        end_time: None,
        room_id: None,
        teacher_id: None,
        reason: String::new(),
    }
}

async fn actions(fixture: &Fixture) -> Vec<String> {
    fixture
        .store
        .audit_log()
        .await
        .into_iter()
        .map(|entry| entry.action)
        .collect()
}

async fn request_move(fixture: &Fixture, room_id: u64, start: (u32, u32), end: (u32, u32)) -> u64 {
    let mut moved = exception(0, Some(1), ExceptionKind::Move, d(2026, 2, 2));
    moved.room_id = Some(room_id);
    moved.start_time = Some(t(start.0, start.1));
    moved.end_time = Some(t(end.0, end.1));
    fixture
        .admin
        .request_exception(CENTER, moved, now(), ACTOR)
        .await
        .expect("requested")
        .id
}

#[test_log::test(tokio::test)]
async fn requests_start_pending_and_leave_the_schedule_alone() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;

    // Sent as APPROVED, stored as PENDING.
    let cancel = exception(0, Some(1), ExceptionKind::Cancel, d(2026, 2, 2));
    let created = fixture
        .admin
        .request_exception(CENTER, cancel, now(), ACTOR)
        .await
        .expect("requested");
    assert_eq!(created.status, ExceptionStatus::Pending);

    let expansion = fixture
        .expand(window(d(2026, 2, 2), d(2026, 2, 2)))
        .await
        .expect("expanded");
    assert_eq!(expansion.schedules.len(), 1);
    assert!(!expansion.schedules[0].cancelled);

    assert_eq!(actions(&fixture).await, vec!["exception.create"]);
    let entry = &fixture.store.audit_log().await[0];
    assert_eq!(entry.actor, ACTOR);
    assert_eq!(entry.target_id, Some(created.id));
}

#[tokio::test]
async fn locked_rules_refuse_requests() {
    let mut locked = spring_mondays(1);
    locked.lock_at = Some(d(2025, 12, 31).and_time(t(0, 0)).and_utc());
    let fixture = fixture(vec![locked], Vec::new(), Vec::new()).await;

    let result = fixture
        .admin
        .request_exception(
            CENTER,
            exception(0, Some(1), ExceptionKind::Cancel, d(2026, 2, 2)),
            now(),
            ACTOR,
        )
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::CalendarError(CalendarError::RuleLocked { rule_id: 1, .. }))
    ));
    assert!(fixture.store.exceptions().is_empty().await);
}

#[test_log::test(tokio::test)]
async fn approval_applies_the_exception() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let id = request_move(&fixture, 6, (14, 0), (15, 0)).await;

    let approved = fixture
        .admin
        .review_exception(id, decision(ReviewAction::Approve, false), ACTOR)
        .await
        .expect("approved");
    assert_eq!(approved.status, ExceptionStatus::Approved);

    let expansion = fixture
        .expand(window(d(2026, 2, 2), d(2026, 2, 2)))
        .await
        .expect("expanded");
    let session = &expansion.schedules[0];
    assert_eq!((session.start_time, session.room_id), (t(14, 0), 6));
    assert_eq!(session.exception_id, Some(id));

    assert_eq!(
        actions(&fixture).await,
        vec!["exception.create", "exception.approve"]
    );
    let log = fixture.store.audit_log().await;
    let after = log[1].payload.after.as_ref().expect("after snapshot");
    assert_eq!(after["status"], json!("APPROVED"));
    assert_eq!(after["review_note"], json!("checked with the front desk"));
    assert_eq!(
        log[1].payload.before.as_ref().expect("before snapshot")["status"],
        json!("PENDING")
    );
}

#[tokio::test]
async fn overlaps_block_approval_even_with_override() {
    let neighbour = ScheduleRule {
        room_id: 6,
        ..rule(
            2,
            Weekday::Mon,
            t(12, 0),
            t(13, 0),
            DateRange::bounded(d(2026, 1, 5), d(2026, 3, 30)),
        )
    };
    let fixture = fixture(vec![spring_mondays(1), neighbour], Vec::new(), Vec::new()).await;
    let id = request_move(&fixture, 6, (12, 30), (13, 30)).await;

    for override_buffer in [false, true] {
        let result = fixture
            .admin
            .review_exception(id, decision(ReviewAction::Approve, override_buffer), ACTOR)
            .await;
        let Err(ServiceError::ScheduleConflict {
            exception_id,
            conflicts,
        }) = result
        else {
            panic!("expected a schedule conflict, got {result:?}");
        };
        assert_eq!(exception_id, id);
        assert!(conflicts.iter().any(|c| c.kind == ConflictKind::RoomOverlap && c.rule_id == 2));
    }

    let stored = fixture
        .store
        .exceptions()
        .get_by_id(id)
        .await
        .expect("readable")
        .expect("stored");
    assert_eq!(stored.status, ExceptionStatus::Pending);
    assert_eq!(actions(&fixture).await, vec!["exception.create"]);
}

#[tokio::test]
async fn buffer_gaps_need_an_override() {
    let neighbour = ScheduleRule {
        room_id: 6,
        teacher_id: Some(9),
        ..rule(
            2,
            Weekday::Mon,
            t(11, 0),
            t(12, 0),
            DateRange::bounded(d(2026, 1, 5), d(2026, 3, 30)),
        )
    };
    let fixture = fixture(vec![spring_mondays(1), neighbour], Vec::new(), Vec::new()).await;
    fixture
        .store
        .centers()
        .update(
            CENTER,
            serde_json::Map::from_iter([(
                "settings".to_string(),
                json!({"room_buffer_minutes": 30}),
            )]),
        )
        .await
        .expect("settings updated");

    // Same slot, moved next door to the 11:00 session.
    let id = request_move(&fixture, 6, (10, 0), (11, 0)).await;

    let blocked = fixture
        .admin
        .review_exception(id, decision(ReviewAction::Approve, false), ACTOR)
        .await;
    assert!(matches!(
        blocked,
        Err(ServiceError::ScheduleConflict { ref conflicts, .. })
            if conflicts.iter().all(|c| c.kind == ConflictKind::RoomBuffer)
    ));

    let approved = fixture
        .admin
        .review_exception(id, decision(ReviewAction::Approve, true), ACTOR)
        .await
        .expect("override accepted");
    assert_eq!(approved.status, ExceptionStatus::Approved);
}

#[tokio::test]
async fn only_pending_exceptions_can_be_reviewed_or_revoked() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let id = request_move(&fixture, 6, (14, 0), (15, 0)).await;

    let rejected = fixture
        .admin
        .review_exception(id, decision(ReviewAction::Reject, false), ACTOR)
        .await
        .expect("rejected");
    assert_eq!(rejected.status, ExceptionStatus::Rejected);

    let again = fixture
        .admin
        .review_exception(id, decision(ReviewAction::Approve, false), ACTOR)
        .await;
    assert!(matches!(again, Err(ServiceError::Conflict(_))));
    let revoke = fixture.admin.revoke_exception(id, ACTOR).await;
    assert!(matches!(revoke, Err(ServiceError::Conflict(_))));

    let missing = fixture.admin.revoke_exception(99, ACTOR).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn revoking_withdraws_a_request() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let id = request_move(&fixture, 6, (14, 0), (15, 0)).await;

    let revoked = fixture
        .admin
        .revoke_exception(id, ACTOR)
        .await
        .expect("revoked");
    assert_eq!(revoked.status, ExceptionStatus::Revoked);
    assert_eq!(
        actions(&fixture).await,
        vec!["exception.create", "exception.revoke"]
    );

    // The date is free for a new request again.
    request_move(&fixture, 7, (14, 0), (15, 0)).await;
}

#[tokio::test]
async fn pending_requests_can_be_listed() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let first = request_move(&fixture, 6, (14, 0), (15, 0)).await;
    fixture
        .admin
        .revoke_exception(first, ACTOR)
        .await
        .expect("revoked");
    let second = request_move(&fixture, 7, (14, 0), (15, 0)).await;

    let pending = fixture
        .admin
        .list_exceptions(CENTER, Some(ExceptionStatus::Pending), Page::default())
        .await
        .expect("listed");
    assert_eq!(
        pending.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![second]
    );

    let all = fixture
        .admin
        .list_exceptions(CENTER, None, Page::default())
        .await
        .expect("listed");
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn preview_counts_the_reached_dates() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;

    let future = fixture
        .admin
        .preview_affected_sessions(1, d(2026, 3, 10), EditMode::Future)
        .await
        .expect("previewed");
    assert_eq!(
        future.affected_dates,
        vec![d(2026, 3, 16), d(2026, 3, 23), d(2026, 3, 30)]
    );
    assert_eq!(future.affected_count, 3);
    assert!(future.will_create_rule);

    let all = fixture
        .admin
        .preview_affected_sessions(1, d(2026, 3, 10), EditMode::All)
        .await
        .expect("previewed");
    assert_eq!(all.affected_count, 13);
    assert!(!all.will_create_rule);

    let missing = fixture
        .admin
        .preview_affected_sessions(9, d(2026, 3, 10), EditMode::All)
        .await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));
}

#[test_log::test(tokio::test)]
async fn future_edit_splits_the_rule() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let mut request = edit(d(2026, 2, 16), EditMode::Future);
    request.start_time = Some(t(14, 0));
    request.end_time = Some(t(15, 0));

    let result = fixture
        .admin
        .edit_recurring(1, request, now(), ACTOR)
        .await
        .expect("edited");
    assert_eq!(result.affected_count, 7);

    let truncated = result.updated_rule.expect("truncated rule");
    assert_eq!(truncated.effective_range.end_date, Some(d(2026, 2, 15)));
    let successor = result.new_rule.expect("successor");
    assert_eq!(
        successor.effective_range,
        DateRange::bounded(d(2026, 2, 16), d(2026, 3, 30))
    );
    assert_eq!((successor.start_time, successor.room_id), (t(14, 0), 5));

    let starts: Vec<_> = fixture
        .expand(window(d(2026, 2, 1), d(2026, 2, 28)))
        .await
        .expect("expanded")
        .schedules
        .iter()
        .map(|session| (session.date, session.start_time))
        .collect();
    assert_eq!(
        starts,
        vec![
            (d(2026, 2, 2), t(10, 0)),
            (d(2026, 2, 9), t(10, 0)),
            (d(2026, 2, 16), t(14, 0)),
            (d(2026, 2, 23), t(14, 0)),
        ]
    );
    assert_eq!(actions(&fixture).await, vec!["rule.split"]);
}

#[tokio::test]
async fn future_edit_from_the_start_updates_in_place() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let mut request = edit(d(2026, 1, 5), EditMode::Future);
    request.room_id = Some(9);

    let result = fixture
        .admin
        .edit_recurring(1, request, now(), ACTOR)
        .await
        .expect("edited");
    assert!(result.new_rule.is_none());
    assert_eq!(result.updated_rule.expect("updated").room_id, 9);
    assert_eq!(fixture.store.rules().len().await, 1);
    assert_eq!(actions(&fixture).await, vec!["rule.update"]);
}

#[tokio::test]
async fn future_edit_after_the_rule_ends_is_rejected() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let mut request = edit(d(2026, 4, 6), EditMode::Future);
    request.room_id = Some(9);

    let result = fixture.admin.edit_recurring(1, request, now(), ACTOR).await;
    assert!(matches!(
        result,
        Err(ServiceError::CalendarError(CalendarError::Validation(_)))
    ));
}

#[tokio::test]
async fn empty_edits_are_rejected() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let result = fixture
        .admin
        .edit_recurring(1, edit(d(2026, 2, 2), EditMode::All), now(), ACTOR)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::CalendarError(CalendarError::Validation(_)))
    ));
}

#[tokio::test]
async fn single_edits_file_the_matching_requests() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;

    let mut teacher_only = edit(d(2026, 2, 2), EditMode::Single);
    teacher_only.teacher_id = Some(9);
    let result = fixture
        .admin
        .edit_recurring(1, teacher_only, now(), ACTOR)
        .await
        .expect("edited");
    let kinds: Vec<_> = result.exceptions.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ExceptionKind::Substitute]);

    let mut both = edit(d(2026, 2, 9), EditMode::Single);
    both.teacher_id = Some(9);
    both.start_time = Some(t(16, 0));
    both.end_time = Some(t(17, 0));
    let result = fixture
        .admin
        .edit_recurring(1, both, now(), ACTOR)
        .await
        .expect("edited");
    let kinds: Vec<_> = result.exceptions.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ExceptionKind::Cancel, ExceptionKind::Adhoc]);
    let adhoc = &result.exceptions[1];
    assert_eq!(
        (adhoc.rule_id, adhoc.start_time, adhoc.room_id, adhoc.teacher_id),
        (None, Some(t(16, 0)), Some(5), Some(9))
    );
    assert!(
        result
            .exceptions
            .iter()
            .all(|e| e.status == ExceptionStatus::Pending)
    );
    assert_eq!(result.affected_count, 1);
}

#[tokio::test]
async fn single_edits_respect_lead_time() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;
    let mut request = edit(d(2026, 1, 12), EditMode::Single);
    request.room_id = Some(9);

    let result = fixture.admin.edit_recurring(1, request, now(), ACTOR).await;
    assert!(matches!(
        result,
        Err(ServiceError::CalendarError(
            CalendarError::LeadTimeViolated { .. }
        ))
    ));
}

#[tokio::test]
async fn deletes_cancel_truncate_or_remove() {
    let tuesdays = ScheduleRule {
        weekday: Weekday::Tue,
        ..spring_mondays(2)
    };
    let fixture = fixture(vec![spring_mondays(1), tuesdays], Vec::new(), Vec::new()).await;

    let single = fixture
        .admin
        .delete_recurring(1, d(2026, 2, 2), EditMode::Single, "closed".to_string(), now(), ACTOR)
        .await
        .expect("cancel requested");
    assert_eq!(single.exceptions[0].kind, ExceptionKind::Cancel);
    assert_eq!(single.exceptions[0].reason, "closed");

    let future = fixture
        .admin
        .delete_recurring(1, d(2026, 3, 2), EditMode::Future, String::new(), now(), ACTOR)
        .await
        .expect("truncated");
    assert_eq!(
        future.updated_rule.expect("truncated").effective_range.end_date,
        Some(d(2026, 3, 1))
    );
    assert_eq!(future.affected_count, 5);

    let all = fixture
        .admin
        .delete_recurring(2, d(2026, 3, 2), EditMode::All, String::new(), now(), ACTOR)
        .await
        .expect("deleted");
    assert_eq!(all.affected_count, 12);
    assert!(fixture.store.rules().get_by_id(2).await.expect("readable").is_none());

    assert_eq!(
        actions(&fixture).await,
        vec!["exception.create", "rule.update", "rule.delete"]
    );
}

#[tokio::test]
async fn rules_are_validated_against_their_siblings() {
    let fixture = fixture(vec![spring_mondays(1)], Vec::new(), Vec::new()).await;

    let overlapping = rule(
        0,
        Weekday::Mon,
        t(10, 30),
        t(11, 30),
        DateRange::open_ended(d(2026, 2, 1)),
    );
    let result = fixture.admin.create_rule(CENTER, overlapping, ACTOR).await;
    assert!(matches!(
        result,
        Err(ServiceError::CalendarError(CalendarError::Validation(_)))
    ));

    let tuesday = rule(
        0,
        Weekday::Tue,
        t(10, 30),
        t(11, 30),
        DateRange::open_ended(d(2026, 2, 1)),
    );
    let created = fixture
        .admin
        .create_rule(CENTER, tuesday, ACTOR)
        .await
        .expect("created");
    assert_eq!(created.id, 2);

    let updated = fixture
        .admin
        .update_rule(
            created.id,
            serde_json::Map::from_iter([("room_id".to_string(), json!(8))]),
            ACTOR,
        )
        .await
        .expect("updated");
    assert_eq!(updated.room_id, 8);
    assert_eq!(actions(&fixture).await, vec!["rule.create", "rule.update"]);

    let foreign = ScheduleRule {
        center_id: 2,
        ..spring_mondays(0)
    };
    assert!(fixture.admin.create_rule(CENTER, foreign, ACTOR).await.is_err());
}

#[tokio::test]
async fn repeating_exceptions_list_their_dates() {
    let mut repeating = exception(5, Some(1), ExceptionKind::Cancel, d(2026, 2, 2));
    repeating.recurrence = Some(RecurrenceRule {
        count: Some(3),
        ..RecurrenceRule::new(Frequency::Weekly, 2)
    });
    let once = exception(6, Some(1), ExceptionKind::Cancel, d(2026, 2, 9));
    let fixture = fixture(vec![spring_mondays(1)], vec![repeating, once], Vec::new()).await;

    let dates = fixture
        .admin
        .recurrence_dates(5, 10)
        .await
        .expect("expanded");
    assert_eq!(dates, vec![d(2026, 2, 2), d(2026, 2, 16), d(2026, 3, 2)]);

    let result = fixture.admin.recurrence_dates(6, 10).await;
    assert!(matches!(
        result,
        Err(ServiceError::CalendarError(CalendarError::Validation(_)))
    ));
}
