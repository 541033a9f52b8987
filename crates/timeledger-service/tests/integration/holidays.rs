//! Holiday bulk import through the service.

use timeledger_calendar::model::NewHoliday;
use timeledger_service::error::ServiceError;

use crate::helpers::*;

fn request() -> Vec<NewHoliday> {
    vec![
        NewHoliday {
            date: d(2026, 1, 1),
            name: "New Year".to_string(),
        },
        NewHoliday {
            date: d(2026, 1, 19),
            name: "MLK Day".to_string(),
        },
        NewHoliday {
            date: d(2026, 2, 16),
            name: "Presidents Day".to_string(),
        },
    ]
}

#[test_log::test(tokio::test)]
async fn second_import_creates_nothing() {
    let fixture = fixture(Vec::new(), Vec::new(), Vec::new()).await;

    let first = fixture
        .service
        .import_holidays(CENTER, request())
        .await
        .expect("imported");
    assert_eq!((first.requested, first.created, first.skipped), (3, 3, 0));

    let second = fixture
        .service
        .import_holidays(CENTER, request())
        .await
        .expect("imported");
    assert_eq!((second.requested, second.created, second.skipped), (3, 0, 3));
    assert!(second.holidays.is_empty());

    assert_eq!(fixture.store.holidays().len().await, 3);
    assert_eq!(fixture.store.audit_log().await.len(), 2);
}

#[tokio::test]
async fn repeated_dates_in_one_request_are_skipped() {
    let fixture = fixture(Vec::new(), Vec::new(), Vec::new()).await;
    let mut holidays = request();
    holidays.push(NewHoliday {
        date: d(2026, 1, 1),
        name: "New Year again".to_string(),
    });

    let import = fixture
        .service
        .import_holidays(CENTER, holidays)
        .await
        .expect("imported");

    assert_eq!((import.requested, import.created, import.skipped), (4, 3, 1));
    assert_eq!(import.holidays[0].name, "New Year");
}

#[tokio::test]
async fn existing_dates_are_skipped() {
    let fixture = fixture(
        Vec::new(),
        Vec::new(),
        vec![holiday(d(2026, 1, 19), "seeded")],
    )
    .await;

    let import = fixture
        .service
        .import_holidays(CENTER, request())
        .await
        .expect("imported");

    assert_eq!((import.created, import.skipped), (2, 1));
    assert!(import.holidays.iter().all(|h| h.date != d(2026, 1, 19)));
}

#[tokio::test]
async fn imported_holidays_tag_occurrences() {
    let fixture = fixture(vec![january_mondays(1)], Vec::new(), Vec::new()).await;
    fixture
        .service
        .import_holidays(CENTER, request())
        .await
        .expect("imported");

    let expansion = fixture.expand(january()).await.expect("expanded");

    let tagged: Vec<_> = expansion
        .schedules
        .iter()
        .filter(|s| s.is_holiday)
        .map(|s| s.date)
        .collect();
    assert_eq!(tagged, vec![d(2026, 1, 19)]);
}

#[tokio::test]
async fn unknown_center_is_rejected() {
    let fixture = fixture(Vec::new(), Vec::new(), Vec::new()).await;

    let result = fixture.service.import_holidays(42, request()).await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert!(fixture.store.holidays().is_empty().await);
}
