use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Actor, AuditAction, AuditEntity, AuditFilter, BookingFilter, BookingPatch, BookingStatus,
    CommissionSource, Currency, Difficulty, Engine, EngineError, Expedition, ExpeditionNew,
    ExpeditionPatch, ExpeditionStatus, MoneyCents, PaymentCapture, PaymentMethod, PaymentRefund,
    PaymentStatus, ReserveCmd, RetryPolicy, Role, SignupCmd, TrailNew, UserPatch,
};
use migration::MigratorTrait;
use uuid::Uuid;

struct Fixture {
    engine: Engine,
    admin: Actor,
    guide: Actor,
    trekker: Actor,
    other_trekker: Actor,
    trail_id: Uuid,
}

async fn new_user(engine: &Engine, name: &str, email: &str, role: Role) -> Actor {
    engine
        .create_user(SignupCmd {
            name: name.to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            role,
            cadastur: None,
        })
        .await
        .unwrap()
        .actor()
}

async fn fixture(db: DatabaseConnection) -> Fixture {
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .password_cost(4)
        .build()
        .await
        .unwrap();

    let admin = new_user(&engine, "Admin", "admin@trekko.com", Role::Admin).await;
    let guide = new_user(&engine, "Bruno Guia", "guide@trekko.com", Role::Guide).await;
    let trekker = new_user(&engine, "Ana Trilha", "ana@trekko.com", Role::Trekker).await;
    let other_trekker = new_user(&engine, "Caio Serra", "caio@trekko.com", Role::Trekker).await;

    let trail_id = engine
        .new_trail(
            TrailNew {
                name: "Pico da Bandeira".to_string(),
                state: "MG".to_string(),
                city: "Alto Caparaó".to_string(),
                region_or_park: "Parque Nacional do Caparaó".to_string(),
                distance_meters: 9_000,
                elevation_gain_m: 1_100,
                difficulty: Difficulty::Hard,
                requires_guide: false,
                entry_fee_cents: Some(3_600),
                description: None,
            },
            &admin,
        )
        .await
        .unwrap()
        .id;

    Fixture {
        engine,
        admin,
        guide,
        trekker,
        other_trekker,
        trail_id,
    }
}

async fn memory_fixture() -> Fixture {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    fixture(db).await
}

fn file_db_url() -> (String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();
    let path = root.join(format!("bookings_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());
    (url, path)
}

async fn expedition_with(f: &Fixture, max_people: i32, status: ExpeditionStatus) -> Expedition {
    let start = Utc::now() + Duration::days(30);
    f.engine
        .new_expedition(
            ExpeditionNew {
                trail_id: f.trail_id,
                guide_id: None,
                title: "Nascer do sol no Pico".to_string(),
                start_date: start,
                end_date: start + Duration::hours(10),
                price_per_person_cents: 15_000,
                max_people,
                currency: Currency::Brl,
                status,
                description: None,
            },
            &f.guide,
        )
        .await
        .unwrap()
}

async fn published(f: &Fixture, max_people: i32) -> Expedition {
    expedition_with(f, max_people, ExpeditionStatus::Published).await
}

async fn occupied(f: &Fixture, expedition_id: Uuid) -> i64 {
    f.engine.availability(expedition_id).await.unwrap().occupied
}

#[tokio::test]
async fn eight_plus_two_fills_the_expedition() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;

    f.engine
        .reserve(ReserveCmd::new(exp.id, 8), &f.trekker)
        .await
        .unwrap();
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.other_trekker)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.trekker_id, f.other_trekker.id);
    let availability = f.engine.availability(exp.id).await.unwrap();
    assert_eq!(availability.occupied, 10);
    assert_eq!(availability.available, 0);
}

#[tokio::test]
async fn eight_plus_three_is_rejected_and_persists_nothing() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;

    f.engine
        .reserve(ReserveCmd::new(exp.id, 8), &f.trekker)
        .await
        .unwrap();
    let err = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 3), &f.other_trekker)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::CapacityExceeded(_)));
    assert_eq!(err.code(), "CAPACITY_EXCEEDED");
    assert_eq!(occupied(&f, exp.id).await, 8);
    let page = f
        .engine
        .list_bookings(BookingFilter::default(), &f.other_trekker)
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn headcount_out_of_range_is_a_validation_error() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;

    for headcount in [0, -1, 101] {
        let err = f
            .engine
            .reserve(ReserveCmd::new(exp.id, headcount), &f.trekker)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
    assert_eq!(occupied(&f, exp.id).await, 0);
}

#[tokio::test]
async fn unknown_expedition_is_not_found() {
    let f = memory_fixture().await;
    let err = f
        .engine
        .reserve(ReserveCmd::new(Uuid::new_v4(), 1), &f.trekker)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("expedition not exists".to_string())
    );
}

#[tokio::test]
async fn draft_expedition_is_not_bookable() {
    let f = memory_fixture().await;
    let exp = expedition_with(&f, 10, ExpeditionStatus::Draft).await;

    let err = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 1), &f.trekker)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotBookable(_)));
}

#[tokio::test]
async fn booking_total_and_code() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;

    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 3).notes("  vegetarian  "), &f.trekker)
        .await
        .unwrap();
    assert_eq!(booking.total.cents(), 45_000);
    assert_eq!(booking.currency, Currency::Brl);
    assert_eq!(booking.notes.as_deref(), Some("vegetarian"));
    assert!(booking.code.starts_with("RSV-"));
    assert_eq!(booking.code.len(), 14);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_concurrent_six_seat_requests_on_ten() {
    let (url, path) = file_db_url();
    let db = Database::connect(&url).await.unwrap();
    let f = fixture(db.clone()).await;
    let exp = published(&f, 10).await;

    let (a, b) = tokio::join!(
        f.engine.reserve(ReserveCmd::new(exp.id, 6), &f.trekker),
        f.engine.reserve(ReserveCmd::new(exp.id, 6), &f.other_trekker),
    );

    let accepted = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    let rejected = if a.is_ok() { b } else { a };
    assert!(matches!(rejected, Err(EngineError::CapacityExceeded(_))));
    assert_eq!(occupied(&f, exp.id).await, 6);

    drop(f);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn engines_sharing_a_database_never_overbook() {
    let (url, path) = file_db_url();
    let db = Database::connect(&url).await.unwrap();
    let f = fixture(db.clone()).await;
    let exp = published(&f, 10).await;

    // A second process-like engine: same file, its own lock registry.
    let db2 = Database::connect(&url).await.unwrap();
    let other = Engine::builder()
        .database(db2.clone())
        .retry_policy(RetryPolicy::new().with_max_attempts(10))
        .password_cost(4)
        .build()
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        f.engine.reserve(ReserveCmd::new(exp.id, 6), &f.trekker),
        other.reserve(ReserveCmd::new(exp.id, 6), &f.other_trekker),
    );

    let accepted = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    for result in [a, b] {
        if let Err(err) = result {
            assert!(matches!(
                err,
                EngineError::CapacityExceeded(_) | EngineError::Conflict(_)
            ));
        }
    }
    assert_eq!(occupied(&f, exp.id).await, 6);

    drop(other);
    drop(db2);
    drop(f);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_reservations_stay_within_capacity() {
    let (url, path) = file_db_url();
    let db = Database::connect(&url).await.unwrap();
    let f = fixture(db.clone()).await;
    let exp = published(&f, 10).await;

    let expedition_id = exp.id;
    let engine = Arc::new(f.engine);
    let mut tasks = Vec::new();
    for i in 0..20 {
        let engine = Arc::clone(&engine);
        let actor = if i % 2 == 0 { f.trekker } else { f.other_trekker };
        let headcount = i % 3 + 1;
        tasks.push(tokio::spawn(async move {
            engine
                .reserve(ReserveCmd::new(expedition_id, headcount), &actor)
                .await
                .map(|b| i64::from(b.headcount))
        }));
    }

    let mut accepted_seats = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(seats) => accepted_seats += seats,
            Err(err) => assert!(matches!(err, EngineError::CapacityExceeded(_))),
        }
    }

    let availability = engine.availability(expedition_id).await.unwrap();
    assert!(availability.occupied <= 10);
    assert_eq!(availability.occupied, accepted_seats);

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn cancelling_frees_seats_and_records_the_refund() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;

    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 10), &f.trekker)
        .await
        .unwrap();
    assert!(
        f.engine
            .reserve(ReserveCmd::new(exp.id, 1), &f.other_trekker)
            .await
            .is_err()
    );

    let cancelled = f
        .engine
        .cancel_booking(booking.id, Some("sick"), &f.trekker, Utc::now())
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.refund, Some(booking.total));
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("sick"));
    assert!(cancelled.cancelled_at.is_some());

    assert_eq!(occupied(&f, exp.id).await, 0);
    f.engine
        .reserve(ReserveCmd::new(exp.id, 1), &f.other_trekker)
        .await
        .unwrap();

    let err = f
        .engine
        .cancel_booking(booking.id, None, &f.trekker, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn late_cancellation_refunds_half() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.trekker)
        .await
        .unwrap();

    // 30 hours before the start falls in the 24h window.
    let now = exp.start_date - Duration::hours(30);
    let quote = f
        .engine
        .refund_quote(booking.id, &f.trekker, now)
        .await
        .unwrap();
    assert_eq!(quote.refund_bps, 5_000);
    assert_eq!(quote.refund.cents(), 15_000);
    assert_eq!(quote.retained.cents(), 15_000);
}

#[tokio::test]
async fn reactivating_a_booking_rechecks_capacity() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;

    let first = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 6), &f.trekker)
        .await
        .unwrap();
    f.engine
        .cancel_booking(first.id, None, &f.trekker, Utc::now())
        .await
        .unwrap();
    f.engine
        .reserve(ReserveCmd::new(exp.id, 6), &f.other_trekker)
        .await
        .unwrap();

    let patch = BookingPatch {
        status: Some(BookingStatus::Confirmed),
        ..Default::default()
    };
    let err = f
        .engine
        .update_booking(first.id, patch, &f.guide)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CapacityExceeded(_)));
    assert_eq!(occupied(&f, exp.id).await, 6);
}

#[tokio::test]
async fn guide_confirms_and_trekker_can_only_cancel() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.trekker)
        .await
        .unwrap();

    let confirm = BookingPatch {
        status: Some(BookingStatus::Confirmed),
        ..Default::default()
    };
    let err = f
        .engine
        .update_booking(booking.id, confirm.clone(), &f.trekker)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let confirmed = f
        .engine
        .update_booking(booking.id, confirm, &f.guide)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());
    assert_eq!(occupied(&f, exp.id).await, 2);
}

#[tokio::test]
async fn bookings_are_scoped_to_their_owners() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let mine = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 1), &f.trekker)
        .await
        .unwrap();
    f.engine
        .reserve(ReserveCmd::new(exp.id, 1), &f.other_trekker)
        .await
        .unwrap();

    let err = f
        .engine
        .booking(mine.id, &f.other_trekker)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert_eq!(f.engine.booking(mine.id, &f.guide).await.unwrap(), mine);

    let own = f
        .engine
        .list_bookings(BookingFilter::default(), &f.trekker)
        .await
        .unwrap();
    assert_eq!(own.total, 1);
    assert_eq!(own.items[0].id, mine.id);

    let guide_view = f
        .engine
        .list_bookings(BookingFilter::default(), &f.guide)
        .await
        .unwrap();
    assert_eq!(guide_view.total, 2);

    let admin_filtered = f
        .engine
        .list_bookings(
            BookingFilter {
                trekker_id: Some(f.trekker.id),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    assert_eq!(admin_filtered.total, 1);
}

#[tokio::test]
async fn commission_uses_the_most_specific_rate() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.trekker)
        .await
        .unwrap();

    let global = f
        .engine
        .booking_commission(booking.id, &f.guide)
        .await
        .unwrap();
    assert_eq!(global.source, CommissionSource::Global);
    assert_eq!(global.commission.cents(), 4_500);
    assert_eq!(global.net.cents(), 25_500);

    f.engine
        .update_user(
            f.guide.id,
            UserPatch {
                commission_rate_bps: Some(Some(1_000)),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    let guide_rate = f
        .engine
        .booking_commission(booking.id, &f.admin)
        .await
        .unwrap();
    assert_eq!(guide_rate.source, CommissionSource::GuideOverride);
    assert_eq!(guide_rate.commission.cents(), 3_000);

    f.engine
        .update_booking(
            booking.id,
            BookingPatch {
                commission_rate_bps: Some(Some(500)),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    let booking_rate = f
        .engine
        .booking_commission(booking.id, &f.admin)
        .await
        .unwrap();
    assert_eq!(booking_rate.source, CommissionSource::BookingOverride);
    assert_eq!(booking_rate.commission.cents(), 1_500);

    let err = f
        .engine
        .booking_commission(booking.id, &f.trekker)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn capacity_cannot_shrink_below_occupancy() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    f.engine
        .reserve(ReserveCmd::new(exp.id, 7), &f.trekker)
        .await
        .unwrap();

    let shrink = |max_people| ExpeditionPatch {
        max_people: Some(max_people),
        ..Default::default()
    };
    let err = f
        .engine
        .update_expedition(exp.id, shrink(6), &f.guide)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let updated = f
        .engine
        .update_expedition(exp.id, shrink(7), &f.guide)
        .await
        .unwrap();
    assert_eq!(updated.max_people, 7);
    assert_eq!(f.engine.availability(exp.id).await.unwrap().available, 0);
}

#[tokio::test]
async fn closed_expedition_has_no_availability() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    f.engine
        .update_expedition(
            exp.id,
            ExpeditionPatch {
                status: Some(ExpeditionStatus::Cancelled),
                ..Default::default()
            },
            &f.guide,
        )
        .await
        .unwrap();

    let availability = f.engine.availability(exp.id).await.unwrap();
    assert_eq!(availability.capacity, 10);
    assert_eq!(availability.available, 0);
    let err = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 1), &f.trekker)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotBookable(_)));
}

#[tokio::test]
async fn deleting_a_booking_releases_its_seats() {
    let f = memory_fixture().await;
    let exp = published(&f, 4).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 4), &f.trekker)
        .await
        .unwrap();

    assert!(matches!(
        f.engine.delete_booking(booking.id, &f.other_trekker).await,
        Err(EngineError::Forbidden(_))
    ));
    f.engine.delete_booking(booking.id, &f.admin).await.unwrap();
    assert_eq!(occupied(&f, exp.id).await, 0);
    assert!(matches!(
        f.engine.booking(booking.id, &f.admin).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expedition_update_racing_another_engine_never_fails_with_a_database_error() {
    let (url, path) = file_db_url();
    let db = Database::connect(&url).await.unwrap();
    let f = fixture(db.clone()).await;
    let exp = published(&f, 10).await;

    let db2 = Database::connect(&url).await.unwrap();
    let other = Engine::builder()
        .database(db2.clone())
        .retry_policy(RetryPolicy::new().with_max_attempts(10))
        .password_cost(4)
        .build()
        .await
        .unwrap();

    let grow = ExpeditionPatch {
        max_people: Some(12),
        ..Default::default()
    };
    let (updated, reserved) = tokio::join!(
        f.engine.update_expedition(exp.id, grow, &f.guide),
        other.reserve(ReserveCmd::new(exp.id, 6), &f.trekker),
    );

    match updated {
        Ok(expedition) => assert_eq!(expedition.max_people, 12),
        Err(err) => assert!(matches!(err, EngineError::Conflict(_)), "{err:?}"),
    }
    if let Err(err) = reserved {
        assert!(matches!(err, EngineError::Conflict(_)), "{err:?}");
    }

    drop(other);
    drop(db2);
    drop(f);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn refunded_booking_cannot_be_cancelled_again() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.trekker)
        .await
        .unwrap();

    let refunded = f
        .engine
        .update_booking(
            booking.id,
            BookingPatch {
                status: Some(BookingStatus::Refunded),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert_eq!(refunded.refund, Some(booking.total));
    assert!(refunded.cancelled_at.is_some());
    assert_eq!(occupied(&f, exp.id).await, 0);

    let cancel = BookingPatch {
        status: Some(BookingStatus::Cancelled),
        ..Default::default()
    };
    let err = f
        .engine
        .update_booking(booking.id, cancel.clone(), &f.trekker)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("booking is already REFUNDED".to_string())
    );
    assert!(matches!(
        f.engine
            .update_booking(booking.id, cancel, &f.admin)
            .await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        f.engine
            .cancel_booking(booking.id, None, &f.trekker, Utc::now())
            .await,
        Err(EngineError::Validation(_))
    ));

    let unchanged = f.engine.booking(booking.id, &f.admin).await.unwrap();
    assert_eq!(unchanged.status, BookingStatus::Refunded);
    assert_eq!(unchanged.refund, refunded.refund);
    assert_eq!(unchanged.cancelled_at, refunded.cancelled_at);
}

#[tokio::test]
async fn refunding_a_cancelled_booking_keeps_the_cancellation_quote() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.trekker)
        .await
        .unwrap();

    let late = exp.start_date - Duration::hours(30);
    let cancelled = f
        .engine
        .cancel_booking(booking.id, None, &f.trekker, late)
        .await
        .unwrap();
    assert_eq!(cancelled.refund, Some(MoneyCents::new(15_000)));

    let refunded = f
        .engine
        .update_booking(
            booking.id,
            BookingPatch {
                status: Some(BookingStatus::Refunded),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert_eq!(refunded.refund, Some(MoneyCents::new(15_000)));
    assert_eq!(refunded.cancelled_at, cancelled.cancelled_at);
}

#[tokio::test]
async fn capturing_a_payment_confirms_the_booking() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.trekker)
        .await
        .unwrap();

    let capture = PaymentCapture {
        method: PaymentMethod::Pix,
        reference: Some(" E2E-123 ".to_string()),
    };
    assert!(matches!(
        f.engine
            .capture_payment(booking.id, capture.clone(), &f.trekker)
            .await,
        Err(EngineError::Forbidden(_))
    ));

    let payment = f
        .engine
        .capture_payment(booking.id, capture.clone(), &f.admin)
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.amount.cents(), 30_000);
    assert_eq!(payment.fee.cents(), 4_500);
    assert_eq!(payment.net.cents(), 25_500);
    assert_eq!(payment.reference.as_deref(), Some("E2E-123"));
    assert_eq!(payment.captured_by, f.admin.id);

    let confirmed = f.engine.booking(booking.id, &f.trekker).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());
    assert_eq!(occupied(&f, exp.id).await, 2);

    assert!(matches!(
        f.engine
            .capture_payment(booking.id, capture, &f.admin)
            .await,
        Err(EngineError::ExistingKey(_))
    ));
    assert_eq!(
        f.engine
            .booking_payment(booking.id, &f.trekker)
            .await
            .unwrap()
            .id,
        payment.id
    );
    assert!(matches!(
        f.engine
            .booking_payment(booking.id, &f.other_trekker)
            .await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn refunding_a_payment_closes_the_booking() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let early = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.trekker)
        .await
        .unwrap();
    let late = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.other_trekker)
        .await
        .unwrap();
    for id in [early.id, late.id] {
        f.engine
            .capture_payment(id, PaymentCapture::default(), &f.admin)
            .await
            .unwrap();
    }

    let payment = f
        .engine
        .refund_payment(
            early.id,
            PaymentRefund {
                reason: Some("weather".to_string()),
            },
            &f.admin,
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);
    assert_eq!(payment.refunded, Some(MoneyCents::new(30_000)));
    assert_eq!(payment.refund_reason.as_deref(), Some("weather"));
    assert!(payment.refunded_at.is_some());

    let booking = f.engine.booking(early.id, &f.trekker).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Refunded);
    assert_eq!(booking.refund, Some(MoneyCents::new(30_000)));
    assert_eq!(booking.cancellation_reason.as_deref(), Some("weather"));
    assert_eq!(occupied(&f, exp.id).await, 2);

    // 30 hours before the start falls in the 24h window.
    let payment = f
        .engine
        .refund_payment(
            late.id,
            PaymentRefund::default(),
            &f.admin,
            exp.start_date - Duration::hours(30),
        )
        .await
        .unwrap();
    assert_eq!(payment.refunded, Some(MoneyCents::new(15_000)));

    assert!(matches!(
        f.engine
            .refund_payment(early.id, PaymentRefund::default(), &f.admin, Utc::now())
            .await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        f.engine
            .update_booking(
                early.id,
                BookingPatch {
                    status: Some(BookingStatus::Cancelled),
                    ..Default::default()
                },
                &f.trekker,
            )
            .await,
        Err(EngineError::Validation(_))
    ));
}

#[tokio::test]
async fn only_active_paid_bookings_move_money() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 1), &f.trekker)
        .await
        .unwrap();

    let err = f
        .engine
        .refund_payment(booking.id, PaymentRefund::default(), &f.admin, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation("booking has no captured payment".to_string())
    );
    assert!(matches!(
        f.engine.booking_payment(booking.id, &f.trekker).await,
        Err(EngineError::KeyNotFound(_))
    ));

    f.engine
        .cancel_booking(booking.id, None, &f.trekker, Utc::now())
        .await
        .unwrap();
    assert!(matches!(
        f.engine
            .capture_payment(booking.id, PaymentCapture::default(), &f.admin)
            .await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        f.engine
            .capture_payment(Uuid::new_v4(), PaymentCapture::default(), &f.admin)
            .await,
        Err(EngineError::KeyNotFound(_))
    ));
}

fn actions(page: &engine::Page<engine::AuditEntry>) -> Vec<AuditAction> {
    let mut actions: Vec<_> = page.items.iter().map(|e| e.action).collect();
    actions.sort_by_key(|a| a.as_str());
    actions
}

#[tokio::test]
async fn booking_money_changes_are_audited() {
    let f = memory_fixture().await;
    let exp = published(&f, 4).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 3), &f.trekker)
        .await
        .unwrap();
    f.engine
        .reserve(ReserveCmd::new(exp.id, 3), &f.other_trekker)
        .await
        .unwrap_err();

    f.engine
        .update_booking(
            booking.id,
            BookingPatch {
                commission_rate_bps: Some(Some(1_000)),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    f.engine
        .cancel_booking(booking.id, Some("sick"), &f.trekker, Utc::now())
        .await
        .unwrap();
    f.engine
        .update_user(
            f.guide.id,
            UserPatch {
                commission_rate_bps: Some(Some(1_200)),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();

    let for_booking = f
        .engine
        .audit_log(
            AuditFilter {
                entity: Some(AuditEntity::Booking),
                entity_id: Some(booking.id),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    assert_eq!(
        actions(&for_booking),
        vec![
            AuditAction::BookingCancelled,
            AuditAction::BookingReserved,
            AuditAction::CommissionOverridden,
        ]
    );
    let cancelled = for_booking
        .items
        .iter()
        .find(|e| e.action == AuditAction::BookingCancelled)
        .unwrap();
    assert_eq!(cancelled.actor_id, f.trekker.id);
    assert_eq!(
        cancelled.detail.as_deref(),
        Some("refund_cents=45000 refund_bps=10000")
    );

    let overrides = f
        .engine
        .audit_log(
            AuditFilter {
                action: Some(AuditAction::CommissionOverridden),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    assert_eq!(overrides.total, 2);
    assert!(
        overrides
            .items
            .iter()
            .any(|e| e.entity == AuditEntity::User && e.entity_id == f.guide.id)
    );

    // The rejected reservation left no trace.
    let reserved = f
        .engine
        .audit_log(
            AuditFilter {
                action: Some(AuditAction::BookingReserved),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    assert_eq!(reserved.total, 1);

    assert!(matches!(
        f.engine.audit_log(AuditFilter::default(), &f.guide).await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn payments_are_audited() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    let booking = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 1), &f.trekker)
        .await
        .unwrap();
    let payment = f
        .engine
        .capture_payment(booking.id, PaymentCapture::default(), &f.admin)
        .await
        .unwrap();
    f.engine
        .refund_payment(booking.id, PaymentRefund::default(), &f.admin, Utc::now())
        .await
        .unwrap();

    let entries = f
        .engine
        .audit_log(
            AuditFilter {
                entity: Some(AuditEntity::Payment),
                entity_id: Some(payment.id),
                ..Default::default()
            },
            &f.admin,
        )
        .await
        .unwrap();
    assert_eq!(
        actions(&entries),
        vec![AuditAction::PaymentCaptured, AuditAction::PaymentRefunded]
    );
    assert!(entries.items.iter().all(|e| e.actor_id == f.admin.id));
}

#[tokio::test]
async fn dashboard_counts_bookings_and_revenue() {
    let f = memory_fixture().await;
    let exp = published(&f, 10).await;
    expedition_with(&f, 10, ExpeditionStatus::Draft).await;

    let paid = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 2), &f.trekker)
        .await
        .unwrap();
    let dropped = f
        .engine
        .reserve(ReserveCmd::new(exp.id, 3), &f.other_trekker)
        .await
        .unwrap();
    f.engine
        .reserve(ReserveCmd::new(exp.id, 1), &f.other_trekker)
        .await
        .unwrap();
    f.engine
        .capture_payment(paid.id, PaymentCapture::default(), &f.admin)
        .await
        .unwrap();
    f.engine
        .cancel_booking(dropped.id, None, &f.other_trekker, Utc::now())
        .await
        .unwrap();

    let metrics = f.engine.dashboard_metrics(&f.admin).await.unwrap();
    assert_eq!(metrics.users, 4);
    assert_eq!(metrics.trails, 1);
    assert_eq!(metrics.guides_verified, 0);
    assert_eq!(metrics.guides_pending, 1);
    assert_eq!(metrics.open_expeditions, 1);
    assert_eq!(metrics.bookings.pending, 1);
    assert_eq!(metrics.bookings.confirmed, 1);
    assert_eq!(metrics.bookings.cancelled, 1);
    assert_eq!(metrics.bookings.refunded, 0);
    assert_eq!(metrics.revenue.len(), 1);
    let brl = metrics.revenue[0];
    assert_eq!(brl.currency, Currency::Brl);
    assert_eq!(brl.gross.cents(), 30_000);
    assert_eq!(brl.fees.cents(), 4_500);
    assert_eq!(brl.refunded.cents(), 0);
    assert_eq!(brl.net.cents(), 30_000);

    f.engine
        .refund_payment(paid.id, PaymentRefund::default(), &f.admin, Utc::now())
        .await
        .unwrap();
    let metrics = f.engine.dashboard_metrics(&f.admin).await.unwrap();
    assert_eq!(metrics.bookings.confirmed, 0);
    assert_eq!(metrics.bookings.refunded, 1);
    let brl = metrics.revenue[0];
    assert_eq!(brl.gross.cents(), 30_000);
    assert_eq!(brl.fees.cents(), 0);
    assert_eq!(brl.refunded.cents(), 30_000);
    assert_eq!(brl.net.cents(), 0);

    assert!(matches!(
        f.engine.dashboard_metrics(&f.guide).await,
        Err(EngineError::Forbidden(_))
    ));
}
