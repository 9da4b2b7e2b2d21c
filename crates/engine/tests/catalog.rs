use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DbBackend, Statement};

use engine::{
    Actor, Currency, Difficulty, Engine, EngineError, ExpeditionFilter, ExpeditionNew,
    ExpeditionStatus, MediaKind, MediaNew, ReviewNew, Role, SignupCmd, TrailFilter, TrailNew,
    TrailPatch, UserFilter, UserPatch,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder()
        .database(db)
        .password_cost(4)
        .build()
        .await
        .unwrap()
}

fn signup(name: &str, email: &str, role: Role) -> SignupCmd {
    SignupCmd {
        name: name.to_string(),
        email: email.to_string(),
        password: "trilha-segura".to_string(),
        role,
        cadastur: None,
    }
}

async fn admin(engine: &Engine) -> Actor {
    engine
        .create_user(signup("Root", "root@trekko.com", Role::Admin))
        .await
        .unwrap()
        .actor()
}

fn trail(name: &str, state: &str) -> TrailNew {
    TrailNew {
        name: name.to_string(),
        state: state.to_string(),
        city: "Cidade".to_string(),
        region_or_park: "Parque".to_string(),
        distance_meters: 5_000,
        elevation_gain_m: 300,
        difficulty: Difficulty::Easy,
        requires_guide: false,
        entry_fee_cents: None,
        description: None,
    }
}

#[tokio::test]
async fn signup_and_authenticate() {
    let engine = engine_with_db().await;

    let user = engine
        .signup(signup("Ana Trilha", " Ana@Trekko.com ", Role::Trekker))
        .await
        .unwrap();
    assert_eq!(user.email, "ana@trekko.com");
    assert_eq!(user.role, Role::Trekker);

    let found = engine
        .authenticate("ANA@trekko.com", "trilha-segura")
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));
    assert!(
        engine
            .authenticate("ana@trekko.com", "wrong-password")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        engine
            .authenticate("nobody@trekko.com", "trilha-segura")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn stored_passwords_are_hashed() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .password_cost(4)
        .build()
        .await
        .unwrap();

    let ana = engine
        .signup(signup("Ana Trilha", "ana@trekko.com", Role::Trekker))
        .await
        .unwrap();

    let stored_hash = |db: sea_orm::DatabaseConnection| async move {
        db.query_one(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT password_hash FROM users WHERE email = 'ana@trekko.com'",
        ))
        .await
        .unwrap()
        .unwrap()
        .try_get::<String>("", "password_hash")
        .unwrap()
    };
    let first = stored_hash(db.clone()).await;
    assert_ne!(first, "trilha-segura");
    assert!(first.starts_with("$2"));

    engine
        .update_user(
            ana.id,
            UserPatch {
                password: Some("nova-senha-123".to_string()),
                ..Default::default()
            },
            &ana.actor(),
        )
        .await
        .unwrap();
    let second = stored_hash(db).await;
    assert_ne!(second, first);
    assert_ne!(second, "nova-senha-123");

    assert!(
        engine
            .authenticate("ana@trekko.com", "trilha-segura")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        engine
            .authenticate("ana@trekko.com", "nova-senha-123")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn password_cost_out_of_range_is_rejected() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let err = Engine::builder()
        .database(db)
        .password_cost(3)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn signup_rejects_bad_input() {
    let engine = engine_with_db().await;

    let err = engine
        .signup(signup("Ana", "ana@trekko.com", Role::Admin))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let mut short = signup("Ana", "ana@trekko.com", Role::Trekker);
    short.password = "short".to_string();
    assert!(matches!(
        engine.signup(short).await,
        Err(EngineError::Validation(_))
    ));

    assert!(matches!(
        engine
            .signup(signup("A", "ana@trekko.com", Role::Trekker))
            .await,
        Err(EngineError::Validation(_))
    ));

    engine
        .signup(signup("Ana", "ana@trekko.com", Role::Trekker))
        .await
        .unwrap();
    let err = engine
        .signup(signup("Ana Two", "ANA@trekko.com", Role::Guide))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("ana@trekko.com".to_string()));
}

#[tokio::test]
async fn users_can_only_manage_themselves() {
    let engine = engine_with_db().await;
    let root = admin(&engine).await;
    let ana = engine
        .signup(signup("Ana", "ana@trekko.com", Role::Trekker))
        .await
        .unwrap()
        .actor();
    let bia = engine
        .signup(signup("Bia", "bia@trekko.com", Role::Trekker))
        .await
        .unwrap()
        .actor();

    assert!(matches!(
        engine.user(bia.id, &ana).await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(engine.user(bia.id, &root).await.is_ok());

    let updated = engine
        .update_user(
            ana.id,
            UserPatch {
                bio: Some("Montanhista".to_string()),
                ..Default::default()
            },
            &ana,
        )
        .await
        .unwrap();
    assert_eq!(updated.bio.as_deref(), Some("Montanhista"));

    let err = engine
        .update_user(
            ana.id,
            UserPatch {
                role: Some(Role::Admin),
                ..Default::default()
            },
            &ana,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    assert!(matches!(
        engine.list_users(UserFilter::default(), &ana).await,
        Err(EngineError::Forbidden(_))
    ));
    let trekkers = engine
        .list_users(
            UserFilter {
                role: Some(Role::Trekker),
                ..Default::default()
            },
            &root,
        )
        .await
        .unwrap();
    assert_eq!(trekkers.total, 2);
}

#[tokio::test]
async fn cadastur_verification_tolerates_accents_and_connectives() {
    let engine = engine_with_db().await;
    let root = admin(&engine).await;
    let mut cmd = signup("João da Silva", "joao@trekko.com", Role::Guide);
    cmd.cadastur = Some("21.123456.10-0001".to_string());
    let guide = engine.signup(cmd).await.unwrap();
    assert!(!guide.cadastur_verified);

    let (verified, comparison) = engine
        .verify_cadastur(guide.id, "JOAO SILVA", &root)
        .await
        .unwrap();
    assert!(comparison.loose_match);
    assert!(!comparison.exact_match);
    assert!(verified.cadastur_verified);

    let (rejected, _) = engine
        .verify_cadastur(guide.id, "Pedro Alves", &root)
        .await
        .unwrap();
    assert!(!rejected.cadastur_verified);

    assert!(matches!(
        engine
            .verify_cadastur(guide.id, "JOAO SILVA", &guide.actor())
            .await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn trails_crud_and_states() {
    let engine = engine_with_db().await;
    let root = admin(&engine).await;

    let pico = engine.new_trail(trail("Pico", "mg"), &root).await.unwrap();
    assert_eq!(pico.state, "MG");
    engine
        .new_trail(trail("Serra Fina", "MG"), &root)
        .await
        .unwrap();
    engine
        .new_trail(trail("Pedra do Baú", "SP"), &root)
        .await
        .unwrap();

    let states = engine.trail_states().await.unwrap();
    let summary: Vec<_> = states.iter().map(|s| (s.state.as_str(), s.trails)).collect();
    assert_eq!(summary, vec![("MG", 2), ("SP", 1)]);

    let mg = engine
        .list_trails(TrailFilter {
            state: Some("mg".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(mg.total, 2);
    assert_eq!(mg.items[0].name, "Pico");

    let updated = engine
        .update_trail(
            pico.id,
            TrailPatch {
                difficulty: Some(Difficulty::Extreme),
                entry_fee_cents: Some(Some(2_000)),
                ..Default::default()
            },
            &root,
        )
        .await
        .unwrap();
    assert_eq!(updated.difficulty, Difficulty::Extreme);
    assert_eq!(updated.entry_fee_cents, Some(2_000));

    let mut bad = trail("Zero", "MG");
    bad.distance_meters = 0;
    assert!(matches!(
        engine.new_trail(bad, &root).await,
        Err(EngineError::Validation(_))
    ));

    engine.delete_trail(pico.id, &root).await.unwrap();
    assert!(matches!(
        engine.trail(pico.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn expeditions_are_validated_and_filtered() {
    let engine = engine_with_db().await;
    let root = admin(&engine).await;
    let guide = engine
        .signup(signup("Guia", "guia@trekko.com", Role::Guide))
        .await
        .unwrap()
        .actor();
    let trekker = engine
        .signup(signup("Ana", "ana@trekko.com", Role::Trekker))
        .await
        .unwrap()
        .actor();
    let trail_id = engine.new_trail(trail("Pico", "MG"), &root).await.unwrap().id;

    let start = Utc::now() + Duration::days(10);
    let new = |offset_days: i64| ExpeditionNew {
        trail_id,
        guide_id: None,
        title: format!("Saída {offset_days}"),
        start_date: start + Duration::days(offset_days),
        end_date: start + Duration::days(offset_days) + Duration::hours(8),
        price_per_person_cents: 10_000,
        max_people: 8,
        currency: Currency::Brl,
        status: ExpeditionStatus::Published,
        description: None,
    };

    assert!(matches!(
        engine.new_expedition(new(0), &trekker).await,
        Err(EngineError::Forbidden(_))
    ));

    let mut backwards = new(0);
    backwards.end_date = backwards.start_date;
    assert!(matches!(
        engine.new_expedition(backwards, &guide).await,
        Err(EngineError::Validation(_))
    ));

    let mut unknown_trail = new(0);
    unknown_trail.trail_id = Uuid::new_v4();
    assert!(matches!(
        engine.new_expedition(unknown_trail, &guide).await,
        Err(EngineError::KeyNotFound(_))
    ));

    // Admins must name a guide.
    assert!(matches!(
        engine.new_expedition(new(0), &root).await,
        Err(EngineError::Validation(_))
    ));
    let mut by_admin = new(3);
    by_admin.guide_id = Some(guide.id);
    let third = engine.new_expedition(by_admin, &root).await.unwrap();
    assert_eq!(third.guide_id, guide.id);

    let second = engine.new_expedition(new(2), &guide).await.unwrap();
    let first = engine.new_expedition(new(1), &guide).await.unwrap();

    let all = engine
        .list_expeditions(ExpeditionFilter {
            trail_id: Some(trail_id),
            ..Default::default()
        })
        .await
        .unwrap();
    let ids: Vec<_> = all.items.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);

    let window = engine
        .list_expeditions(ExpeditionFilter {
            from: Some(start + Duration::days(2)),
            to: Some(start + Duration::days(3)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(window.total, 1);
    assert_eq!(window.items[0].id, second.id);

    let paged = engine
        .list_expeditions(ExpeditionFilter {
            page: Some(2),
            page_size: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(paged.total, 3);
    assert_eq!(paged.total_pages(), 2);
    assert_eq!(paged.items.len(), 1);
}

#[tokio::test]
async fn reviews_and_media() {
    let engine = engine_with_db().await;
    let root = admin(&engine).await;
    let guide = engine
        .signup(signup("Guia", "guia@trekko.com", Role::Guide))
        .await
        .unwrap()
        .actor();
    let trekker = engine
        .signup(signup("Ana", "ana@trekko.com", Role::Trekker))
        .await
        .unwrap()
        .actor();
    let trail_id = engine.new_trail(trail("Pico", "MG"), &root).await.unwrap().id;

    let review = |rating| ReviewNew {
        trail_id: Some(trail_id),
        expedition_id: None,
        rating,
        comment: Some("Vista incrível".to_string()),
    };
    assert!(matches!(
        engine.new_review(review(6), &trekker).await,
        Err(EngineError::Validation(_))
    ));
    engine.new_review(review(5), &trekker).await.unwrap();
    let untargeted = ReviewNew {
        trail_id: None,
        expedition_id: None,
        rating: 4,
        comment: None,
    };
    assert!(matches!(
        engine.new_review(untargeted, &trekker).await,
        Err(EngineError::Validation(_))
    ));
    let reviews = engine.list_reviews(Some(trail_id), None).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].author_id, trekker.id);

    let media = |url: &str| MediaNew {
        trail_id: Some(trail_id),
        expedition_id: None,
        url: url.to_string(),
        kind: MediaKind::Image,
        caption: None,
    };
    assert!(matches!(
        engine
            .new_media(media("https://cdn.trekko.com/a.jpg"), &trekker)
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.new_media(media("ftp://cdn/a.jpg"), &guide).await,
        Err(EngineError::Validation(_))
    ));
    let photo = engine
        .new_media(media("https://cdn.trekko.com/a.jpg"), &guide)
        .await
        .unwrap();
    assert_eq!(engine.list_media(Some(trail_id), None).await.unwrap().len(), 1);

    assert!(matches!(
        engine.delete_media(photo.id, &trekker).await,
        Err(EngineError::Forbidden(_))
    ));
    engine.delete_media(photo.id, &root).await.unwrap();
    assert!(engine.list_media(Some(trail_id), None).await.unwrap().is_empty());
}
