//! 挑战赛完整流程集成测试
//!
//! 使用真实 PostgreSQL 仓储：注册、提交活动、排行榜、快照发布、公告投递。
//! 运行方式：`DATABASE_URL=... cargo test -p challenge-service -- --ignored`

use challenge_service::email::build_email_sender;
use challenge_service::models::{AnnouncementStatus, DeliveryStatus, User};
use challenge_service::notifier::build_owner_notifier;
use challenge_service::repository::AnnouncementRepositoryTrait;
use challenge_service::scoring::ActivityCounts;
use challenge_service::state::{AppState, Repositories};
use challenge_service::ApiError;
use challenge_shared::config::{AppConfig, DatabaseConfig};
use challenge_shared::database::Database;
use chrono::NaiveDate;
use tokio::sync::Mutex;

/// 投递队列是全局的，涉及认领的用例串行执行
static DELIVERY_QUEUE: Mutex<()> = Mutex::const_new(());

async fn setup() -> AppState {
    let mut config = AppConfig::default();
    config.database = DatabaseConfig {
        url: std::env::var("DATABASE_URL").unwrap_or_else(|_| DatabaseConfig::default().url),
        ..Default::default()
    };

    let db = Database::connect(&config.database).await.unwrap();
    db.run_migrations().await.unwrap();

    let repos = Repositories::postgres(&db);
    let email = build_email_sender(&config.email).unwrap();
    let notifier = build_owner_notifier(&config.notifier).unwrap();

    AppState::new(db, &config, repos, email, notifier)
}

async fn register(state: &AppState, name: &str) -> User {
    let email = format!("{}-{}@example.com", name.to_lowercase(), uuid::Uuid::new_v4());
    let public = state
        .auth_service
        .register(&email, name, "ramadan1", "http://localhost:8080")
        .await
        .unwrap();

    state
        .auth_service
        .current_user(public.id)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_submit_rank_and_publish() {
    let state = setup().await;
    let amina = register(&state, "Amina").await;
    let bilal = register(&state, "Bilal").await;

    let full_day = ActivityCounts {
        daily_prayers: 5,
        tahajud: 1,
        tarawih20: 1,
        fasting: 1,
        quran_arabic_pages: 3,
        islamic_book_pages: 5,
        podcast_minutes: 10,
        salawat: 100,
        ..Default::default()
    };

    let result = state
        .activity_service
        .submit_daily(&amina, "2026-03-01", full_day, Some("first day".into()))
        .await
        .unwrap();
    assert_eq!(result.total_points, 420);

    // 同一天重复提交覆盖之前的记录
    let lighter = ActivityCounts {
        daily_prayers: 5,
        fasting: 1,
        ..Default::default()
    };
    let result = state
        .activity_service
        .submit_daily(&amina, "2026-03-01", lighter, None)
        .await
        .unwrap();
    assert_eq!(result.total_points, 150);

    let mine = state.activity_service.list_mine(amina.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].total_points, 150);
    assert_eq!(mine[0].counts, lighter);

    state
        .activity_service
        .submit_daily(&bilal, "2026-03-01", full_day, None)
        .await
        .unwrap();

    let standings = state.leaderboard_service.current().await.unwrap();
    let amina_rank = standings.iter().find(|e| e.user_id == amina.id).unwrap();
    let bilal_rank = standings.iter().find(|e| e.user_id == bilal.id).unwrap();
    assert_eq!(amina_rank.total_points, 150);
    assert_eq!(bilal_rank.total_points, 420);
    assert!(bilal_rank.rank < amina_rank.rank);

    let date = NaiveDate::from_ymd_opt(2099, 3, 1).unwrap();
    state.leaderboard_service.publish(date, amina.id).await.unwrap();
    let history = state.leaderboard_service.history(date).await.unwrap().unwrap();
    assert!(history.iter().any(|e| e.user_id == bilal.id));

    state
        .activity_service
        .delete(amina.id, "2026-03-01")
        .await
        .unwrap();
    let err = state
        .activity_service
        .delete(amina.id, "2026-03-01")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ActivityNotFound));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_announcement_delivery_respects_preferences() {
    let _queue = DELIVERY_QUEUE.lock().await;
    let state = setup().await;
    let author = register(&state, "Admin").await;
    let reader = register(&state, "Reader").await;

    // 关闭公告邮件的用户直接记为已投递
    state
        .preference_repo
        .upsert(reader.id, None, Some(false))
        .await
        .unwrap();

    let draft = state
        .announcement_service
        .create(author.id, "Last ten nights", "Increase your worship.")
        .await
        .unwrap();
    assert_eq!(draft.status, AnnouncementStatus::Draft);

    let sent = state.announcement_service.send(draft.id).await.unwrap();
    assert_eq!(sent.announcement.status, AnnouncementStatus::Sent);
    assert!(sent.deliveries >= 2);

    let err = state.announcement_service.send(draft.id).await.unwrap_err();
    assert!(matches!(err, ApiError::AnnouncementNotDraft { .. }));

    state
        .announcement_service
        .process_pending_deliveries(10_000)
        .await
        .unwrap();

    let inbox = state.announcement_service.inbox(reader.id).await.unwrap();
    let item = inbox.iter().find(|i| i.announcement_id == draft.id).unwrap();
    assert_eq!(item.delivery_status, DeliveryStatus::Delivered);

    state
        .announcement_service
        .mark_read(reader.id, draft.id)
        .await
        .unwrap();

    let stats = state.announcement_service.delivery_stats(draft.id).await.unwrap();
    assert_eq!(stats.total, sent.deliveries as i64);
    assert!(stats.read >= 1);
    assert_eq!(stats.pending, 0);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_read_status_survives_worker_write_back() {
    let _queue = DELIVERY_QUEUE.lock().await;
    let state = setup().await;
    let author = register(&state, "Admin").await;
    let reader = register(&state, "Reader").await;
    let repo = Repositories::postgres(&state.db).announcements;

    let draft = state
        .announcement_service
        .create(author.id, "Laylat al-Qadr", "Seek it in the odd nights.")
        .await
        .unwrap();
    state.announcement_service.send(draft.id).await.unwrap();

    // Worker 认领后、回写前，用户在收件箱中标记已读
    let claimed = repo.claim_pending_deliveries(10_000, 600).await.unwrap();
    let reader_delivery = claimed
        .iter()
        .find(|d| d.announcement_id == draft.id && d.user_id == reader.id)
        .unwrap()
        .delivery_id;

    state
        .announcement_service
        .mark_read(reader.id, draft.id)
        .await
        .unwrap();

    let written = repo
        .update_delivery_status(reader_delivery, DeliveryStatus::Delivered)
        .await
        .unwrap();
    assert!(!written);

    let inbox = state.announcement_service.inbox(reader.id).await.unwrap();
    let item = inbox.iter().find(|i| i.announcement_id == draft.id).unwrap();
    assert_eq!(item.delivery_status, DeliveryStatus::Read);
    assert!(item.read_at.is_some());

    // 已认领的记录在租约期内不会被再次认领
    let again = repo.claim_pending_deliveries(10_000, 600).await.unwrap();
    assert!(again.iter().all(|d| d.announcement_id != draft.id));

    for delivery in claimed.iter().filter(|d| d.delivery_id != reader_delivery) {
        repo.update_delivery_status(delivery.delivery_id, DeliveryStatus::Delivered)
            .await
            .unwrap();
    }
}
