// tests/db_tests.rs
//
// Pool-level tests for the storage layer, run against fresh in-memory
// SQLite databases.

use std::collections::BTreeMap;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use tac1_backend::db;
use tac1_backend::error::AppError;
use tac1_backend::models::exam_mode::ExamMode;
use tac1_backend::models::question::{AnswerInput, ImportQuestion};
use tac1_backend::models::score::{CategoryScore, NewScore};
use tac1_backend::models::user::{Identity, ROLE_USER, User};

async fn setup_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid SQLite URL")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");
    db::category::seed_defaults(&pool)
        .await
        .expect("Failed to seed categories");
    pool
}

async fn category_id(pool: &SqlitePool, slug: &str) -> i64 {
    db::category::list(pool)
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.slug == slug)
        .expect("category not seeded")
        .id
}

fn answer(text: &str, is_correct: bool) -> AnswerInput {
    AnswerInput {
        text: text.to_string(),
        is_correct,
        rationale: None,
    }
}

async fn seed_user(pool: &SqlitePool, id: &str, email: &str) -> User {
    let identity = Identity {
        id: id.to_string(),
        email: email.to_string(),
        name: "Testeur".to_string(),
        image: None,
    };
    db::user::get_or_create(pool, &identity, ROLE_USER)
        .await
        .unwrap()
}

fn breakdown(entries: &[(&str, i64, i64)]) -> BTreeMap<String, CategoryScore> {
    entries
        .iter()
        .map(|(name, correct, total)| {
            (
                name.to_string(),
                CategoryScore {
                    correct: *correct,
                    total: *total,
                },
            )
        })
        .collect()
}

fn attempt(user_id: &str, score: i64, time_spent: i64, categories: &[(&str, i64, i64)]) -> NewScore {
    let total: i64 = categories.iter().map(|(_, _, t)| t).sum();
    let correct: i64 = categories.iter().map(|(_, c, _)| c).sum();
    NewScore {
        user_id: user_id.to_string(),
        exam_mode: ExamMode::Organisationnelle,
        score,
        total_questions: total,
        correct_answers: correct,
        time_spent,
        category_scores: breakdown(categories),
    }
}

#[tokio::test]
async fn duplicate_category_slug_is_a_conflict() {
    let pool = setup_pool().await;

    db::category::create(&pool, "Réglementation", "reglementation", None)
        .await
        .unwrap();

    let err = db::category::create(&pool, "Réglementation bis", "reglementation", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn options_are_returned_in_position_then_id_order() {
    let pool = setup_pool().await;
    let category = category_id(&pool, "clr").await;

    let id = db::question::create(
        &pool,
        category,
        "Ordre des réponses ?",
        &[answer("Première", true), answer("Deuxième", false)],
    )
    .await
    .unwrap();

    // Two extra rows sharing a position; insertion id breaks the tie.
    for text in ["Troisième", "Quatrième"] {
        sqlx::query(
            "INSERT INTO answer_options (question_id, text, is_correct, rationale, position) \
             VALUES (?, ?, 0, NULL, 2)",
        )
        .bind(id)
        .bind(text)
        .execute(&pool)
        .await
        .unwrap();
    }

    let question = db::question::get(&pool, id).await.unwrap();
    let texts: Vec<&str> = question
        .answer_options
        .iter()
        .map(|o| o.text.as_str())
        .collect();
    assert_eq!(texts, ["Première", "Deuxième", "Troisième", "Quatrième"]);
}

#[tokio::test]
async fn update_replaces_the_whole_answer_set() {
    let pool = setup_pool().await;
    let category = category_id(&pool, "clr").await;

    let id = db::question::create(
        &pool,
        category,
        "Avant",
        &[answer("A", true), answer("B", false), answer("C", false)],
    )
    .await
    .unwrap();

    db::question::update(
        &pool,
        id,
        category,
        "Après",
        &[answer("X", false), answer("Y", true)],
    )
    .await
    .unwrap();

    let question = db::question::get(&pool, id).await.unwrap();
    assert_eq!(question.question_text, "Après");
    assert_eq!(question.answer_options.len(), 2);
    assert_eq!(question.answer_options[0].text, "X");
    assert_eq!(question.answer_options[1].text, "Y");
    assert!(question.answer_options[1].is_correct);

    // No orphaned rows from the old set.
    let orphans: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM answer_options WHERE question_id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(orphans, 2);
}

#[tokio::test]
async fn deleting_a_question_removes_its_options() {
    let pool = setup_pool().await;
    let category = category_id(&pool, "mouvement").await;

    let id = db::question::create(
        &pool,
        category,
        "Éphémère",
        &[answer("A", true), answer("B", false)],
    )
    .await
    .unwrap();
    db::question::delete(&pool, id).await.unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answer_options")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let err = db::question::delete(&pool, id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn bulk_import_reports_each_skipped_entry() {
    let pool = setup_pool().await;
    let category = category_id(&pool, "tresorerie").await;

    let entries = vec![
        ImportQuestion {
            question: "Q0".to_string(),
            answer_options: vec![answer("A", true), answer("B", false)],
        },
        ImportQuestion {
            question: "   ".to_string(),
            answer_options: vec![answer("A", true)],
        },
        ImportQuestion {
            question: "Q2".to_string(),
            answer_options: Vec::new(),
        },
        ImportQuestion {
            question: "Q3".to_string(),
            answer_options: vec![answer("A", true), answer("B", false)],
        },
    ];

    let report = db::question::bulk_import(&pool, &entries, category)
        .await
        .unwrap();

    assert_eq!(report.added, 2);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors[0].contains("index 1"));
    assert!(report.errors[1].contains("index 2"));

    let err = db::question::bulk_import(&pool, &entries, 424242)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReferentialIntegrity(_)));
}

#[tokio::test]
async fn outcome_counters_accumulate() {
    let pool = setup_pool().await;
    let category = category_id(&pool, "clr").await;
    let id = db::question::create(
        &pool,
        category,
        "Comptée",
        &[answer("A", true), answer("B", false)],
    )
    .await
    .unwrap();

    db::question::record_outcome(&pool, id, true).await.unwrap();
    db::question::record_outcome(&pool, id, true).await.unwrap();
    db::question::record_outcome(&pool, id, false).await.unwrap();

    let (successes, failures): (i64, i64) =
        sqlx::query_as("SELECT success_count, failure_count FROM questions WHERE id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!((successes, failures), (2, 1));

    let err = db::question::record_outcome(&pool, 424242, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn save_rejects_invalid_attempts() {
    let pool = setup_pool().await;
    seed_user(&pool, "u1", "u1@example.com").await;

    let mut new = attempt("u1", 150, 60, &[("CLR", 3, 2)]);
    let err = db::score::save(&pool, &new).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    new.score = 50;
    new.exam_mode = ExamMode::Custom;
    let err = db::score::save(&pool, &new).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn leaderboard_keeps_one_best_row_per_user() {
    let pool = setup_pool().await;
    seed_user(&pool, "ua", "a@example.com").await;
    seed_user(&pool, "ub", "b@example.com").await;

    // ua: 50 then 75 (slow). ub: a single 75, faster.
    db::score::save(&pool, &attempt("ua", 50, 100, &[("CLR", 1, 2)]))
        .await
        .unwrap();
    db::score::save(&pool, &attempt("ua", 75, 200, &[("CLR", 3, 4)]))
        .await
        .unwrap();
    db::score::save(&pool, &attempt("ub", 75, 150, &[("CLR", 3, 4)]))
        .await
        .unwrap();

    let entries = db::score::leaderboard(&pool, ExamMode::Organisationnelle, 20)
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].user_id, "ub");
    assert_eq!(entries[0].time_spent, 150);
    assert_eq!(entries[0].attempt_count, 1);
    assert_eq!(entries[1].user_id, "ua");
    assert_eq!(entries[1].score, 75);
    assert_eq!(entries[1].attempt_count, 2);

    let err = db::score::leaderboard(&pool, ExamMode::Custom, 20)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn user_stats_sum_raw_counts_before_the_percentage() {
    let pool = setup_pool().await;
    seed_user(&pool, "u1", "u1@example.com").await;

    // 1/2 at 50% and 4/4 at 100%: the naive mean of percentages would be
    // 75%, the summed counts give 5/6 = 83%.
    db::score::save(&pool, &attempt("u1", 50, 60, &[("CLR", 1, 2)]))
        .await
        .unwrap();
    db::score::save(&pool, &attempt("u1", 100, 60, &[("CLR", 4, 4)]))
        .await
        .unwrap();

    let stats = db::score::user_stats(&pool, "u1").await.unwrap();
    let clr = &stats.category_stats["CLR"];
    assert_eq!(clr.correct, 5);
    assert_eq!(clr.total, 6);
    assert_eq!(clr.percentage, 83);
    assert_eq!(stats.total_attempts, 2);
    assert_eq!(stats.avg_score, 75);
    assert_eq!(stats.best_scores["organisationnelle"], 100);
    assert_eq!(stats.progression["organisationnelle"].len(), 2);
    assert_eq!(stats.recent_attempts.len(), 2);
    // Newest first.
    assert_eq!(stats.recent_attempts[0].score, 100);
}

#[tokio::test]
async fn user_stats_skip_a_malformed_breakdown_blob() {
    let pool = setup_pool().await;
    seed_user(&pool, "u1", "u1@example.com").await;
    db::score::save(&pool, &attempt("u1", 50, 60, &[("CLR", 1, 2)]))
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO scores (user_id, exam_mode, score, total_questions, correct_answers, \
         time_spent, category_scores, created_at) \
         VALUES ('u1', 'organisationnelle', 40, 5, 2, 60, 'not json', ?)",
    )
    .bind(chrono::Utc::now())
    .execute(&pool)
    .await
    .unwrap();

    let stats = db::score::user_stats(&pool, "u1").await.unwrap();
    // The malformed row still counts as an attempt, just not in categories.
    assert_eq!(stats.total_attempts, 2);
    assert_eq!(stats.avg_score, 45);
    let clr = &stats.category_stats["CLR"];
    assert_eq!((clr.correct, clr.total), (1, 2));
}

#[tokio::test]
async fn reissued_provider_id_migrates_the_score_history() {
    let pool = setup_pool().await;
    let first = seed_user(&pool, "old-id", "same@example.com").await;
    assert_eq!(first.id, "old-id");

    db::score::save(&pool, &attempt("old-id", 80, 60, &[("CLR", 4, 5)]))
        .await
        .unwrap();

    // The provider issues a fresh id for the same e-mail.
    let second = seed_user(&pool, "new-id", "same@example.com").await;
    assert_eq!(second.id, "new-id");
    assert_eq!(second.created_at.timestamp(), first.created_at.timestamp());

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);

    let migrated = db::score::user_scores(&pool, "new-id", None).await.unwrap();
    assert_eq!(migrated.len(), 1);
    assert_eq!(migrated[0].score, 80);
    let orphaned = db::score::user_scores(&pool, "old-id", None).await.unwrap();
    assert!(orphaned.is_empty());
}

#[tokio::test]
async fn deleting_a_user_removes_their_scores() {
    let pool = setup_pool().await;
    seed_user(&pool, "u1", "u1@example.com").await;
    db::score::save(&pool, &attempt("u1", 60, 60, &[("CLR", 3, 5)]))
        .await
        .unwrap();
    db::score::save(&pool, &attempt("u1", 70, 60, &[("CLR", 7, 10)]))
        .await
        .unwrap();

    db::user::delete(&pool, "u1").await.unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scores")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let err = db::user::get(&pool, "u1").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn dashboard_ranks_questions_by_success_rate() {
    let pool = setup_pool().await;
    let category = category_id(&pool, "clr").await;
    seed_user(&pool, "u1", "u1@example.com").await;

    // (successes, failures): rates 100%, 50%, 50%, 0%; the two 50% rows are
    // separated by total attempts.
    let counters = [(4, 0), (2, 2), (1, 1), (0, 3)];
    let mut ids = Vec::new();
    for (i, (successes, failures)) in counters.iter().enumerate() {
        let id = db::question::create(
            &pool,
            category,
            &format!("Question {}", i),
            &[answer("A", true), answer("B", false)],
        )
        .await
        .unwrap();
        sqlx::query("UPDATE questions SET success_count = ?, failure_count = ? WHERE id = ?")
            .bind(successes)
            .bind(failures)
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        ids.push(id);
    }
    // A fifth question that was never attempted must not appear at all.
    db::question::create(
        &pool,
        category,
        "Jamais posée",
        &[answer("A", true), answer("B", false)],
    )
    .await
    .unwrap();

    db::score::save(&pool, &attempt("u1", 50, 60, &[("CLR", 1, 2)]))
        .await
        .unwrap();

    let dashboard = db::dashboard::collect(&pool).await.unwrap();

    assert_eq!(dashboard.counts.questions, 5);
    assert_eq!(dashboard.counts.users, 1);
    assert_eq!(dashboard.daily_attempts.len(), 1);
    assert_eq!(dashboard.daily_attempts[0].attempts, 1);
    assert_eq!(dashboard.daily_mode_averages[0].avg_score, 50);

    let easiest: Vec<i64> = dashboard.easiest_questions.iter().map(|q| q.id).collect();
    assert_eq!(easiest, [ids[0], ids[1], ids[2]]);
    let hardest: Vec<i64> = dashboard.hardest_questions.iter().map(|q| q.id).collect();
    assert_eq!(hardest, [ids[3], ids[1], ids[2]]);

    let clr = dashboard
        .category_success
        .iter()
        .find(|c| c.category == "CLR")
        .unwrap();
    assert_eq!((clr.successes, clr.failures), (7, 6));
    assert_eq!(clr.success_rate, 54);
}
