use cupquiz::questions::QuestionBank;
use cupquiz::session::{SessionClient, ANSWER_DISPLAY_DELAY, NOTIFICATION_TTL};
use cupquiz::store::{MemoryStore, SharedStore};
use cupquiz::types::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SESSION: &str = "test";

fn football_bank() -> QuestionBank {
    QuestionBank::new(vec![Question {
        question: "Wer wurde 2014 Weltmeister?".to_string(),
        answer: "Deutschland".to_string(),
        category: Category::Fussball,
    }])
}

async fn connect(
    store: &Arc<dyn SharedStore>,
    dir: &TempDir,
    tag: &str,
    bank: QuestionBank,
) -> Arc<SessionClient> {
    SessionClient::connect(
        store.clone(),
        SESSION,
        bank,
        dir.path().join(format!("name-{}", tag)),
    )
    .await
    .expect("connect should succeed")
}

/// Let the watcher tasks process pending snapshots
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

async fn read_path(store: &Arc<dyn SharedStore>, path: &str) -> serde_json::Value {
    store.subscribe(path).await.unwrap().borrow().clone()
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_join_leaves_roster_unchanged() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let alice = connect(&store, &dir, "a", QuestionBank::default()).await;
    let bob = connect(&store, &dir, "b", QuestionBank::default()).await;

    alice.join("Anna").await;
    bob.join("  Anna  ").await;
    alice.join("Anna").await;
    settle().await;

    assert_eq!(alice.roster().await, vec!["Anna".to_string()]);
    assert_eq!(bob.roster().await, vec!["Anna".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_name_join_is_noop() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let client = connect(&store, &dir, "a", QuestionBank::default()).await;

    client.join("   ").await;
    settle().await;

    assert!(client.roster().await.is_empty());
    assert_eq!(client.user_name().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_forced_removal_clears_local_join() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let alice = connect(&store, &dir, "a", QuestionBank::default()).await;
    let bob = connect(&store, &dir, "b", QuestionBank::default()).await;

    alice.join("Anna").await;
    bob.join("Ben").await;
    settle().await;
    assert_eq!(alice.user_name().await, Some("Anna".to_string()));

    bob.remove_player("Anna").await;
    settle().await;

    assert_eq!(alice.user_name().await, None);
    assert_eq!(alice.roster().await, vec!["Ben".to_string()]);
    // The remembered-name file is gone too, no auto-rejoin on restart
    assert!(!dir.path().join("name-a").exists());
}

#[tokio::test(start_paused = true)]
async fn test_remembered_name_rejoins_automatically() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());

    let first = connect(&store, &dir, "a", QuestionBank::default()).await;
    first.join("Anna").await;
    settle().await;
    first.shutdown().await;
    drop(first);

    // Same name file, fresh client: still joined without a new transaction
    let restarted = connect(&store, &dir, "a", QuestionBank::default()).await;
    settle().await;
    assert_eq!(restarted.user_name().await, Some("Anna".to_string()));
    assert_eq!(restarted.roster().await, vec!["Anna".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_absent_board_initializes_and_racing_initializers_converge() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());

    // Both clients see the board absent and both write the initializer
    let alice = connect(&store, &dir, "a", QuestionBank::default()).await;
    let bob = connect(&store, &dir, "b", QuestionBank::default()).await;
    settle().await;

    assert_eq!(alice.cups().await, fresh_board());
    assert_eq!(bob.cups().await, fresh_board());
    assert_eq!(
        read_path(&store, "games/test/cups").await,
        json!(fresh_board())
    );
}

#[tokio::test(start_paused = true)]
async fn test_malformed_board_snapshot_reinitializes() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let client = connect(&store, &dir, "a", QuestionBank::default()).await;
    settle().await;

    store
        .set("games/test/cups", json!([true, false, "garbage"]))
        .await
        .unwrap();
    settle().await;

    assert_eq!(client.cups().await, fresh_board());
}

#[tokio::test(start_paused = true)]
async fn test_notifications_drain_fifo_every_ttl() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let watcher = connect(&store, &dir, "w", QuestionBank::default()).await;
    let other = connect(&store, &dir, "o", QuestionBank::default()).await;
    settle().await;

    other.join("Anna").await;
    other.join("Ben").await;
    settle().await;

    let notifications = watcher.notifications().await;
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].message, "Anna ist beigetreten");
    assert_eq!(notifications[1].message, "Ben ist beigetreten");

    // Exactly one clears per TTL, FIFO
    tokio::time::sleep(NOTIFICATION_TTL + Duration::from_millis(100)).await;
    let notifications = watcher.notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, "Ben ist beigetreten");

    tokio::time::sleep(NOTIFICATION_TTL + Duration::from_millis(100)).await;
    assert!(watcher.notifications().await.is_empty());
}

async fn join_four(client: &Arc<SessionClient>) {
    for name in ["Anna", "Ben", "Cleo", "Dana"] {
        client.join(name).await;
    }
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn test_generate_teams_needs_four_players() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let client = connect(&store, &dir, "a", football_bank()).await;

    client.join("Anna").await;
    client.join("Ben").await;
    settle().await;

    client.generate_teams().await;
    assert_eq!(client.teams().await, None);

    client.join("Cleo").await;
    client.join("Dana").await;
    settle().await;

    client.generate_teams().await;
    let teams = client.teams().await.expect("teams should exist");
    assert_eq!(teams.first.len(), TEAM_SIZE);
    assert_eq!(teams.second.len(), TEAM_SIZE);
    assert_eq!(client.turn_index().await, 0);
    match client.feedback().await {
        Some(Feedback::TeamStarts(Team::One, members)) => {
            assert_eq!(members, teams.first);
        }
        other => panic!("Expected team-start feedback, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_hit_requires_teams_active_cup_and_questions() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let client = connect(&store, &dir, "a", football_bank()).await;
    join_four(&client).await;

    // No teams yet
    client.hit_cup(5).await;
    assert_eq!(client.active_question().await, None);

    client.generate_teams().await;

    // Dead cup
    store
        .set("games/test/cups", {
            let mut cups = fresh_board();
            cups[5] = false;
            json!(cups)
        })
        .await
        .unwrap();
    settle().await;
    client.hit_cup(5).await;
    assert_eq!(client.active_question().await, None);

    // Empty filtered pool: category with no questions
    client.select_category(Some(Category::Allgemeinwissen)).await;
    client.hit_cup(6).await;
    assert_eq!(client.active_question().await, None);

    // Matching category draws the single question
    client.select_category(Some(Category::Fussball)).await;
    client.hit_cup(6).await;
    let active = client.active_question().await.expect("question drawn");
    assert_eq!(active.cup_index, 6);
    assert_eq!(active.question.answer, "Deutschland");

    // Second hit while a question is active is ignored
    client.hit_cup(7).await;
    assert_eq!(client.active_question().await.unwrap().cup_index, 6);
}

#[tokio::test(start_paused = true)]
async fn test_answer_flow_correct_then_wrong() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let client = connect(&store, &dir, "a", football_bank()).await;
    join_four(&client).await;
    client.generate_teams().await;

    // Correct answer, any case and whitespace: board untouched, turn rotates
    client.hit_cup(2).await;
    client.submit_answer("  DEUTSCHLAND ").await;
    settle().await;

    assert_eq!(client.feedback().await, Some(Feedback::Correct));
    assert_eq!(client.cups().await, fresh_board());
    assert_eq!(client.turn_index().await, 1);
    // The local player (last join wins the name) took the answer
    assert_eq!(client.stats("Dana").await.correct, 1);

    // Display delay clears question and feedback together
    tokio::time::sleep(ANSWER_DISPLAY_DELAY + Duration::from_millis(100)).await;
    assert_eq!(client.active_question().await, None);
    assert_eq!(client.feedback().await, None);

    // Wrong answer knocks the cup out and rotates again
    client.hit_cup(2).await;
    client.submit_answer("Brasilien").await;
    settle().await;

    assert_eq!(client.feedback().await, Some(Feedback::Wrong));
    assert!(!client.cups().await[2]);
    assert_eq!(client.turn_index().await, 2);
    let stats = client.stats("Dana").await;
    assert_eq!(stats.correct, 1);
    assert_eq!(stats.wrong, 1);

    // Submitting again with no active question is a no-op
    tokio::time::sleep(ANSWER_DISPLAY_DELAY + Duration::from_millis(100)).await;
    client.submit_answer("Brasilien").await;
    settle().await;
    assert_eq!(client.turn_index().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_eliminating_team_one_awards_team_two() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let client = connect(&store, &dir, "a", football_bank()).await;
    join_four(&client).await;
    client.generate_teams().await;
    let teams = client.teams().await.unwrap();

    // Team 1's half is gone except cell 3
    let mut cups = fresh_board();
    for cell in cups.iter_mut().take(CUPS_PER_TEAM) {
        *cell = false;
    }
    cups[3] = true;
    store.set("games/test/cups", json!(cups)).await.unwrap();
    settle().await;

    client.hit_cup(3).await;
    client.submit_answer("Brasilien").await;
    settle().await;

    assert_eq!(client.feedback().await, Some(Feedback::TeamWins(Team::Two)));
    // Turn pointer does not advance on a winning outcome
    assert_eq!(client.turn_index().await, 0);

    for name in teams.members(Team::Two) {
        assert_eq!(client.stats(name).await.games_won, 1, "winner {}", name);
    }
    let total: u32 = client
        .stats_map()
        .await
        .values()
        .map(|s| s.games_won)
        .sum();
    assert_eq!(total, TEAM_SIZE as u32);
}

#[tokio::test(start_paused = true)]
async fn test_reset_restores_full_board_and_clears_view() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let client = connect(&store, &dir, "a", football_bank()).await;
    join_four(&client).await;
    client.generate_teams().await;

    let mut cups = fresh_board();
    cups[1] = false;
    cups[15] = false;
    store.set("games/test/cups", json!(cups)).await.unwrap();
    settle().await;

    client.hit_cup(4).await;
    assert!(client.active_question().await.is_some());

    client.reset_game().await;
    settle().await;

    assert_eq!(client.cups().await, fresh_board());
    assert_eq!(client.active_question().await, None);
    assert_eq!(client.feedback().await, None);
    assert_eq!(
        read_path(&store, "games/test/cups").await,
        json!(fresh_board())
    );
    // Roster and stats stay
    assert_eq!(client.roster().await.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_cup_writes_propagate_to_other_clients() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let alice = connect(&store, &dir, "a", football_bank()).await;
    let bob = connect(&store, &dir, "b", football_bank()).await;
    join_four(&alice).await;
    alice.generate_teams().await;

    alice.hit_cup(11).await;
    alice.submit_answer("falsch").await;
    settle().await;

    // Bob never acted, his cache follows the store push
    assert!(!bob.cups().await[11]);
    assert_eq!(bob.stats("Dana").await.wrong, 1);
    // Bob holds no teams and no feedback, that view state is client-local
    assert_eq!(bob.teams().await, None);
    assert_eq!(bob.feedback().await, None);
}
