//! The cup-hit lifecycle: team generation, hitting a cup, answering, reset.
//!
//! Cup and stat writes are plain overwrites. Two clients resolving different
//! hits concurrently can lose one update to the other (last write wins);
//! that weak-consistency model is deliberate and confined to this module and
//! the store trait.

use super::SessionClient;
use crate::engine;
use crate::types::*;
use serde_json::json;
use std::sync::Arc;

impl SessionClient {
    /// Narrow the question pool to one category, or `None` for all
    pub async fn select_category(&self, category: Option<Category>) {
        *self.category.write().await = category;
    }

    /// Shuffle the roster into two teams of two and reset the turn pointer.
    /// Needs at least four players; otherwise a silent no-op.
    pub async fn generate_teams(&self) {
        let roster = self.roster.read().await.clone();
        let Some(teams) = engine::generate_teams(&roster) else {
            return;
        };
        *self.turn_index.write().await = 0;
        *self.feedback.write().await = Some(Feedback::TeamStarts(
            Team::One,
            teams.members(Team::One).to_vec(),
        ));
        *self.teams.write().await = Some(teams);
    }

    /// Hit a cup: draws a question for it when the hit is valid.
    ///
    /// No-op while a question is active, when teams have not been generated,
    /// when the target cup is already gone, or when the filtered pool is
    /// empty.
    pub async fn hit_cup(&self, index: usize) {
        if self.active_question.read().await.is_some() {
            return;
        }
        if self.teams.read().await.is_none() {
            return;
        }
        if !self.cups.read().await.get(index).copied().unwrap_or(false) {
            return;
        }

        let filter = *self.category.read().await;
        let pool = self.bank.pool(filter);
        let Some(question) = engine::draw_question(&pool) else {
            return;
        };

        *self.active_question.write().await = Some(ActiveQuestion {
            cup_index: index,
            question: question.clone(),
        });
    }

    /// Resolve the active question with a submitted answer.
    ///
    /// Writes the answering player's stat delta, knocks the cup out on a
    /// wrong answer, runs win detection against the pre-answer board, and
    /// either awards the game or rotates the turn. Feedback and the question
    /// clear together after [`super::ANSWER_DISPLAY_DELAY`].
    pub async fn submit_answer(self: &Arc<Self>, submitted: &str) {
        let Some(active) = self.active_question.read().await.clone() else {
            return;
        };
        let Some(teams) = self.teams.read().await.clone() else {
            return;
        };

        let correct = engine::evaluate_answer(submitted, &active.question.answer);

        if let Some(me) = self.user_name.read().await.clone() {
            let mut stats = self.stats(&me).await;
            if correct {
                stats.correct += 1;
            } else {
                stats.wrong += 1;
            }
            self.write_stats(&me, &stats).await;
        }

        // Win detection runs against the board as it was before this answer;
        // the just-hit cell is accounted for inside detect_win.
        let cups = self.cups.read().await.clone();
        if !correct {
            let next = engine::apply_outcome(&cups, active.cup_index, correct);
            self.write_cups(&next).await;
        }

        match engine::detect_win(&cups, active.cup_index, correct) {
            Some(winner) => {
                self.award_game(&teams, winner).await;
                *self.feedback.write().await = Some(Feedback::TeamWins(winner));
            }
            None => {
                let roster_len = self.roster.read().await.len();
                {
                    let mut turn = self.turn_index.write().await;
                    *turn = engine::next_turn_index(*turn, roster_len);
                }
                *self.feedback.write().await = Some(if correct {
                    Feedback::Correct
                } else {
                    Feedback::Wrong
                });
            }
        }

        self.schedule_display_clear().await;
    }

    /// Put all 20 cups back and clear the local question/feedback view.
    /// Stats and roster are untouched.
    pub async fn reset_game(&self) {
        if let Err(e) = self.store.set(&self.paths.cups(), json!(fresh_board())).await {
            tracing::warn!("Cup board reset failed: {}", e);
        }
        *self.active_question.write().await = None;
        *self.feedback.write().await = None;
        if let Some(pending) = self.clear_task.lock().await.take() {
            pending.abort();
        }
    }

    /// Increment `gamesWon` for every member of the winning team.
    /// Read-then-overwrite per player, same last-write-wins caveat as cups.
    async fn award_game(&self, teams: &Teams, winner: Team) {
        let stats_map = self.stats.read().await.clone();
        let writes = teams.members(winner).iter().map(|name| {
            let mut stats = stats_map.get(name).cloned().unwrap_or_default();
            stats.games_won += 1;
            async move { self.write_stats(name, &stats).await }
        });
        futures::future::join_all(writes).await;
        tracing::info!("Team {} wins the game", winner.number());
    }

    async fn write_cups(&self, cups: &[bool]) {
        if let Err(e) = self.store.set(&self.paths.cups(), json!(cups)).await {
            tracing::warn!("Cup board write failed: {}", e);
        }
    }

    async fn write_stats(&self, name: &str, stats: &PlayerStats) {
        let path = self.paths.player_stats(name);
        let value = json!({
            "correct": stats.correct,
            "wrong": stats.wrong,
            "gamesWon": stats.games_won,
        });
        if let Err(e) = self.store.set(&path, value).await {
            tracing::warn!("Stats write for {} failed: {}", name, e);
        }
    }
}
