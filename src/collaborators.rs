//! Narrow interfaces to the services around the engine: the question bank,
//! the reward calculator and the save service.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{GameOverReason, PlanTier, Question, SessionOutcome, Theme};

/// Supplies questions per thematic zone. Returning fewer than `count` records
/// is allowed; chests without a record open without a quiz.
pub trait QuestionBank {
    fn draw(&mut self, zone: &str, count: usize) -> Vec<Question>;
}

pub trait RewardCalculator {
    fn reward(&self, containers_opened: u32, containers_total: u32, plan: PlanTier) -> u32;
}

pub trait ResultSink {
    /// Returns whether the record was actually stored.
    fn save(&mut self, record: &ResultRecord) -> Result<bool, StoreError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub session_id: String,
    pub theme: Theme,
    pub reason: GameOverReason,
    pub containers_opened: u32,
    pub containers_total: u32,
    pub final_score: u32,
    pub reward: u32,
    pub elapsed_ms: u64,
    pub finished_at_iso: String,
}

/// Credits scale with the share of chests opened; clearing every chest adds
/// half the tier base on top.
#[derive(Clone, Copy, Debug, Default)]
pub struct TieredRewardCalculator;

impl TieredRewardCalculator {
    fn base_credits(plan: PlanTier) -> u32 {
        match plan {
            PlanTier::Free => 10,
            PlanTier::Standard => 20,
            PlanTier::Premium => 40,
        }
    }
}

impl RewardCalculator for TieredRewardCalculator {
    fn reward(&self, containers_opened: u32, containers_total: u32, plan: PlanTier) -> u32 {
        if containers_total == 0 {
            return 0;
        }
        let base = Self::base_credits(plan);
        let opened = containers_opened.min(containers_total);
        let mut credits = base * opened / containers_total;
        if opened == containers_total {
            credits += base / 2;
        }
        credits
    }
}

/// Discards every record and reports it as not stored.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullResultSink;

impl ResultSink for NullResultSink {
    fn save(&mut self, _record: &ResultRecord) -> Result<bool, StoreError> {
        Ok(false)
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub outcome: SessionOutcome,
    /// Granted credits; `None` on defeat.
    pub reward: Option<u32>,
    /// True only when the sink stored the record.
    pub saved: bool,
}

/// Hands a terminal outcome to the reward and save collaborators. Victory is
/// rewarded and saved; defeat only produces the display report. A failed save
/// is logged and does not change the report's outcome.
pub fn dispatch_outcome(
    outcome: SessionOutcome,
    plan: PlanTier,
    calculator: &dyn RewardCalculator,
    sink: &mut dyn ResultSink,
) -> FinalReport {
    if outcome.reason != GameOverReason::Victory {
        tracing::info!(
            session_id = %outcome.session_id,
            reason = ?outcome.reason,
            opened = outcome.summary.containers_opened,
            score = outcome.summary.final_score,
            "session lost, no reward granted"
        );
        return FinalReport {
            outcome,
            reward: None,
            saved: false,
        };
    }

    let reward = calculator.reward(
        outcome.summary.containers_opened,
        outcome.summary.containers_total,
        plan,
    );
    let record = ResultRecord {
        session_id: outcome.session_id.clone(),
        theme: outcome.theme,
        reason: outcome.reason,
        containers_opened: outcome.summary.containers_opened,
        containers_total: outcome.summary.containers_total,
        final_score: outcome.summary.final_score,
        reward,
        elapsed_ms: outcome.elapsed_ms,
        finished_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    let saved = match sink.save(&record) {
        Ok(stored) => stored,
        Err(error) => {
            tracing::warn!(session_id = %record.session_id, "failed to save result: {error}");
            false
        }
    };
    tracing::info!(
        session_id = %record.session_id,
        reward,
        saved,
        "session won"
    );
    FinalReport {
        outcome,
        reward: Some(reward),
        saved,
    }
}
