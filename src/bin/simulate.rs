use clap::Parser;
use maze_quest_engine::collaborators::{
    dispatch_outcome, NullResultSink, ResultSink, TieredRewardCalculator,
};
use maze_quest_engine::config::SessionConfig;
use maze_quest_engine::constants::{COUNTDOWN_TICK_MS, HOSTILE_TICK_MS, INPUT_SAMPLE_MS};
use maze_quest_engine::error::StoreError;
use maze_quest_engine::question_bank::QuestionPool;
use maze_quest_engine::result_store::JsonResultStore;
use maze_quest_engine::rng::{RandomSource, Rng};
use maze_quest_engine::types::{
    Direction, GameOverReason, PlanTier, RuntimeEvent, Theme, Vec2,
};
use maze_quest_engine::{Session, Snapshot};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Simulated clock resolution; one bot decision per step.
const STEP_MS: u64 = INPUT_SAMPLE_MS;
const DETOUR_STEPS: u32 = 6;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    theme: Option<String>,
    #[arg(long)]
    minutes: Option<u32>,
    #[arg(long)]
    seconds: Option<u32>,
    #[arg(long)]
    chests: Option<usize>,
    #[arg(long)]
    keys: Option<u32>,
    #[arg(long)]
    hostiles: Option<usize>,
    /// Probability that the bot answers correctly.
    #[arg(long)]
    accuracy: Option<f32>,
    /// JSON question bank; the built-in set is used otherwise.
    #[arg(long)]
    questions: Option<PathBuf>,
    /// Result store file that receives won sessions.
    #[arg(long)]
    results: Option<PathBuf>,
    #[arg(long)]
    plan: Option<String>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Scenario {
    name: String,
    theme: Theme,
    seed: u32,
    time_limit_secs: u32,
    chest_count: usize,
    keys_required: u32,
    hostile_count: usize,
    accuracy: f32,
    plan: PlanTier,
}

impl Scenario {
    fn config(&self) -> SessionConfig {
        SessionConfig {
            theme: self.theme,
            time_limit_secs: self.time_limit_secs,
            chest_count: self.chest_count,
            keys_required: self.keys_required,
            hostile_count: self.hostile_count,
            ..SessionConfig::from_env()
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    theme: Theme,
    reason: Option<GameOverReason>,
    duration_ms: u64,
    containers_opened: u32,
    containers_total: u32,
    final_score: u32,
    keys_collected: u32,
    lives_remaining: u32,
    encounters: u32,
    correct_answers: u32,
    wrong_answers: u32,
    relocations: u32,
    damage_taken: u32,
    hostile_hits: u32,
    hostile_defeats: u32,
    reward: Option<u32>,
    saved: bool,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    at_ms: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    steps: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenario_count: usize,
    anomaly_count: usize,
    average_duration_ms: u64,
    reason_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

/// Counters compared between consecutive snapshots.
#[derive(Clone, Copy, Debug)]
struct Progress {
    keys_collected: u32,
    score: u32,
    lives: u32,
}

impl Progress {
    fn of(snapshot: &Snapshot) -> Self {
        Self {
            keys_collected: snapshot.keys_collected,
            score: snapshot.score,
            lives: snapshot.player.lives,
        }
    }
}

fn main() {
    maze_quest_engine::init_tracing();
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    let mut sink: Box<dyn ResultSink> = match cli.results.as_ref() {
        Some(path) => Box::new(JsonResultStore::new(path.clone())),
        None => Box::new(NullResultSink),
    };

    for scenario in scenarios {
        let config = scenario.config();
        if let Err(error) = config.validate() {
            tracing::error!(
                event = "invalid_config",
                match_id = %match_id,
                scenario = %scenario.name,
                "{error}"
            );
            std::process::exit(2);
        }
        let mut questions = match cli.questions.as_ref() {
            Some(path) => match QuestionPool::from_json_file(path, scenario.seed) {
                Ok(pool) => pool,
                Err(error) => {
                    tracing::error!(
                        event = "question_bank_failed",
                        match_id = %match_id,
                        path = %path.display(),
                        "{error}"
                    );
                    std::process::exit(2);
                }
            },
            None => QuestionPool::builtin(scenario.seed),
        };

        tracing::info!(
            event = "scenario_started",
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            theme = ?scenario.theme,
            time_limit_secs = scenario.time_limit_secs,
            hostiles = scenario.hostile_count,
            accuracy = scenario.accuracy
        );
        let session = Session::new(config, &mut questions, scenario.seed);
        let scenario_run = run_scenario(&scenario, session, sink.as_mut());

        for anomaly in &scenario_run.anomaly_records {
            tracing::warn!(
                event = "anomaly_detected",
                match_id = %match_id,
                scenario = %scenario.name,
                seed = scenario.seed,
                at_ms = anomaly.at_ms,
                message = %anomaly.message
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *reason_counts
            .entry(reason_key(scenario_run.result.reason))
            .or_insert(0) += 1;

        tracing::info!(
            event = "scenario_finished",
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            steps = scenario_run.steps,
            reason = %reason_key(scenario_run.result.reason),
            duration_ms = scenario_run.result.duration_ms,
            opened = scenario_run.result.containers_opened,
            score = scenario_run.result.final_score,
            anomaly_count = scenario_run.anomaly_records.len()
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => {
                tracing::error!(scenario = %scenario.name, "failed to encode result: {error}")
            }
        }
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        reason_counts,
        total_anomalies,
        total_duration_ms,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            tracing::error!(
                event = "summary_write_failed",
                match_id = %match_id,
                path = %path.display(),
                "{error}"
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    tracing::info!(
        event = "run_finished",
        match_id = %match_id,
        scenario_count = summary.scenario_count,
        anomaly_count = summary.anomaly_count,
        average_duration_ms = summary.average_duration_ms,
        reason_counts = ?summary.reason_counts,
        summary_out = ?summary_out_written
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

/// Greedy player: strikes adjacent hostiles, walks to the nearest unopened
/// chest, then to the portal once it is unlocked. Blocked moves fall back to
/// single-axis moves and then a short random detour.
struct Bot {
    rng: Rng,
    accuracy: f32,
    detour: Option<(Direction, u32)>,
}

impl Bot {
    fn new(seed: u32, accuracy: f32) -> Self {
        Self {
            rng: Rng::new(seed ^ 0x9e37_79b9),
            accuracy,
            detour: None,
        }
    }

    fn answer(&mut self, session: &Session) -> Option<usize> {
        let question = session.active_question()?;
        if self.rng.bool(self.accuracy) {
            Some(question.correct_index)
        } else {
            Some((question.correct_index + 1) % question.options.len().max(1))
        }
    }

    fn target(&self, session: &Session) -> Option<Vec2> {
        let pos = session.player_position();
        if session.portal().is_unlocked(session.keys_collected()) {
            return Some(session.portal().pos);
        }
        session
            .chests()
            .iter()
            .filter(|chest| !chest.open)
            .min_by(|a, b| a.pos.distance(pos).total_cmp(&b.pos.distance(pos)))
            .map(|chest| chest.pos)
    }

    fn act(&mut self, session: &mut Session, now_ms: u64) {
        let pos = session.player_position();
        let strike_radius = session.config.strike_radius;
        if session
            .hostiles()
            .iter()
            .any(|hostile| hostile.pos.distance(pos) <= strike_radius)
        {
            session.strike(now_ms);
        }
        if session.interact(now_ms) || !session.timers_running() {
            return;
        }

        let speed = session.config.player_speed;
        if let Some((dir, left)) = self.detour.take() {
            if left > 0 && session.move_player(dir.unit() * speed, now_ms) {
                self.detour = Some((dir, left - 1));
                return;
            }
        }

        let Some(target) = self.target(session) else {
            return;
        };
        let delta = target - pos;
        if session.move_player(delta, now_ms) {
            return;
        }
        let along_x = Vec2::new(delta.x, 0.0);
        if along_x.length() > 0.5 && session.move_player(along_x, now_ms) {
            return;
        }
        let along_y = Vec2::new(0.0, delta.y);
        if along_y.length() > 0.5 && session.move_player(along_y, now_ms) {
            return;
        }
        let dir = Direction::ALL[self.rng.pick_index(Direction::ALL.len())];
        self.detour = Some((dir, DETOUR_STEPS));
    }
}

fn run_scenario(
    scenario: &Scenario,
    mut session: Session,
    sink: &mut dyn ResultSink,
) -> ScenarioRunResult {
    let mut bot = Bot::new(scenario.seed, scenario.accuracy);
    let step_limit = step_limit(&session.config);
    let actor_radius = session.config.actor_radius;
    let max_lives = session.config.max_lives;

    let mut result = ScenarioResultLine {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        theme: scenario.theme,
        reason: None,
        duration_ms: 0,
        containers_opened: 0,
        containers_total: 0,
        final_score: 0,
        keys_collected: 0,
        lives_remaining: 0,
        encounters: 0,
        correct_answers: 0,
        wrong_answers: 0,
        relocations: 0,
        damage_taken: 0,
        hostile_hits: 0,
        hostile_defeats: 0,
        reward: None,
        saved: false,
        anomalies: Vec::new(),
    };
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut terminal_events = 0u32;

    let mut now_ms = 0u64;
    let mut countdown_acc = 0u64;
    let mut hostile_acc = 0u64;
    let mut was_running = session.timers_running();
    let mut previous = Progress::of(&session.build_snapshot(false));
    let mut steps = 0u64;

    while !session.is_ended() {
        now_ms += STEP_MS;
        steps += 1;

        let running = session.timers_running();
        if running && !was_running {
            countdown_acc = 0;
            hostile_acc = 0;
        }
        was_running = running;

        if running {
            hostile_acc += STEP_MS;
            countdown_acc += STEP_MS;
            if hostile_acc >= HOSTILE_TICK_MS {
                hostile_acc -= HOSTILE_TICK_MS;
                session.tick_hostiles(now_ms);
            }
            if countdown_acc >= COUNTDOWN_TICK_MS {
                countdown_acc -= COUNTDOWN_TICK_MS;
                session.tick_countdown(now_ms);
            }
            if session.timers_running() {
                bot.act(&mut session, now_ms);
            }
        } else if session.resume_at_ms().is_some_and(|at| now_ms >= at) {
            session.resume(now_ms);
        } else if session.encounter_deadline_ms().is_some() {
            let choice = bot.answer(&session);
            session.submit_answer(choice, now_ms);
        }

        let snapshot = session.build_snapshot(true);
        let current = Progress::of(&snapshot);
        let anomalies =
            collect_snapshot_anomalies(&session, &snapshot, previous, actor_radius, max_lives);
        for message in anomalies {
            push_anomaly(
                &mut result.anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                now_ms,
                message,
            );
        }
        previous = current;

        for event in &snapshot.events {
            match event {
                RuntimeEvent::EncounterStarted { .. } => result.encounters += 1,
                RuntimeEvent::AnswerResolved { correct: true, .. } => result.correct_answers += 1,
                RuntimeEvent::AnswerResolved { correct: false, .. } => result.wrong_answers += 1,
                RuntimeEvent::ChestRelocated { .. } => result.relocations += 1,
                RuntimeEvent::PlayerDamaged { .. } => result.damage_taken += 1,
                RuntimeEvent::HostileHit { .. } => result.hostile_hits += 1,
                RuntimeEvent::HostileDefeated { .. } => result.hostile_defeats += 1,
                RuntimeEvent::SessionEnded { .. } => terminal_events += 1,
                _ => {}
            }
        }
        if terminal_events > 1 {
            push_anomaly(
                &mut result.anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                now_ms,
                "more than one terminal transition".to_string(),
            );
        }

        if steps > step_limit {
            push_anomaly(
                &mut result.anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                now_ms,
                "step safety limit exceeded".to_string(),
            );
            break;
        }
    }

    let summary = session.build_summary();
    result.containers_opened = summary.containers_opened;
    result.containers_total = summary.containers_total;
    result.final_score = summary.final_score;
    result.keys_collected = session.keys_collected();
    result.lives_remaining = session.lives();
    result.duration_ms = now_ms;

    match session.take_outcome() {
        Some(outcome) => {
            result.reason = Some(outcome.reason);
            result.duration_ms = outcome.elapsed_ms;
            let report = dispatch_outcome(outcome, scenario.plan, &TieredRewardCalculator, sink);
            result.reward = report.reward;
            result.saved = report.saved;
        }
        None if session.is_ended() => push_anomaly(
            &mut result.anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            now_ms,
            "terminal session produced no outcome".to_string(),
        ),
        None => {}
    }
    if session.take_outcome().is_some() {
        push_anomaly(
            &mut result.anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            now_ms,
            "outcome produced twice".to_string(),
        );
    }

    ScenarioRunResult {
        result,
        anomaly_records,
        steps,
    }
}

/// Upper bound on simulated steps: the full countdown plus every encounter
/// the session can hold (each chest once, plus one per life lost to a miss).
fn step_limit(config: &SessionConfig) -> u64 {
    let encounters = config.chest_count as u64 + config.max_lives as u64;
    let per_encounter = config.question_time_limit_ms + config.result_delay_ms + STEP_MS * 2;
    let total_ms = config.time_limit_secs as u64 * COUNTDOWN_TICK_MS + encounters * per_encounter;
    total_ms / STEP_MS + 100
}

fn collect_snapshot_anomalies(
    session: &Session,
    snapshot: &Snapshot,
    previous: Progress,
    actor_radius: f32,
    max_lives: u32,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let arena = &session.arena;

    let player = Vec2::new(snapshot.player.x, snapshot.player.y);
    if arena.is_blocked(player, actor_radius) {
        anomalies.push(format!("player inside blocked space: {:.1},{:.1}", player.x, player.y));
    }
    for hostile in &snapshot.hostiles {
        if arena.is_blocked(Vec2::new(hostile.x, hostile.y), actor_radius) {
            anomalies.push(format!("hostile {} inside blocked space", hostile.id));
        }
        if hostile.hp <= 0.0 {
            anomalies.push(format!("hostile hp <= 0 remains: {}", hostile.id));
        }
    }
    for chest in snapshot.chests.iter().filter(|chest| !chest.open) {
        if arena.is_blocked(Vec2::new(chest.x, chest.y), actor_radius) {
            anomalies.push(format!("chest {} inside blocked space", chest.id));
        }
    }

    if snapshot.keys_collected < previous.keys_collected {
        anomalies.push(format!(
            "keys decreased: {} -> {}",
            previous.keys_collected, snapshot.keys_collected
        ));
    }
    if snapshot.keys_collected != snapshot.opened_count {
        anomalies.push(format!(
            "keys {} do not match opened chests {}",
            snapshot.keys_collected, snapshot.opened_count
        ));
    }
    if snapshot.score < previous.score {
        anomalies.push(format!("score decreased: {} -> {}", previous.score, snapshot.score));
    }
    if snapshot.player.lives > previous.lives || snapshot.player.lives > max_lives {
        anomalies.push(format!(
            "lives out of range: {} -> {} (max {max_lives})",
            previous.lives, snapshot.player.lives
        ));
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| rand::random::<u32>() as u64));
    let plan = cli
        .plan
        .as_deref()
        .and_then(PlanTier::parse)
        .unwrap_or(PlanTier::Standard);
    let defaults = SessionConfig::from_env();

    let custom = cli.single
        || cli.theme.is_some()
        || cli.minutes.is_some()
        || cli.seconds.is_some()
        || cli.chests.is_some()
        || cli.keys.is_some()
        || cli.hostiles.is_some()
        || cli.accuracy.is_some();
    if custom {
        let theme = cli
            .theme
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or(defaults.theme);
        let time_limit_secs = match (cli.minutes, cli.seconds) {
            (_, Some(seconds)) => seconds.clamp(1, 3_600),
            (Some(minutes), None) => minutes.clamp(1, 60) * 60,
            (None, None) => defaults.time_limit_secs,
        };
        return vec![Scenario {
            name: format!("custom-{}", theme.zone()),
            theme,
            seed,
            time_limit_secs,
            chest_count: cli.chests.unwrap_or(defaults.chest_count),
            keys_required: cli.keys.unwrap_or(defaults.keys_required),
            hostile_count: cli.hostiles.unwrap_or(defaults.hostile_count),
            accuracy: cli.accuracy.unwrap_or(0.8).clamp(0.0, 1.0),
            plan,
        }];
    }

    vec![
        Scenario {
            name: "courtyard-steady".to_string(),
            theme: Theme::Courtyard,
            seed,
            time_limit_secs: defaults.time_limit_secs,
            chest_count: defaults.chest_count,
            keys_required: defaults.keys_required,
            hostile_count: defaults.hostile_count,
            accuracy: 0.9,
            plan,
        },
        Scenario {
            name: "corridors-guessing".to_string(),
            theme: Theme::Corridors,
            seed: normalize_seed(seed as u64 + 1),
            time_limit_secs: defaults.time_limit_secs,
            chest_count: defaults.chest_count,
            keys_required: defaults.keys_required,
            hostile_count: defaults.hostile_count,
            accuracy: 0.4,
            plan,
        },
        Scenario {
            name: "pillars-crowded".to_string(),
            theme: Theme::Pillars,
            seed: normalize_seed(seed as u64 + 2),
            time_limit_secs: 90,
            chest_count: defaults.chest_count,
            keys_required: defaults.keys_required,
            hostile_count: 6,
            accuracy: 1.0,
            plan,
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    at_ms: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        at_ms,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        reason_counts,
        scenarios,
    }
}

fn reason_key(reason: Option<GameOverReason>) -> String {
    match reason {
        Some(GameOverReason::Victory) => "victory",
        Some(GameOverReason::Timeout) => "timeout",
        Some(GameOverReason::LivesDepleted) => "lives_depleted",
        None => "unfinished",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), StoreError> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scenario_result(reason: GameOverReason, duration_ms: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            theme: Theme::Courtyard,
            reason: Some(reason),
            duration_ms,
            containers_opened: 0,
            containers_total: 4,
            final_score: 0,
            keys_collected: 0,
            lives_remaining: 3,
            encounters: 0,
            correct_answers: 0,
            wrong_answers: 0,
            relocations: 0,
            damage_taken: 0,
            hostile_hits: 0,
            hostile_defeats: 0,
            reward: None,
            saved: false,
            anomalies: Vec::new(),
        }
    }

    fn scenario(theme: Theme, seed: u32, accuracy: f32) -> Scenario {
        Scenario {
            name: "unit".to_string(),
            theme,
            seed,
            time_limit_secs: 30,
            chest_count: 4,
            keys_required: 3,
            hostile_count: 2,
            accuracy,
            plan: PlanTier::Free,
        }
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_duration() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result(GameOverReason::Timeout, 60_000),
                make_scenario_result(GameOverReason::Victory, 90_000),
            ],
            BTreeMap::from([
                ("timeout".to_string(), 1usize),
                ("victory".to_string(), 1usize),
            ]),
            1,
            150_000,
        );
        assert_eq!(summary.average_duration_ms, 75_000);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("missing").join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result(GameOverReason::Timeout, 60_000)],
            BTreeMap::from([("timeout".to_string(), 1usize)]),
            0,
            60_000,
        );
        let result = write_summary(&target, &summary);
        assert!(matches!(result, Err(StoreError::Write { .. })));
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same anomaly".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same anomaly".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].at_ms, 10);
        assert_eq!(records[1].at_ms, 11);
    }

    #[test]
    fn reason_keys_are_stable() {
        assert_eq!(reason_key(Some(GameOverReason::LivesDepleted)), "lives_depleted");
        assert_eq!(reason_key(None), "unfinished");
    }

    #[test]
    fn bot_scenarios_finish_without_anomalies() {
        for (theme, seed, accuracy) in [
            (Theme::Meadow, 11, 1.0),
            (Theme::Courtyard, 12, 0.5),
            (Theme::Pillars, 13, 0.0),
        ] {
            let scenario = scenario(theme, seed, accuracy);
            let config = SessionConfig {
                theme,
                time_limit_secs: scenario.time_limit_secs,
                hostile_count: scenario.hostile_count,
                ..SessionConfig::default()
            };
            let mut questions = QuestionPool::builtin(seed);
            let session = Session::new(config, &mut questions, seed);
            let run = run_scenario(&scenario, session, &mut NullResultSink);
            assert!(run.result.anomalies.is_empty(), "{:?}", run.result.anomalies);
            assert!(run.result.reason.is_some());
            assert_eq!(run.result.containers_total, 4);
            if run.result.reason != Some(GameOverReason::Victory) {
                assert_eq!(run.result.reward, None);
            }
        }
    }

    #[test]
    fn perfect_bot_in_open_arena_wins() {
        let scenario = scenario(Theme::Meadow, 5, 1.0);
        let config = SessionConfig {
            theme: Theme::Meadow,
            time_limit_secs: 120,
            hostile_count: 0,
            ..SessionConfig::default()
        };
        let mut questions = QuestionPool::builtin(5);
        let session = Session::new(config, &mut questions, 5);
        let run = run_scenario(&scenario, session, &mut NullResultSink);
        assert_eq!(run.result.reason, Some(GameOverReason::Victory));
        assert!(run.result.containers_opened >= 3);
        assert!(run.result.reward.is_some());
        assert_eq!(run.result.wrong_answers, 0);
    }
}
