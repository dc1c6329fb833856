use clap::Parser;
use maze_quest_engine::collaborators::{
    dispatch_outcome, NullResultSink, ResultSink, TieredRewardCalculator,
};
use maze_quest_engine::config::SessionConfig;
use maze_quest_engine::input::{KeyInput, PointerEvent};
use maze_quest_engine::question_bank::QuestionPool;
use maze_quest_engine::result_store::JsonResultStore;
use maze_quest_engine::runtime::{run_session, Command};
use maze_quest_engine::types::{PlanTier, RuntimeEvent, Theme, Vec2};
use maze_quest_engine::{Phase, Session, Snapshot};
use std::io::BufRead;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
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
    #[arg(long)]
    questions: Option<PathBuf>,
    #[arg(long)]
    results: Option<PathBuf>,
    #[arg(long)]
    plan: Option<String>,
}

const HELP: &str = "commands: w/a/s/d move, e interact, f strike, 1-9 answer, \
tap X Y, drag X Y, release, q quit";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    maze_quest_engine::init_tracing();
    let cli = Cli::parse();

    let config = build_config(&cli);
    if let Err(error) = config.validate() {
        tracing::error!("invalid configuration: {error}");
        std::process::exit(2);
    }
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let mut questions = match cli.questions.as_ref() {
        Some(path) => match QuestionPool::from_json_file(path, seed) {
            Ok(pool) => pool,
            Err(error) => {
                tracing::error!(path = %path.display(), "{error}");
                std::process::exit(2);
            }
        },
        None => QuestionPool::builtin(seed),
    };
    let plan = cli
        .plan
        .as_deref()
        .and_then(PlanTier::parse)
        .unwrap_or(PlanTier::Free);
    let mut sink: Box<dyn ResultSink> = match cli.results.clone() {
        Some(path) => Box::new(JsonResultStore::new(path)),
        None => Box::new(NullResultSink),
    };

    let mut session = Session::new(config, &mut questions, seed);
    let init = session.arena_init();
    println!(
        "theme {:?}, arena {}x{}, {} obstacles, seed {seed}",
        init.theme,
        init.width,
        init.height,
        init.obstacles.len()
    );
    println!("{HELP}");

    let (tx, mut rx) = mpsc::channel(64);
    // A blocking stdin read cannot be cancelled, so it lives on its own thread
    // and the runtime can shut down without waiting for it.
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    tracing::warn!("failed to read stdin: {error}");
                    break;
                }
            };
            match parse_command(&line) {
                Some(command) => {
                    if tx.blocking_send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => println!("? {HELP}"),
            }
        }
    });

    let mut last_status = String::new();
    let outcome = run_session(&mut session, &mut rx, |snapshot| {
        for event in &snapshot.events {
            if let Some(line) = describe_event(event) {
                println!("{line}");
            }
        }
        let status = status_line(snapshot);
        if status != last_status {
            println!("{status}");
            last_status = status;
        }
    })
    .await;

    let Some(outcome) = outcome else {
        println!("session abandoned");
        return;
    };
    let report = dispatch_outcome(outcome, plan, &TieredRewardCalculator, sink.as_mut());
    let summary = report.outcome.summary;
    println!(
        "{:?}: opened {}/{} chests, score {}",
        report.outcome.reason,
        summary.containers_opened,
        summary.containers_total,
        summary.final_score
    );
    match report.reward {
        Some(reward) => println!("reward: {reward} credits (saved: {})", report.saved),
        None => println!("no reward"),
    }
}

fn build_config(cli: &Cli) -> SessionConfig {
    let defaults = SessionConfig::from_env();
    let theme = cli
        .theme
        .as_deref()
        .and_then(Theme::parse)
        .unwrap_or(defaults.theme);
    let time_limit_secs = match (cli.minutes, cli.seconds) {
        (_, Some(seconds)) => seconds,
        (Some(minutes), None) => minutes.saturating_mul(60),
        (None, None) => defaults.time_limit_secs,
    };
    SessionConfig {
        theme,
        time_limit_secs,
        chest_count: cli.chests.unwrap_or(defaults.chest_count),
        keys_required: cli.keys.unwrap_or(defaults.keys_required),
        hostile_count: cli.hostiles.unwrap_or(defaults.hostile_count),
        ..defaults
    }
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?.to_ascii_lowercase();
    match head.as_str() {
        "q" | "quit" => Some(Command::Quit),
        "tap" | "drag" => {
            let x = parts.next()?.parse::<f32>().ok()?;
            let y = parts.next()?.parse::<f32>().ok()?;
            let point = Vec2::new(x, y);
            if !point.is_finite() {
                return None;
            }
            Some(Command::Pointer(if head == "tap" {
                PointerEvent::Down(point)
            } else {
                PointerEvent::Move(point)
            }))
        }
        "release" => Some(Command::Pointer(PointerEvent::Up)),
        "skip" => Some(Command::Answer(None)),
        other => {
            if let Ok(choice) = other.parse::<usize>() {
                return (choice >= 1).then(|| Command::Answer(Some(choice - 1)));
            }
            KeyInput::parse(other).map(Command::Key)
        }
    }
}

fn status_line(snapshot: &Snapshot) -> String {
    let phase = match snapshot.phase {
        Phase::Exploring => "exploring".to_string(),
        Phase::Encounter { chest_id } => format!("chest {chest_id}"),
        Phase::Victory => "victory".to_string(),
        Phase::Defeat { cause } => format!("defeat ({cause:?})"),
    };
    let mut line = format!(
        "[{phase}] time {}s lives {}/{} keys {}/{} score {} pos ({:.0},{:.0})",
        snapshot.time_remaining_secs,
        snapshot.player.lives,
        snapshot.player.max_lives,
        snapshot.keys_collected,
        snapshot.keys_required,
        snapshot.score,
        snapshot.player.x,
        snapshot.player.y
    );
    if let Some(encounter) = &snapshot.encounter {
        match &encounter.feedback {
            None => {
                line.push_str(&format!("\n  {}", encounter.question.prompt));
                for (idx, option) in encounter.question.options.iter().enumerate() {
                    line.push_str(&format!("\n    {}) {option}", idx + 1));
                }
            }
            Some(feedback) => {
                let verdict = if feedback.correct { "correct" } else { "wrong" };
                line.push_str(&format!("\n  {verdict}: {}", feedback.explanation));
            }
        }
    }
    line
}

fn describe_event(event: &RuntimeEvent) -> Option<String> {
    match event {
        RuntimeEvent::ChestOpened {
            chest_id,
            keys_collected,
        } => Some(format!("chest {chest_id} opened, {keys_collected} keys")),
        RuntimeEvent::ChestRelocated { chest_id, to, .. } => {
            Some(format!("chest {chest_id} moved to ({:.0},{:.0})", to.x, to.y))
        }
        RuntimeEvent::PlayerDamaged {
            hostile_id: Some(id),
            lives,
        } => Some(format!("hit by hostile {id}, {lives} lives left")),
        RuntimeEvent::HostileDefeated { hostile_id } => {
            Some(format!("hostile {hostile_id} defeated"))
        }
        RuntimeEvent::PortalUnlocked => Some("the portal is open".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_quest_engine::types::Direction;

    #[test]
    fn parse_command_maps_keys_answers_and_pointer() {
        assert_eq!(
            parse_command("w"),
            Some(Command::Key(KeyInput::Move(Direction::Up)))
        );
        assert_eq!(parse_command("E"), Some(Command::Key(KeyInput::Interact)));
        assert_eq!(parse_command("2"), Some(Command::Answer(Some(1))));
        assert_eq!(parse_command("0"), None);
        assert_eq!(parse_command("skip"), Some(Command::Answer(None)));
        assert_eq!(
            parse_command("tap 120 40.5"),
            Some(Command::Pointer(PointerEvent::Down(Vec2::new(120.0, 40.5))))
        );
        assert_eq!(
            parse_command("drag 1 2"),
            Some(Command::Pointer(PointerEvent::Move(Vec2::new(1.0, 2.0))))
        );
        assert_eq!(parse_command("release"), Some(Command::Pointer(PointerEvent::Up)));
        assert_eq!(parse_command("tap 1"), None);
        assert_eq!(parse_command("drag nan nan"), None);
        assert_eq!(parse_command("tap inf 0"), None);
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn build_config_prefers_seconds_over_minutes() {
        let cli = Cli::parse_from(["play", "--minutes", "2", "--seconds", "45", "--theme", "pillars"]);
        let config = build_config(&cli);
        assert_eq!(config.time_limit_secs, 45);
        assert_eq!(config.theme, Theme::Pillars);
        let cli = Cli::parse_from(["play", "--minutes", "2"]);
        assert_eq!(build_config(&cli).time_limit_secs, 120);
    }
}
