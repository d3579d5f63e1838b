use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use packman_arcade::config::SessionConfig;
use packman_arcade::constants::TICK_RATE;
use packman_arcade::engine::GameSession;
use packman_arcade::grid::TileGrid;
use packman_arcade::types::{Direction, GameEvent, Lifecycle, Snapshot, StepOutcome, TileKind};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 3)]
    runs: u32,
    /// Hard stop for a single run; five minutes of play by default.
    #[arg(long, default_value_t = u64::from(TICK_RATE) * 60 * 5)]
    max_ticks: u64,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: u32,
    seed: u32,
    outcome: String,
    ticks: u64,
    score: u32,
    #[serde(rename = "highScore")]
    high_score: u32,
    #[serde(rename = "remainingCollectibles")]
    remaining_collectibles: usize,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: u32,
    captures: u32,
    #[serde(rename = "bestCapture")]
    best_capture: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct RunOutput {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    runs: Vec<RunResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: i64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    // Surface layout and speed problems before any run starts.
    GameSession::with_seed(config.clone(), 0).context("invalid session config")?;

    let started_at = now_iso();
    let base_seed = normalize_seed(
        cli.seed
            .unwrap_or_else(|| Utc::now().timestamp_millis().unsigned_abs()),
    );
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(base_seed, Utc::now().timestamp_millis()));

    emit_log(
        "info",
        "run_started",
        &match_id,
        None,
        Some(base_seed),
        None,
        json!({
            "runs": cli.runs,
            "maxTicks": cli.max_ticks,
            "config": cli.config.as_ref().map(|path| path.to_string_lossy().to_string()),
        }),
    );

    let mut results = Vec::new();
    let mut anomaly_count = 0usize;
    for run in 0..cli.runs {
        let seed = base_seed.wrapping_add(run);
        let output = run_session(&config, run, seed, cli.max_ticks)?;

        for anomaly in &output.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(run),
                Some(seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }
        anomaly_count += output.anomaly_records.len();

        emit_log(
            "info",
            "session_finished",
            &match_id,
            Some(run),
            Some(seed),
            Some(output.result.ticks),
            json!({
                "outcome": output.result.outcome,
                "score": output.result.score,
                "remainingCollectibles": output.result.remaining_collectibles,
            }),
        );
        println!("{}", serde_json::to_string(&output.result)?);
        results.push(output.result);
    }

    let summary = build_run_summary(match_id.clone(), started_at, now_iso(), results, anomaly_count);
    let mut summary_out_written = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            return Err(error);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run_session(
    config: &SessionConfig,
    run: u32,
    seed: u32,
    max_ticks: u64,
) -> anyhow::Result<RunOutput> {
    let mut session = GameSession::with_seed(config.clone(), seed)?;
    session.start();

    let width = session.grid().width() as f64;
    let height = session.grid().height() as f64;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut pellets_eaten = 0;
    let mut power_pellets_eaten = 0;
    let mut captures = 0;
    let mut best_capture = 0;

    let mut snapshot = session.build_snapshot(true);
    while snapshot.tick < max_ticks {
        let dir = autopilot(session.grid(), &snapshot);
        session.queue_intent(dir);
        if session.step() == StepOutcome::Inactive {
            break;
        }
        let next = session.build_snapshot(true);
        for message in collect_snapshot_anomalies(&snapshot, &next, width, height) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                next.tick,
                message,
            );
        }
        for event in &next.events {
            match event {
                GameEvent::PelletEaten { .. } => pellets_eaten += 1,
                GameEvent::PowerPelletEaten { .. } => power_pellets_eaten += 1,
                GameEvent::AdversaryCaptured { points, .. } => {
                    captures += 1;
                    best_capture = best_capture.max(*points);
                }
                _ => {}
            }
        }
        snapshot = next;
    }

    Ok(RunOutput {
        result: RunResultLine {
            run,
            seed,
            outcome: outcome_key(snapshot.lifecycle).to_string(),
            ticks: snapshot.tick,
            score: snapshot.score,
            high_score: snapshot.high_score,
            remaining_collectibles: snapshot.remaining_collectibles,
            pellets_eaten,
            power_pellets_eaten,
            captures,
            best_capture,
            anomalies,
        },
        anomaly_records,
    })
}

/// Greedy steering: walk the shortest path to the nearest collectible while
/// treating tiles around lethal adversaries as blocked. When no safe path
/// exists, step to the open neighbor farthest from the closest threat.
fn autopilot(grid: &TileGrid, snapshot: &Snapshot) -> Direction {
    let start = (snapshot.player.x.floor() as i32, snapshot.player.y.floor() as i32);
    let threats: Vec<(i32, i32)> = snapshot
        .adversaries
        .iter()
        .filter(|adversary| !adversary.vulnerable)
        .map(|adversary| (adversary.x.floor() as i32, adversary.y.floor() as i32))
        .collect();
    let danger: HashSet<(i32, i32)> = threats
        .iter()
        .flat_map(|&tile| {
            std::iter::once(tile).chain(
                Direction::CARDINALS
                    .into_iter()
                    .map(move |dir| neighbor(grid, tile, dir)),
            )
        })
        .collect();

    if let Some(dir) = path_to_nearest_collectible(grid, start, &danger) {
        return dir;
    }

    Direction::CARDINALS
        .into_iter()
        .filter(|dir| {
            let (col, row) = neighbor(grid, start, *dir);
            grid.can_move_to(col, row)
        })
        .max_by_key(|dir| {
            let (col, row) = neighbor(grid, start, *dir);
            threats
                .iter()
                .map(|&(tx, ty)| (tx - col).abs() + (ty - row).abs())
                .min()
                .unwrap_or(i32::MAX)
        })
        .unwrap_or(snapshot.player.dir)
}

fn path_to_nearest_collectible(
    grid: &TileGrid,
    start: (i32, i32),
    danger: &HashSet<(i32, i32)>,
) -> Option<Direction> {
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::new();
    for dir in Direction::CARDINALS {
        let next = neighbor(grid, start, dir);
        if grid.can_move_to(next.0, next.1) && !danger.contains(&next) && visited.insert(next) {
            queue.push_back((next, dir));
        }
    }
    while let Some((tile, first)) = queue.pop_front() {
        if is_collectible(grid, tile) {
            return Some(first);
        }
        for dir in Direction::CARDINALS {
            let next = neighbor(grid, tile, dir);
            if grid.can_move_to(next.0, next.1) && !danger.contains(&next) && visited.insert(next)
            {
                queue.push_back((next, first));
            }
        }
    }
    None
}

fn is_collectible(grid: &TileGrid, tile: (i32, i32)) -> bool {
    matches!(
        grid.tile_at(tile.0, tile.1),
        TileKind::Pellet | TileKind::PowerPellet
    )
}

fn neighbor(grid: &TileGrid, tile: (i32, i32), dir: Direction) -> (i32, i32) {
    let (dx, dy) = dir.vector();
    let width = grid.width() as i32;
    ((tile.0 + dx).rem_euclid(width), tile.1 + dy)
}

fn collect_snapshot_anomalies(
    previous: &Snapshot,
    current: &Snapshot,
    width: f64,
    height: f64,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let positions = std::iter::once(("player", current.player.x, current.player.y)).chain(
        current
            .adversaries
            .iter()
            .map(|adversary| (adversary.name.as_str(), adversary.x, adversary.y)),
    );
    for (name, x, y) in positions {
        if !(-0.5..width + 0.5).contains(&x) || !(0.0..height).contains(&y) {
            anomalies.push(format!("{name} out of bounds: ({x:.2}, {y:.2})"));
        }
    }
    if current.remaining_collectibles > previous.remaining_collectibles {
        anomalies.push(format!(
            "remaining collectibles increased: {} -> {}",
            previous.remaining_collectibles, current.remaining_collectibles
        ));
    }
    if current.score < previous.score {
        anomalies.push(format!(
            "score decreased: {} -> {}",
            previous.score, current.score
        ));
    }
    let won_early = current.lifecycle == Lifecycle::Won && current.remaining_collectibles > 0;
    let stalled = current.lifecycle == Lifecycle::Playing && current.remaining_collectibles == 0;
    if won_early || stalled {
        anomalies.push(format!(
            "lifecycle {:?} with {} collectibles left",
            current.lifecycle, current.remaining_collectibles
        ));
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn outcome_key(lifecycle: Lifecycle) -> &'static str {
    match lifecycle {
        Lifecycle::Won => "won",
        Lifecycle::Lost => "lost",
        Lifecycle::Playing | Lifecycle::Idle => "timeout",
    }
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn default_match_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at: String,
    finished_at: String,
    runs: Vec<RunResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let run_count = runs.len();
    let mut outcome_counts = BTreeMap::new();
    for run in &runs {
        *outcome_counts.entry(run.outcome.clone()).or_insert(0) += 1;
    }
    let (average_score, average_ticks) = if run_count == 0 {
        (0, 0)
    } else {
        let total_score: u64 = runs.iter().map(|run| run.score as u64).sum();
        let total_ticks: u64 = runs.iter().map(|run| run.ticks).sum();
        (
            (total_score / run_count as u64) as u32,
            total_ticks / run_count as u64,
        )
    };
    RunSummary {
        match_id,
        started_at,
        finished_at,
        run_count,
        anomaly_count,
        average_score,
        average_ticks,
        outcome_counts,
        runs,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    run: Option<u32>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: Utc::now().timestamp_millis(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        run,
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
        .with_context(|| format!("failed to write summary to {}", path.display()))
}
