//! Office Traffic - Entry Point
//!
//! Runs one session on a single-threaded tokio runtime and acts as the
//! placement collaborator: either a line-based console where the player
//! types placements, or a simple autopilot that routes employees itself.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use office_traffic::core::config::GameConfig;
use office_traffic::core::error::{Result, TrafficError};
use office_traffic::core::types::{EntityId, Location, SlotId};
use office_traffic::simulation::{
    spawn_session, Outcome, PlacementTarget, SessionController, SessionEvent, SessionHandle,
    SessionSnapshot,
};

/// Route arriving employees to the right room before they lose patience
#[derive(Parser, Debug)]
#[command(name = "office-traffic")]
#[command(about = "Timed triage simulation: send every employee to the right station in time")]
struct Args {
    /// TOML config file overriding the default office
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Random seed for roster draws
    #[arg(long)]
    seed: Option<u64>,

    /// Let the built-in autopilot place employees
    #[arg(long)]
    autopilot: bool,

    /// Autopilot reaction time in milliseconds
    #[arg(long, default_value_t = 500)]
    autopilot_delay_ms: u64,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("office_traffic=info")),
        )
        .init();

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!("Office Traffic starting (seed {})", seed);

    let controller = SessionController::with_seed(config, seed)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(controller, args))
}

async fn run(controller: SessionController, args: Args) -> Result<()> {
    let (handle, mut events, task) = spawn_session(controller);

    let printer_handle = handle.clone();
    let json = args.json;
    let autopilot = args.autopilot;
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event, json);
            if autopilot && matches!(event, SessionEvent::SessionEnded { .. }) {
                let _ = printer_handle.shutdown().await;
            }
        }
    });

    handle.start().await?;

    if args.autopilot {
        run_autopilot(&handle, Duration::from_millis(args.autopilot_delay_ms)).await;
    } else {
        print_help();
        run_console(&handle).await?;
    }

    let _ = handle.shutdown().await;
    let outcome = task
        .await
        .map_err(|e| TrafficError::Runtime(e.to_string()))??;
    drop(handle);
    let _ = printer.await;

    match outcome {
        Some(Outcome::Victory) => println!("\nFLOW OPTIMIZED - everyone found their space."),
        Some(Outcome::Defeat { .. }) => println!("\nGAME OVER - an employee waited too long."),
        None => println!("\nSession not finished."),
    }
    Ok(())
}

fn print_help() {
    println!("\n=== OFFICE TRAFFIC ===");
    println!("Commands:");
    println!("  place <id> <slot> / p  - Send an employee to a station slot");
    println!("  wait <id> / w          - Send an employee to the waiting room");
    println!("  status / s             - Show the office");
    println!("  restart / r            - Start over");
    println!("  stop                   - Stop the session");
    println!("  quit / q               - Exit");
    println!();
}

async fn run_console(handle: &SessionHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let result = match parts.as_slice() {
            [] => continue,
            ["quit" | "q"] => break,
            ["status" | "s"] => handle.snapshot().await.map(|s| print_snapshot(&s)),
            ["restart" | "r"] => handle.restart().await,
            ["stop"] => handle.stop().await,
            ["place" | "p", id, slot] => match id.parse::<u32>() {
                Ok(id) => handle
                    .place(EntityId(id), PlacementTarget::Slot(SlotId::new(*slot)))
                    .await
                    .map(|outcome| println!("{:?}", outcome)),
                Err(_) => {
                    println!("Usage: place <id> <slot>");
                    Ok(())
                }
            },
            ["wait" | "w", id] => match id.parse::<u32>() {
                Ok(id) => handle
                    .place(EntityId(id), PlacementTarget::Queue)
                    .await
                    .map(|outcome| println!("{:?}", outcome)),
                Err(_) => {
                    println!("Usage: wait <id>");
                    Ok(())
                }
            },
            _ => {
                println!("Unknown command. Available: place, wait, status, restart, stop, quit");
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(TrafficError::Runtime(msg)) => {
                tracing::warn!("{}", msg);
                break;
            }
            Err(e) => println!("Rejected: {}", e),
        }
    }
    Ok(())
}

/// Greedy router: serve whoever is most impatient, park the rest
async fn run_autopilot(handle: &SessionHandle, delay: Duration) {
    loop {
        tokio::time::sleep(delay).await;

        let Ok(snapshot) = handle.snapshot().await else {
            break;
        };
        if !snapshot.is_running {
            break;
        }

        for (id, target) in plan_placements(&snapshot) {
            match handle.place(id, target.clone()).await {
                Ok(outcome) => tracing::debug!("autopilot: {} -> {:?}: {:?}", id, target, outcome),
                Err(TrafficError::Runtime(_)) => return,
                Err(e) => tracing::debug!("autopilot: {} rejected: {}", id, e),
            }
        }
    }
}

fn plan_placements(snapshot: &SessionSnapshot) -> Vec<(EntityId, PlacementTarget)> {
    let mut waiting: Vec<_> = snapshot
        .entities
        .iter()
        .filter(|e| e.location != Location::InService)
        .collect();
    waiting.sort_by(|a, b| a.patience.total_cmp(&b.patience));

    let mut free: Vec<_> = snapshot.slots.iter().filter(|s| s.is_free()).collect();
    let mut plan = Vec::new();

    for employee in waiting {
        if let Some(pos) = free.iter().position(|s| s.accepted == employee.station_type) {
            let slot = free.swap_remove(pos);
            plan.push((employee.id, PlacementTarget::Slot(slot.id.clone())));
        } else if employee.location == Location::Holding {
            plan.push((employee.id, PlacementTarget::Queue));
        }
    }
    plan
}

fn format_countdown(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn print_event(event: &SessionEvent, json: bool) {
    if json {
        if event.is_gauge_update() {
            return;
        }
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!("Could not encode event: {}", e),
        }
        return;
    }

    match event {
        SessionEvent::EntityCreated {
            id,
            name,
            station_type,
        } => println!("+ {} {} needs {}", id, name, station_type),
        SessionEvent::EntityMoved { id, location, slot } => match slot {
            Some(slot) => println!("  {} -> {}", id, slot),
            None => println!("  {} -> {:?}", id, location),
        },
        SessionEvent::EntityRemoved { id, reason } => println!("- {} {:?}", id, reason),
        SessionEvent::ClockTicked { time_remaining, .. } if time_remaining % 10 == 0 => {
            println!("[{}]", format_countdown(*time_remaining))
        }
        SessionEvent::PhaseChanged { index, label } => println!("== Phase {}: {} ==", index, label),
        SessionEvent::Notice(notice) => println!("({:?}) {}", notice.severity, notice.message),
        SessionEvent::SessionEnded {
            outcome,
            completed,
            spawned,
        } => println!("Session over: {:?} ({} served, {} arrived)", outcome, completed, spawned),
        _ => {}
    }
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    println!(
        "\n--- {} | Phase {}: {} | {}/{} served ({:.0}%) ---",
        format_countdown(snapshot.time_remaining),
        snapshot.phase_index,
        snapshot.phase_label,
        snapshot.completed_count,
        snapshot.total_entities,
        snapshot.progress_percent
    );
    for e in &snapshot.entities {
        let detail = match (e.location, &e.slot, e.remaining_service_secs) {
            (Location::InService, Some(slot), Some(left)) => format!("in {} ({}s left)", slot, left),
            (location, _, _) => format!("{:?}, patience {:.0}%", location, e.patience),
        };
        let flag = if e.low_patience { " !" } else { "" };
        println!("  {} {} [{}] {}{}", e.id, e.name, e.station_type, detail, flag);
    }
    for slot in &snapshot.slots {
        let occupant = slot
            .occupied_by
            .map(|id| id.to_string())
            .unwrap_or_else(|| "free".into());
        println!("  slot {} ({}) - {}", slot.id, slot.accepted, occupant);
    }
}
