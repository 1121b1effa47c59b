//! Async runtime - drives a session controller from tokio timers
//!
//! Three timed activities share one task: the simulation loop interval, the
//! one-second countdown and the self-rearming arrival sleep. Commands from
//! collaborators arrive on a channel and are handled in the same `select!`,
//! so a placement is always applied between two loop passes, never during
//! one. Restarting re-arms every timer under a new [`Generation`].

use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};

use crate::core::error::{Result, TrafficError};
use crate::core::types::{EntityId, Generation};
use crate::simulation::controller::SessionController;
use crate::simulation::events::{Outcome, PlacementOutcome, PlacementTarget, SessionEvent};
use crate::simulation::state::SessionSnapshot;

/// Countdown granularity
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

const COMMAND_BUFFER: usize = 32;

/// Requests a collaborator can send to a running session
#[derive(Debug)]
pub enum Command {
    /// Start a new session, replacing any running one
    Start,
    Restart,
    Stop,
    Place {
        entity: EntityId,
        target: PlacementTarget,
        reply: oneshot::Sender<Result<PlacementOutcome>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Leave the event loop
    Shutdown,
}

/// Cloneable sender side used by collaborators
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

pub fn command_channel() -> (SessionHandle, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    (SessionHandle { commands: tx }, rx)
}

fn closed() -> TrafficError {
    TrafficError::Runtime("session loop has shut down".into())
}

impl SessionHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await.map_err(|_| closed())
    }

    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn restart(&self) -> Result<()> {
        self.send(Command::Restart).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    pub async fn place(&self, entity: EntityId, target: PlacementTarget) -> Result<PlacementOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Place {
            entity,
            target,
            reply,
        })
        .await?;
        rx.await.map_err(|_| closed())?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| closed())
    }
}

/// Timers armed for one generation
struct Timers {
    generation: Generation,
    simulation: Interval,
    clock: Interval,
    arrival: Pin<Box<Sleep>>,
    arrival_armed: bool,
}

impl Timers {
    fn idle() -> Self {
        Self::arm(Generation::default(), Duration::from_millis(100), None)
    }

    fn arm(generation: Generation, loop_interval: Duration, first_arrival: Option<Duration>) -> Self {
        let now = Instant::now();

        let mut simulation = time::interval_at(now + loop_interval, loop_interval);
        simulation.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut clock = time::interval_at(now + CLOCK_TICK, CLOCK_TICK);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            generation,
            simulation,
            clock,
            arrival: Box::pin(time::sleep(first_arrival.unwrap_or_default())),
            arrival_armed: first_arrival.is_some(),
        }
    }

    fn rearm_arrival(&mut self, delay: Option<Duration>) {
        match delay {
            Some(delay) => {
                self.arrival.as_mut().reset(Instant::now() + delay);
                self.arrival_armed = true;
            }
            None => self.arrival_armed = false,
        }
    }
}

fn begin(controller: &mut SessionController) -> Timers {
    let generation = controller.restart();
    Timers::arm(
        generation,
        controller.config().update_interval(),
        controller.next_arrival_delay(),
    )
}

fn flush(controller: &mut SessionController, events: &mpsc::UnboundedSender<SessionEvent>) {
    for event in controller.drain_events() {
        // A dropped receiver only means nobody is watching
        let _ = events.send(event);
    }
}

/// Run the event loop until `Shutdown` or until every handle is dropped
///
/// Returns the outcome of the last finished session, if any.
pub async fn run_session(
    mut controller: SessionController,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> Result<Option<Outcome>> {
    let mut timers = Timers::idle();

    loop {
        let running = controller.is_running() && controller.generation() == timers.generation;

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Start | Command::Restart => {
                        timers = begin(&mut controller);
                    }
                    Command::Stop => {
                        controller.stop();
                    }
                    Command::Place { entity, target, reply } => {
                        let now = Instant::now().into_std();
                        let _ = reply.send(controller.place_entity(entity, target, now));
                    }
                    Command::Snapshot { reply } => {
                        let _ = reply.send(controller.snapshot(Instant::now().into_std()));
                    }
                    Command::Shutdown => break,
                }
            }
            _ = timers.simulation.tick(), if running => {
                controller.on_simulation_tick(timers.generation, Instant::now().into_std());
            }
            _ = timers.clock.tick(), if running => {
                controller.on_clock_tick(timers.generation);
            }
            _ = timers.arrival.as_mut(), if running && timers.arrival_armed => {
                let next = controller.on_arrival(timers.generation);
                timers.rearm_arrival(next);
            }
        }

        flush(&mut controller, &events);
    }

    tracing::debug!("Session loop shut down");
    Ok(controller.outcome().cloned())
}

/// Spawn the event loop on the current runtime
pub fn spawn_session(
    controller: SessionController,
) -> (
    SessionHandle,
    mpsc::UnboundedReceiver<SessionEvent>,
    tokio::task::JoinHandle<Result<Option<Outcome>>>,
) {
    let (handle, commands) = command_channel();
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_session(controller, commands, tx));
    (handle, rx, task)
}
