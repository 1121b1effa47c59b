pub mod clock;
pub mod controller;
pub mod events;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod tick;

pub use clock::{ClockTick, SessionClock};
pub use controller::SessionController;
pub use events::{
    DefeatCause, Notice, NoticeKind, Outcome, PlacementOutcome, PlacementTarget, RemovalReason,
    SessionEvent, Severity, TimerUrgency,
};
pub use runtime::{command_channel, run_session, spawn_session, Command, SessionHandle};
pub use scheduler::{ArrivalAttempt, ArrivalScheduler};
pub use state::{SessionSnapshot, SessionState, StationSlot};
pub use tick::{run_simulation_tick, TickReport};
