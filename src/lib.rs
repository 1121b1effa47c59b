//! Office Traffic - timed triage simulation
//!
//! Employees arrive at reception, lose patience while unplaced and must be
//! routed to the work station that matches their task before the countdown
//! runs out. This crate is the simulation engine; drawing, drag gestures and
//! menus belong to whoever embeds it.

pub mod core;
pub mod entity;
pub mod simulation;
