//! Services
//!
//! Slot planning, launch staggering, the timer wheel, scrolling and the board
//! controller with its async runtime.

pub mod board;
pub mod planner;
pub mod runtime;
pub mod scheduler;
pub mod scroll;
pub mod stagger;

pub use board::{Board, BoardSnapshot, BoardState, SlotSnapshot};
pub use planner::{plan_slots, plan_with_count};
pub use runtime::{BoardCommand, BoardHandle, BoardReport, BoardRuntime};
pub use scheduler::{TimerEvent, TimerKey, TimerWheel};
pub use scroll::ScrollDriver;
pub use stagger::{StaggerLauncher, StaggerPlan};
