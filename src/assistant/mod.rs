//! Assistant lifecycle: Idle → Listening → Processing → Speaking → Idle, with
//! Error reachable from anywhere and recovering after a cooldown.

mod machine;
mod trigger;

pub use machine::{
    Action, AssistantState, AssistantStateMachine, Feedback, MachineConfig, StateChange,
    StateSnapshot,
};
pub use trigger::{ButtonPress, ProcessingOutcome, RemoteCommand, Trigger};
