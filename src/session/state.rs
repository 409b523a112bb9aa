//! Pure decision state machine.
//!
//! `transition` maps the current state and one line of operator input to the
//! next state and the single effect the session driver must carry out. No I/O
//! happens here.

use std::str::FromStr;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingScanConfirmation,
    /// Scan requested; the driver settles this into `AwaitingDecision` or
    /// `Closed` once the queue is built.
    Scanning,
    AwaitingDecision,
    Closed,
}

/// Propagation policies shown in the menu but not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedPolicy {
    NoAction,
    SetNull,
    SetDefault,
}

impl ReservedPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            ReservedPolicy::NoAction => "no action",
            ReservedPolicy::SetNull => "set null",
            ReservedPolicy::SetDefault => "set default",
        }
    }
}

/// A recognised menu key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
    Cascade,
    Skip,
    Reserved(ReservedPolicy),
    Help,
    Quit,
}

impl FromStr for Choice {
    type Err = ();

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "y" => Ok(Choice::Yes),
            "n" => Ok(Choice::No),
            "c" => Ok(Choice::Cascade),
            "s" => Ok(Choice::Skip),
            "na" => Ok(Choice::Reserved(ReservedPolicy::NoAction)),
            "sn" => Ok(Choice::Reserved(ReservedPolicy::SetNull)),
            "st" => Ok(Choice::Reserved(ReservedPolicy::SetDefault)),
            "?" => Ok(Choice::Help),
            "q" => Ok(Choice::Quit),
            _ => Err(()),
        }
    }
}

/// Work the driver performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Introspect, dedupe and fill the queue.
    Scan,
    /// Install the trigger for the head relation, then dequeue it.
    CreateTrigger,
    /// Dequeue the head relation untouched.
    SkipHead,
    /// Warn that a reserved policy does nothing.
    Reserved(ReservedPolicy),
    PrintMenu,
    /// Input not valid in this state; nothing changes.
    Reject(String),
    Close,
}

/// Next state and effect for one line of input.
pub fn transition(state: SessionState, input: &str) -> (SessionState, Effect) {
    use SessionState::*;

    let choice = match input.parse::<Choice>() {
        Ok(choice) => choice,
        Err(()) => return (state, Effect::Reject(input.trim().to_string())),
    };

    match (state, choice) {
        (AwaitingScanConfirmation, Choice::Yes) => (Scanning, Effect::Scan),
        (AwaitingScanConfirmation, Choice::No) => (Closed, Effect::Close),
        (AwaitingDecision, Choice::Cascade) => (AwaitingDecision, Effect::CreateTrigger),
        (AwaitingDecision, Choice::Skip) => (AwaitingDecision, Effect::SkipHead),
        (AwaitingDecision, Choice::Reserved(policy)) => (AwaitingDecision, Effect::Reserved(policy)),
        (AwaitingDecision, Choice::Help) => (AwaitingDecision, Effect::PrintMenu),
        (AwaitingDecision, Choice::Quit) => (Closed, Effect::Close),
        (state, _) => (state, Effect::Reject(input.trim().to_string())),
    }
}
