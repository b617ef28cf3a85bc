// Continuation watching one background operation. Its lifecycle is a small
// state machine: waiting -> completed, or waiting -> abandoned -> discarded.
// The terminal action runs only on the way into `completed`.

use statig::prelude::*;
use tracing::debug;

use crate::remote::{OperationHandle, OperationResult, OperationState};
use crate::scheduler::{Continuation, Step};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Poll(OperationState),
    Abandon,
}

#[derive(Debug, Default)]
pub struct WatchMachine {
    pub polls: u64,
    pub outcome: Option<OperationResult>,
    pub abandoned: bool,
    pub discarded: bool,
}

impl WatchMachine {
    pub fn is_settled(&self) -> bool {
        self.outcome.is_some() || self.discarded
    }
}

#[state_machine(initial = "State::waiting()")]
impl WatchMachine {
    #[state]
    fn waiting(&mut self, event: &WatchEvent) -> Outcome<State> {
        match event {
            WatchEvent::Poll(OperationState::Running) => {
                self.polls += 1;
                Handled
            }
            WatchEvent::Poll(OperationState::Completed(result)) => {
                self.polls += 1;
                self.outcome = Some(result.clone());
                Transition(State::completed())
            }
            WatchEvent::Abandon => {
                self.abandoned = true;
                Transition(State::abandoned())
            }
        }
    }

    #[state]
    fn abandoned(&mut self, event: &WatchEvent) -> Outcome<State> {
        match event {
            WatchEvent::Poll(OperationState::Running) => {
                self.polls += 1;
                Handled
            }
            WatchEvent::Poll(OperationState::Completed(_)) => {
                self.polls += 1;
                self.discarded = true;
                Transition(State::discarded())
            }
            WatchEvent::Abandon => Handled,
        }
    }

    #[state]
    fn completed(&mut self, event: &WatchEvent) -> Outcome<State> {
        debug!(?event, polls = self.polls, "Event after completion ignored");
        Handled
    }

    #[state]
    fn discarded(&mut self, event: &WatchEvent) -> Outcome<State> {
        debug!(?event, polls = self.polls, "Event after discard ignored");
        Handled
    }
}

type TerminalAction<C> = Box<dyn FnOnce(&mut C, &OperationResult)>;

/// Polls an [`OperationHandle`] every tick and runs `on_complete` exactly
/// once when the operation finishes, unless the watch was abandoned first.
pub struct OperationWatch<C> {
    handle: OperationHandle,
    machine: StateMachine<WatchMachine>,
    on_complete: Option<TerminalAction<C>>,
}

impl<C> OperationWatch<C> {
    pub fn new<F>(handle: OperationHandle, on_complete: F) -> Self
    where
        F: FnOnce(&mut C, &OperationResult) + 'static,
    {
        Self {
            handle,
            machine: WatchMachine::default().state_machine(),
            on_complete: Some(Box::new(on_complete)),
        }
    }

    pub fn handle(&self) -> &OperationHandle {
        &self.handle
    }

    pub fn polls(&self) -> u64 {
        self.machine.inner().polls
    }
}

impl<C> Continuation<C> for OperationWatch<C> {
    fn resume(&mut self, context: &mut C) -> Step {
        let state = self.handle.poll().clone();
        self.machine.handle(&WatchEvent::Poll(state));

        let watch = self.machine.inner();
        if !watch.is_settled() {
            return Step::Reschedule;
        }
        if let Some(result) = watch.outcome.clone() {
            if let Some(action) = self.on_complete.take() {
                action(context, &result);
            }
        } else {
            debug!(
                operation = %self.handle.label(),
                "Abandoned operation finished, outcome dropped"
            );
        }
        Step::Finished
    }

    fn abandon(&mut self) -> bool {
        self.machine.handle(&WatchEvent::Abandon);
        self.machine.inner().abandoned
    }
}
