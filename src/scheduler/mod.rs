//! Cooperative task scheduler
//!
//! Runs on the console thread. Each [`tick`](TaskScheduler::tick) resumes every
//! queued continuation exactly once; a continuation that is still waiting asks
//! to be rescheduled and returns, which is the only suspension point. Nothing
//! here blocks, and nothing here has a timeout: work that may hang must be
//! bounded where it runs (see [`BackgroundOperation`](crate::remote::BackgroundOperation)).

pub mod watch;

use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, trace};

pub use watch::{OperationWatch, WatchEvent, WatchMachine};

/// What a continuation wants after being resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Reschedule,
    Finished,
}

/// A unit of deferred console-thread work.
pub trait Continuation<C> {
    fn resume(&mut self, context: &mut C) -> Step;

    /// Asks the continuation to skip its terminal action. Returns false when
    /// abandoning is not supported.
    fn abandon(&mut self) -> bool {
        false
    }
}

impl<C, F> Continuation<C> for F
where
    F: FnMut(&mut C) -> Step,
{
    fn resume(&mut self, context: &mut C) -> Step {
        self(context)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContinuationId(u64);

impl fmt::Display for ContinuationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub resumed: usize,
    pub finished: usize,
    pub pending: usize,
}

struct Scheduled<C> {
    id: ContinuationId,
    continuation: Box<dyn Continuation<C>>,
}

pub struct TaskScheduler<C> {
    queue: VecDeque<Scheduled<C>>,
    next_id: u64,
    ticks: u64,
}

impl<C> Default for TaskScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TaskScheduler<C> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            next_id: 1,
            ticks: 0,
        }
    }

    /// Queues a continuation; it is first resumed on the next tick.
    pub fn submit<K>(&mut self, continuation: K) -> ContinuationId
    where
        K: Continuation<C> + 'static,
    {
        let id = ContinuationId(self.next_id);
        self.next_id += 1;
        self.queue.push_back(Scheduled {
            id,
            continuation: Box::new(continuation),
        });
        debug!(continuation = %id, pending = self.queue.len(), "Continuation submitted");
        id
    }

    /// Resumes every continuation that was queued when the tick started.
    pub fn tick(&mut self, context: &mut C) -> TickReport {
        self.ticks += 1;
        let due = self.queue.len();
        let mut report = TickReport::default();

        for _ in 0..due {
            let Some(mut entry) = self.queue.pop_front() else {
                break;
            };
            report.resumed += 1;
            match entry.continuation.resume(context) {
                Step::Reschedule => self.queue.push_back(entry),
                Step::Finished => {
                    trace!(continuation = %entry.id, "Continuation finished");
                    report.finished += 1;
                }
            }
        }

        report.pending = self.queue.len();
        report
    }

    /// Marks a queued continuation as abandoned. It stays queued until it
    /// decides it is finished.
    pub fn abandon(&mut self, id: ContinuationId) -> bool {
        self.queue
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| entry.continuation.abandon())
            .unwrap_or(false)
    }

    pub fn contains(&self, id: ContinuationId) -> bool {
        self.queue.iter().any(|entry| entry.id == id)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        lines: Vec<String>,
    }

    fn countdown(name: &'static str, mut remaining: u32) -> impl FnMut(&mut Log) -> Step {
        move |log: &mut Log| {
            if remaining == 0 {
                log.lines.push(format!("{name} done"));
                Step::Finished
            } else {
                remaining -= 1;
                Step::Reschedule
            }
        }
    }

    #[test]
    fn continuations_run_once_per_tick_until_finished() {
        let mut scheduler = TaskScheduler::new();
        let mut log = Log::default();
        scheduler.submit(countdown("a", 2));
        scheduler.submit(countdown("b", 0));

        let first = scheduler.tick(&mut log);
        assert_eq!(first, TickReport { resumed: 2, finished: 1, pending: 1 });
        assert_eq!(log.lines, vec!["b done"]);

        scheduler.tick(&mut log);
        assert_eq!(log.lines, vec!["b done"]);

        let third = scheduler.tick(&mut log);
        assert_eq!(third.finished, 1);
        assert!(scheduler.is_idle());
        assert_eq!(log.lines, vec!["b done", "a done"]);

        // Nothing left to run; the terminal action never repeats.
        scheduler.tick(&mut log);
        assert_eq!(log.lines.len(), 2);
        assert_eq!(scheduler.ticks(), 4);
    }

    #[test]
    fn ids_are_unique_and_tracked() {
        let mut scheduler: TaskScheduler<Log> = TaskScheduler::new();
        let a = scheduler.submit(countdown("a", 1));
        let b = scheduler.submit(countdown("b", 1));
        assert_ne!(a, b);
        assert!(scheduler.contains(a));
        assert_eq!(scheduler.pending(), 2);
        // Plain closures do not support abandoning.
        assert!(!scheduler.abandon(a));
    }
}
