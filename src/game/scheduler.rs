use log::trace;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Repeating work the controller needs while a round is in a given phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    RoundTimer,
    Celebration,
}

impl TaskKind {
    pub fn period(&self) -> Duration {
        match self {
            TaskKind::RoundTimer => Duration::from_secs(1),
            TaskKind::Celebration => Duration::from_millis(500),
        }
    }
}

pub type TaskId = u64;

/// One delivery from a [`ThreadScheduler`] task, tagged with the task that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTick {
    pub id: TaskId,
    pub kind: TaskKind,
}

/// A live repeating task. Dropping the handle cancels the task.
pub struct TaskHandle {
    kind: TaskKind,
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TaskHandle {
    pub fn new<F>(kind: TaskKind, cancel: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            kind,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn cancel(self) {
        // Drop does the work
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            trace!(target: "scheduler", "Cancelling {:?}", self.kind);
            cancel();
        }
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaskHandle({:?})", self.kind)
    }
}

pub trait Scheduler {
    /// Starts delivering `kind` every `kind.period()` until the handle drops.
    fn start(&self, kind: TaskKind) -> TaskHandle;
}

/// Tracks live tasks without running anything; the host delivers ticks itself.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    live: Rc<RefCell<HashMap<TaskKind, usize>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self, kind: TaskKind) -> usize {
        self.live.borrow().get(&kind).copied().unwrap_or(0)
    }

    pub fn is_live(&self, kind: TaskKind) -> bool {
        self.live_count(kind) > 0
    }
}

impl Scheduler for ManualScheduler {
    fn start(&self, kind: TaskKind) -> TaskHandle {
        *self.live.borrow_mut().entry(kind).or_insert(0) += 1;
        let live = Rc::clone(&self.live);
        TaskHandle::new(kind, move || {
            if let Some(count) = live.borrow_mut().get_mut(&kind) {
                *count = count.saturating_sub(1);
            }
        })
    }
}

/// One sleeper thread per task, each sending a [`TaskTick`] down `sender`.
///
/// A thread can send once more after its handle drops, and that tick may still
/// be queued when the next task of the same kind starts. The host checks
/// `is_current` before acting on a tick.
#[derive(Clone)]
pub struct ThreadScheduler {
    sender: Sender<TaskTick>,
    live: Rc<RefCell<HashSet<TaskId>>>,
    next_id: Rc<Cell<TaskId>>,
}

impl ThreadScheduler {
    pub fn new(sender: Sender<TaskTick>) -> Self {
        Self {
            sender,
            live: Rc::new(RefCell::new(HashSet::new())),
            next_id: Rc::new(Cell::new(0)),
        }
    }

    /// False once the handle of the task that sent `tick` has been dropped.
    pub fn is_current(&self, tick: &TaskTick) -> bool {
        self.live.borrow().contains(&tick.id)
    }
}

impl Scheduler for ThreadScheduler {
    fn start(&self, kind: TaskKind) -> TaskHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.live.borrow_mut().insert(id);

        let stopped = Arc::new(AtomicBool::new(false));
        let thread_stopped = Arc::clone(&stopped);
        let sender = self.sender.clone();
        let period = kind.period();

        thread::spawn(move || loop {
            thread::sleep(period);
            if thread_stopped.load(Ordering::Acquire) {
                break;
            }
            if sender.send(TaskTick { id, kind }).is_err() {
                // receiver gone; the driver has shut down
                break;
            }
        });

        let live = Rc::clone(&self.live);
        TaskHandle::new(kind, move || {
            stopped.store(true, Ordering::Release);
            live.borrow_mut().remove(&id);
        })
    }
}
