//! Scheduling primitives for deferred drain steps.
//!
//! A [`Scheduler`] runs a callback later, exactly once, without blocking the
//! caller. Three hosts are provided: an immediate-callback queue that the
//! host pumps ([`TaskQueue`]), a per-frame queue ([`FrameScheduler`]), and a
//! deferred timer on a tokio `LocalSet` ([`TimerScheduler`]).

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce()>;

/// Runs a task asynchronously, at most once.
pub trait Scheduler {
    /// Queue `task`. `delay` is a hint; hosts without timers ignore it.
    fn schedule(&self, task: Task, delay: Duration);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, task: Task, delay: Duration) {
        (**self).schedule(task, delay)
    }
}

// ---------------------------------------------------------------------------
// TaskQueue
// ---------------------------------------------------------------------------

/// Immediate-callback queue. Tasks run in FIFO order when the host calls
/// [`run_next`](TaskQueue::run_next) or
/// [`run_until_idle`](TaskQueue::run_until_idle).
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

thread_local! {
    static SHARED: TaskQueue = TaskQueue::new();
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue shared by everything on this thread.
    ///
    /// It is the default drain method of every group configuration.
    pub fn shared() -> Self {
        SHARED.with(Clone::clone)
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Run the oldest task. Returns `false` if there was none.
    pub fn run_next(&self) -> bool {
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks, including ones queued along the way, until none remain.
    ///
    /// Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Drop every queued task without running it.
    pub fn clear(&self) {
        self.tasks.borrow_mut().clear();
    }
}

impl Scheduler for TaskQueue {
    fn schedule(&self, task: Task, _delay: Duration) {
        self.tasks.borrow_mut().push_back(task);
        trace!(queued = self.len(), "task scheduled");
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue").field("queued", &self.len()).finish()
    }
}

// ---------------------------------------------------------------------------
// FrameScheduler
// ---------------------------------------------------------------------------

/// Per-frame callbacks: each [`tick`](FrameScheduler::tick) runs the tasks
/// queued before it started. Tasks queued while a frame runs wait for the
/// next one.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    pending: Rc<RefCell<Vec<Task>>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Run one frame. Returns the number of tasks run.
    pub fn tick(&self) -> usize {
        let frame = std::mem::take(&mut *self.pending.borrow_mut());
        let ran = frame.len();
        for task in frame {
            task();
        }
        ran
    }
}

impl Scheduler for FrameScheduler {
    fn schedule(&self, task: Task, _delay: Duration) {
        self.pending.borrow_mut().push(task);
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler").field("queued", &self.len()).finish()
    }
}

// ---------------------------------------------------------------------------
// TimerScheduler
// ---------------------------------------------------------------------------

/// Deferred timer on the current tokio `LocalSet`.
///
/// Tasks are spawned with [`tokio::task::spawn_local`], so scheduling must
/// happen inside [`tokio::task::LocalSet::run_until`] (or a future driven by
/// a `LocalSet`); outside one, `spawn_local` panics.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimerScheduler;

impl Scheduler for TimerScheduler {
    fn schedule(&self, task: Task, delay: Duration) {
        tokio::task::spawn_local(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            task();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<usize>>, impl Fn() -> Task) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        (count, move || -> Task {
            let c = Rc::clone(&handle);
            Box::new(move || c.set(c.get() + 1))
        })
    }

    #[test]
    fn task_queue_runs_in_order_and_drains_follow_ups() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let (l1, l2, q2) = (Rc::clone(&log), Rc::clone(&log), queue.clone());
        queue.schedule(
            Box::new(move || {
                l1.borrow_mut().push(1);
                let l3 = Rc::clone(&l1);
                q2.schedule(Box::new(move || l3.borrow_mut().push(3)), Duration::ZERO);
            }),
            Duration::ZERO,
        );
        queue.schedule(Box::new(move || l2.borrow_mut().push(2)), Duration::ZERO);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        assert!(!queue.run_next());
    }

    #[test]
    fn shared_queue_is_per_thread_singleton() {
        let a = TaskQueue::shared();
        let b = TaskQueue::shared();
        a.clear();
        let (count, task) = counter();
        a.schedule(task(), Duration::ZERO);
        assert_eq!(b.len(), 1);
        b.run_until_idle();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn frame_scheduler_defers_tasks_queued_during_a_frame() {
        let frames = FrameScheduler::new();
        let (count, task) = counter();
        let inner = frames.clone();
        let follow_up = task();
        frames.schedule(
            Box::new(move || inner.schedule(follow_up, Duration::ZERO)),
            Duration::ZERO,
        );
        frames.schedule(task(), Duration::ZERO);

        assert_eq!(frames.tick(), 2);
        assert_eq!(count.get(), 1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames.tick(), 1);
        assert_eq!(count.get(), 2);
        assert_eq!(frames.tick(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn timer_scheduler_runs_on_local_set() {
        let local = tokio::task::LocalSet::new();
        let (count, task) = counter();
        local
            .run_until(async {
                TimerScheduler.schedule(task(), Duration::from_millis(5));
                TimerScheduler.schedule(task(), Duration::ZERO);
                assert_eq!(count.get(), 0);
                tokio::time::sleep(Duration::from_millis(50)).await;
            })
            .await;
        assert_eq!(count.get(), 2);
    }
}
