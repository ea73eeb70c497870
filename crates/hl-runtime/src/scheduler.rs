use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TaskId,
    pub at_ms: u64,
    pub payload: T,
}

#[derive(Debug)]
struct Scheduled<T> {
    deadline_ms: u64,
    payload: T,
}

/// Virtual clock with cancellable one-shot tasks.
///
/// Time only moves through [`Scheduler::advance`]; due tasks come back in
/// deadline order, ties broken by scheduling order.
#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: u64,
    tasks: BTreeMap<TaskId, Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            tasks: BTreeMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule(&mut self, delay_ms: u64, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.insert(
            id,
            Scheduled {
                deadline_ms: self.now_ms.saturating_add(delay_ms),
                payload,
            },
        );
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> Option<T> {
        self.tasks.remove(&id).map(|task| task.payload)
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.tasks.values().map(|task| task.deadline_ms).min()
    }

    /// Moves the clock forward by `by_ms` and removes every task that came due.
    pub fn advance(&mut self, by_ms: u64) -> Vec<Fired<T>> {
        let target = self.now_ms.saturating_add(by_ms);
        let mut fired = Vec::new();
        while let Some(id) = self.earliest_due(target) {
            if let Some(task) = self.tasks.remove(&id) {
                self.now_ms = task.deadline_ms;
                fired.push(Fired {
                    id,
                    at_ms: task.deadline_ms,
                    payload: task.payload,
                });
            }
        }
        self.now_ms = target;
        fired
    }

    fn earliest_due(&self, target: u64) -> Option<TaskId> {
        self.tasks
            .iter()
            .filter(|(_, task)| task.deadline_ms <= target)
            .min_by_key(|(id, task)| (task.deadline_ms, **id))
            .map(|(id, _)| *id)
    }
}
