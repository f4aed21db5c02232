//! Units of work executed by a dispatch queue.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

type Job = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// A queued callable plus the metadata listeners observe.
pub struct Task {
    id: Uuid,
    label: String,
    enqueued_at: DateTime<Utc>,
    job: Job,
}

impl Task {
    pub fn new<F>(label: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            enqueued_at: Utc::now(),
            job: Box::new(job),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Time spent waiting since the task was created.
    pub fn waited(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.enqueued_at)
    }

    pub(crate) fn run(self) -> anyhow::Result<()> {
        (self.job)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("enqueued_at", &self.enqueued_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_get_unique_ids() {
        let a = Task::new("a", || Ok(()));
        let b = Task::new("b", || Ok(()));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.label(), "a");
    }

    #[test]
    fn run_returns_job_result() {
        let task = Task::new("failing", || Err(anyhow::anyhow!("boom")));
        let err = task.run().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
