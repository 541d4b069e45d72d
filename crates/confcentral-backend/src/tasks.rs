//! Fire-and-forget background jobs.
//!
//! A [`TaskQueue`] accepts [`Task`]s and hands back a [`JobHandle`] that the
//! caller may drop. The in-process queue feeds a [`TaskWorker`] which runs at
//! most `concurrency` jobs at once, retries failures with exponential backoff
//! and dead-letters a job once its attempts are used up.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;

use confcentral::data::{ConfirmationEmailParams, SpeakerAnnouncementParams};
use confcentral::errors::ServiceError;
use confcentral::log;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    SendConfirmationEmail(ConfirmationEmailParams),
    SetSpeakerAnnouncement(SpeakerAnnouncementParams),
}

impl Task {
    /// The internal endpoint that runs this task when it is delivered over HTTP.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Task::SendConfirmationEmail(_) => "/tasks/send_confirmation_email",
            Task::SetSpeakerAnnouncement(_) => "/tasks/set_speaker_announcement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { attempts: u32 },
    DeadLettered { attempts: u32, error: String },
    /// The worker went away before the job finished.
    Dropped,
}

pub type JobId = u64;

#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    outcome: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Waits for the job to finish.
    pub async fn outcome(self) -> JobOutcome {
        self.outcome.await.unwrap_or(JobOutcome::Dropped)
    }
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, task: Task) -> Result<JobHandle, ServiceError>;
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> Result<(), ServiceError>;
}

struct Job {
    id: JobId,
    task: Task,
    done: oneshot::Sender<JobOutcome>,
}

pub struct TaskReceiver(mpsc::UnboundedReceiver<Job>);

pub struct InProcessTaskQueue {
    sender: mpsc::UnboundedSender<Job>,
    next_id: AtomicU64,
}

impl InProcessTaskQueue {
    pub fn new() -> (Self, TaskReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue = Self {
            sender,
            next_id: AtomicU64::new(1),
        };
        (queue, TaskReceiver(receiver))
    }
}

#[async_trait]
impl TaskQueue for InProcessTaskQueue {
    async fn enqueue(&self, task: Task) -> Result<JobHandle, ServiceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (done, outcome) = oneshot::channel();
        log::debug!("Enqueueing job {id} for {}", task.endpoint());

        self.sender
            .send(Job { id, task, done })
            .map_err(|_| ServiceError::Unavailable("task queue is closed".to_string()))?;

        Ok(JobHandle { id, outcome })
    }
}

/// Exponential backoff between attempts of one job.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Cap for exponential backoff
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay before retrying after `attempt` (1-based) failed:
    /// `initial_delay * multiplier^(attempt - 1)`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);

        if !delay_ms.is_finite() || delay_ms >= self.max_delay.as_millis() as f64 {
            self.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        }
    }
}

pub struct TaskWorker {
    receiver: TaskReceiver,
    handler: Arc<dyn TaskHandler>,
    policy: RetryPolicy,
    concurrency: usize,
}

impl TaskWorker {
    pub fn new(
        receiver: TaskReceiver,
        handler: Arc<dyn TaskHandler>,
        policy: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            receiver,
            handler,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs the worker until every queue handle has been dropped.
    pub fn spawn(self) -> JoinHandle<()> {
        let TaskWorker {
            mut receiver,
            handler,
            policy,
            concurrency,
        } = self;
        let permits = Arc::new(Semaphore::new(concurrency));

        tokio::spawn(async move {
            while let Some(job) = receiver.0.recv().await {
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    break;
                };
                let handler = handler.clone();
                let policy = policy.clone();
                tokio::spawn(async move {
                    run_job(handler.as_ref(), &policy, job).await;
                    drop(permit);
                });
            }
            log::info!("Task queue closed, worker stopping");
        })
    }
}

async fn run_job(handler: &dyn TaskHandler, policy: &RetryPolicy, job: Job) {
    let Job { id, task, done } = job;
    let mut attempt = 1;

    let outcome = loop {
        match handler.handle(&task).await {
            Ok(()) => {
                log::debug!("Job {id} ({}) completed after {attempt} attempt(s)", task.endpoint());
                break JobOutcome::Completed { attempts: attempt };
            }
            Err(error) if attempt >= policy.max_attempts => {
                log::error!(
                    "Job {id} ({}) dead-lettered after {attempt} attempt(s): {error}; task: {task:?}",
                    task.endpoint()
                );
                break JobOutcome::DeadLettered {
                    attempts: attempt,
                    error: error.to_string(),
                };
            }
            Err(error) => {
                let delay = policy.delay_for_attempt(attempt);
                log::warn!(
                    "Job {id} ({}) failed attempt {attempt}: {error}; retrying in {delay:?}",
                    task.endpoint()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    };

    // Nobody listening is fine
    let _ = done.send(outcome);
}

/// Queue that records tasks instead of running them.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingQueue {
    tasks: std::sync::Mutex<Vec<Task>>,
    closed: bool,
}

#[cfg(test)]
impl RecordingQueue {
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl TaskQueue for RecordingQueue {
    async fn enqueue(&self, task: Task) -> Result<JobHandle, ServiceError> {
        if self.closed {
            return Err(ServiceError::Unavailable("task queue is closed".to_string()));
        }
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(task);
        let (_done, outcome) = oneshot::channel();
        Ok(JobHandle {
            id: tasks.len() as JobId,
            outcome,
        })
    }
}
