use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{JobSpec, TriggerClient};

/// In-process scheduler used by tests.
pub struct MemoryTriggerClient {
    available: bool,
    fail_create: bool,
    jobs: Mutex<Vec<JobSpec>>,
    notifications: Mutex<Vec<String>>,
    create_calls: AtomicUsize,
}

impl MemoryTriggerClient {
    pub fn new() -> Self {
        Self {
            available: true,
            fail_create: false,
            jobs: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::new()
        }
    }

    pub fn with_job(self, job: JobSpec) -> Self {
        self.jobs.lock().unwrap().push(job);
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn job_names(&self) -> Vec<String> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|j| j.name.clone())
            .collect()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl TriggerClient for MemoryTriggerClient {
    async fn available(&self) -> bool {
        self.available
    }

    async fn exists(&self, name: &str) -> bool {
        self.available && self.jobs.lock().unwrap().iter().any(|j| j.name == name)
    }

    async fn create(&self, job: &JobSpec) -> bool {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.available || self.fail_create {
            return false;
        }
        self.jobs.lock().unwrap().push(job.clone());
        true
    }

    async fn remove(&self, name_or_id: &str) -> bool {
        let mut jobs = self.jobs.lock().unwrap();
        let before = jobs.len();
        jobs.retain(|j| j.name != name_or_id);
        jobs.len() != before
    }

    async fn list(&self) -> String {
        self.job_names().join("\n")
    }

    async fn notify(&self, message: &str) -> bool {
        if !self.available {
            return false;
        }
        self.notifications.lock().unwrap().push(message.to_string());
        true
    }
}
