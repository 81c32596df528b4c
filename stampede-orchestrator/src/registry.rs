//! Job registry
//!
//! In-memory map from job id to job record, shared by the submission and
//! polling handlers. Each job sits behind its own lock: the supervising task
//! is the only writer, pollers take short read locks and clone.

use parking_lot::RwLock;
use stampede_core::domain::job::Job;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Handle to one job record
pub type SharedJob = Arc<RwLock<Job>>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job {0} was never reserved")]
    NotReserved(Uuid),

    #[error("job {0} is already registered")]
    AlreadyRegistered(Uuid),
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, SharedJob>,
    /// Every id ever handed out, registered or not
    issued: HashSet<Uuid>,
}

/// Registry of all jobs submitted during this process lifetime
#[derive(Default)]
pub struct JobRegistry {
    inner: RwLock<Inner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out an id that has never been issued before
    pub fn reserve_id(&self) -> Uuid {
        let mut inner = self.inner.write();
        loop {
            let id = Uuid::new_v4();
            if inner.issued.insert(id) {
                return id;
            }
        }
    }

    /// Registers a job under its previously reserved id
    pub fn insert(&self, job: Job) -> Result<SharedJob, RegistryError> {
        let id = job.id;
        let mut inner = self.inner.write();

        if !inner.issued.contains(&id) {
            return Err(RegistryError::NotReserved(id));
        }
        if inner.jobs.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }

        let shared = Arc::new(RwLock::new(job));
        inner.jobs.insert(id, Arc::clone(&shared));
        Ok(shared)
    }

    /// Consistent copy of a job's current fields
    pub fn snapshot(&self, id: Uuid) -> Option<Job> {
        // Release the map lock before touching the job lock.
        let shared = self.inner.read().jobs.get(&id).cloned()?;
        let job = shared.read().clone();
        Some(job)
    }

    pub fn len(&self) -> usize {
        self.inner.read().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.inner.read().jobs.keys().copied().collect()
    }
}
