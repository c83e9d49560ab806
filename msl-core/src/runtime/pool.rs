//! Worker permits for parallel branches
//!
//! A bounded channel pre-filled with one token per worker. Acquiring never
//! blocks: when no token is left the caller runs the branch itself.

use crossbeam_channel::{bounded, Receiver, Sender};

#[derive(Debug)]
pub struct BranchPool {
    release: Sender<()>,
    acquire: Receiver<()>,
    capacity: usize,
}

impl BranchPool {
    /// Pool of `capacity` permits; 0 runs every branch on the caller
    pub fn new(capacity: usize) -> Self {
        let (release, acquire) = bounded(capacity);
        for _ in 0..capacity {
            let _ = release.try_send(());
        }
        Self {
            release,
            acquire,
            capacity,
        }
    }

    pub fn try_acquire(&self) -> Option<Permit> {
        self.acquire.try_recv().ok().map(|()| Permit {
            release: self.release.clone(),
        })
    }

    pub fn available(&self) -> usize {
        self.acquire.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Returned to the pool on drop
#[derive(Debug)]
pub struct Permit {
    release: Sender<()>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        let _ = self.release.try_send(());
    }
}
