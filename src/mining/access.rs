use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::{MiningError, Result};
use super::types::Address;

/// Proof that the caller passed the admin check.
#[derive(Debug)]
pub struct AdminCap(());

/// Single fixed admin plus the pause switch.
#[derive(Debug, Clone)]
pub struct AccessGate {
    admin: Address,
    paused: bool,
}

impl AccessGate {
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            paused: false,
        }
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn authorize_admin(&self, caller: &Address) -> Result<AdminCap> {
        if *caller != self.admin {
            return Err(MiningError::NotAdmin);
        }
        Ok(AdminCap(()))
    }

    pub fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(MiningError::Paused);
        }
        Ok(())
    }

    /// Returns whether the flag actually changed.
    pub fn set_paused(&mut self, _cap: &AdminCap, paused: bool) -> bool {
        let changed = self.paused != paused;
        self.paused = paused;
        changed
    }
}

/// Re-entry flag for mutating entry points. `enter` hands out a guard that
/// clears the flag when dropped, on every exit path.
#[derive(Debug, Default)]
pub struct ReentrancyLock {
    entered: Arc<AtomicBool>,
}

#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ReentrancyGuard {
    entered: Arc<AtomicBool>,
}

impl ReentrancyLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<ReentrancyGuard> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MiningError::Reentrancy);
        }
        Ok(ReentrancyGuard {
            entered: Arc::clone(&self.entered),
        })
    }

    #[cfg(test)]
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}
