use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::error::{DbError, DbResult};
use crate::heap_page::{HeapPageId, Permission};
use crate::transaction::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Lock {
    tid: TransactionId,
    exclusive: bool,
}

#[derive(Default)]
struct State {
    page_locks: HashMap<HeapPageId, HashSet<Lock>>,
    held_by: HashMap<TransactionId, HashSet<HeapPageId>>,
}

/// Page-granularity strict 2PL lock table. There is no WAIT-DIE or
/// graph-based deadlock detection: a request that cannot be granted within
/// a randomized timeout simply aborts its transaction, which is sufficient
/// to break any deadlock cycle eventually.
pub struct LockManager {
    state: Mutex<State>,
    released: Condvar,
}

impl LockManager {
    pub fn new() -> Self {
        LockManager {
            state: Mutex::new(State::default()),
            released: Condvar::new(),
        }
    }

    // Acquires a lock on the specified page for the specified transaction,
    // blocking until it can be granted or a random timeout elapses.
    pub fn acquire_lock(&self, tid: TransactionId, pid: HeapPageId, exclusive: bool) -> DbResult<()> {
        let timeout_ms = rand::thread_rng().gen_range(0, 2000);
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        let mut state = self.state.lock().unwrap();
        loop {
            if Self::can_grant(&state, tid, pid, exclusive) {
                Self::grant(&mut state, tid, pid, exclusive);
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DbError::TransactionAborted(tid));
            }

            let (guard, timeout_result) = self.released.wait_timeout(state, deadline - now).unwrap();
            state = guard;
            if timeout_result.timed_out() && !Self::can_grant(&state, tid, pid, exclusive) {
                return Err(DbError::TransactionAborted(tid));
            }
        }
    }

    fn can_grant(state: &State, tid: TransactionId, pid: HeapPageId, exclusive: bool) -> bool {
        match state.page_locks.get(&pid) {
            None => true,
            Some(locks) => {
                if locks.len() == 1 && locks.iter().next().unwrap().tid == tid {
                    return true;
                }
                if exclusive {
                    locks.is_empty()
                } else {
                    !locks.iter().any(|l| l.exclusive)
                }
            }
        }
    }

    fn grant(state: &mut State, tid: TransactionId, pid: HeapPageId, exclusive: bool) {
        let locks = state.page_locks.entry(pid).or_insert_with(HashSet::new);
        if let Some(existing) = locks.iter().find(|l| l.tid == tid).copied() {
            if exclusive && !existing.exclusive {
                locks.remove(&existing);
                locks.insert(Lock { tid, exclusive: true });
            }
        } else {
            locks.insert(Lock { tid, exclusive });
        }
        state.held_by.entry(tid).or_insert_with(HashSet::new).insert(pid);
    }

    // Releases a single page lock held by `tid`, leaving its other locks
    // untouched. Strict 2PL means callers normally release everything at
    // once via `release_locks`; this exists for the cases (and tests) that
    // need to drop one page early.
    pub fn release_lock(&self, tid: TransactionId, pid: HeapPageId) {
        let mut state = self.state.lock().unwrap();
        if let Some(locks) = state.page_locks.get_mut(&pid) {
            locks.retain(|l| l.tid != tid);
            if locks.is_empty() {
                state.page_locks.remove(&pid);
            }
        }
        if let Some(pids) = state.held_by.get_mut(&tid) {
            pids.remove(&pid);
            if pids.is_empty() {
                state.held_by.remove(&tid);
            }
        }
        drop(state);
        self.released.notify_all();
    }

    // Releases all locks associated with the specified transaction.
    pub fn release_locks(&self, tid: TransactionId) {
        let mut state = self.state.lock().unwrap();
        if let Some(pids) = state.held_by.remove(&tid) {
            for pid in pids {
                if let Some(locks) = state.page_locks.get_mut(&pid) {
                    locks.retain(|l| l.tid != tid);
                    if locks.is_empty() {
                        state.page_locks.remove(&pid);
                    }
                }
            }
        }
        drop(state);
        self.released.notify_all();
    }

    // Checks if the specified transaction has a lock on the specified page.
    pub fn holds_lock(&self, tid: TransactionId, pid: HeapPageId) -> Option<Permission> {
        let state = self.state.lock().unwrap();
        state.page_locks.get(&pid).and_then(|locks| {
            locks.iter().find(|l| l.tid == tid).map(|l| {
                if l.exclusive {
                    Permission::Write
                } else {
                    Permission::Read
                }
            })
        })
    }

    // Gets the set of pages locked by the specified transaction.
    pub fn get_locked_pages(&self, tid: TransactionId) -> HashSet<HeapPageId> {
        let state = self.state.lock().unwrap();
        state.held_by.get(&tid).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_locks_do_not_conflict() {
        let lm = LockManager::new();
        let pid = HeapPageId::new(1, 0);
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        lm.acquire_lock(t1, pid, false).unwrap();
        lm.acquire_lock(t2, pid, false).unwrap();
        assert_eq!(lm.holds_lock(t1, pid), Some(Permission::Read));
        assert_eq!(lm.holds_lock(t2, pid), Some(Permission::Read));
    }

    #[test]
    fn same_transaction_can_upgrade_its_own_lock() {
        let lm = LockManager::new();
        let pid = HeapPageId::new(1, 0);
        let t1 = TransactionId::new();
        lm.acquire_lock(t1, pid, false).unwrap();
        lm.acquire_lock(t1, pid, true).unwrap();
        assert_eq!(lm.holds_lock(t1, pid), Some(Permission::Write));
    }

    #[test]
    fn conflicting_exclusive_request_eventually_aborts() {
        let lm = LockManager::new();
        let pid = HeapPageId::new(1, 0);
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        lm.acquire_lock(t1, pid, true).unwrap();
        let result = lm.acquire_lock(t2, pid, true);
        assert!(matches!(result, Err(DbError::TransactionAborted(_))));
    }

    #[test]
    fn blocked_waiter_is_granted_the_lock_once_the_holder_releases() {
        use std::sync::Arc;
        use std::sync::mpsc;
        use std::thread;

        let lm = Arc::new(LockManager::new());
        let pid = HeapPageId::new(1, 0);
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        lm.acquire_lock(t1, pid, true).unwrap();

        let (tx, rx) = mpsc::channel();
        let waiter_lm = Arc::clone(&lm);
        let waiter = thread::spawn(move || {
            tx.send(()).unwrap();
            waiter_lm.acquire_lock(t2, pid, false)
        });

        // Give the waiter a moment to actually block on the condvar before
        // releasing, so this exercises the wake path rather than a race
        // where t2 never gets a chance to wait.
        rx.recv().unwrap();
        thread::sleep(Duration::from_millis(50));
        lm.release_locks(t1);

        waiter.join().unwrap().unwrap();
        assert_eq!(lm.holds_lock(t2, pid), Some(Permission::Read));
    }

    #[test]
    fn release_lock_drops_only_the_named_page() {
        let lm = LockManager::new();
        let p1 = HeapPageId::new(1, 0);
        let p2 = HeapPageId::new(1, 1);
        let t1 = TransactionId::new();
        lm.acquire_lock(t1, p1, true).unwrap();
        lm.acquire_lock(t1, p2, true).unwrap();
        lm.release_lock(t1, p1);
        assert_eq!(lm.holds_lock(t1, p1), None);
        assert_eq!(lm.holds_lock(t1, p2), Some(Permission::Write));
        assert_eq!(lm.get_locked_pages(t1).len(), 1);
    }

    #[test]
    fn release_locks_frees_the_page_for_others() {
        let lm = LockManager::new();
        let pid = HeapPageId::new(1, 0);
        let t1 = TransactionId::new();
        let t2 = TransactionId::new();
        lm.acquire_lock(t1, pid, true).unwrap();
        lm.release_locks(t1);
        lm.acquire_lock(t2, pid, true).unwrap();
        assert_eq!(lm.holds_lock(t2, pid), Some(Permission::Write));
    }
}
