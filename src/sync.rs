//! Locking primitives for sharing codecs and decoded state between threads
//!
//! Protocol readers and writers are not reentrant: each carries a cursor
//! and, for the Compact and SimpleJSON formats, a stack of nesting state
//! that must not be interleaved between two values. [`CodecLock`] wraps a
//! single codec instance so that one thread at a time drives it through a
//! complete top-level value.
//!
//! [`NoStarveRwLock`] is a reader/writer lock with an explicit
//! writer-priority policy, for state (such as a shared schema registry)
//! that is read on every decode and replaced only occasionally: once a
//! writer has started waiting, newly-arriving readers wait behind it, so a
//! steady stream of readers cannot hold the writer off indefinitely.
//!
//! # Guards
//!
//! Every acquisition returns a guard that releases the lock when dropped,
//! including when the holder returns early with an error or unwinds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reader/writer lock that does not let readers starve a waiting writer
///
/// Readers pass through a gate before taking the shared lock. A writer
/// holds the gate from the moment it starts waiting until it has acquired
/// the exclusive lock, which closes the gate to every reader arriving in
/// between.
#[derive(Debug, Default)]
pub struct NoStarveRwLock<T> {
    gate: Mutex<()>,
    writers_waiting: AtomicUsize,
    inner: RwLock<T>,
}

/// Counts one waiting writer for as long as it is alive
struct WaitingWriter<'a>(&'a AtomicUsize);

impl<'a> WaitingWriter<'a> {
    fn register(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count)
    }
}

impl Drop for WaitingWriter<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T> NoStarveRwLock<T> {
    pub fn new(val: T) -> Self {
        Self {
            gate: Mutex::new(()),
            writers_waiting: AtomicUsize::new(0),
            inner: RwLock::new(val),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    /// Acquires shared access, blocking while a writer holds or awaits the lock
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        drop(self.gate.lock());
        self.inner.read()
    }

    /// Acquires exclusive access, blocking until every current reader has
    /// released the lock
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        let _waiting = WaitingWriter::register(&self.writers_waiting);
        let _gate = self.gate.lock();
        self.inner.write()
    }

    /// Attempts to acquire shared access without blocking
    ///
    /// Fails if a writer holds the lock or is waiting for it.
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
        drop(self.gate.try_lock()?);
        self.inner.try_read()
    }

    /// Attempts to acquire exclusive access without blocking
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        let _gate = self.gate.try_lock()?;
        self.inner.try_write()
    }

    /// Acquires shared access, giving up after `timeout`
    pub fn read_for(&self, timeout: Duration) -> Option<RwLockReadGuard<'_, T>> {
        let deadline = Instant::now() + timeout;
        drop(self.gate.try_lock_until(deadline)?);
        self.inner.try_read_until(deadline)
    }

    /// Acquires exclusive access, giving up after `timeout`
    ///
    /// While this call is waiting, new readers are held off exactly as for
    /// [`write`](Self::write).
    pub fn write_for(&self, timeout: Duration) -> Option<RwLockWriteGuard<'_, T>> {
        let deadline = Instant::now() + timeout;
        let _waiting = WaitingWriter::register(&self.writers_waiting);
        let _gate = self.gate.try_lock_until(deadline)?;
        self.inner.try_write_until(deadline)
    }

    /// Returns `true` if at least one writer is waiting for the lock
    pub fn is_writer_waiting(&self) -> bool {
        self.writers_waiting.load(Ordering::Acquire) > 0
    }
}

/// Mutual exclusion around a single codec instance
#[derive(Debug, Default)]
pub struct CodecLock<C> {
    inner: Mutex<C>,
}

impl<C> CodecLock<C> {
    pub fn new(codec: C) -> Self {
        Self {
            inner: Mutex::new(codec),
        }
    }

    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }

    pub fn lock(&self) -> MutexGuard<'_, C> {
        self.inner.lock()
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, C>> {
        self.inner.try_lock()
    }

    pub fn lock_for(&self, timeout: Duration) -> Option<MutexGuard<'_, C>> {
        self.inner.try_lock_for(timeout)
    }

    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Runs `f` with exclusive access to the codec, releasing the lock when
    /// `f` returns
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut C) -> R,
    {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn locks_are_threadsafe() {
        dummy::<NoStarveRwLock<Vec<u8>>>();
        dummy::<CodecLock<Vec<u8>>>();
    }

    #[test]
    fn readers_share() {
        let lock = NoStarveRwLock::new(5);
        let a = lock.read();
        let b = lock.try_read().expect("second reader");
        assert_eq!(*a + *b, 10);
        assert!(lock.try_write().is_none());
        drop((a, b));
        *lock.write() += 1;
        assert_eq!(lock.into_inner(), 6);
    }

    #[test]
    fn writer_excludes_readers() {
        let lock = NoStarveRwLock::new(());
        let w = lock.write();
        assert!(!lock.is_writer_waiting());
        assert!(lock.try_read().is_none());
        assert!(lock.read_for(Duration::from_millis(10)).is_none());
        assert!(lock.write_for(Duration::from_millis(10)).is_none());
        assert!(!lock.is_writer_waiting());
        drop(w);
        assert!(lock.try_read().is_some());
    }

    #[test]
    fn codec_lock_releases_after_with() {
        let lock = CodecLock::new(Vec::<u8>::new());
        lock.with(|buf| buf.push(1));
        assert!(!lock.is_locked());
        let guard = lock.lock();
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());
        assert!(lock.lock_for(Duration::from_millis(5)).is_none());
        drop(guard);
        assert_eq!(lock.into_inner(), [1]);
    }
}
