//! Exclusive access to the modem.
//!
//! A plain mutex serializes every write/wait round trip. The name of the
//! thread holding it is remembered purely so that waiting callers can log who
//! they are waiting on; it plays no part in correctness.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

/// A mutex that logs contention.
#[derive(Debug)]
pub(crate) struct ExclusiveLock<T> {
	inner: Mutex<T>,
	owner: Mutex<Option<String>>,
}

/// Proof that the current thread has exclusive access.
///
/// The lock is released when the guard is dropped, including while
/// unwinding from a panic.
#[derive(Debug)]
pub(crate) struct ExclusiveGuard<'a, T> {
	guard: MutexGuard<'a, T>,
	owner: &'a Mutex<Option<String>>,
}

fn current_owner() -> String {
	let thread = std::thread::current();
	thread
		.name()
		.map_or_else(|| format!("{:?}", thread.id()), ToString::to_string)
}

impl<T> ExclusiveLock<T> {
	pub fn new(value: T) -> Self {
		ExclusiveLock {
			inner: Mutex::new(value),
			owner: Mutex::new(None),
		}
	}

	/// The name of the thread currently holding the lock, if any.
	pub fn owner(&self) -> Option<String> {
		self.owner
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	/// Acquire the lock, blocking until it is free.
	///
	/// `label` identifies the session in the contention log.
	pub fn lock(&self, label: &str) -> ExclusiveGuard<'_, T> {
		let guard = match self.inner.try_lock() {
			Ok(guard) => guard,
			Err(TryLockError::WouldBlock) => {
				log::debug!(
					"{label} locked by {}, {} waiting",
					self.owner().as_deref().unwrap_or("<unknown>"),
					current_owner(),
				);
				self.inner.lock().unwrap_or_else(|poisoned| {
					log::warn!("{label} recovering lock poisoned by a panicking holder");
					poisoned.into_inner()
				})
			}
			Err(TryLockError::Poisoned(poisoned)) => {
				log::warn!("{label} recovering lock poisoned by a panicking holder");
				poisoned.into_inner()
			}
		};
		*self.owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(current_owner());
		ExclusiveGuard {
			guard,
			owner: &self.owner,
		}
	}
}

impl<T> Deref for ExclusiveGuard<'_, T> {
	type Target = T;
	fn deref(&self) -> &T {
		&self.guard
	}
}

impl<T> DerefMut for ExclusiveGuard<'_, T> {
	fn deref_mut(&mut self) -> &mut T {
		&mut self.guard
	}
}

impl<T> Drop for ExclusiveGuard<'_, T> {
	fn drop(&mut self) {
		*self.owner.lock().unwrap_or_else(PoisonError::into_inner) = None;
	}
}
