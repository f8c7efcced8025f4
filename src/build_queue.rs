//! Build worker state machine and trigger coalescing.
//!
//! A trigger is a request, not a command. Triggers that arrive while a pass is
//! running collapse into a single follow-up pass, and triggers that arrive
//! while builds are suppressed are held until the last suppression ends.

use std::sync::{ Condvar, Mutex, MutexGuard, PoisonError };
use std::time::Duration ;



/// Observable state of the build worker.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum WorkerState {
	/// Waiting for a trigger.
	Idle,
	/// A pass is in flight.
	Building,
	/// Shut down; no further triggers are accepted.
	Stopped,
}

/// Why the worker started a pass.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub(crate) enum PassCause {
	Requested,
	Retry,
}

#[derive( Debug )]
struct QueueState {
	state: WorkerState,
	pending: bool,
	suppressed: usize,
	shutdown: bool,
	passes: u64,
}

/// Shared between the registry, which requests builds, and the worker, which
/// runs them. Also the barrier dispatch waits on.
#[derive( Debug )]
pub struct BuildQueue {
	state: Mutex<QueueState>,
	signal: Condvar,
}

impl Default for BuildQueue {
	fn default() -> Self { Self::new() }
}

impl BuildQueue {

	pub fn new() -> Self {
		Self {
			state: Mutex::new( QueueState {
				state: WorkerState::Idle,
				pending: false,
				suppressed: 0,
				shutdown: false,
				passes: 0,
			}),
			signal: Condvar::new(),
		}
	}

	#[inline] fn lock( &self ) -> MutexGuard<'_, QueueState> {
		self.state.lock().unwrap_or_else( PoisonError::into_inner )
	}

	#[inline] fn wait<'a>( &self, guard: MutexGuard<'a, QueueState> ) -> MutexGuard<'a, QueueState> {
		self.signal.wait( guard ).unwrap_or_else( PoisonError::into_inner )
	}

	/// Requests a build pass. Returns `false` once the worker has been stopped.
	pub fn request( &self ) -> bool {
		let mut state = self.lock();
		if state.shutdown || state.state == WorkerState::Stopped { return false }
		state.pending = true ;
		self.signal.notify_all();
		true
	}

	/// Holds off build passes until the returned guard (and every other live
	/// guard) is dropped. Dropping the last guard triggers exactly one pass.
	pub fn suppress( &self ) -> BuildSuppression<'_> {
		self.lock().suppressed += 1 ;
		BuildSuppression { queue: self }
	}

	fn lift_suppression( &self ) {
		let mut state = self.lock();
		state.suppressed = state.suppressed.saturating_sub( 1 );
		if state.suppressed == 0 && !state.shutdown {
			state.pending = true ;
			self.signal.notify_all();
		}
	}

	#[inline] pub fn state( &self ) -> WorkerState { self.lock().state }
	#[inline] pub fn is_suppressed( &self ) -> bool { self.lock().suppressed > 0 }
	/// Number of passes started so far.
	#[inline] pub fn passes( &self ) -> u64 { self.lock().passes }

	/// Blocks while a pass is in flight. Does not wait for passes requested
	/// after the in-flight one.
	pub fn wait_idle( &self ) {
		let mut state = self.lock();
		while state.state == WorkerState::Building { state = self.wait( state ) }
	}

	/// Blocks until no pass is running and none is about to start.
	///
	/// Returns immediately while builds are suppressed or after shutdown.
	pub fn wait_settled( &self ) {
		let mut state = self.lock();
		while state.state == WorkerState::Building
			|| ( state.pending && state.suppressed == 0 && !state.shutdown && state.state != WorkerState::Stopped )
		{
			state = self.wait( state );
		}
	}

	/// Worker side: blocks until a pass should run and marks it as started.
	///
	/// `retry` is how long to wait before running an unrequested pass; the
	/// worker passes `None` when nothing is left to retry. Returns `None` once
	/// shutdown was requested.
	pub(crate) fn next_pass( &self, retry: Option<Duration> ) -> Option<PassCause> {
		let mut state = self.lock();
		loop {
			if state.shutdown { return None }
			if state.pending && state.suppressed == 0 {
				return Some( Self::begin( &mut state, PassCause::Requested ))
			}
			match retry {
				Some( interval ) => {
					let ( guard, timeout ) = self.signal.wait_timeout( state, interval )
						.unwrap_or_else( PoisonError::into_inner );
					state = guard ;
					if timeout.timed_out() && !state.shutdown && !state.pending && state.suppressed == 0 {
						return Some( Self::begin( &mut state, PassCause::Retry ))
					}
				}
				None => state = self.wait( state ),
			}
		}
	}

	fn begin( state: &mut QueueState, cause: PassCause ) -> PassCause {
		state.pending = false ;
		state.state = WorkerState::Building ;
		state.passes += 1 ;
		cause
	}

	/// Worker side: marks the in-flight pass as finished and wakes waiters.
	pub(crate) fn finish_pass( &self ) {
		let mut state = self.lock();
		if state.state == WorkerState::Building { state.state = WorkerState::Idle }
		self.signal.notify_all();
	}

	/// Asks the worker to stop after its current pass. Later requests are rejected.
	pub(crate) fn request_shutdown( &self ) {
		self.lock().shutdown = true ;
		self.signal.notify_all();
	}

	/// Worker side: enters the terminal state.
	pub(crate) fn stopped( &self ) {
		let mut state = self.lock();
		state.state = WorkerState::Stopped ;
		state.pending = false ;
		self.signal.notify_all();
	}

}

/// Guard returned by [`BuildQueue::suppress`].
#[must_use = "builds resume as soon as the guard is dropped"]
#[derive( Debug )]
pub struct BuildSuppression<'a> {
	queue: &'a BuildQueue,
}

impl Drop for BuildSuppression<'_> {
	fn drop( &mut self ) { self.queue.lift_suppression() }
}
