//! Fan-out of host events to every loaded plugin.
//!
//! Each delivery is isolated: an error or a panic in one instance becomes a
//! [`DispatchFailure`] in the report and never reaches the caller.

use std::panic::{ AssertUnwindSafe, catch_unwind };
use std::sync::Arc ;
use thiserror::Error ;
use tracing::{ trace, warn };

use crate::events::{ DispatchError, EventKind, HostEvent };
use crate::loader::InstanceHandle ;
use crate::registry::PluginRegistry ;
use crate::utils::panic_message ;



/// One instance that failed to handle an event.
#[derive( Error, Debug )]
#[error( "Plugin {plugin} (generation {generation}) failed: {error}" )]
pub struct DispatchFailure {
	pub plugin: String,
	pub generation: u64,
	pub error: DispatchError,
}

/// Outcome of delivering one event to every live instance.
#[derive( Debug )]
pub struct DispatchReport {
	kind: EventKind,
	delivered: usize,
	failures: Vec<DispatchFailure>,
}

impl DispatchReport {
	#[inline] pub fn kind( &self ) -> EventKind { self.kind }
	/// Instances that handled the event without error.
	#[inline] pub fn delivered( &self ) -> usize { self.delivered }
	#[inline] pub fn failures( &self ) -> &[DispatchFailure] { &self.failures }
	#[inline] pub fn is_clean( &self ) -> bool { self.failures.is_empty() }
}

/// Fans host events out to every loaded plugin.
///
/// Each instance is called in registration order. A failing or panicking
/// instance is logged and skipped; delivery to the rest continues.
#[derive( Debug, Clone )]
pub struct EventDispatcher {
	registry: Arc<PluginRegistry>,
}

impl EventDispatcher {

	pub fn new( registry: Arc<PluginRegistry> ) -> Self { Self { registry }}

	/// Delivers `event` to the live instances snapshot taken after any
	/// in-flight build pass settles. Never fails.
	pub fn dispatch( &self, event: &HostEvent ) -> DispatchReport {

		let kind = event.kind();
		let instances = self.registry.instances();
		trace!( event = %kind, instances = instances.len(), "Dispatching event" );

		let failures = instances.iter()
			.filter_map(| instance | deliver( instance, event ).err() )
			.inspect(| failure | warn!(
				plugin = %failure.plugin,
				generation = failure.generation,
				event = %kind,
				"Plugin failed to handle event: {}", failure.error
			))
			.collect::<Vec<_>>();

		DispatchReport { kind, delivered: instances.len() - failures.len(), failures }

	}

}

fn deliver( instance: &InstanceHandle, event: &HostEvent ) -> Result<(), DispatchFailure> {
	catch_unwind( AssertUnwindSafe(|| event.deliver( instance.handler() )))
		.unwrap_or_else(| payload | Err( DispatchError::Panicked( panic_message( payload.as_ref() ))))
		.map_err(| error | DispatchFailure {
			plugin: instance.plugin().to_string(),
			generation: instance.generation(),
			error,
		})
}
