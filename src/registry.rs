//! The plugin registry.
//!
//! One insertion-ordered table of [`PluginRecord`]s keyed by plugin root path,
//! guarded by a single mutex. Every mutation holds the lock only for its own
//! bookkeeping; compilation and loading happen outside it.
//!
//! Dispatch reads through [`PluginRegistry::instances`], which first waits
//! for any in-flight build pass so it never observes a record mid-swap.

use std::path::{ Path, PathBuf };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use std::sync::atomic::{ AtomicU64, Ordering };
use thiserror::Error ;
use tracing::{ debug, info, warn };

use crate::build_queue::BuildQueue ;
use crate::config::RuntimeConfig ;
use crate::events::EventHandler ;
use crate::loader::InstanceHandle ;
use crate::metadata::PluginMetadata ;
use crate::record::{ PluginRecord, enumerate_sources };
use crate::scaffold::{ self, ScaffoldError };



/// Filesystem failures the registry cannot recover from.
#[derive( Error, Debug )]
pub enum RegistryError {
	#[error( "Failed to create build output directory {}: {source}", path.display() )]
	CreateOutputDir { path: PathBuf, source: std::io::Error },
	#[error( "Failed to read plugins directory {}: {source}", path.display() )]
	ReadPluginsDir { path: PathBuf, source: std::io::Error },
}

/// What changed under a known plugin, as reported by the source watcher.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct Change {
	/// A source file was created, modified, removed or renamed.
	pub sources: bool,
	/// `plugin.json` was touched.
	pub descriptor: bool,
}

/// Outcome of [`PluginRegistry::refresh`].
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum RefreshOutcome {
	/// The plugin is unknown to the registry.
	Unknown,
	/// Nothing build-relevant changed.
	Unchanged,
	/// The plugin was marked dirty and a build requested.
	Rebuild,
	/// The plugin has no sources left and was unloaded.
	Unloaded,
}

/// A record whose build the worker is about to run.
#[derive( Debug, Clone )]
pub(crate) struct BuildJob {
	pub record: PluginRecord,
	pub stamp: u64,
}

/// Table of known plugins shared by the watcher, the build worker and the dispatcher.
#[derive( Debug )]
pub struct PluginRegistry {
	config: Arc<RuntimeConfig>,
	queue: Arc<BuildQueue>,
	records: Mutex<Vec<PluginRecord>>,
	generations: AtomicU64,
	stamps: AtomicU64,
}

impl PluginRegistry {

	pub fn new( config: Arc<RuntimeConfig>, queue: Arc<BuildQueue> ) -> Self {
		Self {
			config,
			queue,
			records: Mutex::new( Vec::new() ),
			generations: AtomicU64::new( 0 ),
			stamps: AtomicU64::new( 0 ),
		}
	}

	#[inline] pub fn config( &self ) -> &RuntimeConfig { &self.config }
	#[inline] pub fn queue( &self ) -> &Arc<BuildQueue> { &self.queue }

	#[inline] fn lock( &self ) -> MutexGuard<'_, Vec<PluginRecord>> {
		self.records.lock().unwrap_or_else( PoisonError::into_inner )
	}

	#[inline] fn next_stamp( &self ) -> u64 { self.stamps.fetch_add( 1, Ordering::Relaxed ) + 1 }

	/// Registers every directory directly under the plugins root.
	///
	/// Returns the number of newly registered plugins.
	///
	/// # Errors
	/// Returns an error if the plugins root cannot be listed or an output
	/// directory cannot be created.
	pub fn register_all( &self ) -> Result<usize, RegistryError> {
		let root = &self.config.plugins_root ;
		let read_dir_error = | source | RegistryError::ReadPluginsDir { path: root.clone(), source };
		let mut dirs = std::fs::read_dir( root )
			.map_err( read_dir_error )?
			.filter_map( Result::ok )
			.map(| entry | entry.path() )
			.filter(| path | path.is_dir() )
			.collect::<Vec<_>>();
		dirs.sort();
		dirs.iter().try_fold( 0, | count, dir | Ok( count + usize::from( self.register_discovered( dir )? )))
	}

	/// Registers a newly discovered plugin directory.
	///
	/// An unreadable descriptor is logged and leaves the record without
	/// metadata; it is picked up once the descriptor becomes valid. A record
	/// with metadata is marked dirty and a build requested. Returns `false`
	/// if the path was already registered.
	///
	/// # Errors
	/// Returns an error if the build output directory cannot be created.
	pub fn register_discovered( &self, path: &Path ) -> Result<bool, RegistryError> {

		if self.contains( path ) { return Ok( false ) }

		let mut record = PluginRecord::new( path, &self.config );
		record.metadata = match PluginMetadata::read( &record.descriptor_path ) {
			Ok( metadata ) => Some( metadata ),
			Err( err ) => {
				warn!( path = %path.display(), error = %err, "Unable to load plugin descriptor" );
				None
			}
		};
		record.source_files = enumerate_sources( path, &self.config );

		std::fs::create_dir_all( &record.build_output_path ).map_err(| source | RegistryError::CreateOutputDir {
			path: record.build_output_path.clone(),
			source,
		})?;

		let loadable = record.metadata.is_some();
		if loadable {
			record.requires_rebuild = true ;
			record.dirty_stamp = self.next_stamp();
		}

		{
			let mut records = self.lock();
			if records.iter().any(| existing | existing.path == record.path ) { return Ok( false ) }
			info!( plugin = %record.display_name(), path = %path.display(), sources = record.source_files.len(), "Registered plugin" );
			records.push( record );
		}

		if loadable { self.queue.request(); }
		Ok( true )

	}

	/// Unloads and forgets a plugin. Returns `false` if it was not registered.
	pub fn remove( &self, path: &Path ) -> bool {
		let removed = {
			let mut records = self.lock();
			match records.iter().position(| record | record.path == path ) {
				Some( index ) => Some( records.remove( index )),
				None => None,
			}
		};
		match removed {
			Some( record ) => {
				info!( plugin = %record.display_name(), path = %path.display(), "Removed plugin" );
				true
			}
			None => false,
		}
	}

	/// Marks a plugin as needing a rebuild and requests a build pass.
	/// Returns `false` if the plugin is unknown.
	pub fn mark_dirty( &self, path: &Path ) -> bool {
		let stamp = self.next_stamp();
		let found = self.with_record( path, | record | {
			record.requires_rebuild = true ;
			record.dirty_stamp = stamp ;
		}).is_some();
		if found { self.queue.request(); }
		found
	}

	/// Drops a plugin's live instance, keeping the record.
	/// Returns `false` if there was nothing to unload.
	pub fn unload( &self, path: &Path ) -> bool {
		let previous = self.with_record( path, | record | record.instance.take() ).flatten();
		match previous {
			Some( instance ) => {
				info!( plugin = instance.plugin(), generation = instance.generation(), "Unloaded plugin" );
				true
			}
			None => false,
		}
	}

	/// Re-derives a known plugin's state after a filesystem change.
	///
	/// A descriptor that became invalid keeps the last known good metadata and
	/// schedules nothing. A descriptor whose normalized content is unchanged
	/// schedules nothing. A plugin left without sources is unloaded rather
	/// than rebuilt.
	pub fn refresh( &self, path: &Path, change: Change ) -> RefreshOutcome {

		let Some( current ) = self.record( path ) else { return RefreshOutcome::Unknown };

		let sources = change.sources.then(|| enumerate_sources( path, &self.config ));

		let metadata = match change.descriptor {
			false => None,
			true => match PluginMetadata::read( &current.descriptor_path ) {
				Ok( metadata ) if current.metadata.as_ref() == Some( &metadata ) => {
					debug!( plugin = metadata.name(), "Descriptor unchanged" );
					None
				}
				Ok( metadata ) => Some( metadata ),
				Err( err ) => {
					warn!( path = %path.display(), error = %err, "Ignoring invalid plugin descriptor" );
					None
				}
			},
		};

		if sources.is_none() && metadata.is_none() { return RefreshOutcome::Unchanged }

		let stamp = self.next_stamp();
		let outcome = self.with_record( path, | record | {
			if let Some( sources ) = sources { record.source_files = sources }
			if let Some( metadata ) = metadata {
				info!( plugin = metadata.name(), "Plugin descriptor changed" );
				record.metadata = Some( metadata );
			}
			match record.source_files.is_empty() {
				true => {
					record.requires_rebuild = false ;
					record.dirty_stamp = stamp ;
					( RefreshOutcome::Unloaded, record.instance.take() )
				}
				false => {
					record.requires_rebuild = true ;
					record.dirty_stamp = stamp ;
					( RefreshOutcome::Rebuild, None )
				}
			}
		});

		match outcome {
			None => RefreshOutcome::Unknown,
			Some(( RefreshOutcome::Unloaded, previous )) => {
				info!( path = %path.display(), "Plugin has no sources, unloading" );
				drop( previous );
				RefreshOutcome::Unloaded
			}
			Some(( outcome, _ )) => {
				self.queue.request();
				outcome
			}
		}

	}

	/// Snapshot of every live instance, in registration order.
	///
	/// Blocks while a build pass is in flight; never waits for passes that
	/// start after the snapshot was taken.
	pub fn instances( &self ) -> Vec<InstanceHandle> {
		self.queue.wait_idle();
		self.lock().iter().filter_map(| record | record.instance.clone() ).collect()
	}

	/// Snapshot of one record.
	pub fn record( &self, path: &Path ) -> Option<PluginRecord> {
		self.lock().iter().find(| record | record.path == path ).cloned()
	}

	/// Root paths of every registered plugin, in registration order.
	pub fn paths( &self ) -> Vec<PathBuf> {
		self.lock().iter().map(| record | record.path.clone() ).collect()
	}

	#[inline] pub fn contains( &self, path: &Path ) -> bool { self.lock().iter().any(| record | record.path == path )}
	#[inline] pub fn len( &self ) -> usize { self.lock().len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.lock().is_empty() }

	/// Whether a plugin directory named `name` already exists under the plugins root.
	pub fn is_name_taken( &self, name: &str ) -> bool {
		scaffold::is_name_taken( &self.config.plugins_root, name )
	}

	/// Scaffolds a new plugin under the plugins root. See [`scaffold::create_template`].
	///
	/// # Errors
	/// Returns [`ScaffoldError::NameTaken`] if the directory exists.
	pub fn create_template( &self, name: &str ) -> Result<PathBuf, ScaffoldError> {
		scaffold::create_template( &self.config.plugins_root, name )
	}

	fn with_record<R>( &self, path: &Path, f: impl FnOnce( &mut PluginRecord ) -> R ) -> Option<R> {
		self.lock().iter_mut().find(| record | record.path == path ).map( f )
	}

	/// Records with `requires_rebuild` set, in registration order.
	pub(crate) fn dirty_jobs( &self ) -> Vec<BuildJob> {
		self.lock().iter()
			.filter(| record | record.requires_rebuild )
			.map(| record | BuildJob { record: record.clone(), stamp: record.dirty_stamp })
			.collect()
	}

	#[inline] pub(crate) fn has_dirty( &self ) -> bool { self.lock().iter().any(| record | record.requires_rebuild )}

	/// Swaps in a freshly loaded handler, then clears the dirty flag unless the
	/// plugin was marked again while it was being built.
	///
	/// Returns the new handle, or `None` if the plugin was removed or lost all
	/// of its sources meanwhile; the handler is then discarded. The previous
	/// instance is released after the lock is dropped.
	pub(crate) fn install( &self, job: &BuildJob, plugin: &str, handler: Box<dyn EventHandler> ) -> Option<InstanceHandle> {
		let generation = self.generations.fetch_add( 1, Ordering::Relaxed ) + 1 ;
		let handle = InstanceHandle::new( plugin, generation, handler );
		let swapped = self.with_record( &job.record.path, | record | {
			if record.source_files.is_empty() { return None }
			let previous = record.instance.replace( handle.clone() );
			if record.dirty_stamp == job.stamp { record.requires_rebuild = false }
			record.diagnostics.clear();
			Some( previous )
		}).flatten();
		match swapped {
			Some( previous ) => {
				if let Some( previous ) = previous {
					debug!( plugin, from = previous.generation(), to = generation, "Swapped plugin instance" );
				}
				Some( handle )
			}
			None => {
				debug!( plugin, generation, "Discarded build of a plugin that is gone or has no sources" );
				None
			}
		}
	}

	/// Records a failed build. The plugin stays dirty and keeps its instance.
	pub(crate) fn fail( &self, path: &Path, diagnostics: Vec<String> ) {
		self.with_record( path, | record | record.diagnostics = diagnostics );
	}

	/// Clears the dirty flag of a plugin that cannot be built as it stands.
	pub(crate) fn settle( &self, job: &BuildJob ) {
		self.with_record( &job.record.path, | record | {
			if record.dirty_stamp == job.stamp { record.requires_rebuild = false }
		});
	}

}
