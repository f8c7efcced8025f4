//! Filesystem observation of the plugins root.
//!
//! Raw notifications are collected into bursts: a burst ends once the channel
//! has been quiet for the configured debounce window. Each burst is grouped
//! per plugin directory and applied to the registry once per plugin, so a
//! save touching many files marks each affected plugin dirty exactly once.

use std::path::{ Component, Path, PathBuf };
use std::sync::Arc ;
use std::sync::mpsc::{ self, Receiver, RecvTimeoutError, Sender };
use std::thread::JoinHandle ;
use notify::{ Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher };
use thiserror::Error ;
use tracing::{ debug, error, info, warn };

use crate::config::RuntimeConfig ;
use crate::descriptor::BUILD_DESCRIPTOR_FILE ;
use crate::metadata::DESCRIPTOR_FILE ;
use crate::registry::{ Change, PluginRegistry, RefreshOutcome };



#[derive( Error, Debug )]
pub enum WatchError {
	#[error( "Notify Error: {0}" )] Notify( #[from] notify::Error ),
	#[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
}

/// The changes one burst made under a single top-level plugin directory.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct PluginChanges {
	pub root: PathBuf,
	pub change: Change,
	/// The plugin directory itself was created, removed or renamed.
	pub structural: bool,
}

/// What [`apply_changes`] did for one plugin directory.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum WatchAction {
	Registered( PathBuf ),
	Removed( PathBuf ),
	Refreshed( PathBuf, RefreshOutcome ),
	Ignored( PathBuf ),
}

/// Groups raw event paths by the plugin directory they fall under.
///
/// Paths outside `plugins_root`, inside excluded folders, the generated build
/// descriptor and files with a non-source extension are dropped. Groups keep
/// the order in which their plugin was first seen.
pub fn classify( plugins_root: &Path, config: &RuntimeConfig, paths: &[PathBuf] ) -> Vec<PluginChanges> {
	paths.iter().fold( Vec::new(), | mut groups: Vec<PluginChanges>, path | {

		let Ok( relative ) = path.strip_prefix( plugins_root ) else { return groups };
		let mut components = relative.components().filter_map(| component | match component {
			Component::Normal( name ) => Some( name ),
			_ => None,
		});
		let Some( plugin ) = components.next() else { return groups };
		let rest = components.collect::<Vec<_>>();

		let excluded = std::iter::once( plugin ).chain( rest.iter().copied() )
			.any(| name | name.to_str().is_some_and(| name | config.is_excluded( name )));
		if excluded { return groups }

		let root = plugins_root.join( plugin );
		let index = match groups.iter().position(| group | group.root == root ) {
			Some( index ) => index,
			None => {
				groups.push( PluginChanges { root, change: Change::default(), structural: false });
				groups.len() - 1
			}
		};
		let group = &mut groups[ index ];

		match rest.as_slice() {
			[] => group.structural = true,
			[ name ] if *name == DESCRIPTOR_FILE => group.change.descriptor = true,
			[ .., name ] if *name == BUILD_DESCRIPTOR_FILE => {}
			_ if config.is_source_file( path ) || path.extension().is_none() => group.change.sources = true,
			_ => {}
		}
		groups

	})
}

/// Applies one burst's grouped changes to the registry.
///
/// A new directory is registered, a vanished known one removed, and any
/// other change to a known plugin refreshed.
pub fn apply_changes( registry: &PluginRegistry, changes: &[PluginChanges] ) -> Vec<WatchAction> {
	changes.iter().map(| changes | {
		let root = changes.root.clone();
		match ( registry.contains( &root ), root.is_dir() ) {
			( false, true ) => match registry.register_discovered( &root ) {
				Ok( true ) => WatchAction::Registered( root ),
				Ok( false ) => WatchAction::Ignored( root ),
				Err( err ) => {
					error!( path = %root.display(), error = %err, "Failed to register plugin" );
					WatchAction::Ignored( root )
				}
			},
			( true, false ) => match registry.remove( &root ) {
				true => WatchAction::Removed( root ),
				false => WatchAction::Ignored( root ),
			},
			( true, true ) if changes.change != Change::default() => {
				let outcome = registry.refresh( &root, changes.change );
				WatchAction::Refreshed( root, outcome )
			}
			_ => WatchAction::Ignored( root ),
		}
	}).collect()
}

enum Signal {
	Fs( notify::Result<Event> ),
	Stop,
}

/// Watches the registry's plugins root on a background thread until stopped
/// or dropped.
pub struct SourceWatcher {
	watcher: Option<RecommendedWatcher>,
	signals: Sender<Signal>,
	thread: Option<JoinHandle<()>>,
}

impl SourceWatcher {

	/// Starts watching `registry.config().plugins_root` recursively.
	///
	/// Event paths are matched against the plugins root as configured, so it
	/// should be the same absolute path the registry's records were
	/// registered under.
	///
	/// # Errors
	/// Returns an error if the watch cannot be installed or the thread cannot
	/// be spawned.
	pub fn start( registry: Arc<PluginRegistry> ) -> Result<Self, WatchError> {

		let ( signals, receiver ) = mpsc::channel();
		let sender = signals.clone();
		let mut watcher = RecommendedWatcher::new(
			move | event: notify::Result<Event> | { let _ = sender.send( Signal::Fs( event )); },
			notify::Config::default(),
		)?;
		watcher.watch( &registry.config().plugins_root, RecursiveMode::Recursive )?;

		info!( path = %registry.config().plugins_root.display(), "Watching plugins" );

		let thread = std::thread::Builder::new()
			.name( "live-link-watch".to_string() )
			.spawn( move || run( &registry, &receiver ))?;

		Ok( Self { watcher: Some( watcher ), signals, thread: Some( thread ) })

	}

	/// Stops watching and waits for the watcher thread to exit.
	pub fn stop( mut self ) { self.halt() }

	fn halt( &mut self ) {
		let Some( thread ) = self.thread.take() else { return };
		drop( self.watcher.take() );
		let _ = self.signals.send( Signal::Stop );
		if thread.join().is_err() { error!( "Source watcher panicked" ) }
	}

}

impl Drop for SourceWatcher {
	fn drop( &mut self ) { self.halt() }
}

impl std::fmt::Debug for SourceWatcher {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "SourceWatcher" )
			.field( "running", &self.thread.is_some() )
			.finish_non_exhaustive()
	}
}

fn run( registry: &PluginRegistry, receiver: &Receiver<Signal> ) {

	let config = registry.config();
	let debounce = config.debounce();

	while let Ok( Signal::Fs( first )) = receiver.recv() {

		let mut burst = Vec::new();
		collect( &mut burst, first );
		loop {
			match receiver.recv_timeout( debounce ) {
				Ok( Signal::Fs( event )) => collect( &mut burst, event ),
				Ok( Signal::Stop ) | Err( RecvTimeoutError::Disconnected ) => return,
				Err( RecvTimeoutError::Timeout ) => break,
			}
		}

		let changes = classify( &config.plugins_root, config, &burst );
		debug!( events = burst.len(), plugins = changes.len(), "Filesystem burst settled" );
		for action in apply_changes( registry, &changes ) {
			debug!( ?action, "Applied filesystem change" );
		}

	}

}

fn collect( burst: &mut Vec<PathBuf>, event: notify::Result<Event> ) {
	match event {
		Ok( event ) if matches!( event.kind, EventKind::Access( _ )) => {}
		Ok( event ) => burst.extend( event.paths ),
		Err( err ) => warn!( error = %err, "Watch error" ),
	}
}
