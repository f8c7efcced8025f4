use std::path::{ Path, PathBuf };
use std::sync::Arc ;
use thiserror::Error ;
use tracing::info ;

use crate::build_queue::BuildQueue ;
use crate::config::RuntimeConfig ;
use crate::dispatcher::{ DispatchReport, EventDispatcher };
use crate::events::HostEvent ;
use crate::registry::{ PluginRegistry, RegistryError };
use crate::scaffold::ScaffoldError ;
use crate::watcher::{ SourceWatcher, WatchError };
use crate::worker::{ BuildPipeline, BuildWorker };



/// Failures that prevent the runtime from starting.
#[derive( Error, Debug )]
pub enum RuntimeError {
	#[error( "Failed to prepare directory {}: {source}", path.display() )]
	Directory { path: PathBuf, source: std::io::Error },
	#[error( "Registry Error: {0}" )] Registry( #[from] RegistryError ),
	#[error( "Scaffold Error: {0}" )] Scaffold( #[from] ScaffoldError ),
	#[error( "Watch Error: {0}" )] Watch( #[from] WatchError ),
	#[error( "Failed to spawn build worker: {0}" )] Spawn( std::io::Error ),
}

/// The assembled plugin runtime: registry, build worker, source watcher and
/// event dispatcher, owned together.
///
/// Dropping the runtime stops the watcher, then the worker.
#[derive( Debug )]
pub struct PluginRuntime {
	registry: Arc<PluginRegistry>,
	dispatcher: EventDispatcher,
	watcher: Option<SourceWatcher>,
	worker: Option<BuildWorker>,
}

impl PluginRuntime {

	/// Discovers every plugin under the configured root and starts building them.
	///
	/// All plugins found at startup are registered with builds suppressed, so
	/// they are built together in the first pass. The plugins and output roots
	/// are created if missing and made absolute.
	///
	/// # Errors
	/// Returns an error if a directory cannot be created, the plugins root
	/// cannot be listed, or a background thread cannot be started.
	pub fn start( config: RuntimeConfig, pipeline: BuildPipeline ) -> Result<Self, RuntimeError> {

		let config = RuntimeConfig {
			plugins_root: prepare_dir( &config.plugins_root )?,
			output_root: prepare_dir( &config.output_root )?,
			..config
		};
		let retry_interval = config.retry_interval();
		let watch = config.watch ;

		let queue = Arc::new( BuildQueue::new() );
		let registry = Arc::new( PluginRegistry::new( Arc::new( config ), Arc::clone( &queue )));

		let suppression = queue.suppress();
		let registered = registry.register_all()?;
		let worker = BuildWorker::spawn( Arc::clone( &registry ), pipeline, retry_interval ).map_err( RuntimeError::Spawn )?;
		let watcher = match watch {
			true => Some( SourceWatcher::start( Arc::clone( &registry ))? ),
			false => None,
		};
		drop( suppression );

		info!( plugins = registered, root = %registry.config().plugins_root.display(), "Plugin runtime started" );

		Ok( Self {
			dispatcher: EventDispatcher::new( Arc::clone( &registry )),
			registry,
			watcher,
			worker: Some( worker ),
		})

	}

	#[inline] pub fn registry( &self ) -> &Arc<PluginRegistry> { &self.registry }
	#[inline] pub fn dispatcher( &self ) -> &EventDispatcher { &self.dispatcher }
	#[inline] pub fn config( &self ) -> &RuntimeConfig { self.registry.config() }

	/// Shorthand for [`EventDispatcher::dispatch`].
	#[inline] pub fn dispatch( &self, event: &HostEvent ) -> DispatchReport { self.dispatcher.dispatch( event )}

	/// Blocks until no build pass is running or waiting to run.
	pub fn wait_for_builds( &self ) { self.registry.queue().wait_settled() }

	/// Scaffolds a new plugin. Without a watcher it is registered right away;
	/// otherwise the watcher picks it up.
	///
	/// # Errors
	/// Returns an error if the name is taken or invalid, or the files cannot
	/// be written.
	pub fn create_template( &self, name: &str ) -> Result<PathBuf, RuntimeError> {
		let root = self.registry.create_template( name )?;
		if self.watcher.is_none() { self.registry.register_discovered( &root )?; }
		Ok( root )
	}

	/// Stops the watcher, waits for the current build pass, then stops the worker.
	pub fn shutdown( mut self ) { self.stop() }

	fn stop( &mut self ) {
		if let Some( watcher ) = self.watcher.take() { watcher.stop() }
		if let Some( worker ) = self.worker.take() {
			worker.shutdown();
			info!( "Plugin runtime stopped" );
		}
	}

}

impl Drop for PluginRuntime {
	fn drop( &mut self ) { self.stop() }
}

fn prepare_dir( path: &Path ) -> Result<PathBuf, RuntimeError> {
	let error = | source | RuntimeError::Directory { path: path.to_path_buf(), source };
	std::fs::create_dir_all( path ).map_err( error )?;
	std::fs::canonicalize( path ).map_err( error )
}
