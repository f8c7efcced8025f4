//! The build worker.
//!
//! One dedicated thread runs build passes over the registry's dirty set, one
//! pass at a time. Each plugin in a pass goes through the same pipeline:
//! resolve dependencies, generate and save the build descriptor, compile,
//! load, swap. A plugin whose build fails stays dirty and keeps whatever
//! instance it had.

use std::panic::{ AssertUnwindSafe, catch_unwind };
use std::path::PathBuf ;
use std::sync::Arc ;
use std::thread::JoinHandle ;
use std::time::Duration ;
use itertools::Itertools ;
use thiserror::Error ;
use tracing::{ debug, error, info };

use crate::build_queue::{ BuildQueue, PassCause };
use crate::compiler::{ CompileError, CompileRequest, Compiler };
use crate::config::RuntimeConfig ;
use crate::descriptor::{ DescriptorError, DescriptorGenerator };
use crate::loader::{ InstanceHandle, LoadError, LoadRequest, Loader };
use crate::registry::{ BuildJob, PluginRegistry };
use crate::resolver::{ ResolveError, ResolverChain };
use crate::utils::{ PartialSuccess, ResultList, panic_message };



/// Why one plugin failed to build. Every variant is recoverable.
#[derive( Error, Debug )]
pub enum BuildError {
	#[error( "Plugin has no valid descriptor" )] MissingMetadata,
	#[error( "Resolve Error: {0}" )] Resolve( #[from] ResolveError ),
	#[error( "Descriptor Error: {0}" )] Descriptor( #[from] DescriptorError ),
	#[error( "{0}" )] Compile( #[from] CompileError ),
	#[error( "Load Error: {0}" )] Load( #[from] LoadError ),
	/// The compiler or loader panicked; the panic was contained.
	#[error( "Build panicked: {0}" )] Panicked( String ),
}

impl BuildError {
	/// The diagnostic lines stored on the record.
	pub fn diagnostics( &self ) -> Vec<String> {
		match self {
			Self::Compile( err ) => err.diagnostics().to_vec(),
			Self::Resolve( err ) => err.unresolved().into_iter()
				.map(| identifier | format!( "Unresolved dependency '{identifier}'" ))
				.collect(),
			err => vec![ err.to_string() ],
		}
	}
}

/// A plugin that failed during a pass.
#[derive( Error, Debug )]
#[error( "{} failed to build: {error}", path.display() )]
pub struct BuildFailure {
	pub path: PathBuf,
	pub error: BuildError,
}

/// The plugins swapped in during a pass, and those that failed.
pub type PassReport = PartialSuccess<Vec<PathBuf>, BuildFailure> ;

/// The stages a pass runs every dirty plugin through.
pub struct BuildPipeline {
	resolver: ResolverChain,
	generator: DescriptorGenerator,
	compiler: Box<dyn Compiler>,
	loader: Box<dyn Loader>,
}

impl BuildPipeline {

	pub fn new(
		resolver: ResolverChain,
		generator: DescriptorGenerator,
		compiler: impl Compiler + 'static,
		loader: impl Loader + 'static,
	) -> Self {
		Self { resolver, generator, compiler: Box::new( compiler ), loader: Box::new( loader ) }
	}

	/// A pipeline whose descriptors reference the configured host binaries.
	pub fn from_config(
		config: &RuntimeConfig,
		resolver: ResolverChain,
		compiler: impl Compiler + 'static,
		loader: impl Loader + 'static,
	) -> Self {
		Self::new( resolver, DescriptorGenerator::new( config.host_references.iter().cloned() ), compiler, loader )
	}

	#[inline] pub fn resolver( &self ) -> &ResolverChain { &self.resolver }
	#[inline] pub fn generator( &self ) -> &DescriptorGenerator { &self.generator }

	/// Builds every record that is dirty at the start of the pass, in
	/// registration order. Per-plugin failures never stop the pass.
	pub fn run_pass( &self, registry: &PluginRegistry ) -> PassReport {

		let jobs = registry.dirty_jobs();
		debug!( plugins = jobs.len(), "Build pass started" );

		let ( built, failed ) = jobs.iter()
			.map(| job | match self.contained_build( registry, job ) {
				Ok( handle ) => Ok( handle.map(| _ | job.record.path.clone() )),
				Err( error ) => Err( Self::report( registry, job, error )),
			})
			.collect::<ResultList<_, _>>()
			.deconstruct();

		let built = built.into_iter().flatten().collect::<Vec<_>>();
		debug!( built = built.len(), failed = failed.len(), "Build pass finished" );
		( built, failed )

	}

	fn contained_build( &self, registry: &PluginRegistry, job: &BuildJob ) -> Result<Option<InstanceHandle>, BuildError> {
		catch_unwind( AssertUnwindSafe(|| self.build( registry, job )))
			.unwrap_or_else(| payload | Err( BuildError::Panicked( panic_message( payload.as_ref() ))))
	}

	/// Returns the swapped-in handle, or `None` when nothing was installed
	/// because the plugin was unloaded or removed meanwhile.
	fn build( &self, registry: &PluginRegistry, job: &BuildJob ) -> Result<Option<InstanceHandle>, BuildError> {

		let record = &job.record ;
		let Some( metadata ) = record.metadata() else { return Err( BuildError::MissingMetadata ) };

		if record.source_files().is_empty() {
			info!( plugin = metadata.name(), "Plugin has no sources, unloading" );
			registry.unload( record.path() );
			registry.settle( job );
			return Ok( None )
		}

		let dependencies = self.resolver.resolve_all( metadata.dependencies() )?;
		let descriptor = self.generator.generate( metadata, &dependencies );
		match descriptor.save( record.build_descriptor_path() )? {
			true => debug!( plugin = metadata.name(), path = %record.build_descriptor_path().display(), "Wrote build descriptor" ),
			false => debug!( plugin = metadata.name(), "Build descriptor unchanged" ),
		}

		let binary = self.compiler.compile( &CompileRequest {
			plugin: metadata.name(),
			root: record.path(),
			descriptor: &descriptor,
			descriptor_path: record.build_descriptor_path(),
			sources: record.source_files(),
			output_dir: record.build_output_path(),
		})?;

		let handler = self.loader.load( &LoadRequest {
			plugin: metadata.name(),
			root: record.path(),
			binary: &binary,
		})?;

		let handle = registry.install( job, metadata.name(), handler );
		if let Some( handle ) = &handle {
			info!( plugin = handle.plugin(), generation = handle.generation(), "Loaded plugin" );
		}
		Ok( handle )

	}

	fn report( registry: &PluginRegistry, job: &BuildJob, error: BuildError ) -> BuildFailure {
		let diagnostics = error.diagnostics();
		error!(
			plugin = %job.record.display_name(),
			diagnostics = %diagnostics.iter().join( "; " ),
			"Build failed: {error}"
		);
		if matches!( error, BuildError::MissingMetadata ) { registry.settle( job ) }
		registry.fail( &job.record.path, diagnostics );
		BuildFailure { path: job.record.path.clone(), error }
	}

}

impl std::fmt::Debug for BuildPipeline {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "BuildPipeline" )
			.field( "resolver", &self.resolver )
			.field( "generator", &self.generator )
			.finish_non_exhaustive()
	}
}

/// Handle on the build thread. Dropping it shuts the worker down.
#[derive( Debug )]
pub struct BuildWorker {
	queue: Arc<BuildQueue>,
	thread: Option<JoinHandle<()>>,
}

impl BuildWorker {

	/// Starts the build thread.
	///
	/// With a `retry_interval`, an idle worker runs an unrequested pass after
	/// that long whenever some record is still dirty.
	///
	/// # Errors
	/// Returns an error if the thread cannot be spawned.
	pub fn spawn(
		registry: Arc<PluginRegistry>,
		pipeline: BuildPipeline,
		retry_interval: Option<Duration>,
	) -> std::io::Result<Self> {
		let queue = Arc::clone( registry.queue() );
		let thread = std::thread::Builder::new()
			.name( "live-link-build".to_string() )
			.spawn( move || run( &registry, &pipeline, retry_interval ))?;
		Ok( Self { queue, thread: Some( thread ) })
	}

	#[inline] pub fn queue( &self ) -> &Arc<BuildQueue> { &self.queue }

	/// Waits for the current pass, then stops the worker for good.
	pub fn shutdown( mut self ) { self.stop() }

	fn stop( &mut self ) {
		let Some( thread ) = self.thread.take() else { return };
		self.queue.request_shutdown();
		if thread.join().is_err() { error!( "Build worker panicked" ) }
	}

}

impl Drop for BuildWorker {
	fn drop( &mut self ) { self.stop() }
}

fn run( registry: &PluginRegistry, pipeline: &BuildPipeline, retry_interval: Option<Duration> ) {

	let queue = registry.queue();
	debug!( "Build worker started" );

	loop {
		let retry = retry_interval.filter(| _ | registry.has_dirty() );
		let Some( cause ) = queue.next_pass( retry ) else { break };
		if cause == PassCause::Retry { debug!( "Retrying failed builds" ) }

		if catch_unwind( AssertUnwindSafe(|| pipeline.run_pass( registry ))).is_err() {
			error!( "Build pass panicked" );
		}
		queue.finish_pass();
	}

	queue.stopped();
	debug!( "Build worker stopped" );

}
