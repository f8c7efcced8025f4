//! A live plugin runtime for WebAssembly plugins.
//!
//! Plugins are directories of sources under a plugins root, each described by a
//! `plugin.json`. `live_link` discovers them, resolves their declared
//! dependencies, compiles them on a dedicated worker, hot-swaps the running
//! instances when their sources change, and fans host events out to every
//! loaded instance while keeping each plugin's failures to itself.
//!
//! # Core Concepts
//!
//! - [`PluginRegistry`]: The single table of known plugins, keyed by root path.
//! 	Shared by the watcher, the worker and the dispatcher.
//!
//! - [`ResolverChain`]: Ordered [`DependencyResolver`] backends. The first backend
//! 	that knows an identifier wins; identifiers nobody knows are reported together.
//!
//! - [`BuildPipeline`]: Resolve, generate the [`BuildDescriptor`], [`Compiler::compile`],
//! 	[`Loader::load`]. Run by the [`BuildWorker`] over every dirty plugin, one pass
//! 	at a time. Triggers that arrive mid-pass coalesce into one follow-up pass.
//!
//! - [`InstanceHandle`]: A reference counted loaded context. A swapped-out context
//! 	lives until the last dispatch still using it returns.
//!
//! - [`EventDispatcher`]: Delivers a [`HostEvent`] to every live instance in
//! 	registration order, capturing errors and panics per instance.
//!
//! - [`ComponentLoader`]: The wasmtime [`Loader`]. A component is a plugin if it
//! 	exports the `live-link:plugin/events` interface.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf ;
//! use live_link::{
//! 	BuildPipeline, CompileError, CompileRequest, ComponentLoader, Engine, HostEvent,
//! 	LocalBinaryResolver, PluginRuntime, ResolverChain, RuntimeConfig,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RuntimeConfig::default().with_plugins_root( "dotplugins" );
//!
//! // The toolchain is yours to provide; here every plugin ships a prebuilt binary.
//! let compiler = | request: &CompileRequest<'_> | -> Result<PathBuf, CompileError> {
//! 	let binary = request.root.join( "plugin.wasm" );
//! 	match binary.exists() {
//! 		true => Ok( binary ),
//! 		false => Err( CompileError::new([ "plugin.wasm not found" ])),
//! 	}
//! };
//!
//! let resolver = ResolverChain::new().with_resolver( LocalBinaryResolver::new([ "lib" ]));
//! let loader = ComponentLoader::new( Engine::default() );
//! let pipeline = BuildPipeline::from_config( &config, resolver, compiler, loader );
//!
//! let runtime = PluginRuntime::start( config, pipeline )?;
//! runtime.wait_for_builds();
//!
//! let report = runtime.dispatch( &HostEvent::DebuggerStart { filename: "app.exe".to_string() });
//! println!( "delivered to {} plugins", report.delivered() );
//!
//! runtime.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Everything is reported through [`tracing`](https://docs.rs/tracing); install
//! a subscriber to see it.

mod build_queue ;
mod compiler ;
mod component ;
mod config ;
mod descriptor ;
mod dispatcher ;
mod events ;
mod loader ;
mod metadata ;
mod record ;
mod registry ;
mod resolver ;
mod runtime ;
mod scaffold ;
mod utils ;
mod watcher ;
mod worker ;

#[doc( no_inline )]
pub use wasmtime::Engine ;
#[doc( no_inline )]
pub use wasmtime::component::{ Component, Linker, ResourceTable, Val };

pub use build_queue::{ BuildQueue, BuildSuppression, WorkerState };
pub use compiler::{ CompileError, CompileRequest, Compiler };
pub use component::{ ComponentInstance, ComponentLoader, ComponentState, CONSTRUCTOR, ENTRY_INTERFACE, event_args };
pub use config::{ ConfigError, RuntimeConfig };
pub use descriptor::{ BUILD_DESCRIPTOR_FILE, BuildDescriptor, DescriptorDependency, DescriptorError, DescriptorGenerator };
pub use dispatcher::{ DispatchFailure, DispatchReport, EventDispatcher };
pub use events::{
	BreakpointEvent, BreakpointKind, DispatchError, EventHandler, EventKind, ExceptionEvent, HostEvent,
	ProcessCreateEvent, ProcessExitEvent, ThreadCreateEvent, ThreadExitEvent,
};
pub use loader::{ InstanceHandle, LoadError, LoadRequest, Loader };
pub use metadata::{ DESCRIPTOR_FILE, MetadataError, PluginMetadata, normalize_dependencies };
pub use record::{ PluginRecord, enumerate_sources };
pub use registry::{ Change, PluginRegistry, RefreshOutcome, RegistryError };
pub use resolver::{
	DependencyReference, DependencyResolver, DirectoryPackageSource, FetchError, LocalBinaryResolver,
	PackageId, PackageResolver, PackageSource, ResolveError, ResolverChain,
};
pub use runtime::{ PluginRuntime, RuntimeError };
pub use scaffold::{ ScaffoldError, create_template, is_name_taken };
pub use watcher::{ PluginChanges, SourceWatcher, WatchAction, WatchError, apply_changes, classify };
pub use worker::{ BuildError, BuildFailure, BuildPipeline, BuildWorker, PassReport };
