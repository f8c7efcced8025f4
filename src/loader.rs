//! Loading compiled plugins into isolation contexts.
//!
//! A [`Loader`] turns a freshly built binary into an [`EventHandler`]. The
//! registry wraps the handler in an [`InstanceHandle`] and swaps it in. Handles
//! are reference counted: the context behind a replaced handle is disposed
//! only when the last dispatch still holding it returns.

use std::path::Path ;
use std::sync::Arc ;
use thiserror::Error ;

use crate::events::EventHandler ;



/// Errors that can occur while loading a compiled plugin.
///
/// A failed load never touches the instance that is already running.
#[derive( Error, Debug )]
pub enum LoadError {
	/// The binary could not be read from disk.
	#[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
	/// The binary is not a valid component.
	#[error( "Invalid Binary: {0}" )] InvalidBinary( wasmtime::Error ),
	/// Instantiation failed (e.g. unsatisfied imports).
	#[error( "Instantiation Failed: {0}" )] Instantiation( wasmtime::Error ),
	/// The unit does not export the well-known entry interface.
	#[error( "Missing entry export: {0}" )] MissingEntry( String ),
	/// The unit's constructor failed.
	#[error( "Constructor Failed: {0}" )] Constructor( wasmtime::Error ),
	/// A custom loader rejected the unit.
	#[error( "{0}" )] Rejected( String ),
}

/// What a [`Loader`] needs to know about the unit it loads.
#[derive( Debug, Clone, Copy )]
pub struct LoadRequest<'a> {
	/// Plugin name, taken from its metadata.
	pub plugin: &'a str,
	/// Plugin root directory.
	pub root: &'a Path,
	/// The binary produced by the compiler.
	pub binary: &'a Path,
}

/// Creates a fresh isolation context for a compiled binary and instantiates its
/// entry point.
pub trait Loader: Send + Sync {
	/// Loads `request.binary` into a new context.
	///
	/// # Errors
	/// Returns a [`LoadError`] if the binary is unreadable, invalid, lacks the
	/// entry point, or its constructor fails.
	fn load( &self, request: &LoadRequest<'_> ) -> Result<Box<dyn EventHandler>, LoadError> ;
}

impl<F> Loader for F
where
	F: Fn( &LoadRequest<'_> ) -> Result<Box<dyn EventHandler>, LoadError> + Send + Sync,
{
	fn load( &self, request: &LoadRequest<'_> ) -> Result<Box<dyn EventHandler>, LoadError> { self( request ) }
}

struct LoadedInstance {
	plugin: String,
	generation: u64,
	handler: Box<dyn EventHandler>,
}

/// Shared handle to one loaded plugin context.
///
/// Cloning is cheap. The generation is unique across the registry, so two
/// handles with the same generation refer to the same context.
#[derive( Clone )]
pub struct InstanceHandle( Arc<LoadedInstance> );

impl InstanceHandle {

	pub(crate) fn new( plugin: impl Into<String>, generation: u64, handler: Box<dyn EventHandler> ) -> Self {
		Self( Arc::new( LoadedInstance { plugin: plugin.into(), generation, handler }))
	}

	/// Name of the plugin this context was loaded for.
	#[inline] pub fn plugin( &self ) -> &str { &self.0.plugin }
	/// Registry-wide generation number of this context.
	#[inline] pub fn generation( &self ) -> u64 { self.0.generation }
	/// The loaded capability surface.
	#[inline] pub fn handler( &self ) -> &dyn EventHandler { self.0.handler.as_ref() }

	/// Whether both handles point at the same context.
	#[inline] pub fn same_context( &self, other: &Self ) -> bool { Arc::ptr_eq( &self.0, &other.0 )}

}

impl std::fmt::Debug for InstanceHandle {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "InstanceHandle" )
			.field( "plugin", &self.0.plugin )
			.field( "generation", &self.0.generation )
			.field( "handler", &"<EventHandler>" )
			.finish()
	}
}
