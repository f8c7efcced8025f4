//! WebAssembly component loading.
//!
//! Each loaded plugin gets its own wasmtime [`Store`], which is the isolation
//! context: dropping the store frees everything the component allocated.
//!
//! A component becomes a plugin by exporting the [`ENTRY_INTERFACE`] instance.
//! Inside it, every function named after an [`EventKind::export_name`] receives
//! that event; an optional `init` function runs once right after instantiation
//! and acts as the constructor.

use std::collections::HashMap ;
use std::sync::Mutex ;
use tracing::debug ;
use wasmtime::{ Engine, Store };
use wasmtime::component::{ Component, ComponentExportIndex, Func, Instance, Linker, ResourceTable, Val };

use crate::events::{
	BreakpointEvent, DispatchError, EventHandler, EventKind, ExceptionEvent, HostEvent,
	ProcessCreateEvent, ProcessExitEvent, ThreadCreateEvent, ThreadExitEvent,
};
use crate::loader::{ LoadError, LoadRequest, Loader };



/// Export name of the interface a component must provide to be loaded as a plugin.
pub const ENTRY_INTERFACE: &str = "live-link:plugin/events" ;

/// Name of the optional constructor inside [`ENTRY_INTERFACE`].
pub const CONSTRUCTOR: &str = "init" ;

/// Data stored inside every plugin's [`Store`].
pub struct ComponentState {
	plugin: String,
	resource_table: ResourceTable,
}

impl ComponentState {
	#[inline] pub fn plugin( &self ) -> &str { &self.plugin }
	#[inline] pub fn resource_table( &mut self ) -> &mut ResourceTable { &mut self.resource_table }
}

impl std::fmt::Debug for ComponentState {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ComponentState" )
			.field( "plugin", &self.plugin )
			.finish_non_exhaustive()
	}
}

/// [`Loader`] that compiles and instantiates WebAssembly components.
///
/// Host functions added to the linker (see [`ComponentLoader::linker_mut`]) are
/// available to every plugin loaded afterwards.
pub struct ComponentLoader {
	engine: Engine,
	linker: Linker<ComponentState>,
}

impl ComponentLoader {

	pub fn new( engine: Engine ) -> Self {
		let linker = Linker::new( &engine );
		Self { engine, linker }
	}

	/// Creates a loader around a prepared linker.
	pub fn with_linker( engine: Engine, linker: Linker<ComponentState> ) -> Self {
		Self { engine, linker }
	}

	#[inline] pub fn engine( &self ) -> &Engine { &self.engine }
	#[inline] pub fn linker_mut( &mut self ) -> &mut Linker<ComponentState> { &mut self.linker }

	/// Compiles `bytes` (binary or text format) and instantiates it as a plugin.
	///
	/// # Errors
	/// See [`Loader::load`].
	pub fn instantiate( &self, plugin: &str, bytes: &[u8] ) -> Result<ComponentInstance, LoadError> {

		let component = Component::new( &self.engine, bytes ).map_err( LoadError::InvalidBinary )?;
		let mut store = Store::new( &self.engine, ComponentState {
			plugin: plugin.to_string(),
			resource_table: ResourceTable::new(),
		});
		let instance = self.linker.instantiate( &mut store, &component ).map_err( LoadError::Instantiation )?;

		let interface_index = instance
			.get_export_index( &mut store, None, ENTRY_INTERFACE )
			.ok_or_else(|| LoadError::MissingEntry( ENTRY_INTERFACE.to_string() ))?;

		if let Some( init ) = lookup_func( &instance, &mut store, &interface_index, CONSTRUCTOR ) {
			init.call( &mut store, &[], &mut [] ).map_err( LoadError::Constructor )?;
			let _ = init.post_return( &mut store );
		}

		let handlers = EventKind::ALL.into_iter()
			.filter_map(| kind | lookup_func( &instance, &mut store, &interface_index, kind.export_name() )
				.map(| func | ( kind, func )))
			.collect::<HashMap<_, _>>();

		debug!( plugin, handlers = handlers.len(), "Component instantiated" );

		Ok( ComponentInstance { store: Mutex::new( store ), _instance: instance, handlers })

	}

}

impl Loader for ComponentLoader {
	fn load( &self, request: &LoadRequest<'_> ) -> Result<Box<dyn EventHandler>, LoadError> {
		let bytes = std::fs::read( request.binary )?;
		Ok( Box::new( self.instantiate( request.plugin, &bytes )? ))
	}
}

impl std::fmt::Debug for ComponentLoader {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ComponentLoader" ).finish_non_exhaustive()
	}
}

fn lookup_func(
	instance: &Instance,
	store: &mut Store<ComponentState>,
	interface_index: &ComponentExportIndex,
	name: &str,
) -> Option<Func> {
	let func_index = instance.get_export_index( &mut *store, Some( interface_index ), name )?;
	instance.get_func( &mut *store, func_index )
}

/// An instantiated plugin component with its store, ready for dispatch.
pub struct ComponentInstance {
	store: Mutex<Store<ComponentState>>,
	_instance: Instance,
	handlers: HashMap<EventKind, Func>,
}

impl ComponentInstance {

	/// Whether the component exports a handler for `kind`.
	#[inline] pub fn handles( &self, kind: EventKind ) -> bool { self.handlers.contains_key( &kind )}

	fn call( &self, kind: EventKind, args: &[Val] ) -> Result<(), DispatchError> {
		let Some( func ) = self.handlers.get( &kind ) else { return Ok(()) };
		let mut store = self.store.lock().map_err(| _ | DispatchError::LockRejected )?;
		func.call( &mut *store, args, &mut [] ).map_err( DispatchError::RuntimeException )?;
		let _ = func.post_return( &mut *store );
		Ok(())
	}

}

impl std::fmt::Debug for ComponentInstance {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_struct( "ComponentInstance" )
			.field( "handlers", &self.handlers.keys().collect::<Vec<_>>() )
			.finish_non_exhaustive()
	}
}

impl EventHandler for ComponentInstance {
	fn on_exception( &self, event: &ExceptionEvent ) -> Result<(), DispatchError> {
		self.call( EventKind::Exception, &event_args( &HostEvent::Exception( *event )))
	}
	fn on_thread_create( &self, event: &ThreadCreateEvent ) -> Result<(), DispatchError> {
		self.call( EventKind::ThreadCreate, &event_args( &HostEvent::ThreadCreate( *event )))
	}
	fn on_thread_exit( &self, event: &ThreadExitEvent ) -> Result<(), DispatchError> {
		self.call( EventKind::ThreadExit, &event_args( &HostEvent::ThreadExit( *event )))
	}
	fn on_process_create( &self, event: &ProcessCreateEvent ) -> Result<(), DispatchError> {
		self.call( EventKind::ProcessCreate, &event_args( &HostEvent::ProcessCreate( *event )))
	}
	fn on_process_exit( &self, event: &ProcessExitEvent ) -> Result<(), DispatchError> {
		self.call( EventKind::ProcessExit, &event_args( &HostEvent::ProcessExit( *event )))
	}
	fn on_breakpoint( &self, event: &BreakpointEvent ) -> Result<(), DispatchError> {
		if !self.handles( EventKind::Breakpoint ) { return Ok(()) }
		self.call( EventKind::Breakpoint, &event_args( &HostEvent::Breakpoint( event.clone() )))
	}
	fn on_stepped( &self ) -> Result<(), DispatchError> {
		self.call( EventKind::Stepped, &[] )
	}
	fn on_debugger_start( &self, filename: &str ) -> Result<(), DispatchError> {
		self.call( EventKind::DebuggerStart, &event_args( &HostEvent::DebuggerStart { filename: filename.to_string() }))
	}
	fn on_debugger_stop( &self ) -> Result<(), DispatchError> {
		self.call( EventKind::DebuggerStop, &[] )
	}
}

/// Lowers an event payload into the argument list of its component handler.
///
/// Struct payloads become a single record argument with kebab-case field names.
pub fn event_args( event: &HostEvent ) -> Vec<Val> {
	match event {
		HostEvent::Exception( event ) => vec![ record([
			( "process-id", Val::U32( event.process_id )),
			( "thread-id", Val::U32( event.thread_id )),
			( "first-chance", Val::Bool( event.first_chance )),
			( "exception-code", Val::U32( event.exception_code )),
			( "exception-flags", Val::U32( event.exception_flags )),
			( "exception-address", Val::U64( event.exception_address )),
		])],
		HostEvent::ThreadCreate( event ) => vec![ record([
			( "process-id", Val::U32( event.process_id )),
			( "thread-id", Val::U32( event.thread_id )),
			( "handle", Val::U64( event.handle )),
			( "thread-local-base", Val::U64( event.thread_local_base )),
			( "start-address", Val::U64( event.start_address )),
		])],
		HostEvent::ThreadExit( event ) => vec![ record([
			( "process-id", Val::U32( event.process_id )),
			( "thread-id", Val::U32( event.thread_id )),
			( "exit-code", Val::U32( event.exit_code )),
		])],
		HostEvent::ProcessCreate( event ) => vec![ record([
			( "process-id", Val::U32( event.process_id )),
			( "thread-id", Val::U32( event.thread_id )),
			( "file-handle", Val::U64( event.file_handle )),
			( "process-handle", Val::U64( event.process_handle )),
			( "thread-handle", Val::U64( event.thread_handle )),
			( "image-base", Val::U64( event.image_base )),
			( "debug-info-file-offset", Val::U32( event.debug_info_file_offset )),
			( "debug-info-size", Val::U32( event.debug_info_size )),
			( "thread-local-base", Val::U64( event.thread_local_base )),
			( "start-address", Val::U64( event.start_address )),
			( "image-name", Val::U64( event.image_name )),
			( "unicode", Val::S16( event.unicode )),
		])],
		HostEvent::ProcessExit( event ) => vec![ record([
			( "process-id", Val::U32( event.process_id )),
			( "thread-id", Val::U32( event.thread_id )),
			( "exit-code", Val::U32( event.exit_code )),
		])],
		HostEvent::Breakpoint( event ) => vec![ record([
			( "kind", Val::Enum( event.kind.case_name().to_string() )),
			( "address", Val::U64( event.address )),
			( "enabled", Val::Bool( event.enabled )),
			( "singleshot", Val::Bool( event.singleshot )),
			( "active", Val::Bool( event.active )),
			( "name", Val::String( event.name.clone() )),
			( "module", Val::String( event.module.clone() )),
			( "slot", Val::U16( event.slot )),
			( "type-ex", Val::S32( event.type_ex )),
			( "size", Val::S32( event.size )),
			( "hit-count", Val::U32( event.hit_count )),
			( "fast-resume", Val::Bool( event.fast_resume )),
			( "silent", Val::Bool( event.silent )),
			( "break-condition", Val::String( event.break_condition.clone() )),
			( "log-text", Val::String( event.log_text.clone() )),
			( "log-condition", Val::String( event.log_condition.clone() )),
			( "command-text", Val::String( event.command_text.clone() )),
			( "command-condition", Val::String( event.command_condition.clone() )),
		])],
		HostEvent::DebuggerStart { filename } => vec![ Val::String( filename.clone() )],
		HostEvent::Stepped | HostEvent::DebuggerStop => Vec::with_capacity( 0 ),
	}
}

fn record<const N: usize>( fields: [( &str, Val ); N] ) -> Val {
	Val::Record( fields.into_iter().map(|( name, value )| ( name.to_string(), value )).collect() )
}
