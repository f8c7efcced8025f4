//! Host event payloads and the capability surface every plugin implements.
//!
//! Payloads mirror what the debugger host reports and are forwarded verbatim.
//! A plugin that does not care about an event kind keeps the default no-op.

use thiserror::Error ;



/// Passed to [`EventHandler::on_exception`].
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct ExceptionEvent {
	pub process_id: u32,
	pub thread_id: u32,
	pub first_chance: bool,
	pub exception_code: u32,
	pub exception_flags: u32,
	pub exception_address: u64,
}

/// Passed to [`EventHandler::on_thread_create`].
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct ThreadCreateEvent {
	pub process_id: u32,
	pub thread_id: u32,
	pub handle: u64,
	pub thread_local_base: u64,
	pub start_address: u64,
}

/// Passed to [`EventHandler::on_thread_exit`].
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct ThreadExitEvent {
	pub process_id: u32,
	pub thread_id: u32,
	pub exit_code: u32,
}

/// Passed to [`EventHandler::on_process_create`].
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct ProcessCreateEvent {
	pub process_id: u32,
	pub thread_id: u32,
	pub file_handle: u64,
	pub process_handle: u64,
	pub thread_handle: u64,
	pub image_base: u64,
	pub debug_info_file_offset: u32,
	pub debug_info_size: u32,
	pub thread_local_base: u64,
	pub start_address: u64,
	pub image_name: u64,
	pub unicode: i16,
}

/// Passed to [`EventHandler::on_process_exit`].
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub struct ProcessExitEvent {
	pub process_id: u32,
	pub thread_id: u32,
	pub exit_code: u32,
}

/// Kind of breakpoint reported by the host.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Default )]
pub enum BreakpointKind {
	#[default] None,
	Normal,
	Hardware,
	Memory,
	Dll,
	Exception,
}

impl BreakpointKind {
	/// Case name used when the kind crosses into a component.
	pub fn case_name( self ) -> &'static str {
		match self {
			Self::None => "none",
			Self::Normal => "normal",
			Self::Hardware => "hardware",
			Self::Memory => "memory",
			Self::Dll => "dll",
			Self::Exception => "exception",
		}
	}
}

/// Passed to [`EventHandler::on_breakpoint`].
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub struct BreakpointEvent {
	pub kind: BreakpointKind,
	pub address: u64,
	pub enabled: bool,
	pub singleshot: bool,
	pub active: bool,
	pub name: String,
	pub module: String,
	pub slot: u16,
	pub type_ex: i32,
	pub size: i32,
	pub hit_count: u32,
	pub fast_resume: bool,
	pub silent: bool,
	pub break_condition: String,
	pub log_text: String,
	pub log_condition: String,
	pub command_text: String,
	pub command_condition: String,
}

/// One event coming from the host, ready to be fanned out to every plugin.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum HostEvent {
	Exception( ExceptionEvent ),
	ThreadCreate( ThreadCreateEvent ),
	ThreadExit( ThreadExitEvent ),
	ProcessCreate( ProcessCreateEvent ),
	ProcessExit( ProcessExitEvent ),
	Breakpoint( BreakpointEvent ),
	Stepped,
	DebuggerStart { filename: String },
	DebuggerStop,
}

/// Discriminant of a [`HostEvent`], used to look up per-kind handlers.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Hash )]
pub enum EventKind {
	Exception,
	ThreadCreate,
	ThreadExit,
	ProcessCreate,
	ProcessExit,
	Breakpoint,
	Stepped,
	DebuggerStart,
	DebuggerStop,
}

impl EventKind {

	pub const ALL: [EventKind; 9] = [
		Self::Exception,
		Self::ThreadCreate,
		Self::ThreadExit,
		Self::ProcessCreate,
		Self::ProcessExit,
		Self::Breakpoint,
		Self::Stepped,
		Self::DebuggerStart,
		Self::DebuggerStop,
	];

	/// Name of the function a component exports to receive this kind of event.
	pub fn export_name( self ) -> &'static str {
		match self {
			Self::Exception => "on-exception",
			Self::ThreadCreate => "on-thread-create",
			Self::ThreadExit => "on-thread-exit",
			Self::ProcessCreate => "on-process-create",
			Self::ProcessExit => "on-process-exit",
			Self::Breakpoint => "on-breakpoint",
			Self::Stepped => "on-stepped",
			Self::DebuggerStart => "on-debugger-start",
			Self::DebuggerStop => "on-debugger-stop",
		}
	}

}

impl std::fmt::Display for EventKind {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{}", self.export_name() )}
}

impl HostEvent {

	pub fn kind( &self ) -> EventKind {
		match self {
			Self::Exception( _ ) => EventKind::Exception,
			Self::ThreadCreate( _ ) => EventKind::ThreadCreate,
			Self::ThreadExit( _ ) => EventKind::ThreadExit,
			Self::ProcessCreate( _ ) => EventKind::ProcessCreate,
			Self::ProcessExit( _ ) => EventKind::ProcessExit,
			Self::Breakpoint( _ ) => EventKind::Breakpoint,
			Self::Stepped => EventKind::Stepped,
			Self::DebuggerStart { .. } => EventKind::DebuggerStart,
			Self::DebuggerStop => EventKind::DebuggerStop,
		}
	}

	/// Invokes the capability on `handler` that matches this event.
	///
	/// # Errors
	/// Returns whatever error the handler reports.
	pub fn deliver( &self, handler: &dyn EventHandler ) -> Result<(), DispatchError> {
		match self {
			Self::Exception( event ) => handler.on_exception( event ),
			Self::ThreadCreate( event ) => handler.on_thread_create( event ),
			Self::ThreadExit( event ) => handler.on_thread_exit( event ),
			Self::ProcessCreate( event ) => handler.on_process_create( event ),
			Self::ProcessExit( event ) => handler.on_process_exit( event ),
			Self::Breakpoint( event ) => handler.on_breakpoint( event ),
			Self::Stepped => handler.on_stepped(),
			Self::DebuggerStart { filename } => handler.on_debugger_start( filename ),
			Self::DebuggerStop => handler.on_debugger_stop(),
		}
	}

}

/// Errors a plugin can report while handling an event.
///
/// Returned per instance inside a [`DispatchReport`]( crate::DispatchReport );
/// never propagated to the host.
#[derive( Error, Debug )]
pub enum DispatchError {
	/// The instance's store lock was poisoned by an earlier panic.
	#[error( "Lock Rejected" )] LockRejected,
	/// The WASM function trapped or failed during execution.
	#[error( "Runtime Exception: {0}" )] RuntimeException( wasmtime::Error ),
	/// A native handler reported a failure.
	#[error( "Handler Failed: {0}" )] HandlerFailed( String ),
	/// A native handler panicked; the panic was contained.
	#[error( "Handler Panicked: {0}" )] Panicked( String ),
}

/// The capability surface of a loaded plugin: one method per host event kind.
///
/// All methods default to a no-op so implementations only override what they
/// care about. Implementations must be callable from any host thread.
#[allow( unused_variables )]
pub trait EventHandler: Send + Sync {
	fn on_exception( &self, event: &ExceptionEvent ) -> Result<(), DispatchError> { Ok(()) }
	fn on_thread_create( &self, event: &ThreadCreateEvent ) -> Result<(), DispatchError> { Ok(()) }
	fn on_thread_exit( &self, event: &ThreadExitEvent ) -> Result<(), DispatchError> { Ok(()) }
	fn on_process_create( &self, event: &ProcessCreateEvent ) -> Result<(), DispatchError> { Ok(()) }
	fn on_process_exit( &self, event: &ProcessExitEvent ) -> Result<(), DispatchError> { Ok(()) }
	fn on_breakpoint( &self, event: &BreakpointEvent ) -> Result<(), DispatchError> { Ok(()) }
	fn on_stepped( &self ) -> Result<(), DispatchError> { Ok(()) }
	fn on_debugger_start( &self, filename: &str ) -> Result<(), DispatchError> { Ok(()) }
	fn on_debugger_stop( &self ) -> Result<(), DispatchError> { Ok(()) }
}
