//! %PLUGIN_NAME%
//!
//! Export any subset of the `live-link:plugin/events` interface; events
//! without a handler are skipped.

pub fn init() {}

pub fn on_debugger_start( filename: String ) {
	let _ = filename ;
}

pub fn on_debugger_stop() {}
