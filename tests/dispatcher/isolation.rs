use std::sync::Arc ;
use live_link::{ DispatchError, EventDispatcher, EventKind, HostEvent, PluginRegistry };
use crate::scratch::{ Behaviour, ProbeLoader, RecordingCompiler, descriptor, exception, pipeline, registry, workspace, write_plugin };

fn three_plugins( middle: Behaviour ) -> ( tempfile::TempDir, Arc<PluginRegistry>, ProbeLoader ) {
	let ( dir, config ) = workspace();
	for name in [ "first", "second", "third" ] {
		write_plugin( &config, name, &descriptor( name, &[] ), &[ "src/lib.rs" ]);
	}
	let registry = registry( config );
	registry.register_all().unwrap();
	let loader = ProbeLoader::default();
	loader.behave( "second", middle );
	pipeline( RecordingCompiler::default(), loader.clone() ).run_pass( &registry );
	( dir, registry, loader )
}

#[test]
fn isolation_failing_plugin_does_not_block_others() {
	let ( _dir, registry, loader ) = three_plugins( Behaviour::Fail );
	let report = EventDispatcher::new( registry ).dispatch( &exception() );

	assert_eq!( loader.log(), [ "first", "third" ]);
	assert_eq!( report.kind(), EventKind::Exception );
	assert_eq!( report.delivered(), 2 );
	match report.failures() {
		[ failure ] => {
			assert_eq!( failure.plugin, "second" );
			assert!( matches!( failure.error, DispatchError::HandlerFailed( _ )));
		}
		value => panic!( "Expected one failure, found: {:#?}", value ),
	}
}

#[test]
fn isolation_panicking_plugin_does_not_block_others() {
	let ( _dir, registry, loader ) = three_plugins( Behaviour::Panic );
	let report = EventDispatcher::new( registry ).dispatch( &exception() );

	assert_eq!( loader.log(), [ "first", "third" ]);
	assert!( !report.is_clean() );
	match &report.failures()[0].error {
		DispatchError::Panicked( message ) => assert_eq!( message, "second panicked" ),
		value => panic!( "Expected Panicked error, found: {:#?}", value ),
	}
}

#[test]
fn isolation_panicking_plugin_stays_callable() {
	let ( _dir, registry, loader ) = three_plugins( Behaviour::Panic );
	let dispatcher = EventDispatcher::new( registry );
	dispatcher.dispatch( &exception() );
	dispatcher.dispatch( &exception() );
	assert_eq!( loader.log(), [ "first", "third", "first", "third" ]);

	let report = dispatcher.dispatch( &HostEvent::Stepped );
	assert!( report.is_clean() );
	assert_eq!( report.delivered(), 3 );
}

#[test]
fn isolation_default_handlers_are_no_ops() {
	let ( _dir, registry, loader ) = three_plugins( Behaviour::Deliver );
	let dispatcher = EventDispatcher::new( registry );
	let report = dispatcher.dispatch( &HostEvent::DebuggerStart { filename: "app.exe".to_string() });
	assert!( report.is_clean() );
	assert_eq!( report.delivered(), 3 );
	assert!( loader.log().is_empty() );
}

#[test]
fn isolation_empty_registry() {
	let ( _dir, config ) = workspace();
	let report = EventDispatcher::new( registry( config )).dispatch( &HostEvent::DebuggerStop );
	assert_eq!( report.delivered(), 0 );
	assert!( report.is_clean() );
}
