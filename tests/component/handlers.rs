use live_link::{ ComponentLoader, DispatchError, EventKind, HostEvent };
use crate::{ ENGINE, ARMED_PLUGIN };
use crate::scratch::exception ;

#[test]
fn handlers_exported_functions_are_found() {
	let instance = ComponentLoader::new( ENGINE.clone() ).instantiate( "armed", ARMED_PLUGIN.as_bytes() ).unwrap();
	let handled = EventKind::ALL.into_iter().filter(| kind | instance.handles( *kind )).collect::<Vec<_>>();
	assert_eq!( handled, [ EventKind::Stepped, EventKind::DebuggerStop ]);
}

#[test]
fn handlers_missing_handler_is_a_no_op() {
	let instance = ComponentLoader::new( ENGINE.clone() ).instantiate( "armed", ARMED_PLUGIN.as_bytes() ).unwrap();
	exception().deliver( &instance ).expect( "Missing handler should be ignored" );
	HostEvent::DebuggerStart { filename: "app.exe".to_string() }.deliver( &instance )
		.expect( "Missing handler should be ignored" );
}

#[test]
fn handlers_trap_becomes_runtime_exception() {
	let instance = ComponentLoader::new( ENGINE.clone() ).instantiate( "armed", ARMED_PLUGIN.as_bytes() ).unwrap();
	HostEvent::Stepped.deliver( &instance ).expect( "Stepped handler failed" );
	match HostEvent::DebuggerStop.deliver( &instance ) {
		Err( DispatchError::RuntimeException( _ )) => {}
		value => panic!( "Expected RuntimeException, found: {:#?}", value ),
	}
}

#[test]
fn handlers_instances_are_isolated() {
	let loader = ComponentLoader::new( ENGINE.clone() );
	let first = loader.instantiate( "first", ARMED_PLUGIN.as_bytes() ).unwrap();
	let second = loader.instantiate( "second", ARMED_PLUGIN.as_bytes() ).unwrap();
	assert!( HostEvent::DebuggerStop.deliver( &first ).is_err() );
	HostEvent::Stepped.deliver( &second ).expect( "A trap in one store leaked into another" );
}
