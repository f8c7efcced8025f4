use live_link::{ BreakpointEvent, BreakpointKind, HostEvent, Val, event_args };
use crate::scratch::exception ;

fn field_names( value: &Val ) -> Vec<&str> {
	match value {
		Val::Record( fields ) => fields.iter().map(|( name, _ )| name.as_str() ).collect(),
		value => panic!( "Expected a record, found: {:?}", value ),
	}
}

#[test]
fn event_args_exception_is_one_record() {
	match event_args( &exception() ).as_slice() {
		[ record ] => assert_eq!( field_names( record ), [
			"process-id", "thread-id", "first-chance", "exception-code", "exception-flags", "exception-address",
		]),
		value => panic!( "Expected one argument, found: {:?}", value ),
	}
}

#[test]
fn event_args_breakpoint_kind_is_an_enum_case() {
	let event = HostEvent::Breakpoint( BreakpointEvent {
		kind: BreakpointKind::Hardware,
		name: "entry".to_string(),
		..BreakpointEvent::default()
	});
	let args = event_args( &event );
	let Some( Val::Record( fields )) = args.first() else { panic!( "Expected a record, found: {:?}", args ) };
	assert_eq!( fields[0], ( "kind".to_string(), Val::Enum( "hardware".to_string() )));
	assert!( fields.contains( &( "name".to_string(), Val::String( "entry".to_string() ))));
}

#[test]
fn event_args_scalar_and_empty_payloads() {
	assert_eq!(
		event_args( &HostEvent::DebuggerStart { filename: "app.exe".to_string() }),
		[ Val::String( "app.exe".to_string() )],
	);
	assert!( event_args( &HostEvent::Stepped ).is_empty() );
	assert!( event_args( &HostEvent::DebuggerStop ).is_empty() );
}
