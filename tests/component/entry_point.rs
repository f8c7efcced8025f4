use live_link::{ ComponentLoader, LoadError, LoadRequest, Loader };
use crate::{ ENGINE, ARMED_PLUGIN, FAILING_INIT };

#[test]
fn entry_point_missing_interface() {
	let loader = ComponentLoader::new( ENGINE.clone() );
	match loader.instantiate( "empty", b"(component)" ) {
		Err( LoadError::MissingEntry( name )) => assert_eq!( name, "live-link:plugin/events" ),
		value => panic!( "Expected MissingEntry error, found: {:#?}", value.map(| _ | ()) ),
	}
}

#[test]
fn entry_point_invalid_binary() {
	let loader = ComponentLoader::new( ENGINE.clone() );
	match loader.instantiate( "garbage", &[ 0x00, 0x61, 0x73, 0x6d, 0xff, 0xff ]) {
		Err( LoadError::InvalidBinary( _ )) => {}
		value => panic!( "Expected InvalidBinary error, found: {:#?}", value.map(| _ | ()) ),
	}
}

#[test]
fn entry_point_unsatisfied_import() {
	let loader = ComponentLoader::new( ENGINE.clone() );
	match loader.instantiate( "needy", br#"(component (import "missing:host/api" (instance)))"# ) {
		Err( LoadError::Instantiation( _ )) => {}
		value => panic!( "Expected Instantiation error, found: {:#?}", value.map(| _ | ()) ),
	}
}

#[test]
fn entry_point_constructor_trap() {
	let loader = ComponentLoader::new( ENGINE.clone() );
	match loader.instantiate( "broken", FAILING_INIT.as_bytes() ) {
		Err( LoadError::Constructor( _ )) => {}
		value => panic!( "Expected Constructor error, found: {:#?}", value.map(| _ | ()) ),
	}
}

#[test]
fn entry_point_loads_from_disk() {

	let dir = tempfile::tempdir().unwrap();
	let binary = dir.path().join( "armed.wasm" );
	std::fs::write( &binary, ARMED_PLUGIN ).unwrap();
	let loader = ComponentLoader::new( ENGINE.clone() );

	let handler = loader.load( &LoadRequest { plugin: "armed", root: dir.path(), binary: &binary })
		.expect( "Failed to load component" );
	handler.on_stepped().expect( "Constructor did not run" );

	let missing = dir.path().join( "missing.wasm" );
	match loader.load( &LoadRequest { plugin: "missing", root: dir.path(), binary: &missing }) {
		Err( LoadError::Io( _ )) => {}
		value => panic!( "Expected Io error, found: {:#?}", value.map(| _ | ()) ),
	}

}
