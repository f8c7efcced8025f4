use std::sync::Arc ;
use std::time::Duration ;
use live_link::{ BuildQueue, BuildWorker };
use crate::scratch::{ ProbeLoader, RecordingCompiler, descriptor, pipeline, registry, workspace, write_plugin };

#[test]
fn suppression_batches_registrations_into_one_pass() {

	let ( _dir, config ) = workspace();
	let roots = [ "a", "b", "c" ].map(| name | write_plugin( &config, name, &descriptor( name, &[] ), &[ "src/lib.rs" ]));
	let registry = registry( config );
	let compiler = RecordingCompiler::default();
	let worker = BuildWorker::spawn( Arc::clone( &registry ), pipeline( compiler.clone(), ProbeLoader::default() ), None )
		.expect( "Failed to spawn worker" );

	let guard = registry.queue().suppress();
	for root in &roots { registry.register_discovered( root ).unwrap(); }
	std::thread::sleep( Duration::from_millis( 100 ));
	assert_eq!( registry.queue().passes(), 0 );
	assert!( compiler.calls().is_empty() );
	assert!( registry.queue().is_suppressed() );

	drop( guard );
	registry.queue().wait_settled();
	assert_eq!( registry.queue().passes(), 1 );
	assert_eq!( compiler.calls(), [ "a", "b", "c" ]);
	assert_eq!( registry.instances().len(), 3 );

	worker.shutdown();

}

#[test]
fn suppression_nests() {
	let queue = BuildQueue::new();
	let outer = queue.suppress();
	let inner = queue.suppress();
	drop( inner );
	assert!( queue.is_suppressed() );
	drop( outer );
	assert!( !queue.is_suppressed() );
}

#[test]
fn suppression_lift_alone_triggers_a_pass() {

	let ( _dir, config ) = workspace();
	let registry = registry( config );
	let worker = BuildWorker::spawn( Arc::clone( &registry ), pipeline( RecordingCompiler::default(), ProbeLoader::default() ), None )
		.expect( "Failed to spawn worker" );

	drop( registry.queue().suppress() );
	registry.queue().wait_settled();
	assert_eq!( registry.queue().passes(), 1 );
	worker.shutdown();

}
