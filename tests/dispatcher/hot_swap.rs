use std::sync::Arc ;
use std::sync::atomic::{ AtomicBool, Ordering };
use live_link::{ BuildWorker, EventDispatcher, HostEvent };
use crate::scratch::{ ProbeLoader, RecordingCompiler, SETTLE, descriptor, eventually, pipeline, registry, workspace, write_plugin };

#[test]
fn hot_swap_snapshot_outlives_replacement() {

	let ( _dir, config ) = workspace();
	let root = write_plugin( &config, "Foo", &descriptor( "Foo", &[] ), &[ "src/lib.rs" ]);
	let registry = registry( config );
	registry.register_discovered( &root ).unwrap();
	let loader = ProbeLoader::default();
	let pipeline = pipeline( RecordingCompiler::default(), loader.clone() );
	pipeline.run_pass( &registry );

	let snapshot = registry.instances();
	registry.mark_dirty( &root );
	pipeline.run_pass( &registry );

	let current = registry.instances();
	assert!( !snapshot[0].same_context( &current[0] ));
	assert!( current[0].generation() > snapshot[0].generation() );
	assert_eq!( loader.drops(), 0 );

	snapshot[0].handler().on_stepped().expect( "Old context must still be usable" );
	drop( snapshot );
	assert_eq!( loader.drops(), 1 );

}

#[test]
fn hot_swap_dispatch_never_sees_a_missing_instance() {

	let ( _dir, config ) = workspace();
	let root = write_plugin( &config, "Foo", &descriptor( "Foo", &[] ), &[ "src/lib.rs" ]);
	let registry = registry( config );
	registry.register_discovered( &root ).unwrap();
	let loader = ProbeLoader::default();
	let worker = BuildWorker::spawn( Arc::clone( &registry ), pipeline( RecordingCompiler::default(), loader.clone() ), None )
		.expect( "Failed to spawn worker" );
	assert!( eventually( SETTLE, || registry.instances().len() == 1 ));

	let done = Arc::new( AtomicBool::new( false ));
	let dispatching = {
		let dispatcher = EventDispatcher::new( Arc::clone( &registry ));
		let done = Arc::clone( &done );
		std::thread::spawn( move || {
			let mut rounds = 0 ;
			while !done.load( Ordering::SeqCst ) {
				let report = dispatcher.dispatch( &HostEvent::Stepped );
				assert!( report.is_clean() );
				assert_eq!( report.delivered(), 1 );
				rounds += 1 ;
			}
			rounds
		})
	};

	for _ in 0..20 {
		registry.mark_dirty( &root );
		registry.queue().wait_settled();
	}
	done.store( true, Ordering::SeqCst );
	assert!( dispatching.join().expect( "Dispatch thread failed" ) > 0 );

	assert!( loader.loads() >= 2 );
	assert!( eventually( SETTLE, || loader.drops() == loader.loads() - 1 ));
	worker.shutdown();

}
