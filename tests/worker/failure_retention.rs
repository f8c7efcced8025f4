use std::sync::Arc ;
use live_link::{ BuildError, EventDispatcher, LoadError };
use crate::scratch::{ ProbeLoader, RecordingCompiler, descriptor, exception, pipeline, registry, workspace, write_plugin };

#[test]
fn failed_compile_keeps_previous_instance() {

	let ( _dir, config ) = workspace();
	let root = write_plugin( &config, "Foo", &descriptor( "Foo", &[] ), &[ "src/lib.rs" ]);
	let registry = registry( config );
	registry.register_discovered( &root ).unwrap();

	let compiler = RecordingCompiler::default();
	let loader = ProbeLoader::default();
	let pipeline = pipeline( compiler.clone(), loader.clone() );
	let dispatcher = EventDispatcher::new( Arc::clone( &registry ));
	pipeline.run_pass( &registry );
	let first = registry.record( &root ).unwrap().instance().unwrap().generation();

	compiler.fail( "Foo" );
	registry.mark_dirty( &root );
	let ( built, failed ) = pipeline.run_pass( &registry );
	assert!( built.is_empty() );
	assert!( matches!( failed[0].error, BuildError::Compile( _ )));

	let record = registry.record( &root ).unwrap();
	assert!( record.requires_rebuild() );
	assert_eq!( record.instance().unwrap().generation(), first );
	assert_eq!( record.diagnostics(), [ "error: Foo does not compile" ]);
	assert_eq!( loader.drops(), 0 );
	drop( record );

	let report = dispatcher.dispatch( &exception() );
	assert_eq!( report.delivered(), 1 );
	assert_eq!( loader.log(), [ "Foo" ]);

	compiler.heal( "Foo" );
	let ( built, _ ) = pipeline.run_pass( &registry );
	assert_eq!( built, [ root.clone() ]);
	let record = registry.record( &root ).unwrap();
	assert!( record.instance().unwrap().generation() > first );
	assert!( record.diagnostics().is_empty() );
	assert!( !record.requires_rebuild() );
	assert_eq!( loader.drops(), 1 );

}

#[test]
fn failed_load_keeps_previous_instance() {

	let ( _dir, config ) = workspace();
	let root = write_plugin( &config, "Foo", &descriptor( "Foo", &[] ), &[ "src/lib.rs" ]);
	let registry = registry( config );
	registry.register_discovered( &root ).unwrap();

	let loader = ProbeLoader::default();
	let pipeline = pipeline( RecordingCompiler::default(), loader.clone() );
	pipeline.run_pass( &registry );

	loader.reject( "Foo" );
	registry.mark_dirty( &root );
	let ( _, failed ) = pipeline.run_pass( &registry );
	assert!( matches!( failed[0].error, BuildError::Load( LoadError::Rejected( _ ))));

	let record = registry.record( &root ).unwrap();
	assert!( record.instance().is_some() );
	assert!( record.requires_rebuild() );
	assert_eq!( loader.loads(), 1 );
	assert_eq!( loader.drops(), 0 );

}
