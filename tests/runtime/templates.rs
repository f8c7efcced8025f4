use live_link::{ PluginRuntime, RuntimeError, ScaffoldError };
use crate::scratch::{ ProbeLoader, RecordingCompiler, pipeline, workspace };

#[test]
fn templates_are_registered_and_built() {

	let ( _dir, config ) = workspace();
	let compiler = RecordingCompiler::default();
	let runtime = PluginRuntime::start( config, pipeline( compiler.clone(), ProbeLoader::default() )).expect( "Failed to start runtime" );

	let root = runtime.create_template( "Fresh" ).expect( "Failed to create template" );
	runtime.wait_for_builds();

	assert_eq!( root, runtime.config().plugins_root.join( "Fresh" ));
	assert!( root.join( "plugin.json" ).is_file() );
	assert!( root.join( "src" ).join( "lib.rs" ).is_file() );
	assert!( runtime.registry().is_name_taken( "Fresh" ));

	let record = runtime.registry().record( &root ).expect( "Template was not registered" );
	assert_eq!( record.metadata().map(| metadata | metadata.name() ), Some( "Fresh" ));
	assert!( record.instance().is_some() );
	assert_eq!( compiler.calls(), [ "Fresh" ]);

}

#[test]
fn templates_refuse_taken_names() {

	let ( _dir, config ) = workspace();
	let runtime = PluginRuntime::start( config, pipeline( RecordingCompiler::default(), ProbeLoader::default() ))
		.expect( "Failed to start runtime" );
	runtime.create_template( "Twice" ).expect( "Failed to create template" );

	match runtime.create_template( "Twice" ) {
		Err( RuntimeError::Scaffold( ScaffoldError::NameTaken( name ))) => assert_eq!( name, "Twice" ),
		value => panic!( "Expected NameTaken error, found: {:#?}", value ),
	}
	assert_eq!( runtime.registry().len(), 1 );

}
