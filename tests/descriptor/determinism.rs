use live_link::{ DependencyReference, DescriptorGenerator, PluginMetadata };

fn generator() -> DescriptorGenerator {
	DescriptorGenerator::new([ "host/live-link-bindings.wasm", "host/live-link-api.wasm" ])
}

#[test]
fn descriptor_renders_byte_identical() {
	let metadata = PluginMetadata::new( "Tracer", [ "b", "a" ]).with_version( "0.2.0" );
	let dependencies = [
		DependencyReference::new( "a", "lib/a.wasm", "local" ),
		DependencyReference::new( "b", "cache/b/1.0/b.wasm", "package" ),
	];

	let first = generator().generate( &metadata, &dependencies ).render().expect( "Failed to render descriptor" );
	let second = generator().generate( &metadata, &dependencies ).render().expect( "Failed to render descriptor" );
	assert_eq!( first, second );
	assert!( first.ends_with( "}\n" ));
}

#[test]
fn descriptor_ignores_dependency_order() {
	let metadata = PluginMetadata::new( "Tracer", [ "a", "b" ]);
	let a = DependencyReference::new( "a", "lib/a.wasm", "local" );
	let b = DependencyReference::new( "b", "lib/b.wasm", "local" );

	let forward = generator().generate( &metadata, &[ a.clone(), b.clone() ]);
	let backward = generator().generate( &metadata, &[ b, a ]);
	assert_eq!( forward, backward );
	assert_eq!( forward.render().unwrap(), backward.render().unwrap() );
}

#[test]
fn descriptor_carries_inputs() {
	let metadata = PluginMetadata::new( "Tracer", [ "a" ]).with_version( "0.2.0" ).with_description( "Traces" );
	let descriptor = generator().generate( &metadata, &[ DependencyReference::new( "a", "lib/a.wasm", "local" )]);

	assert_eq!( descriptor.name, "Tracer" );
	assert_eq!( descriptor.version, "0.2.0" );
	assert_eq!( descriptor.description, "Traces" );
	assert_eq!( descriptor.host_references, generator().host_references() );
	assert_eq!( descriptor.dependencies.len(), 1 );
	assert_eq!( descriptor.dependencies[0].resolver, "local" );

	let text = descriptor.render().unwrap();
	assert!( text.contains( "\"host-references\"" ), "{}", text );
}
