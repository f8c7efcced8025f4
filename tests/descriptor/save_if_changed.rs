use live_link::{ BUILD_DESCRIPTOR_FILE, BuildDescriptor, DescriptorGenerator, PluginMetadata };

#[test]
fn descriptor_save_skips_unchanged_content() {
	let ( dir, _ ) = crate::scratch::workspace();
	let path = dir.path().join( BUILD_DESCRIPTOR_FILE );
	let descriptor = DescriptorGenerator::new([ "host/api.wasm" ]).generate( &PluginMetadata::new( "Foo", [ "x" ]), &[] );

	assert!( descriptor.save( &path ).expect( "Failed to save descriptor" ));
	assert!( !descriptor.save( &path ).expect( "Failed to save descriptor" ));

	let changed = DescriptorGenerator::new([ "host/api.wasm" ])
		.generate( &PluginMetadata::new( "Foo", [ "x" ]).with_version( "2.0.0" ), &[] );
	assert!( changed.save( &path ).expect( "Failed to save descriptor" ));
	assert_eq!( BuildDescriptor::load( &path ).expect( "Failed to load descriptor" ), changed );
}

#[test]
fn descriptor_save_overwrites_hand_edits() {
	let ( dir, _ ) = crate::scratch::workspace();
	let path = dir.path().join( BUILD_DESCRIPTOR_FILE );
	std::fs::write( &path, "{ \"edited\": true }" ).unwrap();

	let descriptor = DescriptorGenerator::default().generate( &PluginMetadata::new( "Foo", Vec::<String>::new() ), &[] );
	assert!( descriptor.save( &path ).expect( "Failed to save descriptor" ));
	assert_eq!( std::fs::read_to_string( &path ).unwrap(), descriptor.render().unwrap() );
}
