use std::path::{ Path, PathBuf };
use thiserror::Error ;
use tracing::info ;

use crate::metadata::DESCRIPTOR_FILE ;



const NAME_TOKEN: &str = "%PLUGIN_NAME%" ;
const DESCRIPTOR_TEMPLATE: &str = include_str!( "../templates/plugin.json" );
const SOURCE_TEMPLATE: &str = include_str!( "../templates/lib.rs" );

#[derive( Error, Debug )]
pub enum ScaffoldError {
	#[error( "A plugin named '{0}' already exists" )] NameTaken( String ),
	#[error( "Invalid plugin name '{0}'" )] InvalidName( String ),
	#[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
}

/// Whether `plugins_root/name` already exists.
#[inline] pub fn is_name_taken( plugins_root: &Path, name: &str ) -> bool { plugins_root.join( name ).exists() }

/// Creates `plugins_root/name` with a `plugin.json` and a starter
/// `src/lib.rs`, both with the plugin name filled in.
///
/// Nothing is created when the directory already exists.
///
/// # Errors
/// Returns [`ScaffoldError::NameTaken`] if the directory exists,
/// [`ScaffoldError::InvalidName`] if `name` is not a single path component.
pub fn create_template( plugins_root: &Path, name: &str ) -> Result<PathBuf, ScaffoldError> {

	let valid = !name.is_empty()
		&& name != "." && name != ".."
		&& !name.contains([ '/', '\\' ]);
	if !valid { return Err( ScaffoldError::InvalidName( name.to_string() )) }

	let root = plugins_root.join( name );
	std::fs::create_dir_all( plugins_root )?;
	match std::fs::create_dir( &root ) {
		Ok(()) => {}
		Err( err ) if err.kind() == std::io::ErrorKind::AlreadyExists => return Err( ScaffoldError::NameTaken( name.to_string() )),
		Err( err ) => return Err( err.into() ),
	}

	std::fs::write( root.join( DESCRIPTOR_FILE ), DESCRIPTOR_TEMPLATE.replace( NAME_TOKEN, name ))?;
	std::fs::create_dir( root.join( "src" ))?;
	std::fs::write( root.join( "src" ).join( "lib.rs" ), SOURCE_TEMPLATE.replace( NAME_TOKEN, name ))?;

	info!( plugin = name, path = %root.display(), "Created plugin template" );
	Ok( root )

}
