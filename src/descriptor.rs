//! Build descriptor generation.
//!
//! The build descriptor is the machine-generated project file handed to the
//! compiler. It is a pure function of the plugin's metadata, its resolved
//! dependencies and the host references, and renders byte-identically for
//! identical inputs so an unchanged descriptor is never rewritten.

use std::path::{ Path, PathBuf };
use serde::{ Deserialize, Serialize };
use thiserror::Error ;

use crate::metadata::PluginMetadata ;
use crate::resolver::DependencyReference ;



/// File name of the generated descriptor at the root of every plugin.
pub const BUILD_DESCRIPTOR_FILE: &str = "plugin.build.json" ;

#[derive( Error, Debug )]
pub enum DescriptorError {
	#[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
	#[error( "Serialisation Error: {0}" )] Serialise( #[from] serde_json::Error ),
}

/// A resolved dependency as recorded in the descriptor.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct DescriptorDependency {
	pub identifier: String,
	pub path: PathBuf,
	pub resolver: String,
}

/// The generated build project for one plugin.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
#[serde( rename_all = "kebab-case" )]
pub struct BuildDescriptor {
	pub name: String,
	pub version: String,
	pub description: String,
	pub author: String,
	pub website: String,
	pub host_references: Vec<PathBuf>,
	pub dependencies: Vec<DescriptorDependency>,
}

impl BuildDescriptor {

	/// Renders the descriptor as pretty JSON with a trailing newline.
	///
	/// # Errors
	/// Fails only if a path is not valid UTF-8.
	pub fn render( &self ) -> Result<String, DescriptorError> {
		let mut text = serde_json::to_string_pretty( self )?;
		text.push( '\n' );
		Ok( text )
	}

	/// Writes the descriptor to `path` unless the file already holds exactly
	/// this content. Returns whether the file was written.
	///
	/// # Errors
	/// Returns an error if rendering or writing fails.
	pub fn save( &self, path: &Path ) -> Result<bool, DescriptorError> {
		let text = self.render()?;
		match std::fs::read_to_string( path ) {
			Ok( existing ) if existing == text => return Ok( false ),
			Ok( _ ) => {}
			Err( err ) if err.kind() == std::io::ErrorKind::NotFound => {}
			Err( err ) => return Err( err.into() ),
		}
		std::fs::write( path, text )?;
		Ok( true )
	}

	/// Reads a previously saved descriptor.
	///
	/// # Errors
	/// Returns an error if the file is missing or not a descriptor.
	pub fn load( path: &Path ) -> Result<Self, DescriptorError> {
		Ok( serde_json::from_str( &std::fs::read_to_string( path )? )? )
	}

}

/// Builds [`BuildDescriptor`]s against a fixed set of host references.
#[derive( Debug, Clone, Default )]
pub struct DescriptorGenerator {
	host_references: Vec<PathBuf>,
}

impl DescriptorGenerator {

	pub fn new( host_references: impl IntoIterator<Item = impl Into<PathBuf>> ) -> Self {
		Self { host_references: host_references.into_iter().map( Into::into ).collect() }
	}

	#[inline] pub fn host_references( &self ) -> &[PathBuf] { &self.host_references }

	/// Produces the descriptor for `metadata` built against `dependencies`.
	///
	/// Dependencies are recorded sorted by identifier whatever order they are
	/// passed in.
	pub fn generate( &self, metadata: &PluginMetadata, dependencies: &[DependencyReference] ) -> BuildDescriptor {
		let mut dependencies = dependencies.iter()
			.map(| reference | DescriptorDependency {
				identifier: reference.identifier().to_string(),
				path: reference.path().to_path_buf(),
				resolver: reference.resolver().to_string(),
			})
			.collect::<Vec<_>>();
		dependencies.sort_by(| a, b | a.identifier.cmp( &b.identifier ));
		dependencies.dedup_by(| a, b | a.identifier == b.identifier );

		BuildDescriptor {
			name: metadata.name().to_string(),
			version: metadata.version().to_string(),
			description: metadata.description().to_string(),
			author: metadata.author().to_string(),
			website: metadata.website().to_string(),
			host_references: self.host_references.clone(),
			dependencies,
		}
	}

}
