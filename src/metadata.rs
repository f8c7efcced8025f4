//! Plugin descriptor (`plugin.json`) parsing.

use std::path::Path ;
use itertools::Itertools ;
use serde::{ Deserialize, Serialize };
use thiserror::Error ;



/// File name of the hand-written descriptor at the root of every plugin.
pub const DESCRIPTOR_FILE: &str = "plugin.json" ;

/// Errors reading a plugin descriptor.
///
/// These are configuration errors: they are logged and leave the plugin either
/// unregistered-for-build or on its last known good metadata.
#[derive( Error, Debug )]
pub enum MetadataError {
	#[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
	#[error( "Invalid descriptor: {0}" )] Parse( #[from] serde_json::Error ),
}

/// Metadata declared by a plugin in its `plugin.json`.
///
/// Instances are immutable once read. The dependency list is always deduplicated
/// and sorted, so two descriptors declaring the same set of dependencies in a
/// different order compare equal and do not trigger a rebuild.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
pub struct PluginMetadata {
	name: String,
	#[serde( default )] description: String,
	#[serde( default )] version: String,
	#[serde( default )] author: String,
	#[serde( default )] website: String,
	#[serde( default, deserialize_with = "deserialize_dependencies" )]
	dependencies: Vec<String>,
}

impl PluginMetadata {

	/// Creates metadata with only a name and the given dependencies.
	pub fn new( name: impl Into<String>, dependencies: impl IntoIterator<Item = impl Into<String>> ) -> Self {
		Self {
			name: name.into(),
			description: String::new(),
			version: String::new(),
			author: String::new(),
			website: String::new(),
			dependencies: normalize_dependencies( dependencies.into_iter().map( Into::into )),
		}
	}

	pub fn with_version( mut self, version: impl Into<String> ) -> Self {
		self.version = version.into();
		self
	}

	pub fn with_description( mut self, description: impl Into<String> ) -> Self {
		self.description = description.into();
		self
	}

	/// Parses descriptor JSON.
	///
	/// # Errors
	/// Returns [`MetadataError::Parse`] if the text is not a valid descriptor.
	pub fn parse( text: &str ) -> Result<Self, MetadataError> {
		Ok( serde_json::from_str( text )? )
	}

	/// Reads and parses the descriptor file at `path`.
	///
	/// # Errors
	/// Returns an error if the file is missing, unreadable or invalid.
	pub fn read( path: &Path ) -> Result<Self, MetadataError> {
		Self::parse( &std::fs::read_to_string( path )? )
	}

	#[inline] pub fn name( &self ) -> &str { &self.name }
	#[inline] pub fn description( &self ) -> &str { &self.description }
	#[inline] pub fn version( &self ) -> &str { &self.version }
	#[inline] pub fn author( &self ) -> &str { &self.author }
	#[inline] pub fn website( &self ) -> &str { &self.website }
	/// Deduplicated, sorted dependency identifiers.
	#[inline] pub fn dependencies( &self ) -> &[String] { &self.dependencies }

}

/// Deduplicates and sorts dependency identifiers.
///
/// Two lists holding the same set of identifiers normalize to the same output
/// regardless of order or repetition.
pub fn normalize_dependencies( dependencies: impl IntoIterator<Item = String> ) -> Vec<String> {
	dependencies.into_iter().sorted().dedup().collect()
}

fn deserialize_dependencies<'de, D>( deserializer: D ) -> Result<Vec<String>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Option::<Vec<String>>::deserialize( deserializer )
		.map(| dependencies | normalize_dependencies( dependencies.unwrap_or_default() ))
}
