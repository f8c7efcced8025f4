use std::path::PathBuf ;

use super::{ DependencyReference, DependencyResolver };



/// Resolves identifiers that name binaries already present on disk.
///
/// An identifier with an extension (`host-api.wasm`) is looked up verbatim;
/// one without (`host-api`) gets [`LocalBinaryResolver::EXTENSION`] appended.
/// Search directories are tried in order.
#[derive( Debug, Clone )]
pub struct LocalBinaryResolver {
	search_paths: Vec<PathBuf>,
}

impl LocalBinaryResolver {

	pub const NAME: &str = "local" ;
	pub const EXTENSION: &str = "wasm" ;

	pub fn new( search_paths: impl IntoIterator<Item = impl Into<PathBuf>> ) -> Self {
		Self { search_paths: search_paths.into_iter().map( Into::into ).collect() }
	}

	#[inline] pub fn search_paths( &self ) -> &[PathBuf] { &self.search_paths }

	fn file_name( identifier: &str ) -> Option<String> {
		if identifier.is_empty() || identifier.contains([ '/', '\\' ]) || identifier.starts_with( '.' ) {
			return None
		}
		match std::path::Path::new( identifier ).extension() {
			Some( _ ) => Some( identifier.to_string() ),
			None => Some( format!( "{}.{}", identifier, Self::EXTENSION )),
		}
	}

}

impl DependencyResolver for LocalBinaryResolver {

	fn name( &self ) -> &str { Self::NAME }

	fn resolve( &self, identifier: &str ) -> Option<DependencyReference> {
		let file_name = Self::file_name( identifier )?;
		self.search_paths.iter()
			.map(| dir | dir.join( &file_name ))
			.find(| candidate | candidate.is_file() )
			.map(| path | DependencyReference::new( identifier, path, Self::NAME ))
	}

}
