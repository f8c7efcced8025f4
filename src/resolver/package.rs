use std::path::{ Path, PathBuf };
use thiserror::Error ;
use tracing::{ debug, warn };

use super::{ DependencyReference, DependencyResolver };



/// A versioned package identifier of the form `name@version`.
#[derive( Debug, Clone, PartialEq, Eq, Hash )]
pub struct PackageId {
	name: String,
	version: String,
}

impl PackageId {

	pub fn new( name: impl Into<String>, version: impl Into<String> ) -> Self {
		Self { name: name.into(), version: version.into() }
	}

	/// Splits `name@version`. Returns `None` for anything else, including
	/// identifiers with an empty name or version or with path separators.
	pub fn parse( identifier: &str ) -> Option<Self> {
		let ( name, version ) = identifier.split_once( '@' )?;
		let valid = | part: &str | !part.is_empty()
			&& part != "." && part != ".."
			&& !part.contains([ '/', '\\', '@' ]);
		match valid( name ) && valid( version ) {
			true => Some( Self::new( name, version )),
			false => None,
		}
	}

	#[inline] pub fn name( &self ) -> &str { &self.name }
	#[inline] pub fn version( &self ) -> &str { &self.version }

}

impl std::fmt::Display for PackageId {
	fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result { write!( f, "{}@{}", self.name, self.version )}
}

/// Errors a [`PackageSource`] may report while fetching.
#[derive( Error, Debug )]
pub enum FetchError {
	#[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
	#[error( "Fetch failed: {0}" )] Failed( String ),
}

/// Where [`PackageResolver`] downloads packages from.
///
/// The network-backed package client lives outside this crate and plugs in
/// here; [`DirectoryPackageSource`] serves packages from a local mirror.
pub trait PackageSource: Send + Sync {
	/// Returns the package binary, or `None` if the source does not know the package.
	///
	/// # Errors
	/// Returns an error if the source knows the package but could not deliver it.
	fn fetch( &self, package: &PackageId ) -> Result<Option<Vec<u8>>, FetchError> ;
}

/// A [`PackageSource`] reading `<root>/<name>/<version>.wasm`.
#[derive( Debug, Clone )]
pub struct DirectoryPackageSource {
	root: PathBuf,
}

impl DirectoryPackageSource {
	pub fn new( root: impl Into<PathBuf> ) -> Self { Self { root: root.into() }}
}

impl PackageSource for DirectoryPackageSource {
	fn fetch( &self, package: &PackageId ) -> Result<Option<Vec<u8>>, FetchError> {
		let path = self.root.join( package.name() ).join( format!( "{}.wasm", package.version() ));
		match path.is_file() {
			true => Ok( Some( std::fs::read( path )? )),
			false => Ok( None ),
		}
	}
}

/// Resolves versioned package identifiers, caching downloaded artifacts.
///
/// Cached artifacts live at `<cache>/<name>/<version>/<name>.wasm` and are
/// reused without consulting the source again.
#[derive( Debug )]
pub struct PackageResolver<S> {
	source: S,
	cache_dir: PathBuf,
}

impl<S: PackageSource> PackageResolver<S> {

	pub const NAME: &str = "package" ;

	pub fn new( source: S, cache_dir: impl Into<PathBuf> ) -> Self {
		Self { source, cache_dir: cache_dir.into() }
	}

	#[inline] pub fn cache_dir( &self ) -> &Path { &self.cache_dir }

	/// Location of `package` inside the cache, whether or not it is present.
	pub fn cached_path( &self, package: &PackageId ) -> PathBuf {
		self.cache_dir
			.join( package.name() )
			.join( package.version() )
			.join( format!( "{}.wasm", package.name() ))
	}

	fn download( &self, package: &PackageId, target: &Path ) -> Result<bool, FetchError> {
		let Some( bytes ) = self.source.fetch( package )? else { return Ok( false ) };
		if let Some( parent ) = target.parent() { std::fs::create_dir_all( parent )? }
		std::fs::write( target, bytes )?;
		debug!( package = %package, path = %target.display(), "Cached package" );
		Ok( true )
	}

}

impl<S: PackageSource> DependencyResolver for PackageResolver<S> {

	fn name( &self ) -> &str { Self::NAME }

	fn resolve( &self, identifier: &str ) -> Option<DependencyReference> {
		let package = PackageId::parse( identifier )?;
		let path = self.cached_path( &package );
		if path.is_file() {
			return Some( DependencyReference::new( identifier, path, Self::NAME ))
		}
		match self.download( &package, &path ) {
			Ok( true ) => Some( DependencyReference::new( identifier, path, Self::NAME )),
			Ok( false ) => None,
			Err( err ) => {
				warn!( package = %package, error = %err, "Failed to fetch package" );
				None
			}
		}
	}

}
