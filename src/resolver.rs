//! Dependency resolution.
//!
//! A [`ResolverChain`] tries its backends in registration order and returns the
//! first hit. Backends never fail on an unmet dependency; they answer `None`
//! and let the next backend try. Only the chain turns "nobody could resolve
//! this" into an error, and it does so after attempting every identifier so a
//! single build diagnostic names all of them.

mod local ;
mod package ;

use std::path::{ Path, PathBuf };
use itertools::Itertools ;
use nonempty_collections::NEVec ;
use thiserror::Error ;
use tracing::debug ;

use crate::utils::ResultList ;

pub use local::LocalBinaryResolver ;
pub use package::{ PackageResolver, PackageSource, PackageId, DirectoryPackageSource, FetchError };



/// A dependency identifier resolved to a concrete loadable binary.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct DependencyReference {
	identifier: String,
	path: PathBuf,
	resolver: String,
}

impl DependencyReference {

	pub fn new( identifier: impl Into<String>, path: impl Into<PathBuf>, resolver: impl Into<String> ) -> Self {
		Self { identifier: identifier.into(), path: path.into(), resolver: resolver.into() }
	}

	/// The identifier as declared in the plugin descriptor.
	#[inline] pub fn identifier( &self ) -> &str { &self.identifier }
	/// Path of the resolved binary.
	#[inline] pub fn path( &self ) -> &Path { &self.path }
	/// Name of the backend that resolved it.
	#[inline] pub fn resolver( &self ) -> &str { &self.resolver }

}

/// One resolution backend.
pub trait DependencyResolver: Send + Sync {

	/// Short name recorded in every [`DependencyReference`] this backend produces.
	fn name( &self ) -> &str ;

	/// Attempts to resolve one identifier. An unmet dependency is `None`, not an error.
	fn resolve( &self, identifier: &str ) -> Option<DependencyReference> ;

}

/// Returned when at least one identifier could not be resolved by any backend.
#[derive( Error, Debug )]
pub enum ResolveError {
	#[error( "Unresolved dependencies: {}", .0.iter().into_iter().join( ", " ))]
	Unresolved( NEVec<String> ),
}

impl ResolveError {
	/// Every identifier that failed, in declaration order.
	pub fn unresolved( &self ) -> Vec<&str> {
		match self {
			Self::Unresolved( identifiers ) => identifiers.iter().into_iter().map( String::as_str ).collect(),
		}
	}
}

/// Ordered fallback sequence of [`DependencyResolver`]s.
#[derive( Default )]
pub struct ResolverChain {
	resolvers: Vec<Box<dyn DependencyResolver>>,
}

impl ResolverChain {

	pub fn new() -> Self { Self::default() }

	/// Appends a backend; it is tried after every backend added before it.
	pub fn with_resolver( mut self, resolver: impl DependencyResolver + 'static ) -> Self {
		self.add_resolver( resolver );
		self
	}

	/// Appends a backend; it is tried after every backend added before it.
	pub fn add_resolver( &mut self, resolver: impl DependencyResolver + 'static ) {
		self.resolvers.push( Box::new( resolver ));
	}

	#[inline] pub fn len( &self ) -> usize { self.resolvers.len() }
	#[inline] pub fn is_empty( &self ) -> bool { self.resolvers.is_empty() }

	/// Returns the first backend's answer for `identifier`.
	pub fn resolve( &self, identifier: &str ) -> Option<DependencyReference> {
		self.resolvers.iter().find_map(| resolver | resolver.resolve( identifier ))
	}

	/// Resolves every identifier, in order.
	///
	/// # Errors
	/// Returns [`ResolveError::Unresolved`] naming every identifier no backend
	/// could resolve; the other identifiers are still attempted.
	pub fn resolve_all<'a>(
		&self,
		identifiers: impl IntoIterator<Item = &'a String>,
	) -> Result<Vec<DependencyReference>, ResolveError> {

		let ( resolved, unresolved ) = identifiers.into_iter()
			.map(| identifier | self.resolve( identifier ).ok_or_else(|| identifier.clone() ))
			.collect::<ResultList<_, _>>()
			.deconstruct();

		for reference in &resolved {
			debug!( identifier = reference.identifier(), resolver = reference.resolver(), "Resolved dependency" );
		}

		match NEVec::try_from_vec( unresolved ) {
			None => Ok( resolved ),
			Some( unresolved ) => Err( ResolveError::Unresolved( unresolved )),
		}

	}

}

impl std::fmt::Debug for ResolverChain {
	fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
		f.debug_list().entries( self.resolvers.iter().map(| resolver | resolver.name() )).finish()
	}
}
