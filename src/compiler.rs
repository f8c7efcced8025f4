//! The compile capability the build worker depends on.
//!
//! The concrete toolchain invocation lives outside this crate. Anything that
//! can turn a build descriptor plus sources into a loadable binary implements
//! [`Compiler`].

use std::path::{ Path, PathBuf };
use itertools::Itertools ;
use thiserror::Error ;

use crate::descriptor::BuildDescriptor ;



/// Everything a compiler gets to see for one plugin.
#[derive( Debug, Clone, Copy )]
pub struct CompileRequest<'a> {
	pub plugin: &'a str,
	pub root: &'a Path,
	pub descriptor: &'a BuildDescriptor,
	pub descriptor_path: &'a Path,
	pub sources: &'a [PathBuf],
	pub output_dir: &'a Path,
}

/// A failed compilation.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
#[error( "Compilation failed:\n{}", .diagnostics.iter().join( "\n" ))]
pub struct CompileError {
	diagnostics: Vec<String>,
}

impl CompileError {

	pub fn new( diagnostics: impl IntoIterator<Item = impl Into<String>> ) -> Self {
		Self { diagnostics: diagnostics.into_iter().map( Into::into ).collect() }
	}

	#[inline] pub fn diagnostics( &self ) -> &[String] { &self.diagnostics }

}

/// Compiles one plugin into a loadable binary.
pub trait Compiler: Send + Sync {
	/// Returns the path of the produced binary.
	///
	/// # Errors
	/// Returns the compiler's diagnostics when the build fails.
	fn compile( &self, request: &CompileRequest<'_> ) -> Result<PathBuf, CompileError> ;
}

impl<F> Compiler for F
where
	F: Fn( &CompileRequest<'_> ) -> Result<PathBuf, CompileError> + Send + Sync,
{
	fn compile( &self, request: &CompileRequest<'_> ) -> Result<PathBuf, CompileError> { self( request ) }
}
