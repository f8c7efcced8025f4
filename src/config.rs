//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) yields
//! a working configuration rooted at `./dotplugins`.

use std::path::{ Path, PathBuf };
use std::time::Duration ;
use pipe_trait::Pipe ;
use serde::{ Deserialize, Serialize };
use thiserror::Error ;



/// Errors that can occur while reading a [`RuntimeConfig`] from disk.
#[derive( Error, Debug )]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error( "IO Error: {0}" )] Io( #[from] std::io::Error ),
	/// The configuration file is not valid JSON or has mistyped fields.
	#[error( "Parse Error: {0}" )] Parse( #[from] serde_json::Error ),
}

/// Settings shared by the registry, the build worker and the source watcher.
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
#[serde( default, rename_all = "kebab-case" )]
pub struct RuntimeConfig {
	/// Directory whose immediate subdirectories are plugins.
	pub plugins_root: PathBuf,
	/// Directory under which each plugin gets its own build output directory.
	pub output_root: PathBuf,
	/// Host binaries every plugin is built against, in descriptor order.
	pub host_references: Vec<PathBuf>,
	/// File extensions (without the dot) that count as plugin sources.
	pub source_extensions: Vec<String>,
	/// Folder or file names skipped when enumerating sources.
	pub excluded: Vec<String>,
	/// Quiet period that ends a burst of filesystem events.
	pub debounce_ms: u64,
	/// Delay before an idle worker retries plugins whose last build failed.
	pub retry_interval_ms: Option<u64>,
	/// Whether [`PluginRuntime`]( crate::PluginRuntime ) starts a source watcher.
	pub watch: bool,
}

impl Default for RuntimeConfig {
	fn default() -> Self {
		Self {
			plugins_root: PathBuf::from( "dotplugins" ),
			output_root: PathBuf::from( ".live-link" ).join( "build" ),
			host_references: vec![
				PathBuf::from( "host" ).join( "live-link-bindings.wasm" ),
				PathBuf::from( "host" ).join( "live-link-api.wasm" ),
			],
			source_extensions: vec![ "rs".to_string() ],
			excluded: [ "bin", "obj", "target", ".git" ].into_iter().map( String::from ).collect(),
			debounce_ms: 200,
			retry_interval_ms: Some( 30_000 ),
			watch: true,
		}
	}
}

impl RuntimeConfig {

	/// Reads a JSON configuration file. Missing keys fall back to their defaults.
	///
	/// # Errors
	/// Returns an error if the file cannot be read or parsed.
	pub fn from_file( path: impl AsRef<Path> ) -> Result<Self, ConfigError> {
		std::fs::read_to_string( path )?
			.pipe_ref(| text | serde_json::from_str( text ))
			.map_err( ConfigError::from )
	}

	/// Sets the directory scanned for plugins.
	pub fn with_plugins_root( mut self, path: impl Into<PathBuf> ) -> Self {
		self.plugins_root = path.into();
		self
	}

	/// Sets the directory that receives build outputs.
	pub fn with_output_root( mut self, path: impl Into<PathBuf> ) -> Self {
		self.output_root = path.into();
		self
	}

	/// Replaces the host reference binaries.
	pub fn with_host_references( mut self, references: impl IntoIterator<Item = impl Into<PathBuf>> ) -> Self {
		self.host_references = references.into_iter().map( Into::into ).collect();
		self
	}

	/// Replaces the list of source extensions.
	pub fn with_source_extensions( mut self, extensions: impl IntoIterator<Item = impl Into<String>> ) -> Self {
		self.source_extensions = extensions.into_iter().map( Into::into ).collect();
		self
	}

	/// Sets the debounce window in milliseconds.
	pub fn with_debounce_ms( mut self, millis: u64 ) -> Self {
		self.debounce_ms = millis ;
		self
	}

	/// Sets or disables (`None`) the periodic retry of failed builds.
	pub fn with_retry_interval_ms( mut self, millis: Option<u64> ) -> Self {
		self.retry_interval_ms = millis ;
		self
	}

	/// Enables or disables the filesystem watcher.
	pub fn with_watch( mut self, watch: bool ) -> Self {
		self.watch = watch ;
		self
	}

	#[inline] pub fn debounce( &self ) -> Duration { Duration::from_millis( self.debounce_ms )}
	#[inline] pub fn retry_interval( &self ) -> Option<Duration> { self.retry_interval_ms.map( Duration::from_millis )}

	/// Whether `name` is a folder or file name that source enumeration skips.
	#[inline] pub fn is_excluded( &self, name: &str ) -> bool {
		self.excluded.iter().any(| excluded | excluded == name )
	}

	/// Whether `path` has one of the configured source extensions.
	pub fn is_source_file( &self, path: &Path ) -> bool {
		match path.extension().and_then(| ext | ext.to_str()) {
			Some( ext ) => self.source_extensions.iter().any(| allowed | allowed == ext ),
			None => false,
		}
	}

}
