use std::path::{ Path, PathBuf };
use walkdir::WalkDir ;

use crate::config::RuntimeConfig ;
use crate::descriptor::BUILD_DESCRIPTOR_FILE ;
use crate::loader::InstanceHandle ;
use crate::metadata::{ DESCRIPTOR_FILE, PluginMetadata };



/// Everything the registry knows about one plugin directory.
///
/// Records handed out by the registry are snapshots; mutating one does not
/// affect the registry.
#[derive( Debug, Clone )]
pub struct PluginRecord {
	pub(crate) metadata: Option<PluginMetadata>,
	pub(crate) path: PathBuf,
	pub(crate) descriptor_path: PathBuf,
	pub(crate) build_output_path: PathBuf,
	pub(crate) build_descriptor_path: PathBuf,
	pub(crate) source_files: Vec<PathBuf>,
	pub(crate) requires_rebuild: bool,
	pub(crate) dirty_stamp: u64,
	pub(crate) instance: Option<InstanceHandle>,
	pub(crate) diagnostics: Vec<String>,
}

impl PluginRecord {

	pub(crate) fn new( path: &Path, config: &RuntimeConfig ) -> Self {
		let dir_name = path.file_name().map( PathBuf::from ).unwrap_or_default();
		Self {
			metadata: None,
			path: path.to_path_buf(),
			descriptor_path: path.join( DESCRIPTOR_FILE ),
			build_output_path: config.output_root.join( dir_name ),
			build_descriptor_path: path.join( BUILD_DESCRIPTOR_FILE ),
			source_files: Vec::new(),
			requires_rebuild: false,
			dirty_stamp: 0,
			instance: None,
			diagnostics: Vec::new(),
		}
	}

	/// Last successfully parsed descriptor, if any.
	#[inline] pub fn metadata( &self ) -> Option<&PluginMetadata> { self.metadata.as_ref() }
	/// Plugin root directory; the record's identity.
	#[inline] pub fn path( &self ) -> &Path { &self.path }
	#[inline] pub fn descriptor_path( &self ) -> &Path { &self.descriptor_path }
	#[inline] pub fn build_output_path( &self ) -> &Path { &self.build_output_path }
	#[inline] pub fn build_descriptor_path( &self ) -> &Path { &self.build_descriptor_path }
	#[inline] pub fn source_files( &self ) -> &[PathBuf] { &self.source_files }
	#[inline] pub fn requires_rebuild( &self ) -> bool { self.requires_rebuild }
	#[inline] pub fn instance( &self ) -> Option<&InstanceHandle> { self.instance.as_ref() }
	/// Diagnostics of the most recent failed build, empty after a success.
	#[inline] pub fn diagnostics( &self ) -> &[String] { &self.diagnostics }

	/// Name used in logs: the metadata name, or the directory when metadata is missing.
	pub fn display_name( &self ) -> String {
		match &self.metadata {
			Some( metadata ) => metadata.name().to_string(),
			None => self.path.file_name()
				.map(| name | name.to_string_lossy().into_owned() )
				.unwrap_or_else(|| self.path.display().to_string() ),
		}
	}

}

/// Lists the source files under `root`, recursively and in a stable order,
/// skipping excluded folder and file names.
pub fn enumerate_sources( root: &Path, config: &RuntimeConfig ) -> Vec<PathBuf> {
	WalkDir::new( root )
		.sort_by_file_name()
		.into_iter()
		.filter_entry(| entry | entry.depth() == 0 || !entry.file_name().to_str().is_some_and(| name | config.is_excluded( name )))
		.filter_map( Result::ok )
		.filter(| entry | entry.file_type().is_file() && config.is_source_file( entry.path() ))
		.map( walkdir::DirEntry::into_path )
		.collect()
}
