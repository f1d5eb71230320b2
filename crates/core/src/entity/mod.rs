//! Entity file synchronization.
//!
//! Entities expose their file fields through [`FileEntity`]. Three services
//! act on them, driven by the lifecycle subscriber:
//! - [`FileLoader`] - rebuilds file values from persisted paths
//! - [`FileUpdater`] - copies new content in and detects replaced files
//! - [`FileRemover`] - stages files for deletion and deletes them on flush

mod loader;
mod path;
mod remover;
mod updater;

pub use loader::FileLoader;
pub use path::{generate_path, sanitize_filename};
pub use remover::FileRemover;
pub use updater::FileUpdater;

use crate::error::{FilesError, FilesResult};
use crate::file::WebFile;
use crate::mapping::EntityFieldBinding;

/// Field access for entities that carry files.
///
/// `file_slot` and `path_slot` return `None` for names the entity does not
/// have. A mapped field without a slot is reported as
/// [`FilesError::UnknownField`].
pub trait FileEntity: Send {
    /// Entity type name, as used in the field mapping.
    fn entity_type(&self) -> &str;

    /// Mutable access to a file field.
    fn file_slot(&mut self, field: &str) -> Option<&mut Option<WebFile>>;

    /// Mutable access to a path field.
    fn path_slot(&mut self, field: &str) -> Option<&mut Option<String>>;
}

/// Implements [`FileEntity`] for a struct with named file and path fields.
///
/// ```
/// use filebind_core::file::WebFile;
///
/// struct Document {
///     file: Option<WebFile>,
///     file_path: Option<String>,
/// }
///
/// filebind_core::impl_file_entity!(Document, "document", files { file }, paths { file_path });
/// ```
#[macro_export]
macro_rules! impl_file_entity {
    ($ty:ty, $name:literal, files { $($file:ident),* $(,)? }, paths { $($path:ident),* $(,)? }) => {
        impl $crate::entity::FileEntity for $ty {
            fn entity_type(&self) -> &str {
                $name
            }

            #[allow(unused_variables)]
            fn file_slot(&mut self, field: &str) -> Option<&mut Option<$crate::file::WebFile>> {
                $(
                    if field == stringify!($file) {
                        return Some(&mut self.$file);
                    }
                )*
                None
            }

            #[allow(unused_variables)]
            fn path_slot(&mut self, field: &str) -> Option<&mut Option<String>> {
                $(
                    if field == stringify!($path) {
                        return Some(&mut self.$path);
                    }
                )*
                None
            }
        }
    };
}

fn file_slot<'e, E: FileEntity + ?Sized>(
    entity: &'e mut E,
    binding: &EntityFieldBinding,
) -> FilesResult<&'e mut Option<WebFile>> {
    entity
        .file_slot(&binding.field_name)
        .ok_or_else(|| FilesError::unknown_field(&binding.entity_type, &binding.field_name))
}

fn path_slot<'e, E: FileEntity + ?Sized>(
    entity: &'e mut E,
    binding: &EntityFieldBinding,
) -> FilesResult<&'e mut Option<String>> {
    entity
        .path_slot(&binding.path_field)
        .ok_or_else(|| FilesError::unknown_field(&binding.entity_type, &binding.path_field))
}
