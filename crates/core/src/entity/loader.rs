//! Rebuilds file fields from persisted paths.

use std::sync::Arc;

use tracing::debug;

use super::{FileEntity, file_slot, path_slot};
use crate::error::FilesResult;
use crate::file::{FileReference, WebFile};
use crate::mapping::FieldMapping;

/// Populates file fields of freshly loaded entities.
#[derive(Debug, Clone)]
pub struct FileLoader {
    mapping: Arc<FieldMapping>,
}

impl FileLoader {
    /// Create a new loader.
    #[must_use]
    pub fn new(mapping: Arc<FieldMapping>) -> Self {
        Self { mapping }
    }

    /// Set every mapped file field from its path field.
    ///
    /// A set path becomes a stored reference in the binding's backend, an
    /// unset path clears the field. Storage is not consulted, so loading the
    /// same entity twice yields the same state.
    ///
    /// # Errors
    ///
    /// Returns an error if a mapped field has no accessor.
    pub fn load_entity_files<E: FileEntity + ?Sized>(&self, entity: &mut E) -> FilesResult<()> {
        let bindings = self.mapping.bindings_for(entity.entity_type());

        for binding in bindings {
            let path = path_slot(entity, binding)?.clone();
            let file = path.map(|path| WebFile::Stored(FileReference::new(&binding.backend_name, path)));
            debug!(
                entity = %binding.entity_type,
                field = %binding.field_name,
                loaded = file.is_some(),
                "Loaded file field"
            );
            *file_slot(entity, binding)? = file;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_support::{Broken, Comment, Document};
    use crate::error::FilesError;
    use crate::file::UploadedFile;
    use crate::mapping::EntityFieldBinding;

    fn loader() -> FileLoader {
        let mapping = FieldMapping::new()
            .with_binding(EntityFieldBinding::new("document", "file", "public", "documents"))
            .with_binding(EntityFieldBinding::new("broken", "file", "public", "broken"));
        FileLoader::new(Arc::new(mapping))
    }

    #[test]
    fn test_load_sets_stored_reference() {
        let mut document = Document {
            file: None,
            file_path: Some("documents/1/a.png".to_string()),
        };

        loader().load_entity_files(&mut document).unwrap();

        assert_eq!(
            document.file,
            Some(WebFile::Stored(FileReference::new("public", "documents/1/a.png")))
        );
    }

    #[test]
    fn test_load_clears_field_without_path() {
        let mut document = Document {
            file: Some(UploadedFile::new("stale.png", b"x".to_vec()).into()),
            file_path: None,
        };

        loader().load_entity_files(&mut document).unwrap();

        assert_eq!(document.file, None);
    }

    #[test]
    fn test_load_is_idempotent() {
        let loader = loader();
        let mut document = Document {
            file: None,
            file_path: Some("documents/1/a.png".to_string()),
        };

        loader.load_entity_files(&mut document).unwrap();
        let first = document.file.clone();
        loader.load_entity_files(&mut document).unwrap();

        assert_eq!(document.file, first);
        assert_eq!(document.file_path.as_deref(), Some("documents/1/a.png"));
    }

    #[test]
    fn test_unmapped_entity_is_noop() {
        let mut comment = Comment;
        assert!(loader().load_entity_files(&mut comment).is_ok());
    }

    #[test]
    fn test_missing_path_field_is_reported() {
        let mut broken = Broken::default();
        let err = loader().load_entity_files(&mut broken).unwrap_err();

        assert!(matches!(
            err,
            FilesError::UnknownField { ref entity, ref field } if entity == "broken" && field == "file_path"
        ));
    }
}
