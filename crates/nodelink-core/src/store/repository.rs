use crate::errors::Result;
use crate::model::Document;

/// Storage for the documents of one collection
///
/// Implementations own their synchronization so a single registry can be
/// shared by concurrent request handlers. The core never holds a lock across
/// two calls; consistency between a read and the following write comes from
/// the `version` compare-and-swap in [`Repository::update`].
pub trait Repository: Send + Sync {
    /// Name of the collection this repository serves
    fn collection_name(&self) -> &str;

    /// Fetch a live document
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if the uuid is unknown or the document is soft-deleted.
    fn find_by_uuid(&self, uuid: &str) -> Result<Document>;

    /// Insert a new document; the stored copy gets version 1
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the uuid is taken (including by a soft-deleted document).
    fn save(&self, document: Document) -> Result<Document>;

    /// Overwrite a document if nobody wrote it since it was read
    ///
    /// `document.version` must equal the stored version. The stored copy gets
    /// the next version and a fresh `updated_at`.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if absent, `VersionConflict` if the versions differ.
    fn update(&self, document: Document) -> Result<Document>;

    /// Remove a document permanently
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if absent.
    fn delete_by_uuid(&self, uuid: &str) -> Result<()>;

    /// Flag a document as deleted without removing it
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if absent or already soft-deleted.
    fn soft_delete_by_uuid(&self, uuid: &str) -> Result<Document> {
        let mut document = self.find_by_uuid(uuid)?;
        document.is_deleted = true;
        self.update(document)
    }

    /// All live documents, ordered by uuid
    ///
    /// # Errors
    ///
    /// Backend failures only.
    fn list(&self) -> Result<Vec<Document>>;
}
