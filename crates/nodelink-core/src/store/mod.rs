//! Document storage seam
//!
//! The core reads and writes documents only through [`Repository`], looked
//! up by collection name in a [`CollectionRegistry`].

pub mod memory;
pub mod registry;
pub mod repository;

pub use memory::InMemoryRepository;
pub use registry::{CollectionRegistry, CollectionRegistryBuilder, EDUCATION_COLLECTIONS};
pub use repository::Repository;
