use std::collections::BTreeMap;
use std::sync::Arc;

use super::repository::Repository;
use crate::errors::{NodeLinkError, Result};

/// Collections of the education platform: (collection name, entity class)
pub const EDUCATION_COLLECTIONS: &[(&str, &str)] = &[
    ("curriculum_pathways", "CurriculumPathway"),
    ("learning_experiences", "LearningExperience"),
    ("learning_objects", "LearningObject"),
    ("learning_resources", "LearningResource"),
    ("assessments", "Assessment"),
    ("skills", "Skill"),
    ("competencies", "Competency"),
    ("association_groups", "AssociationGroup"),
];

/// Collection name → repository, plus entity class → collection name
///
/// Built once at startup and shared behind an `Arc`. Immutable after
/// `build()`, so lookups need no locking.
#[derive(Clone, Default)]
pub struct CollectionRegistry {
    repositories: BTreeMap<String, Arc<dyn Repository>>,
    classes: BTreeMap<String, String>,
}

impl std::fmt::Debug for CollectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionRegistry")
            .field("collections", &self.repositories.keys().collect::<Vec<_>>())
            .field("classes", &self.classes)
            .finish()
    }
}

/// Accumulates registrations for a [`CollectionRegistry`]
#[derive(Default)]
pub struct CollectionRegistryBuilder {
    registry: CollectionRegistry,
}

impl CollectionRegistryBuilder {
    /// Register a repository under its collection name and entity class
    ///
    /// A later registration for the same name or class replaces the earlier one.
    pub fn register(
        mut self,
        collection: impl Into<String>,
        entity_class: impl Into<String>,
        repository: Arc<dyn Repository>,
    ) -> Self {
        let collection = collection.into();
        self.registry
            .classes
            .insert(entity_class.into(), collection.clone());
        self.registry.repositories.insert(collection, repository);
        self
    }

    pub fn build(self) -> CollectionRegistry {
        self.registry
    }
}

impl CollectionRegistry {
    pub fn builder() -> CollectionRegistryBuilder {
        CollectionRegistryBuilder::default()
    }

    /// Registry with every standard education collection
    ///
    /// `factory` is called once per collection name to create its repository.
    pub fn education_platform<F>(mut factory: F) -> Self
    where
        F: FnMut(&str) -> Arc<dyn Repository>,
    {
        EDUCATION_COLLECTIONS
            .iter()
            .fold(Self::builder(), |builder, (collection, class)| {
                builder.register(*collection, *class, factory(collection))
            })
            .build()
    }

    /// Repository for a collection name, if registered
    pub fn repository(&self, collection: &str) -> Option<&Arc<dyn Repository>> {
        self.repositories.get(collection)
    }

    /// Repository for a collection name
    ///
    /// # Errors
    ///
    /// `UnknownCollection` if nothing is registered under the name.
    pub fn require(&self, collection: &str) -> Result<&Arc<dyn Repository>> {
        self.repository(collection)
            .ok_or_else(|| NodeLinkError::UnknownCollection {
                collection: collection.to_string(),
            })
    }

    /// Collection name for an entity class (exact match)
    ///
    /// # Errors
    ///
    /// `UnknownEntityClass` if the class was never registered.
    pub fn collection_name(&self, entity_class: &str) -> Result<&str> {
        self.classes
            .get(entity_class)
            .map(String::as_str)
            .ok_or_else(|| NodeLinkError::UnknownEntityClass {
                entity_class: entity_class.to_string(),
            })
    }

    /// Entity class registered for a collection name
    ///
    /// # Errors
    ///
    /// `UnknownCollection` if no class maps to the collection.
    pub fn entity_class(&self, collection: &str) -> Result<&str> {
        self.classes
            .iter()
            .find(|(_, name)| name.as_str() == collection)
            .map(|(class, _)| class.as_str())
            .ok_or_else(|| NodeLinkError::UnknownCollection {
                collection: collection.to_string(),
            })
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.repositories.contains_key(collection)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }
}
