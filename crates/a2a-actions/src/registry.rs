//! Action Registry
//!
//! Holds every registered [`ActionDescriptor`] in insertion order. Reads are
//! shared; `register` takes the write lock for the whole insert-and-bump
//! step, so a reader never sees a half-applied registration.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::action::ActionDescriptor;
use crate::error::RegistryError;

#[derive(Default)]
struct RegistryInner {
    actions: Vec<Arc<ActionDescriptor>>,
    index: HashMap<String, usize>,
    generation: u64,
}

/// Consistent view of the registry at one generation
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub generation: u64,
    pub actions: Vec<Arc<ActionDescriptor>>,
}

/// Name-indexed store of action descriptors
#[derive(Default)]
pub struct ActionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor. Fails if the name is taken; on success the
    /// generation advances, which invalidates any cached capability card.
    pub fn register(&self, descriptor: ActionDescriptor) -> Result<(), RegistryError> {
        let mut inner = self.inner.write();
        if inner.index.contains_key(descriptor.name()) {
            return Err(RegistryError::DuplicateAction(descriptor.name().to_string()));
        }

        let position = inner.actions.len();
        inner.index.insert(descriptor.name().to_string(), position);
        debug!(
            action = descriptor.name(),
            auth = %descriptor.required_authorization(),
            "Registered action"
        );
        inner.actions.push(Arc::new(descriptor));
        inner.generation += 1;
        Ok(())
    }

    /// Register several descriptors, stopping at the first failure
    pub fn register_all<I>(&self, descriptors: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = ActionDescriptor>,
    {
        descriptors
            .into_iter()
            .try_for_each(|descriptor| self.register(descriptor))
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<ActionDescriptor>, RegistryError> {
        let inner = self.inner.read();
        inner
            .index
            .get(name)
            .map(|&position| Arc::clone(&inner.actions[position]))
            .ok_or_else(|| RegistryError::UnknownAction(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().index.contains_key(name)
    }

    /// All descriptors in insertion order
    pub fn list(&self) -> Vec<Arc<ActionDescriptor>> {
        self.inner.read().actions.clone()
    }

    /// Descriptors and generation read under a single lock
    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.read();
        RegistrySnapshot {
            generation: inner.generation,
            actions: inner.actions.clone(),
        }
    }

    /// Counter bumped by every successful registration
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    pub fn len(&self) -> usize {
        self.inner.read().actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
