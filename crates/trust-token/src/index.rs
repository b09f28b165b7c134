//! Object index contract and the in-memory index used by tokens
//!
//! The loader only relies on the [`ObjectIndex`] trait: batched transactions,
//! replace-by-template, and single inserts. [`MemoryIndex`] is the reference
//! implementation; it knows nothing about files.

use std::collections::BTreeMap;
use std::fmt;

use crate::attrs::{AttributeType, Attributes};
use crate::builder::Builder;
use crate::error::IndexError;

/// Opaque handle of an object stored in an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transactional container of attribute-set objects.
pub trait ObjectIndex: Send {
    /// Open a batch. Batches nest; change notifications are held until the
    /// outermost batch finishes.
    fn batch(&mut self);

    /// Close the innermost batch.
    fn finish(&mut self);

    /// Whether a batch is currently open.
    fn in_batch(&self) -> bool;

    /// Add a single object.
    fn take(&mut self, attrs: Attributes) -> Result<ObjectHandle, IndexError>;

    /// Replace every object matching `matching` with `replacements`.
    ///
    /// When `key` is given, stored objects and replacements with equal values
    /// for `key` are paired and updated in place, keeping their handles. Stored
    /// objects left unpaired are removed; replacements left unpaired are added.
    /// On error the index is left untouched.
    fn replace_all(
        &mut self,
        matching: &Attributes,
        key: Option<AttributeType>,
        replacements: Vec<Attributes>,
    ) -> Result<(), IndexError>;

    /// Remove one object.
    fn remove(&mut self, handle: ObjectHandle) -> Result<Attributes, IndexError>;

    fn get(&self, handle: ObjectHandle) -> Option<&Attributes>;

    /// Handles of all objects matching `matching`, in handle order.
    fn find_all(&self, matching: &Attributes) -> Vec<ObjectHandle>;

    fn find(&self, matching: &Attributes) -> Option<ObjectHandle> {
        self.find_all(matching).into_iter().next()
    }

    /// All handles, in handle order.
    fn handles(&self) -> Vec<ObjectHandle>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory object index driving a [`Builder`].
pub struct MemoryIndex {
    builder: Box<dyn Builder>,
    objects: BTreeMap<ObjectHandle, Attributes>,
    next_handle: u64,
    batch_depth: usize,
    pending: Vec<ObjectHandle>,
}

impl MemoryIndex {
    pub fn new(builder: Box<dyn Builder>) -> Self {
        Self {
            builder,
            objects: BTreeMap::new(),
            next_handle: 1,
            batch_depth: 0,
            pending: Vec::new(),
        }
    }

    fn allocate(&mut self) -> ObjectHandle {
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn notify(&mut self, handle: ObjectHandle) {
        if self.batch_depth > 0 {
            if !self.pending.contains(&handle) {
                self.pending.push(handle);
            }
        } else {
            self.builder.changed(handle, self.objects.get(&handle));
        }
    }

    fn flush(&mut self) {
        for handle in std::mem::take(&mut self.pending) {
            self.builder.changed(handle, self.objects.get(&handle));
        }
    }
}

impl fmt::Debug for MemoryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryIndex")
            .field("objects", &self.objects.len())
            .field("batch_depth", &self.batch_depth)
            .finish()
    }
}

impl ObjectIndex for MemoryIndex {
    fn batch(&mut self) {
        self.batch_depth += 1;
    }

    fn finish(&mut self) {
        if self.batch_depth == 0 {
            tracing::warn!("index finish called without an open batch");
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.flush();
        }
    }

    fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    fn take(&mut self, attrs: Attributes) -> Result<ObjectHandle, IndexError> {
        let built = self.builder.build(None, attrs)?;
        let handle = self.allocate();
        self.objects.insert(handle, built);
        self.notify(handle);
        Ok(handle)
    }

    fn replace_all(
        &mut self,
        matching: &Attributes,
        key: Option<AttributeType>,
        replacements: Vec<Attributes>,
    ) -> Result<(), IndexError> {
        let mut unpaired = self.find_all(matching);
        let mut updates = Vec::new();
        let mut additions = Vec::new();

        // Build everything first so a rejected object leaves the index as it was
        for replacement in replacements {
            let paired = key.and_then(|key| {
                let wanted = replacement.get(key)?;
                let pos = unpaired.iter().position(|handle| {
                    self.objects.get(handle).and_then(|stored| stored.get(key)) == Some(wanted)
                })?;
                Some(unpaired.swap_remove(pos))
            });

            match paired {
                Some(handle) => {
                    let built = self.builder.build(self.objects.get(&handle), replacement)?;
                    updates.push((handle, built));
                }
                None => additions.push(self.builder.build(None, replacement)?),
            }
        }

        for (handle, attrs) in updates {
            self.objects.insert(handle, attrs);
            self.notify(handle);
        }
        for handle in unpaired {
            self.objects.remove(&handle);
            self.notify(handle);
        }
        for attrs in additions {
            let handle = self.allocate();
            self.objects.insert(handle, attrs);
            self.notify(handle);
        }

        Ok(())
    }

    fn remove(&mut self, handle: ObjectHandle) -> Result<Attributes, IndexError> {
        let removed = self
            .objects
            .remove(&handle)
            .ok_or(IndexError::HandleInvalid(handle))?;
        self.notify(handle);
        Ok(removed)
    }

    fn get(&self, handle: ObjectHandle) -> Option<&Attributes> {
        self.objects.get(&handle)
    }

    fn find_all(&self, matching: &Attributes) -> Vec<ObjectHandle> {
        self.objects
            .iter()
            .filter(|(_, attrs)| attrs.matches(matching))
            .map(|(handle, _)| *handle)
            .collect()
    }

    fn handles(&self) -> Vec<ObjectHandle> {
        self.objects.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.objects.len()
    }
}
