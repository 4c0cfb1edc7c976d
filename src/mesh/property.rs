//! Generic per-element property storage.
//!
//! A [`PropertyContainer`] holds named attribute arrays for one element kind
//! (vertices, half-edges, edges or faces). Each array is type-erased behind
//! a trait object; callers name the expected value type on access and get a
//! clean error on mismatch instead of a silent coercion.
//!
//! The kernel drives the container lifecycle: every element insertion pushes
//! one default value into every registered store, and garbage collection
//! permutes all stores with the same mapping applied to the element arrays.
//! The container therefore upholds the lockstep invariant: every store's
//! length equals the element-array length of its kind.

use std::any::Any;

use crate::error::{MeshError, Result};

/// Type-erased interface every attribute array implements.
trait PropertyStore {
    fn name(&self) -> &str;
    fn len(&self) -> usize;
    /// Append one default-valued slot.
    fn push(&mut self);
    /// Grow or shrink to `n` slots, filling with the default.
    fn resize(&mut self, n: usize);
    fn clear(&mut self);
    /// Rebuild the store as `order.iter().map(|&i| data[i])`, the compaction
    /// permutation produced by garbage collection.
    fn gather(&mut self, order: &[usize]);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A concrete attribute array of values of type `T`.
struct Property<T> {
    name: String,
    default: T,
    data: Vec<T>,
}

impl<T: Clone + 'static> PropertyStore for Property<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push(&mut self) {
        self.data.push(self.default.clone());
    }

    fn resize(&mut self, n: usize) {
        self.data.resize(n, self.default.clone());
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn gather(&mut self, order: &[usize]) {
        self.data = order.iter().map(|&i| self.data[i].clone()).collect();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Named, dynamically-typed attribute arrays for one element kind.
///
/// All stores share a single length, kept equal to the element count of the
/// owning kind by the kernel.
#[derive(Default)]
pub struct PropertyContainer {
    stores: Vec<Box<dyn PropertyStore>>,
    len: usize,
}

impl PropertyContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared length of all stores (the element count of this kind).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the container tracks zero elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of registered properties.
    pub fn num_properties(&self) -> usize {
        self.stores.len()
    }

    /// Names of all registered properties.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stores.iter().map(|s| s.name())
    }

    /// Whether a property with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.stores.iter().position(|s| s.name() == name)
    }

    fn typed<T: 'static>(&self, name: &str) -> Result<&Property<T>> {
        let slot = self.find(name).ok_or_else(|| MeshError::PropertyNotFound {
            name: name.to_string(),
        })?;
        self.stores[slot]
            .as_any()
            .downcast_ref::<Property<T>>()
            .ok_or_else(|| MeshError::PropertyTypeMismatch {
                name: name.to_string(),
            })
    }

    fn typed_mut<T: 'static>(&mut self, name: &str) -> Result<&mut Property<T>> {
        let slot = self.find(name).ok_or_else(|| MeshError::PropertyNotFound {
            name: name.to_string(),
        })?;
        self.stores[slot]
            .as_any_mut()
            .downcast_mut::<Property<T>>()
            .ok_or_else(|| MeshError::PropertyTypeMismatch {
                name: name.to_string(),
            })
    }

    /// Register a property named `name` with element type `T`.
    ///
    /// With `existing == false`, any same-named store is replaced by a fresh
    /// one sized to the current element count and filled with `default`.
    /// With `existing == true`, this attaches to an already-registered store
    /// instead, so several collaborators can bind to the same attribute; it
    /// fails with `PropertyNotFound` if no such store exists, or
    /// `PropertyTypeMismatch` if the registered store holds another type.
    pub fn create<T: Clone + 'static>(
        &mut self,
        name: &str,
        default: T,
        existing: bool,
    ) -> Result<()> {
        if existing {
            // Attach only; verifies presence and type.
            self.typed::<T>(name)?;
            return Ok(());
        }
        let fresh: Box<dyn PropertyStore> = Box::new(Property {
            name: name.to_string(),
            default,
            data: Vec::new(),
        });
        let slot = match self.find(name) {
            Some(slot) => {
                self.stores[slot] = fresh;
                slot
            }
            None => {
                self.stores.push(fresh);
                self.stores.len() - 1
            }
        };
        self.stores[slot].resize(self.len);
        Ok(())
    }

    /// Read the value stored for element `index`.
    pub fn get<T: Clone + 'static>(&self, name: &str, index: usize) -> Result<T> {
        let prop = self.typed::<T>(name)?;
        prop.data.get(index).cloned().ok_or(MeshError::OutOfRange {
            index,
            len: prop.data.len(),
        })
    }

    /// Write the value stored for element `index`, growing the store with
    /// defaults first if `index` is past its end.
    pub fn set<T: Clone + 'static>(&mut self, name: &str, index: usize, value: T) -> Result<()> {
        let prop = self.typed_mut::<T>(name)?;
        if index >= prop.data.len() {
            let default = prop.default.clone();
            prop.data.resize(index + 1, default);
        }
        prop.data[index] = value;
        Ok(())
    }

    /// Borrow the whole value slice of a property.
    pub fn values<T: Clone + 'static>(&self, name: &str) -> Result<&[T]> {
        Ok(&self.typed::<T>(name)?.data)
    }

    /// Detach and free the store registered under `name`.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let slot = self.find(name).ok_or_else(|| MeshError::PropertyNotFound {
            name: name.to_string(),
        })?;
        self.stores.remove(slot);
        Ok(())
    }

    /// Drop every registered store, keeping the tracked length.
    pub(crate) fn remove_all(&mut self) {
        self.stores.clear();
    }

    /// Append one default-valued slot to every store.
    pub(crate) fn push_all(&mut self) {
        self.len += 1;
        for store in &mut self.stores {
            store.push();
        }
    }

    /// Append `n` default-valued slots to every store.
    pub(crate) fn push_n(&mut self, n: usize) {
        self.len += n;
        for store in &mut self.stores {
            store.resize(self.len);
        }
    }

    /// Reset every store to length zero.
    pub(crate) fn clear(&mut self) {
        self.len = 0;
        for store in &mut self.stores {
            store.clear();
        }
    }

    /// Apply the garbage-collection permutation: keep the slots listed in
    /// `order`, in that sequence.
    pub(crate) fn gather(&mut self, order: &[usize]) {
        self.len = order.len();
        for store in &mut self.stores {
            store.gather(order);
        }
    }
}
