use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};
use uuid::Uuid;

// 1. The ID (Handle)
// A typed uuid. Cheap to copy around, resolved through `Assets<T>`.
pub struct Handle<T> {
    pub id: Uuid,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn new() -> Self {
        Self::from_id(Uuid::new_v4())
    }

    pub fn from_id(id: Uuid) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.id).finish()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

// Handles key the GPU caches, so hash by id only.
impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// 2. The Storage
pub struct Assets<T> {
    storage: HashMap<Uuid, T>,
}

impl<T> Default for Assets<T> {
    fn default() -> Self {
        Self {
            storage: HashMap::new(),
        }
    }
}

impl<T> Assets<T> {
    pub fn add(&mut self, asset: T) -> Handle<T> {
        let handle = Handle::new();
        self.storage.insert(handle.id, asset);
        handle
    }

    /// Stores an asset under a handle that was issued before the data existed.
    pub fn insert(&mut self, handle: Handle<T>, asset: T) -> Option<T> {
        self.storage.insert(handle.id, asset)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.storage.get(&handle.id)
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.storage.contains_key(&handle.id)
    }

    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        self.storage.remove(&handle.id)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.storage
            .iter()
            .map(|(id, asset)| (Handle::from_id(*id), asset))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle list, ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
