//! Shared buffer-release handles.
//!
//! Every array view derived from one allocation holds a clone of the same
//! [`BufferHandle`]. The handle is reference counted with atomic updates; the
//! owner inside it is dropped, and the buffer released, when the last view
//! goes away.

use std::sync::Arc;

/// Something responsible for releasing a backing buffer.
///
/// Release happens in the implementor's `Drop`, which the handle guarantees
/// runs exactly once.
pub trait BufferOwner: Send + Sync {
    /// Size of the owned allocation in bytes, if known.
    fn capacity_bytes(&self) -> Option<usize> {
        None
    }
}

/// Shared, type-erased buffer-release handle.
#[derive(Clone)]
pub struct BufferHandle {
    owner: Arc<dyn BufferOwner>,
}

impl BufferHandle {
    /// Wrap an owner in a fresh handle with a single sharer.
    pub fn new<O: BufferOwner + 'static>(owner: O) -> Self {
        Self {
            owner: Arc::new(owner),
        }
    }

    /// Handle for memory the caller keeps alive by other means.
    ///
    /// Dropping the last sharer releases nothing.
    pub fn noop() -> Self {
        Self::new(NoopOwner)
    }

    /// Handle that runs `release` once when the last sharer drops.
    pub fn from_fn<F>(release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self::new(CallbackOwner {
            release: Some(release),
        })
    }

    /// Handle that keeps `vec` alive until the last sharer drops.
    pub fn from_vec<T: Send + Sync + 'static>(vec: Vec<T>) -> Self {
        Self::new(VecOwner { vec })
    }

    /// Whether both handles refer to the same owner.
    #[inline]
    pub fn ptr_eq(&self, other: &BufferHandle) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.owner) as *const (),
            Arc::as_ptr(&other.owner) as *const (),
        )
    }

    /// Number of live handles sharing this owner.
    #[inline]
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.owner)
    }

    #[inline]
    pub fn capacity_bytes(&self) -> Option<usize> {
        self.owner.capacity_bytes()
    }
}

impl std::fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferHandle")
            .field("owner", &Arc::as_ptr(&self.owner))
            .field("share_count", &self.share_count())
            .field("capacity_bytes", &self.capacity_bytes())
            .finish()
    }
}

struct NoopOwner;

impl BufferOwner for NoopOwner {}

struct CallbackOwner<F: FnOnce() + Send + Sync> {
    release: Option<F>,
}

impl<F: FnOnce() + Send + Sync> BufferOwner for CallbackOwner<F> {}

impl<F: FnOnce() + Send + Sync> Drop for CallbackOwner<F> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            tracing::trace!("running buffer release callback");
            release();
        }
    }
}

struct VecOwner<T> {
    vec: Vec<T>,
}

impl<T: Send + Sync> BufferOwner for VecOwner<T> {
    fn capacity_bytes(&self) -> Option<usize> {
        Some(std::mem::size_of_val(self.vec.as_slice()))
    }
}
