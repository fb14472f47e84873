//! Bounded pool of preloaded model instances with admission control.
//!
//! Loading classifier weights is expensive, so a fixed set of instances is
//! constructed once and handed out one request at a time. Saturation is
//! surfaced immediately instead of queueing; callers translate it into a
//! "busy, retry later" outcome. This bounds the memory and CPU cost of a
//! burst of concurrent inference requests.

use std::ops::Deref;
use std::path::Path;
use std::sync::Mutex;

use crate::models::ModelLoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    Busy,
}

/// Fixed-capacity registry of preloaded model instances for one model kind.
///
/// The busy table is the only shared mutable state; the scan-and-flip in
/// [`ModelPool::acquire`] runs under its lock so two concurrent acquires can
/// never be granted the same slot.
pub struct ModelPool<M> {
    kind: &'static str,
    states: Mutex<Vec<SlotState>>,
    models: Vec<M>,
}

/// Exclusive handle to one pool slot; the slot is released on drop, on every
/// exit path including unwinding.
pub struct SlotGuard<'pool, M> {
    pool: &'pool ModelPool<M>,
    index: usize,
}

impl<M> ModelPool<M> {
    /// Load `count` independent model instances from one artifact.
    ///
    /// Any load failure aborts construction; startup code decides whether
    /// that is fatal or whether to continue with a zero-capacity pool.
    pub fn initialize<F>(
        kind: &'static str,
        count: usize,
        artifact: &Path,
        load: F,
    ) -> Result<Self, ModelLoadError>
    where
        F: Fn(&Path) -> Result<M, ModelLoadError>,
    {
        let mut models = Vec::with_capacity(count);
        for slot in 0..count {
            let model = load(artifact)?;
            tracing::debug!(kind, slot, artifact = %artifact.display(), "Loaded model instance");
            models.push(model);
        }
        tracing::info!(kind, slots = count, "Model pool initialized");
        Ok(Self::from_models(kind, models))
    }

    /// Build a pool around already-constructed instances.
    pub fn from_models(kind: &'static str, models: Vec<M>) -> Self {
        let states = Mutex::new(vec![SlotState::Free; models.len()]);
        Self {
            kind,
            states,
            models,
        }
    }

    /// Claim the first free slot, scanning in stable order from slot zero.
    ///
    /// Returns `None` immediately when every slot is busy; acquisition never
    /// blocks beyond the table lock and never queues.
    pub fn acquire(&self) -> Option<SlotGuard<'_, M>> {
        let mut states = self.lock_states();
        let index = states.iter().position(|&s| s == SlotState::Free)?;
        states[index] = SlotState::Busy;
        drop(states);
        tracing::debug!(kind = self.kind, slot = index, "Slot acquired");
        Some(SlotGuard { pool: self, index })
    }

    /// Acquire, run `f` against the slot's model, and release on all paths.
    ///
    /// `None` means no slot was free; the closure's own result is passed
    /// through untouched otherwise.
    pub fn with_slot<T, E>(
        &self,
        f: impl FnOnce(&M) -> Result<T, E>,
    ) -> Option<Result<T, E>> {
        let guard = self.acquire()?;
        Some(f(&guard))
    }

    /// Total number of slots, busy or free.
    pub fn capacity(&self) -> usize {
        self.models.len()
    }

    /// Read-only look at the first instance, for model metadata queries.
    ///
    /// Every slot is loaded from the same artifact, so instance zero speaks
    /// for all of them. This does not claim a slot.
    pub fn first_model(&self) -> Option<&M> {
        self.models.first()
    }

    /// Number of slots currently free.
    pub fn free_slots(&self) -> usize {
        self.lock_states()
            .iter()
            .filter(|&&s| s == SlotState::Free)
            .count()
    }

    fn release(&self, index: usize) {
        let mut states = self.lock_states();
        states[index] = SlotState::Free;
        drop(states);
        tracing::debug!(kind = self.kind, slot = index, "Slot released");
    }

    fn lock_states(&self) -> std::sync::MutexGuard<'_, Vec<SlotState>> {
        // A poisoned table only means another thread panicked mid-scan; the
        // flags themselves are always valid.
        self.states.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl<M> SlotGuard<'_, M> {
    /// Index of the slot this guard holds.
    pub fn slot_index(&self) -> usize {
        self.index
    }
}

impl<M> Deref for SlotGuard<'_, M> {
    type Target = M;

    fn deref(&self) -> &M {
        &self.pool.models[self.index]
    }
}

impl<M> Drop for SlotGuard<'_, M> {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}
