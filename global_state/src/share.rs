use fnv::FnvHashMap;

use shared_gl::error::{HookError, Result};
use shared_gl::types::ContextHandle;

/// Resource sharing between rendering contexts.  Each context has at most one parent; the root
/// of a tree owns the resources every context in it can see.
#[derive(Default, Debug)]
pub struct SharingForest {
    parent: FnvHashMap<ContextHandle, Option<ContextHandle>>,
}

impl SharingForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// A freshly created context shares with nothing.  Handle values are recycled by the
    /// driver, so any old edge for this handle is dropped.
    pub fn add_root(&mut self, ctx: ContextHandle) {
        self.remove(ctx);
        self.parent.insert(ctx, None);
    }

    /// Make `child` share resources with `parent`.  Re-parenting a context that has
    /// descendants is rejected so the forest can't grow a cycle.
    pub fn set_parent(&mut self, child: ContextHandle, parent: ContextHandle) -> Result<()> {
        if child.is_null() || parent.is_null() {
            return Err(HookError::SharingRejected("null context".to_owned()));
        }
        if child == parent {
            return Err(HookError::SharingRejected(format!(
                "context {:x} can't share with itself",
                child.0
            )));
        }
        if self.has_descendants(child) {
            return Err(HookError::SharingRejected(format!(
                "context {:x} already has contexts sharing with it",
                child.0
            )));
        }
        self.parent.entry(parent).or_insert(None);
        self.parent.insert(child, Some(parent));
        Ok(())
    }

    pub fn parent(&self, ctx: ContextHandle) -> Option<ContextHandle> {
        self.parent.get(&ctx).copied().flatten()
    }

    pub fn contains(&self, ctx: ContextHandle) -> bool {
        self.parent.contains_key(&ctx)
    }

    /// Follow parent links to the root.  Unknown contexts are their own root.
    pub fn resolve_root(&self, ctx: ContextHandle) -> ContextHandle {
        let mut cur = ctx;
        // bounded walk; set_parent keeps the forest acyclic, this just keeps a bug from hanging
        // the host
        for _ in 0..=self.parent.len() {
            match self.parent(cur) {
                Some(p) => cur = p,
                None => return cur,
            }
        }
        cur
    }

    /// Forget a deleted context.  Its children become roots; they are not moved up to the
    /// grandparent.
    pub fn remove(&mut self, ctx: ContextHandle) {
        if self.parent.remove(&ctx).is_none() {
            return;
        }
        for p in self.parent.values_mut() {
            if *p == Some(ctx) {
                *p = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    fn has_descendants(&self, ctx: ContextHandle) -> bool {
        self.parent.values().any(|p| *p == Some(ctx))
    }
}
