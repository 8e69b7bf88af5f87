//! Internal disposal bag for container teardown.

use std::collections::HashSet;

use crate::resolver::Instance;

/// Instances awaiting disposal, executed in LIFO order.
///
/// Each object is queued at most once however many keys or resolvers
/// hand it in, so it is disposed exactly once.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<Instance>,
    seen: HashSet<*const ()>,
}

impl DisposeBag {
    /// Queue an instance; repeats of an already queued object are ignored.
    pub(crate) fn push(&mut self, instance: Instance) {
        if self.seen.insert(instance.address()) {
            self.entries.push(instance);
        }
    }

    /// Dispose every live queued instance, last pushed first.
    pub(crate) fn dispose_all(&mut self) {
        while let Some(instance) = self.entries.pop() {
            instance.dispose();
        }
        self.seen.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
