use crate::{ColPos, TableID};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Created,
    Duplicated,
    Updated,
    Deleted,
}

/// Describes a committed column mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationEvent {
    pub table_id: TableID,
    pub position: ColPos,
    pub kind: MutationKind,
}

/// Receives events after a mutation is committed.
/// Listeners are invoked on the mutating thread and must not block.
pub trait MutationListener: Send + Sync {
    fn on_mutation(&self, event: &MutationEvent);
}

impl<F> MutationListener for F
where
    F: Fn(&MutationEvent) + Send + Sync,
{
    #[inline]
    fn on_mutation(&self, event: &MutationEvent) {
        self(event)
    }
}

#[derive(Default)]
pub struct Notifier {
    listeners: RwLock<Vec<Arc<dyn MutationListener>>>,
}

impl Notifier {
    #[inline]
    pub fn subscribe(&self, listener: Arc<dyn MutationListener>) {
        self.listeners.write().push(listener);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn notify(&self, event: MutationEvent) {
        // copy out so a listener may subscribe without deadlock.
        let listeners = self.listeners.read().clone();
        for l in listeners {
            l.on_mutation(&event);
        }
    }
}

impl std::fmt::Debug for Notifier {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_notifier() {
        let notifier = Notifier::default();
        assert!(notifier.is_empty());
        let events = Arc::new(Mutex::new(vec![]));
        let sink = Arc::clone(&events);
        notifier.subscribe(Arc::new(move |e: &MutationEvent| sink.lock().push(*e)));
        assert_eq!(notifier.len(), 1);
        let event = MutationEvent {
            table_id: 1,
            position: ColPos::from(4),
            kind: MutationKind::Deleted,
        };
        notifier.notify(event);
        assert_eq!(*events.lock(), vec![event]);
    }
}
