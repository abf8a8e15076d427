use tokio::sync::watch;
use tracing::debug;

use super::KeyValueStore;
use crate::domain;
use crate::error::CoreError;

const SELECTED_DOMAIN_KEY: &str = "selected_domain";

/// The domain the user is currently working on, persisted through a
/// [`KeyValueStore`] and broadcast to subscribers on change.
#[derive(Debug)]
pub struct DomainSelection<S> {
    store: S,
    current: watch::Sender<Option<String>>,
}

impl<S: KeyValueStore> DomainSelection<S> {
    /// Load the saved selection, falling back to `default` when nothing
    /// (or nothing valid) was saved.
    pub fn load(store: S, default: Option<&str>) -> Result<Self, CoreError> {
        let saved = store
            .get(SELECTED_DOMAIN_KEY)?
            .and_then(|d| domain::normalize(&d).ok());
        let initial = match saved {
            Some(d) => Some(d),
            None => default.map(domain::normalize).transpose()?,
        };
        let (current, _) = watch::channel(initial);
        Ok(Self { store, current })
    }

    pub fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// Validate, persist and publish a new selection. Subscribers are
    /// only notified when the value actually changes.
    pub fn set(&self, raw: &str) -> Result<String, CoreError> {
        let normalized = domain::normalize(raw)?;
        self.store.set(SELECTED_DOMAIN_KEY, normalized.clone())?;
        let changed = self.current.send_if_modified(|cur| {
            if cur.as_deref() == Some(normalized.as_str()) {
                false
            } else {
                *cur = Some(normalized.clone());
                true
            }
        });
        if changed {
            debug!(domain = %normalized, "selected domain changed");
        }
        Ok(normalized)
    }

    /// Subscribe to selection changes.
    pub fn on_domain_changed(&self) -> watch::Receiver<Option<String>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn default_used_when_nothing_saved() {
        let sel = DomainSelection::load(MemoryStore::new(), Some("Example.com")).unwrap();
        assert_eq!(sel.current().as_deref(), Some("example.com"));
    }

    #[test]
    fn saved_value_wins_over_default() {
        let store = Arc::new(MemoryStore::new());
        DomainSelection::load(store.clone(), None).unwrap().set("saved.example").unwrap();
        let sel = DomainSelection::load(store, Some("default.example")).unwrap();
        assert_eq!(sel.current().as_deref(), Some("saved.example"));
    }

    #[test]
    fn invalid_domain_rejected_and_not_persisted() {
        let sel = DomainSelection::load(MemoryStore::new(), None).unwrap();
        assert!(sel.set("not a domain").is_err());
        assert_eq!(sel.current(), None);
    }

    #[tokio::test]
    async fn subscribers_notified_on_change_only() {
        let sel = DomainSelection::load(MemoryStore::new(), Some("a.example")).unwrap();
        let mut rx = sel.on_domain_changed();

        sel.set("a.example").unwrap();
        assert!(!rx.has_changed().unwrap());

        sel.set("b.example").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("b.example"));
    }
}
