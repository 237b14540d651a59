use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::events::{ModelEvent, ModelObserver};
use crate::model::Model;

/// Event listener callback; returning `false` vetoes a `*ing` event
pub type Listener = Arc<dyn Fn(&mut Model) -> bool + Send + Sync>;

/// Ordered event listeners per model key
///
/// Listeners fire in registration order. A registry is owned by one
/// [`ModelRegistry`](crate::registry::ModelRegistry); tests that need
/// isolation build their own registry.
#[derive(Default)]
pub struct EventRegistry {
    listeners: DashMap<(String, ModelEvent), Vec<Listener>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen<F>(&self, model: &str, event: ModelEvent, listener: F)
    where
        F: Fn(&mut Model) -> bool + Send + Sync + 'static,
    {
        self.listeners
            .entry((model.to_string(), event))
            .or_default()
            .push(Arc::new(listener));
    }

    /// Register an observer for every event of a model
    pub fn observe(&self, model: &str, observer: Arc<dyn ModelObserver>) {
        for event in ModelEvent::ALL {
            let observer = Arc::clone(&observer);
            self.listen(model, event, move |instance| observer.handle(event, instance));
        }
    }

    /// Invoke listeners in order, stopping at the first `false`
    pub fn fire(&self, model: &str, event: ModelEvent, instance: &mut Model) -> bool {
        // Listeners may register further listeners, so none run under the map guard
        let listeners = match self.listeners.get(&(model.to_string(), event)) {
            Some(entry) => entry.value().clone(),
            None => return true,
        };

        for listener in listeners {
            if !listener(instance) {
                tracing::debug!("Listener vetoed {} event for model [{}]", event, model);
                return false;
            }
        }

        true
    }

    pub fn has_listeners(&self, model: &str, event: ModelEvent) -> bool {
        self.listeners
            .get(&(model.to_string(), event))
            .map(|entry| !entry.is_empty())
            .unwrap_or(false)
    }

    pub fn listener_count(&self, model: &str) -> usize {
        self.listeners
            .iter()
            .filter(|entry| entry.key().0 == model)
            .map(|entry| entry.value().len())
            .sum()
    }

    /// Remove every listener registered for a model
    pub fn clear(&self, model: &str) {
        self.listeners.retain(|(key, _), _| key != model);
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
