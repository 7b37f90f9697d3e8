//! Greeting state and the per-verb operations.
//!
//! [`GreetingService`] owns everything the routes share: the sequence counter
//! and the id → name registry. It is built once, wrapped in an `Arc`, and
//! handed to [`routes`](super::routes). Nothing here knows about HTTP.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::model::{or_null, DecimalId, Greeting, Person};
use crate::error::ApiError;

/// Monotonic request counter. The first call to [`increment`](Self::increment) returns 1.
#[derive(Debug, Default)]
pub struct SequenceCounter(AtomicU64);

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments and returns the new value.
    ///
    /// `Relaxed` is enough: callers only need each value handed out once,
    /// not any ordering with other memory.
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The last value handed out, 0 if none.
    #[cfg(test)]
    pub(crate) fn current(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Shared state behind the greeting routes.
#[derive(Debug, Default)]
pub struct GreetingService {
    counter: SequenceCounter,
    // Written by `put`, never read by any route.
    registry: Mutex<HashMap<DecimalId, Option<String>>>,
}

impl GreetingService {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn counter(&self) -> &SequenceCounter {
        &self.counter
    }

    /// `GET|POST /greeting`. The caller's `name` is deliberately not used.
    pub fn greet(&self) -> Greeting {
        Greeting::new(self.counter.increment(), "It's me GET!!! ")
    }

    /// `GET|POST /greeting/post`.
    pub fn post(&self, person: &Person) -> Greeting {
        let inner = format!("It's me POST!!!{}", or_null(&person.name));
        Greeting::new(self.counter.increment(), &inner)
    }

    /// `PUT /greeting/put`.
    ///
    /// Fails with [`ApiError::IdMismatch`] when `id` and the payload id are
    /// numerically *equal*. Otherwise records `id → name` and echoes the name.
    pub fn put(&self, id: DecimalId, person: &Person) -> Result<Greeting, ApiError> {
        let payload_id = person.id.as_ref()
            .ok_or_else(|| ApiError::Validation("payload `id` is required".to_owned()))?;

        if id == *payload_id {
            debug!(%id, %payload_id, "rejecting put: ids compare equal");
            return Err(ApiError::IdMismatch);
        }

        debug!(%id, name = or_null(&person.name), "registering name");
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, person.name.clone());

        let inner = format!("It's me PUT!!!added {}", or_null(&person.name));
        Ok(Greeting::new(self.counter.increment(), &inner))
    }

    /// `PATCH /greeting/patch`. The id is required on the wire but unused.
    pub fn patch(&self, _id: &DecimalId, person: &Person) -> Greeting {
        let inner = format!("It's me PATCH!!!{}", or_null(&person.surname));
        Greeting::new(self.counter.increment(), &inner)
    }

    /// `DELETE /greeting/delete`.
    pub fn delete(&self, id: &DecimalId) -> Greeting {
        Greeting::new(self.counter.increment(), &format!("It's me DELETE!!! {id}"))
    }

    /// `OPTIONS /greeting/options`.
    pub fn options(&self) -> Greeting {
        Greeting::new(self.counter.increment(), "It's me OPTIONS!!!")
    }

    /// `HEAD /greeting/head`.
    pub fn head(&self, id: &DecimalId) -> Greeting {
        Greeting::new(self.counter.increment(), &format!("It's me HEAD!!!{id}"))
    }

    #[cfg(test)]
    fn registered(&self, id: &DecimalId) -> Option<Option<String>> {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn id(s: &str) -> DecimalId {
        s.parse().unwrap()
    }

    fn person(json: &str) -> Person {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn messages_match_each_verb() {
        let svc = GreetingService::new();
        let bob = person(r#"{"id":1,"name":"Bob","surname":"Smith"}"#);

        assert_eq!(svc.greet().message, "Hello, It's me GET!!! !");
        assert_eq!(svc.post(&bob).message, "Hello, It's me POST!!!Bob!");
        assert_eq!(svc.put(id("2"), &bob).unwrap().message, "Hello, It's me PUT!!!added Bob!");
        assert_eq!(svc.patch(&id("2"), &bob).message, "Hello, It's me PATCH!!!Smith!");
        assert_eq!(svc.delete(&id("3")).message, "Hello, It's me DELETE!!! 3!");
        assert_eq!(svc.options().message, "Hello, It's me OPTIONS!!!!");
        assert_eq!(svc.head(&id("4")).message, "Hello, It's me HEAD!!!4!");
    }

    #[test]
    fn absent_fields_render_as_null() {
        let svc = GreetingService::new();
        assert_eq!(svc.post(&Person::default()).message, "Hello, It's me POST!!!null!");
        assert_eq!(svc.patch(&id("1"), &Person::default()).message, "Hello, It's me PATCH!!!null!");
    }

    #[test]
    fn put_rejects_equal_ids_and_keeps_counter() {
        let svc = GreetingService::new();
        let err = svc.put(id("5"), &person(r#"{"id":5,"name":"Bob"}"#)).unwrap_err();
        assert_eq!(err, ApiError::IdMismatch);
        assert_eq!(err.to_string(), "id must be equal");

        // numerically equal, textually different
        let err = svc.put(id("5.0"), &person(r#"{"id":5,"name":"Bob"}"#)).unwrap_err();
        assert_eq!(err, ApiError::IdMismatch);

        assert_eq!(svc.counter().current(), 0);
        assert_eq!(svc.registered(&id("5")), None);
    }

    #[test]
    fn put_stores_name_when_ids_differ() {
        let svc = GreetingService::new();
        let g = svc.put(id("5"), &person(r#"{"id":6,"name":"Bob"}"#)).unwrap();
        assert_eq!(g.sequence, 1);
        assert_eq!(svc.registered(&id("5")), Some(Some("Bob".to_owned())));
    }

    #[test]
    fn put_requires_payload_id() {
        let svc = GreetingService::new();
        let err = svc.put(id("5"), &person(r#"{"name":"Bob"}"#)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn sequence_is_strictly_increasing_across_threads() {
        let svc = Arc::new(GreetingService::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = Arc::clone(&svc);
                std::thread::spawn(move || (0..100).map(|_| svc.options().sequence).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        for per_thread in all.chunks(100) {
            assert!(per_thread.windows(2).all(|w| w[0] < w[1]));
        }
        all.sort_unstable();
        assert_eq!(all, (1..=800).collect::<Vec<_>>());
    }
}
