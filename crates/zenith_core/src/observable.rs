//! Explicit change notification for component values
//!
//! Mutation goes through `set` or `modify`; both report whether the value
//! changed, bump a version counter and call the registered observers. Readers
//! that poll once per frame compare versions instead of subscribing.

use std::fmt;

/// Token returned by `observe`, used to detach an observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer<T> = Box<dyn FnMut(&T)>;

pub struct Observable<T> {
    value: T,
    version: u64,
    observers: Vec<(ObserverId, Observer<T>)>,
    next_observer: u64,
}

impl<T: PartialEq> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            version: 0,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Incremented on every effective change.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the value. Returns `false`, without notifying, when the new
    /// value equals the current one.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.changed();
        true
    }

    /// Mutate in place, notifying only if the value ended up different.
    pub fn modify<F>(&mut self, f: F) -> bool
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let before = self.value.clone();
        f(&mut self.value);
        if self.value == before {
            return false;
        }
        self.changed();
        true
    }

    pub fn observe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&T) + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn changed(&mut self) {
        self.version += 1;
        for (_, observer) in &mut self.observers {
            observer(&self.value);
        }
    }
}

impl<T: PartialEq + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value)
            .field("version", &self.version)
            .field("observers", &self.observers.len())
            .finish()
    }
}
