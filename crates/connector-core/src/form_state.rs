//! Observable container for the editable form values of a panel.
//!
//! Owners read with [`FormState::get`], mutate with [`FormState::set`] and
//! get notified through [`FormState::subscribe`]. Every `set` marks the form
//! dirty; [`FormState::reset`] replaces the values and clears the flag.

/// Handle returned by [`FormState::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

type Subscriber<T> = Box<dyn FnMut(&T)>;

pub struct FormState<T> {
    values: T,
    dirty: bool,
    next_id: usize,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
}

impl<T> FormState<T> {
    pub fn new(values: T) -> Self {
        Self {
            values,
            dirty: false,
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.values
    }

    /// Apply `f` to the values, mark dirty and notify subscribers.
    pub fn set<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.values);
        self.dirty = true;
        self.notify();
        result
    }

    /// Replace all values (panel re-initialization). Clears the dirty flag.
    pub fn reset(&mut self, values: T) {
        self.values = values;
        self.dirty = false;
        self.notify();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn subscribe(&mut self, f: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(f)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    fn notify(&mut self) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&self.values);
        }
    }
}

impl<T: Default> Default for FormState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
