use std::cell::RefCell;
use std::fmt;

use super::event::Event;

/// A value cell that notifies its subscribers on every write.
///
/// Writes are never deduplicated: setting the current value again still
/// emits.
pub struct Observable<T> {
    value: RefCell<T>,
    on_change: Event<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            on_change: Event::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Store `value`, then emit it. The cell is not borrowed while
    /// subscribers run, so they may read or write it.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value.clone();
        self.on_change.emit(&value);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }

    pub fn on_change(&self) -> &Event<T> {
        &self.on_change
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value.borrow())
            .field("listeners", &self.on_change.listener_count())
            .finish()
    }
}
