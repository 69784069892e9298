//! Change notification shared by the dashboard state components.
//!
//! The presentation layer registers one listener that bumps a revision
//! signal; core components call `notify` after every mutation, once their own
//! borrows are released.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Listener = Rc<dyn Fn()>;

#[derive(Clone, Default)]
pub struct Notifier {
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Call every listener. Listeners may read (or subscribe to) the state
    /// that changed.
    pub fn notify(&self) {
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").field("listeners", &self.listeners.borrow().len()).finish()
    }
}
