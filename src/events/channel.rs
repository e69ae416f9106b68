use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::rc::Rc;

use log::trace;

pub type Callback<T> = Rc<dyn Fn(&T)>;
pub type SubscriptionId = u64;

struct Listeners<T> {
    callbacks: RefCell<BTreeMap<SubscriptionId, Callback<T>>>,
    next_id: Cell<SubscriptionId>,
}

/// Single-threaded fan-out of `T` values. Cloning shares the same listeners.
pub struct Channel<T: Debug> {
    listeners: Rc<Listeners<T>>,
}

impl<T: Debug> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

pub struct EventEmitter<T: Debug> {
    channel: Channel<T>,
}

impl<T: Debug> Clone for EventEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

pub struct EventObserver<T: Debug> {
    channel: Channel<T>,
}

impl<T: Debug> Clone for EventObserver<T> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel.clone(),
        }
    }
}

/// Handle returned by [`EventObserver::subscribe`]; call `unsubscribe` to detach.
#[must_use]
pub struct Unsubscriber<T: Debug> {
    channel: Channel<T>,
    id: SubscriptionId,
}

impl<T: Debug> Unsubscriber<T> {
    pub fn unsubscribe(self) -> bool {
        self.channel.unsubscribe(self.id)
    }
}

impl<T: Debug> Channel<T> {
    pub fn new() -> (EventEmitter<T>, EventObserver<T>) {
        let channel = Channel {
            listeners: Rc::new(Listeners {
                callbacks: RefCell::new(BTreeMap::new()),
                next_id: Cell::new(0),
            }),
        };
        (
            EventEmitter {
                channel: channel.clone(),
            },
            EventObserver { channel },
        )
    }

    fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + 'static,
    {
        let id = self.listeners.next_id.get();
        self.listeners.next_id.set(id + 1);
        self.listeners
            .callbacks
            .borrow_mut()
            .insert(id, Rc::new(callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.callbacks.borrow_mut().remove(&id).is_some()
    }

    fn emit(&self, data: &T) {
        // snapshot so listeners may subscribe or unsubscribe while handling
        let callbacks: Vec<Callback<T>> =
            self.listeners.callbacks.borrow().values().cloned().collect();
        trace!(target: "events", "Emitting to {} listeners: {:?}", callbacks.len(), data);
        for callback in callbacks {
            callback(data);
        }
    }

    fn listener_count(&self) -> usize {
        self.listeners.callbacks.borrow().len()
    }
}

impl<T: Debug> EventEmitter<T> {
    pub fn emit(&self, data: T) {
        self.channel.emit(&data);
    }

    pub fn has_listeners(&self) -> bool {
        self.channel.listener_count() > 0
    }
}

impl<T: Debug> EventObserver<T> {
    pub fn subscribe<F>(&self, callback: F) -> Unsubscriber<T>
    where
        F: Fn(&T) + 'static,
    {
        Unsubscriber {
            channel: self.channel.clone(),
            id: self.channel.subscribe(callback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GameEvent;

    #[test]
    fn test_listeners_receive_in_subscription_order() {
        let (emitter, observer) = Channel::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = seen.clone();
        let _a = observer.subscribe(move |n| first.borrow_mut().push(("a", *n)));
        let second = seen.clone();
        let _b = observer.subscribe(move |n| second.borrow_mut().push(("b", *n)));

        emitter.emit(3);
        assert_eq!(*seen.borrow(), vec![("a", 3), ("b", 3)]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let (emitter, observer) = Channel::<GameEvent>::new();
        let ticks = Rc::new(Cell::new(0));
        let ticks_clone = ticks.clone();

        let subscription = observer.subscribe(move |event| {
            if let GameEvent::TimerTicked(_) = event {
                ticks_clone.set(ticks_clone.get() + 1);
            }
        });
        emitter.emit(GameEvent::TimerTicked(1));
        emitter.emit(GameEvent::Celebrate);
        assert_eq!(ticks.get(), 1);

        assert!(subscription.unsubscribe());
        assert!(!emitter.has_listeners());
        emitter.emit(GameEvent::TimerTicked(2));
        assert_eq!(ticks.get(), 1);
    }

    #[test]
    fn test_subscribe_from_inside_listener() {
        let (emitter, observer) = Channel::<u32>::new();
        let count = Rc::new(Cell::new(0));

        let inner_observer = observer.clone();
        let inner_count = count.clone();
        let _outer = observer.subscribe(move |_| {
            let c = inner_count.clone();
            let _ = inner_observer.subscribe(move |_| c.set(c.get() + 1));
        });

        emitter.emit(1);
        assert_eq!(count.get(), 0);
        emitter.emit(2);
        assert_eq!(count.get(), 1);
    }
}
