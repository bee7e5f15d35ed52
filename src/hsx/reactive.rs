//! Reactive variables
//!
//! A [`ReactiveVar`] is a value slot with a list of subscribers. `set` stores
//! the new value and then calls every subscriber registered at that moment,
//! synchronously and in subscription order, before returning.
//!
//! Subscribers are never removed. A subscriber error stops notification and is
//! returned from `set` as-is.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::hsx::error::ReactiveError;
use crate::hsx::value::Value;

pub type Subscriber = Rc<dyn Fn(&Value) -> Result<(), ReactiveError>>;

pub struct ReactiveVar {
    value: RefCell<Value>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl ReactiveVar {
    pub fn new(value: Value) -> Self {
        Self {
            value: RefCell::new(value),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: Value) -> Result<(), ReactiveError> {
        *self.value.borrow_mut() = value.clone();

        // Snapshot so subscribers may subscribe again without re-borrowing the list
        let subscribers: Vec<Subscriber> = self.subscribers.borrow().clone();
        for subscriber in &subscribers {
            subscriber(&value)?;
        }
        Ok(())
    }

    pub fn subscribe(&self, subscriber: impl Fn(&Value) -> Result<(), ReactiveError> + 'static) {
        self.subscribers.borrow_mut().push(Rc::new(subscriber));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

impl fmt::Debug for ReactiveVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveVar")
            .field("value", &*self.value.borrow())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_notifies_in_subscription_order() {
        let var = ReactiveVar::new(Value::Null);
        let calls: Rc<RefCell<Vec<(char, Value)>>> = Rc::default();

        let a = calls.clone();
        var.subscribe(move |v| {
            a.borrow_mut().push(('A', v.clone()));
            Ok(())
        });
        let b = calls.clone();
        var.subscribe(move |v| {
            b.borrow_mut().push(('B', v.clone()));
            Ok(())
        });

        var.set(Value::from("v")).unwrap();

        assert_eq!(
            *calls.borrow(),
            vec![('A', Value::from("v")), ('B', Value::from("v"))]
        );
        assert_eq!(var.get(), Value::from("v"));
    }

    #[test]
    fn value_is_stored_before_subscribers_run() {
        let var = Rc::new(ReactiveVar::new(Value::Number(1.0)));
        let seen = Rc::new(RefCell::new(None));

        let observer = var.clone();
        let sink = seen.clone();
        var.subscribe(move |_| {
            *sink.borrow_mut() = Some(observer.get());
            Ok(())
        });

        var.set(Value::Number(2.0)).unwrap();
        assert_eq!(*seen.borrow(), Some(Value::Number(2.0)));
    }

    #[test]
    fn failing_subscriber_propagates_and_stops_notification() {
        let var = ReactiveVar::new(Value::Null);
        let reached = Rc::new(RefCell::new(false));

        var.subscribe(|_| Err(ReactiveError::Subscriber("boom".into())));
        let flag = reached.clone();
        var.subscribe(move |_| {
            *flag.borrow_mut() = true;
            Ok(())
        });

        let result = var.set(Value::Bool(true));
        assert_eq!(result, Err(ReactiveError::Subscriber("boom".into())));
        assert!(!*reached.borrow());
        // The value itself was still stored
        assert_eq!(var.get(), Value::Bool(true));
    }

    #[test]
    fn subscribers_added_during_set_wait_for_the_next_set() {
        let var = Rc::new(ReactiveVar::new(Value::Null));
        let late_calls = Rc::new(RefCell::new(0));

        let inner = var.clone();
        let counter = late_calls.clone();
        var.subscribe(move |_| {
            let counter = counter.clone();
            inner.subscribe(move |_| {
                *counter.borrow_mut() += 1;
                Ok(())
            });
            Ok(())
        });

        var.set(Value::Number(1.0)).unwrap();
        assert_eq!(*late_calls.borrow(), 0);
        assert_eq!(var.subscriber_count(), 2);
    }

    #[test]
    fn get_has_no_side_effects() {
        let var = ReactiveVar::new(Value::from("x"));
        var.subscribe(|_| Err(ReactiveError::Subscriber("never".into())));
        assert_eq!(var.get(), Value::from("x"));
        assert_eq!(var.get(), Value::from("x"));
    }
}
