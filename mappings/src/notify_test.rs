use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;

#[test]
fn listeners_run_in_registration_order() {
    let notifier = Notifier::<u32>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let a = Rc::clone(&seen);
    let _first = notifier.subscribe(move |v| a.borrow_mut().push(("first", *v)));
    let b = Rc::clone(&seen);
    let _second = notifier.subscribe(move |v| b.borrow_mut().push(("second", *v)));

    notifier.notify(&7);
    assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let notifier = Notifier::<()>::new();
    let hits = Rc::new(Cell::new(0));

    let h = Rc::clone(&hits);
    let sub = notifier.subscribe(move |()| h.set(h.get() + 1));
    notifier.notify(&());
    sub.unsubscribe();
    notifier.notify(&());

    assert_eq!(hits.get(), 1);
    assert_eq!(notifier.listener_count(), 0);
}

#[test]
fn dropping_subscription_releases_listener() {
    let notifier = Notifier::<()>::new();
    {
        let _sub = notifier.subscribe(|()| {});
        assert_eq!(notifier.listener_count(), 1);
    }
    assert_eq!(notifier.listener_count(), 0);
}

#[test]
fn releasing_after_notifier_dropped_is_noop() {
    let notifier = Notifier::<()>::new();
    let sub = notifier.subscribe(|()| {});
    drop(notifier);
    assert!(sub.is_active());
    sub.unsubscribe();
}

#[test]
fn listener_may_subscribe_during_notify() {
    let notifier = Rc::new(Notifier::<()>::new());
    let late = Rc::new(RefCell::new(Vec::new()));

    let n = Rc::clone(&notifier);
    let l = Rc::clone(&late);
    let _sub = notifier.subscribe(move |()| {
        l.borrow_mut().push(n.subscribe(|()| {}));
    });

    notifier.notify(&());
    assert_eq!(notifier.listener_count(), 2);
}
