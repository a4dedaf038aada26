use pledge::{EventLoop, EventLoopBuilder, Fail, IdSequence, Promise, Settle, State};

type Deferred = (
    Promise<i32, &'static str>,
    Settle<i32, &'static str>,
    Fail<i32, &'static str>,
);

/// Builds a pending promise and hands back its settlement capabilities.
fn deferred(event_loop: &EventLoop) -> Deferred {
    let mut capabilities = None;

    let promise = Promise::new(&event_loop.handle(), |settle, fail| {
        capabilities = Some((settle, fail));
        Ok(())
    });

    let (settle, fail) = capabilities.expect("resolver runs synchronously");
    (promise, settle, fail)
}

#[test]
fn test_new_promise_is_pending() {
    let event_loop = EventLoop::new();
    let (promise, _settle, _fail) = deferred(&event_loop);

    assert_eq!(promise.state(), State::Pending);
    assert!(promise.is_pending());
    assert_eq!(promise.outcome(), None);
}

#[test]
fn test_first_fulfillment_wins() {
    let event_loop = EventLoop::new();
    let (promise, settle, fail) = deferred(&event_loop);

    settle.fulfill(1);
    fail.reject("too late");
    settle.fulfill(2);
    event_loop.run();

    assert_eq!(promise.state(), State::Fulfilled);
    assert_eq!(promise.outcome(), Some(Ok(1)));
}

#[test]
fn test_first_rejection_wins() {
    let event_loop = EventLoop::new();
    let (promise, settle, fail) = deferred(&event_loop);

    fail.reject("first");
    settle.fulfill(10);
    fail.reject("second");
    event_loop.run();

    assert_eq!(promise.state(), State::Rejected);
    assert_eq!(promise.outcome(), Some(Err("first")));
}

#[test]
fn test_resolver_error_rejects() {
    let event_loop = EventLoop::new();
    let promise = Promise::<i32, &str>::new(&event_loop.handle(), |_, _| Err("boom"));

    assert_eq!(promise.outcome(), Some(Err("boom")));
}

#[test]
fn test_resolver_error_after_settling_is_ignored() {
    let event_loop = EventLoop::new();
    let promise = Promise::<i32, &str>::new(&event_loop.handle(), |settle, _| {
        settle.fulfill(5);
        Err("raised after fulfilling")
    });

    assert_eq!(promise.outcome(), Some(Ok(5)));
}

#[test]
fn test_resolve_and_reject_constructors() {
    let event_loop = EventLoop::new();
    let handle = event_loop.handle();

    let ok = Promise::<_, &str>::resolve(&handle, "value");
    let err = Promise::<&str, _>::reject(&handle, "reason");

    assert_eq!(ok.outcome(), Some(Ok("value")));
    assert_eq!(err.outcome(), Some(Err("reason")));
}

#[test]
fn test_follow_adopts_other_promise() {
    let event_loop = EventLoop::new();
    let (source, source_settle, _) = deferred(&event_loop);
    let (follower, follower_settle, _) = deferred(&event_loop);

    follower_settle.follow(source.clone());
    event_loop.run();
    assert_eq!(follower.state(), State::Pending);

    source_settle.fulfill(42);
    event_loop.run();
    assert_eq!(follower.outcome(), Some(Ok(42)));
}

#[test]
fn test_follow_settled_rejection() {
    let event_loop = EventLoop::new();
    let (follower, settle, _) = deferred(&event_loop);

    settle.follow(Promise::reject(&event_loop.handle(), "inner"));

    assert_eq!(follower.outcome(), Some(Err("inner")));
}

#[test]
fn test_follow_self_stays_pending() {
    let event_loop = EventLoop::new();
    let (promise, settle, _) = deferred(&event_loop);

    settle.follow(promise.clone());
    event_loop.run();

    assert_eq!(promise.state(), State::Pending);
}

#[test]
fn test_ids_increase_monotonically() {
    let event_loop = EventLoopBuilder::new().first_id(100).build();
    let handle = event_loop.handle();

    let a = Promise::<i32, ()>::resolve(&handle, 1);
    let b = Promise::<i32, ()>::resolve(&handle, 2);
    let c = a.then(|v| Ok(v + 1));

    assert_eq!(a.id().get(), 100);
    assert_eq!(b.id().get(), 101);
    assert_eq!(c.id().get(), 102);
    assert_eq!(a.id().to_string(), "#100");
}

#[test]
fn test_shared_id_sequence_across_loops() {
    let ids = IdSequence::starting_at(7);
    let first = EventLoopBuilder::new().id_sequence(ids.clone()).build();
    let second = EventLoopBuilder::new().id_sequence(ids).build();

    let a = Promise::<(), ()>::resolve(&first.handle(), ());
    let b = Promise::<(), ()>::resolve(&second.handle(), ());

    assert_eq!(a.id().get(), 7);
    assert_eq!(b.id().get(), 8);
}

#[test]
fn test_clones_share_state() {
    let event_loop = EventLoop::new();
    let (promise, settle, _) = deferred(&event_loop);
    let clone = promise.clone();

    settle.fulfill(3);

    assert_eq!(clone.outcome(), Some(Ok(3)));
    assert_eq!(clone.id(), promise.id());
}
