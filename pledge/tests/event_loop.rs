use pledge::time::delay;
use pledge::{Error, EventLoop, EventLoopBuilder, Handle, Promise};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("pledge=trace"))
        .with_test_writer()
        .try_init();
}

#[test]
fn test_turn_on_empty_loop() {
    let event_loop = EventLoop::new();

    assert!(!event_loop.turn());
    assert_eq!(event_loop.run(), 0);
    assert_eq!(event_loop.run_until_idle(), 0);
}

#[test]
fn test_jobs_run_in_fifo_order() {
    let event_loop = EventLoop::new();
    let handle = event_loop.handle();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..5 {
        let order = order.clone();
        handle.defer(move || order.lock().unwrap().push(i));
    }

    assert_eq!(event_loop.pending_jobs(), 5);
    assert_eq!(event_loop.run_until_idle(), 5);
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_jobs_queued_while_draining_run_in_same_call() {
    let event_loop = EventLoop::new();
    let handle = event_loop.handle();
    let order = Arc::new(Mutex::new(Vec::new()));

    let outer = order.clone();
    let nested_handle = handle.clone();
    handle.defer(move || {
        outer.lock().unwrap().push("outer");
        let inner = outer.clone();
        nested_handle.defer(move || inner.lock().unwrap().push("inner"));
    });

    assert_eq!(event_loop.run_until_idle(), 2);
    assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);
}

#[test]
fn test_run_until_idle_does_not_wait_for_timers() {
    let event_loop = EventLoop::new();
    let later = delay::<_, ()>(&event_loop.handle(), Duration::from_millis(20), 1).unwrap();

    event_loop.run_until_idle();
    assert!(later.is_pending());
    assert_eq!(event_loop.pending_timers(), 1);

    event_loop.run();
    assert_eq!(later.outcome(), Some(Ok(1)));
    assert_eq!(event_loop.pending_timers(), 0);
}

#[test]
fn test_timers_fire_by_deadline() {
    let event_loop = EventLoop::new();
    let handle = event_loop.handle();
    let order = Arc::new(Mutex::new(Vec::new()));

    for (name, millis) in [("c", 30), ("a", 5), ("b", 15)] {
        let order = order.clone();
        handle
            .defer_after(Duration::from_millis(millis), move || order.lock().unwrap().push(name))
            .unwrap();
    }

    event_loop.run();
    assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_block_on_settled_promise() {
    let event_loop = EventLoop::new();
    let promise = Promise::<i32, ()>::resolve(&event_loop.handle(), 4).then(|v| Ok(v * v));

    assert_eq!(event_loop.block_on(&promise), Ok(16));
}

#[test]
fn test_block_on_waits_for_other_thread() {
    init_tracing();

    let event_loop = EventLoop::new();
    let mut settler = None;

    let promise = Promise::<u32, String>::new(&event_loop.handle(), |settle, _| {
        settler = Some(settle);
        Ok(())
    });
    let settle = settler.expect("resolver runs synchronously");

    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        settle.fulfill(7);
    });

    let chained = promise.then(|v| Ok(v + 1));
    assert_eq!(event_loop.block_on(&chained), Ok(8));

    worker.join().unwrap();
}

#[test]
fn test_block_on_rejection() {
    let event_loop = EventLoop::new();
    let promise = Promise::<(), &str>::reject(&event_loop.handle(), "nope");

    assert_eq!(event_loop.block_on(&promise), Err("nope"));
}

#[test]
fn test_current_handle_outside_loop() {
    assert_eq!(Handle::try_current().unwrap_err(), Error::NoContext);
}

#[test]
#[should_panic(expected = "outside of an event loop")]
fn test_current_handle_panics_outside_loop() {
    let _ = Handle::current();
}

#[test]
fn test_enter_installs_and_restores_context() {
    let event_loop = EventLoop::new();

    let inside = event_loop.enter(|| Handle::try_current().is_ok());

    assert!(inside);
    assert!(Handle::try_current().is_err());
}

#[test]
fn test_jobs_run_inside_loop_context() {
    let event_loop = EventLoop::new();
    let seen = Arc::new(Mutex::new(None));

    let sink = seen.clone();
    event_loop.handle().defer(move || {
        *sink.lock().unwrap() = Some(Handle::try_current().is_ok());
    });

    event_loop.run();
    assert_eq!(*seen.lock().unwrap(), Some(true));
}

#[test]
fn test_builder_configuration() {
    init_tracing();

    let event_loop = EventLoopBuilder::new()
        .name("configured")
        .queue_capacity(0)
        .first_id(500)
        .build();

    let promise = Promise::<i32, ()>::resolve(&event_loop.handle(), 1);
    assert_eq!(promise.id().get(), 500);
    assert_eq!(event_loop.block_on(&promise), Ok(1));
}

#[test]
fn test_promises_from_two_loops_are_independent() {
    let first = EventLoop::new();
    let second = EventLoop::new();

    let a = Promise::<i32, ()>::resolve(&first.handle(), 1).then(|v| Ok(v + 1));
    let b = Promise::<i32, ()>::resolve(&second.handle(), 10).then(|v| Ok(v + 1));

    first.run();
    assert_eq!(a.outcome(), Some(Ok(2)));
    assert!(b.is_pending());

    second.run();
    assert_eq!(b.outcome(), Some(Ok(11)));
}

/// Counts how many times a value is dropped.
#[derive(Clone)]
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_dropping_loop_releases_queued_work() {
    let drops = Arc::new(AtomicUsize::new(0));

    let event_loop = EventLoop::new();
    let handle = event_loop.handle();

    let published = Promise::<_, ()>::resolve(&handle, DropCounter(drops.clone()));
    let delayed = delay::<_, ()>(&handle, Duration::from_secs(60), DropCounter(drops.clone()));
    let delayed = delayed.unwrap();

    assert_eq!(event_loop.pending_jobs(), 1);
    assert_eq!(event_loop.pending_timers(), 1);

    drop(published);
    drop(delayed);
    drop(handle);
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(event_loop);
    assert_eq!(drops.load(Ordering::SeqCst), 2);
}
