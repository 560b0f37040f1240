//! Multi-threaded use of a shared `Emitter`

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::init_tracing;
use emit::{Emitter, Handler};

fn counter(count: &Arc<AtomicUsize>) -> Handler<u64> {
    let count = Arc::clone(count);
    Handler::new(move |_: &u64| {
        count.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn concurrent_registration_keeps_every_handler() {
    init_tracing();
    let emitter = Arc::new(Emitter::<u64>::with_name("concurrent"));
    let count = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let emitter = Arc::clone(&emitter);
            let count = Arc::clone(&count);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    emitter.on("tick", [counter(&count)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(emitter.handler_count("tick"), 400);
    emitter.emit("tick", 0u64);
    assert_eq!(count.load(Ordering::SeqCst), 400);
}

#[test]
fn emits_race_with_registration_and_removal() {
    init_tracing();
    let emitter = Arc::new(Emitter::<u64>::new());
    let stable_count = Arc::new(AtomicUsize::new(0));
    emitter.on("tick", [counter(&stable_count)]);

    let emitters: Vec<_> = (0..4)
        .map(|_| {
            let emitter = Arc::clone(&emitter);
            thread::spawn(move || {
                for i in 0..200u64 {
                    emitter.emit("tick", i);
                }
            })
        })
        .collect();

    let churn = {
        let emitter = Arc::clone(&emitter);
        thread::spawn(move || {
            let scratch = Arc::new(AtomicUsize::new(0));
            for _ in 0..200 {
                let handler = counter(&scratch);
                emitter.on("tick", [handler.clone()]);
                emitter.off("tick", [&handler]);
            }
        })
    };

    for handle in emitters {
        handle.join().unwrap();
    }
    churn.join().unwrap();

    // The long-lived handler saw every emit regardless of the churn around it
    assert_eq!(stable_count.load(Ordering::SeqCst), 800);
    assert_eq!(emitter.handler_count("tick"), 1);
    assert_eq!(emitter.stats().events_emitted, 800);
}

#[test]
fn slow_handler_does_not_block_registration() {
    init_tracing();
    let emitter = Arc::new(Emitter::<u64>::new());
    let (entered_tx, entered_rx) = mpsc::channel();
    let release = Arc::new(AtomicBool::new(false));

    {
        let release = Arc::clone(&release);
        let entered_tx = std::sync::Mutex::new(entered_tx);
        emitter.subscribe("slow", move |_: &u64| {
            let _ = entered_tx.lock().unwrap().send(());
            while !release.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
        });
    }

    let dispatcher = {
        let emitter = Arc::clone(&emitter);
        thread::spawn(move || {
            emitter.emit("slow", 1u64);
        })
    };

    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("slow handler should start");

    // The dispatch is parked inside the handler; the lock must already be free
    let count = Arc::new(AtomicUsize::new(0));
    emitter.on("slow", [counter(&count)]).on("other", [counter(&count)]);
    emitter.off_all("other");
    assert_eq!(emitter.handler_count("slow"), 2);

    release.store(true, Ordering::SeqCst);
    dispatcher.join().unwrap();

    // The handler added mid-dispatch was not part of that dispatch's snapshot
    assert_eq!(count.load(Ordering::SeqCst), 0);
}
