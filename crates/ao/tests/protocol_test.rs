//! Send, dispatch and free-delegation tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ao::{ActorOptions, ActorRef, AoError, Behavior, Message, Runtime, RuntimeConfig};

type Log = Arc<Mutex<Vec<(&'static str, Vec<u8>)>>>;

/// Records every message it handles under a fixed tag.
struct Recorder {
    tag: &'static str,
    log: Log,
}

impl Recorder {
    fn new(tag: &'static str, log: &Log) -> Self {
        Self {
            tag,
            log: Arc::clone(log),
        }
    }
}

impl Behavior for Recorder {
    fn on_event(&self, rt: &Runtime, msg: Message) {
        self.log
            .lock()
            .unwrap()
            .push((self.tag, msg.payload().to_vec()));
        rt.free_via_sender(msg);
    }
}

/// Sender whose free handler counts the messages it gets back.
struct CountingSender {
    freed: Arc<AtomicUsize>,
}

impl Behavior for CountingSender {
    fn on_event(&self, rt: &Runtime, msg: Message) {
        rt.free_via_sender(msg);
    }

    fn on_free(&self, msg: Message) {
        self.freed.fetch_add(1, Ordering::SeqCst);
        ao::generic_free(msg);
    }
}

/// Destroys itself when it receives `0xFF`.
struct SelfDestruct {
    log: Log,
}

impl Behavior for SelfDestruct {
    fn on_event(&self, rt: &Runtime, msg: Message) {
        let me = msg.receiver().clone();
        let last = msg.payload() == [0xFF];
        self.log.lock().unwrap().push(("self", msg.payload().to_vec()));
        rt.free_via_sender(msg);
        if last {
            rt.destroy(me);
        }
    }
}

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn passive() -> ActorOptions {
    ActorOptions::QUEUELESS | ActorOptions::CONTEXTLESS
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn messages_are_delivered_in_fifo_order() {
    let rt = Runtime::new(RuntimeConfig::default());
    let log = new_log();
    let actor = rt
        .create(&[], Recorder::new("a", &log), ActorOptions::CONTEXTLESS)
        .unwrap();

    rt.send(Some(&actor), None, b"A").unwrap();
    rt.send(Some(&actor), None, b"B").unwrap();
    rt.send(Some(&actor), None, b"C").unwrap();
    assert_eq!(rt.run_until_idle(&actor), 3);

    let payloads: Vec<_> = log.lock().unwrap().iter().map(|(_, p)| p.clone()).collect();
    assert_eq!(payloads, vec![b"A".to_vec(), b"B".to_vec(), b"C".to_vec()]);
    assert_eq!(rt.stats().outstanding(), 0);
}

#[test]
fn queueless_receiver_borrows_sender_mailbox() {
    let rt = Runtime::new(RuntimeConfig::default());
    let log = new_log();
    let owner = rt
        .create(&[], Recorder::new("owner", &log), ActorOptions::CONTEXTLESS)
        .unwrap();
    let led = rt.create(&[], Recorder::new("led", &log), passive()).unwrap();

    rt.send(Some(&led), Some(&owner), &[1]).unwrap();
    assert_eq!(rt.run_until_idle(&owner), 1);

    let entries = log.lock().unwrap();
    assert_eq!(entries.as_slice(), &[("led", vec![1])]);
}

#[test]
fn queueless_receiver_without_mailbox_is_rejected() {
    let rt = Runtime::new(RuntimeConfig::default());
    let log = new_log();
    let led = rt.create(&[], Recorder::new("led", &log), passive()).unwrap();
    let other = rt.create(&[], Recorder::new("other", &log), passive()).unwrap();

    assert_eq!(rt.send(Some(&led), None, &[1]).unwrap_err(), AoError::NoMailbox);
    assert_eq!(
        rt.send(Some(&led), Some(&other), &[1]).unwrap_err(),
        AoError::NoMailbox
    );
    assert_eq!(rt.stats().allocated(), 0);
}

#[test]
fn send_validates_arguments() {
    let rt = Runtime::new(RuntimeConfig::default());
    let log = new_log();
    let actor = rt
        .create(&[], Recorder::new("a", &log), ActorOptions::CONTEXTLESS)
        .unwrap();

    assert_eq!(rt.send(None, None, &[1]).unwrap_err(), AoError::InvalidReceiver);
    assert_eq!(rt.send(Some(&actor), None, &[]).unwrap_err(), AoError::InvalidArgument);
    assert_eq!(
        rt.send(Some(&actor), None, &[1, 2, 3, 4, 5]).unwrap_err(),
        AoError::SizeExceeded
    );
    assert!(rt.send(Some(&actor), None, &[1, 2, 3, 4]).is_ok());
}

#[test]
fn consumed_message_is_freed_by_its_sender() {
    let rt = Runtime::new(RuntimeConfig::default());
    let log = new_log();
    let freed = Arc::new(AtomicUsize::new(0));
    let sender = rt
        .create(
            &[],
            CountingSender {
                freed: Arc::clone(&freed),
            },
            ActorOptions::CONTEXTLESS,
        )
        .unwrap();
    let receiver = rt.create(&[], Recorder::new("rx", &log), passive()).unwrap();

    rt.send(Some(&receiver), Some(&sender), &[7]).unwrap();
    rt.send(Some(&receiver), Some(&sender), &[8]).unwrap();
    rt.run_until_idle(&sender);

    assert_eq!(freed.load(Ordering::SeqCst), 2);
    assert_eq!(rt.stats().released(), 2);
}

#[test]
fn scheduling_context_dispatches_asynchronously() {
    let rt = Runtime::new(RuntimeConfig::default());
    let log = new_log();
    let actor = rt
        .create(&[], Recorder::new("task", &log), ActorOptions::NONE)
        .unwrap();
    assert!(rt.has_context(&actor));

    rt.send(Some(&actor), None, &[42]).unwrap();
    assert!(wait_until(|| log.lock().unwrap().len() == 1));
    assert_eq!(log.lock().unwrap()[0], ("task", vec![42]));

    rt.shutdown();
}

#[test]
fn actor_can_destroy_itself_from_its_handler() {
    let rt = Runtime::new(RuntimeConfig::default());
    let log = new_log();
    let actor: ActorRef = rt
        .create(
            &[],
            SelfDestruct {
                log: Arc::clone(&log),
            },
            ActorOptions::NONE,
        )
        .unwrap();

    rt.send(Some(&actor), None, &[1]).unwrap();
    rt.send(Some(&actor), None, &[0xFF]).unwrap();

    assert!(wait_until(|| {
        !rt.is_alive(&actor)
            && rt.resources().live_contexts() == 0
            && rt.resources().live_queues() == 0
    }));
    assert_eq!(log.lock().unwrap().len(), 2);
    assert_eq!(rt.send(Some(&actor), None, &[1]).unwrap_err(), AoError::InvalidReceiver);
}
