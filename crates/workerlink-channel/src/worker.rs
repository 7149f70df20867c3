use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, trace};
use workerlink_value::Value;

use crate::error::{ChannelError, Result};
use crate::event::{Listener, ListenerId, MessageEvent};
use crate::listeners::ListenerSet;
use crate::traits::ChannelHandle;

/// Configuration for spawning a [`ThreadWorker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Name of the worker thread. The delivery thread gets a `-delivery` suffix.
    pub name: String,
    /// Stack size for the worker thread. `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "workerlink-worker".to_string(),
            stack_size: None,
        }
    }
}

/// The worker program's side of the channel.
pub struct WorkerScope {
    inbox: Receiver<Value>,
    outbox: Sender<Outbound>,
}

impl WorkerScope {
    /// Block for the next message. `None` once the owner has terminated the
    /// worker or dropped its handle.
    pub fn recv(&self) -> Option<Value> {
        self.inbox.recv().ok()
    }

    /// Like [`recv`](Self::recv) but gives up after `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Value> {
        match self.inbox.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take a message if one is already queued.
    pub fn try_recv(&self) -> Option<Value> {
        self.inbox.try_recv().ok()
    }

    /// Iterate messages until the inbox closes.
    pub fn messages(&self) -> impl Iterator<Item = Value> + '_ {
        self.inbox.iter()
    }

    /// Post a value back to the owner.
    pub fn post_message(&self, message: Value) -> Result<()> {
        self.outbox
            .send(Outbound::Message(message.structured_clone()))
            .map_err(|_| ChannelError::Disconnected)
    }
}

/// A background worker running on its own OS thread.
///
/// Owner-to-worker messages are queued to the worker program's
/// [`WorkerScope`]. Worker-to-owner messages are handed to listeners on a
/// dedicated delivery thread. Delivery starts when the first listener is
/// added; until then replies are queued.
///
/// Terminating stops delivery immediately and closes the program's inbox.
/// The worker thread itself runs until the program returns; a program that
/// never reads its inbox must watch for `post_message` failing instead.
pub struct ThreadWorker {
    name: String,
    links: Mutex<Option<Links>>,
    listeners: Arc<ListenerSet>,
}

/// Owner-held ends of both queues. Taken on terminate.
struct Links {
    inbox: Sender<Value>,
    delivery: Sender<Outbound>,
}

/// Items on the worker-to-owner queue.
enum Outbound {
    Message(Value),
    Closed,
}

impl ThreadWorker {
    /// Spawn `program` with the default configuration.
    pub fn spawn<F>(program: F) -> Result<Self>
    where
        F: FnOnce(WorkerScope) + Send + 'static,
    {
        Self::spawn_with_config(WorkerConfig::default(), program)
    }

    /// Spawn `program` with explicit configuration.
    pub fn spawn_with_config<F>(config: WorkerConfig, program: F) -> Result<Self>
    where
        F: FnOnce(WorkerScope) + Send + 'static,
    {
        let (to_worker, inbox) = mpsc::channel();
        let (outbox, from_worker) = mpsc::channel();
        let listeners = Arc::new(ListenerSet::new());

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }
        builder
            .spawn({
                let outbox = outbox.clone();
                move || program(WorkerScope { inbox, outbox })
            })
            .map_err(ChannelError::Spawn)?;

        let delivery_listeners = listeners.clone();
        let delivery_name = config.name.clone();
        thread::Builder::new()
            .name(format!("{}-delivery", config.name))
            .spawn(move || deliver(&delivery_name, from_worker, &delivery_listeners))
            .map_err(ChannelError::Spawn)?;

        info!(worker = %config.name, "worker spawned");

        Ok(Self {
            name: config.name,
            links: Mutex::new(Some(Links {
                inbox: to_worker,
                delivery: outbox,
            })),
            listeners,
        })
    }

    /// Worker thread name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`terminate`](ChannelHandle::terminate) has run.
    pub fn is_terminated(&self) -> bool {
        self.lock_links().is_none()
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn lock_links(&self) -> MutexGuard<'_, Option<Links>> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChannelHandle for ThreadWorker {
    fn post_message(&self, message: Value) -> Result<()> {
        let sender = self
            .lock_links()
            .as_ref()
            .map(|links| links.inbox.clone())
            .ok_or(ChannelError::Terminated)?;
        sender
            .send(message.structured_clone())
            .map_err(|_| ChannelError::Disconnected)
    }

    fn add_listener(&self, listener: Listener) -> ListenerId {
        let id = self.listeners.add(listener);
        debug!(worker = %self.name, listener = %id, "listener added");
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(id);
        debug!(worker = %self.name, listener = %id, removed, "listener removed");
        removed
    }

    fn terminate(&self) {
        let Some(links) = self.lock_links().take() else {
            return;
        };
        self.listeners.close();
        let _ = links.delivery.send(Outbound::Closed);
        info!(worker = %self.name, "worker terminated");
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

impl std::fmt::Debug for ThreadWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadWorker")
            .field("name", &self.name)
            .field("terminated", &self.is_terminated())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn deliver(name: &str, from_worker: Receiver<Outbound>, listeners: &ListenerSet) {
    if !listeners.wait_started() {
        debug!(worker = %name, "closed before delivery started");
        return;
    }

    for item in from_worker.iter() {
        let Outbound::Message(data) = item else {
            break;
        };
        let Some(snapshot) = listeners.snapshot() else {
            break;
        };
        if snapshot.is_empty() {
            trace!(worker = %name, kind = data.type_name(), "no listener, message dropped");
            continue;
        }
        let event = MessageEvent::new(data);
        for listener in snapshot {
            listener(&event);
        }
    }

    debug!(worker = %name, "delivery stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::channel;
    use std::time::Instant;

    use super::*;

    const WAIT: Duration = Duration::from_secs(5);

    fn echo() -> ThreadWorker {
        ThreadWorker::spawn(|scope| {
            for message in scope.messages() {
                if scope.post_message(message).is_err() {
                    break;
                }
            }
        })
        .expect("echo worker should spawn")
    }

    fn forward_to(tx: Sender<Value>) -> Listener {
        let tx = Mutex::new(tx);
        Arc::new(move |event: &MessageEvent| {
            let _ = tx
                .lock()
                .expect("listener lock")
                .send(event.data().clone());
        })
    }

    #[test]
    fn echoes_in_order() {
        let worker = echo();
        let (tx, rx) = channel();
        worker.add_listener(forward_to(tx));

        for n in 0..5 {
            worker
                .post_message(Value::from(n))
                .expect("post should succeed");
        }
        for n in 0..5 {
            assert_eq!(rx.recv_timeout(WAIT).expect("echo"), Value::from(n));
        }
        worker.terminate();
    }

    #[test]
    fn replies_before_first_listener_are_queued() {
        let worker = ThreadWorker::spawn(|scope| {
            let _ = scope.post_message(Value::from("ready"));
            let _ = scope.recv();
        })
        .expect("worker should spawn");

        std::thread::sleep(Duration::from_millis(50));

        let (tx, rx) = channel();
        worker.add_listener(forward_to(tx));
        assert_eq!(rx.recv_timeout(WAIT).expect("queued reply"), Value::from("ready"));
        worker.terminate();
    }

    #[test]
    fn removed_listener_stops_receiving() {
        let worker = echo();
        let (kept_tx, kept_rx) = channel();
        let (removed_tx, removed_rx) = channel();
        worker.add_listener(forward_to(kept_tx));
        let removed = worker.add_listener(forward_to(removed_tx));

        assert!(worker.remove_listener(removed));
        assert!(!worker.remove_listener(removed));
        assert_eq!(worker.listener_count(), 1);

        worker.post_message(Value::Null).expect("post");
        assert_eq!(kept_rx.recv_timeout(WAIT).expect("kept listener"), Value::Null);
        assert!(removed_rx.recv_timeout(Duration::from_millis(100)).is_err());
        worker.terminate();
    }

    #[test]
    fn terminate_is_idempotent_and_rejects_posts() {
        let worker = echo();
        worker.terminate();
        worker.terminate();

        assert!(worker.is_terminated());
        assert_eq!(worker.listener_count(), 0);
        assert!(matches!(
            worker.post_message(Value::Null),
            Err(ChannelError::Terminated)
        ));
    }

    #[test]
    fn terminate_closes_worker_inbox() {
        let (done_tx, done_rx) = channel();
        let worker = ThreadWorker::spawn(move |scope| {
            while scope.recv().is_some() {}
            let _ = done_tx.send(());
        })
        .expect("worker should spawn");

        worker.terminate();
        done_rx
            .recv_timeout(WAIT)
            .expect("worker program should observe closed inbox");
    }

    #[test]
    fn terminate_stops_delivery_while_program_is_busy() {
        let (gate_tx, gate_rx) = channel::<()>();
        let worker = ThreadWorker::spawn(move |_scope| {
            let _ = gate_rx.recv();
        })
        .expect("worker should spawn");
        let (tx, _rx) = channel();
        worker.add_listener(forward_to(tx));

        worker.terminate();

        // The delivery thread holds the only other reference to the listener set.
        let deadline = Instant::now() + WAIT;
        while Arc::strong_count(&worker.listeners) > 1 {
            assert!(Instant::now() < deadline, "delivery thread still running");
            std::thread::sleep(Duration::from_millis(10));
        }
        drop(gate_tx);
    }

    #[test]
    fn dropping_the_handle_terminates() {
        let (done_tx, done_rx) = channel();
        let worker = ThreadWorker::spawn(move |scope| {
            while scope.recv().is_some() {}
            let _ = done_tx.send(());
        })
        .expect("worker should spawn");

        drop(worker);
        done_rx
            .recv_timeout(WAIT)
            .expect("worker program should observe closed inbox");
    }

    #[test]
    fn exited_worker_reports_disconnected() {
        let worker = ThreadWorker::spawn(|_scope| {}).expect("worker should spawn");

        let deadline = Instant::now() + WAIT;
        loop {
            match worker.post_message(Value::Null) {
                Err(ChannelError::Disconnected) => break,
                Ok(()) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                other => panic!("expected disconnect, got {other:?}"),
            }
        }
    }

    #[test]
    fn posted_buffers_are_copied() {
        let worker = echo();
        let (tx, rx) = channel();
        worker.add_listener(forward_to(tx));

        let original = bytes::Bytes::from_static(b"payload");
        worker
            .post_message(Value::Bytes(original.clone()))
            .expect("post");
        match rx.recv_timeout(WAIT).expect("echo") {
            Value::Bytes(echoed) => {
                assert_eq!(echoed, original);
                assert_ne!(echoed.as_ptr(), original.as_ptr());
            }
            other => panic!("expected bytes, got {other:?}"),
        }
        worker.terminate();
    }

    #[test]
    fn thread_is_named_from_config() {
        let (tx, rx) = channel();
        let worker = ThreadWorker::spawn_with_config(
            WorkerConfig {
                name: "named-worker".to_string(),
                ..WorkerConfig::default()
            },
            move |_scope| {
                let _ = tx.send(thread::current().name().map(str::to_string));
            },
        )
        .expect("worker should spawn");

        assert_eq!(worker.name(), "named-worker");
        assert_eq!(
            rx.recv_timeout(WAIT).expect("thread name"),
            Some("named-worker".to_string())
        );
    }
}
