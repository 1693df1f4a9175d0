use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::warn;

use eventhorizon_events::{EventBus, Listener, Subscription, TenantAware};

const TICK: Duration = Duration::from_millis(250);

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Feeds every message of a bus subscription to a listener on its own thread.
///
/// A failing message is logged and skipped; the worker keeps running until
/// shutdown is requested or the bus goes away.
#[derive(Debug)]
pub struct ListenerWorker;

impl ListenerWorker {
    pub fn spawn<M, B, L>(name: &'static str, bus: &B, listener: L) -> io::Result<WorkerHandle>
    where
        M: TenantAware + Send + 'static,
        B: EventBus<M> + ?Sized,
        L: Listener<M> + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        // Subscribe before the thread starts so nothing published after `spawn`
        // returns can be missed.
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &listener))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<M, L>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    listener: &L,
) where
    M: TenantAware,
    L: Listener<M>,
{
    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(TICK) {
            Ok(msg) => {
                if let Err(err) = listener.handle(&msg) {
                    let tenant = msg.tenant().map(|t| t.as_str()).unwrap_or_default();
                    warn!(worker = name, tenant, error = ?err, "listener failed");
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use eventhorizon_core::JobPayload;
    use eventhorizon_events::{InMemoryEventBus, JobPushed};
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Collect {
        seen: Mutex<Vec<String>>,
    }

    impl Listener<JobPushed> for Collect {
        type Error = String;

        fn handle(&self, event: &JobPushed) -> Result<(), Self::Error> {
            if event.job_id().as_str() == "poison" {
                return Err("poison message".to_string());
            }
            self.seen
                .lock()
                .unwrap()
                .push(event.job_id().to_string());
            Ok(())
        }
    }

    fn event(id: &str) -> JobPushed {
        let payload = JobPayload::from_json(json!({"uuid": id}).to_string()).unwrap();
        JobPushed::new(payload).connection("billing_service")
    }

    #[test]
    fn delivers_messages_and_survives_failures() {
        let bus: InMemoryEventBus<JobPushed> = InMemoryEventBus::new();
        let listener = Arc::new(Collect::default());

        let handle = ListenerWorker::spawn("tags", &bus, Arc::clone(&listener)).unwrap();

        for id in ["job-1", "poison", "job-2"] {
            bus.publish(event(id)).unwrap();
        }

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while listener.seen.lock().unwrap().len() < 2 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        handle.shutdown();
        assert_eq!(*listener.seen.lock().unwrap(), ["job-1", "job-2"]);
    }
}
