//! StateClient (SPEC_FULL.md §4.3): the subscriber side of the state wire
//! protocol. Maintains a latest-snapshot slot with a freshness bit.
//!
//! Grounded on `StateClient` in the original `state/client.py`
//! (`_wait_for_fresh_reading`/`_wait_for_first_reading` spin-then-block
//! pattern), rendered with a `tokio::sync::Notify` instead of a spin loop.

use crate::error::{Error, Result};
use harness_types::StateSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct StateClient {
    latest: Arc<RwLock<Option<StateSnapshot>>>,
    fresh: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StateClient {
    pub async fn connect(addr: impl tokio::net::ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let addr_string = addr.to_string();
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| Error::ServerUnavailable {
                addr: addr_string,
                source,
            })?;

        let latest = Arc::new(RwLock::new(None));
        let fresh = Arc::new(AtomicBool::new(false));
        let notify = Arc::new(Notify::new());

        let task_latest = latest.clone();
        let task_fresh = fresh.clone();
        let task_notify = notify.clone();
        tokio::spawn(async move {
            read_loop(stream, task_latest, task_fresh, task_notify).await;
        });

        Ok(Self {
            latest,
            fresh,
            notify,
        })
    }

    /// Non-blocking after the first snapshot arrives; does not clear freshness.
    pub fn latest_state(&self) -> Option<StateSnapshot> {
        self.latest.read().unwrap().clone()
    }

    /// Blocks until a snapshot more recent than the last one returned by
    /// this method arrives, then clears the freshness bit and returns it.
    pub async fn new_state(&self) -> StateSnapshot {
        loop {
            let notified = self.notify.notified();
            if self.fresh.swap(false, Ordering::AcqRel) {
                if let Some(snapshot) = self.latest_state() {
                    return snapshot;
                }
            }
            notified.await;
        }
    }

    /// Blocks until the first snapshot has arrived and its
    /// `graphics_packet_id` is nonzero (the simulator has started ticking).
    pub async fn wait_until_ready(&self) {
        loop {
            let notified = self.notify.notified();
            if let Some(snapshot) = self.latest_state() {
                if snapshot.graphics_packet_id != 0 {
                    return;
                }
            }
            notified.await;
        }
    }
}

async fn read_loop(
    mut stream: TcpStream,
    latest: Arc<RwLock<Option<StateSnapshot>>>,
    fresh: Arc<AtomicBool>,
    notify: Arc<Notify>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 65536];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) => {
                debug!("state-server connection closed");
                return;
            }
            Ok(n) => n,
            Err(e) => {
                warn!("state-server read error: {e}");
                return;
            }
        };
        buf.extend_from_slice(&chunk[..n]);

        while let Some((snapshot, consumed)) = StateSnapshot::decode(&buf) {
            *latest.write().unwrap() = Some(snapshot);
            fresh.store(true, Ordering::Release);
            notify.notify_waiters();
            buf.drain(..consumed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn receives_snapshots_in_order_and_clears_freshness() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let a = StateSnapshot::new(1, 1, vec![1, 2, 3]);
            let b = StateSnapshot::new(2, 2, vec![4, 5, 6]);
            stream.write_all(&a.encode()).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            stream.write_all(&b.encode()).await.unwrap();
        });

        let client = StateClient::connect(addr.to_string()).await.unwrap();
        let first = client.new_state().await;
        assert_eq!(first.graphics_packet_id, 1);
        let second = client.new_state().await;
        assert_eq!(second.graphics_packet_id, 2);

        assert!(!client.fresh.load(Ordering::Acquire));
        assert_eq!(
            client.latest_state().unwrap().graphics_packet_id,
            2
        );
    }

    #[tokio::test]
    async fn wait_until_ready_blocks_until_nonzero_graphics_packet_id() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let not_ready = StateSnapshot::new(0, 0, vec![]);
            stream.write_all(&not_ready.encode()).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let ready = StateSnapshot::new(5, 1, vec![]);
            stream.write_all(&ready.encode()).await.unwrap();
        });

        let client = StateClient::connect(addr.to_string()).await.unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), client.wait_until_ready())
            .await
            .expect("wait_until_ready should resolve once graphics_packet_id != 0");
    }
}
