// Transport - fire-and-forget sinks for recognised gestures
//
// The pipeline hands each finished payload to a transport and never learns
// whether it was delivered. Delivery failures are counted by the transport
// itself, not reported back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Payload sink
pub trait Transport: Send {
    /// Emit one payload; must not block the pipeline
    fn send(&mut self, payload: &[u8]);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, payload: &[u8]) {
        (**self).send(payload)
    }
}

/// Delivery counters shared with observers
#[derive(Debug, Default)]
pub struct TransportStats {
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl TransportStats {
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Broadcast payloads to any number of async subscribers
///
/// Payloads sent while nobody is subscribed are dropped and counted.
/// Slow subscribers lag and miss the oldest payloads.
pub struct BroadcastTransport {
    tx: broadcast::Sender<Vec<u8>>,
    stats: Arc<TransportStats>,
}

impl BroadcastTransport {
    /// # Arguments
    /// * `capacity` - Payloads retained for lagging subscribers
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            stats: Arc::new(TransportStats::default()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Vec<u8>> {
        self.tx.subscribe()
    }

    pub fn stats(&self) -> Arc<TransportStats> {
        Arc::clone(&self.stats)
    }
}

impl Transport for BroadcastTransport {
    fn send(&mut self, payload: &[u8]) {
        match self.tx.send(payload.to_vec()) {
            Ok(_) => {
                self.stats.sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Write payloads to the log
#[derive(Debug, Default)]
pub struct LogTransport;

impl Transport for LogTransport {
    fn send(&mut self, payload: &[u8]) {
        log::info!("[Transport] {}", String::from_utf8_lossy(payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_delivers_to_subscribers() {
        let mut transport = BroadcastTransport::new(8);
        let mut rx = transport.subscribe();
        transport.send(b"3,91");
        assert_eq!(rx.try_recv().unwrap(), b"3,91".to_vec());
        assert_eq!(transport.stats().sent(), 1);
    }

    #[test]
    fn test_broadcast_without_subscribers_drops() {
        let mut transport = BroadcastTransport::new(8);
        transport.send(b"1,50");
        let stats = transport.stats();
        assert_eq!(stats.sent(), 0);
        assert_eq!(stats.dropped(), 1);
    }

    #[test]
    fn test_boxed_transport() {
        let mut transport: Box<dyn Transport> = Box::new(LogTransport);
        transport.send(b"7,60");
    }
}
