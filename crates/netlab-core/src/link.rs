// ── Link negotiation ──
//
// A freshly cabled link stays `Down` for a settle delay, then flips `Up`.
// Each pending negotiation owns a cancellation token; severing the cable
// cancels it so a stale timer can never bring a dead link up.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::model::LinkKey;

const EVENT_CHANNEL_SIZE: usize = 256;

/// Link transitions published to display subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event", content = "link")]
pub enum LinkEvent {
    /// Cable connected; both ends held down while negotiating.
    Down(LinkKey),
    /// Settle delay elapsed; both ends up.
    Up(LinkKey),
    /// Cable removed. Terminal for this key until it is reconnected.
    Disconnected(LinkKey),
}

struct Pending {
    generation: u64,
    cancel: CancellationToken,
}

struct Shared {
    pending: DashMap<LinkKey, Pending>,
    pending_count: watch::Sender<usize>,
    events: broadcast::Sender<LinkEvent>,
}

impl Shared {
    fn publish_count(&self) {
        self.pending_count.send_replace(self.pending.len());
    }
}

/// One scheduled negotiation, handed to the bring-up callback when its
/// timer fires.
///
/// A cable can be severed and reconnected between the timer firing and the
/// callback applying `Up`; the callback must check [`Claim::is_current`]
/// under the same lock that guards the topology.
pub struct Claim {
    key: LinkKey,
    generation: u64,
    shared: Arc<Shared>,
}

impl Claim {
    pub fn key(&self) -> &LinkKey {
        &self.key
    }

    /// Whether this negotiation is still the pending one for its link.
    pub fn is_current(&self) -> bool {
        self.shared
            .pending
            .get(&self.key)
            .is_some_and(|p| p.generation == self.generation)
    }
}

/// Schedules and cancels per-link settle timers.
pub struct LinkNegotiator {
    settle: Duration,
    generation: AtomicU64,
    shared: Arc<Shared>,
}

impl LinkNegotiator {
    pub fn new(settle: Duration) -> Self {
        let (pending_count, _) = watch::channel(0);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            settle,
            generation: AtomicU64::new(0),
            shared: Arc::new(Shared {
                pending: DashMap::new(),
                pending_count,
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_pending(&self, key: &LinkKey) -> bool {
        self.shared.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.len()
    }

    /// Start (or restart) negotiation for `key`.
    ///
    /// `bring_up` runs once the settle delay elapses, unless the link is
    /// cancelled first, and reports whether it applied `Up`. Outside a tokio
    /// runtime there is nothing to wait on and the link comes up immediately.
    pub fn begin<F>(&self, key: LinkKey, bring_up: F)
    where
        F: FnOnce(&Claim) -> bool + Send + 'static,
    {
        self.cancel(&key);

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        self.shared.pending.insert(
            key.clone(),
            Pending {
                generation,
                cancel: cancel.clone(),
            },
        );
        self.shared.publish_count();
        let _ = self.shared.events.send(LinkEvent::Down(key.clone()));
        debug!(link = %key, settle = ?self.settle, "link negotiating");

        let claim = Claim {
            key,
            generation,
            shared: Arc::clone(&self.shared),
        };
        let token = cancel.clone();
        let finish = move || {
            if token.is_cancelled() {
                return;
            }
            let applied = bring_up(&claim);
            let Claim { key, shared, .. } = claim;
            shared
                .pending
                .remove_if(&key, |_, p| p.generation == generation);
            shared.publish_count();
            if applied {
                debug!(link = %key, "link up");
                let _ = shared.events.send(LinkEvent::Up(key));
            } else {
                trace!(link = %key, "settle fired for a link that was severed or replaced");
            }
        };

        if let Ok(handle) = Handle::try_current() {
            let settle = self.settle;
            handle.spawn(async move {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(settle) => finish(),
                }
            });
        } else {
            finish();
        }
    }

    /// Cancel a pending negotiation. Returns `true` if one was pending.
    pub fn cancel(&self, key: &LinkKey) -> bool {
        let Some((_, pending)) = self.shared.pending.remove(key) else {
            return false;
        };
        pending.cancel.cancel();
        self.shared.publish_count();
        trace!(link = %key, "negotiation cancelled");
        true
    }

    /// Cancel any pending negotiation and announce the cable is gone.
    pub fn sever(&self, key: &LinkKey) {
        self.cancel(key);
        let _ = self.shared.events.send(LinkEvent::Disconnected(key.clone()));
    }

    /// Resolve once no negotiation is pending.
    pub async fn settled(&self) {
        let mut rx = self.shared.pending_count.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Drop for LinkNegotiator {
    fn drop(&mut self) {
        for entry in self.shared.pending.iter() {
            entry.value().cancel.cancel();
        }
    }
}

impl std::fmt::Debug for LinkNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkNegotiator")
            .field("settle", &self.settle)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceId, Endpoint};
    use std::sync::atomic::AtomicBool;

    fn key(n: u32) -> LinkKey {
        LinkKey::new(
            Endpoint::new(DeviceId::new(n), "FastEthernet0"),
            Endpoint::new(DeviceId::new(n + 100), "FastEthernet0/0"),
        )
    }

    fn flag() -> (Arc<AtomicBool>, impl FnOnce(&Claim) -> bool + Send + 'static) {
        let fired = Arc::new(AtomicBool::new(false));
        let inner = Arc::clone(&fired);
        (fired, move |_: &Claim| {
            inner.store(true, Ordering::SeqCst);
            true
        })
    }

    #[tokio::test(start_paused = true)]
    async fn link_comes_up_after_settle_delay() {
        let negotiator = LinkNegotiator::new(Duration::from_millis(1500));
        let mut events = negotiator.subscribe();
        let (fired, bring_up) = flag();

        negotiator.begin(key(1), bring_up);
        assert_eq!(events.recv().await.unwrap(), LinkEvent::Down(key(1)));
        assert!(negotiator.is_pending(&key(1)));

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(events.recv().await.unwrap(), LinkEvent::Up(key(1)));
        assert_eq!(negotiator.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_link_never_comes_up() {
        let negotiator = LinkNegotiator::new(Duration::from_millis(500));
        let (fired, bring_up) = flag();

        negotiator.begin(key(2), bring_up);
        negotiator.sever(&key(2));
        assert!(!negotiator.is_pending(&key(2)));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_timer() {
        let negotiator = LinkNegotiator::new(Duration::from_millis(500));
        let (first, bring_up_first) = flag();
        let (second, bring_up_second) = flag();

        negotiator.begin(key(3), bring_up_first);
        tokio::time::sleep(Duration::from_millis(300)).await;
        negotiator.begin(key(3), bring_up_second);
        assert_eq!(negotiator.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!first.load(Ordering::SeqCst));
        assert!(!second.load(Ordering::SeqCst));

        negotiator.settled().await;
        assert!(!first.load(Ordering::SeqCst));
        assert!(second.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_bring_up_emits_no_up_event() {
        let negotiator = LinkNegotiator::new(Duration::from_millis(100));
        let mut events = negotiator.subscribe();
        negotiator.begin(key(4), |_| false);
        negotiator.settled().await;

        assert_eq!(events.recv().await.unwrap(), LinkEvent::Down(key(4)));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_during_bring_up_invalidates_old_claim() {
        let negotiator = Arc::new(LinkNegotiator::new(Duration::from_millis(500)));
        let mut events = negotiator.subscribe();
        let (second, bring_up_second) = flag();
        let stale_applied = Arc::new(AtomicBool::new(false));

        let relink = Arc::clone(&negotiator);
        let applied = Arc::clone(&stale_applied);
        negotiator.begin(key(6), move |claim| {
            assert!(claim.is_current());
            // The cable is pulled and replugged after the timer fired.
            relink.sever(claim.key());
            relink.begin(claim.key().clone(), bring_up_second);
            let current = claim.is_current();
            applied.store(current, Ordering::SeqCst);
            current
        });

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!stale_applied.load(Ordering::SeqCst));
        assert!(!second.load(Ordering::SeqCst));
        assert!(negotiator.is_pending(&key(6)));

        negotiator.settled().await;
        assert!(second.load(Ordering::SeqCst));

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                LinkEvent::Down(key(6)),
                LinkEvent::Disconnected(key(6)),
                LinkEvent::Down(key(6)),
                LinkEvent::Up(key(6)),
            ]
        );
    }

    #[test]
    fn without_runtime_link_is_up_immediately() {
        let negotiator = LinkNegotiator::new(Duration::from_secs(5));
        let (fired, bring_up) = flag();
        negotiator.begin(key(5), bring_up);
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(negotiator.pending_count(), 0);
    }
}
