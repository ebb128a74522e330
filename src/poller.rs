//! Timer thread that polls location providers and posts fixes back to the
//! thread owning the [`Session`].

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::provider::LocationProvider;
use crate::sample::ProviderKind;
use crate::session::{FixUpdate, Session};

pub struct Poller {
    updates: Receiver<FixUpdate>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Polls each of `kinds` every `interval` until stopped or dropped.
    pub fn spawn<P>(provider: P, kinds: Vec<ProviderKind>, interval: Duration) -> Self
    where
        P: LocationProvider + 'static,
    {
        let (tx, updates) = mpsc::channel();
        let (stop, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                for &kind in &kinds {
                    let sample = provider.last_known(kind);
                    log::debug!("polled {kind}: {}", if sample.is_some() { "fix" } else { "no fix" });
                    if tx.send(FixUpdate { kind, sample }).is_err() {
                        return;
                    }
                }
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }
            }
        });

        Self {
            updates,
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// Blocks until the next update arrives, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FixUpdate> {
        self.updates.recv_timeout(timeout).ok()
    }

    /// Applies every pending update to `session` and returns how many there were.
    pub fn drain_into(&self, session: &mut Session) -> usize {
        let mut applied = 0;
        loop {
            match self.updates.try_recv() {
                Ok(update) => {
                    session.apply(update);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Signals the thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("location poller thread panicked");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use crate::sample::LocationSample;
    use crate::store::WaypointLog;
    use tempfile::TempDir;

    fn fix() -> LocationSample {
        LocationSample {
            provider: "gps".to_string(),
            latitude: 48.0,
            longitude: 11.0,
            altitude: 500.0,
            accuracy: 4.0,
            fix_time: 10.0,
            capture_time: 11.0,
        }
    }

    #[test]
    fn test_polls_every_kind() {
        let provider = StaticProvider::new();
        provider.set(ProviderKind::Gps, fix());
        let poller = Poller::spawn(
            provider,
            vec![ProviderKind::Fused, ProviderKind::Gps],
            Duration::from_millis(10),
        );

        let first = poller.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = poller.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, FixUpdate { kind: ProviderKind::Fused, sample: None });
        assert_eq!(second.kind, ProviderKind::Gps);
        assert_eq!(second.sample, Some(fix()));
        poller.stop();
    }

    #[test]
    fn test_drain_feeds_session() {
        let dir = TempDir::new().unwrap();
        let log = WaypointLog::open(dir.path().join("log.json")).unwrap();
        let mut session = Session::new(log, ProviderKind::Gps);

        let provider = StaticProvider::new();
        let poller = Poller::spawn(
            provider.clone(),
            vec![ProviderKind::Gps],
            Duration::from_millis(5),
        );
        provider.set(ProviderKind::Gps, fix());

        // Wait until a poll has seen the fix, then hand everything to the session.
        let mut seen = false;
        for _ in 0..500 {
            if let Some(update) = poller.recv_timeout(Duration::from_millis(50)) {
                let has_fix = update.sample.is_some();
                session.apply(update);
                if has_fix {
                    seen = true;
                    break;
                }
            }
        }
        assert!(seen);
        poller.drain_into(&mut session);
        assert_eq!(session.current_fix(), Some(&fix()));

        session.save_point("Porcini", "#8b4513", "mushroom").unwrap();
        assert_eq!(session.log().len(), 1);
    }
}
