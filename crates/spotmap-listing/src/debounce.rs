use spotmap_core::models::EntityKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Collapses bursts of calls per entity kind into the last one.
///
/// Each call waits out the window; only a call that no later call for the
/// same kind has overtaken gets its value back.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    generations: [AtomicU64; 3],
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, generations: Default::default() }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Drop any call for `kind` still waiting out its window
    pub fn cancel(&self, kind: EntityKind) {
        self.generations[kind.index()].fetch_add(1, Ordering::SeqCst);
    }

    pub async fn debounce<T>(&self, kind: EntityKind, value: T) -> Option<T> {
        let counter = &self.generations[kind.index()];
        let generation = counter.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.window.is_zero() {
            tokio::time::sleep(self.window).await;
        }

        if counter.load(Ordering::SeqCst) == generation {
            Some(value)
        } else {
            tracing::trace!(%kind, generation, "Debounced call overtaken");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last() {
        let debouncer = Debouncer::new(Duration::from_millis(300));

        let (a, b, c) = tokio::join!(
            debouncer.debounce(EntityKind::Parking, "g"),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                debouncer.debounce(EntityKind::Parking, "ga").await
            },
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                debouncer.debounce(EntityKind::Parking, "gar").await
            },
        );

        assert_eq!((a, b, c), (None, None, Some("gar")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_kinds_are_independent() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let (parking, service) = tokio::join!(
            debouncer.debounce(EntityKind::Parking, 1),
            debouncer.debounce(EntityKind::Service, 2),
        );
        assert_eq!((parking, service), (Some(1), Some(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_waiting_call() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let (waiting, _) = tokio::join!(debouncer.debounce(EntityKind::Parking, "gar"), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            debouncer.cancel(EntityKind::Parking);
        });
        assert_eq!(waiting, None);
        assert_eq!(debouncer.debounce(EntityKind::Parking, "next").await, Some("next"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_all_pass() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        assert_eq!(debouncer.debounce(EntityKind::Parking, 1).await, Some(1));
        assert_eq!(debouncer.debounce(EntityKind::Parking, 2).await, Some(2));
    }
}
