use std::panic::Location;
use std::time::Duration;

use crate::park::park_at;

/// [`tokio::time::sleep`] reported as `sleep`.
#[track_caller]
pub fn sleep(duration: Duration) -> impl Future<Output = ()> {
    park_at(
        "unit_trace::time::sleep",
        "sleep".to_string(),
        Location::caller(),
        tokio::time::sleep(duration),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tracker;

    #[tokio::test(start_paused = true)]
    async fn test_sleeping_unit() {
        let tracker = Tracker::new();
        let handle = tracker.spawn("tests::main", sleep(Duration::from_secs(60)));
        tokio::task::yield_now().await;

        let unit = &tracker.snapshot()[0];
        assert_eq!(unit.reason, "sleep");
        assert_eq!(unit.top_frame().unwrap().func, "unit_trace::time::sleep");

        handle.await.unwrap();
        assert!(tracker.is_empty());
    }
}
