//! Per-path task ordering.
//!
//! Every path gets a lane: a handler spawned for a path waits for the previous
//! handler of the same path before it starts. Handlers for different paths run
//! concurrently.

use rustc_hash::FxHashMap;
use std::future::Future;
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Aborts the wrapped task when dropped, so aborting a lane's tail aborts
/// everything queued before it.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Chains tasks per path, in spawn order.
#[derive(Default)]
pub struct PathLanes {
    tails: FxHashMap<PathBuf, JoinHandle<()>>,
}

impl PathLanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after every task previously spawned for `path`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, path: PathBuf, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap();

        let previous = self.tails.remove(&path).map(AbortOnDrop);
        let handle = tokio::spawn(async move {
            if let Some(mut previous) = previous {
                let _ = (&mut previous.0).await;
            }
            task.await;
        });
        self.tails.insert(path, handle);
    }

    /// Wait for every queued task.
    pub async fn drain(&mut self) {
        for (_, handle) in self.tails.drain() {
            let _ = handle.await;
        }
    }

    /// Abort every queued or running task.
    pub fn abort_all(&mut self) {
        for (_, handle) in self.tails.drain() {
            handle.abort();
        }
    }

    fn reap(&mut self) {
        self.tails.retain(|_, handle| !handle.is_finished());
    }
}

impl Drop for PathLanes {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_path_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut lanes = PathLanes::new();

        for (i, delay) in [(0, 40), (1, 0), (2, 10)] {
            let log = Arc::clone(&log);
            lanes.spawn(PathBuf::from("/p/a.php"), async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                log.lock().push(i);
            });
        }
        lanes.drain().await;

        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_different_paths_overlap() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut lanes = PathLanes::new();

        let slow = Arc::clone(&log);
        lanes.spawn(PathBuf::from("/p/slow.ts"), async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            slow.lock().push("slow");
        });
        let fast = Arc::clone(&log);
        lanes.spawn(PathBuf::from("/p/fast.php"), async move {
            fast.lock().push("fast");
        });
        lanes.drain().await;

        assert_eq!(*log.lock(), vec!["fast", "slow"]);
    }

    #[tokio::test]
    async fn test_abort_all_stops_queued_work() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut lanes = PathLanes::new();

        for i in 0..2 {
            let log = Arc::clone(&log);
            lanes.spawn(PathBuf::from("/p/a.ts"), async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                log.lock().push(i);
            });
        }
        lanes.abort_all();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(log.lock().is_empty());
        assert!(lanes.tails.is_empty());
    }
}
