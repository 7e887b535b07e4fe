use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns one spawned poll loop.
///
/// The loop receives a child of `parent`; cancelling the parent, calling
/// [`PollGuard::cancel`], or dropping the guard all stop it.
pub struct PollGuard {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PollGuard {
    pub fn spawn<F, Fut>(parent: &CancellationToken, run: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = parent.child_token();
        let handle = tokio::spawn(run(token.clone()));
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the loop to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_loop(
        counter: Arc<AtomicUsize>,
    ) -> impl FnOnce(CancellationToken) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>> {
        move |token| {
            Box::pin(async move {
                let mut ticker = tokio::time::interval(Duration::from_millis(5));
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            counter.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                }
            })
        }
    }

    #[tokio::test]
    async fn drop_cancels_loop() {
        let root = CancellationToken::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = PollGuard::spawn(&root, counting_loop(counter.clone()));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!guard.is_cancelled());
        drop(guard);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
        assert!(!root.is_cancelled());
    }

    #[tokio::test]
    async fn parent_cancellation_reaches_loop() {
        let root = CancellationToken::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let guard = PollGuard::spawn(&root, counting_loop(counter));
        root.cancel();
        assert!(guard.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), guard.shutdown())
            .await
            .expect("loop should exit after parent cancel");
    }
}
