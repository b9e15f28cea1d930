use std::{future::Future, time::Duration};

/// Runs `pass` once per `period` until `shutdown` resolves and returns how many
/// passes ran. `shutdown` is polled before every tick, so a request that lands
/// while a pass is running stops the loop as soon as that pass returns.
pub async fn run_until<S, F, Fut>(period: Duration, shutdown: S, mut pass: F) -> usize
where
    S: Future,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>
{
    let mut ticker = tokio::time::interval(period);
    tokio::pin!(shutdown);
    let mut passes = 0;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                pass().await;
                passes += 1;
            }
        }
    }

    passes
}
