use tokio::task::JoinSet;

use crate::error::Result;

/// Run blocking jobs on tokio's blocking pool, at most `workers` at a time.
///
/// `on_done` sees results in completion order and may abort the run by
/// returning an error; jobs still queued are then never started.
pub async fn run_blocking<T, F, D>(jobs: Vec<F>, workers: usize, mut on_done: D) -> Result<()>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
    D: FnMut(T) -> Result<()>,
{
    let workers = workers.max(1);
    let mut tasks = JoinSet::new();

    for job in jobs {
        while tasks.len() >= workers {
            if let Some(joined) = tasks.join_next().await {
                on_done(joined?)?;
            }
        }
        tasks.spawn_blocking(job);
    }

    while let Some(joined) = tasks.join_next().await {
        on_done(joined?)?;
    }
    Ok(())
}
