//! Fan-out-then-join over independent futures.
//!
//! All futures are polled on the calling task; nothing is spawned onto the
//! runtime. `join` waits for every member to finish, even after one fails,
//! so sibling deletes are never abandoned half-issued.

use futures::{
    StreamExt,
    future::BoxFuture,
    stream::FuturesUnordered,
};
use std::future::Future;

pub struct TaskGroup<'a, E> {
    tasks: FuturesUnordered<BoxFuture<'a, Result<(), E>>>,
}

impl<'a, E: Send + 'a> TaskGroup<'a, E> {
    pub fn new() -> Self {
        Self {
            tasks: FuturesUnordered::new(),
        }
    }

    pub fn spawn<F>(&mut self, fut: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.tasks.push(Box::pin(fut));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Await every member. Returns how many ran, or the first error seen.
    pub async fn join(mut self) -> Result<usize, E> {
        let mut completed = 0;
        let mut first_err = None;
        while let Some(res) = self.tasks.next().await {
            completed += 1;
            if let Err(err) = res {
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(completed),
        }
    }
}

impl<'a, E: Send + 'a> Default for TaskGroup<'a, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `op` once per item concurrently and join with first-error semantics.
pub async fn for_each_concurrent<'a, T, E, F, Fut>(items: Vec<T>, op: F) -> Result<usize, E>
where
    E: Send + 'a,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<(), E>> + Send + 'a,
{
    let mut group = TaskGroup::new();
    for item in items {
        group.spawn(op(item));
    }
    group.join().await
}
