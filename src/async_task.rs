use std::task::{Context, Poll};

use futures::{task::noop_waker_ref, FutureExt};

use crate::BoxFuture;

/// How a finished [`AsyncTask`] relates to the session that polled it.
#[derive(Debug, PartialEq, Eq)]
pub enum Settled<T> {
    /// Started in the generation that is still current.
    Current(T),
    /// The session moved on while the work was running; the value is dropped.
    Stale { generation: u64 },
}

/// Background work started for one session generation, polled from the frame
/// loop with a no-op waker until it settles. Settles exactly once.
pub struct AsyncTask<T> {
    generation: u64,
    future: Option<BoxFuture<'static, T>>,
}

impl<T> AsyncTask<T> {
    pub fn new(generation: u64, future: BoxFuture<'static, T>) -> Self {
        Self {
            generation,
            future: Some(future),
        }
    }

    /// `None` while pending and after the result was handed out.
    pub fn poll_settled(&mut self, current_generation: u64) -> Option<Settled<T>> {
        let future = self.future.as_mut()?;
        let Poll::Ready(value) = future.poll_unpin(&mut Context::from_waker(noop_waker_ref()))
        else {
            return None;
        };
        self.future = None;
        if self.generation == current_generation {
            Some(Settled::Current(value))
        } else {
            Some(Settled::Stale {
                generation: self.generation,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_future_settles_on_first_poll() {
        let mut task = AsyncTask::new(3, async { 42 }.boxed());
        assert_eq!(task.poll_settled(3), Some(Settled::Current(42)));
        assert_eq!(task.poll_settled(3), None);
    }

    #[test]
    fn pending_until_sender_completes() {
        let (tx, rx) = futures::channel::oneshot::channel::<u8>();
        let mut task = AsyncTask::new(0, async move { rx.await.ok() }.boxed());
        assert_eq!(task.poll_settled(0), None);
        tx.send(7).unwrap();
        assert_eq!(task.poll_settled(0), Some(Settled::Current(Some(7))));
    }

    #[test]
    fn result_of_an_older_generation_is_stale() {
        let mut task = AsyncTask::new(1, async { "late" }.boxed());
        assert_eq!(task.poll_settled(2), Some(Settled::Stale { generation: 1 }));
        assert_eq!(task.poll_settled(1), None);
    }
}
