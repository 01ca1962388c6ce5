//! Serial execution context for camera hardware.
//!
//! A dedicated thread owns the queue state (both capture sessions and the
//! device discovery). Jobs run on it one at a time, in submission order, so
//! device handles are never touched concurrently and never leave the thread.

use crate::capture::CameraError;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::mpsc;
use std::task::{Context, Poll};
use std::thread::JoinHandle;
use tokio::sync::oneshot;

type Job<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// Single worker thread that serializes all work on a `T`.
pub struct SessionQueue<T> {
    tx: Option<mpsc::Sender<Job<T>>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: 'static> SessionQueue<T> {
    /// Spawns the worker. `init` builds the owned state on the worker
    /// thread itself, so `T` need not be `Send`.
    pub fn spawn<F>(name: &str, init: F) -> Result<Self, CameraError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job<T>>();

        let worker = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut state = init();
                while let Ok(job) = rx.recv() {
                    // A panicking job drops its reply; the state and the
                    // queue stay usable for the jobs after it
                    if panic::catch_unwind(AssertUnwindSafe(|| job(&mut state))).is_err() {
                        tracing::error!("Session queue job panicked");
                    }
                }
                tracing::debug!("Session queue drained");
            })
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to spawn session queue");
                CameraError::ConfigurationFailed
            })?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Enqueues `job`. The work runs whether or not the returned ticket is
    /// awaited.
    pub fn submit<R, F>(&self, job: F) -> Ticket<R>
    where
        F: FnOnce(&mut T) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Job<T> = Box::new(move |state| {
            let _ = reply.send(job(state));
        });

        match &self.tx {
            Some(tx) => {
                if tx.send(job).is_err() {
                    tracing::error!("Session queue worker is gone");
                }
            }
            None => tracing::error!("Session queue already shut down"),
        }
        Ticket {
            inner: TicketInner::Pending(rx),
        }
    }
}

impl<T> Drop for SessionQueue<T> {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop once queued jobs finish
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.join() {
                tracing::error!("Session queue worker panicked: {:?}", e);
            }
        }
    }
}

/// Completion handle for a submitted job.
///
/// Resolves to `CaptureError` if the worker dies before answering, so
/// awaiting a ticket never hangs.
#[derive(Debug)]
pub struct Ticket<R> {
    inner: TicketInner<R>,
}

#[derive(Debug)]
enum TicketInner<R> {
    Pending(oneshot::Receiver<R>),
    Failed(Option<CameraError>),
}

impl<R> Ticket<R> {
    /// A ticket for work that was refused before reaching the queue.
    pub fn failed(error: CameraError) -> Self {
        Self {
            inner: TicketInner::Failed(Some(error)),
        }
    }
}

impl<R> Future for Ticket<R> {
    type Output = Result<R, CameraError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            TicketInner::Pending(rx) => Pin::new(rx).poll(cx).map(|result| {
                result.map_err(|_| CameraError::CaptureError("session queue closed".into()))
            }),
            TicketInner::Failed(error) => Poll::Ready(Err(error
                .take()
                .unwrap_or_else(|| CameraError::CaptureError("ticket already resolved".into())))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[tokio::test]
    async fn test_jobs_run_in_order() {
        let queue = SessionQueue::spawn("test-queue", Vec::<u32>::new).unwrap();

        let _ = queue.submit(|log| log.push(1));
        let _ = queue.submit(|log| log.push(2));
        let snapshot = queue.submit(|log| log.clone()).await.unwrap();

        assert_eq!(snapshot, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_state_need_not_be_send() {
        let queue = SessionQueue::spawn("test-queue", || Rc::new(RefCell::new(0u32))).unwrap();

        let _ = queue.submit(|counter| *counter.borrow_mut() += 5);
        let value = queue.submit(|counter| *counter.borrow()).await.unwrap();

        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn test_panicking_job_resolves_ticket() {
        let queue = SessionQueue::spawn("test-queue", || 0u32).unwrap();

        let result = queue
            .submit(|state| {
                if *state == 0 {
                    panic!("device fault");
                }
            })
            .await;
        assert!(matches!(result, Err(CameraError::CaptureError(_))));
    }

    #[tokio::test]
    async fn test_queue_survives_panicking_job() {
        let queue = SessionQueue::spawn("test-queue", || 7u32).unwrap();

        let _ = queue
            .submit(|state| {
                if *state == 7 {
                    panic!("device fault");
                }
            })
            .await;
        let _ = queue.submit(|state| *state += 1);
        let value = queue.submit(|state| *state).await.unwrap();

        assert_eq!(value, 8);
    }

    #[tokio::test]
    async fn test_failed_ticket_skips_queue() {
        let queue = SessionQueue::spawn("test-queue", || 0u32).unwrap();

        let refused: Ticket<u32> = Ticket::failed(CameraError::NotAuthorized);
        assert_eq!(refused.await, Err(CameraError::NotAuthorized));
        assert_eq!(queue.submit(|state| *state).await, Ok(0));
    }
}
