//! Typed request broker.
//!
//! The broker connects two execution contexts over an explicit channel.  The
//! foreground holds a [`BrokerClient`] and awaits one future per call; the
//! background turns a [`BrokerServer`] into a running service by registering
//! a single [`RequestHandler`].
//!
//! Every call carries its own [`oneshot`] reply slot, so a response can only
//! ever reach the caller that issued the request and resolves it exactly
//! once.  Requests are served on independent tasks: a slow request never
//! holds up a fast one, and no ordering is promised between them.
//!
//! # Usage
//!
//! ```rust,no_run
//! # use flowsmith_kernel::broker::{self, RequestHandler};
//! # struct Upper;
//! # #[async_trait::async_trait]
//! # impl RequestHandler<String, String> for Upper {
//! #     async fn handle(&self, request: String) -> String { request.to_uppercase() }
//! #     fn fault(&self, reason: String) -> String { reason }
//! # }
//! # async fn example() {
//! let (client, server) = broker::channel::<String, String>(16);
//! let handle = server.serve(Upper);
//!
//! let reply = client.send("hello".into()).await.unwrap();
//! assert_eq!(reply, "HELLO");
//!
//! handle.shutdown().await;
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::error::{KernelError, Result};

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// Background-side logic that answers requests.
///
/// The handler is infallible by signature: failures must be expressed inside
/// `Resp` so the foreground always receives a structured answer.
#[async_trait]
pub trait RequestHandler<Req, Resp>: Send + Sync + 'static
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Answer a single request.
    async fn handle(&self, request: Req) -> Resp;

    /// Build the response sent when [`handle`](Self::handle) panicked.
    fn fault(&self, reason: String) -> Resp;
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A request paired with the slot its answer must be written to.
struct Envelope<Req, Resp> {
    call_id: Uuid,
    request: Req,
    reply: oneshot::Sender<Resp>,
}

/// Create a connected client/server pair.
///
/// `capacity` bounds how many requests may be queued before the server picks
/// them up; senders wait when the queue is full.
pub fn channel<Req, Resp>(capacity: usize) -> (BrokerClient<Req, Resp>, BrokerServer<Req, Resp>)
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (BrokerClient { sender }, BrokerServer { receiver })
}

// ---------------------------------------------------------------------------
// Foreground side
// ---------------------------------------------------------------------------

/// Foreground handle used to issue requests.
///
/// Cheap to clone; every clone feeds the same background server.
pub struct BrokerClient<Req, Resp> {
    sender: mpsc::Sender<Envelope<Req, Resp>>,
}

impl<Req, Resp> Clone for BrokerClient<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<Req, Resp> BrokerClient<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Send one request and wait for its response.
    ///
    /// Fails with [`KernelError::Transport`] when the background side is not
    /// serving, was shut down, or dropped the request without replying.
    pub async fn send(&self, request: Req) -> Result<Resp> {
        let call_id = Uuid::now_v7();
        let (reply, response) = oneshot::channel();

        self.sender
            .send(Envelope {
                call_id,
                request,
                reply,
            })
            .await
            .map_err(|_| KernelError::transport("background context is not listening"))?;

        trace!(call_id = %call_id, "request dispatched to background");

        response.await.map_err(|_| {
            KernelError::transport(format!(
                "reply channel closed before call {call_id} was answered"
            ))
        })
    }

    /// Whether the background side is still accepting requests.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

// ---------------------------------------------------------------------------
// Background side
// ---------------------------------------------------------------------------

/// Background end of the channel, waiting for a handler.
pub struct BrokerServer<Req, Resp> {
    receiver: mpsc::Receiver<Envelope<Req, Resp>>,
}

impl<Req, Resp> BrokerServer<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Register `handler` and start serving on a background task.
    ///
    /// Each request runs on its own task and holds its reply slot open until
    /// the handler finishes.  Serving stops when every client is dropped or
    /// [`ServeHandle::shutdown`] is called; dropping the handle without
    /// calling `shutdown` leaves the server running.
    pub fn serve<H>(self, handler: H) -> ServeHandle
    where
        H: RequestHandler<Req, Resp>,
    {
        let handler = Arc::new(handler);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let mut receiver = self.receiver;

        let task = tokio::spawn(async move {
            let mut shutdown_armed = true;
            loop {
                tokio::select! {
                    envelope = receiver.recv() => {
                        let Some(envelope) = envelope else {
                            debug!("all broker clients dropped, stopping server");
                            break;
                        };
                        dispatch(Arc::clone(&handler), envelope);
                    }
                    changed = shutdown_rx.changed(), if shutdown_armed => {
                        match changed {
                            Ok(()) if *shutdown_rx.borrow() => {
                                debug!("broker shutdown requested");
                                break;
                            }
                            Ok(()) => {}
                            // Handle dropped: nobody can ask us to stop any more.
                            Err(_) => shutdown_armed = false,
                        }
                    }
                }
            }
            // Queued but undispatched envelopes are dropped here, which
            // fails their callers with a transport error.
            receiver.close();
        });

        ServeHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Run one request on its own task and deliver the answer.
fn dispatch<Req, Resp, H>(handler: Arc<H>, envelope: Envelope<Req, Resp>)
where
    Req: Send + 'static,
    Resp: Send + 'static,
    H: RequestHandler<Req, Resp>,
{
    let Envelope {
        call_id,
        request,
        reply,
    } = envelope;

    tokio::spawn(async move {
        let worker = {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move { handler.handle(request).await })
        };

        let response = match worker.await {
            Ok(response) => response,
            Err(e) => {
                error!(call_id = %call_id, error = %e, "request handler aborted");
                handler.fault(format!("request handler failed: {e}"))
            }
        };

        if reply.send(response).is_err() {
            debug!(call_id = %call_id, "caller went away before the reply was delivered");
        }
    });
}

/// Handle to a running broker server.
pub struct ServeHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServeHandle {
    /// Stop accepting new requests and wait for the accept loop to exit.
    ///
    /// Requests already dispatched keep running and still deliver their
    /// replies.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "broker accept loop ended abnormally");
        }
    }

    /// Whether the accept loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
