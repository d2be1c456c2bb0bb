//! Central service loop.
//!
//! This task owns the `Service` (registry + bridge matcher) and
//! processes every `ServiceRequest` one at a time, in arrival order.
//! Connection tasks never touch the registry directly, so two BRIDGE
//! requests can never be matched out of order or observe a half-done
//! update.

use anyhow::{anyhow, Result};
use rendezvous_core::{Message, RendezvousError, Service};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::types::{ConnectionId, RegistrySnapshot, ServiceRequest, ServiceRx, ServiceTx};

/// Run the central service processing loop until every sender is gone.
pub async fn run_service_loop(mut service_rx: ServiceRx) {
    let mut service = Service::new();

    while let Some(req) = service_rx.recv().await {
        match req {
            ServiceRequest::Dispatch {
                connection_id,
                msg,
                reply,
            } => {
                let kind = msg.kind();
                let result = service.handle(msg);

                match &result {
                    Ok(response) => debug!(
                        connection = connection_id.0,
                        request = kind,
                        response = response.kind(),
                        "request handled"
                    ),
                    Err(err) => warn!(
                        connection = connection_id.0,
                        request = kind,
                        error = %err,
                        "request rejected"
                    ),
                }

                // The connection may already be gone; the mutation stands regardless.
                let _ = reply.send(result);
            }
            ServiceRequest::Snapshot { reply } => {
                let _ = reply.send(RegistrySnapshot {
                    clients: service.clients(),
                    pending: service.pending().cloned(),
                });
            }
        }
    }

    info!("service loop shutting down (all senders dropped)");
}

/// Cloneable handle for talking to the service task.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    tx: ServiceTx,
}

impl ServiceHandle {
    /// Spawn the service task and return a handle to it.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_service_loop(rx));
        ServiceHandle { tx }
    }

    /// Submit one request and wait for the service's verdict.
    ///
    /// The outer error means the service task is gone; the inner one is
    /// the service rejecting the request.
    pub async fn dispatch(
        &self,
        connection_id: ConnectionId,
        msg: Message,
    ) -> Result<Result<Message, RendezvousError>> {
        let (reply, reply_rx) = oneshot::channel();
        self.tx
            .send(ServiceRequest::Dispatch {
                connection_id,
                msg,
                reply,
            })
            .map_err(|_| anyhow!("service loop is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("service loop dropped the request"))
    }

    /// Current registry contents and pending bridge.
    pub async fn snapshot(&self) -> Result<RegistrySnapshot> {
        let (reply, reply_rx) = oneshot::channel();
        self.tx
            .send(ServiceRequest::Snapshot { reply })
            .map_err(|_| anyhow!("service loop is not running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("service loop dropped the request"))
    }
}
