//! In-process dealer transport.
//!
//! A query service binds an address inside an [`InprocContext`] and workers
//! connect [`InprocDealer`]s to it. Each direction is a bounded tokio
//! channel sized by the high water mark. Like a dealer socket, nothing is
//! queued past that bound: a message that does not fit, or whose peer is
//! gone, is dropped.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::domain::{Frames, Request};
use crate::error::TransportError;
use crate::ports::{DealerSocket, FrameSender};

/// Worker-side halves of a bound address, taken on connect.
struct DealerHalves {
    inbound: mpsc::Receiver<Frames>,
    outbound: mpsc::Sender<Frames>,
}

/// Address table shared by services and dealers.
///
/// A `None` entry is bound but already has its dealer.
#[derive(Clone, Default)]
pub struct InprocContext {
    bindings: Arc<Mutex<HashMap<String, Option<DealerHalves>>>>,
}

impl InprocContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `address` as a query service.
    pub fn bind(
        &self,
        address: impl Into<String>,
        high_water_mark: usize,
    ) -> Result<InprocService, TransportError> {
        let address = address.into();
        let mut bindings = self.bindings.lock();
        if bindings.contains_key(&address) {
            return Err(TransportError::EndpointInUse(address));
        }

        let capacity = high_water_mark.max(1);
        let (requests, inbound) = mpsc::channel(capacity);
        let (outbound, responses) = mpsc::channel(capacity);
        bindings.insert(address.clone(), Some(DealerHalves { inbound, outbound }));

        Ok(InprocService {
            address,
            requests,
            responses,
            context: self.clone(),
        })
    }

    pub fn is_bound(&self, address: &str) -> bool {
        self.bindings.lock().contains_key(address)
    }

    fn take(&self, address: &str) -> Result<DealerHalves, TransportError> {
        match self.bindings.lock().get_mut(address) {
            None => Err(TransportError::EndpointNotFound(address.to_string())),
            Some(slot) => slot
                .take()
                .ok_or_else(|| TransportError::EndpointInUse(address.to_string())),
        }
    }
}

/// Service side of a bound address.
///
/// Dropping it unbinds the address and ends the connected dealer's session.
pub struct InprocService {
    address: String,
    requests: mpsc::Sender<Frames>,
    responses: mpsc::Receiver<Frames>,
    context: InprocContext,
}

impl InprocService {
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Deliver a message to the dealer, waiting for queue space.
    pub async fn send(&self, frames: Frames) -> Result<(), TransportError> {
        self.requests
            .send(frames)
            .await
            .map_err(|_| TransportError::ServiceStopped)
    }

    pub async fn send_request(&self, request: &Request) -> Result<(), TransportError> {
        self.send(request.encode()).await
    }

    /// Next message from the dealer, or `None` once it has disconnected.
    pub async fn recv(&mut self) -> Option<Frames> {
        self.responses.recv().await
    }

    /// Next message from the dealer if one is queued.
    pub fn try_recv(&mut self) -> Option<Frames> {
        self.responses.try_recv().ok()
    }
}

impl Drop for InprocService {
    fn drop(&mut self) {
        self.context.bindings.lock().remove(&self.address);
    }
}

enum LinkState {
    Unconnected,
    Connected(mpsc::Sender<Frames>),
    Closed,
}

/// Sending half shared by a dealer and its responders.
struct InprocLink {
    state: Mutex<LinkState>,
}

impl FrameSender for InprocLink {
    fn send(&self, frames: Frames) -> Result<(), TransportError> {
        match &*self.state.lock() {
            LinkState::Unconnected => Err(TransportError::NotConnected),
            LinkState::Closed => Err(TransportError::ServiceStopped),
            LinkState::Connected(outbound) => match outbound.try_send(frames) {
                Ok(()) | Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => Ok(()),
            },
        }
    }
}

/// Dealer endpoint connecting a worker to an [`InprocService`].
pub struct InprocDealer {
    context: InprocContext,
    inbound: Option<mpsc::Receiver<Frames>>,
    pending: Option<Frames>,
    link: Arc<InprocLink>,
}

impl InprocDealer {
    pub fn new(context: &InprocContext) -> Self {
        Self {
            context: context.clone(),
            inbound: None,
            pending: None,
            link: Arc::new(InprocLink {
                state: Mutex::new(LinkState::Unconnected),
            }),
        }
    }
}

#[async_trait]
impl DealerSocket for InprocDealer {
    async fn connect(&mut self, endpoint: &str) -> Result<(), TransportError> {
        let mut state = self.link.state.lock();
        if !matches!(*state, LinkState::Unconnected) {
            return Err(TransportError::AlreadyConnected);
        }

        let halves = self.context.take(endpoint)?;
        *state = LinkState::Connected(halves.outbound);
        self.inbound = Some(halves.inbound);
        Ok(())
    }

    async fn readable(&mut self) -> Result<(), TransportError> {
        if self.pending.is_some() {
            return Ok(());
        }
        let inbound = self.inbound.as_mut().ok_or(TransportError::NotConnected)?;
        let frames = inbound.recv().await.ok_or(TransportError::ServiceStopped)?;
        self.pending = Some(frames);
        Ok(())
    }

    fn receive(&mut self) -> Result<Frames, TransportError> {
        if let Some(frames) = self.pending.take() {
            return Ok(frames);
        }
        let inbound = self.inbound.as_mut().ok_or(TransportError::NotConnected)?;
        inbound.try_recv().map_err(|error| match error {
            TryRecvError::Empty => TransportError::WouldBlock,
            TryRecvError::Disconnected => TransportError::ServiceStopped,
        })
    }

    fn sender(&self) -> Arc<dyn FrameSender> {
        self.link.clone()
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let mut state = self.link.state.lock();
        if !matches!(*state, LinkState::Connected(_)) {
            return Err(TransportError::NotConnected);
        }
        *state = LinkState::Closed;
        self.inbound = None;
        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const ADDRESS: &str = "inproc://public_query_workers";

    fn message(tag: &'static str) -> Frames {
        vec![Bytes::from_static(tag.as_bytes())]
    }

    #[tokio::test]
    async fn test_bind_twice_fails() {
        let context = InprocContext::new();
        let _service = context.bind(ADDRESS, 8).unwrap();

        assert!(matches!(
            context.bind(ADDRESS, 8),
            Err(TransportError::EndpointInUse(_))
        ));
    }

    #[tokio::test]
    async fn test_drop_unbinds() {
        let context = InprocContext::new();
        drop(context.bind(ADDRESS, 8).unwrap());

        assert!(!context.is_bound(ADDRESS));
        assert!(context.bind(ADDRESS, 8).is_ok());
    }

    #[tokio::test]
    async fn test_connect_errors() {
        let context = InprocContext::new();
        let mut dealer = InprocDealer::new(&context);
        assert_eq!(
            dealer.connect(ADDRESS).await,
            Err(TransportError::EndpointNotFound(ADDRESS.to_string()))
        );

        let _service = context.bind(ADDRESS, 8).unwrap();
        dealer.connect(ADDRESS).await.unwrap();
        assert_eq!(
            dealer.connect(ADDRESS).await,
            Err(TransportError::AlreadyConnected)
        );

        let mut second = InprocDealer::new(&context);
        assert_eq!(
            second.connect(ADDRESS).await,
            Err(TransportError::EndpointInUse(ADDRESS.to_string()))
        );
    }

    #[tokio::test]
    async fn test_duplex_exchange() {
        let context = InprocContext::new();
        let mut service = context.bind(ADDRESS, 8).unwrap();
        let mut dealer = InprocDealer::new(&context);
        dealer.connect(ADDRESS).await.unwrap();

        assert_eq!(dealer.receive(), Err(TransportError::WouldBlock));
        service.send(message("ping")).await.unwrap();
        dealer.readable().await.unwrap();
        assert_eq!(dealer.receive().unwrap(), message("ping"));

        dealer.sender().send(message("pong")).unwrap();
        assert_eq!(service.recv().await.unwrap(), message("pong"));
    }

    #[tokio::test]
    async fn test_send_past_high_water_mark_drops() {
        let context = InprocContext::new();
        let mut service = context.bind(ADDRESS, 2).unwrap();
        let mut dealer = InprocDealer::new(&context);
        dealer.connect(ADDRESS).await.unwrap();
        let sender = dealer.sender();

        for tag in ["a", "b", "c", "d"] {
            assert!(sender.send(message(tag)).is_ok());
        }

        assert_eq!(service.try_recv(), Some(message("a")));
        assert_eq!(service.try_recv(), Some(message("b")));
        assert_eq!(service.try_recv(), None);
    }

    #[tokio::test]
    async fn test_send_after_disconnect_is_stopped() {
        let context = InprocContext::new();
        let _service = context.bind(ADDRESS, 8).unwrap();
        let mut dealer = InprocDealer::new(&context);
        assert_eq!(
            dealer.sender().send(message("early")),
            Err(TransportError::NotConnected)
        );

        dealer.connect(ADDRESS).await.unwrap();
        let retained = dealer.sender();
        dealer.disconnect().await.unwrap();

        assert_eq!(retained.send(message("late")), Err(TransportError::ServiceStopped));
        assert_eq!(dealer.disconnect().await, Err(TransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_send_to_departed_service_is_dropped() {
        let context = InprocContext::new();
        let service = context.bind(ADDRESS, 8).unwrap();
        let mut dealer = InprocDealer::new(&context);
        dealer.connect(ADDRESS).await.unwrap();

        drop(service);

        assert!(dealer.sender().send(message("orphan")).is_ok());
        assert_eq!(dealer.readable().await, Err(TransportError::ServiceStopped));
    }
}
