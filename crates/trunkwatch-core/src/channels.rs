// Trunkwatch — Collaborator Interfaces
//
// The engine is transport-agnostic. It pulls messages from an `EventSource`
// and hands composed alerts to an `AlertSink`. The Discord bridge implements
// both; tests and the replay CLI use the stream adapter below.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{AlertPayload, InboundEvent};
use async_trait::async_trait;
use futures::{Stream, StreamExt};

/// Delivers `(channel, author, text)` messages, one at a time.
/// `None` ends the run.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Option<InboundEvent>;
}

/// Posts an alert to a target channel. Failures are reported, never retried.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    async fn deliver(&self, channel_id: &str, alert: &AlertPayload) -> EngineResult<()>;
}

/// Any `Stream` of events as an `EventSource`.
pub struct StreamSource<S> {
    inner: S,
}

impl<S> StreamSource<S>
where
    S: Stream<Item = InboundEvent> + Unpin + Send,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> EventSource for StreamSource<S>
where
    S: Stream<Item = InboundEvent> + Unpin + Send,
{
    async fn next_event(&mut self) -> Option<InboundEvent> {
        self.inner.next().await
    }
}

/// Tokio channel receiver as an `EventSource`; the gateway bridge feeds one.
#[async_trait]
impl EventSource for tokio::sync::mpsc::Receiver<InboundEvent> {
    async fn next_event(&mut self) -> Option<InboundEvent> {
        self.recv().await
    }
}
