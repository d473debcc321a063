//! [`OutputSink`] implementations.
//!
//! - [`ChannelSink`] forwards frames over a Tokio channel to whatever the
//!   runtime wires downstream.
//! - [`CollectingSink`] keeps frames in memory, in emission order.

use async_trait::async_trait;
use pipeline::{Frame, OutputChannel, OutputRejected, OutputSink};
use tokio::sync::{mpsc, Mutex};

/// A frame together with the output it was written to.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted {
    pub channel: OutputChannel,
    pub frame: Frame,
}

/// Forwards emitted frames to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Emitted>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that observes its frames.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Emitted>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn emit(&self, channel: OutputChannel, frame: Frame) -> Result<(), OutputRejected> {
        self.tx
            .send(Emitted { channel, frame })
            .map_err(|_| OutputRejected { channel })
    }
}

/// Stores emitted frames in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    emitted: Mutex<Vec<Emitted>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, in order.
    pub async fn emitted(&self) -> Vec<Emitted> {
        self.emitted.lock().await.clone()
    }

    /// Consumes the sink, returning everything it received.
    pub fn into_emitted(self) -> Vec<Emitted> {
        self.emitted.into_inner()
    }
}

#[async_trait]
impl OutputSink for CollectingSink {
    async fn emit(&self, channel: OutputChannel, frame: Frame) -> Result<(), OutputRejected> {
        self.emitted.lock().await.push(Emitted { channel, frame });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(OutputChannel::Final, Frame::with_message("a"))
            .await
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.channel, OutputChannel::Final);
        assert_eq!(received.frame.get_str("message"), Some("a"));
    }

    #[tokio::test]
    async fn channel_sink_rejects_after_receiver_drops() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        let err = sink
            .emit(OutputChannel::Final, Frame::default())
            .await
            .unwrap_err();
        assert_eq!(err.channel, OutputChannel::Final);
    }

    #[tokio::test]
    async fn collecting_sink_keeps_everything() {
        let sink = CollectingSink::new();
        sink.emit(OutputChannel::Final, Frame::default()).await.unwrap();
        sink.emit(OutputChannel::Final, Frame::default()).await.unwrap();

        assert_eq!(sink.emitted().await.len(), 2);
        assert_eq!(sink.into_emitted().len(), 2);
    }
}
