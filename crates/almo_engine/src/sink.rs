use tokio::sync::mpsc::UnboundedSender;

use crate::EngineEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: UnboundedSender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        // Receiver gone means the consumer shut down.
        let _ = self.tx.send(event);
    }
}
