use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

/// Signals emitted by the batch worker, in processing order. The total
/// always precedes the first per-item signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Total { total: usize },
    ItemDone,
    BatchComplete,
}

/// Consumer side of the batch's progress contract. Implementable by a CLI
/// progress bar, a structured logger, or any other presentation layer.
pub trait ProgressSink: Send {
    fn on_total(&mut self, total: usize);
    fn on_item_done(&mut self);
    fn on_batch_complete(&mut self);
}

/// Sink that reports through the tracing log
#[derive(Default)]
pub struct LogSink {
    completed: usize,
    total: usize,
}

impl ProgressSink for LogSink {
    fn on_total(&mut self, total: usize) {
        self.total = total;
        info!("Batch scheduled: {} items", total);
    }

    fn on_item_done(&mut self) {
        self.completed += 1;
        info!("Processed {} of {} items", self.completed, self.total);
    }

    fn on_batch_complete(&mut self) {
        info!("Batch complete: {} of {} items processed", self.completed, self.total);
    }
}

/// Sink that writes one JSON object per event to stdout, for machine
/// consumption of batch progress.
#[derive(Default)]
pub struct JsonLinesSink;

impl JsonLinesSink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            println!("{}", line);
        }
    }
}

impl ProgressSink for JsonLinesSink {
    fn on_total(&mut self, total: usize) {
        self.emit(ProgressEvent::Total { total });
    }

    fn on_item_done(&mut self) {
        self.emit(ProgressEvent::ItemDone);
    }

    fn on_batch_complete(&mut self) {
        self.emit(ProgressEvent::BatchComplete);
    }
}

/// Sink that forwards events over a channel to whichever task renders them.
/// Send failures mean the consumer went away; the batch keeps running.
pub struct ChannelSink {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn on_total(&mut self, total: usize) {
        let _ = self.tx.send(ProgressEvent::Total { total });
    }

    fn on_item_done(&mut self) {
        let _ = self.tx.send(ProgressEvent::ItemDone);
    }

    fn on_batch_complete(&mut self) {
        let _ = self.tx.send(ProgressEvent::BatchComplete);
    }
}
