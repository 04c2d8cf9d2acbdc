//! Block polling.

use crate::chain::{BlockSource, MarketReader};
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A new head, plus how many blocks were passed over to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTick {
    pub number: u64,
    pub skipped: u64,
}

/// Polls the head block number and coalesces everything that arrived since
/// the previous tick into one.
pub struct PollingBlockSource<R: ?Sized> {
    reader: Arc<R>,
    interval: Duration,
    last: Option<u64>,
}

impl<R: MarketReader + ?Sized> PollingBlockSource<R> {
    pub fn new(reader: Arc<R>, interval: Duration) -> Self {
        Self {
            reader,
            interval,
            last: None,
        }
    }

    pub fn last_block(&self) -> Option<u64> {
        self.last
    }

    fn observe(&mut self, head: u64) -> Option<BlockTick> {
        let skipped = match self.last {
            Some(last) if head <= last => return None,
            Some(last) => head - last - 1,
            None => 0,
        };
        self.last = Some(head);
        Some(BlockTick { number: head, skipped })
    }
}

#[async_trait]
impl<R: MarketReader + ?Sized> BlockSource for PollingBlockSource<R> {
    async fn next_block(&mut self) -> Result<BlockTick> {
        loop {
            let head = self.reader.block_number().await?;
            if let Some(tick) = self.observe(head) {
                if tick.skipped > 0 {
                    tracing::info!(
                        block_number = tick.number,
                        skipped = tick.skipped,
                        "Skipped blocks that arrived during the previous cycle"
                    );
                }
                return Ok(tick);
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
