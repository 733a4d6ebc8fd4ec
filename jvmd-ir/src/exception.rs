use crate::cfg::{BlockId, ControlFlowGraph};
use crate::method::ExceptionTableEntry;

/// What a handler catches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchType {
    /// Catch-all (`catch_type == 0`), as used for `finally` and monitors.
    Any,
    /// Constant-pool class index.
    Class(u16),
}

impl CatchType {
    pub fn from_index(index: u16) -> Self {
        if index == 0 {
            CatchType::Any
        } else {
            CatchType::Class(index)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    pub catch_type: CatchType,
    pub block: BlockId,
}

/// A protected range `[start_pc, end_pc)` with its handlers in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRegion {
    pub start_pc: u32,
    pub end_pc: u32,
    pub handlers: Vec<Handler>,
}

impl ExceptionRegion {
    pub fn covers(&self, pc: u32) -> bool {
        pc >= self.start_pc && pc < self.end_pc
    }

    /// Group raw handler rows by protected range, in first-seen order.
    ///
    /// A row whose handler pc does not start a block is dropped, and a range
    /// left without handlers is omitted.
    pub fn build(rows: &[ExceptionTableEntry], cfg: &ControlFlowGraph) -> Vec<ExceptionRegion> {
        let mut regions: Vec<ExceptionRegion> = Vec::new();
        for row in rows {
            let (start_pc, end_pc) = (u32::from(row.start_pc), u32::from(row.end_pc));
            let idx = match regions
                .iter()
                .position(|r| r.start_pc == start_pc && r.end_pc == end_pc)
            {
                Some(idx) => idx,
                None => {
                    regions.push(ExceptionRegion {
                        start_pc,
                        end_pc,
                        handlers: Vec::new(),
                    });
                    regions.len() - 1
                }
            };

            let Some(block) = cfg.block_starting_at(u32::from(row.handler_pc)) else {
                log::warn!(
                    "dropping exception handler at pc {} for range [{start_pc}, {end_pc}): no block starts there",
                    row.handler_pc
                );
                continue;
            };
            regions[idx].handlers.push(Handler {
                catch_type: CatchType::from_index(row.catch_type),
                block,
            });
        }
        regions.retain(|r| !r.handlers.is_empty());
        regions
    }
}
