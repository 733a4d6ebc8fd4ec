use std::collections::{BTreeMap, BTreeSet};

use crate::instruction::Instruction;

/// Index of a basic block within the CFG.
pub type BlockId = usize;

/// Resolved outgoing edges of a block ending in a multi-way branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchEdges {
    /// Default target, if it starts a block.
    pub default: Option<BlockId>,
    /// `(key, target)` pairs whose target starts a block, in encoding order.
    pub cases: Vec<(i32, BlockId)>,
}

impl SwitchEdges {
    /// Distinct targets, default first, then cases in encoding order.
    pub fn targets(&self) -> Vec<BlockId> {
        let mut out = Vec::new();
        for id in self.default.into_iter().chain(self.cases.iter().map(|&(_, b)| b)) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

/// A basic block: a maximal sequence of instructions with no internal branches.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Unique block index, equal to its position in construction order.
    pub id: BlockId,
    /// Byte offset of the first instruction.
    pub start: u32,
    /// Byte offset past the last instruction (exclusive).
    pub end: u32,
    pub instructions: Vec<Instruction>,
    /// Direct successors. For a conditional branch the taken target comes
    /// first and the fallthrough second.
    pub succs: Vec<BlockId>,
    /// Multi-way branch targets; such blocks have no entries in `succs`.
    pub switch_edges: Option<SwitchEdges>,
    pub preds: Vec<BlockId>,
}

impl BasicBlock {
    pub fn last_instruction(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    pub fn ends_in_conditional(&self) -> bool {
        self.last_instruction()
            .is_some_and(Instruction::is_conditional_branch)
    }

    pub fn ends_in_exit(&self) -> bool {
        self.last_instruction().is_some_and(Instruction::is_exit)
    }
}

/// Control flow graph for a single method. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ControlFlowGraph {
    blocks: Vec<BasicBlock>,
    /// Block start offset to block id.
    offset_to_block: BTreeMap<u32, BlockId>,
}

impl ControlFlowGraph {
    /// Build a CFG from a decoded instruction stream.
    ///
    /// Leaders are the first instruction, every branch target and the
    /// instruction after every branch. A leader that does not fall on an
    /// instruction boundary starts no block, and edges to it are dropped.
    pub fn build(instructions: &[Instruction]) -> Self {
        Self::build_inner(instructions, &[], false)
    }

    /// Like [`build`](Self::build), but also splits at every offset in
    /// `extra_leaders` (handler entries and protected-range boundaries) and
    /// after every return or throw, so that handlers following an exit
    /// instruction get blocks of their own.
    pub fn build_with_handlers(instructions: &[Instruction], extra_leaders: &[u32]) -> Self {
        Self::build_inner(instructions, extra_leaders, true)
    }

    fn build_inner(instructions: &[Instruction], extra_leaders: &[u32], split_after_exits: bool) -> Self {
        let Some(first) = instructions.first() else {
            return Self::default();
        };

        // Step 1: leaders
        let mut leaders = BTreeSet::new();
        leaders.insert(first.offset);
        leaders.extend(extra_leaders.iter().copied());
        for (i, insn) in instructions.iter().enumerate() {
            if split_after_exits && insn.is_exit() {
                leaders.extend(instructions.get(i + 1).map(|next| next.offset));
            }
            if !insn.is_branch() {
                continue;
            }
            leaders.extend(insn.branch_target());
            if let Some(table) = insn.switch_table() {
                leaders.insert(table.default);
                leaders.extend(table.cases.iter().map(|&(_, target)| target));
            }
            if let Some(next) = instructions.get(i + 1) {
                leaders.insert(next.offset);
            }
        }

        // Step 2: one block per leader that starts an instruction
        let starts: BTreeSet<u32> = instructions.iter().map(|insn| insn.offset).collect();
        let mut blocks = Vec::new();
        let mut offset_to_block = BTreeMap::new();
        for &leader in leaders.iter().filter(|l| starts.contains(l)) {
            let id = blocks.len();
            offset_to_block.insert(leader, id);
            blocks.push(BasicBlock {
                id,
                start: leader,
                end: leader,
                instructions: Vec::new(),
                succs: Vec::new(),
                switch_edges: None,
                preds: Vec::new(),
            });
        }

        // Step 3: each instruction joins the block with the greatest start <= its offset
        for insn in instructions {
            let Some((_, &id)) = offset_to_block.range(..=insn.offset).next_back() else {
                continue;
            };
            let block = &mut blocks[id];
            block.end = insn.next_offset();
            block.instructions.push(insn.clone());
        }

        // Step 4: successor edges
        let resolve = |target: u32| offset_to_block.get(&target).copied();
        for id in 0..blocks.len() {
            let next = (id + 1 < blocks.len()).then_some(id + 1);
            let (mut succs, switch_edges) = match blocks[id].last_instruction() {
                Some(last) if last.is_unconditional_jump() => {
                    (last.branch_target().and_then(resolve).into_iter().collect(), None)
                }
                Some(last) if last.is_conditional_branch() => {
                    let mut succs: Vec<BlockId> =
                        last.branch_target().and_then(resolve).into_iter().collect();
                    succs.extend(next);
                    (succs, None)
                }
                Some(last) if last.is_exit() => (Vec::new(), None),
                Some(last) if last.is_switch() => {
                    let edges = last.switch_table().map(|table| SwitchEdges {
                        default: resolve(table.default),
                        cases: table
                            .cases
                            .iter()
                            .filter_map(|&(key, target)| resolve(target).map(|b| (key, b)))
                            .collect(),
                    });
                    (Vec::new(), edges)
                }
                _ => (next.into_iter().collect(), None),
            };
            succs.dedup();
            blocks[id].succs = succs;
            blocks[id].switch_edges = switch_edges;
        }

        // Predecessor lists
        for id in 0..blocks.len() {
            for succ in outgoing(&blocks[id]) {
                if !blocks[succ].preds.contains(&id) {
                    blocks[succ].preds.push(id);
                }
            }
        }

        ControlFlowGraph {
            blocks,
            offset_to_block,
        }
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The first block in construction order.
    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    /// Block whose start offset is exactly `offset`.
    pub fn block_starting_at(&self, offset: u32) -> Option<BlockId> {
        self.offset_to_block.get(&offset).copied()
    }

    /// Block containing the instruction at `offset`.
    pub fn block_at_offset(&self, offset: u32) -> Option<BlockId> {
        let (_, &id) = self.offset_to_block.range(..=offset).next_back()?;
        (offset < self.blocks[id].end).then_some(id)
    }

    /// Ordinary successors followed by distinct switch targets.
    pub fn all_successors(&self, id: BlockId) -> Vec<BlockId> {
        outgoing(&self.blocks[id])
    }

    /// Whether the edge `from -> to` jumps backwards (or to itself).
    pub fn is_back_edge(&self, from: BlockId, to: BlockId) -> bool {
        self.blocks[to].start <= self.blocks[from].start
    }
}

fn outgoing(block: &BasicBlock) -> Vec<BlockId> {
    let mut out = block.succs.clone();
    if let Some(edges) = &block.switch_edges {
        for target in edges.targets() {
            if !out.contains(&target) {
                out.push(target);
            }
        }
    }
    out
}
