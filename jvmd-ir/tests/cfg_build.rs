use jvmd_ir::cfg::ControlFlowGraph;
use jvmd_ir::instruction::{Instruction, Operand, SwitchTable};
use jvmd_isa::Opcode;

fn insn(offset: u32, opcode: Opcode, operand: Operand, size: u32) -> Instruction {
    Instruction {
        offset,
        opcode,
        operand,
        size,
    }
}

fn simple(offset: u32, opcode: Opcode) -> Instruction {
    insn(offset, opcode, Operand::None, 1)
}

fn assert_edge_bounds(cfg: &ControlFlowGraph) {
    for block in cfg.blocks() {
        assert!(block.succs.len() <= 2, "block {} has {:?}", block.id, block.succs);
        if block.succs.len() == 2 {
            assert!(block.ends_in_conditional(), "block {} has two successors", block.id);
        }
        let mut dedup = block.succs.clone();
        dedup.dedup();
        assert_eq!(dedup, block.succs, "duplicate successor in block {}", block.id);
    }
}

/// `if (x >= 0) return x; else return -x;`
fn abs_method() -> Vec<Instruction> {
    vec![
        simple(0, Opcode::ILOAD_0),
        insn(1, Opcode::IFLT, Operand::Branch(6), 3),
        simple(4, Opcode::ILOAD_0),
        simple(5, Opcode::IRETURN),
        simple(6, Opcode::ILOAD_0),
        simple(7, Opcode::INEG),
        simple(8, Opcode::IRETURN),
    ]
}

#[test]
fn empty_stream_builds_empty_graph() {
    let cfg = ControlFlowGraph::build(&[]);
    assert!(cfg.is_empty());
    assert!(cfg.entry().is_none());
}

#[test]
fn straight_line_is_one_block_without_successors() {
    let insns = vec![
        simple(0, Opcode::ILOAD_1),
        simple(1, Opcode::ILOAD_2),
        simple(2, Opcode::IADD),
        simple(3, Opcode::IRETURN),
    ];
    let cfg = ControlFlowGraph::build(&insns);
    assert_eq!(cfg.len(), 1);
    let entry = cfg.entry().unwrap();
    assert_eq!(entry.instructions.len(), 4);
    assert!(entry.succs.is_empty());
    assert_eq!(entry.end, 4);
}

#[test]
fn conditional_lists_target_before_fallthrough() {
    let cfg = ControlFlowGraph::build(&abs_method());
    assert_eq!(cfg.len(), 3);
    let starts: Vec<u32> = cfg.blocks().iter().map(|b| b.start).collect();
    assert_eq!(starts, vec![0, 4, 6]);
    assert_eq!(cfg.block(0).succs, vec![2, 1]);
    assert!(cfg.block(1).succs.is_empty());
    assert!(cfg.block(2).succs.is_empty());
    assert_eq!(
        cfg.blocks().iter().filter(|b| b.succs.len() == 2).count(),
        1,
        "exactly one two-way block"
    );
    assert_eq!(cfg.block(2).preds, vec![0]);
    assert_edge_bounds(&cfg);
}

#[test]
fn every_instruction_lands_in_exactly_one_block() {
    let insns = abs_method();
    let cfg = ControlFlowGraph::build(&insns);
    let total: usize = cfg.blocks().iter().map(|b| b.instructions.len()).sum();
    assert_eq!(total, insns.len());
    for insn in &insns {
        let id = cfg.block_at_offset(insn.offset).unwrap();
        assert!(cfg.block(id).instructions.contains(insn));
    }
}

#[test]
fn goto_has_single_successor() {
    let insns = vec![
        insn(0, Opcode::GOTO, Operand::Branch(4), 3),
        simple(3, Opcode::NOP),
        simple(4, Opcode::RETURN),
    ];
    let cfg = ControlFlowGraph::build(&insns);
    assert_eq!(cfg.len(), 3);
    assert_eq!(cfg.block(0).succs, vec![2]);
    assert_eq!(cfg.block(1).succs, vec![2], "plain block falls through");
    assert_edge_bounds(&cfg);
}

#[test]
fn unresolved_targets_drop_edges() {
    // Both branches point into the middle of the goto at offset 4.
    let insns = vec![
        simple(0, Opcode::ICONST_0),
        insn(1, Opcode::IFEQ, Operand::Branch(5), 3),
        insn(4, Opcode::GOTO, Operand::Branch(5), 3),
        simple(7, Opcode::RETURN),
    ];
    let cfg = ControlFlowGraph::build(&insns);
    assert_eq!(cfg.block_starting_at(5), None);
    assert_eq!(cfg.block(0).succs, vec![1], "only the fallthrough survives");
    let goto_block = cfg.block_at_offset(4).unwrap();
    assert!(cfg.block(goto_block).succs.is_empty());
    assert_edge_bounds(&cfg);
}

#[test]
fn branch_to_next_instruction_is_not_duplicated() {
    let insns = vec![
        simple(0, Opcode::ICONST_1),
        insn(1, Opcode::IFNE, Operand::Branch(4), 3),
        simple(4, Opcode::RETURN),
    ];
    let cfg = ControlFlowGraph::build(&insns);
    assert_eq!(cfg.block(0).succs, vec![1]);
    assert_edge_bounds(&cfg);
}

#[test]
fn switch_targets_are_separate_edges() {
    let table = SwitchTable {
        default: 32,
        cases: vec![(1, 28), (2, 30), (3, 28)],
    };
    let insns = vec![
        simple(0, Opcode::ILOAD_0),
        insn(1, Opcode::LOOKUPSWITCH, Operand::Switch(table), 27),
        simple(28, Opcode::ICONST_1),
        simple(29, Opcode::IRETURN),
        simple(30, Opcode::ICONST_2),
        simple(31, Opcode::IRETURN),
        simple(32, Opcode::ICONST_0),
        simple(33, Opcode::IRETURN),
    ];
    let cfg = ControlFlowGraph::build(&insns);
    let entry = cfg.entry().unwrap();
    assert!(entry.succs.is_empty());
    let edges = entry.switch_edges.as_ref().unwrap();
    assert_eq!(edges.default, Some(3));
    assert_eq!(edges.cases, vec![(1, 1), (2, 2), (3, 1)]);
    assert_eq!(cfg.all_successors(0), vec![3, 1, 2]);
    assert_eq!(cfg.block(1).preds, vec![0]);
    assert_edge_bounds(&cfg);
}

#[test]
fn handler_aware_build_splits_after_exits() {
    let insns = vec![
        simple(0, Opcode::ICONST_1),
        simple(1, Opcode::IRETURN),
        insn(2, Opcode::ASTORE, Operand::Local(1), 2),
        simple(4, Opcode::ICONST_2),
        simple(5, Opcode::IRETURN),
    ];
    assert_eq!(ControlFlowGraph::build(&insns).len(), 1);
    let cfg = ControlFlowGraph::build_with_handlers(&insns, &[2]);
    assert_eq!(cfg.len(), 2);
    assert_eq!(cfg.block_starting_at(2), Some(1));
    assert!(cfg.block(0).succs.is_empty());
}

#[test]
fn back_edges_are_detected() {
    let insns = vec![
        simple(0, Opcode::NOP),
        insn(1, Opcode::GOTO, Operand::Branch(0), 3),
    ];
    let cfg = ControlFlowGraph::build(&insns);
    assert_eq!(cfg.len(), 1);
    assert_eq!(cfg.block(0).succs, vec![0]);
    assert!(cfg.is_back_edge(0, 0));
}
