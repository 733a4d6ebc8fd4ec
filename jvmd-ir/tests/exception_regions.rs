use jvmd_ir::cfg::ControlFlowGraph;
use jvmd_ir::exception::{CatchType, ExceptionRegion, Handler};
use jvmd_ir::instruction::{Instruction, Operand};
use jvmd_ir::method::ExceptionTableEntry;
use jvmd_isa::Opcode;

fn simple(offset: u32, opcode: Opcode) -> Instruction {
    Instruction {
        offset,
        opcode,
        operand: Operand::None,
        size: 1,
    }
}

/// `try { ... } catch` shaped code: a goto over a handler at offset 13.
fn guarded_method() -> ControlFlowGraph {
    let mut insns: Vec<Instruction> = (0..10).map(|i| simple(i, Opcode::NOP)).collect();
    insns.push(Instruction {
        offset: 10,
        opcode: Opcode::GOTO,
        operand: Operand::Branch(15),
        size: 3,
    });
    insns.push(simple(13, Opcode::ASTORE_1));
    insns.push(simple(14, Opcode::RETURN));
    insns.push(simple(15, Opcode::RETURN));
    ControlFlowGraph::build(&insns)
}

fn row(start_pc: u16, end_pc: u16, handler_pc: u16, catch_type: u16) -> ExceptionTableEntry {
    ExceptionTableEntry {
        start_pc,
        end_pc,
        handler_pc,
        catch_type,
    }
}

#[test]
fn unresolvable_handler_is_dropped_from_shared_range() {
    let cfg = guarded_method();
    let handler_block = cfg.block_starting_at(13).unwrap();
    let rows = [row(0, 10, 13, 7), row(0, 10, 99, 0)];
    let regions = ExceptionRegion::build(&rows, &cfg);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].start_pc, 0);
    assert_eq!(regions[0].end_pc, 10);
    assert_eq!(
        regions[0].handlers,
        vec![Handler {
            catch_type: CatchType::Class(7),
            block: handler_block,
        }]
    );
}

#[test]
fn region_without_resolvable_handlers_is_omitted() {
    let cfg = guarded_method();
    let rows = [row(0, 10, 99, 0), row(0, 5, 13, 0)];
    let regions = ExceptionRegion::build(&rows, &cfg);
    assert_eq!(regions.len(), 1);
    assert_eq!((regions[0].start_pc, regions[0].end_pc), (0, 5));
    assert_eq!(regions[0].handlers[0].catch_type, CatchType::Any);
}

#[test]
fn ranges_keep_first_seen_order() {
    let cfg = guarded_method();
    let rows = [row(2, 8, 13, 3), row(0, 10, 13, 4), row(2, 8, 15, 5)];
    let regions = ExceptionRegion::build(&rows, &cfg);
    let ranges: Vec<(u32, u32)> = regions.iter().map(|r| (r.start_pc, r.end_pc)).collect();
    assert_eq!(ranges, vec![(2, 8), (0, 10)]);
    assert_eq!(regions[0].handlers.len(), 2);
    assert!(regions[0].covers(2));
    assert!(!regions[0].covers(8));
}
