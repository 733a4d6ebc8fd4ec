//! Systematic opcode_table() coverage tests.
//!
//! Validates metadata consistency for every opcode in the table.

use jvmd_isa::{Opcode, OpcodeFlags, OperandShape, lookup, opcode_count, opcode_table};

#[test]
fn table_covers_classic_opcode_range() {
    assert_eq!(opcode_count(), 0xca, "expected every opcode from 0x00 to 0xc9");
}

#[test]
fn lookup_roundtrip_for_all_opcodes() {
    for info in opcode_table() {
        let raw = info.opcode().raw();
        let found = lookup(raw);
        assert!(
            found.is_some(),
            "lookup({:#x}) returned None for mnemonic '{}'",
            raw,
            info.mnemonic()
        );
        assert_eq!(
            found.unwrap().mnemonic(),
            info.mnemonic(),
            "lookup({:#x}) mnemonic mismatch",
            raw
        );
    }
}

#[test]
fn all_opcodes_have_wellformed_mnemonic() {
    for info in opcode_table() {
        let m = info.mnemonic();
        assert!(!m.is_empty(), "opcode {:#x} has empty mnemonic", info.opcode().raw());
        assert!(
            m.bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_'),
            "mnemonic '{}' contains unexpected characters",
            m
        );
    }
}

#[test]
fn mnemonics_are_unique() {
    let mut seen = std::collections::HashSet::new();
    for info in opcode_table() {
        assert!(seen.insert(info.mnemonic()), "duplicate mnemonic '{}'", info.mnemonic());
    }
}

#[test]
fn conditional_implies_jump() {
    for info in opcode_table() {
        if info.flags().contains(OpcodeFlags::CONDITIONAL) {
            assert!(
                info.flags().contains(OpcodeFlags::JUMP),
                "'{}' is CONDITIONAL but not JUMP",
                info.mnemonic()
            );
        }
    }
}

#[test]
fn branches_carry_branch_operands() {
    for info in opcode_table() {
        if info.flags().contains(OpcodeFlags::JUMP) {
            assert!(
                matches!(info.shape(), OperandShape::Branch | OperandShape::BranchWide),
                "'{}' jumps but has operand shape {:?}",
                info.mnemonic(),
                info.shape()
            );
        }
    }
}

#[test]
fn conditional_branch_family_is_complete() {
    let conditionals: Vec<&str> = opcode_table()
        .iter()
        .filter(|i| i.is_conditional_branch())
        .map(|i| i.mnemonic())
        .collect();
    assert_eq!(conditionals.len(), 16, "got {conditionals:?}");
    assert!(conditionals.contains(&"ifnull"));
    assert!(conditionals.contains(&"if_acmpne"));
}

#[test]
fn return_family_and_throw_terminate() {
    for m in ["ireturn", "lreturn", "freturn", "dreturn", "areturn", "return", "athrow", "ret"] {
        let info = opcode_table()
            .iter()
            .find(|i| i.mnemonic() == m)
            .unwrap_or_else(|| panic!("missing '{m}'"));
        assert!(info.is_terminator(), "'{m}' should terminate a block");
        assert!(!info.is_branch(), "'{m}' should not be a branch");
    }
}

#[test]
fn fixed_sizes_match_operand_shapes() {
    assert_eq!(lookup(Opcode::ILOAD_1.raw()).unwrap().fixed_size(), Some(1));
    assert_eq!(lookup(Opcode::BIPUSH.raw()).unwrap().fixed_size(), Some(2));
    assert_eq!(lookup(Opcode::IINC.raw()).unwrap().fixed_size(), Some(3));
    assert_eq!(lookup(Opcode::GOTO.raw()).unwrap().fixed_size(), Some(3));
    assert_eq!(lookup(Opcode::MULTIANEWARRAY.raw()).unwrap().fixed_size(), Some(4));
    assert_eq!(lookup(Opcode::INVOKEINTERFACE.raw()).unwrap().fixed_size(), Some(5));
    assert_eq!(lookup(Opcode::GOTO_W.raw()).unwrap().fixed_size(), Some(5));
    assert_eq!(lookup(Opcode::TABLESWITCH.raw()).unwrap().fixed_size(), None);
    assert_eq!(lookup(Opcode::WIDE.raw()).unwrap().fixed_size(), None);
}

#[test]
fn named_constants_agree_with_table() {
    assert_eq!(Opcode::IFLT.mnemonic(), "iflt");
    assert_eq!(Opcode::INVOKEDYNAMIC.mnemonic(), "invokedynamic");
    assert_eq!(Opcode::JSR_W.mnemonic(), "jsr_w");
    assert!(Opcode::GOTO.flags().contains(OpcodeFlags::JUMP));
    assert!(Opcode::LOOKUPSWITCH.flags().contains(OpcodeFlags::SWITCH));
}
