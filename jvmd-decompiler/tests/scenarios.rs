//! End-to-end fixtures: raw code bytes in, rendered statements out.

mod common;

use common::{normalize, render, render_minimal, static_method, with_local};
use jvmd_decompiler::{
    DecompileError, DecompileState, DecompilerOptions, MethodAnalysis, MethodDecompiler,
    decompile_method,
};
use jvmd_ir::expr::{BinOp, Expr};
use jvmd_ir::method::{AccessFlags, ExceptionTableEntry, MethodInput};
use jvmd_ir::stmt::Stmt;

#[test]
fn add_two_locals() {
    // iload_1; iload_2; iadd; ireturn
    let method = static_method("sum", "()I", &[0x1b, 0x1c, 0x60, 0xac]);
    let analysis = MethodAnalysis::of(method.code.as_ref().unwrap());
    assert_eq!(analysis.instructions.len(), 4);
    assert_eq!(analysis.cfg.len(), 1);
    assert!(analysis.cfg.blocks()[0].succs.is_empty());

    let (ast, state) = MethodDecompiler::new().decompile_traced(&method).unwrap();
    assert_eq!(state, DecompileState::Flat);
    assert_eq!(
        ast.body,
        vec![Stmt::Return(Some(Expr::binary(
            BinOp::Add,
            Expr::var("v1"),
            Expr::var("v2"),
        )))]
    );
    assert_eq!(render_minimal(&method), "return (v1 + v2);\n");
}

#[test]
fn absolute_value_becomes_if_else() {
    // iload_0; iflt 6; iload_0; ireturn; iload_0; ineg; ireturn
    let code = [0x1a, 0x9b, 0x00, 0x05, 0x1a, 0xac, 0x1a, 0x74, 0xac];
    let method = with_local(static_method("abs", "(I)I", &code), 0, "x", "I");

    let analysis = MethodAnalysis::of(method.code.as_ref().unwrap());
    let two_way: Vec<_> = analysis
        .cfg
        .blocks()
        .iter()
        .filter(|b| b.succs.len() == 2)
        .collect();
    assert_eq!(two_way.len(), 1, "exactly one conditional block");

    let (_, state) = MethodDecompiler::new().decompile_traced(&method).unwrap();
    assert_eq!(state, DecompileState::Structured);
    assert_eq!(
        normalize(&render_minimal(&method)),
        normalize("if ((x >= 0)) {\n    return x;\n} else {\n    return -x;\n}")
    );
}

#[test]
fn adding_zero_simplifies_away() {
    // iload_0; iconst_0; iadd; ireturn
    let method = static_method("same", "(I)I", &[0x1a, 0x03, 0x60, 0xac]);
    assert_eq!(render_minimal(&method), "return a;\n");

    let options = DecompilerOptions {
        simplify: false,
        ..DecompilerOptions::default()
    };
    let raw = MethodDecompiler::new().with_options(options);
    assert_eq!(render(&raw, &method), "return (a + 0);\n");
}

#[test]
fn truncated_branch_degrades_to_comment() {
    // iload_0; ifeq with only one operand byte
    let method = static_method("cut", "(I)V", &[0x1a, 0x99, 0x00]);
    let ast = decompile_method(&method).expect("undecodable code is not an error");
    assert_eq!(
        ast.body,
        vec![Stmt::Comment("2 undecodable bytes at offset 1".to_string())]
    );
}

#[test]
fn shared_range_keeps_only_resolvable_handler() {
    let mut code = vec![0x00; 10];
    code.extend([0xa7, 0x00, 0x05, 0x4c, 0xb1, 0xb1]);
    let mut method = static_method("guarded", "()V", &code);
    if let Some(body) = method.code.as_mut() {
        body.exception_table = vec![
            ExceptionTableEntry {
                start_pc: 0,
                end_pc: 10,
                handler_pc: 13,
                catch_type: 0,
            },
            ExceptionTableEntry {
                start_pc: 0,
                end_pc: 10,
                handler_pc: 99,
                catch_type: 0,
            },
        ];
    }
    let analysis = MethodAnalysis::of(method.code.as_ref().unwrap());
    assert_eq!(analysis.regions.len(), 1);
    assert_eq!(analysis.regions[0].handlers.len(), 1);
    let handler = analysis.regions[0].handlers[0].block;
    assert_eq!(analysis.cfg.block(handler).start, 13);
}

#[test]
fn method_without_code_is_empty() {
    let method = MethodInput {
        name: "run".to_string(),
        descriptor: "()V".to_string(),
        access: AccessFlags::PUBLIC | AccessFlags::ABSTRACT,
        code: None,
    };
    let (ast, state) = MethodDecompiler::new().decompile_traced(&method).unwrap();
    assert_eq!(state, DecompileState::NoCode);
    assert!(ast.body.is_empty());
    assert_eq!(ast.name, "run");
}

#[test]
fn stack_underflow_names_method_and_offset() {
    // iadd on an empty stack
    let method = static_method("broken", "()I", &[0x60, 0xac]);
    let err = decompile_method(&method).unwrap_err();
    assert_eq!(
        err,
        DecompileError::StackUnderflow {
            method: "broken".to_string(),
            offset: 0,
        }
    );
}
