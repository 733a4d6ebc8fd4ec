#![allow(dead_code)]

use jvmd_decompiler::MethodDecompiler;
use jvmd_decompiler::java_emitter::emit_java;
use jvmd_ir::method::{AccessFlags, CodeAttribute, ExceptionTableEntry, LocalVariableEntry, MethodInput};

/// A static method with `code` and nothing else.
pub fn static_method(name: &str, descriptor: &str, code: &[u8]) -> MethodInput {
    MethodInput {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        access: AccessFlags::PUBLIC | AccessFlags::STATIC,
        code: Some(CodeAttribute {
            max_stack: 4,
            max_locals: 4,
            code: code.to_vec(),
            ..CodeAttribute::default()
        }),
    }
}

pub fn instance_method(name: &str, descriptor: &str, code: &[u8]) -> MethodInput {
    let mut method = static_method(name, descriptor, code);
    method.access = AccessFlags::PUBLIC;
    method
}

pub fn with_handler(mut method: MethodInput, row: ExceptionTableEntry) -> MethodInput {
    if let Some(code) = method.code.as_mut() {
        code.exception_table.push(row);
    }
    method
}

pub fn with_local(mut method: MethodInput, index: u16, name: &str, descriptor: &str) -> MethodInput {
    if let Some(code) = method.code.as_mut() {
        let length = code.code.len() as u16;
        code.local_variables.push(LocalVariableEntry {
            start_pc: 0,
            length,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            index,
        });
    }
    method
}

/// Decompile and render the body.
pub fn render(decompiler: &MethodDecompiler<'_>, method: &MethodInput) -> String {
    let ast = decompiler
        .decompile(method)
        .unwrap_or_else(|err| panic!("{} failed to decompile: {err}", method.name));
    emit_java(&ast.body)
}

pub fn render_minimal(method: &MethodInput) -> String {
    render(&MethodDecompiler::new(), method)
}

/// Collapse every whitespace run to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deterministic pseudo-random source for sampled property tests.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    pub fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n
    }
}
