//! Symbolic execution of instruction runs against an abstract operand stack.

use jvmd_ir::expr::{BinOp, Expr, UnOp};
use jvmd_ir::instruction::{Instruction, Operand};
use jvmd_ir::stmt::Stmt;
use jvmd_isa::Opcode;

use crate::condition::{self, BranchCondition};
use crate::constant_pool::{Constant, ConstantPool, InvokeDynamicRef, MemberRef};
use crate::descriptor::{self, FieldType, MethodDescriptor};
use crate::error::{DecompileError, Result};
use crate::naming::LocalNameProvider;
use crate::options::DecompilerOptions;

/// One operand-stack entry. `wide` marks `long`/`double` values, which count
/// as two words for `pop2` and the `dup2` family.
#[derive(Debug, Clone, PartialEq)]
pub struct StackValue {
    pub expr: Expr,
    pub wide: bool,
}

impl StackValue {
    pub fn narrow(expr: Expr) -> Self {
        Self { expr, wide: false }
    }

    fn words(&self) -> usize {
        if self.wide { 2 } else { 1 }
    }
}

/// Control transfer that consumed stack values at the end of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchExit {
    Conditional(BranchCondition),
    /// Selector of a multi-way branch.
    Switch(Expr),
}

/// Result of simulating a run of instructions.
#[derive(Debug, Clone, Default)]
pub struct BlockRecovery {
    /// Statements for side-effecting instructions, in order.
    pub stmts: Vec<Stmt>,
    /// Operand stack left at the end of the run.
    pub stack: Vec<StackValue>,
    pub exit: Option<BranchExit>,
}

impl BlockRecovery {
    pub fn stack_exprs(&self) -> Vec<Expr> {
        self.stack.iter().map(|v| v.expr.clone()).collect()
    }
}

/// Stack simulator over decoded instructions.
///
/// The minimal variant models only what the instruction stream itself
/// carries and skips constant-pool-referencing opcodes. The pool-aware
/// variant also resolves constants, fields, invocations and types.
pub struct StackSimulator<'a> {
    method: &'a str,
    names: &'a dyn LocalNameProvider,
    pool: Option<&'a dyn ConstantPool>,
    options: DecompilerOptions,
}

#[derive(Default)]
struct ExprState {
    stack: Vec<StackValue>,
    stmts: Vec<Stmt>,
    exit: Option<BranchExit>,
}

impl<'a> StackSimulator<'a> {
    pub fn minimal(method: &'a str, names: &'a dyn LocalNameProvider) -> Self {
        Self {
            method,
            names,
            pool: None,
            options: DecompilerOptions::default(),
        }
    }

    pub fn with_pool(
        method: &'a str,
        names: &'a dyn LocalNameProvider,
        pool: &'a dyn ConstantPool,
        options: DecompilerOptions,
    ) -> Self {
        Self {
            method,
            names,
            pool: Some(pool),
            options,
        }
    }

    pub fn method_name(&self) -> &str {
        self.method
    }

    /// Simulate `instructions` from an empty stack.
    pub fn simulate(&self, instructions: &[Instruction]) -> Result<BlockRecovery> {
        self.simulate_from(instructions, Vec::new())
    }

    /// Simulate `instructions` starting from an inherited stack.
    pub fn simulate_from(
        &self,
        instructions: &[Instruction],
        stack: Vec<StackValue>,
    ) -> Result<BlockRecovery> {
        let mut state = ExprState {
            stack,
            ..ExprState::default()
        };
        for insn in instructions {
            self.step(insn, &mut state)?;
        }
        Ok(BlockRecovery {
            stmts: state.stmts,
            stack: state.stack,
            exit: state.exit,
        })
    }

    /// Stack contents immediately before the first branch in `instructions`
    /// (or at the end, if there is none). Statements are discarded.
    pub fn stack_before_branch(&self, instructions: &[Instruction]) -> Result<Vec<Expr>> {
        let mut state = ExprState::default();
        for insn in instructions {
            if insn.is_branch() {
                break;
            }
            self.step(insn, &mut state)?;
        }
        Ok(state.stack.into_iter().map(|v| v.expr).collect())
    }

    fn underflow(&self, insn: &Instruction) -> DecompileError {
        DecompileError::StackUnderflow {
            method: self.method.to_string(),
            offset: insn.offset,
        }
    }

    fn pop(&self, state: &mut ExprState, insn: &Instruction) -> Result<StackValue> {
        state.stack.pop().ok_or_else(|| self.underflow(insn))
    }

    fn pop_expr(&self, state: &mut ExprState, insn: &Instruction) -> Result<Expr> {
        self.pop(state, insn).map(|v| v.expr)
    }

    /// Pop `n` values, returned in push order.
    fn pop_n(&self, state: &mut ExprState, insn: &Instruction, n: usize) -> Result<Vec<Expr>> {
        let at = state
            .stack
            .len()
            .checked_sub(n)
            .ok_or_else(|| self.underflow(insn))?;
        Ok(state.stack.split_off(at).into_iter().map(|v| v.expr).collect())
    }

    /// Pop whole values until at least `words` stack words are taken.
    fn take_words(
        &self,
        state: &mut ExprState,
        insn: &Instruction,
        words: usize,
    ) -> Result<Vec<StackValue>> {
        let mut taken = Vec::new();
        let mut count = 0;
        while count < words {
            let value = self.pop(state, insn)?;
            count += value.words();
            taken.push(value);
        }
        taken.reverse();
        Ok(taken)
    }

    fn local(&self, slot: u16, pc: u32) -> Expr {
        Expr::Var(self.names.name_for(slot, pc))
    }

    fn step(&self, insn: &Instruction, state: &mut ExprState) -> Result<()> {
        if let Operand::UndecodedTail { bytes, .. } = &insn.operand {
            state.stmts.push(Stmt::Comment(format!(
                "{} undecodable bytes at offset {}",
                bytes.len(),
                insn.offset
            )));
            return Ok(());
        }
        match effect_of(insn.opcode.raw()) {
            Effect::Nop => {}
            Effect::Push(value) => state.stack.push(value),
            Effect::PushImm => {
                if let Operand::Imm(v) = insn.operand {
                    state.stack.push(StackValue::narrow(Expr::IntConst(v)));
                }
            }
            Effect::Load { wide } => {
                if let Operand::Local(slot) = insn.operand {
                    state.stack.push(StackValue {
                        expr: self.local(slot, insn.offset),
                        wide,
                    });
                }
            }
            Effect::Store => {
                let value = self.pop_expr(state, insn)?;
                if let Operand::Local(slot) = insn.operand {
                    state.stmts.push(Stmt::Assign {
                        target: self.local(slot, insn.next_offset()),
                        value,
                    });
                }
            }
            Effect::ArrayLoad { wide } => {
                let index = self.pop_expr(state, insn)?;
                let array = self.pop_expr(state, insn)?;
                state.stack.push(StackValue {
                    expr: Expr::ArrayAccess {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    wide,
                });
            }
            Effect::ArrayStore => {
                let value = self.pop_expr(state, insn)?;
                let index = self.pop_expr(state, insn)?;
                let array = self.pop_expr(state, insn)?;
                state.stmts.push(Stmt::Assign {
                    target: Expr::ArrayAccess {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                    value,
                });
            }
            Effect::Pop { words } => {
                for value in self.take_words(state, insn, words)? {
                    if value.expr.has_side_effects() {
                        state.stmts.push(Stmt::Expr(value.expr));
                    }
                }
            }
            Effect::Dup { words, skip } => {
                let top = self.take_words(state, insn, words)?;
                let below = self.take_words(state, insn, skip)?;
                state.stack.extend(top.iter().cloned());
                state.stack.extend(below);
                state.stack.extend(top);
            }
            Effect::Swap => {
                let a = self.pop(state, insn)?;
                let b = self.pop(state, insn)?;
                state.stack.push(a);
                state.stack.push(b);
            }
            Effect::Binary { op, wide } => {
                let rhs = self.pop_expr(state, insn)?;
                let lhs = self.pop_expr(state, insn)?;
                state.stack.push(StackValue {
                    expr: Expr::binary(op, lhs, rhs),
                    wide,
                });
            }
            Effect::Negate { wide } => {
                let value = self.pop_expr(state, insn)?;
                state.stack.push(StackValue {
                    expr: Expr::unary(UnOp::Neg, value),
                    wide,
                });
            }
            Effect::Iinc => {
                if let Operand::Iinc { index, delta } = insn.operand {
                    let (op, amount) = if delta < 0 {
                        (BinOp::Sub, -i32::from(delta))
                    } else {
                        (BinOp::Add, i32::from(delta))
                    };
                    state.stmts.push(Stmt::Assign {
                        target: self.local(index, insn.offset),
                        value: Expr::binary(op, self.local(index, insn.offset), Expr::IntConst(amount)),
                    });
                }
            }
            Effect::Convert { cast, wide } => {
                let value = self.pop_expr(state, insn)?;
                let expr = match cast {
                    Some(ty) => Expr::Cast {
                        ty: ty.to_string(),
                        expr: Box::new(value),
                    },
                    None => value,
                };
                state.stack.push(StackValue { expr, wide });
            }
            Effect::Compare => {
                let rhs = self.pop_expr(state, insn)?;
                let lhs = self.pop_expr(state, insn)?;
                state
                    .stack
                    .push(StackValue::narrow(Expr::binary(BinOp::Cmp, lhs, rhs)));
            }
            Effect::CondBranch => {
                let n = condition::branch_operand_count(insn.opcode).unwrap_or(1);
                let operands = self.pop_n(state, insn, n)?;
                let cond = condition::build_condition(insn.opcode, &operands)
                    .ok_or_else(|| self.underflow(insn))?;
                state.exit = Some(BranchExit::Conditional(cond));
            }
            Effect::Jump | Effect::Ret => {}
            Effect::Jsr => {
                // The return address is only ever stored and consumed by `ret`.
                let ret_addr = Expr::IntConst(insn.next_offset() as i32);
                state.stack.push(StackValue::narrow(ret_addr));
            }
            Effect::Switch => {
                let selector = self.pop_expr(state, insn)?;
                state.exit = Some(BranchExit::Switch(selector));
            }
            Effect::Return { value: true } => {
                let value = self.pop_expr(state, insn)?;
                state.stmts.push(Stmt::Return(Some(value)));
            }
            Effect::Return { value: false } => state.stmts.push(Stmt::Return(None)),
            Effect::Throw => {
                let value = self.pop_expr(state, insn)?;
                state.stmts.push(Stmt::Throw(value));
            }
            Effect::ArrayLength => {
                let array = self.pop_expr(state, insn)?;
                state
                    .stack
                    .push(StackValue::narrow(Expr::ArrayLength(Box::new(array))));
            }
            Effect::NewArray => {
                let count = self.pop_expr(state, insn)?;
                let elem = match insn.operand {
                    Operand::Imm(code) => descriptor::primitive_array_type(code).unwrap_or("?"),
                    _ => "?",
                };
                state.stack.push(StackValue::narrow(Expr::NewArray {
                    elem: elem.to_string(),
                    dims: vec![count],
                }));
            }
            Effect::Monitor(name) => {
                let monitor = self.pop_expr(state, insn)?;
                state.stmts.push(Stmt::Expr(Expr::Call {
                    receiver: None,
                    owner: String::new(),
                    name: name.to_string(),
                    args: vec![monitor],
                }));
            }
            Effect::Pooled => {
                if let Some(pool) = self.pool {
                    self.step_pooled(insn, state, pool)?;
                }
            }
            Effect::Unsupported => {
                log::debug!("{}: skipping {} at {}", self.method, insn.opcode, insn.offset);
            }
        }
        Ok(())
    }

    fn step_pooled(
        &self,
        insn: &Instruction,
        state: &mut ExprState,
        pool: &dyn ConstantPool,
    ) -> Result<()> {
        let index = match insn.operand {
            Operand::ConstPool(index)
            | Operand::InvokeInterface { index, .. }
            | Operand::MultiANewArray { index, .. } => index,
            _ => return Ok(()),
        };
        let class_name = || {
            pool.class_name(index)
                .map(descriptor::class_operand_name)
                .unwrap_or_else(|| format!("class#{index}"))
        };

        match insn.opcode {
            Opcode::LDC | Opcode::LDC_W | Opcode::LDC2_W => {
                let value = match pool.literal(index) {
                    Some(constant) => constant_value(constant),
                    None => {
                        log::debug!("{}: unresolvable constant #{index}", self.method);
                        StackValue {
                            expr: Expr::Var(format!("const#{index}")),
                            wide: insn.opcode == Opcode::LDC2_W,
                        }
                    }
                };
                state.stack.push(value);
            }
            Opcode::GETSTATIC
            | Opcode::PUTSTATIC
            | Opcode::GETFIELD
            | Opcode::PUTFIELD => {
                let member = resolve_member(pool, index, "field");
                let wide = FieldType::parse(&member.descriptor).is_ok_and(|t| t.slots() == 2);
                match insn.opcode {
                    Opcode::GETSTATIC => {
                        let field = static_field(&member);
                        state.stack.push(StackValue { expr: field, wide });
                    }
                    Opcode::PUTSTATIC => {
                        let value = self.pop_expr(state, insn)?;
                        state.stmts.push(Stmt::Assign {
                            target: static_field(&member),
                            value,
                        });
                    }
                    Opcode::GETFIELD => {
                        let object = self.pop_expr(state, insn)?;
                        state.stack.push(StackValue {
                            expr: Expr::FieldAccess {
                                object: Box::new(object),
                                name: member.name,
                            },
                            wide,
                        });
                    }
                    _ => {
                        let value = self.pop_expr(state, insn)?;
                        let object = self.pop_expr(state, insn)?;
                        state.stmts.push(Stmt::Assign {
                            target: Expr::FieldAccess {
                                object: Box::new(object),
                                name: member.name,
                            },
                            value,
                        });
                    }
                }
            }
            Opcode::INVOKEVIRTUAL
            | Opcode::INVOKESPECIAL
            | Opcode::INVOKESTATIC
            | Opcode::INVOKEINTERFACE => {
                let member = resolve_member(pool, index, "method");
                self.invoke(insn, state, member)?;
            }
            Opcode::INVOKEDYNAMIC => match pool.invoke_dynamic(index) {
                Some(site) => self.invoke_dynamic(insn, state, site)?,
                None => {
                    log::debug!("{}: unresolvable call site #{index}", self.method);
                }
            },
            Opcode::NEW => {
                state
                    .stack
                    .push(StackValue::narrow(Expr::UninitNew(class_name())));
            }
            Opcode::ANEWARRAY => {
                let count = self.pop_expr(state, insn)?;
                state.stack.push(StackValue::narrow(Expr::NewArray {
                    elem: class_name(),
                    dims: vec![count],
                }));
            }
            Opcode::MULTIANEWARRAY => {
                let dimensions = match insn.operand {
                    Operand::MultiANewArray { dimensions, .. } => usize::from(dimensions),
                    _ => 1,
                };
                let dims = self.pop_n(state, insn, dimensions)?;
                let elem = pool
                    .class_name(index)
                    .and_then(|name| FieldType::parse(name).ok())
                    .map(|ty| strip_array_levels(ty, dims.len()).java_name())
                    .unwrap_or_else(class_name);
                state
                    .stack
                    .push(StackValue::narrow(Expr::NewArray { elem, dims }));
            }
            Opcode::CHECKCAST => {
                let value = self.pop(state, insn)?;
                state.stack.push(StackValue {
                    expr: Expr::Cast {
                        ty: class_name(),
                        expr: Box::new(value.expr),
                    },
                    wide: value.wide,
                });
            }
            Opcode::INSTANCEOF => {
                let value = self.pop_expr(state, insn)?;
                state.stack.push(StackValue::narrow(Expr::InstanceOf {
                    expr: Box::new(value),
                    ty: class_name(),
                }));
            }
            _ => {}
        }
        Ok(())
    }

    fn invoke(&self, insn: &Instruction, state: &mut ExprState, member: MemberRef) -> Result<()> {
        let desc = self.call_descriptor(&member.descriptor);
        let args = self.pop_n(state, insn, desc.params.len())?;
        let owner = descriptor::simple_class_name(&member.owner).to_string();
        let is_static = insn.opcode == Opcode::INVOKESTATIC;

        if is_static && desc.is_void() {
            let intrinsic = self.options.hide_kotlin_intrinsics
                && member.owner == "kotlin/jvm/internal/Intrinsics";
            let synthetic = self.options.hide_synthetic_dollar_calls && member.name.starts_with('$');
            if intrinsic || synthetic {
                return Ok(());
            }
        }

        let receiver = if is_static {
            None
        } else {
            Some(self.pop_expr(state, insn)?)
        };

        if member.name == "<init>" {
            if let Some(Expr::UninitNew(ty)) = &receiver {
                let created = Expr::New {
                    ty: ty.clone(),
                    args,
                };
                // `new; dup; <init>` leaves the duplicate on the stack.
                match state.stack.last_mut() {
                    Some(top) if top.expr == Expr::UninitNew(ty.clone()) => top.expr = created,
                    _ => state.stmts.push(Stmt::Expr(created)),
                }
                return Ok(());
            }
        }

        let call = Expr::Call {
            receiver: receiver.map(Box::new),
            owner,
            name: member.name,
            args,
        };
        match &desc.ret {
            None => state.stmts.push(Stmt::Expr(call)),
            Some(ret) => state.stack.push(StackValue {
                expr: call,
                wide: ret.slots() == 2,
            }),
        }
        Ok(())
    }

    fn invoke_dynamic(
        &self,
        insn: &Instruction,
        state: &mut ExprState,
        site: InvokeDynamicRef,
    ) -> Result<()> {
        let desc = self.call_descriptor(&site.descriptor);
        let args = self.pop_n(state, insn, desc.params.len())?;
        let bootstrap = site.bootstrap.as_ref().map(|b| b.name.as_str());
        let expr = match bootstrap {
            Some("makeConcatWithConstants") => {
                let recipe = match site.static_args.first() {
                    Some(Constant::String(recipe)) => recipe.clone(),
                    _ => "\u{1}".repeat(args.len()),
                };
                let constants = site.static_args.iter().skip(1).cloned().collect();
                concat_from_recipe(&recipe, args, constants)
            }
            Some("makeConcat") => join_concat(args),
            _ => Expr::Call {
                receiver: None,
                owner: String::new(),
                name: site.name,
                args,
            },
        };
        match &desc.ret {
            None => state.stmts.push(Stmt::Expr(expr)),
            Some(ret) => state.stack.push(StackValue {
                expr,
                wide: ret.slots() == 2,
            }),
        }
        Ok(())
    }

    fn call_descriptor(&self, raw: &str) -> MethodDescriptor {
        MethodDescriptor::parse(raw).unwrap_or_else(|err| {
            log::warn!("{}: {err}; treating call as taking no arguments", self.method);
            MethodDescriptor {
                params: Vec::new(),
                ret: None,
            }
        })
    }
}

fn resolve_member(pool: &dyn ConstantPool, index: u16, kind: &str) -> MemberRef {
    pool.member_ref(index).unwrap_or_else(|| MemberRef {
        owner: String::new(),
        name: format!("{kind}#{index}"),
        descriptor: String::new(),
    })
}

fn static_field(member: &MemberRef) -> Expr {
    Expr::FieldAccess {
        object: Box::new(Expr::Var(
            descriptor::simple_class_name(&member.owner).to_string(),
        )),
        name: member.name.clone(),
    }
}

fn constant_value(constant: Constant) -> StackValue {
    match constant {
        Constant::Int(v) => StackValue::narrow(Expr::IntConst(v)),
        Constant::Float(v) => StackValue::narrow(Expr::FloatConst(v)),
        Constant::Long(v) => StackValue {
            expr: Expr::LongConst(v),
            wide: true,
        },
        Constant::Double(v) => StackValue {
            expr: Expr::DoubleConst(v),
            wide: true,
        },
        Constant::String(s) => StackValue::narrow(Expr::StringLit(s)),
        Constant::Class(name) => {
            StackValue::narrow(Expr::ClassLit(descriptor::class_operand_name(&name)))
        }
    }
}

fn strip_array_levels(mut ty: FieldType, levels: usize) -> FieldType {
    for _ in 0..levels {
        match ty {
            FieldType::Array(elem) => ty = *elem,
            other => return other,
        }
    }
    ty
}

/// Expand a `makeConcatWithConstants` recipe: `\u{1}` takes the next
/// argument, `\u{2}` the next bootstrap constant.
fn concat_from_recipe(recipe: &str, args: Vec<Expr>, constants: Vec<Constant>) -> Expr {
    let mut args = args.into_iter();
    let mut constants = constants.into_iter();
    let mut parts = Vec::new();
    let mut text = String::new();
    for c in recipe.chars() {
        let part = match c {
            '\u{1}' => args.next(),
            '\u{2}' => constants.next().map(|k| constant_value(k).expr),
            _ => {
                text.push(c);
                continue;
            }
        };
        if !text.is_empty() {
            parts.push(Expr::StringLit(std::mem::take(&mut text)));
        }
        parts.extend(part);
    }
    if !text.is_empty() {
        parts.push(Expr::StringLit(text));
    }
    join_concat(parts)
}

/// Left-fold `parts` with `+`, forcing string context when neither of the
/// first two parts is a string literal.
fn join_concat(mut parts: Vec<Expr>) -> Expr {
    let stringy = |e: &Expr| matches!(e, Expr::StringLit(_));
    if parts.len() < 2 || !(stringy(&parts[0]) || stringy(&parts[1])) {
        parts.insert(0, Expr::StringLit(String::new()));
    }
    let mut iter = parts.into_iter();
    let first = iter.next().unwrap_or(Expr::StringLit(String::new()));
    iter.fold(first, |acc, part| Expr::binary(BinOp::Add, acc, part))
}

/// Stack effect class of an opcode.
enum Effect {
    Nop,
    Push(StackValue),
    PushImm,
    Load { wide: bool },
    Store,
    ArrayLoad { wide: bool },
    ArrayStore,
    Pop { words: usize },
    /// Duplicate the top `words` words beneath the next `skip` words.
    Dup { words: usize, skip: usize },
    Swap,
    Binary { op: BinOp, wide: bool },
    Negate { wide: bool },
    Iinc,
    Convert { cast: Option<&'static str>, wide: bool },
    Compare,
    CondBranch,
    Jump,
    Jsr,
    Ret,
    Switch,
    Return { value: bool },
    Throw,
    ArrayLength,
    NewArray,
    Monitor(&'static str),
    /// Needs the constant pool; skipped by the minimal simulator.
    Pooled,
    Unsupported,
}

fn effect_of(raw: u8) -> Effect {
    const ARITH: [BinOp; 5] = [BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div, BinOp::Rem];
    const SHIFT: [BinOp; 3] = [BinOp::Shl, BinOp::Shr, BinOp::UShr];
    const LOGIC: [BinOp; 3] = [BinOp::BitAnd, BinOp::BitOr, BinOp::BitXor];
    let wide = |e: Expr| Effect::Push(StackValue { expr: e, wide: true });
    let narrow = |e: Expr| Effect::Push(StackValue::narrow(e));

    match raw {
        0x00 => Effect::Nop,
        0x01 => narrow(Expr::Null),
        0x02..=0x08 => narrow(Expr::IntConst(i32::from(raw) - 3)),
        0x09..=0x0a => wide(Expr::LongConst(i64::from(raw) - 0x09)),
        0x0b..=0x0d => narrow(Expr::FloatConst(f32::from(raw - 0x0b))),
        0x0e..=0x0f => wide(Expr::DoubleConst(f64::from(raw - 0x0e))),
        0x10 | 0x11 => Effect::PushImm,
        0x12..=0x14 => Effect::Pooled,
        // lload, dload and their _n forms
        0x16 | 0x18 | 0x1e..=0x21 | 0x26..=0x29 => Effect::Load { wide: true },
        0x15..=0x2d => Effect::Load { wide: false },
        0x2f | 0x31 => Effect::ArrayLoad { wide: true },
        0x2e..=0x35 => Effect::ArrayLoad { wide: false },
        0x36..=0x4e => Effect::Store,
        0x4f..=0x56 => Effect::ArrayStore,
        0x57 => Effect::Pop { words: 1 },
        0x58 => Effect::Pop { words: 2 },
        0x59 => Effect::Dup { words: 1, skip: 0 },
        0x5a => Effect::Dup { words: 1, skip: 1 },
        0x5b => Effect::Dup { words: 1, skip: 2 },
        0x5c => Effect::Dup { words: 2, skip: 0 },
        0x5d => Effect::Dup { words: 2, skip: 1 },
        0x5e => Effect::Dup { words: 2, skip: 2 },
        0x5f => Effect::Swap,
        // [i, l, f, d] x [add, sub, mul, div, rem]
        0x60..=0x73 => Effect::Binary {
            op: ARITH[usize::from(raw - 0x60) / 4],
            wide: (raw - 0x60) % 2 == 1,
        },
        0x74..=0x77 => Effect::Negate {
            wide: (raw - 0x74) % 2 == 1,
        },
        0x78..=0x7d => Effect::Binary {
            op: SHIFT[usize::from(raw - 0x78) / 2],
            wide: (raw - 0x78) % 2 == 1,
        },
        0x7e..=0x83 => Effect::Binary {
            op: LOGIC[usize::from(raw - 0x7e) / 2],
            wide: (raw - 0x7e) % 2 == 1,
        },
        0x84 => Effect::Iinc,
        0x85 => Effect::Convert { cast: None, wide: true },          // i2l
        0x86 => Effect::Convert { cast: None, wide: false },         // i2f
        0x87 => Effect::Convert { cast: None, wide: true },          // i2d
        0x88 => Effect::Convert { cast: Some("int"), wide: false },  // l2i
        0x89 => Effect::Convert { cast: None, wide: false },         // l2f
        0x8a => Effect::Convert { cast: None, wide: true },          // l2d
        0x8b => Effect::Convert { cast: Some("int"), wide: false },  // f2i
        0x8c => Effect::Convert { cast: Some("long"), wide: true },  // f2l
        0x8d => Effect::Convert { cast: None, wide: true },          // f2d
        0x8e => Effect::Convert { cast: Some("int"), wide: false },  // d2i
        0x8f => Effect::Convert { cast: Some("long"), wide: true },  // d2l
        0x90 => Effect::Convert { cast: Some("float"), wide: false }, // d2f
        0x91 => Effect::Convert { cast: Some("byte"), wide: false },
        0x92 => Effect::Convert { cast: Some("char"), wide: false },
        0x93 => Effect::Convert { cast: Some("short"), wide: false },
        0x94..=0x98 => Effect::Compare,
        0x99..=0xa6 | 0xc6 | 0xc7 => Effect::CondBranch,
        0xa7 | 0xc8 => Effect::Jump,
        0xa8 | 0xc9 => Effect::Jsr,
        0xa9 => Effect::Ret,
        0xaa | 0xab => Effect::Switch,
        0xac..=0xb0 => Effect::Return { value: true },
        0xb1 => Effect::Return { value: false },
        0xb2..=0xbb | 0xbd | 0xc0 | 0xc1 | 0xc5 => Effect::Pooled,
        0xbc => Effect::NewArray,
        0xbe => Effect::ArrayLength,
        0xbf => Effect::Throw,
        0xc2 => Effect::Monitor("monitorenter"),
        0xc3 => Effect::Monitor("monitorexit"),
        _ => Effect::Unsupported,
    }
}
