//! Per-method orchestration: decode, build the CFG, simulate, structure.

use std::collections::HashSet;

use jvmd_ir::cfg::ControlFlowGraph;
use jvmd_ir::exception::ExceptionRegion;
use jvmd_ir::expr::Expr;
use jvmd_ir::instruction::Instruction;
use jvmd_ir::method::{CodeAttribute, MethodInput};
use jvmd_ir::stmt::{MethodAst, Stmt};

use crate::condition::{self, BranchCondition};
use crate::constant_pool::ConstantPool;
use crate::decode::decode_method;
use crate::descriptor::{FieldType, MethodDescriptor};
use crate::error::Result;
use crate::expr_recovery::{StackSimulator, StackValue};
use crate::naming::names_for_method;
use crate::options::DecompilerOptions;
use crate::passes::run_post_passes;
use crate::simplify::simplify_stmts;
use crate::structuring::structure_method;

/// Phases a method passes through. The last one reached is reported with
/// the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompileState {
    /// No code attribute: the body is empty.
    NoCode,
    Decoded,
    ConditionFound,
    NoCondition,
    Structured,
    /// The body is the linear simulation of every instruction.
    Flat,
}

/// Everything derived from a method's code before simulation.
#[derive(Debug, Clone)]
pub struct MethodAnalysis {
    pub instructions: Vec<Instruction>,
    pub cfg: ControlFlowGraph,
    pub regions: Vec<ExceptionRegion>,
}

impl MethodAnalysis {
    /// Decode `code` and build its CFG and exception regions. Handler
    /// entries and protected-range boundaries start blocks of their own.
    pub fn of(code: &CodeAttribute) -> Self {
        let instructions = decode_method(&code.code);
        let extra_leaders: Vec<u32> = code
            .exception_table
            .iter()
            .flat_map(|row| [row.handler_pc, row.start_pc, row.end_pc])
            .map(u32::from)
            .collect();
        let cfg = ControlFlowGraph::build_with_handlers(&instructions, &extra_leaders);
        let regions = ExceptionRegion::build(&code.exception_table, &cfg);
        Self {
            instructions,
            cfg,
            regions,
        }
    }
}

/// Decompiles methods one at a time. Holds only read-only inputs, so one
/// instance can serve every method of a class.
pub struct MethodDecompiler<'a> {
    pool: Option<&'a dyn ConstantPool>,
    options: DecompilerOptions,
}

impl Default for MethodDecompiler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> MethodDecompiler<'a> {
    /// Decompiler without a constant pool: pool-referencing instructions
    /// are skipped.
    pub fn new() -> Self {
        Self {
            pool: None,
            options: DecompilerOptions::default(),
        }
    }

    pub fn with_pool(pool: &'a dyn ConstantPool, options: DecompilerOptions) -> Self {
        Self {
            pool: Some(pool),
            options,
        }
    }

    pub fn with_options(mut self, options: DecompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DecompilerOptions {
        &self.options
    }

    pub fn decompile(&self, method: &MethodInput) -> Result<MethodAst> {
        self.decompile_traced(method).map(|(ast, _)| ast)
    }

    /// Like [`decompile`](Self::decompile), also returning the final state.
    pub fn decompile_traced(&self, method: &MethodInput) -> Result<(MethodAst, DecompileState)> {
        let ast = |body| MethodAst {
            name: method.name.clone(),
            descriptor: method.descriptor.clone(),
            body,
        };
        let Some(code) = &method.code else {
            log::debug!("{}: {:?}", method.name, DecompileState::NoCode);
            return Ok((ast(Vec::new()), DecompileState::NoCode));
        };

        let analysis = MethodAnalysis::of(code);
        log::debug!(
            "{}: {:?} ({} instructions, {} blocks)",
            method.name,
            DecompileState::Decoded,
            analysis.instructions.len(),
            analysis.cfg.len()
        );

        let names = names_for_method(method);
        let sim = match self.pool {
            Some(pool) => StackSimulator::with_pool(&method.name, &names, pool, self.options),
            None => StackSimulator::minimal(&method.name, &names),
        };
        let flat = flat_statements(&sim, &analysis)?;
        let condition = first_condition(&sim, &analysis.cfg);
        let state = if condition.is_some() {
            DecompileState::ConditionFound
        } else {
            DecompileState::NoCondition
        };
        log::debug!("{}: {state:?}", method.name);

        let narrow = condition
            .as_ref()
            .and_then(|cond| match_two_returns(&flat, cond.fallthrough.clone()));
        // The two-returns shape is exact when the returns are all there is
        // and one forward branch chooses between them.
        let narrow_is_whole =
            narrow.is_some() && flat.len() == 2 && has_single_forward_branch(&analysis.cfg);
        let needs_regions = analysis.cfg.len() > 1 || !analysis.regions.is_empty();

        let (body, state) = match narrow {
            Some(body) if narrow_is_whole || !self.options.structure_regions => {
                (body, DecompileState::Structured)
            }
            _ if self.options.structure_regions && needs_regions => {
                match structure_method(&analysis.cfg, &analysis.regions, &sim, self.pool) {
                    Some(body) => (
                        run_post_passes(body, returns_boolean(&method.descriptor)),
                        DecompileState::Structured,
                    ),
                    None => {
                        log::warn!("{}: falling back to flat statements", method.name);
                        let mut body = vec![Stmt::Comment(format!(
                            "could not structure {}; statements shown in code order",
                            method.name
                        ))];
                        body.extend(flat);
                        (body, DecompileState::Flat)
                    }
                }
            }
            _ => (flat, DecompileState::Flat),
        };
        log::debug!("{}: {state:?}", method.name);

        let body = if self.options.simplify {
            simplify_stmts(body)
        } else {
            body
        };
        Ok((ast(body), state))
    }
}

/// Linear simulation of every block in code order. Handler entries start
/// with the caught exception on the stack.
fn flat_statements(sim: &StackSimulator<'_>, analysis: &MethodAnalysis) -> Result<Vec<Stmt>> {
    let handler_blocks: HashSet<_> = analysis
        .regions
        .iter()
        .flat_map(|r| r.handlers.iter().map(|h| h.block))
        .collect();
    let mut stmts = Vec::new();
    let mut stack = Vec::new();
    for block in analysis.cfg.blocks() {
        if handler_blocks.contains(&block.id) {
            stack.push(StackValue::narrow(Expr::var("e")));
        }
        let rec = sim.simulate_from(&block.instructions, stack)?;
        stmts.extend(rec.stmts);
        stack = rec.stack;
    }
    Ok(stmts)
}

/// Condition of the first block (in construction order) ending in a
/// conditional branch, from that block's own stack effects.
fn first_condition(
    sim: &StackSimulator<'_>,
    cfg: &ControlFlowGraph,
) -> Option<BranchCondition> {
    let block = cfg.blocks().iter().find(|b| b.ends_in_conditional())?;
    let branch = block.last_instruction()?;
    // Operands pushed by an earlier block leave nothing to recover here.
    let stack = match sim.stack_before_branch(&block.instructions) {
        Ok(stack) => stack,
        Err(err) => {
            log::debug!("{}: no standalone condition: {err}", sim.method_name());
            return None;
        }
    };
    condition::build_condition(branch.opcode, &stack)
}

/// Wrap the first two value returns of `flat` in `if (cond) ... else ...`,
/// dropping everything else.
pub fn match_two_returns(flat: &[Stmt], cond: Expr) -> Option<Vec<Stmt>> {
    let mut returns = flat
        .iter()
        .filter(|s| matches!(s, Stmt::Return(Some(_))))
        .cloned();
    let then_stmt = returns.next()?;
    let else_stmt = returns.next()?;
    Some(vec![Stmt::If {
        cond,
        then_body: vec![then_stmt],
        else_body: Some(vec![else_stmt]),
    }])
}

fn has_single_forward_branch(cfg: &ControlFlowGraph) -> bool {
    let branching = cfg
        .blocks()
        .iter()
        .filter(|b| b.ends_in_conditional() || b.switch_edges.is_some())
        .count();
    let loops = cfg
        .blocks()
        .iter()
        .any(|b| cfg.all_successors(b.id).into_iter().any(|s| cfg.is_back_edge(b.id, s)));
    branching == 1 && !loops
}

fn returns_boolean(descriptor: &str) -> bool {
    MethodDescriptor::parse(descriptor).is_ok_and(|d| d.ret == Some(FieldType::Boolean))
}
