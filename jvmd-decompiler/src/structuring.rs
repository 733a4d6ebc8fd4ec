//! Region structuring: recovers `if`/`else`, loops, `switch` and
//! `try`/`catch` from the CFG and its exception regions.
//!
//! The walk follows blocks in flow order, simulating each one with the stack
//! inherited from its predecessor. Anything the walk cannot express (a block
//! reached twice, a labeled jump, an unvisited reachable block) abandons
//! structuring and the caller falls back to the flat form.

use std::collections::{BTreeMap, HashMap, HashSet};

use jvmd_ir::cfg::{BasicBlock, BlockId, ControlFlowGraph};
use jvmd_ir::exception::{CatchType, ExceptionRegion};
use jvmd_ir::expr::{BinOp, Expr};
use jvmd_ir::stmt::{CatchClause, Stmt, SwitchCase};

use crate::condition;
use crate::constant_pool::ConstantPool;
use crate::descriptor;
use crate::error::DecompileError;
use crate::expr_recovery::{BlockRecovery, BranchExit, StackSimulator, StackValue};

/// Structure a method body. Returns `None` when the CFG has a shape the
/// walk cannot express.
pub(crate) fn structure_method(
    cfg: &ControlFlowGraph,
    regions: &[ExceptionRegion],
    sim: &StackSimulator<'_>,
    pool: Option<&dyn ConstantPool>,
) -> Option<Vec<Stmt>> {
    if cfg.is_empty() {
        return Some(Vec::new());
    }
    let mut ctx = StructCtx::new(cfg, regions, sim, pool);
    match ctx.run() {
        Ok(stmts) => Some(stmts),
        Err(Unstructured(reason)) => {
            log::debug!("{}: region structuring abandoned: {reason}", sim.method_name());
            None
        }
    }
}

#[derive(Debug)]
struct Unstructured(String);

impl From<DecompileError> for Unstructured {
    fn from(err: DecompileError) -> Self {
        Unstructured(err.to_string())
    }
}

type Step<T> = std::result::Result<T, Unstructured>;

fn bail<T>(reason: impl Into<String>) -> Step<T> {
    Err(Unstructured(reason.into()))
}

#[derive(Debug, Clone)]
struct LoopInfo {
    body: HashSet<BlockId>,
    exit: Option<BlockId>,
    end_pc: u32,
}

/// An enclosing construct that `break`/`continue` can target.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Loop {
        header: BlockId,
        exit: Option<BlockId>,
    },
    Switch {
        exit: Option<BlockId>,
    },
}

impl Frame {
    fn exit(self) -> Option<BlockId> {
        match self {
            Frame::Loop { exit, .. } | Frame::Switch { exit } => exit,
        }
    }

    fn header(self) -> Option<BlockId> {
        match self {
            Frame::Loop { header, .. } => Some(header),
            Frame::Switch { .. } => None,
        }
    }
}

/// Where a range walk must stop: explicit join blocks, and blocks outside
/// any enclosing protected range.
#[derive(Debug, Clone, Default)]
struct Bound {
    stops: Vec<BlockId>,
    ranges: Vec<(u32, u32)>,
}

impl Bound {
    fn stops_at(&self, block: &BasicBlock) -> bool {
        self.stops.contains(&block.id)
            || self
                .ranges
                .iter()
                .any(|&(start, end)| block.start < start || block.start >= end)
    }

    fn with_stop(&self, stop: Option<BlockId>) -> Bound {
        let mut bound = self.clone();
        bound.stops.extend(stop);
        bound
    }

    fn within(&self, start: u32, end: u32) -> Bound {
        let mut bound = self.clone();
        bound.ranges.push((start, end));
        bound
    }

    /// Loop bodies leave through `break` only.
    fn for_loop(&self) -> Bound {
        Bound {
            stops: Vec::new(),
            ranges: self.ranges.clone(),
        }
    }

    /// Case bodies stop at the next case and reach the switch exit through
    /// `break`.
    fn for_case(&self, next_case: Option<BlockId>, exit: Option<BlockId>) -> Bound {
        let mut bound = self.clone();
        bound.stops.retain(|&s| Some(s) != exit);
        bound.stops.extend(next_case);
        bound
    }
}

/// How a walk over a range ended.
struct RangeEnd {
    /// The bound block that stopped the walk, or `None` after an exit.
    next: Option<BlockId>,
    stack: Vec<StackValue>,
}

/// What to do after emitting one construct.
enum Flow {
    Next(BlockId, Vec<StackValue>),
    End(Vec<StackValue>),
}

struct StructCtx<'a> {
    cfg: &'a ControlFlowGraph,
    regions: &'a [ExceptionRegion],
    sim: &'a StackSimulator<'a>,
    pool: Option<&'a dyn ConstantPool>,
    loops: HashMap<BlockId, LoopInfo>,
    visited: Vec<bool>,
    region_done: Vec<bool>,
    frames: Vec<Frame>,
    /// Handler blocks whose leading exception store became the catch binding.
    skip_first: HashSet<BlockId>,
}

impl<'a> StructCtx<'a> {
    fn new(
        cfg: &'a ControlFlowGraph,
        regions: &'a [ExceptionRegion],
        sim: &'a StackSimulator<'a>,
        pool: Option<&'a dyn ConstantPool>,
    ) -> Self {
        Self {
            cfg,
            regions,
            sim,
            pool,
            loops: find_loops(cfg),
            visited: vec![false; cfg.len()],
            region_done: vec![false; regions.len()],
            frames: Vec::new(),
            skip_first: HashSet::new(),
        }
    }

    fn run(&mut self) -> Step<Vec<Stmt>> {
        let mut out = Vec::new();
        self.walk(&mut out, 0, &Bound::default(), Vec::new(), false)?;
        if let Some(id) = self.reachable().into_iter().find(|&id| !self.visited[id]) {
            return bail(format!(
                "block at offset {} left unvisited",
                self.cfg.block(id).start
            ));
        }
        Ok(out)
    }

    fn walk(
        &mut self,
        out: &mut Vec<Stmt>,
        start: BlockId,
        bound: &Bound,
        mut stack: Vec<StackValue>,
        mut entering_loop: bool,
    ) -> Step<RangeEnd> {
        let cfg = self.cfg;
        let mut current = start;
        loop {
            let block = cfg.block(current);
            if !entering_loop {
                if let Some(jump) = self.frame_jump(current)? {
                    out.push(jump);
                    return Ok(RangeEnd { next: None, stack });
                }
            }
            entering_loop = false;
            if bound.stops_at(block) {
                return Ok(RangeEnd {
                    next: Some(current),
                    stack,
                });
            }
            if self.visited[current] {
                return bail(format!("block at offset {} reached twice", block.start));
            }

            let region = self
                .region_starting_at(current)
                .filter(|&r| !self.loop_encloses_region(current, r));
            let flow = if let Some(region) = region {
                self.emit_try(out, region, current, bound, stack)?
            } else if self.loops.contains_key(&current) && !self.in_loop_frame(current) {
                self.emit_loop(out, current, bound, stack)?
            } else {
                self.emit_block(out, current, bound, stack)?
            };
            match flow {
                Flow::Next(next, next_stack) => {
                    current = next;
                    stack = next_stack;
                }
                Flow::End(stack) => return Ok(RangeEnd { next: None, stack }),
            }
        }
    }

    fn emit_block(
        &mut self,
        out: &mut Vec<Stmt>,
        id: BlockId,
        bound: &Bound,
        stack: Vec<StackValue>,
    ) -> Step<Flow> {
        let cfg = self.cfg;
        self.visited[id] = true;
        let rec = self.simulate(id, stack)?;
        out.extend(rec.stmts);
        let block = cfg.block(id);
        match rec.exit {
            Some(BranchExit::Switch(selector)) => {
                self.emit_switch(out, id, selector, bound, rec.stack)
            }
            Some(BranchExit::Conditional(cond)) if block.succs.len() == 2 => {
                self.emit_conditional(out, id, cond.taken, bound, rec.stack)
            }
            _ => match block.succs.as_slice() {
                [] => Ok(Flow::End(rec.stack)),
                [next] => Ok(Flow::Next(*next, rec.stack)),
                _ => bail(format!("unexpected successors at offset {}", block.start)),
            },
        }
    }

    fn emit_conditional(
        &mut self,
        out: &mut Vec<Stmt>,
        id: BlockId,
        cond: Expr,
        bound: &Bound,
        stack: Vec<StackValue>,
    ) -> Step<Flow> {
        let cfg = self.cfg;
        let block = cfg.block(id);
        let (taken, mut fall) = (block.succs[0], block.succs[1]);
        let mut taken_cond = cond;
        while let Some((merged, new_fall)) =
            self.merge_short_circuit(&taken_cond, taken, fall, bound, &stack)?
        {
            taken_cond = merged;
            fall = new_fall;
        }
        let fall_cond = condition::negate(taken_cond.clone());

        match (self.frame_jump(taken)?, self.frame_jump(fall)?) {
            (Some(taken_jump), Some(fall_jump)) => {
                out.push(if_stmt(taken_cond, vec![taken_jump], None));
                out.push(fall_jump);
                return Ok(Flow::End(stack));
            }
            (Some(taken_jump), None) => {
                out.push(if_stmt(taken_cond, vec![taken_jump], None));
                return Ok(Flow::Next(fall, stack));
            }
            (None, Some(fall_jump)) => {
                out.push(if_stmt(fall_cond, vec![fall_jump], None));
                return Ok(Flow::Next(taken, stack));
            }
            (None, None) => {}
        }

        let join = self.earliest_join(fall, taken, bound);
        if join == Some(taken) {
            let mut then_body = Vec::new();
            let end = self.walk(&mut then_body, fall, &bound.with_stop(join), stack.clone(), false)?;
            out.push(if_stmt(fall_cond, then_body, None));
            let stack = if end.next.is_some() { end.stack } else { stack };
            return Ok(Flow::Next(taken, stack));
        }
        if join == Some(fall) {
            let mut then_body = Vec::new();
            let end = self.walk(&mut then_body, taken, &bound.with_stop(join), stack.clone(), false)?;
            out.push(if_stmt(taken_cond, then_body, None));
            let stack = if end.next.is_some() { end.stack } else { stack };
            return Ok(Flow::Next(fall, stack));
        }

        let arm_bound = bound.with_stop(join);
        let mut then_body = Vec::new();
        let then_end = self.walk(&mut then_body, fall, &arm_bound, stack.clone(), false)?;
        let mut else_body = Vec::new();
        let else_end = self.walk(&mut else_body, taken, &arm_bound, stack.clone(), false)?;

        if let Some(j) = join {
            if then_body.is_empty()
                && else_body.is_empty()
                && then_end.next == Some(j)
                && else_end.next == Some(j)
                && then_end.stack.len() == stack.len() + 1
                && else_end.stack.len() == stack.len() + 1
            {
                let mut merged = then_end.stack;
                let (Some(then_value), Some(else_value)) = (merged.pop(), else_end.stack.last())
                else {
                    return bail("ternary arm without a value");
                };
                merged.push(StackValue {
                    expr: Expr::ternary(fall_cond, then_value.expr, else_value.expr.clone()),
                    wide: then_value.wide,
                });
                return Ok(Flow::Next(j, merged));
            }
        }

        if then_body.is_empty() && !else_body.is_empty() {
            out.push(if_stmt(taken_cond, else_body, None));
        } else {
            let else_body = (!else_body.is_empty()).then_some(else_body);
            out.push(if_stmt(fall_cond, then_body, else_body));
        }
        let continuation = [then_end, else_end].into_iter().find(|end| end.next.is_some());
        Ok(match continuation {
            Some(RangeEnd {
                next: Some(next),
                stack,
            }) => Flow::Next(join.unwrap_or(next), stack),
            _ => match join {
                Some(j) => Flow::Next(j, stack),
                None => Flow::End(stack),
            },
        })
    }

    /// Fold the fallthrough block into the condition when it is a bare test
    /// sharing a target with this one (`&&` / `||` chains).
    fn merge_short_circuit(
        &mut self,
        taken_cond: &Expr,
        taken: BlockId,
        fall: BlockId,
        bound: &Bound,
        stack: &[StackValue],
    ) -> Step<Option<(Expr, BlockId)>> {
        let cfg = self.cfg;
        let next = cfg.block(fall);
        if self.visited[fall]
            || next.preds.len() != 1
            || next.succs.len() != 2
            || !next.ends_in_conditional()
            || bound.stops_at(next)
            || self.is_frame_target(fall)
            || self.loops.contains_key(&fall)
            || self.region_starting_at(fall).is_some()
        {
            return Ok(None);
        }
        let rec = self.simulate(fall, stack.to_vec())?;
        let Some(BranchExit::Conditional(next_cond)) = rec.exit else {
            return Ok(None);
        };
        if !rec.stmts.is_empty() || rec.stack.len() != stack.len() {
            return Ok(None);
        }
        let (next_taken, next_fall) = (next.succs[0], next.succs[1]);
        let merged = if next_taken == taken {
            (or(taken_cond.clone(), next_cond.taken), next_fall)
        } else if next_fall == taken {
            (or(taken_cond.clone(), next_cond.fallthrough), next_taken)
        } else {
            return Ok(None);
        };
        self.visited[fall] = true;
        Ok(Some(merged))
    }

    fn emit_loop(
        &mut self,
        out: &mut Vec<Stmt>,
        header: BlockId,
        bound: &Bound,
        stack: Vec<StackValue>,
    ) -> Step<Flow> {
        let Some(info) = self.loops.get(&header).cloned() else {
            return bail("loop header without loop");
        };
        self.frames.push(Frame::Loop {
            header,
            exit: info.exit,
        });
        let stmt = self.emit_loop_body(header, &info, &bound.for_loop(), stack.clone());
        self.frames.pop();
        out.push(stmt?);
        Ok(match info.exit {
            Some(exit) => Flow::Next(exit, stack),
            None => Flow::End(stack),
        })
    }

    fn emit_loop_body(
        &mut self,
        header: BlockId,
        info: &LoopInfo,
        bound: &Bound,
        stack: Vec<StackValue>,
    ) -> Step<Stmt> {
        let mut body = Vec::new();
        if let Some((cond, body_start)) = self.pure_loop_test(header, info, &stack)? {
            self.visited[header] = true;
            self.walk(&mut body, body_start, bound, stack, false)?;
            strip_trailing_continue(&mut body);
            return Ok(Stmt::While { cond, body });
        }
        self.walk(&mut body, header, bound, stack, true)?;
        strip_trailing_continue(&mut body);
        Ok(Stmt::While {
            cond: Expr::BoolConst(true),
            body,
        })
    }

    /// A header that only tests and either enters the body or leaves the loop.
    fn pure_loop_test(
        &mut self,
        header: BlockId,
        info: &LoopInfo,
        stack: &[StackValue],
    ) -> Step<Option<(Expr, BlockId)>> {
        let cfg = self.cfg;
        let block = cfg.block(header);
        if block.succs.len() != 2 || self.region_starting_at(header).is_some() {
            return Ok(None);
        }
        let rec = self.simulate(header, stack.to_vec())?;
        let Some(BranchExit::Conditional(cond)) = rec.exit else {
            return Ok(None);
        };
        if !rec.stmts.is_empty() || rec.stack.len() != stack.len() {
            return Ok(None);
        }
        let (taken, fall) = (block.succs[0], block.succs[1]);
        Ok(
            match (info.body.contains(&taken), info.body.contains(&fall)) {
                (true, false) if info.exit == Some(fall) => Some((cond.taken, taken)),
                (false, true) if info.exit == Some(taken) => Some((cond.fallthrough, fall)),
                _ => None,
            },
        )
    }

    fn emit_switch(
        &mut self,
        out: &mut Vec<Stmt>,
        id: BlockId,
        selector: Expr,
        bound: &Bound,
        stack: Vec<StackValue>,
    ) -> Step<Flow> {
        let cfg = self.cfg;
        let Some(edges) = cfg.block(id).switch_edges.clone() else {
            return bail("multi-way branch without resolved targets");
        };
        let mut targets = edges.targets();
        targets.sort_by_key(|&t| cfg.block(t).start);
        if targets.iter().any(|&t| self.visited[t] || self.is_frame_target(t)) {
            return bail(format!("switch at offset {} jumps out", cfg.block(id).start));
        }

        let exit = self.switch_exit(&edges.cases, edges.default, &targets, bound);
        let bodies: Vec<BlockId> = targets.into_iter().filter(|&t| Some(t) != exit).collect();

        self.frames.push(Frame::Switch { exit });
        let mut emitted = Vec::new();
        for (i, &target) in bodies.iter().enumerate() {
            let mut body = Vec::new();
            let case_bound = bound.for_case(bodies.get(i + 1).copied(), exit);
            if let Err(err) = self.walk(&mut body, target, &case_bound, stack.clone(), false) {
                self.frames.pop();
                return Err(err);
            }
            emitted.push((target, body));
        }
        self.frames.pop();

        let mut cases = Vec::new();
        let mut default = None;
        for (target, body) in emitted {
            if edges.default == Some(target) {
                default = Some(body.clone());
            }
            let keys: Vec<i32> = edges
                .cases
                .iter()
                .filter(|&&(_, t)| t == target)
                .map(|&(key, _)| key)
                .collect();
            if let Some((&last, shared)) = keys.split_last() {
                cases.extend(shared.iter().map(|&value| SwitchCase {
                    value,
                    body: Vec::new(),
                }));
                cases.push(SwitchCase { value: last, body });
            }
        }
        out.push(Stmt::Switch {
            selector,
            cases,
            default,
        });
        Ok(match exit {
            Some(exit) => Flow::Next(exit, stack),
            None => Flow::End(stack),
        })
    }

    /// A default target laid out after every case and entered from a case
    /// body is the exit; otherwise the earliest block after all targets that
    /// two of them reach.
    fn switch_exit(
        &self,
        cases: &[(i32, BlockId)],
        default: Option<BlockId>,
        targets: &[BlockId],
        bound: &Bound,
    ) -> Option<BlockId> {
        let start = |id: BlockId| self.cfg.block(id).start;
        let reaches: Vec<HashSet<BlockId>> = targets
            .iter()
            .map(|&t| self.forward_reach(t, bound))
            .collect();

        if let Some(d) = default {
            let last_case = cases.iter().map(|&(_, t)| start(t)).max();
            let entered_from_case = targets
                .iter()
                .zip(&reaches)
                .any(|(&t, reach)| t != d && reach.contains(&d));
            if last_case.is_none_or(|last| start(d) > last) && (cases.is_empty() || entered_from_case) {
                return Some(d);
            }
        }

        let last_target = targets.iter().map(|&t| start(t)).max()?;
        let mut counts: BTreeMap<BlockId, usize> = BTreeMap::new();
        for reach in &reaches {
            for &b in reach {
                *counts.entry(b).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .filter(|&(b, n)| n >= 2 && start(b) > last_target)
            .map(|(b, _)| b)
            .min_by_key(|&b| start(b))
    }

    fn emit_try(
        &mut self,
        out: &mut Vec<Stmt>,
        region: usize,
        start: BlockId,
        bound: &Bound,
        stack: Vec<StackValue>,
    ) -> Step<Flow> {
        let regions = self.regions;
        self.region_done[region] = true;
        let region = &regions[region];
        let mut try_body = Vec::new();
        let try_bound = bound.within(region.start_pc, region.end_pc);
        let end = self.walk(&mut try_body, start, &try_bound, stack.clone(), false)?;

        let mut continuation = end.next.map(|next| self.through_goto(next, bound));
        let mut catches = Vec::new();
        for handler in &region.handlers {
            if self.visited[handler.block] {
                continue;
            }
            let (binding, entry) = self.catch_binding(handler.block)?;
            let mut body = Vec::new();
            let handler_end =
                self.walk(&mut body, handler.block, &bound.with_stop(continuation), entry, false)?;
            continuation = continuation.or(handler_end.next);
            catches.push(CatchClause {
                exception_type: self.catch_type_name(handler.catch_type),
                binding,
                body,
            });
        }

        if catches.is_empty() {
            out.extend(try_body);
        } else {
            out.push(Stmt::TryCatch {
                try_body,
                catches,
                finally_body: None,
            });
        }
        Ok(match continuation {
            Some(next) => Flow::Next(next, end.stack),
            None => Flow::End(stack),
        })
    }

    /// A lone `goto` after a protected range stands for its target, so the
    /// handlers that fall through and the `try` exit meet at one block.
    fn through_goto(&mut self, id: BlockId, bound: &Bound) -> BlockId {
        let cfg = self.cfg;
        let block = cfg.block(id);
        let ([insn], [target]) = (block.instructions.as_slice(), block.succs.as_slice()) else {
            return id;
        };
        if !matches!(insn.opcode.raw(), 0xa7 | 0xc8)
            || self.visited[id]
            || block.preds.len() != 1
            || bound.stops_at(block)
            || self.is_frame_target(id)
            || self.loops.contains_key(&id)
            || self.region_starting_at(id).is_some()
        {
            return id;
        }
        self.visited[id] = true;
        *target
    }

    /// The handler's leading `astore` names the caught exception; without
    /// one the exception stays on the stack as `e`.
    fn catch_binding(&mut self, handler: BlockId) -> Step<(String, Vec<StackValue>)> {
        let cfg = self.cfg;
        let exception = StackValue::narrow(Expr::var("e"));
        let first = cfg.block(handler).instructions.first();
        if let Some(first) = first.filter(|insn| matches!(insn.opcode.raw(), 0x3a | 0x4b..=0x4e)) {
            let rec = self
                .sim
                .simulate_from(std::slice::from_ref(first), vec![exception.clone()])?;
            if let Some(Stmt::Assign {
                target: Expr::Var(name),
                ..
            }) = rec.stmts.into_iter().next()
            {
                self.skip_first.insert(handler);
                return Ok((name, Vec::new()));
            }
        }
        Ok(("e".to_string(), vec![exception]))
    }

    fn catch_type_name(&self, catch_type: CatchType) -> String {
        match catch_type {
            CatchType::Any => "Throwable".to_string(),
            CatchType::Class(index) => self
                .pool
                .and_then(|pool| pool.class_name(index))
                .map(descriptor::class_operand_name)
                .unwrap_or_else(|| format!("class#{index}")),
        }
    }

    fn simulate(&self, id: BlockId, stack: Vec<StackValue>) -> Step<BlockRecovery> {
        let instructions = &self.cfg.block(id).instructions;
        let instructions = if self.skip_first.contains(&id) {
            instructions.get(1..).unwrap_or_default()
        } else {
            instructions.as_slice()
        };
        Ok(self.sim.simulate_from(instructions, stack)?)
    }

    /// `break` or `continue` for a jump to an enclosing construct's exit or
    /// header. Jumps past the innermost construct would need labels.
    fn frame_jump(&self, id: BlockId) -> Step<Option<Stmt>> {
        if self.frames.last().is_some_and(|f| f.exit() == Some(id)) {
            return Ok(Some(Stmt::Break));
        }
        let innermost_loop = self
            .frames
            .iter()
            .rev()
            .find_map(|f| f.header());
        if innermost_loop == Some(id) {
            return Ok(Some(Stmt::Continue));
        }
        if self.is_frame_target(id) {
            return bail(format!(
                "labeled jump to offset {}",
                self.cfg.block(id).start
            ));
        }
        Ok(None)
    }

    fn is_frame_target(&self, id: BlockId) -> bool {
        self.frames
            .iter()
            .any(|f| f.exit() == Some(id) || f.header() == Some(id))
    }

    fn in_loop_frame(&self, header: BlockId) -> bool {
        self.frames.iter().any(|f| f.header() == Some(header))
    }

    /// Outermost unemitted region starting at this block.
    fn region_starting_at(&self, id: BlockId) -> Option<usize> {
        let start = self.cfg.block(id).start;
        self.regions
            .iter()
            .enumerate()
            .filter(|&(i, r)| !self.region_done[i] && r.start_pc == start)
            .max_by_key(|&(_, r)| r.end_pc)
            .map(|(i, _)| i)
    }

    /// A loop starting at the same block as a region it fully contains is
    /// emitted first, with the `try` inside its body.
    fn loop_encloses_region(&self, header: BlockId, region: usize) -> bool {
        !self.in_loop_frame(header)
            && self
                .loops
                .get(&header)
                .is_some_and(|info| self.regions[region].end_pc <= info.end_pc)
    }

    /// Earliest block reachable from both `a` and `b` without back edges.
    fn earliest_join(&self, a: BlockId, b: BlockId, bound: &Bound) -> Option<BlockId> {
        let from_a = self.forward_reach(a, bound);
        let from_b = self.forward_reach(b, bound);
        from_a
            .intersection(&from_b)
            .copied()
            .min_by_key(|&id| self.cfg.block(id).start)
    }

    /// Unvisited blocks reachable from `from` along forward edges. Bound
    /// blocks are included but not expanded; frame targets are excluded.
    fn forward_reach(&self, from: BlockId, bound: &Bound) -> HashSet<BlockId> {
        let mut seen = HashSet::new();
        let mut work = vec![from];
        while let Some(id) = work.pop() {
            if self.visited[id] || self.is_frame_target(id) || !seen.insert(id) {
                continue;
            }
            if bound.stops_at(self.cfg.block(id)) {
                continue;
            }
            for succ in self.cfg.all_successors(id) {
                if !self.cfg.is_back_edge(id, succ) {
                    work.push(succ);
                }
            }
        }
        seen
    }

    /// Blocks reachable from the entry, including handlers of reachable
    /// protected blocks.
    fn reachable(&self) -> Vec<BlockId> {
        let mut seen = vec![false; self.cfg.len()];
        let mut work = vec![0];
        while let Some(id) = work.pop() {
            if std::mem::replace(&mut seen[id], true) {
                continue;
            }
            work.extend(self.cfg.all_successors(id));
            let start = self.cfg.block(id).start;
            for region in self.regions.iter().filter(|r| r.covers(start)) {
                work.extend(region.handlers.iter().map(|h| h.block));
            }
        }
        (0..seen.len()).filter(|&id| seen[id]).collect()
    }
}

/// Natural loops keyed by header: every back edge `latch -> header`
/// contributes the blocks that reach the latch without passing the header.
fn find_loops(cfg: &ControlFlowGraph) -> HashMap<BlockId, LoopInfo> {
    let mut latches: BTreeMap<BlockId, Vec<BlockId>> = BTreeMap::new();
    for block in cfg.blocks() {
        for succ in cfg.all_successors(block.id) {
            if cfg.is_back_edge(block.id, succ) {
                latches.entry(succ).or_default().push(block.id);
            }
        }
    }

    let mut loops = HashMap::new();
    for (header, mut work) in latches {
        let mut body = HashSet::from([header]);
        while let Some(id) = work.pop() {
            if body.insert(id) {
                work.extend(cfg.block(id).preds.iter().copied());
            }
        }
        let end_pc = body.iter().map(|&id| cfg.block(id).end).max().unwrap_or(0);
        let head = cfg.block(header);
        let test_exit = if head.ends_in_conditional() {
            head.succs.iter().copied().find(|s| !body.contains(s))
        } else {
            None
        };
        let exit = test_exit.or_else(|| {
            body.iter()
                .flat_map(|&id| cfg.all_successors(id))
                .filter(|s| !body.contains(s) && cfg.block(*s).start >= end_pc)
                .min_by_key(|&s| cfg.block(s).start)
        });
        loops.insert(header, LoopInfo { body, exit, end_pc });
    }
    loops
}

fn or(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(BinOp::Or, lhs, rhs)
}

fn if_stmt(cond: Expr, then_body: Vec<Stmt>, else_body: Option<Vec<Stmt>>) -> Stmt {
    Stmt::If {
        cond,
        then_body,
        else_body,
    }
}

fn strip_trailing_continue(body: &mut Vec<Stmt>) {
    if body.last() == Some(&Stmt::Continue) {
        body.pop();
    }
}
