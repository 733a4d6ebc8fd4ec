//! Rewrites over structured statement trees.

use jvmd_ir::expr::{BinOp, Expr};
use jvmd_ir::stmt::{CatchClause, Stmt, SwitchCase};

use crate::condition;

/// Run every pass, innermost bodies first.
pub(crate) fn run_post_passes(body: Vec<Stmt>, returns_boolean: bool) -> Vec<Stmt> {
    let mut body = rewrite(body, &mut |list| {
        let list = recover_synchronized(list);
        let list = recover_for_each(list);
        let list = recover_for(list);
        let list = if returns_boolean { fold_boolean_returns(list) } else { list };
        fold_ternary_assigns(list)
    });
    if body.last() == Some(&Stmt::Return(None)) {
        body.pop();
    }
    body
}

/// Apply `f` to every statement list in the tree, children before parents.
fn rewrite(list: Vec<Stmt>, f: &mut impl FnMut(Vec<Stmt>) -> Vec<Stmt>) -> Vec<Stmt> {
    let list = list.into_iter().map(|stmt| rewrite_children(stmt, f)).collect();
    f(list)
}

fn rewrite_children(stmt: Stmt, f: &mut impl FnMut(Vec<Stmt>) -> Vec<Stmt>) -> Stmt {
    match stmt {
        Stmt::Block(body) => Stmt::Block(rewrite(body, f)),
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => Stmt::If {
            cond,
            then_body: rewrite(then_body, f),
            else_body: else_body.map(|b| rewrite(b, f)),
        },
        Stmt::While { cond, body } => Stmt::While {
            cond,
            body: rewrite(body, f),
        },
        Stmt::For {
            init,
            cond,
            update,
            body,
        } => Stmt::For {
            init,
            cond,
            update,
            body: rewrite(body, f),
        },
        Stmt::ForEach {
            elem_type,
            elem_name,
            iterable,
            body,
        } => Stmt::ForEach {
            elem_type,
            elem_name,
            iterable,
            body: rewrite(body, f),
        },
        Stmt::Switch {
            selector,
            cases,
            default,
        } => Stmt::Switch {
            selector,
            cases: cases
                .into_iter()
                .map(|c| SwitchCase {
                    value: c.value,
                    body: rewrite(c.body, f),
                })
                .collect(),
            default: default.map(|b| rewrite(b, f)),
        },
        Stmt::TryCatch {
            try_body,
            catches,
            finally_body,
        } => Stmt::TryCatch {
            try_body: rewrite(try_body, f),
            catches: catches
                .into_iter()
                .map(|c| CatchClause {
                    body: rewrite(c.body, f),
                    ..c
                })
                .collect(),
            finally_body: finally_body.map(|b| rewrite(b, f)),
        },
        Stmt::Synchronized { monitor, body } => Stmt::Synchronized {
            monitor,
            body: rewrite(body, f),
        },
        other => other,
    }
}

fn monitor_call(stmt: &Stmt, which: &str) -> Option<Expr> {
    match stmt {
        Stmt::Expr(Expr::Call {
            receiver: None,
            owner,
            name,
            args,
        }) if owner.is_empty() && name == which && args.len() == 1 => args.first().cloned(),
        _ => None,
    }
}

fn strip_monitor_exits(body: Vec<Stmt>) -> Vec<Stmt> {
    rewrite(body, &mut |list| {
        list.into_iter()
            .filter(|s| monitor_call(s, "monitorexit").is_none())
            .collect()
    })
}

/// `monitorenter(m); try { body } catch (any) { ...; throw }` or a plain
/// `monitorenter(m); body; monitorexit(m)` run becomes `synchronized (m)`.
fn recover_synchronized(list: Vec<Stmt>) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::with_capacity(list.len());
    let mut iter = list.into_iter().peekable();
    while let Some(stmt) = iter.next() {
        let Some(monitor) = monitor_call(&stmt, "monitorenter") else {
            out.push(stmt);
            continue;
        };
        // `dup; astore tmp` keeps a copy of the monitor for the exits.
        if let Some(Stmt::Assign { value, .. }) = out.last() {
            if *value == monitor {
                out.pop();
            }
        }
        match iter.peek() {
            Some(Stmt::TryCatch { catches, .. })
                if catches.len() == 1
                    && catches[0].exception_type == "Throwable"
                    && catches[0].body.last().is_some_and(|s| matches!(s, Stmt::Throw(_))) =>
            {
                if let Some(Stmt::TryCatch { try_body, .. }) = iter.next() {
                    out.push(Stmt::Synchronized {
                        monitor,
                        body: strip_monitor_exits(try_body),
                    });
                }
            }
            _ => {
                let mut body = Vec::new();
                let mut closed = false;
                for next in iter.by_ref() {
                    if monitor_call(&next, "monitorexit").is_some() {
                        closed = true;
                        break;
                    }
                    body.push(next);
                }
                if closed {
                    out.push(Stmt::Synchronized { monitor, body });
                } else {
                    out.push(stmt);
                    out.extend(body);
                }
            }
        }
    }
    out
}

fn is_call_on(expr: &Expr, var: &str, method: &str) -> bool {
    matches!(
        expr,
        Expr::Call { receiver: Some(r), name, args, .. }
            if name == method && args.is_empty() && **r == Expr::Var(var.to_string())
    )
}

/// `it = xs.iterator(); while (it.hasNext()) { x = (T) it.next(); ... }`
/// becomes `for (T x : xs) { ... }`.
fn recover_for_each(list: Vec<Stmt>) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::with_capacity(list.len());
    for stmt in list {
        let Stmt::While { cond, mut body } = stmt else {
            out.push(stmt);
            continue;
        };
        let iterator_var = match out.last() {
            Some(Stmt::Assign {
                target: Expr::Var(it),
                value: Expr::Call { receiver: Some(_), name, args, .. },
            }) if name == "iterator" && args.is_empty() => it.clone(),
            _ => {
                out.push(Stmt::While { cond, body });
                continue;
            }
        };
        let tests_has_next = match &cond {
            Expr::Binary {
                op: BinOp::NotEq,
                lhs,
                rhs,
            } => **rhs == Expr::IntConst(0) && is_call_on(lhs, &iterator_var, "hasNext"),
            other => is_call_on(other, &iterator_var, "hasNext"),
        };
        let element = match body.first() {
            Some(Stmt::Assign {
                target: Expr::Var(name),
                value,
            }) if tests_has_next => match value {
                Expr::Cast { ty, expr } if is_call_on(expr, &iterator_var, "next") => {
                    Some((ty.clone(), name.clone()))
                }
                v if is_call_on(v, &iterator_var, "next") => Some(("Object".to_string(), name.clone())),
                _ => None,
            },
            _ => None,
        };
        let Some((elem_type, elem_name)) = element else {
            out.push(Stmt::While { cond, body });
            continue;
        };
        let Some(Stmt::Assign {
            value: Expr::Call {
                receiver: Some(iterable),
                ..
            },
            ..
        }) = out.pop()
        else {
            out.push(Stmt::While { cond, body });
            continue;
        };
        body.remove(0);
        out.push(Stmt::ForEach {
            elem_type,
            elem_name,
            iterable: *iterable,
            body,
        });
    }
    out
}

fn mentions(expr: &Expr, var: &str) -> bool {
    match expr {
        Expr::Var(name) => name == var,
        Expr::Binary { lhs, rhs, .. } => mentions(lhs, var) || mentions(rhs, var),
        Expr::Unary { expr, .. }
        | Expr::Cast { expr, .. }
        | Expr::InstanceOf { expr, .. }
        | Expr::ArrayLength(expr) => mentions(expr, var),
        Expr::FieldAccess { object, .. } => mentions(object, var),
        Expr::ArrayAccess { array, index } => mentions(array, var) || mentions(index, var),
        Expr::New { args, .. } => args.iter().any(|a| mentions(a, var)),
        Expr::NewArray { dims, .. } => dims.iter().any(|d| mentions(d, var)),
        Expr::Call { receiver, args, .. } => {
            receiver.as_deref().is_some_and(|r| mentions(r, var))
                || args.iter().any(|a| mentions(a, var))
        }
        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
        } => mentions(cond, var) || mentions(then_expr, var) || mentions(else_expr, var),
        _ => false,
    }
}

/// Whether a `continue` in `body` targets the loop that owns it.
fn has_own_continue(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        Stmt::Continue => true,
        Stmt::Block(b) | Stmt::Synchronized { body: b, .. } => has_own_continue(b),
        Stmt::If {
            then_body,
            else_body,
            ..
        } => has_own_continue(then_body) || else_body.as_deref().is_some_and(has_own_continue),
        Stmt::Switch { cases, default, .. } => {
            cases.iter().any(|c| has_own_continue(&c.body))
                || default.as_deref().is_some_and(has_own_continue)
        }
        Stmt::TryCatch {
            try_body,
            catches,
            finally_body,
        } => {
            has_own_continue(try_body)
                || catches.iter().any(|c| has_own_continue(&c.body))
                || finally_body.as_deref().is_some_and(has_own_continue)
        }
        _ => false,
    })
}

/// `i` stepped by a constant: `i = i + c` or `i = i - c`.
fn steps_var(stmt: &Stmt) -> Option<&str> {
    match stmt {
        Stmt::Assign {
            target: Expr::Var(name),
            value:
                Expr::Binary {
                    op: BinOp::Add | BinOp::Sub,
                    lhs,
                    rhs,
                },
        } if **lhs == Expr::Var(name.clone())
            && matches!(**rhs, Expr::IntConst(_) | Expr::LongConst(_)) =>
        {
            Some(name.as_str())
        }
        _ => None,
    }
}

/// `i = init; while (cond(i)) { ...; i = i + c; }` becomes a `for` loop.
fn recover_for(list: Vec<Stmt>) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::with_capacity(list.len());
    for stmt in list {
        let Stmt::While { cond, mut body } = stmt else {
            out.push(stmt);
            continue;
        };
        let counter = body.last().and_then(steps_var).map(str::to_string);
        let init_matches = match (&counter, out.last()) {
            (Some(var), Some(Stmt::Assign { target: Expr::Var(name), .. })) => name == var,
            _ => false,
        };
        let usable = counter
            .as_deref()
            .is_some_and(|var| mentions(&cond, var) && !has_own_continue(&body));
        if !(init_matches && usable) {
            out.push(Stmt::While { cond, body });
            continue;
        }
        let update = body.pop().map(Box::new);
        let init = out.pop().map(Box::new);
        out.push(Stmt::For {
            init,
            cond,
            update,
            body,
        });
    }
    out
}

fn returns_int(stmt: &Stmt, value: i32) -> bool {
    *stmt == Stmt::Return(Some(Expr::IntConst(value)))
}

fn single_return_of(body: &[Stmt], value: i32) -> bool {
    matches!(body, [only] if returns_int(only, value))
}

/// Boolean methods return `0`/`1`; fold the branches into the condition.
fn fold_boolean_returns(list: Vec<Stmt>) -> Vec<Stmt> {
    let mut out: Vec<Stmt> = Vec::with_capacity(list.len());
    for stmt in list {
        let stmt = match stmt {
            Stmt::If {
                cond,
                then_body,
                else_body: Some(else_body),
            } if single_return_of(&then_body, 1) && single_return_of(&else_body, 0) => {
                Stmt::Return(Some(cond))
            }
            Stmt::If {
                cond,
                then_body,
                else_body: Some(else_body),
            } if single_return_of(&then_body, 0) && single_return_of(&else_body, 1) => {
                Stmt::Return(Some(condition::negate(cond)))
            }
            Stmt::Return(Some(Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            })) if *then_expr == Expr::IntConst(1) && *else_expr == Expr::IntConst(0) => {
                Stmt::Return(Some(*cond))
            }
            Stmt::Return(Some(Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            })) if *then_expr == Expr::IntConst(0) && *else_expr == Expr::IntConst(1) => {
                Stmt::Return(Some(condition::negate(*cond)))
            }
            other => other,
        };
        // `if (c) return 1; return 0;`
        let folded = match (out.last(), &stmt) {
            (
                Some(Stmt::If {
                    then_body,
                    else_body: None,
                    ..
                }),
                Stmt::Return(Some(Expr::IntConst(v @ (0 | 1)))),
            ) if single_return_of(then_body, 1 - v) => Some(*v),
            _ => None,
        };
        if let (Some(v), Some(Stmt::If { cond, .. })) = (folded, out.last().cloned()) {
            out.pop();
            out.push(Stmt::Return(Some(if v == 0 { cond } else { condition::negate(cond) })));
            continue;
        }
        out.push(stmt);
    }
    out.into_iter()
        .map(|stmt| match stmt {
            Stmt::Return(Some(Expr::IntConst(1))) => Stmt::Return(Some(Expr::BoolConst(true))),
            Stmt::Return(Some(Expr::IntConst(0))) => Stmt::Return(Some(Expr::BoolConst(false))),
            other => other,
        })
        .collect()
}

/// `if (c) { t = a; } else { t = b; }` becomes `t = c ? a : b;`.
fn fold_ternary_assigns(list: Vec<Stmt>) -> Vec<Stmt> {
    list.into_iter()
        .map(|stmt| {
            let Stmt::If {
                cond,
                then_body,
                else_body: Some(else_body),
            } = stmt
            else {
                return stmt;
            };
            match (<[Stmt; 1]>::try_from(then_body), <[Stmt; 1]>::try_from(else_body)) {
                (
                    Ok([Stmt::Assign { target, value: then_value }]),
                    Ok([Stmt::Assign { target: other, value: else_value }]),
                ) if target == other => Stmt::Assign {
                    target,
                    value: Expr::ternary(cond, then_value, else_value),
                },
                (then_body, else_body) => Stmt::If {
                    cond,
                    then_body: then_body.map_or_else(|v| v, Vec::from),
                    else_body: Some(else_body.map_or_else(|v| v, Vec::from)),
                },
            }
        })
        .collect()
}
