//! Constant folding and algebraic identities over expression trees.

use jvmd_ir::expr::{BinOp, Expr, UnOp};
use jvmd_ir::stmt::{CatchClause, Stmt, SwitchCase};

/// Simplify `expr` in a single bottom-up pass.
///
/// Integer arithmetic follows two's-complement wrapping. Division and
/// remainder by a literal zero are left alone so the runtime exception is
/// preserved.
pub fn simplify(expr: Expr) -> Expr {
    match expr {
        Expr::Binary { op, lhs, rhs } => fold_binary(op, simplify(*lhs), simplify(*rhs)),
        Expr::Unary { op, expr } => fold_unary(op, simplify(*expr)),
        Expr::FieldAccess { object, name } => Expr::FieldAccess {
            object: Box::new(simplify(*object)),
            name,
        },
        Expr::ArrayAccess { array, index } => Expr::ArrayAccess {
            array: Box::new(simplify(*array)),
            index: Box::new(simplify(*index)),
        },
        Expr::ArrayLength(array) => Expr::ArrayLength(Box::new(simplify(*array))),
        Expr::Cast { ty, expr } => Expr::Cast {
            ty,
            expr: Box::new(simplify(*expr)),
        },
        Expr::InstanceOf { expr, ty } => Expr::InstanceOf {
            expr: Box::new(simplify(*expr)),
            ty,
        },
        Expr::New { ty, args } => Expr::New {
            ty,
            args: args.into_iter().map(simplify).collect(),
        },
        Expr::NewArray { elem, dims } => Expr::NewArray {
            elem,
            dims: dims.into_iter().map(simplify).collect(),
        },
        Expr::Call {
            receiver,
            owner,
            name,
            args,
        } => Expr::Call {
            receiver: receiver.map(|r| Box::new(simplify(*r))),
            owner,
            name,
            args: args.into_iter().map(simplify).collect(),
        },
        Expr::Ternary {
            cond,
            then_expr,
            else_expr,
        } => Expr::ternary(simplify(*cond), simplify(*then_expr), simplify(*else_expr)),
        leaf => leaf,
    }
}

fn fold_binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    if let Some(folded) = fold_constants(op, &lhs, &rhs) {
        return folded;
    }
    // `s + 0` appends "0".
    if is_string_concat(&lhs) || is_string_concat(&rhs) {
        return Expr::binary(op, lhs, rhs);
    }
    if is_zero(&rhs) {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::BitOr | BinOp::BitXor => return lhs,
            BinOp::Shl | BinOp::Shr | BinOp::UShr => return lhs,
            BinOp::Mul | BinOp::BitAnd if !lhs.has_side_effects() => return rhs,
            _ => {}
        }
    }
    if is_one(&rhs) && matches!(op, BinOp::Mul | BinOp::Div) {
        return lhs;
    }
    if is_zero(&lhs) && matches!(op, BinOp::Add | BinOp::BitOr | BinOp::BitXor) {
        return rhs;
    }
    if is_zero(&lhs) && op == BinOp::Mul && !rhs.has_side_effects() {
        return lhs;
    }
    if is_one(&lhs) && op == BinOp::Mul {
        return rhs;
    }
    Expr::binary(op, lhs, rhs)
}

fn fold_constants(op: BinOp, lhs: &Expr, rhs: &Expr) -> Option<Expr> {
    match (lhs, rhs) {
        (Expr::IntConst(l), Expr::IntConst(r)) => fold_int(op, *l, *r).map(Expr::IntConst),
        (Expr::LongConst(l), Expr::LongConst(r)) => fold_long(op, *l, *r).map(Expr::LongConst),
        // Long shifts take an int distance.
        (Expr::LongConst(l), Expr::IntConst(r)) => {
            let distance = *r as u32;
            match op {
                BinOp::Shl => Some(Expr::LongConst(l.wrapping_shl(distance))),
                BinOp::Shr => Some(Expr::LongConst(l.wrapping_shr(distance))),
                BinOp::UShr => Some(Expr::LongConst((*l as u64).wrapping_shr(distance) as i64)),
                _ => None,
            }
        }
        (Expr::StringLit(l), Expr::StringLit(r)) if op == BinOp::Add => {
            Some(Expr::StringLit(format!("{l}{r}")))
        }
        _ => None,
    }
}

fn fold_int(op: BinOp, l: i32, r: i32) -> Option<i32> {
    Some(match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::Div if r != 0 => l.wrapping_div(r),
        BinOp::Rem if r != 0 => l.wrapping_rem(r),
        BinOp::Shl => l.wrapping_shl(r as u32),
        BinOp::Shr => l.wrapping_shr(r as u32),
        BinOp::UShr => (l as u32).wrapping_shr(r as u32) as i32,
        BinOp::BitAnd => l & r,
        BinOp::BitOr => l | r,
        BinOp::BitXor => l ^ r,
        _ => return None,
    })
}

fn fold_long(op: BinOp, l: i64, r: i64) -> Option<i64> {
    Some(match op {
        BinOp::Add => l.wrapping_add(r),
        BinOp::Sub => l.wrapping_sub(r),
        BinOp::Mul => l.wrapping_mul(r),
        BinOp::Div if r != 0 => l.wrapping_div(r),
        BinOp::Rem if r != 0 => l.wrapping_rem(r),
        BinOp::BitAnd => l & r,
        BinOp::BitOr => l | r,
        BinOp::BitXor => l ^ r,
        _ => return None,
    })
}

fn fold_unary(op: UnOp, expr: Expr) -> Expr {
    match (op, expr) {
        (UnOp::Neg, Expr::IntConst(v)) => Expr::IntConst(v.wrapping_neg()),
        (UnOp::Neg, Expr::LongConst(v)) => Expr::LongConst(v.wrapping_neg()),
        (UnOp::Neg, Expr::FloatConst(v)) => Expr::FloatConst(-v),
        (UnOp::Neg, Expr::DoubleConst(v)) => Expr::DoubleConst(-v),
        (
            op,
            Expr::Unary {
                op: inner_op,
                expr: inner,
            },
        ) if op == inner_op => *inner,
        (op, expr) => Expr::unary(op, expr),
    }
}

fn is_string_concat(e: &Expr) -> bool {
    match e {
        Expr::StringLit(_) => true,
        Expr::Binary {
            op: BinOp::Add,
            lhs,
            rhs,
        } => is_string_concat(lhs) || is_string_concat(rhs),
        _ => false,
    }
}

fn is_zero(e: &Expr) -> bool {
    matches!(e, Expr::IntConst(0) | Expr::LongConst(0))
}

fn is_one(e: &Expr) -> bool {
    matches!(e, Expr::IntConst(1) | Expr::LongConst(1))
}

/// Apply [`simplify`] to every expression in a statement tree.
pub fn simplify_stmts(stmts: Vec<Stmt>) -> Vec<Stmt> {
    stmts.into_iter().map(simplify_stmt).collect()
}

fn simplify_stmt(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Block(body) => Stmt::Block(simplify_stmts(body)),
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => Stmt::If {
            cond: simplify(cond),
            then_body: simplify_stmts(then_body),
            else_body: else_body.map(simplify_stmts),
        },
        Stmt::While { cond, body } => Stmt::While {
            cond: simplify(cond),
            body: simplify_stmts(body),
        },
        Stmt::For {
            init,
            cond,
            update,
            body,
        } => Stmt::For {
            init: init.map(|s| Box::new(simplify_stmt(*s))),
            cond: simplify(cond),
            update: update.map(|s| Box::new(simplify_stmt(*s))),
            body: simplify_stmts(body),
        },
        Stmt::ForEach {
            elem_type,
            elem_name,
            iterable,
            body,
        } => Stmt::ForEach {
            elem_type,
            elem_name,
            iterable: simplify(iterable),
            body: simplify_stmts(body),
        },
        Stmt::Switch {
            selector,
            cases,
            default,
        } => Stmt::Switch {
            selector: simplify(selector),
            cases: cases
                .into_iter()
                .map(|c| SwitchCase {
                    value: c.value,
                    body: simplify_stmts(c.body),
                })
                .collect(),
            default: default.map(simplify_stmts),
        },
        Stmt::Assign { target, value } => Stmt::Assign {
            target: simplify(target),
            value: simplify(value),
        },
        Stmt::Return(value) => Stmt::Return(value.map(simplify)),
        Stmt::Expr(e) => Stmt::Expr(simplify(e)),
        Stmt::Throw(e) => Stmt::Throw(simplify(e)),
        Stmt::TryCatch {
            try_body,
            catches,
            finally_body,
        } => Stmt::TryCatch {
            try_body: simplify_stmts(try_body),
            catches: catches
                .into_iter()
                .map(|c| CatchClause {
                    body: simplify_stmts(c.body),
                    ..c
                })
                .collect(),
            finally_body: finally_body.map(simplify_stmts),
        },
        Stmt::Synchronized { monitor, body } => Stmt::Synchronized {
            monitor: simplify(monitor),
            body: simplify_stmts(body),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_wrapping_and_masked_shifts() {
        let e = Expr::binary(BinOp::Add, Expr::IntConst(i32::MAX), Expr::IntConst(1));
        assert_eq!(simplify(e), Expr::IntConst(i32::MIN));
        let e = Expr::binary(BinOp::Shl, Expr::IntConst(1), Expr::IntConst(33));
        assert_eq!(simplify(e), Expr::IntConst(2));
        let e = Expr::binary(BinOp::UShr, Expr::IntConst(-1), Expr::IntConst(28));
        assert_eq!(simplify(e), Expr::IntConst(15));
    }

    #[test]
    fn zero_is_appended_to_strings() {
        let e = Expr::binary(BinOp::Add, Expr::StringLit("a".into()), Expr::IntConst(0));
        assert_eq!(simplify(e.clone()), e);
    }

    #[test]
    fn keeps_division_by_zero() {
        let e = Expr::binary(BinOp::Div, Expr::IntConst(1), Expr::IntConst(0));
        assert_eq!(simplify(e.clone()), e);
    }

    #[test]
    fn multiply_by_zero_keeps_calls() {
        let call = Expr::Call {
            receiver: None,
            owner: "A".into(),
            name: "f".into(),
            args: vec![],
        };
        let e = Expr::binary(BinOp::Mul, call, Expr::IntConst(0));
        assert_eq!(simplify(e.clone()), e);
    }
}
