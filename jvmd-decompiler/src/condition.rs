//! Conditions for conditional-branch instructions.

use jvmd_ir::expr::{BinOp, Expr, UnOp};
use jvmd_isa::Opcode;

/// The comparison under which a branch is taken, and its complement under
/// which execution falls through.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchCondition {
    pub taken: Expr,
    pub fallthrough: Expr,
}

#[derive(Clone, Copy)]
enum Operands {
    /// One value compared against integer zero.
    Zero,
    /// One reference compared against `null`.
    Null,
    /// Two values; the top of stack is the right-hand side.
    Pair,
}

fn branch_operator(opcode: Opcode) -> Option<(BinOp, Operands)> {
    Some(match opcode {
        Opcode::IFEQ => (BinOp::Eq, Operands::Zero),
        Opcode::IFNE => (BinOp::NotEq, Operands::Zero),
        Opcode::IFLT => (BinOp::Lt, Operands::Zero),
        Opcode::IFGE => (BinOp::Ge, Operands::Zero),
        Opcode::IFGT => (BinOp::Gt, Operands::Zero),
        Opcode::IFLE => (BinOp::Le, Operands::Zero),
        Opcode::IF_ICMPEQ | Opcode::IF_ACMPEQ => (BinOp::Eq, Operands::Pair),
        Opcode::IF_ICMPNE | Opcode::IF_ACMPNE => (BinOp::NotEq, Operands::Pair),
        Opcode::IF_ICMPLT => (BinOp::Lt, Operands::Pair),
        Opcode::IF_ICMPGE => (BinOp::Ge, Operands::Pair),
        Opcode::IF_ICMPGT => (BinOp::Gt, Operands::Pair),
        Opcode::IF_ICMPLE => (BinOp::Le, Operands::Pair),
        Opcode::IFNULL => (BinOp::Eq, Operands::Null),
        Opcode::IFNONNULL => (BinOp::NotEq, Operands::Null),
        _ => return None,
    })
}

/// Number of stack values a conditional branch consumes.
pub fn branch_operand_count(opcode: Opcode) -> Option<usize> {
    branch_operator(opcode).map(|(_, operands)| match operands {
        Operands::Pair => 2,
        Operands::Zero | Operands::Null => 1,
    })
}

/// Build both conditions for `opcode` from the stack just before it.
///
/// Returns `None` for opcodes that are not conditional branches, or when
/// the stack holds fewer values than the branch consumes.
pub fn build_condition(opcode: Opcode, stack: &[Expr]) -> Option<BranchCondition> {
    let (op, operands) = branch_operator(opcode)?;
    let taken = match operands {
        Operands::Zero => compare_to_zero(op, stack.last()?.clone()),
        Operands::Null => Expr::binary(op, stack.last()?.clone(), Expr::Null),
        Operands::Pair => {
            let [lhs, rhs] = stack.get(stack.len().checked_sub(2)?..)? else {
                return None;
            };
            Expr::binary(op, lhs.clone(), rhs.clone())
        }
    };
    let fallthrough = invert(taken.clone());
    Some(BranchCondition { taken, fallthrough })
}

/// `lcmp`/`fcmp`/`dcmp` followed by a zero test compares the operands directly.
fn compare_to_zero(op: BinOp, value: Expr) -> Expr {
    match value {
        Expr::Binary {
            op: BinOp::Cmp,
            lhs,
            rhs,
        } => Expr::Binary { op, lhs, rhs },
        other => Expr::binary(op, other, Expr::IntConst(0)),
    }
}

/// Swap a relational operator for its complement. Anything else is returned
/// unchanged.
pub fn invert(cond: Expr) -> Expr {
    match cond {
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: op.complement().unwrap_or(op),
            lhs,
            rhs,
        },
        other => other,
    }
}

/// Full logical negation, falling back to `!cond`.
pub fn negate(cond: Expr) -> Expr {
    match cond {
        Expr::Unary {
            op: UnOp::Not,
            expr,
        } => *expr,
        Expr::Binary { op, lhs, rhs } if op.complement().is_some() => invert(Expr::Binary { op, lhs, rhs }),
        Expr::Binary {
            op: BinOp::And,
            lhs,
            rhs,
        } => Expr::binary(BinOp::Or, negate(*lhs), negate(*rhs)),
        Expr::Binary {
            op: BinOp::Or,
            lhs,
            rhs,
        } => Expr::binary(BinOp::And, negate(*lhs), negate(*rhs)),
        other => Expr::unary(UnOp::Not, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcmp_folds_into_comparison() {
        let cmp = Expr::binary(BinOp::Cmp, Expr::var("a"), Expr::var("b"));
        let cond = build_condition(Opcode::IFLE, &[cmp]).unwrap();
        assert_eq!(cond.taken, Expr::binary(BinOp::Le, Expr::var("a"), Expr::var("b")));
        assert_eq!(cond.fallthrough, Expr::binary(BinOp::Gt, Expr::var("a"), Expr::var("b")));
    }

    #[test]
    fn negate_applies_de_morgan() {
        let c = Expr::binary(
            BinOp::And,
            Expr::binary(BinOp::Lt, Expr::var("a"), Expr::IntConst(0)),
            Expr::var("flag"),
        );
        assert_eq!(
            negate(c),
            Expr::binary(
                BinOp::Or,
                Expr::binary(BinOp::Ge, Expr::var("a"), Expr::IntConst(0)),
                Expr::unary(UnOp::Not, Expr::var("flag")),
            )
        );
    }
}
