/// Expression tree nodes recovered from the operand stack.
///
/// Trees are strictly owned: every use of a value builds a fresh node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `int` literal.
    IntConst(i32),
    /// `long` literal.
    LongConst(i64),
    /// `float` literal.
    FloatConst(f32),
    /// `double` literal.
    DoubleConst(f64),
    /// String literal.
    StringLit(String),
    /// Class literal: `Foo.class`.
    ClassLit(String),
    /// `null`
    Null,
    /// `true` or `false`. Bytecode has no boolean values; these only come
    /// from structuring (`while (true)`, folded boolean returns).
    BoolConst(bool),
    /// A named local variable or parameter.
    Var(String),
    /// Binary operation: `lhs op rhs`
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Unary operation: `op expr`
    Unary { op: UnOp, expr: Box<Expr> },
    /// Field access: `object.name`. Static fields use the owner's simple
    /// name as a variable object.
    FieldAccess { object: Box<Expr>, name: String },
    /// `array[index]`
    ArrayAccess { array: Box<Expr>, index: Box<Expr> },
    /// `array.length`
    ArrayLength(Box<Expr>),
    /// `(ty) expr`
    Cast { ty: String, expr: Box<Expr> },
    /// `expr instanceof ty`
    InstanceOf { expr: Box<Expr>, ty: String },
    /// `new ty(args...)`
    New { ty: String, args: Vec<Expr> },
    /// `new elem[d0][d1]...`
    NewArray { elem: String, dims: Vec<Expr> },
    /// Result of `new` before its constructor runs. Internal only; the
    /// simulator replaces it once `<init>` is invoked.
    UninitNew(String),
    /// Method call. `receiver` is `None` for static calls, which print
    /// through `owner`.
    Call {
        receiver: Option<Box<Expr>>,
        owner: String,
        name: String,
        args: Vec<Expr>,
    },
    /// `cond ? then_expr : else_expr`
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnOp, expr: Expr) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn ternary(cond: Expr, then_expr: Expr, else_expr: Expr) -> Self {
        Expr::Ternary {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    /// Literal that occupies two stack slots.
    pub fn is_wide_literal(&self) -> bool {
        matches!(self, Expr::LongConst(_) | Expr::DoubleConst(_))
    }

    /// Whether evaluating the expression may have side effects worth
    /// keeping as a statement when its value is discarded.
    pub fn has_side_effects(&self) -> bool {
        matches!(self, Expr::Call { .. } | Expr::New { .. })
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    NotEq,
    Lt,
    Ge,
    Gt,
    Le,
    /// Short-circuit `&&`.
    And,
    /// Short-circuit `||`.
    Or,
    /// Three-way comparison from `lcmp`/`fcmp*`/`dcmp*`.
    Cmp,
}

impl BinOp {
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Ge | BinOp::Gt | BinOp::Le
        )
    }

    /// Logical complement of a relational operator.
    pub fn complement(self) -> Option<BinOp> {
        match self {
            BinOp::Eq => Some(BinOp::NotEq),
            BinOp::NotEq => Some(BinOp::Eq),
            BinOp::Lt => Some(BinOp::Ge),
            BinOp::Ge => Some(BinOp::Lt),
            BinOp::Gt => Some(BinOp::Le),
            BinOp::Le => Some(BinOp::Gt),
            _ => None,
        }
    }

    /// Evaluate a relational operator on two values.
    pub fn compare<T: PartialOrd>(self, a: T, b: T) -> Option<bool> {
        match self {
            BinOp::Eq => Some(a == b),
            BinOp::NotEq => Some(a != b),
            BinOp::Lt => Some(a < b),
            BinOp::Ge => Some(a >= b),
            BinOp::Gt => Some(a > b),
            BinOp::Le => Some(a <= b),
            _ => None,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    /// Arithmetic negation.
    Neg,
    /// Logical not.
    Not,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::UShr => ">>>",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Ge => ">=",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Cmp => "<=>",
        };
        f.write_str(s)
    }
}

impl std::fmt::Display for UnOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        })
    }
}
