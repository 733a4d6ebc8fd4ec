use crate::expr::Expr;

/// Statement nodes for decompiled code.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Nested block: `{ ... }`
    Block(Vec<Stmt>),
    /// If statement; `else_body` is `None` when there is no else branch.
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    /// While loop.
    While { cond: Expr, body: Vec<Stmt> },
    /// C-style for loop.
    For {
        init: Option<Box<Stmt>>,
        cond: Expr,
        update: Option<Box<Stmt>>,
        body: Vec<Stmt>,
    },
    /// `for (elem_type elem_name : iterable)`
    ForEach {
        elem_type: String,
        elem_name: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    /// Switch statement; cases keep their encoding order.
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },
    /// Assignment: `target = value;`
    Assign { target: Expr, value: Expr },
    /// Return statement: `return expr;`
    Return(Option<Expr>),
    /// Expression statement: `expr;`
    Expr(Expr),
    /// Throw statement: `throw expr;`
    Throw(Expr),
    /// Try-catch-finally.
    TryCatch {
        try_body: Vec<Stmt>,
        catches: Vec<CatchClause>,
        finally_body: Option<Vec<Stmt>>,
    },
    /// `synchronized (monitor) { body }`
    Synchronized { monitor: Expr, body: Vec<Stmt> },
    Break,
    Continue,
    /// A comment (for undecompilable regions).
    Comment(String),
}

/// A single case in a switch statement. An empty body falls through.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: i32,
    pub body: Vec<Stmt>,
}

/// `catch (exception_type binding) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub exception_type: String,
    pub binding: String,
    pub body: Vec<Stmt>,
}

/// The recovered body of one method, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodAst {
    pub name: String,
    pub descriptor: String,
    /// Top-level block of the method.
    pub body: Vec<Stmt>,
}

impl Stmt {
    /// Whether control never continues past this statement.
    pub fn is_exit(&self) -> bool {
        matches!(
            self,
            Stmt::Return(_) | Stmt::Throw(_) | Stmt::Break | Stmt::Continue
        )
    }
}
