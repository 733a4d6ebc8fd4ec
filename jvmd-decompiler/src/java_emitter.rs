use jvmd_ir::expr::{BinOp, Expr, UnOp};
use jvmd_ir::method::AccessFlags;
use jvmd_ir::stmt::{MethodAst, Stmt};
use std::fmt::Write;

use crate::descriptor::{MethodDescriptor, simple_class_name};
use crate::naming::{LocalNameProvider, ParameterNames};

/// Emit a list of statements as Java-flavored source text.
pub fn emit_java(stmts: &[Stmt]) -> String {
    let mut out = String::new();
    Emitter::default().stmts(&mut out, stmts, 0);
    out
}

/// Emit a whole method with its signature. Parameters are named the way
/// [`ParameterNames`] names them.
pub fn emit_method(ast: &MethodAst, access: AccessFlags, class_name: &str) -> String {
    let names = match MethodDescriptor::parse(&ast.descriptor) {
        Ok(descriptor) => ParameterNames::new(access.contains(AccessFlags::STATIC), &descriptor),
        Err(_) => ParameterNames::default(),
    };
    emit_method_with_names(ast, access, class_name, &names)
}

/// Like [`emit_method`], with parameter names taken from `names` at offset 0
/// so they agree with the body.
pub fn emit_method_with_names(
    ast: &MethodAst,
    access: AccessFlags,
    class_name: &str,
    names: &dyn LocalNameProvider,
) -> String {
    let mut out = String::new();
    if ast.name == "<clinit>" {
        let _ = writeln!(out, "static {{");
    } else {
        let _ = writeln!(out, "{} {{", signature(ast, access, class_name, names));
    }
    let emitter = Emitter {
        this_class: Some(simple_class_name(class_name)),
    };
    emitter.stmts(&mut out, &ast.body, 1);
    let _ = writeln!(out, "}}");
    out
}

fn signature(
    ast: &MethodAst,
    access: AccessFlags,
    class_name: &str,
    names: &dyn LocalNameProvider,
) -> String {
    let descriptor = match MethodDescriptor::parse(&ast.descriptor) {
        Ok(d) => d,
        Err(err) => {
            log::debug!("{}: {err}; rendering without parameters", ast.name);
            MethodDescriptor {
                params: Vec::new(),
                ret: None,
            }
        }
    };

    let mut slot = if access.contains(AccessFlags::STATIC) { 0 } else { 1 };
    let params: Vec<String> = descriptor
        .params
        .iter()
        .map(|ty| {
            let param = format!("{} {}", ty.java_name(), names.name_for(slot, 0));
            slot += ty.slots();
            param
        })
        .collect();

    let mut head: Vec<String> = access.keywords().iter().map(|k| k.to_string()).collect();
    if ast.name == "<init>" {
        head.push(simple_class_name(class_name).to_string());
    } else {
        head.push(descriptor.return_java_name());
        head.push(ast.name.clone());
    }
    format!("{}({})", head.join(" "), params.join(", "))
}

/// Rendering context. Constructor calls on `this_class` (a simple name)
/// delegate with `this(...)`; others go to `super(...)`.
#[derive(Debug, Default, Clone, Copy)]
struct Emitter<'a> {
    this_class: Option<&'a str>,
}

impl Emitter<'_> {
    fn stmts(&self, out: &mut String, stmts: &[Stmt], indent: usize) {
        for stmt in stmts {
            self.stmt(out, stmt, indent);
        }
    }

    fn stmt(&self, out: &mut String, stmt: &Stmt, indent: usize) {
        let pad = indent_str(indent);
        match stmt {
            Stmt::Expr(_) | Stmt::Assign { .. } => {
                let _ = writeln!(out, "{pad}{};", self.inline_stmt(stmt));
            }
            Stmt::Return(None) => {
                let _ = writeln!(out, "{pad}return;");
            }
            Stmt::Return(Some(e)) => {
                let _ = writeln!(out, "{pad}return {};", self.expr(e));
            }
            Stmt::Throw(e) => {
                let _ = writeln!(out, "{pad}throw {};", self.expr(e));
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                let _ = writeln!(out, "{pad}if ({}) {{", self.expr(cond));
                self.stmts(out, then_body, indent + 1);
                match else_body {
                    Some(else_body) => {
                        let _ = writeln!(out, "{pad}}} else {{");
                        self.stmts(out, else_body, indent + 1);
                        let _ = writeln!(out, "{pad}}}");
                    }
                    None => {
                        let _ = writeln!(out, "{pad}}}");
                    }
                }
            }
            Stmt::While { cond, body } => {
                let _ = writeln!(out, "{pad}while ({}) {{", self.expr(cond));
                self.stmts(out, body, indent + 1);
                let _ = writeln!(out, "{pad}}}");
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                let init = init.as_deref().map(|s| self.inline_stmt(s)).unwrap_or_default();
                let update = update.as_deref().map(|s| self.inline_stmt(s)).unwrap_or_default();
                let _ = writeln!(out, "{pad}for ({init}; {}; {update}) {{", self.expr(cond));
                self.stmts(out, body, indent + 1);
                let _ = writeln!(out, "{pad}}}");
            }
            Stmt::ForEach {
                elem_type,
                elem_name,
                iterable,
                body,
            } => {
                let _ = writeln!(
                    out,
                    "{pad}for ({elem_type} {elem_name} : {}) {{",
                    self.expr(iterable)
                );
                self.stmts(out, body, indent + 1);
                let _ = writeln!(out, "{pad}}}");
            }
            Stmt::Switch {
                selector,
                cases,
                default,
            } => {
                let _ = writeln!(out, "{pad}switch ({}) {{", self.expr(selector));
                for case in cases {
                    let _ = writeln!(out, "{pad}    case {}:", case.value);
                    self.stmts(out, &case.body, indent + 2);
                }
                if let Some(default) = default {
                    let _ = writeln!(out, "{pad}    default:");
                    self.stmts(out, default, indent + 2);
                }
                let _ = writeln!(out, "{pad}}}");
            }
            Stmt::TryCatch {
                try_body,
                catches,
                finally_body,
            } => {
                let _ = writeln!(out, "{pad}try {{");
                self.stmts(out, try_body, indent + 1);
                for clause in catches {
                    let _ = writeln!(
                        out,
                        "{pad}}} catch ({} {}) {{",
                        clause.exception_type, clause.binding
                    );
                    self.stmts(out, &clause.body, indent + 1);
                }
                if let Some(finally_body) = finally_body {
                    let _ = writeln!(out, "{pad}}} finally {{");
                    self.stmts(out, finally_body, indent + 1);
                }
                let _ = writeln!(out, "{pad}}}");
            }
            Stmt::Synchronized { monitor, body } => {
                let _ = writeln!(out, "{pad}synchronized ({}) {{", self.expr(monitor));
                self.stmts(out, body, indent + 1);
                let _ = writeln!(out, "{pad}}}");
            }
            Stmt::Break => {
                let _ = writeln!(out, "{pad}break;");
            }
            Stmt::Continue => {
                let _ = writeln!(out, "{pad}continue;");
            }
            Stmt::Block(body) => {
                let _ = writeln!(out, "{pad}{{");
                self.stmts(out, body, indent + 1);
                let _ = writeln!(out, "{pad}}}");
            }
            Stmt::Comment(text) => {
                let _ = writeln!(out, "{pad}// {text}");
            }
        }
    }

    /// Assignments and expression statements without the trailing `;`, for
    /// use inside `for (...)` headers.
    fn inline_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Assign { target, value } => {
                if let Some(op) = step_operator(target, value) {
                    return format!("{}{op}", self.expr(target));
                }
                format!("{} = {}", self.expr(target), self.expr(value))
            }
            Stmt::Expr(e) => self.expr(e),
            other => {
                let mut out = String::new();
                self.stmt(&mut out, other, 0);
                out.trim_end().trim_end_matches(';').to_string()
            }
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::IntConst(v) => v.to_string(),
            Expr::LongConst(v) => format!("{v}L"),
            Expr::FloatConst(v) => emit_float(f64::from(*v), "Float", "f"),
            Expr::DoubleConst(v) => emit_float(*v, "Double", ""),
            Expr::StringLit(s) => format!("\"{}\"", escape_java_string(s)),
            Expr::ClassLit(name) => format!("{name}.class"),
            Expr::Null => "null".into(),
            Expr::BoolConst(b) => b.to_string(),
            Expr::Var(name) => name.clone(),
            Expr::Binary {
                op: BinOp::Cmp,
                lhs,
                rhs,
            } => format!("compare({}, {})", self.expr(lhs), self.expr(rhs)),
            Expr::Binary { op, lhs, rhs } => {
                format!("({} {op} {})", self.expr(lhs), self.expr(rhs))
            }
            Expr::Unary { op, expr } => {
                let e = self.expr(expr);
                // `--x` would read as a decrement.
                if *op == UnOp::Neg && e.starts_with('-') {
                    format!("-({e})")
                } else {
                    format!("{op}{e}")
                }
            }
            Expr::FieldAccess { object, name } => format!("{}.{name}", self.operand(object)),
            Expr::ArrayAccess { array, index } => {
                format!("{}[{}]", self.operand(array), self.expr(index))
            }
            Expr::ArrayLength(array) => format!("{}.length", self.operand(array)),
            Expr::Cast { ty, expr } => format!("(({ty}) {})", self.expr(expr)),
            Expr::InstanceOf { expr, ty } => format!("({} instanceof {ty})", self.expr(expr)),
            Expr::New { ty, args } => format!("new {ty}({})", self.args(args)),
            Expr::NewArray { elem, dims } => {
                let dims: String = dims.iter().map(|d| format!("[{}]", self.expr(d))).collect();
                format!("new {elem}{dims}")
            }
            Expr::UninitNew(ty) => format!("new {ty}"),
            Expr::Call {
                receiver,
                owner,
                name,
                args,
            } => {
                let args = self.args(args);
                match receiver {
                    Some(_) if name == "<init>" => {
                        let target = if self.this_class == Some(owner.as_str()) {
                            "this"
                        } else {
                            "super"
                        };
                        format!("{target}({args})")
                    }
                    Some(recv) => format!("{}.{name}({args})", self.operand(recv)),
                    None if owner.is_empty() => format!("{name}({args})"),
                    None => format!("{owner}.{name}({args})"),
                }
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => format!(
                "({} ? {} : {})",
                self.expr(cond),
                self.expr(then_expr),
                self.expr(else_expr)
            ),
        }
    }

    /// Receivers of `.` and `[]` need parens unless they are already atomic.
    fn operand(&self, expr: &Expr) -> String {
        let s = self.expr(expr);
        match expr {
            Expr::Unary { .. } | Expr::New { .. } | Expr::NewArray { .. } => format!("({s})"),
            _ => s,
        }
    }

    fn args(&self, args: &[Expr]) -> String {
        args.iter().map(|a| self.expr(a)).collect::<Vec<_>>().join(", ")
    }
}

/// Render one expression.
pub fn emit_expr(expr: &Expr) -> String {
    Emitter::default().expr(expr)
}

fn indent_str(level: usize) -> String {
    "    ".repeat(level)
}

/// `++` or `--` for `v = v + 1` and `v = v - 1`.
fn step_operator(target: &Expr, value: &Expr) -> Option<&'static str> {
    let Expr::Binary { op, lhs, rhs } = value else {
        return None;
    };
    if lhs.as_ref() != target || rhs.as_ref() != &Expr::IntConst(1) {
        return None;
    }
    match op {
        BinOp::Add => Some("++"),
        BinOp::Sub => Some("--"),
        _ => None,
    }
}

fn emit_float(v: f64, boxed: &str, suffix: &str) -> String {
    if v.is_nan() {
        format!("{boxed}.NaN")
    } else if v.is_infinite() {
        let sign = if v > 0.0 { "POSITIVE" } else { "NEGATIVE" };
        format!("{boxed}.{sign}_INFINITY")
    } else {
        format!("{v:?}{suffix}")
    }
}

fn escape_java_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_render_as_postfix() {
        let x = Expr::var("i");
        let stmt = Stmt::Assign {
            target: x.clone(),
            value: Expr::binary(BinOp::Add, x.clone(), Expr::IntConst(1)),
        };
        assert_eq!(emit_java(&[stmt]), "i++;\n");
        let other = Stmt::Assign {
            target: x.clone(),
            value: Expr::binary(BinOp::Add, x, Expr::IntConst(2)),
        };
        assert_eq!(emit_java(&[other]), "i = (i + 2);\n");
    }

    #[test]
    fn float_literals_carry_suffixes() {
        assert_eq!(emit_expr(&Expr::FloatConst(1.0)), "1.0f");
        assert_eq!(emit_expr(&Expr::DoubleConst(2.5)), "2.5");
        assert_eq!(emit_expr(&Expr::LongConst(7)), "7L");
        assert_eq!(emit_expr(&Expr::FloatConst(f32::NAN)), "Float.NaN");
    }

    #[test]
    fn strings_are_escaped() {
        let s = Expr::StringLit("a\"b\n".to_string());
        assert_eq!(emit_expr(&s), r#""a\"b\n""#);
    }

    #[test]
    fn negating_a_negative_literal_keeps_parens() {
        let e = Expr::unary(UnOp::Neg, Expr::IntConst(-1));
        assert_eq!(emit_expr(&e), "-(-1)");
    }

    #[test]
    fn method_signature_uses_parameter_names() {
        let ast = MethodAst {
            name: "max".to_string(),
            descriptor: "(JI)J".to_string(),
            body: vec![Stmt::Return(Some(Expr::var("a")))],
        };
        let text = emit_method(&ast, AccessFlags::PUBLIC | AccessFlags::STATIC, "p/Calc");
        assert_eq!(
            text,
            "public static long max(long a, int b) {\n    return a;\n}\n"
        );
    }

    #[test]
    fn constructors_take_the_class_name() {
        let ast = MethodAst {
            name: "<init>".to_string(),
            descriptor: "()V".to_string(),
            body: vec![Stmt::Expr(Expr::Call {
                receiver: Some(Box::new(Expr::var("this"))),
                owner: "Object".to_string(),
                name: "<init>".to_string(),
                args: Vec::new(),
            })],
        };
        let text = emit_method(&ast, AccessFlags::PUBLIC, "p/Calc");
        assert_eq!(text, "public Calc() {\n    super();\n}\n");
    }

    #[test]
    fn delegating_constructor_calls_this() {
        let init = |owner: &str, args: Vec<Expr>| {
            Stmt::Expr(Expr::Call {
                receiver: Some(Box::new(Expr::var("this"))),
                owner: owner.to_string(),
                name: "<init>".to_string(),
                args,
            })
        };
        let ast = MethodAst {
            name: "<init>".to_string(),
            descriptor: "()V".to_string(),
            body: vec![init("Calc", vec![Expr::IntConst(0)])],
        };
        let text = emit_method(&ast, AccessFlags::PUBLIC, "p/Calc");
        assert_eq!(text, "public Calc() {\n    this(0);\n}\n");

        // Without a class to compare against, the call goes to the superclass.
        assert_eq!(emit_java(&ast.body), "super(0);\n");
        let ast = MethodAst {
            body: vec![init("Base", Vec::new())],
            ..ast
        };
        let text = emit_method(&ast, AccessFlags::PUBLIC, "p/Calc");
        assert_eq!(text, "public Calc() {\n    super();\n}\n");
    }
}
