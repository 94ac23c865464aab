use std::fmt::Write;

use crate::types::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

use super::descriptor::{self, JvmType};
use super::expr::*;
use super::java_ast::*;
use super::structured_types::{Block, Stmt};

/// Configuration for rendering Java source code.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub indent: String,
    pub include_synthetic: bool,
    /// Refer to classes by simple name; otherwise fully qualified.
    pub use_simple_names: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent: "    ".into(),
            include_synthetic: false,
            use_simple_names: true,
        }
    }
}

// Java operator precedence, higher binds tighter.
const PREC_ASSIGN: u8 = 1;
const PREC_COND_OR: u8 = 3;
const PREC_COND_AND: u8 = 4;
const PREC_OR: u8 = 5;
const PREC_XOR: u8 = 6;
const PREC_AND: u8 = 7;
const PREC_EQUALITY: u8 = 8;
const PREC_RELATIONAL: u8 = 9;
const PREC_SHIFT: u8 = 10;
const PREC_ADDITIVE: u8 = 11;
const PREC_MULTIPLICATIVE: u8 = 12;
const PREC_UNARY: u8 = 13;
const PREC_PRIMARY: u8 = 15;

/// Java source code renderer.
///
/// Rendering never changes the tree; every node is printed as it is, so
/// leftover `Label`/`Goto` statements show up as `label:` and `goto label;`.
pub struct JavaRenderer {
    config: RenderConfig,
    output: String,
    indent_level: usize,
}

/// Name tables of the method a statement belongs to.
struct Scope<'a> {
    vars: &'a VarTable,
    labels: &'a LabelTable,
}

impl JavaRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            output: String::new(),
            indent_level: 0,
        }
    }

    pub fn render_unit(mut self, unit: &CompilationUnit) -> String {
        if let Some(ref pkg) = unit.package {
            self.writeln(&format!("package {};", pkg));
            self.newline();
        }

        if !unit.imports.is_empty() {
            for import in &unit.imports {
                self.writeln(&format!("import {};", descriptor::internal_to_source_name(import)));
            }
            self.newline();
        }

        for (i, class) in unit.classes.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.render_class_decl(class);
        }
        self.output
    }

    pub fn render_class(mut self, class: &JavaClass) -> String {
        self.render_class_decl(class);
        self.output
    }

    pub fn render_method(mut self, method: &JavaMethod, class_name: &str) -> String {
        self.render_method_decl(method, class_name, false);
        self.output
    }

    /// Render a statement list, such as the flat output of the interpreter.
    pub fn render_block(mut self, block: &[Stmt], vars: &VarTable, labels: &LabelTable) -> String {
        let scope = Scope { vars, labels };
        self.render_stmts(block, &scope);
        self.output
    }

    fn render_class_decl(&mut self, class: &JavaClass) {
        let flags = class.access;
        let mut decl = String::new();
        if flags.contains(ClassAccessFlags::PUBLIC) {
            decl.push_str("public ");
        }
        if class.is_static && class.outer_class.is_some() {
            decl.push_str("static ");
        }
        let kind = if flags.contains(ClassAccessFlags::ANNOTATION) {
            "@interface"
        } else if flags.contains(ClassAccessFlags::INTERFACE) {
            "interface"
        } else if flags.contains(ClassAccessFlags::ENUM) {
            "enum"
        } else {
            if flags.contains(ClassAccessFlags::ABSTRACT) {
                decl.push_str("abstract ");
            }
            if flags.contains(ClassAccessFlags::FINAL) {
                decl.push_str("final ");
            }
            "class"
        };
        let name = declared_name(&class.name);
        let _ = write!(decl, "{} {}", kind, name);

        if !class.is_interface() {
            if let Some(ref super_class) = class.super_class {
                let _ = write!(decl, " extends {}", self.class_ref(super_class));
            }
        }
        if !class.interfaces.is_empty() {
            let keyword = if class.is_interface() { "extends" } else { "implements" };
            let names: Vec<String> = class.interfaces.iter().map(|i| self.class_ref(i)).collect();
            let _ = write!(decl, " {} {}", keyword, names.join(", "));
        }
        decl.push_str(" {");
        self.writeln(&decl);
        self.indent_level += 1;

        let fields: Vec<&JavaField> = class
            .fields
            .iter()
            .filter(|f| self.config.include_synthetic || !f.is_synthetic())
            .collect();
        for field in &fields {
            self.render_field(field);
        }

        let mut first = fields.is_empty();
        for method in &class.methods {
            if !self.config.include_synthetic && method.is_synthetic() {
                continue;
            }
            if !first {
                self.newline();
            }
            first = false;
            self.render_method_decl(method, &name, class.is_interface());
        }

        for inner in &class.inner_classes {
            if !first {
                self.newline();
            }
            first = false;
            self.render_class_decl(inner);
        }

        self.indent_level -= 1;
        self.writeln("}");
    }

    fn render_field(&mut self, field: &JavaField) {
        let mut decl = String::new();
        if let Some(vis) = Visibility::of_field(field.access).keyword() {
            decl.push_str(vis);
            decl.push(' ');
        }
        for (flag, keyword) in [
            (FieldAccessFlags::STATIC, "static "),
            (FieldAccessFlags::FINAL, "final "),
            (FieldAccessFlags::TRANSIENT, "transient "),
            (FieldAccessFlags::VOLATILE, "volatile "),
        ] {
            if field.access.contains(flag) {
                decl.push_str(keyword);
            }
        }
        let _ = write!(decl, "{} {}", self.type_name(&field.ty), field.name);
        if let Some(ref init) = field.initializer {
            let empty = VarTable::new();
            let _ = write!(decl, " = {}", self.expr(init, &empty));
        }
        decl.push(';');
        self.writeln(&decl);
    }

    fn render_method_decl(&mut self, method: &JavaMethod, class_name: &str, in_interface: bool) {
        let labels = method.body.as_ref().map(|b| &b.labels);
        let empty_labels = LabelTable::new();
        let scope = Scope {
            vars: &method.vars,
            labels: labels.unwrap_or(&empty_labels),
        };

        if method.is_static_initializer() {
            self.writeln("static {");
        } else {
            let decl = self.method_signature(method, class_name, in_interface);
            let has_body = method.body.is_some() || method.error.is_some();
            self.writeln(&format!("{}{}", decl, if has_body { " {" } else { ";" }));
            if !has_body {
                return;
            }
        }

        self.indent_level += 1;
        if let Some(ref error) = method.error {
            for line in error.lines() {
                self.writeln(&format!("// {}", line));
            }
        }
        if let Some(ref body) = method.body {
            let mut block: &[Stmt] = &body.block;
            // A trailing `return;` is implied.
            if method.return_type == JvmType::Void {
                if let Some((Stmt::Return(None), rest)) = block.split_last() {
                    block = rest;
                }
            }
            self.render_stmts(block, &scope);
        }
        self.indent_level -= 1;
        self.writeln("}");
    }

    fn method_signature(&self, method: &JavaMethod, class_name: &str, in_interface: bool) -> String {
        let flags = method.access;
        let mut decl = String::new();
        if let Some(vis) = Visibility::of_method(flags).keyword() {
            decl.push_str(vis);
            decl.push(' ');
        }
        if flags.contains(MethodAccessFlags::STATIC) {
            decl.push_str("static ");
        }
        if flags.contains(MethodAccessFlags::ABSTRACT) && !in_interface {
            decl.push_str("abstract ");
        }
        if in_interface
            && !flags.intersects(MethodAccessFlags::ABSTRACT | MethodAccessFlags::STATIC | MethodAccessFlags::PRIVATE)
        {
            decl.push_str("default ");
        }
        for (flag, keyword) in [
            (MethodAccessFlags::FINAL, "final "),
            (MethodAccessFlags::SYNCHRONIZED, "synchronized "),
            (MethodAccessFlags::NATIVE, "native "),
        ] {
            if flags.contains(flag) {
                decl.push_str(keyword);
            }
        }

        if method.is_constructor() {
            decl.push_str(class_name);
        } else {
            let _ = write!(decl, "{} {}", self.type_name(&method.return_type), method.name);
        }

        let params: Vec<VarId> = method
            .parameters
            .iter()
            .copied()
            .filter(|&p| self.config.include_synthetic || !method.vars.get(p).synthetic)
            .collect();
        decl.push('(');
        for (i, &param) in params.iter().enumerate() {
            if i > 0 {
                decl.push_str(", ");
            }
            let var = method.vars.get(param);
            if var.is_final {
                decl.push_str("final ");
            }
            let varargs = i + 1 == params.len() && flags.contains(MethodAccessFlags::VARARGS);
            match (&var.ty, varargs) {
                (JvmType::Array(element), true) => {
                    let _ = write!(decl, "{}... {}", self.type_name(element), var.name);
                }
                _ => {
                    let _ = write!(decl, "{} {}", self.type_name(&var.ty), var.name);
                }
            }
        }
        decl.push(')');

        if !method.exceptions.is_empty() {
            let names: Vec<String> = method.exceptions.iter().map(|e| self.class_ref(e)).collect();
            let _ = write!(decl, " throws {}", names.join(", "));
        }
        decl
    }

    fn render_stmts(&mut self, block: &[Stmt], scope: &Scope<'_>) {
        for stmt in block {
            self.render_stmt(stmt, scope);
        }
    }

    fn render_stmt(&mut self, stmt: &Stmt, scope: &Scope<'_>) {
        match stmt {
            Stmt::Expr(e) => {
                let text = self.expr(e, scope.vars);
                self.writeln(&format!("{};", text));
            }
            Stmt::Declare { var, init } => {
                let decl = scope.vars.get(*var);
                let mut text = String::new();
                if decl.is_final {
                    text.push_str("final ");
                }
                let _ = write!(text, "{} {}", self.type_name(&decl.ty), decl.name);
                if let Some(init) = init {
                    let _ = write!(text, " = {}", self.expr(init, scope.vars));
                }
                text.push(';');
                self.writeln(&text);
            }
            Stmt::If { .. } => {
                self.write_indent();
                self.render_if(stmt, scope);
            }
            Stmt::While { label, cond, body } => {
                let prefix = label
                    .map(|l| format!("{}: ", scope.labels.name(l)))
                    .unwrap_or_default();
                let text = format!("{}while ({}) {{", prefix, self.expr(cond, scope.vars));
                self.writeln(&text);
                self.render_nested(body, scope);
                self.writeln("}");
            }
            Stmt::Break(label) => self.writeln(&jump("break", *label, scope)),
            Stmt::Continue(label) => self.writeln(&jump("continue", *label, scope)),
            Stmt::Return(None) => self.writeln("return;"),
            Stmt::Return(Some(e)) => {
                let text = format!("return {};", self.expr(e, scope.vars));
                self.writeln(&text);
            }
            Stmt::Throw(e) => {
                let text = format!("throw {};", self.expr(e, scope.vars));
                self.writeln(&text);
            }
            Stmt::Block(block) => {
                self.writeln("{");
                self.render_nested(block, scope);
                self.writeln("}");
            }
            Stmt::Label(label) => {
                self.indent_level = self.indent_level.saturating_sub(1);
                self.writeln(&format!("{}:", scope.labels.name(*label)));
                self.indent_level += 1;
            }
            Stmt::Goto { label, cond } => {
                let target = scope.labels.name(*label);
                let text = match cond {
                    Some(cond) => format!("if ({}) goto {};", self.expr(cond, scope.vars), target),
                    None => format!("goto {};", target),
                };
                self.writeln(&text);
            }
        }
    }

    /// `if`, continuing on the current line, with `else if` chains.
    fn render_if(&mut self, stmt: &Stmt, scope: &Scope<'_>) {
        let Stmt::If {
            cond,
            then_block,
            else_block,
        } = stmt
        else {
            return;
        };
        let text = format!("if ({}) {{", self.expr(cond, scope.vars));
        self.raw(&text);
        self.newline();
        self.render_nested(then_block, scope);
        match else_block.as_slice() {
            [] => self.writeln("}"),
            [nested @ Stmt::If { .. }] => {
                self.write_indent();
                self.raw("} else ");
                self.render_if(nested, scope);
            }
            _ => {
                self.writeln("} else {");
                self.render_nested(else_block, scope);
                self.writeln("}");
            }
        }
    }

    fn render_nested(&mut self, block: &Block, scope: &Scope<'_>) {
        self.indent_level += 1;
        self.render_stmts(block, scope);
        self.indent_level -= 1;
    }

    // ---- Expressions ----

    fn expr(&self, expr: &Expr, vars: &VarTable) -> String {
        match expr {
            Expr::Literal(lit) => self.literal(lit),
            Expr::Var(id) => vars.name(*id).to_string(),
            Expr::This => "this".into(),
            Expr::Super => "super".into(),
            Expr::OuterThis(outer) => format!("{}.this", self.class_ref(outer)),
            Expr::Field { object, field } => {
                format!("{}.{}", self.operand(object, PREC_PRIMARY, vars), field.name)
            }
            Expr::StaticField(field) => format!("{}.{}", self.class_ref(&field.owner), field.name),
            Expr::ArrayElement { array, index, .. } => format!(
                "{}[{}]",
                self.operand(array, PREC_PRIMARY, vars),
                self.expr(index, vars)
            ),
            Expr::ArrayLength(array) => format!("{}.length", self.operand(array, PREC_PRIMARY, vars)),
            Expr::Unary { op, operand, .. } => {
                let symbol = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                };
                let mut inner = self.operand(operand, PREC_UNARY, vars);
                if inner.starts_with('-') {
                    inner = format!("({})", inner);
                }
                format!("{}{}", symbol, inner)
            }
            Expr::Binary { op, left, right, .. } => {
                let prec = binary_precedence(*op);
                format!(
                    "{} {} {}",
                    self.operand(left, prec, vars),
                    op.as_str(),
                    self.operand(right, prec + 1, vars)
                )
            }
            Expr::Compare { op, left, right } => {
                let prec = compare_precedence(*op);
                format!(
                    "{} {} {}",
                    self.operand(left, prec, vars),
                    op.as_str(),
                    self.operand(right, prec + 1, vars)
                )
            }
            Expr::Compare3 { kind, left, right } => {
                let owner = match kind {
                    CmpKind::LCmp => "Long",
                    CmpKind::FCmpL | CmpKind::FCmpG => "Float",
                    CmpKind::DCmpL | CmpKind::DCmpG => "Double",
                };
                format!(
                    "{}.compare({}, {})",
                    owner,
                    self.expr(left, vars),
                    self.expr(right, vars)
                )
            }
            Expr::Cast { ty, operand } => {
                format!("({}) {}", self.type_name(ty), self.operand(operand, PREC_UNARY, vars))
            }
            Expr::InstanceOf { operand, ty } => format!(
                "{} instanceof {}",
                self.operand(operand, PREC_RELATIONAL, vars),
                self.type_name(ty)
            ),
            Expr::Call {
                receiver,
                method,
                args,
                ..
            } => {
                let target = match receiver {
                    Some(receiver) => self.operand(receiver, PREC_PRIMARY, vars),
                    None => self.class_ref(&method.owner),
                };
                format!("{}.{}({})", target, method.name, self.args(args, vars))
            }
            Expr::Alloc(class) => format!("new {}", self.class_ref(class)),
            Expr::ConstructorCall { receiver, args, .. } => match **receiver {
                Expr::This => format!("this({})", self.args(args, vars)),
                Expr::Super => format!("super({})", self.args(args, vars)),
                ref other => format!(
                    "{}.<init>({})",
                    self.operand(other, PREC_PRIMARY, vars),
                    self.args(args, vars)
                ),
            },
            Expr::New { method, args } => {
                format!("new {}({})", self.class_ref(&method.owner), self.args(args, vars))
            }
            Expr::NewArray { ty, dims } => {
                let mut element = ty;
                let mut depth = 0;
                while let JvmType::Array(inner) = element {
                    element = inner;
                    depth += 1;
                }
                let mut text = format!("new {}", self.type_name(element));
                for dim in dims {
                    let _ = write!(text, "[{}]", self.expr(dim, vars));
                }
                for _ in dims.len()..depth {
                    text.push_str("[]");
                }
                text
            }
            Expr::Assign { target, value } => format!(
                "{} = {}",
                self.operand(target, PREC_PRIMARY, vars),
                self.operand(value, PREC_ASSIGN, vars)
            ),
            Expr::Paren(inner) => format!("({})", self.expr(inner, vars)),
        }
    }

    /// Render `expr`, parenthesized if it binds looser than `min`.
    fn operand(&self, expr: &Expr, min: u8, vars: &VarTable) -> String {
        let text = self.expr(expr, vars);
        if precedence(expr) < min && !matches!(expr, Expr::Paren(_)) {
            format!("({})", text)
        } else {
            text
        }
    }

    fn args(&self, args: &[Expr], vars: &VarTable) -> String {
        args.iter()
            .map(|a| self.expr(a, vars))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn literal(&self, lit: &Literal) -> String {
        match lit {
            Literal::Int(v) => v.to_string(),
            Literal::Long(v) => format!("{}L", v),
            Literal::Float(v) => {
                if v.is_nan() {
                    "Float.NaN".into()
                } else if v.is_infinite() {
                    if *v > 0.0 { "Float.POSITIVE_INFINITY".into() } else { "Float.NEGATIVE_INFINITY".into() }
                } else {
                    format!("{}f", v)
                }
            }
            Literal::Double(v) => {
                if v.is_nan() {
                    "Double.NaN".into()
                } else if v.is_infinite() {
                    if *v > 0.0 { "Double.POSITIVE_INFINITY".into() } else { "Double.NEGATIVE_INFINITY".into() }
                } else {
                    format!("{}d", v)
                }
            }
            Literal::Boolean(b) => b.to_string(),
            Literal::String(s) => format!("\"{}\"", escape_java_string(s)),
            Literal::Class(ty) => format!("{}.class", self.type_name(ty)),
            Literal::Null => "null".into(),
        }
    }

    fn type_name(&self, ty: &JvmType) -> String {
        ty.source_name(self.config.use_simple_names)
    }

    fn class_ref(&self, internal: &str) -> String {
        if self.config.use_simple_names {
            descriptor::nested_simple_name(internal)
        } else {
            descriptor::internal_to_source_name(internal)
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str(&self.config.indent);
        }
    }

    fn writeln(&mut self, text: &str) {
        self.write_indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    fn raw(&mut self, text: &str) {
        self.output.push_str(text);
    }
}

fn jump(keyword: &str, label: Option<LabelId>, scope: &Scope<'_>) -> String {
    match label {
        Some(label) => format!("{} {};", keyword, scope.labels.name(label)),
        None => format!("{};", keyword),
    }
}

/// The name a class is declared with: the part after the last `$` for
/// nested classes.
fn declared_name(internal: &str) -> String {
    let simple = descriptor::simple_class_name(internal);
    simple.rsplit('$').next().unwrap_or(simple).to_string()
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Literal(Literal::Int(v)) if *v < 0 => PREC_UNARY,
        Expr::Literal(Literal::Long(v)) if *v < 0 => PREC_UNARY,
        Expr::Unary { .. } | Expr::Cast { .. } => PREC_UNARY,
        Expr::Binary { op, .. } => binary_precedence(*op),
        Expr::Compare { op, .. } => compare_precedence(*op),
        Expr::InstanceOf { .. } => PREC_RELATIONAL,
        Expr::Assign { .. } => PREC_ASSIGN,
        // `new T` must be parenthesized before a member access.
        Expr::Alloc(_) | Expr::New { .. } | Expr::NewArray { .. } => PREC_UNARY,
        _ => PREC_PRIMARY,
    }
}

fn binary_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Mul | BinOp::Div | BinOp::Rem => PREC_MULTIPLICATIVE,
        BinOp::Add | BinOp::Sub => PREC_ADDITIVE,
        BinOp::Shl | BinOp::Shr | BinOp::Ushr => PREC_SHIFT,
        BinOp::And => PREC_AND,
        BinOp::Xor => PREC_XOR,
        BinOp::Or => PREC_OR,
        BinOp::CondAnd => PREC_COND_AND,
        BinOp::CondOr => PREC_COND_OR,
    }
}

fn compare_precedence(op: CompareOp) -> u8 {
    match op {
        CompareOp::Eq | CompareOp::Ne => PREC_EQUALITY,
        _ => PREC_RELATIONAL,
    }
}

fn escape_java_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
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
