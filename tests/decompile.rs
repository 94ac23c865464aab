use std::collections::HashMap;

use classfile_decompiler::code_attribute::{
    ArithOp, Code, CompareOp, Instruction, InvokeKind, LocalKind, MemberRef, NumKind,
};
use classfile_decompiler::decompile::expr::{BinOp, Expr, Literal, UnaryOp};
use classfile_decompiler::decompile::java_ast::{JavaMethod, VarId};
use classfile_decompiler::decompile::structured_types::Stmt;
use classfile_decompiler::decompile::{
    cleanup, DecompileError, DecompileOptions, Decompiler, JavaRenderer, NoClasses, RenderConfig,
};
use classfile_decompiler::types::{
    ClassDefinition, FieldAccessFlags, FieldDefinition, MethodAccessFlags, MethodDefinition,
};

const CLASS: &str = "demo/Sample";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn static_method(name: &str, descriptor: &str, max_locals: u16, code: Vec<Instruction>) -> MethodDefinition {
    MethodDefinition::new(
        name,
        descriptor,
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        Some(Code::sequential(max_locals, code)),
    )
}

fn class_with(name: &str, methods: Vec<MethodDefinition>) -> ClassDefinition {
    let mut class = ClassDefinition::new(name, Some("java/lang/Object"));
    class.methods = methods;
    class
}

fn decompiler() -> Decompiler {
    Decompiler::new(DecompileOptions::default(), NoClasses)
}

fn try_decompile(descriptor: &str, max_locals: u16, code: Vec<Instruction>) -> Result<JavaMethod, DecompileError> {
    init_tracing();
    let class = class_with(CLASS, vec![static_method("f", descriptor, max_locals, code)]);
    decompiler().decompile_method(&class, "f", descriptor)
}

fn decompile(descriptor: &str, max_locals: u16, code: Vec<Instruction>) -> JavaMethod {
    try_decompile(descriptor, max_locals, code).unwrap()
}

fn body(method: &JavaMethod) -> &[Stmt] {
    &method.body.as_ref().unwrap().block
}

fn render(method: &JavaMethod) -> String {
    JavaRenderer::new(RenderConfig::default()).render_method(method, "Sample")
}

fn contains_jumps(block: &[Stmt]) -> bool {
    block.iter().any(|stmt| match stmt {
        Stmt::Label(_) | Stmt::Goto { .. } => true,
        Stmt::If {
            then_block,
            else_block,
            ..
        } => contains_jumps(then_block) || contains_jumps(else_block),
        Stmt::While { body, .. } | Stmt::Block(body) => contains_jumps(body),
        _ => false,
    })
}

#[test]
fn test_constant_arithmetic() {
    let method = decompile(
        "()I",
        0,
        vec![
            Instruction::Iconst(1),
            Instruction::Iconst(2),
            Instruction::Arith(ArithOp::Add, NumKind::Int),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    assert_eq!(
        body(&method),
        &[Stmt::Return(Some(Expr::Binary {
            op: BinOp::Add,
            left: Box::new(Expr::int(1)),
            right: Box::new(Expr::int(2)),
            ty: classfile_decompiler::decompile::descriptor::JvmType::Int,
        }))]
    );
    assert_eq!(render(&method), "public static int f() {\n    return 1 + 2;\n}\n");
}

#[test]
fn test_arithmetic_local_is_not_inlined() {
    let method = decompile(
        "()I",
        1,
        vec![
            Instruction::Iconst(1),
            Instruction::Iconst(2),
            Instruction::Arith(ArithOp::Add, NumKind::Int),
            Instruction::Store(LocalKind::Int, 0),
            Instruction::Load(LocalKind::Int, 0),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    assert_eq!(
        render(&method),
        "public static int f() {\n    int var0 = 1 + 2;\n    return var0;\n}\n"
    );
}

#[test]
fn test_single_use_literal_is_inlined() {
    let method = decompile(
        "()I",
        1,
        vec![
            Instruction::Iconst(5),
            Instruction::Store(LocalKind::Int, 0),
            Instruction::Load(LocalKind::Int, 0),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    assert_eq!(render(&method), "public static int f() {\n    return 5;\n}\n");
}

#[test]
fn test_forward_branch_becomes_if() {
    let method = decompile(
        "(I)I",
        2,
        vec![
            Instruction::Iconst(0),
            Instruction::Store(LocalKind::Int, 1),
            Instruction::Load(LocalKind::Int, 0),
            Instruction::If(CompareOp::Eq, 6),
            Instruction::Iconst(1),
            Instruction::Store(LocalKind::Int, 1),
            Instruction::Load(LocalKind::Int, 1),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    assert!(!contains_jumps(body(&method)));
    assert_eq!(
        render(&method),
        "public static int f(int param0) {\n    int var1 = 0;\n    if (param0 != 0) {\n        var1 = 1;\n    }\n    return var1;\n}\n"
    );
}

#[test]
fn test_top_tested_loop() {
    let method = decompile(
        "(I)I",
        1,
        vec![
            Instruction::Load(LocalKind::Int, 0),
            Instruction::If(CompareOp::Le, 4),
            Instruction::Iinc { index: 0, value: -1 },
            Instruction::Goto(0),
            Instruction::Load(LocalKind::Int, 0),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    assert_eq!(
        render(&method),
        "public static int f(int param0) {\n    while (param0 > 0) {\n        param0 = param0 - 1;\n    }\n    return param0;\n}\n"
    );
}

#[test]
fn test_bottom_tested_loop() {
    let method = decompile(
        "(I)I",
        2,
        vec![
            Instruction::Iconst(0),
            Instruction::Store(LocalKind::Int, 1),
            Instruction::Iinc { index: 1, value: 2 },
            Instruction::Iinc { index: 0, value: -1 },
            Instruction::Load(LocalKind::Int, 0),
            Instruction::If(CompareOp::Gt, 2),
            Instruction::Load(LocalKind::Int, 1),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    let block = body(&method);
    assert!(!contains_jumps(block));
    assert!(block.iter().any(|s| matches!(s, Stmt::While { .. })));
    assert_eq!(
        render(&method),
        "public static int f(int param0) {\n    int var1 = 0;\n    while (true) {\n        var1 = var1 + 2;\n        param0 = param0 - 1;\n        if (param0 <= 0) {\n            break;\n        }\n    }\n    return var1;\n}\n"
    );
}

#[test]
fn test_loop_entered_at_its_test() {
    let method = decompile(
        "(I)I",
        1,
        vec![
            Instruction::Goto(2),
            Instruction::Iinc { index: 0, value: -1 },
            Instruction::Load(LocalKind::Int, 0),
            Instruction::If(CompareOp::Gt, 1),
            Instruction::Load(LocalKind::Int, 0),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    assert!(!contains_jumps(body(&method)));
    assert_eq!(
        render(&method),
        "public static int f(int param0) {\n    while (param0 > 0) {\n        param0 = param0 - 1;\n    }\n    return param0;\n}\n"
    );
}

#[test]
fn test_short_circuit_and_becomes_if_else() {
    let method = decompile(
        "(II)I",
        3,
        vec![
            Instruction::Load(LocalKind::Int, 0),
            Instruction::If(CompareOp::Eq, 7),
            Instruction::Load(LocalKind::Int, 1),
            Instruction::If(CompareOp::Eq, 7),
            Instruction::Iconst(1),
            Instruction::Store(LocalKind::Int, 2),
            Instruction::Goto(9),
            Instruction::Iconst(2),
            Instruction::Store(LocalKind::Int, 2),
            Instruction::Load(LocalKind::Int, 2),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    assert!(!body(&method).iter().any(|s| matches!(s, Stmt::While { .. })));
    assert_eq!(
        render(&method),
        "public static int f(int param0, int param1) {\n    int var2;\n    if (param0 != 0 && param1 != 0) {\n        var2 = 1;\n    } else {\n        var2 = 2;\n    }\n    return var2;\n}\n"
    );
}

#[test]
fn test_tableswitch_becomes_else_if_chain() {
    let method = decompile(
        "(I)I",
        2,
        vec![
            Instruction::Load(LocalKind::Int, 0),
            Instruction::Tableswitch {
                default: 8,
                low: 1,
                targets: vec![2, 5],
            },
            Instruction::Iconst(10),
            Instruction::Store(LocalKind::Int, 1),
            Instruction::Goto(10),
            Instruction::Iconst(20),
            Instruction::Store(LocalKind::Int, 1),
            Instruction::Goto(10),
            Instruction::Iconst(0),
            Instruction::Store(LocalKind::Int, 1),
            Instruction::Load(LocalKind::Int, 1),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    assert!(!contains_jumps(body(&method)));
    assert_eq!(
        render(&method),
        "public static int f(int param0) {\n    int var1;\n    if (param0 == 1) {\n        var1 = 10;\n    } else if (param0 == 2) {\n        var1 = 20;\n    } else {\n        var1 = 0;\n    }\n    return var1;\n}\n"
    );
}

#[test]
fn test_empty_branch_keeps_its_condition_call() {
    let mut method = decompile(
        "()V",
        1,
        vec![
            Instruction::Invoke(InvokeKind::Static, MemberRef::new("t/A", "foo", "()Z")),
            Instruction::If(CompareOp::Eq, 4),
            Instruction::Iconst(1),
            Instruction::Store(LocalKind::Int, 0),
            Instruction::Return(None),
        ],
    );
    let before = body(&method).to_vec();
    assert!(matches!(before.first(), Some(Stmt::Expr(Expr::Call { .. }))));
    assert!(!before.iter().any(|s| matches!(s, Stmt::If { .. })));

    let mut block = before.clone();
    assert_eq!(cleanup::run_pipeline(&mut block, &mut method.vars, 16), 1);
    assert_eq!(block, before);
}

#[test]
fn test_local_assigned_in_both_branches() {
    let method = decompile(
        "(I)I",
        2,
        vec![
            Instruction::Load(LocalKind::Int, 0),
            Instruction::If(CompareOp::Eq, 5),
            Instruction::Iconst(1),
            Instruction::Store(LocalKind::Int, 1),
            Instruction::Goto(7),
            Instruction::Iconst(2),
            Instruction::Store(LocalKind::Int, 1),
            Instruction::Load(LocalKind::Int, 1),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    let block = body(&method);
    let Stmt::Declare { var, init: None } = &block[0] else {
        panic!("expected a declaration without initializer, got {:?}", block[0]);
    };
    assert_eq!(block[2], Stmt::Return(Some(Expr::Var(*var))));
    assert_eq!(
        render(&method),
        "public static int f(int param0) {\n    int var1;\n    if (param0 != 0) {\n        var1 = 1;\n    } else {\n        var1 = 2;\n    }\n    return var1;\n}\n"
    );
}

#[test]
fn test_constructor_fused_with_allocation() {
    let method = decompile(
        "()Lt/Foo;",
        2,
        vec![
            Instruction::New("t/Foo".into()),
            Instruction::Dup,
            Instruction::Invoke(InvokeKind::Special, MemberRef::new("t/Foo", "<init>", "()V")),
            Instruction::Store(LocalKind::Reference, 1),
            Instruction::Load(LocalKind::Reference, 1),
            Instruction::Return(Some(LocalKind::Reference)),
        ],
    );
    let block = body(&method);
    assert!(matches!(&block[0], Stmt::Declare { init: Some(Expr::New { .. }), .. }));
    assert!(render(&method).contains("    Foo var1 = new Foo();\n"));
}

#[test]
fn test_unresolved_calls_are_kept() {
    let method = decompile(
        "(Lext/Thing;)I",
        1,
        vec![
            Instruction::Load(LocalKind::Reference, 0),
            Instruction::Invoke(InvokeKind::Virtual, MemberRef::new("ext/Thing", "size", "()I")),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    );
    let [Stmt::Return(Some(Expr::Call { receiver, method: callee, .. }))] = body(&method) else {
        panic!("expected a returned call, got {:?}", body(&method));
    };
    assert!(!callee.resolved);
    assert_eq!(callee.owner, "ext/Thing");
    assert_eq!(receiver.as_deref(), Some(&Expr::Var(method.parameters[0])));

    let method = decompile(
        "()V",
        0,
        vec![
            Instruction::Iconst(5),
            Instruction::Invoke(InvokeKind::Static, MemberRef::new("ext/Lib", "run", "(I)V")),
            Instruction::Return(None),
        ],
    );
    let block = body(&method);
    let Stmt::Expr(Expr::Call { receiver: None, method: callee, args, .. }) = &block[0] else {
        panic!("expected a static call, got {:?}", block[0]);
    };
    assert!(!callee.resolved);
    assert_eq!(args, &vec![Expr::int(5)]);
}

/// Evaluate straight-line int bytecode directly.
fn run_bytecode(code: &[Instruction], args: &[i32], max_locals: usize) -> i32 {
    let mut locals = vec![0i32; max_locals];
    locals[..args.len()].copy_from_slice(args);
    let mut stack: Vec<i32> = Vec::new();
    for instruction in code {
        match instruction {
            Instruction::Iconst(v) => stack.push(*v),
            Instruction::Load(LocalKind::Int, slot) => stack.push(locals[*slot as usize]),
            Instruction::Store(LocalKind::Int, slot) => locals[*slot as usize] = stack.pop().unwrap(),
            Instruction::Iinc { index, value } => {
                let slot = *index as usize;
                locals[slot] = locals[slot].wrapping_add(*value as i32);
            }
            Instruction::Dup => {
                let top = *stack.last().unwrap();
                stack.push(top);
            }
            Instruction::Swap => {
                let n = stack.len();
                stack.swap(n - 1, n - 2);
            }
            Instruction::Neg(NumKind::Int) => {
                let v = stack.pop().unwrap();
                stack.push(v.wrapping_neg());
            }
            Instruction::Arith(op, NumKind::Int) => {
                let b = stack.pop().unwrap();
                let a = stack.pop().unwrap();
                stack.push(int_op(arith_to_binop(*op), a, b));
            }
            Instruction::Return(Some(LocalKind::Int)) => return stack.pop().unwrap(),
            other => panic!("unsupported instruction {:?}", other),
        }
    }
    panic!("fell off the end")
}

fn arith_to_binop(op: ArithOp) -> BinOp {
    match op {
        ArithOp::Add => BinOp::Add,
        ArithOp::Sub => BinOp::Sub,
        ArithOp::Mul => BinOp::Mul,
        ArithOp::Div => BinOp::Div,
        ArithOp::Rem => BinOp::Rem,
        ArithOp::Shl => BinOp::Shl,
        ArithOp::Shr => BinOp::Shr,
        ArithOp::Ushr => BinOp::Ushr,
        ArithOp::And => BinOp::And,
        ArithOp::Or => BinOp::Or,
        ArithOp::Xor => BinOp::Xor,
    }
}

fn int_op(op: BinOp, a: i32, b: i32) -> i32 {
    match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div => a.wrapping_div(b),
        BinOp::Rem => a.wrapping_rem(b),
        BinOp::Shl => a.wrapping_shl(b as u32),
        BinOp::Shr => a.wrapping_shr(b as u32),
        BinOp::Ushr => ((a as u32).wrapping_shr(b as u32)) as i32,
        BinOp::And => a & b,
        BinOp::Or => a | b,
        BinOp::Xor => a ^ b,
        other => panic!("not an int operator: {:?}", other),
    }
}

fn eval_expr(expr: &Expr, env: &HashMap<VarId, i32>) -> i32 {
    match expr {
        Expr::Literal(Literal::Int(v)) => *v,
        Expr::Var(var) => env[var],
        Expr::Paren(inner) => eval_expr(inner, env),
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
            ..
        } => eval_expr(operand, env).wrapping_neg(),
        Expr::Binary { op, left, right, .. } => int_op(*op, eval_expr(left, env), eval_expr(right, env)),
        other => panic!("unexpected expression {:?}", other),
    }
}

/// Evaluate a decompiled straight-line body.
fn run_ast(method: &JavaMethod, args: &[i32]) -> i32 {
    let mut env: HashMap<VarId, i32> = method.parameters.iter().copied().zip(args.iter().copied()).collect();
    for stmt in body(method) {
        match stmt {
            Stmt::Declare { init: None, .. } => {}
            Stmt::Declare { var, init: Some(value) } => {
                let v = eval_expr(value, &env);
                env.insert(*var, v);
            }
            Stmt::Expr(Expr::Assign { target, value }) => {
                let Expr::Var(var) = **target else {
                    panic!("unexpected assignment target {:?}", target);
                };
                let v = eval_expr(value, &env);
                env.insert(var, v);
            }
            Stmt::Return(Some(value)) => return eval_expr(value, &env),
            other => panic!("unexpected statement {:?}", other),
        }
    }
    panic!("no return")
}

#[test]
fn test_straight_line_arithmetic_is_preserved() {
    let code = vec![
        Instruction::Load(LocalKind::Int, 0),
        Instruction::Load(LocalKind::Int, 1),
        Instruction::Arith(ArithOp::Add, NumKind::Int),
        Instruction::Dup,
        Instruction::Store(LocalKind::Int, 2),
        Instruction::Load(LocalKind::Int, 0),
        Instruction::Arith(ArithOp::Mul, NumKind::Int),
        Instruction::Iinc { index: 2, value: 5 },
        Instruction::Load(LocalKind::Int, 2),
        Instruction::Swap,
        Instruction::Arith(ArithOp::Sub, NumKind::Int),
        Instruction::Iconst(3),
        Instruction::Arith(ArithOp::Shl, NumKind::Int),
        Instruction::Load(LocalKind::Int, 1),
        Instruction::Arith(ArithOp::Xor, NumKind::Int),
        Instruction::Iconst(7),
        Instruction::Arith(ArithOp::Rem, NumKind::Int),
        Instruction::Load(LocalKind::Int, 0),
        Instruction::Iconst(2),
        Instruction::Arith(ArithOp::Ushr, NumKind::Int),
        Instruction::Arith(ArithOp::Or, NumKind::Int),
        Instruction::Neg(NumKind::Int),
        Instruction::Return(Some(LocalKind::Int)),
    ];
    let method = decompile("(II)I", 3, code.clone());

    let inputs = [
        (0, 0),
        (1, 2),
        (-7, 13),
        (i32::MAX, 1),
        (i32::MIN, -1),
        (123_456, -98_765),
    ];
    for (a, b) in inputs {
        assert_eq!(
            run_ast(&method, &[a, b]),
            run_bytecode(&code, &[a, b], 3),
            "inputs ({}, {})",
            a,
            b
        );
    }
}

#[test]
fn test_cleanup_is_idempotent() {
    let code = vec![
        Instruction::Iconst(0),
        Instruction::Store(LocalKind::Int, 1),
        Instruction::Load(LocalKind::Int, 0),
        Instruction::If(CompareOp::Eq, 6),
        Instruction::Iconst(1),
        Instruction::Store(LocalKind::Int, 1),
        Instruction::Load(LocalKind::Int, 1),
        Instruction::Return(Some(LocalKind::Int)),
    ];
    let mut method = decompile("(I)I", 2, code);
    let before = body(&method).to_vec();

    let mut block = before.clone();
    let rounds = cleanup::run_pipeline(&mut block, &mut method.vars, 16);
    assert_eq!(rounds, 1);
    assert_eq!(block, before);
}

#[test]
fn test_stack_errors() {
    let err = try_decompile("()V", 0, vec![Instruction::Iconst(1), Instruction::Return(None)]).unwrap_err();
    assert!(matches!(err, DecompileError::StackNotEmptyAtExit { .. }));

    let err = try_decompile(
        "()I",
        0,
        vec![
            Instruction::Arith(ArithOp::Add, NumKind::Int),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, DecompileError::StackUnderflow { .. }));

    let err = try_decompile(
        "()I",
        2,
        vec![
            Instruction::Load(LocalKind::Int, 1),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, DecompileError::LocalReadBeforeStore { slot: 1, .. }));

    let err = try_decompile(
        "(I)I",
        1,
        vec![
            Instruction::Load(LocalKind::Int, 0),
            Instruction::If(CompareOp::Eq, 3),
            Instruction::Iconst(1),
            Instruction::Iconst(2),
            Instruction::Return(Some(LocalKind::Int)),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, DecompileError::StackMismatch { .. }));
    assert!(err.to_string().starts_with("decompilation not possible: "));
}

#[test]
fn test_jump_into_loop_is_irreducible() {
    init_tracing();
    let code = vec![
        Instruction::Load(LocalKind::Int, 0),
        Instruction::If(CompareOp::Eq, 3),
        Instruction::Iinc { index: 0, value: 1 },
        Instruction::Iinc { index: 0, value: 2 },
        Instruction::Load(LocalKind::Int, 0),
        Instruction::If(CompareOp::Lt, 2),
        Instruction::Return(None),
    ];
    let class = class_with(CLASS, vec![static_method("f", "(I)V", 1, code)]);
    let decompiler = decompiler();

    let err = decompiler.decompile_method(&class, "f", "(I)V").unwrap_err();
    assert!(matches!(err, DecompileError::IrreducibleControlFlow { .. }));

    // The class still decompiles; the method keeps its signature.
    let java = decompiler.decompile_class(&class).unwrap();
    let method = java.method("f").unwrap();
    assert!(method.body.is_none());
    let report = method.error.as_deref().unwrap();
    assert!(report.starts_with("Decompilation failed for method 'f(I)V'"));
    assert!(report.contains("0005: if(lt, 2)"));
}

#[test]
fn test_inner_class_unit() {
    init_tracing();
    let outer = ClassDefinition::new("a/Outer", Some("java/lang/Object"));

    let mut inner = ClassDefinition::new("a/Outer$Inner", Some("java/lang/Object"));
    inner.fields.push(FieldDefinition::new(
        "this$0",
        "La/Outer;",
        FieldAccessFlags::FINAL | FieldAccessFlags::SYNTHETIC,
    ));
    inner.methods.push(MethodDefinition::new(
        "<init>",
        "(La/Outer;)V",
        MethodAccessFlags::empty(),
        Some(Code::sequential(
            2,
            vec![
                Instruction::Load(LocalKind::Reference, 0),
                Instruction::Load(LocalKind::Reference, 1),
                Instruction::PutField(MemberRef::new("a/Outer$Inner", "this$0", "La/Outer;")),
                Instruction::Load(LocalKind::Reference, 0),
                Instruction::Invoke(InvokeKind::Special, MemberRef::new("java/lang/Object", "<init>", "()V")),
                Instruction::Return(None),
            ],
        )),
    ));
    inner.methods.push(MethodDefinition::new(
        "get",
        "()La/Outer;",
        MethodAccessFlags::PUBLIC,
        Some(Code::sequential(
            1,
            vec![
                Instruction::Load(LocalKind::Reference, 0),
                Instruction::GetField(MemberRef::new("a/Outer$Inner", "this$0", "La/Outer;")),
                Instruction::Return(Some(LocalKind::Reference)),
            ],
        )),
    ));

    let decompiler = decompiler();
    let unit = decompiler.decompile_unit(&outer, &[inner]).unwrap();
    assert!(unit.imports.is_empty());
    assert_eq!(
        decompiler.render_unit(&unit),
        "package a;\n\npublic class Outer {\n    public class Inner {\n        Inner() {\n            super();\n        }\n\n        public Outer get() {\n            return Outer.this;\n        }\n    }\n}\n"
    );
}

#[test]
fn test_parallel_decompilation_shares_one_decompiler() {
    init_tracing();
    let classes: Vec<ClassDefinition> = (0..8)
        .map(|i| {
            class_with(
                &format!("demo/Worker{}", i),
                vec![static_method(
                    "f",
                    "()I",
                    0,
                    vec![
                        Instruction::Iconst(i),
                        Instruction::Iconst(2),
                        Instruction::Arith(ArithOp::Mul, NumKind::Int),
                        Instruction::Return(Some(LocalKind::Int)),
                    ],
                )],
            )
        })
        .collect();
    let decompiler = &decompiler();

    let outputs: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = classes
            .iter()
            .map(|class| scope.spawn(move || decompiler.decompile(class).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, source) in outputs.iter().enumerate() {
        assert!(source.contains(&format!("public class Worker{} {{", i)), "{}", source);
        assert!(source.contains(&format!("return {} * 2;", i)), "{}", source);
    }
}
