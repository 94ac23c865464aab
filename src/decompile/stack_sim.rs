//! Abstract interpretation of a method's bytecode into a flat statement list.
//!
//! The operand stack holds expressions instead of values. Instructions that
//! consume operands build bigger expressions; instructions with effects emit
//! statements. Jumps become [`Stmt::Goto`] and jump targets [`Stmt::Label`],
//! which the structurer turns into nested control flow afterwards.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::code_attribute::{
    Address, ArithOp, ArrayKind, CmpKind, Code, CompareOp, Constant, Conversion, Instruction, InvokeKind,
    LocalKind, MemberRef, NumKind,
};
use crate::types::ClassDefinition;

use super::cfg::{self, JumpTargets};
use super::descriptor::*;
use super::error::{DecompileError, Result};
use super::expr::*;
use super::java_ast::{LabelId, LabelTable, VarId, VarTable, VariableDecl};
use super::resolve::ClassCache;
use super::structured_types::{Block, Stmt};
use super::visit;

/// What the interpreter needs to know about the method being translated.
pub struct MethodContext<'a> {
    pub class: &'a ClassDefinition,
    pub cache: &'a ClassCache,
    pub is_static: bool,
    pub return_type: JvmType,
    /// Parameter declarations in order, `this` excluded.
    pub parameters: &'a [VarId],
}

/// Translate `code` into a flat block of statements, labels and gotos.
///
/// New locals and temporaries are added to `vars`, one label per jump target
/// to `labels`.
pub fn translate(
    code: &Code,
    ctx: &MethodContext<'_>,
    vars: &mut VarTable,
    labels: &mut LabelTable,
) -> Result<Block> {
    let jumps = cfg::discover(code, labels)?;
    let mut interp = Interpreter::new(ctx, vars, jumps, code.max_locals);

    let instrs = &code.instructions;
    for (idx, addressed) in instrs.iter().enumerate() {
        if !interp.jumps.reachable[idx] {
            trace!(address = addressed.address, "skipping unreachable instruction");
            continue;
        }
        interp.address = addressed.address;
        if let Some(label) = interp.jumps.label_at(addressed.address) {
            let falls_through = idx == 0 || (interp.jumps.reachable[idx - 1] && !instrs[idx - 1].instruction.ends_flow());
            interp.enter_label(label, falls_through)?;
        }
        interp.step(&addressed.instruction)?;
    }

    interp.finish_types();
    debug!(
        instructions = instrs.len(),
        statements = interp.out.len(),
        "translated bytecode"
    );
    Ok(interp.out)
}

/// The variable a local slot currently resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Local {
    This,
    Var(VarId),
}

struct Interpreter<'a, 'c> {
    ctx: &'a MethodContext<'c>,
    vars: &'a mut VarTable,
    jumps: JumpTargets,
    locals: FxHashMap<(u16, LocalKind), Local>,
    stack: Vec<Expr>,
    out: Block,
    /// Stack shape recorded for each label the first time control reaches it.
    label_shapes: FxHashMap<LabelId, Vec<JvmType>>,
    merge_temps: FxHashMap<(LabelId, usize), VarId>,
    next_temp: u32,
    max_locals: u16,
    address: Address,
}

impl<'a, 'c> Interpreter<'a, 'c> {
    fn new(ctx: &'a MethodContext<'c>, vars: &'a mut VarTable, jumps: JumpTargets, max_locals: u16) -> Self {
        let mut locals = FxHashMap::default();
        let mut slot: u16 = 0;
        if !ctx.is_static {
            locals.insert((0, LocalKind::Reference), Local::This);
            slot = 1;
        }
        for &param in ctx.parameters {
            let ty = vars.ty(param).clone();
            locals.insert((slot, local_kind_of(&ty)), Local::Var(param));
            slot += if ty.is_wide() { 2 } else { 1 };
        }
        Self {
            ctx,
            vars,
            jumps,
            locals,
            stack: Vec::new(),
            out: Vec::new(),
            label_shapes: FxHashMap::default(),
            merge_temps: FxHashMap::default(),
            next_temp: 0,
            max_locals,
            address: 0,
        }
    }

    // ---- Stack helpers ----

    fn pop(&mut self) -> Result<Expr> {
        self.stack
            .pop()
            .ok_or(DecompileError::StackUnderflow { address: self.address })
    }

    /// Pop `n` call arguments; returns them in declaration order.
    fn pop_args(&mut self, param_types: &[JvmType]) -> Result<Vec<Expr>> {
        let mut args = Vec::with_capacity(param_types.len());
        for ty in param_types.iter().rev() {
            let arg = self.pop()?;
            args.push(coerce_to(arg, ty));
        }
        args.reverse();
        Ok(args)
    }

    /// Pop whole values until exactly `words` stack words are taken. Returns
    /// them bottom first.
    fn take_words(&mut self, words: usize) -> Result<Vec<Expr>> {
        let mut taken = Vec::new();
        let mut count = 0;
        while count < words {
            let value = self.pop()?;
            count += if self.type_of(&value).is_wide() { 2 } else { 1 };
            taken.push(value);
        }
        if count != words {
            return Err(self.mismatch("instruction splits a category-2 value"));
        }
        taken.reverse();
        Ok(taken)
    }

    fn type_of(&self, expr: &Expr) -> JvmType {
        match expr {
            Expr::This => JvmType::class(self.ctx.class.name.clone()),
            Expr::Super => match &self.ctx.class.super_name {
                Some(name) => JvmType::class(name.clone()),
                None => JvmType::object(),
            },
            Expr::Paren(inner) => self.type_of(inner),
            other => other.ty(&*self.vars),
        }
    }

    fn mismatch(&self, detail: impl Into<String>) -> DecompileError {
        DecompileError::StackMismatch {
            address: self.address,
            detail: detail.into(),
        }
    }

    // ---- Variables ----

    fn new_temp(&mut self, ty: JvmType) -> VarId {
        let name = format!("var{}", self.max_locals as u32 + self.next_temp);
        self.next_temp += 1;
        self.vars.add(VariableDecl {
            ty,
            name,
            synthetic: true,
            parameter: false,
            is_final: false,
            slot: None,
        })
    }

    fn local_for_load(&self, slot: u16, kind: LocalKind) -> Result<Expr> {
        match self.locals.get(&(slot, kind)) {
            Some(Local::This) => Ok(Expr::This),
            Some(Local::Var(id)) => Ok(Expr::Var(*id)),
            None => Err(DecompileError::LocalReadBeforeStore {
                address: self.address,
                slot,
                kind,
            }),
        }
    }

    /// The declaration a store to (slot, kind) writes, created on first use.
    fn local_for_store(&mut self, slot: u16, kind: LocalKind, value_ty: &JvmType) -> VarId {
        if let Some(Local::Var(id)) = self.locals.get(&(slot, kind)) {
            let id = *id;
            if *self.vars.ty(id) == JvmType::Null && value_ty.is_reference() {
                self.vars.get_mut(id).ty = value_ty.clone();
            }
            return id;
        }
        let ty = match kind {
            LocalKind::Int if value_ty.is_int_like() => value_ty.clone(),
            LocalKind::Int => JvmType::Int,
            LocalKind::Long => JvmType::Long,
            LocalKind::Float => JvmType::Float,
            LocalKind::Double => JvmType::Double,
            LocalKind::Reference => match value_ty {
                JvmType::Unknown => JvmType::object(),
                other => other.clone(),
            },
        };
        let id = self.vars.add(VariableDecl {
            ty,
            name: format!("var{}", slot),
            synthetic: false,
            parameter: false,
            is_final: false,
            slot: Some(slot),
        });
        self.locals.insert((slot, kind), Local::Var(id));
        id
    }

    /// Replace leftover `null` types with `Object`.
    fn finish_types(&mut self) {
        let ids: Vec<VarId> = self.vars.ids().collect();
        for id in ids {
            if *self.vars.ty(id) == JvmType::Null {
                self.vars.get_mut(id).ty = JvmType::object();
            }
        }
    }

    // ---- Statement emission ----

    /// Move stack entry `i` into a fresh temporary. Impure entries below it
    /// are spilled first so evaluation order is kept.
    fn spill_at(&mut self, i: usize) {
        let value = self.stack[i].clone();
        if !value.is_pure() {
            for j in 0..i {
                if !self.stack[j].is_pure() {
                    self.spill_at(j);
                }
            }
        }
        let ty = match self.type_of(&value) {
            JvmType::Unknown => JvmType::object(),
            other => other,
        };
        let temp = self.new_temp(ty);
        self.out.push(Stmt::Expr(Expr::assign(Expr::Var(temp), value)));
        self.stack[i] = Expr::Var(temp);
    }

    /// Emit a statement. Stack entries the statement could invalidate are
    /// spilled first: entries reading `writes`, and impure entries when the
    /// statement has side effects.
    fn emit(&mut self, stmt: Stmt, writes: Option<VarId>, side_effects: bool) {
        for i in 0..self.stack.len() {
            let entry = &self.stack[i];
            let reads_written = writes.map_or(false, |v| visit::reads_var(entry, v));
            if reads_written || (side_effects && !entry.is_pure()) {
                self.spill_at(i);
            }
        }
        self.out.push(stmt);
    }

    fn store_local(&mut self, kind: LocalKind, slot: u16) -> Result<()> {
        let value = self.pop()?;
        let value_ty = self.type_of(&value);
        if kind == LocalKind::Reference && slot == 0 && !self.ctx.is_static {
            // `this` slot reused for something else
            self.locals.remove(&(0, LocalKind::Reference));
        }
        let var = self.local_for_store(slot, kind, &value_ty);
        let side_effects = !value.is_pure();
        let value = coerce_to(value, &self.vars.ty(var).clone());
        self.emit(
            Stmt::Expr(Expr::assign(Expr::Var(var), value)),
            Some(var),
            side_effects,
        );
        Ok(())
    }

    // ---- Control flow ----

    fn temp_for(&mut self, label: LabelId, slot: usize, ty: &JvmType) -> VarId {
        if let Some(id) = self.merge_temps.get(&(label, slot)) {
            return *id;
        }
        let id = self.new_temp(ty.clone());
        self.merge_temps.insert((label, slot), id);
        id
    }

    /// Record or check the stack shape at `label` and assign the current
    /// stack into the label's merge temporaries.
    fn flow_to(&mut self, label: LabelId) -> Result<()> {
        let shape: Vec<JvmType> = self.stack.iter().map(|e| self.type_of(e)).collect();
        match self.label_shapes.get(&label).cloned() {
            Some(existing) => {
                if existing.len() != shape.len() {
                    return Err(self.mismatch(format!(
                        "stack depth {} does not match depth {} at join point",
                        shape.len(),
                        existing.len()
                    )));
                }
                for (slot, (have, want)) in shape.iter().zip(existing.iter()).enumerate() {
                    if !compatible(have, want) {
                        return Err(self.mismatch(format!(
                            "slot {} holds {} where {} was expected",
                            slot,
                            have.source_name(false),
                            want.source_name(false)
                        )));
                    }
                    if *want == JvmType::Null && have.is_reference() && *have != JvmType::Null {
                        let temp = self.temp_for(label, slot, want);
                        self.vars.get_mut(temp).ty = have.clone();
                        if let Some(recorded) = self.label_shapes.get_mut(&label) {
                            recorded[slot] = have.clone();
                        }
                    }
                }
            }
            None => {
                self.label_shapes.insert(label, shape.clone());
            }
        }
        if shape.is_empty() {
            return Ok(());
        }

        let temps: Vec<VarId> = shape
            .iter()
            .enumerate()
            .map(|(slot, ty)| self.temp_for(label, slot, ty))
            .collect();
        // An entry reading a temporary that an earlier assignment overwrites
        // has to be evaluated first.
        let reassigned: Vec<usize> = (0..temps.len())
            .filter(|&slot| self.stack[slot] != Expr::Var(temps[slot]))
            .collect();
        for i in 0..self.stack.len() {
            let conflicts = reassigned
                .iter()
                .take_while(|&&k| k < i)
                .any(|&k| visit::reads_var(&self.stack[i], temps[k]));
            if conflicts {
                self.spill_at(i);
            }
        }
        for (slot, temp) in temps.iter().enumerate() {
            if self.stack[slot] == Expr::Var(*temp) {
                continue;
            }
            let value = self.stack[slot].clone();
            self.out.push(Stmt::Expr(Expr::assign(Expr::Var(*temp), value)));
        }
        Ok(())
    }

    fn label_for(&self, target: Address) -> Result<LabelId> {
        self.jumps.label_at(target).ok_or(DecompileError::UnknownJumpTarget {
            address: self.address,
            target,
        })
    }

    fn enter_label(&mut self, label: LabelId, falls_through: bool) -> Result<()> {
        if falls_through {
            self.flow_to(label)?;
        } else if !self.stack.is_empty() {
            return Err(self.mismatch("values left on the stack after an unconditional jump"));
        }
        self.out.push(Stmt::Label(label));
        let shape = self.label_shapes.entry(label).or_default().clone();
        self.stack = (0..shape.len())
            .map(|slot| {
                let temp = self.temp_for(label, slot, &shape[slot]);
                Expr::Var(temp)
            })
            .collect();
        Ok(())
    }

    fn goto(&mut self, target: Address) -> Result<()> {
        let label = self.label_for(target)?;
        self.flow_to(label)?;
        self.out.push(Stmt::Goto { label, cond: None });
        self.stack.clear();
        Ok(())
    }

    fn branch(&mut self, cond: Expr, target: Address) -> Result<()> {
        let label = self.label_for(target)?;
        let mut cond = cond;
        if !self.stack.is_empty() {
            let reads_temp = self
                .merge_temps
                .iter()
                .any(|((l, _), t)| *l == label && visit::reads_var(&cond, *t));
            if reads_temp {
                for i in 0..self.stack.len() {
                    if !self.stack[i].is_simple_value() {
                        self.spill_at(i);
                    }
                }
                let ty = self.type_of(&cond);
                let temp = self.new_temp(ty);
                self.out.push(Stmt::Expr(Expr::assign(Expr::Var(temp), cond)));
                cond = Expr::Var(temp);
            }
        }
        self.flow_to(label)?;
        self.out.push(Stmt::Goto {
            label,
            cond: Some(cond),
        });
        // The fall-through path continues with the merged values.
        let depth = self.stack.len();
        for slot in 0..depth {
            if let Some(temp) = self.merge_temps.get(&(label, slot)) {
                self.stack[slot] = Expr::Var(*temp);
            }
        }
        Ok(())
    }

    fn switch(&mut self, cases: Vec<(i32, Address)>, default: Address) -> Result<()> {
        let key = self.pop()?;
        for i in 0..self.stack.len() {
            if !self.stack[i].is_simple_value() {
                self.spill_at(i);
            }
        }
        let key = if key.is_simple_value() {
            key
        } else {
            self.stack.push(key);
            let top = self.stack.len() - 1;
            self.spill_at(top);
            self.pop()?
        };
        for (value, target) in cases {
            let label = self.label_for(target)?;
            self.flow_to(label)?;
            self.out.push(Stmt::Goto {
                label,
                cond: Some(Expr::compare(CompareOp::Eq, key.clone(), Expr::int(value))),
            });
        }
        self.goto(default)
    }

    /// Condition for `if<cond>`, which compares the popped value with zero.
    fn zero_condition(&self, value: Expr, op: CompareOp) -> Expr {
        match value {
            Expr::Compare3 { kind, left, right } => fold_compare(kind, op, *left, *right),
            value if self.type_of(&value) == JvmType::Boolean => match op {
                CompareOp::Eq => negate(value, &*self.vars),
                CompareOp::Ne => value,
                _ => Expr::compare(op, value, Expr::int(0)),
            },
            value => Expr::compare(op, value, Expr::int(0)),
        }
    }

    // ---- Members ----

    /// `this` as the receiver of a member of `owner`: `super` when the
    /// member belongs to the superclass and is hidden by the current class.
    fn field_receiver(&self, object: Expr, member: &MemberRef) -> Expr {
        if object == Expr::This
            && self.ctx.class.super_name.as_deref() == Some(member.owner.as_str())
            && self.ctx.class.find_field(&member.name).is_some()
        {
            Expr::Super
        } else {
            object
        }
    }

    fn invoke(&mut self, kind: InvokeKind, member: &MemberRef) -> Result<()> {
        let method = self
            .ctx
            .cache
            .method(&member.owner, &member.name, &member.descriptor, kind == InvokeKind::Static);
        let args = self.pop_args(&method.params)?;

        if method.is_constructor() {
            let receiver = self.pop()?;
            let stmt = match receiver {
                Expr::This => {
                    let receiver = if member.owner == self.ctx.class.name {
                        Expr::This
                    } else {
                        Expr::Super
                    };
                    Expr::ConstructorCall {
                        receiver: Box::new(receiver),
                        method,
                        args,
                    }
                }
                // Allocation consumed without `dup`: the object is discarded.
                Expr::Alloc(_) => Expr::New { method, args },
                other => Expr::ConstructorCall {
                    receiver: Box::new(other),
                    method,
                    args,
                },
            };
            self.emit(Stmt::Expr(stmt), None, true);
            return Ok(());
        }

        let receiver = if kind == InvokeKind::Static {
            None
        } else {
            let object = self.pop()?;
            let object = if kind == InvokeKind::Special && object == Expr::This && member.owner != self.ctx.class.name {
                Expr::Super
            } else {
                object
            };
            Some(Box::new(object))
        };
        let returns_void = method.returns_void();
        let call = Expr::Call {
            kind,
            receiver,
            method,
            args,
        };
        if returns_void {
            self.emit(Stmt::Expr(call), None, true);
        } else {
            self.stack.push(call);
        }
        Ok(())
    }

    // ---- Stack manipulation ----

    /// The `dup` family: duplicate the top `group` words below the `under`
    /// words beneath them.
    fn dup_family(&mut self, group: usize, under: usize) -> Result<()> {
        let dup = self.take_words(group)?;
        let below = self.take_words(under)?;
        let dup_len = dup.len();
        self.stack.extend(below);
        self.stack.extend(dup);
        let top = self.stack.len();
        for i in top - dup_len..top {
            if !self.stack[i].is_simple_value() {
                self.spill_at(i);
            }
        }
        let dup = self.take_words(group)?;
        let below = self.take_words(under)?;
        self.stack.extend(dup.iter().cloned());
        self.stack.extend(below);
        self.stack.extend(dup);
        Ok(())
    }

    fn discard(&mut self, value: Expr) {
        if value.has_side_effects() {
            self.emit(Stmt::Expr(value), None, true);
        }
    }

    // ---- The instruction dispatcher ----

    fn step(&mut self, instr: &Instruction) -> Result<()> {
        match instr {
            Instruction::Nop => {}

            // ============================================================
            // Constants
            // ============================================================
            Instruction::AconstNull => self.stack.push(Expr::null()),
            Instruction::Iconst(v) => self.stack.push(Expr::int(*v)),
            Instruction::Lconst(v) => self.stack.push(Expr::Literal(Literal::Long(*v))),
            Instruction::Fconst(v) => self.stack.push(Expr::Literal(Literal::Float(*v))),
            Instruction::Dconst(v) => self.stack.push(Expr::Literal(Literal::Double(*v))),
            Instruction::Ldc(constant) => {
                let lit = match constant {
                    Constant::Int(v) => Literal::Int(*v),
                    Constant::Float(v) => Literal::Float(*v),
                    Constant::Long(v) => Literal::Long(*v),
                    Constant::Double(v) => Literal::Double(*v),
                    Constant::String(s) => Literal::String(s.clone()),
                    Constant::Class(name) => Literal::Class(parse_class_operand(name)),
                };
                self.stack.push(Expr::Literal(lit));
            }

            // ============================================================
            // Locals
            // ============================================================
            Instruction::Load(kind, slot) => {
                let value = self.local_for_load(*slot, *kind)?;
                self.stack.push(value);
            }
            Instruction::Store(kind, slot) => self.store_local(*kind, *slot)?,
            Instruction::Iinc { index, value } => {
                let var = match self.local_for_load(*index, LocalKind::Int)? {
                    Expr::Var(id) => id,
                    _ => return Err(self.mismatch("iinc on a non-int local")),
                };
                let ty = self.vars.ty(var).clone();
                let (op, amount) = if *value < 0 {
                    (BinOp::Sub, -(*value as i32))
                } else {
                    (BinOp::Add, *value as i32)
                };
                let update = Expr::Binary {
                    op,
                    left: Box::new(Expr::Var(var)),
                    right: Box::new(Expr::int(amount)),
                    ty,
                };
                self.emit(Stmt::Expr(Expr::assign(Expr::Var(var), update)), Some(var), false);
            }

            // ============================================================
            // Arrays
            // ============================================================
            Instruction::ArrayLoad(kind) => {
                let index = self.pop()?;
                let array = self.pop()?;
                let ty = self.element_type(*kind, &array);
                self.stack.push(Expr::ArrayElement {
                    array: Box::new(array),
                    index: Box::new(index),
                    ty,
                });
            }
            Instruction::ArrayStore(kind) => {
                let value = self.pop()?;
                let index = self.pop()?;
                let array = self.pop()?;
                let ty = self.element_type(*kind, &array);
                let value = coerce_to(value, &ty);
                let target = Expr::ArrayElement {
                    array: Box::new(array),
                    index: Box::new(index),
                    ty,
                };
                self.emit(Stmt::Expr(Expr::assign(target, value)), None, true);
            }
            Instruction::ArrayLength => {
                let array = self.pop()?;
                self.stack.push(Expr::ArrayLength(Box::new(array)));
            }
            Instruction::Newarray(atype) => {
                let length = self.pop()?;
                self.stack.push(Expr::NewArray {
                    ty: JvmType::array_of(newarray_type(*atype)),
                    dims: vec![length],
                });
            }
            Instruction::Anewarray(class) => {
                let length = self.pop()?;
                self.stack.push(Expr::NewArray {
                    ty: JvmType::array_of(parse_class_operand(class)),
                    dims: vec![length],
                });
            }
            Instruction::Multianewarray { array_type, dimensions } => {
                let mut dims = Vec::with_capacity(*dimensions as usize);
                for _ in 0..*dimensions {
                    dims.push(self.pop()?);
                }
                dims.reverse();
                self.stack.push(Expr::NewArray {
                    ty: parse_type_descriptor(array_type).unwrap_or(JvmType::Unknown),
                    dims,
                });
            }

            // ============================================================
            // Stack manipulation
            // ============================================================
            Instruction::Pop => {
                for value in self.take_words(1)? {
                    self.discard(value);
                }
            }
            Instruction::Pop2 => {
                for value in self.take_words(2)? {
                    self.discard(value);
                }
            }
            Instruction::Dup => self.dup_family(1, 0)?,
            Instruction::DupX1 => self.dup_family(1, 1)?,
            Instruction::DupX2 => self.dup_family(1, 2)?,
            Instruction::Dup2 => self.dup_family(2, 0)?,
            Instruction::Dup2X1 => self.dup_family(2, 1)?,
            Instruction::Dup2X2 => self.dup_family(2, 2)?,
            Instruction::Swap => {
                let pair = self.take_words(2)?;
                if pair.len() != 2 {
                    return Err(self.mismatch("swap of a category-2 value"));
                }
                self.stack.extend(pair);
                let top = self.stack.len();
                for i in top - 2..top {
                    if !self.stack[i].is_pure() {
                        self.spill_at(i);
                    }
                }
                let b = self.pop()?;
                let a = self.pop()?;
                self.stack.push(b);
                self.stack.push(a);
            }

            // ============================================================
            // Arithmetic
            // ============================================================
            Instruction::Arith(op, kind) => {
                let right = self.pop()?;
                let left = self.pop()?;
                let op = bin_op(*op);
                let ty = if matches!(op, BinOp::And | BinOp::Or | BinOp::Xor)
                    && self.type_of(&left) == JvmType::Boolean
                    && self.type_of(&right) == JvmType::Boolean
                {
                    JvmType::Boolean
                } else {
                    num_type(*kind)
                };
                self.stack.push(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    ty,
                });
            }
            Instruction::Neg(kind) => {
                let operand = self.pop()?;
                self.stack.push(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    ty: num_type(*kind),
                });
            }
            Instruction::Convert(conversion) => {
                let operand = self.pop()?;
                self.stack.push(Expr::Cast {
                    ty: conversion_target(*conversion),
                    operand: Box::new(operand),
                });
            }
            Instruction::Compare(kind) => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.stack.push(Expr::Compare3 {
                    kind: *kind,
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }

            // ============================================================
            // Branches
            // ============================================================
            Instruction::If(op, target) => {
                let value = self.pop()?;
                let cond = self.zero_condition(value, *op);
                self.branch(cond, *target)?;
            }
            Instruction::IfICmp(op, target) => {
                let right = self.pop()?;
                let left = self.pop()?;
                let left_ty = self.type_of(&left);
                let right_ty = self.type_of(&right);
                let cond = Expr::compare(*op, coerce_to(left, &right_ty), coerce_to(right, &left_ty));
                self.branch(cond, *target)?;
            }
            Instruction::IfACmp(op, target) => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.branch(Expr::compare(*op, left, right), *target)?;
            }
            Instruction::IfNull(target) => {
                let value = self.pop()?;
                self.branch(Expr::compare(CompareOp::Eq, value, Expr::null()), *target)?;
            }
            Instruction::IfNonNull(target) => {
                let value = self.pop()?;
                self.branch(Expr::compare(CompareOp::Ne, value, Expr::null()), *target)?;
            }
            Instruction::Goto(target) => self.goto(*target)?,
            Instruction::Tableswitch { default, low, targets } => {
                let cases = targets
                    .iter()
                    .enumerate()
                    .map(|(i, t)| (low.wrapping_add(i as i32), *t))
                    .collect();
                self.switch(cases, *default)?;
            }
            Instruction::Lookupswitch { default, pairs } => {
                self.switch(pairs.clone(), *default)?;
            }

            // ============================================================
            // Fields, methods, objects
            // ============================================================
            Instruction::GetField(member) => {
                let object = self.pop()?;
                let field = self.ctx.cache.field(&member.owner, &member.name, &member.descriptor, false);
                let object = self.field_receiver(object, member);
                self.stack.push(Expr::Field {
                    object: Box::new(object),
                    field,
                });
            }
            Instruction::PutField(member) => {
                let value = self.pop()?;
                let object = self.pop()?;
                let field = self.ctx.cache.field(&member.owner, &member.name, &member.descriptor, false);
                let object = self.field_receiver(object, member);
                let value = coerce_to(value, &field.ty);
                let target = Expr::Field {
                    object: Box::new(object),
                    field,
                };
                self.emit(Stmt::Expr(Expr::assign(target, value)), None, true);
            }
            Instruction::GetStatic(member) => {
                let field = self.ctx.cache.field(&member.owner, &member.name, &member.descriptor, true);
                self.stack.push(Expr::StaticField(field));
            }
            Instruction::PutStatic(member) => {
                let value = self.pop()?;
                let field = self.ctx.cache.field(&member.owner, &member.name, &member.descriptor, true);
                let value = coerce_to(value, &field.ty);
                self.emit(
                    Stmt::Expr(Expr::assign(Expr::StaticField(field), value)),
                    None,
                    true,
                );
            }
            Instruction::Invoke(kind, member) => self.invoke(*kind, member)?,
            Instruction::New(class) => self.stack.push(Expr::Alloc(class.clone())),
            Instruction::CheckCast(class) => {
                let operand = self.pop()?;
                self.stack.push(Expr::Cast {
                    ty: parse_class_operand(class),
                    operand: Box::new(operand),
                });
            }
            Instruction::InstanceOf(class) => {
                let operand = self.pop()?;
                self.stack.push(Expr::InstanceOf {
                    operand: Box::new(operand),
                    ty: parse_class_operand(class),
                });
            }

            // ============================================================
            // Exits
            // ============================================================
            Instruction::Return(None) => {
                self.ensure_empty_at_exit()?;
                self.out.push(Stmt::Return(None));
            }
            Instruction::Return(Some(_)) => {
                let value = self.pop()?;
                self.ensure_empty_at_exit()?;
                let value = coerce_to(value, &self.ctx.return_type);
                self.out.push(Stmt::Return(Some(value)));
            }
            Instruction::Athrow => {
                let value = self.pop()?;
                self.ensure_empty_at_exit()?;
                self.out.push(Stmt::Throw(value));
            }

            Instruction::InvokeDynamic { .. }
            | Instruction::MonitorEnter
            | Instruction::MonitorExit
            | Instruction::Jsr(_)
            | Instruction::Ret(_) => {
                return Err(DecompileError::UnsupportedOpcode {
                    address: self.address,
                    opcode: instr.mnemonic(),
                });
            }
        }
        Ok(())
    }

    fn ensure_empty_at_exit(&self) -> Result<()> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(DecompileError::StackNotEmptyAtExit {
                address: self.address,
                depth: self.stack.len(),
            })
        }
    }

    fn element_type(&self, kind: ArrayKind, array: &Expr) -> JvmType {
        let declared = self.type_of(array).element_type();
        match kind {
            ArrayKind::Int => JvmType::Int,
            ArrayKind::Long => JvmType::Long,
            ArrayKind::Float => JvmType::Float,
            ArrayKind::Double => JvmType::Double,
            ArrayKind::Char => JvmType::Char,
            ArrayKind::Short => JvmType::Short,
            ArrayKind::Byte if declared == JvmType::Boolean => JvmType::Boolean,
            ArrayKind::Byte => JvmType::Byte,
            ArrayKind::Reference => match declared {
                JvmType::Unknown => JvmType::object(),
                other => other,
            },
        }
    }
}

/// Fold a three-way compare tested against zero into a direct comparison.
///
/// `fcmpl`/`dcmpl` push -1 for NaN and `fcmpg`/`dcmpg` push 1, so only some
/// operators survive folding unchanged. The others become
/// `!(left <negated op> right)`, which is false for NaN exactly when the
/// unfolded test was.
pub fn fold_compare(kind: CmpKind, op: CompareOp, left: Expr, right: Expr) -> Expr {
    let exact = match kind.nan_result() {
        None => true,
        Some(nan) => op.holds(nan.cmp(&0)) == op_holds_on_nan(op),
    };
    if exact {
        Expr::compare(op, left, right)
    } else {
        Expr::not(Expr::compare(op.negate(), left, right))
    }
}

/// The outcome of `a <op> b` in Java when either side is NaN.
fn op_holds_on_nan(op: CompareOp) -> bool {
    op == CompareOp::Ne
}

fn compatible(a: &JvmType, b: &JvmType) -> bool {
    if a.is_int_like() && b.is_int_like() {
        return true;
    }
    let reference_like = |t: &JvmType| t.is_reference() || *t == JvmType::Unknown;
    if reference_like(a) && reference_like(b) {
        return true;
    }
    a == b
}

pub fn local_kind_of(ty: &JvmType) -> LocalKind {
    match ty {
        JvmType::Long => LocalKind::Long,
        JvmType::Float => LocalKind::Float,
        JvmType::Double => LocalKind::Double,
        t if t.is_int_like() => LocalKind::Int,
        _ => LocalKind::Reference,
    }
}

fn num_type(kind: NumKind) -> JvmType {
    match kind {
        NumKind::Int => JvmType::Int,
        NumKind::Long => JvmType::Long,
        NumKind::Float => JvmType::Float,
        NumKind::Double => JvmType::Double,
    }
}

fn bin_op(op: ArithOp) -> BinOp {
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

fn conversion_target(conversion: Conversion) -> JvmType {
    match conversion {
        Conversion::L2i | Conversion::F2i | Conversion::D2i => JvmType::Int,
        Conversion::I2l | Conversion::F2l | Conversion::D2l => JvmType::Long,
        Conversion::I2f | Conversion::L2f | Conversion::D2f => JvmType::Float,
        Conversion::I2d | Conversion::L2d | Conversion::F2d => JvmType::Double,
        Conversion::I2b => JvmType::Byte,
        Conversion::I2c => JvmType::Char,
        Conversion::I2s => JvmType::Short,
    }
}
