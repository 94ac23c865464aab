use std::collections::BTreeSet;

use crate::types::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

use super::descriptor::JvmType;
use super::expr::Expr;
use super::structured_types::Block;

/// Handle of a variable declaration in a method's [`VarTable`].
///
/// Two handles are equal only if they name the same declaration, even when
/// name, type and slot agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a label in a method's [`LabelTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(u32);

impl LabelId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDecl {
    pub ty: JvmType,
    pub name: String,
    /// Introduced by the decompiler (stack spill, merge temporary).
    pub synthetic: bool,
    pub parameter: bool,
    pub is_final: bool,
    /// Local variable slot the declaration was created for.
    pub slot: Option<u16>,
}

/// Arena of the variable declarations of one method.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VarTable {
    vars: Vec<VariableDecl>,
}

impl VarTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, decl: VariableDecl) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(decl);
        id
    }

    pub fn get(&self, id: VarId) -> &VariableDecl {
        &self.vars[id.index()]
    }

    pub fn get_mut(&mut self, id: VarId) -> &mut VariableDecl {
        &mut self.vars[id.index()]
    }

    pub fn ty(&self, id: VarId) -> &JvmType {
        &self.vars[id.index()].ty
    }

    pub fn name(&self, id: VarId) -> &str {
        &self.vars[id.index()].name
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = VarId> {
        (0..self.vars.len() as u32).map(VarId)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelDecl {
    pub name: String,
}

/// Arena of the labels of one method.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelTable {
    labels: Vec<LabelDecl>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>) -> LabelId {
        let id = LabelId(self.labels.len() as u32);
        self.labels.push(LabelDecl { name: name.into() });
        id
    }

    /// A label named `label{n}` after its handle.
    pub fn fresh(&mut self) -> LabelId {
        let name = format!("label{}", self.labels.len());
        self.add(name)
    }

    pub fn name(&self, id: LabelId) -> &str {
        &self.labels[id.index()].name
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A decompiled method body.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodBody {
    pub block: Block,
    pub labels: LabelTable,
}

/// Visibility level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    PackagePrivate,
    Private,
}

impl Visibility {
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Visibility::Public => Some("public"),
            Visibility::Protected => Some("protected"),
            Visibility::PackagePrivate => None,
            Visibility::Private => Some("private"),
        }
    }

    pub fn of_method(flags: MethodAccessFlags) -> Self {
        if flags.contains(MethodAccessFlags::PUBLIC) {
            Visibility::Public
        } else if flags.contains(MethodAccessFlags::PROTECTED) {
            Visibility::Protected
        } else if flags.contains(MethodAccessFlags::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::PackagePrivate
        }
    }

    pub fn of_field(flags: FieldAccessFlags) -> Self {
        if flags.contains(FieldAccessFlags::PUBLIC) {
            Visibility::Public
        } else if flags.contains(FieldAccessFlags::PROTECTED) {
            Visibility::Protected
        } else if flags.contains(FieldAccessFlags::PRIVATE) {
            Visibility::Private
        } else {
            Visibility::PackagePrivate
        }
    }
}

/// A Java method declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct JavaMethod {
    pub name: String,
    pub descriptor: String,
    pub access: MethodAccessFlags,
    pub return_type: JvmType,
    /// Owns the parameter declarations and, once decompiled, every local.
    pub vars: VarTable,
    /// Parameters in declaration order, `this` excluded.
    pub parameters: Vec<VarId>,
    pub exceptions: Vec<String>,
    pub body: Option<MethodBody>,
    /// If decompilation failed, this holds the error message.
    pub error: Option<String>,
}

impl JavaMethod {
    pub fn is_static(&self) -> bool {
        self.access.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == "<clinit>"
    }

    pub fn is_synthetic(&self) -> bool {
        self.access.contains(MethodAccessFlags::SYNTHETIC)
    }
}

/// A Java field declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct JavaField {
    pub name: String,
    pub ty: JvmType,
    pub access: FieldAccessFlags,
    pub initializer: Option<Expr>,
}

impl JavaField {
    pub fn is_static(&self) -> bool {
        self.access.contains(FieldAccessFlags::STATIC)
    }

    pub fn is_synthetic(&self) -> bool {
        self.access.contains(FieldAccessFlags::SYNTHETIC)
    }
}

/// A Java class or interface.
#[derive(Clone, Debug, PartialEq)]
pub struct JavaClass {
    /// Internal name, `a/b/Outer$Inner`.
    pub name: String,
    pub package: Option<String>,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub access: ClassAccessFlags,
    /// Set for inner classes whose outer instance was reconstructed.
    pub outer_class: Option<String>,
    pub is_static: bool,
    pub fields: Vec<JavaField>,
    pub methods: Vec<JavaMethod>,
    pub inner_classes: Vec<JavaClass>,
}

impl JavaClass {
    pub fn method(&self, name: &str) -> Option<&JavaMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut JavaMethod> {
        self.methods.iter_mut().find(|m| m.name == name)
    }

    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassAccessFlags::INTERFACE)
    }
}

/// One source file: a top-level class with its nested classes.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilationUnit {
    /// Dotted package name.
    pub package: Option<String>,
    /// Internal names of imported classes, sorted.
    pub imports: BTreeSet<String>,
    pub classes: Vec<JavaClass>,
}
