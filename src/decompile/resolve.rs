//! Class and member resolution.
//!
//! The decompiler never reads class files itself. Metadata about referenced
//! classes comes from a [`ClassProvider`]; lookups are memoized in a
//! [`ClassCache`] that can be shared by threads decompiling different
//! classes. Members that cannot be found resolve to placeholder
//! descriptions built from the descriptor alone, so a missing dependency
//! never stops decompilation.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::types::{ClassAccessFlags, ClassDefinition, FieldAccessFlags, MethodAccessFlags};

use super::descriptor::{parse_method_descriptor, parse_type_descriptor, JvmType};

/// A field as seen from a use site.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescription {
    pub owner: String,
    pub name: String,
    pub ty: JvmType,
    pub is_static: bool,
    /// False for placeholders built from the use-site descriptor.
    pub resolved: bool,
}

impl FieldDescription {
    pub fn placeholder(owner: &str, name: &str, descriptor: &str, is_static: bool) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            ty: parse_type_descriptor(descriptor).unwrap_or(JvmType::Unknown),
            is_static,
            resolved: false,
        }
    }
}

/// A method as seen from a call site.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDescription {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    pub params: Vec<JvmType>,
    pub ret: JvmType,
    pub is_static: bool,
    pub resolved: bool,
}

impl MethodDescription {
    pub fn placeholder(owner: &str, name: &str, descriptor: &str, is_static: bool) -> Self {
        let (params, ret) = parse_method_descriptor(descriptor).unwrap_or((Vec::new(), JvmType::Unknown));
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            params,
            ret,
            is_static,
            resolved: false,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn returns_void(&self) -> bool {
        self.ret == JvmType::Void
    }
}

/// Metadata of one class, as needed for member resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassInfo {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub access: ClassAccessFlags,
    pub fields: Vec<Arc<FieldDescription>>,
    pub methods: Vec<Arc<MethodDescription>>,
}

impl ClassInfo {
    pub fn from_definition(class: &ClassDefinition) -> Self {
        let fields = class
            .fields
            .iter()
            .map(|f| {
                Arc::new(FieldDescription {
                    owner: class.name.clone(),
                    name: f.name.clone(),
                    ty: parse_type_descriptor(&f.descriptor).unwrap_or(JvmType::Unknown),
                    is_static: f.access_flags.contains(FieldAccessFlags::STATIC),
                    resolved: true,
                })
            })
            .collect();
        let methods = class
            .methods
            .iter()
            .map(|m| {
                let mut desc = MethodDescription::placeholder(
                    &class.name,
                    &m.name,
                    &m.descriptor,
                    m.access_flags.contains(MethodAccessFlags::STATIC),
                );
                desc.resolved = true;
                Arc::new(desc)
            })
            .collect();
        Self {
            name: class.name.clone(),
            super_name: class.super_name.clone(),
            interfaces: class.interfaces.clone(),
            access: class.access_flags,
            fields,
            methods,
        }
    }

    pub fn declared_field(&self, name: &str) -> Option<&Arc<FieldDescription>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn declared_method(&self, name: &str, descriptor: &str) -> Option<&Arc<MethodDescription>> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

/// Source of class metadata, typically backed by a class path.
pub trait ClassProvider: Send + Sync {
    /// Look up a class by internal name.
    fn find_class(&self, name: &str) -> Option<ClassInfo>;
}

/// A provider that knows no classes; every reference becomes a placeholder.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoClasses;

impl ClassProvider for NoClasses {
    fn find_class(&self, _name: &str) -> Option<ClassInfo> {
        None
    }
}

/// A fixed set of classes held in memory.
#[derive(Clone, Debug, Default)]
pub struct ClassSet {
    classes: FxHashMap<String, ClassInfo>,
}

impl ClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions<'a>(definitions: impl IntoIterator<Item = &'a ClassDefinition>) -> Self {
        let mut set = Self::new();
        for def in definitions {
            set.insert(ClassInfo::from_definition(def));
        }
        set
    }

    pub fn insert(&mut self, info: ClassInfo) {
        self.classes.insert(info.name.clone(), info);
    }
}

impl ClassProvider for ClassSet {
    fn find_class(&self, name: &str) -> Option<ClassInfo> {
        self.classes.get(name).cloned()
    }
}

/// Memoized, thread-safe view over a [`ClassProvider`].
///
/// Entries are computed once and never invalidated; a miss is remembered as
/// a miss.
pub struct ClassCache {
    provider: Box<dyn ClassProvider>,
    entries: RwLock<FxHashMap<String, Option<Arc<ClassInfo>>>>,
}

impl ClassCache {
    pub fn new(provider: impl ClassProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register a class directly, e.g. the one being decompiled. An existing
    /// entry wins.
    pub fn define(&self, class: &ClassDefinition) -> Arc<ClassInfo> {
        if let Some(Some(existing)) = self.entries.read().get(&class.name) {
            return Arc::clone(existing);
        }
        let info = Arc::new(ClassInfo::from_definition(class));
        let mut entries = self.entries.write();
        let slot = entries.entry(class.name.clone()).or_insert(None);
        if let Some(existing) = slot.as_ref() {
            return Arc::clone(existing);
        }
        *slot = Some(Arc::clone(&info));
        info
    }

    /// Look up a class, asking the provider at most once per name.
    pub fn class(&self, name: &str) -> Option<Arc<ClassInfo>> {
        if let Some(entry) = self.entries.read().get(name) {
            return entry.clone();
        }
        // The provider may block; call it without holding the lock.
        let found = self.provider.find_class(name).map(Arc::new);
        trace!(class = name, found = found.is_some(), "class lookup");
        let mut entries = self.entries.write();
        entries.entry(name.to_string()).or_insert(found).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// The class itself followed by its superclasses, nearest first. Stops at
    /// the first class the provider does not know.
    pub fn super_chain(&self, name: &str) -> Vec<Arc<ClassInfo>> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = Some(name.to_string());
        while let Some(class_name) = current {
            if !seen.insert(class_name.clone()) {
                break;
            }
            match self.class(&class_name) {
                Some(info) => {
                    current = info.super_name.clone();
                    chain.push(info);
                }
                None => break,
            }
        }
        chain
    }

    /// Resolve a field reference, searching superclasses and then
    /// superinterfaces.
    pub fn field(&self, owner: &str, name: &str, descriptor: &str, is_static: bool) -> Arc<FieldDescription> {
        let chain = self.super_chain(owner);
        for class in &chain {
            if let Some(field) = class.declared_field(name) {
                return Arc::clone(field);
            }
        }
        for class in &chain {
            if let Some(field) = self.interface_field(&class.interfaces, name, &mut FxHashSet::default()) {
                return field;
            }
        }
        Arc::new(FieldDescription::placeholder(owner, name, descriptor, is_static))
    }

    fn interface_field(
        &self,
        interfaces: &[String],
        name: &str,
        seen: &mut FxHashSet<String>,
    ) -> Option<Arc<FieldDescription>> {
        for iface in interfaces {
            if !seen.insert(iface.clone()) {
                continue;
            }
            if let Some(info) = self.class(iface) {
                if let Some(field) = info.declared_field(name) {
                    return Some(Arc::clone(field));
                }
                if let Some(field) = self.interface_field(&info.interfaces, name, seen) {
                    return Some(field);
                }
            }
        }
        None
    }

    /// Resolve a method reference, searching superclasses and then
    /// superinterfaces. The returned description always carries the owner
    /// named at the call site.
    pub fn method(&self, owner: &str, name: &str, descriptor: &str, is_static: bool) -> Arc<MethodDescription> {
        if owner.starts_with('[') {
            return Arc::new(MethodDescription::placeholder(owner, name, descriptor, is_static));
        }
        let chain = self.super_chain(owner);
        let mut found = chain
            .iter()
            .find_map(|class| class.declared_method(name, descriptor).cloned());
        if found.is_none() {
            let mut seen = FxHashSet::default();
            found = chain
                .iter()
                .find_map(|class| self.interface_method(&class.interfaces, name, descriptor, &mut seen));
        }
        match found {
            Some(method) if method.owner == owner => method,
            Some(method) => {
                let mut rebased = (*method).clone();
                rebased.owner = owner.to_string();
                Arc::new(rebased)
            }
            None => Arc::new(MethodDescription::placeholder(owner, name, descriptor, is_static)),
        }
    }

    fn interface_method(
        &self,
        interfaces: &[String],
        name: &str,
        descriptor: &str,
        seen: &mut FxHashSet<String>,
    ) -> Option<Arc<MethodDescription>> {
        for iface in interfaces {
            if !seen.insert(iface.clone()) {
                continue;
            }
            if let Some(info) = self.class(iface) {
                if let Some(method) = info.declared_method(name, descriptor) {
                    return Some(Arc::clone(method));
                }
                if let Some(method) = self.interface_method(&info.interfaces, name, descriptor, seen) {
                    return Some(method);
                }
            }
        }
        None
    }
}

impl std::fmt::Debug for ClassCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassCache").field("entries", &self.len()).finish()
    }
}
