//! Class and member declarations without method bodies.

use crate::types::{ClassDefinition, FieldDefinition, MethodDefinition};

use super::descriptor::{self, parse_method_descriptor, parse_type_descriptor, JvmType, OBJECT_CLASS};
use super::java_ast::*;

/// Build the declaration shell of `class`: header, fields and methods with
/// their parameter declarations. Synthetic members are dropped unless
/// `include_synthetic` is set.
pub fn build_java_class(class: &ClassDefinition, include_synthetic: bool) -> JavaClass {
    let fields = class
        .fields
        .iter()
        .map(build_java_field)
        .filter(|f| include_synthetic || !f.is_synthetic() || is_outer_reference(&f.name))
        .collect();

    let methods = class
        .methods
        .iter()
        .map(build_java_method)
        .filter(|m| include_synthetic || !m.is_synthetic())
        .collect();

    JavaClass {
        name: class.name.clone(),
        package: descriptor::package_name(&class.name).map(|p| p.replace('/', ".")),
        super_class: class
            .super_name
            .clone()
            .filter(|name| name != OBJECT_CLASS),
        interfaces: class.interfaces.clone(),
        access: class.access_flags,
        outer_class: None,
        is_static: false,
        fields,
        methods,
        inner_classes: Vec::new(),
    }
}

pub fn build_java_field(field: &FieldDefinition) -> JavaField {
    JavaField {
        name: field.name.clone(),
        ty: parse_type_descriptor(&field.descriptor).unwrap_or(JvmType::Unknown),
        access: field.access_flags,
        initializer: None,
    }
}

/// Method declaration with one `param{i}` declaration per descriptor
/// parameter. Slots start after `this` for instance methods, and `long` and
/// `double` parameters take two.
pub fn build_java_method(method: &MethodDefinition) -> JavaMethod {
    let (params, return_type) =
        parse_method_descriptor(&method.descriptor).unwrap_or((Vec::new(), JvmType::Unknown));

    let mut vars = VarTable::new();
    let mut parameters = Vec::with_capacity(params.len());
    let mut slot: u16 = if method.is_static() { 0 } else { 1 };
    for (i, ty) in params.into_iter().enumerate() {
        let width = if ty.is_wide() { 2 } else { 1 };
        let id = vars.add(VariableDecl {
            ty,
            name: format!("param{}", i),
            synthetic: false,
            parameter: true,
            is_final: false,
            slot: Some(slot),
        });
        parameters.push(id);
        slot += width;
    }

    JavaMethod {
        name: method.name.clone(),
        descriptor: method.descriptor.clone(),
        access: method.access_flags,
        return_type,
        vars,
        parameters,
        exceptions: method.exceptions.clone(),
        body: None,
        error: None,
    }
}

/// `this$0`, `this$1`, ...: the field javac stores the enclosing instance in.
pub fn is_outer_reference(field_name: &str) -> bool {
    field_name
        .strip_prefix("this$")
        .map_or(false, |n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
