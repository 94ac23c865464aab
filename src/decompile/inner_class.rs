//! Outer-instance reconstruction for inner classes.
//!
//! javac gives every non-static inner class a synthetic `this$N` field and
//! passes the enclosing instance as the first constructor argument. Both
//! are hidden again here, and reads of the field turn into `Outer.this`.

use tracing::debug;

use super::error::{DecompileError, Result};
use super::expr::Expr;
use super::java_ast::{JavaClass, JavaMethod, VarId};
use super::skeleton::is_outer_reference;
use super::structured_types::Stmt;
use super::visit::{for_each_root_expr_mut, replace_var_reads, walk_expr_mut};

/// Rewrite `class`, nested in `outer`, to refer to its enclosing instance
/// as `Outer.this`.
///
/// Without a `this$N` field the class is taken to be static. Methods whose
/// translation failed are left alone.
pub fn reconstruct(class: &mut JavaClass, outer: &str) -> Result<()> {
    class.outer_class = Some(outer.to_string());

    let Some(index) = class
        .fields
        .iter()
        .position(|f| f.is_synthetic() && !f.is_static() && is_outer_reference(&f.name))
    else {
        class.is_static = true;
        return Ok(());
    };

    let field_name = class.fields[index].name.clone();
    if class.fields[index].ty.class_name() != Some(outer) {
        return Err(bad_shape(
            class,
            format!("{} does not hold an instance of {}", field_name, outer),
        ));
    }

    for method in class.methods.iter_mut().filter(|m| m.is_constructor()) {
        hide_outer_parameter(method, &class.name, &field_name, outer)?;
    }

    for method in &mut class.methods {
        let Some(body) = method.body.as_mut() else { continue };
        for_each_root_expr_mut(&mut body.block, &mut |root| {
            walk_expr_mut(root, &mut |e| {
                if is_outer_field_read(e, &field_name) {
                    *e = Expr::OuterThis(outer.to_string());
                }
            })
        });
    }

    class.fields.remove(index);
    class.is_static = false;
    debug!(class = %class.name, outer, field = %field_name, "reconstructed outer instance");
    Ok(())
}

/// Mark the constructor's leading outer-instance parameter synthetic, drop
/// the store into `field_name`, and turn remaining reads of the parameter
/// into `Outer.this`.
fn hide_outer_parameter(method: &mut JavaMethod, class: &str, field_name: &str, outer: &str) -> Result<()> {
    let Some(&param) = method.parameters.first() else {
        return Err(DecompileError::BadInnerClassShape {
            class: class.to_string(),
            reason: format!("constructor {} takes no outer instance", method.descriptor),
        });
    };
    if method.vars.ty(param).class_name() != Some(outer) {
        return Err(DecompileError::BadInnerClassShape {
            class: class.to_string(),
            reason: format!(
                "first parameter of constructor {} is not {}",
                method.descriptor, outer
            ),
        });
    }
    method.vars.get_mut(param).synthetic = true;

    let Some(body) = method.body.as_mut() else {
        return Ok(());
    };
    let Some(store) = body
        .block
        .iter()
        .position(|stmt| is_outer_store(stmt, field_name, param))
    else {
        return Err(DecompileError::BadInnerClassShape {
            class: class.to_string(),
            reason: format!(
                "constructor {} does not store its outer instance into {}",
                method.descriptor, field_name
            ),
        });
    };
    body.block.remove(store);

    for_each_root_expr_mut(&mut body.block, &mut |root| {
        replace_var_reads(root, &mut |v| (v == param).then(|| Expr::OuterThis(outer.to_string())));
    });
    Ok(())
}

fn is_outer_store(stmt: &Stmt, field_name: &str, param: VarId) -> bool {
    match stmt {
        Stmt::Expr(Expr::Assign { target, value }) => {
            is_outer_field_read(target, field_name) && value.as_var() == Some(param)
        }
        _ => false,
    }
}

fn is_outer_field_read(expr: &Expr, field_name: &str) -> bool {
    matches!(expr, Expr::Field { object, field } if **object == Expr::This && field.name == field_name)
}

fn bad_shape(class: &JavaClass, reason: String) -> DecompileError {
    DecompileError::BadInnerClassShape {
        class: class.name.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::decompile::descriptor::JvmType;
    use crate::decompile::java_ast::{LabelTable, MethodBody};
    use crate::decompile::resolve::{FieldDescription, MethodDescription};
    use crate::decompile::skeleton::build_java_class;
    use crate::types::{ClassDefinition, FieldAccessFlags, FieldDefinition, MethodAccessFlags, MethodDefinition};

    const OUTER: &str = "a/Outer";
    const INNER: &str = "a/Outer$Inner";

    fn outer_field() -> Arc<FieldDescription> {
        Arc::new(FieldDescription {
            owner: INNER.into(),
            name: "this$0".into(),
            ty: JvmType::class(OUTER),
            is_static: false,
            resolved: true,
        })
    }

    fn inner_class(ctor_descriptor: &str) -> JavaClass {
        let mut def = ClassDefinition::new(INNER, Some("java/lang/Object"));
        def.fields.push(FieldDefinition::new(
            "this$0",
            "La/Outer;",
            FieldAccessFlags::FINAL | FieldAccessFlags::SYNTHETIC,
        ));
        def.methods.push(MethodDefinition::new("<init>", ctor_descriptor, MethodAccessFlags::empty(), None));
        def.methods.push(MethodDefinition::new("get", "()La/Outer;", MethodAccessFlags::PUBLIC, None));
        build_java_class(&def, false)
    }

    fn with_bodies(mut class: JavaClass) -> JavaClass {
        let param = class.methods[0].parameters[0];
        let object_init = Arc::new(MethodDescription::placeholder("java/lang/Object", "<init>", "()V", false));
        class.methods[0].body = Some(MethodBody {
            block: vec![
                Stmt::Expr(Expr::assign(
                    Expr::Field {
                        object: Box::new(Expr::This),
                        field: outer_field(),
                    },
                    Expr::Var(param),
                )),
                Stmt::Expr(Expr::ConstructorCall {
                    receiver: Box::new(Expr::Super),
                    method: object_init,
                    args: Vec::new(),
                }),
                Stmt::Return(None),
            ],
            labels: LabelTable::new(),
        });
        class.methods[1].body = Some(MethodBody {
            block: vec![Stmt::Return(Some(Expr::Field {
                object: Box::new(Expr::This),
                field: outer_field(),
            }))],
            labels: LabelTable::new(),
        });
        class
    }

    #[test]
    fn test_reconstructs_outer_this() {
        let mut class = with_bodies(inner_class("(La/Outer;)V"));
        reconstruct(&mut class, OUTER).unwrap();

        assert!(!class.is_static);
        assert_eq!(class.outer_class.as_deref(), Some(OUTER));
        assert!(class.fields.is_empty());

        let ctor = &class.methods[0];
        assert!(ctor.vars.get(ctor.parameters[0]).synthetic);
        let block = &ctor.body.as_ref().unwrap().block;
        assert_eq!(block.len(), 2);

        let getter = &class.methods[1].body.as_ref().unwrap().block;
        assert_eq!(getter[0], Stmt::Return(Some(Expr::OuterThis(OUTER.into()))));
    }

    #[test]
    fn test_wrong_first_parameter() {
        let mut class = with_bodies(inner_class("(Ljava/lang/String;)V"));
        let err = reconstruct(&mut class, OUTER).unwrap_err();
        assert!(matches!(err, DecompileError::BadInnerClassShape { .. }));
    }

    #[test]
    fn test_missing_store() {
        let mut class = with_bodies(inner_class("(La/Outer;)V"));
        class.methods[0].body.as_mut().unwrap().block.remove(0);
        let err = reconstruct(&mut class, OUTER).unwrap_err();
        assert!(err.to_string().contains("does not store"));
    }

    #[test]
    fn test_without_outer_field_is_static() {
        let def = ClassDefinition::new("a/Outer$Nested", Some("java/lang/Object"));
        let mut class = build_java_class(&def, false);
        reconstruct(&mut class, OUTER).unwrap();
        assert!(class.is_static);
        assert_eq!(class.outer_class.as_deref(), Some(OUTER));
    }
}
