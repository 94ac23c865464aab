use std::collections::BTreeSet;
use std::fmt::Write;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::code_attribute::Code;
use crate::types::{ClassDefinition, MethodDefinition};

use super::cleanup;
use super::descriptor::{self, JvmType};
use super::error::{DecompileError, Result};
use super::expr::{Expr, Literal};
use super::inner_class;
use super::java_ast::*;
use super::renderer::{JavaRenderer, RenderConfig};
use super::resolve::{ClassCache, ClassProvider};
use super::skeleton;
use super::stack_sim::{self, MethodContext};
use super::structured_types::{Block, Stmt};
use super::structuring;
use super::visit::{self, for_each_expr, for_each_stmt};

/// Instructions listed in the report of a failed method.
const REPORTED_INSTRUCTIONS: usize = 20;

/// Options controlling the decompilation process.
#[derive(Clone, Debug)]
pub struct DecompileOptions {
    pub render_config: RenderConfig,
    pub include_synthetic: bool,
    /// Run the cleanup pipeline after structuring.
    pub run_cleanup: bool,
    pub max_cleanup_rounds: usize,
    pub reconstruct_inner_classes: bool,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        Self {
            render_config: RenderConfig::default(),
            include_synthetic: false,
            run_cleanup: true,
            max_cleanup_rounds: 16,
            reconstruct_inner_classes: true,
        }
    }
}

/// The main decompiler entry point.
///
/// A `Decompiler` is `Send + Sync`; threads may decompile different classes
/// through one instance and share its class cache.
pub struct Decompiler {
    options: DecompileOptions,
    cache: Arc<ClassCache>,
}

impl Decompiler {
    pub fn new(options: DecompileOptions, provider: impl ClassProvider + 'static) -> Self {
        Self::with_cache(options, Arc::new(ClassCache::new(provider)))
    }

    /// Decompile through an existing cache, shared with other decompilers.
    pub fn with_cache(options: DecompileOptions, cache: Arc<ClassCache>) -> Self {
        Self { options, cache }
    }

    pub fn options(&self) -> &DecompileOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<ClassCache> {
        &self.cache
    }

    /// Decompile a class and render it as Java source.
    pub fn decompile(&self, class: &ClassDefinition) -> Result<String> {
        let java_class = self.decompile_class(class)?;
        Ok(self.renderer().render_class(&java_class))
    }

    /// Build the class AST, decompiling every method body.
    ///
    /// A method that cannot be decompiled keeps its declaration, with no body
    /// and the reason in [`JavaMethod::error`].
    pub fn decompile_class(&self, class: &ClassDefinition) -> Result<JavaClass> {
        self.cache.define(class);
        let mut java_class = skeleton::build_java_class(class, self.options.include_synthetic);

        for java_method in &mut java_class.methods {
            let Some(method) = class.find_method(&java_method.name, &java_method.descriptor) else {
                continue;
            };
            let Some(code) = &method.code else {
                continue;
            };
            if let Err(err) = self.decompile_body(class, code, java_method) {
                warn!(
                    class = %class.name,
                    method = %method.name,
                    descriptor = %method.descriptor,
                    error = %err,
                    "skipping method body"
                );
                *java_method = skeleton::build_java_method(method);
                java_method.error = Some(failure_report(method, code, &err));
            }
        }

        Ok(java_class)
    }

    /// Decompile a single method, failing if it cannot be decompiled.
    pub fn decompile_method(&self, class: &ClassDefinition, name: &str, descriptor: &str) -> Result<JavaMethod> {
        let method = class
            .find_method(name, descriptor)
            .ok_or_else(|| DecompileError::UnresolvedRequiredSymbol {
                symbol: format!("{}.{}{}", class.name, name, descriptor),
            })?;
        self.cache.define(class);

        let mut java_method = skeleton::build_java_method(method);
        if let Some(code) = &method.code {
            self.decompile_body(class, code, &mut java_method)?;
        }
        Ok(java_method)
    }

    /// Decompile a top-level class together with its nested classes into
    /// one compilation unit.
    ///
    /// `inner` may list classes at any depth; each is attached to the class
    /// its `$`-separated name says encloses it. Classes without an enclosing
    /// class in the unit are ignored.
    pub fn decompile_unit(&self, class: &ClassDefinition, inner: &[ClassDefinition]) -> Result<CompilationUnit> {
        for def in inner {
            self.cache.define(def);
        }
        let mut top = self.decompile_class(class)?;
        self.attach_inner_classes(&mut top, inner)?;

        let package = top.package.clone();
        let imports = collect_imports(&top);
        Ok(CompilationUnit {
            package,
            imports,
            classes: vec![top],
        })
    }

    /// Render a compilation unit with the configured renderer.
    pub fn render_unit(&self, unit: &CompilationUnit) -> String {
        self.renderer().render_unit(unit)
    }

    fn renderer(&self) -> JavaRenderer {
        let mut config = self.options.render_config.clone();
        config.include_synthetic = self.options.include_synthetic;
        JavaRenderer::new(config)
    }

    fn attach_inner_classes(&self, parent: &mut JavaClass, inner: &[ClassDefinition]) -> Result<()> {
        for def in inner
            .iter()
            .filter(|d| descriptor::outer_class_name(&d.name) == Some(parent.name.as_str()))
        {
            let mut nested = self.decompile_class(def)?;
            if self.options.reconstruct_inner_classes {
                inner_class::reconstruct(&mut nested, &parent.name)?;
            } else {
                nested.outer_class = Some(parent.name.clone());
            }
            self.attach_inner_classes(&mut nested, inner)?;
            parent.inner_classes.push(nested);
        }
        Ok(())
    }

    /// Run the pipeline on one method body: translation, structuring,
    /// cleanup and naming.
    fn decompile_body(&self, class: &ClassDefinition, code: &Code, method: &mut JavaMethod) -> Result<()> {
        let mut labels = LabelTable::new();
        let ctx = MethodContext {
            class,
            cache: &self.cache,
            is_static: method.is_static(),
            return_type: method.return_type.clone(),
            parameters: &method.parameters,
        };

        let flat = stack_sim::translate(code, &ctx, &mut method.vars, &mut labels)?;
        debug!(
            method = %method.name,
            instructions = code.instructions.len(),
            statements = flat.len(),
            "translated"
        );

        let mut block = structuring::structure(flat, &mut labels, &method.vars)?;
        if self.options.run_cleanup {
            let rounds = cleanup::run_pipeline(&mut block, &mut method.vars, self.options.max_cleanup_rounds);
            debug!(method = %method.name, rounds, "cleaned up");
        } else {
            declare_at_entry(&mut block, &method.vars);
        }
        make_names_unique(&block, method);

        method.body = Some(MethodBody { block, labels });
        method.error = None;
        Ok(())
    }
}

/// Without scope narrowing, declare every local at the top of the body.
fn declare_at_entry(block: &mut Block, vars: &VarTable) {
    let used = visit::count_uses(block);
    let declarations: Vec<Stmt> = vars
        .ids()
        .filter(|id| !vars.get(*id).parameter && used.contains_key(id))
        .map(|var| Stmt::Declare { var, init: None })
        .collect();
    block.splice(0..0, declarations);
}

/// Rename declarations so no two share a name: parameters first, then
/// locals in the order they are declared. Later clashes get a `_n` suffix.
pub fn make_names_unique(block: &[Stmt], method: &mut JavaMethod) {
    let mut order: Vec<VarId> = method.parameters.clone();
    for_each_stmt(block, &mut |stmt| {
        if let Stmt::Declare { var, .. } = stmt {
            order.push(*var);
        }
    });

    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    for var in order {
        let name = method.vars.name(var).to_string();
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            let mut n = *count - 1;
            let mut candidate = format!("{}_{}", name, n);
            while seen.contains_key(&candidate) {
                n += 1;
                candidate = format!("{}_{}", name, n);
            }
            seen.insert(candidate.clone(), 1);
            method.vars.get_mut(var).name = candidate;
        }
    }
}

/// The message stored for a method that failed, followed by the start of
/// its bytecode.
fn failure_report(method: &MethodDefinition, code: &Code, err: &DecompileError) -> String {
    let mut report = format!(
        "Decompilation failed for method '{}{}': {}\nBytecode:",
        method.name, method.descriptor, err
    );
    for addressed in code.instructions.iter().take(REPORTED_INSTRUCTIONS) {
        let _ = write!(
            report,
            "\n  {:04}: {}",
            addressed.address,
            addressed.instruction.mnemonic()
        );
    }
    if code.instructions.len() > REPORTED_INSTRUCTIONS {
        let _ = write!(
            report,
            "\n  ... ({} more instructions)",
            code.instructions.len() - REPORTED_INSTRUCTIONS
        );
    }
    report
}

/// Classes a compilation unit refers to from outside its own package,
/// by the internal name of their top-level class. `java.lang` and the
/// unit's own classes need no import.
pub fn collect_imports(class: &JavaClass) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    gather_class_references(class, &mut names);

    let own_package = descriptor::package_name(&class.name);
    names
        .into_iter()
        .map(|name| match name.find('$') {
            Some(pos) if pos > 0 => name[..pos].to_string(),
            _ => name,
        })
        .filter(|name| {
            let package = descriptor::package_name(name);
            package.is_some() && package != own_package && package != Some("java/lang")
        })
        .collect()
}

fn gather_class_references(class: &JavaClass, out: &mut BTreeSet<String>) {
    if let Some(super_class) = &class.super_class {
        out.insert(super_class.clone());
    }
    out.extend(class.interfaces.iter().cloned());
    for field in &class.fields {
        add_type_reference(&field.ty, out);
    }
    for method in &class.methods {
        add_type_reference(&method.return_type, out);
        out.extend(method.exceptions.iter().cloned());
        for var in method.vars.ids() {
            add_type_reference(method.vars.ty(var), out);
        }
        if let Some(body) = &method.body {
            for_each_expr(&body.block, &mut |expr| match expr {
                Expr::Alloc(name) | Expr::OuterThis(name) => {
                    out.insert(name.clone());
                }
                Expr::New { method, .. } => {
                    out.insert(method.owner.clone());
                }
                Expr::Call {
                    receiver: None,
                    method,
                    ..
                } => {
                    out.insert(method.owner.clone());
                }
                Expr::StaticField(field) => {
                    out.insert(field.owner.clone());
                }
                Expr::Cast { ty, .. } | Expr::InstanceOf { ty, .. } | Expr::NewArray { ty, .. } => {
                    add_type_reference(ty, out);
                }
                Expr::Literal(Literal::Class(ty)) => add_type_reference(ty, out),
                _ => {}
            });
        }
    }
    for inner in &class.inner_classes {
        gather_class_references(inner, out);
    }
}

fn add_type_reference(ty: &JvmType, out: &mut BTreeSet<String>) {
    match ty {
        JvmType::Reference(name) => {
            out.insert(name.clone());
        }
        JvmType::Array(element) => add_type_reference(element, out),
        _ => {}
    }
}
