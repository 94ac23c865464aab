//! JVM type descriptor and method descriptor parser.

/// Represents a JVM type from a descriptor string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JvmType {
    Int,
    Long,
    Float,
    Double,
    Byte,
    Char,
    Short,
    Boolean,
    Void,
    Reference(String),
    Array(Box<JvmType>),
    Null,
    /// A type that could not be resolved from the available information.
    Unknown,
}

pub const OBJECT_CLASS: &str = "java/lang/Object";
pub const STRING_CLASS: &str = "java/lang/String";
pub const CLASS_CLASS: &str = "java/lang/Class";

impl JvmType {
    pub fn object() -> Self {
        JvmType::Reference(OBJECT_CLASS.to_string())
    }

    pub fn string() -> Self {
        JvmType::Reference(STRING_CLASS.to_string())
    }

    pub fn class(name: impl Into<String>) -> Self {
        JvmType::Reference(name.into())
    }

    pub fn array_of(element: JvmType) -> Self {
        JvmType::Array(Box::new(element))
    }

    /// Returns true if this type occupies two slots on the JVM stack.
    pub fn is_wide(&self) -> bool {
        matches!(self, JvmType::Long | JvmType::Double)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, JvmType::Float | JvmType::Double)
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            JvmType::Reference(_) | JvmType::Array(_) | JvmType::Null
        )
    }

    /// Types that the JVM computes with as `int`.
    pub fn is_int_like(&self) -> bool {
        matches!(
            self,
            JvmType::Int | JvmType::Byte | JvmType::Char | JvmType::Short | JvmType::Boolean
        )
    }

    pub fn is_primitive(&self) -> bool {
        self.is_int_like() || matches!(self, JvmType::Long | JvmType::Float | JvmType::Double)
    }

    /// Element type of an array type, `Unknown` for anything else.
    pub fn element_type(&self) -> JvmType {
        match self {
            JvmType::Array(inner) => (**inner).clone(),
            _ => JvmType::Unknown,
        }
    }

    /// The internal class name for reference types.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JvmType::Reference(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the JVM descriptor string for this type.
    pub fn to_descriptor(&self) -> String {
        match self {
            JvmType::Int => "I".into(),
            JvmType::Long => "J".into(),
            JvmType::Float => "F".into(),
            JvmType::Double => "D".into(),
            JvmType::Byte => "B".into(),
            JvmType::Char => "C".into(),
            JvmType::Short => "S".into(),
            JvmType::Boolean => "Z".into(),
            JvmType::Void => "V".into(),
            JvmType::Reference(name) => format!("L{};", name),
            JvmType::Array(inner) => format!("[{}", inner.to_descriptor()),
            JvmType::Null | JvmType::Unknown => "Ljava/lang/Object;".into(),
        }
    }

    /// Returns the source name for display, with packages unless `simple`.
    pub fn source_name(&self, simple: bool) -> String {
        match self {
            JvmType::Int => "int".into(),
            JvmType::Long => "long".into(),
            JvmType::Float => "float".into(),
            JvmType::Double => "double".into(),
            JvmType::Byte => "byte".into(),
            JvmType::Char => "char".into(),
            JvmType::Short => "short".into(),
            JvmType::Boolean => "boolean".into(),
            JvmType::Void => "void".into(),
            JvmType::Reference(name) => {
                if simple {
                    nested_simple_name(name)
                } else {
                    internal_to_source_name(name)
                }
            }
            JvmType::Array(inner) => format!("{}[]", inner.source_name(simple)),
            JvmType::Null => "Object".into(),
            JvmType::Unknown => "Object".into(),
        }
    }

    /// Returns the simple (unqualified) name for display.
    pub fn simple_name(&self) -> String {
        self.source_name(true)
    }
}

/// Parse a single type descriptor starting at position `pos` in `desc`.
/// Returns (JvmType, next_position).
pub fn parse_type_at(desc: &str, pos: usize) -> Option<(JvmType, usize)> {
    let bytes = desc.as_bytes();
    if pos >= bytes.len() {
        return None;
    }
    match bytes[pos] {
        b'B' => Some((JvmType::Byte, pos + 1)),
        b'C' => Some((JvmType::Char, pos + 1)),
        b'D' => Some((JvmType::Double, pos + 1)),
        b'F' => Some((JvmType::Float, pos + 1)),
        b'I' => Some((JvmType::Int, pos + 1)),
        b'J' => Some((JvmType::Long, pos + 1)),
        b'S' => Some((JvmType::Short, pos + 1)),
        b'Z' => Some((JvmType::Boolean, pos + 1)),
        b'V' => Some((JvmType::Void, pos + 1)),
        b'L' => {
            let semi = desc[pos + 1..].find(';')?;
            let class_name = &desc[pos + 1..pos + 1 + semi];
            if class_name.is_empty() {
                return None;
            }
            Some((JvmType::Reference(class_name.to_string()), pos + 1 + semi + 1))
        }
        b'[' => {
            let (inner, next) = parse_type_at(desc, pos + 1)?;
            if inner == JvmType::Void {
                return None;
            }
            Some((JvmType::Array(Box::new(inner)), next))
        }
        _ => None,
    }
}

/// Parse a full type descriptor string. Trailing characters are rejected.
pub fn parse_type_descriptor(desc: &str) -> Option<JvmType> {
    let (ty, next) = parse_type_at(desc, 0)?;
    if next != desc.len() {
        return None;
    }
    Some(ty)
}

/// Parse a method descriptor, e.g. "(II)V" -> ([Int, Int], Void)
pub fn parse_method_descriptor(desc: &str) -> Option<(Vec<JvmType>, JvmType)> {
    if !desc.starts_with('(') {
        return None;
    }
    let close = desc.find(')')?;
    let mut params = Vec::new();
    let mut pos = 1;
    while pos < close {
        let (ty, next) = parse_type_at(desc, pos)?;
        if ty == JvmType::Void {
            return None;
        }
        params.push(ty);
        pos = next;
    }
    let (ret, end) = parse_type_at(desc, close + 1)?;
    if end != desc.len() {
        return None;
    }
    Some((params, ret))
}

/// Parse the operand of `anewarray`/`checkcast`/`instanceof`, which is either
/// an internal class name or an array descriptor.
pub fn parse_class_operand(operand: &str) -> JvmType {
    if operand.starts_with('[') {
        parse_type_descriptor(operand).unwrap_or(JvmType::Unknown)
    } else {
        JvmType::Reference(operand.to_string())
    }
}

/// Convert internal class name to source name.
pub fn internal_to_source_name(name: &str) -> String {
    name.replace(['/', '$'], ".")
}

/// Get just the simple class name from an internal name.
pub fn simple_class_name(name: &str) -> &str {
    match name.rfind('/') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Simple name with nested classes joined by dots: `a/b/Outer$Inner` -> `Outer.Inner`.
pub fn nested_simple_name(name: &str) -> String {
    simple_class_name(name).replace('$', ".")
}

/// Get the package from an internal name.
pub fn package_name(name: &str) -> Option<&str> {
    match name.rfind('/') {
        Some(pos) => Some(&name[..pos]),
        None => None,
    }
}

/// The enclosing class of a nested class name, `a/Outer$Inner` -> `a/Outer`.
pub fn outer_class_name(name: &str) -> Option<&str> {
    let simple_start = name.rfind('/').map(|p| p + 1).unwrap_or(0);
    let dollar = name[simple_start..].rfind('$')?;
    if dollar == 0 {
        return None;
    }
    Some(&name[..simple_start + dollar])
}

/// Convert a newarray type code to JvmType.
pub fn newarray_type(atype: u8) -> JvmType {
    match atype {
        4 => JvmType::Boolean,
        5 => JvmType::Char,
        6 => JvmType::Float,
        7 => JvmType::Double,
        8 => JvmType::Byte,
        9 => JvmType::Short,
        10 => JvmType::Int,
        11 => JvmType::Long,
        _ => JvmType::Unknown,
    }
}
