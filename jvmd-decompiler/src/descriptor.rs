//! Field and method descriptor parsing.

use crate::error::{DecompileError, Result};

/// A field type as encoded in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    /// Internal class name, e.g. `java/lang/String`.
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn parse(descriptor: &str) -> Result<FieldType> {
        let mut cursor = Cursor::new(descriptor);
        let ty = cursor.field_type()?;
        cursor.expect_end()?;
        Ok(ty)
    }

    /// Local-variable slots taken by a value of this type.
    pub fn slots(&self) -> u16 {
        match self {
            FieldType::Long | FieldType::Double => 2,
            _ => 1,
        }
    }

    /// Source-level name with classes shortened to their simple name.
    pub fn java_name(&self) -> String {
        match self {
            FieldType::Byte => "byte".into(),
            FieldType::Char => "char".into(),
            FieldType::Double => "double".into(),
            FieldType::Float => "float".into(),
            FieldType::Int => "int".into(),
            FieldType::Long => "long".into(),
            FieldType::Short => "short".into(),
            FieldType::Boolean => "boolean".into(),
            FieldType::Object(name) => simple_class_name(name).to_string(),
            FieldType::Array(elem) => format!("{}[]", elem.java_name()),
        }
    }
}

/// Parameter and return types of a method descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    /// `None` for `void`.
    pub ret: Option<FieldType>,
}

impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> Result<MethodDescriptor> {
        let mut cursor = Cursor::new(descriptor);
        cursor.expect('(')?;
        let mut params = Vec::new();
        while cursor.peek() != Some(')') {
            params.push(cursor.field_type()?);
        }
        cursor.expect(')')?;
        let ret = if cursor.peek() == Some('V') {
            cursor.bump();
            None
        } else {
            Some(cursor.field_type()?)
        };
        cursor.expect_end()?;
        Ok(MethodDescriptor { params, ret })
    }

    pub fn is_void(&self) -> bool {
        self.ret.is_none()
    }

    pub fn param_slots(&self) -> u16 {
        self.params.iter().map(FieldType::slots).sum()
    }

    pub fn return_java_name(&self) -> String {
        self.ret
            .as_ref()
            .map_or_else(|| "void".to_string(), FieldType::java_name)
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self) -> DecompileError {
        DecompileError::InvalidDescriptor(self.src.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, want: char) -> Result<()> {
        match self.bump() {
            Some(c) if c == want => Ok(()),
            _ => Err(self.error()),
        }
    }

    fn expect_end(&self) -> Result<()> {
        if self.pos == self.src.len() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn field_type(&mut self) -> Result<FieldType> {
        Ok(match self.bump().ok_or_else(|| self.error())? {
            'B' => FieldType::Byte,
            'C' => FieldType::Char,
            'D' => FieldType::Double,
            'F' => FieldType::Float,
            'I' => FieldType::Int,
            'J' => FieldType::Long,
            'S' => FieldType::Short,
            'Z' => FieldType::Boolean,
            'L' => {
                let src = self.src;
                let rest = &src[self.pos..];
                let end = rest.find(';').ok_or_else(|| self.error())?;
                if end == 0 {
                    return Err(self.error());
                }
                let name = rest[..end].to_string();
                self.pos += end + 1;
                FieldType::Object(name)
            }
            '[' => FieldType::Array(Box::new(self.field_type()?)),
            _ => return Err(self.error()),
        })
    }
}

/// `java/lang/String` -> `String`.
pub fn simple_class_name(internal_name: &str) -> &str {
    internal_name
        .rsplit_once('/')
        .map_or(internal_name, |(_, simple)| simple)
}

/// Source name for a class operand, which is either an internal name or,
/// for array classes, a field descriptor.
pub fn class_operand_name(name: &str) -> String {
    if name.starts_with('[') {
        FieldType::parse(name)
            .map(|ty| ty.java_name())
            .unwrap_or_else(|_| name.to_string())
    } else {
        simple_class_name(name).to_string()
    }
}

/// Element type for a `newarray` type code.
pub fn primitive_array_type(code: i32) -> Option<&'static str> {
    Some(match code {
        4 => "boolean",
        5 => "char",
        6 => "float",
        7 => "double",
        8 => "byte",
        9 => "short",
        10 => "int",
        11 => "long",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_descriptor() {
        let d = MethodDescriptor::parse("(IJLjava/lang/String;[[D)Z").unwrap();
        assert_eq!(
            d.params,
            vec![
                FieldType::Int,
                FieldType::Long,
                FieldType::Object("java/lang/String".into()),
                FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Double)))),
            ]
        );
        assert_eq!(d.ret, Some(FieldType::Boolean));
        assert_eq!(d.param_slots(), 5);
        assert_eq!(d.params[3].java_name(), "double[][]");
    }

    #[test]
    fn void_return() {
        let d = MethodDescriptor::parse("()V").unwrap();
        assert!(d.is_void());
        assert_eq!(d.return_java_name(), "void");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "I", "(I", "(Q)V", "(L;)V", "(Ljava/lang/String)V", "()VV"] {
            assert!(MethodDescriptor::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn class_operands() {
        assert_eq!(class_operand_name("java/util/List"), "List");
        assert_eq!(class_operand_name("[Ljava/lang/Object;"), "Object[]");
        assert_eq!(class_operand_name("Foo"), "Foo");
    }
}
