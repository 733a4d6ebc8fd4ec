//! YAML class fixtures: a constant pool plus method bodies given as hex.

use jvmd_decompiler::constant_pool::{BootstrapMethod, ConstantPoolTable, PoolEntry};
use jvmd_ir::method::{
    AccessFlags, CodeAttribute, ExceptionTableEntry, LineNumberEntry, LocalVariableEntry,
    MethodInput,
};
use serde::Deserialize;

/// Why a fixture could not be turned into methods.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("invalid fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{method}: unknown access flag `{keyword}`")]
    UnknownAccess { method: String, keyword: String },
    #[error("{method}: bad code hex: {source}")]
    Hex {
        method: String,
        #[source]
        source: hex::FromHexError,
    },
}

#[derive(Debug, Deserialize)]
pub struct ClassFixture {
    /// Internal name, e.g. `demo/Calc`.
    pub class: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub constant_pool: Vec<PoolSlot>,
    #[serde(default)]
    pub bootstrap_methods: Vec<BootstrapDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

/// A pool entry at an explicit index.
#[derive(Debug, Deserialize)]
pub struct PoolSlot {
    pub index: u16,
    #[serde(flatten)]
    pub entry: PoolEntryDef,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolEntryDef {
    Utf8 { value: String },
    Integer { value: i32 },
    Float { value: f32 },
    Long { value: i64 },
    Double { value: f64 },
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    InvokeDynamic { bootstrap_method: u16, name_and_type_index: u16 },
}

impl From<&PoolEntryDef> for PoolEntry {
    fn from(def: &PoolEntryDef) -> Self {
        match *def {
            PoolEntryDef::Utf8 { ref value } => PoolEntry::Utf8(value.clone()),
            PoolEntryDef::Integer { value } => PoolEntry::Integer(value),
            PoolEntryDef::Float { value } => PoolEntry::Float(value),
            PoolEntryDef::Long { value } => PoolEntry::Long(value),
            PoolEntryDef::Double { value } => PoolEntry::Double(value),
            PoolEntryDef::Class { name_index } => PoolEntry::Class { name_index },
            PoolEntryDef::String { string_index } => PoolEntry::String { string_index },
            PoolEntryDef::Fieldref {
                class_index,
                name_and_type_index,
            } => PoolEntry::FieldRef {
                class_index,
                name_and_type_index,
            },
            PoolEntryDef::Methodref {
                class_index,
                name_and_type_index,
            } => PoolEntry::MethodRef {
                class_index,
                name_and_type_index,
            },
            PoolEntryDef::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => PoolEntry::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            },
            PoolEntryDef::NameAndType {
                name_index,
                descriptor_index,
            } => PoolEntry::NameAndType {
                name_index,
                descriptor_index,
            },
            PoolEntryDef::MethodHandle {
                reference_kind,
                reference_index,
            } => PoolEntry::MethodHandle {
                reference_kind,
                reference_index,
            },
            PoolEntryDef::MethodType { descriptor_index } => PoolEntry::MethodType { descriptor_index },
            PoolEntryDef::InvokeDynamic {
                bootstrap_method,
                name_and_type_index,
            } => PoolEntry::InvokeDynamic {
                bootstrap_method,
                name_and_type_index,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BootstrapDef {
    pub method_handle: u16,
    #[serde(default)]
    pub arguments: Vec<u16>,
}

#[derive(Debug, Deserialize)]
pub struct MethodDef {
    pub name: String,
    pub descriptor: String,
    /// Modifier keywords such as `public` or `static`.
    #[serde(default)]
    pub access: Vec<String>,
    /// Absent for abstract and native methods.
    #[serde(default)]
    pub code: Option<CodeDef>,
}

#[derive(Debug, Deserialize)]
pub struct CodeDef {
    #[serde(default)]
    pub max_stack: u16,
    #[serde(default)]
    pub max_locals: u16,
    /// Code bytes as hex; whitespace is ignored.
    pub hex: String,
    #[serde(default)]
    pub exception_table: Vec<ExceptionRowDef>,
    #[serde(default)]
    pub local_variables: Vec<LocalVariableDef>,
    #[serde(default)]
    pub line_numbers: Vec<LineNumberDef>,
}

#[derive(Debug, Deserialize)]
pub struct ExceptionRowDef {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    #[serde(default)]
    pub catch_type: u16,
}

#[derive(Debug, Deserialize)]
pub struct LocalVariableDef {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}

#[derive(Debug, Deserialize)]
pub struct LineNumberDef {
    pub start_pc: u16,
    pub line: u16,
}

impl ClassFixture {
    pub fn from_yaml(text: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn pool(&self) -> ConstantPoolTable {
        let mut pool = ConstantPoolTable::new();
        for slot in &self.constant_pool {
            pool.insert(slot.index, PoolEntry::from(&slot.entry));
        }
        for bsm in &self.bootstrap_methods {
            pool.add_bootstrap_method(BootstrapMethod {
                method_handle: bsm.method_handle,
                arguments: bsm.arguments.clone(),
            });
        }
        pool
    }

    pub fn methods(&self) -> Result<Vec<MethodInput>, FixtureError> {
        self.methods.iter().map(MethodDef::to_input).collect()
    }
}

impl MethodDef {
    fn to_input(&self) -> Result<MethodInput, FixtureError> {
        let mut access = AccessFlags::empty();
        for keyword in &self.access {
            let flag = AccessFlags::from_name(&keyword.to_ascii_uppercase()).ok_or_else(|| {
                FixtureError::UnknownAccess {
                    method: self.name.clone(),
                    keyword: keyword.clone(),
                }
            })?;
            access |= flag;
        }
        let code = match &self.code {
            Some(code) => Some(code.to_attribute().map_err(|source| FixtureError::Hex {
                method: self.name.clone(),
                source,
            })?),
            None => None,
        };
        Ok(MethodInput {
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
            access,
            code,
        })
    }
}

impl CodeDef {
    fn to_attribute(&self) -> Result<CodeAttribute, hex::FromHexError> {
        Ok(CodeAttribute {
            max_stack: self.max_stack,
            max_locals: self.max_locals,
            code: parse_hex(&self.hex)?,
            exception_table: self
                .exception_table
                .iter()
                .map(|row| ExceptionTableEntry {
                    start_pc: row.start_pc,
                    end_pc: row.end_pc,
                    handler_pc: row.handler_pc,
                    catch_type: row.catch_type,
                })
                .collect(),
            local_variables: self
                .local_variables
                .iter()
                .map(|lv| LocalVariableEntry {
                    start_pc: lv.start_pc,
                    length: lv.length,
                    name: lv.name.clone(),
                    descriptor: lv.descriptor.clone(),
                    index: lv.index,
                })
                .collect(),
            line_numbers: self
                .line_numbers
                .iter()
                .map(|ln| LineNumberEntry {
                    start_pc: ln.start_pc,
                    line_number: ln.line,
                })
                .collect(),
        })
    }
}

/// Decode hex digit pairs, ignoring whitespace.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits: String = text.split_whitespace().collect();
    hex::decode(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jvmd_decompiler::constant_pool::ConstantPool;

    const SAMPLE: &str = r#"
class: demo/Calc
version: { major: 52, minor: 0 }
constant_pool:
  - { index: 1, kind: utf8, value: java/lang/ArithmeticException }
  - { index: 2, kind: class, name_index: 1 }
  - { index: 3, kind: long, value: 7 }
  - { index: 5, kind: utf8, value: tail }
methods:
  - name: abs
    descriptor: (I)I
    access: [public, static]
    code:
      max_stack: 1
      max_locals: 1
      hex: "1a 9b 00 05 1a ac 1a 74 ac"
      local_variables:
        - { start_pc: 0, length: 9, name: x, descriptor: I, index: 0 }
      line_numbers:
        - { start_pc: 0, line: 3 }
        - { start_pc: 6, line: 5 }
  - name: run
    descriptor: ()V
    access: [public, abstract]
"#;

    #[test]
    fn parses_pool_and_methods() {
        let fixture = ClassFixture::from_yaml(SAMPLE).unwrap();
        assert_eq!(fixture.class, "demo/Calc");
        assert_eq!((fixture.version.major, fixture.version.minor), (52, 0));

        let pool = fixture.pool();
        assert_eq!(pool.class_name(2), Some("java/lang/ArithmeticException"));
        assert_eq!(pool.utf8(5), Some("tail"));

        let methods = fixture.methods().unwrap();
        assert_eq!(methods.len(), 2);
        assert!(methods[0].is_static());
        let code = methods[0].code.as_ref().unwrap();
        assert_eq!(code.code, vec![0x1a, 0x9b, 0x00, 0x05, 0x1a, 0xac, 0x1a, 0x74, 0xac]);
        assert_eq!(code.line_for(7), Some(5));
        assert!(methods[1].code.is_none());
        assert!(methods[1].access.contains(AccessFlags::ABSTRACT));
    }

    #[test]
    fn rejects_unknown_access_keyword() {
        let text = "class: A\nmethods:\n  - { name: f, descriptor: ()V, access: [sealed] }\n";
        let fixture = ClassFixture::from_yaml(text).unwrap();
        let err = fixture.methods().unwrap_err();
        assert!(
            matches!(&err, FixtureError::UnknownAccess { keyword, .. } if keyword == "sealed"),
            "{err:?}"
        );
        assert_eq!(err.to_string(), "f: unknown access flag `sealed`");
    }

    #[test]
    fn hex_ignores_whitespace() {
        assert_eq!(parse_hex("1b 1c\n60ac").unwrap(), vec![0x1b, 0x1c, 0x60, 0xac]);
        assert_eq!(parse_hex("abc"), Err(hex::FromHexError::OddLength));
        assert!(matches!(
            parse_hex("zz"),
            Err(hex::FromHexError::InvalidHexCharacter { c: 'z', index: 0 })
        ));
    }

    #[test]
    fn bad_code_hex_names_the_method() {
        let text = "class: A\nmethods:\n  - name: f\n    descriptor: ()V\n    code: { hex: \"b1 0\" }\n";
        let fixture = ClassFixture::from_yaml(text).unwrap();
        let err = fixture.methods().unwrap_err();
        assert!(matches!(&err, FixtureError::Hex { method, .. } if method == "f"), "{err:?}");
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = ClassFixture::from_yaml("class: [unclosed").unwrap_err();
        assert!(matches!(err, FixtureError::Yaml(_)));
    }
}
