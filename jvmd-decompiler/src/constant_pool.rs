//! Constant-pool access for the constant-pool-aware simulator.
//!
//! [`ConstantPool`] is the seam to the container reader. [`ConstantPoolTable`]
//! is an in-memory pool with class-file style entries, used by the CLI
//! fixtures and by tests.

/// A loadable constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Internal class name, e.g. `java/lang/String`.
    Class(String),
}

/// A resolved field or method reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    /// Internal name of the owning class.
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// A resolved `invokedynamic` call site.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeDynamicRef {
    pub name: String,
    pub descriptor: String,
    /// Bootstrap method, when the bootstrap table resolves.
    pub bootstrap: Option<MemberRef>,
    pub static_args: Vec<Constant>,
}

/// Read-only view of a class's constant pool.
pub trait ConstantPool {
    fn utf8(&self, index: u16) -> Option<&str>;
    /// Internal name of a `Class` entry.
    fn class_name(&self, index: u16) -> Option<&str>;
    /// Value of an `ldc`-loadable entry.
    fn literal(&self, index: u16) -> Option<Constant>;
    /// Field, method or interface-method reference.
    fn member_ref(&self, index: u16) -> Option<MemberRef>;
    fn invoke_dynamic(&self, _index: u16) -> Option<InvokeDynamicRef> {
        None
    }
}

/// One constant-pool slot, mirroring the class-file tags.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEntry {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    InvokeDynamic { bootstrap_method: u16, name_and_type_index: u16 },
}

impl PoolEntry {
    /// `long` and `double` entries occupy two indices.
    fn width(&self) -> u16 {
        match self {
            PoolEntry::Long(_) | PoolEntry::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Bootstrap-method table row: a method-handle index and static arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
    pub method_handle: u16,
    pub arguments: Vec<u16>,
}

/// Index-addressed in-memory constant pool. Index 0 is never valid.
#[derive(Debug, Clone, Default)]
pub struct ConstantPoolTable {
    entries: Vec<Option<PoolEntry>>,
    bootstrap_methods: Vec<BootstrapMethod>,
}

impl ConstantPoolTable {
    pub fn new() -> Self {
        Self {
            entries: vec![None],
            bootstrap_methods: Vec::new(),
        }
    }

    /// Place an entry at an explicit index, growing the table as needed.
    pub fn insert(&mut self, index: u16, entry: PoolEntry) {
        let needed = usize::from(index) + usize::from(entry.width());
        if self.entries.len() < needed {
            self.entries.resize(needed, None);
        }
        self.entries[usize::from(index)] = Some(entry);
    }

    /// Append an entry and return its index.
    pub fn push(&mut self, entry: PoolEntry) -> u16 {
        let index = self.entries.len().max(1) as u16;
        self.insert(index, entry);
        index
    }

    pub fn add_bootstrap_method(&mut self, method: BootstrapMethod) -> u16 {
        self.bootstrap_methods.push(method);
        (self.bootstrap_methods.len() - 1) as u16
    }

    pub fn entry(&self, index: u16) -> Option<&PoolEntry> {
        self.entries.get(usize::from(index))?.as_ref()
    }

    pub fn add_utf8(&mut self, s: &str) -> u16 {
        self.push(PoolEntry::Utf8(s.to_string()))
    }

    pub fn add_class(&mut self, internal_name: &str) -> u16 {
        let name_index = self.add_utf8(internal_name);
        self.push(PoolEntry::Class { name_index })
    }

    pub fn add_string(&mut self, s: &str) -> u16 {
        let string_index = self.add_utf8(s);
        self.push(PoolEntry::String { string_index })
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.push(PoolEntry::NameAndType {
            name_index,
            descriptor_index,
        })
    }

    pub fn add_field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let name_and_type_index = self.add_name_and_type(name, descriptor);
        self.push(PoolEntry::FieldRef {
            class_index,
            name_and_type_index,
        })
    }

    pub fn add_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let name_and_type_index = self.add_name_and_type(name, descriptor);
        self.push(PoolEntry::MethodRef {
            class_index,
            name_and_type_index,
        })
    }

    pub fn add_interface_method_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(owner);
        let name_and_type_index = self.add_name_and_type(name, descriptor);
        self.push(PoolEntry::InterfaceMethodRef {
            class_index,
            name_and_type_index,
        })
    }

    fn name_and_type(&self, index: u16) -> Option<(&str, &str)> {
        match self.entry(index)? {
            PoolEntry::NameAndType {
                name_index,
                descriptor_index,
            } => Some((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => None,
        }
    }
}

impl ConstantPool for ConstantPoolTable {
    fn utf8(&self, index: u16) -> Option<&str> {
        match self.entry(index)? {
            PoolEntry::Utf8(s) => Some(s),
            _ => None,
        }
    }

    fn class_name(&self, index: u16) -> Option<&str> {
        match self.entry(index)? {
            PoolEntry::Class { name_index } => self.utf8(*name_index),
            _ => None,
        }
    }

    fn literal(&self, index: u16) -> Option<Constant> {
        Some(match self.entry(index)? {
            PoolEntry::Integer(v) => Constant::Int(*v),
            PoolEntry::Long(v) => Constant::Long(*v),
            PoolEntry::Float(v) => Constant::Float(*v),
            PoolEntry::Double(v) => Constant::Double(*v),
            PoolEntry::String { string_index } => Constant::String(self.utf8(*string_index)?.to_string()),
            PoolEntry::Class { name_index } => Constant::Class(self.utf8(*name_index)?.to_string()),
            _ => return None,
        })
    }

    fn member_ref(&self, index: u16) -> Option<MemberRef> {
        let (class_index, name_and_type_index) = match self.entry(index)? {
            PoolEntry::FieldRef {
                class_index,
                name_and_type_index,
            }
            | PoolEntry::MethodRef {
                class_index,
                name_and_type_index,
            }
            | PoolEntry::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index),
            _ => return None,
        };
        let (name, descriptor) = self.name_and_type(name_and_type_index)?;
        Some(MemberRef {
            owner: self.class_name(class_index)?.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        })
    }

    fn invoke_dynamic(&self, index: u16) -> Option<InvokeDynamicRef> {
        let PoolEntry::InvokeDynamic {
            bootstrap_method,
            name_and_type_index,
        } = self.entry(index)?
        else {
            return None;
        };
        let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
        let row = self.bootstrap_methods.get(usize::from(*bootstrap_method));
        let bootstrap = row.and_then(|row| match self.entry(row.method_handle)? {
            PoolEntry::MethodHandle {
                reference_index, ..
            } => self.member_ref(*reference_index),
            _ => None,
        });
        let static_args = row
            .map(|row| row.arguments.iter().filter_map(|&arg| self.literal(arg)).collect())
            .unwrap_or_default();
        Some(InvokeDynamicRef {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            bootstrap,
            static_args,
        })
    }
}
