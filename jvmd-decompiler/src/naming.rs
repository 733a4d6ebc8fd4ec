//! Display names for local-variable slots.

use std::collections::HashMap;

use jvmd_ir::method::{LocalVariableEntry, MethodInput};

use crate::descriptor::MethodDescriptor;

/// Supplies a display name for a local slot as seen at a code offset.
pub trait LocalNameProvider {
    fn name_for(&self, slot: u16, pc: u32) -> String;
}

/// `v<slot>` for every slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticNames;

impl LocalNameProvider for SyntheticNames {
    fn name_for(&self, slot: u16, _pc: u32) -> String {
        format!("v{slot}")
    }
}

const PARAM_NAMES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

/// Names derived from the method signature: `this`, then `a`..`f`, then
/// `arg<N>`. Slots past the parameters fall back to `v<slot>`.
#[derive(Debug, Clone, Default)]
pub struct ParameterNames {
    names: HashMap<u16, String>,
}

impl ParameterNames {
    pub fn new(is_static: bool, descriptor: &MethodDescriptor) -> Self {
        let mut names = HashMap::new();
        let mut slot = 0u16;
        if !is_static {
            names.insert(0, "this".to_string());
            slot = 1;
        }
        for (i, param) in descriptor.params.iter().enumerate() {
            let name = PARAM_NAMES
                .get(i)
                .map_or_else(|| format!("arg{i}"), |n| n.to_string());
            names.insert(slot, name);
            slot += param.slots();
        }
        Self { names }
    }

    /// Like [`new`](Self::new), treating an unparsable descriptor as having
    /// no parameters.
    pub fn for_method(method: &MethodInput) -> Self {
        match MethodDescriptor::parse(&method.descriptor) {
            Ok(descriptor) => Self::new(method.is_static(), &descriptor),
            Err(err) => {
                log::debug!("{}: {err}; using positional names", method.name);
                let empty = MethodDescriptor {
                    params: Vec::new(),
                    ret: None,
                };
                Self::new(method.is_static(), &empty)
            }
        }
    }
}

impl LocalNameProvider for ParameterNames {
    fn name_for(&self, slot: u16, pc: u32) -> String {
        self.names
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| SyntheticNames.name_for(slot, pc))
    }
}

/// Debug local-variable table names layered over a fallback provider.
///
/// An entry whose validity window covers `pc` wins; otherwise the first
/// entry recorded for the slot; otherwise the fallback.
#[derive(Debug, Clone)]
pub struct DebugNames<P> {
    entries: Vec<LocalVariableEntry>,
    fallback: P,
}

impl<P: LocalNameProvider> DebugNames<P> {
    pub fn new(entries: Vec<LocalVariableEntry>, fallback: P) -> Self {
        Self { entries, fallback }
    }
}

impl<P: LocalNameProvider> LocalNameProvider for DebugNames<P> {
    fn name_for(&self, slot: u16, pc: u32) -> String {
        let mut for_slot = self.entries.iter().filter(|e| e.index == slot);
        let scoped = for_slot.clone().find(|e| e.covers(pc));
        scoped
            .or_else(|| for_slot.next())
            .map(|e| e.name.clone())
            .unwrap_or_else(|| self.fallback.name_for(slot, pc))
    }
}

/// The standard chain for a method: debug names, then parameter names,
/// then synthetic names.
pub fn names_for_method(method: &MethodInput) -> DebugNames<ParameterNames> {
    let entries = method
        .code
        .as_ref()
        .map(|code| code.local_variables.clone())
        .unwrap_or_default();
    DebugNames::new(entries, ParameterNames::for_method(method))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lv(index: u16, name: &str, start_pc: u16, length: u16) -> LocalVariableEntry {
        LocalVariableEntry {
            start_pc,
            length,
            name: name.to_string(),
            descriptor: "I".to_string(),
            index,
        }
    }

    #[test]
    fn parameters_skip_wide_slots() {
        let d = MethodDescriptor::parse("(JILjava/lang/String;)V").unwrap();
        let names = ParameterNames::new(false, &d);
        assert_eq!(names.name_for(0, 0), "this");
        assert_eq!(names.name_for(1, 0), "a");
        assert_eq!(names.name_for(2, 0), "v2", "second half of the long");
        assert_eq!(names.name_for(3, 0), "b");
        assert_eq!(names.name_for(4, 0), "c");
        assert_eq!(names.name_for(5, 0), "v5");
    }

    #[test]
    fn parameters_past_six_are_numbered() {
        let d = MethodDescriptor::parse("(IIIIIIII)V").unwrap();
        let names = ParameterNames::new(true, &d);
        assert_eq!(names.name_for(0, 0), "a");
        assert_eq!(names.name_for(5, 0), "f");
        assert_eq!(names.name_for(6, 0), "arg6");
        assert_eq!(names.name_for(7, 0), "arg7");
    }

    #[test]
    fn debug_names_prefer_covering_window() {
        let names = DebugNames::new(
            vec![lv(1, "first", 0, 10), lv(1, "second", 10, 10)],
            SyntheticNames,
        );
        assert_eq!(names.name_for(1, 3), "first");
        assert_eq!(names.name_for(1, 12), "second");
        assert_eq!(names.name_for(1, 40), "first", "outside all windows");
        assert_eq!(names.name_for(2, 0), "v2");
    }
}
