//! Plugin function registry
//!
//! Plugins extend the language with functions that are not part of the
//! fixed builtin table. The registry is process-wide and append-only:
//! entries are added once, typically while the host starts up, and every
//! compiler and VM afterwards looks them up under the read lock.

use crate::builtins::{is_reserved, MAX_ARGS};
use crate::bytecode::Instruction;
use crate::can::CanFrame;
use crate::error::{RegistryError, VmError};
use crate::opcode::{OpcodeId, PLUGIN_OPCODE_OFFSET};
use crate::vm::EvalStack;
use equation_types::sync::RwLock;
use equation_types::TypedValue;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Execution state handed to a plugin function
pub struct PluginContext<'a> {
    pub stack: &'a mut EvalStack,
    /// Frame passed to `execute_with_can_context`
    pub can_frame: Option<&'a CanFrame>,
    /// Value of the `#`/`$` parameter
    pub parameter: TypedValue,
    /// The instruction calling the plugin
    pub instruction: &'a Instruction,
}

impl<'a> PluginContext<'a> {
    /// The CAN frame, or a plugin error naming `plugin` when the execution
    /// has none
    pub fn require_can_frame(&self, plugin: &str) -> Result<&'a CanFrame, VmError> {
        self.can_frame.ok_or_else(|| VmError::Plugin {
            name: plugin.to_string(),
            message: "no CAN frame in this execution".to_string(),
        })
    }
}

/// Type signature of plugin functions
///
/// The function pops its arguments from the context's stack (the last
/// argument on top) and pushes exactly one result.
pub type PluginFn = fn(&mut PluginContext<'_>) -> Result<(), VmError>;

/// The plugin reads CAN frame data: it is gated like the CAN builtins
pub const PLUGIN_USES_CAN_DATA: u32 = 0x1;

/// Metadata for a single plugin function
#[derive(Clone)]
pub struct PluginMetadata {
    pub name: String,
    pub id: OpcodeId,
    pub min_args: u8,
    pub max_args: u8,
    pub flags: u32,
    pub func: PluginFn,
}

impl fmt::Debug for PluginMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginMetadata")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl PluginMetadata {
    pub fn accepts(&self, count: usize) -> bool {
        (self.min_args as usize..=self.max_args as usize).contains(&count)
    }

    pub fn uses_can_data(&self) -> bool {
        self.flags & PLUGIN_USES_CAN_DATA != 0
    }
}

/// Table of registered plugins
///
/// Provides O(1) lookup by name (for the compiler) and by id (for the VM).
#[derive(Debug, Default)]
pub struct PluginRegistry {
    name_to_id: HashMap<String, OpcodeId>,
    functions: Vec<PluginMetadata>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin and hand out its opcode id
    pub fn register(
        &mut self,
        name: &str,
        min_args: u8,
        max_args: u8,
        flags: u32,
        func: PluginFn,
    ) -> Result<OpcodeId, RegistryError> {
        if !is_identifier(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if is_reserved(name) || self.name_to_id.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        if min_args > max_args || max_args as usize > MAX_ARGS {
            return Err(RegistryError::InvalidArity {
                min: min_args,
                max: max_args,
            });
        }

        let index = u16::try_from(self.functions.len())
            .ok()
            .and_then(|i| i.checked_add(PLUGIN_OPCODE_OFFSET))
            .ok_or(RegistryError::Full)?;
        let id = OpcodeId(index);

        self.name_to_id.insert(name.to_string(), id);
        self.functions.push(PluginMetadata {
            name: name.to_string(),
            id,
            min_args,
            max_args,
            flags,
            func,
        });
        Ok(id)
    }

    #[inline]
    pub fn get_fn(&self, id: OpcodeId) -> Option<PluginFn> {
        self.get_metadata(id).map(|m| m.func)
    }

    #[inline]
    pub fn get_metadata(&self, id: OpcodeId) -> Option<&PluginMetadata> {
        self.functions.get(id.plugin_index()?)
    }

    #[inline]
    pub fn get_id(&self, name: &str) -> Option<OpcodeId> {
        self.name_to_id.get(name).copied()
    }

    pub fn lookup(&self, name: &str) -> Option<&PluginMetadata> {
        self.get_id(name).and_then(|id| self.get_metadata(id))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

static PLUGINS: Lazy<RwLock<PluginRegistry>> = Lazy::new(|| RwLock::new(PluginRegistry::new()));

/// Register a plugin function for every compiler in this process
pub fn register_builtin(
    name: &str,
    min_args: u8,
    max_args: u8,
    flags: u32,
    exec_fn: PluginFn,
) -> Result<OpcodeId, RegistryError> {
    let id = PLUGINS
        .write()
        .register(name, min_args, max_args, flags, exec_fn)?;
    debug!(name, %id, min_args, max_args, flags, "plugin registered");
    Ok(id)
}

/// Metadata of a registered plugin
pub fn lookup_plugin(name: &str) -> Option<PluginMetadata> {
    PLUGINS.read().lookup(name).cloned()
}

/// Name of the plugin behind `id`
pub fn plugin_name(id: OpcodeId) -> Option<String> {
    PLUGINS.read().get_metadata(id).map(|m| m.name.clone())
}

/// Number of registered plugins
pub fn plugin_count() -> usize {
    PLUGINS.read().len()
}

/// Run the plugin behind `id`
pub(crate) fn call(id: OpcodeId, ctx: &mut PluginContext<'_>) -> Result<(), VmError> {
    let func = PLUGINS.read().get_fn(id).ok_or(VmError::UnknownPlugin(id.0))?;
    func(ctx)
}
