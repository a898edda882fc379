//! Variable store interface
//!
//! Equations bind variable names against an external named-value database.
//! The compiler and the VM only talk to it through [`VariableStore`];
//! [`MemoryStore`] is a self-contained implementation for embedding and tests.

use crate::error::{BindError, StoreError};
use equation_types::sync::Mutex;
use equation_types::{DataType, TypedValue};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stable id of a store variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to do when a name is not in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExistPolicy {
    /// Fail the binding
    MustExist,
    /// Create the variable but report a warning
    ShouldExist,
    /// Create the variable silently
    CreateIfMissing,
}

/// Result of a successful name resolution. The caller owns one attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub id: VarId,
    pub created: bool,
}

/// Scheduler state of a process, as reported by `get_process_state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProcessState {
    #[default]
    Unknown = 0,
    Reference = 1,
    Init = 2,
    Running = 3,
    Terminating = 4,
}

/// Named-value database the equations bind against
///
/// Every successful [`resolve_or_create_variable`](Self::resolve_or_create_variable)
/// hands out one attachment that must be returned with [`detach`](Self::detach).
/// Writes receive the caller's lock token; implementations must not try to
/// take their process-wide lock again when it is set.
pub trait VariableStore: Send + Sync {
    /// Id of an existing variable, without attaching to it
    fn lookup(&self, name: &str) -> Option<VarId>;

    fn resolve_or_create_variable(
        &self,
        name: &str,
        policy: ExistPolicy,
        owner_pid: Option<i32>,
    ) -> Result<Binding, BindError>;

    fn read_variable(&self, id: VarId) -> TypedValue;

    fn write_variable(&self, id: VarId, value: TypedValue, lock_held: bool)
        -> Result<(), StoreError>;

    fn attach(&self, id: VarId);

    fn detach(&self, id: VarId);

    /// Storage layout of the variable, used for raw-bit access
    fn data_type(&self, id: VarId) -> DataType;

    fn has_conversion(&self, _id: VarId) -> bool {
        false
    }

    fn read_physical(&self, id: VarId) -> Result<f64, StoreError> {
        Err(StoreError::NoConversion(id))
    }

    fn write_physical(&self, id: VarId, _value: f64, _lock_held: bool) -> Result<(), StoreError> {
        Err(StoreError::NoConversion(id))
    }

    /// Raw value of an enum text attached to the variable
    fn enum_value(&self, _id: VarId, _text: &str) -> Option<i64> {
        None
    }

    fn process_state(&self, _process: &str) -> ProcessState {
        ProcessState::Unknown
    }

    /// A program with this registration number became live
    fn attach_equation(&self, _registration: u64) {}

    /// A program with this registration number was dropped
    fn detach_equation(&self, _registration: u64) {}
}

/// Linear raw-to-physical conversion: `phys = raw * factor + offset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub factor: f64,
    pub offset: f64,
}

#[derive(Debug)]
struct Slot {
    name: String,
    value: TypedValue,
    data_type: DataType,
    attachments: u32,
    /// Defined by the host, survives losing all attachments
    pinned: bool,
    conversion: Option<Conversion>,
    enums: Vec<(String, i64)>,
    owner_pid: Option<i32>,
}

#[derive(Debug, Default)]
struct Inner {
    slots: HashMap<VarId, Slot>,
    by_name: HashMap<String, VarId>,
    next_id: u32,
    processes: HashMap<String, ProcessState>,
    equations: HashSet<u64>,
}

impl Inner {
    fn insert(&mut self, slot: Slot) -> VarId {
        self.next_id += 1;
        let id = VarId(self.next_id);
        self.by_name.insert(slot.name.clone(), id);
        self.slots.insert(id, slot);
        id
    }
}

/// In-process variable store
///
/// Variables created through name resolution disappear again once their last
/// attachment is detached; variables created with [`define`](Self::define)
/// live as long as the store. The store serializes access with its own mutex,
/// so the lock token passed to writes is not needed here.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a typed variable
    pub fn define(&self, name: &str, data_type: DataType, value: impl Into<TypedValue>) -> VarId {
        let mut inner = self.inner.lock();
        let value = data_type.coerce(value.into());
        if let Some(&id) = inner.by_name.get(name) {
            if let Some(slot) = inner.slots.get_mut(&id) {
                slot.data_type = data_type;
                slot.value = value;
                slot.pinned = true;
            }
            return id;
        }
        inner.insert(Slot {
            name: name.to_string(),
            value,
            data_type,
            attachments: 0,
            pinned: true,
            conversion: None,
            enums: Vec::new(),
            owner_pid: None,
        })
    }

    pub fn set_conversion(&self, name: &str, conversion: Conversion) -> bool {
        self.with_slot(name, |slot| slot.conversion = Some(conversion))
    }

    pub fn add_enum(&self, name: &str, text: &str, value: i64) -> bool {
        self.with_slot(name, |slot| slot.enums.push((text.to_string(), value)))
    }

    pub fn set_process_state(&self, process: &str, state: ProcessState) {
        self.inner.lock().processes.insert(process.to_string(), state);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.lock().by_name.contains_key(name)
    }

    pub fn value(&self, name: &str) -> Option<TypedValue> {
        let inner = self.inner.lock();
        let id = inner.by_name.get(name)?;
        inner.slots.get(id).map(|slot| slot.value)
    }

    /// Current attachment count of a variable
    pub fn attachments(&self, name: &str) -> Option<u32> {
        let inner = self.inner.lock();
        let id = inner.by_name.get(name)?;
        inner.slots.get(id).map(|slot| slot.attachments)
    }

    /// Process that created the variable through name resolution
    pub fn owner(&self, name: &str) -> Option<i32> {
        let inner = self.inner.lock();
        let id = inner.by_name.get(name)?;
        inner.slots.get(id).and_then(|slot| slot.owner_pid)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registration numbers of the programs currently live
    pub fn live_equations(&self) -> Vec<u64> {
        let mut live: Vec<u64> = self.inner.lock().equations.iter().copied().collect();
        live.sort_unstable();
        live
    }

    fn with_slot(&self, name: &str, f: impl FnOnce(&mut Slot)) -> bool {
        let mut inner = self.inner.lock();
        let Some(&id) = inner.by_name.get(name) else {
            return false;
        };
        match inner.slots.get_mut(&id) {
            Some(slot) => {
                f(slot);
                true
            }
            None => false,
        }
    }
}

impl VariableStore for MemoryStore {
    fn lookup(&self, name: &str) -> Option<VarId> {
        self.inner.lock().by_name.get(name).copied()
    }

    fn resolve_or_create_variable(
        &self,
        name: &str,
        policy: ExistPolicy,
        owner_pid: Option<i32>,
    ) -> Result<Binding, BindError> {
        let mut inner = self.inner.lock();
        if let Some(&id) = inner.by_name.get(name) {
            if let Some(slot) = inner.slots.get_mut(&id) {
                slot.attachments += 1;
            }
            return Ok(Binding { id, created: false });
        }
        if policy == ExistPolicy::MustExist {
            return Err(BindError::NotFound(name.to_string()));
        }
        let id = inner.insert(Slot {
            name: name.to_string(),
            value: TypedValue::f64(0.0),
            data_type: DataType::Unknown,
            attachments: 1,
            pinned: false,
            conversion: None,
            enums: Vec::new(),
            owner_pid,
        });
        Ok(Binding { id, created: true })
    }

    fn read_variable(&self, id: VarId) -> TypedValue {
        self.inner
            .lock()
            .slots
            .get(&id)
            .map(|slot| slot.value)
            .unwrap_or_default()
    }

    fn write_variable(
        &self,
        id: VarId,
        value: TypedValue,
        _lock_held: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let slot = inner
            .slots
            .get_mut(&id)
            .ok_or(StoreError::UnknownVariable(id))?;
        slot.value = slot.data_type.coerce(value);
        Ok(())
    }

    fn attach(&self, id: VarId) {
        if let Some(slot) = self.inner.lock().slots.get_mut(&id) {
            slot.attachments += 1;
        }
    }

    fn detach(&self, id: VarId) {
        let mut inner = self.inner.lock();
        let remove = match inner.slots.get_mut(&id) {
            Some(slot) => {
                slot.attachments = slot.attachments.saturating_sub(1);
                slot.attachments == 0 && !slot.pinned
            }
            None => false,
        };
        if remove {
            if let Some(slot) = inner.slots.remove(&id) {
                inner.by_name.remove(&slot.name);
            }
        }
    }

    fn data_type(&self, id: VarId) -> DataType {
        self.inner
            .lock()
            .slots
            .get(&id)
            .map(|slot| slot.data_type)
            .unwrap_or_default()
    }

    fn has_conversion(&self, id: VarId) -> bool {
        self.inner
            .lock()
            .slots
            .get(&id)
            .is_some_and(|slot| slot.conversion.is_some())
    }

    fn read_physical(&self, id: VarId) -> Result<f64, StoreError> {
        let inner = self.inner.lock();
        let slot = inner.slots.get(&id).ok_or(StoreError::UnknownVariable(id))?;
        let conv = slot.conversion.ok_or(StoreError::NoConversion(id))?;
        Ok(slot.value.to_f64() * conv.factor + conv.offset)
    }

    fn write_physical(&self, id: VarId, value: f64, _lock_held: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let slot = inner
            .slots
            .get_mut(&id)
            .ok_or(StoreError::UnknownVariable(id))?;
        let conv = slot.conversion.ok_or(StoreError::NoConversion(id))?;
        if conv.factor == 0.0 {
            return Err(StoreError::NoConversion(id));
        }
        let raw = (value - conv.offset) / conv.factor;
        slot.value = slot.data_type.coerce(TypedValue::f64(raw));
        Ok(())
    }

    fn enum_value(&self, id: VarId, text: &str) -> Option<i64> {
        let inner = self.inner.lock();
        inner
            .slots
            .get(&id)?
            .enums
            .iter()
            .find(|(t, _)| t == text)
            .map(|&(_, v)| v)
    }

    fn process_state(&self, process: &str) -> ProcessState {
        self.inner
            .lock()
            .processes
            .get(process)
            .copied()
            .unwrap_or_default()
    }

    fn attach_equation(&self, registration: u64) {
        self.inner.lock().equations.insert(registration);
    }

    fn detach_equation(&self, registration: u64) {
        self.inner.lock().equations.remove(&registration);
    }
}
