//! Compiler configuration

use crate::store::ExistPolicy;
use equation_types::TypedValue;
use serde::{Deserialize, Serialize};

/// How name resolution treats variables the store does not know yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingVariables {
    /// Create missing variables on read and write
    #[default]
    AutoCreate,
    /// Like `AutoCreate`, but a direct evaluation removes the variables it
    /// created once it is done
    AutoCreateThenRemove,
    /// Reads create silently, writes create with a warning
    WarnOnWrite,
    /// Reads create silently, writes to a missing variable fail
    StopOnWrite,
    /// Reads and writes create with a warning
    WarnOnAccess,
    /// Every access to a missing variable fails
    StopOnAccess,
}

impl MissingVariables {
    /// Map the numeric modes used by older configuration files
    pub fn from_mode(mode: i32) -> Option<Self> {
        match mode {
            0 => Some(MissingVariables::WarnOnWrite),
            1 => Some(MissingVariables::AutoCreate),
            2 => Some(MissingVariables::AutoCreateThenRemove),
            3 => Some(MissingVariables::StopOnWrite),
            4 => Some(MissingVariables::WarnOnAccess),
            5 => Some(MissingVariables::StopOnAccess),
            _ => None,
        }
    }

    pub fn read_policy(self) -> ExistPolicy {
        match self {
            MissingVariables::AutoCreate
            | MissingVariables::AutoCreateThenRemove
            | MissingVariables::WarnOnWrite
            | MissingVariables::StopOnWrite => ExistPolicy::CreateIfMissing,
            MissingVariables::WarnOnAccess => ExistPolicy::ShouldExist,
            MissingVariables::StopOnAccess => ExistPolicy::MustExist,
        }
    }

    pub fn write_policy(self) -> ExistPolicy {
        match self {
            MissingVariables::AutoCreate | MissingVariables::AutoCreateThenRemove => {
                ExistPolicy::CreateIfMissing
            }
            MissingVariables::WarnOnWrite | MissingVariables::WarnOnAccess => {
                ExistPolicy::ShouldExist
            }
            MissingVariables::StopOnWrite | MissingVariables::StopOnAccess => {
                ExistPolicy::MustExist
            }
        }
    }

    /// Whether variables created by a direct evaluation are removed afterwards
    pub fn removes_created(self) -> bool {
        self == MissingVariables::AutoCreateThenRemove
    }
}

/// Meaning of `#` and `$` in an equation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Placeholder {
    /// Not allowed, a syntax error
    #[default]
    None,
    /// The execution parameter
    Parameter,
    /// A fixed literal
    Value(TypedValue),
    /// Another name for this variable
    Variable(String),
}

/// A variable whose reads yield a fixed value during direct evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceVariable {
    pub name: String,
    pub value: TypedValue,
}

/// Options applied to every compilation of one [`Compiler`](crate::Compiler)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub missing_variables: MissingVariables,
    /// Allow the CAN builtins
    pub can_commands: bool,
    /// Resolve names against the script scope first (direct evaluation only)
    pub script_locals: bool,
    pub placeholder: Placeholder,
    /// Process recorded as owner of variables created by name resolution
    pub owner_pid: Option<i32>,
    /// The caller holds the store's process-wide lock while compiling
    pub lock_held: bool,
    pub replace_variable: Option<ReplaceVariable>,
}
