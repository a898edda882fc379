//! Synchronization primitives shared by the compiler, the VM and the stores.
//!
//! We use parking_lot because:
//! - Locks are not poisoned, a panicking plugin cannot wedge the registry.
//! - The uncontended path is cheaper, and stores are read on every instruction.

pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
pub use std::sync::Arc;
