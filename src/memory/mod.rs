/*!
 * Memory
 * Caller-controlled address spaces and the fault-checked copy routines
 */

mod user;

pub use user::{UserMemory, UserPtr};
