/*!
 * Process Execution
 * exec() argument marshalling and program image replacement
 */

mod args;
mod replacer;

pub use args::ArgBlock;
pub use replacer::{ImageReplacer, LoadedImage, ProgramLoader, ProgramRegistry};
