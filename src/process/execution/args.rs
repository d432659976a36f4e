/*!
 * Argument Block
 *
 * Kernel-owned copy of an exec() program path and argument vector, packed
 * into one contiguous buffer of NUL-terminated strings.
 */

use crate::core::errors::KernelError;
use crate::core::types::KernelResult;
use std::fmt;

/// Contiguous `path\0arg0\0arg1\0...` buffer with per-argument offsets
#[derive(Clone, PartialEq, Eq)]
pub struct ArgBlock {
    buf: Vec<u8>,
    /// Offset of each argument's first byte; the path always starts at 0
    offsets: Vec<usize>,
}

impl ArgBlock {
    /// Wrap a packed buffer, checking layout and encoding
    pub(crate) fn from_parts(buf: Vec<u8>, offsets: Vec<usize>) -> KernelResult<Self> {
        let block = Self { buf, offsets };
        block.check()?;
        Ok(block)
    }

    /// Pack owned strings, for callers that already hold kernel copies
    pub fn from_strs<S: AsRef<str>>(program: &str, args: &[S]) -> KernelResult<Self> {
        let total = program.len() + 1 + args.iter().map(|a| a.as_ref().len() + 1).sum::<usize>();
        let mut buf = Vec::new();
        buf.try_reserve_exact(total)?;
        let mut offsets = Vec::with_capacity(args.len());

        buf.extend_from_slice(program.as_bytes());
        buf.push(0);
        for arg in args {
            offsets.push(buf.len());
            buf.extend_from_slice(arg.as_ref().as_bytes());
            buf.push(0);
        }
        Self::from_parts(buf, offsets)
    }

    fn check(&self) -> KernelResult<()> {
        let mut starts = std::iter::once(0).chain(self.offsets.iter().copied());
        starts.try_for_each(|start| {
            let s = self.c_str_at(start).ok_or_else(|| {
                KernelError::invalid_argument(format!("argument at offset {start} is unterminated"))
            })?;
            std::str::from_utf8(s)
                .map(|_| ())
                .map_err(|_| KernelError::invalid_argument("exec arguments must be UTF-8"))
        })
    }

    fn c_str_at(&self, start: usize) -> Option<&[u8]> {
        let tail = self.buf.get(start..)?;
        let len = tail.iter().position(|b| *b == 0)?;
        Some(&tail[..len])
    }

    fn str_at(&self, start: usize) -> &str {
        // Layout and encoding were verified in `check`
        self.c_str_at(start)
            .and_then(|s| std::str::from_utf8(s).ok())
            .unwrap_or_default()
    }

    /// Program path
    pub fn program(&self) -> &str {
        self.str_at(0)
    }

    /// Number of arguments (argv[0] included)
    #[inline]
    pub fn argc(&self) -> usize {
        self.offsets.len()
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.offsets.get(index).map(|start| self.str_at(*start))
    }

    /// Arguments in their original order
    pub fn args(&self) -> impl Iterator<Item = &str> + '_ {
        self.offsets.iter().map(|start| self.str_at(*start))
    }

    /// Offsets of each argument within [`ArgBlock::as_bytes`]
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// The packed buffer, terminators included
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn total_bytes(&self) -> usize {
        self.buf.len()
    }
}

impl fmt::Debug for ArgBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgBlock")
            .field("program", &self.program())
            .field("args", &self.args().collect::<Vec<_>>())
            .finish()
    }
}
