//! Deterministic trace line formatting.

use std::io::{self, Write};

/// Appends trace records to an output stream, one line per step.
///
/// Three mutually exclusive line shapes:
///
/// 1. invalid opcode   — `name> offset rawbyte **********INVALID**********`
/// 2. no operand       — `name> offset MNEMONIC`
/// 3. with operand     — `name> offset MNEMONIC (operand)`
///
/// Writes are synchronous and single-writer: output order equals the order
/// of the calls.
pub struct TraceWriter<W: Write> {
    out: W,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Shape 1: the opcode byte is not an assigned opcode.
    pub fn invalid(&mut self, name: &str, offset: usize, raw_opcode: u8) -> io::Result<()> {
        writeln!(self.out, "{name}> {offset} {raw_opcode} **********INVALID**********")
    }

    /// Shape 2: an operand-less instruction.
    pub fn plain(&mut self, name: &str, offset: usize, mnemonic: &str) -> io::Result<()> {
        writeln!(self.out, "{name}> {offset} {mnemonic}")
    }

    /// Shape 3: an instruction with its resolved-or-raw operand text.
    pub fn operand(
        &mut self,
        name: &str,
        offset: usize,
        mnemonic: &str,
        operand: &str,
    ) -> io::Result<()> {
        writeln!(self.out, "{name}> {offset} {mnemonic} ({operand})")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
