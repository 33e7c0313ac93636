//! Protocol commands
//!
//! Defines the closed command set of the front-end protocol and the pure
//! wire encoding. No I/O happens here, so the protocol table can be tested
//! without a port attached.

use serde::{Deserialize, Serialize};

/// Logical commands understood by the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Engage the bypass relay (`STB1`)
    BypassOn,

    /// Release the bypass relay (`STB0`)
    BypassOff,

    /// Step the filter frequency up (`ST-`, takes a magnitude)
    FilterStepUp,

    /// Step the filter frequency down (`ST+`, takes a magnitude)
    FilterStepDown,

    /// Re-home the filter stepper (`STr`)
    FilterStepReset,

    /// Force transmit mode on (`STT`)
    ModeTxOn,

    /// Force transmit mode off (`STR`)
    ModeTxOff,

    /// Request a status line (`ST?`)
    GetStatus,
}

impl Command {
    /// Get the fixed ASCII opcode sent on the wire.
    ///
    /// The step opcodes are sign-inverted relative to the logical frequency
    /// direction: stepping the frequency UP drives the stepper count DOWN,
    /// so `FilterStepUp` transmits `ST-` and `FilterStepDown` transmits
    /// `ST+`. This is the hardware's convention and must not be "fixed".
    pub fn prefix(&self) -> &'static str {
        match self {
            Command::BypassOn => "STB1",
            Command::BypassOff => "STB0",
            Command::FilterStepUp => "ST-",
            Command::FilterStepDown => "ST+",
            Command::FilterStepReset => "STr",
            Command::ModeTxOn => "STT",
            Command::ModeTxOff => "STR",
            Command::GetStatus => "ST?",
        }
    }

    /// Check if this command takes a step magnitude parameter
    pub fn takes_magnitude(&self) -> bool {
        matches!(self, Command::FilterStepUp | Command::FilterStepDown)
    }

    /// Check if the device answers this command with a response line
    pub fn expects_response(&self) -> bool {
        matches!(self, Command::GetStatus)
    }
}

/// Encode a command and its parameter into one wire line.
///
/// Concatenates `prefix + parameter` and terminates with exactly one `\n`,
/// stripping any line terminators the caller left on the parameter. The
/// parameter is empty for every command except the filter steps, which carry
/// their magnitude as a decimal string.
pub fn encode_command(command: Command, parameter: &str) -> String {
    let parameter = parameter.trim_end_matches(&['\r', '\n'][..]);
    let mut line = String::with_capacity(command.prefix().len() + parameter.len() + 1);
    line.push_str(command.prefix());
    line.push_str(parameter);
    line.push('\n');
    line
}
