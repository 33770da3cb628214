//! Serial link byte shaping
//!
//! A serial line carries 5 to 8 data bits per character. Outgoing bytes are
//! masked to that width, and with `last_bit` termination the top data bit of
//! the final byte doubles as the end-of-message flag.

use crate::error::ShapeError;

/// How a serial session marks the end of a message (`VI_ASRL_END_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SerialTermination {
    /// No end-of-message marker
    None,
    /// Top data bit of the last character
    LastBit,
    /// Termination character
    TerminationChar,
    /// Line break (write only)
    TerminationBreak,
}

impl SerialTermination {
    /// VISA numeric value
    pub fn code(&self) -> i64 {
        match self {
            SerialTermination::None => 0,
            SerialTermination::LastBit => 1,
            SerialTermination::TerminationChar => 2,
            SerialTermination::TerminationBreak => 3,
        }
    }

    /// Decode a VISA numeric value
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SerialTermination::None),
            1 => Some(SerialTermination::LastBit),
            2 => Some(SerialTermination::TerminationChar),
            3 => Some(SerialTermination::TerminationBreak),
            _ => None,
        }
    }
}

/// Mask covering the low `bits` bits of a byte
pub fn data_mask(bits: u8) -> u8 {
    if bits >= 8 {
        0xFF
    } else {
        ((1u16 << bits) - 1) as u8
    }
}

/// Highest data bit for a given width
pub fn last_bit_mask(bits: u8) -> u8 {
    1 << (bits.clamp(1, 8) - 1)
}

/// Shape bytes for transmission on a serial link
///
/// With no `data_bits` the bytes pass through untouched. Otherwise every byte
/// is masked to the data width, and the top data bit of the last byte is
/// forced set (`send_end = Some(true)`), forced clear (`Some(false)`) or left
/// as masked (`None`).
pub fn shape_bytes(
    data: &[u8],
    data_bits: Option<u8>,
    send_end: Option<bool>,
) -> Result<Vec<u8>, ShapeError> {
    let Some(bits) = data_bits else {
        if send_end == Some(true) {
            return Err(ShapeError::SendEndWithoutWidth);
        }
        return Ok(data.to_vec());
    };
    if bits == 0 || bits > 8 {
        return Err(ShapeError::InvalidDataBits(bits));
    }

    let mask = data_mask(bits);
    let high = last_bit_mask(bits);

    let mut out: Vec<u8> = data.iter().map(|b| b & mask).collect();
    if let Some(last) = out.last_mut() {
        match send_end {
            Some(true) => *last |= high,
            Some(false) => *last &= !high,
            None => {}
        }
        tracing::trace!(last = *last, bits, ?send_end, "shaped serial end byte");
    }
    Ok(out)
}
