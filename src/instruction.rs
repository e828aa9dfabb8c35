use std::{convert::TryFrom, fmt, str::FromStr};

use crate::error::{WagerError, WagerResult};

/// Which face of the coin the wager is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Side {
    Heads = 0,
    Tails = 1,
}

impl TryFrom<u8> for Side {
    type Error = WagerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::Heads),
            1 => Ok(Side::Tails),
            other => Err(WagerError::InvalidSide(other)),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heads" | "0" => Ok(Side::Heads),
            "tails" | "1" => Ok(Side::Tails),
            other => Err(format!("unknown side `{}`, expected heads or tails", other)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Heads => write!(f, "heads"),
            Side::Tails => write!(f, "tails"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WagerInstruction {
    /// Places a wager, moving the escrowed lamports under program control
    ///
    /// Accounts expected:
    ///
    /// 0. `[signer, writable]` The player's wallet, also the fee payer
    /// 1. `[writable]` The escrow account created earlier in the same transaction and owned by the program
    /// 2. `[writable]` The fee-collector account
    /// 3. `[writable]` The house account
    ///
    /// Every account the program touches must be listed here, otherwise the runtime refuses the instruction.
    PlaceWager {
        /// 0 for heads, 1 for tails
        side: Side,
    },
}

impl WagerInstruction {
    pub const PLACE_WAGER_TAG: u8 = 0;

    /// Unpacks a byte buffer into a [WagerInstruction](enum.WagerInstruction.html).
    pub fn unpack(input: &[u8]) -> WagerResult<Self> {
        let (tag, rest) = input.split_first().ok_or(WagerError::InvalidInstruction)?;

        Ok(match *tag {
            Self::PLACE_WAGER_TAG => Self::PlaceWager {
                side: Self::unpack_side(rest)?,
            },
            _ => return Err(WagerError::InvalidInstruction),
        })
    }

    fn unpack_side(input: &[u8]) -> WagerResult<Side> {
        match input {
            [side] => Side::try_from(*side),
            _ => Err(WagerError::InvalidInstruction),
        }
    }

    /// Two bytes: the instruction tag followed by the side byte.
    pub fn pack(&self) -> Vec<u8> {
        match self {
            Self::PlaceWager { side } => vec![Self::PLACE_WAGER_TAG, *side as u8],
        }
    }
}

/// Encodes a raw side byte into the place-wager payload.
///
/// Anything other than 0 or 1 is refused here, before a transaction is built.
pub fn encode(side: u8) -> WagerResult<[u8; 2]> {
    let side = Side::try_from(side)?;
    Ok([WagerInstruction::PLACE_WAGER_TAG, side as u8])
}
