//! Binary encoding of Hack instructions.
//!
//! Mnemonic tables use perfect hash functions (PHF): the hash maps are
//! computed at compile time, so every lookup is O(1) with no runtime setup.
//! Unknown mnemonics are fatal; there is no default encoding.

use crate::AssembleError;
use phf::phf_map;

/// Destination mnemonic to binary code mapping (3 bits).
///
/// The empty string is the null destination.
static DEST_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "" => "000",
    "M" => "001",
    "D" => "010",
    "MD" => "011",
    "A" => "100",
    "AM" => "101",
    "AD" => "110",
    "AMD" => "111",
};

/// Computation mnemonic to binary code mapping (7 bits: `a` + `cccccc`).
///
/// The leading bit selects the second ALU operand: 0 for A, 1 for M.
static COMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    // a=0 (A register operations)
    "0" => "0101010",
    "1" => "0111111",
    "-1" => "0111010",
    "D" => "0001100",
    "A" => "0110000",
    "!D" => "0001101",
    "!A" => "0110001",
    "-D" => "0001111",
    "-A" => "0110011",
    "D+1" => "0011111",
    "A+1" => "0110111",
    "D-1" => "0001110",
    "A-1" => "0110010",
    "D+A" => "0000010",
    "D-A" => "0010011",
    "A-D" => "0000111",
    "D&A" => "0000000",
    "D|A" => "0010101",

    // a=1 (M register operations)
    "M" => "1110000",
    "!M" => "1110001",
    "-M" => "1110011",
    "M+1" => "1110111",
    "M-1" => "1110010",
    "D+M" => "1000010",
    "D-M" => "1010011",
    "M-D" => "1000111",
    "D&M" => "1000000",
    "D|M" => "1010101",
};

/// Jump mnemonic to binary code mapping (3 bits).
///
/// The empty string is no jump.
static JUMP_MAP: phf::Map<&'static str, &'static str> = phf_map! {
    "" => "000",
    "JGT" => "001",
    "JEQ" => "010",
    "JGE" => "011",
    "JLT" => "100",
    "JNE" => "101",
    "JLE" => "110",
    "JMP" => "111",
};

/// Translates a destination mnemonic to its 3-bit code.
#[inline]
pub fn dest(mnemonic: &str) -> Result<&'static str, AssembleError> {
    DEST_MAP
        .get(mnemonic)
        .copied()
        .ok_or_else(|| AssembleError::UnknownDest(mnemonic.to_string()))
}

/// Translates a computation mnemonic to its 7-bit code.
#[inline]
pub fn comp(mnemonic: &str) -> Result<&'static str, AssembleError> {
    COMP_MAP
        .get(mnemonic)
        .copied()
        .ok_or_else(|| AssembleError::UnknownComp(mnemonic.to_string()))
}

/// Translates a jump mnemonic to its 3-bit code.
#[inline]
pub fn jump(mnemonic: &str) -> Result<&'static str, AssembleError> {
    JUMP_MAP
        .get(mnemonic)
        .copied()
        .ok_or_else(|| AssembleError::UnknownJump(mnemonic.to_string()))
}

/// Encodes a complete C-instruction.
///
/// C-instruction format: `111accccccdddjjj` (16 bits). Missing dest and
/// jump fields encode as their null rows.
///
/// # Errors
/// Returns [`AssembleError`] when any field is not a known mnemonic.
///
/// # Example
/// ```
/// use hack_assembler::code::encode_compute;
/// let instruction = encode_compute(Some("D"), "D+1", None).unwrap();
/// assert_eq!(instruction, "1110011111010000");
/// ```
#[inline]
pub fn encode_compute(
    dest_mnemonic: Option<&str>,
    comp_mnemonic: &str,
    jump_mnemonic: Option<&str>,
) -> Result<String, AssembleError> {
    Ok(format!(
        "111{}{}{}",
        comp(comp_mnemonic)?,
        dest(dest_mnemonic.unwrap_or(""))?,
        jump(jump_mnemonic.unwrap_or(""))?
    ))
}

/// Encodes an A-instruction: `0` followed by the 15-bit address.
///
/// # Example
/// ```
/// use hack_assembler::code::encode_address;
/// assert_eq!(encode_address(100), "0000000001100100");
/// ```
#[inline]
#[must_use]
pub fn encode_address(address: u16) -> String {
    format!("{address:016b}")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dest_translations() {
        assert_eq!(dest("").unwrap(), "000");
        assert_eq!(dest("M").unwrap(), "001");
        assert_eq!(dest("D").unwrap(), "010");
        assert_eq!(dest("MD").unwrap(), "011");
        assert_eq!(dest("A").unwrap(), "100");
        assert_eq!(dest("AM").unwrap(), "101");
        assert_eq!(dest("AD").unwrap(), "110");
        assert_eq!(dest("AMD").unwrap(), "111");
    }

    #[test]
    fn test_comp_translations() {
        // a=0 rows
        assert_eq!(comp("0").unwrap(), "0101010");
        assert_eq!(comp("1").unwrap(), "0111111");
        assert_eq!(comp("D").unwrap(), "0001100");
        assert_eq!(comp("A").unwrap(), "0110000");
        assert_eq!(comp("D+A").unwrap(), "0000010");
        assert_eq!(comp("D&A").unwrap(), "0000000");

        // a=1 rows
        assert_eq!(comp("M").unwrap(), "1110000");
        assert_eq!(comp("D+M").unwrap(), "1000010");
        assert_eq!(comp("D&M").unwrap(), "1000000");
    }

    #[test]
    fn test_jump_translations() {
        assert_eq!(jump("").unwrap(), "000");
        assert_eq!(jump("JGT").unwrap(), "001");
        assert_eq!(jump("JEQ").unwrap(), "010");
        assert_eq!(jump("JGE").unwrap(), "011");
        assert_eq!(jump("JLT").unwrap(), "100");
        assert_eq!(jump("JNE").unwrap(), "101");
        assert_eq!(jump("JLE").unwrap(), "110");
        assert_eq!(jump("JMP").unwrap(), "111");
    }

    #[test]
    fn test_unknown_mnemonics_are_fatal() {
        assert!(matches!(dest("X"), Err(AssembleError::UnknownDest(_))));
        assert!(matches!(comp("D*M"), Err(AssembleError::UnknownComp(_))));
        assert!(matches!(jump("JNZ"), Err(AssembleError::UnknownJump(_))));
    }

    #[test]
    fn test_encode_compute() {
        // D=D+1
        assert_eq!(
            encode_compute(Some("D"), "D+1", None).unwrap(),
            "1110011111010000"
        );
        // MD=M-1;JEQ
        assert_eq!(
            encode_compute(Some("MD"), "M-1", Some("JEQ")).unwrap(),
            "1111110010011010"
        );
        // 0;JMP (unconditional jump)
        assert_eq!(
            encode_compute(None, "0", Some("JMP")).unwrap(),
            "1110101010000111"
        );
        // M=1
        assert_eq!(
            encode_compute(Some("M"), "1", None).unwrap(),
            "1110111111001000"
        );
    }

    #[test]
    fn test_encode_address() {
        assert_eq!(encode_address(0), "0000000000000000");
        assert_eq!(encode_address(100), "0000000001100100");
        assert_eq!(encode_address(16384), "0100000000000000");
        assert_eq!(encode_address(32767), "0111111111111111");
    }

    #[test]
    fn test_roundtrip_every_comp_row() {
        // assemble(disassemble(bin)) must reproduce bin for every table row
        for (comp_mn, _) in COMP_MAP.entries() {
            let encoded = encode_compute(Some("D"), comp_mn, Some("JMP")).unwrap();
            let (dest_mn, comp_back, jump_mn) = invert::disassemble(&encoded).unwrap();
            let reencoded =
                encode_compute(dest_mn.as_deref(), &comp_back, jump_mn.as_deref()).unwrap();
            assert_eq!(encoded, reencoded);
        }
    }
}
