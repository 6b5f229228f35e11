#![cfg(target_arch = "x86_64")]

use crate::selfmod_core::common::InstructionWord;

/// `mov eax, imm32; ret`, padded with `nop` to a whole number of 32-bit
/// instruction words. x86-64 encodings are variable length, so the byte
/// sequence (B8 imm32 C3 90 90) is repacked little-endian into two words.
pub fn encode_mov_eax_ret(value: u32) -> [InstructionWord; 2] {
    let imm = value.to_le_bytes();
    [
        InstructionWord::from_le_bytes([0xB8, imm[0], imm[1], imm[2]]),
        InstructionWord::from_le_bytes([imm[3], 0xC3, 0x90, 0x90]),
    ]
}

/// Four single-byte `nop`s packed into one instruction word.
pub fn encode_nop_word() -> InstructionWord {
    0x9090_9090
}
