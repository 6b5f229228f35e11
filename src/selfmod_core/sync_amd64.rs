#![cfg(target_arch = "x86_64")]

use core::arch::asm;

use crate::selfmod_core::common::InstructionWord;
use crate::selfmod_core::sync_trait::SyncTrait;

pub(crate) struct SyncAmd64;

impl SyncTrait for SyncAmd64 {
    /// x86-64 keeps the instruction and data caches architecturally
    /// coherent, so no cache-line maintenance is required. What remains is
    /// ordering: the store of the new instruction word must complete before
    /// any subsequent fetch, and the front end must not run ahead on stale
    /// bytes. `mfence` orders the store; `lfence` serializes instruction
    /// dispatch behind it.
    unsafe fn synchronize_instruction_word(address: *const InstructionWord) {
        let _ = address;
        asm!("mfence", "lfence", options(nostack, preserves_flags));
    }

    /// Same self-extraction technique as on AArch64, adjusted for variable
    /// length encoding: `ret` is a single byte, so the probed sequence pads
    /// it with three `nop` bytes to fill one 32-bit instruction word. The
    /// padded word is itself a valid epilogue when written to a buffer.
    fn probe_return_encoding() -> InstructionWord {
        let word: u32;
        unsafe {
            asm!(
                "lea {scratch}, [rip + 2f]",
                "mov {word:e}, dword ptr [{scratch}]",
                "jmp 3f",
                "2:",
                "ret",
                "nop",
                "nop",
                "nop",
                "3:",
                scratch = out(reg) _,
                word = out(reg) word,
                options(nostack),
            );
        }
        word
    }
}
