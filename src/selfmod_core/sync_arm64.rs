#![cfg(target_arch = "aarch64")]

use core::arch::asm;

use crate::selfmod_core::common::InstructionWord;
use crate::selfmod_core::sync_trait::SyncTrait;

pub(crate) struct SyncArm64;

impl SyncTrait for SyncArm64 {
    /// The architecture-mandated maintenance sequence, in order:
    ///
    /// 1. `dc cvau`: clean the data-cache line to the point of unification
    /// 2. `dsb sy`: make the clean globally visible
    /// 3. `ic ivau`: invalidate the instruction-cache line
    /// 4. `dsb sy`: complete the invalidate before proceeding
    /// 5. `isb`: flush speculative fetch/decode pipeline state
    ///
    /// The ordering must not change; the maintenance instructions operate on
    /// the whole cache line containing `address`.
    unsafe fn synchronize_instruction_word(address: *const InstructionWord) {
        asm!(
            "dc cvau, {addr}",
            "dsb sy",
            "ic ivau, {addr}",
            "dsb sy",
            "isb",
            addr = in(reg) address,
            options(nostack),
        );
    }

    /// Reads the `ret` encoding out of this function's own instruction
    /// stream: compute the address of a label placed on a `ret`, load the
    /// word under the label, and branch over it so the `ret` itself never
    /// executes. Instruction memory is addressable as data, so no opcode
    /// table is needed and the extracted word is exactly what the toolchain
    /// emitted.
    fn probe_return_encoding() -> InstructionWord {
        let word: u32;
        unsafe {
            asm!(
                "adr {scratch}, 2f",
                "ldr {word:w}, [{scratch}]",
                "b 3f",
                "2:",
                "ret",
                "3:",
                scratch = out(reg) _,
                word = out(reg) word,
                options(nostack),
            );
        }
        word
    }
}
