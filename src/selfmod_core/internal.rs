use crate::selfmod_core::common::InstructionWord;
use crate::selfmod_core::sync_trait::SyncTrait;

#[cfg(target_arch = "aarch64")]
use super::sync_arm64::SyncArm64;

#[cfg(target_arch = "x86_64")]
use super::sync_amd64::SyncAmd64;

/// Build-time dispatch to the architecture's coherence barrier.
///
/// # Safety
///
/// See [`SyncTrait::synchronize_instruction_word`].
pub(crate) unsafe fn sync_instruction_word(address: *const InstructionWord) {
    #[cfg(target_arch = "aarch64")]
    {
        SyncArm64::synchronize_instruction_word(address)
    }

    #[cfg(target_arch = "x86_64")]
    {
        SyncAmd64::synchronize_instruction_word(address)
    }
}

/// Build-time dispatch to the architecture's return-encoding probe.
pub(crate) fn probe_return_word() -> InstructionWord {
    #[cfg(target_arch = "aarch64")]
    {
        SyncArm64::probe_return_encoding()
    }

    #[cfg(target_arch = "x86_64")]
    {
        SyncAmd64::probe_return_encoding()
    }
}
