//! Minimal payload encoders for synthesizing functions richer than a bare
//! return. Word-producing pure functions only; relocation, labels and
//! register allocation belong to the generator layer, not here.

#[cfg(target_arch = "aarch64")]
pub use crate::selfmod_core::arm64_encoder::{encode_movz_w, encode_nop};

#[cfg(target_arch = "x86_64")]
pub use crate::selfmod_core::amd64_encoder::{encode_mov_eax_ret, encode_nop_word};
