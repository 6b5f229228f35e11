//! # selfmod
//!
//! **selfmod** is the self-modifying-code support layer of a memory-model
//! litmus-test harness: it lets the harness synthesize tiny test programs
//! into executable buffers at runtime and guarantees those buffers execute
//! the bytes that were just written, despite split instruction and data
//! caches.
//!
//! On architectures such as AArch64 the instruction cache is not coherent
//! with the data cache. A store that rewrites an instruction word lands in
//! the data cache, while the fetch unit may keep executing a stale copy from
//! the instruction cache. The harness must therefore push every freshly
//! written word through an architecture-mandated maintenance sequence before
//! transferring control into it. This crate packages that sequence, plus a
//! probe that recovers the toolchain's own encoding of a "return from
//! subroutine" instruction, behind a typed interface.
//!
//! ## Entry points
//!
//! Two primitives compose into "executable-code synthesis":
//!
//! - [`synchronize_instruction_cache`]: given the address of a just-written
//!   instruction word, forces it through the data-cache to instruction-cache
//!   visibility pipeline.
//! - [`probe_return_encoding`]: determines, at runtime, the exact bit
//!   pattern the current toolchain uses for a subroutine return, by emitting
//!   a throwaway instruction sequence and reading back its own bytes. No
//!   opcode tables to maintain; the extracted encoding is by construction
//!   the one the compiler itself emits.
//!
//! [`synchronize_instruction_cache`]: interface::code::synchronize_instruction_cache
//! [`probe_return_encoding`]: interface::code::probe_return_encoding
//!
//! ## The buffer state machine
//!
//! Writing bytes and making them executable are separated by the type
//! system. A [`CodeBuffer`](interface::code::CodeBuffer) accepts instruction
//! words; the only way to obtain a callable
//! [`SyncedCode`](interface::code::SyncedCode) is to consume the buffer
//! through `synchronize()`, which performs the cache maintenance for the
//! whole written region. Code that skips the barrier does not compile.
//!
//! ```rust
//! use selfmod::interface::code::*;
//!
//! let mut buf = CodeBuffer::new(16);
//! buf.push_return();
//! let code = buf.synchronize();
//!
//! let f: extern "C" fn() = unsafe { std::mem::transmute(code.entry().as_ptr()) };
//! f(); // returns immediately, like any other function
//! ```
//!
//! A `SyncedCode` can be `reset()` back into a writable `CodeBuffer`, which
//! is how a litmus harness reuses one mapping across thousands of
//! write/synchronize/execute cycles.
//!
//! ## Supported targets
//!
//! - **AArch64**: the primary target; the barrier is the architectural
//!   `dc cvau; dsb sy; ic ivau; dsb sy; isb` sequence.
//! - **x86-64**: instruction and data caches are architecturally coherent;
//!   the barrier reduces to store/fetch ordering plus pipeline
//!   serialization.
//!
//! Linux, macOS (including Apple Silicon `MAP_JIT` regions) and Windows are
//! supported for buffer allocation.

mod selfmod_core;
pub mod interface;
