use std::mem::ManuallyDrop;
use std::sync::OnceLock;

use crate::interface::code_ptr::CodePtr;
use crate::selfmod_core::common;
use crate::selfmod_core::common::WORD_SIZE;
use crate::selfmod_core::internal;

pub use crate::selfmod_core::common::InstructionWord;

/// Forces the instruction word at `address` through the data-cache to
/// instruction-cache visibility pipeline.
///
/// Call this immediately after writing each instruction word into a buffer
/// destined to be executed, before transferring control into that buffer.
/// The maintenance instructions operate on whole cache lines, so one call
/// also covers a short contiguous run of words sharing the line at
/// `address`.
///
/// Safe to invoke concurrently from multiple threads on different
/// addresses; callers racing to write-then-synchronize *overlapping*
/// instruction memory must serialize those writes themselves.
///
/// # Safety
///
/// `address` must be valid, mapped, and contain the bytes intended to
/// execute. An invalid address is undefined behavior at the hardware level,
/// not a reportable error.
///
/// # Example
///
/// ```rust
/// use selfmod::interface::code::*;
///
/// let mut buf = CodeBuffer::new(4);
/// buf.push_return();
/// // `CodeBuffer::synchronize` does this for the whole region; the
/// // per-word entry point serves callers managing their own memory.
/// unsafe { synchronize_instruction_cache(buf.as_ptr() as *const InstructionWord) };
/// ```
pub unsafe fn synchronize_instruction_cache(address: *const InstructionWord) {
    internal::sync_instruction_word(address);
}

/// Returns the 32-bit encoding the active toolchain produces for a "return
/// from subroutine" instruction, by reading back its own machine code.
///
/// Deterministic for a given toolchain/architecture/ABI combination. Each
/// call re-runs the probe; use [`return_encoding`] for the cached value.
///
/// # Example
///
/// ```rust
/// use selfmod::interface::code::probe_return_encoding;
///
/// #[cfg(target_arch = "aarch64")]
/// assert_eq!(probe_return_encoding(), 0xD65F03C0); // ret (x30)
///
/// #[cfg(target_arch = "x86_64")]
/// assert_eq!(probe_return_encoding(), 0x909090C3); // ret; nop; nop; nop
/// ```
pub fn probe_return_encoding() -> InstructionWord {
    internal::probe_return_word()
}

/// The probed return encoding, cached for the process lifetime.
pub fn return_encoding() -> InstructionWord {
    static RETURN_WORD: OnceLock<InstructionWord> = OnceLock::new();
    *RETURN_WORD.get_or_init(probe_return_encoding)
}

/// A writable region of executable-capable memory being filled with
/// instruction words.
///
/// `CodeBuffer` is the *written* state of the buffer lifecycle. Words pushed
/// here land in the data cache only; the sole way to obtain something
/// callable is [`CodeBuffer::synchronize`], which performs the coherence
/// barrier over the written region and returns the [`SyncedCode`] state.
/// Skipping the barrier is a type error, not a runtime surprise.
///
/// The buffer owns its mapping; dropping it in either state unmaps the
/// region. `CodeBuffer` is not `Send`: each thread drives its own buffers.
pub struct CodeBuffer {
    ptr: *mut u8,
    len: usize,
    capacity: usize,
}

impl CodeBuffer {
    /// Allocates a buffer with room for at least `capacity_words`
    /// instruction words, rounded up to a whole page.
    ///
    /// # Panics
    ///
    /// Panics if `capacity_words` is zero or the operating system refuses
    /// the mapping.
    pub fn new(capacity_words: usize) -> Self {
        assert!(capacity_words > 0, "Code buffer capacity must be non-zero");

        let capacity = common::round_to_page(
            capacity_words
                .checked_mul(WORD_SIZE)
                .expect("Code buffer capacity overflow"),
        );
        let ptr = common::allocate_code_memory(capacity);

        Self {
            ptr,
            len: 0,
            capacity,
        }
    }

    /// Appends one instruction word.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is full. A synthesized litmus program has a
    /// known, small size; running out of room means the caller sized the
    /// buffer wrong, which is not recoverable mid-synthesis.
    pub fn push(&mut self, word: InstructionWord) {
        if self.len + WORD_SIZE > self.capacity {
            panic!(
                "Code buffer is full: {} of {} bytes written",
                self.len, self.capacity
            );
        }

        unsafe { common::write_word(self.ptr.add(self.len), word) };
        self.len += WORD_SIZE;
    }

    /// Appends the toolchain's return instruction, probing it on first use.
    pub fn push_return(&mut self) {
        self.push(return_encoding());
    }

    /// Number of instruction words written so far.
    pub fn word_count(&self) -> usize {
        self.len / WORD_SIZE
    }

    /// Total number of instruction words the mapping can hold. At least the
    /// capacity requested at construction; page rounding may add room.
    pub fn capacity_words(&self) -> usize {
        self.capacity / WORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Base address of the region. The address is not executable-safe until
    /// the buffer has been synchronized.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    /// Performs the coherence barrier over every word written and moves the
    /// buffer into its executable state.
    ///
    /// This is the only legal *written → synchronized* transition. After it
    /// returns, any core fetching from the region observes the newly
    /// written words.
    pub fn synchronize(self) -> SyncedCode {
        unsafe { common::synchronize_region(self.ptr, self.len) };

        let buf = ManuallyDrop::new(self);
        SyncedCode {
            ptr: buf.ptr,
            len: buf.len,
            capacity: buf.capacity,
        }
    }

    /// Skips the coherence barrier and declares the buffer executable
    /// anyway.
    ///
    /// This exists for one purpose: demonstrating, on real hardware, that
    /// the barrier does real work: a stale-fetch diagnostic can compare
    /// runs with and without it. Never use this on a code path that matters.
    ///
    /// # Safety
    ///
    /// Executing the returned code may fetch stale or torn instructions
    /// nondeterministically. The caller accepts whatever the fetch unit
    /// happens to observe.
    pub unsafe fn assume_synchronized(self) -> SyncedCode {
        let buf = ManuallyDrop::new(self);
        SyncedCode {
            ptr: buf.ptr,
            len: buf.len,
            capacity: buf.capacity,
        }
    }
}

impl Drop for CodeBuffer {
    fn drop(&mut self) {
        unsafe { common::free_code_memory(self.ptr, self.capacity) };
    }
}

/// The executable state of a code buffer: every written word has passed
/// through the coherence barrier.
///
/// Holding a `SyncedCode` is the proof of synchronization; there is no
/// separate token. The value exposes its entry address and can be
/// [`reset`](SyncedCode::reset) back into a writable [`CodeBuffer`] for the
/// next write/synchronize/execute cycle.
pub struct SyncedCode {
    ptr: *mut u8,
    len: usize,
    capacity: usize,
}

impl SyncedCode {
    /// Entry address of the synthesized code.
    ///
    /// # Panics
    ///
    /// Panics if the buffer was synchronized while empty; there is no
    /// instruction to enter.
    pub fn entry(&self) -> CodePtr {
        assert!(self.len > 0, "Synchronized buffer contains no instructions");

        unsafe { CodePtr::new(self.ptr as *const ()) }
    }

    /// Number of instruction words in the synthesized code.
    pub fn word_count(&self) -> usize {
        self.len / WORD_SIZE
    }

    /// Returns the region to its writable state, discarding the current
    /// contents.
    ///
    /// The mapping is reused; only the write cursor is rewound. Words
    /// written after `reset` require a fresh `synchronize` before the
    /// region may execute again.
    pub fn reset(self) -> CodeBuffer {
        let code = ManuallyDrop::new(self);
        CodeBuffer {
            ptr: code.ptr,
            len: 0,
            capacity: code.capacity,
        }
    }
}

impl Drop for SyncedCode {
    fn drop(&mut self) {
        unsafe { common::free_code_memory(self.ptr, self.capacity) };
    }
}
