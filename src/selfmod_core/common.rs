use std::ptr;

use cfg_if::cfg_if;

/// One machine-instruction encoding: a fixed-width 32-bit word.
///
/// Immutable once obtained. Produced by the return-encoding probe and by the
/// payload encoders; consumed while assembling instruction buffers.
pub type InstructionWord = u32;

/// Size in bytes of one [`InstructionWord`].
pub(crate) const WORD_SIZE: usize = std::mem::size_of::<InstructionWord>();

/// Rounds `n` up to a whole number of pages.
pub(crate) fn round_to_page(n: usize) -> usize {
    let page = page_size();
    n.checked_add(page - 1).expect("code region size overflow") & !(page - 1)
}

cfg_if! {
    if #[cfg(target_os = "windows")] {
        use crate::selfmod_core::winapi::*;

        pub(crate) fn page_size() -> usize {
            unsafe { get_page_size() }
        }

        /// Allocates `size` bytes of `PAGE_EXECUTE_READWRITE` memory.
        ///
        /// # Panics
        ///
        /// Panics if the operating system refuses the allocation. There is
        /// no recoverable-error path at this layer; a harness that cannot
        /// map a code page cannot run at all.
        pub(crate) fn allocate_code_memory(size: usize) -> *mut u8 {
            let ptr = unsafe {
                VirtualAlloc(
                    std::ptr::null_mut(),
                    size,
                    MEM_COMMIT | MEM_RESERVE,
                    PAGE_EXECUTE_READWRITE,
                )
            };

            if ptr.is_null() {
                panic!("Failed to allocate {size} bytes of executable memory");
            }

            ptr as *mut u8
        }

        /// Releases a region obtained from [`allocate_code_memory`].
        ///
        /// # Safety
        ///
        /// `ptr` must come from exactly one prior allocation, and no thread
        /// may still be executing inside the region.
        pub(crate) unsafe fn free_code_memory(ptr: *mut u8, _size: usize) {
            VirtualFree(ptr as *mut core::ffi::c_void, 0, MEM_RELEASE);
        }

        unsafe fn clear_icache_region(start: *mut u8, len: usize) {
            let process = GetCurrentProcess();
            let success =
                FlushInstructionCache(process, start as *const core::ffi::c_void, len);

            if success == 0 {
                panic!("FlushInstructionCache failed");
            }
        }
    } else if #[cfg(target_os = "macos")] {
        use crate::selfmod_core::macosapi::*;

        pub(crate) fn page_size() -> usize {
            unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
        }

        /// Allocates `size` bytes of `MAP_JIT` executable memory. Writes
        /// into the region must be bracketed by
        /// `pthread_jit_write_protect_np` (see [`write_word`]).
        ///
        /// # Panics
        ///
        /// Panics if the operating system refuses the mapping.
        pub(crate) fn allocate_code_memory(size: usize) -> *mut u8 {
            let ptr = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
                    libc::MAP_ANON | libc::MAP_PRIVATE | libc::MAP_JIT,
                    -1,
                    0,
                )
            };

            if ptr == libc::MAP_FAILED {
                panic!("Failed to allocate {size} bytes of executable memory");
            }

            ptr as *mut u8
        }

        /// Releases a region obtained from [`allocate_code_memory`].
        ///
        /// # Safety
        ///
        /// `ptr`/`size` must describe exactly one prior allocation, and no
        /// thread may still be executing inside the region.
        pub(crate) unsafe fn free_code_memory(ptr: *mut u8, size: usize) {
            libc::munmap(ptr as *mut libc::c_void, size);
        }

        unsafe fn clear_icache_region(start: *mut u8, len: usize) {
            sys_dcache_flush(start, len);
            sys_icache_invalidate(start, len);
        }
    } else {
        use crate::selfmod_core::linuxapi::*;

        pub(crate) fn page_size() -> usize {
            unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
        }

        /// Allocates `size` bytes of `PROT_READ | PROT_WRITE | PROT_EXEC`
        /// memory.
        ///
        /// # Panics
        ///
        /// Panics if the operating system refuses the mapping. There is no
        /// recoverable-error path at this layer; a harness that cannot map
        /// a code page cannot run at all.
        pub(crate) fn allocate_code_memory(size: usize) -> *mut u8 {
            let ptr = unsafe {
                libc::mmap(
                    std::ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
                    libc::MAP_ANONYMOUS | libc::MAP_PRIVATE,
                    -1,
                    0,
                )
            };

            if ptr == libc::MAP_FAILED {
                panic!("Failed to allocate {size} bytes of executable memory");
            }

            ptr as *mut u8
        }

        /// Releases a region obtained from [`allocate_code_memory`].
        ///
        /// # Safety
        ///
        /// `ptr`/`size` must describe exactly one prior allocation, and no
        /// thread may still be executing inside the region.
        pub(crate) unsafe fn free_code_memory(ptr: *mut u8, size: usize) {
            libc::munmap(ptr as *mut libc::c_void, size);
        }

        unsafe fn clear_icache_region(start: *mut u8, len: usize) {
            __clear_cache(start, start.add(len));
        }
    }
}

/// Stores one instruction word at `dest`, little-endian.
///
/// The store lands in the data cache only; the word must not be executed
/// until it has been synchronized.
///
/// # Safety
///
/// `dest` must be 4-byte aligned and point into a live code region.
pub(crate) unsafe fn write_word(dest: *mut u8, word: InstructionWord) {
    #[cfg(target_os = "macos")]
    libc::pthread_jit_write_protect_np(0);

    let bytes = word.to_le_bytes();
    ptr::copy_nonoverlapping(bytes.as_ptr(), dest, WORD_SIZE);

    #[cfg(target_os = "macos")]
    libc::pthread_jit_write_protect_np(1);
}

/// Region-wide cache maintenance: makes every instruction word in
/// `[start, start + len)` visible to the instruction fetch unit.
///
/// This is the bulk counterpart of the per-word barrier in `sync_arm64` /
/// `sync_amd64`: each OS exposes a maintenance call that walks the region
/// at the hardware's cache-line granularity, and on AArch64 the pipeline
/// must additionally be resynchronized afterwards.
///
/// # Safety
///
/// The region must be a live code mapping containing the bytes intended to
/// execute.
pub(crate) unsafe fn synchronize_region(start: *mut u8, len: usize) {
    clear_icache_region(start, len);

    // On AArch64, explicitly resynchronize the CPU pipeline so no stale
    // pre-decoded instruction survives past this point.
    #[cfg(target_arch = "aarch64")]
    {
        core::arch::asm!("dsb sy", "isb", options(nostack, preserves_flags));
    }
}
