#![cfg(target_os = "macos")]

extern "C" {
    /// Pushes written data out of the data cache for the indicated range so
    /// the instruction-fetch path can observe it.
    pub(crate) fn sys_dcache_flush(start: *mut u8, len: usize);

    /// Prepares memory for execution by invalidating the instruction cache
    /// for the indicated range.
    pub(crate) fn sys_icache_invalidate(start: *mut u8, len: usize);
}
