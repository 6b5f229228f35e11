use std::ptr::NonNull;

/// A safe wrapper around the entry address of synthesized code.
///
/// `CodePtr` encapsulates a non-null, instruction-aligned code address. It
/// is handed out by [`SyncedCode`](crate::interface::code::SyncedCode), and
/// can also wrap addresses owned by an external buffer allocator.
///
/// # Safety
///
/// The caller must ensure that the pointer refers to synchronized,
/// executable instructions before transferring control to it.
pub struct CodePtr(NonNull<()>);

impl CodePtr {
    /// Creates a new `CodePtr` from a raw address.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the address points into a live code
    /// region. The alignment check below is necessary but not sufficient;
    /// it cannot validate that the bytes behind the address are
    /// instructions.
    pub unsafe fn new(ptr: *const ()) -> Self {
        let p = ptr as *mut ();
        let nn = NonNull::new(p).expect("Code address must not be null");

        const INSTRUCTION_ALIGN: usize = 4;
        assert!(
            (nn.as_ptr() as usize) % INSTRUCTION_ALIGN == 0,
            "Code address has insufficient alignment for an instruction word"
        );

        CodePtr(nn)
    }

    /// Returns the raw entry address.
    pub fn as_ptr(&self) -> *const () {
        self.0.as_ptr()
    }
}
