use selfmod::interface::code::*;
use selfmod::interface::encoder::*;

// Synthesize `fn() -> u32 { value }`: an immediate move plus the probed
// return word.
fn push_return_value(buf: &mut CodeBuffer, value: u16) {
    #[cfg(target_arch = "aarch64")]
    {
        buf.push(encode_movz_w(0, value));
        buf.push_return();
    }

    #[cfg(target_arch = "x86_64")]
    {
        for word in encode_mov_eax_ret(value as u32) {
            buf.push(word);
        }
    }
}

/// Visibility property: once a rewrite has been synchronized, execution
/// observes the fresh payload on every run. One mapping is reused across
/// all cycles, the way a litmus harness drives it.
#[test]
fn test_rewrite_cycles_always_observe_fresh_payload() {
    const CYCLES: u16 = 1000;

    let mut buf = CodeBuffer::new(8);
    push_return_value(&mut buf, 0);
    let mut code = buf.synchronize();

    for cycle in 1..=CYCLES {
        let mut buf = code.reset();
        push_return_value(&mut buf, cycle);
        code = buf.synchronize();

        let f = unsafe {
            std::mem::transmute::<*const (), extern "C" fn() -> u32>(code.entry().as_ptr())
        };

        assert_eq!(
            f(),
            cycle as u32,
            "Stale instruction fetched on cycle {cycle}"
        );
    }
}

/// The per-word entry point alone must be enough: synchronizing each
/// written word individually makes the whole payload executable.
#[test]
fn test_per_word_barrier_covers_the_payload() {
    let mut buf = CodeBuffer::new(8);
    push_return_value(&mut buf, 7);

    let base = buf.as_ptr() as *const InstructionWord;
    for index in 0..buf.word_count() {
        unsafe { synchronize_instruction_cache(base.add(index)) };
    }

    // Every word has been through the barrier; the bulk pass would be
    // redundant.
    let code = unsafe { buf.assume_synchronized() };
    let f =
        unsafe { std::mem::transmute::<*const (), extern "C" fn() -> u32>(code.entry().as_ptr()) };

    assert_eq!(f(), 7);
}
