//! Negative control for the coherence barrier: rewrite a payload without
//! synchronizing and count how often execution observes a stale word.
//!
//! Whether staleness actually shows up depends on the microarchitecture,
//! cache pressure and timing, so this diagnostic asserts nothing about the
//! count; it only demonstrates that the barrier is doing real work when the
//! count is non-zero. Run manually with `--ignored` on real hardware.
//!
//! The payloads differ only in immediate bits, so every stale or torn mix
//! of old and new words still decodes to a safe `return the value`
//! function.

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

#[test]
#[ignore]
fn stale_fetch_diagnostic_without_barrier() {
    const CYCLES: u16 = 1000;

    let mut buf = CodeBuffer::new(8);
    push_return_value(&mut buf, 0);
    let mut code = buf.synchronize();

    let mut stale = 0u32;

    for cycle in 1..=CYCLES {
        let mut buf = code.reset();
        push_return_value(&mut buf, cycle);
        code = unsafe { buf.assume_synchronized() };

        let f = unsafe {
            std::mem::transmute::<*const (), extern "C" fn() -> u32>(code.entry().as_ptr())
        };

        let observed = f();
        if observed != cycle as u32 {
            stale += 1;
        }
    }

    println!("{stale} of {CYCLES} unsynchronized cycles fetched a stale word");
}
