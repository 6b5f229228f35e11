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

/// The barrier carries no shared state: threads driving their own buffers
/// through write/synchronize/execute cycles never observe each other's
/// writes or stale words, even while synchronizing concurrently.
#[test]
fn test_concurrent_buffers_do_not_interfere() {
    const THREADS: u16 = 4;
    const CYCLES: u16 = 200;

    let handles: Vec<_> = (0..THREADS)
        .map(|thread| {
            std::thread::spawn(move || {
                let mut buf = CodeBuffer::new(8);
                push_return_value(&mut buf, 0);
                let mut code = buf.synchronize();

                for cycle in 1..=CYCLES {
                    let value = thread * 1000 + cycle;

                    let mut buf = code.reset();
                    push_return_value(&mut buf, value);
                    code = buf.synchronize();

                    let f = unsafe {
                        std::mem::transmute::<*const (), extern "C" fn() -> u32>(
                            code.entry().as_ptr(),
                        )
                    };

                    assert_eq!(
                        f(),
                        value as u32,
                        "Thread {thread} fetched a stale word on cycle {cycle}"
                    );
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
