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
fn test_probed_return_round_trips_through_buffer() {
    let mut buf = CodeBuffer::new(4);
    buf.push_return();

    let code = buf.synchronize();
    let f = unsafe { std::mem::transmute::<*const (), extern "C" fn()>(code.entry().as_ptr()) };

    // Control coming back here at all is the property under test: the
    // synthesized word behaves exactly like a compiler-emitted return.
    f();
    f();
}

#[test]
fn test_synthesized_function_returns_value() {
    let mut buf = CodeBuffer::new(8);

    #[cfg(target_arch = "aarch64")]
    buf.push(encode_nop());

    #[cfg(target_arch = "x86_64")]
    buf.push(encode_nop_word());

    push_return_value(&mut buf, 42);

    let code = buf.synchronize();
    let f =
        unsafe { std::mem::transmute::<*const (), extern "C" fn() -> u32>(code.entry().as_ptr()) };

    assert_eq!(f(), 42, "Synthesized function returned the wrong value");
}

#[test]
fn test_reset_rewinds_the_write_cursor() {
    let mut buf = CodeBuffer::new(8);
    push_return_value(&mut buf, 7);
    let written = buf.word_count();

    let code = buf.synchronize();
    assert_eq!(code.word_count(), written);

    let buf = code.reset();
    assert!(buf.is_empty(), "Reset buffer should contain no words");
}
