#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // The one-shot assembler must never panic, only return Ok/Err.
    if let Ok(image) = asm8::assemble(data) {
        let flat = image.to_bytes(0);
        assert_eq!(flat.len() as u32, image.end());
    }
    let _ = asm8::assemble_flat(data);
});
