#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Feed the builder one line per emit call, with the listing enabled.
    let mut asm = asm8::Assembler::new();
    asm.enable_listing();
    for line in data.lines() {
        if asm.emit(line).is_err() {
            return;
        }
    }
    if let Ok(result) = asm.finish() {
        let _ = result.listing();
        for (name, address) in result.labels() {
            assert_eq!(result.label_address(name), Some(*address));
        }
    }
});
