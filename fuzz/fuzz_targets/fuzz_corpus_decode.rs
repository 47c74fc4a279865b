#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes, gzipped or not, must load or fail cleanly
    let _ = dsff::corpus::load_from_reader(data);
});
