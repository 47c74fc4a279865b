#![no_main]

use dsff::utils::{normalize_for_search, strip_bracketed_content};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Normalizing twice must not change anything
    let once = normalize_for_search(data);
    assert_eq!(normalize_for_search(&once), once);

    let stripped = strip_bracketed_content(data);
    assert!(!stripped.starts_with(char::is_whitespace));
    assert!(!stripped.ends_with(char::is_whitespace));
});
