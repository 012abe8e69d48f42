#![no_main]

use libfuzzer_sys::fuzz_target;

use quorate_types::Ratio;

// Parsing arbitrary text must never panic; any accepted ratio must print back
// to a string that parses to the same value.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(ratio) = text.parse::<Ratio>() {
        let printed = ratio.to_string();
        assert_eq!(printed.parse::<Ratio>().ok(), Some(ratio));
    }
});
