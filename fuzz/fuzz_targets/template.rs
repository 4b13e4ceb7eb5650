#![no_main]

use gadgetcheck::template::{CommandTemplate, PLACEHOLDER};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        let template = CommandTemplate::new(s);
        let rendered = template.render(std::path::Path::new("/tmp/gadgets/a.phar"));

        if template.has_placeholder() {
            // The payload path carries no braces, so no token can survive
            // or be recombined by substitution.
            assert!(!rendered.contains(PLACEHOLDER));
        } else {
            assert!(rendered.ends_with("/tmp/gadgets/a.phar"));
        }
    }
});
