#![no_main]

use deskbot::routing::{IntentClassifier, KeywordClassifier};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let classifier = KeywordClassifier::with_defaults();
        // Resolution must be total: never panics, always yields a category.
        let _ = classifier.resolve(input);
        let _ = classifier.classify_faq(input);
    }
});
