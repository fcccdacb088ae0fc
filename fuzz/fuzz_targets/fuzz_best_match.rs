#![no_main]

use deskbot::knowledge::KnowledgeBase;
use deskbot::routing::Category;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let kb = KnowledgeBase::builtin();
        for category in [
            Category::Payment,
            Category::Order,
            Category::FaqGeneral,
            Category::FaqSpecific,
        ] {
            // Lookup never errors; zero overlap is the fixed fallback reply.
            let _ = kb.answer(input, category);
        }
    }
});
