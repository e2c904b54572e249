#![no_main]

use clrt_entry::abi::cl_context_properties;
use clrt_entry::{check_context_properties, Policy};
use libfuzzer_sys::fuzz_target;

const PLATFORM: cl_context_properties = 0x1000;

fuzz_target!(|data: &[u8]| {
    let width = std::mem::size_of::<cl_context_properties>();
    let props: Vec<cl_context_properties> = data
        .chunks_exact(width)
        .take(64)
        .map(|c| {
            let mut raw = [0u8; std::mem::size_of::<cl_context_properties>()];
            raw.copy_from_slice(c);
            cl_context_properties::from_ne_bytes(raw)
        })
        .collect();

    let policy = Policy::default();
    if let Ok(parsed) = check_context_properties(&props, PLATFORM, &policy) {
        if let Some(platform) = parsed.platform {
            assert_eq!(platform, PLATFORM);
        }
    }
});
