#![no_main]

use clrt_entry::info::copy_info;
use clrt_entry::{EntryError, OptionalOutput};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<u8>, u16, u8)| {
    let (value, capacity, fill) = input;
    let mut dest = vec![fill; capacity as usize];
    let mut size = usize::MAX;

    match copy_info(&value, Some(&mut dest[..]), OptionalOutput::from(&mut size)) {
        Ok(()) => {
            assert_eq!(size, value.len());
            assert_eq!(&dest[..value.len()], &value[..]);
            assert!(dest[value.len()..].iter().all(|&b| b == 0));
        }
        Err(err) => {
            assert_eq!(err, EntryError::InvalidValue);
            assert!(dest.len() < value.len());
            assert_eq!(size, usize::MAX);
            assert!(dest.iter().all(|&b| b == fill));
        }
    }
});
