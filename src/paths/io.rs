//! Interrupt-tolerant reads.

use std::cell::Cell;
use std::io::{self, Read};

thread_local! {
    static INTERRUPTED: Cell<bool> = const { Cell::new(false) };
}

/// Reads `reader` to the end, retrying interrupted reads.
///
/// Bytes read before an interruption are kept. When at least one read was
/// interrupted the calling thread's interrupted flag is raised afterwards, see
/// [`take_interrupted`].
pub fn read_fully<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut interrupted = false;
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => data.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => interrupted = true,
            Err(e) => return Err(e),
        }
    }
    if interrupted {
        INTERRUPTED.with(|flag| flag.set(true));
    }
    Ok(data)
}

/// Returns and clears the calling thread's interrupted flag.
pub fn take_interrupted() -> bool {
    INTERRUPTED.with(|flag| flag.replace(false))
}
