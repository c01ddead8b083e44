use nas_core::{BitBuffer, DecodeError, EncodeError};


/// Reads the whole remaining window as raw octets. Used for IEs the codec does not interpret.
pub fn read_rest(buffer: &mut BitBuffer, field: &'static str) -> Result<Vec<u8>, DecodeError> {
    let n = buffer.get_len_remaining_bytes();
    buffer.read_bytes(n, field)
}

/// Writer counterpart of [`read_rest`], for use inside TLV/LV writers
pub fn write_raw(data: &[u8]) -> impl FnOnce(&mut BitBuffer) -> Result<(), EncodeError> + '_ {
    move |b: &mut BitBuffer| {
        b.write_bytes(data);
        Ok(())
    }
}
