use crate::error::{Error, Result};

/// Typed reads from another process's address space.
///
/// A failed read is a normal, frequent outcome (page unmapped, address
/// temporarily invalid) and callers treat it as "no value this time",
/// never as a fault. Implementations must not block indefinitely.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_f64(&self, address: u64) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array::<8>(address)?))
    }

    fn read_array<const N: usize>(&self, address: u64) -> Result<[u8; N]> {
        let bytes = self.read_bytes(address, N)?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::MemoryReadFailed {
                address,
                message: format!("short read: got {} of {} bytes", bytes.len(), N),
            })
    }
}
