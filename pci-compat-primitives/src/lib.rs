use bytemuck::Zeroable;

pub mod hex;
pub mod primitive;

pub const fn const_zeroed_safe<T: Zeroable>() -> T {
    unsafe { core::mem::zeroed() }
}

/// Copies up to `N` bytes from the front of `bytes`, filling the remainder with zeroes.
///
/// Registry properties are raw buffers whose length is not guaranteed, so readers widen them
/// through this rather than indexing directly.
pub fn zero_extended<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    let len = bytes.len().min(N);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

/// Returns the byte at `idx`, or `0` if `bytes` is too short
pub fn byte_or_zero(bytes: &[u8], idx: usize) -> u8 {
    bytes.get(idx).copied().unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::{byte_or_zero, zero_extended};

    #[test]
    fn test_zero_extended_short() {
        assert_eq!(zero_extended::<4>(&[0x86, 0x80]), [0x86, 0x80, 0, 0]);
    }

    #[test]
    fn test_zero_extended_truncates() {
        assert_eq!(zero_extended::<2>(&[1, 2, 3, 4]), [1, 2]);
    }

    #[test]
    fn test_byte_or_zero() {
        assert_eq!(byte_or_zero(&[1, 2, 3], 2), 3);
        assert_eq!(byte_or_zero(&[1, 2, 3], 3), 0);
    }
}
