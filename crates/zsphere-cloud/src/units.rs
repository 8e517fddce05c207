//! Capacity unit conversion
//!
//! Disks are configured in GB and memory in MB; the platform works in bytes.
//! Conversion to bytes is checked, conversion back truncates.

pub const MB: u64 = 1024 * 1024;
pub const GB: u64 = 1024 * 1024 * 1024;

/// GB to bytes, `None` on overflow
pub fn gb_to_bytes(gb: u64) -> Option<u64> {
    gb.checked_mul(GB)
}

pub fn bytes_to_gb(bytes: u64) -> u64 {
    bytes / GB
}

/// MB to bytes, `None` on overflow
pub fn mb_to_bytes(mb: u64) -> Option<u64> {
    mb.checked_mul(MB)
}

pub fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / MB
}
