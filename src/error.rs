//! Error types surfaced by the public encoding entry points.

/// The error type returned when the supplied data cannot be encoded.
///
/// Ways to handle this exception include:
///
/// - Decrease the error correction level if it was greater than [`crate::RecoveryLevel::Low`].
/// - If [`crate::encode_segments_advanced`] was called, increase the `max_version`
///   argument if it was less than [`crate::Version::MAX`].
/// - Split the text data into better or optimal segments to reduce the number of bits required.
/// - Change the text or binary data to be shorter.
/// - Change the text to fit the character set of a particular segment mode (e.g. alphanumeric).
/// - Propagate the error upward to the caller/user.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum QrError {
    /// No version (within the searched range) has enough capacity for the data at the
    /// requested recovery level. Carries `(data_bits, max_capacity_bits)` of the widest
    /// version tried.
    #[error("data length = {0} bits, max capacity = {1} bits")]
    ContentTooLong(usize, usize),

    /// A forced version number fell outside the legal range `[1, 40]`.
    #[error("version number out of range: {0}")]
    InvalidVersion(u8),

    /// A forced version's capacity is too small for the encoded data at the given level.
    /// Carries `(data_bits, capacity_bits)`.
    #[error("data length = {0} bits exceeds capacity = {1} bits for the forced version")]
    VersionCapacityExceeded(usize, usize),
}
