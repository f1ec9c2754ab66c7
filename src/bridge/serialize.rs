//! Wire Format
//!
//! Compound values cross the boundary serialized into a [`BridgeBuffer`].
//! The format matches what the generated host bindings read and write:
//!
//! - fixed-width integers, big-endian
//! - `f32`/`f64` as IEEE-754 bit patterns
//! - `bool` as one byte, 0 or 1
//! - `String` as an `i32` byte length followed by UTF-8 bytes
//! - `Option<T>` as a one-byte tag (0 absent, 1 present) then the value
//! - `Vec<T>` as an `i32` element count followed by the elements
//! - `HashMap<String, V>` as an `i32` entry count followed by alternating
//!   keys and values
//!
//! Lifting consumes the buffer and must use every byte; trailing bytes mean
//! the two sides disagree about the shape of the value and are an error.

use std::collections::HashMap;

use thiserror::Error;

use super::buffer::{BridgeBuffer, BufferError};

/// Errors raised while lifting a value off the wire.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} left")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("{0} trailing bytes after lifting a value")]
    TrailingBytes(usize),

    #[error("invalid tag byte {0} for optional value")]
    InvalidOptionTag(u8),

    #[error("invalid byte {0} for boolean")]
    InvalidBool(u8),

    #[error("negative length prefix {0}")]
    NegativeLength(i32),

    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("buffer contract violation: {0}")]
    Buffer(#[from] BufferError),
}

/// Collections cross the wire with an `i32` length prefix; anything longer
/// has no encoding. The panic is converted to `CALL_UNEXPECTED_PANIC` by the
/// call harness, so the host sees a failed call instead of a corrupt buffer.
fn wire_len(len: usize) -> i32 {
    i32::try_from(len)
        .unwrap_or_else(|_| panic!("collection length {} exceeds the i32 wire limit", len))
}

/// Positional cursor over a byte slice with checked reads.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consume exactly `count` bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < count {
            return Err(WireError::UnexpectedEof {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Consume an `i32` length prefix, rejecting negative values.
    pub fn read_length(&mut self) -> Result<usize, WireError> {
        let len = i32::try_read(self)?;
        if len < 0 {
            return Err(WireError::NegativeLength(len));
        }
        Ok(len as usize)
    }
}

/// Serialize a value into the wire format.
pub trait Lower {
    /// Append the wire encoding to `buf`.
    fn write(&self, buf: &mut Vec<u8>);

    /// Serialize into a fresh [`BridgeBuffer`] ready to hand to the host.
    fn lower(&self) -> BridgeBuffer {
        let mut buf = Vec::new();
        self.write(&mut buf);
        BridgeBuffer::from_vec(buf)
    }
}

/// Deserialize a value from the wire format.
pub trait Lift: Sized {
    /// Read one value at the cursor.
    fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError>;

    /// Take ownership of a buffer received from the host and lift the value
    /// out of it. Every byte must be consumed.
    fn try_lift(buf: BridgeBuffer) -> Result<Self, WireError> {
        let vec = buf.try_into_vec()?;
        let mut reader = Reader::new(&vec);
        let value = Self::try_read(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(WireError::TrailingBytes(reader.remaining()));
        }
        Ok(value)
    }
}

// ============================================================================
// Primitive impls
// ============================================================================

macro_rules! impl_wire_int {
    ($($ty:ty),*) => {
        $(
            impl Lower for $ty {
                fn write(&self, buf: &mut Vec<u8>) {
                    buf.extend_from_slice(&self.to_be_bytes());
                }
            }

            impl Lift for $ty {
                fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
                    let bytes = reader.read_bytes(std::mem::size_of::<$ty>())?;
                    // read_bytes returned exactly size_of::<$ty> bytes
                    Ok(<$ty>::from_be_bytes(bytes.try_into().unwrap()))
                }
            }
        )*
    };
}

impl_wire_int!(u8, i8, u16, i16, u32, i32, u64, i64);

impl Lower for f32 {
    fn write(&self, buf: &mut Vec<u8>) {
        self.to_bits().write(buf);
    }
}

impl Lift for f32 {
    fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(f32::from_bits(u32::try_read(reader)?))
    }
}

impl Lower for f64 {
    fn write(&self, buf: &mut Vec<u8>) {
        self.to_bits().write(buf);
    }
}

impl Lift for f64 {
    fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(f64::from_bits(u64::try_read(reader)?))
    }
}

impl Lower for bool {
    fn write(&self, buf: &mut Vec<u8>) {
        buf.push(u8::from(*self));
    }
}

impl Lift for bool {
    fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        match u8::try_read(reader)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidBool(other)),
        }
    }
}

impl Lower for () {
    fn write(&self, _buf: &mut Vec<u8>) {}
}

impl Lift for () {
    fn try_read(_reader: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(())
    }
}

// ============================================================================
// Compound impls
// ============================================================================

impl Lower for str {
    fn write(&self, buf: &mut Vec<u8>) {
        wire_len(self.len()).write(buf);
        buf.extend_from_slice(self.as_bytes());
    }
}

impl Lower for String {
    fn write(&self, buf: &mut Vec<u8>) {
        self.as_str().write(buf);
    }
}

impl Lift for String {
    fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        let len = reader.read_length()?;
        let bytes = reader.read_bytes(len)?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }
}

impl<T: Lower> Lower for Option<T> {
    fn write(&self, buf: &mut Vec<u8>) {
        match self {
            None => buf.push(0),
            Some(value) => {
                buf.push(1);
                value.write(buf);
            }
        }
    }
}

impl<T: Lift> Lift for Option<T> {
    fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        match u8::try_read(reader)? {
            0 => Ok(None),
            1 => Ok(Some(T::try_read(reader)?)),
            other => Err(WireError::InvalidOptionTag(other)),
        }
    }
}

impl<T: Lower> Lower for Vec<T> {
    fn write(&self, buf: &mut Vec<u8>) {
        wire_len(self.len()).write(buf);
        for item in self {
            item.write(buf);
        }
    }
}

impl<T: Lift> Lift for Vec<T> {
    fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        let count = reader.read_length()?;
        // Cap the pre-allocation: a hostile count must not allocate before
        // the elements actually arrive.
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            items.push(T::try_read(reader)?);
        }
        Ok(items)
    }
}

impl<V: Lower> Lower for HashMap<String, V> {
    fn write(&self, buf: &mut Vec<u8>) {
        wire_len(self.len()).write(buf);
        for (key, value) in self {
            key.write(buf);
            value.write(buf);
        }
    }
}

impl<V: Lift> Lift for HashMap<String, V> {
    fn try_read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        let count = reader.read_length()?;
        let mut map = HashMap::new();
        for _ in 0..count {
            let key = String::try_read(reader)?;
            let value = V::try_read(reader)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Lower + Lift + PartialEq + std::fmt::Debug>(value: T) {
        let buf = value.lower();
        let lifted = T::try_lift(buf).unwrap();
        assert_eq!(lifted, value);
    }

    #[test]
    fn test_integers_are_big_endian() {
        let mut buf = Vec::new();
        0x0102_0304u32.write(&mut buf);
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_primitive_round_trips() {
        round_trip(0u8);
        round_trip(-1i8);
        round_trip(u64::MAX);
        round_trip(i64::MIN);
        round_trip(1.35f64);
        round_trip(true);
        round_trip(false);
    }

    #[test]
    fn test_string_encoding() {
        let mut buf = Vec::new();
        "hi".write(&mut buf);
        assert_eq!(buf, [0, 0, 0, 2, b'h', b'i']);
        round_trip(String::new());
        round_trip("tile/14/8821/5713".to_string());
        round_trip("шашлык".to_string());
    }

    #[test]
    fn test_option_tags() {
        round_trip(Option::<u32>::None);
        round_trip(Some(42u32));
        round_trip(Some(Some("nested".to_string())));
        round_trip(Option::<Option<bool>>::Some(None));
    }

    #[test]
    fn test_vec_and_map() {
        round_trip(Vec::<u64>::new());
        round_trip(vec![1u8, 2, 3]);
        round_trip(vec!["a".to_string(), String::new()]);
        let mut map = HashMap::new();
        map.insert("zoom".to_string(), 14i32);
        map.insert("dpi".to_string(), 2i32);
        round_trip(map);
    }

    #[test]
    fn test_short_buffer_is_eof_not_panic() {
        let buf = BridgeBuffer::from_vec(vec![0, 0, 0, 9, b'x']);
        let err = String::try_lift(buf).unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { needed: 9, .. }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = Vec::new();
        7u32.write(&mut bytes);
        bytes.push(0xFF);
        let err = u32::try_lift(BridgeBuffer::from_vec(bytes)).unwrap_err();
        assert!(matches!(err, WireError::TrailingBytes(1)));
    }

    #[test]
    fn test_invalid_option_tag() {
        let err = Option::<u8>::try_lift(BridgeBuffer::from_vec(vec![2])).unwrap_err();
        assert!(matches!(err, WireError::InvalidOptionTag(2)));
    }

    #[test]
    fn test_invalid_bool() {
        let err = bool::try_lift(BridgeBuffer::from_vec(vec![3])).unwrap_err();
        assert!(matches!(err, WireError::InvalidBool(3)));
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut bytes = Vec::new();
        (-4i32).write(&mut bytes);
        let err = String::try_lift(BridgeBuffer::from_vec(bytes)).unwrap_err();
        assert!(matches!(err, WireError::NegativeLength(-4)));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = String::try_lift(BridgeBuffer::from_vec(vec![0, 0, 0, 2, 0xC0, 0x00]))
            .unwrap_err();
        assert!(matches!(err, WireError::InvalidUtf8(_)));
    }

    #[test]
    fn test_oversized_collection_refused_not_wrapped() {
        // Zero-sized elements make a > i32::MAX collection cheap to build.
        // Lowering must refuse it; a wrapped (negative) length prefix would
        // put an unreadable buffer on the wire with no error raised.
        let huge = vec![(); (i32::MAX as usize) + 1];
        let result = std::panic::catch_unwind(|| {
            let mut bytes = Vec::new();
            huge.write(&mut bytes);
        });
        let payload = result.unwrap_err();
        let message = payload.downcast_ref::<String>().unwrap();
        assert!(message.contains("exceeds the i32 wire limit"));
    }

    #[test]
    fn test_hostile_count_does_not_preallocate() {
        // Count claims i32::MAX elements but only a handful of bytes follow.
        let mut bytes = Vec::new();
        i32::MAX.write(&mut bytes);
        bytes.extend_from_slice(&[0u8; 4]);
        let err = Vec::<u64>::try_lift(BridgeBuffer::from_vec(bytes)).unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { .. }));
    }
}
