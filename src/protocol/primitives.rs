//! Primitive types.
//!
//! Only the non-flexible encodings are implemented: every message this crate speaks is pinned to an API version
//! that predates tagged fields and compact encodings.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_types>

use std::io::{Read, Write};

use super::traits::{ReadError, ReadType, WriteError, WriteType};

impl<R> ReadType<R> for bool
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0] != 0)
    }
}

impl<W> WriteType<W> for bool
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        writer.write_all(&[u8::from(*self)])?;
        Ok(())
    }
}

/// Fixed-width integers, encoded in network byte order (big-endian).
macro_rules! impl_int {
    ($($t:ty),*) => {
        $(
            impl<R> ReadType<R> for $t
            where
                R: Read,
            {
                fn read(reader: &mut R) -> Result<Self, ReadError> {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    reader.read_exact(&mut buf)?;
                    Ok(<$t>::from_be_bytes(buf))
                }
            }

            impl<W> WriteType<W> for $t
            where
                W: Write,
            {
                fn write(&self, writer: &mut W) -> Result<(), WriteError> {
                    writer.write_all(&self.to_be_bytes())?;
                    Ok(())
                }
            }
        )*
    };
}

impl_int!(i8, i16, i32, i64);

/// STRING: an INT16 length N followed by N bytes of UTF-8. Length must not be negative.
impl<R> ReadType<R> for String
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        match Option::<String>::read(reader)? {
            Some(s) => Ok(s),
            None => Err(ReadError::malformed("Got NULL for non-nullable string")),
        }
    }
}

impl<W> WriteType<W> for String
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        let len = i16::try_from(self.len())?;
        len.write(writer)?;
        writer.write_all(self.as_bytes())?;
        Ok(())
    }
}

/// NULLABLE_STRING: like STRING, but a length of `-1` denotes null.
impl<R> ReadType<R> for Option<String>
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let len = i16::read(reader)?;
        match len {
            l if l < -1 => Err(ReadError::malformed(format!(
                "Invalid negative length for nullable string: {l}"
            ))),
            -1 => Ok(None),
            l => {
                let mut buf = vec![0; usize::try_from(l)?];
                reader.read_exact(&mut buf)?;
                let s = String::from_utf8(buf).map_err(|e| ReadError::Malformed(Box::new(e)))?;
                Ok(Some(s))
            }
        }
    }
}

impl<W> WriteType<W> for Option<String>
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        match self {
            Some(s) => s.write(writer),
            None => (-1i16).write(writer),
        }
    }
}

/// BYTES (or NULLABLE_BYTES read leniently): an INT32 length N followed by N raw bytes.
///
/// A null payload reads as empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Bytes(pub Vec<u8>);

impl<R> ReadType<R> for Bytes
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let len = i32::read(reader)?;
        match len {
            l if l < -1 => Err(ReadError::malformed(format!(
                "Invalid negative length for bytes: {l}"
            ))),
            -1 => Ok(Self::default()),
            l => {
                let mut buf = vec![0; usize::try_from(l)?];
                reader.read_exact(&mut buf)?;
                Ok(Self(buf))
            }
        }
    }
}

impl<W> WriteType<W> for Bytes
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        let len = i32::try_from(self.0.len())?;
        len.write(writer)?;
        writer.write_all(&self.0)?;
        Ok(())
    }
}

/// ARRAY: an INT32 element count followed by the elements. A null array (`-1`) reads as empty.
impl<R, T> ReadType<R> for Vec<T>
where
    R: Read,
    T: ReadType<R>,
{
    fn read(reader: &mut R) -> Result<Self, ReadError> {
        let len = i32::read(reader)?;
        match len {
            l if l < -1 => Err(ReadError::malformed(format!(
                "Invalid negative length for array: {l}"
            ))),
            -1 => Ok(vec![]),
            l => {
                let len = usize::try_from(l)?;
                // Do not trust the announced length for the allocation, a corrupt frame would
                // otherwise be able to request gigabytes up front.
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(T::read(reader)?);
                }
                Ok(items)
            }
        }
    }
}

impl<W, T> WriteType<W> for Vec<T>
where
    W: Write,
    T: WriteType<W>,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError> {
        let len = i32::try_from(self.len())?;
        len.write(writer)?;
        for item in self {
            item.write(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;
    use crate::protocol::traits::{decode, encode};

    #[test]
    fn test_string_wire_format() {
        let buf = encode(&String::from("orders")).unwrap();
        assert_eq!(buf, b"\x00\x06orders");
    }

    #[test]
    fn test_string_null_is_rejected() {
        let err = decode::<String>(&[0xff, 0xff]).unwrap_err();
        assert_matches!(err, ReadError::Malformed(_));
    }

    #[test]
    fn test_nullable_string_invalid_length() {
        let err = decode::<Option<String>>(&[0xff, 0xfe]).unwrap_err();
        assert_matches!(err, ReadError::Malformed(_));
        assert_eq!(
            err.to_string(),
            "Invalid negative length for nullable string: -2"
        );
    }

    #[test]
    fn test_null_array_reads_empty() {
        let v = decode::<Vec<i32>>(&(-1i32).to_be_bytes()).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn test_array_truncated() {
        // announces three elements but only carries one
        let mut buf = encode(&3i32).unwrap();
        buf.extend(encode(&7i32).unwrap());
        let err = decode::<Vec<i32>>(&buf).unwrap_err();
        assert_matches!(err, ReadError::IO(_));
    }

    #[test]
    fn test_bool_nonzero_is_true() {
        assert!(decode::<bool>(&[0x2a]).unwrap());
        assert!(!decode::<bool>(&[0x00]).unwrap());
    }

    proptest! {
        #[test]
        fn roundtrip_nullable_string(s in proptest::option::of(".{0,64}")) {
            let buf = encode(&s).unwrap();
            let mut cursor = Cursor::new(buf);
            let restored = Option::<String>::read(&mut cursor).unwrap();
            prop_assert_eq!(restored, s);
        }

        #[test]
        fn roundtrip_i64_array(v in proptest::collection::vec(any::<i64>(), 0..32)) {
            let buf = encode(&v).unwrap();
            let restored: Vec<i64> = decode(&buf).unwrap();
            prop_assert_eq!(restored, v);
        }
    }
}
