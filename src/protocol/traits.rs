use std::io::{Cursor, Read, Write};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Cannot read data")]
    IO(#[from] std::io::Error),

    #[error("Overflow converting integer")]
    Overflow(#[from] std::num::TryFromIntError),

    #[error(transparent)]
    Malformed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ReadError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into().into())
    }
}

pub trait ReadType<R>: Sized
where
    R: Read,
{
    fn read(reader: &mut R) -> Result<Self, ReadError>;
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Cannot write data")]
    IO(#[from] std::io::Error),

    #[error("Overflow converting integer")]
    Overflow(#[from] std::num::TryFromIntError),
}

pub trait WriteType<W>: Sized
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError>;
}

/// Decodes a value from an in-memory payload, ignoring trailing bytes.
pub fn decode<T>(bytes: &[u8]) -> Result<T, ReadError>
where
    T: for<'a> ReadType<Cursor<&'a [u8]>>,
{
    T::read(&mut Cursor::new(bytes))
}

/// Encodes a value into a fresh buffer.
pub fn encode<T>(value: &T) -> Result<Vec<u8>, WriteError>
where
    T: WriteType<Vec<u8>>,
{
    let mut buf = Vec::new();
    value.write(&mut buf)?;
    Ok(buf)
}
