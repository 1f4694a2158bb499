// Copyright 2025 duocache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::{Read, Write};

use crate::error::Result;
#[cfg(not(feature = "serde"))]
use crate::error::{Error, ErrorKind};

/// Encode/decode trait for values that can be persisted by the disk tier.
///
/// With the `serde` feature enabled (default), every type that implements `serde::Serialize` and
/// `serde::de::DeserializeOwned` implements [`Code`] through `bincode`.
///
/// Without the `serde` feature, [`Code`] is implemented for primitives, `bool`, `String` and `Vec<u8>`. Other types
/// need a hand-written implementation.
pub trait Code {
    /// Encode the object into a writer.
    fn encode(&self, writer: &mut impl Write) -> Result<()>;

    /// Decode the object from a reader.
    fn decode(reader: &mut impl Read) -> Result<Self>
    where
        Self: Sized;

    /// Estimated serialized size of the object.
    ///
    /// The estimated serialized size is used to pre-allocate the write buffer.
    fn estimated_size(&self) -> usize;
}

#[cfg(feature = "serde")]
impl<T> Code for T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    fn encode(&self, writer: &mut impl Write) -> Result<()> {
        bincode::serialize_into(writer, self).map_err(crate::error::Error::bincode_error)
    }

    fn decode(reader: &mut impl Read) -> Result<Self> {
        bincode::deserialize_from(reader).map_err(crate::error::Error::bincode_error)
    }

    fn estimated_size(&self) -> usize {
        bincode::serialized_size(self).map(|size| size as usize).unwrap_or_default()
    }
}

#[cfg(not(feature = "serde"))]
macro_rules! for_all_primitives {
    ($macro:ident) => {
        $macro! {
            u8, u16, u32, u64, u128, usize,
            i8, i16, i32, i64, i128, isize,
            f32, f64,
        }
    };
}

#[cfg(not(feature = "serde"))]
macro_rules! impl_code_for_primitive {
    ($( $type:ty, )*) => {
        $(
            impl Code for $type {
                fn encode(&self, writer: &mut impl Write) -> Result<()> {
                    writer.write_all(&self.to_le_bytes()).map_err(Error::io_error)
                }

                fn decode(reader: &mut impl Read) -> Result<Self> {
                    let mut buf = [0u8; std::mem::size_of::<$type>()];
                    reader.read_exact(&mut buf).map_err(Error::io_error)?;
                    Ok(<$type>::from_le_bytes(buf))
                }

                fn estimated_size(&self) -> usize {
                    std::mem::size_of::<$type>()
                }
            }
        )*
    };
}

#[cfg(not(feature = "serde"))]
for_all_primitives! { impl_code_for_primitive }

#[cfg(not(feature = "serde"))]
impl Code for bool {
    fn encode(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&[*self as u8]).map_err(Error::io_error)
    }

    fn decode(reader: &mut impl Read) -> Result<Self> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf).map_err(Error::io_error)?;
        match buf[0] {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(Error::new(ErrorKind::Decode, "invalid bool").with_context("byte", v)),
        }
    }

    fn estimated_size(&self) -> usize {
        1
    }
}

#[cfg(not(feature = "serde"))]
impl Code for Vec<u8> {
    fn encode(&self, writer: &mut impl Write) -> Result<()> {
        writer
            .write_all(&(self.len() as u64).to_le_bytes())
            .map_err(Error::io_error)?;
        writer.write_all(self).map_err(Error::io_error)
    }

    fn decode(reader: &mut impl Read) -> Result<Self> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).map_err(Error::io_error)?;
        let len = u64::from_le_bytes(buf) as usize;
        let mut v = vec![0u8; len];
        reader.read_exact(&mut v).map_err(Error::io_error)?;
        Ok(v)
    }

    fn estimated_size(&self) -> usize {
        8 + self.len()
    }
}

#[cfg(not(feature = "serde"))]
impl Code for String {
    fn encode(&self, writer: &mut impl Write) -> Result<()> {
        writer
            .write_all(&(self.len() as u64).to_le_bytes())
            .map_err(Error::io_error)?;
        writer.write_all(self.as_bytes()).map_err(Error::io_error)
    }

    fn decode(reader: &mut impl Read) -> Result<Self> {
        let v = Vec::<u8>::decode(reader)?;
        String::from_utf8(v).map_err(|e| Error::new(ErrorKind::Decode, "invalid utf-8 string").with_source(e))
    }

    fn estimated_size(&self) -> usize {
        8 + self.len()
    }
}

/// Values that can be held by both the memory tier and the disk tier.
pub trait StorageValue: Send + Sync + 'static + Clone + Code {}
impl<T> StorageValue for T where T: Send + Sync + 'static + Clone + Code {}
