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

use bytes::{Buf, BufMut};
use duocache_common::{
    code::Code,
    error::{Error, ErrorKind, Result},
};
use twox_hash::XxHash64;

#[derive(Debug)]
pub struct Checksummer;

impl Checksummer {
    pub fn checksum64(buf: &[u8]) -> u64 {
        XxHash64::oneshot(0, buf)
    }
}

/// Header of a persisted entry.
///
/// ```plain
/// | magic (4B) | version (2B) | key len (4B) | value len (8B) | checksum (8B) | key | value |
/// ```
///
/// All integers are little endian. The checksum covers the key and value bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub key_len: u32,
    pub value_len: u64,
    pub checksum: u64,
}

impl EntryHeader {
    pub const MAGIC: u32 = 0x6475_6f63;
    pub const VERSION: u16 = 1;
    pub const SIZE: usize = 4 + 2 + 4 + 8 + 8;

    pub fn write(&self, mut buf: &mut [u8]) {
        buf.put_u32_le(Self::MAGIC);
        buf.put_u16_le(Self::VERSION);
        buf.put_u32_le(self.key_len);
        buf.put_u64_le(self.value_len);
        buf.put_u64_le(self.checksum);
    }

    pub fn read(mut buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::new(ErrorKind::Decode, "entry shorter than header").with_context("len", buf.len()));
        }

        let magic = buf.get_u32_le();
        if magic != Self::MAGIC {
            return Err(Error::new(ErrorKind::MagicMismatch, "entry magic mismatch")
                .with_context("expected", Self::MAGIC)
                .with_context("get", magic));
        }
        let version = buf.get_u16_le();
        if version != Self::VERSION {
            return Err(Error::new(ErrorKind::Decode, "unsupported entry version")
                .with_context("expected", Self::VERSION)
                .with_context("get", version));
        }

        let key_len = buf.get_u32_le();
        let value_len = buf.get_u64_le();
        let checksum = buf.get_u64_le();

        Ok(Self {
            key_len,
            value_len,
            checksum,
        })
    }
}

#[derive(Debug)]
pub struct EntrySerializer;

impl EntrySerializer {
    /// Serialize the entry into `buf`. The previous content of `buf` is discarded.
    pub fn serialize<V>(key: &str, value: &V, buf: &mut Vec<u8>) -> Result<()>
    where
        V: Code,
    {
        buf.clear();
        buf.reserve(EntryHeader::SIZE + key.len() + value.estimated_size());

        // Reserve the header, it is filled after the checksum is known.
        buf.resize(EntryHeader::SIZE, 0);
        buf.extend_from_slice(key.as_bytes());
        value.encode(buf)?;

        let value_len = buf.len() - EntryHeader::SIZE - key.len();
        let header = EntryHeader {
            key_len: key.len() as u32,
            value_len: value_len as u64,
            checksum: Checksummer::checksum64(&buf[EntryHeader::SIZE..]),
        };
        header.write(&mut buf[..EntryHeader::SIZE]);

        Ok(())
    }
}

#[derive(Debug)]
pub struct EntryDeserializer;

impl EntryDeserializer {
    /// Deserialize the value of the entry.
    ///
    /// Returns `Ok(None)` if the entry is well-formed but belongs to another key.
    pub fn deserialize<V>(key: &str, buf: &[u8]) -> Result<Option<V>>
    where
        V: Code,
    {
        let header = EntryHeader::read(buf)?;

        let key_start = EntryHeader::SIZE;
        let value_start = key_start + header.key_len as usize;
        let end = (value_start as u64).checked_add(header.value_len);
        if end != Some(buf.len() as u64) {
            return Err(Error::new(ErrorKind::Decode, "entry length mismatch")
                .with_context("key_len", header.key_len)
                .with_context("value_len", header.value_len)
                .with_context("get", buf.len()));
        }

        let get = Checksummer::checksum64(&buf[key_start..]);
        if get != header.checksum {
            return Err(Error::new(ErrorKind::ChecksumMismatch, "entry checksum mismatch")
                .with_context("expected", header.checksum)
                .with_context("get", get));
        }

        if &buf[key_start..value_start] != key.as_bytes() {
            return Ok(None);
        }

        let mut reader = &buf[value_start..];
        let value = V::decode(&mut reader)?;
        if !reader.is_empty() {
            return Err(Error::new(ErrorKind::Decode, "trailing bytes after value").with_context("len", reader.len()));
        }

        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialize(key: &str, value: &String) -> Vec<u8> {
        let mut buf = vec![];
        EntrySerializer::serialize(key, value, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_serde() {
        let value = "The answer to life, the universe, and everything.".to_string();
        let buf = serialize("k", &value);

        let header = EntryHeader::read(&buf).unwrap();
        assert_eq!(header.key_len, 1);
        assert_eq!(EntryHeader::SIZE as u64 + 1 + header.value_len, buf.len() as u64);

        let decoded = EntryDeserializer::deserialize::<String>("k", &buf).unwrap();
        assert_eq!(decoded, Some(value));
    }

    #[test]
    fn test_buffer_reuse() {
        let mut buf = vec![0xff; 1024];
        EntrySerializer::serialize("k", &42u64, &mut buf).unwrap();
        assert_eq!(EntryDeserializer::deserialize::<u64>("k", &buf).unwrap(), Some(42));
    }

    #[test]
    fn test_other_key() {
        let buf = serialize("a", &"v".to_string());
        assert_eq!(EntryDeserializer::deserialize::<String>("b", &buf).unwrap(), None);
    }

    #[test]
    fn test_corruption() {
        let buf = serialize("k", &"value".to_string());

        // truncated
        let e = EntryDeserializer::deserialize::<String>("k", &buf[..buf.len() - 1]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Decode);

        // shorter than header
        let e = EntryDeserializer::deserialize::<String>("k", &buf[..3]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Decode);

        // magic
        let mut b = buf.clone();
        b[0] ^= 0xff;
        let e = EntryDeserializer::deserialize::<String>("k", &b).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::MagicMismatch);

        // version
        let mut b = buf.clone();
        b[4] = 0xee;
        let e = EntryDeserializer::deserialize::<String>("k", &b).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Decode);

        // flipped value bit
        let mut b = buf.clone();
        let last = b.len() - 1;
        b[last] ^= 0x01;
        let e = EntryDeserializer::deserialize::<String>("k", &b).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn test_schema_change() {
        // A `u64` entry read back as a `String` must not decode silently.
        let mut buf = vec![];
        EntrySerializer::serialize("k", &7u64, &mut buf).unwrap();
        assert!(EntryDeserializer::deserialize::<String>("k", &buf).is_err());
    }
}
