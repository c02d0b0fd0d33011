//! Kademlia node Id or a lookup target
use rand::Rng;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use crate::{Error, Result};

/// The size of node IDs in bytes.
pub const ID_SIZE: usize = 20;
/// The size of node IDs in bits.
pub const ID_BITS: usize = ID_SIZE * 8;

#[derive(Clone, Copy, PartialEq, Ord, PartialOrd, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Kademlia node Id or a lookup target
pub struct Id(pub [u8; ID_SIZE]);

impl Id {
    pub fn random() -> Id {
        let mut rng = rand::thread_rng();
        let random_bytes: [u8; ID_SIZE] = rng.gen();

        Id(random_bytes)
    }

    /// Create a new Id from some bytes. Returns Err if `bytes` is not of length
    /// [ID_SIZE](crate::common::ID_SIZE).
    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Id> {
        let bytes = bytes.as_ref();
        if bytes.len() != ID_SIZE {
            return Err(Error::InvalidIdSize(bytes.len()));
        }

        let mut tmp: [u8; ID_SIZE] = [0; ID_SIZE];
        tmp[..ID_SIZE].clone_from_slice(&bytes[..ID_SIZE]);

        Ok(Id(tmp))
    }

    /// Number of leading bits this Id shares with `other`.
    ///
    /// Common prefix length with self is [ID_BITS].
    pub fn common_prefix_len(&self, other: &Id) -> usize {
        for i in 0..ID_SIZE {
            let a = self.0[i];
            let b = other.0[i];

            if a != b {
                return i * 8 + (a ^ b).leading_zeros() as usize;
            }
        }

        ID_BITS
    }

    /// Generate a random Id that shares exactly `prefix_len` leading bits with this Id,
    /// which means it falls in the k-bucket of that index.
    ///
    /// `prefix_len` is clamped to `ID_BITS - 1`.
    pub fn random_with_common_prefix(&self, prefix_len: usize) -> Id {
        let prefix_len = prefix_len.min(ID_BITS - 1);

        let mut distance: [u8; ID_SIZE] = rand::thread_rng().gen();

        let byte_index = prefix_len / 8;
        let target_bit = 0x80u8 >> (prefix_len % 8);

        for byte in distance.iter_mut().take(byte_index) {
            *byte = 0;
        }
        // First differing bit set, lower bits random.
        distance[byte_index] = target_bit | (distance[byte_index] & target_bit.wrapping_sub(1));

        let mut target = self.0;
        for (byte, d) in target.iter_mut().zip(distance.iter()) {
            *byte ^= d;
        }

        Id(target)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }

        Ok(())
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({self})")
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(s: &str) -> Result<Id> {
        if s.len() != ID_SIZE * 2 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidIdEncoding(s.to_string()));
        }

        let mut bytes = [0u8; ID_SIZE];

        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| Error::InvalidIdEncoding(s.to_string()))?;
        }

        Ok(Id(bytes))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn common_prefix_len() {
        let id = Id([0; ID_SIZE]);
        assert_eq!(id.common_prefix_len(&id), ID_BITS);

        let mut other = [0; ID_SIZE];
        other[0] = 0b1000_0000;
        assert_eq!(id.common_prefix_len(&Id(other)), 0);

        other[0] = 0b0000_0100;
        assert_eq!(id.common_prefix_len(&Id(other)), 5);

        let mut far = [0; ID_SIZE];
        far[19] = 1;
        assert_eq!(id.common_prefix_len(&Id(far)), 159);
    }

    #[test]
    fn random_with_common_prefix_lands_in_bucket() {
        let id = Id::random();

        for prefix_len in [0, 1, 7, 8, 9, 15, 16, 100, 159] {
            for _ in 0..10 {
                let target = id.random_with_common_prefix(prefix_len);
                assert_eq!(
                    id.common_prefix_len(&target),
                    prefix_len,
                    "target for bucket {prefix_len} landed elsewhere"
                );
            }
        }
    }

    #[test]
    fn random_with_common_prefix_is_clamped() {
        let id = Id::random();
        let target = id.random_with_common_prefix(ID_BITS + 10);

        assert_eq!(id.common_prefix_len(&target), ID_BITS - 1);
    }

    #[test]
    fn from_str_and_display() {
        let string = "5a3ce9c14e7a08645677bbd1cfe7d8f956d53256";
        let id = Id::from_str(string).unwrap();

        assert_eq!(id.to_string(), string);
        assert_eq!(format!("{id:?}"), format!("Id({string})"));
    }

    #[test]
    fn from_str_invalid() {
        assert!(matches!(
            Id::from_str("5a3c"),
            Err(Error::InvalidIdEncoding(_))
        ));
        assert!(matches!(
            Id::from_str("zz3ce9c14e7a08645677bbd1cfe7d8f956d53256"),
            Err(Error::InvalidIdEncoding(_))
        ));
    }

    #[test]
    fn from_bytes() {
        assert!(Id::from_bytes([1u8; ID_SIZE]).is_ok());
        assert!(matches!(
            Id::from_bytes([1u8; 4]),
            Err(Error::InvalidIdSize(4))
        ));
    }
}
