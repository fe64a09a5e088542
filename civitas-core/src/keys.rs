use cosmwasm_std::{StdError, StdResult, Timestamp};
use cw_storage_plus::{Key, KeyDeserialize, Prefixer, PrimaryKey};

pub const QUEUE_TIME_LEN: usize = 20;

/// Fixed-width, lexicographically sortable encoding of a [`Timestamp`]:
/// 10 big-endian bytes of seconds followed by 10 big-endian bytes of nanos.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueTime([u8; QUEUE_TIME_LEN]);

impl QueueTime {
    pub fn new(time: Timestamp) -> Self {
        let mut bytes = [0u8; QUEUE_TIME_LEN];
        bytes[2..10].copy_from_slice(&time.seconds().to_be_bytes());
        bytes[12..20].copy_from_slice(&time.subsec_nanos().to_be_bytes());
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> StdResult<Self> {
        let bytes: [u8; QUEUE_TIME_LEN] = bytes.try_into().map_err(|_| {
            StdError::parse_err(
                "QueueTime",
                format!("expected {QUEUE_TIME_LEN} bytes, got {}", bytes.len()),
            )
        })?;
        if bytes[..2] != [0, 0] || bytes[10..12] != [0, 0] {
            return Err(StdError::parse_err("QueueTime", "time component out of range"));
        }
        let key = Self(bytes);
        if key.subsec_nanos() >= 1_000_000_000 {
            return Err(StdError::parse_err("QueueTime", "nanos out of range"));
        }
        key.seconds()
            .checked_mul(1_000_000_000)
            .and_then(|nanos| nanos.checked_add(key.subsec_nanos()))
            .ok_or_else(|| StdError::parse_err("QueueTime", "time beyond Timestamp range"))?;
        Ok(key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn timestamp(&self) -> Timestamp {
        Timestamp::from_seconds(self.seconds()).plus_nanos(self.subsec_nanos())
    }

    fn seconds(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[2..10]);
        u64::from_be_bytes(buf)
    }

    fn subsec_nanos(&self) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[12..20]);
        u64::from_be_bytes(buf)
    }
}

impl From<Timestamp> for QueueTime {
    fn from(time: Timestamp) -> Self {
        QueueTime::new(time)
    }
}

impl<'a> PrimaryKey<'a> for QueueTime {
    type Prefix = ();
    type SubPrefix = ();
    type Suffix = Self;
    type SuperSuffix = Self;

    fn key(&self) -> Vec<Key> {
        vec![Key::Ref(&self.0)]
    }
}

impl<'a> Prefixer<'a> for QueueTime {
    fn prefix(&self) -> Vec<Key> {
        vec![Key::Ref(&self.0)]
    }
}

impl KeyDeserialize for QueueTime {
    type Output = QueueTime;
    const KEY_ELEMS: u16 = 1;

    #[inline(always)]
    fn from_vec(value: Vec<u8>) -> StdResult<Self::Output> {
        QueueTime::from_slice(&value)
    }
}
