//! Append-only message log, one ordered sequence per change.
//!
//! Keys are the 16 change id bytes followed by a big-endian sequence number,
//! so a change's messages sort together in insertion order.

use redb::{ReadableTable, Table, TableDefinition};

use vetter_core::types::Message;
use vetter_core::ChangeId;

use crate::StoreError;

pub(crate) const MESSAGES: TableDefinition<&[u8], &[u8]> = TableDefinition::new("messages");

const KEY_LEN: usize = 20;

fn message_key(id: &ChangeId, seq: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    key[..16].copy_from_slice(&id.as_bytes());
    key[16..].copy_from_slice(&seq.to_be_bytes());
    key
}

fn decode_seq(key: &[u8]) -> Result<u32, StoreError> {
    let tail: [u8; 4] = key
        .get(16..KEY_LEN)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| StoreError::Database(format!("corrupt message key of {} bytes", key.len())))?;
    Ok(u32::from_be_bytes(tail))
}

fn last_entry(
    table: &impl ReadableTable<&'static [u8], &'static [u8]>,
    id: &ChangeId,
) -> Result<Option<(u32, Message)>, StoreError> {
    let lo = message_key(id, 0);
    let hi = message_key(id, u32::MAX);
    let mut range = table.range(lo.as_slice()..=hi.as_slice())?;
    let Some(entry) = range.next_back() else {
        return Ok(None);
    };
    let (key, value) = entry?;
    let seq = decode_seq(key.value())?;
    let message: Message = serde_json::from_slice(value.value())?;
    Ok(Some((seq, message)))
}

/// Appends `message` to the log of `id` and returns it as stored.
///
/// The stored timestamp is clamped so it never precedes the previous entry.
pub fn append(
    table: &mut Table<&'static [u8], &'static [u8]>,
    id: &ChangeId,
    mut message: Message,
) -> Result<Message, StoreError> {
    let seq = match last_entry(&*table, id)? {
        Some((seq, previous)) => {
            message.timestamp_ms = message.timestamp_ms.max(previous.timestamp_ms);
            seq.checked_add(1).ok_or_else(|| {
                StoreError::Database(format!("message log of change {id} is full"))
            })?
        }
        None => 0,
    };
    let key = message_key(id, seq);
    let bytes = serde_json::to_vec(&message)?;
    table.insert(key.as_slice(), bytes.as_slice())?;
    tracing::debug!(change = %id, seq, author = %message.author, "message appended");
    Ok(message)
}

/// All messages of `id`, oldest first.
pub fn read_all(
    table: &impl ReadableTable<&'static [u8], &'static [u8]>,
    id: &ChangeId,
) -> Result<Vec<Message>, StoreError> {
    let lo = message_key(id, 0);
    let hi = message_key(id, u32::MAX);
    let mut messages = Vec::new();
    for entry in table.range(lo.as_slice()..=hi.as_slice())? {
        let (_, value) = entry?;
        messages.push(serde_json::from_slice(value.value())?);
    }
    Ok(messages)
}
