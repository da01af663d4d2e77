//! Minimal contract ABI codec for the records service.
//!
//! Arguments use the standard head/tail layout: every argument takes one 32-byte head
//! word, and dynamic values (`string`) put an offset in the head and their bytes in the
//! tail. Only the shapes the service schema needs are supported.

use crate::error::{LedgerError, LedgerResult};
use crate::record::Record;
use hcr_types::{Address, SubjectId};
use primitive_types::U256;

pub const WORD: usize = 32;

/// A single call argument.
#[derive(Clone, Debug)]
pub enum Token<'a> {
    Uint(U256),
    Address(Address),
    String(&'a str),
}

/// Convert a subject id to `uint256`. Values wider than 256 bits are rejected here.
pub fn subject_to_uint(subject: &SubjectId) -> LedgerResult<U256> {
    U256::from_dec_str(subject.as_decimal())
        .map_err(|_| LedgerError::Encoding(format!("subject id {subject} exceeds uint256")))
}

fn uint_word(value: U256) -> [u8; WORD] {
    value.to_big_endian()
}

fn usize_word(value: usize) -> [u8; WORD] {
    uint_word(U256::from(value))
}

fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - Address::LEN..].copy_from_slice(address.as_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Encode calldata: selector followed by the ABI-encoded arguments.
pub fn encode_call(selector: [u8; 4], args: &[Token<'_>]) -> Vec<u8> {
    let head_len = args.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        match arg {
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::Address(address) => head.extend_from_slice(&address_word(address)),
            Token::String(text) => {
                head.extend_from_slice(&usize_word(head_len + tail.len()));
                let bytes = text.as_bytes();
                tail.extend_from_slice(&usize_word(bytes.len()));
                tail.extend_from_slice(bytes);
                tail.resize(tail.len() + padded_len(bytes.len()) - bytes.len(), 0);
            }
        }
    }

    let mut out = Vec::with_capacity(4 + head.len() + tail.len());
    out.extend_from_slice(&selector);
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    out
}

/// Bounds-checked reader over return data.
struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn slice(&self, offset: usize, len: usize) -> LedgerResult<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                LedgerError::Decoding(format!(
                    "read of {len} bytes at offset {offset} exceeds {} bytes of return data",
                    self.data.len()
                ))
            })
    }

    fn uint(&self, offset: usize) -> LedgerResult<U256> {
        Ok(U256::from_big_endian(self.slice(offset, WORD)?))
    }

    fn u64_at(&self, offset: usize, what: &str) -> LedgerResult<u64> {
        let value = self.uint(offset)?;
        if value.bits() > 64 {
            return Err(LedgerError::Decoding(format!("{what} does not fit in 64 bits")));
        }
        Ok(value.low_u64())
    }

    /// An offset or length, which must point inside the data.
    fn usize_at(&self, offset: usize) -> LedgerResult<usize> {
        let value = self.uint(offset)?;
        if value > U256::from(self.data.len()) {
            return Err(LedgerError::Decoding(format!(
                "offset or length {value} exceeds return data"
            )));
        }
        Ok(value.low_u64() as usize)
    }

    fn address_at(&self, offset: usize) -> LedgerResult<Address> {
        let word = self.slice(offset, WORD)?;
        let (padding, body) = word.split_at(WORD - Address::LEN);
        if padding.iter().any(|b| *b != 0) {
            return Err(LedgerError::Decoding("address word has non-zero padding".into()));
        }
        let mut bytes = [0u8; Address::LEN];
        bytes.copy_from_slice(body);
        Ok(Address::from_bytes(bytes))
    }

    /// A `string` whose head word sits at `head` and whose offset is relative to `base`.
    fn string_at(&self, base: usize, head: usize) -> LedgerResult<String> {
        let start = base
            .checked_add(self.usize_at(head)?)
            .ok_or_else(|| LedgerError::Decoding("string offset overflow".into()))?;
        let len = self.usize_at(start)?;
        let bytes = self.slice(start + WORD, len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| LedgerError::Decoding(format!("string is not UTF-8: {e}")))
    }
}

/// Decode the single `address` returned by `getOwner()`.
pub fn decode_address(data: &[u8]) -> LedgerResult<Address> {
    Reader::new(data).address_at(0)
}

/// Decode `tuple(uint256,string,string,string,uint256)[]` returned by `getPatientRecords`.
pub fn decode_records(data: &[u8]) -> LedgerResult<Vec<Record>> {
    const TUPLE_HEAD: usize = 5 * WORD;

    let reader = Reader::new(data);
    let array = reader.usize_at(0)?;
    let count = reader.usize_at(array)?;
    let content = array + WORD;

    // Every element needs at least its offset word, so a count beyond that is malformed.
    if count > data.len() / WORD {
        return Err(LedgerError::Decoding(format!(
            "record count {count} exceeds return data"
        )));
    }

    let mut records = Vec::with_capacity(count);
    for index in 0..count {
        let tuple = content + reader.usize_at(content + index * WORD)?;
        reader.slice(tuple, TUPLE_HEAD)?;

        records.push(Record {
            record_id: reader.u64_at(tuple, "recordID")?,
            subject_name: reader.string_at(tuple, tuple + WORD)?,
            diagnosis: reader.string_at(tuple, tuple + 2 * WORD)?,
            treatment: reader.string_at(tuple, tuple + 3 * WORD)?,
            timestamp: reader.u64_at(tuple + 4 * WORD, "timestamp")?,
        });
    }

    Ok(records)
}
