//! §4.G step 3: "per-log it attempts decoding against each standard
//! interface in turn and inserts the corresponding typed event."
//!
//! The contract's standard is already known (it is looked up in the
//! watchlist before a log is ever handed here), so there is no
//! `Transfer(address,address,uint256)` ambiguity between ERC-20 and
//! ERC-721 to resolve by guesswork: the caller picks the decoder, this
//! module just reads topics/data the way the corresponding Solidity
//! event was ABI-encoded.

use crate::types::LogEntry;
use eth::types::{Address, Bytes32, Standard, U256};
use ethers::types::U256 as EthersU256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    Erc20Transfer { from: Address, to: Address, value: U256 },
    Erc20Approval { owner: Address, spender: Address, value: U256 },
    Erc721Transfer { from: Address, to: Address, token_id: U256 },
    Erc721Approval { owner: Address, spender: Address, token_id: U256 },
    Erc721ApprovalForAll { owner: Address, operator: Address, approved: bool },
    Erc1155TransferSingle { operator: Address, from: Address, to: Address, token_id: U256, value: U256 },
    Erc1155TransferBatch { operator: Address, from: Address, to: Address, ids: Vec<U256>, values: Vec<U256> },
    Erc1155ApprovalForAll { owner: Address, operator: Address, approved: bool },
}

fn topic0(signature: &str) -> Bytes32 {
    Bytes32::from(keccak_hash::keccak(signature.as_bytes()).0)
}

fn address_from_topic(topic: &Bytes32) -> Address {
    let bytes = ethers::types::H256::from(*topic).0;
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes[12..32]);
    Address::from(addr)
}

fn u256_from_topic(topic: &Bytes32) -> U256 {
    U256::from(EthersU256::from_big_endian(&ethers::types::H256::from(*topic).0))
}

fn u256_from_word(word: &[u8]) -> Option<U256> {
    if word.len() != 32 {
        return None;
    }
    Some(U256::from(EthersU256::from_big_endian(word)))
}

fn bool_from_word(word: &[u8]) -> bool {
    word.last().map(|b| *b != 0).unwrap_or(false)
}

/// Reads a 32-byte big-endian word as an array offset/length, rejecting
/// anything that doesn't fit in a `usize` (defends against malformed or
/// adversarial log data rather than panicking on it).
fn word_as_usize(word: &[u8]) -> Option<usize> {
    if word.len() != 32 || word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    Some(u64::from_be_bytes(word[24..32].try_into().ok()?) as usize)
}

fn read_uint_array(data: &[u8], offset: usize) -> Option<Vec<U256>> {
    let length_word = data.get(offset..offset + 32)?;
    let len = word_as_usize(length_word)?;
    let start = offset + 32;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let word = data.get(start + i * 32..start + (i + 1) * 32)?;
        out.push(u256_from_word(word)?);
    }
    Some(out)
}

/// Decodes the ABI tail of `TransferBatch(address,address,address,
/// uint256[],uint256[])`: two dynamic-array offsets in the head, each
/// array's length-then-elements at its offset.
fn decode_two_uint_arrays(data: &[u8]) -> Option<(Vec<U256>, Vec<U256>)> {
    let offset_ids = word_as_usize(data.get(0..32)?)?;
    let offset_values = word_as_usize(data.get(32..64)?)?;
    let ids = read_uint_array(data, offset_ids)?;
    let values = read_uint_array(data, offset_values)?;
    Some((ids, values))
}

pub fn decode_log(standard: Standard, log: &LogEntry) -> Option<DecodedEvent> {
    match standard {
        Standard::Erc20 => decode_erc20(log),
        Standard::Erc721 => decode_erc721(log),
        Standard::Erc1155 => decode_erc1155(log),
    }
}

fn decode_erc20(log: &LogEntry) -> Option<DecodedEvent> {
    let topic0_hash = *log.topics.first()?;
    if topic0_hash == topic0("Transfer(address,address,uint256)") && log.topics.len() == 3 {
        let value = u256_from_word(&log.data)?;
        Some(DecodedEvent::Erc20Transfer {
            from: address_from_topic(&log.topics[1]),
            to: address_from_topic(&log.topics[2]),
            value,
        })
    } else if topic0_hash == topic0("Approval(address,address,uint256)") && log.topics.len() == 3 {
        let value = u256_from_word(&log.data)?;
        Some(DecodedEvent::Erc20Approval {
            owner: address_from_topic(&log.topics[1]),
            spender: address_from_topic(&log.topics[2]),
            value,
        })
    } else {
        None
    }
}

fn decode_erc721(log: &LogEntry) -> Option<DecodedEvent> {
    let topic0_hash = *log.topics.first()?;
    if topic0_hash == topic0("Transfer(address,address,uint256)") && log.topics.len() == 4 {
        Some(DecodedEvent::Erc721Transfer {
            from: address_from_topic(&log.topics[1]),
            to: address_from_topic(&log.topics[2]),
            token_id: u256_from_topic(&log.topics[3]),
        })
    } else if topic0_hash == topic0("Approval(address,address,uint256)") && log.topics.len() == 4 {
        Some(DecodedEvent::Erc721Approval {
            owner: address_from_topic(&log.topics[1]),
            spender: address_from_topic(&log.topics[2]),
            token_id: u256_from_topic(&log.topics[3]),
        })
    } else if topic0_hash == topic0("ApprovalForAll(address,address,bool)") && log.topics.len() == 3 {
        Some(DecodedEvent::Erc721ApprovalForAll {
            owner: address_from_topic(&log.topics[1]),
            operator: address_from_topic(&log.topics[2]),
            approved: bool_from_word(&log.data),
        })
    } else {
        None
    }
}

fn decode_erc1155(log: &LogEntry) -> Option<DecodedEvent> {
    let topic0_hash = *log.topics.first()?;
    if topic0_hash == topic0("TransferSingle(address,address,address,uint256,uint256)") && log.topics.len() == 4 {
        let token_id = u256_from_word(log.data.get(0..32)?)?;
        let value = u256_from_word(log.data.get(32..64)?)?;
        Some(DecodedEvent::Erc1155TransferSingle {
            operator: address_from_topic(&log.topics[1]),
            from: address_from_topic(&log.topics[2]),
            to: address_from_topic(&log.topics[3]),
            token_id,
            value,
        })
    } else if topic0_hash == topic0("TransferBatch(address,address,address,uint256[],uint256[])") && log.topics.len() == 4 {
        let (ids, values) = decode_two_uint_arrays(&log.data)?;
        Some(DecodedEvent::Erc1155TransferBatch {
            operator: address_from_topic(&log.topics[1]),
            from: address_from_topic(&log.topics[2]),
            to: address_from_topic(&log.topics[3]),
            ids,
            values,
        })
    } else if topic0_hash == topic0("ApprovalForAll(address,address,bool)") && log.topics.len() == 3 {
        Some(DecodedEvent::Erc1155ApprovalForAll {
            owner: address_from_topic(&log.topics[1]),
            operator: address_from_topic(&log.topics[2]),
            approved: bool_from_word(&log.data),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_for_address(address: Address) -> Bytes32 {
        let mut word = [0u8; 32];
        word[12..32].copy_from_slice(address.as_bytes());
        Bytes32::from(word)
    }

    fn word_for_u256(value: u64) -> Vec<u8> {
        let mut word = [0u8; 32];
        word[24..32].copy_from_slice(&value.to_be_bytes());
        word.to_vec()
    }

    #[test]
    fn decodes_erc20_transfer() {
        let from = Address::from(1u64);
        let to = Address::from(2u64);
        let log = LogEntry {
            address: Address::from(9u64),
            topics: vec![topic0("Transfer(address,address,uint256)"), topic_for_address(from), topic_for_address(to)],
            data: word_for_u256(42),
            log_index: 0,
        };
        let decoded = decode_log(Standard::Erc20, &log).unwrap();
        assert_eq!(decoded, DecodedEvent::Erc20Transfer { from, to, value: U256::from(42u64) });
    }

    #[test]
    fn decodes_erc721_transfer_with_indexed_token_id() {
        let from = Address::from(1u64);
        let to = Address::from(2u64);
        let mut token_id_word = [0u8; 32];
        token_id_word[31] = 7;
        let log = LogEntry {
            address: Address::from(9u64),
            topics: vec![
                topic0("Transfer(address,address,uint256)"),
                topic_for_address(from),
                topic_for_address(to),
                Bytes32::from(token_id_word),
            ],
            data: vec![],
            log_index: 0,
        };
        let decoded = decode_log(Standard::Erc721, &log).unwrap();
        assert_eq!(decoded, DecodedEvent::Erc721Transfer { from, to, token_id: U256::from(7u64) });
    }

    #[test]
    fn decodes_erc1155_transfer_batch() {
        let operator = Address::from(1u64);
        let from = Address::from(2u64);
        let to = Address::from(3u64);
        let mut data = Vec::new();
        data.extend(word_for_u256(64)); // offset to ids
        data.extend(word_for_u256(160)); // offset to values (32 + 2*32 + 32)
        data.extend(word_for_u256(2)); // ids length
        data.extend(word_for_u256(10));
        data.extend(word_for_u256(20));
        data.extend(word_for_u256(2)); // values length
        data.extend(word_for_u256(100));
        data.extend(word_for_u256(200));
        let log = LogEntry {
            address: Address::from(9u64),
            topics: vec![
                topic0("TransferBatch(address,address,address,uint256[],uint256[])"),
                topic_for_address(operator),
                topic_for_address(from),
                topic_for_address(to),
            ],
            data,
            log_index: 0,
        };
        let decoded = decode_log(Standard::Erc1155, &log).unwrap();
        assert_eq!(
            decoded,
            DecodedEvent::Erc1155TransferBatch {
                operator,
                from,
                to,
                ids: vec![U256::from(10u64), U256::from(20u64)],
                values: vec![U256::from(100u64), U256::from(200u64)],
            }
        );
    }

    #[test]
    fn unparseable_log_decodes_to_none() {
        let log = LogEntry {
            address: Address::from(9u64),
            topics: vec![Bytes32::zero()],
            data: vec![],
            log_index: 0,
        };
        assert!(decode_log(Standard::Erc20, &log).is_none());
    }
}
