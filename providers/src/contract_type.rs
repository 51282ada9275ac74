use eth::types::Standard;

/// §1: "Contract-type identification... modeled as a pure function the
/// core calls." Out of scope for the core's own logic, but something has
/// to implement the seam so ingress can call it; this is the reference
/// implementation, a selector-presence heuristic over the deployed
/// bytecode (no chain round-trip needed beyond the code itself).
pub trait ContractTypeIdentifier: Send + Sync {
    fn identify(&self, bytecode: &[u8]) -> Option<Standard>;
}

const ERC20_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
const ERC20_BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
const ERC721_OWNER_OF: [u8; 4] = [0x63, 0x52, 0x21, 0x1e];
const ERC721_SAFE_TRANSFER_FROM_3: [u8; 4] = [0x42, 0x84, 0x2e, 0x0e];
const ERC1155_SAFE_TRANSFER_FROM: [u8; 4] = [0xf2, 0x42, 0x43, 0x2a];
const ERC1155_BALANCE_OF_BATCH: [u8; 4] = [0x4e, 0x12, 0x73, 0xf4];

fn contains_selector(bytecode: &[u8], selector: [u8; 4]) -> bool {
    bytecode.windows(4).any(|window| window == selector)
}

#[derive(Default)]
pub struct SelectorHeuristicIdentifier;

impl ContractTypeIdentifier for SelectorHeuristicIdentifier {
    fn identify(&self, bytecode: &[u8]) -> Option<Standard> {
        let has = |selector| contains_selector(bytecode, selector);
        if has(ERC1155_SAFE_TRANSFER_FROM) && has(ERC1155_BALANCE_OF_BATCH) {
            Some(Standard::Erc1155)
        } else if has(ERC721_OWNER_OF) && has(ERC721_SAFE_TRANSFER_FROM_3) {
            Some(Standard::Erc721)
        } else if has(ERC20_TRANSFER) && has(ERC20_BALANCE_OF) {
            Some(Standard::Erc20)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytecode_with(selectors: &[[u8; 4]]) -> Vec<u8> {
        let mut out = vec![0x60, 0x80, 0x60, 0x40];
        for selector in selectors {
            out.push(0x63); // PUSH4
            out.extend_from_slice(selector);
        }
        out
    }

    #[test]
    fn identifies_erc20_by_selector_pair() {
        let identifier = SelectorHeuristicIdentifier;
        let code = bytecode_with(&[ERC20_TRANSFER, ERC20_BALANCE_OF]);
        assert_eq!(identifier.identify(&code), Some(Standard::Erc20));
    }

    #[test]
    fn identifies_erc721_over_erc20_when_both_hint_present() {
        let identifier = SelectorHeuristicIdentifier;
        let code = bytecode_with(&[ERC721_OWNER_OF, ERC721_SAFE_TRANSFER_FROM_3, ERC20_BALANCE_OF]);
        assert_eq!(identifier.identify(&code), Some(Standard::Erc721));
    }

    #[test]
    fn unrecognized_bytecode_identifies_as_none() {
        let identifier = SelectorHeuristicIdentifier;
        assert_eq!(identifier.identify(&[0x60, 0x80]), None);
    }
}
