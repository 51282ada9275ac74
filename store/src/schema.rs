// Hand-written schema (no DB server to run Diesel CLI against: the store is
// a single SQLite file created and migrated in-process, see `store::MIGRATIONS`).

diesel::table! {
    addresses (id) {
        id -> Integer,
        address -> Text,
    }
}

diesel::table! {
    token_contracts (address_id) {
        address_id -> Integer,
        deployer_id -> Integer,
        deployment_block -> BigInt,
        deployment_timestamp -> BigInt,
        standard -> Text,
    }
}

diesel::table! {
    transactions (id) {
        id -> Integer,
        hash -> Text,
        from_id -> Integer,
        to_id -> Integer,
        selector -> Text,
        block_number -> BigInt,
        block_timestamp -> BigInt,
        position -> Integer,
    }
}

diesel::table! {
    erc20_transfers (id) {
        id -> Integer,
        contract_id -> Integer,
        tx_id -> Integer,
        log_index -> Integer,
        from_id -> Integer,
        to_id -> Integer,
        value -> Text,
    }
}

diesel::table! {
    erc20_approvals (id) {
        id -> Integer,
        contract_id -> Integer,
        tx_id -> Integer,
        log_index -> Integer,
        owner_id -> Integer,
        spender_id -> Integer,
        value -> Text,
    }
}

diesel::table! {
    erc721_transfers (id) {
        id -> Integer,
        contract_id -> Integer,
        tx_id -> Integer,
        log_index -> Integer,
        from_id -> Integer,
        to_id -> Integer,
        token_id -> Text,
    }
}

diesel::table! {
    erc721_approvals (id) {
        id -> Integer,
        contract_id -> Integer,
        tx_id -> Integer,
        log_index -> Integer,
        owner_id -> Integer,
        spender_id -> Integer,
        token_id -> Text,
    }
}

diesel::table! {
    erc721_approval_for_all (id) {
        id -> Integer,
        contract_id -> Integer,
        tx_id -> Integer,
        log_index -> Integer,
        owner_id -> Integer,
        operator_id -> Integer,
        approved -> Bool,
    }
}

diesel::table! {
    erc1155_transfer_single (id) {
        id -> Integer,
        contract_id -> Integer,
        tx_id -> Integer,
        log_index -> Integer,
        operator_id -> Integer,
        from_id -> Integer,
        to_id -> Integer,
        token_id -> Text,
        value -> Text,
    }
}

diesel::table! {
    erc1155_transfer_batch (id) {
        id -> Integer,
        contract_id -> Integer,
        tx_id -> Integer,
        log_index -> Integer,
        operator_id -> Integer,
        from_id -> Integer,
        to_id -> Integer,
        // JSON-encoded arrays of decimal-string big integers (§3).
        ids -> Text,
        values -> Text,
    }
}

diesel::table! {
    erc1155_approval_for_all (id) {
        id -> Integer,
        contract_id -> Integer,
        tx_id -> Integer,
        log_index -> Integer,
        owner_id -> Integer,
        operator_id -> Integer,
        approved -> Bool,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    addresses,
    token_contracts,
    transactions,
    erc20_transfers,
    erc20_approvals,
    erc721_transfers,
    erc721_approvals,
    erc721_approval_for_all,
    erc1155_transfer_single,
    erc1155_transfer_batch,
    erc1155_approval_for_all,
);
