use crate::schema::*;
use diesel::prelude::*;

#[derive(Queryable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = addresses)]
pub struct AddressRow {
    pub id: i32,
    pub address: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = addresses)]
pub struct NewAddressRow<'a> {
    pub address: &'a str,
}

#[derive(Queryable, Insertable, AsChangeset, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = token_contracts)]
pub struct TokenContractRow {
    pub address_id: i32,
    pub deployer_id: i32,
    pub deployment_block: i64,
    pub deployment_timestamp: i64,
    pub standard: String,
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = transactions)]
pub struct TransactionRow {
    pub id: i32,
    pub hash: String,
    pub from_id: i32,
    pub to_id: i32,
    pub selector: String,
    pub block_number: i64,
    pub block_timestamp: i64,
    pub position: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = transactions)]
pub struct NewTransactionRow {
    pub hash: String,
    pub from_id: i32,
    pub to_id: i32,
    pub selector: String,
    pub block_number: i64,
    pub block_timestamp: i64,
    pub position: i32,
}

macro_rules! event_row {
    ($name:ident, $table:ident, { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Queryable, Insertable, Debug, Clone, PartialEq, Eq)]
        #[diesel(table_name = $table)]
        pub struct $name {
            pub id: i32,
            pub contract_id: i32,
            pub tx_id: i32,
            pub log_index: i32,
            $(pub $field: $ty,)*
        }
    };
}

macro_rules! new_event_row {
    ($name:ident, $table:ident, { $($field:ident : $ty:ty),* $(,)? }) => {
        #[derive(Insertable, Debug, Clone)]
        #[diesel(table_name = $table)]
        pub struct $name {
            pub contract_id: i32,
            pub tx_id: i32,
            pub log_index: i32,
            $(pub $field: $ty,)*
        }
    };
}

event_row!(Erc20TransferRow, erc20_transfers, { from_id: i32, to_id: i32, value: String });
new_event_row!(NewErc20TransferRow, erc20_transfers, { from_id: i32, to_id: i32, value: String });

event_row!(Erc20ApprovalRow, erc20_approvals, { owner_id: i32, spender_id: i32, value: String });
new_event_row!(NewErc20ApprovalRow, erc20_approvals, { owner_id: i32, spender_id: i32, value: String });

event_row!(Erc721TransferRow, erc721_transfers, { from_id: i32, to_id: i32, token_id: String });
new_event_row!(NewErc721TransferRow, erc721_transfers, { from_id: i32, to_id: i32, token_id: String });

event_row!(Erc721ApprovalRow, erc721_approvals, { owner_id: i32, spender_id: i32, token_id: String });
new_event_row!(NewErc721ApprovalRow, erc721_approvals, { owner_id: i32, spender_id: i32, token_id: String });

event_row!(Erc721ApprovalForAllRow, erc721_approval_for_all, { owner_id: i32, operator_id: i32, approved: bool });
new_event_row!(NewErc721ApprovalForAllRow, erc721_approval_for_all, { owner_id: i32, operator_id: i32, approved: bool });

event_row!(Erc1155TransferSingleRow, erc1155_transfer_single, { operator_id: i32, from_id: i32, to_id: i32, token_id: String, value: String });
new_event_row!(NewErc1155TransferSingleRow, erc1155_transfer_single, { operator_id: i32, from_id: i32, to_id: i32, token_id: String, value: String });

event_row!(Erc1155TransferBatchRow, erc1155_transfer_batch, { operator_id: i32, from_id: i32, to_id: i32, ids: String, values: String });
new_event_row!(NewErc1155TransferBatchRow, erc1155_transfer_batch, { operator_id: i32, from_id: i32, to_id: i32, ids: String, values: String });

event_row!(Erc1155ApprovalForAllRow, erc1155_approval_for_all, { owner_id: i32, operator_id: i32, approved: bool });
new_event_row!(NewErc1155ApprovalForAllRow, erc1155_approval_for_all, { owner_id: i32, operator_id: i32, approved: bool });
