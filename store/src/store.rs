use crate::models::*;
use crate::schema::*;
use crate::events::*;

use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use eth::types::{Address, Bytes32, Standard, U256, ABSENT_RECIPIENT};

/// Either a transaction already resolved to its row id, or a hash to be
/// resolved at insert time (§4.A write side: "event must carry either a
/// resolved transaction id or a hash").
#[derive(Debug, Clone, Copy)]
pub enum TxRef {
    Id(i32),
    Hash(Bytes32),
}

impl From<i32> for TxRef {
    fn from(value: i32) -> Self {
        TxRef::Id(value)
    }
}

impl From<Bytes32> for TxRef {
    fn from(value: Bytes32) -> Self {
        TxRef::Hash(value)
    }
}

fn standard_to_str(standard: Standard) -> &'static str {
    match standard {
        Standard::Erc20 => "erc20",
        Standard::Erc721 => "erc721",
        Standard::Erc1155 => "erc1155",
    }
}

fn standard_from_str(value: &str) -> Result<Standard> {
    match value {
        "erc20" => Ok(Standard::Erc20),
        "erc721" => Ok(Standard::Erc721),
        "erc1155" => Ok(Standard::Erc1155),
        other => Err(anyhow::anyhow!("unknown standard {other}")),
    }
}

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// §4.A Event Store. A single write thread serializes statements: every
/// method takes `&mut self`, so the orchestrator (which owns the only
/// `DataStore` instance) cannot interleave writes across tokens (§4.A
/// rationale). Reads share the same connection; `wait()` is a no-op
/// because every statement here already completes synchronously before
/// the method returns — the method exists so callers can write
/// `store.wait().await` exactly as the spec's read-after-write contract
/// describes, without caring whether a future implementation batches
/// writes on a background thread.
pub struct DataStore {
    conn: SqliteConnection,
}

impl DataStore {
    /// Opens (and purges, §1 "the store is purged at process start") the
    /// backing SQLite file. `:memory:` is used by tests and by any
    /// deployment that wants a pure in-process store.
    pub fn new(path: &str) -> Result<Self> {
        let mut conn = SqliteConnection::establish(path)
            .with_context(|| format!("connecting to sqlite store at {path}"))?;
        conn.batch_execute("PRAGMA foreign_keys = OFF; PRAGMA journal_mode = WAL;")
            .context("set sqlite pragmas")?;
        Self::purge_and_migrate(&mut conn)?;
        Ok(Self { conn })
    }

    fn purge_and_migrate(conn: &mut SqliteConnection) -> Result<()> {
        for table in [
            "erc1155_approval_for_all",
            "erc1155_transfer_batch",
            "erc1155_transfer_single",
            "erc721_approval_for_all",
            "erc721_approvals",
            "erc721_transfers",
            "erc20_approvals",
            "erc20_transfers",
            "transactions",
            "token_contracts",
            "addresses",
        ] {
            let _ = conn.batch_execute(&format!("DROP TABLE IF EXISTS {table};"));
        }
        conn.batch_execute(SCHEMA_SQL).context("apply schema")?;
        Ok(())
    }

    /// No-op: see struct doc. Kept for interface parity with §4.A.
    pub async fn wait(&self) {}

    pub fn begin(&mut self) -> Result<()> {
        self.conn.batch_execute("BEGIN").context("begin transaction")
    }

    pub fn commit(&mut self) -> Result<()> {
        self.conn.batch_execute("COMMIT").context("commit transaction")
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.conn.batch_execute("ROLLBACK").context("rollback transaction")
    }

    // ---- addresses --------------------------------------------------

    fn get_or_create_address(&mut self, address: Address) -> Result<i32> {
        let text = address.to_string();
        diesel::insert_or_ignore_into(addresses::table)
            .values(NewAddressRow { address: &text })
            .execute(&mut self.conn)
            .context("insert address")?;
        addresses::table
            .filter(addresses::address.eq(&text))
            .select(addresses::id)
            .first(&mut self.conn)
            .context("load address id")
    }

    fn address_of(&mut self, id: i32) -> Result<Address> {
        let text: String = addresses::table
            .find(id)
            .select(addresses::address)
            .first(&mut self.conn)
            .context("load address by id")?;
        text.parse()
    }

    // ---- token contracts ----------------------------------------------

    /// Idempotent on address (§4.A).
    pub fn add_token(&mut self, token: &TokenContract) -> Result<()> {
        let address_id = self.get_or_create_address(token.address)?;
        let deployer_id = self.get_or_create_address(token.deployer)?;
        diesel::insert_or_ignore_into(token_contracts::table)
            .values(TokenContractRow {
                address_id,
                deployer_id,
                deployment_block: token.deployment_block,
                deployment_timestamp: token.deployment_timestamp,
                standard: standard_to_str(token.standard).to_string(),
            })
            .execute(&mut self.conn)
            .context("insert token contract")?;
        Ok(())
    }

    pub fn tokens(&mut self) -> Result<Vec<TokenContract>> {
        let rows: Vec<TokenContractRow> = token_contracts::table
            .load(&mut self.conn)
            .context("load token contracts")?;
        rows.into_iter()
            .map(|row| {
                Ok(TokenContract {
                    address: self.address_of_cached(row.address_id)?,
                    deployer: self.address_of_cached(row.deployer_id)?,
                    deployment_block: row.deployment_block,
                    deployment_timestamp: row.deployment_timestamp,
                    standard: standard_from_str(&row.standard)?,
                })
            })
            .collect()
    }

    /// `address_of` needs `&mut self` for the connection; this trivial
    /// alias exists only so the iterator closures above read cleanly.
    fn address_of_cached(&mut self, id: i32) -> Result<Address> {
        self.address_of(id)
    }

    pub fn token(&mut self, address: Address) -> Result<Option<TokenContract>> {
        let address_id = match self.find_address_id(address)? {
            Some(id) => id,
            None => return Ok(None),
        };
        let row: Option<TokenContractRow> = token_contracts::table
            .find(address_id)
            .first(&mut self.conn)
            .optional()
            .context("load token contract")?;
        row.map(|row| {
            Ok(TokenContract {
                address,
                deployer: self.address_of(row.deployer_id)?,
                deployment_block: row.deployment_block,
                deployment_timestamp: row.deployment_timestamp,
                standard: standard_from_str(&row.standard)?,
            })
        })
        .transpose()
    }

    fn find_address_id(&mut self, address: Address) -> Result<Option<i32>> {
        addresses::table
            .filter(addresses::address.eq(address.to_string()))
            .select(addresses::id)
            .first(&mut self.conn)
            .optional()
            .context("find address id")
    }

    // ---- transactions ---------------------------------------------------

    /// Idempotent on hash (§4.A); returns the id of the existing row if
    /// present. `absent` (`to = None`, contract creation) is translated
    /// to `ABSENT_RECIPIENT` at exactly this boundary (§9).
    pub fn add_transaction(&mut self, tx: &eth::types::TxDetails) -> Result<i32> {
        if let Some(existing) = self.find_transaction_id(tx.hash)? {
            return Ok(existing);
        }
        let from_id = self.get_or_create_address(tx.from)?;
        let to_id = self.get_or_create_address(tx.to.unwrap_or(ABSENT_RECIPIENT))?;
        diesel::insert_or_ignore_into(transactions::table)
            .values(NewTransactionRow {
                hash: tx.hash.to_string(),
                from_id,
                to_id,
                selector: hex::encode(tx.selector),
                block_number: tx.block_number as i64,
                block_timestamp: tx.block_timestamp as i64,
                position: tx.position as i32,
            })
            .execute(&mut self.conn)
            .context("insert transaction")?;
        self.find_transaction_id(tx.hash)?
            .context("transaction row missing immediately after insert")
    }

    fn find_transaction_id(&mut self, hash: Bytes32) -> Result<Option<i32>> {
        transactions::table
            .filter(transactions::hash.eq(hash.to_string()))
            .select(transactions::id)
            .first(&mut self.conn)
            .optional()
            .context("find transaction id")
    }

    fn resolve_tx(&mut self, tx_ref: TxRef) -> Result<i32> {
        match tx_ref {
            TxRef::Id(id) => Ok(id),
            TxRef::Hash(hash) => self
                .find_transaction_id(hash)?
                .with_context(|| format!("no transaction for hash {hash:?}")),
        }
    }

    fn transaction_row_to_domain(&mut self, row: TransactionRow) -> Result<Transaction> {
        let from = self.address_of(row.from_id)?;
        let to_addr = self.address_of(row.to_id)?;
        let mut selector = [0u8; 4];
        let decoded = hex::decode(&row.selector).context("decode selector")?;
        selector.copy_from_slice(&decoded);
        Ok(Transaction {
            hash: row.hash.parse()?,
            from,
            to: if to_addr.is_absent() { None } else { Some(to_addr) },
            selector,
            block_number: row.block_number,
            block_timestamp: row.block_timestamp,
            position: row.position,
        })
    }

    /// Transactions directly addressed `to` this contract, or (when `to`
    /// is `None`/absent) contract-creation transactions, ordered by
    /// (block number, tx index) (§4.A).
    pub fn transactions(&mut self, to: Option<Address>) -> Result<Vec<Transaction>> {
        let to_id = self.get_or_create_address(to.unwrap_or(ABSENT_RECIPIENT))?;
        let rows: Vec<TransactionRow> = transactions::table
            .filter(transactions::to_id.eq(to_id))
            .order((transactions::block_number.asc(), transactions::position.asc()))
            .load(&mut self.conn)
            .context("load transactions")?;
        rows.into_iter().map(|row| self.transaction_row_to_domain(row)).collect()
    }

    pub fn transaction_by_hash(&mut self, hash: Bytes32) -> Result<Option<Transaction>> {
        let row: Option<TransactionRow> = transactions::table
            .filter(transactions::hash.eq(hash.to_string()))
            .first(&mut self.conn)
            .optional()
            .context("load transaction by hash")?;
        row.map(|row| self.transaction_row_to_domain(row)).transpose()
    }

    // ---- typed events ---------------------------------------------------

    fn event_meta(&mut self, contract_id: i32, tx_id: i32, log_index: i32) -> Result<EventMeta> {
        let contract = self.address_of(contract_id)?;
        let tx_row: TransactionRow = transactions::table
            .find(tx_id)
            .first(&mut self.conn)
            .context("load tx for event meta")?;
        Ok(EventMeta {
            contract,
            tx_hash: tx_row.hash.parse()?,
            block_number: tx_row.block_number,
            tx_index: tx_row.position,
            log_index,
        })
    }

    pub fn add_erc20_transfer_event(
        &mut self,
        contract: Address,
        tx: TxRef,
        log_index: i32,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<()> {
        let contract_id = self.get_or_create_address(contract)?;
        let tx_id = self.resolve_tx(tx)?;
        let from_id = self.get_or_create_address(from)?;
        let to_id = self.get_or_create_address(to)?;
        diesel::insert_into(erc20_transfers::table)
            .values(NewErc20TransferRow {
                contract_id,
                tx_id,
                log_index,
                from_id,
                to_id,
                value: value.to_string(),
            })
            .execute(&mut self.conn)
            .context("insert erc20 transfer")?;
        Ok(())
    }

    pub fn erc20_transfer(&mut self, contract: Address) -> Result<Vec<Erc20Transfer>> {
        let contract_id = self.get_or_create_address(contract)?;
        let rows: Vec<Erc20TransferRow> = erc20_transfers::table
            .filter(erc20_transfers::contract_id.eq(contract_id))
            .load(&mut self.conn)
            .context("load erc20 transfers")?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = self.event_meta(row.contract_id, row.tx_id, row.log_index)?;
            out.push(Erc20Transfer {
                meta,
                from: self.address_of(row.from_id)?,
                to: self.address_of(row.to_id)?,
                value: U256::from_dec_str(&row.value)?,
            });
        }
        out.sort_by_key(|e| e.meta.order_key());
        Ok(out)
    }

    pub fn add_erc20_approval_event(
        &mut self,
        contract: Address,
        tx: TxRef,
        log_index: i32,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<()> {
        let contract_id = self.get_or_create_address(contract)?;
        let tx_id = self.resolve_tx(tx)?;
        let owner_id = self.get_or_create_address(owner)?;
        let spender_id = self.get_or_create_address(spender)?;
        diesel::insert_into(erc20_approvals::table)
            .values(NewErc20ApprovalRow {
                contract_id,
                tx_id,
                log_index,
                owner_id,
                spender_id,
                value: value.to_string(),
            })
            .execute(&mut self.conn)
            .context("insert erc20 approval")?;
        Ok(())
    }

    pub fn erc20_approval(&mut self, contract: Address) -> Result<Vec<Erc20Approval>> {
        let contract_id = self.get_or_create_address(contract)?;
        let rows: Vec<Erc20ApprovalRow> = erc20_approvals::table
            .filter(erc20_approvals::contract_id.eq(contract_id))
            .load(&mut self.conn)
            .context("load erc20 approvals")?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = self.event_meta(row.contract_id, row.tx_id, row.log_index)?;
            out.push(Erc20Approval {
                meta,
                owner: self.address_of(row.owner_id)?,
                spender: self.address_of(row.spender_id)?,
                value: U256::from_dec_str(&row.value)?,
            });
        }
        out.sort_by_key(|e| e.meta.order_key());
        Ok(out)
    }

    pub fn add_erc721_transfer_event(
        &mut self,
        contract: Address,
        tx: TxRef,
        log_index: i32,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<()> {
        let contract_id = self.get_or_create_address(contract)?;
        let tx_id = self.resolve_tx(tx)?;
        let from_id = self.get_or_create_address(from)?;
        let to_id = self.get_or_create_address(to)?;
        diesel::insert_into(erc721_transfers::table)
            .values(NewErc721TransferRow {
                contract_id,
                tx_id,
                log_index,
                from_id,
                to_id,
                token_id: token_id.to_string(),
            })
            .execute(&mut self.conn)
            .context("insert erc721 transfer")?;
        Ok(())
    }

    pub fn erc721_transfer(&mut self, contract: Address) -> Result<Vec<Erc721Transfer>> {
        let contract_id = self.get_or_create_address(contract)?;
        let rows: Vec<Erc721TransferRow> = erc721_transfers::table
            .filter(erc721_transfers::contract_id.eq(contract_id))
            .load(&mut self.conn)
            .context("load erc721 transfers")?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = self.event_meta(row.contract_id, row.tx_id, row.log_index)?;
            out.push(Erc721Transfer {
                meta,
                from: self.address_of(row.from_id)?,
                to: self.address_of(row.to_id)?,
                token_id: U256::from_dec_str(&row.token_id)?,
            });
        }
        out.sort_by_key(|e| e.meta.order_key());
        Ok(out)
    }

    pub fn add_erc721_approval_event(
        &mut self,
        contract: Address,
        tx: TxRef,
        log_index: i32,
        owner: Address,
        spender: Address,
        token_id: U256,
    ) -> Result<()> {
        let contract_id = self.get_or_create_address(contract)?;
        let tx_id = self.resolve_tx(tx)?;
        let owner_id = self.get_or_create_address(owner)?;
        let spender_id = self.get_or_create_address(spender)?;
        diesel::insert_into(erc721_approvals::table)
            .values(NewErc721ApprovalRow {
                contract_id,
                tx_id,
                log_index,
                owner_id,
                spender_id,
                token_id: token_id.to_string(),
            })
            .execute(&mut self.conn)
            .context("insert erc721 approval")?;
        Ok(())
    }

    pub fn erc721_approval(&mut self, contract: Address) -> Result<Vec<Erc721Approval>> {
        let contract_id = self.get_or_create_address(contract)?;
        let rows: Vec<Erc721ApprovalRow> = erc721_approvals::table
            .filter(erc721_approvals::contract_id.eq(contract_id))
            .load(&mut self.conn)
            .context("load erc721 approvals")?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = self.event_meta(row.contract_id, row.tx_id, row.log_index)?;
            out.push(Erc721Approval {
                meta,
                owner: self.address_of(row.owner_id)?,
                spender: self.address_of(row.spender_id)?,
                token_id: U256::from_dec_str(&row.token_id)?,
            });
        }
        out.sort_by_key(|e| e.meta.order_key());
        Ok(out)
    }

    pub fn add_erc721_approval_for_all_event(
        &mut self,
        contract: Address,
        tx: TxRef,
        log_index: i32,
        owner: Address,
        operator: Address,
        approved: bool,
    ) -> Result<()> {
        let contract_id = self.get_or_create_address(contract)?;
        let tx_id = self.resolve_tx(tx)?;
        let owner_id = self.get_or_create_address(owner)?;
        let operator_id = self.get_or_create_address(operator)?;
        diesel::insert_into(erc721_approval_for_all::table)
            .values(NewErc721ApprovalForAllRow {
                contract_id,
                tx_id,
                log_index,
                owner_id,
                operator_id,
                approved,
            })
            .execute(&mut self.conn)
            .context("insert erc721 approval for all")?;
        Ok(())
    }

    pub fn erc721_approval_for_all(&mut self, contract: Address) -> Result<Vec<Erc721ApprovalForAll>> {
        let contract_id = self.get_or_create_address(contract)?;
        let rows: Vec<Erc721ApprovalForAllRow> = erc721_approval_for_all::table
            .filter(erc721_approval_for_all::contract_id.eq(contract_id))
            .load(&mut self.conn)
            .context("load erc721 approval for all")?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = self.event_meta(row.contract_id, row.tx_id, row.log_index)?;
            out.push(Erc721ApprovalForAll {
                meta,
                owner: self.address_of(row.owner_id)?,
                operator: self.address_of(row.operator_id)?,
                approved: row.approved,
            });
        }
        out.sort_by_key(|e| e.meta.order_key());
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_erc1155_transfer_single_event(
        &mut self,
        contract: Address,
        tx: TxRef,
        log_index: i32,
        operator: Address,
        from: Address,
        to: Address,
        token_id: U256,
        value: U256,
    ) -> Result<()> {
        let contract_id = self.get_or_create_address(contract)?;
        let tx_id = self.resolve_tx(tx)?;
        let operator_id = self.get_or_create_address(operator)?;
        let from_id = self.get_or_create_address(from)?;
        let to_id = self.get_or_create_address(to)?;
        diesel::insert_into(erc1155_transfer_single::table)
            .values(NewErc1155TransferSingleRow {
                contract_id,
                tx_id,
                log_index,
                operator_id,
                from_id,
                to_id,
                token_id: token_id.to_string(),
                value: value.to_string(),
            })
            .execute(&mut self.conn)
            .context("insert erc1155 transfer single")?;
        Ok(())
    }

    pub fn erc1155_transfer_single(&mut self, contract: Address) -> Result<Vec<Erc1155TransferSingle>> {
        let contract_id = self.get_or_create_address(contract)?;
        let rows: Vec<Erc1155TransferSingleRow> = erc1155_transfer_single::table
            .filter(erc1155_transfer_single::contract_id.eq(contract_id))
            .load(&mut self.conn)
            .context("load erc1155 transfer single")?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = self.event_meta(row.contract_id, row.tx_id, row.log_index)?;
            out.push(Erc1155TransferSingle {
                meta,
                operator: self.address_of(row.operator_id)?,
                from: self.address_of(row.from_id)?,
                to: self.address_of(row.to_id)?,
                token_id: U256::from_dec_str(&row.token_id)?,
                value: U256::from_dec_str(&row.value)?,
            });
        }
        out.sort_by_key(|e| e.meta.order_key());
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_erc1155_transfer_batch_event(
        &mut self,
        contract: Address,
        tx: TxRef,
        log_index: i32,
        operator: Address,
        from: Address,
        to: Address,
        ids: &[U256],
        values: &[U256],
    ) -> Result<()> {
        let contract_id = self.get_or_create_address(contract)?;
        let tx_id = self.resolve_tx(tx)?;
        let operator_id = self.get_or_create_address(operator)?;
        let from_id = self.get_or_create_address(from)?;
        let to_id = self.get_or_create_address(to)?;
        let ids_json = serde_json::to_string(&ids.iter().map(|v| v.to_string()).collect::<Vec<_>>())?;
        let values_json = serde_json::to_string(&values.iter().map(|v| v.to_string()).collect::<Vec<_>>())?;
        diesel::insert_into(erc1155_transfer_batch::table)
            .values(NewErc1155TransferBatchRow {
                contract_id,
                tx_id,
                log_index,
                operator_id,
                from_id,
                to_id,
                ids: ids_json,
                values: values_json,
            })
            .execute(&mut self.conn)
            .context("insert erc1155 transfer batch")?;
        Ok(())
    }

    pub fn erc1155_transfer_batch(&mut self, contract: Address) -> Result<Vec<Erc1155TransferBatch>> {
        let contract_id = self.get_or_create_address(contract)?;
        let rows: Vec<Erc1155TransferBatchRow> = erc1155_transfer_batch::table
            .filter(erc1155_transfer_batch::contract_id.eq(contract_id))
            .load(&mut self.conn)
            .context("load erc1155 transfer batch")?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = self.event_meta(row.contract_id, row.tx_id, row.log_index)?;
            let ids: Vec<String> = serde_json::from_str(&row.ids)?;
            let values: Vec<String> = serde_json::from_str(&row.values)?;
            out.push(Erc1155TransferBatch {
                meta,
                operator: self.address_of(row.operator_id)?,
                from: self.address_of(row.from_id)?,
                to: self.address_of(row.to_id)?,
                ids: ids.iter().map(|s| U256::from_dec_str(s)).collect::<Result<_>>()?,
                values: values.iter().map(|s| U256::from_dec_str(s)).collect::<Result<_>>()?,
            });
        }
        out.sort_by_key(|e| e.meta.order_key());
        Ok(out)
    }

    pub fn add_erc1155_approval_for_all_event(
        &mut self,
        contract: Address,
        tx: TxRef,
        log_index: i32,
        owner: Address,
        operator: Address,
        approved: bool,
    ) -> Result<()> {
        let contract_id = self.get_or_create_address(contract)?;
        let tx_id = self.resolve_tx(tx)?;
        let owner_id = self.get_or_create_address(owner)?;
        let operator_id = self.get_or_create_address(operator)?;
        diesel::insert_into(erc1155_approval_for_all::table)
            .values(NewErc1155ApprovalForAllRow {
                contract_id,
                tx_id,
                log_index,
                owner_id,
                operator_id,
                approved,
            })
            .execute(&mut self.conn)
            .context("insert erc1155 approval for all")?;
        Ok(())
    }

    pub fn erc1155_approval_for_all(&mut self, contract: Address) -> Result<Vec<Erc1155ApprovalForAll>> {
        let contract_id = self.get_or_create_address(contract)?;
        let rows: Vec<Erc1155ApprovalForAllRow> = erc1155_approval_for_all::table
            .filter(erc1155_approval_for_all::contract_id.eq(contract_id))
            .load(&mut self.conn)
            .context("load erc1155 approval for all")?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let meta = self.event_meta(row.contract_id, row.tx_id, row.log_index)?;
            out.push(Erc1155ApprovalForAll {
                meta,
                owner: self.address_of(row.owner_id)?,
                operator: self.address_of(row.operator_id)?,
                approved: row.approved,
            });
        }
        out.sort_by_key(|e| e.meta.order_key());
        Ok(out)
    }

    // ---- deletion (§4.A "clearToken") ------------------------------------

    /// Best-effort idempotent cascade delete (§4.A): contract row, its
    /// events, transactions orphaned by that, addresses orphaned by that.
    /// Re-invocation on an unknown address is a no-op.
    pub fn clear_token(&mut self, address: Address) -> Result<()> {
        let contract_id = match self.find_address_id(address)? {
            Some(id) => id,
            None => return Ok(()),
        };
        self.begin()?;
        let result = self.clear_token_inner(contract_id);
        match result {
            Ok(()) => self.commit(),
            Err(err) => {
                self.rollback()?;
                Err(err)
            }
        }
    }

    fn clear_token_inner(&mut self, contract_id: i32) -> Result<()> {
        diesel::delete(erc20_transfers::table.filter(erc20_transfers::contract_id.eq(contract_id)))
            .execute(&mut self.conn)?;
        diesel::delete(erc20_approvals::table.filter(erc20_approvals::contract_id.eq(contract_id)))
            .execute(&mut self.conn)?;
        diesel::delete(erc721_transfers::table.filter(erc721_transfers::contract_id.eq(contract_id)))
            .execute(&mut self.conn)?;
        diesel::delete(erc721_approvals::table.filter(erc721_approvals::contract_id.eq(contract_id)))
            .execute(&mut self.conn)?;
        diesel::delete(
            erc721_approval_for_all::table.filter(erc721_approval_for_all::contract_id.eq(contract_id)),
        )
        .execute(&mut self.conn)?;
        diesel::delete(
            erc1155_transfer_single::table.filter(erc1155_transfer_single::contract_id.eq(contract_id)),
        )
        .execute(&mut self.conn)?;
        diesel::delete(
            erc1155_transfer_batch::table.filter(erc1155_transfer_batch::contract_id.eq(contract_id)),
        )
        .execute(&mut self.conn)?;
        diesel::delete(
            erc1155_approval_for_all::table.filter(erc1155_approval_for_all::contract_id.eq(contract_id)),
        )
        .execute(&mut self.conn)?;
        diesel::delete(token_contracts::table.filter(token_contracts::address_id.eq(contract_id)))
            .execute(&mut self.conn)?;

        self.delete_orphaned_transactions()?;
        self.delete_orphaned_addresses()?;
        Ok(())
    }

    /// A transaction is orphaned once no event table references it and it
    /// is not itself `to` a still-watched token — the store does not know
    /// which transactions are "interesting" beyond that, so any
    /// transaction with zero referencing events and a `to` that is no
    /// longer a token contract is purged.
    fn delete_orphaned_transactions(&mut self) -> Result<()> {
        let referenced: Vec<i32> = {
            let mut ids = Vec::new();
            ids.extend(erc20_transfers::table.select(erc20_transfers::tx_id).load::<i32>(&mut self.conn)?);
            ids.extend(erc20_approvals::table.select(erc20_approvals::tx_id).load::<i32>(&mut self.conn)?);
            ids.extend(erc721_transfers::table.select(erc721_transfers::tx_id).load::<i32>(&mut self.conn)?);
            ids.extend(erc721_approvals::table.select(erc721_approvals::tx_id).load::<i32>(&mut self.conn)?);
            ids.extend(
                erc721_approval_for_all::table
                    .select(erc721_approval_for_all::tx_id)
                    .load::<i32>(&mut self.conn)?,
            );
            ids.extend(
                erc1155_transfer_single::table
                    .select(erc1155_transfer_single::tx_id)
                    .load::<i32>(&mut self.conn)?,
            );
            ids.extend(
                erc1155_transfer_batch::table
                    .select(erc1155_transfer_batch::tx_id)
                    .load::<i32>(&mut self.conn)?,
            );
            ids.extend(
                erc1155_approval_for_all::table
                    .select(erc1155_approval_for_all::tx_id)
                    .load::<i32>(&mut self.conn)?,
            );
            ids
        };
        let watched_address_ids: Vec<i32> = token_contracts::table
            .select(token_contracts::address_id)
            .load(&mut self.conn)?;
        let all_tx: Vec<TransactionRow> = transactions::table.load(&mut self.conn)?;
        for tx in all_tx {
            let still_addressed = watched_address_ids.contains(&tx.to_id);
            let still_referenced = referenced.contains(&tx.id);
            if !still_addressed && !still_referenced {
                diesel::delete(transactions::table.find(tx.id)).execute(&mut self.conn)?;
            }
        }
        Ok(())
    }

    fn delete_orphaned_addresses(&mut self) -> Result<()> {
        let all_addresses: Vec<i32> = addresses::table.select(addresses::id).load(&mut self.conn)?;
        let mut referenced = std::collections::HashSet::new();
        referenced.extend(token_contracts::table.select(token_contracts::address_id).load::<i32>(&mut self.conn)?);
        referenced.extend(token_contracts::table.select(token_contracts::deployer_id).load::<i32>(&mut self.conn)?);
        referenced.extend(transactions::table.select(transactions::from_id).load::<i32>(&mut self.conn)?);
        referenced.extend(transactions::table.select(transactions::to_id).load::<i32>(&mut self.conn)?);
        macro_rules! collect_cols {
            ($table:ident, $($col:ident),+) => {
                $(referenced.extend($table::table.select($table::$col).load::<i32>(&mut self.conn)?);)+
            };
        }
        collect_cols!(erc20_transfers, from_id, to_id);
        collect_cols!(erc20_approvals, owner_id, spender_id);
        collect_cols!(erc721_transfers, from_id, to_id);
        collect_cols!(erc721_approvals, owner_id, spender_id);
        collect_cols!(erc721_approval_for_all, owner_id, operator_id);
        collect_cols!(erc1155_transfer_single, operator_id, from_id, to_id);
        collect_cols!(erc1155_transfer_batch, operator_id, from_id, to_id);
        collect_cols!(erc1155_approval_for_all, owner_id, operator_id);

        for id in all_addresses {
            if !referenced.contains(&id) {
                diesel::delete(addresses::table.find(id)).execute(&mut self.conn)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eth::types::TxDetails;

    fn store() -> DataStore {
        DataStore::new(":memory:").unwrap()
    }

    fn tx(n: u64) -> TxDetails {
        TxDetails {
            hash: n.into(),
            from: Address::from(n),
            to: Some(Address::from(n + 1000)),
            selector: [0xaa, 0xbb, 0xcc, 0xdd],
            block_number: n,
            block_timestamp: n * 12,
            position: 0,
        }
    }

    #[test]
    fn add_transaction_is_idempotent() {
        let mut store = store();
        let details = tx(1);
        let id1 = store.add_transaction(&details).unwrap();
        let id2 = store.add_transaction(&details).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.transactions(details.to).unwrap().len(), 1);
    }

    #[test]
    fn absent_recipient_round_trips_to_none() {
        let mut store = store();
        let mut details = tx(2);
        details.to = None;
        store.add_transaction(&details).unwrap();
        let txs = store.transactions(None).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to, None);
    }

    #[test]
    fn add_token_is_idempotent_on_address() {
        let mut store = store();
        let token = TokenContract {
            address: Address::from(7),
            deployer: Address::from(8),
            deployment_block: 10,
            deployment_timestamp: 120,
            standard: Standard::Erc20,
        };
        store.add_token(&token).unwrap();
        store.add_token(&token).unwrap();
        assert_eq!(store.tokens().unwrap().len(), 1);
    }

    #[test]
    fn events_are_ordered_by_block_tx_log() {
        let mut store = store();
        let contract = Address::from(1);
        let tx_a = tx(5);
        let tx_b = tx(3);
        let tx_a_id = store.add_transaction(&tx_a).unwrap();
        let tx_b_id = store.add_transaction(&tx_b).unwrap();
        store
            .add_erc20_transfer_event(contract, tx_a_id.into(), 1, Address::from(1), Address::from(2), U256::from(1))
            .unwrap();
        store
            .add_erc20_transfer_event(contract, tx_b_id.into(), 0, Address::from(1), Address::from(2), U256::from(1))
            .unwrap();
        let events = store.erc20_transfer(contract).unwrap();
        assert!(events[0].meta.block_number <= events[1].meta.block_number);
    }

    #[test]
    fn clear_token_purges_everything_for_that_contract() {
        let mut store = store();
        let contract = Address::from(1);
        let token = TokenContract {
            address: contract,
            deployer: Address::from(2),
            deployment_block: 1,
            deployment_timestamp: 1,
            standard: Standard::Erc20,
        };
        store.add_token(&token).unwrap();
        let tx_id = store.add_transaction(&tx(5)).unwrap();
        store
            .add_erc20_transfer_event(contract, tx_id.into(), 0, Address::from(9), Address::from(10), U256::from(1))
            .unwrap();
        store.clear_token(contract).unwrap();
        assert!(store.token(contract).unwrap().is_none());
        assert!(store.erc20_transfer(contract).unwrap().is_empty());
        assert!(store.find_address_id(Address::from(9)).unwrap().is_none());
    }

    #[test]
    fn clear_token_is_a_no_op_on_unknown_address() {
        let mut store = store();
        assert!(store.clear_token(Address::from(999)).is_ok());
    }

    #[test]
    fn numeric_round_trip_through_u256() {
        let mut store = store();
        let contract = Address::from(1);
        let tx_id = store.add_transaction(&tx(5)).unwrap();
        let big = U256::from_dec_str("115792089237316195423570985008687907853269984665640564039457584007913129639935").unwrap();
        store
            .add_erc20_transfer_event(contract, tx_id.into(), 0, Address::from(1), Address::from(2), big)
            .unwrap();
        let events = store.erc20_transfer(contract).unwrap();
        assert_eq!(events[0].value, big);
    }
}
