//! CSV statements: export the fetched ledger, or read one back for an
//! offline balance.

use crate::models::Transaction;
use anyhow::Result;
use csv::{ReaderBuilder, WriterBuilder};
use std::io::{Read, Write};
use tracing::error;

/// Write one header row plus one row per transaction, in the order given.
pub fn write_statement<W: Write>(sink: W, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(sink);
    for tx in transactions {
        wtr.serialize(tx)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a statement. Rows that fail to parse are logged and skipped.
pub fn read_transactions<R: Read>(source: R) -> Vec<Transaction> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let mut out = Vec::new();
    for (idx, row) in rdr.deserialize().enumerate() {
        match row {
            Ok(tx) => out.push(tx),
            Err(e) => error!(row = idx + 1, %e, "csv-deserialize"),
        }
    }
    out
}
