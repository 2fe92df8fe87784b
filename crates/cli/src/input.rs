// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Loading of transaction files.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use poscalc_model::transaction::Transaction;

/// Loads transactions from `path`.
///
/// Files with a `.csv` extension are read as CSV with a header row naming the
/// transaction fields. Anything else is read as a JSON array.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_transactions(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open transactions file: {}", path.display()))?;

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let transactions = if is_csv {
        read_csv(file)
    } else {
        serde_json::from_reader(BufReader::new(file)).map_err(anyhow::Error::from)
    }
    .with_context(|| format!("Failed to parse transactions file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = transactions.len(), "Loaded transactions");
    Ok(transactions)
}

fn read_csv(file: File) -> anyhow::Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut transactions = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let tx: Transaction = record.with_context(|| format!("Invalid CSV row {}", i + 1))?;
        transactions.push(tx);
    }
    Ok(transactions)
}
