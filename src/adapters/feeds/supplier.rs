//! Supplier Stock List Feed - Zipped Workbook/CSV Price/Stock Source
//!
//! Downloads (or reads from disk) the distributor's published stock
//! list, unpacks the first spreadsheet (`.xls`, `.xlsx`, `.ods`) or CSV
//! table from the archive and turns its rows into reference items.
//! Only the first sheet of a workbook is read. The table usually starts
//! with a title block, so the header row is located by its column names.

use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use calamine::{Data, Reader};
use tracing::{debug, info, instrument, warn};

use crate::config::FeedConfig;
use crate::domain::catalog::ReferenceItem;
use crate::domain::pricing::parse_supplier_price;
use crate::domain::stock::parse_feed_quantity;
use crate::ports::reference_feed::{FeedError, ReferenceFeed};

/// Local file signature of a zip archive.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// Compound document signature of a legacy `.xls` workbook.
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
/// Archive entries read as workbooks.
const WORKBOOK_EXTENSIONS: &[&str] = &[".xls", ".xlsx", ".xlsm", ".xlsb", ".ods"];

/// Where the stock list comes from.
#[derive(Debug, Clone)]
pub enum FeedSource {
    /// HTTP(S) download.
    Url(String),
    /// Local file.
    Path(PathBuf),
}

/// Column headers of the stock list.
#[derive(Debug, Clone)]
pub struct FeedColumns {
    /// Article column.
    pub id: String,
    /// Price column.
    pub price: String,
    /// Quantity column.
    pub stock: String,
}

impl Default for FeedColumns {
    fn default() -> Self {
        Self {
            id: "Код".to_string(),
            price: "Цена".to_string(),
            stock: "Количество".to_string(),
        }
    }
}

/// Rows that did not become reference items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Rows with nothing in any of the three columns.
    pub blank: usize,
    /// Rows whose price could not be parsed.
    pub unpriced: usize,
    /// Rows whose quantity could not be parsed (kept with stock 0).
    pub unknown_quantity: usize,
}

/// Supplier stock list loader.
pub struct SupplierFeed {
    /// Download URL or local path.
    source: FeedSource,
    /// Column headers to look for.
    columns: FeedColumns,
    /// CSV field delimiter (unused for workbooks).
    delimiter: u8,
    /// HTTP client for URL sources.
    http: reqwest::Client,
}

impl SupplierFeed {
    /// Create a feed from the `[feed]` config section.
    pub fn from_config(config: &FeedConfig, timeout: Duration) -> Result<Self> {
        let source = match (&config.url, &config.path) {
            (Some(url), None) => FeedSource::Url(url.clone()),
            (None, Some(path)) => FeedSource::Path(PathBuf::from(path)),
            _ => anyhow::bail!("Exactly one of feed.url or feed.path must be set"),
        };
        anyhow::ensure!(
            config.delimiter.is_ascii(),
            "feed.delimiter must be a single ASCII character"
        );

        let columns = FeedColumns {
            id: config.id_column.clone(),
            price: config.price_column.clone(),
            stock: config.stock_column.clone(),
        };

        Self::new(source, columns, config.delimiter as u8, timeout)
    }

    /// Create a feed from explicit parts.
    pub fn new(
        source: FeedSource,
        columns: FeedColumns,
        delimiter: u8,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build feed HTTP client")?;

        Ok(Self {
            source,
            columns,
            delimiter,
            http,
        })
    }

    /// Fetch the raw file (archive or table).
    async fn fetch_bytes(&self) -> Result<Vec<u8>, FeedError> {
        match &self.source {
            FeedSource::Url(url) => {
                let response = self.http.get(url).send().await.map_err(transport_error)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FeedError::Http {
                        status: status.as_u16(),
                    });
                }
                let bytes = response.bytes().await.map_err(transport_error)?;
                Ok(bytes.to_vec())
            }
            FeedSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| FeedError::Io(format!("{}: {e}", path.display()))),
        }
    }
}

#[async_trait]
impl ReferenceFeed for SupplierFeed {
    #[instrument(skip(self), fields(source = ?self.source))]
    async fn load_reference_items(&self) -> Result<Vec<ReferenceItem>, FeedError> {
        let raw = self.fetch_bytes().await?;
        debug!(bytes = raw.len(), "Supplier feed downloaded");

        let columns = self.columns.clone();
        let delimiter = self.delimiter;
        let (items, stats) = tokio::task::spawn_blocking(move || {
            let table = extract_table(&raw)?;
            parse_table(table, delimiter, &columns)
        })
        .await
        .map_err(|e| FeedError::Io(format!("feed parser task failed: {e}")))??;

        if stats.unpriced > 0 || stats.unknown_quantity > 0 {
            warn!(
                unpriced = stats.unpriced,
                unknown_quantity = stats.unknown_quantity,
                "Supplier rows with unreadable values"
            );
        }
        info!(items = items.len(), blank = stats.blank, "Supplier feed parsed");

        Ok(items)
    }
}


fn transport_error(err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::Timeout(err.to_string())
    } else {
        FeedError::Connection(err.to_string())
    }
}

/// Stock list table found in the downloaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedTable {
    /// Delimited text.
    Csv(Vec<u8>),
    /// Spreadsheet file bytes; the first sheet is read.
    Workbook(Vec<u8>),
}

/// Locate the stock list table.
///
/// A zip archive yields its first workbook or `.csv` entry, in archive
/// order. An `.xlsx` file is itself a zip and is returned whole. Anything
/// else is a bare `.xls` workbook or CSV text.
pub fn extract_table(raw: &[u8]) -> Result<FeedTable, FeedError> {
    if raw.starts_with(OLE_MAGIC) {
        return Ok(FeedTable::Workbook(raw.to_vec()));
    }
    if !raw.starts_with(ZIP_MAGIC) {
        return Ok(FeedTable::Csv(raw.to_vec()));
    }

    let mut archive =
        zip::ZipArchive::new(Cursor::new(raw)).map_err(|e| FeedError::Archive(e.to_string()))?;

    if archive.file_names().any(|name| name == "xl/workbook.xml") {
        return Ok(FeedTable::Workbook(raw.to_vec()));
    }

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| FeedError::Archive(e.to_string()))?;
        let name = entry.name().to_string();
        let lower = name.to_lowercase();

        let wrap: Option<fn(Vec<u8>) -> FeedTable> = if entry.is_dir() {
            None
        } else if WORKBOOK_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Some(FeedTable::Workbook)
        } else if lower.ends_with(".csv") {
            Some(FeedTable::Csv)
        } else {
            None
        };

        if let Some(wrap) = wrap {
            let mut table = Vec::new();
            entry
                .read_to_end(&mut table)
                .map_err(|e| FeedError::Archive(format!("{name}: {e}")))?;
            debug!(entry = %name, "Stock list entry selected");
            return Ok(wrap(table));
        }
        names.push(name);
    }

    Err(FeedError::Archive(format!(
        "no workbook or CSV table in archive (entries: {})",
        names.join(", ")
    )))
}

/// Parse the stock list table into reference items.
///
/// Rows before the header row are skipped. Rows with no price are
/// dropped; rows with a price but a blank article are kept so the
/// reconciler can reject them.
pub fn parse_table(
    table: FeedTable,
    delimiter: u8,
    columns: &FeedColumns,
) -> Result<(Vec<ReferenceItem>, ParseStats), FeedError> {
    let rows = match table {
        FeedTable::Csv(bytes) => csv_rows(&bytes, delimiter)?,
        FeedTable::Workbook(bytes) => workbook_rows(bytes)?,
    };
    parse_rows(&rows, columns)
}

fn csv_rows(table: &[u8], delimiter: u8) -> Result<Vec<Vec<String>>, FeedError> {
    let text = String::from_utf8_lossy(table);
    let text = text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| FeedError::Csv(e.to_string()))
        })
        .collect()
}

fn workbook_rows(bytes: Vec<u8>) -> Result<Vec<Vec<String>>, FeedError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| FeedError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FeedError::Workbook("workbook has no sheets".to_string()))?
        .map_err(|e| FeedError::Workbook(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Render a cell the way it reads in the CSV export.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract().abs() < f64::EPSILON => format!("{f:.0}"),
        Data::Float(f) => format!("{f:.2}"),
        other => other.to_string(),
    }
}

fn parse_rows(
    rows: &[Vec<String>],
    columns: &FeedColumns,
) -> Result<(Vec<ReferenceItem>, ParseStats), FeedError> {
    let mut header: Option<(usize, usize, usize)> = None;
    let mut items = Vec::new();
    let mut stats = ParseStats::default();

    for row in rows {
        let Some((id_idx, price_idx, stock_idx)) = header else {
            header = locate_header(row, columns);
            continue;
        };

        let cell = |i: usize| row.get(i).map(|c| c.trim()).unwrap_or_default();
        let (id, price_raw, stock_raw) = (cell(id_idx), cell(price_idx), cell(stock_idx));

        if id.is_empty() && price_raw.is_empty() && stock_raw.is_empty() {
            stats.blank += 1;
            continue;
        }

        let Some(price) = parse_supplier_price(price_raw) else {
            debug!(offer_id = id, price = price_raw, "Skipping row without a price");
            stats.unpriced += 1;
            continue;
        };

        let stock = parse_feed_quantity(stock_raw).unwrap_or_else(|| {
            stats.unknown_quantity += 1;
            0
        });

        items.push(ReferenceItem {
            offer_id: id.to_string(),
            price,
            stock,
        });
    }

    if header.is_none() {
        return Err(FeedError::MissingColumn(columns.id.clone()));
    }

    Ok((items, stats))
}

fn locate_header(row: &[String], columns: &FeedColumns) -> Option<(usize, usize, usize)> {
    let position = |name: &str| row.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    Some((
        position(&columns.id)?,
        position(&columns.price)?,
        position(&columns.stock)?,
    ))
}
