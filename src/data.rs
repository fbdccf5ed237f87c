//! Price and return matrices.
//!
//! A [`PriceMatrix`] holds closing prices with one column per asset and one
//! row per trading day, and may contain gaps. [`PriceMatrix::to_returns`]
//! turns it into an aligned [`ReturnMatrix`] of period-over-period fractional
//! changes, dropping the first row and every row where any asset's return is
//! undefined.
//!
//! Prices are usually loaded from CSV with [`load_prices_csv`], which accepts
//! either a wide file (`date,TCS,INFY,...`) or a long file
//! (`date,ticker,close_price`) that is pivoted into columns.

use crate::error::{NiveshError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Minimum number of aligned return periods needed to estimate a risk model.
pub const MIN_RETURN_PERIODS: usize = 2;

/// Layout of a price CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceLayout {
    /// Long if a ticker column is present, wide otherwise.
    #[default]
    Auto,
    /// `date,SYM1,SYM2,...`
    Wide,
    /// `date,ticker,close`
    Long,
}

/// Configuration for loading price files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Date format string (e.g. "%Y-%m-%d"). Common formats are tried when unset.
    pub date_format: Option<String>,
    /// CSV delimiter. Comma when unset.
    pub delimiter: Option<u8>,
    /// File layout.
    pub layout: PriceLayout,
    /// Treat unparseable cells and rows as gaps instead of failing.
    pub skip_invalid: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_format: None,
            delimiter: None,
            layout: PriceLayout::Auto,
            skip_invalid: true,
        }
    }
}

/// Closing prices, one column per asset, chronological rows, gaps allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMatrix {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<Option<f64>>>,
}

impl PriceMatrix {
    /// Build a price matrix.
    ///
    /// `dates` is either empty (rows are already chronological) or has one
    /// entry per row; dated rows are sorted and duplicate dates keep the last
    /// row seen.
    pub fn new(
        symbols: Vec<String>,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        validate_symbols(&symbols)?;
        if !dates.is_empty() && dates.len() != rows.len() {
            return Err(NiveshError::DataError(format!(
                "{} dates for {} price rows",
                dates.len(),
                rows.len()
            )));
        }
        if let Some(i) = rows.iter().position(|r| r.len() != symbols.len()) {
            return Err(NiveshError::DataError(format!(
                "Price row {} has {} values, expected {}",
                i,
                rows[i].len(),
                symbols.len()
            )));
        }

        if dates.is_empty() {
            return Ok(Self {
                symbols,
                dates,
                rows,
            });
        }

        let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        let original_len = rows.len();
        for (date, row) in dates.into_iter().zip(rows) {
            by_date.insert(date, row);
        }
        if by_date.len() < original_len {
            warn!(
                "Removed {} duplicate price dates",
                original_len - by_date.len()
            );
        }
        let (dates, rows) = by_date.into_iter().unzip();

        Ok(Self {
            symbols,
            dates,
            rows,
        })
    }

    /// Build an undated, gap-free matrix from per-asset price columns.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let len = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        if let Some((s, c)) = columns.iter().find(|(_, c)| c.len() != len) {
            return Err(NiveshError::DataError(format!(
                "Column {} has {} prices, expected {}",
                s,
                c.len(),
                len
            )));
        }
        let symbols = columns.iter().map(|(s, _)| s.clone()).collect();
        let rows = (0..len)
            .map(|t| columns.iter().map(|(_, c)| Some(c[t])).collect())
            .collect();
        Self::new(symbols, Vec::new(), rows)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.rows
    }

    /// Number of price rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Most recent known price for each asset.
    pub fn latest_prices(&self) -> HashMap<String, f64> {
        self.symbols
            .iter()
            .enumerate()
            .filter_map(|(j, s)| {
                self.rows
                    .iter()
                    .rev()
                    .find_map(|row| row[j])
                    .map(|p| (s.clone(), p))
            })
            .collect()
    }

    /// Period-over-period fractional returns with undefined rows dropped.
    ///
    /// A return for asset `j` at row `t` is defined when both `p[t-1][j]` and
    /// `p[t][j]` are present and finite and `p[t-1][j]` is non-zero. Any row
    /// with an undefined return for any asset is dropped for all assets.
    pub fn to_returns(&self) -> ReturnMatrix {
        let mut rows = Vec::with_capacity(self.rows.len().saturating_sub(1));
        let mut dates = Vec::new();
        let mut dropped = 0;

        for t in 1..self.rows.len() {
            let prev = &self.rows[t - 1];
            let curr = &self.rows[t];
            let row: Option<Vec<f64>> = prev
                .iter()
                .zip(curr)
                .map(|(p0, p1)| match (p0, p1) {
                    (Some(p0), Some(p1)) if *p0 != 0.0 => {
                        let r = (p1 - p0) / p0;
                        r.is_finite().then_some(r)
                    }
                    _ => None,
                })
                .collect();

            match row {
                Some(row) => {
                    rows.push(row);
                    if !self.dates.is_empty() {
                        dates.push(self.dates[t]);
                    }
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(
                "Dropped {} of {} return periods with missing prices",
                dropped,
                self.rows.len().saturating_sub(1)
            );
        }

        ReturnMatrix {
            symbols: self.symbols.clone(),
            dates,
            rows,
        }
    }

    /// Shape and coverage overview.
    pub fn summary(&self) -> DataSummary {
        let returns = self.to_returns();
        let possible = self.rows.len().saturating_sub(1);
        let missing_prices = self
            .rows
            .iter()
            .map(|r| r.iter().filter(|p| p.is_none()).count())
            .sum();
        DataSummary {
            symbols: self.symbols.clone(),
            price_rows: self.rows.len(),
            missing_prices,
            return_periods: returns.n_periods(),
            dropped_periods: possible - returns.n_periods(),
            start: self.dates.first().copied(),
            end: self.dates.last().copied(),
        }
    }
}

/// Overview of a loaded price file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub symbols: Vec<String>,
    pub price_rows: usize,
    pub missing_prices: usize,
    pub return_periods: usize,
    pub dropped_periods: usize,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DataSummary {
    /// Whether enough aligned periods remain to fit a risk model.
    pub fn is_usable(&self) -> bool {
        self.return_periods >= MIN_RETURN_PERIODS && !self.symbols.is_empty()
    }
}

/// Aligned fractional returns, one row per period, one column per asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMatrix {
    symbols: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<f64>>,
}

impl ReturnMatrix {
    /// Build a return matrix from rows of per-asset returns.
    pub fn new(symbols: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        validate_symbols(&symbols)?;
        for (t, row) in rows.iter().enumerate() {
            if row.len() != symbols.len() {
                return Err(NiveshError::DataError(format!(
                    "Return row {} has {} values, expected {}",
                    t,
                    row.len(),
                    symbols.len()
                )));
            }
            if let Some(j) = row.iter().position(|r| !r.is_finite()) {
                return Err(NiveshError::DataError(format!(
                    "Non-finite return for {} at row {}",
                    symbols[j], t
                )));
            }
        }
        Ok(Self {
            symbols,
            dates: Vec::new(),
            rows,
        })
    }

    /// Build a return matrix from per-asset return columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let len = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        if let Some((s, c)) = columns.iter().find(|(_, c)| c.len() != len) {
            return Err(NiveshError::DataError(format!(
                "Column {} has {} returns, expected {}",
                s,
                c.len(),
                len
            )));
        }
        let symbols = columns.iter().map(|(s, _)| s.clone()).collect();
        let rows = (0..len)
            .map(|t| columns.iter().map(|(_, c)| c[t]).collect())
            .collect();
        Self::new(symbols, rows)
    }

    /// Attach one date per row.
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.rows.len() {
            return Err(NiveshError::DataError(format!(
                "{} dates for {} return rows",
                dates.len(),
                self.rows.len()
            )));
        }
        self.dates = dates;
        Ok(self)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_periods(&self) -> usize {
        self.rows.len()
    }

    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    /// All returns for one asset, in period order.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// The last `n` periods (all of them if fewer exist).
    pub fn tail(&self, n: usize) -> &[Vec<f64>] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    /// Per-period portfolio returns for weights given in column order.
    pub fn portfolio_returns(&self, weights: &[f64]) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.iter().zip(weights).map(|(r, w)| r * w).sum())
            .collect()
    }
}

fn validate_symbols(symbols: &[String]) -> Result<()> {
    if symbols.is_empty() {
        return Err(NiveshError::InsufficientData(
            "Need at least one asset".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for s in symbols {
        if s.trim().is_empty() {
            return Err(NiveshError::DataError("Empty asset symbol".to_string()));
        }
        if !seen.insert(s.as_str()) {
            return Err(NiveshError::DataError(format!("Duplicate asset symbol: {}", s)));
        }
    }
    Ok(())
}

/// Parse a date string using the given format or common formats.
fn parse_date(s: &str, format: Option<&str>) -> Result<NaiveDate> {
    let s = s.trim();
    let mut explicit_err = None;
    if let Some(fmt) = format {
        match NaiveDate::parse_from_str(s, fmt) {
            Ok(d) => return Ok(d),
            Err(e) => explicit_err = Some(e),
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    let date_formats = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%d/%m/%Y",
        "%m/%d/%Y",
        "%d-%b-%Y",
        "%d %b %Y",
        "%b %d, %Y",
    ];
    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
    ];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    if let Some(e) = explicit_err {
        return Err(e.into());
    }
    Err(NiveshError::DataError(format!("Unable to parse date: {}", s)))
}

fn parse_price(cell: &str) -> Option<std::result::Result<f64, std::num::ParseFloatError>> {
    let cell = cell.trim();
    if cell.is_empty()
        || cell.eq_ignore_ascii_case("nan")
        || cell.eq_ignore_ascii_case("null")
        || cell.eq_ignore_ascii_case("na")
    {
        return None;
    }
    Some(cell.parse::<f64>())
}

const TICKER_COLUMNS: [&str; 3] = ["ticker", "symbol", "asset"];
const CLOSE_COLUMNS: [&str; 4] = ["close_price", "close", "adj_close", "price"];

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
}

/// Load a price matrix from a CSV file.
pub fn load_prices_csv(path: impl AsRef<Path>, config: &DataConfig) -> Result<PriceMatrix> {
    let path = path.as_ref();
    info!("Loading prices from: {}", path.display());

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(config.delimiter.unwrap_or(b','))
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.len() < 2 {
        return Err(NiveshError::DataError(format!(
            "Price file needs a date column and at least one price column, found {} columns",
            headers.len()
        )));
    }

    let layout = match config.layout {
        PriceLayout::Auto if find_column(&headers, &TICKER_COLUMNS).is_some() => PriceLayout::Long,
        PriceLayout::Auto => PriceLayout::Wide,
        other => other,
    };
    debug!("Price layout: {:?}", layout);

    let matrix = match layout {
        PriceLayout::Long => read_long(&mut reader, &headers, config)?,
        _ => read_wide(&mut reader, &headers, config)?,
    };

    info!(
        "Loaded {} price rows for {} assets",
        matrix.len(),
        matrix.symbols().len()
    );
    Ok(matrix)
}

fn read_wide(
    reader: &mut csv::Reader<std::fs::File>,
    headers: &[String],
    config: &DataConfig,
) -> Result<PriceMatrix> {
    let symbols: Vec<String> = headers[1..].to_vec();
    let mut dates = Vec::new();
    let mut rows = Vec::new();
    let mut skipped = 0;

    for (row_num, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {}: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let date = match parse_date(record.get(0).unwrap_or(""), config.date_format.as_deref()) {
            Ok(d) => d,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {} due to date parse error: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut row = Vec::with_capacity(symbols.len());
        for (j, symbol) in symbols.iter().enumerate() {
            let price = match parse_price(record.get(j + 1).unwrap_or("")) {
                None => None,
                Some(Ok(p)) => Some(p),
                Some(Err(_)) if config.skip_invalid => None,
                Some(Err(e)) => {
                    return Err(NiveshError::DataError(format!(
                        "Invalid price for {} at row {}: {}",
                        symbol,
                        row_num + 1,
                        e
                    )))
                }
            };
            row.push(price);
        }
        dates.push(date);
        rows.push(row);
    }

    if skipped > 0 {
        warn!("Skipped {} invalid rows", skipped);
    }
    PriceMatrix::new(symbols, dates, rows)
}

fn read_long(
    reader: &mut csv::Reader<std::fs::File>,
    headers: &[String],
    config: &DataConfig,
) -> Result<PriceMatrix> {
    let ticker_col = find_column(headers, &TICKER_COLUMNS)
        .ok_or_else(|| NiveshError::DataError("Long layout needs a ticker column".to_string()))?;
    let close_col = find_column(headers, &CLOSE_COLUMNS)
        .ok_or_else(|| NiveshError::DataError("Long layout needs a close column".to_string()))?;
    let date_col = find_column(headers, &["date", "timestamp"]).unwrap_or(0);

    let mut symbols: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut by_date: BTreeMap<NaiveDate, HashMap<usize, f64>> = BTreeMap::new();
    let mut skipped = 0;

    for (row_num, record) in reader.records().enumerate() {
        let parsed = record.map_err(NiveshError::from).and_then(|record| {
            let date = parse_date(
                record.get(date_col).unwrap_or(""),
                config.date_format.as_deref(),
            )?;
            let ticker = record.get(ticker_col).unwrap_or("").trim().to_string();
            if ticker.is_empty() {
                return Err(NiveshError::DataError("Empty ticker".to_string()));
            }
            let price = match parse_price(record.get(close_col).unwrap_or("")) {
                None => None,
                Some(p) => Some(p.map_err(|e| NiveshError::DataError(e.to_string()))?),
            };
            Ok((date, ticker, price))
        });

        let (date, ticker, price) = match parsed {
            Ok(v) => v,
            Err(e) if config.skip_invalid => {
                debug!("Skipping row {}: {}", row_num + 1, e);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let j = *index.entry(ticker.clone()).or_insert_with(|| {
            symbols.push(ticker);
            symbols.len() - 1
        });
        let day = by_date.entry(date).or_default();
        if let Some(p) = price {
            day.insert(j, p);
        }
    }

    if skipped > 0 {
        warn!("Skipped {} invalid rows", skipped);
    }

    let mut dates = Vec::with_capacity(by_date.len());
    let mut rows = Vec::with_capacity(by_date.len());
    for (date, prices) in by_date {
        dates.push(date);
        rows.push((0..symbols.len()).map(|j| prices.get(&j).copied()).collect());
    }
    PriceMatrix::new(symbols, dates, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_simple_returns() {
        let prices = PriceMatrix::from_columns(vec![
            ("A".to_string(), vec![100.0, 110.0, 99.0]),
            ("B".to_string(), vec![50.0, 50.0, 55.0]),
        ])
        .unwrap();
        let returns = prices.to_returns();
        assert_eq!(returns.n_periods(), 2);
        assert!((returns.rows()[0][0] - 0.10).abs() < 1e-12);
        assert!((returns.rows()[1][0] + 0.10).abs() < 1e-12);
        assert_eq!(returns.rows()[0][1], 0.0);
        assert!((returns.rows()[1][1] - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_gap_drops_row_for_all_assets() {
        let prices = PriceMatrix::new(
            vec!["A".into(), "B".into()],
            vec![day(1), day(2), day(3), day(4)],
            vec![
                vec![Some(100.0), Some(10.0)],
                vec![Some(101.0), None],
                vec![Some(102.0), Some(11.0)],
                vec![Some(103.0), Some(12.0)],
            ],
        )
        .unwrap();
        let returns = prices.to_returns();
        // Rows 2 and 3 both touch the gap; only day 4 survives.
        assert_eq!(returns.n_periods(), 1);
        assert_eq!(returns.dates(), &[day(4)]);
        let summary = prices.summary();
        assert_eq!(summary.dropped_periods, 2);
        assert_eq!(summary.missing_prices, 1);
        assert!(!summary.is_usable());
    }

    #[test]
    fn test_zero_prior_price_is_undefined() {
        let prices =
            PriceMatrix::from_columns(vec![("A".to_string(), vec![0.0, 1.0, 2.0])]).unwrap();
        let returns = prices.to_returns();
        assert_eq!(returns.n_periods(), 1);
        assert!((returns.rows()[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_sorted_and_deduplicated() {
        let prices = PriceMatrix::new(
            vec!["A".into()],
            vec![day(3), day(1), day(3)],
            vec![vec![Some(3.0)], vec![Some(1.0)], vec![Some(30.0)]],
        )
        .unwrap();
        assert_eq!(prices.dates(), &[day(1), day(3)]);
        assert_eq!(prices.rows()[1][0], Some(30.0));
    }

    #[test]
    fn test_rejects_empty_and_duplicate_symbols() {
        let err = ReturnMatrix::new(vec![], vec![]).unwrap_err();
        assert!(err.is_insufficient_data());
        assert!(ReturnMatrix::new(vec!["A".into(), "A".into()], vec![]).is_err());
        assert!(ReturnMatrix::new(vec!["A".into()], vec![vec![f64::NAN]]).is_err());
    }

    #[test]
    fn test_tail_and_portfolio_returns() {
        let r = ReturnMatrix::from_columns(vec![
            ("A".to_string(), vec![0.01, 0.02, 0.03]),
            ("B".to_string(), vec![-0.01, 0.0, 0.01]),
        ])
        .unwrap();
        assert_eq!(r.tail(2).len(), 2);
        assert_eq!(r.tail(10).len(), 3);
        let p = r.portfolio_returns(&[0.5, 0.5]);
        assert!((p[2] - 0.02).abs() < 1e-12);
        assert_eq!(r.column(1), vec![-0.01, 0.0, 0.01]);
    }

    #[test]
    fn test_latest_prices_skip_gaps() {
        let prices = PriceMatrix::new(
            vec!["A".into(), "B".into()],
            vec![],
            vec![vec![Some(1.0), Some(2.0)], vec![Some(1.5), None]],
        )
        .unwrap();
        let latest = prices.latest_prices();
        assert_eq!(latest["A"], 1.5);
        assert_eq!(latest["B"], 2.0);
    }

    #[test]
    fn test_load_wide_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "date,TCS,INFY").unwrap();
        writeln!(file, "2024-01-02,3500.0,1500.0").unwrap();
        writeln!(file, "2024-01-01,3450.0,").unwrap();
        writeln!(file, "2024-01-03,3550.0,1510.0").unwrap();

        let prices = load_prices_csv(file.path(), &DataConfig::default()).unwrap();
        assert_eq!(prices.symbols(), &["TCS".to_string(), "INFY".to_string()]);
        assert_eq!(prices.dates()[0], day(1));
        assert_eq!(prices.rows()[0][1], None);
        assert_eq!(prices.to_returns().n_periods(), 1);
    }

    #[test]
    fn test_load_long_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ticker,date,close_price").unwrap();
        writeln!(file, "RELIANCE.NS,2024-01-01,2500").unwrap();
        writeln!(file, "RELIANCE.NS,2024-01-02,2525").unwrap();
        writeln!(file, "HDFCBANK.NS,2024-01-01,1600").unwrap();
        writeln!(file, "HDFCBANK.NS,2024-01-02,1584").unwrap();
        writeln!(file, "HDFCBANK.NS,not-a-date,1584").unwrap();

        let prices = load_prices_csv(file.path(), &DataConfig::default()).unwrap();
        assert_eq!(prices.symbols().len(), 2);
        assert_eq!(prices.len(), 2);
        let returns = prices.to_returns();
        assert!((returns.rows()[0][0] - 0.01).abs() < 1e-12);
        assert!((returns.rows()[0][1] + 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_strict_mode_fails_on_bad_price() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "date,A").unwrap();
        writeln!(file, "2024-01-01,abc").unwrap();
        let config = DataConfig {
            skip_invalid: false,
            ..Default::default()
        };
        assert!(load_prices_csv(file.path(), &config).is_err());
        assert!(load_prices_csv(file.path(), &DataConfig::default()).is_ok());
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-05", None).unwrap(), day(5));
        assert_eq!(parse_date("05/01/2024", Some("%d/%m/%Y")).unwrap(), day(5));
        assert_eq!(parse_date("2024-01-05 14:30:00", None).unwrap(), day(5));
        assert!(parse_date("yesterday", None).is_err());
    }

    #[test]
    fn test_explicit_date_format_error_kind() {
        assert!(matches!(
            parse_date("garbage", Some("%d-%m-%Y")),
            Err(NiveshError::DateParseError(_))
        ));
        // The common formats still apply when the explicit one misses.
        assert_eq!(parse_date("2024-01-05", Some("%d-%m-%Y")).unwrap(), day(5));
        assert!(matches!(parse_date("garbage", None), Err(NiveshError::DataError(_))));
    }

    #[test]
    fn test_strict_mode_reports_bad_date() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "date,A").unwrap();
        writeln!(file, "2024-01-01,100").unwrap();
        writeln!(file, "01.02.2024,101").unwrap();
        let config = DataConfig {
            date_format: Some("%Y-%m-%d".to_string()),
            skip_invalid: false,
            ..Default::default()
        };
        assert!(matches!(
            load_prices_csv(file.path(), &config),
            Err(NiveshError::DateParseError(_))
        ));
    }
}
