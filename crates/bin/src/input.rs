//! Loading return histories, value series and snapshots from files.
//!
//! CSV inputs carry a header row. A leading `date` column is ignored; every
//! other column is numeric.

use crate::error::CliError;
use ballast::core::{AssetId, Periodicity, PortfolioWeights, ReturnSeries};
use ballast::risk::PortfolioSnapshot;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub(crate) fn open(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Parse one return series per asset column.
pub(crate) fn read_return_histories<R: Read>(
    reader: R,
    periodicity: Periodicity,
) -> Result<Vec<ReturnSeries>, CliError> {
    let (names, columns) = read_columns(reader)?;
    let mut histories = Vec::with_capacity(names.len());
    for (name, values) in names.into_iter().zip(columns) {
        histories.push(ReturnSeries::new(name, periodicity, values)?);
    }
    Ok(histories)
}

/// Parse the column named `preferred`, or the only numeric column.
pub(crate) fn read_series<R: Read>(reader: R, preferred: &str) -> Result<Vec<f64>, CliError> {
    let (names, mut columns) = read_columns(reader)?;
    if let Some(i) = names.iter().position(|n| n.eq_ignore_ascii_case(preferred)) {
        return Ok(columns.swap_remove(i));
    }
    match columns.len() {
        1 => Ok(columns.swap_remove(0)),
        n => Err(CliError::Input(format!(
            "expected a `{preferred}` column or a single numeric column, found {n} columns"
        ))),
    }
}

pub(crate) fn read_json<T: DeserializeOwned, R: Read>(reader: R) -> Result<T, CliError> {
    Ok(serde_json::from_reader(reader)?)
}

pub(crate) fn read_snapshot(path: &Path) -> Result<PortfolioSnapshot, CliError> {
    read_json(open(path)?)
}

pub(crate) fn read_weights(path: &Path) -> Result<PortfolioWeights, CliError> {
    read_json(open(path)?)
}

/// Assets named on the command line, or every history when none are named.
pub(crate) fn asset_selection(requested: &[String], histories: &[ReturnSeries]) -> Vec<AssetId> {
    if requested.is_empty() {
        histories.iter().map(|s| s.asset_id().clone()).collect()
    } else {
        requested.iter().map(AssetId::new).collect()
    }
}

fn read_columns<R: Read>(reader: R) -> Result<(Vec<String>, Vec<Vec<f64>>), CliError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let skip = usize::from(
        headers
            .get(0)
            .is_some_and(|h| h.eq_ignore_ascii_case("date")),
    );
    let names: Vec<String> = headers.iter().skip(skip).map(str::to_string).collect();
    if names.is_empty() {
        return Err(CliError::Input("no numeric columns in header".into()));
    }

    let mut columns = vec![Vec::new(); names.len()];
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        for ((field, column), name) in record.iter().skip(skip).zip(&mut columns).zip(&names) {
            let value = field.parse::<f64>().map_err(|_| {
                CliError::Input(format!(
                    "line {}: `{field}` in column {name} is not a number",
                    row + 2
                ))
            })?;
            column.push(value);
        }
    }
    Ok((names, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_histories_skip_date_column() {
        let csv = "date,AAA,BBB\n2024-01-02,0.01,-0.02\n2024-01-03,0.005,0.01\n";
        let histories = read_return_histories(csv.as_bytes(), Periodicity::Daily).unwrap();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].asset_id().as_str(), "AAA");
        assert_eq!(histories[1].values(), &[-0.02, 0.01]);
    }

    #[test]
    fn test_histories_without_date() {
        let csv = "AAA, BBB\n0.01, 0.02\n";
        let histories = read_return_histories(csv.as_bytes(), Periodicity::Weekly).unwrap();
        assert_eq!(histories[1].asset_id().as_str(), "BBB");
        assert_eq!(histories[1].periodicity(), Periodicity::Weekly);
    }

    #[test]
    fn test_bad_cells_rejected() {
        let not_a_number = "AAA\n0.01\nabc\n";
        assert!(matches!(
            read_return_histories(not_a_number.as_bytes(), Periodicity::Daily),
            Err(CliError::Input(msg)) if msg.contains("line 3")
        ));

        let ragged = "AAA,BBB\n0.01\n";
        assert!(matches!(
            read_return_histories(ragged.as_bytes(), Periodicity::Daily),
            Err(CliError::Csv(_))
        ));

        let nan = "AAA\nNaN\n";
        assert!(matches!(
            read_return_histories(nan.as_bytes(), Periodicity::Daily),
            Err(CliError::Engine { .. })
        ));
    }

    #[test]
    fn test_series_column_choice() {
        let named = "date,cash,value\n2024-01-02,1,100\n2024-01-03,1,90\n";
        assert_eq!(read_series(named.as_bytes(), "value").unwrap(), vec![100.0, 90.0]);

        let single = "nav\n100\n105.5\n";
        let values = read_series(single.as_bytes(), "value").unwrap();
        assert_relative_eq!(values[1], 105.5);

        let ambiguous = "a,b\n1,2\n";
        assert!(read_series(ambiguous.as_bytes(), "value").is_err());
    }

    #[test]
    fn test_asset_selection_defaults_to_all() {
        let histories = read_return_histories("X,Y\n0.1,0.2\n".as_bytes(), Periodicity::Daily).unwrap();
        let all = asset_selection(&[], &histories);
        assert_eq!(all, vec![AssetId::new("X"), AssetId::new("Y")]);
        let some = asset_selection(&["Y".to_string()], &histories);
        assert_eq!(some, vec![AssetId::new("Y")]);
    }

    #[test]
    fn test_weights_json() {
        let json = r#"[{"asset": "X", "weight": 0.25}, {"asset": "Y", "weight": 0.75}]"#;
        let weights: PortfolioWeights = read_json(json.as_bytes()).unwrap();
        assert_eq!(weights.get(&AssetId::new("Y")), Some(0.75));
    }
}
