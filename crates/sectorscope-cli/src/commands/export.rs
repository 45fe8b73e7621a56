//! Save selected rows of one listing page to a portfolio CSV.

use sectorscope_core::{MarketApi, RecordId, ScreenerController};
use serde::Serialize;
use time::OffsetDateTime;

use crate::cli::ExportArgs;
use crate::error::CliError;

use super::stocks::{load_page, stock_table};
use super::CommandResult;

#[derive(Debug, Serialize)]
struct ExportResponseData {
    exported: bool,
    file_name: Option<String>,
    path: Option<String>,
    rows: usize,
    page: u32,
}

pub async fn run<A: MarketApi>(args: &ExportArgs, api: A) -> Result<CommandResult, CliError> {
    let mut screener = ScreenerController::new(api);
    let mut warnings = load_page(&mut screener, &args.listing).await?;

    if args.all {
        screener.select_all_visible();
    }
    for raw in &args.select {
        let id = RecordId::new(raw.trim());
        if !screener.records().iter().any(|record| record.id == id) {
            warnings.push(format!("record {id} is not on page {}", screener.pagination().page()));
            continue;
        }
        if !screener.selection().is_selected(&id) {
            screener.toggle_selection(id);
        }
    }

    let page = screener.pagination().page();
    let today = OffsetDateTime::now_utc().date();
    let (data, table) = match screener.export_selected(&args.prefix, today) {
        Ok(export) => {
            let path = export.write_to_dir(&args.output_dir)?;
            let records = screener.selection().selected_from(screener.records());
            let table = stock_table(&records.into_iter().cloned().collect::<Vec<_>>());
            let data = ExportResponseData {
                exported: true,
                file_name: Some(export.file_name),
                path: Some(path.display().to_string()),
                rows: export.rows,
                page,
            };
            (data, Some(table))
        }
        Err(error) if error.is_warning() => {
            warnings.push(error.to_string());
            let data = ExportResponseData {
                exported: false,
                file_name: None,
                path: None,
                rows: 0,
                page,
            };
            (data, None)
        }
        Err(error) => return Err(error.into()),
    };

    let mut result = CommandResult::ok(serde_json::to_value(data)?)
        .with_warnings(warnings)
        .with_slot_error(screener.listing());
    if let Some(table) = table {
        result = result.with_table(table);
    }
    Ok(result)
}
