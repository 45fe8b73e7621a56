use crate::cli::OutputFormat;
use crate::commands::Report;
use crate::error::CliError;

/// Column-aligned text table for `--format table`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Adds a row. Missing cells render empty and extra cells are dropped.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(index, &width)| {
            let cell = cells.get(index).map(String::as_str).unwrap_or("");
            format!("{cell:<width$}")
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

pub fn render(report: &Report, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(report)?
            } else {
                serde_json::to_string(report)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => render_table(report)?,
    }

    Ok(())
}

fn render_table(report: &Report) -> Result<(), CliError> {
    println!("command     : {}", report.command);
    println!("backend     : {}", report.base_url);
    println!("generated_at: {}", report.generated_at);

    if !report.warnings.is_empty() {
        println!("warnings:");
        for warning in &report.warnings {
            println!("  - {warning}");
        }
    }

    match &report.table {
        Some(table) if !table.is_empty() => print!("{}", table.render()),
        Some(_) => println!("(no rows)"),
        None => {
            println!("data:");
            let pretty_data = serde_json::to_string_pretty(&report.data)?;
            for line in pretty_data.lines() {
                println!("  {line}");
            }
        }
    }

    if !report.errors.is_empty() {
        println!("errors:");
        for error in &report.errors {
            println!("  - {}: {}", error.code, error.message);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_pads_columns_to_widest_cell() {
        let mut table = Table::new(["Ticker", "Price"]);
        table.push_row(vec![String::from("ESLT"), String::from("312.40")]);
        table.push_row(vec![String::from("A")]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Ticker  Price");
        assert_eq!(lines[1], "------  ------");
        assert_eq!(lines[2], "ESLT    312.40");
        assert_eq!(lines[3], "A");
    }
}
