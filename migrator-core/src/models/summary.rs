use std::time::Duration;

/// One row of the final summary report, appended once per table.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub qualified_table_name: String,
    pub rows_attempted: u64,
    pub rows_failed: u64,
    pub elapsed: Duration,
}

impl SummaryRow {
    pub fn rows_copied(&self) -> u64 {
        self.rows_attempted.saturating_sub(self.rows_failed)
    }
}

/// Renders `rows` as the documented four-column summary report: `TABLE | RECORDS | FAILED |
/// DATA LOAD TIME`, each cell padded to the widest value in its column, separated by `  |  `,
/// with a horizontal rule after the header and after every row.
pub fn format_summary_table(rows: &[SummaryRow]) -> String {
    const HEADERS: [&str; 4] = ["TABLE", "RECORDS", "FAILED", "DATA LOAD TIME"];

    let tables: Vec<&str> = rows.iter().map(|r| r.qualified_table_name.as_str()).collect();
    let records: Vec<String> = rows.iter().map(|r| r.rows_attempted.to_string()).collect();
    let faileds: Vec<String> = rows.iter().map(|r| r.rows_failed.to_string()).collect();
    let elapseds: Vec<String> = rows
        .iter()
        .map(|r| format!("{:.3}s", r.elapsed.as_secs_f64()))
        .collect();

    let width = |header: &str, values: &[impl AsRef<str>]| -> usize {
        values
            .iter()
            .map(|v| v.as_ref().len())
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(header.len())
    };

    let table_width = width(HEADERS[0], &tables);
    let records_width = width(HEADERS[1], &records);
    let failed_width = width(HEADERS[2], &faileds);
    let elapsed_width = width(HEADERS[3], &elapseds);

    let format_line = |table: &str, rec: &str, failed: &str, elapsed: &str| -> String {
        format!(
            "{table:<table_width$}  |  {rec:<records_width$}  |  {failed:<failed_width$}  |  {elapsed:<elapsed_width$}"
        )
    };

    let header_line = format_line(HEADERS[0], HEADERS[1], HEADERS[2], HEADERS[3]);
    let rule = "-".repeat(header_line.len());

    let mut out = String::new();
    out.push_str(&header_line);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for i in 0..rows.len() {
        out.push_str(&format_line(tables[i], &records[i], &faileds[i], &elapseds[i]));
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn formats_header_and_padded_columns() {
        let rows = vec![
            SummaryRow {
                qualified_table_name: "\"shop\".\"orders\"".to_string(),
                rows_attempted: 3,
                rows_failed: 1,
                elapsed: Duration::from_secs(2),
            },
            SummaryRow {
                qualified_table_name: "\"shop\".\"x\"".to_string(),
                rows_attempted: 100000,
                rows_failed: 0,
                elapsed: Duration::from_millis(500),
            },
        ];

        let rendered = format_summary_table(&rows);
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[0].starts_with("TABLE"));
        assert!(lines[0].contains("RECORDS"));
        assert!(lines[0].contains("FAILED"));
        assert!(lines[0].contains("DATA LOAD TIME"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert_eq!(lines[1].len(), lines[0].len());
        assert!(lines[2].contains("\"shop\".\"orders\""));
        assert!(lines[2].contains('3'));
        assert!(lines[2].contains('1'));
        assert_eq!(lines[3], lines[1]);
        assert!(lines[4].contains("100000"));
    }

    #[test]
    fn empty_summary_is_just_the_header_and_rule() {
        let rendered = format_summary_table(&[]);
        assert_eq!(rendered.lines().count(), 2);
    }
}
