//! CSV export of a user's ledger.
//!
//! Format: a `date,amount,category,description` header, then one row per
//! entry. The date is written bare; every other value is double-quoted with
//! embedded quotes doubled. Rows are separated by `\n`.

use crate::domain::Expense;

pub const CSV_HEADER: &str = "date,amount,category,description";
pub const CSV_FILENAME: &str = "expenses.csv";

/// Quote a field, doubling any embedded quotes
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

pub fn csv_row(expense: &Expense) -> String {
    format!(
        "{},{},{},{}",
        expense.date.format("%Y-%m-%d"),
        quote(&expense.amount.to_string()),
        quote(&expense.category),
        quote(&expense.description),
    )
}

/// Render entries in date order (oldest first).
pub fn expenses_to_csv(expenses: &[Expense]) -> String {
    let mut ordered: Vec<&Expense> = expenses.iter().collect();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.created_at.cmp(&b.created_at)));

    let mut lines = Vec::with_capacity(ordered.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(ordered.into_iter().map(csv_row));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{expense::parse_date, EntryType, NewExpense};
    use uuid::Uuid;

    fn entry(date: &str, amount: &str, category: &str, description: &str) -> Expense {
        Expense::new(
            Uuid::nil(),
            NewExpense {
                date: parse_date(date).unwrap(),
                amount: amount.parse().unwrap(),
                category: category.to_string(),
                description: description.to_string(),
                kind: EntryType::Expense,
            },
        )
    }

    #[test]
    fn test_row_escapes_quotes() {
        let row = csv_row(&entry("2024-01-01", "10.50", "food", "a \"test\""));
        assert_eq!(row, r#"2024-01-01,"10.50","food","a ""test""""#);
    }

    #[test]
    fn test_header_only_when_empty() {
        assert_eq!(expenses_to_csv(&[]), CSV_HEADER);
    }

    #[test]
    fn test_rows_ordered_by_date() {
        let csv = expenses_to_csv(&[
            entry("2024-02-01", "2", "rent", ""),
            entry("2024-01-01", "1", "food", "x,y"),
        ]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,amount,category,description");
        assert_eq!(lines[1], r#"2024-01-01,"1","food","x,y""#);
        assert_eq!(lines[2], r#"2024-02-01,"2","rent","""#);
    }
}
