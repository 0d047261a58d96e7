//! Table rendering utilities for CLI outputs.

pub struct Column {
    pub header: String,
    pub width: usize,
}

impl Column {
    pub fn new(header: &str, width: usize) -> Self {
        Self {
            header: header.to_string(),
            width,
        }
    }
}

pub struct TextTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        // Header
        for col in &self.columns {
            out.push_str(&format!("{:<width$} ", col.header, width = col.width));
        }
        out.push('\n');
        for col in &self.columns {
            out.push_str(&format!("{} ", "-".repeat(col.width)));
        }
        out.push('\n');

        // Rows
        for row in &self.rows {
            for (i, col) in self.columns.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                out.push_str(&format!("{:<width$} ", cell, width = col.width));
            }
            out.push('\n');
        }

        out
    }
}
