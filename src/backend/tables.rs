//! Table detection over extracted page text.
//!
//! The text layer of a PDF keeps column alignment as tabs, pipes or runs of
//! spaces. Consecutive lines that split into the same number of cells (at
//! least two) form a table; a table needs at least two rows.

use crate::model::Table;

/// Minimum run of spaces separating two cells
const MIN_GAP: usize = 3;

/// Minimum rows for a group of tabular lines to count as a table
const MIN_ROWS: usize = 2;

/// Split a line into cells, or `None` if it does not look like a table row
pub fn split_row(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.len() < 5 {
        return None;
    }

    let cells: Vec<String> = if trimmed.matches('\t').count() >= 1 {
        trimmed.split('\t').map(|c| c.trim().to_string()).collect()
    } else if trimmed.matches('|').count() >= 2 {
        trimmed
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().to_string())
            .collect()
    } else {
        split_on_gaps(trimmed)
    };

    let cells: Vec<String> = cells.into_iter().filter(|c| !c.is_empty()).collect();
    (cells.len() >= 2).then_some(cells)
}

fn split_on_gaps(text: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut gap = 0;

    for ch in text.chars() {
        if ch == ' ' {
            gap += 1;
            continue;
        }
        if gap >= MIN_GAP {
            cells.push(std::mem::take(&mut current));
        } else if gap > 0 {
            current.extend(std::iter::repeat(' ').take(gap));
        }
        gap = 0;
        current.push(ch);
    }
    cells.push(current);
    cells
}

/// Detect tables in page text
pub fn detect_tables(text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Table = Vec::new();

    let mut flush = |current: &mut Table| {
        if current.len() >= MIN_ROWS {
            tables.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for line in text.lines() {
        match split_row(line) {
            Some(row) => {
                if current.last().is_some_and(|prev| prev.len() != row.len()) {
                    flush(&mut current);
                }
                current.push(row);
            }
            None => flush(&mut current),
        }
    }
    flush(&mut current);

    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_aligned_table() {
        let text = "CARDÁPIO SEMANAL\n\
                    Segunda     Arroz 100g     Suco 200 ml\n\
                    Terça       Quinoa 80g     Chá 150 ml\n\
                    Observações gerais";

        let tables = detect_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 2);
        assert_eq!(tables[0][0], vec!["Segunda", "Arroz 100g", "Suco 200 ml"]);
        assert_eq!(tables[0][1][2], "Chá 150 ml");
    }

    #[test]
    fn test_pipe_and_tab_rows() {
        assert_eq!(
            split_row("| Refeição | Item | Qtd |").unwrap(),
            vec!["Refeição", "Item", "Qtd"]
        );
        assert_eq!(split_row("Almoço\tArroz\t100g").unwrap(), vec!["Almoço", "Arroz", "100g"]);
    }

    #[test]
    fn test_prose_is_not_tabular() {
        assert!(split_row("Frango grelhado com ervas finas").is_none());
        assert!(detect_tables("Almoço\nArroz 100g\nFeijão 80g").is_empty());
    }

    #[test]
    fn test_single_row_is_not_a_table() {
        assert!(detect_tables("Segunda     Arroz 100g\nfim").is_empty());
    }
}
