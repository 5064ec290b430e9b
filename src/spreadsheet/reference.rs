//! A1-style cell references. Rows and columns are 1-based throughout the crate.
use regex::Regex;
use std::sync::OnceLock;

/// Last row of an xlsx worksheet (1-based)
pub(crate) const MAX_ROWS: usize = 1_048_576;

/// Last column of an xlsx worksheet (1-based)
pub(crate) const MAX_COLS: usize = 16_384;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?([0-9]+)$").expect("Hardcode regex pattern"))
}

/// Converts column letters to a column number: A = 1, Z = 26, AA = 27.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|letter| letter.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .bytes()
        .map(|letter| (letter - b'A') as usize + 1)
        .try_fold(0usize, |index, digit| index.checked_mul(26)?.checked_add(digit))
}

/// Parses a row number, rejecting row 0.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number.parse::<usize>().ok().filter(|row| *row > 0)
}

/// Converts a column number to column letters: 1 = A, 28 = AB.
pub(crate) fn index_to_col(col: usize) -> String {
    let mut col = col;
    let mut letters = Vec::new();
    while col > 0 {
        col -= 1;
        letters.push(b'A' + (col % 26) as u8);
        col /= 26;
    }
    letters.iter().rev().map(|letter| *letter as char).collect()
}

/// Parses a reference such as `B12` or `$B$12` into `(row, col)`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let captures = reference_pattern().captures(reference)?;
    let col = col_to_index(captures.get(1)?.as_str())?;
    let row = row_to_index(captures.get(2)?.as_str())?;
    Some((row, col))
}

/// Formats `(row, col)` as an A1-style reference.
pub fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row)
}

fn formula_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\$?)([A-Z]{1,3})(\$?)([0-9]+)|(\$?)([A-Z]{1,3}):(\$?)([A-Z]{1,3})|(\$?)([0-9]+):(\$?)([0-9]+)")
            .expect("Hardcode regex pattern")
    })
}

/// Moves the relative references of a formula by `rows` and `cols`, the way Excel fills a
/// formula down or across.
///
/// Cell references, whole-column ranges (`A:C`) and whole-row ranges (`2:4`) are moved;
/// parts marked with `$` are kept. String literals, quoted sheet names and structured
/// references (`Table1[Amount]`) are copied as they are. A reference moved off the grid
/// becomes `#REF!`.
pub(crate) fn shift_references(formula: &str, rows: i64, cols: i64) -> String {
    let mut shifted = String::with_capacity(formula.len());
    let mut start = 0;
    let mut closing: Option<char> = None;
    for (index, letter) in formula.char_indices() {
        match closing {
            Some(close) if letter == close => {
                let end = index + letter.len_utf8();
                shifted.push_str(&formula[start..end]);
                start = end;
                closing = None;
            }
            Some(_) => {}
            None => {
                closing = match letter {
                    '"' => Some('"'),
                    '\'' => Some('\''),
                    '[' => Some(']'),
                    _ => None,
                };
                if closing.is_some() {
                    shifted.push_str(&shift_unquoted(&formula[start..index], rows, cols));
                    start = index;
                }
            }
        }
    }
    match closing {
        Some(_) => shifted.push_str(&formula[start..]),
        None => shifted.push_str(&shift_unquoted(&formula[start..], rows, cols)),
    }
    shifted
}

fn shift_unquoted(text: &str, rows: i64, cols: i64) -> String {
    let mut shifted = String::with_capacity(text.len());
    let mut last = 0;
    for captures in formula_reference_pattern().captures_iter(text) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        // part of a name, a number or a function such as LOG10(
        let before = text[..whole.start()].chars().next_back();
        let after = text[whole.end()..].chars().next();
        if before.is_some_and(|letter| letter.is_ascii_alphanumeric() || matches!(letter, '_' | '.' | '$'))
            || after.is_some_and(|letter| letter.is_ascii_alphanumeric() || matches!(letter, '_' | '.' | '(' | '!'))
        {
            continue;
        }

        let moved = if let (Some(letters), Some(digits)) = (captures.get(2), captures.get(4)) {
            let (Some(col), Some(row)) = (grid_col(letters.as_str()), grid_row(digits.as_str())) else {
                continue;
            };
            move_index(col, &captures[1], cols, MAX_COLS)
                .zip(move_index(row, &captures[3], rows, MAX_ROWS))
                .map(|(col, row)| format!("{}{}{}{}", &captures[1], index_to_col(col), &captures[3], row))
        } else if let (Some(from), Some(to)) = (captures.get(6), captures.get(8)) {
            let (Some(from), Some(to)) = (grid_col(from.as_str()), grid_col(to.as_str())) else {
                continue;
            };
            move_index(from, &captures[5], cols, MAX_COLS)
                .zip(move_index(to, &captures[7], cols, MAX_COLS))
                .map(|(from, to)| format!("{}{}:{}{}", &captures[5], index_to_col(from), &captures[7], index_to_col(to)))
        } else if let (Some(from), Some(to)) = (captures.get(10), captures.get(12)) {
            let (Some(from), Some(to)) = (grid_row(from.as_str()), grid_row(to.as_str())) else {
                continue;
            };
            move_index(from, &captures[9], rows, MAX_ROWS)
                .zip(move_index(to, &captures[11], rows, MAX_ROWS))
                .map(|(from, to)| format!("{}{}:{}{}", &captures[9], from, &captures[11], to))
        } else {
            continue;
        };

        shifted.push_str(&text[last..whole.start()]);
        shifted.push_str(moved.as_deref().unwrap_or("#REF!"));
        last = whole.end();
    }
    shifted.push_str(&text[last..]);
    shifted
}

fn grid_col(letters: &str) -> Option<usize> {
    col_to_index(letters).filter(|col| *col <= MAX_COLS)
}

fn grid_row(digits: &str) -> Option<usize> {
    row_to_index(digits).filter(|row| *row <= MAX_ROWS)
}

/// Applies `offset` unless the part is anchored with `$`; `None` when it leaves `1..=max`.
fn move_index(index: usize, anchor: &str, offset: i64, max: usize) -> Option<usize> {
    if !anchor.is_empty() {
        return Some(index);
    }
    let moved = index as i64 + offset;
    (1..=max as i64).contains(&moved).then_some(moved as usize)
}

/// Parses the upper-right corner of a `<dimension ref="A1:D20"/>` range.
pub(crate) fn range_upper_bound(range: &str) -> Option<(usize, usize)> {
    let upper = range.rsplit(':').next()?;
    reference_to_index(upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns() {
        assert_eq!(col_to_index("A"), Some(1));
        assert_eq!(col_to_index("z"), Some(26));
        assert_eq!(col_to_index("AA"), Some(27));
        assert_eq!(col_to_index("XFD"), Some(16_384));
        assert_eq!(col_to_index(""), None);
        assert_eq!(col_to_index("A1"), None);

        assert_eq!(index_to_col(1), "A");
        assert_eq!(index_to_col(26), "Z");
        assert_eq!(index_to_col(28), "AB");
        assert_eq!(index_to_col(16_384), "XFD");
    }

    #[test]
    fn references() {
        assert_eq!(reference_to_index("A1"), Some((1, 1)));
        assert_eq!(reference_to_index("$C$7"), Some((7, 3)));
        assert_eq!(reference_to_index("ab10"), Some((10, 28)));
        assert_eq!(reference_to_index("A0"), None);
        assert_eq!(reference_to_index("1A"), None);
        assert_eq!(index_to_reference(7, 3), "C7");
    }

    #[test]
    fn shifted_formulas() {
        assert_eq!(shift_references("A1+B1", 1, 0), "A2+B2");
        assert_eq!(shift_references("$A$1+A$1+$A1", 2, 2), "$A$1+C$1+$A3");
        assert_eq!(shift_references("SUM(A1:B2)*LOG10(C3)", 1, 1), "SUM(B2:C3)*LOG10(D4)");
        assert_eq!(shift_references("SUM(A:A)+SUM(1:1)", 1, 1), "SUM(B:B)+SUM(2:2)");
        assert_eq!(shift_references("Sheet2!B4", 2, 0), "Sheet2!B6");
        assert_eq!(shift_references("'My Sheet'!A1&\"A1\"", 1, 0), "'My Sheet'!A2&\"A1\"");
        assert_eq!(shift_references("Table1[Col1]+A1", 1, 0), "Table1[Col1]+A2");
        assert_eq!(shift_references("A2-1.5E1", -1, 0), "A1-1.5E1");
        assert_eq!(shift_references("A1", -1, 0), "#REF!");
        assert_eq!(shift_references("TODAY()", 3, 3), "TODAY()");
    }

    #[test]
    fn dimensions() {
        assert_eq!(range_upper_bound("A1:D20"), Some((20, 4)));
        assert_eq!(range_upper_bound("B3"), Some((3, 2)));
        assert_eq!(range_upper_bound(""), None);
    }
}
