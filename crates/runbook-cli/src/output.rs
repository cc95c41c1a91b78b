use serde::Serialize;
use std::io::Write;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    write_table(&mut stdout.lock(), headers, rows)?;
    Ok(())
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header. Trailing padding is trimmed.
pub fn write_table<W: Write>(
    out: &mut W,
    headers: &[&str],
    rows: &[Vec<String>],
) -> std::io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    writeln!(out, "{}", render_row(headers.iter().copied(), &widths))?;
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    writeln!(out, "{}", rule.join("  "))?;
    for row in rows {
        writeln!(out, "{}", render_row(row.iter().map(String::as_str), &widths))?;
    }
    Ok(())
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:w$}"))
        .collect();
    line.join("  ").trim_end().to_string()
}

/// First line of `text`, shortened to `max` characters with an ellipsis.
pub fn preview(text: &str, max: usize) -> String {
    let first = text.lines().next().unwrap_or("");
    if first.chars().count() <= max {
        return first.to_string();
    }
    let mut out: String = first.chars().take(max.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_aligns_columns() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            &["#", "KIND"],
            &[
                vec!["1".into(), "bash".into()],
                vec!["12".into(), "js".into()],
            ],
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "#   KIND\n--  ----\n1   bash\n12  js\n");
    }

    #[test]
    fn preview_truncates_first_line() {
        assert_eq!(preview("echo hello\nsecond", 40), "echo hello");
        assert_eq!(preview("abcdefgh", 5), "abcd\u{2026}");
        assert_eq!(preview("", 5), "");
    }
}
