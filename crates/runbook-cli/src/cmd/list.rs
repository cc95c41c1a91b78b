use crate::document::Document;
use crate::output::{preview, print_json, print_table};
use runbook_core::blocks::Block;
use std::path::Path;

const BODY_PREVIEW: usize = 40;

pub fn run(doc: &Path, all: bool, confirm_only: bool, json: bool) -> anyhow::Result<()> {
    let document = Document::load(doc)?;
    let blocks: Vec<&Block> = document
        .blocks
        .iter()
        .filter(|b| {
            if all {
                true
            } else if confirm_only {
                b.is_actionable() && b.requires_confirmation()
            } else {
                b.is_actionable()
            }
        })
        .collect();

    if json {
        return print_json(&blocks);
    }

    if blocks.is_empty() {
        println!("No actionable blocks in {}.", document.path.display());
        return Ok(());
    }

    let rows: Vec<Vec<String>> = blocks.iter().map(|b| row(b)).collect();
    print_table(
        &["#", "LINES", "KIND", "ACTION", "SESSION", "PARAMS", "BODY"],
        &rows,
    )
}

fn row(block: &Block) -> Vec<String> {
    let action = &block.annotation.action;
    let mode = match action {
        Some(a) if block.is_actionable() => {
            if a.confirm_required() {
                format!("{}!", a.mode.label())
            } else {
                a.mode.label().to_string()
            }
        }
        _ => "-".to_string(),
    };
    let session = match action {
        Some(a) if block.is_actionable() => a.session().to_string(),
        _ => String::new(),
    };
    let params: Vec<&str> = block.parameters.iter().map(|p| p.name.as_str()).collect();
    let kind = if block.annotation.kind.is_empty() {
        "-".to_string()
    } else {
        block.annotation.kind.clone()
    };

    vec![
        block.index.to_string(),
        format!("{}-{}", block.start_line, block.end_line),
        kind,
        mode,
        session,
        params.join(","),
        preview(&block.body, BODY_PREVIEW),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use runbook_core::blocks::find_blocks;

    #[test]
    fn row_for_confirming_run_block() {
        let blocks = find_blocks("```bash run -t ops --ask-confirm\n# @param ENV\ndeploy\n```\n");
        let cells = row(&blocks[0]);
        assert_eq!(cells, ["1", "1-4", "bash", "Run!", "ops", "ENV", "# @param ENV"]);
    }

    #[test]
    fn row_for_inert_block() {
        let blocks = find_blocks("```\nplain\n```\n");
        let cells = row(&blocks[0]);
        assert_eq!(&cells[2..5], ["-", "-", ""]);
    }
}
