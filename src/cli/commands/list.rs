use crate::cli::ListArgs;
use crate::config::CliOverrides;
use crate::dashboard::IssueList;
use crate::error::Result;
use crate::model::MergedIssue;
use crate::view::ViewQuery;

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the view arguments are invalid or the fetch fails.
pub async fn execute(args: &ListArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let query = ViewQuery::parse(
        args.filter.as_deref(),
        args.sort.as_deref(),
        args.dir.as_deref(),
    )?;
    let settings = super::load_settings(cli)?;
    let dashboard = super::open_dashboard(&settings)?;
    let list = dashboard.issues(&query).await?;

    if json {
        super::print_json(&list)
    } else {
        print_table(&list);
        Ok(())
    }
}

pub(crate) fn print_table(list: &IssueList) {
    if list.issues.is_empty() {
        println!("No issues.");
        return;
    }
    let width = list
        .issues
        .iter()
        .map(|i| i.issue.overlay_key().len())
        .max()
        .unwrap_or(0);
    for issue in &list.issues {
        println!("{}", format_row(issue, width));
    }
    println!();
    println!("{} issue(s)", list.issues.len());
}

fn format_row(issue: &MergedIssue, width: usize) -> String {
    let rank = issue
        .personal_priority
        .map_or_else(|| "  -".to_string(), |r| format!("{r:>3}"));
    let done = if issue.issue.is_completed { "x" } else { " " };
    let mut row = format!(
        "{rank} [{done}] {:<width$}  {:<12}  {}",
        issue.issue.overlay_key(),
        issue.issue.linear_status,
        issue.issue.title,
    );
    if !issue.personal_status.is_none() {
        row.push_str(&format!("  ({})", issue.personal_status));
    }
    if !issue.notes.is_empty() {
        let first_line = issue.notes.lines().next().unwrap_or_default();
        row.push_str(&format!("  # {first_line}"));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IssueSnapshot, PersonalStatus};

    #[test]
    fn row_shows_rank_status_and_first_note_line() {
        let issue = MergedIssue {
            issue: IssueSnapshot {
                identifier: "LIN-7".to_string(),
                title: "Ship it".to_string(),
                linear_status: "Todo".to_string(),
                ..Default::default()
            },
            personal_priority: Some(2),
            personal_status: PersonalStatus::Blocked,
            notes: "waiting on infra\nsecond line".to_string(),
            last_updated: None,
        };
        let row = format_row(&issue, 5);
        assert!(row.starts_with("  2 [ ] LIN-7"));
        assert!(row.contains("(Blocked)"));
        assert!(row.ends_with("# waiting on infra"));
    }
}
