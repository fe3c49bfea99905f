use crate::cli::ColumnsArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::model::ColumnPrefs;

/// Execute the columns command: show, replace, or reset visible columns.
///
/// # Errors
///
/// Returns a validation error for an unknown or duplicate column, or an I/O
/// error if the save fails.
pub fn execute(args: &ColumnsArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let settings = super::load_settings(cli)?;
    let store = super::open_store(&settings);

    let prefs = if args.reset {
        store.set_columns(ColumnPrefs::default())?
    } else if let Some(names) = &args.set {
        store.set_columns(ColumnPrefs::parse(names)?)?
    } else {
        store.columns()
    };

    if json {
        super::print_json(&prefs)
    } else {
        for column in &prefs.visible {
            println!("{column}");
        }
        Ok(())
    }
}
