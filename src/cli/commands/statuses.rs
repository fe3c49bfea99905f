use crate::error::Result;
use crate::view::personal_status_options;

/// Execute the statuses command.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let options = personal_status_options();
    if json {
        return super::print_json(&options);
    }
    for option in options {
        if option.is_empty() {
            println!("(none)");
        } else {
            println!("{option}");
        }
    }
    Ok(())
}
