//! disk command - Show disk quota and owner

use clap::Args;
use yd_core::Disk;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, format_size};

use super::{Connection, field_refs, report};

/// Show disk quota and owner
#[derive(Args, Debug)]
pub struct DiskArgs {
    /// Only request these fields (comma separated, e.g. "total_space,used_space")
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
}

/// Execute the disk command
pub async fn execute(args: DiskArgs, connection: &Connection, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (client, _profile) = match connection.connect() {
        Ok(connected) => connected,
        Err(e) => return report(&formatter, "Failed to create client", &e),
    };

    match client.get_disk(&field_refs(&args.fields)).await {
        Ok(disk) => {
            if formatter.is_json() {
                formatter.json(&disk);
            } else {
                formatter.table(&["Property", "Value"], disk_rows(&disk));
            }
            ExitCode::Success
        }
        Err(e) => report(&formatter, "Failed to get disk info", &e),
    }
}

fn disk_rows(disk: &Disk) -> Vec<Vec<String>> {
    let mut rows = vec![
        vec!["Total".to_string(), format_size(disk.total_space)],
        vec!["Used".to_string(), format_size(disk.used_space)],
        vec!["Free".to_string(), format_size(disk.free_space())],
        vec!["Trash".to_string(), format_size(disk.trash_size)],
        vec!["Max file size".to_string(), format_size(disk.max_file_size)],
        vec!["Paid".to_string(), disk.is_paid.to_string()],
    ];
    if let Some(user) = &disk.user {
        let owner = if user.display_name.is_empty() {
            user.login.clone()
        } else {
            format!("{} ({})", user.display_name, user.login)
        };
        rows.push(vec!["Owner".to_string(), owner]);
    }
    rows
}
