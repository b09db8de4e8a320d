//! status command - Query an asynchronous operation

use clap::Args;
use yd_core::{OperationState, OperationStatus};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};
use crate::poll::wait_for_operation;

use super::{Connection, field_refs, report};

/// Query an asynchronous operation
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Operation id (as returned with an upload link)
    pub operation_id: String,

    /// Only request these fields (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Keep querying until the operation succeeds or fails
    #[arg(long)]
    pub wait: bool,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, connection: &Connection, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let (client, profile) = match connection.connect() {
        Ok(connected) => connected,
        Err(e) => return report(&formatter, "Failed to create client", &e),
    };
    let fields = field_refs(&args.fields);

    let outcome = if args.wait {
        let spinner = ProgressBar::spinner(&output_config, &format!("Waiting for {}", args.operation_id));
        let outcome = wait_for_operation(
            &client,
            &args.operation_id,
            &fields,
            &profile.poll_config(),
            |attempt, status| spinner.set_message(&format!("{} (check {attempt})", status.status)),
        )
        .await;
        spinner.finish_and_clear();
        outcome
    } else {
        client.get_operation_status(&args.operation_id, &fields).await
    };

    let status = match outcome {
        Ok(status) => status,
        Err(e) => return report(&formatter, "Failed to get operation status", &e),
    };

    if formatter.is_json() {
        formatter.json(&status);
    } else {
        formatter.println(&describe(&args.operation_id, &status));
    }

    if args.wait && status.status == OperationState::Failed {
        ExitCode::OperationFailed
    } else {
        ExitCode::Success
    }
}

fn describe(operation_id: &str, status: &OperationStatus) -> String {
    let mut line = format!("Operation {operation_id}: {}", status.status);
    for (key, value) in &status.raw {
        line.push_str(&format!("\n  {key}: {value}"));
    }
    line
}
