//! DynamoDB infrastructure management commands.

mod client;
mod config;
mod deploy;
mod error;
mod planning;

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;

/// DynamoDB infrastructure management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Deploy or destroy DynamoDB table infrastructure.
    Deploy(DeployCommand),
}

/// Deploy or update DynamoDB infrastructure.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Deploy or destroy DynamoDB table infrastructure.

By default, this command creates or updates the single table shared by every
registered entity: the pk/sk primary key plus as many generic Global Secondary
Indexes (gsi1..gsiN) as the most indexed entity needs.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials
  DYNAMODB_TABLE_NAME - Table name (overridden by --table-name)")]
pub struct DeployCommand {
    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,

    /// Destroy the table instead of creating/updating.
    #[arg(long)]
    pub destroy: bool,

    /// Table name to use.
    #[arg(long, env = "DYNAMODB_TABLE_NAME", default_value = "tablekit")]
    pub table_name: String,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
    }
}

/// Prints `lines` under `title`, coloring each by its leading change marker.
fn print_plan(global: &crate::Global, title: &str, lines: &[String]) {
    if global.is_silent() {
        return;
    }
    aprintln!("{}", p_c(title));
    for line in lines {
        let painted = match line.chars().next() {
            Some('+') => p_g(line),
            Some('-') => p_r(line),
            Some('~') => p_y(line),
            _ => line.clone(),
        };
        aprintln!("  {painted}");
    }
    aprintln!();
}

fn say(global: &crate::Global, message: String) {
    if !global.is_silent() {
        aprintln!("{message}");
    }
}

/// Asks before applying, unless `--force` was given.
fn confirm(cmd: &DeployCommand, prompt: &str, default: bool) -> Result<()> {
    if cmd.force {
        return Ok(());
    }
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let aws_config = client::AwsConfig::default();
    say(global, format!("{} {}\n", p_b("Target:"), aws_config.target_display()));

    let dynamo_client = client::create_client(&aws_config).await?;
    let current_state = client::get_table_state(&dynamo_client, &cmd.table_name).await?;

    if cmd.destroy {
        destroy(&cmd, global, &dynamo_client, current_state.as_ref()).await
    } else {
        deploy(&cmd, global, &dynamo_client, current_state.as_ref()).await
    }
}

async fn deploy(
    cmd: &DeployCommand,
    global: &crate::Global,
    dynamo_client: &aws_sdk_dynamodb::Client,
    current_state: Option<&planning::TableState>,
) -> Result<()> {
    let schemas = tablekit::entities::schemas()?;
    let table_config = config::table_config(&cmd.table_name, &schemas);
    tracing::debug!(
        table = %cmd.table_name,
        entities = schemas.len(),
        gsis = table_config.gsis.len(),
        "Computed table layout"
    );

    let plan = planning::calculate_deploy_plan(current_state, &table_config);
    print_plan(global, "Deploy Plan:", &planning::format_deploy_plan(&plan));

    match &plan {
        planning::DeployPlan::Incompatible { table_name, reason } => {
            return Err(DynamodbError::IncompatibleTable {
                table_name: table_name.clone(),
                reason: reason.clone(),
            });
        }
        planning::DeployPlan::NoChanges { .. } => {
            say(global, p_g("Infrastructure is up to date."));
            return Ok(());
        }
        _ => {}
    }

    confirm(cmd, "Apply these changes?", true)?;
    say(global, p_b("Applying changes..."));
    deploy::execute_deploy_plan(dynamo_client, &plan).await?;
    say(global, p_g("Infrastructure deployed successfully."));
    Ok(())
}

async fn destroy(
    cmd: &DeployCommand,
    global: &crate::Global,
    dynamo_client: &aws_sdk_dynamodb::Client,
    current_state: Option<&planning::TableState>,
) -> Result<()> {
    let plan = planning::calculate_destroy_plan(current_state, &cmd.table_name);
    print_plan(global, "Destroy Plan:", &planning::format_destroy_plan(&plan));

    if matches!(plan, planning::DestroyPlan::AlreadyGone { .. }) {
        say(global, p_g("Nothing to destroy."));
        return Ok(());
    }

    confirm(
        cmd,
        "Are you sure you want to delete this table? ALL DATA WILL BE LOST",
        false,
    )?;
    say(global, p_b("Deleting table..."));
    deploy::execute_destroy_plan(dynamo_client, &plan).await?;
    say(global, p_g("Table destroyed successfully."));
    Ok(())
}
