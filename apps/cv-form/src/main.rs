mod api_client;
mod auth;
mod config;
mod errors;
mod form;
mod page;
mod summary;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::CvApiClient;
use crate::auth::{FileTokenStore, MemoryTokenStore, TokenStore};
use crate::config::Config;
use crate::errors::PageError;
use crate::form::encode::{Attachment, FileSlot};
use crate::form::model::{Role, READ_ONLY_FIELDS, TOP_LEVEL_FIELDS};
use crate::form::normalize::reference_label;
use crate::page::{CvPage, Navigation, PageMode};

/// cv-form - view and edit CV records against the CV backend
#[derive(Parser, Debug)]
#[command(name = "cv-form")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a CV read-only and print it
    View {
        cv_id: String,

        /// Print the reconciled record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a CV, apply edits, validate and submit
    Edit {
        cv_id: String,

        /// Field edit, e.g. `fullName=Jane` or `roleData.dataEntry.english=A`
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Applicant track: dataEntry or internship
        #[arg(long)]
        role: Option<String>,

        /// File upload, e.g. `updatedCv=./cv.pdf`
        #[arg(long = "attach", value_name = "SLOT=PATH")]
        attach: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("cv-form v{} against {}", env!("CARGO_PKG_VERSION"), config.base_url);

    let tokens: Arc<dyn TokenStore> = match &config.token {
        Some(token) => Arc::new(MemoryTokenStore::new(Some(token.clone()))),
        None => Arc::new(FileTokenStore::new(config.token_file.clone())),
    };
    let api = CvApiClient::new(config.base_url.clone(), config.http_timeout, tokens);

    match cli.command {
        Command::View { cv_id, json } => view(&api, cv_id, json).await,
        Command::Edit {
            cv_id,
            set,
            role,
            attach,
        } => edit(&api, cv_id, &set, role.as_deref(), &attach).await,
    }
}

async fn view(api: &CvApiClient, cv_id: String, json: bool) -> Result<()> {
    let mut page = CvPage::new(cv_id, PageMode::View);
    load_or_bail(&mut page, api).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page.model().to_value())?);
        return Ok(());
    }

    let summary = page.summary();
    println!("CV Details: {}", summary.display_name);
    if let Some(ref_no) = &summary.ref_no {
        println!("Reference: {ref_no}");
    }
    if let Some(badge) = &summary.status {
        println!("Status: {} [{:?}]", badge.label, badge.tone);
    }
    println!();
    for field in TOP_LEVEL_FIELDS {
        println!("  {field}: {}", page.model().text(field).unwrap_or_default());
    }
    println!("  selectedRole: {}", page.model().selected_role());
    if let Some(role) = Role::parse(page.model().selected_role()) {
        for (leaf, value) in page.model().role_data.get(role) {
            println!("  roleData.{role}.{leaf}: {}", value.as_str().unwrap_or_default());
        }
    }
    for field in READ_ONLY_FIELDS {
        if let Some(value) = page.model().text(field) {
            println!("  {field}: {value}");
        }
    }
    if let Some(date) = &summary.application_date {
        println!("Application Date: {date}");
    }
    if let Some(date) = &summary.last_updated {
        println!("Last Updated: {date}");
    }
    let districts: Vec<String> = page.districts().iter().map(reference_label).collect();
    let institutes: Vec<String> = page.institutes().iter().map(reference_label).collect();
    println!("Known districts: {}", districts.join(", "));
    println!("Known institutes: {}", institutes.join(", "));
    Ok(())
}

async fn edit(
    api: &CvApiClient,
    cv_id: String,
    set: &[String],
    role: Option<&str>,
    attach: &[String],
) -> Result<()> {
    let mut page = CvPage::new(cv_id, PageMode::Edit);
    load_or_bail(&mut page, api).await?;

    for assignment in set {
        let (name, value) = split_pair(assignment)?;
        page.apply_change(name, value);
    }
    if let Some(role) = role {
        page.select_role(role);
    }
    for upload in attach {
        let (slot, path) = split_pair(upload)?;
        let slot = FileSlot::parse(slot).ok_or_else(|| anyhow!("Unknown upload slot '{slot}'"))?;
        let path = PathBuf::from(path);
        let attachment = Attachment::from_path(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        page.attach_file(slot, attachment);
    }

    let result = page.submit(api).await;
    print_notices(&mut page);
    match result {
        Ok(()) => {
            if let Some(Navigation::Back { delay }) = page.navigation() {
                info!("Returning to previous page in {}s", delay.as_secs());
            }
            Ok(())
        }
        Err(PageError::ValidationFailed(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
            bail!("CV has {} validation error(s)", errors.len())
        }
        Err(e) => Err(e).context("Failed to update CV"),
    }
}

async fn load_or_bail(page: &mut CvPage, api: &CvApiClient) -> Result<()> {
    let result = page.load(api).await;
    print_notices(page);
    if let Err(e) = result {
        let message = page.error_message().unwrap_or_else(|| e.to_string());
        if page.navigation() == Some(Navigation::Login) {
            bail!("{message} Log in and store a token first.");
        }
        bail!("{message}");
    }
    Ok(())
}

fn print_notices(page: &mut CvPage) {
    for notice in page.take_notices() {
        println!("[{:?}] {}", notice.level, notice.message);
    }
}

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=VALUE, got '{raw}'"))
}
