//! Reviewlens CLI entrypoint for annotating a pull request list view, once
//! or, with `--watch`, across navigations read from standard input.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use reviewlens::github::PullRequestNumber;
use reviewlens::page::NodeId;
use reviewlens::page::list_view;
use reviewlens::settings::{self, InstallReason};
use reviewlens::{
    AppError, CredentialProvider, Extension, ExtensionHandle, JsonFileSettingsStore,
    OctocrabReviewerGateway, Page, RepoContext, ReviewLensConfig,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = load_config()?;
    let store = Arc::new(JsonFileSettingsStore::new(config.settings_path()));

    let reason = if store.exists().await {
        InstallReason::Update
    } else {
        InstallReason::Install
    };
    if config.wants_token_hint(reason) {
        write_line(
            &mut io::stderr().lock(),
            &format!(
                "No token configured yet; run with --save-token <TOKEN> to store one in {}",
                store.path().display()
            ),
        )?;
    }

    if let Some(raw) = config.save_token.as_deref() {
        let masked = settings::save_token(store.as_ref(), raw).await?;
        return write_line(&mut io::stdout().lock(), &format!("Token saved: {masked}"));
    }

    if config.show_token {
        let message = settings::load_masked_token(store.as_ref())
            .await?
            .map_or_else(
                || "No token stored".to_owned(),
                |masked| format!("Stored token: {masked}"),
            );
        return write_line(&mut io::stdout().lock(), &message);
    }

    annotate_list_view(&config, CredentialProvider::new(store)).await
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`AppError::Load`] when ortho-config fails to parse arguments or
/// load configuration files.
fn load_config() -> Result<ReviewLensConfig, AppError> {
    ReviewLensConfig::load().map_err(|error| AppError::Load {
        message: error.to_string(),
    })
}

async fn annotate_list_view(
    config: &ReviewLensConfig,
    credentials: CredentialProvider,
) -> Result<(), AppError> {
    let page_url = config.require_page_url()?;
    let options = config.annotator_options()?;
    let numbers = config.parse_pr_numbers()?;
    let timing = if config.watch {
        Some(config.monitor_timing()?)
    } else {
        None
    };
    let context = RepoContext::from_location(page_url, options.host())?;
    let gateway = OctocrabReviewerGateway::for_api_base(&config.api_base)?;

    let page = Page::new(page_url);
    let rows = build_rows(&page, &context, &numbers)?;

    let extension = Extension::new(page.clone(), Arc::new(gateway), credentials, options);
    let Some(timing) = timing else {
        let outcome = extension.initialize();
        tracing::debug!(?outcome, "list view initialised");
        extension.settle().await;
        return write_summary(&page, &rows);
    };

    let handle = extension.start(timing);
    extension.settle().await;
    write_summary(&page, &rows)?;
    let result = follow_locations(&handle, &page, &rows).await;
    handle.shutdown();
    result
}

/// Navigates to each location read from standard input until it closes,
/// printing the rows after every navigation.
async fn follow_locations(
    handle: &ExtensionHandle,
    page: &Page,
    rows: &[(PullRequestNumber, NodeId)],
) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|error| AppError::Io {
        message: error.to_string(),
    })? {
        let location = line.trim();
        if location.is_empty() {
            continue;
        }
        let reinitialised = handle.navigate(location).await;
        tracing::debug!(location, reinitialised, "navigated");
        write_summary(page, rows)?;
    }
    Ok(())
}

fn build_rows(
    page: &Page,
    context: &RepoContext,
    numbers: &[PullRequestNumber],
) -> Result<Vec<(PullRequestNumber, NodeId)>, AppError> {
    let repository = format!(
        "{}/{}",
        context.owner().as_str(),
        context.repository().as_str()
    );
    let raw_numbers: Vec<u64> = numbers.iter().map(|number| number.get()).collect();

    let mut document = page.document();
    let container = list_view::list_container(&mut document)?;
    let rows = list_view::append_rows(&mut document, container, &repository, &raw_numbers)?;
    Ok(numbers.iter().copied().zip(rows).collect())
}

fn write_summary(page: &Page, rows: &[(PullRequestNumber, NodeId)]) -> Result<(), AppError> {
    let document = page.document();
    let mut stdout = io::stdout().lock();
    for (number, row) in rows {
        let text = list_view::indicator_text(&document, *row)
            .unwrap_or_else(|| "(not annotated)".to_owned());
        let line = list_view::indicator_title(&document, *row).map_or_else(
            || format!("#{number} {text}"),
            |title| format!("#{number} {text} ({title})"),
        );
        write_line(&mut stdout, &line)?;
    }
    Ok(())
}

fn write_line(writer: &mut impl Write, line: &str) -> Result<(), AppError> {
    writeln!(writer, "{line}").map_err(|error| AppError::Io {
        message: error.to_string(),
    })
}
