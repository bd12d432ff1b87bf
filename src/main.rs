mod catalog;
mod config;
mod controller;
mod download;
mod filename;
mod form;
mod prompt;
mod webhook;

use clap::{Args, Parser, Subcommand};
use config::{CatalogList, Config};
use controller::{InvoiceFormController, NewEntries, SubmissionStatus};
use download::DirectorySink;
use form::{ADD_NEW, Field};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webhook::HttpWebhook;

/// Send invoice details to the invoice webhook and save the generated spreadsheet.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    #[arg(long, default_value = ".config/invoice_submit.toml")]
    config: PathBuf,
    /// Overrides `webhook_url` from the config file and environment.
    #[arg(long)]
    webhook_url: Option<String>,
    /// Directory the generated invoice is written to.
    #[arg(long)]
    output_dir: Option<String>,
    /// Add newly entered companies and items to the catalog in the config file.
    #[arg(long)]
    remember: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one invoice from command-line values.
    Submit(SubmitArgs),
    /// Fill in the form through prompts.
    Interactive,
    /// Print the configured companies, bill types and items.
    Catalog,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    #[arg(long, conflicts_with = "new_company")]
    company: Option<String>,
    /// A company that is not in the catalog yet.
    #[arg(long)]
    new_company: Option<String>,
    #[arg(long)]
    bill_number: Option<String>,
    #[arg(long)]
    bill_type: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    bill_date: Option<String>,
    #[arg(long)]
    consignment_number: Option<String>,
    #[arg(long, conflicts_with = "new_item")]
    item: Option<String>,
    /// An item description that is not in the catalog yet.
    #[arg(long)]
    new_item: Option<String>,
    #[arg(long)]
    quantity: Option<String>,
    #[arg(long)]
    bundles: Option<String>,
    #[arg(long)]
    rate: Option<String>,
}

impl SubmitArgs {
    /// Form inputs in the order a user would fill them in.
    fn inputs(&self) -> Vec<(Field, &str)> {
        let company = match self.new_company {
            Some(_) => Some(ADD_NEW),
            None => self.company.as_deref(),
        };
        let item = match self.new_item {
            Some(_) => Some(ADD_NEW),
            None => self.item.as_deref(),
        };

        [
            (Field::CompanyName, company),
            (Field::CustomCompanyName, self.new_company.as_deref()),
            (Field::BillNumber, self.bill_number.as_deref()),
            (Field::BillType, self.bill_type.as_deref()),
            (Field::BillDate, self.bill_date.as_deref()),
            (Field::ConsignmentNumber, self.consignment_number.as_deref()),
            (Field::ItemDescription, item),
            (Field::CustomItemDescription, self.new_item.as_deref()),
            (Field::Quantity, self.quantity.as_deref()),
            (Field::Bundles, self.bundles.as_deref()),
            (Field::Rate, self.rate.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut cfg = Config::load_or_default(&cli.config)?;
    cfg.apply_env();
    cfg.apply_overrides(cli.webhook_url.clone(), cli.output_dir.clone());

    info!(
        config = %cli.config.display(),
        webhook = %cfg.webhook_url,
        output_dir = %cfg.output_dir,
        "Configuration loaded"
    );

    let remember_path = cli.remember.then_some(cli.config.as_path());
    let mut controller = InvoiceFormController::new(
        cfg.form_rules(),
        HttpWebhook::new(cfg.webhook_url.clone()),
        DirectorySink::new(&cfg.output_dir),
    );

    if !matches!(cli.command, Command::Catalog) {
        show_progress(controller.subscribe());
    }

    match cli.command {
        Command::Catalog => {
            print_list("Companies", &cfg.catalog.companies);
            print_list("Bill types", &cfg.catalog.bill_types);
            print_list("Items", &cfg.catalog.items);
            Ok(ExitCode::SUCCESS)
        }
        Command::Submit(args) => {
            hint_unknown_entries(&cfg, &args);
            for (field, value) in args.inputs() {
                controller.set_field(field, value);
            }

            if !controller.submit().await {
                for (field, message) in controller.errors().iter() {
                    eprintln!("{field}: {message}");
                }
                return Ok(ExitCode::FAILURE);
            }

            println!("{}", controller.status());
            match controller.status() {
                SubmissionStatus::Success { .. } => {
                    if let Some(path) = remember_path {
                        remember_entries(path, controller.last_new_entries());
                    }
                    Ok(ExitCode::SUCCESS)
                }
                _ => Ok(ExitCode::FAILURE),
            }
        }
        Command::Interactive => {
            prompt::run(&mut controller, |entries| {
                if let Some(path) = remember_path {
                    remember_entries(path, entries);
                }
            })
            .await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print the in-flight line while a submission waits on the webhook. The final
/// status is printed by the caller once `submit` returns.
fn show_progress(mut status_rx: watch::Receiver<SubmissionStatus>) {
    tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            if matches!(status, SubmissionStatus::Loading) {
                println!("{status}");
            }
        }
    });
}

fn remember_entries(path: &Path, entries: &NewEntries) {
    let pending = [
        (CatalogList::Companies, &entries.company),
        (CatalogList::Items, &entries.item),
    ];
    for (list, entry) in pending {
        let Some(entry) = entry else { continue };
        match Config::remember(path, list, entry) {
            Ok(true) => info!(?list, entry = %entry, "Added to catalog"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Could not update catalog"),
        }
    }
}

fn hint_unknown_entries(cfg: &Config, args: &SubmitArgs) {
    if let Some(company) = args.company.as_deref().filter(|c| !cfg.catalog.has_company(c)) {
        info!(company = %company, "Company is not in the catalog; --new-company with --remember adds it");
    }
    if let Some(item) = args.item.as_deref().filter(|i| !cfg.catalog.has_item(i)) {
        info!(item = %item, "Item is not in the catalog; --new-item with --remember adds it");
    }
}

fn print_list(title: &str, values: &[String]) {
    println!("{title}:");
    if values.is_empty() {
        println!("  (none)");
    }
    for v in values {
        println!("  {v}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> SubmitArgs {
        let mut argv = vec!["invoice_submit", "submit"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).expect("parse").command {
            Command::Submit(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn new_company_selects_add_new_first() {
        let args = parse(&["--new-company", "Brand New Traders", "--item", "M.S. Pipe"]);
        let inputs = args.inputs();
        assert_eq!(
            &inputs[..2],
            &[
                (Field::CompanyName, ADD_NEW),
                (Field::CustomCompanyName, "Brand New Traders"),
            ]
        );
        assert!(inputs.contains(&(Field::ItemDescription, "M.S. Pipe")));
    }

    #[test]
    fn company_and_new_company_conflict() {
        let argv = [
            "invoice_submit",
            "submit",
            "--company",
            "Acme",
            "--new-company",
            "Other",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn inputs_fill_a_valid_form() {
        let args = parse(&[
            "--company",
            "Acme & Co",
            "--bill-number",
            "2025-26/007",
            "--bill-type",
            "Quote",
            "--bill-date",
            "2025-07-01",
            "--consignment-number",
            "CN-1",
            "--new-item",
            "Copper Rod",
            "--quantity",
            "5",
            "--bundles",
            "1",
            "--rate",
            "10",
        ]);
        let mut form = form::FormState::new(Config::default().form_rules());
        for (field, value) in args.inputs() {
            form.set(field, value);
        }
        assert!(form.validate());
        let payload = form.fields().resolve().expect("payload");
        assert_eq!(payload.item_description, "Copper Rod");
    }
}
