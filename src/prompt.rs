// src/prompt.rs

use crate::controller::{InvoiceFormController, NewEntries, SubmissionStatus};
use crate::download::FileSink;
use crate::form::{ADD_NEW, Field};
use crate::webhook::Webhook;
use chrono::Local;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use tracing::info;

/// Run the form interactively until the user stops. `after_success` sees the
/// custom entries of every invoice that was generated.
pub async fn run<W, S>(
    controller: &mut InvoiceFormController<W, S>,
    mut after_success: impl FnMut(&NewEntries),
) -> Result<(), Box<dyn std::error::Error>>
where
    W: Webhook,
    S: FileSink,
{
    let theme = ColorfulTheme::default();

    loop {
        // custom-text fields are asked right after their selector lands on "Add New"
        let fresh = Field::ALL.into_iter().filter(|f| {
            !matches!(f, Field::CustomCompanyName | Field::CustomItemDescription)
        });
        for field in fresh {
            ask(controller, &theme, field)?;
        }

        while !controller.submit().await {
            eprintln!("Please fix the following:");
            for field in controller.errors().fields() {
                if let Some(message) = controller.errors().get(field) {
                    eprintln!("  {}: {message}", field.label());
                }
                ask(controller, &theme, field)?;
            }
        }

        println!("{}", controller.status());
        if matches!(controller.status(), SubmissionStatus::Success { .. }) {
            after_success(controller.last_new_entries());
        }
        controller.dismiss();

        let again = Confirm::with_theme(&theme)
            .with_prompt("Generate another invoice?")
            .default(true)
            .interact()?;
        if !again {
            info!("Interactive session finished");
            return Ok(());
        }
    }
}

fn ask<W, S>(
    controller: &mut InvoiceFormController<W, S>,
    theme: &ColorfulTheme,
    field: Field,
) -> Result<(), dialoguer::Error>
where
    W: Webhook,
    S: FileSink,
{
    let rules = controller.form().rules();
    let current = controller.form().fields().get(field).to_string();

    let answer = match field {
        Field::CompanyName => select(theme, field, &rules.catalog.companies, true, &current)?,
        Field::ItemDescription => select(theme, field, &rules.catalog.items, true, &current)?,
        Field::BillType => select(theme, field, &rules.catalog.bill_types, false, &current)?,
        Field::BillDate => {
            let initial = if current.is_empty() {
                Local::now().date_naive().format("%Y-%m-%d").to_string()
            } else {
                current
            };
            text(theme, field, &initial)?
        }
        _ => text(theme, field, &current)?,
    };
    controller.set_field(field, &answer);

    let custom = match field {
        Field::CompanyName => Some(Field::CustomCompanyName),
        Field::ItemDescription => Some(Field::CustomItemDescription),
        _ => None,
    };
    if let Some(custom) = custom.filter(|_| answer == ADD_NEW) {
        ask(controller, theme, custom)?;
    }
    Ok(())
}

fn select(
    theme: &ColorfulTheme,
    field: Field,
    options: &[String],
    allow_add_new: bool,
    current: &str,
) -> Result<String, dialoguer::Error> {
    let mut items: Vec<&str> = options.iter().map(String::as_str).collect();
    if allow_add_new {
        items.push(ADD_NEW);
    }
    let default = items.iter().position(|i| *i == current).unwrap_or(0);

    let picked = Select::with_theme(theme)
        .with_prompt(field.label())
        .items(&items)
        .default(default)
        .interact()?;
    Ok(items[picked].to_string())
}

fn text(theme: &ColorfulTheme, field: Field, initial: &str) -> Result<String, dialoguer::Error> {
    Input::<String>::with_theme(theme)
        .with_prompt(field.label())
        .with_initial_text(initial)
        .allow_empty(true)
        .interact_text()
}
