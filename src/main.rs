use chrono::NaiveDateTime;
use clap::Parser;
use mail2workitem::configuration::{
    reference_now,
    start_of_day,
    Configuration,
    InstanceConfiguration,
    MailboxServiceType,
};
use miette::{miette, Context, Result};
use tracing::{error, info, warn};

use crate::{
    cli::{parse_str_as_date, CLIArgs},
    logging::initialize_tracing,
};

mod cli;
mod logging;


/// Prints a summary of a single instance, with date-based overrides
/// resolved as of `reference`.
fn print_instance_report(instance: &InstanceConfiguration, reference: NaiveDateTime) {
    let server = &instance.tfs_server;
    let email = &instance.email;

    println!("Instance \"{}\"", instance.name);
    println!(
        "  Server:     {} (project {}, work item type {})",
        server.collection_uri, server.project, server.work_item_template
    );
    println!(
        "  Mode:       {}",
        if server.allows_writes() {
            "live"
        } else {
            "simulation (no work items are saved)"
        }
    );
    println!(
        "  Strategy:   {:?}",
        instance.work_items.processing_strategy
    );

    match email.service_type {
        MailboxServiceType::Ews => println!(
            "  Mailbox:    EWS, incoming folder {}",
            email.incoming_folder.as_deref().unwrap_or("<not set>")
        ),
        MailboxServiceType::EwsByRecipients => println!(
            "  Mailbox:    EWSByRecipients, recipients [{}]",
            email.recipient_display_name_list().join(", ")
        ),
    }


    if !instance.work_items.date_based_overrides.is_empty() {
        println!("  Date-based overrides as of {}:", reference);

        for overrides in &instance.work_items.date_based_overrides {
            println!(
                "    {} = {}",
                overrides.field_name,
                overrides.effective_value(reference)
            );
        }
    }
}


/// Reads every configured file-backed field of `instance` and returns
/// the number of fields that could not be read.
fn check_instance_files(instance: &InstanceConfiguration) -> usize {
    let mut failures = 0;

    for field in instance.deferred_fields() {
        if !field.is_configured() {
            continue;
        }

        match field.resolve() {
            Ok(contents) => info!(
                field = field.field_name(),
                bytes = contents.len(),
                "File-backed field is readable."
            ),
            Err(resolve_error) => {
                error!(
                    field = field.field_name(),
                    "{}",
                    resolve_error
                );
                failures += 1;
            }
        }
    }

    failures
}


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    let logging_raii_guard = initialize_tracing(
        cli_args.log_level.as_deref(),
        cli_args.log_file_directory.as_deref(),
        "mail2workitem.log",
    )
    .wrap_err("Failed to initialize tracing.")?;

    info!("Tracing initialized.");


    // Load configuration.
    let configuration = match cli_args.configuration_file_path.as_ref() {
        Some(path) => {
            info!("Loading configuration: {}", path.display());
            Configuration::load_from_path(path)
        }
        None => {
            info!("Loading configuration at default path.");
            Configuration::load_from_default_path()
        }
    }
    .wrap_err("Failed to load configuration file.")?;

    info!(
        instances = configuration.instances.len(),
        "Configuration loaded."
    );


    let reference = match cli_args.reference_date.as_deref() {
        Some(date) => start_of_day(parse_str_as_date(date)?),
        None => reference_now(),
    };

    let instances: Vec<&InstanceConfiguration> = match cli_args.instance.as_deref() {
        Some(name) => vec![configuration
            .instance(name)
            .ok_or_else(|| miette!("No instance named \"{}\" is configured.", name))?],
        None => configuration.instances.iter().collect(),
    };

    if instances.is_empty() {
        warn!("Nothing to report.");
    }

    for instance in &instances {
        print_instance_report(instance, reference);
    }


    if cli_args.check_files {
        let failures: usize = instances
            .iter()
            .map(|instance| check_instance_files(instance))
            .sum();

        if failures > 0 {
            return Err(miette!(
                "{} file-backed field(s) could not be read.",
                failures
            ));
        }

        info!("All configured files are readable.");
    }


    drop(logging_raii_guard);
    Ok(())
}
