//! Non-interactive subcommands. Every handler works on the same
//! [`Catalog`] the TUI uses, so changes made here show up there on reload.

mod args;

pub use args::{Cli, Commands};

use crate::catalog::{Catalog, Target};
use crate::launcher::Launcher;
use crate::model::{Arguments, DestinationType, Group, HostEditor, Service};
use crate::preferences::Preferences;
use crate::store::Confirm;
use anyhow::{bail, Context, Result};
use args::{AssociationRef, DestinationAction, GroupAction, HostAction, HostRef, ServiceAction};
use std::io::{self, BufRead, Write};

/// Asks on stdin. Anything but "y"/"yes" declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        print!("{}: {} [y/N] ", title, message);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

pub async fn run(command: Commands, catalog: &mut Catalog, preferences: &Preferences) -> Result<()> {
    match command {
        Commands::Service { action } => service(action, catalog),
        Commands::Group { action } => group(action, catalog),
        Commands::Host { action } => host(action, catalog),
        Commands::Destination { action } => destination(action, catalog),
        Commands::Associate { target, arguments } => associate(catalog, &target, arguments),
        Commands::Dissociate { target, arguments } => dissociate(catalog, &target, arguments),
        Commands::Resolve { target, arguments } => {
            println!("{}", resolve(catalog, &target, arguments)?);
            Ok(())
        }
        Commands::Launch { target, arguments } => launch(catalog, preferences, &target, arguments).await,
        Commands::Types => {
            for kind in DestinationType::ALL {
                println!("{:<10} {:<28} e.g. {}", kind.as_str(), kind.description(), kind.placeholder());
            }
            Ok(())
        }
    }
}

fn service(action: ServiceAction, catalog: &mut Catalog) -> Result<()> {
    match action {
        ServiceAction::List => {
            for service in catalog.services().iter() {
                let mode = if service.terminal { "terminal" } else { "detached" };
                println!("{}\t{}\t{}\t{}", service.name, mode, service.command, service.description);
                let required = service.required_arguments();
                if !required.is_empty() {
                    println!("\trequires: {}", required.join(", "));
                }
            }
        }
        ServiceAction::Add {
            name,
            description,
            command,
            terminal,
            icon,
        } => {
            let service = Service::new(name, description, command)
                .with_terminal(terminal)
                .with_icon(icon);
            catalog.add_service(service)?;
        }
        ServiceAction::Edit {
            name,
            new_name,
            description,
            command,
            terminal,
            icon,
        } => {
            let mut service = catalog
                .service(&name)
                .cloned()
                .with_context(|| format!("Unknown service '{}'", name))?;
            if let Some(new_name) = new_name {
                service.name = new_name;
            }
            if let Some(description) = description {
                service.description = description;
            }
            if let Some(command) = command {
                service.command = command;
            }
            if let Some(terminal) = terminal {
                service.terminal = terminal;
            }
            if let Some(icon) = icon {
                service.icon = icon;
            }
            catalog.update_service(&name, service)?;
        }
        ServiceAction::Remove { name } => {
            catalog.remove_service(&name)?;
        }
    }
    Ok(())
}

fn group(action: GroupAction, catalog: &mut Catalog) -> Result<()> {
    match action {
        GroupAction::List => {
            for group in catalog.groups().iter() {
                let hosts = catalog.hosts(&group.name).map(|h| h.len()).unwrap_or(0);
                println!("{}\t{} hosts\t{}", group.display_name(), hosts, group.description);
            }
        }
        GroupAction::Add { name, description } => {
            catalog.add_group(Group::new(name, description))?;
        }
        GroupAction::Edit { name, description } => {
            catalog.set_group_description(&name, &description)?;
        }
        GroupAction::Remove { name, yes } => {
            let removed = if yes {
                let mut always = |_: &str, _: &str| true;
                catalog.remove_group(&name, &mut always)?
            } else {
                catalog.remove_group(&name, &mut StdinConfirm)?
            };
            if !removed {
                println!("Cancelled");
            }
        }
    }
    Ok(())
}

fn host(action: HostAction, catalog: &mut Catalog) -> Result<()> {
    match action {
        HostAction::List { group } => {
            let groups: Vec<String> = match group {
                Some(group) => vec![group],
                None => catalog.groups().names(),
            };
            for group in groups {
                for host in catalog.hosts(&group)?.iter() {
                    let label = if group.is_empty() { "(default)" } else { group.as_str() };
                    println!("{}\t{}\t{}", label, host.name, host.description);
                }
            }
        }
        HostAction::Show { group, name } => {
            let host = catalog.host(&group, &name)?;
            println!("{} - {}", host.name, host.description);
            for destination in host.destinations.values() {
                println!("  {} = {} ({})", destination.name, destination.value, destination.kind);
                for association in &destination.associations {
                    println!(
                        "    {} {}",
                        association.service,
                        crate::model::encode_arguments(&association.arguments)
                    );
                }
            }
        }
        HostAction::Add {
            group,
            name,
            description,
        } => {
            let mut editor = HostEditor::new();
            editor.description = description.unwrap_or_else(|| name.clone());
            editor.name = name;
            catalog.commit_host(&group, &editor)?;
        }
        HostAction::Remove { group, name } => {
            catalog.remove_host(&group, &name)?;
        }
        HostAction::Rename {
            group,
            name,
            new_name,
            description,
        } => {
            let mut editor = catalog.edit_host(&group, &name)?;
            editor.name = new_name;
            if let Some(description) = description {
                editor.description = description;
            }
            catalog.commit_host(&group, &editor)?;
        }
    }
    Ok(())
}

fn destination(action: DestinationAction, catalog: &mut Catalog) -> Result<()> {
    match action {
        DestinationAction::Add { host, name, value, kind } => {
            let kind: DestinationType = kind.parse()?;
            edit_host(catalog, &host, |editor, _| Ok(editor.add_destination(&name, &value, kind)?))
        }
        DestinationAction::Edit {
            host,
            name,
            new_name,
            value,
            kind,
        } => {
            let kind = kind.map(|k| k.parse::<DestinationType>()).transpose()?;
            edit_host(catalog, &host, |editor, _| {
                let current = editor
                    .destinations()
                    .find(|d| d.name == name)
                    .cloned()
                    .with_context(|| format!("Unknown destination '{}'", name))?;
                editor.edit_destination(
                    &name,
                    new_name.as_deref().unwrap_or(&current.name),
                    value.as_deref().unwrap_or(&current.value),
                    kind.unwrap_or(current.kind),
                )?;
                Ok(())
            })
        }
        DestinationAction::Remove { host, name } => edit_host(catalog, &host, |editor, _| {
            editor.remove_destination(&name)?;
            Ok(())
        }),
    }
}

fn associate(catalog: &mut Catalog, target: &AssociationRef, arguments: Vec<(String, String)>) -> Result<()> {
    let arguments: Arguments = arguments.into_iter().collect();
    edit_host(catalog, &target.host, |editor, catalog| {
        editor.add_association(&target.destination, &target.service, arguments, catalog.services())?;
        Ok(())
    })
}

fn dissociate(catalog: &mut Catalog, target: &AssociationRef, arguments: Vec<(String, String)>) -> Result<()> {
    let filter: Option<Arguments> = (!arguments.is_empty()).then(|| arguments.into_iter().collect());
    edit_host(catalog, &target.host, |editor, _| {
        let removed = editor.remove_association(&target.destination, &target.service, filter.as_ref())?;
        if removed == 0 {
            bail!(
                "'{}' is not associated with the destination '{}'",
                target.service,
                target.destination
            );
        }
        Ok(())
    })
}

/// Load a host into an editor, apply `change` and commit the result.
fn edit_host<F>(catalog: &mut Catalog, host: &HostRef, change: F) -> Result<()>
where
    F: FnOnce(&mut HostEditor, &Catalog) -> Result<()>,
{
    let mut editor = catalog.edit_host(&host.group, &host.host)?;
    change(&mut editor, catalog)?;
    catalog.commit_host(&host.group, &editor)?;
    Ok(())
}

/// Association arguments overlaid with the ones given on the command line.
/// Stored arguments of the chosen association, overlaid by `extra`.
/// `extra` also picks the association when the service is attached twice.
fn select_target<'a>(
    catalog: &'a Catalog,
    target: &AssociationRef,
    extra: Vec<(String, String)>,
) -> Result<(Target<'a>, Arguments)> {
    let extra: Arguments = extra.into_iter().collect();
    let found = catalog.target(
        &target.host.group,
        &target.host.host,
        &target.destination,
        &target.service,
        &extra,
    )?;
    let mut arguments = found.arguments.cloned().unwrap_or_default();
    arguments.extend(extra);
    Ok((found, arguments))
}

fn resolve(catalog: &Catalog, target: &AssociationRef, extra: Vec<(String, String)>) -> Result<String> {
    let (found, arguments) = select_target(catalog, target, extra)?;
    Ok(Launcher::resolve(found.destination, found.service, &arguments)?)
}

async fn launch(
    catalog: &Catalog,
    preferences: &Preferences,
    target: &AssociationRef,
    extra: Vec<(String, String)>,
) -> Result<()> {
    let (found, arguments) = select_target(catalog, target, extra)?;

    let mut launcher = Launcher::new(preferences.poll_interval);
    let id = launcher.launch(found.host, found.destination, found.service, &arguments)?;
    let mut ticker = tokio::time::interval(launcher.poll_interval());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if launcher.poll_all().contains(&id) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                launcher.kill(id)?;
                launcher.wait(id)?;
                break;
            }
        }
    }

    if let Some(record) = launcher.record(id) {
        for detail in &record.details {
            eprintln!(
                "[{}] {} {}",
                detail.timestamp.format(crate::model::TIMESTAMP_FORMAT),
                detail.icon.symbol(),
                detail.status
            );
        }
        if record.status() != "Exit code: 0" {
            bail!("{}: {}", record.command, record.status());
        }
    }
    Ok(())
}
