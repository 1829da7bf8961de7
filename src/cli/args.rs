use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Organize remote hosts and launch services against them.
///
/// Without a subcommand the terminal UI is started.
#[derive(Parser, Debug)]
#[command(name = "accessr", version, about, long_about = None)]
pub struct Cli {
    /// Configuration directory (default: the user config dir)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log more to stderr (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the service registry
    Service {
        #[command(subcommand)]
        action: ServiceAction,
    },
    /// Manage host groups
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
    /// Manage hosts
    Host {
        #[command(subcommand)]
        action: HostAction,
    },
    /// Manage the destinations of a host
    Destination {
        #[command(subcommand)]
        action: DestinationAction,
    },
    /// Attach a service to a destination
    Associate {
        #[command(flatten)]
        target: AssociationRef,
        /// Argument for the command template, as key=value
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        arguments: Vec<(String, String)>,
    },
    /// Detach a service from a destination
    Dissociate {
        #[command(flatten)]
        target: AssociationRef,
        /// Only remove the association with exactly these arguments
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        arguments: Vec<(String, String)>,
    },
    /// Print the command a launch would run
    Resolve {
        #[command(flatten)]
        target: AssociationRef,
        /// Extra or overriding argument, as key=value
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        arguments: Vec<(String, String)>,
    },
    /// Launch a service and wait for it to finish
    Launch {
        #[command(flatten)]
        target: AssociationRef,
        /// Extra or overriding argument, as key=value
        #[arg(long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        arguments: Vec<(String, String)>,
    },
    /// List the destination types
    Types,
}

#[derive(Subcommand, Debug)]
pub enum ServiceAction {
    List,
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Command template, e.g. "ssh {address}"
        #[arg(short, long)]
        command: String,
        /// Run in the terminal, inheriting stdin/stdout
        #[arg(short, long)]
        terminal: bool,
        #[arg(short, long, default_value = "")]
        icon: String,
    },
    Edit {
        name: String,
        /// New name; associations follow the rename
        #[arg(long = "name", value_name = "NEW_NAME")]
        new_name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        command: Option<String>,
        #[arg(short, long)]
        terminal: Option<bool>,
        #[arg(short, long)]
        icon: Option<String>,
    },
    Remove {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupAction {
    List,
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    Edit {
        name: String,
        #[arg(short, long)]
        description: String,
    },
    Remove {
        name: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum HostAction {
    List {
        /// Only list this group ("" is the default group)
        #[arg(short, long)]
        group: Option<String>,
    },
    Show {
        #[arg(short, long, default_value = "")]
        group: String,
        name: String,
    },
    Add {
        #[arg(short, long, default_value = "")]
        group: String,
        name: String,
        /// Defaults to the host name
        #[arg(short, long)]
        description: Option<String>,
    },
    Remove {
        #[arg(short, long, default_value = "")]
        group: String,
        name: String,
    },
    Rename {
        #[arg(short, long, default_value = "")]
        group: String,
        name: String,
        new_name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum DestinationAction {
    Add {
        #[command(flatten)]
        host: HostRef,
        name: String,
        value: String,
        /// ipv4, ipv6, mac, filename or custom
        #[arg(short = 't', long = "type", default_value = "ipv4")]
        kind: String,
    },
    Edit {
        #[command(flatten)]
        host: HostRef,
        name: String,
        #[arg(long = "name", value_name = "NEW_NAME")]
        new_name: Option<String>,
        #[arg(long)]
        value: Option<String>,
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
    Remove {
        #[command(flatten)]
        host: HostRef,
        name: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct HostRef {
    /// Group of the host ("" is the default group)
    #[arg(short, long, default_value = "")]
    pub group: String,
    #[arg(long)]
    pub host: String,
}

#[derive(Args, Debug, Clone)]
pub struct AssociationRef {
    #[command(flatten)]
    pub host: HostRef,
    #[arg(long)]
    pub destination: String,
    #[arg(long)]
    pub service: String,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn key_value_arguments() {
        assert_eq!(
            parse_key_value("path=/a=b").unwrap(),
            ("path".to_string(), "/a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn associate_collects_repeated_arguments() {
        let cli = Cli::parse_from([
            "accessr",
            "associate",
            "--host",
            "web",
            "--destination",
            "lan",
            "--service",
            "http",
            "--arg",
            "path=/index",
            "--arg",
            "port=8080",
        ]);
        match cli.command {
            Some(Commands::Associate { target, arguments }) => {
                assert_eq!(target.host.group, "");
                assert_eq!(arguments.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
