//! userrights - list and reconcile user rights assignments.
//!
//! Exit codes: 0 on success, 1 when the requested change is invalid, 2 on any other failure.

use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use user_rights::{
    list_assignments, reconcile_principal, reconcile_privilege, write_json, write_table, Action,
    PolicyStore, PrincipalChange, PrivilegeChange, UserRightsError,
};

/// List and reconcile user rights assignments
#[derive(Parser, Debug)]
#[command(name = "userrights")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Host whose policy to manage, defaults to the local machine
    #[arg(long, global = true)]
    computer: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every user right assignment
    #[command(alias = "ls")]
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change the user rights held by one principal
    Principal(PrincipalArgs),

    /// Change the principals holding one user right
    Privilege(PrivilegeArgs),
}

#[derive(Args, Debug)]
struct PrincipalArgs {
    /// Account name or SID
    principal: String,

    /// User rights to grant
    #[arg(long, value_delimiter = ',')]
    grant: Vec<String>,

    /// User rights to revoke
    #[arg(long, value_delimiter = ',')]
    revoke: Vec<String>,

    /// Revoke every user right held by the principal
    #[arg(long)]
    revoke_all: bool,

    /// Revoke every user right not being granted
    #[arg(long)]
    revoke_others: bool,

    /// Only report what would change
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct PrivilegeArgs {
    /// User right name, e.g. SeServiceLogonRight
    privilege: String,

    /// Accounts or SIDs to grant the right to
    #[arg(long, value_delimiter = ',')]
    grant: Vec<String>,

    /// Accounts or SIDs to revoke the right from
    #[arg(long, value_delimiter = ',')]
    revoke: Vec<String>,

    /// Revoke the right from every holder
    #[arg(long)]
    revoke_all: bool,

    /// Revoke the right from every holder not being granted
    #[arg(long)]
    revoke_others: bool,

    /// Revoke the right from holders whose SID matches this regular expression
    #[arg(long)]
    revoke_pattern: Option<String>,

    /// Only report what would change
    #[arg(long)]
    dry_run: bool,
}

impl From<PrincipalArgs> for PrincipalChange {
    fn from(args: PrincipalArgs) -> Self {
        PrincipalChange {
            principal: args.principal,
            grant: args.grant,
            revoke: args.revoke,
            revoke_all: args.revoke_all,
            revoke_others: args.revoke_others,
            dry_run: args.dry_run,
        }
    }
}

impl From<PrivilegeArgs> for PrivilegeChange {
    fn from(args: PrivilegeArgs) -> Self {
        PrivilegeChange {
            privilege: args.privilege,
            grant: args.grant,
            revoke: args.revoke,
            revoke_all: args.revoke_all,
            revoke_others: args.revoke_others,
            revoke_pattern: args.revoke_pattern,
            dry_run: args.dry_run,
        }
    }
}

#[cfg(windows)]
fn open_store(host: Option<&str>) -> Result<Box<dyn PolicyStore>, UserRightsError> {
    let mut store = user_rights::LsaStore::new();
    store.connect(host)?;
    Ok(Box::new(store))
}

#[cfg(not(windows))]
fn open_store(_host: Option<&str>) -> Result<Box<dyn PolicyStore>, UserRightsError> {
    Err(UserRightsError::Unsupported)
}

fn print_actions(actions: &[Action], dry_run: bool) {
    if actions.is_empty() {
        println!("No changes needed.");
    }
    for action in actions {
        if dry_run {
            println!("Would {}", action);
        } else {
            println!("{}", action);
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let host = cli.computer.as_deref();
    match cli.command {
        Command::List { json, output } => {
            let store = open_store(host)?;
            let entries = list_assignments(&*store)?;
            let out: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(io::stdout().lock()),
            };
            if json {
                write_json(out, &entries)?;
            } else {
                write_table(out, &entries)?;
            }
        }
        Command::Principal(args) => {
            // Validation happens before any connection is attempted.
            let request = PrincipalChange::from(args).into_request()?;
            let mut store = open_store(host)?;
            let request = request.resolve(&*store)?;
            let actions = reconcile_principal(&mut *store, &request)?;
            print_actions(&actions, request.dry_run);
        }
        Command::Privilege(args) => {
            let request = PrivilegeChange::from(args).into_request()?;
            let mut store = open_store(host)?;
            let request = request.resolve(&*store)?;
            let actions = reconcile_privilege(&mut *store, &request)?;
            print_actions(&actions, request.dry_run);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<UserRightsError>() {
            Some(UserRightsError::Validation(violations)) => {
                for violation in violations {
                    eprintln!("{}", violation);
                }
                ExitCode::from(1)
            }
            _ => {
                eprintln!("userrights: {}", err);
                ExitCode::from(2)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn principal_args() {
        let Command::Principal(args) = parse(&[
            "userrights",
            "principal",
            "S-1-5-20",
            "--grant",
            "SeServiceLogonRight,SeBatchLogonRight",
            "--revoke-others",
            "--dry-run",
        ]) else {
            panic!("expected principal command");
        };
        let change = PrincipalChange::from(args);
        assert_eq!(change.principal, "S-1-5-20");
        assert_eq!(change.grant, ["SeServiceLogonRight", "SeBatchLogonRight"]);
        assert!(change.revoke_others);
        assert!(change.dry_run);
        assert!(!change.revoke_all);
        assert!(change.validate().is_empty());
    }

    #[test]
    fn privilege_args() {
        let Command::Privilege(args) = parse(&[
            "userrights",
            "--computer",
            "fileserver",
            "privilege",
            "SeServiceLogonRight",
            "--grant",
            "S-1-5-20",
            "--revoke-pattern",
            "^S-1-5-21-",
        ]) else {
            panic!("expected privilege command");
        };
        let change = PrivilegeChange::from(args);
        assert_eq!(change.revoke_pattern.as_deref(), Some("^S-1-5-21-"));
        assert!(change.validate().is_empty());
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["userrights", "list", "--json", "--computer", "dc01"]).unwrap();
        assert_eq!(cli.computer.as_deref(), Some("dc01"));
        assert!(matches!(cli.command, Command::List { json: true, output: None }));
    }

    #[test]
    fn repeated_grant_flags() {
        let Command::Principal(args) = parse(&[
            "userrights",
            "principal",
            "alice",
            "--grant",
            "SeDebugPrivilege",
            "--grant",
            "sedebugprivilege",
        ]) else {
            panic!("expected principal command");
        };
        let violations = PrincipalChange::from(args).validate();
        assert_eq!(violations, ["Grant entries contain duplicates."]);
    }

    #[test]
    fn missing_subcommand() {
        assert!(Cli::try_parse_from(["userrights"]).is_err());
    }
}
