//! Command-line boundary for the three binaries.
//!
//! Errors surface here as `anyhow` results; the library below reports
//! structured `SchemaError`s. SQL goes to stdout only; everything else
//! (warnings, progress) goes to stderr through `tracing`.

use crate::apply::{execute_plan, wrap_transaction};
use crate::config::Config;
use crate::depend;
use crate::diff::{compute_diff_with_options, invert_plan, planner::plan_changes, DiffOptions};
use crate::filter::{filter_database, Filter};
use crate::model::Database;
use crate::pg::catalog::read_database;
use crate::pg::connection::PgConnection;
use crate::pg::sqlgen::generate_sql;
use crate::yaml;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser};
use sqlx::postgres::PgConnectOptions;
use std::io::Read;
use std::path::PathBuf;

/// stderr logging; `RUST_LOG` adjusts the filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Database server host or socket directory
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Database server port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Database user name
    #[arg(short = 'U', long = "username")]
    username: Option<String>,

    /// Prompt for a password before connecting
    #[arg(short = 'W', long = "password")]
    password: bool,
}

impl ConnectionArgs {
    fn options(&self, dbname: &str) -> Result<PgConnectOptions> {
        // PgConnectOptions::new honors PGHOST/PGPORT/PGUSER/PGPASSWORD.
        let mut options = PgConnectOptions::new().database(dbname);
        if let Some(host) = &self.host {
            options = options.host(host);
        }
        if let Some(port) = self.port {
            options = options.port(port);
        }
        if let Some(username) = &self.username {
            options = options.username(username);
        }
        if self.password {
            eprint!("Password: ");
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .context("reading password")?;
            options = options.password(line.trim_end_matches(['\r', '\n']));
        }
        Ok(options)
    }
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Process only the named schema (repeatable)
    #[arg(short = 'n', long = "schema")]
    schemas: Vec<String>,

    /// Do not process the named schema (repeatable)
    #[arg(short = 'N', long = "exclude-schema")]
    exclude_schemas: Vec<String>,

    /// Process only the named table (repeatable)
    #[arg(short = 't', long = "table")]
    tables: Vec<String>,

    /// Do not process the named table (repeatable)
    #[arg(short = 'T', long = "exclude-table")]
    exclude_tables: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        Filter {
            schemas: self.schemas.clone(),
            exclude_schemas: self.exclude_schemas.clone(),
            tables: self.tables.clone(),
            exclude_tables: self.exclude_tables.clone(),
        }
    }
}

fn strip_owners(db: &mut Database) {
    for schema in db.schemas.values_mut() {
        schema.owner = None;
    }
    for table in db.tables.values_mut() {
        table.owner = None;
    }
    for view in db.views.values_mut() {
        view.owner = None;
    }
    for seq in db.sequences.values_mut() {
        seq.owner = None;
    }
    for f in db.functions.values_mut() {
        f.owner = None;
    }
    for a in db.aggregates.values_mut() {
        a.owner = None;
    }
    for t in db.types.values_mut() {
        t.owner = None;
    }
    for d in db.domains.values_mut() {
        d.owner = None;
    }
    for l in db.languages.values_mut() {
        l.owner = None;
    }
    for c in db.collations.values_mut() {
        c.owner = None;
    }
    for c in db.conversions.values_mut() {
        c.owner = None;
    }
    for o in db.operators.values_mut() {
        o.owner = None;
    }
    for oc in db.operator_classes.values_mut() {
        oc.owner = None;
    }
    for of in db.operator_families.values_mut() {
        of.owner = None;
    }
    for et in db.event_triggers.values_mut() {
        et.owner = None;
    }
    for f in db.fdws.values_mut() {
        f.owner = None;
    }
    for s in db.servers.values_mut() {
        s.owner = None;
    }
    for ft in db.foreign_tables.values_mut() {
        ft.owner = None;
    }
    for d in db.ts_dictionaries.values_mut() {
        d.owner = None;
    }
    for c in db.ts_configs.values_mut() {
        c.owner = None;
    }
}

fn strip_privileges(db: &mut Database) {
    for schema in db.schemas.values_mut() {
        schema.privileges.clear();
    }
    for table in db.tables.values_mut() {
        table.privileges.clear();
        for column in &mut table.columns {
            column.privileges.clear();
        }
    }
    for view in db.views.values_mut() {
        view.privileges.clear();
    }
    for seq in db.sequences.values_mut() {
        seq.privileges.clear();
    }
    for f in db.functions.values_mut() {
        f.privileges.clear();
    }
    for t in db.types.values_mut() {
        t.privileges.clear();
    }
    for d in db.domains.values_mut() {
        d.privileges.clear();
    }
    for l in db.languages.values_mut() {
        l.privileges.clear();
    }
    for f in db.fdws.values_mut() {
        f.privileges.clear();
    }
    for s in db.servers.values_mut() {
        s.privileges.clear();
    }
    for ft in db.foreign_tables.values_mut() {
        ft.privileges.clear();
    }
}

/// Extract a live database into a declarative YAML description.
#[derive(Parser, Debug)]
#[command(name = "dbtoyaml", version, about)]
struct DbToYamlArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    filter: FilterArgs,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Repository path for multiple-files output
    #[arg(short = 'r', long)]
    repo: Option<PathBuf>,

    /// Do not output object ownership information
    #[arg(short = 'O', long = "no-owner")]
    no_owner: bool,

    /// Do not output object privileges
    #[arg(short = 'x', long = "no-privileges")]
    no_privileges: bool,

    /// Split the output into one file per object under the repository
    #[arg(short = 'm', long = "multiple-files")]
    multiple_files: bool,

    /// Database to extract
    dbname: String,
}

pub async fn dbtoyaml_main() -> Result<()> {
    let args = DbToYamlArgs::parse();
    let config = Config::load(args.repo.as_deref(), args.config.as_deref())?;

    let conn = PgConnection::connect(args.connection.options(&args.dbname)?).await?;
    let mut db = read_database(&conn).await?;
    depend::link(&mut db);
    let mut db = filter_database(&db, &args.filter.to_filter());
    if args.no_owner {
        strip_owners(&mut db);
    }
    if args.no_privileges {
        strip_privileges(&mut db);
    }

    if args.multiple_files {
        let root = args
            .repo
            .clone()
            .or_else(|| config.files_path())
            .unwrap_or_else(|| PathBuf::from("."));
        let written = yaml::files::write_tree(&db, &root, &args.dbname)?;
        tracing::info!(files = written.len(), root = %root.display(), "wrote file tree");
    } else {
        let text = yaml::database_to_string(&db);
        match &args.output {
            Some(path) => std::fs::write(path, text)
                .with_context(|| format!("writing {}", path.display()))?,
            None => print!("{text}"),
        }
    }
    Ok(())
}

/// Diff a YAML description against a live database and emit or apply the
/// converging DDL.
#[derive(Parser, Debug)]
#[command(name = "yamltodb", version, about)]
struct YamlToDbArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Process only the named schema (repeatable)
    #[arg(short = 'n', long = "schema")]
    schemas: Vec<String>,

    /// Output file for the generated SQL (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Repository path for multiple-files input
    #[arg(short = 'r', long)]
    repo: Option<PathBuf>,

    /// Ignore object ownership differences
    #[arg(short = 'O', long = "no-owner")]
    no_owner: bool,

    /// Ignore privilege differences
    #[arg(short = 'x', long = "no-privileges")]
    no_privileges: bool,

    /// Read the description from one file per object under the repository
    #[arg(short = 'm', long = "multiple-files")]
    multiple_files: bool,

    /// Wrap the emitted statements in BEGIN/COMMIT. Execution with `-u`
    /// always runs in a single transaction regardless.
    #[arg(short = '1', long = "single-transaction")]
    single_transaction: bool,

    /// Execute the generated statements against the database
    #[arg(short = 'u', long = "update")]
    update: bool,

    /// Generate the inverse of the computed changes (experimental)
    #[arg(long)]
    revert: bool,

    /// Database to synchronize
    dbname: String,

    /// Schema description file; `-` or absent reads stdin
    spec: Option<String>,
}

fn read_spec(spec: &Option<String>) -> Result<String> {
    match spec.as_deref() {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading schema description from stdin")?;
            Ok(text)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {path}"))
        }
    }
}

pub async fn yamltodb_main() -> Result<()> {
    let args = YamlToDbArgs::parse();
    let config = Config::load(args.repo.as_deref(), args.config.as_deref())?;

    let mut desired = if args.multiple_files {
        let root = args
            .repo
            .clone()
            .or_else(|| config.files_path())
            .unwrap_or_else(|| PathBuf::from("."));
        yaml::files::read_tree(&root)?
    } else {
        yaml::load::database_from_str(&read_spec(&args.spec)?)?
    };
    depend::link(&mut desired);

    let conn = PgConnection::connect(args.connection.options(&args.dbname)?).await?;
    let mut current = read_database(&conn).await?;
    depend::link(&mut current);

    let filter = Filter {
        schemas: args.schemas.clone(),
        ..Default::default()
    };
    let current = filter_database(&current, &filter);
    let desired = filter_database(&desired, &filter);

    let options = DiffOptions {
        include_owner: !args.no_owner,
        include_privileges: !args.no_privileges,
    };
    let plan = compute_diff_with_options(&current, &desired, &options)?;

    let ordered = if args.revert {
        let inverted = invert_plan(plan, &current, &desired);
        plan_changes(inverted, &desired, &current)
    } else {
        plan_changes(plan, &current, &desired)
    };
    let statements = generate_sql(&ordered);

    let printable = if args.single_transaction {
        wrap_transaction(statements.clone())
    } else {
        statements.clone()
    };
    let text = if printable.is_empty() {
        String::new()
    } else {
        printable.join("\n") + "\n"
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?
        }
        None => print!("{text}"),
    }

    if args.update {
        let applied = execute_plan(&conn, &statements).await?;
        tracing::info!(statements = applied, "changes applied");
    }
    Ok(())
}

/// Augment a database description with audit columns and re-emit it.
#[derive(Parser, Debug)]
#[command(name = "dbaugment", version, about)]
struct DbAugmentArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Database to extract and augment
    dbname: String,

    /// Augmentation specification file; `-` or absent reads stdin
    spec: Option<String>,
}

pub async fn dbaugment_main() -> Result<()> {
    let args = DbAugmentArgs::parse();
    let _config = Config::load(None, args.config.as_deref())?;

    let conn = PgConnection::connect(args.connection.options(&args.dbname)?).await?;
    let mut db = read_database(&conn).await?;
    depend::link(&mut db);

    let spec_text = read_spec(&args.spec)?;
    let spec: serde_yaml::Value = serde_yaml::from_str(&spec_text)
        .map_err(|e| anyhow!("bad augmentation specification: {e}"))?;
    crate::augment::augment_database(&mut db, &spec)?;

    print!("{}", yaml::database_to_string(&db));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbtoyaml_parses_short_flags() {
        let args = DbToYamlArgs::parse_from([
            "dbtoyaml", "-H", "dbhost", "-p", "5433", "-U", "admin", "-n", "public", "-n", "s1",
            "-T", "scratch", "-O", "-x", "mydb",
        ]);
        assert_eq!(args.connection.host.as_deref(), Some("dbhost"));
        assert_eq!(args.connection.port, Some(5433));
        assert_eq!(args.filter.schemas, vec!["public", "s1"]);
        assert_eq!(args.filter.exclude_tables, vec!["scratch"]);
        assert!(args.no_owner);
        assert!(args.no_privileges);
        assert_eq!(args.dbname, "mydb");
    }

    #[test]
    fn dbtoyaml_combines_short_flags() {
        let args = DbToYamlArgs::parse_from(["dbtoyaml", "-Ox", "mydb"]);
        assert!(args.no_owner);
        assert!(args.no_privileges);
    }

    #[test]
    fn yamltodb_parses_spec_and_transaction_flag() {
        let args = YamlToDbArgs::parse_from(["yamltodb", "-1", "mydb", "spec.yaml"]);
        assert!(args.single_transaction);
        assert!(!args.update);
        assert_eq!(args.spec.as_deref(), Some("spec.yaml"));

        let args = YamlToDbArgs::parse_from(["yamltodb", "mydb"]);
        assert!(!args.single_transaction);
        assert!(args.spec.is_none());
    }

    #[test]
    fn yamltodb_parses_update_and_revert() {
        let args = YamlToDbArgs::parse_from(["yamltodb", "-u", "--revert", "mydb"]);
        assert!(args.update);
        assert!(args.revert);
        assert!(args.spec.is_none());
    }
}
