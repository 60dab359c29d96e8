//! `tabula`: bootstrap and inspect a SQLite database from a JSON schema.
//!
//! ```bash
//! # Create every table declared in schema.json
//! tabula --db shop.db bootstrap --schema schema.json
//!
//! # Only check that the tables exist
//! tabula --db shop.db bootstrap --schema schema.json --validate-only
//!
//! # Print the DDL, dump a table, aggregate a column
//! tabula ddl --schema schema.json
//! tabula --db shop.db dump --schema schema.json orders
//! tabula --db shop.db aggregate --schema schema.json orders total --op SUM
//! ```
//!
//! Defaults come from the `TABULA_*` environment variables (see
//! [`DatabaseConfig::from_env`]); command-line flags win.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tabula_table::{
    sql, AggregateOperation, ColumnLookup, Database, DatabaseConfig, DatabaseStructure, Table,
};

#[derive(Parser, Debug)]
#[command(name = "tabula", version)]
#[command(about = "Bootstrap and inspect a SQLite database from a JSON schema")]
struct Cli {
    /// SQLite database file (`:memory:` allowed)
    #[arg(long, global = true, env = "TABULA_DB_PATH")]
    db: Option<PathBuf>,

    /// tracing filter, e.g. `debug` or `tabula_table=debug,info`
    #[arg(long, global = true, env = "TABULA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create (or validate) every table in the schema
    Bootstrap {
        #[arg(long)]
        schema: PathBuf,

        /// Fail on missing tables instead of creating them
        #[arg(long)]
        validate_only: bool,
    },

    /// Print the CREATE TABLE statements for the schema
    Ddl {
        #[arg(long)]
        schema: PathBuf,
    },

    /// Print every row of a table as JSON lines
    Dump {
        #[arg(long)]
        schema: PathBuf,
        table: String,
    },

    /// Run a one-column aggregate and print the result
    Aggregate {
        #[arg(long)]
        schema: PathBuf,
        table: String,
        column: String,

        /// AVG, COUNT, MAX, MIN, SUM or GROUP_CONCAT
        #[arg(long, default_value = "SUM")]
        op: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli);

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        db = %config.path.display(),
        "tabula starting"
    );

    let stdout = io::stdout();
    run(cli.command, &config, &mut stdout.lock())
}

/// Environment defaults overridden by the global flags.
fn resolve_config(cli: &Cli) -> DatabaseConfig {
    let mut config = DatabaseConfig::from_env();
    if let Some(db) = &cli.db {
        config.path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config
}

fn run(command: Command, config: &DatabaseConfig, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Bootstrap {
            schema,
            validate_only,
        } => {
            let structure = load_schema(&schema)?;
            let mut config = config.clone();
            if validate_only {
                config.create_tables_if_not_exist = false;
            }
            let db = Database::from_config(&config, &structure)
                .with_context(|| format!("bootstrapping {}", config.path.display()))?;
            for table in db.tables() {
                writeln!(out, "{}", describe(table))?;
            }
        }
        Command::Ddl { schema } => {
            let structure = load_schema(&schema)?;
            for table in &structure.tables {
                table.validate()?;
            }
            for table in &structure.tables {
                writeln!(out, "{};", sql::create_table_statement(table, true))?;
            }
        }
        Command::Dump { schema, table } => {
            let db = open_existing(config, &schema)?;
            let table = find_table(&db, &table)?;
            for row in table.rows() {
                writeln!(out, "{}", row?.to_json())?;
            }
        }
        Command::Aggregate {
            schema,
            table,
            column,
            op,
        } => {
            let operation: AggregateOperation = op.parse()?;
            let db = open_existing(config, &schema)?;
            let table = find_table(&db, &table)?;
            if table.find_column(&column).is_none() {
                return Err(anyhow!("table '{}' has no column '{}'", table.name(), column));
            }

            let projection = table
                .reference()
                .column(column.as_str())
                .aggregate(operation)
                .with_alias("result");
            for row in table.select_column(projection).rows() {
                writeln!(out, "{}", row?.to_json())?;
            }
        }
    }
    Ok(())
}

fn load_schema(path: &Path) -> anyhow::Result<DatabaseStructure> {
    DatabaseStructure::from_json_file(path)
        .with_context(|| format!("reading schema {}", path.display()))
}

/// Bootstraps in validate mode: every declared table must already exist.
fn open_existing(config: &DatabaseConfig, schema: &Path) -> anyhow::Result<Database> {
    let structure = load_schema(schema)?;
    let mut config = config.clone();
    config.create_tables_if_not_exist = false;
    Ok(Database::from_config(&config, &structure)?)
}

fn find_table<'a>(db: &'a Database, name: &str) -> anyhow::Result<&'a Table> {
    db.get_table(name)
        .ok_or_else(|| anyhow!("table '{}' is not declared in the schema", name))
}

/// `name(col TYPE [NOT NULL] [UNIQUE], ...) pk=(..) fk=[col->table.col, ...]`
fn describe(table: &Table) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", c.name(), c.column_type());
            if !c.nullable() {
                def.push_str(" NOT NULL");
            }
            if c.unique() {
                def.push_str(" UNIQUE");
            }
            def
        })
        .collect::<Vec<_>>()
        .join(", ");
    let foreign_keys = table
        .foreign_keys()
        .iter()
        .map(|fk| {
            format!(
                "{}->{}.{}",
                fk.column_name(),
                fk.references().table_name(),
                fk.references().column_name()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{}({}) pk=({}) fk=[{}]",
        table.name(),
        columns,
        table.primary_key().column_names().join(", "),
        foreign_keys
    )
}
