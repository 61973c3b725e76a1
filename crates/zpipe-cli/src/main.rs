//! zpipe - mainframe build and deploy pipeline driver
//!
//! Drives an external Zowe-style CLI to deliver COBOL and Java
//! applications into a CICS region:
//!
//! - `provision` / `deprovision`: manage the target region via z/OSMF
//! - `cobol`: Endevor sync, generate, copy/bind jobs, program refresh
//! - `java`: gradle build, FTP bundle deploy, CICS resource setup
//! - `cics`: one-time region configuration (DB2, MQ, bridge)
//! - `endevor`: package promotion
//! - `server`: web application server build and deploy
//! - `build`: the full COBOL and Java delivery in one go

mod tasks;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use zpipe_core::{Config, ZoweCli};

use tasks::TaskContext;

#[derive(Parser)]
#[command(name = "zpipe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mainframe build and deploy pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Pipeline configuration file
    #[arg(long, global = true, env = "ZPIPE_CONFIG", default_value = "zpipe.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full COBOL and Java delivery
    Build,

    /// Deliver the COBOL program (sync, generate, copy, bind, refresh)
    Cobol {
        /// Only push source into Endevor
        #[arg(long)]
        push: bool,

        /// Only generate the element
        #[arg(long)]
        generate: bool,

        /// Only refresh the program in the region
        #[arg(long)]
        refresh: bool,
    },

    /// Deliver the Java OSGi application
    Java {
        /// Only compile the bundle locally
        #[arg(long)]
        compile: bool,

        /// Only reconcile the CICS resources
        #[arg(long)]
        define: bool,

        /// Only upload the bundle to zFS
        #[arg(long)]
        deploy: bool,

        /// Only refresh the installed bundle
        #[arg(long)]
        refresh: bool,
    },

    /// Configure the region (DB2 and MQ connections, bridge facility)
    Cics {
        /// Set up the DB2 connection
        #[arg(long)]
        config_db2: bool,

        /// Set up the MQ connection
        #[arg(long)]
        config_mq: bool,

        /// Set up the MQ bridge facility file
        #[arg(long)]
        config_bridge: bool,

        /// Start the bridge monitor transaction
        #[arg(long)]
        start_bridge: bool,

        /// Tear down the application resources
        #[arg(long)]
        delete: bool,

        /// SQL file to execute while configuring DB2
        #[arg(long)]
        sql_file: Option<PathBuf>,
    },

    /// Provision the target region from the configured template
    Provision {
        /// Logical id to record the instance under (default: from
        /// configuration)
        #[arg(long)]
        id: Option<String>,

        /// Template to provision (default: from configuration)
        #[arg(long)]
        template: Option<String>,

        /// Generated properties file to record into
        #[arg(long)]
        properties: Option<PathBuf>,
    },

    /// Deprovision a region
    Deprovision {
        /// Logical id whose recorded instance to deprovision
        #[arg(long)]
        id: Option<String>,

        /// Instance to deprovision (default: the recorded one)
        #[arg(long)]
        instance: Option<String>,
    },

    /// Endevor source delivery and package promotion
    Endevor {
        /// Add the elements for the first time
        #[arg(long)]
        create: bool,

        /// Push updated source into Endevor
        #[arg(long)]
        push: bool,

        /// Generate the configured element
        #[arg(long)]
        generate: bool,

        /// Promote the package (delete, create, cast, execute)
        #[arg(long)]
        package: bool,
    },

    /// Build and deploy the web application server
    Server {
        /// Only build the WAR locally
        #[arg(long)]
        build: bool,

        /// Deploy without rebuilding
        #[arg(long)]
        no_build: bool,

        /// Server configuration file stem to deploy
        #[arg(long)]
        config_file: Option<String>,
    },

    /// Run application tests
    Test {
        /// Run the Java unit tests
        #[arg(long)]
        unit: bool,

        /// Run the integration tests against the deployed system
        #[arg(long)]
        integration: bool,
    },

    /// Show the recorded provisioning properties
    Properties,

    /// Check the external CLI and configuration
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    zpipe_core::init_tracing(cli.json, level);

    let config = Config::from_file(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let runner = ZoweCli::new(&config.cli.program, cli.verbose);
    runner
        .verify_installed()
        .await
        .context("the mainframe CLI is not available")?;

    let ctx = TaskContext::new(config, Arc::new(runner));

    match cli.command {
        Commands::Build => tasks::build::run(&ctx).await,
        Commands::Cobol {
            push,
            generate,
            refresh,
        } => {
            let all = !(push || generate || refresh);
            tasks::cobol::run(&ctx, push || all, generate || all, all, refresh || all).await
        }
        Commands::Java {
            compile,
            define,
            deploy,
            refresh,
        } => {
            let all = !(compile || define || deploy || refresh);
            tasks::java::run(
                &ctx,
                compile || all,
                deploy || all,
                define || all,
                refresh || all,
            )
            .await
        }
        Commands::Cics {
            config_db2,
            config_mq,
            config_bridge,
            start_bridge,
            delete,
            sql_file,
        } => {
            tasks::cics::run(
                &ctx,
                tasks::cics::CicsTask {
                    config_db2,
                    config_mq,
                    config_bridge,
                    start_bridge,
                    delete,
                    sql_file,
                },
            )
            .await
        }
        Commands::Provision {
            id,
            template,
            properties,
        } => tasks::provision::provision(&ctx, id, template, properties).await,
        Commands::Deprovision { id, instance } => {
            tasks::provision::deprovision(&ctx, id, instance).await
        }
        Commands::Endevor {
            create,
            push,
            generate,
            package,
        } => {
            let all = !(create || push || generate || package);
            tasks::endevor::run(&ctx, create, push || all, generate || all, package || all).await
        }
        Commands::Server {
            build,
            no_build,
            config_file,
        } => tasks::server::run(&ctx, build, no_build, config_file).await,
        Commands::Test { unit, integration } => {
            let all = !(unit || integration);
            tasks::build::test(&ctx, unit || all, integration || all).await
        }
        Commands::Properties => tasks::verify::properties(&ctx),
        Commands::Verify => tasks::verify::run(&ctx).await,
    }
}
