//! Choreboard CLI — the main entry point.
//!
//! Commands:
//! - `init`       — Write the default config file
//! - `status`     — Show configuration and store status
//! - `chore`      — Create or inspect chores
//! - `complete`   — A child reports an assignment done
//! - `approve`    — A parent approves and pays out
//! - `reject`     — A parent sends an assignment back
//! - `claim`      — A child claims a pool chore by completing it
//! - `refresh`    — Apply due recurrence resets for a chore
//! - `available`  — Check whether a child can act on a chore
//! - `balance`    — Show a child's balance
//! - `adjust`     — Record a manual balance adjustment

use std::path::PathBuf;

use choreboard_core::{AssignmentId, ChildId, ChoreId, DistributionMode, FamilyId, Money, ParentId};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "choreboard",
    about = "Choreboard — chore assignments and allowance rewards",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs and results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Read configuration from this file instead of ~/.choreboard/config.toml
    #[arg(long, global = true, env = "CHOREBOARD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration and store status
    Status,

    /// Create or inspect chores
    #[command(subcommand)]
    Chore(ChoreCommand),

    /// Mark an assignment as completed
    Complete { assignment: AssignmentId },

    /// Approve a completed assignment
    Approve {
        assignment: AssignmentId,

        /// The approving parent
        #[arg(long)]
        parent: ParentId,

        /// Payout, required for range rewards (e.g. 2.50)
        #[arg(long)]
        amount: Option<Money>,
    },

    /// Reject a completed assignment
    Reject {
        assignment: AssignmentId,

        /// The rejecting parent
        #[arg(long)]
        parent: ParentId,

        #[arg(long)]
        reason: String,
    },

    /// Claim a pool chore (claiming is completing)
    Claim {
        chore: ChoreId,

        #[arg(long)]
        child: ChildId,
    },

    /// Reset or return to the pool any approved rows past their cooldown
    Refresh { chore: ChoreId },

    /// Check whether a chore is available to a child right now
    Available {
        chore: ChoreId,

        /// Ignored for pool chores
        #[arg(long)]
        child: ChildId,
    },

    /// Show a child's balance
    Balance { child: ChildId },

    /// Record a manual balance adjustment
    Adjust {
        child: ChildId,

        /// The parent recording the adjustment
        #[arg(long)]
        parent: ParentId,

        /// Signed amount, e.g. 5.00 or -2.50
        #[arg(long, allow_hyphen_values = true)]
        amount: Money,

        #[arg(long)]
        reason: String,
    },
}

#[derive(Subcommand)]
enum ChoreCommand {
    /// Create a chore and its initial assignments
    Create {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// The authoring parent
        #[arg(long)]
        parent: ParentId,

        /// Household id; a fresh one is generated when omitted
        #[arg(long)]
        family: Option<FamilyId>,

        /// single, multi_independent or pool
        #[arg(long, default_value = "single")]
        mode: DistributionMode,

        /// Fixed reward
        #[arg(long, conflicts_with_all = ["min", "max"], required_unless_present_all = ["min", "max"])]
        reward: Option<Money>,

        /// Lower bound of a range reward
        #[arg(long, requires = "max")]
        min: Option<Money>,

        /// Upper bound of a range reward
        #[arg(long, requires = "min")]
        max: Option<Money>,

        /// Reopen this many days after each approval
        #[arg(long)]
        every_days: Option<u32>,

        /// Assignee; repeat for multi_independent
        #[arg(long = "child")]
        children: Vec<ChildId>,
    },

    /// Show a chore and its assignments
    Show { chore: ChoreId },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let out = commands::Output::new(cli.json);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => commands::init::run(config, force).await?,
        Commands::Status => commands::status::run(config, &out).await?,
        Commands::Chore(ChoreCommand::Create {
            title,
            description,
            parent,
            family,
            mode,
            reward,
            min,
            max,
            every_days,
            children,
        }) => {
            let args = commands::chore::CreateArgs {
                title,
                description,
                parent,
                family,
                mode,
                reward,
                range: min.zip(max),
                every_days,
                children,
            };
            commands::chore::create(config, &out, args).await?
        }
        Commands::Chore(ChoreCommand::Show { chore }) => {
            commands::chore::show(config, &out, chore).await?
        }
        Commands::Complete { assignment } => {
            commands::assignment::complete(config, &out, assignment).await?
        }
        Commands::Approve {
            assignment,
            parent,
            amount,
        } => commands::assignment::approve(config, &out, assignment, parent, amount).await?,
        Commands::Reject {
            assignment,
            parent,
            reason,
        } => commands::assignment::reject(config, &out, assignment, parent, &reason).await?,
        Commands::Claim { chore, child } => commands::pool::claim(config, &out, chore, child).await?,
        Commands::Refresh { chore } => commands::pool::refresh(config, &out, chore).await?,
        Commands::Available { chore, child } => {
            commands::pool::available(config, &out, chore, child).await?
        }
        Commands::Balance { child } => commands::balance::show(config, &out, child).await?,
        Commands::Adjust {
            child,
            parent,
            amount,
            reason,
        } => commands::balance::adjust(config, &out, child, parent, amount, reason).await?,
    }

    Ok(())
}
