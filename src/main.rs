// Loan Chaincode CLI - runs invocations against a local SQLite ledger

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use loan_chaincode::{init_logging, CallerIdentity, ChaincodeConfig, LoanChaincode, SqliteLedger};

#[derive(Parser)]
#[command(name = "loan-chaincode", version, about = "Loan application chaincode host")]
struct Cli {
    /// Ledger database file
    #[arg(long, default_value = "ledger.db")]
    db: PathBuf,

    /// Chaincode config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Caller `username` certificate attribute
    #[arg(long, default_value = "")]
    username: String,

    /// Caller `role` certificate attribute
    #[arg(long, default_value = "")]
    role: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the ledger tables
    Init,
    /// Run a transaction (any function)
    Invoke {
        function: String,
        args: Vec<String>,
    },
    /// Run a read-only query
    Query {
        function: String,
        args: Vec<String>,
    },
    /// Print the event log, newest first
    Events,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ChaincodeConfig::load(cli.config.as_deref())?;
    init_logging(&config.log_level);

    let ledger = SqliteLedger::open(&cli.db)?;
    let chaincode = LoanChaincode::new(config);
    let identity = CallerIdentity::with_role(&cli.username, &cli.role);

    match cli.command {
        Command::Init => {
            let mut stub = ledger.stub(identity);
            chaincode.init(&mut stub, "init", &[])?;
            println!("✓ Ledger ready at {:?}", cli.db);
        }
        Command::Invoke { function, args } => {
            let mut stub = ledger.stub(identity);
            let payload = chaincode.invoke(&mut stub, &function, &args)?;
            print_payload(&payload);
            println!("✓ {} committed (tx {})", function, stub.tx_id());
        }
        Command::Query { function, args } => {
            let stub = ledger.stub(identity);
            let payload = chaincode.query(&stub, &function, &args)?;
            print_payload(&payload);
        }
        Command::Events => {
            for event in ledger.events()? {
                println!(
                    "{}  {}  {}  {}",
                    event.timestamp.to_rfc3339(),
                    event.channel,
                    event.actor,
                    event.payload
                );
            }
        }
    }

    Ok(())
}

fn print_payload(payload: &[u8]) {
    if !payload.is_empty() {
        println!("{}", String::from_utf8_lossy(payload));
    }
}
