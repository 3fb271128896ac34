// Lease Ledger CLI
// Drives the lease store from the shell: list / add / update / remove / calculate

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;

use lease_ledger::config::{generate_default_config, Config};
use lease_ledger::lease::{parse_amount, parse_date, parse_term};
use lease_ledger::{
    calculator, export_csv, format_currency, import_csv, init_logging, open_store, Lease,
    LeaseDraft, LeaseError, LeasePatch, LeaseType, ValidationError,
};

#[derive(Parser)]
#[command(name = "lease-ledger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keep track of leases and what they cost")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $LEASE_LEDGER_CONFIG, then the standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all leases
    List {
        /// Print the raw JSON collection
        #[arg(long)]
        json: bool,
    },

    /// Show one lease
    Show { id: String },

    /// Add a new lease
    Add(LeaseFields),

    /// Change fields of an existing lease
    Update {
        id: String,
        #[command(flatten)]
        fields: LeaseFields,
        /// Status tag (e.g. Active)
        #[arg(long)]
        status: Option<String>,
        /// Remove an optional field (e.g. end-date, security-deposit); repeatable
        #[arg(long, value_name = "FIELD")]
        clear: Vec<String>,
    },

    /// Delete a lease
    Remove { id: String },

    /// Compute and store total cost (monthly payment × term)
    Calculate { id: String },

    /// Dashboard numbers for the whole portfolio
    Summary,

    /// Write all leases to a CSV file
    Export { path: PathBuf },

    /// Add leases from a CSV file (all rows or none)
    Import { path: PathBuf },

    /// Print a default config file
    InitConfig,
}

/// Lease fields as typed on the command line
#[derive(Args)]
struct LeaseFields {
    #[arg(long)]
    name: Option<String>,
    /// Residential or Commercial
    #[arg(long = "type")]
    lease_type: Option<String>,
    #[arg(long, alias = "monthly-rent")]
    monthly_payment: Option<String>,
    /// Months
    #[arg(long)]
    term: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    start_date: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long)]
    security_deposit: Option<String>,
    #[arg(long)]
    additional_charges: Option<String>,
    /// Percent per year
    #[arg(long)]
    annual_rent_increase: Option<String>,
    #[arg(long)]
    utilities_included: Option<bool>,
    #[arg(long)]
    maintenance_fees: Option<String>,
    #[arg(long)]
    late_payment_penalty: Option<String>,
    #[arg(long)]
    image: Option<String>,
}

/// Parsed optional values, with every parse failure collected
struct ParsedFields {
    name: Option<String>,
    lease_type: Option<LeaseType>,
    monthly_payment: Option<Decimal>,
    term: Option<u32>,
    start_date: Option<chrono::NaiveDate>,
    end_date: Option<chrono::NaiveDate>,
    security_deposit: Option<Decimal>,
    additional_charges: Option<Decimal>,
    annual_rent_increase: Option<Decimal>,
    utilities_included: Option<bool>,
    maintenance_fees: Option<Decimal>,
    late_payment_penalty: Option<Decimal>,
    image: Option<String>,
}

fn parse_opt<T>(
    raw: Option<&str>,
    errors: &mut Vec<ValidationError>,
    parse: impl Fn(&str) -> Result<T, ValidationError>,
) -> Option<T> {
    match raw.map(parse) {
        Some(Ok(v)) => Some(v),
        Some(Err(e)) => {
            errors.push(e);
            None
        }
        None => None,
    }
}

impl LeaseFields {
    fn parse(self) -> Result<ParsedFields, LeaseError> {
        let mut errors = Vec::new();

        let parsed = ParsedFields {
            lease_type: parse_opt(self.lease_type.as_deref(), &mut errors, |s| s.parse()),
            monthly_payment: parse_opt(self.monthly_payment.as_deref(), &mut errors, |s| {
                parse_amount("monthlyPayment", s)
            }),
            term: parse_opt(self.term.as_deref(), &mut errors, |s| parse_term("term", s)),
            start_date: parse_opt(self.start_date.as_deref(), &mut errors, |s| {
                parse_date("startDate", s)
            }),
            end_date: parse_opt(self.end_date.as_deref(), &mut errors, |s| parse_date("endDate", s)),
            security_deposit: parse_opt(self.security_deposit.as_deref(), &mut errors, |s| {
                parse_amount("securityDeposit", s)
            }),
            additional_charges: parse_opt(self.additional_charges.as_deref(), &mut errors, |s| {
                parse_amount("additionalCharges", s)
            }),
            annual_rent_increase: parse_opt(self.annual_rent_increase.as_deref(), &mut errors, |s| {
                parse_amount("annualRentIncrease", s)
            }),
            maintenance_fees: parse_opt(self.maintenance_fees.as_deref(), &mut errors, |s| {
                parse_amount("maintenanceFees", s)
            }),
            late_payment_penalty: parse_opt(self.late_payment_penalty.as_deref(), &mut errors, |s| {
                parse_amount("latePaymentPenalty", s)
            }),
            utilities_included: self.utilities_included,
            name: self.name,
            image: self.image,
        };

        if errors.is_empty() {
            Ok(parsed)
        } else {
            Err(LeaseError::Validation(errors))
        }
    }
}

impl From<ParsedFields> for LeaseDraft {
    fn from(p: ParsedFields) -> Self {
        LeaseDraft {
            name: p.name,
            lease_type: p.lease_type,
            monthly_payment: p.monthly_payment,
            term: p.term,
            start_date: p.start_date,
            end_date: p.end_date,
            security_deposit: p.security_deposit,
            additional_charges: p.additional_charges,
            annual_rent_increase: p.annual_rent_increase,
            utilities_included: p.utilities_included,
            maintenance_fees: p.maintenance_fees,
            late_payment_penalty: p.late_payment_penalty,
            image: p.image,
        }
    }
}

impl ParsedFields {
    fn into_patch(self, status: Option<String>, clear: &[String]) -> Result<LeasePatch, LeaseError> {
        let mut patch = LeasePatch {
            name: self.name,
            lease_type: self.lease_type,
            monthly_payment: self.monthly_payment,
            term: self.term,
            start_date: self.start_date,
            end_date: self.end_date.map(Some),
            status,
            security_deposit: self.security_deposit.map(Some),
            additional_charges: self.additional_charges.map(Some),
            annual_rent_increase: self.annual_rent_increase.map(Some),
            utilities_included: self.utilities_included,
            maintenance_fees: self.maintenance_fees.map(Some),
            late_payment_penalty: self.late_payment_penalty.map(Some),
            image: self.image.map(Some),
        };

        let errors: Vec<ValidationError> = clear
            .iter()
            .filter_map(|field| patch.clear(field).err())
            .collect();
        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(LeaseError::Validation(errors))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig = cli.command {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let config = Config::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config.logging.level);

    let mut store = open_store(&config.storage)
        .with_context(|| format!("Failed to open lease store at {:?}", config.storage.db_path))?;
    let currency = config.display.currency.as_str();

    match cli.command {
        Commands::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(store.list())?);
            } else if store.is_empty() {
                println!("No leases yet. Add one with: lease-ledger add --name ... --monthly-payment ... --term ...");
            } else {
                for lease in store.list() {
                    print_row(lease, currency);
                }
            }
        }
        Commands::Show { id } => {
            let lease = store.get(&id)?;
            print_detail(&lease, currency)?;
        }
        Commands::Add(fields) => {
            let draft: LeaseDraft = fields.parse()?.into();
            let lease = store.add(draft)?;
            println!("✓ Added lease {}", lease.id);
            print_detail(&lease, currency)?;
        }
        Commands::Update {
            id,
            fields,
            status,
            clear,
        } => {
            let patch = fields.parse()?.into_patch(status, &clear)?;
            if patch.is_empty() {
                anyhow::bail!("Nothing to update: pass at least one field");
            }
            let lease = store.update(&id, &patch)?;
            println!("✓ Updated lease {}", lease.id);
            print_detail(&lease, currency)?;
        }
        Commands::Remove { id } => {
            if store.remove(&id)? {
                println!("✓ Removed lease {}", id);
            } else {
                println!("No lease with id {} (nothing removed)", id);
            }
        }
        Commands::Calculate { id } => {
            let cost = store.calculate_cost(&id)?;
            println!("Total cost: {}", format_currency(cost, currency));
        }
        Commands::Summary => {
            let summary = store.summary()?;
            println!("📊 Portfolio");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("Total leases:         {}", summary.total_leases);
            println!("Active leases:        {}", summary.active_leases);
            println!(
                "Monthly payments:     {}",
                format_currency(summary.total_monthly_payments, currency)
            );
            println!("Average lease term:   {} months", summary.average_term_months);
            println!(
                "Calculated cost:      {}",
                format_currency(summary.total_calculated_cost, currency)
            );
        }
        Commands::Export { path } => {
            let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
            let count = export_csv(store.list(), file)?;
            println!("✓ Exported {} leases to {:?}", count, path);
        }
        Commands::Import { path } => {
            let file = File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
            let drafts = import_csv(file)?;
            let created = store.import(drafts)?;
            println!("✓ Imported {} leases from {:?}", created.len(), path);
        }
        Commands::InitConfig => {}
    }

    Ok(())
}

fn print_row(lease: &Lease, currency: &str) {
    println!(
        "{}  {:<28} {:<12} {:>18}/mo  {:>3} mo  {}  {}",
        lease.id,
        lease.name,
        lease.lease_type,
        format_currency(lease.monthly_payment, currency),
        lease.term,
        lease.start_date,
        lease.status,
    );
}

fn print_detail(lease: &Lease, currency: &str) -> Result<()> {
    println!("Id:               {}", lease.id);
    println!("Name:             {}", lease.name);
    println!("Type:             {}", lease.lease_type);
    println!("Status:           {}", lease.status);
    println!("Monthly payment:  {}", format_currency(lease.monthly_payment, currency));
    println!("Term:             {} months", lease.term);
    println!("Start date:       {}", lease.start_date);
    if let Some(end) = lease.end_date {
        println!("End date:         {}", end);
    }
    if let Some(cost) = lease.total_cost {
        println!("Total cost:       {}", format_currency(cost, currency));
    }
    if let Some(pct) = lease.annual_rent_increase {
        println!(
            "Projected cost:   {} (+{}%/year)",
            format_currency(calculator::projected_cost(lease)?, currency),
            pct
        );
    }
    println!(
        "Monthly outlay:   {}",
        format_currency(calculator::monthly_outlay(lease)?, currency)
    );
    if let Some(deposit) = lease.security_deposit {
        println!("Security deposit: {}", format_currency(deposit, currency));
    }
    if let Some(penalty) = lease.late_payment_penalty {
        println!("Late penalty:     {}", format_currency(penalty, currency));
    }
    if lease.utilities_included {
        println!("Utilities:        included");
    }
    Ok(())
}
