// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use spiermassa::{
    logging, Computation, Config, MeasurementRecord, ReferenceError, Session, SessionError, Sex,
};

#[derive(Parser)]
#[command(name = "spiermassa", version, about = "Spiermassa berekening")]
struct Cli {
    /// Reference table (ID, lnght, sex_janssen_modified)
    #[arg(long, global = true)]
    reference: Option<PathBuf>,

    /// Measurement log
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive form (default)
    Ui,
    /// Print all saved measurements
    Show,
    /// Compute the muscle mass for one ID without the form
    Compute {
        #[arg(long)]
        id: String,

        /// Weight in kg
        #[arg(long)]
        weight: f64,

        /// Bioelectrical resistance in ohm
        #[arg(long)]
        resistance: f64,

        /// Height in cm, overrides the reference value
        #[arg(long)]
        height: Option<f64>,

        /// man or vrouw, overrides the reference value
        #[arg(long)]
        sex: Option<String>,

        /// Append the result to the measurement log
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new(cli.reference, cli.log);
    let command = cli.command.unwrap_or(Command::Ui);

    match command {
        Command::Ui => {
            logging::init_tracing("off");
            run_ui_mode(config)?;
        }
        Command::Show => {
            logging::init_tracing("warn");
            run_show(config)?;
        }
        Command::Compute { id, weight, resistance, height, sex, save } => {
            logging::init_tracing("warn");
            let sex = match sex {
                Some(label) => match Sex::from_label(&label) {
                    Some(sex) => Some(sex),
                    None => bail!("Onbekend geslacht: {label} (gebruik man of vrouw)"),
                },
                None => None,
            };
            run_compute(config, &id, weight, resistance, height, sex, save)?;
        }
    }

    Ok(())
}

/// Load the reference store; a missing file halts the program
fn open_session(config: Config) -> Result<Session> {
    match Session::open(config) {
        Ok(session) => Ok(session),
        Err(SessionError::Reference(err @ ReferenceError::Missing { .. })) => {
            eprintln!("❌ {err}");
            eprintln!("   Zorg dat het referentiebestand bestaat of geef --reference op.");
            std::process::exit(1);
        }
        Err(err) => Err(err).context("Failed to open session"),
    }
}

fn run_show(config: Config) -> Result<()> {
    let log_path = config.log_path.clone();
    let session = open_session(config)?;
    let records = session
        .measurements()
        .with_context(|| format!("Failed to read {}", log_path.display()))?;

    if records.is_empty() {
        println!("Nog geen metingen opgeslagen.");
        return Ok(());
    }

    println!("📋 Alle opgeslagen metingen ({})", records.len());
    print_measurements(&records);
    Ok(())
}

fn run_compute(
    config: Config,
    id: &str,
    weight: f64,
    resistance: f64,
    height: Option<f64>,
    sex: Option<Sex>,
    save: bool,
) -> Result<()> {
    let mut session = open_session(config)?;
    session.select_id(id)?;

    let input = session.input_mut();
    if height.is_some() {
        input.set_height(height);
    }
    if sex.is_some() {
        input.set_sex(sex);
    }
    input.set_weight(Some(weight));
    input.set_resistance(Some(resistance));

    match session.evaluate() {
        Computation::Incomplete => {
            bail!("Niet ingevuld: {}", session.input().missing_fields().join(", "));
        }
        Computation::Failed(err) => bail!(err),
        Computation::Ready { mass_kg, .. } => {
            println!("✓ Spiermassa: {:.2} kg", mass_kg);
        }
    }

    if save {
        let record = session.save().context("Failed to save measurement")?;
        println!("✓ Meting opgeslagen ({})", record.recorded_at.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}

fn print_measurements(records: &[MeasurementRecord]) {
    println!(
        "{:<10} {:<7} {:>10} {:>11} {:>12} {:>11}  {}",
        "ID", "Gender", "Lengte_cm", "Gewicht_kg", "Resistentie", "Spiermassa", "Datum"
    );
    println!("{}", "━".repeat(86));
    for r in records {
        println!(
            "{:<10} {:<7} {:>10.1} {:>11.1} {:>12.1} {:>11.2}  {}",
            r.identifier,
            r.sex_label,
            r.height_cm,
            r.weight_kg,
            r.resistance_ohm,
            r.computed_mass_kg,
            r.recorded_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: Config) -> Result<()> {
    println!("🖥️  Spiermassa Calculator laden...\n");

    let session = open_session(config)?;
    println!("✓ {} personen geladen", session.store().len());
    println!("Starting UI... (Press 'Esc' to quit)\n");

    let mut app = ui::App::new(session);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: spiermassa compute --id <ID> --weight <KG> --resistance <OHM>");
    std::process::exit(1);
}
