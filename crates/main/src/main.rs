use std::error::Error;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use smartdrive_report::config::{
    MailConfig, DEFAULT_RELAY_HOST, DEFAULT_RELAY_PORT, DEFAULT_SMTP_TIMEOUT,
};
use smartdrive_report::controller::{FeedbackLevel, FormController, SubmissionOutcome};
use smartdrive_report::notify::{Notifier, SmtpNotifier};
use smartdrive_report::report::PDF_FILE_NAME;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod web;

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// SmartDrive: simulated smart driving reports.
///
/// Mail delivery needs a sender address and credential, given as flags or via
/// the `SMARTDRIVE_*` environment variables. Without them reports are still
/// generated and offered for download.
#[derive(Parser)]
#[command(author, version, about = "SmartDrive smart driving report demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the report form over HTTP.
    Serve {
        #[arg(long, env = "SMARTDRIVE_BIND", default_value = "127.0.0.1:8501")]
        bind: SocketAddr,

        #[command(flatten)]
        mail: MailArgs,
    },

    /// Run one submission and write the report to disk.
    #[command(aliases = ["gen"])]
    Generate {
        /// Recipient of the report; when omitted nothing is mailed.
        #[arg(long)]
        email: Option<String>,

        #[arg(long, default_value = PDF_FILE_NAME)]
        out: PathBuf,

        /// Also write `pie.svg` and `bar.svg` into this directory.
        #[arg(long)]
        charts_dir: Option<PathBuf>,

        /// Seed for reproducible metrics.
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        mail: MailArgs,
    },
}

#[derive(Args)]
struct MailArgs {
    #[arg(long, env = "SMARTDRIVE_SENDER_ADDRESS")]
    sender_address: Option<String>,

    #[arg(long, env = "SMARTDRIVE_SENDER_CREDENTIAL", hide_env_values = true)]
    sender_credential: Option<String>,

    #[arg(long, env = "SMARTDRIVE_RELAY_HOST", default_value = DEFAULT_RELAY_HOST)]
    relay_host: String,

    #[arg(long, env = "SMARTDRIVE_RELAY_PORT", default_value_t = DEFAULT_RELAY_PORT)]
    relay_port: u16,

    /// SMTP timeout in seconds.
    #[arg(long, env = "SMARTDRIVE_SMTP_TIMEOUT", default_value_t = DEFAULT_SMTP_TIMEOUT.as_secs())]
    smtp_timeout: u64,
}

impl MailArgs {
    fn into_config(self) -> Result<Option<MailConfig>, BoxError> {
        Ok(MailConfig::from_parts(
            self.sender_address,
            self.sender_credential,
            self.relay_host,
            self.relay_port,
            Duration::from_secs(self.smtp_timeout),
        )?)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { bind, mail } => serve(bind, mail),
        Commands::Generate {
            email,
            out,
            charts_dir,
            seed,
            mail,
        } => generate(email.as_deref(), &out, charts_dir.as_deref(), seed, mail),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}

fn serve(bind: SocketAddr, mail: MailArgs) -> Result<(), BoxError> {
    let state = web::AppState::new(mail.into_config()?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(web::serve(bind, state))?;
    Ok(())
}

fn generate(
    email: Option<&str>,
    out: &Path,
    charts_dir: Option<&Path>,
    seed: Option<u64>,
    mail: MailArgs,
) -> Result<(), BoxError> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let outcome = match email {
        Some(email) => {
            let notifier = mail
                .into_config()?
                .map(|config| Box::new(SmtpNotifier::new(config)) as Box<dyn Notifier>);
            FormController::new(notifier).submit(email, &mut rng)
        }
        // Nothing to mail: skip validation and sending.
        None => FormController::new(None).preview(&mut rng),
    };
    log_feedback(&outcome);

    if outcome.is_rejected() {
        return Err("no recipient given".into());
    }
    let report = outcome.report.ok_or("report could not be generated")?;
    let charts = outcome.charts;

    fs::write(out, report.as_bytes())?;
    info!(path = %out.display(), bytes = report.len(), "report written");

    if let (Some(dir), Some(charts)) = (charts_dir, &charts) {
        fs::create_dir_all(dir)?;
        fs::write(dir.join("pie.svg"), &charts.pie)?;
        fs::write(dir.join("bar.svg"), &charts.bar)?;
        info!(dir = %dir.display(), "charts written");
    }

    Ok(())
}

fn log_feedback(outcome: &SubmissionOutcome) {
    for item in &outcome.feedback {
        let detail = item.detail.as_deref().unwrap_or_default();
        match item.level {
            FeedbackLevel::Info | FeedbackLevel::Success => info!("{}", item.message),
            FeedbackLevel::Warning => warn!("{}", item.message),
            FeedbackLevel::Error => error!(detail, "{}", item.message),
        }
    }
}
