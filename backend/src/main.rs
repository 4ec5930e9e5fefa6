//! qsf-flow CLI - convert QSF surveys into feedback platform flows
//!
//! # Main Commands
//!
//! ```bash
//! qsf-flow convert survey.qsf            # Flow JSON on stdout (no flow created)
//! qsf-flow publish survey.qsf            # Convert and create the flow
//! qsf-flow campaign --name Spring --flow-id 123
//! qsf-flow reshape responses.csv --node-id N --flow-id F --language EN --map Q1=QID1
//! qsf-flow serve                         # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! qsf-flow stats survey.qsf              # Question counts by type
//! qsf-flow keys flow.json                # Question keys of a flow
//! qsf-flow validate flow.json            # Shape check a flow document
//! qsf-flow languages                     # Language catalog of the platform
//! qsf-flow parse responses.csv           # Just parse CSV to JSON
//! ```

use clap::{Args, Parser, Subcommand};
use qsf_flow::api::logs::LOG_BROADCASTER;
use qsf_flow::{
    aggregate, convert_survey, create_campaign, load_catalog, parse_csv_file_auto,
    publish_survey, reshape_responses, validate_flow, ApiConfig, ApiError, ColumnMapping,
    Environment, FlowApiClient, FlowDocument, FlowOptions, ImportContext, LanguageCatalog,
    SurveyDocument, ValidationError,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qsf-flow")]
#[command(about = "Convert QSF survey exports into feedback platform flows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Platform connection flags. Both fall back to the environment.
#[derive(Args, Clone)]
struct ApiArgs {
    /// API token (default: FLOW_API_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Platform environment (default: FLOW_API_ENV or try)
    #[arg(long, value_enum)]
    env: Option<Environment>,
}

impl ApiArgs {
    fn client(&self) -> Result<FlowApiClient, ApiError> {
        let config = ApiConfig::resolve(self.token.clone(), self.env)?;
        Ok(FlowApiClient::new(config))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a QSF file to a flow document without creating it
    Convert {
        /// Input QSF file
        input: PathBuf,

        /// Flow name (default: survey name)
        #[arg(short, long)]
        name: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Don't fetch the language catalog
        #[arg(long)]
        offline: bool,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Show question counts of a QSF file
    Stats {
        /// Input QSF file
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Convert a QSF file and create the flow on the platform
    Publish {
        /// Input QSF file
        input: PathBuf,

        /// Flow name (default: survey name)
        #[arg(short, long)]
        name: Option<String>,

        /// Also write the sent flow document
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Create a link campaign and attach a flow to it
    Campaign {
        /// Campaign name
        #[arg(short, long)]
        name: String,

        /// Flow to attach
        #[arg(long)]
        flow_id: String,

        #[command(flatten)]
        api: ApiArgs,
    },

    /// Reshape a response export into a bulk import file
    Reshape {
        /// Input CSV file
        input: PathBuf,

        /// Node id stamped on every row
        #[arg(long)]
        node_id: String,

        /// Flow id stamped on every row
        #[arg(long)]
        flow_id: String,

        /// Language stamped on every row
        #[arg(long, default_value = "EN")]
        language: String,

        /// Column mapping `column=key` (repeatable). Without it, columns
        /// named like a question key of --flow are mapped to themselves.
        #[arg(short, long = "map", value_name = "COLUMN=KEY")]
        maps: Vec<String>,

        /// Flow document whose question keys drive auto-mapping
        #[arg(long)]
        flow: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the question keys of a flow document
    Keys {
        /// Flow JSON file
        input: PathBuf,
    },

    /// Check a flow document against the flow schema
    Validate {
        /// Flow JSON file
        input: PathBuf,
    },

    /// List the platform's language catalog
    Languages {
        #[command(flatten)]
        api: ApiArgs,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        #[command(flatten)]
        api: ApiArgs,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert { input, name, output, offline, api } => {
            cmd_convert(&input, name, output.as_deref(), offline, &api).await
        }

        Commands::Stats { input, json } => cmd_stats(&input, json),

        Commands::Publish { input, name, output, api } => {
            cmd_publish(&input, name, output.as_deref(), &api).await
        }

        Commands::Campaign { name, flow_id, api } => cmd_campaign(&name, &flow_id, &api).await,

        Commands::Reshape {
            input,
            node_id,
            flow_id,
            language,
            maps,
            flow,
            output,
        } => {
            let context = ImportContext { node_id, flow_id, language };
            cmd_reshape(&input, context, &maps, flow.as_deref(), output.as_deref())
        }

        Commands::Keys { input } => cmd_keys(&input),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Languages { api } => cmd_languages(&api).await,

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Serve { port, api } => cmd_serve(port, &api).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn flow_options(survey: &SurveyDocument, name: Option<String>) -> FlowOptions {
    match name {
        Some(name) => FlowOptions::new(name),
        None => FlowOptions::for_survey(survey),
    }
}

async fn cmd_convert(
    input: &Path,
    name: Option<String>,
    output: Option<&Path>,
    offline: bool,
    api: &ApiArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let survey = SurveyDocument::from_path(input)?;

    let catalog = if offline {
        LanguageCatalog::new()
    } else {
        match api.client() {
            Ok(client) => load_catalog(&client).await,
            Err(e) => {
                eprintln!("   ⚠️  No language catalog ({}), language ids left empty", e);
                LanguageCatalog::new()
            }
        }
    };

    let result = convert_survey(&survey, &catalog, &flow_options(&survey, name))?;

    let json = serde_json::to_string_pretty(&result.flow)?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done! Keys: {}", result.question_keys.join(", "));
    Ok(())
}

fn cmd_stats(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let survey = SurveyDocument::from_path(input)?;
    let stats = aggregate(&survey);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("📊 {} ({})\n", survey.name(), survey.language());
    for (label, count) in stats.buckets() {
        println!("   {:<26} {:>4}", label, count);
    }
    Ok(())
}

async fn cmd_publish(
    input: &Path,
    name: Option<String>,
    output: Option<&Path>,
    api: &ApiArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let survey = SurveyDocument::from_path(input)?;

    let client = api.client()?;
    let session = client.complete_login().await?;
    eprintln!("   Account: {} ({})", session.account.name, session.account.id);

    let options = flow_options(&survey, name).with_parent_node(&session.account.id);
    let outcome = publish_survey(&client, client.config(), &survey, &options, &session.node.id).await?;

    if let Some(path) = output {
        fs::write(path, serde_json::to_string_pretty(&outcome.flow)?)?;
        eprintln!("   💾 Flow saved to: {}", path.display());
    }

    eprintln!("\n✨ Flow created");
    println!("{}", outcome.flow_id);
    eprintln!("   Dashboard: {}", outcome.dashboard_url);
    Ok(())
}

async fn cmd_campaign(name: &str, flow_id: &str, api: &ApiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = api.client()?;
    let session = client.complete_login().await?;

    let outcome = create_campaign(&client, client.config(), name, &session.node.id, flow_id).await?;

    eprintln!("\n✨ Campaign ready");
    println!("{}", outcome.channel_id);
    eprintln!("   Survey link: {}", outcome.survey_url);
    Ok(())
}

fn cmd_reshape(
    input: &Path,
    context: ImportContext,
    maps: &[String],
    flow: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let mapping = if maps.is_empty() {
        None
    } else {
        let mut mapping = ColumnMapping::new();
        for pair in maps {
            let (column, key) = ColumnMapping::parse_pair(pair)
                .ok_or_else(|| format!("Invalid mapping '{}', expected COLUMN=KEY", pair))?;
            mapping.assign(column, key);
        }
        Some(mapping)
    };

    let question_keys = match flow {
        Some(path) => FlowDocument::from_path(path)?.question_keys(),
        None => Vec::new(),
    };

    let bytes = fs::read(input)?;
    let outcome = reshape_responses(&bytes, mapping, &question_keys, &context)?;

    write_output(&outcome.csv, output)?;
    Ok(())
}

fn cmd_keys(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let flow = FlowDocument::from_path(input)?;
    for key in flow.question_keys() {
        println!("{}", key);
    }
    Ok(())
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let content = fs::read_to_string(input)?;
    let flow: Value = serde_json::from_str(&content)?;

    match validate_flow(&flow) {
        Ok(()) => {
            eprintln!("✅ Flow document valid");
            Ok(())
        }
        Err(ValidationError::Schema { errors }) => {
            for err in errors.iter().take(10) {
                eprintln!("   - {}", err);
            }
            if errors.len() > 10 {
                eprintln!("   ... +{}", errors.len() - 10);
            }
            Err(format!("{} schema violations", errors.len()).into())
        }
    }
}

async fn cmd_languages(api: &ApiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = api.client()?;
    let mut languages = client.languages().await?;
    languages.sort_by(|a, b| a.code.cmp(&b.code));

    for language in languages {
        println!("{:>6}  {:<8} {}", language.id, language.code, language.name.unwrap_or_default());
    }
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;
    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

async fn cmd_serve(port: u16, api: &ApiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = match api.client() {
        Ok(client) => Some(client),
        Err(ApiError::MissingToken) => None,
        Err(e) => return Err(e.into()),
    };
    // The server streams logs over SSE; keep the terminal for request errors.
    LOG_BROADCASTER.set_echo(false);
    qsf_flow::server::start_server(port, client).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
