use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use storage::config::{CONFIG_FILE, SurveyConfig};
use storage::question_file::{QuestionFileFormat, save_questions};
use survey_core::model::{QuestionDraft, QuestionSet};

#[derive(Debug, Clone)]
struct Args {
    root: PathBuf,
    config: PathBuf,
    format: QuestionFileFormat,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidFormat { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidFormat { raw } => {
                write!(f, "invalid --format value (expected csv or json): {raw}")
            }
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut root = PathBuf::from("data");
        let mut config = PathBuf::from(CONFIG_FILE);
        let mut format = QuestionFileFormat::Csv;
        let mut now = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--root" => root = PathBuf::from(require_value(&mut args, "--root")?),
                "--config" => config = PathBuf::from(require_value(&mut args, "--config")?),
                "--format" => {
                    let raw = require_value(&mut args, "--format")?;
                    format = match raw.as_str() {
                        "csv" => QuestionFileFormat::Csv,
                        "json" => QuestionFileFormat::Json,
                        _ => return Err(ArgsError::InvalidFormat { raw }),
                    };
                }
                "--now" => {
                    let raw = require_value(&mut args, "--now")?;
                    now = Some(
                        DateTime::parse_from_rfc3339(&raw)
                            .map(|t| t.with_timezone(&Utc))
                            .map_err(|_| ArgsError::InvalidNow { raw })?,
                    );
                }
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            root,
            config,
            format,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --root <dir>              Data directory to create (default: data)");
    eprintln!("  --config <path>           Config file to write (default: config.json)");
    eprintln!("  --format <csv|json>       Sample question file format (default: csv)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
}

fn sample_questions() -> QuestionSet {
    [
        ("あなたの好きな季節は何ですか？", vec!["春", "夏", "秋", "冬"]),
        (
            "普段よく使うプログラミング言語は何ですか？",
            vec!["Python", "JavaScript", "Java", "C++", "その他"],
        ),
        (
            "1日の勉強時間はどのくらいですか？",
            vec!["1時間未満", "1〜2時間", "2〜4時間", "4時間以上"],
        ),
    ]
    .into_iter()
    .filter_map(|(text, choices)| QuestionDraft::new(text, choices).validate().ok())
    .collect()
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let now = args.now.unwrap_or_else(Utc::now);

    let extension = match args.format {
        QuestionFileFormat::Csv => "csv",
        QuestionFileFormat::Json => "json",
    };

    let config = SurveyConfig {
        questions_directory: args.root.join("questions"),
        questions_file: format!("sample_questions.{extension}"),
        log_directory: args.root.join("logs"),
        response_directory: args.root.join("responses"),
        ..SurveyConfig::default()
    };
    config.ensure_directories()?;

    if args.config.exists() {
        println!("config already exists, leaving it alone: {}", args.config.display());
    } else {
        config.save(&args.config)?;
        println!("wrote config: {}", args.config.display());
    }

    let questions_path = config
        .questions_path()
        .expect("seeded config always names a question file");
    if questions_path.exists() {
        println!(
            "sample questions already exist, leaving them alone: {}",
            questions_path.display()
        );
    } else {
        save_questions(&sample_questions(), &questions_path, args.format, now)?;
        println!("wrote sample questions: {}", questions_path.display());
    }

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
