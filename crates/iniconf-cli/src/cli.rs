//! iniconf CLI - inspect sectioned configuration files
//!
//! Usage:
//!   iniconf dump app.cfg --format json
//!   iniconf get app.cfg app1 port
//!   iniconf sections app.cfg
//!   iniconf check app.cfg other.cfg

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use iniconf_core::{Config, ConfigOptions, ReferenceStyle};
use std::path::PathBuf;
use std::process::ExitCode;

/// iniconf - Sectioned configuration files with interpolation
#[derive(Parser)]
#[command(name = "iniconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    references: ReferenceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReferenceArgs {
    /// Interpolation marker style
    #[arg(long, global = true, value_enum, default_value_t = Style::Named)]
    references: Style,

    /// Section that %g(...) markers read from (flag style only)
    #[arg(long, global = true, default_value = "global")]
    global_section: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Style {
    /// %section(key) and %local(key)
    Named,
    /// %g(key) and %l(key)
    Flag,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved configuration
    Dump {
        /// Configuration file
        file: PathBuf,

        /// Merge all sections into one map (fails on duplicate keys)
        #[arg(long)]
        flat: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print a single option value
    Get {
        /// Configuration file
        file: PathBuf,

        /// Section name
        section: String,

        /// Option name
        option: String,

        /// Value to print if the option is missing
        #[arg(short, long)]
        default: Option<String>,
    },

    /// List section names
    Sections {
        /// Configuration file
        file: PathBuf,
    },

    /// Parse files and report whether each one is valid
    Check {
        /// Configuration file(s) to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = ConfigOptions::with_references(cli.references.style());

    match cli.command {
        Commands::Dump { file, flat, format } => cmd_dump(&options, file, flat, format),
        Commands::Get {
            file,
            section,
            option,
            default,
        } => cmd_get(&options, file, &section, &option, default),
        Commands::Sections { file } => cmd_sections(&options, file),
        Commands::Check { files } => cmd_check(&options, files),
    }
}

impl ReferenceArgs {
    fn style(&self) -> ReferenceStyle {
        match self.references {
            Style::Named => ReferenceStyle::Named,
            Style::Flag => ReferenceStyle::flag(self.global_section.clone()),
        }
    }
}

fn load_config(options: &ConfigOptions, file: &PathBuf) -> Result<Config, String> {
    Config::load_with_options(file, options)
        .map_err(|e| format!("Failed to load {}: {}", file.display(), e))
}

fn cmd_dump(options: &ConfigOptions, file: PathBuf, flat: bool, format: Format) -> ExitCode {
    let config = match load_config(options, &file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let rendered = if flat {
        match config.to_flat_map() {
            Ok(map) => render(&map, format, |out| {
                for (option, value) in &map {
                    out.push_str(&format!("{} = {}\n", option, value));
                }
            }),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                return ExitCode::from(1);
            }
        }
    } else {
        render(&config, format, |out| {
            for (section, options) in config.iter() {
                out.push_str(&format!("[{}]\n", section));
                for (option, value) in options {
                    out.push_str(&format!("{} = {}\n", option, value));
                }
            }
        })
    };

    match rendered {
        Ok(content) => {
            print!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn render<T, F>(value: &T, format: Format, text: F) -> Result<String, String>
where
    T: serde::Serialize,
    F: FnOnce(&mut String),
{
    match format {
        Format::Json => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        Format::Text => {
            let mut out = String::new();
            text(&mut out);
            Ok(out)
        }
    }
}

fn cmd_get(
    options: &ConfigOptions,
    file: PathBuf,
    section: &str,
    option: &str,
    default: Option<String>,
) -> ExitCode {
    let config = match load_config(options, &file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    match config.get_option(section, option) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(default_val) = default {
                println!("{}", default_val);
                ExitCode::SUCCESS
            } else {
                eprintln!("{}: {}", "Error".red(), e);
                ExitCode::from(1)
            }
        }
    }
}

fn cmd_sections(options: &ConfigOptions, file: PathBuf) -> ExitCode {
    match load_config(options, &file) {
        Ok(config) => {
            for name in config.section_names() {
                println!("{}", name);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.red());
            ExitCode::from(2)
        }
    }
}

fn cmd_check(options: &ConfigOptions, files: Vec<PathBuf>) -> ExitCode {
    let mut all_valid = true;

    for file in files {
        match Config::load_with_options(&file, options) {
            Ok(config) => {
                println!(
                    "{} {}: {} section(s)",
                    "✓".green(),
                    file.display(),
                    config.len()
                );
            }
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                all_valid = false;
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
