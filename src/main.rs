use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use tracing::{info, warn};

use holiday_portrait_studio::catalog::{option_catalogs, ASPECT_RATIOS};
use holiday_portrait_studio::config::CONFIG;
use holiday_portrait_studio::credentials::{CredentialStore, FileCredentialStore};
use holiday_portrait_studio::llm::media::extension_for_mime;
use holiday_portrait_studio::llm::{GeminiBackend, GeneratedImage};
use holiday_portrait_studio::options::{load_options_file, GenerationOptions};
use holiday_portrait_studio::reference::encode_file;
use holiday_portrait_studio::studio::{person_label, Studio, PERSON_SLOTS};
use holiday_portrait_studio::taxonomy::REGISTRY;
use holiday_portrait_studio::utils::logging::init_logging;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    Themes,
    Options,
    Prompt {
        options: Option<PathBuf>,
        references: usize,
    },
    Generate {
        options: Option<PathBuf>,
        references: Vec<PathBuf>,
        out: PathBuf,
    },
    Edit {
        image: PathBuf,
        instructions: Option<String>,
        people: Vec<(usize, PathBuf)>,
        out: PathBuf,
    },
    Analyze {
        image: PathBuf,
    },
    Login(String),
    Logout,
}

fn usage() -> &'static str {
    "Usage:\n  studio themes\n  studio options\n  studio prompt [--options <file>] [--references <n>]\n  studio generate [--options <file>] [--ref <path>]... --out <path>\n  studio edit --image <path> [--instructions <text>] [--person <n>=<path>]... --out <path>\n  studio analyze --image <path>\n  studio login <api-key>\n  studio logout"
}

fn flag_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> anyhow::Result<&'a str> {
    *index += 1;
    args.get(*index)
        .map(|value| value.as_str())
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

fn parse_person(value: &str) -> anyhow::Result<(usize, PathBuf)> {
    let (person, path) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid --person value: {value} (expected <n>=<path>)"))?;
    let person = person
        .trim()
        .parse::<usize>()
        .map_err(|_| anyhow!("Invalid person number in --person {value}"))?;
    if !(1..=PERSON_SLOTS).contains(&person) {
        return Err(anyhow!("--person must be between 1 and {PERSON_SLOTS}"));
    }
    Ok((person, PathBuf::from(path)))
}

fn parse_args(args: &[String]) -> anyhow::Result<CliCommand> {
    let command = args
        .get(1)
        .map(|value| value.as_str())
        .ok_or_else(|| anyhow!(usage()))?;

    let mut options = None;
    let mut reference_count = 0usize;
    let mut references = Vec::new();
    let mut out = None;
    let mut image = None;
    let mut instructions = None;
    let mut people = Vec::new();

    match command {
        "themes" => return Ok(CliCommand::Themes),
        "options" => return Ok(CliCommand::Options),
        "logout" => return Ok(CliCommand::Logout),
        "login" => {
            let key = args
                .get(2)
                .ok_or_else(|| anyhow!("Missing API key for login"))?;
            return Ok(CliCommand::Login(key.clone()));
        }
        "prompt" | "generate" | "edit" | "analyze" => {}
        "--help" | "-h" | "help" => return Err(anyhow!(usage())),
        other => return Err(anyhow!("Unknown command: {other}\n{}", usage())),
    }

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--options" => {
                options = Some(PathBuf::from(flag_value(args, &mut index, "--options")?));
            }
            "--references" => {
                let value = flag_value(args, &mut index, "--references")?;
                reference_count = value
                    .parse::<usize>()
                    .map_err(|_| anyhow!("Invalid --references value: {value}"))?;
            }
            "--ref" => {
                references.push(PathBuf::from(flag_value(args, &mut index, "--ref")?));
            }
            "--out" => {
                out = Some(PathBuf::from(flag_value(args, &mut index, "--out")?));
            }
            "--image" => {
                image = Some(PathBuf::from(flag_value(args, &mut index, "--image")?));
            }
            "--instructions" => {
                instructions = Some(flag_value(args, &mut index, "--instructions")?.to_string());
            }
            "--person" => {
                people.push(parse_person(flag_value(args, &mut index, "--person")?)?);
            }
            other => {
                return Err(anyhow!("Unknown {command} argument: {other}\n{}", usage()));
            }
        }
        index += 1;
    }

    match command {
        "prompt" => Ok(CliCommand::Prompt {
            options,
            references: reference_count,
        }),
        "generate" => Ok(CliCommand::Generate {
            options,
            references,
            out: out.ok_or_else(|| anyhow!("--out is required"))?,
        }),
        "edit" => Ok(CliCommand::Edit {
            image: image.ok_or_else(|| anyhow!("--image is required"))?,
            instructions,
            people,
            out: out.ok_or_else(|| anyhow!("--out is required"))?,
        }),
        _ => Ok(CliCommand::Analyze {
            image: image.ok_or_else(|| anyhow!("--image is required"))?,
        }),
    }
}

fn load_options(path: Option<&Path>) -> anyhow::Result<GenerationOptions> {
    match path {
        Some(path) => load_options_file(path),
        None => Ok(GenerationOptions::default()),
    }
}

/// Writes the image, using the returned mime type for the extension when the
/// output path has none.
fn write_image(image: &GeneratedImage, out: &Path) -> anyhow::Result<PathBuf> {
    let bytes = image.decode().context("Model returned invalid base64 image data")?;
    let path = if out.extension().is_some() {
        out.to_path_buf()
    } else {
        out.with_extension(extension_for_mime(&image.mime_type))
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn print_themes() {
    for theme in REGISTRY.themes() {
        println!("{theme}");
        for style in REGISTRY.variants_for(theme) {
            println!("  - {style}");
        }
    }
}

fn print_options() {
    for (name, values) in option_catalogs() {
        println!("{name}: {}", values.join(", "));
    }
    let ratios = ASPECT_RATIOS
        .iter()
        .map(|choice| choice.label)
        .collect::<Vec<_>>();
    println!("aspectRatio: {}", ratios.join(", "));
    let people = (1..=PERSON_SLOTS).map(person_label).collect::<Vec<_>>();
    println!(
        "edit people: {} (up to {} references each)",
        people.join(", "),
        CONFIG.max_references_per_person
    );
}

async fn run(command: CliCommand) -> anyhow::Result<()> {
    let credentials = FileCredentialStore::from_config();
    match command {
        CliCommand::Themes => print_themes(),
        CliCommand::Options => print_options(),
        CliCommand::Prompt {
            options,
            references,
        } => {
            let options = load_options(options.as_deref())?;
            println!("{}", holiday_portrait_studio::prompt::build(&options, references));
        }
        CliCommand::Login(key) => {
            credentials.set(&key)?;
            println!("API key saved to {}", credentials.path().display());
        }
        CliCommand::Logout => {
            credentials.clear()?;
            println!("API key removed");
        }
        CliCommand::Generate {
            options,
            references,
            out,
        } => {
            let mut studio = Studio::new(GeminiBackend, credentials);
            studio.generator.options = load_options(options.as_deref())?;
            for err in studio.generator.references.add_files(references.as_slice()).await {
                warn!("Reference skipped: {}", err);
            }
            if studio.generator.references.len() < references.len() {
                println!(
                    "Using {} of {} reference images",
                    studio.generator.references.len(),
                    references.len()
                );
            }
            let image = studio.generate().await?;
            let path = write_image(&image, &out)?;
            info!("Generated portrait written to {}", path.display());
            println!("{}", path.display());
        }
        CliCommand::Edit {
            image,
            instructions,
            people,
            out,
        } => {
            let mut studio = Studio::new(GeminiBackend, credentials);
            studio.editor.set_source(encode_file(image).await?);
            for (person, path) in people {
                let reference = encode_file(path).await?;
                studio.editor.add_reference(person, reference)?;
            }
            match instructions {
                Some(instructions) => studio.editor.set_instructions(instructions),
                None => {
                    let description = studio.analyze().await?;
                    println!("Instructions from analysis:\n{description}\n");
                }
            }
            let edited = studio.edit().await?;
            let path = write_image(&edited, &out)?;
            info!("Edited image written to {}", path.display());
            println!("{}", path.display());
        }
        CliCommand::Analyze { image } => {
            let mut studio = Studio::new(GeminiBackend, credentials);
            studio.editor.set_source(encode_file(image).await?);
            println!("{}", studio.analyze().await?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;
    run(command).await
}
