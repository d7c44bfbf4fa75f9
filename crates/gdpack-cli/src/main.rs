//! gdpack - addon dependency manager for Godot projects
//!
//! Usage:
//!   gdpack add <URI>        # Record a dependency
//!   gdpack replace <NAME> <URI> --target <TARGET>
//!                           # Stand in for an addon in a target
//!   gdpack remove <NAME>    # Drop a dependency
//!   gdpack list             # Show effective dependencies
//!   gdpack install          # Install dependencies into ./addons

mod uri;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gdpack_core::install::{InstallOptions, InstallOutcome, Installer};
use gdpack_core::manifest::{self, Environment, Manifest, ManifestStore, Query};
use gdpack_core::project::{JSON_MANIFEST_FILE_NAME, ProjectLayout};
use gdpack_core::spec::{GitSource, Source, Spec};

#[derive(Parser)]
#[command(name = "gdpack")]
#[command(about = "Addon dependency manager for Godot projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProjectArgs {
    /// A path to the Godot project containing the manifest
    #[arg(long, short, value_name = "PATH")]
    path: Option<PathBuf>,
}

impl ProjectArgs {
    fn layout(&self) -> Result<ProjectLayout> {
        let layout = match &self.path {
            Some(path) => ProjectLayout::new(path),
            None => ProjectLayout::current_dir()?,
        };

        // Prefer an existing JSON manifest over creating a TOML one.
        let json = layout.root().join(JSON_MANIFEST_FILE_NAME);
        if !layout.manifest_path().exists() && json.exists() {
            return Ok(layout.with_manifest_file(JSON_MANIFEST_FILE_NAME));
        }

        Ok(layout)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty manifest in the project
    Init {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Add the dependency at the provided URI (a filepath, a git repository
    /// URL or `asset:<ID>`)
    Add(Box<AddArgs>),

    /// Add a dependency that replaces the addon NAME in the given targets
    Replace(Box<ReplaceArgs>),

    /// Remove a dependency
    #[command(alias = "rm")]
    Remove {
        /// Name of the addon to remove
        name: String,

        /// Remove the dependency only for TARGET (can be specified more than once)
        #[arg(long, short, value_name = "TARGET")]
        target: Vec<String>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// List the effective dependencies
    #[command(alias = "ls")]
    List {
        /// List development dependencies
        #[arg(long, short, alias = "dev")]
        development: bool,

        /// Layer the dependencies of TARGET over the defaults
        #[arg(long, short, value_name = "TARGET")]
        target: Option<String>,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Install addon dependencies into the project's 'addons' directory
    #[command(alias = "i")]
    Install {
        /// Don't install development dependencies
        #[arg(long, alias = "prod")]
        production: bool,

        /// Install dependencies for TARGET
        #[arg(long, short, value_name = "TARGET")]
        target: Option<String>,

        /// Replace addons that are already installed
        #[arg(long, short)]
        force: bool,

        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(Args)]
#[command(group(ArgGroup::new("git-version").args(["branch", "tag", "commit"])))]
struct SourceArgs {
    /// Dependency location
    uri: String,

    /// Addon name; if omitted, the repository name or path base name is used
    #[arg(long, short)]
    name: Option<String>,

    /// Use a git BRANCH version (only used with a git repository URI)
    #[arg(long)]
    branch: Option<String>,

    /// Use a git TAG version (only used with a git repository URI)
    #[arg(long)]
    tag: Option<String>,

    /// Use a git COMMIT version (only used with a git repository URI)
    #[arg(long)]
    commit: Option<String>,

    /// Version pin for asset library dependencies
    #[arg(long = "version", value_name = "VERSION")]
    pin: Option<String>,
}

impl SourceArgs {
    /// The addon name and spec described by the arguments.
    fn resolve(&self) -> Result<(String, Spec)> {
        let mut source = uri::parse_source(&self.uri)?;

        let has_git_version = self.branch.is_some() || self.tag.is_some() || self.commit.is_some();
        match &mut source {
            Source::Git(git) => {
                *git = GitSource::from_parts(
                    git.uri.clone(),
                    self.branch.clone(),
                    self.tag.clone(),
                    self.commit.clone(),
                )?;
            }
            _ if has_git_version => {
                anyhow::bail!(
                    "--branch, --tag and --commit can only be used with a git repository URI"
                );
            }
            _ => {}
        }

        let name = match self.name.clone() {
            Some(name) => name,
            None => source.default_name().ok_or_else(|| {
                anyhow::anyhow!("Could not infer an addon name from '{}'; use --name", self.uri)
            })?,
        };
        manifest::validate_name(&name)?;

        let mut spec = Spec::from_source(source);
        spec.version = self.pin.clone();
        spec.validate()?;

        Ok((name, spec))
    }
}

#[derive(Args)]
struct AddArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Add a development-only dependency (will not be propagated to
    /// dependents' installs)
    #[arg(long, short, alias = "dev")]
    development: bool,

    /// Add the dependency only for TARGET (can be specified more than once)
    #[arg(long, short, value_name = "TARGET")]
    target: Vec<String>,

    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Args)]
struct ReplaceArgs {
    /// Name of the addon to replace
    #[arg(value_name = "NAME")]
    addon: String,

    #[command(flatten)]
    source: SourceArgs,

    /// Replace a development-only dependency
    #[arg(long, short, alias = "dev")]
    development: bool,

    /// Replace the addon only for TARGET (can be specified more than once)
    #[arg(long, short, value_name = "TARGET", required = true)]
    target: Vec<String>,

    #[command(flatten)]
    project: ProjectArgs,
}

fn environment(development: bool) -> Environment {
    if development {
        Environment::Development
    } else {
        Environment::Production
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gdpack=info,gdpack_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { project } => run_init(project),
        Commands::Add(args) => run_add(*args),
        Commands::Replace(args) => run_replace(*args),
        Commands::Remove {
            name,
            target,
            project,
        } => run_remove(name, target, project),
        Commands::List {
            development,
            target,
            project,
        } => run_list(development, target, project),
        Commands::Install {
            production,
            target,
            force,
            project,
        } => run_install(production, target, force, project),
    }
}

fn run_init(project: ProjectArgs) -> Result<()> {
    let store = ManifestStore::for_project(&project.layout()?);
    if store.exists() {
        anyhow::bail!("Manifest already exists: {}", store.path().display());
    }

    store.save(&Manifest::new())?;
    println!("Created {}", store.path().display());
    Ok(())
}

fn run_add(args: AddArgs) -> Result<()> {
    let (name, spec) = args.source.resolve()?;
    let env = environment(args.development);

    let store = ManifestStore::for_project(&args.project.layout()?);
    let mut manifest = store.load()?;
    manifest.add_to_targets(&name, &spec, env, &args.target)?;
    store
        .save(&manifest)
        .with_context(|| format!("Failed to save manifest: {}", store.path().display()))?;

    println!("Added {} dependency '{}'", env, name);
    Ok(())
}

fn run_replace(args: ReplaceArgs) -> Result<()> {
    let (name, spec) = args.source.resolve()?;
    if name == args.addon {
        anyhow::bail!("Addon '{}' cannot replace itself", name);
    }

    let env = environment(args.development);
    let spec = spec.replacing(&args.addon);

    let store = ManifestStore::for_project(&args.project.layout()?);
    let mut manifest = store.load()?;
    manifest.add_to_targets(&name, &spec, env, &args.target)?;
    store
        .save(&manifest)
        .with_context(|| format!("Failed to save manifest: {}", store.path().display()))?;

    println!(
        "Added {} dependency '{}' replacing '{}' in {}",
        env,
        name,
        args.addon,
        args.target.join(", ")
    );
    Ok(())
}

fn run_remove(name: String, targets: Vec<String>, project: ProjectArgs) -> Result<()> {
    let store = ManifestStore::for_project(&project.layout()?);
    let mut manifest = store.load()?;

    if !manifest.remove_from_targets(&name, &targets)? {
        println!("No dependency named '{}'", name);
        return Ok(());
    }

    store
        .save(&manifest)
        .with_context(|| format!("Failed to save manifest: {}", store.path().display()))?;

    println!("Removed dependency '{}'", name);
    Ok(())
}

fn run_list(development: bool, target: Option<String>, project: ProjectArgs) -> Result<()> {
    let store = ManifestStore::for_project(&project.layout()?);
    let manifest = store.load()?;

    let query = Query {
        environment: environment(development),
        target,
    };

    let deps = manifest.list(&query)?;
    if deps.is_empty() {
        println!("No dependencies");
        return Ok(());
    }

    for dep in deps {
        println!("{:<24} {}", dep.name, describe(&dep.spec));
    }

    Ok(())
}

fn run_install(
    production: bool,
    target: Option<String>,
    force: bool,
    project: ProjectArgs,
) -> Result<()> {
    let layout = project.layout()?;
    let manifest = ManifestStore::for_project(&layout).load()?;

    let options = InstallOptions {
        target,
        production_only: production,
        force,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    let installed = runtime.block_on(async {
        let cancel = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            tracing::warn!("interrupted; aborting install");
        };

        Installer::new(layout.clone())
            .install(&manifest, &options, cancel)
            .await
    })?;

    for addon in installed {
        match addon.outcome {
            InstallOutcome::Skipped { reason } => println!("Skipped {}: {}", addon.name, reason),
            _ => println!("Installed {} -> {}", addon.name, addon.path.display()),
        }
    }

    Ok(())
}

fn describe(spec: &Spec) -> String {
    let source = match &spec.source {
        Source::Asset(asset) => format!("asset {}", asset.id),
        Source::Git(git) => format!("{} ({})", git.uri, git.reference),
        Source::Local(local) => local.path.display().to_string(),
    };

    let source = match &spec.version {
        Some(version) => format!("{} @ {}", source, version),
        None => source,
    };

    match &spec.replace {
        Some(name) => format!("{} (replaces {})", source, name),
        None => source,
    }
}
