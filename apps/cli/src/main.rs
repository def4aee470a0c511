use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use novelmerge_core::read_text;
use novelmerge_project::{
    AddOptions, AppendOutcome, NameConflictPolicy, ProjectContext, Workspace,
};
use novelmerge_settings::{HistoryStore, Preferences, PreferencesStore};

const DATA_DIR_NAME: &str = "novelmerge";

#[derive(Parser)]
#[command(
    name = "novelmerge-cli",
    about = "Split novels into chapters, edit them, and merge them back",
    author,
    version
)]
struct Cli {
    /// 資料目錄；預設為系統資料目錄下的 `novelmerge`。 / Data directory (defaults to the platform data dir + `novelmerge`).
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,
    /// 輸出處理過程。 / Log progress at info level.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 開啟小說並列出章節。 / Open a novel and list its chapters.
    Open(NovelArgs),
    /// 列出章節順序。 / Print the chapter order.
    List(NovelArgs),
    /// 顯示章節內文。 / Print one chapter's body.
    Show(ChapterArgs),
    /// 替換章節內文。 / Replace one chapter's body.
    Edit(EditArgs),
    /// 由其他檔案新增章節。 / Add chapters from other files.
    Add(AddArgs),
    /// 刪除章節。 / Delete a chapter.
    Delete(ChapterArgs),
    /// 移動章節到新位置。 / Move a chapter to a new position.
    Move(MoveArgs),
    /// 合併章節並覆寫原始檔。 / Merge chapters back into the novel file.
    Save(NovelArgs),
    /// 列出開啟紀錄。 / List recently opened novels.
    History,
    /// 檢視或修改偏好設定。 / View or change preferences.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
struct NovelArgs {
    /// 小說檔案。 / Novel file.
    novel: PathBuf,
}

#[derive(Args)]
struct ChapterArgs {
    novel: PathBuf,
    /// 章節名稱。 / Chapter name.
    chapter: String,
}

#[derive(Args)]
struct EditArgs {
    novel: PathBuf,
    chapter: String,
    /// 新的內文。 / New body text.
    #[arg(long, conflicts_with = "from_file", required_unless_present = "from_file")]
    content: Option<String>,
    /// 從檔案讀取新的內文。 / Read the new body from a file.
    #[arg(long, value_name = "FILE")]
    from_file: Option<PathBuf>,
}

#[derive(Args)]
struct AddArgs {
    novel: PathBuf,
    /// 要加入的檔案或資料夾。 / Files or directories to add.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// 以來源檔名作為章節名前綴。 / Prefix chapter names with the source file name.
    #[arg(long, conflicts_with = "no_prefix")]
    prefix: bool,
    /// 不加前綴（覆蓋偏好設定）。 / Do not prefix, overriding preferences.
    #[arg(long)]
    no_prefix: bool,
    /// 略過內文與既有章節相同者。 / Skip chapters whose body matches an existing chapter.
    #[arg(long)]
    skip_identical: bool,
    /// 同名章節直接覆寫而非另存。 / Overwrite same-name chapters instead of adding a suffixed copy.
    #[arg(long)]
    overwrite: bool,
    /// 沒有章節標題的檔案整份視為一章。 / Add a file without headings as a single chapter.
    #[arg(long)]
    whole_file: bool,
}

#[derive(Args)]
struct MoveArgs {
    novel: PathBuf,
    chapter: String,
    /// 新位置（從 1 起算）。 / New position, counting from 1.
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    position: u64,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// 顯示目前偏好設定。 / Print the current preferences as JSON.
    Show,
    /// 修改單一偏好設定。 / Change one preference.
    Set(ConfigSetArgs),
}

#[derive(Args)]
struct ConfigSetArgs {
    key: ConfigKey,
    /// 新值；`projects-dir` 給空字串代表還原預設。 / New value; an empty `projects-dir` restores the default.
    value: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ConfigKey {
    HistoryCapacity,
    ProjectsDir,
    PrefixAddedChapters,
    SkipIdenticalChapters,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        data_dir,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);

    let data_dir = resolve_data_dir(data_dir)?;
    log::debug!("using data directory {}", data_dir.display());
    let preferences = load_preferences(&data_dir)?;
    let workspace = Workspace::from_data_dir(&data_dir, preferences.preferences());

    match command {
        Commands::Open(args) => {
            let context = open_novel(workspace, &args.novel)?;
            for name in context.missing_chapters() {
                println!("Missing chapter file skipped: {name}");
            }
            println!("Code: {}", context.code());
            print_order(&context);
            Ok(())
        }
        Commands::List(args) => {
            print_order(&open_novel(workspace, &args.novel)?);
            Ok(())
        }
        Commands::Show(args) => execute_show(workspace, args),
        Commands::Edit(args) => execute_edit(workspace, args),
        Commands::Add(args) => execute_add(workspace, preferences.preferences(), args),
        Commands::Delete(args) => execute_delete(workspace, args),
        Commands::Move(args) => execute_move(workspace, args),
        Commands::Save(args) => execute_save(workspace, args),
        Commands::History => execute_history(&workspace),
        Commands::Config(ConfigCommand::Show) => {
            let json = serde_json::to_string_pretty(preferences.preferences())
                .context("failed to serialize preferences")?;
            println!("{json}");
            Ok(())
        }
        Commands::Config(ConfigCommand::Set(args)) => {
            execute_config_set(preferences, &workspace, args)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn execute_show(workspace: Workspace, args: ChapterArgs) -> Result<()> {
    let context = open_novel(workspace, &args.novel)?;
    let Some(content) = context.content(&args.chapter) else {
        bail!("chapter '{}' does not exist", args.chapter);
    };
    println!("{content}");
    Ok(())
}

fn execute_edit(workspace: Workspace, args: EditArgs) -> Result<()> {
    let content = match (args.content, args.from_file) {
        (Some(content), _) => content,
        (None, Some(path)) => {
            read_text(&path)
                .with_context(|| format!("failed to read {}", path.display()))?
                .text
        }
        (None, None) => bail!("either --content or --from-file is required"),
    };
    let mut context = open_novel(workspace, &args.novel)?;
    context
        .update_content(&args.chapter, &content)
        .with_context(|| format!("failed to update chapter '{}'", args.chapter))?;
    println!("Updated {}", args.chapter);
    Ok(())
}

fn execute_add(workspace: Workspace, preferences: &Preferences, args: AddArgs) -> Result<()> {
    let options = AddOptions {
        include_filename_prefix: !args.no_prefix
            && (args.prefix || preferences.prefix_added_chapters),
        skip_identical: args.skip_identical || preferences.skip_identical_chapters,
        on_conflict: if args.overwrite {
            NameConflictPolicy::Overwrite
        } else {
            NameConflictPolicy::Deduplicate
        },
        whole_file_fallback: args.whole_file,
    };

    let mut context = open_novel(workspace, &args.novel)?;
    let added = context
        .add_chapters(&args.inputs, &options)
        .context("failed to add chapters")?;
    for file in added {
        for outcome in file.outcomes {
            match outcome {
                AppendOutcome::Added(name) => println!("Added {name}"),
                AppendOutcome::Overwritten(name) => println!("Overwrote {name}"),
                AppendOutcome::SkippedIdentical { heading, matches } => {
                    println!("Skipped {heading} (same as {matches})")
                }
            }
        }
    }
    Ok(())
}

fn execute_delete(workspace: Workspace, args: ChapterArgs) -> Result<()> {
    let mut context = open_novel(workspace, &args.novel)?;
    if !context.delete_selected(&args.chapter)? {
        bail!("chapter '{}' does not exist", args.chapter);
    }
    println!("Deleted {}", args.chapter);
    Ok(())
}

fn execute_move(workspace: Workspace, args: MoveArgs) -> Result<()> {
    let mut context = open_novel(workspace, &args.novel)?;
    let index = usize::try_from(args.position - 1).context("position is too large")?;
    context
        .reorder(&args.chapter, index)
        .with_context(|| format!("failed to move chapter '{}'", args.chapter))?;
    print_order(&context);
    Ok(())
}

fn execute_save(workspace: Workspace, args: NovelArgs) -> Result<()> {
    let mut context = open_novel(workspace, &args.novel)?;
    let code = context
        .save_all()
        .with_context(|| format!("failed to save {}", args.novel.display()))?;
    println!("Saved {} with code {code}", args.novel.display());
    Ok(())
}

fn execute_history(workspace: &Workspace) -> Result<()> {
    let history = workspace.load_history()?;
    for entry in history.list() {
        println!(
            "{}\t{}\t{}",
            entry.code,
            entry.last_modified,
            entry.path.display()
        );
    }
    Ok(())
}

fn execute_config_set(
    mut preferences: PreferencesStore,
    workspace: &Workspace,
    args: ConfigSetArgs,
) -> Result<()> {
    let value = args.value.trim();
    match args.key {
        ConfigKey::HistoryCapacity => {
            let capacity: usize = value
                .parse()
                .with_context(|| format!("'{value}' is not a valid capacity"))?;
            preferences.update(|prefs| prefs.history_capacity = capacity)?;
            // Stored history never exceeds the configured cap.
            let capacity = preferences.preferences().history_capacity;
            HistoryStore::load(workspace.history_path(), capacity)?.set_capacity(capacity)?;
        }
        ConfigKey::ProjectsDir => {
            let dir = (!value.is_empty()).then(|| PathBuf::from(value));
            preferences.update(|prefs| prefs.projects_dir = dir.clone())?;
        }
        ConfigKey::PrefixAddedChapters => {
            let enabled = parse_bool(value)?;
            preferences.update(|prefs| prefs.prefix_added_chapters = enabled)?;
        }
        ConfigKey::SkipIdenticalChapters => {
            let enabled = parse_bool(value)?;
            preferences.update(|prefs| prefs.skip_identical_chapters = enabled)?;
        }
    }
    println!("Updated {}", preferences.path().display());
    Ok(())
}

fn open_novel(workspace: Workspace, path: &Path) -> Result<ProjectContext> {
    ProjectContext::open(workspace, path)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn print_order(context: &ProjectContext) {
    for (index, name) in context.chapter_order().iter().enumerate() {
        println!("{:>4}  {name}", index + 1);
    }
}

fn load_preferences(data_dir: &Path) -> Result<PreferencesStore> {
    let path = Workspace::preferences_path(data_dir);
    PreferencesStore::load(&path)
        .with_context(|| format!("failed to load preferences from {}", path.display()))
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
    let path = match data_dir {
        Some(path) => path,
        None => dirs::data_dir()
            .map(|dir| dir.join(DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(".").join(format!(".{DATA_DIR_NAME}"))),
    };
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("determine current directory")?
            .join(path)
    };
    fs::create_dir_all(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    Ok(path)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("'{other}' is not a boolean (use true or false)"),
    }
}
