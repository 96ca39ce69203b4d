use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use codeprompt_contracts::catalog::{
    TargetKind, ANALYSIS_GOALS, DIALOGUE_LANGUAGES, SEGMENT_SECONDS, SOCIAL_PLATFORMS,
};
use codeprompt_contracts::chat::{parse_intent, Intent, STUDIO_HELP_COMMANDS};
use codeprompt_contracts::features::{FeatureTag, Identity};
use codeprompt_contracts::results::{GenerationResult, VideoOutputFormat};
use codeprompt_engine::access::{RemoteRegistration, RemoteSync};
use codeprompt_engine::admin::{contact_link, AdminConsole};
use codeprompt_engine::controller::{DeniedNotice, InfluencerChoice, RemixNarration, TabInputs};
use codeprompt_engine::media::MediaFile;
use codeprompt_engine::templates::{RemixGoal, VideoType};
use codeprompt_engine::{AppConfig, StudioController, SubmitOutcome, Tab, TabState};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "codeprompt", version, about = "Prompt-writing studio for generative AI tools")]
struct Cli {
    /// TOML config file. Defaults to the per-user config location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Never call the remote model, even when an API key is set.
    #[arg(long, global = true)]
    dryrun: bool,
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive session driven by /commands.
    Studio(StudioArgs),
    Text(TextArgs),
    Image(ImageArgs),
    ImageEdit(ImageEditArgs),
    Video(VideoArgs),
    Influencer(InfluencerArgs),
    Remix(RemixArgs),
    Analyze(AnalyzeArgs),
    Captions(CaptionsArgs),
    Register(RegisterArgs),
    Status,
    Targets,
    Idea,
    Admin(AdminArgs),
}

#[derive(Debug, Args)]
struct StudioArgs {
    #[arg(long, default_value = "text")]
    tab: String,
}

#[derive(Debug, Args)]
struct TextArgs {
    #[arg(long)]
    topic: String,
    #[arg(long)]
    target: Option<String>,
}

#[derive(Debug, Args)]
struct ImageArgs {
    /// Idea to expand. Ignored when --image is given.
    #[arg(long, default_value = "")]
    instruction: String,
    /// Describe this image instead of expanding an idea.
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long)]
    target: Option<String>,
}

#[derive(Debug, Args)]
struct ImageEditArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    instruction: String,
    #[arg(long)]
    target: Option<String>,
}

#[derive(Debug, Args)]
struct SheetArgs {
    #[arg(long, conflicts_with = "sheet_file")]
    sheet: Option<String>,
    #[arg(long)]
    sheet_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct VideoArgs {
    #[arg(long)]
    idea: String,
    #[arg(long)]
    target: Option<String>,
    #[arg(long, default_value_t = SEGMENT_SECONDS)]
    duration: u32,
    /// plain or structured
    #[arg(long, default_value = "plain")]
    format: String,
    #[arg(long)]
    language: Option<String>,
    /// normal or commercial
    #[arg(long, default_value = "normal")]
    video_type: String,
    #[arg(long)]
    on_screen_text: bool,
    #[arg(long)]
    background: Option<PathBuf>,
    #[arg(long)]
    logo: Option<PathBuf>,
    #[command(flatten)]
    sheet: SheetArgs,
    /// Seconds of story to append after the first generation.
    #[arg(long)]
    continue_for: Option<u32>,
}

#[derive(Debug, Args)]
struct InfluencerArgs {
    #[arg(long)]
    description: Option<String>,
    /// Reference photo. Alone, it is turned into a sheet as-is.
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RemixArgs {
    #[arg(long)]
    video: PathBuf,
    /// views, interaction or followers
    #[arg(long, default_value = "views")]
    goal: String,
    /// voice_only, create_influencer or use_influencer
    #[arg(long, default_value = "voice_only")]
    narration: String,
    #[command(flatten)]
    sheet: SheetArgs,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    #[arg(long, default_value = "instagram-reels")]
    platform: String,
    #[arg(long)]
    username: String,
    #[arg(long, default_value = "views")]
    goal: String,
    #[arg(long = "screenshot", required = true)]
    screenshots: Vec<PathBuf>,
    /// Also build the follow-up action plan.
    #[arg(long)]
    plan: bool,
}

#[derive(Debug, Args)]
struct CaptionsArgs {
    #[arg(long)]
    idea: String,
    #[arg(long, default_value = "tiktok")]
    platform: String,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    whatsapp: String,
    #[arg(long)]
    email: String,
}

#[derive(Debug, Args)]
struct AdminArgs {
    #[arg(long, conflicts_with = "url")]
    password: Option<String>,
    /// Link carrying the admin key, or just its query string.
    #[arg(long)]
    url: Option<String>,
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    List,
    SetLimit {
        #[arg(long)]
        id: String,
        #[arg(long, allow_negative_numbers = true)]
        limit: i64,
    },
}

const EXIT_DENIED: i32 = 2;

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("codeprompt error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = ["CODEPROMPT_LOG", "RUST_LOG"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|value| !value.trim().is_empty()))
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = Some(dir);
    }
    debug!(data_dir = %config.resolved_data_dir().display(), "config loaded");

    match cli.command {
        Command::Admin(args) => return run_admin(&config, args),
        Command::Targets => {
            print_targets();
            return Ok(0);
        }
        _ => {}
    }

    let mut controller = StudioController::from_config(&config, cli.dryrun);
    match cli.command {
        Command::Studio(args) => run_studio(&mut controller, &args.tab),
        Command::Text(args) => {
            controller.switch_tab(Tab::Text);
            controller.edit(|inputs| {
                inputs.topic = args.topic;
                inputs.target = args.target;
            });
            Ok(submit_and_print(&mut controller))
        }
        Command::Image(args) => {
            let image = args.image.as_deref().map(MediaFile::from_path).transpose()?;
            controller.switch_tab(Tab::Image);
            controller.edit(|inputs| {
                inputs.image.use_upload = image.is_some();
                inputs.image.image = image;
                inputs.image.instruction = args.instruction;
                inputs.target = args.target;
            });
            Ok(submit_and_print(&mut controller))
        }
        Command::ImageEdit(args) => {
            let image = MediaFile::from_path(&args.image)?;
            controller.switch_tab(Tab::ImageEdit);
            controller.edit(|inputs| {
                inputs.image_edit.image = Some(image);
                inputs.image_edit.instruction = args.instruction;
                inputs.target = args.target;
            });
            Ok(submit_and_print(&mut controller))
        }
        Command::Video(args) => run_video(&mut controller, args),
        Command::Influencer(args) => run_influencer(&mut controller, args),
        Command::Remix(args) => run_remix(&mut controller, args),
        Command::Analyze(args) => run_analyze(&mut controller, args),
        Command::Captions(args) => {
            controller.switch_tab(Tab::Video);
            controller.edit(|inputs| {
                inputs.video.idea = args.idea;
                inputs.video.caption_platform = args.platform;
            });
            match controller.generate_captions() {
                Ok(captions) => {
                    println!("{}", GenerationResult::Captions(captions.to_vec()).display_text());
                    Ok(0)
                }
                Err(err) => {
                    eprintln!("{err}");
                    Ok(1)
                }
            }
        }
        Command::Register(args) => {
            register(&controller, Identity::new(args.name, args.whatsapp, args.email))?;
            Ok(0)
        }
        Command::Status => {
            print_status(&controller)?;
            Ok(0)
        }
        Command::Idea => {
            controller.switch_tab(Tab::Text);
            if let Some(idea) = controller.suggest_idea() {
                println!("{idea}");
            }
            Ok(0)
        }
        Command::Admin(_) | Command::Targets => Ok(0),
    }
}

fn submit_and_print(controller: &mut StudioController) -> i32 {
    match controller.submit() {
        SubmitOutcome::Succeeded { receipt } => {
            if let Some(result) = controller.state().result() {
                println!("{}", result.display_text());
            }
            if let Some(receipt) = receipt {
                debug!(
                    feature = %receipt.feature,
                    local_count = receipt.local_count,
                    remote = %describe_sync(&receipt.remote),
                    "usage recorded"
                );
            }
            0
        }
        SubmitOutcome::Failed(err) => {
            eprintln!("{err}");
            1
        }
        SubmitOutcome::Denied(notice) => {
            eprintln!("{}", denied_text(&notice));
            EXIT_DENIED
        }
    }
}

fn denied_text(notice: &DeniedNotice) -> String {
    match notice.contact.as_ref() {
        Some(link) => format!("{}\nContact support: {link}", notice.message),
        None => notice.message.clone(),
    }
}

fn read_sheet(args: &SheetArgs) -> Result<String> {
    if let Some(path) = args.sheet_file.as_ref() {
        return fs::read_to_string(path)
            .with_context(|| format!("failed reading character sheet {}", path.display()));
    }
    Ok(args.sheet.clone().unwrap_or_default())
}

fn run_video(controller: &mut StudioController, args: VideoArgs) -> Result<i32> {
    let Some(format) = VideoOutputFormat::parse(&args.format) else {
        bail!("unknown video format '{}' (use plain or structured)", args.format);
    };
    let Some(video_type) = VideoType::parse(&args.video_type) else {
        bail!("unknown video type '{}' (use normal or commercial)", args.video_type);
    };
    let background = args.background.as_deref().map(MediaFile::from_path).transpose()?;
    let logo = args.logo.as_deref().map(MediaFile::from_path).transpose()?;
    let sheet = read_sheet(&args.sheet)?;

    controller.switch_tab(Tab::Video);
    controller.edit(|inputs| {
        inputs.target = args.target;
        inputs.video.idea = args.idea;
        inputs.video.duration = args.duration;
        inputs.video.format = format;
        inputs.video.video_type = video_type;
        inputs.video.on_screen_text = args.on_screen_text;
        inputs.video.background = background;
        inputs.video.logo = logo;
        if let Some(language) = args.language {
            inputs.video.dialogue_language = language;
        }
        if !sheet.trim().is_empty() {
            inputs.video.influencer = InfluencerChoice::Existing;
            inputs.influencer.existing_sheet = sheet;
        }
    });

    let code = submit_and_print(controller);
    let Some(seconds) = args.continue_for.filter(|_| code == 0) else {
        return Ok(code);
    };
    match controller.continue_story(seconds) {
        Ok(()) => {
            if let Some(result) = controller.state().result() {
                println!("\n--- continued ---\n{}", result.display_text());
            }
            Ok(0)
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(1)
        }
    }
}

fn run_influencer(controller: &mut StudioController, args: InfluencerArgs) -> Result<i32> {
    let image = args.image.as_deref().map(MediaFile::from_path).transpose()?;
    let description = args.description.unwrap_or_default();
    let choice = if description.trim().is_empty() {
        InfluencerChoice::Existing
    } else {
        InfluencerChoice::Create
    };
    controller.switch_tab(Tab::Video);
    controller.edit(|inputs| {
        inputs.video.influencer = choice;
        inputs.influencer.description = description;
        inputs.influencer.image = image;
    });
    match controller.generate_character_sheet() {
        Ok(sheet) => {
            println!("{sheet}");
            Ok(0)
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(1)
        }
    }
}

fn run_remix(controller: &mut StudioController, args: RemixArgs) -> Result<i32> {
    let Some(goal) = RemixGoal::parse(&args.goal) else {
        bail!("unknown remix goal '{}'", args.goal);
    };
    let Some(narration) = RemixNarration::parse(&args.narration) else {
        bail!("unknown narration option '{}'", args.narration);
    };
    let video = MediaFile::from_path(&args.video)?;
    let sheet = read_sheet(&args.sheet)?;
    controller.switch_tab(Tab::Remix);
    controller.edit(|inputs| {
        inputs.remix.video = Some(video);
        inputs.remix.goal = goal;
        inputs.remix.narration = narration;
        match narration {
            RemixNarration::CreateInfluencer => inputs.influencer.generated_sheet = sheet,
            _ => inputs.influencer.existing_sheet = sheet,
        }
    });
    Ok(submit_and_print(controller))
}

fn run_analyze(controller: &mut StudioController, args: AnalyzeArgs) -> Result<i32> {
    let screenshots = args
        .screenshots
        .iter()
        .map(|path| MediaFile::from_path(path))
        .collect::<Result<Vec<MediaFile>>>()?;
    controller.switch_tab(Tab::Analysis);
    controller.edit(|inputs| {
        inputs.analysis.platform = args.platform;
        inputs.analysis.username = args.username;
        inputs.analysis.goal = args.goal;
        inputs.analysis.screenshots = screenshots;
    });
    if !args.plan {
        return Ok(submit_and_print(controller));
    }
    match controller.submit() {
        SubmitOutcome::Succeeded { .. } => {}
        SubmitOutcome::Failed(err) => {
            eprintln!("{err}");
            return Ok(1);
        }
        SubmitOutcome::Denied(notice) => {
            eprintln!("{}", denied_text(&notice));
            return Ok(EXIT_DENIED);
        }
    }
    let code = match controller.generate_action_plan() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    };
    if let Some(result) = controller.state().result() {
        println!("{}", result.display_text());
    }
    Ok(code)
}

fn register(controller: &StudioController, identity: Identity) -> Result<()> {
    let outcome = controller.register(identity)?;
    println!("Registered {} ({})", outcome.identity.name, outcome.identity.email);
    match outcome.remote {
        RemoteRegistration::Disabled => {}
        RemoteRegistration::Created => println!("Lead created in the remote store."),
        RemoteRegistration::AlreadyPresent => println!("Lead already present in the remote store."),
        RemoteRegistration::Failed { reason } => {
            eprintln!("Remote registration failed: {reason}")
        }
    }
    Ok(())
}

fn describe_sync(sync: &RemoteSync) -> String {
    match sync {
        RemoteSync::Disabled => "disabled".to_string(),
        RemoteSync::Synced { count } => format!("synced ({count})"),
        RemoteSync::Missing => "no remote lead".to_string(),
        RemoteSync::Failed { reason } => format!("failed: {reason}"),
    }
}

fn print_status(controller: &StudioController) -> Result<()> {
    let gate = controller.gate();
    println!(
        "Tab: {} ({})",
        controller.active_tab().as_str(),
        controller.state().as_str()
    );
    println!("Service: {}", controller.studio().service_name());
    match gate.identity() {
        Some(identity) => println!(
            "Registered: {} / {} / {}",
            identity.name, identity.contact_handle, identity.email
        ),
        None => println!("Registered: no"),
    }
    let usage = gate.local().usage()?;
    for feature in FeatureTag::ALL {
        println!(
            "  {:<12} used {}  access {}",
            feature.as_str(),
            usage.count(feature),
            gate.check_access(feature).as_str()
        );
    }
    let reconciliation = gate.reconcile()?;
    println!(
        "Local total {}; remote {}",
        reconciliation.local_total,
        describe_sync(&reconciliation.remote)
    );
    if let (Some(drift), Some(limit)) = (reconciliation.drift(), reconciliation.remote_limit) {
        println!("Remote limit {limit}; drift {drift:+}");
    }
    Ok(())
}

fn print_targets() {
    let selector = codeprompt_contracts::catalog::TargetSelector::default();
    for kind in [
        TargetKind::Text,
        TargetKind::Image,
        TargetKind::ImageEdit,
        TargetKind::Video,
    ] {
        println!("{}:", kind.as_str());
        for target in selector.catalog.by_kind(kind) {
            let segments = if selector.catalog.supports_segments(&target.id) {
                " [multi-segment]"
            } else {
                ""
            };
            println!("  {}{segments}  {}", target.id, target.description);
        }
    }
    let ids = |entries: &[codeprompt_contracts::catalog::CatalogEntry]| {
        entries
            .iter()
            .map(|entry| entry.id)
            .collect::<Vec<&str>>()
            .join(", ")
    };
    println!("dialogue languages: {}", ids(DIALOGUE_LANGUAGES));
    println!("platforms: {}", ids(SOCIAL_PLATFORMS));
    println!("analysis goals: {}", ids(ANALYSIS_GOALS));
}

fn run_admin(config: &AppConfig, args: AdminArgs) -> Result<i32> {
    let mut console = AdminConsole::from_config(config);
    let unlocked = match (args.password.as_deref(), args.url.as_deref()) {
        (Some(password), _) => console.unlock_with_password(password),
        (None, Some(url)) => console.unlock_with_url(url),
        (None, None) => false,
    };
    if !unlocked {
        eprintln!("Admin access denied.");
        return Ok(EXIT_DENIED);
    }
    match args.command {
        AdminCommand::List => {
            for lead in console.list_leads()? {
                let link = contact_link(&lead)
                    .map(|url| url.to_string())
                    .unwrap_or_default();
                let row = json!({
                    "id": lead.id,
                    "name": lead.name,
                    "whatsapp": lead.contact_handle,
                    "email": lead.email,
                    "usage": format!("{}/{}", lead.usage_count, lead.usage_limit),
                    "created_at": lead.created_at,
                    "contact": link,
                });
                println!("{row}");
            }
        }
        AdminCommand::SetLimit { id, limit } => {
            console.set_limit(&id, limit)?;
            println!("Limit for lead {id} set to {limit}");
        }
    }
    Ok(0)
}

fn run_studio(controller: &mut StudioController, tab: &str) -> Result<i32> {
    let Some(tab) = Tab::parse(tab) else {
        bail!("unknown tab '{tab}'");
    };
    controller.switch_tab(tab);

    let stdin = io::stdin();
    let mut line = String::new();
    println!("CodePrompt studio on the {} tab. Type /help for commands.", tab.as_str());

    loop {
        print!("[{}] > ", controller.active_tab().as_str());
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let intent = parse_intent(line.trim_end_matches(['\n', '\r']));
        match intent.action.as_str() {
            "noop" => continue,
            "quit" => break,
            _ => {}
        }
        if let Err(err) = handle_intent(controller, &intent) {
            println!("{err:#}");
        }
    }
    Ok(0)
}

fn handle_intent(controller: &mut StudioController, intent: &Intent) -> Result<()> {
    let arg = |key: &str| intent.arg_str(key).map(str::trim).unwrap_or_default().to_string();
    match intent.action.as_str() {
        "help" => println!("Commands: {}", STUDIO_HELP_COMMANDS.join(" ")),
        "switch_tab" => {
            let raw = arg("tab");
            let Some(tab) = Tab::parse(&raw) else {
                let names: Vec<&str> = Tab::ALL.iter().map(|tab| tab.as_str()).collect();
                bail!("unknown tab '{raw}' (one of {})", names.join(", "));
            };
            controller.switch_tab(tab);
            println!("Switched to {}", tab.as_str());
        }
        "set_text" => {
            let text = intent.text.clone().unwrap_or_default();
            let tab = controller.active_tab();
            if matches!(tab, Tab::Remix | Tab::Analysis) {
                bail!("the {} tab takes no free text; try /help", tab.as_str());
            }
            controller.edit(|inputs| set_primary_text(inputs, tab, text));
        }
        "set_target" => {
            let target = arg("target");
            controller.edit(|inputs| inputs.target = Some(target).filter(|value| !value.is_empty()));
            if let Some(selection) = controller.selected_target() {
                let selection = selection.map_err(anyhow::Error::msg)?;
                println!("Target: {}", selection.target.name);
                if let Some(reason) = selection.fallback_reason {
                    println!("{reason}");
                }
            }
        }
        "set_format" => {
            let raw = arg("format");
            let Some(format) = VideoOutputFormat::parse(&raw) else {
                bail!("unknown format '{raw}' (plain or structured)");
            };
            controller.edit(|inputs| inputs.video.format = format);
        }
        "set_language" => {
            let language = arg("language");
            controller.edit(|inputs| inputs.video.dialogue_language = language);
        }
        "set_video_type" => {
            let raw = arg("video_type");
            let Some(video_type) = VideoType::parse(&raw) else {
                bail!("unknown video type '{raw}' (normal or commercial)");
            };
            controller.edit(|inputs| inputs.video.video_type = video_type);
        }
        "set_platform" => {
            let platform = arg("platform");
            let tab = controller.active_tab();
            controller.edit(|inputs| match tab {
                Tab::Analysis => inputs.analysis.platform = platform,
                _ => inputs.video.caption_platform = platform,
            });
        }
        "set_goal" => {
            let raw = arg("goal");
            match controller.active_tab() {
                Tab::Remix => {
                    let Some(goal) = RemixGoal::parse(&raw) else {
                        bail!("unknown remix goal '{raw}'");
                    };
                    controller.edit(|inputs| inputs.remix.goal = goal);
                }
                _ => controller.edit(|inputs| inputs.analysis.goal = raw),
            }
        }
        "set_username" => {
            let username = arg("username");
            controller.edit(|inputs| inputs.analysis.username = username);
        }
        "set_narration" => {
            let raw = arg("narration");
            let Some(narration) = RemixNarration::parse(&raw) else {
                bail!("unknown narration option '{raw}'");
            };
            controller.edit(|inputs| inputs.remix.narration = narration);
        }
        "set_influencer" => {
            let raw = arg("influencer");
            let Some(choice) = InfluencerChoice::parse(&raw) else {
                bail!("unknown influencer option '{raw}' (none, create or existing)");
            };
            controller.edit(|inputs| inputs.video.influencer = choice);
        }
        "set_character_sheet" => {
            let sheet = arg("sheet");
            let creating = match controller.active_tab() {
                Tab::Remix => controller.inputs().remix.narration == RemixNarration::CreateInfluencer,
                _ => controller.inputs().video.influencer == InfluencerChoice::Create,
            };
            controller.edit(|inputs| {
                if creating {
                    inputs.influencer.generated_sheet = sheet;
                } else {
                    inputs.influencer.existing_sheet = sheet;
                }
            });
        }
        "describe_influencer" => {
            let description = arg("description");
            controller.edit(|inputs| inputs.influencer.description = description);
        }
        "set_duration" => {
            let Some(seconds) = intent.arg_u64("seconds").and_then(|value| u32::try_from(value).ok())
            else {
                bail!("/duration needs a number of seconds");
            };
            controller.edit(|inputs| inputs.video.duration = seconds);
        }
        "attach_image" => {
            let image = load_media(intent)?;
            match controller.active_tab() {
                Tab::ImageEdit => controller.edit(|inputs| inputs.image_edit.image = Some(image)),
                _ => controller.edit(|inputs| {
                    inputs.image.image = Some(image);
                    inputs.image.use_upload = true;
                }),
            }
        }
        "attach_background" => {
            let image = load_media(intent)?;
            controller.edit(|inputs| inputs.video.background = Some(image));
        }
        "attach_logo" => {
            let image = load_media(intent)?;
            controller.edit(|inputs| inputs.video.logo = Some(image));
        }
        "attach_video" => {
            let video = load_media(intent)?;
            controller.edit(|inputs| inputs.remix.video = Some(video));
        }
        "attach_reference" => {
            let image = load_media(intent)?;
            controller.edit(|inputs| inputs.influencer.image = Some(image));
        }
        "attach_screenshots" => {
            let screenshots = intent
                .arg_list("paths")
                .iter()
                .map(|path| MediaFile::from_path(Path::new(path)))
                .collect::<Result<Vec<MediaFile>>>()?;
            println!("{} screenshot(s) attached", screenshots.len());
            controller.edit(|inputs| inputs.analysis.screenshots = screenshots);
        }
        "clear_media" => controller.edit(|inputs| {
            inputs.image.image = None;
            inputs.image.use_upload = false;
            inputs.image_edit.image = None;
            inputs.video.background = None;
            inputs.video.logo = None;
            inputs.remix.video = None;
            inputs.analysis.screenshots.clear();
            inputs.influencer.image = None;
        }),
        "submit" => {
            submit_and_print(controller);
        }
        "continue_story" => {
            let seconds = intent
                .arg_u64("seconds")
                .and_then(|value| u32::try_from(value).ok())
                .unwrap_or(SEGMENT_SECONDS);
            controller.continue_story(seconds)?;
            print_result(controller.state());
        }
        "action_plan" => {
            controller.generate_action_plan()?;
            print_result(controller.state());
        }
        "captions" => {
            let platform = arg("platform");
            if !platform.is_empty() {
                controller.edit(|inputs| inputs.video.caption_platform = platform);
            }
            let captions = controller.generate_captions()?;
            println!("{}", GenerationResult::Captions(captions.to_vec()).display_text());
        }
        "character_sheet" => println!("{}", controller.generate_character_sheet()?),
        "suggest_idea" => match controller.suggest_idea() {
            Some(idea) => println!("Idea: {idea}"),
            None => println!("No idea suggestions for this tab."),
        },
        "register" => {
            let fields = intent.arg_list("fields");
            let [name, handle, email] = fields.as_slice() else {
                bail!("usage: /register <name> <whatsapp> <email>");
            };
            register(controller, Identity::new(name.as_str(), handle.as_str(), email.as_str()))?;
        }
        "status" => print_status(controller)?,
        "unknown" => println!("Unknown command /{}. Type /help.", arg("command")),
        other => println!("Nothing to do for '{other}'."),
    }
    Ok(())
}

fn set_primary_text(inputs: &mut TabInputs, tab: Tab, text: String) {
    match tab {
        Tab::Text => inputs.topic = text,
        Tab::Image => inputs.image.instruction = text,
        Tab::ImageEdit => inputs.image_edit.instruction = text,
        Tab::Video => inputs.video.idea = text,
        Tab::Remix | Tab::Analysis => {}
    }
}

fn load_media(intent: &Intent) -> Result<MediaFile> {
    let Some(path) = intent.arg_str("path").map(str::trim).filter(|path| !path.is_empty()) else {
        bail!("/{} needs a file path", intent.action.trim_start_matches("attach_"));
    };
    MediaFile::from_path(Path::new(path))
}

fn print_result(state: &TabState) {
    match state {
        TabState::Succeeded(result) => println!("{}", result.display_text()),
        TabState::Failed(err) => println!("{err}"),
        TabState::Idle | TabState::Submitting => {}
    }
}
