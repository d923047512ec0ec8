use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;

use docvc_sdk::{
    ConflictResolution, CreateVersionOptions, DiffLine, DocumentVersion, MergeRequest,
    MergeStrategy, NewBranch, NewRestorePoint, ResolutionChoice, Value, ValuePath,
};

use crate::cli::*;
use crate::session::Session;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let session = Session::open(&cli)?;
    let format = cli.format.clone();
    match cli.command {
        Command::Commit(args) => cmd_commit(&session, args, &format).await,
        Command::Log(args) => cmd_log(&session, args, &format).await,
        Command::Show(args) => cmd_show(&session, args, &format).await,
        Command::Branch(args) => cmd_branch(&session, args, &format).await,
        Command::Branches => cmd_branches(&session, &format).await,
        Command::Merge(args) => cmd_merge(&session, args, &format).await,
        Command::Diff(args) => cmd_diff(&session, args, &format).await,
        Command::Rollback(args) => cmd_rollback(&session, args, &format).await,
        Command::RestorePoint(args) => cmd_restore_point(&session, args, &format).await,
        Command::RestorePoints => cmd_restore_points(&session, &format).await,
        Command::Cleanup(args) => cmd_cleanup(&session, args, &format).await,
        Command::Archive(args) => cmd_archive(&session, args, &format).await,
        Command::Verify(args) => cmd_verify(&session, args, &format).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_version_line(v: &DocumentVersion) {
    let tags = if v.tags.is_empty() {
        String::new()
    } else {
        let joined: Vec<&str> = v.tags.iter().map(String::as_str).collect();
        format!(" [{}]", joined.join(", ")).cyan().to_string()
    };
    println!(
        "{} {} ({}) {}{}",
        format!("v{}", v.version_number).yellow().bold(),
        v.id.short_id().dimmed(),
        v.branch_name.green(),
        v.commit_message,
        tags
    );
}

async fn cmd_commit(s: &Session, args: CommitArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.file.display()))?;

    let mut options = CreateVersionOptions::new(args.message).with_tags(args.tags);
    if let Some(branch) = args.branch {
        options = options.with_branch(branch);
    }
    if args.snapshot {
        options = options.as_snapshot();
    }

    let version = s
        .engine
        .commit(&s.document, &s.project, Value::from(json), &s.author, options)
        .await?;
    s.save()?;

    match format {
        OutputFormat::Json => print_json(&version),
        OutputFormat::Text => {
            println!(
                "{} Recorded {} on {}",
                "✓".green().bold(),
                format!("v{}", version.version_number).yellow().bold(),
                version.branch_name.green()
            );
            println!("  Id: {}", version.id);
            println!("  Hash: {}", version.content_hash.short_hex().dimmed());
            println!("  Changes: {}", version.metadata.change_count);
            Ok(())
        }
    }
}

async fn cmd_log(s: &Session, args: LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let history = s
        .engine
        .get_version_history(&s.document, args.branch.as_deref(), args.limit)
        .await?;

    match format {
        OutputFormat::Json => print_json(&history),
        OutputFormat::Text => {
            if history.is_empty() {
                println!("No versions.");
            }
            for v in &history {
                if args.oneline {
                    print_version_line(v);
                    continue;
                }
                println!(
                    "{}  {}  ({})",
                    format!("v{}", v.version_number).yellow().bold(),
                    v.id.to_string().dimmed(),
                    v.branch_name.green()
                );
                println!(
                    "  {} | {}",
                    v.author,
                    v.timestamp.to_datetime().format("%Y-%m-%d %H:%M:%S UTC")
                );
                println!("  {}", v.commit_message);
                if !v.tags.is_empty() {
                    let tags: Vec<&str> = v.tags.iter().map(String::as_str).collect();
                    println!("  Tags: {}", tags.join(", ").cyan());
                }
                println!();
            }
            Ok(())
        }
    }
}

async fn cmd_show(s: &Session, args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let v = s.resolve_version(&args.version).await?;
    match format {
        OutputFormat::Json => print_json(&v),
        OutputFormat::Text => {
            print_version_line(&v);
            println!("  Id: {}", v.id);
            println!("  Author: {}", v.author);
            println!("  Hash: {}", v.content_hash.to_hex().dimmed());
            if let Some(parent) = &v.parent_version_id {
                println!("  Parent: {parent}");
            }
            if let Some(source) = &v.metadata.merged_from {
                println!("  Merged from: {source}");
            }
            println!("  Size: {} bytes, {} changes", v.metadata.size_bytes, v.metadata.change_count);
            for change in &v.changes {
                println!("    {:<7} {}", change.kind.to_string().cyan(), change.path);
            }
            if args.content {
                println!("{}", serde_json::to_string_pretty(&v.content)?);
            }
            Ok(())
        }
    }
}

async fn cmd_branch(s: &Session, args: BranchArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let from = args.from.as_deref().unwrap_or(s.default_branch());
    let base = s.resolve_version(from).await?;

    let mut request = NewBranch::new(&s.document, &s.project, &args.name, &s.author, base.id.clone());
    if let Some(description) = args.description {
        request = request.with_description(description);
    }
    s.engine.create_branch(request).await?;
    s.save()?;

    let branch = s.engine.get_branch(&s.document, &args.name).await?;
    match format {
        OutputFormat::Json => print_json(&branch),
        OutputFormat::Text => {
            println!(
                "{} Created branch {} at {} v{}",
                "✓".green().bold(),
                args.name.yellow().bold(),
                base.branch_name.green(),
                base.version_number
            );
            Ok(())
        }
    }
}

async fn cmd_branches(s: &Session, format: &OutputFormat) -> anyhow::Result<()> {
    let branches = s.engine.get_branches(&s.document).await?;
    match format {
        OutputFormat::Json => print_json(&branches),
        OutputFormat::Text => {
            if branches.is_empty() {
                println!("No branches.");
            }
            for b in &branches {
                let marker = if b.name == s.default_branch() { "*" } else { " " };
                println!(
                    "{} {} {} {}",
                    marker,
                    b.name.green().bold(),
                    format!("[{}]", b.status).dimmed(),
                    b.head_version_id.short_id().dimmed()
                );
            }
            Ok(())
        }
    }
}

async fn cmd_merge(s: &Session, args: MergeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let resolutions = parse_resolutions(&args.take, &args.set)?;
    let mut strategy: MergeStrategy = args.strategy.parse()?;
    if !resolutions.is_empty() && strategy == MergeStrategy::ThreeWay {
        strategy = MergeStrategy::Manual;
    }
    let target = args.into.unwrap_or_else(|| s.default_branch().to_string());

    let mut request = MergeRequest::new(&s.document, &args.source, &target, &s.author)
        .with_strategy(strategy)
        .with_resolutions(resolutions);
    if let Some(message) = args.message {
        request = request.with_message(message);
    }

    let outcome = s.engine.merge_branches(request).await?;
    if outcome.success {
        s.save()?;
    }

    match format {
        OutputFormat::Json => print_json(&outcome)?,
        OutputFormat::Text => {
            if outcome.up_to_date {
                println!("{} Already up to date.", "✓".green());
            } else if outcome.success {
                println!(
                    "{} Merged {} into {} ({} conflicts resolved)",
                    "✓".green().bold(),
                    args.source.yellow(),
                    target.yellow(),
                    outcome.conflicts.len()
                );
            } else {
                println!("{} Merge stopped on {} conflicts:", "✗".red().bold(), outcome.conflicts.len());
                for c in &outcome.conflicts {
                    println!(
                        "  {}  source: {}  target: {}",
                        c.path.to_string().bold(),
                        render(c.source_value.as_ref()),
                        render(c.target_value.as_ref())
                    );
                }
                println!("Resolve with --take <path>=source|target|both or --set <path>=<json>.");
            }
        }
    }

    if !outcome.success {
        bail!("merge has unresolved conflicts");
    }
    Ok(())
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(v) => serde_json::to_string(v).unwrap_or_default(),
        None => "(absent)".dimmed().to_string(),
    }
}

fn parse_resolutions(take: &[String], set: &[String]) -> anyhow::Result<Vec<ConflictResolution>> {
    let mut resolutions = Vec::with_capacity(take.len() + set.len());
    for assignment in take {
        let (path, choice) = split_assignment(assignment)?;
        let choice: ResolutionChoice = choice.parse()?;
        if choice == ResolutionChoice::Manual {
            bail!("use --set {path}=<value> for a manual resolution");
        }
        resolutions.push(ConflictResolution::decide(path, choice));
    }
    for assignment in set {
        let (path, raw) = split_assignment(assignment)?;
        // Bare words are taken as strings so `--set title=Final` works.
        let json = serde_json::from_str(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        resolutions.push(ConflictResolution::manual(path, Value::from(json)));
    }
    Ok(resolutions)
}

fn split_assignment(assignment: &str) -> anyhow::Result<(ValuePath, &str)> {
    let (path, rhs) = assignment
        .split_once('=')
        .with_context(|| format!("expected <path>=<value>, got {assignment:?}"))?;
    let path = path
        .parse()
        .with_context(|| format!("invalid path {path:?}"))?;
    Ok((path, rhs))
}

async fn cmd_diff(s: &Session, args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let from = s.resolve_version(&args.from).await?;
    let to = s.resolve_version(&args.to).await?;
    let cmp = s.engine.compare_versions(&from.id, &to.id).await?;

    match format {
        OutputFormat::Json => print_json(&cmp),
        OutputFormat::Text => {
            if cmp.identical {
                println!("No changes.");
                return Ok(());
            }
            println!(
                "v{} -> v{}: {} changes ({} created, {} updated, {} deleted, {} moved, {} renamed)",
                cmp.from_number,
                cmp.to_number,
                cmp.total_changes(),
                cmp.creates,
                cmp.updates,
                cmp.deletes,
                cmp.moves,
                cmp.renames
            );
            for c in &cmp.changes {
                let from_path = c
                    .from_path
                    .as_ref()
                    .map(|p| format!("{p} -> "))
                    .unwrap_or_default();
                println!(
                    "  {:<7} {}{}  {} -> {}",
                    c.kind.to_string().cyan(),
                    from_path,
                    c.path.to_string().bold(),
                    render(c.old_value.as_ref()),
                    render(c.new_value.as_ref())
                );
            }
            for field in &cmp.text_diffs {
                println!("{}", format!("--- {}", field.path).bold());
                for hunk in &field.diff.hunks {
                    println!(
                        "{}",
                        format!(
                            "@@ -{},{} +{},{} @@",
                            hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
                        )
                        .cyan()
                    );
                    for line in &hunk.lines {
                        match line {
                            DiffLine::Context(t) => println!(" {t}"),
                            DiffLine::Added(t) => println!("{}", format!("+{t}").green()),
                            DiffLine::Removed(t) => println!("{}", format!("-{t}").red()),
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

async fn cmd_rollback(s: &Session, args: RollbackArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let target = s.resolve_version(&args.version).await?;
    let id = s
        .engine
        .rollback_to_version(&s.document, &target.id, &s.author, args.message.as_deref())
        .await?;
    s.save()?;

    let version = s.engine.get_version(&id).await?;
    match format {
        OutputFormat::Json => print_json(&version),
        OutputFormat::Text => {
            println!(
                "{} Rolled {} back to v{} as {}",
                "✓".green().bold(),
                version.branch_name.green(),
                target.version_number,
                format!("v{}", version.version_number).yellow().bold()
            );
            Ok(())
        }
    }
}

async fn cmd_restore_point(
    s: &Session,
    args: RestorePointArgs,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let version = s.resolve_version(&args.version).await?;
    let mut request = NewRestorePoint::new(&s.document, version.id.clone(), args.name, &s.author);
    if let Some(description) = args.description {
        request = request.with_description(description);
    }
    let point = s.engine.create_restore_point(request).await?;
    s.save()?;

    match format {
        OutputFormat::Json => print_json(&point),
        OutputFormat::Text => {
            println!(
                "{} Restore point {} at {} v{}",
                "✓".green().bold(),
                point.name.yellow().bold(),
                version.branch_name.green(),
                version.version_number
            );
            Ok(())
        }
    }
}

async fn cmd_restore_points(s: &Session, format: &OutputFormat) -> anyhow::Result<()> {
    let points = s.engine.get_restore_points(&s.document).await?;
    match format {
        OutputFormat::Json => print_json(&points),
        OutputFormat::Text => {
            if points.is_empty() {
                println!("No restore points.");
            }
            for p in &points {
                let kind = if p.is_automatic { "auto" } else { "user" };
                println!(
                    "{} {} {} {}",
                    p.created_at.to_datetime().format("%Y-%m-%d %H:%M"),
                    format!("[{kind}]").dimmed(),
                    p.name.yellow(),
                    p.version_id.short_id().dimmed()
                );
            }
            Ok(())
        }
    }
}

async fn cmd_cleanup(s: &Session, args: CleanupArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let policy = &s.engine.config().retention;
    let keep_count = args.keep_count.unwrap_or(policy.keep_count);
    let keep_days = args.keep_days.unwrap_or(policy.keep_days);

    let deleted = s
        .engine
        .cleanup_old_versions(&s.document, keep_count, keep_days)
        .await?;
    s.save()?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "deleted": deleted })),
        OutputFormat::Text => {
            println!(
                "{} Cleanup: {} versions deleted (keeping {} past {} days)",
                "✓".green(),
                deleted,
                keep_count,
                keep_days
            );
            Ok(())
        }
    }
}

async fn cmd_archive(s: &Session, args: ArchiveArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let branch = s.engine.archive_branch(&s.document, &args.branch).await?;
    s.save()?;
    match format {
        OutputFormat::Json => print_json(&branch),
        OutputFormat::Text => {
            println!("{} Archived {}", "✓".green().bold(), branch.name.yellow());
            Ok(())
        }
    }
}

async fn cmd_verify(s: &Session, args: VerifyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let version = s.resolve_version(&args.version).await?;
    s.engine.verify_integrity(&version.id).await?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "version": version.id, "valid": true })),
        OutputFormat::Text => {
            println!(
                "{} v{} integrity verified",
                "✓".green().bold(),
                version.version_number
            );
            println!("  Hash: {}", "valid".green());
            println!("  Change set: {}", "reconciles".green());
            Ok(())
        }
    }
}
