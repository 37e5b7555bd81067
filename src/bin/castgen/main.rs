//! CLI tool to generate or adjust character groups for a project.
//!
//! Usage:
//!   castgen --project project.json [--casting casting.automerge] [--policy policy.yml]
//!           [--output out.automerge] [--maintain-assignments] [--adjust-only] [--json]

mod input;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use input::InputProject;
use voicecast::project::{CastSizeOption, GroupingPolicy};
use voicecast::{CastSizePlan, CastingManager, CastingRoot, CharacterGroupGenerator, CharacterGroupsAdjuster, Project};

#[derive(Parser, Debug)]
#[command(
    name = "castgen",
    about = "Group the speaking characters of a project into one group per voice actor",
    version
)]
struct Args {
    /// Project JSON file (books, preferences, reference tables)
    #[arg(short, long)]
    project: PathBuf,

    /// Existing casting document (Automerge binary)
    #[arg(short, long)]
    casting: Option<PathBuf>,

    /// YAML file overriding grouping policy constants
    #[arg(long, env = "CASTGEN_POLICY")]
    policy: Option<PathBuf>,

    /// Output path (defaults to the casting path, or the project path with
    /// .automerge extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep actors on the groups holding their most prominent characters
    #[arg(long, default_value = "false")]
    maintain_assignments: bool,

    /// Patch existing groups in place instead of regenerating
    #[arg(long, default_value = "false")]
    adjust_only: bool,

    /// Print the resulting casting state as JSON instead of a table
    #[arg(long, default_value = "false")]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // 1. Policy
    let policy = match &args.policy {
        Some(path) => {
            let yaml = std::fs::read_to_string(path).context("Failed to read policy file")?;
            serde_yaml_ng::from_str::<GroupingPolicy>(&yaml).context("Failed to parse policy YAML")?
        }
        None => GroupingPolicy::default(),
    };

    // 2. Project
    if !args.project.exists() {
        anyhow::bail!("Project file does not exist: {}", args.project.display());
    }
    let json = std::fs::read_to_string(&args.project).context("Failed to read project file")?;
    let input: InputProject = serde_json::from_str(&json).context("Failed to parse project JSON")?;
    let (project, actors) = input.into_project(policy);

    // 3. Casting document
    let mut manager = match &args.casting {
        Some(path) => {
            let bytes = std::fs::read(path).context("Failed to read casting document")?;
            CastingManager::from_bytes(&bytes).context("Failed to load casting document")?
        }
        None => CastingManager::new(),
    };
    for actor in actors {
        manager.add_actor(actor).context("Failed to add actor")?;
    }
    let casting = manager.get_state().context("Failed to hydrate casting document")?;
    let option = project.generation_preferences.cast_size_option;
    if option != CastSizeOption::MatchVoiceActorList {
        let plan = CastSizePlan::for_project(&project, &casting, option);
        eprintln!(
            "Suggested cast ({:?}): {} men, {} women, {} children, {} narrators; roster has {} active actors",
            option,
            plan.male_actors,
            plan.female_actors,
            plan.child_actors,
            plan.narrator_count(),
            casting.active_actors().len()
        );
    }

    // 4. Adjust or regenerate
    if args.adjust_only {
        let adjuster = CharacterGroupsAdjuster::new(&project, &casting);
        if adjuster.full_regenerate_recommended() {
            log::warn!("project changed substantially; full regeneration is recommended");
        }
        if adjuster.groups_are_not_in_synch_with_data() {
            manager
                .update_state(|root| adjuster.make_minimal_adjustments(root))
                .context("Failed to apply minimal adjustments")?;
        } else {
            eprintln!("Groups are in sync with the project.");
        }
    } else {
        let mut generator = CharacterGroupGenerator::new(&project, &casting);
        if generator.generate_character_groups().is_none() {
            anyhow::bail!("Generation was cancelled");
        }
        generator
            .apply_generated_groups_to_project(&mut manager, args.maintain_assignments)
            .context("Failed to apply generated groups")?;
        let proximity = generator.minimum_proximity();
        if proximity.is_acceptable(&project.policy) {
            eprintln!("Closest pair within a group: {}", proximity);
        } else {
            eprintln!("Warning: closest pair within a group is only {}", proximity);
        }
    }

    // 5. Report
    if args.json {
        println!("{}", manager.to_json().context("Failed to export casting state")?);
    } else {
        let state = manager.get_state().context("Failed to hydrate result")?;
        print_groups(&project, &state);
    }

    // 6. Write output
    let output_path = args.output.or(args.casting).unwrap_or_else(|| {
        let mut path = args.project.clone();
        path.set_extension("automerge");
        path
    });
    std::fs::write(&output_path, manager.save()).context("Failed to write output file")?;
    eprintln!("Wrote {}", output_path.display());
    Ok(())
}

fn print_groups(project: &Project, state: &CastingRoot) {
    let keystrokes = project.keystrokes_by_character();
    println!("Character groups:");
    for group in &state.character_groups {
        let actor = group
            .voice_actor_id
            .as_deref()
            .and_then(|id| state.actor(id))
            .map(|a| a.name.as_str())
            .unwrap_or("-");
        println!(
            "  {:<12} {:<16} {:>6.1} h  {}",
            group.id,
            actor,
            group.estimated_hours(&keystrokes, &project.policy),
            group.character_ids.join(", ")
        );
    }
}
