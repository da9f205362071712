//! Subcommands and their execution against a [`Roster`].

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use ringside_core::{
  championship::ChampionRef,
  entity::EntityType,
  lifecycle::Transition,
  query::{EntityQuery, Filter},
  service::Roster,
  status::resolve,
  store::RosterStore,
};
use ringside_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use uuid::Uuid;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Register a new wrestler, tag team, manager, referee, stable or title.
  Add {
    #[arg(value_parser = parse_entity_type)]
    entity_type: EntityType,
    name:        String,
  },

  /// Show an entity with its status and every period on record.
  Show {
    id:    Uuid,
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,
  },

  /// Soft-delete an entity.
  Delete { id: Uuid },

  /// Undo a soft delete.
  Restore { id: Uuid },

  /// Apply a lifecycle transition: employ, release, injure, heal, suspend,
  /// reinstate, retire, unretire, activate or deactivate.
  Apply {
    #[arg(value_parser = parse_transition)]
    transition: Transition,
    id:         Uuid,
    /// When the transition takes effect (default: now).
    #[arg(long)]
    at:         Option<DateTime<Utc>>,
  },

  /// Resolve an entity's status.
  Status {
    id:    Uuid,
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,
  },

  /// List entities matching every given filter.
  List {
    #[arg(long = "type", value_parser = parse_entity_type)]
    entity_type:  Option<EntityType>,
    #[arg(long = "filter", value_parser = parse_filter)]
    filters:      Vec<Filter>,
    /// Include soft-deleted entities.
    #[arg(long)]
    with_trashed: bool,
    #[arg(long)]
    as_of:        Option<DateTime<Utc>>,
  },

  /// Championship ledger operations.
  #[command(subcommand)]
  Title(TitleCommand),
}

#[derive(Subcommand, Debug)]
pub enum TitleCommand {
  /// Record a new champion, ending the current reign.
  Crown {
    title:    Uuid,
    champion: Uuid,
    /// The champion is a tag team rather than a wrestler.
    #[arg(long)]
    tag_team: bool,
    #[arg(long)]
    at:       Option<DateTime<Utc>>,
    /// Match in which the title changed hands.
    #[arg(long = "match")]
    match_id: Option<Uuid>,
  },

  /// End the current reign without a successor.
  Vacate {
    title: Uuid,
    #[arg(long)]
    at:    Option<DateTime<Utc>>,
  },

  /// Current champion and lifecycle status.
  Status {
    title: Uuid,
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,
  },

  /// Every reign, most recent first, with its length in days.
  History {
    title: Uuid,
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,
  },
}

fn parse_entity_type(s: &str) -> Result<EntityType, String> {
  EntityType::parse(s).ok_or_else(|| {
    let known: Vec<_> = EntityType::ALL.iter().map(|t| t.as_str()).collect();
    format!("expected one of {}", known.join(", "))
  })
}

fn parse_transition(s: &str) -> Result<Transition, String> {
  Transition::parse(s).ok_or_else(|| {
    let known: Vec<_> = Transition::ALL.iter().map(|t| t.as_str()).collect();
    format!("expected one of {}", known.join(", "))
  })
}

fn parse_filter(s: &str) -> Result<Filter, String> {
  Filter::parse(s).ok_or_else(|| {
    let known: Vec<_> = Filter::ALL.iter().map(|f| f.as_str()).collect();
    format!("expected one of {}", known.join(", "))
  })
}

/// Execute `command` and return its JSON result.
pub async fn run(roster: &Roster<SqliteStore>, command: Command) -> Result<Value> {
  match command {
    Command::Add { entity_type, name } => {
      Ok(json!(roster.add_entity(entity_type, name).await?))
    }

    Command::Show { id, as_of } => {
      let history = roster
        .store()
        .load_history(id)
        .await?
        .with_context(|| format!("entity not found: {id}"))?;
      let as_of = as_of.unwrap_or_else(|| roster.now());
      Ok(json!({
        "entity":  history.entity,
        "as_of":   as_of,
        "status":  resolve(&history, as_of),
        "periods": history.periods(),
        "reigns":  history.reigns(),
      }))
    }

    Command::Delete { id } => Ok(json!(roster.delete(id).await?)),

    Command::Restore { id } => Ok(json!(roster.restore(id).await?)),

    Command::Apply { transition, id, at } => {
      Ok(json!(roster.apply(id, transition, at).await?))
    }

    Command::Status { id, as_of } => Ok(json!(roster.status(id, as_of).await?)),

    Command::List { entity_type, filters, with_trashed, as_of } => {
      let mut query = EntityQuery { entity_type, ..EntityQuery::default() };
      for filter in filters {
        query = query.filter(filter);
      }
      if with_trashed {
        query = query.with_trashed();
      }

      let mut entities = Vec::new();
      for id in roster.list(&query, as_of).await? {
        if let Some(entity) = roster.get_entity(id).await? {
          entities.push(entity);
        }
      }
      Ok(json!(entities))
    }

    Command::Title(cmd) => run_title(roster, cmd).await,
  }
}

async fn run_title(roster: &Roster<SqliteStore>, command: TitleCommand) -> Result<Value> {
  match command {
    TitleCommand::Crown { title, champion, tag_team, at, match_id } => {
      let champion = if tag_team {
        ChampionRef::tag_team(champion)
      } else {
        ChampionRef::wrestler(champion)
      };
      let change = roster
        .record_championship_change(title, champion, at, match_id)
        .await?;
      Ok(json!(change))
    }

    TitleCommand::Vacate { title, at } => Ok(json!(roster.vacate_title(title, at).await?)),

    TitleCommand::Status { title, as_of } => {
      Ok(json!(roster.title_status(title, as_of).await?))
    }

    TitleCommand::History { title, as_of } => {
      let reigns = roster.title_history(title).await?;
      let rows: Vec<Value> = reigns
        .iter()
        .map(|reign| {
          json!({
            "reign": reign,
            "days":  roster.reign_length(reign, as_of),
          })
        })
        .collect();
      Ok(Value::Array(rows))
    }
  }
}
