//! Translation of [`Filter`]s into SQL predicates over the `entities e` row.
//!
//! Every predicate reads the resolution instant from parameter `?1` and must
//! agree with [`Filter::matches`] for every history.

use ringside_core::{
  entity::EntityType,
  period::PeriodKind,
  query::Filter,
};

fn quoted(values: impl IntoIterator<Item = &'static str>) -> String {
  values
    .into_iter()
    .map(|v| format!("'{v}'"))
    .collect::<Vec<_>>()
    .join(", ")
}

fn tenure_kinds() -> String {
  quoted([PeriodKind::Employment.as_str(), PeriodKind::Activation.as_str()])
}

fn individual_types() -> String {
  quoted(
    EntityType::ALL
      .into_iter()
      .filter(|t| t.is_individual())
      .map(EntityType::as_str),
  )
}

/// A period of one of `kinds` is in effect at `?1`.
fn current(kinds: &str) -> String {
  format!(
    "EXISTS (SELECT 1 FROM periods p
             WHERE p.entity_id = e.entity_id AND p.kind IN ({kinds})
               AND p.started_at <= ?1
               AND (p.ended_at IS NULL OR p.ended_at > ?1))"
  )
}

/// Any period of one of `kinds` exists.
fn ever(kinds: &str) -> String {
  format!(
    "EXISTS (SELECT 1 FROM periods p
             WHERE p.entity_id = e.entity_id AND p.kind IN ({kinds}))"
  )
}

/// A period of one of `kinds` starts after `?1`.
fn pending(kinds: &str) -> String {
  format!(
    "EXISTS (SELECT 1 FROM periods p
             WHERE p.entity_id = e.entity_id AND p.kind IN ({kinds})
               AND p.started_at > ?1)"
  )
}

fn reign_where(cond: &str) -> String {
  format!(
    "EXISTS (SELECT 1 FROM championships c
             WHERE c.title_id = e.entity_id AND {cond})"
  )
}

/// The SQL predicate selecting entities that `filter` matches.
pub fn clause(filter: Filter) -> String {
  let tenure = tenure_kinds();
  let retired = current(&quoted([PeriodKind::Retirement.as_str()]));
  let suspended = current(&quoted([PeriodKind::Suspension.as_str()]));
  let injured = current(&quoted([PeriodKind::Injury.as_str()]));
  let title = format!("e.entity_type = '{}'", EntityType::Title.as_str());

  // Status outcomes, in resolver order.
  let working = format!("NOT {retired} AND {}", current(&tenure));
  let off_books = format!("NOT {retired} AND {} AND NOT {}", ever(&tenure), current(&tenure));

  match filter {
    Filter::Retired => retired,
    Filter::Unemployed => format!("NOT {retired} AND NOT {}", ever(&tenure)),
    Filter::Suspended => format!("{working} AND {suspended}"),
    Filter::Injured => format!(
      "e.entity_type IN ({}) AND {working} AND NOT {suspended} AND {injured}",
      individual_types()
    ),
    Filter::Bookable => format!(
      "{working} AND NOT {suspended} \
       AND NOT (e.entity_type IN ({}) AND {injured})",
      individual_types()
    ),
    Filter::FutureEmployed => format!("{off_books} AND {}", pending(&tenure)),
    Filter::Released => format!("{off_books} AND NOT {}", pending(&tenure)),
    Filter::Vacant => format!(
      "{title} AND NOT {}",
      reign_where("c.won_at <= ?1 AND (c.lost_at IS NULL OR c.lost_at > ?1)")
    ),
    Filter::Defended => format!(
      "{title} AND {}",
      reign_where("c.lost_at IS NOT NULL AND c.lost_at <= ?1")
    ),
    Filter::NewTitle => format!("{title} AND NOT {}", reign_where("c.won_at <= ?1")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lists_are_quoted_literals() {
    assert_eq!(tenure_kinds(), "'employment', 'activation'");
    assert_eq!(individual_types(), "'wrestler', 'manager', 'referee'");
  }

  #[test]
  fn every_filter_reads_the_instant_parameter() {
    for filter in Filter::ALL {
      assert!(clause(filter).contains("?1"), "{}", filter.as_str());
    }
  }
}
